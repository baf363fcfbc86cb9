//! Command line access to the sealed JSON entry points
//!
//! Arguments starting with `@` are read from the named file, `-` reads
//! standard input.

use prooflab::{CalculusKind, LogicError};
use std::io::Read;

fn usage(program: &str) {
    eprintln!("Usage: {} <command> [args]", program);
    eprintln!("\nCommands:");
    eprintln!("  list                                   List the calculus identifiers");
    eprintln!("  parse <calculus> <formula> [params]    Start a proof, print the sealed state");
    eprintln!("  move <calculus> <state> <move>         Apply one move, print the new state");
    eprintln!("  close <calculus> <state>               Check whether the proof is closed");
    eprintln!("  replay <calculus> <formula> <moves>    Apply a JSON array of moves in order");
    eprintln!("\nLogging is configured through RUST_LOG, e.g. RUST_LOG=calculus=debug");
}

/// Resolve `@file` and `-` arguments
fn read_arg(arg: &str) -> std::io::Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path)
    } else {
        Ok(arg.to_string())
    }
}

fn calculus(name: &str) -> CalculusKind {
    match name.parse::<CalculusKind>() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    }
}

fn input(arg: &str) -> String {
    match read_arg(arg) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", arg, e);
            std::process::exit(2);
        }
    }
}

fn replay(kind: CalculusKind, formula: &str, moves: &str) -> Result<String, LogicError> {
    let moves: Vec<serde_json::Value> = serde_json::from_str(moves)?;
    let mut state = kind.parse(formula, None)?;
    for (i, mv) in moves.iter().enumerate() {
        state = kind.apply_move(&state, &mv.to_string())?;
        log::info!("move {} applied: {}", i, mv);
    }
    Ok(state)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        std::process::exit(1);
    }

    let result = match (args[1].as_str(), &args[2..]) {
        ("list", []) => {
            for kind in CalculusKind::ALL {
                println!("{}", kind);
            }
            return;
        }
        ("parse", [name, formula]) => calculus(name).parse(&input(formula), None),
        ("parse", [name, formula, params]) => {
            calculus(name).parse(&input(formula), Some(&input(params)))
        }
        ("move", [name, state, mv]) => calculus(name).apply_move(&input(state), &input(mv)),
        ("close", [name, state]) => calculus(name)
            .check_close(&input(state))
            .and_then(|msg| Ok(serde_json::to_string(&msg)?)),
        ("replay", [name, formula, moves]) => {
            replay(calculus(name), &input(formula), &input(moves))
        }
        _ => {
            usage(&args[0]);
            std::process::exit(1);
        }
    };

    match result {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
