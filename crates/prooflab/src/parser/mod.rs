//! Text input for every calculus
//!
//! Formulas go through the tokenizer in [`lexer`] and the recursive-descent
//! parser in [`formula`]; clause sets written out directly are handled by
//! [`clause_set`].

pub mod clause_set;
pub mod formula;
pub mod lexer;

pub use clause_set::{parse_clause_set, parse_dimacs_like};
pub use formula::{
    parse_fo, parse_formula, parse_modal, parse_prop, parse_sequent, parse_term, Dialect,
};
pub use lexer::{tokenize, Token, TokenKind};

use crate::clause::ClauseSet;
use crate::cnf::convert_to_cnf;
use crate::config::CnfConfig;
use crate::error::Result;
use crate::misc::log::targets;

/// Characters that only occur in formula syntax
const FORMULA_ONLY: &[char] = &['&', '|', '>', '<', '(', ')'];

/// True if `text` looks like the flat clause-set syntax rather than a formula
pub fn is_clause_set_syntax(text: &str) -> bool {
    text.contains(&[',', ';'][..]) && !text.contains(FORMULA_ONLY)
}

/// True if `text` looks like the DIMACS-like `a b 0 -c` syntax: whitespace
/// separated words of identifier characters and `-`, with at least one `0`
/// separator, negation or second word
pub fn is_dimacs_like_syntax(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_chars = words
        .iter()
        .all(|w| w.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    let shaped = words.len() > 1 || words.iter().any(|w| *w == "0" || w.starts_with('-'));
    word_chars && shaped
}

/// Parse a flat clause set, a DIMACS-like clause set or a propositional
/// formula converted to CNF
pub fn parse_flexible(text: &str, config: &CnfConfig) -> Result<ClauseSet<String>> {
    if is_clause_set_syntax(text) {
        log::debug!(target: targets::PARSER, "reading input as clause set");
        parse_clause_set(text)
    } else if is_dimacs_like_syntax(text) {
        log::debug!(target: targets::PARSER, "reading input as dimacs-like clause set");
        parse_dimacs_like(text)
    } else {
        log::debug!(
            target: targets::PARSER,
            "reading input as formula, cnf strategy {}",
            config.strategy
        );
        convert_to_cnf(&parse_prop(text)?, config)
    }
}
