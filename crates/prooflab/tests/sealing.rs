//! Tamper detection and undo-by-replay across the sealed JSON boundary

use prooflab::calculi::{PropResolution, PropTableaux, SignedModalTableaux};
use prooflab::{apply_move, check_close, parse, CalculusKind, LogicError};
use proptest::prelude::*;
use serde_json::Value;

fn edit(state_json: &str, change: impl FnOnce(&mut Value)) -> String {
    let mut value: Value = serde_json::from_str(state_json).unwrap();
    change(&mut value);
    value.to_string()
}

fn assert_rejected(result: Result<impl std::fmt::Debug, LogicError>) {
    match result {
        Err(LogicError::JsonParse(msg)) => {
            assert!(msg.contains("seal"), "unexpected message: {}", msg)
        }
        other => panic!("expected a seal mismatch, got {:?}", other),
    }
}

#[test]
fn test_untouched_state_is_accepted() {
    let state = parse::<PropTableaux>("a,b;!a;!b", None).unwrap();
    let reserialized = edit(&state, |_| {});
    assert!(check_close::<PropTableaux>(&reserialized).is_ok());
}

#[test]
fn test_modified_fields_are_rejected() {
    let state = parse::<PropTableaux>("a,b;!a;!b", Some(r#"{"backtracking":true}"#)).unwrap();
    let expand_root = r#"{"type":"tableaux-expand","id1":0,"id2":0}"#;
    let state = apply_move::<PropTableaux>(&state, expand_root).unwrap();

    let tampered = [
        edit(&state, |v| v["backtracking"] = Value::Bool(false)),
        edit(&state, |v| v["regular"] = Value::Bool(true)),
        edit(&state, |v| v["type"] = Value::from("WEAKLYCONNECTED")),
        edit(&state, |v| v["tree"][1]["isClosed"] = Value::Bool(true)),
        edit(&state, |v| v["tree"][2]["spelling"] = Value::from("c")),
        edit(&state, |v| v["clauseSet"]["clauses"][1]["atoms"][0]["negated"] = Value::Bool(false)),
        edit(&state, |v| v["moveHistory"] = Value::Array(vec![])),
        edit(&state, |v| v["seal"] = Value::from("00")),
    ];
    for json in &tampered {
        assert_rejected(check_close::<PropTableaux>(json));
        assert_rejected(apply_move::<PropTableaux>(json, r#"{"type":"tableaux-undo"}"#));
    }
}

#[test]
fn test_seal_is_bound_to_calculus() {
    let state = parse::<PropResolution>("a;!a", None).unwrap();
    assert!(check_close::<PropResolution>(&state).is_ok());
    // A resolution state is not a valid tableaux state
    assert!(matches!(check_close::<PropTableaux>(&state), Err(LogicError::JsonParse(_))));
}

#[test]
fn test_dangling_tree_indices_are_rejected() {
    let state = parse::<PropTableaux>("a,b;!a;!b", None).unwrap();
    let expand_root = r#"{"type":"tableaux-expand","id1":0,"id2":0}"#;
    let state = apply_move::<PropTableaux>(&state, expand_root).unwrap();

    let broken = [
        edit(&state, |v| v["tree"][0]["children"] = serde_json::json!([1, 99])),
        edit(&state, |v| v["tree"][2]["parent"] = Value::from(99)),
        edit(&state, |v| v["tree"][1]["closeRef"] = Value::from(42)),
        edit(&state, |v| v["tree"] = Value::Array(vec![])),
    ];
    for json in &broken {
        let expand = r#"{"type":"tableaux-expand","id1":1,"id2":1}"#;
        let results = [
            apply_move::<PropTableaux>(json, expand).map(|_| ()),
            check_close::<PropTableaux>(json).map(|_| ()),
        ];
        for result in results {
            match result {
                Err(LogicError::JsonParse(msg)) => {
                    assert!(msg.contains("Invalid proof tree"), "{}", msg)
                }
                other => panic!("expected a structure error, got {:?}", other),
            }
        }
    }

    let modal = parse::<SignedModalTableaux>("a -> a", None).unwrap();
    let alpha = r#"{"type":"smtab-alpha","nodeID":0}"#;
    let modal = apply_move::<SignedModalTableaux>(&modal, alpha).unwrap();
    let dangling = edit(&modal, |v| v["tree"][1]["children"] = serde_json::json!([7]));
    assert!(matches!(check_close::<SignedModalTableaux>(&dangling), Err(LogicError::JsonParse(_))));
}

#[test]
fn test_missing_seal_is_rejected() {
    let state = parse::<PropResolution>("a;!a", None).unwrap();
    let unsealed = edit(&state, |v| {
        v.as_object_mut().unwrap().remove("seal");
    });
    assert!(matches!(check_close::<PropResolution>(&unsealed), Err(LogicError::JsonParse(_))));
}

#[test]
fn test_undo_restores_previous_seal() {
    let params = Some(r#"{"backtracking":true}"#);
    let moves = [
        r#"{"type":"tableaux-expand","id1":0,"id2":0}"#,
        r#"{"type":"tableaux-expand","id1":1,"id2":1}"#,
        r#"{"type":"tableaux-close","id1":3,"id2":1}"#,
    ];
    let mut states = vec![parse::<PropTableaux>("a,b;!a;!b", params).unwrap()];
    for mv in moves {
        let next = apply_move::<PropTableaux>(states.last().unwrap(), mv).unwrap();
        states.push(next);
    }

    for k in 1..states.len() {
        let undone = apply_move::<PropTableaux>(&states[k], r#"{"type":"tableaux-undo"}"#).unwrap();
        let seal = |json: &str| serde_json::from_str::<Value>(json).unwrap()["seal"].clone();
        assert_eq!(seal(&undone), seal(&states[k - 1]));
    }
}

#[test]
fn test_modal_undo_restores_previous_seal() {
    let kind = CalculusKind::SignedModalTableaux;
    let params = Some(r#"{"backtracking":true}"#);
    let start = parse::<SignedModalTableaux>("[](a & b) -> []a", params).unwrap();
    let one = kind.apply_move(&start, r#"{"type":"smtab-alpha","nodeID":0}"#).unwrap();
    let two = kind.apply_move(&one, r#"{"type":"smtab-pi","nodeID":2,"prefix":1}"#).unwrap();
    assert_eq!(kind.apply_move(&two, r#"{"type":"smtab-undo"}"#).unwrap(), one);
    assert_eq!(kind.apply_move(&one, r#"{"type":"smtab-undo"}"#).unwrap(), start);
}

/// Small clause sets over three variables in the flat `a,b;!c` syntax
fn arb_clause_set() -> impl Strategy<Value = String> {
    let atom = (any::<bool>(), 0..3usize).prop_map(|(neg, v)| {
        format!("{}{}", if neg { "!" } else { "" }, ["a", "b", "c"][v])
    });
    let clause = proptest::collection::vec(atom, 1..=3).prop_map(|atoms| atoms.join(","));
    proptest::collection::vec(clause, 2..=4).prop_map(|clauses| clauses.join(";"))
}

proptest! {
    /// Flipping the polarity of any single atom invalidates the seal
    #[test]
    fn flipping_any_atom_breaks_seal(
        text in arb_clause_set(),
        pick in any::<prop::sample::Index>(),
    ) {
        let state = parse::<PropResolution>(&text, None).unwrap();
        prop_assert!(check_close::<PropResolution>(&state).is_ok());

        let value: Value = serde_json::from_str(&state).unwrap();
        let mut positions = Vec::new();
        for (c, clause) in value["clauseSet"]["clauses"].as_array().unwrap().iter().enumerate() {
            for a in 0..clause["atoms"].as_array().unwrap().len() {
                positions.push((c, a));
            }
        }
        let (c, a) = positions[pick.index(positions.len())];

        let tampered = edit(&state, |v| {
            let negated = &mut v["clauseSet"]["clauses"][c]["atoms"][a]["negated"];
            *negated = Value::Bool(!negated.as_bool().unwrap());
        });
        prop_assert!(matches!(
            check_close::<PropResolution>(&tampered),
            Err(LogicError::JsonParse(_))
        ));
    }

    /// Sealing is deterministic: parsing the same input twice gives the same state
    #[test]
    fn parse_is_deterministic(text in arb_clause_set()) {
        let first = parse::<PropResolution>(&text, None).unwrap();
        let second = parse::<PropResolution>(&text, None).unwrap();
        prop_assert_eq!(first, second);
    }
}
