//! Propositional sequent rules

use super::{formula_at, replace_at, Sequent, SequentMove, SequentNode};
use crate::error::{LogicError, Result};
use crate::logic::Formula;

/// Child sequents produced by a connective rule on `node`
pub(super) fn apply_rule(
    node: &SequentNode,
    mv: &SequentMove,
    index: usize,
) -> Result<Vec<Sequent>> {
    let left = &node.left_formulas;
    let right = &node.right_formulas;

    match mv {
        SequentMove::NotLeft { .. } => match formula_at(left, index, "left")? {
            Formula::Not(c) => {
                let mut new_right = right.clone();
                new_right.push((**c).clone());
                Ok(vec![(replace_at(left, index, vec![]), new_right)])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::NotRight { .. } => match formula_at(right, index, "right")? {
            Formula::Not(c) => {
                let mut new_left = left.clone();
                new_left.push((**c).clone());
                Ok(vec![(new_left, replace_at(right, index, vec![]))])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::AndLeft { .. } => match formula_at(left, index, "left")? {
            Formula::And(l, r) => Ok(vec![(
                replace_at(left, index, vec![(**l).clone(), (**r).clone()]),
                right.clone(),
            )]),
            other => Err(mismatch(mv, other)),
        },
        SequentMove::AndRight { .. } => match formula_at(right, index, "right")? {
            Formula::And(l, r) => Ok(vec![
                (left.clone(), replace_at(right, index, vec![(**l).clone()])),
                (left.clone(), replace_at(right, index, vec![(**r).clone()])),
            ]),
            other => Err(mismatch(mv, other)),
        },
        SequentMove::OrLeft { .. } => match formula_at(left, index, "left")? {
            Formula::Or(l, r) => Ok(vec![
                (replace_at(left, index, vec![(**l).clone()]), right.clone()),
                (replace_at(left, index, vec![(**r).clone()]), right.clone()),
            ]),
            other => Err(mismatch(mv, other)),
        },
        SequentMove::OrRight { .. } => match formula_at(right, index, "right")? {
            Formula::Or(l, r) => Ok(vec![(
                left.clone(),
                replace_at(right, index, vec![(**l).clone(), (**r).clone()]),
            )]),
            other => Err(mismatch(mv, other)),
        },
        SequentMove::ImpLeft { .. } => match formula_at(left, index, "left")? {
            Formula::Impl(l, r) => {
                let mut premise_right = right.clone();
                premise_right.push((**l).clone());
                Ok(vec![
                    (replace_at(left, index, vec![]), premise_right),
                    (replace_at(left, index, vec![(**r).clone()]), right.clone()),
                ])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::ImpRight { .. } => match formula_at(right, index, "right")? {
            Formula::Impl(l, r) => {
                let mut new_left = left.clone();
                new_left.push((**l).clone());
                Ok(vec![(new_left, replace_at(right, index, vec![(**r).clone()]))])
            }
            other => Err(mismatch(mv, other)),
        },
        _ => Err(LogicError::illegal(format!(
            "{} is not a propositional rule",
            mv.rule_name()
        ))),
    }
}

fn mismatch(mv: &SequentMove, formula: &Formula) -> LogicError {
    LogicError::illegal(format!(
        "Rule {} can not be applied to '{}'",
        mv.rule_name(),
        formula
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_sequent, Dialect};

    fn node(text: &str) -> SequentNode {
        let (left, right) = parse_sequent(text, Dialect::Propositional).unwrap();
        SequentNode::new(left, right, None)
    }

    fn render(children: &[Sequent]) -> Vec<String> {
        children
            .iter()
            .map(|(l, r)| SequentNode::new(l.clone(), r.clone(), None).to_string())
            .collect()
    }

    #[test]
    fn test_single_premise_rules() {
        let n = node("!a, b & c |- d | e, f -> g");
        let mv = SequentMove::NotLeft { node_id: 0, list_index: 0 };
        let children = apply_rule(&n, &mv, 0).unwrap();
        assert_eq!(render(&children), vec!["(b ∧ c) ⊢ (d ∨ e), (f → g), a"]);
        let mv = SequentMove::AndLeft { node_id: 0, list_index: 1 };
        let children = apply_rule(&n, &mv, 1).unwrap();
        assert_eq!(render(&children), vec!["¬a, b, c ⊢ (d ∨ e), (f → g)"]);
        let mv = SequentMove::OrRight { node_id: 0, list_index: 0 };
        let children = apply_rule(&n, &mv, 0).unwrap();
        assert_eq!(render(&children), vec!["¬a, (b ∧ c) ⊢ d, e, (f → g)"]);
        let mv = SequentMove::ImpRight { node_id: 0, list_index: 1 };
        let children = apply_rule(&n, &mv, 1).unwrap();
        assert_eq!(render(&children), vec!["¬a, (b ∧ c), f ⊢ (d ∨ e), g"]);
    }

    #[test]
    fn test_branching_rules() {
        let n = node("a -> b, c | d |- e & f");
        let mv = SequentMove::ImpLeft { node_id: 0, list_index: 0 };
        assert_eq!(
            render(&apply_rule(&n, &mv, 0).unwrap()),
            vec!["(c ∨ d) ⊢ (e ∧ f), a", "b, (c ∨ d) ⊢ (e ∧ f)"]
        );
        let mv = SequentMove::OrLeft { node_id: 0, list_index: 1 };
        assert_eq!(
            render(&apply_rule(&n, &mv, 1).unwrap()),
            vec!["(a → b), c ⊢ (e ∧ f)", "(a → b), d ⊢ (e ∧ f)"]
        );
        let mv = SequentMove::AndRight { node_id: 0, list_index: 0 };
        assert_eq!(
            render(&apply_rule(&n, &mv, 0).unwrap()),
            vec!["(a → b), (c ∨ d) ⊢ e", "(a → b), (c ∨ d) ⊢ f"]
        );
    }

    #[test]
    fn test_wrong_connective_or_index() {
        let n = node("a & b |- c");
        let mv = SequentMove::OrLeft { node_id: 0, list_index: 0 };
        assert!(apply_rule(&n, &mv, 0).is_err());
        let mv = SequentMove::AndLeft { node_id: 0, list_index: 4 };
        assert!(apply_rule(&n, &mv, 4).is_err());
    }
}
