//! Quantifier rules of the first-order sequent calculus
//!
//! `allLeft` and `exRight` keep the quantified formula and add an instance
//! for an arbitrary ground term. `allRight` and `exLeft` replace it by an
//! instance for a constant that is fresh in the sequent.

use super::{formula_at, replace_at, Sequent, SequentMove, SequentNode};
use crate::error::{LogicError, Result};
use crate::logic::{Formula, Term};
use crate::parser::parse_term;
use std::collections::BTreeMap;

pub(super) fn apply_rule(
    node: &SequentNode,
    mv: &SequentMove,
    index: usize,
    var_assign: &BTreeMap<String, String>,
) -> Result<Vec<Sequent>> {
    let left = &node.left_formulas;
    let right = &node.right_formulas;

    match mv {
        SequentMove::AllLeft { .. } => match formula_at(left, index, "left")? {
            quantified @ Formula::Universal(..) => {
                let (var, body) = quantifier_parts(quantified);
                let term = assigned_term(var_assign, var)?;
                let instance = body.instantiate(var, &term);
                let expanded = replace_at(left, index, vec![quantified.clone(), instance]);
                Ok(vec![(expanded, right.clone())])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::ExRight { .. } => match formula_at(right, index, "right")? {
            quantified @ Formula::Existential(..) => {
                let (var, body) = quantifier_parts(quantified);
                let term = assigned_term(var_assign, var)?;
                let instance = body.instantiate(var, &term);
                let expanded = replace_at(right, index, vec![quantified.clone(), instance]);
                Ok(vec![(left.clone(), expanded)])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::AllRight { .. } => match formula_at(right, index, "right")? {
            Formula::Universal(var, body) => {
                let constant = fresh_constant(node, var_assign, var)?;
                let instance = body.instantiate(var, &constant);
                Ok(vec![(left.clone(), replace_at(right, index, vec![instance]))])
            }
            other => Err(mismatch(mv, other)),
        },
        SequentMove::ExLeft { .. } => match formula_at(left, index, "left")? {
            Formula::Existential(var, body) => {
                let constant = fresh_constant(node, var_assign, var)?;
                let instance = body.instantiate(var, &constant);
                Ok(vec![(replace_at(left, index, vec![instance]), right.clone())])
            }
            other => Err(mismatch(mv, other)),
        },
        _ => Err(LogicError::illegal(format!("{} is not a quantifier rule", mv.rule_name()))),
    }
}

fn quantifier_parts(formula: &Formula) -> (&str, &Formula) {
    match formula {
        Formula::Universal(var, body) | Formula::Existential(var, body) => (var.as_str(), &**body),
        other => ("", other),
    }
}

/// The ground term assigned to `var`
fn assigned_term(var_assign: &BTreeMap<String, String>, var: &str) -> Result<Term> {
    let text = var_assign
        .get(var)
        .ok_or_else(|| LogicError::illegal(format!("Missing assignment for variable {}", var)))?;
    parse_term(text, false)
}

/// The constant assigned to `var`, which must not occur in `node`
fn fresh_constant(
    node: &SequentNode,
    var_assign: &BTreeMap<String, String>,
    var: &str,
) -> Result<Term> {
    let term = assigned_term(var_assign, var)?;
    let name = match &term {
        Term::Constant(name) => name,
        other => {
            return Err(LogicError::illegal(format!(
                "Term '{}' has to be a constant",
                other
            )))
        }
    };
    let occurs = node
        .left_formulas
        .iter()
        .chain(&node.right_formulas)
        .any(|f| f.symbols().contains(name));
    if occurs {
        return Err(LogicError::illegal(format!(
            "Constant '{}' already occurs in the sequent",
            name
        )));
    }
    Ok(term)
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
    use crate::calculi::sequent::{FoSequent, SequentMove::*};
    use crate::calculus::Calculus;
    use crate::config::NoParams;
    use crate::parser::{parse_sequent, Dialect};

    fn node(text: &str) -> SequentNode {
        let (left, right) = parse_sequent(text, Dialect::FirstOrder).unwrap();
        SequentNode::new(left, right, None)
    }

    fn assign(var: &str, term: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(var.to_string(), term.to_string())])
    }

    #[test]
    fn test_all_left_keeps_quantified_formula() {
        let n = node("\\all X: R(X) |- R(a)");
        let var_assign = assign("X", "f(a)");
        let mv = AllLeft { node_id: 0, list_index: 0, var_assign: var_assign.clone() };
        let children = apply_rule(&n, &mv, 0, &var_assign).unwrap();
        let child = SequentNode::new(children[0].0.clone(), children[0].1.clone(), None);
        assert_eq!(child.to_string(), "(∀X: R(X)), R(f(a)) ⊢ R(a)");
    }

    #[test]
    fn test_instance_terms_must_be_ground() {
        let n = node("|- \\ex X: R(X)");
        let var_assign = assign("X", "Y");
        let mv = ExRight { node_id: 0, list_index: 0, var_assign: var_assign.clone() };
        assert!(apply_rule(&n, &mv, 0, &var_assign).is_err());
        let mv = ExRight { node_id: 0, list_index: 0, var_assign: BTreeMap::new() };
        assert!(apply_rule(&n, &mv, 0, &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_eigenvariable_must_be_fresh() {
        let n = node("R(c) |- \\all X: R(X)");
        let used = assign("X", "c");
        let mv = AllRight { node_id: 0, list_index: 0, var_assign: used.clone() };
        assert!(apply_rule(&n, &mv, 0, &used).is_err());
        let compound = assign("X", "f(d)");
        assert!(apply_rule(&n, &mv, 0, &compound).is_err());
        let fresh = assign("X", "d");
        let children = apply_rule(&n, &mv, 0, &fresh).unwrap();
        assert_eq!(children[0].1[0].to_string(), "R(d)");
    }

    #[test]
    fn test_prove_quantifier_swap() {
        // ∃X ∀Y R(X,Y) ⊢ ∀Y ∃X R(X,Y)
        let state = FoSequent::parse_formula(
            "\\ex X: \\all Y: R(X, Y) |- \\all Y: \\ex X: R(X, Y)",
            NoParams::default(),
        )
        .unwrap();
        let mv = ExLeft { node_id: 0, list_index: 0, var_assign: assign("X", "a") };
        let state = FoSequent::apply_move(state, mv).unwrap();
        let mv = AllRight { node_id: 1, list_index: 0, var_assign: assign("Y", "b") };
        let state = FoSequent::apply_move(state, mv).unwrap();
        let mv = AllLeft { node_id: 2, list_index: 0, var_assign: assign("Y", "b") };
        let state = FoSequent::apply_move(state, mv).unwrap();
        let mv = ExRight { node_id: 3, list_index: 0, var_assign: assign("X", "a") };
        let state = FoSequent::apply_move(state, mv).unwrap();
        assert_eq!(
            state.tree.nodes()[4].to_string(),
            "(∀Y: R(a,Y)), R(a,b) ⊢ (∃X: R(X,b)), R(a,b)"
        );
        let state = FoSequent::apply_move(state, Axiom { node_id: 4 }).unwrap();
        assert!(FoSequent::check_close(&state).closed);
    }
}
