//! Robinson-style unification of first-order relations and terms

use crate::logic::{Relation, Substitution, Term};
use crate::misc::log::targets;
use thiserror::Error;

/// Result of a unification attempt
pub type UnificationResult = Result<Substitution, UnificationError>;

/// Reasons two relations cannot be unified
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnificationError {
    /// Occurs check failed - variable occurs in term
    #[error("variable {0} occurs in {1}")]
    OccursCheck(String, Term),

    /// Relation names don't match
    #[error("relations {0} and {1} differ")]
    RelationClash(String, String),

    /// Arities don't match
    #[error("arities {0} and {1} differ")]
    ArityMismatch(usize, usize),

    /// Constant or function symbols don't match
    #[error("terms {0} and {1} cannot be unified")]
    SymbolClash(Term, Term),
}

/// Unify two relations, returning a most general unifier if one exists.
///
/// Argument pairs are scanned left to right; at the first disagreement one
/// side must be a variable, its binding is recorded and applied to both
/// relations, and the scan restarts until the relations are identical.
pub fn unify(r1: &Relation, r2: &Relation) -> UnificationResult {
    if r1.name != r2.name {
        return Err(UnificationError::RelationClash(r1.name.clone(), r2.name.clone()));
    }
    if r1.arity() != r2.arity() {
        return Err(UnificationError::ArityMismatch(r1.arity(), r2.arity()));
    }

    let mut subst = Substitution::new();
    let mut left = r1.args.clone();
    let mut right = r2.args.clone();

    while let Some((t1, t2)) = first_difference(&left, &right) {
        let (var, term) = match (&t1, &t2) {
            (Term::Variable(v), t) | (t, Term::Variable(v)) => (v.clone(), t.clone()),
            _ => return Err(UnificationError::SymbolClash(t1.clone(), t2.clone())),
        };

        if term.contains_variable(&var) {
            return Err(UnificationError::OccursCheck(var, term));
        }

        log::trace!(target: targets::UNIFICATION, "binding {} -> {}", var, term);
        let single = Substitution::single(&var, term.clone());
        left = left.iter().map(|t| t.apply_substitution(&single)).collect();
        right = right.iter().map(|t| t.apply_substitution(&single)).collect();
        subst.insert_normalized(&var, term);
    }

    Ok(subst)
}

/// Unify two terms
pub fn unify_terms(t1: &Term, t2: &Term) -> UnificationResult {
    let wrap = |t: &Term| Relation::new("", vec![t.clone()]);
    unify(&wrap(t1), &wrap(t2))
}

/// Find the leftmost innermost disagreement between two argument lists.
///
/// Functions with the same symbol and arity are descended into; any other
/// mismatch is returned as is.
fn first_difference(left: &[Term], right: &[Term]) -> Option<(Term, Term)> {
    for (a, b) in left.iter().zip(right.iter()) {
        if a == b {
            continue;
        }
        return match (a, b) {
            (Term::Function(f, fargs), Term::Function(g, gargs))
                if f == g && fargs.len() == gargs.len() =>
            {
                first_difference(fargs, gargs)
            }
            _ => Some((a.clone(), b.clone())),
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(name: &str, args: Vec<Term>) -> Relation {
        Relation::new(name, args)
    }

    fn x() -> Term {
        Term::var("X")
    }

    fn a() -> Term {
        Term::constant("a")
    }

    fn f(args: Vec<Term>) -> Term {
        Term::function("f", args)
    }

    #[test]
    fn test_unify_identical_is_empty() {
        let rel = r("R", vec![x(), f(vec![a()])]);
        let result = unify(&rel, &rel).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unify_variable_with_constant() {
        let result = unify(&r("R", vec![x()]), &r("R", vec![a()])).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("X"), Some(&a()));
    }

    #[test]
    fn test_occurs_check() {
        let result = unify(&r("R", vec![x()]), &r("R", vec![f(vec![x()])]));
        assert!(matches!(result, Err(UnificationError::OccursCheck(_, _))));
    }

    #[test]
    fn test_relation_and_arity_clash() {
        assert!(matches!(
            unify(&r("R", vec![x()]), &r("Q", vec![x()])),
            Err(UnificationError::RelationClash(_, _))
        ));
        assert!(matches!(
            unify(&r("R", vec![x()]), &r("R", vec![x(), a()])),
            Err(UnificationError::ArityMismatch(1, 2))
        ));
    }

    #[test]
    fn test_symbol_clash() {
        let result = unify(&r("R", vec![a()]), &r("R", vec![Term::constant("b")]));
        assert!(matches!(result, Err(UnificationError::SymbolClash(_, _))));
    }

    #[test]
    fn test_unify_nested_functions() {
        // R(f(X), Y) = R(f(a), X)
        let r1 = r("R", vec![f(vec![x()]), Term::var("Y")]);
        let r2 = r("R", vec![f(vec![a()]), x()]);
        let subst = unify(&r1, &r2).unwrap();
        assert_eq!(r1.apply_substitution(&subst), r2.apply_substitution(&subst));
        assert_eq!(subst.get("Y"), Some(&a()));
    }

    #[test]
    fn test_error_converts_to_logic_error() {
        let err: crate::LogicError = unify(&r("R", vec![]), &r("Q", vec![])).unwrap_err().into();
        assert!(matches!(err, crate::LogicError::UnificationImpossible(_)));
    }
}
