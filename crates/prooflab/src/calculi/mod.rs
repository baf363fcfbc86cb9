//! The proof calculi
//!
//! Each calculus owns its state, move and node types and implements
//! [`Calculus`](crate::calculus::Calculus).

pub mod dpll;
pub mod fo_resolution;
pub mod modal;
pub mod prop_resolution;
pub mod sequent;
pub mod tableaux;

pub use dpll::Dpll;
pub use fo_resolution::FoResolution;
pub use modal::SignedModalTableaux;
pub use prop_resolution::PropResolution;
pub use sequent::{FoSequent, PropSequent};
pub use tableaux::{FoTableaux, PropTableaux};

use crate::error::{LogicError, Result};
use crate::logic::{Substitution, Term};
use crate::parser::parse_term;
use std::collections::BTreeMap;

/// Parse a user supplied variable assignment (`{"X": "f(a)"}`).
///
/// Keys have to be variable names; with `allow_variables` the terms may
/// contain variables themselves, otherwise they must be ground.
pub(crate) fn parse_var_assign(
    assign: &BTreeMap<String, String>,
    allow_variables: bool,
) -> Result<Substitution> {
    let mut subst = Substitution::new();
    for (var, text) in assign {
        match parse_term(var, true) {
            Ok(Term::Variable(name)) => {
                subst.insert(name, parse_term(text, allow_variables)?);
            }
            _ => {
                return Err(LogicError::illegal(format!(
                    "'{}' is not a valid variable name",
                    var
                )))
            }
        }
    }
    Ok(subst)
}

/// Canonical encoding of a variable assignment
pub(crate) fn encode_var_assign(assign: &BTreeMap<String, String>) -> String {
    let parts: Vec<String> = assign.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_var_assign() {
        let subst = parse_var_assign(&assign(&[("X", "f(a)"), ("Y", "Z")]), true).unwrap();
        assert_eq!(subst.to_string(), "{X->f(a),Y->Z}");
    }

    #[test]
    fn test_parse_var_assign_rejections() {
        assert!(parse_var_assign(&assign(&[("x", "a")]), true).is_err());
        assert!(parse_var_assign(&assign(&[("X", "Y")]), false).is_err());
        assert!(parse_var_assign(&assign(&[("X", "a b")]), true).is_err());
    }

    #[test]
    fn test_encode_var_assign() {
        assert_eq!(encode_var_assign(&assign(&[("Y", "b"), ("X", "a")])), "{X=a,Y=b}");
    }
}
