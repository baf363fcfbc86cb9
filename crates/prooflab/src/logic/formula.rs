//! Formula representation shared by the propositional, first-order and modal
//! parsers.

use super::substitution::Substitution;
use super::term::{Relation, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A formula of propositional, first-order or modal logic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formula {
    /// Propositional variable
    Var(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Impl(Box<Formula>, Box<Formula>),
    Equiv(Box<Formula>, Box<Formula>),
    Relation(Relation),
    Universal(String, Box<Formula>),
    Existential(String, Box<Formula>),
    /// □φ
    Necessity(Box<Formula>),
    /// ◇φ
    Possibility(Box<Formula>),
}

impl Formula {
    pub fn var(name: impl Into<String>) -> Self {
        Formula::Var(name.into())
    }

    pub fn not(f: Formula) -> Self {
        Formula::Not(Box::new(f))
    }

    pub fn and(l: Formula, r: Formula) -> Self {
        Formula::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Formula, r: Formula) -> Self {
        Formula::Or(Box::new(l), Box::new(r))
    }

    pub fn implies(l: Formula, r: Formula) -> Self {
        Formula::Impl(Box::new(l), Box::new(r))
    }

    pub fn equiv(l: Formula, r: Formula) -> Self {
        Formula::Equiv(Box::new(l), Box::new(r))
    }

    pub fn relation(name: impl Into<String>, args: Vec<Term>) -> Self {
        Formula::Relation(Relation::new(name, args))
    }

    pub fn forall(var: impl Into<String>, f: Formula) -> Self {
        Formula::Universal(var.into(), Box::new(f))
    }

    pub fn exists(var: impl Into<String>, f: Formula) -> Self {
        Formula::Existential(var.into(), Box::new(f))
    }

    pub fn necessarily(f: Formula) -> Self {
        Formula::Necessity(Box::new(f))
    }

    pub fn possibly(f: Formula) -> Self {
        Formula::Possibility(Box::new(f))
    }

    /// True for variables, relations and their negations
    pub fn is_literal(&self) -> bool {
        match self {
            Formula::Var(_) | Formula::Relation(_) => true,
            Formula::Not(inner) => matches!(**inner, Formula::Var(_) | Formula::Relation(_)),
            _ => false,
        }
    }

    /// All propositional variable names in order of first occurrence
    pub fn prop_variables(&self) -> Vec<String> {
        fn walk(f: &Formula, seen: &mut Vec<String>) {
            match f {
                Formula::Var(v) => {
                    if !seen.contains(v) {
                        seen.push(v.clone());
                    }
                }
                Formula::Relation(_) => {}
                Formula::Not(c)
                | Formula::Universal(_, c)
                | Formula::Existential(_, c)
                | Formula::Necessity(c)
                | Formula::Possibility(c) => walk(c, seen),
                Formula::And(l, r)
                | Formula::Or(l, r)
                | Formula::Impl(l, r)
                | Formula::Equiv(l, r) => {
                    walk(l, seen);
                    walk(r, seen);
                }
            }
        }
        let mut seen = Vec::new();
        walk(self, &mut seen);
        seen
    }

    /// Names of all constants and function symbols occurring in the formula
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<String>) {
        match self {
            Formula::Var(_) => {}
            Formula::Relation(r) => {
                for arg in &r.args {
                    arg.collect_symbols(symbols);
                }
            }
            Formula::Not(c)
            | Formula::Universal(_, c)
            | Formula::Existential(_, c)
            | Formula::Necessity(c)
            | Formula::Possibility(c) => c.collect_symbols(symbols),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Impl(l, r) | Formula::Equiv(l, r) => {
                l.collect_symbols(symbols);
                r.collect_symbols(symbols);
            }
        }
    }

    /// Variables occurring free in the formula
    pub fn free_variables(&self) -> BTreeSet<String> {
        match self {
            Formula::Var(_) => BTreeSet::new(),
            Formula::Relation(r) => r.variables(),
            Formula::Not(c) | Formula::Necessity(c) | Formula::Possibility(c) => c.free_variables(),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Impl(l, r) | Formula::Equiv(l, r) => {
                let mut vars = l.free_variables();
                vars.extend(r.free_variables());
                vars
            }
            Formula::Universal(v, c) | Formula::Existential(v, c) => {
                let mut vars = c.free_variables();
                vars.remove(v);
                vars
            }
        }
    }

    /// Apply a substitution to the free variables of the formula.
    ///
    /// Bindings for a variable are dropped below a quantifier that rebinds it.
    pub fn apply_substitution(&self, subst: &Substitution) -> Formula {
        if subst.is_empty() {
            return self.clone();
        }
        match self {
            Formula::Var(_) => self.clone(),
            Formula::Relation(r) => Formula::Relation(r.apply_substitution(subst)),
            Formula::Not(c) => Formula::not(c.apply_substitution(subst)),
            Formula::Necessity(c) => Formula::necessarily(c.apply_substitution(subst)),
            Formula::Possibility(c) => Formula::possibly(c.apply_substitution(subst)),
            Formula::And(l, r) => {
                Formula::and(l.apply_substitution(subst), r.apply_substitution(subst))
            }
            Formula::Or(l, r) => {
                Formula::or(l.apply_substitution(subst), r.apply_substitution(subst))
            }
            Formula::Impl(l, r) => {
                Formula::implies(l.apply_substitution(subst), r.apply_substitution(subst))
            }
            Formula::Equiv(l, r) => {
                Formula::equiv(l.apply_substitution(subst), r.apply_substitution(subst))
            }
            Formula::Universal(v, c) | Formula::Existential(v, c) => {
                let mut inner = subst.clone();
                inner.map.remove(v);
                let body = c.apply_substitution(&inner);
                match self {
                    Formula::Universal(..) => Formula::forall(v.clone(), body),
                    _ => Formula::exists(v.clone(), body),
                }
            }
        }
    }

    /// Replace the free occurrences of `var` by `term`
    pub fn instantiate(&self, var: &str, term: &Term) -> Formula {
        self.apply_substitution(&Substitution::single(var, term.clone()))
    }

    /// Canonical, whitespace-free prefix encoding used for sealing.
    ///
    /// Distinct trees always encode differently.
    pub fn encode(&self) -> String {
        match self {
            Formula::Var(v) => format!("var({})", v),
            Formula::Relation(r) => format!("rel({})", r),
            Formula::Not(c) => format!("not({})", c.encode()),
            Formula::Necessity(c) => format!("box({})", c.encode()),
            Formula::Possibility(c) => format!("dia({})", c.encode()),
            Formula::And(l, r) => format!("and({},{})", l.encode(), r.encode()),
            Formula::Or(l, r) => format!("or({},{})", l.encode(), r.encode()),
            Formula::Impl(l, r) => format!("impl({},{})", l.encode(), r.encode()),
            Formula::Equiv(l, r) => format!("equiv({},{})", l.encode(), r.encode()),
            Formula::Universal(v, c) => format!("all({},{})", v, c.encode()),
            Formula::Existential(v, c) => format!("ex({},{})", v, c.encode()),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Var(v) => write!(f, "{}", v),
            Formula::Relation(r) => write!(f, "{}", r),
            Formula::Not(c) => write!(f, "¬{}", c),
            Formula::Necessity(c) => write!(f, "□{}", c),
            Formula::Possibility(c) => write!(f, "◇{}", c),
            Formula::And(l, r) => write!(f, "({} ∧ {})", l, r),
            Formula::Or(l, r) => write!(f, "({} ∨ {})", l, r),
            Formula::Impl(l, r) => write!(f, "({} → {})", l, r),
            Formula::Equiv(l, r) => write!(f, "({} <=> {})", l, r),
            Formula::Universal(v, c) => write!(f, "(∀{}: {})", v, c),
            Formula::Existential(v, c) => write!(f, "(∃{}: {})", v, c),
        }
    }
}
