//! Variable substitutions

use super::term::{Relation, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A substitution mapping variable names to terms
///
/// Backed by a `BTreeMap` so that display, serialization and sealing are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub map: BTreeMap<String, Term>,
}

impl Substitution {
    /// Create a new empty substitution
    pub fn new() -> Self {
        Substitution {
            map: BTreeMap::new(),
        }
    }

    /// Add a variable -> term mapping
    pub fn insert(&mut self, var: impl Into<String>, term: Term) {
        self.map.insert(var.into(), term);
    }

    /// Add a variable -> term mapping and propagate it into every existing
    /// binding, so the substitution stays idempotent
    pub fn insert_normalized(&mut self, var: &str, term: Term) {
        let term = term.apply_substitution(self);
        let single = Substitution::single(var, term.clone());
        for existing in self.map.values_mut() {
            *existing = existing.apply_substitution(&single);
        }
        self.map.insert(var.to_string(), term);
    }

    pub fn single(var: &str, term: Term) -> Self {
        let mut subst = Substitution::new();
        subst.insert(var, term);
        subst
    }

    /// Compose two substitutions: applying the result equals applying `self`
    /// and then `other`
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = Substitution::new();

        for (var, term) in &self.map {
            result.insert(var.clone(), term.apply_substitution(other));
        }

        for (var, term) in &other.map {
            if !self.map.contains_key(var) {
                result.insert(var.clone(), term.clone());
            }
        }

        result
    }

    /// Get the term for a variable, if bound
    pub fn get(&self, var: &str) -> Option<&Term> {
        self.map.get(var)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.map.contains_key(var)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, term)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}->{}", var, term)?;
        }
        write!(f, "}}")
    }
}

impl Term {
    /// Apply a substitution to this term
    pub fn apply_substitution(&self, subst: &Substitution) -> Term {
        match self {
            Term::Variable(v) => subst.map.get(v).cloned().unwrap_or_else(|| self.clone()),
            Term::Constant(_) => self.clone(),
            Term::Function(f, args) => {
                let new_args = args
                    .iter()
                    .map(|arg| arg.apply_substitution(subst))
                    .collect();
                Term::Function(f.clone(), new_args)
            }
        }
    }
}

impl Relation {
    /// Apply a substitution to this relation
    pub fn apply_substitution(&self, subst: &Substitution) -> Relation {
        Relation {
            name: self.name.clone(),
            args: self
                .args
                .iter()
                .map(|arg| arg.apply_substitution(subst))
                .collect(),
        }
    }
}
