//! Atoms, clauses and clause sets over a generic literal type.
//!
//! Propositional calculi use `String` literals, first-order calculi use
//! [`Relation`](crate::logic::Relation).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A possibly negated literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Atom<L> {
    pub lit: L,
    pub negated: bool,
}

impl<L> Atom<L> {
    pub fn new(lit: L, negated: bool) -> Self {
        Atom { lit, negated }
    }

    pub fn positive(lit: L) -> Self {
        Atom { lit, negated: false }
    }

    pub fn negative(lit: L) -> Self {
        Atom { lit, negated: true }
    }

    pub fn lit(&self) -> &L {
        &self.lit
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    pub fn map<M>(&self, f: impl FnOnce(&L) -> M) -> Atom<M> {
        Atom {
            lit: f(&self.lit),
            negated: self.negated,
        }
    }
}

impl<L: Clone> Atom<L> {
    /// The same literal with flipped polarity
    pub fn not(&self) -> Self {
        Atom {
            lit: self.lit.clone(),
            negated: !self.negated,
        }
    }
}

impl<L: PartialEq> Atom<L> {
    pub fn is_complement_of(&self, other: &Atom<L>) -> bool {
        self.lit == other.lit && self.negated != other.negated
    }
}

impl<L: fmt::Display> fmt::Display for Atom<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.lit)
    }
}

/// A disjunction of atoms
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause<L> {
    pub atoms: Vec<Atom<L>>,
}

impl<L> Default for Clause<L> {
    fn default() -> Self {
        Clause { atoms: Vec::new() }
    }
}

impl<L> Clause<L> {
    pub fn new(atoms: Vec<Atom<L>>) -> Self {
        Clause { atoms }
    }

    pub fn atoms(&self) -> &[Atom<L>] {
        &self.atoms
    }

    pub fn add(&mut self, atom: Atom<L>) {
        self.atoms.push(atom);
    }

    pub fn size(&self) -> usize {
        self.atoms.len()
    }

    /// The empty clause represents falsity
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl<L: PartialEq + Clone> Clause<L> {
    /// Remove repeated atoms, keeping the first occurrence
    pub fn dedup(&mut self) {
        let mut kept: Vec<Atom<L>> = Vec::with_capacity(self.atoms.len());
        for atom in self.atoms.drain(..) {
            if !kept.contains(&atom) {
                kept.push(atom);
            }
        }
        self.atoms = kept;
    }

    pub fn contains(&self, atom: &Atom<L>) -> bool {
        self.atoms.contains(atom)
    }

    /// Every atom of `self` occurs in `other`
    pub fn subsumes(&self, other: &Clause<L>) -> bool {
        self.atoms.iter().all(|a| other.contains(a))
    }

    /// Contains a literal together with its complement
    pub fn is_tautology(&self) -> bool {
        self.atoms
            .iter()
            .any(|a| self.atoms.iter().any(|b| a.is_complement_of(b)))
    }

    /// Concatenation of both clauses without duplicates
    pub fn union(&self, other: &Clause<L>) -> Clause<L> {
        let mut atoms = self.atoms.clone();
        atoms.extend(other.atoms.iter().cloned());
        let mut clause = Clause::new(atoms);
        clause.dedup();
        clause
    }
}

impl<L: fmt::Display> fmt::Display for Clause<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", atom)?;
        }
        write!(f, "}}")
    }
}

/// A conjunction of clauses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseSet<L> {
    pub clauses: Vec<Clause<L>>,
}

impl<L> Default for ClauseSet<L> {
    fn default() -> Self {
        ClauseSet {
            clauses: Vec::new(),
        }
    }
}

impl<L> ClauseSet<L> {
    pub fn new(clauses: Vec<Clause<L>>) -> Self {
        ClauseSet { clauses }
    }

    pub fn clauses(&self) -> &[Clause<L>] {
        &self.clauses
    }

    pub fn size(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn add(&mut self, clause: Clause<L>) {
        self.clauses.push(clause);
    }

    pub fn add_all(&mut self, clauses: impl IntoIterator<Item = Clause<L>>) {
        self.clauses.extend(clauses);
    }

    /// Remove and return the clause at `idx`; `None` if out of range
    pub fn remove(&mut self, idx: usize) -> Option<Clause<L>> {
        if idx < self.clauses.len() {
            Some(self.clauses.remove(idx))
        } else {
            None
        }
    }

    /// Remove the atom at `atom_idx` of clause `clause_idx`
    pub fn remove_atom(&mut self, clause_idx: usize, atom_idx: usize) -> Option<Atom<L>> {
        let clause = self.clauses.get_mut(clause_idx)?;
        if atom_idx < clause.atoms.len() {
            Some(clause.atoms.remove(atom_idx))
        } else {
            None
        }
    }

    /// Append all clauses of `other`
    pub fn unite(&mut self, other: ClauseSet<L>) {
        self.clauses.extend(other.clauses);
    }

    pub fn contains_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }
}

impl<L: PartialEq + Clone> ClauseSet<L> {
    /// Remove repeated atoms inside clauses and repeated clauses
    pub fn dedup(&mut self) {
        let mut kept: Vec<Clause<L>> = Vec::with_capacity(self.clauses.len());
        for mut clause in self.clauses.drain(..) {
            clause.dedup();
            if !kept.contains(&clause) {
                kept.push(clause);
            }
        }
        self.clauses = kept;
    }
}

impl<L: fmt::Display> fmt::Display for ClauseSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(s: &str) -> Atom<String> {
        match s.strip_prefix('!') {
            Some(rest) => Atom::negative(rest.to_string()),
            None => Atom::positive(s.to_string()),
        }
    }

    fn clause(atoms: &[&str]) -> Clause<String> {
        Clause::new(atoms.iter().map(|a| atom(a)).collect())
    }

    #[test]
    fn test_clause_dedup_keeps_order() {
        let mut c = clause(&["b", "a", "b", "!a"]);
        c.dedup();
        assert_eq!(c.to_string(), "{b,a,!a}");
        assert!(c.is_tautology());
    }

    #[test]
    fn test_subsumption() {
        assert!(clause(&["a"]).subsumes(&clause(&["b", "a"])));
        assert!(!clause(&["!a"]).subsumes(&clause(&["b", "a"])));
    }

    #[test]
    fn test_clause_set_remove_atom() {
        let mut cs = ClauseSet::new(vec![clause(&["a", "!b"]), clause(&["c"])]);
        assert_eq!(cs.remove_atom(0, 1), Some(atom("!b")));
        assert_eq!(cs.remove_atom(1, 3), None);
        assert_eq!(cs.remove(5), None);
        assert_eq!(cs.to_string(), "{a},{c}");
    }

    #[test]
    fn test_clause_set_dedup() {
        let mut cs = ClauseSet::new(vec![clause(&["a", "a"]), clause(&["a"]), clause(&[])]);
        cs.dedup();
        assert_eq!(cs.to_string(), "{a},{}");
        assert!(cs.contains_empty_clause());
    }

    #[test]
    fn test_atom_serialization_shape() {
        let json = serde_json::to_string(&atom("!a")).unwrap();
        assert_eq!(json, r#"{"lit":"a","negated":true}"#);
    }
}
