//! Clause normal form conversion
//!
//! Propositional formulas are converted naively (NNF and distribution), with
//! Tseytin's definitional transformation, or with whichever of the two gives
//! fewer clauses. First-order formulas go through skolemization and naive
//! distribution over relations.

use crate::clause::{Atom, Clause, ClauseSet};
use crate::config::{CnfConfig, CnfStrategy};
use crate::error::{LogicError, Result};
use crate::logic::{Formula, Relation};
use crate::misc::log::targets;
use std::collections::BTreeSet;

/// Convert a propositional formula to a clause set
pub fn convert_to_cnf(formula: &Formula, config: &CnfConfig) -> Result<ClauseSet<String>> {
    let clauses = match config.strategy {
        CnfStrategy::Naive => naive_cnf(formula, config.blowup_limit)?,
        CnfStrategy::Tseytin => tseytin_cnf(formula)?,
        CnfStrategy::Optimal => optimal_cnf(formula, config.blowup_limit)?,
    };
    log::debug!(
        target: targets::CNF,
        "{} conversion produced {} clauses",
        config.strategy,
        clauses.size()
    );
    Ok(clauses)
}

/// Negation normal form followed by distribution of `|` over `&`.
///
/// Fails with `FormulaConversion` when a single distribution step would
/// produce more than `limit` clauses.
pub fn naive_cnf(formula: &Formula, limit: usize) -> Result<ClauseSet<String>> {
    let clauses = distribute(&formula.to_nnf(), limit, &prop_atom)?;
    Ok(ClauseSet::new(clauses))
}

/// Tseytin transformation: one definition variable per compound sub-formula.
///
/// The result is equisatisfiable with the input and linear in its size.
pub fn tseytin_cnf(formula: &Formula) -> Result<ClauseSet<String>> {
    let prefix = fresh_prefix(&formula.prop_variables());
    let mut encoder = TseytinEncoder {
        prefix,
        counter: 0,
        clauses: Vec::new(),
    };
    let root = encoder.name_of(formula)?;
    let mut clauses = vec![Clause::new(vec![Atom::positive(root)])];
    clauses.append(&mut encoder.clauses);
    Ok(ClauseSet::new(clauses))
}

/// The smaller of the naive and Tseytin conversions; ties go to naive
pub fn optimal_cnf(formula: &Formula, limit: usize) -> Result<ClauseSet<String>> {
    let tseytin = tseytin_cnf(formula)?;
    match naive_cnf(formula, limit) {
        Ok(naive) if naive.size() <= tseytin.size() => {
            log::trace!(
                target: targets::CNF,
                "optimal: naive ({} <= {})",
                naive.size(),
                tseytin.size()
            );
            Ok(naive)
        }
        Ok(naive) => {
            log::trace!(
                target: targets::CNF,
                "optimal: tseytin ({} > {})",
                naive.size(),
                tseytin.size()
            );
            Ok(tseytin)
        }
        Err(e) => {
            log::trace!(target: targets::CNF, "optimal: tseytin, naive failed: {}", e);
            Ok(tseytin)
        }
    }
}

/// Clause normal form of a closed first-order formula.
///
/// Bound variables are standardized apart, the formula is brought into NNF
/// and skolemized, universal quantifiers are dropped and the matrix is
/// distributed into clauses over relations.
pub fn fo_clause_set(formula: &Formula, limit: usize) -> Result<ClauseSet<Relation>> {
    let matrix = formula
        .standardize_apart()
        .to_nnf()
        .skolemize()
        .drop_universals();
    log::trace!(target: targets::CNF, "skolemized matrix {}", matrix);
    let clauses = distribute(&matrix, limit, &fo_atom)?;
    Ok(ClauseSet::new(clauses))
}

fn prop_atom(formula: &Formula) -> Option<Atom<String>> {
    match formula {
        Formula::Var(v) => Some(Atom::positive(v.clone())),
        Formula::Not(inner) => match &**inner {
            Formula::Var(v) => Some(Atom::negative(v.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn fo_atom(formula: &Formula) -> Option<Atom<Relation>> {
    match formula {
        Formula::Relation(r) => Some(Atom::positive(r.clone())),
        Formula::Not(inner) => match &**inner {
            Formula::Relation(r) => Some(Atom::negative(r.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Distribute a formula in negation normal form into clauses
fn distribute<L: Clone + PartialEq>(
    formula: &Formula,
    limit: usize,
    atom_of: &impl Fn(&Formula) -> Option<Atom<L>>,
) -> Result<Vec<Clause<L>>> {
    if let Some(atom) = atom_of(formula) {
        return Ok(vec![Clause::new(vec![atom])]);
    }

    match formula {
        Formula::And(l, r) => {
            let mut clauses = distribute(l, limit, atom_of)?;
            clauses.extend(distribute(r, limit, atom_of)?);
            Ok(clauses)
        }
        Formula::Or(l, r) => {
            let left = distribute(l, limit, atom_of)?;
            let right = distribute(r, limit, atom_of)?;

            let size = left.len().saturating_mul(right.len());
            if size > limit {
                return Err(LogicError::FormulaConversion(format!(
                    "Naive CNF conversion would produce {} clauses, the limit is {}",
                    size, limit
                )));
            }

            let mut clauses = Vec::with_capacity(size);
            for lc in &left {
                for rc in &right {
                    clauses.push(lc.union(rc));
                }
            }
            Ok(clauses)
        }
        other => Err(LogicError::FormulaConversion(format!(
            "Unexpected sub-formula {} during clause conversion",
            other
        ))),
    }
}

/// A prefix `p` such that no variable has the form `p<digits>`
fn fresh_prefix(variables: &[String]) -> String {
    let taken: BTreeSet<&str> = variables.iter().map(String::as_str).collect();
    let mut prefix = String::from("n");
    while taken.iter().any(|v| {
        v.strip_prefix(prefix.as_str())
            .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }) {
        prefix.push('n');
    }
    prefix
}

struct TseytinEncoder {
    prefix: String,
    counter: usize,
    clauses: Vec<Clause<String>>,
}

impl TseytinEncoder {
    fn fresh(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        name
    }

    fn emit(&mut self, atoms: Vec<Atom<String>>) {
        self.clauses.push(Clause::new(atoms));
    }

    /// Name of the variable standing for `formula`, emitting its definition
    fn name_of(&mut self, formula: &Formula) -> Result<String> {
        use Atom as A;

        if let Formula::Var(v) = formula {
            return Ok(v.clone());
        }
        let n = self.fresh();

        match formula {
            Formula::Not(c) => {
                let c = self.name_of(c)?;
                // n <-> !c
                self.emit(vec![A::negative(n.clone()), A::negative(c.clone())]);
                self.emit(vec![A::positive(n.clone()), A::positive(c)]);
            }
            Formula::And(l, r) => {
                let l = self.name_of(l)?;
                let r = self.name_of(r)?;
                // n <-> l & r
                self.emit(vec![A::negative(n.clone()), A::positive(l.clone())]);
                self.emit(vec![A::negative(n.clone()), A::positive(r.clone())]);
                self.emit(vec![A::positive(n.clone()), A::negative(l), A::negative(r)]);
            }
            Formula::Or(l, r) => {
                let l = self.name_of(l)?;
                let r = self.name_of(r)?;
                // n <-> l | r
                self.emit(vec![A::positive(n.clone()), A::negative(l.clone())]);
                self.emit(vec![A::positive(n.clone()), A::negative(r.clone())]);
                self.emit(vec![A::negative(n.clone()), A::positive(l), A::positive(r)]);
            }
            Formula::Impl(l, r) => {
                let l = self.name_of(l)?;
                let r = self.name_of(r)?;
                // n <-> (l -> r)
                self.emit(vec![A::positive(n.clone()), A::positive(l.clone())]);
                self.emit(vec![A::positive(n.clone()), A::negative(r.clone())]);
                self.emit(vec![A::negative(n.clone()), A::negative(l), A::positive(r)]);
            }
            Formula::Equiv(l, r) => {
                let l = self.name_of(l)?;
                let r = self.name_of(r)?;
                // n <-> (l <-> r)
                let (pos_l, neg_l) = (A::positive(l.clone()), A::negative(l));
                let (pos_r, neg_r) = (A::positive(r.clone()), A::negative(r));
                self.emit(vec![A::negative(n.clone()), neg_l.clone(), pos_r.clone()]);
                self.emit(vec![A::negative(n.clone()), pos_l.clone(), neg_r.clone()]);
                self.emit(vec![A::positive(n.clone()), pos_l, pos_r]);
                self.emit(vec![A::positive(n.clone()), neg_l, neg_r]);
            }
            other => {
                return Err(LogicError::FormulaConversion(format!(
                    "Tseytin transformation is only defined for propositional formulas, got {}",
                    other
                )))
            }
        }

        Ok(n)
    }
}
