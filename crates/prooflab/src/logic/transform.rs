//! Formula transformation passes: negation normal form, equivalence
//! elimination, standardizing apart and skolemization.

use super::formula::Formula;
use super::term::Term;
use std::collections::BTreeSet;

impl Formula {
    /// Convert to negation normal form.
    ///
    /// Implications and equivalences are eliminated, negations are pushed
    /// down to literals, through quantifiers and through modal operators.
    pub fn to_nnf(&self) -> Formula {
        nnf(self, false)
    }

    /// Rewrite every `A <=> B` as `(A -> B) & (B -> A)`
    pub fn eliminate_equivalences(&self) -> Formula {
        match self {
            Formula::Var(_) | Formula::Relation(_) => self.clone(),
            Formula::Not(c) => Formula::not(c.eliminate_equivalences()),
            Formula::Necessity(c) => Formula::necessarily(c.eliminate_equivalences()),
            Formula::Possibility(c) => Formula::possibly(c.eliminate_equivalences()),
            Formula::And(l, r) => {
                Formula::and(l.eliminate_equivalences(), r.eliminate_equivalences())
            }
            Formula::Or(l, r) => {
                Formula::or(l.eliminate_equivalences(), r.eliminate_equivalences())
            }
            Formula::Impl(l, r) => {
                Formula::implies(l.eliminate_equivalences(), r.eliminate_equivalences())
            }
            Formula::Equiv(l, r) => {
                let l = l.eliminate_equivalences();
                let r = r.eliminate_equivalences();
                Formula::and(
                    Formula::implies(l.clone(), r.clone()),
                    Formula::implies(r, l),
                )
            }
            Formula::Universal(v, c) => Formula::forall(v.clone(), c.eliminate_equivalences()),
            Formula::Existential(v, c) => Formula::exists(v.clone(), c.eliminate_equivalences()),
        }
    }

    /// Rename bound variables so that every quantifier binds a distinct name.
    ///
    /// This prevents variable capture when the same name is reused in
    /// different scopes (e.g. `(\ex X: P(X)) & (\all X: Q(X))`).
    pub fn standardize_apart(&self) -> Formula {
        let mut used = BTreeSet::new();
        standardize(self, &mut used)
    }

    /// Replace existential quantifiers by Skolem terms.
    ///
    /// Expects negation normal form with distinct bound variables. Skolem
    /// symbols are named `sk<n>` and never collide with symbols in `self`.
    pub fn skolemize(&self) -> Formula {
        let mut skolemizer = Skolemizer {
            counter: 0,
            universal_vars: Vec::new(),
            taken: self.symbols(),
        };
        skolemizer.run(self)
    }

    /// Strip all universal quantifiers, leaving the quantifier-free matrix
    pub fn drop_universals(&self) -> Formula {
        match self {
            Formula::Universal(_, c) => c.drop_universals(),
            Formula::Not(c) => Formula::not(c.drop_universals()),
            Formula::And(l, r) => Formula::and(l.drop_universals(), r.drop_universals()),
            Formula::Or(l, r) => Formula::or(l.drop_universals(), r.drop_universals()),
            _ => self.clone(),
        }
    }
}

fn nnf(formula: &Formula, negate: bool) -> Formula {
    match (formula, negate) {
        (Formula::Var(_), false) | (Formula::Relation(_), false) => formula.clone(),
        (Formula::Var(_), true) | (Formula::Relation(_), true) => Formula::not(formula.clone()),

        // Double negation - just flip and continue
        (Formula::Not(c), neg) => nnf(c, !neg),

        (Formula::And(l, r), false) => Formula::and(nnf(l, false), nnf(r, false)),
        // De Morgan: ~(A & B) = ~A | ~B
        (Formula::And(l, r), true) => Formula::or(nnf(l, true), nnf(r, true)),

        (Formula::Or(l, r), false) => Formula::or(nnf(l, false), nnf(r, false)),
        // De Morgan: ~(A | B) = ~A & ~B
        (Formula::Or(l, r), true) => Formula::and(nnf(l, true), nnf(r, true)),

        // A -> B = ~A | B
        (Formula::Impl(l, r), false) => Formula::or(nnf(l, true), nnf(r, false)),
        // ~(A -> B) = A & ~B
        (Formula::Impl(l, r), true) => Formula::and(nnf(l, false), nnf(r, true)),

        // A <=> B = (~A | B) & (A | ~B)
        (Formula::Equiv(l, r), false) => Formula::and(
            Formula::or(nnf(l, true), nnf(r, false)),
            Formula::or(nnf(l, false), nnf(r, true)),
        ),
        // ~(A <=> B) = (A | B) & (~A | ~B)
        (Formula::Equiv(l, r), true) => Formula::and(
            Formula::or(nnf(l, false), nnf(r, false)),
            Formula::or(nnf(l, true), nnf(r, true)),
        ),

        (Formula::Universal(v, c), false) => Formula::forall(v.clone(), nnf(c, false)),
        // ~(∀x.P) = ∃x.~P
        (Formula::Universal(v, c), true) => Formula::exists(v.clone(), nnf(c, true)),
        (Formula::Existential(v, c), false) => Formula::exists(v.clone(), nnf(c, false)),
        // ~(∃x.P) = ∀x.~P
        (Formula::Existential(v, c), true) => Formula::forall(v.clone(), nnf(c, true)),

        (Formula::Necessity(c), false) => Formula::necessarily(nnf(c, false)),
        (Formula::Necessity(c), true) => Formula::possibly(nnf(c, true)),
        (Formula::Possibility(c), false) => Formula::possibly(nnf(c, false)),
        (Formula::Possibility(c), true) => Formula::necessarily(nnf(c, true)),
    }
}

fn fresh_name(base: &str, used: &BTreeSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}_{}", base, i);
        if !used.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

fn standardize(formula: &Formula, used: &mut BTreeSet<String>) -> Formula {
    match formula {
        Formula::Var(_) | Formula::Relation(_) => formula.clone(),
        Formula::Not(c) => Formula::not(standardize(c, used)),
        Formula::Necessity(c) => Formula::necessarily(standardize(c, used)),
        Formula::Possibility(c) => Formula::possibly(standardize(c, used)),
        Formula::And(l, r) => {
            let l = standardize(l, used);
            Formula::and(l, standardize(r, used))
        }
        Formula::Or(l, r) => {
            let l = standardize(l, used);
            Formula::or(l, standardize(r, used))
        }
        Formula::Impl(l, r) => {
            let l = standardize(l, used);
            Formula::implies(l, standardize(r, used))
        }
        Formula::Equiv(l, r) => {
            let l = standardize(l, used);
            Formula::equiv(l, standardize(r, used))
        }
        Formula::Universal(v, c) | Formula::Existential(v, c) => {
            let name = fresh_name(v, used);
            used.insert(name.clone());
            let body = if &name == v {
                (**c).clone()
            } else {
                c.instantiate(v, &Term::var(name.clone()))
            };
            let body = standardize(&body, used);
            match formula {
                Formula::Universal(..) => Formula::forall(name, body),
                _ => Formula::exists(name, body),
            }
        }
    }
}

struct Skolemizer {
    counter: usize,
    universal_vars: Vec<String>,
    taken: BTreeSet<String>,
}

impl Skolemizer {
    fn next_symbol(&mut self) -> String {
        loop {
            let name = format!("sk{}", self.counter);
            self.counter += 1;
            if !self.taken.contains(&name) {
                self.taken.insert(name.clone());
                return name;
            }
        }
    }

    fn run(&mut self, formula: &Formula) -> Formula {
        match formula {
            Formula::And(l, r) => {
                let l = self.run(l);
                Formula::and(l, self.run(r))
            }
            Formula::Or(l, r) => {
                let l = self.run(l);
                Formula::or(l, self.run(r))
            }
            Formula::Universal(v, c) => {
                self.universal_vars.push(v.clone());
                let body = self.run(c);
                self.universal_vars.pop();
                Formula::forall(v.clone(), body)
            }
            Formula::Existential(v, c) => {
                let symbol = self.next_symbol();
                let skolem_term = if self.universal_vars.is_empty() {
                    Term::Constant(symbol)
                } else {
                    Term::Function(
                        symbol,
                        self.universal_vars.iter().map(|u| Term::var(u.clone())).collect(),
                    )
                };
                // The existential is eliminated, continue on its body
                let substituted = c.instantiate(v, &skolem_term);
                self.run(&substituted)
            }
            _ => formula.clone(),
        }
    }
}
