//! Terms and relations in first-order logic

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A term in first-order logic
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// A variable, bound by the nearest enclosing quantifier of the same name
    Variable(String),
    Constant(String),
    Function(String, Vec<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Term::Constant(name.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Function(name.into(), args)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Collect all variable names in this term
    pub fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            Term::Variable(v) => {
                vars.insert(v.clone());
            }
            Term::Constant(_) => {}
            Term::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }

    /// Collect constant and function names in this term
    pub fn collect_symbols(&self, symbols: &mut BTreeSet<String>) {
        match self {
            Term::Variable(_) => {}
            Term::Constant(c) => {
                symbols.insert(c.clone());
            }
            Term::Function(f, args) => {
                symbols.insert(f.clone());
                for arg in args {
                    arg.collect_symbols(symbols);
                }
            }
        }
    }

    /// Check whether variable `name` occurs anywhere in this term
    pub fn contains_variable(&self, name: &str) -> bool {
        match self {
            Term::Variable(v) => v == name,
            Term::Constant(_) => false,
            Term::Function(_, args) => args.iter().any(|arg| arg.contains_variable(name)),
        }
    }

    /// Rename every variable through `rename`
    pub fn rename_variables(&self, rename: &impl Fn(&str) -> String) -> Term {
        match self {
            Term::Variable(v) => Term::Variable(rename(v)),
            Term::Constant(_) => self.clone(),
            Term::Function(f, args) => Term::Function(
                f.clone(),
                args.iter().map(|arg| arg.rename_variables(rename)).collect(),
            ),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{}", v),
            Term::Constant(c) => write!(f, "{}", c),
            Term::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A relation (predicate applied to terms), the first-order literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub args: Vec<Term>,
}

impl Relation {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Relation {
            name: name.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        for arg in &self.args {
            arg.collect_variables(vars);
        }
    }

    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    pub fn rename_variables(&self, rename: &impl Fn(&str) -> String) -> Relation {
        Relation {
            name: self.name.clone(),
            args: self.args.iter().map(|t| t.rename_variables(rename)).collect(),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nested_function() {
        let t = Term::function("f", vec![Term::constant("a"), Term::var("X")]);
        let r = Relation::new("R", vec![t, Term::var("Y")]);
        assert_eq!(r.to_string(), "R(f(a,X),Y)");
    }

    #[test]
    fn test_variables_are_collected_through_functions() {
        let inner = Term::function("f", vec![Term::var("X")]);
        let t = Term::function("g", vec![inner, Term::var("Y")]);
        let r = Relation::new("P", vec![t]);
        let vars: Vec<String> = r.variables().into_iter().collect();
        assert_eq!(vars, vec!["X".to_string(), "Y".to_string()]);
    }

    #[test]
    fn test_rename_variables() {
        let r = Relation::new("P", vec![Term::var("X"), Term::constant("a")]);
        let renamed = r.rename_variables(&|v| format!("{}_1", v));
        assert_eq!(renamed.to_string(), "P(X_1,a)");
    }
}
