//! Recursive-descent parsers for propositional, first-order and modal formulas
//!
//! Precedence, loosest first: `<->`/`<=>`, `->` (right associative), `|`,
//! `&`, then the prefix operators `!`, `[]`, `<>`, `\all`, `\ex`.

use super::lexer::{tokenize, Token, TokenKind};
use crate::error::{LogicError, Result};
use crate::logic::{Formula, Relation, Term};
use crate::misc::log::targets;

/// Which formula language the parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Propositional,
    FirstOrder,
    Modal,
}

/// Parse a propositional formula
pub fn parse_prop(text: &str) -> Result<Formula> {
    parse_formula(text, Dialect::Propositional)
}

/// Parse a closed first-order formula
pub fn parse_fo(text: &str) -> Result<Formula> {
    parse_formula(text, Dialect::FirstOrder)
}

/// Parse a propositional modal formula
pub fn parse_modal(text: &str) -> Result<Formula> {
    parse_formula(text, Dialect::Modal)
}

pub fn parse_formula(text: &str, dialect: Dialect) -> Result<Formula> {
    let tokens = tokenize(text)?;
    let end = text.chars().count();
    let formula = FormulaParser::new(&tokens, end, dialect).parse_complete()?;
    log::debug!(target: targets::PARSER, "parsed {:?} formula {}", dialect, formula);
    Ok(formula)
}

/// Parse a single first-order term.
///
/// With `allow_variables`, capitalized identifiers are free variables;
/// otherwise the term has to be ground.
pub fn parse_term(text: &str, allow_variables: bool) -> Result<Term> {
    let tokens = tokenize(text)?;
    let end = text.chars().count();
    let mut parser = FormulaParser::new(&tokens, end, Dialect::FirstOrder);
    parser.free_variables = allow_variables;
    let term = parser.parse_term()?;
    parser.expect_end()?;
    Ok(term)
}

/// Parse `φ1, …, φn |- ψ1, …, ψm`; a plain formula list means `|- φ, …`
pub fn parse_sequent(text: &str, dialect: Dialect) -> Result<(Vec<Formula>, Vec<Formula>)> {
    let tokens = tokenize(text)?;
    let end = text.chars().count();

    let turnstile = tokens.iter().position(|t| t.kind == TokenKind::Turnstile);
    let (left, right) = match turnstile {
        Some(idx) => {
            let rest = &tokens[idx + 1..];
            if let Some(second) = rest.iter().find(|t| t.kind == TokenKind::Turnstile) {
                let msg = "Sequent contains more than one '|-'";
                return Err(LogicError::format(msg, second.offset));
            }
            let left_end = tokens[idx].offset;
            (
                parse_formula_list(&tokens[..idx], left_end, dialect)?,
                parse_formula_list(&tokens[idx + 1..], end, dialect)?,
            )
        }
        None => (Vec::new(), parse_formula_list(&tokens, end, dialect)?),
    };

    if left.is_empty() && right.is_empty() {
        return Err(LogicError::format("Expected a formula", end));
    }
    Ok((left, right))
}

/// Split a token slice at top-level commas and parse each part
fn parse_formula_list(tokens: &[Token], end: usize, dialect: Dialect) -> Result<Vec<Formula>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut formulas = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                let mut parser = FormulaParser::new(&tokens[start..i], token.offset, dialect);
                formulas.push(parser.parse_complete()?);
                start = i + 1;
            }
            _ => {}
        }
    }
    formulas.push(FormulaParser::new(&tokens[start..], end, dialect).parse_complete()?);
    Ok(formulas)
}

struct FormulaParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Offset reported for a premature end of input
    end: usize,
    dialect: Dialect,
    /// Quantified variables in scope, innermost last
    bound: Vec<String>,
    /// Accept unbound capitalized identifiers as variables
    free_variables: bool,
}

impl<'t> FormulaParser<'t> {
    fn new(tokens: &'t [Token], end: usize, dialect: Dialect) -> Self {
        FormulaParser {
            tokens,
            pos: 0,
            end,
            dialect,
            bound: Vec::new(),
            free_variables: false,
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> LogicError {
        match self.peek() {
            Some(token) => LogicError::format(
                format!("Unexpected token {}, expected {}", token, expected),
                token.offset,
            ),
            None => LogicError::format(
                format!("Unexpected end of input, expected {}", expected),
                self.end,
            ),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'t Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(_) => Err(self.unexpected("end of input")),
        }
    }

    fn parse_complete(&mut self) -> Result<Formula> {
        if self.tokens.is_empty() {
            return Err(LogicError::format("Expected a formula", self.end));
        }
        let formula = self.parse_equiv()?;
        self.expect_end()?;
        Ok(formula)
    }

    fn parse_equiv(&mut self) -> Result<Formula> {
        let mut left = self.parse_impl()?;
        while self.peek_kind() == Some(TokenKind::Equiv) {
            self.advance();
            let right = self.parse_impl()?;
            left = Formula::equiv(left, right);
        }
        Ok(left)
    }

    fn parse_impl(&mut self) -> Result<Formula> {
        let left = self.parse_or()?;
        if self.peek_kind() == Some(TokenKind::Impl) {
            self.advance();
            let right = self.parse_impl()?;
            return Ok(Formula::implies(left, right));
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Formula> {
        let mut left = self.parse_and()?;
        while self.peek_kind() == Some(TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Formula::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Formula> {
        let mut left = self.parse_unary()?;
        while self.peek_kind() == Some(TokenKind::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = Formula::and(left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Formula> {
        match self.peek_kind() {
            Some(TokenKind::Not) => {
                self.advance();
                Ok(Formula::not(self.parse_unary()?))
            }
            Some(TokenKind::Box) if self.dialect == Dialect::Modal => {
                self.advance();
                Ok(Formula::necessarily(self.parse_unary()?))
            }
            Some(TokenKind::Diamond) if self.dialect == Dialect::Modal => {
                self.advance();
                Ok(Formula::possibly(self.parse_unary()?))
            }
            Some(TokenKind::All) | Some(TokenKind::Ex) if self.dialect == Dialect::FirstOrder => {
                self.parse_quantifier()
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_quantifier(&mut self) -> Result<Formula> {
        let universal = self.advance().map(|t| t.kind) == Some(TokenKind::All);
        let var = self.expect(TokenKind::CapIdent, "a capitalized variable")?.spelling.clone();
        self.expect(TokenKind::Colon, "':'")?;

        self.bound.push(var.clone());
        let body = self.parse_unary();
        self.bound.pop();
        let body = body?;

        Ok(if universal {
            Formula::forall(var, body)
        } else {
            Formula::exists(var, body)
        })
    }

    fn parse_atom(&mut self) -> Result<Formula> {
        let token = match self.peek() {
            Some(token) => token,
            None => return Err(self.unexpected("a formula")),
        };

        match token.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_equiv()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::CapIdent | TokenKind::LowIdent if self.dialect != Dialect::FirstOrder => {
                self.advance();
                Ok(Formula::var(token.spelling.clone()))
            }
            TokenKind::CapIdent => self.parse_relation(),
            TokenKind::LowIdent => Err(LogicError::format(
                format!(
                    "Unexpected token {}, relation names have to start with an uppercase letter",
                    token
                ),
                token.offset,
            )),
            _ => Err(self.unexpected("a formula")),
        }
    }

    fn parse_relation(&mut self) -> Result<Formula> {
        let token = self.expect(TokenKind::CapIdent, "a relation")?;
        if self.bound.contains(&token.spelling) {
            return Err(LogicError::format(
                format!("Bound variable {} used as a relation", token),
                token.offset,
            ));
        }
        let args = if self.peek_kind() == Some(TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Formula::Relation(Relation::new(token.spelling.clone(), args)))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Term>> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = vec![self.parse_term()?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.advance();
            args.push(self.parse_term()?);
        }
        self.expect(TokenKind::RParen, "',' or ')'")?;
        Ok(args)
    }

    fn parse_term(&mut self) -> Result<Term> {
        let token = match self.peek() {
            Some(token) if token.kind.is_identifier() => token,
            _ => return Err(self.unexpected("a term")),
        };
        self.advance();

        match token.kind {
            TokenKind::CapIdent => {
                if self.free_variables || self.bound.contains(&token.spelling) {
                    Ok(Term::var(token.spelling.clone()))
                } else {
                    Err(LogicError::format(
                        format!("Unbound variable {}", token),
                        token.offset,
                    ))
                }
            }
            _ if self.peek_kind() == Some(TokenKind::LParen) => {
                let args = self.parse_arguments()?;
                Ok(Term::function(token.spelling.clone(), args))
            }
            _ => Ok(Term::constant(token.spelling.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let f = parse_prop("a & b | c -> d <-> e").unwrap();
        assert_eq!(f.to_string(), "((((a ∧ b) ∨ c) → d) <=> e)");
    }

    #[test]
    fn test_implication_is_right_associative() {
        let f = parse_prop("a -> b -> c").unwrap();
        assert_eq!(f.to_string(), "(a → (b → c))");
    }

    #[test]
    fn test_and_is_left_associative() {
        let f = parse_prop("a & b & c").unwrap();
        assert_eq!(f.to_string(), "((a ∧ b) ∧ c)");
    }

    #[test]
    fn test_negation_and_parentheses() {
        let f = parse_prop("!(a | !b)").unwrap();
        assert_eq!(f.to_string(), "¬(a ∨ ¬b)");
    }

    #[test]
    fn test_unexpected_token_position() {
        let err = parse_prop("a & )").unwrap_err();
        assert_eq!(
            err,
            LogicError::format("Unexpected token ')', expected a formula", 4)
        );
    }

    #[test]
    fn test_premature_end() {
        match parse_prop("(a | b").unwrap_err() {
            LogicError::InvalidFormulaFormat { position, .. } => assert_eq!(position, 6),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse_prop("a b").is_err());
        assert!(parse_prop("").is_err());
    }

    #[test]
    fn test_quantifiers_rejected_outside_first_order() {
        assert!(parse_prop("\\all X: a").is_err());
        assert!(parse_prop("[]a").is_err());
    }

    #[test]
    fn test_first_order_quantifier_scope() {
        let f = parse_fo("\\all X: R(X) & Q").unwrap();
        assert_eq!(f.to_string(), "((∀X: R(X)) ∧ Q)");

        let g = parse_fo("\\ex X: (R(X) & Q(f(X), a))").unwrap();
        assert_eq!(g.to_string(), "(∃X: (R(X) ∧ Q(f(X),a)))");
    }

    #[test]
    fn test_unbound_variable_rejected() {
        let err = parse_fo("R(X)").unwrap_err();
        assert_eq!(err, LogicError::format("Unbound variable 'X'", 2));
    }

    #[test]
    fn test_lowercase_relation_rejected() {
        assert!(parse_fo("r(a)").is_err());
        assert!(parse_fo("R()").is_err());
    }

    #[test]
    fn test_modal_operators() {
        let f = parse_modal("[]a -> <>!b").unwrap();
        assert_eq!(f, Formula::implies(
            Formula::necessarily(Formula::var("a")),
            Formula::possibly(Formula::not(Formula::var("b"))),
        ));
    }

    #[test]
    fn test_parse_term() {
        assert_eq!(
            parse_term("f(a, g(b))", false).unwrap(),
            Term::function(
                "f",
                vec![Term::constant("a"), Term::function("g", vec![Term::constant("b")])]
            )
        );
        assert!(parse_term("X", false).is_err());
        assert_eq!(parse_term("X", true).unwrap(), Term::var("X"));
    }

    #[test]
    fn test_parse_sequent() {
        let (left, right) = parse_sequent("a, b & c |- d", Dialect::Propositional).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(right, vec![Formula::var("d")]);

        let (left, right) = parse_sequent("a -> b", Dialect::Propositional).unwrap();
        assert!(left.is_empty());
        assert_eq!(right.len(), 1);

        let (left, right) = parse_sequent("\\all X: R(X, a) |- ", Dialect::FirstOrder).unwrap();
        assert_eq!(left.len(), 1);
        assert!(right.is_empty());

        assert!(parse_sequent("a |- b |- c", Dialect::Propositional).is_err());
        assert!(parse_sequent("a,,b", Dialect::Propositional).is_err());
    }
}
