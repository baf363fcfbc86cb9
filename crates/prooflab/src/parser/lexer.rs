//! Tokenizer for formula input

use crate::error::{LogicError, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{map, value},
    IResult,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier starting with an uppercase letter
    CapIdent,
    /// Any other identifier (lowercase or numeric start)
    LowIdent,
    Not,
    And,
    Or,
    Impl,
    Equiv,
    All,
    Ex,
    Box,
    Diamond,
    LParen,
    RParen,
    Comma,
    Colon,
    Turnstile,
}

impl TokenKind {
    pub fn is_identifier(&self) -> bool {
        matches!(self, TokenKind::CapIdent | TokenKind::LowIdent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    /// Character offset of the token in the input
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.spelling)
    }
}

/// Parse an operator or punctuation token
fn parse_operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Equiv, alt((tag("<->"), tag("<=>")))),
        value(TokenKind::Diamond, tag("<>")),
        value(TokenKind::Impl, tag("->")),
        value(TokenKind::Turnstile, tag("|-")),
        value(TokenKind::Box, tag("[]")),
        value(TokenKind::All, tag("\\all")),
        value(TokenKind::Ex, tag("\\ex")),
        value(TokenKind::Not, char('!')),
        value(TokenKind::And, char('&')),
        value(TokenKind::Or, char('|')),
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Colon, char(':')),
    ))(input)
}

/// Parse an identifier (alphanumeric and underscores)
fn parse_identifier(input: &str) -> IResult<&str, TokenKind> {
    map(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        |ident: &str| {
            if ident.starts_with(|c: char| c.is_ascii_uppercase()) {
                TokenKind::CapIdent
            } else {
                TokenKind::LowIdent
            }
        },
    )(input)
}

fn parse_token(input: &str) -> IResult<&str, TokenKind> {
    alt((parse_operator, parse_identifier))(input)
}

/// Character offset of byte position `byte_pos` in `input`
pub(crate) fn char_offset(input: &str, byte_pos: usize) -> usize {
    input[..byte_pos].chars().count()
}

/// Split `input` into tokens, rejecting unknown characters with their offset
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let byte_pos = input.len() - rest.len();
        match parse_token(rest) {
            Ok((remaining, kind)) => {
                let spelling = &rest[..rest.len() - remaining.len()];
                tokens.push(Token {
                    kind,
                    spelling: spelling.to_string(),
                    offset: char_offset(input, byte_pos),
                });
                rest = remaining.trim_start();
            }
            Err(_) => {
                let c = rest.chars().next().unwrap_or(' ');
                return Err(LogicError::format(
                    format!("Unexpected character '{}'", c),
                    char_offset(input, byte_pos),
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("!a & B | c -> d <-> e <=> f"),
            vec![
                Not, LowIdent, And, CapIdent, Or, LowIdent, Impl, LowIdent, Equiv, LowIdent, Equiv,
                LowIdent
            ]
        );
        assert_eq!(kinds("[]<>a"), vec![Box, Diamond, LowIdent]);
        assert_eq!(
            kinds("\\all X: R(X)"),
            vec![All, CapIdent, Colon, CapIdent, LParen, CapIdent, RParen]
        );
        assert_eq!(kinds("a, b |- c"), vec![LowIdent, Comma, LowIdent, Turnstile, LowIdent]);
    }

    #[test]
    fn test_offsets_count_characters() {
        let tokens = tokenize("  ab  & c").unwrap();
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[1].offset, 6);
        assert_eq!(tokens[2].spelling, "c");
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("a & $b").unwrap_err();
        assert_eq!(err, LogicError::format("Unexpected character '$'", 4));
    }
}
