//! Parsers for clause sets written out directly
//!
//! Two notations are accepted: the flat `a,b;!c,d` syntax and a DIMACS-like
//! `a b 0 -c` syntax where `0` separates clauses.

use super::lexer::char_offset;
use crate::clause::{Atom, Clause, ClauseSet};
use crate::error::{LogicError, Result};

/// Parse `a,b;!c,d` into `{a,b},{!c,d}`
pub fn parse_clause_set(text: &str) -> Result<ClauseSet<String>> {
    if text.trim().is_empty() {
        return Err(LogicError::format("Empty clause set", 0));
    }

    let mut clauses = Vec::new();
    for (clause_pos, clause_text) in split_with_offsets(text, 0, ';') {
        if clause_text.trim().is_empty() {
            return Err(LogicError::format("Empty clause", char_offset(text, clause_pos)));
        }

        let mut atoms = Vec::new();
        for (atom_pos, atom_text) in split_with_offsets(clause_text, clause_pos, ',') {
            let trimmed = atom_text.trim_start();
            let pos = atom_pos + (atom_text.len() - trimmed.len());
            let trimmed = trimmed.trim_end();
            if trimmed.is_empty() {
                return Err(LogicError::format("Empty atom", char_offset(text, pos)));
            }
            atoms.push(parse_atom(text, trimmed, pos, '!')?);
        }
        clauses.push(Clause::new(atoms));
    }

    Ok(ClauseSet::new(clauses))
}

/// Parse `a b 0 -c` into `{a,b},{!c}`
pub fn parse_dimacs_like(text: &str) -> Result<ClauseSet<String>> {
    let mut clauses = Vec::new();
    let mut current: Vec<Atom<String>> = Vec::new();
    let mut last_separator = None;

    for (pos, word) in words_with_offsets(text) {
        if word == "0" {
            if current.is_empty() {
                return Err(LogicError::format("Empty clause", char_offset(text, pos)));
            }
            clauses.push(Clause::new(std::mem::take(&mut current)));
            last_separator = Some(pos);
        } else {
            current.push(parse_atom(text, word, pos, '-')?);
        }
    }

    if current.is_empty() {
        return Err(match last_separator {
            Some(pos) => {
                LogicError::format("Trailing clause separator '0'", char_offset(text, pos))
            }
            None => LogicError::format("Empty clause set", 0),
        });
    }
    clauses.push(Clause::new(current));

    Ok(ClauseSet::new(clauses))
}

/// Parse one atom with an optional single negation prefix.
///
/// `pos` is the byte offset of `word` in `text`.
fn parse_atom(text: &str, word: &str, pos: usize, negation: char) -> Result<Atom<String>> {
    let (negated, ident, ident_pos) = match word.strip_prefix(negation) {
        Some(rest) => (true, rest, pos + negation.len_utf8()),
        None => (false, word, pos),
    };

    if ident.starts_with(negation) {
        return Err(LogicError::format(
            format!("Repeated negation '{}'", negation),
            char_offset(text, ident_pos),
        ));
    }
    if ident.is_empty() {
        return Err(LogicError::format("Expected an identifier", char_offset(text, ident_pos)));
    }
    if let Some((i, c)) = ident
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(LogicError::format(
            format!("Invalid character '{}' in identifier", c),
            char_offset(text, ident_pos + i),
        ));
    }

    Ok(Atom::new(ident.to_string(), negated))
}

/// Split at `sep`, pairing each part with its byte offset (shifted by `base`)
fn split_with_offsets(s: &str, base: usize, sep: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == sep {
            parts.push((base + start, &s[start..i]));
            start = i + c.len_utf8();
        }
    }
    parts.push((base + start, &s[start..]));
    parts
}

/// Whitespace-separated words with their byte offsets
fn words_with_offsets(s: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(st)) => {
                words.push((st, &s[st..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(st) = start {
        words.push((st, &s[st..]));
    }
    words
}
