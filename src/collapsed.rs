//! Tokenizer for collapsed lists and dictionaries.
//!
//! A collapsed composite sits on a single line: `["a", null, ["b"]]` or
//! `{"k": "v", "n": null}`. Scalars are always quoted, `null` is the empty
//! element, and composites nest. Columns in errors count characters from the
//! opening bracket.

use crate::error::ParseError;
use crate::escape::{unescape, ESCAPE_CHAR};
use crate::syntax::{
    DICT_CLOSE, DICT_OPEN, KEY_SEPARATOR, LIST_CLOSE, LIST_OPEN, NULL_TOKEN, QUOTE, SPLIT,
};
use crate::{Element, ElementMap};

const NOT_VALID: &str = "The format of this element is not valid.";

/// Interprets one collapsed composite. Trailing whitespace is ignored.
pub(crate) fn interpret_collapsed(text: &str) -> Result<Element, ParseError> {
    let chars: Vec<char> = text.trim_end().chars().collect();
    match chars.first() {
        Some(&LIST_OPEN) => collapsed_list(&chars),
        Some(&DICT_OPEN) => collapsed_dict(&chars),
        _ => Err(ParseError::new(0, 0, NOT_VALID)),
    }
}

fn closing_of(open: char) -> Option<char> {
    match open {
        LIST_OPEN => Some(LIST_CLOSE),
        DICT_OPEN => Some(DICT_CLOSE),
        QUOTE => Some(QUOTE),
        _ => None,
    }
}

/// Index of the character closing the token opened at `start`.
///
/// Brackets inside quotes do not count, and inside quotes a backslash hides
/// the character after it.
fn find_token_end(chars: &[char], start: usize) -> Option<usize> {
    let open = *chars.get(start)?;
    let close = closing_of(open)?;
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut i = start;
    while i < chars.len() {
        let ch = chars[i];
        if ch == QUOTE {
            in_quote = !in_quote;
        } else if in_quote && ch == ESCAPE_CHAR {
            i += 2;
            continue;
        }
        if !in_quote {
            if ch == open {
                depth += 1;
            }
            if ch == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn is_null_at(chars: &[char], i: usize) -> bool {
    let token: Vec<char> = NULL_TOKEN.chars().collect();
    chars[i..].starts_with(&token)
}

/// Reads the value token starting at `i`; returns it with the index of its
/// last character.
fn value_token(chars: &[char], i: usize) -> Result<(Element, usize), ParseError> {
    match chars[i] {
        QUOTE => {
            let end = find_token_end(chars, i)
                .ok_or_else(|| ParseError::new(0, i, "Bracket not closed."))?;
            let content: String = chars[i + 1..end].iter().collect();
            Ok((Element::Scalar(unescape(&content)), end))
        }
        LIST_OPEN | DICT_OPEN => {
            let end = find_token_end(chars, i)
                .ok_or_else(|| ParseError::new(0, i, "Bracket not closed."))?;
            let inner = &chars[i..=end];
            let element = if chars[i] == LIST_OPEN {
                collapsed_list(inner)
            } else {
                collapsed_dict(inner)
            };
            Ok((element.map_err(|e| e.offset(0, i))?, end))
        }
        _ if is_null_at(chars, i) => Ok((Element::Empty, i + NULL_TOKEN.len() - 1)),
        _ => Err(ParseError::new(0, i, "Unknown character.")),
    }
}

/// Checks that the whole slice is one closed token; returns the index of
/// its closing character.
fn whole_token(chars: &[char]) -> Result<usize, ParseError> {
    let last = chars.len() - 1;
    match find_token_end(chars, 0) {
        Some(end) if end == last => Ok(last),
        _ => Err(ParseError::new(0, 0, NOT_VALID)),
    }
}

fn collapsed_list(chars: &[char]) -> Result<Element, ParseError> {
    let last = whole_token(chars)?;
    let mut items = Vec::new();
    let mut expect_item = true;
    let mut last_split: Option<usize> = None;
    let mut i = 1;

    while i < last {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        if ch == SPLIT {
            if expect_item {
                return Err(ParseError::new(0, i, "Unnecessary split symbol."));
            }
            expect_item = true;
            last_split = Some(i);
            i += 1;
            continue;
        }
        if !expect_item {
            return Err(ParseError::new(0, i, "Missing split symbol."));
        }
        let (item, end) = value_token(chars, i)?;
        items.push(item);
        expect_item = false;
        i = end + 1;
    }

    match last_split {
        Some(split) if expect_item => Err(ParseError::new(0, split, "Unnecessary split symbol.")),
        _ => Ok(Element::List(items)),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
    Key,
    KeySeparator,
    Value,
    Split,
}

fn collapsed_dict(chars: &[char]) -> Result<Element, ParseError> {
    let last = whole_token(chars)?;
    let mut map = ElementMap::new();
    let mut expect = Expect::Key;
    let mut pending_key: Option<String> = None;
    let mut last_split: Option<usize> = None;
    let mut i = 1;

    while i < last {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }
        match expect {
            Expect::Key => match ch {
                SPLIT => return Err(ParseError::new(0, i, "Unnecessary split symbol.")),
                KEY_SEPARATOR => return Err(ParseError::new(0, i, "Missing key.")),
                QUOTE => {
                    let (key, end) = value_token(chars, i)?;
                    let key = match key {
                        Element::Scalar(key) => key,
                        _ => return Err(ParseError::new(0, i, "Invalid key type.")),
                    };
                    if map.contains_key(&key) {
                        return Err(ParseError::new(0, i, "Key must be unique."));
                    }
                    pending_key = Some(key);
                    expect = Expect::KeySeparator;
                    i = end + 1;
                }
                LIST_OPEN | DICT_OPEN => {
                    return Err(ParseError::new(0, i, "Invalid key type."));
                }
                _ if is_null_at(chars, i) => {
                    return Err(ParseError::new(
                        0,
                        i,
                        "Invalid key type. Key cannot be null.",
                    ));
                }
                _ => return Err(ParseError::new(0, i, "Unknown character.")),
            },
            Expect::KeySeparator => {
                if ch != KEY_SEPARATOR {
                    return Err(ParseError::new(0, i, "Missing key symbol."));
                }
                expect = Expect::Value;
                i += 1;
            }
            Expect::Value => match ch {
                SPLIT => return Err(ParseError::new(0, i, "Missing value.")),
                KEY_SEPARATOR => return Err(ParseError::new(0, i, "Unnecessary key symbol.")),
                _ => {
                    let (value, end) = value_token(chars, i)?;
                    if let Some(key) = pending_key.take() {
                        map.insert(key, value);
                    }
                    expect = Expect::Split;
                    i = end + 1;
                }
            },
            Expect::Split => match ch {
                SPLIT => {
                    expect = Expect::Key;
                    last_split = Some(i);
                    i += 1;
                }
                KEY_SEPARATOR => return Err(ParseError::new(0, i, "Unnecessary key symbol.")),
                _ => {
                    return Err(ParseError::new(
                        0,
                        i,
                        "Missing split symbol of key value pair.",
                    ));
                }
            },
        }
    }

    match (expect, last_split) {
        (Expect::Key, Some(split)) => Err(ParseError::new(0, split, "Unnecessary split symbol.")),
        (Expect::KeySeparator, _) => Err(ParseError::new(0, last, "Missing key symbol.")),
        (Expect::Value, _) => Err(ParseError::new(0, last, "Missing value.")),
        _ => Ok(Element::Dictionary(map)),
    }
}
