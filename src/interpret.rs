//! Parse direction: lines to [`Block`]s and [`Element`]s.
//!
//! The interpreter is a forward scan over a [`LineView`] with bounded
//! lookbehind (comments and the alias line above a key) and lookahead (the
//! span of a value or a block body). Recursive steps receive a narrower view
//! and report how many lines they consumed; the caller advances its own
//! cursor. Failures come back as [`ParseError`]s relative to the view that
//! was handed down, and every caller shifts them by the line and column
//! prefix it holds before returning them.

use crate::block::{Block, LineCache, TaggedLine};
use crate::classify::{
    has_depth, is_blank, is_block_line, is_comment, is_key_alias_line, is_key_line,
    is_nested_block_line,
};
use crate::collapsed::interpret_collapsed;
use crate::error::ParseError;
use crate::escape::{find_unescaped, unescape};
use crate::key::{BlockKey, Key};
use crate::syntax::{
    ALIAS_SPLIT, BLOCK_CLOSE, BLOCK_OPEN, COMMENT_MARKER, DICT_OPEN, EXPANDED_DICT_MARKER,
    EXPANDED_LIST_NODE, INDENT_WIDTH, KEY_SEPARATOR, LIST_OPEN, LITERAL_END, LITERAL_MARKER,
};
use crate::{Element, ElementMap};
use std::ops::Range;
use tracing::{debug, trace};

/// A window over a line buffer with a number of indent units stripped from
/// every line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LineView<'a> {
    lines: &'a [String],
    depth: usize,
}

impl<'a> LineView<'a> {
    pub(crate) fn new(lines: &'a [String]) -> Self {
        LineView { lines, depth: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    /// The line at `index` relative to this view. Whitespace-only lines too
    /// short to carry the stripped indentation read as empty.
    pub(crate) fn line(&self, index: usize) -> &'a str {
        let raw = self.lines[index].as_str();
        if has_depth(raw, self.depth) {
            &raw[self.depth * INDENT_WIDTH..]
        } else if is_blank(raw) {
            ""
        } else {
            raw
        }
    }

    pub(crate) fn slice(&self, range: Range<usize>) -> Self {
        LineView {
            lines: &self.lines[range],
            depth: self.depth,
        }
    }

    pub(crate) fn from(&self, start: usize) -> Self {
        self.slice(start.min(self.len())..self.len())
    }

    /// The same lines with one more indent unit stripped.
    pub(crate) fn deeper(&self) -> Self {
        LineView {
            lines: self.lines,
            depth: self.depth + 1,
        }
    }

    /// The line at `index` as it is cached for writing. Whitespace-only
    /// lines keep their source text, since re-indenting leaves them alone.
    pub(crate) fn cached_line(&self, index: usize) -> &'a str {
        let raw = self.lines[index].as_str();
        if is_blank(raw) {
            raw
        } else {
            self.line(index)
        }
    }

    /// Every line as cached for writing.
    pub(crate) fn to_vec(&self) -> Vec<String> {
        (0..self.len())
            .map(|i| self.cached_line(i).to_string())
            .collect()
    }

    /// Every line with the indentation stripped.
    pub(crate) fn texts(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.line(i).to_string()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Root,
    Nested,
}

/// Interprets a whole document.
pub(crate) fn interpret_document(lines: &[String]) -> Result<Block, ParseError> {
    debug!(lines = lines.len(), "interpreting document");
    interpret_block(LineView::new(lines), Scope::Root)
}

fn interpret_block(view: LineView<'_>, scope: Scope) -> Result<Block, ParseError> {
    let mut block = Block::new();
    let mut pending_alias: Option<usize> = None;
    let mut i = 0;

    while i < view.len() {
        let line = view.line(i);
        if is_key_line(line) {
            i = interpret_key_value(&mut block, view, i, pending_alias.take())?;
            continue;
        }
        if let Some(alias_at) = pending_alias {
            return Err(ParseError::new(alias_at, 0, "Invalid key alias location."));
        }

        if is_blank(line) {
            block
                .tagged_lines
                .push(TaggedLine::Blank(view.cached_line(i).to_string()));
        } else if is_comment(line) {
            block.tagged_lines.push(TaggedLine::Comment(line.to_string()));
        } else if is_key_alias_line(line) {
            pending_alias = Some(i);
        } else if is_block_line(line) {
            i = interpret_sub_block(&mut block, view, i)?;
            continue;
        } else if is_nested_block_line(line) && scope == Scope::Root {
            return Err(ParseError::new(
                i,
                0,
                "Root block cannot contain nested block.",
            ));
        } else {
            return Err(ParseError::new(i, 0, "Invalid line."));
        }
        i += 1;
    }

    if let Some(alias_at) = pending_alias {
        return Err(ParseError::new(alias_at, 0, "Invalid key alias location."));
    }
    trace!(
        keys = block.key_values.len(),
        blocks = block.blocks.len(),
        "interpreted block"
    );
    Ok(block)
}

/// Pops the comment tags directly above the current line.
fn take_comments(block: &mut Block) -> Vec<String> {
    let start = block
        .tagged_lines
        .iter()
        .rposition(|tag| !matches!(tag, TaggedLine::Comment(_)))
        .map_or(0, |index| index + 1);
    block
        .tagged_lines
        .drain(start..)
        .filter_map(|tag| match tag {
            TaggedLine::Comment(raw) => Some(raw),
            _ => None,
        })
        .collect()
}

/// Comment text of consecutive comment lines, top to bottom.
fn comment_text(raws: &[String]) -> Option<String> {
    if raws.is_empty() {
        return None;
    }
    let lines: Vec<&str> = raws
        .iter()
        .map(|raw| {
            let trimmed = raw.trim_start();
            trimmed.strip_prefix(COMMENT_MARKER).unwrap_or(trimmed)
        })
        .collect();
    Some(lines.join("\n"))
}

fn parse_aliases(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    let inner = trimmed.get(1..trimmed.len().checked_sub(1)?)?;
    Some(
        inner
            .split(ALIAS_SPLIT)
            .map(|alias| alias.trim().to_string())
            .collect(),
    )
}

/// Interprets the key line at `i` and its value; returns the index after the
/// value span.
fn interpret_key_value(
    block: &mut Block,
    view: LineView<'_>,
    i: usize,
    alias_at: Option<usize>,
) -> Result<usize, ParseError> {
    let line = view.line(i);
    let sep = find_unescaped(line, KEY_SEPARATOR)
        .ok_or_else(|| ParseError::new(i, 0, "Invalid line."))?;

    let name = unescape(line[..sep].trim());
    let mut key = Key::new(&name)
        .map_err(|_| ParseError::new(i, 0, "Key cannot be empty or white space."))?;

    let comments = take_comments(block);
    let mut key_lines = comments.clone();
    key = key.with_comment(comment_text(&comments));

    if let Some(alias_at) = alias_at {
        let raw = view.line(alias_at);
        let invalid = || ParseError::new(alias_at, 0, "Invalid key alias format.");
        let aliases = parse_aliases(raw).ok_or_else(invalid)?;
        key = key.with_aliases(aliases).map_err(|_| invalid())?;
        key_lines.push(raw.to_string());
    }
    key_lines.push(line[..sep].to_string());

    if block.key_values.contains_key(key.name()) {
        return Err(ParseError::new(
            i,
            0,
            &format!("Key name '{}' is not unique.", key.name()),
        ));
    }

    let below = view.from(i + 1);
    let (element, used) =
        interpret_value(&line[sep + 1..], below).map_err(|e| e.offset(i, 0))?;

    let mut value_lines = vec![line[sep + 1..].to_string()];
    value_lines.extend(below.slice(0..used).to_vec());

    block.tagged_lines.push(TaggedLine::KeyValue {
        name: key.name().to_string(),
        key_lines: LineCache::Cached(key_lines),
        value_lines: LineCache::Cached(value_lines),
    });
    block.key_values.insert(key, element);
    Ok(i + 1 + used)
}

fn parse_block_name(line: &str) -> String {
    let trimmed = line.trim_end();
    let inner = &trimmed[BLOCK_OPEN.len()..trimmed.len() - BLOCK_CLOSE.len()];
    unescape(inner.trim())
}

/// Interprets the block header at `i` and its body; returns the index after
/// the body.
fn interpret_sub_block(
    block: &mut Block,
    view: LineView<'_>,
    i: usize,
) -> Result<usize, ParseError> {
    let line = view.line(i);
    let name = parse_block_name(line);
    let key = BlockKey::new(&name)
        .map_err(|_| ParseError::new(i, 0, "Block name cannot be empty or white space."))?;
    if block.blocks.contains_key(key.name()) {
        return Err(ParseError::new(
            i,
            0,
            &format!("Block name '{}' is not unique.", key.name()),
        ));
    }

    let mut end = i + 1;
    while end < view.len() && (is_blank(view.line(end)) || has_depth(view.line(end), 1)) {
        end += 1;
    }
    while end > i + 1 && is_blank(view.line(end - 1)) {
        end -= 1;
    }
    let body = view.slice(i + 1..end);
    let child = interpret_block(body.deeper(), Scope::Nested)
        .map_err(|e| e.offset(i + 1, INDENT_WIDTH))?;

    let comments = take_comments(block);
    let key = key.with_comment(comment_text(&comments));
    let mut key_lines = comments;
    key_lines.push(line.to_string());

    block.tagged_lines.push(TaggedLine::Block {
        name: key.name().to_string(),
        key_lines: LineCache::Cached(key_lines),
        value_lines: LineCache::Cached(body.to_vec()),
    });
    block.blocks.insert(key, child);
    Ok(end)
}

/// Interprets a value from the text after a key separator (or list node)
/// and the lines below it.
///
/// Returns the element and the number of lines of `below` it spans. Error
/// lines count the first line as 0.
pub(crate) fn interpret_value(
    first: &str,
    below: LineView<'_>,
) -> Result<(Element, usize), ParseError> {
    let rest = first.trim();
    if rest.is_empty() {
        return interpret_indented(below);
    }
    if rest == LITERAL_MARKER {
        if let Some(end) = literal_end(below) {
            let element = if end == 0 {
                Element::Empty
            } else {
                let body: Vec<String> = below.slice(0..end).deeper().texts();
                Element::Scalar(body.join("\n"))
            };
            return Ok((element, end + 1));
        }
    } else if rest == EXPANDED_DICT_MARKER {
        if let Some(found) = interpret_dict_below(below)? {
            return Ok(found);
        }
    }
    Ok((Element::Scalar(unescape(rest)), 0))
}

/// A value that starts on the line below its key.
fn interpret_indented(below: LineView<'_>) -> Result<(Element, usize), ParseError> {
    for i in 0..below.len() {
        let line = below.line(i);
        if is_blank(line) {
            continue;
        }
        if !has_depth(line, 1) {
            break;
        }
        let body = &line[INDENT_WIDTH..];
        match body.chars().next() {
            Some(EXPANDED_LIST_NODE) => {
                let span = multi_line_span(below.from(i));
                let list = interpret_expanded_list(below.slice(i..i + span).deeper())
                    .map_err(|e| e.offset(i + 1, INDENT_WIDTH))?;
                return Ok((list, i + span));
            }
            Some(LIST_OPEN) | Some(DICT_OPEN) => {
                let element =
                    interpret_collapsed(body).map_err(|e| e.offset(i + 1, INDENT_WIDTH))?;
                return Ok((element, i + 1));
            }
            _ => break,
        }
    }
    Ok((Element::Empty, 0))
}

fn interpret_dict_below(below: LineView<'_>) -> Result<Option<(Element, usize)>, ParseError> {
    for i in 0..below.len() {
        let line = below.line(i);
        if is_blank(line) {
            continue;
        }
        if has_depth(line, 1) && is_key_line(&line[INDENT_WIDTH..]) {
            let span = multi_line_span(below.from(i));
            let dict = interpret_expanded_dict(below.slice(i..i + span).deeper())
                .map_err(|e| e.offset(i + 1, INDENT_WIDTH))?;
            return Ok(Some((dict, i + span)));
        }
        break;
    }
    Ok(None)
}

/// Number of lines an expanded list or dictionary starting at line 0 spans.
fn multi_line_span(view: LineView<'_>) -> usize {
    let mut end = 1;
    while end < view.len() {
        let line = view.line(end);
        let outdented = !is_blank(line) && !has_depth(line, 1);
        let foreign_comment = is_comment(line) && !has_depth(line, 2);
        if outdented || foreign_comment || is_nested_block_line(line) {
            break;
        }
        end += 1;
    }
    while end > 1 && is_blank(view.line(end - 1)) {
        end -= 1;
    }
    end
}

/// Index of the end marker closing a literal block, if the lines form one.
/// Blank lines belong to the body whatever their indentation.
fn literal_end(view: LineView<'_>) -> Option<usize> {
    (0..view.len())
        .find(|&i| {
            let line = view.line(i);
            !has_depth(line, 1) && !is_blank(line)
        })
        .filter(|&i| view.line(i).trim_end() == LITERAL_END)
}

fn interpret_expanded_list(view: LineView<'_>) -> Result<Element, ParseError> {
    let mut items = Vec::new();
    let mut i = 0;
    while i < view.len() {
        let line = view.line(i);
        if is_blank(line) {
            i += 1;
            continue;
        }
        let rest = line
            .strip_prefix(EXPANDED_LIST_NODE)
            .ok_or_else(|| ParseError::new(i, 0, "Invalid line."))?;
        let (item, used) = interpret_value(rest, view.from(i + 1)).map_err(|e| e.offset(i, 0))?;
        items.push(item);
        i += used + 1;
    }
    Ok(Element::List(items))
}

fn interpret_expanded_dict(view: LineView<'_>) -> Result<Element, ParseError> {
    let mut map = ElementMap::new();
    let mut i = 0;
    while i < view.len() {
        let line = view.line(i);
        if is_blank(line) {
            i += 1;
            continue;
        }
        if !is_key_line(line) {
            return Err(ParseError::new(i, 0, "Invalid line."));
        }
        let sep = find_unescaped(line, KEY_SEPARATOR)
            .ok_or_else(|| ParseError::new(i, 0, "Invalid line."))?;
        let key = unescape(line[..sep].trim());
        if key.trim().is_empty() {
            return Err(ParseError::new(
                i,
                0,
                "Key cannot be empty or white space in expanded dictionary.",
            ));
        }
        if map.contains_key(&key) {
            return Err(ParseError::new(i, 0, "Key must be unique."));
        }
        let (value, used) =
            interpret_value(&line[sep + 1..], view.from(i + 1)).map_err(|e| e.offset(i, 0))?;
        map.insert(key, value);
        i += used + 1;
    }
    Ok(Element::Dictionary(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|l| l.to_string()).collect()
    }

    fn parse(text: &[&str]) -> Result<Block, ParseError> {
        interpret_document(&lines(text))
    }

    fn value(text: &[&str]) -> (Element, usize) {
        let owned = lines(text);
        interpret_value(&owned[0], LineView::new(&owned[1..])).unwrap()
    }

    fn scalar(s: &str) -> Element {
        Element::from(s)
    }

    #[test]
    fn test_key_and_block() {
        let block = parse(&["a: 1", "", ">> b <<", "  c: 2"]).unwrap();
        assert_eq!(block.get("a"), Some(&scalar("1")));
        let inner = block.get_block("b").unwrap();
        assert_eq!(inner.get("c"), Some(&scalar("2")));
        assert_eq!(
            block.tagged_lines[2],
            TaggedLine::Block {
                name: "b".into(),
                key_lines: LineCache::Cached(lines(&[">> b <<"])),
                value_lines: LineCache::Cached(lines(&["  c: 2"])),
            }
        );
    }

    #[test]
    fn test_key_metadata_lookback() {
        let block = parse(&["# first", "#", "# third", "[p|@q]", "port: 80"]).unwrap();
        let (key, element) = block.find_key("@q").unwrap();
        assert_eq!(key.name(), "port");
        assert_eq!(key.comment(), Some(" first\n\n third"));
        assert_eq!(key.aliases(), ["p", "@q"]);
        assert_eq!(element, &scalar("80"));
        assert_eq!(block.tagged_lines.len(), 1);
    }

    #[test]
    fn test_comment_separated_by_blank_stays_free() {
        let block = parse(&["# free", "", "k: v"]).unwrap();
        assert_eq!(block.resolve_key("k").unwrap().comment(), None);
        assert_eq!(block.tagged_lines[0], TaggedLine::Comment("# free".into()));
    }

    #[test]
    fn test_dangling_alias() {
        let err = parse(&["[a]", "", "k: v"]).unwrap_err();
        assert_eq!(err, ParseError::new(0, 0, "Invalid key alias location."));
        let err = parse(&["k: v", "[a]"]).unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_invalid_alias_format() {
        let err = parse(&["[a|1b]", "k: v"]).unwrap_err();
        assert_eq!(err, ParseError::new(0, 0, "Invalid key alias format."));
    }

    #[test]
    fn test_uniqueness() {
        let err = parse(&["k: 1", "k: 2"]).unwrap_err();
        assert_eq!(err, ParseError::new(1, 0, "Key name 'k' is not unique."));
        let err = parse(&[">> b <<", ">> b <<"]).unwrap_err();
        assert_eq!(err.message, "Block name 'b' is not unique.");
    }

    #[test]
    fn test_root_rejects_nested_block() {
        let err = parse(&["a: 1", "  >> x <<"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::new(1, 0, "Root block cannot contain nested block.")
        );
    }

    #[test]
    fn test_nested_blocks() {
        let block = parse(&[
            ">> a <<",
            "  x: 1",
            "",
            "  >> b <<",
            "    y: 2",
            "",
            ">> c <<",
        ])
        .unwrap();
        let b = block.block_at(&["a", "b"]).unwrap();
        assert_eq!(b.get("y"), Some(&scalar("2")));
        assert!(block.get_block("c").unwrap().key_values.is_empty());
        assert_eq!(block.tagged_lines[1], TaggedLine::Blank(String::new()));
    }

    #[test]
    fn test_whitespace_only_lines_are_cached_raw() {
        let block = parse(&[">> b <<", "  x: 1", " ", "  y: 2"]).unwrap();
        let b = block.get_block("b").unwrap();
        assert_eq!(b.tagged_lines[1], TaggedLine::Blank(" ".to_string()));
        match &block.tagged_lines[0] {
            TaggedLine::Block { value_lines, .. } => assert_eq!(
                value_lines,
                &LineCache::Cached(lines(&["  x: 1", " ", "  y: 2"]))
            ),
            other => panic!("unexpected tag: {other:?}"),
        }
    }

    #[test]
    fn test_empty_block_name() {
        let err = parse(&[">>  <<"]).unwrap_err();
        assert_eq!(err.message, "Block name cannot be empty or white space.");
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(value(&["  spaced out  "]), (scalar("spaced out"), 0));
        assert_eq!(value(&["a\\nb"]), (scalar("a\nb"), 0));
        assert_eq!(value(&[""]), (Element::Empty, 0));
    }

    #[test]
    fn test_literal_block() {
        assert_eq!(
            value(&[" @", "  line one", "    # kept", "  ", "|"]),
            (scalar("line one\n  # kept\n"), 4)
        );
        assert_eq!(value(&["@", "|"]), (Element::Empty, 1));
        assert_eq!(value(&["@", "  never closed"]), (scalar("@"), 0));
    }

    #[test]
    fn test_expanded_dict_marker() {
        let (element, used) = value(&["$", "  a: 1", "  b:", "    - x", "next: 2"]);
        let mut map = ElementMap::new();
        map.insert("a".into(), scalar("1"));
        map.insert("b".into(), Element::List(vec![scalar("x")]));
        assert_eq!(element, Element::Dictionary(map));
        assert_eq!(used, 3);

        assert_eq!(value(&["$", "  - x"]), (scalar("$"), 0));
    }

    #[test]
    fn test_expanded_list_span_leaves_trailing_blank() {
        let (element, used) = value(&["", "  - a", "", "  - b", "", "k: v"]);
        assert_eq!(element, Element::List(vec![scalar("a"), scalar("b")]));
        assert_eq!(used, 3);
    }

    #[test]
    fn test_list_stops_at_outdented_comment() {
        let (element, used) = value(&["", "  - a", "  # note", "  - b"]);
        assert_eq!(element, Element::List(vec![scalar("a")]));
        assert_eq!(used, 1);
    }

    #[test]
    fn test_nested_expanded_list() {
        let (element, _) = value(&["", "  -", "    - a", "    - b", "  - c"]);
        assert_eq!(
            element,
            Element::List(vec![
                Element::List(vec![scalar("a"), scalar("b")]),
                scalar("c")
            ])
        );
    }

    #[test]
    fn test_collapsed_below_key() {
        let (element, used) = value(&["", "", "  [\"x\", \"y\", \"z\"]"]);
        assert_eq!(
            element,
            Element::List(vec![scalar("x"), scalar("y"), scalar("z")])
        );
        assert_eq!(used, 2);
    }

    #[test]
    fn test_indented_other_is_empty() {
        let err = parse(&["k:", "  stray"]).unwrap_err();
        assert_eq!(err, ParseError::new(1, 0, "Invalid line."));
    }

    #[test]
    fn test_error_offsets_cross_every_boundary() {
        let err = parse(&[">> b <<", "  k:", "    - a", "    -", "      [1]"]).unwrap_err();
        assert_eq!(err, ParseError::new(4, 7, "Unknown character."));
    }

    #[test]
    fn test_expanded_dict_errors() {
        let owned = lines(&["$", "  a: 1", "  a: 2"]);
        let err = interpret_value(&owned[0], LineView::new(&owned[1..])).unwrap_err();
        assert_eq!(err, ParseError::new(2, 2, "Key must be unique."));
    }

    #[test]
    fn test_value_cache_keeps_raw_spacing() {
        let block = parse(&["k:   spaced", "list:", "  - a"]).unwrap();
        assert_eq!(
            block.tagged_lines[1],
            TaggedLine::KeyValue {
                name: "list".into(),
                key_lines: LineCache::Cached(lines(&["list"])),
                value_lines: LineCache::Cached(lines(&["", "  - a"])),
            }
        );
        match &block.tagged_lines[0] {
            TaggedLine::KeyValue { value_lines, .. } => {
                assert_eq!(value_lines.lines().unwrap(), ["   spaced"]);
            }
            other => panic!("unexpected tag {other:?}"),
        }
    }
}
