//! Write direction: blocks to lines.
//!
//! A block is either replayed from its tagged lines, regenerating only the
//! halves marked stale, or regenerated top-down from the model when its
//! clear-parse flag is set or the caller forces it. Regeneration propagates
//! to every nested block below the regenerated one.

use crate::block::{Block, TaggedLine};
use crate::classify::indent_block;
use crate::element::weld;
use crate::key::Key;
use crate::options::FormatPolicy;
use crate::syntax::KEY_SEPARATOR;
use crate::Element;
use tracing::trace;

/// Renders `block` into lines relative to its own indentation.
pub(crate) fn write_block(block: &Block, policy: &FormatPolicy, force: bool) -> Vec<String> {
    if force || block.is_clear_parse() {
        trace!(
            keys = block.key_values.len(),
            blocks = block.blocks.len(),
            "regenerating block"
        );
        regenerate(block, policy)
    } else {
        replay(block, policy)
    }
}

fn replay(block: &Block, policy: &FormatPolicy) -> Vec<String> {
    let mut out = Vec::new();
    for tag in &block.tagged_lines {
        match tag {
            TaggedLine::Blank(line) | TaggedLine::Comment(line) => out.push(line.clone()),
            TaggedLine::KeyValue {
                name,
                key_lines,
                value_lines,
            } => {
                let Some((key, element)) = block.key_values.get_key_value(name.as_str()) else {
                    continue;
                };
                out.extend(key_value_lines(
                    key,
                    element,
                    key_lines.lines(),
                    value_lines.lines(),
                    policy,
                ));
            }
            TaggedLine::Block {
                name,
                key_lines,
                value_lines,
            } => {
                let Some((key, child)) = block.blocks.get_key_value(name.as_str()) else {
                    continue;
                };
                match key_lines.lines() {
                    Some(cached) => out.extend_from_slice(cached),
                    None => out.extend(key.to_lines()),
                }
                match value_lines.lines() {
                    Some(cached) => {
                        trace!(block = name.as_str(), "replaying cached block body");
                        out.extend_from_slice(cached);
                    }
                    None => {
                        trace!(block = name.as_str(), "rewriting stale block body");
                        out.extend(indent_block(write_block(child, policy, false)));
                    }
                }
            }
        }
    }
    out
}

fn regenerate(block: &Block, policy: &FormatPolicy) -> Vec<String> {
    let mut out = Vec::new();
    for (index, (key, element)) in block.key_values.iter().enumerate() {
        if index > 0 {
            out.push(String::new());
        }
        out.extend(key_value_lines(key, element, None, None, policy));
    }

    if !block.key_values.is_empty() && !block.blocks.is_empty() {
        out.push(String::new());
    }

    for (index, (key, child)) in block.blocks.iter().enumerate() {
        if index > 0 {
            out.push(String::new());
        }
        out.extend(key.to_lines());
        out.extend(indent_block(write_block(child, policy, true)));
    }
    out
}

/// Lines of one key-value pair from whichever halves are still cached.
fn key_value_lines(
    key: &Key,
    element: &Element,
    key_lines: Option<&[String]>,
    value_lines: Option<&[String]>,
    policy: &FormatPolicy,
) -> Vec<String> {
    let mut lines = match key_lines {
        Some(cached) => cached.to_vec(),
        None => key.to_lines(),
    };
    let head = lines.pop().unwrap_or_default();

    match value_lines {
        Some(cached) => {
            trace!(key = key.name(), "replaying cached value");
            let (first, rest) = cached.split_first().map_or(("", &[][..]), |(first, rest)| {
                (first.as_str(), rest)
            });
            lines.push(format!("{head}{KEY_SEPARATOR}{first}"));
            lines.extend_from_slice(rest);
        }
        None => {
            trace!(key = key.name(), "rewriting stale value");
            lines.extend(weld(
                format!("{head}{KEY_SEPARATOR}"),
                element.value_lines(policy),
            ));
        }
    }
    lines
}
