/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Text labels for nodes and chunks.

use std::sync::LazyLock;

use regex::Regex;

use crate::chunk::ChunkNode;
use crate::config::QuoteKeys;
use crate::config::ViewerOptions;
use crate::descriptor::CollapsedContents;
use crate::descriptor::CollectionInfo;
use crate::descriptor::NodeDescriptor;
use crate::descriptor::NodeShape;
use crate::path::PathSegment;
use crate::value::Value;
use crate::value::number_text;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{XID_Start}$_][\p{XID_Continue}$]*$").expect("valid identifier pattern")
});

/// Display options for value previews and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Strings longer than this many characters are cut and suffixed
    /// with `...`.
    pub collapse_strings_after_length: Option<usize>,
    pub quote_keys: QuoteKeys,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            collapse_strings_after_length: Some(crate::config::DEFAULT_COLLAPSE_STRINGS_AFTER),
            quote_keys: QuoteKeys::default(),
        }
    }
}

impl From<&ViewerOptions> for RenderOptions {
    fn from(options: &ViewerOptions) -> Self {
        Self {
            collapse_strings_after_length: options.collapse_strings_after_length,
            quote_keys: options.quote_keys,
        }
    }
}

/// Whether `key` can be shown without quotes.
pub fn is_identifier(key: &str) -> bool {
    IDENTIFIER.is_match(key)
}

pub fn quote_key(key: &str, mode: QuoteKeys) -> String {
    let quoted = match mode {
        QuoteKeys::Always => true,
        QuoteKeys::Never => false,
        QuoteKeys::WhenNeeded => !is_identifier(key),
    };
    if quoted {
        format!("\"{key}\"")
    } else {
        key.to_string()
    }
}

/// Display form of a path segment. Indices are never quoted.
pub fn segment_label(segment: &PathSegment, mode: QuoteKeys) -> String {
    match segment {
        PathSegment::Key(key) => quote_key(key, mode),
        PathSegment::Index(i) => i.to_string(),
        PathSegment::Number(n) => n.to_string(),
    }
}

/// `n` with thousands separated by commas.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn size_label(n: usize) -> String {
    let noun = if n == 1 { "item" } else { "items" };
    format!("{} {noun}", format_count(n))
}

/// What a collapsed collection shows between its brackets.
pub fn collapsed_contents(info: &CollectionInfo, size: usize) -> String {
    match &info.collapsed_contents {
        Some(CollapsedContents::ChildCount) => format_count(size),
        Some(CollapsedContents::Literal(text)) => text.clone(),
        None if size > 0 => "...".to_string(),
        None => String::new(),
    }
}

/// Range label of a chunk, wrapped in its collection's expanded
/// brackets.
pub fn chunk_label(chunk: &ChunkNode) -> String {
    let open = chunk.collection.opening_bracket.resolve(true);
    let close = chunk.collection.closing_bracket.resolve(true);
    if chunk.start == chunk.end {
        format!("{open}{}{close}", chunk.start)
    } else {
        format!(
            "{open}{} - {}{close}",
            format_count(chunk.start),
            format_count(chunk.end)
        )
    }
}

/// Text of a value node.
pub fn value_preview(value: &Value, options: &RenderOptions) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(*n),
        Value::BigInt(n) => format!("{n}n"),
        Value::String(s) => format!("\"{}\"", truncate(s, options.collapse_strings_after_length)),
        Value::Symbol(sym) => sym.to_string(),
        Value::Function(f) => {
            let mut lines = f.source.lines();
            let first = lines.next().unwrap_or_default().trim_end();
            if lines.next().is_some() {
                format!("{first} ...")
            } else {
                first.to_string()
            }
        }
        Value::Array(_) | Value::Object(_) | Value::Set(_) | Value::Map(_) | Value::Host(_) => {
            match value.to_json() {
                Ok(Some(json)) => json.to_string(),
                _ => value.key_text(),
            }
        }
    }
}

fn truncate(s: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) if limit > 0 => match s.char_indices().nth(limit) {
            Some((cut, _)) => format!("{}...", &s[..cut]),
            None => s.to_string(),
        },
        _ => s.to_string(),
    }
}

/// One-line label of a node: key, then either the collection's
/// brackets and size or the value preview.
pub fn node_label(
    node: &NodeDescriptor,
    value: &Value,
    expanded: bool,
    options: &RenderOptions,
) -> String {
    let mut out = String::new();
    if !node.hide_key
        && let Some(key) = &node.key
    {
        out.push_str(&segment_label(key, options.quote_keys));
        out.push_str(": ");
    }
    match &node.shape {
        NodeShape::Value => out.push_str(&value_preview(value, options)),
        NodeShape::Collection(info) => {
            let size = node.sizing.size;
            if let Some(label) = &info.type_label {
                out.push_str(label);
                out.push(' ');
            }
            out.push_str(info.opening_bracket.resolve(expanded));
            if !expanded {
                out.push_str(&collapsed_contents(info, size));
                out.push_str(info.closing_bracket.resolve(expanded));
            }
            if info.shows_size(expanded) {
                out.push(' ');
                out.push_str(&size_label(size));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkOptions;
    use crate::chunk::Chunks;
    use crate::chunk::build_chunks;
    use crate::controller::ViewController;
    use crate::path;
    use crate::testing;

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote_key("name", QuoteKeys::WhenNeeded), "name");
        assert_eq!(quote_key("$ref", QuoteKeys::WhenNeeded), "$ref");
        assert_eq!(quote_key("_x1", QuoteKeys::WhenNeeded), "_x1");
        assert_eq!(quote_key("a-b", QuoteKeys::WhenNeeded), "\"a-b\"");
        assert_eq!(quote_key("1a", QuoteKeys::WhenNeeded), "\"1a\"");
        assert_eq!(quote_key("", QuoteKeys::WhenNeeded), "\"\"");
        assert_eq!(quote_key("name", QuoteKeys::Always), "\"name\"");
        assert_eq!(quote_key("a b", QuoteKeys::Never), "a b");
        assert_eq!(segment_label(&PathSegment::Index(3), QuoteKeys::Always), "3");
    }

    #[test]
    fn counts_group_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(size_label(1), "1 item");
        assert_eq!(size_label(2500), "2,500 items");
    }

    #[test]
    fn previews() {
        let options = RenderOptions {
            collapse_strings_after_length: Some(3),
            quote_keys: QuoteKeys::WhenNeeded,
        };
        assert_eq!(value_preview(&Value::from("abcdef"), &options), "\"abc...\"");
        assert_eq!(value_preview(&Value::from("ab"), &options), "\"ab\"");
        assert_eq!(value_preview(&Value::Number(f64::NAN), &options), "NaN");
        assert_eq!(value_preview(&Value::from(1.5), &options), "1.5");
        assert_eq!(value_preview(&Value::BigInt(-4), &options), "-4n");
        assert_eq!(value_preview(&Value::symbol(None), &options), "Symbol()");
        let f = Value::function(Some("f"), "function f() {\n  return 1;\n}");
        assert_eq!(value_preview(&f, &options), "function f() { ...");
    }

    #[test]
    fn collection_labels_follow_expansion() {
        let mut controller = ViewController::default();
        let value = testing::integer_array(3);
        let node = controller.make_node(&path!["xs"], &value).unwrap();
        let options = RenderOptions::default();
        assert_eq!(node_label(&node, &value, false, &options), "xs: Array(3)");
        assert_eq!(node_label(&node, &value, true, &options), "xs: [ 3 items");

        let object = Value::instance("Point", [("x", Value::from(1))]);
        let node = controller.make_node(&path!["my key"], &object).unwrap();
        assert_eq!(
            node_label(&node, &object, false, &options),
            "\"my key\": Point {...} 1 item"
        );
    }

    #[test]
    fn root_value_has_no_key() {
        let mut controller = ViewController::default();
        let value = Value::from(true);
        let node = controller.make_node(&[], &value).unwrap();
        assert_eq!(node_label(&node, &value, false, &RenderOptions::default()), "true");
    }

    #[test]
    fn chunk_ranges() {
        let mut controller = ViewController::default();
        let value = testing::integer_array(1201);
        let node = controller.make_node(&path!["xs"], &value).unwrap();
        let chunks = build_chunks(
            node.children(&value),
            node.sizing.chunk_size,
            &node,
            ChunkOptions::default(),
        )
        .unwrap();
        let Chunks::Chunked(chunks) = chunks else {
            panic!("expected chunks");
        };
        assert_eq!(chunk_label(&chunks[0]), "[0 - 99]");
        assert_eq!(chunk_label(&chunks[10]), "[1,000 - 1,099]");
        assert_eq!(chunk_label(&chunks[12]), "[1200]");
    }
}
