/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Pluggable type recognition.
//!
//! An [`Extension`] claims values through a predicate and describes
//! them with a partial descriptor ([`Fragment`]). A [`ParserChain`]
//! resolves a value by asking an optional base parser first and then
//! every matching extension in registration order, shallow-merging
//! their fragments so later extensions override earlier fields.
//!
//! Errors returned by extensions are not masked: they surface as
//! [`ViewerError::Extension`] and fail the materialization of that
//! value. Predicates are plain `bool` functions; a panicking predicate
//! unwinds through the caller.

use std::fmt;
use std::rc::Rc;

use crate::descriptor::ChildAccessor;
use crate::descriptor::CollapsedContents;
use crate::descriptor::CollectionKind;
use crate::descriptor::Conditional;
use crate::descriptor::NodeOverrides;
use crate::descriptor::NodeType;
use crate::descriptor::Stringify;
use crate::error::ViewerError;
use crate::path::PathSegment;
use crate::sizing::ChunkSizePolicy;
use crate::value::Entry;
use crate::value::Value;

/// A partial node description produced by a parser.
///
/// A fragment without `node_type` describes a value node. A
/// collection fragment must carry `kind`, `size` and `children`.
#[derive(Clone, Default)]
pub struct Fragment {
    pub node_type: Option<NodeType>,
    pub hide: Option<bool>,
    pub hide_key: Option<bool>,
    pub stringify: Option<Stringify>,
    pub kind: Option<CollectionKind>,
    pub size: Option<usize>,
    pub chunk_size: Option<ChunkSizePolicy>,
    pub type_label: Option<String>,
    pub opening_bracket: Option<Conditional<String>>,
    pub closing_bracket: Option<Conditional<String>>,
    pub collapsed_contents: Option<CollapsedContents>,
    pub show_size: Option<Conditional<bool>>,
    pub children: Option<ChildAccessor>,
    pub overrides: Option<NodeOverrides>,
}

macro_rules! later_wins {
    ($acc:ident, $later:ident; $($field:ident),+ $(,)?) => {
        $(
            if $later.$field.is_some() {
                $acc.$field = $later.$field;
            }
        )+
    };
}

impl Fragment {
    /// A value-node fragment.
    pub fn value() -> Self {
        Fragment {
            node_type: Some(NodeType::Value),
            ..Default::default()
        }
    }

    /// A value-node fragment the presentation must not render.
    pub fn hidden() -> Self {
        Fragment {
            hide: Some(true),
            ..Fragment::value()
        }
    }

    /// A complete collection fragment.
    pub fn collection(
        kind: CollectionKind,
        size: usize,
        children: impl Fn(&Value) -> Vec<Entry> + 'static,
    ) -> Self {
        Fragment {
            node_type: Some(NodeType::Collection),
            kind: Some(kind),
            size: Some(size),
            children: Some(Rc::new(children)),
            ..Default::default()
        }
    }

    pub fn brackets(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.opening_bracket = Some(Conditional::Always(open.into()));
        self.closing_bracket = Some(Conditional::Always(close.into()));
        self
    }

    pub fn collapsed(mut self, contents: CollapsedContents) -> Self {
        self.collapsed_contents = Some(contents);
        self
    }

    pub fn stringify(mut self, stringify: Stringify) -> Self {
        self.stringify = Some(stringify);
        self
    }

    pub fn overrides(mut self, overrides: NodeOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn chunk_size(mut self, policy: impl Into<ChunkSizePolicy>) -> Self {
        self.chunk_size = Some(policy.into());
        self
    }

    pub fn type_label(mut self, label: impl Into<String>) -> Self {
        self.type_label = Some(label.into());
        self
    }

    /// Shallow merge: every field set in `later` replaces ours.
    pub fn merge(mut self, later: Fragment) -> Fragment {
        later_wins!(self, later;
            node_type,
            hide,
            hide_key,
            stringify,
            kind,
            size,
            chunk_size,
            type_label,
            opening_bracket,
            closing_bracket,
            collapsed_contents,
            show_size,
            children,
            overrides,
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.node_type.is_none()
            && self.hide.is_none()
            && self.hide_key.is_none()
            && self.stringify.is_none()
            && self.kind.is_none()
            && self.size.is_none()
            && self.chunk_size.is_none()
            && self.type_label.is_none()
            && self.opening_bracket.is_none()
            && self.closing_bracket.is_none()
            && self.collapsed_contents.is_none()
            && self.show_size.is_none()
            && self.children.is_none()
            && self.overrides.is_none()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("node_type", &self.node_type)
            .field("hide", &self.hide)
            .field("hide_key", &self.hide_key)
            .field("stringify", &self.stringify)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("chunk_size", &self.chunk_size)
            .field("type_label", &self.type_label)
            .field("children", &self.children.as_ref().map(|_| ".."))
            .finish_non_exhaustive()
    }
}

/// A caller-registered type handler.
pub trait Extension {
    /// Name used in errors and for deregistration.
    fn name(&self) -> &str;

    fn matches(&self, value: &Value) -> bool;

    /// Describe a matched value. `Ok(None)` contributes nothing.
    fn parse(&self, value: &Value) -> anyhow::Result<Option<Fragment>>;
}

/// Parser that runs before (and preempts) the extension chain.
pub type BaseParser = Rc<dyn Fn(&Value) -> anyhow::Result<Option<Fragment>>>;

type Predicate = Box<dyn Fn(&Value) -> bool>;
type ParseFn = Box<dyn Fn(&Value) -> anyhow::Result<Option<Fragment>>>;

/// An [`Extension`] built from two closures.
pub struct FnExtension {
    name: String,
    matches: Predicate,
    parse: ParseFn,
}

impl FnExtension {
    pub fn new(
        name: impl Into<String>,
        matches: impl Fn(&Value) -> bool + 'static,
        parse: impl Fn(&Value) -> anyhow::Result<Option<Fragment>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            matches: Box::new(matches),
            parse: Box::new(parse),
        }
    }
}

impl Extension for FnExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, value: &Value) -> bool {
        (self.matches)(value)
    }

    fn parse(&self, value: &Value) -> anyhow::Result<Option<Fragment>> {
        (self.parse)(value)
    }
}

/// Registered extensions plus the optional base parser.
#[derive(Clone, Default)]
pub struct ParserChain {
    extensions: Vec<Rc<dyn Extension>>,
    base: Option<BaseParser>,
}

impl ParserChain {
    pub fn new(extensions: Vec<Rc<dyn Extension>>, base: Option<BaseParser>) -> Self {
        Self { extensions, base }
    }

    /// Resolve `value` to a merged fragment, or `None` to fall back to
    /// built-in classification.
    pub fn resolve(&self, value: &Value) -> Result<Option<Fragment>, ViewerError> {
        if let Some(base) = &self.base
            && let Some(fragment) = base(value).map_err(ViewerError::BaseParser)?
            && !fragment.is_empty()
        {
            return Ok(Some(fragment));
        }

        let mut out: Option<Fragment> = None;
        for extension in &self.extensions {
            if !extension.matches(value) {
                continue;
            }
            let parsed = extension
                .parse(value)
                .map_err(|source| ViewerError::Extension {
                    name: extension.name().to_string(),
                    source,
                })?;
            if let Some(fragment) = parsed {
                out = Some(match out {
                    Some(acc) => acc.merge(fragment),
                    None => fragment,
                });
            }
        }
        Ok(out)
    }

    pub fn register(&mut self, extension: Rc<dyn Extension>) {
        self.extensions.push(extension);
    }

    /// Remove every extension registered under `name`.
    pub fn deregister(&mut self, name: &str) -> bool {
        let before = self.extensions.len();
        self.extensions.retain(|ext| ext.name() != name);
        self.extensions.len() != before
    }

    pub fn set_extensions(&mut self, extensions: Vec<Rc<dyn Extension>>) {
        self.extensions = extensions;
    }

    pub fn set_base(&mut self, base: Option<BaseParser>) {
        self.base = base;
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl fmt::Debug for ParserChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserChain")
            .field("extensions", &self.names())
            .field("base", &self.base.is_some())
            .finish()
    }
}

/// JSON text of `value` for stringify output; `undefined` when it has
/// none, `null` when it cannot be serialized.
fn json_or_placeholder(value: &Value) -> String {
    match value.to_json() {
        Ok(Some(json)) => json.to_string(),
        Ok(None) => "undefined".to_string(),
        Err(_) => "null".to_string(),
    }
}

fn set_children(value: &Value) -> Vec<Entry> {
    match value {
        Value::Set(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| (PathSegment::Index(i), item.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn map_children(value: &Value) -> Vec<Entry> {
    match value {
        Value::Map(pairs) => pairs
            .borrow()
            .iter()
            .map(|(k, v)| (PathSegment::from_map_key(k), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn set_text(value: &Value) -> String {
    match value {
        Value::Set(items) => {
            let parts: Vec<String> = items.borrow().iter().map(json_or_placeholder).collect();
            format!("Set({})", parts.join(", "))
        }
        other => other.key_text(),
    }
}

fn map_text(value: &Value) -> String {
    match value {
        Value::Map(pairs) => {
            let parts: Vec<String> = pairs
                .borrow()
                .iter()
                .map(|(k, v)| format!("[{}, {}]", json_or_placeholder(k), json_or_placeholder(v)))
                .collect();
            format!("Map([{}])", parts.join(", "))
        }
        other => other.key_text(),
    }
}

/// Sets render as `Set(...)` with their items in insertion order and
/// the positional keys hidden.
pub fn set_extension() -> Rc<dyn Extension> {
    Rc::new(FnExtension::new(
        "set",
        |value| matches!(value, Value::Set(_)),
        |value| {
            let size = value.len().unwrap_or(0);
            Ok(Some(
                Fragment::collection(CollectionKind::Tagged("Set".into()), size, set_children)
                    .brackets("Set(", ")")
                    .collapsed(CollapsedContents::ChildCount)
                    .stringify(Stringify::with(set_text))
                    .overrides(NodeOverrides {
                        hide_key: Some(true),
                        ..Default::default()
                    }),
            ))
        },
    ))
}

/// Maps render as `Map(...)` keyed by their converted keys.
pub fn map_extension() -> Rc<dyn Extension> {
    Rc::new(FnExtension::new(
        "map",
        |value| matches!(value, Value::Map(_)),
        |value| {
            let size = value.len().unwrap_or(0);
            Ok(Some(
                Fragment::collection(CollectionKind::Tagged("Map".into()), size, map_children)
                    .brackets("Map(", ")")
                    .collapsed(CollapsedContents::ChildCount)
                    .stringify(Stringify::with(map_text)),
            ))
        },
    ))
}

/// Extensions registered unless a viewer disables them.
pub fn default_extensions() -> Vec<Rc<dyn Extension>> {
    vec![set_extension(), map_extension()]
}

/// Hides everything strict JSON cannot represent: big integers,
/// functions, undefined, symbols, and custom-typed composites that do
/// not serialize.
pub fn json_extension() -> Rc<dyn Extension> {
    Rc::new(FnExtension::new(
        "json",
        |value| match value {
            Value::BigInt(_) | Value::Function(_) | Value::Undefined | Value::Symbol(_) => true,
            Value::Object(obj) if obj.type_name.is_some() => !value.is_json_safe(),
            Value::Host(_) | Value::Set(_) | Value::Map(_) => !value.is_json_safe(),
            _ => false,
        },
        |_| Ok(Some(Fragment::hidden())),
    ))
}
