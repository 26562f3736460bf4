/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Node descriptors: the normalized, displayable description of one
//! value at one path.
//!
//! A descriptor splits into location (`node_key`, `key`, `path`) and
//! shape (everything else). Shape is shared between locations of one
//! value: collection metadata lives behind an `Rc<CollectionInfo>`,
//! so a relocated descriptor points at the same allocation as the
//! original.

use std::fmt;
use std::rc::Rc;

use crate::path::PathSegment;
use crate::path::node_key;
use crate::sizing::ChunkSizePolicy;
use crate::sizing::NodeSizing;
use crate::value::Entry;
use crate::value::Value;

/// Whether a node renders as a leaf or as an expandable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Value,
    Collection,
}

/// What kind of collection a node is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Array,
    /// A plain object.
    Object,
    /// A custom-typed object; see [`CollectionInfo::type_label`].
    Class,
    /// An extension-defined kind such as `"Set"`.
    Tagged(String),
}

impl CollectionKind {
    /// The kind handed to chunk-size policies. Custom-typed objects
    /// page like plain objects.
    pub fn sizing_kind(&self) -> CollectionKind {
        match self {
            CollectionKind::Class => CollectionKind::Object,
            other => other.clone(),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Array => f.write_str("array"),
            CollectionKind::Object => f.write_str("object"),
            CollectionKind::Class => f.write_str("class"),
            CollectionKind::Tagged(tag) => f.write_str(tag),
        }
    }
}

/// A display hint that may differ between collapsed and expanded
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    Always(T),
    Toggle { collapsed: T, expanded: T },
}

impl<T> Conditional<T> {
    pub fn resolve(&self, expanded: bool) -> &T {
        match self {
            Conditional::Always(v) => v,
            Conditional::Toggle { collapsed, expanded: e } => {
                if expanded {
                    e
                } else {
                    collapsed
                }
            }
        }
    }
}

impl From<&str> for Conditional<String> {
    fn from(s: &str) -> Self {
        Conditional::Always(s.to_string())
    }
}

/// What a collapsed collection shows between its brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapsedContents {
    Literal(String),
    /// Show the number of children.
    ChildCount,
}

/// Text used when copying a value node.
#[derive(Clone)]
pub enum Stringify {
    Literal(String),
    With(Rc<dyn Fn(&Value) -> String>),
}

impl Stringify {
    pub fn with(f: impl Fn(&Value) -> String + 'static) -> Self {
        Stringify::With(Rc::new(f))
    }

    pub fn apply(&self, value: &Value) -> String {
        match self {
            Stringify::Literal(s) => s.clone(),
            Stringify::With(f) => f(value),
        }
    }
}

impl fmt::Debug for Stringify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stringify::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Stringify::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Lists a collection's children, in display order.
pub type ChildAccessor = Rc<dyn Fn(&Value) -> Vec<Entry>>;

/// Properties forced onto nodes: onto every direct child of a
/// collection, or onto every node as viewer-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct NodeOverrides {
    pub hide_key: Option<bool>,
    pub hide: Option<bool>,
    pub stringify: Option<Stringify>,
}

impl NodeOverrides {
    /// Layer `later` on top of `self`; fields set in `later` win.
    pub fn merged_with(&self, later: &NodeOverrides) -> NodeOverrides {
        NodeOverrides {
            hide_key: later.hide_key.or(self.hide_key),
            hide: later.hide.or(self.hide),
            stringify: later.stringify.clone().or_else(|| self.stringify.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hide_key.is_none() && self.hide.is_none() && self.stringify.is_none()
    }
}

/// Shape shared by every location of one collection value.
pub struct CollectionInfo {
    pub kind: CollectionKind,
    /// Custom type name, displayed but not otherwise significant.
    pub type_label: Option<String>,
    pub opening_bracket: Conditional<String>,
    pub closing_bracket: Conditional<String>,
    pub collapsed_contents: Option<CollapsedContents>,
    pub show_size: Option<Conditional<bool>>,
    /// Applied to every direct child.
    pub overrides: NodeOverrides,
    pub(crate) children: ChildAccessor,
    /// Policy used when the node is not at the root, kept so a
    /// relocated descriptor can be re-sized.
    pub(crate) chunk_policy: ChunkSizePolicy,
}

impl CollectionInfo {
    pub fn children(&self, value: &Value) -> Vec<Entry> {
        (self.children)(value)
    }

    /// Whether the size label is shown next to the brackets.
    pub fn shows_size(&self, expanded: bool) -> bool {
        match &self.show_size {
            Some(show) => *show.resolve(expanded),
            None => expanded || self.collapsed_contents != Some(CollapsedContents::ChildCount),
        }
    }
}

impl fmt::Debug for CollectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionInfo")
            .field("kind", &self.kind)
            .field("type_label", &self.type_label)
            .field("opening_bracket", &self.opening_bracket)
            .field("closing_bracket", &self.closing_bracket)
            .field("collapsed_contents", &self.collapsed_contents)
            .field("show_size", &self.show_size)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum NodeShape {
    Value,
    Collection(Rc<CollectionInfo>),
}

/// One value at one path.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Path-derived identifier used for state lookup.
    pub node_key: String,
    /// Last path segment; `None` at the root.
    pub key: Option<PathSegment>,
    pub path: Vec<PathSegment>,
    /// The presentation renders nothing for hidden nodes.
    pub hide: bool,
    pub hide_key: bool,
    pub stringify: Option<Stringify>,
    pub sizing: NodeSizing,
    pub shape: NodeShape,
    explicit_hide_key: Option<bool>,
}

impl NodeDescriptor {
    /// A value node at `path` with `defaults` applied.
    pub(crate) fn base(path: &[PathSegment], defaults: &NodeOverrides) -> Self {
        let mut node = NodeDescriptor {
            node_key: node_key(path),
            key: path.last().cloned(),
            path: path.to_vec(),
            hide: false,
            hide_key: path.is_empty(),
            stringify: None,
            sizing: NodeSizing::leaf(),
            shape: NodeShape::Value,
            explicit_hide_key: None,
        };
        node.apply_overrides(defaults);
        node
    }

    pub fn node_type(&self) -> NodeType {
        match self.shape {
            NodeShape::Value => NodeType::Value,
            NodeShape::Collection(_) => NodeType::Collection,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.shape, NodeShape::Collection(_))
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn collection(&self) -> Option<&Rc<CollectionInfo>> {
        match &self.shape {
            NodeShape::Value => None,
            NodeShape::Collection(info) => Some(info),
        }
    }

    /// Children of `value` through this node's accessor; empty for
    /// value nodes.
    pub fn children(&self, value: &Value) -> Vec<Entry> {
        self.collection()
            .map(|info| info.children(value))
            .unwrap_or_default()
    }

    /// Whether `other` was built from the same shape as `self`.
    pub fn shares_shape_with(&self, other: &NodeDescriptor) -> bool {
        match (&self.shape, &other.shape) {
            (NodeShape::Collection(a), NodeShape::Collection(b)) => Rc::ptr_eq(a, b),
            (NodeShape::Value, NodeShape::Value) => self.sizing == other.sizing,
            _ => false,
        }
    }

    pub(crate) fn apply_overrides(&mut self, overrides: &NodeOverrides) {
        if let Some(hide) = overrides.hide {
            self.hide = hide;
        }
        if let Some(stringify) = &overrides.stringify {
            self.stringify = Some(stringify.clone());
        }
        if let Some(hide_key) = overrides.hide_key {
            self.set_explicit_hide_key(hide_key);
        }
    }

    pub(crate) fn set_explicit_hide_key(&mut self, hide_key: bool) {
        self.explicit_hide_key = Some(hide_key);
        self.hide_key = hide_key;
    }

    /// Move this descriptor to `path`, keeping its shape.
    pub(crate) fn relocate(&mut self, path: &[PathSegment]) {
        self.node_key = node_key(path);
        self.key = path.last().cloned();
        self.path = path.to_vec();
        self.hide_key = self.explicit_hide_key.unwrap_or(path.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn root_hides_key_by_default() {
        let root = NodeDescriptor::base(&[], &NodeOverrides::default());
        assert!(root.hide_key);
        assert_eq!(root.key, None);
        let child = NodeDescriptor::base(&path!["a"], &NodeOverrides::default());
        assert!(!child.hide_key);
        assert_eq!(child.node_key, "a");
    }

    #[test]
    fn explicit_hide_key_survives_relocation() {
        let mut node = NodeDescriptor::base(&path!["a"], &NodeOverrides::default());
        node.relocate(&[]);
        assert!(node.hide_key);
        node.relocate(&path!["b", 1usize]);
        assert!(!node.hide_key);
        assert_eq!(node.node_key, "b.1");
        assert_eq!(node.key, Some(PathSegment::Index(1)));

        node.set_explicit_hide_key(true);
        node.relocate(&path!["c"]);
        assert!(node.hide_key);
    }

    #[test]
    fn overrides_merge_later_wins() {
        let base = NodeOverrides {
            hide_key: Some(false),
            hide: Some(true),
            stringify: None,
        };
        let later = NodeOverrides {
            hide_key: Some(true),
            hide: None,
            stringify: Some(Stringify::Literal("x".into())),
        };
        let merged = base.merged_with(&later);
        assert_eq!(merged.hide_key, Some(true));
        assert_eq!(merged.hide, Some(true));
        assert!(matches!(merged.stringify, Some(Stringify::Literal(ref s)) if s == "x"));
    }

    #[test]
    fn conditional_resolves_by_state() {
        let bracket = Conditional::Toggle {
            collapsed: "Array(".to_string(),
            expanded: "[".to_string(),
        };
        assert_eq!(bracket.resolve(false), "Array(");
        assert_eq!(bracket.resolve(true), "[");
        assert_eq!(Conditional::from("{").resolve(true), "{");
    }
}
