/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Node materialization.
//!
//! [`ViewController`] turns `(path, value)` pairs into
//! [`NodeDescriptor`]s and owns the per-session state that goes with
//! them: the parser chain, the materialization options, the identity
//! memo and the [`NodeStateStore`].
//!
//! # Identity memo
//!
//! Composite values are remembered by reference identity. A second
//! request for the same composite, at any path, reuses the recorded
//! shape and only rewrites the location fields. This keeps shared
//! references cheap and makes cyclic values finite: a presentation
//! that walks children through the controller sees the cycle's entry
//! point again as an already-known node instead of descending forever.
//!
//! The memo holds [`WeakAnchor`]s only, so it never keeps a value
//! alive. Entries whose anchor died are treated as misses and swept
//! periodically.
//!
//! # Generations
//!
//! Replacing options or extensions clears the memo and bumps
//! [`ViewController::generation`]; anything derived from earlier
//! descriptors (such as chunk trees cached by a [`crate::lane::ChunkLane`])
//! compares generations to notice it is stale.

use std::collections::HashMap;
use std::rc::Rc;

use crate::chunk::ChunkOptions;
use crate::chunk::Chunks;
use crate::chunk::build_chunks;
use crate::config::MakeNodeOptions;
use crate::config::ViewerOptions;
use crate::descriptor::ChildAccessor;
use crate::descriptor::CollapsedContents;
use crate::descriptor::CollectionInfo;
use crate::descriptor::CollectionKind;
use crate::descriptor::Conditional;
use crate::descriptor::NodeDescriptor;
use crate::descriptor::NodeShape;
use crate::descriptor::NodeType;
use crate::descriptor::Stringify;
use crate::error::ViewerError;
use crate::extension::Extension;
use crate::extension::Fragment;
use crate::extension::ParserChain;
use crate::extension::default_extensions;
use crate::extension::json_extension;
use crate::path::PathSegment;
use crate::sizing::ChunkSizePolicy;
use crate::sizing::compute_sizing;
use crate::store::ControlledNodeState;
use crate::store::FlagUpdate;
use crate::store::KeyFlags;
use crate::store::NodeStateStore;
use crate::store::Subscription;
use crate::value::Entry;
use crate::value::Identity;
use crate::value::Value;
use crate::value::WeakAnchor;

/// Inserts between sweeps of dead memo entries.
const MEMO_SWEEP_INTERVAL: usize = 256;

struct MemoEntry {
    anchor: WeakAnchor,
    node: NodeDescriptor,
}

/// Descriptors of composite values, keyed by identity.
#[derive(Default)]
struct IdentityMemo {
    entries: HashMap<Identity, MemoEntry>,
    inserts_since_sweep: usize,
}

impl IdentityMemo {
    fn get(&mut self, value: &Value) -> Option<NodeDescriptor> {
        let id = value.identity()?;
        let entry = self.entries.get(&id)?;
        if entry.anchor.is_alive() {
            return Some(entry.node.clone());
        }
        self.entries.remove(&id);
        None
    }

    fn insert(&mut self, value: &Value, node: &NodeDescriptor) {
        let (Some(id), Some(anchor)) = (value.identity(), value.downgrade()) else {
            return;
        };
        self.entries.insert(
            id,
            MemoEntry {
                anchor,
                node: node.clone(),
            },
        );
        self.inserts_since_sweep += 1;
        if self.inserts_since_sweep >= MEMO_SWEEP_INTERVAL {
            self.sweep();
        }
    }

    fn sweep(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.anchor.is_alive());
        self.inserts_since_sweep = 0;
        let swept = before - self.entries.len();
        if swept > 0 {
            tracing::trace!(swept, remaining = self.entries.len(), "swept identity memo");
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.inserts_since_sweep = 0;
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Materializes nodes for one viewer session.
pub struct ViewController {
    options: MakeNodeOptions,
    chain: ParserChain,
    memo: IdentityMemo,
    store: NodeStateStore,
    generation: u64,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new(default_extensions(), MakeNodeOptions::default())
    }
}

impl ViewController {
    pub fn new(extensions: Vec<Rc<dyn Extension>>, options: MakeNodeOptions) -> Self {
        let chain = ParserChain::new(extensions, options.base_parser.clone());
        Self {
            options,
            chain,
            memo: IdentityMemo::default(),
            store: NodeStateStore::new(),
            generation: 0,
        }
    }

    /// A controller that hides everything strict JSON cannot
    /// represent. Default extensions are not registered.
    pub fn strict_json(options: MakeNodeOptions) -> Self {
        Self::new(vec![json_extension()], options)
    }

    /// Build a controller from serialized options, honoring
    /// `strict_json` and `disable_default_extensions`. `extensions`
    /// are registered after the built-in ones.
    pub fn from_options(options: &ViewerOptions, extensions: Vec<Rc<dyn Extension>>) -> Self {
        let mut registered: Vec<Rc<dyn Extension>> = Vec::new();
        if options.strict_json {
            registered.push(json_extension());
        } else if !options.disable_default_extensions {
            registered.extend(default_extensions());
        }
        registered.extend(extensions);
        Self::new(registered, MakeNodeOptions::from(options))
    }

    /// Replace the state store, e.g. with one seeded from a previous
    /// session.
    pub fn with_store(mut self, store: NodeStateStore) -> Self {
        self.store = store;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn options(&self) -> &MakeNodeOptions {
        &self.options
    }

    pub fn extension_names(&self) -> Vec<&str> {
        self.chain.names()
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Whether `value` was already materialized and is still alive.
    /// Walkers use this to stop at shared references and cycles.
    pub fn is_materialized(&self, value: &Value) -> bool {
        value
            .identity()
            .and_then(|id| self.memo.entries.get(&id))
            .is_some_and(|entry| entry.anchor.is_alive())
    }

    pub fn set_options(&mut self, options: MakeNodeOptions) {
        self.chain.set_base(options.base_parser.clone());
        self.options = options;
        self.invalidate("options replaced");
    }

    pub fn set_extensions(&mut self, extensions: Vec<Rc<dyn Extension>>) {
        self.chain.set_extensions(extensions);
        self.invalidate("extensions replaced");
    }

    pub fn register_extension(&mut self, extension: Rc<dyn Extension>) {
        self.chain.register(extension);
        self.invalidate("extension registered");
    }

    pub fn deregister_extension(&mut self, name: &str) -> bool {
        let removed = self.chain.deregister(name);
        if removed {
            self.invalidate("extension deregistered");
        }
        removed
    }

    fn invalidate(&mut self, reason: &'static str) {
        let dropped = self.memo.len();
        self.memo.clear();
        self.generation += 1;
        tracing::debug!(reason, dropped, generation = self.generation, "invalidated identity memo");
    }

    /// Describe `value` located at `path`.
    ///
    /// Deterministic for a given path, value and configuration.
    pub fn make_node(
        &mut self,
        path: &[PathSegment],
        value: &Value,
    ) -> Result<NodeDescriptor, ViewerError> {
        if let Some(mut node) = self.memo.get(value) {
            tracing::trace!(from = %node.node_key, to = ?path, "identity memo hit");
            let was_root = node.is_root();
            node.relocate(path);
            if was_root != node.is_root()
                && let Some(info) = node.collection().cloned()
            {
                node.sizing =
                    compute_sizing(&info.kind, node.sizing.size, &info.chunk_policy, node.is_root())?;
            }
            self.prepare_created_node(&node, value);
            return Ok(node);
        }

        let mut node = NodeDescriptor::base(path, &self.options.default_props);
        match self.chain.resolve(value)? {
            Some(fragment) => self.apply_fragment(&mut node, fragment)?,
            None => self.classify_builtin(&mut node, value)?,
        }
        self.prepare_created_node(&node, value);
        Ok(node)
    }

    /// Describe the child of `parent` reached through `segment`,
    /// applying the parent's child overrides.
    pub fn make_child_node(
        &mut self,
        parent: &NodeDescriptor,
        segment: PathSegment,
        value: &Value,
    ) -> Result<NodeDescriptor, ViewerError> {
        let mut path = parent.path.clone();
        path.push(segment);
        let mut node = self.make_node(&path, value)?;
        if let Some(info) = parent.collection() {
            node.apply_overrides(&info.overrides);
        }
        Ok(node)
    }

    /// Partition `value`'s children synchronously, with the
    /// configured nesting.
    pub fn make_chunks(
        &self,
        node: &NodeDescriptor,
        value: &Value,
        sort: bool,
    ) -> Result<Chunks, ViewerError> {
        build_chunks(
            node.children(value),
            node.sizing.chunk_size,
            node,
            ChunkOptions {
                sort,
                nest: self.options.nest_chunks,
            },
        )
    }

    pub fn chunk_options(&self, sort: bool) -> ChunkOptions {
        ChunkOptions {
            sort,
            nest: self.options.nest_chunks,
        }
    }

    fn prepare_created_node(&mut self, node: &NodeDescriptor, value: &Value) {
        if self.options.default_expanded.evaluate(&node.sizing, node) {
            self.store.set_expanded(&node.node_key, true, false);
        }
        self.memo.insert(value, node);
    }

    fn apply_fragment(
        &self,
        node: &mut NodeDescriptor,
        fragment: Fragment,
    ) -> Result<(), ViewerError> {
        if let Some(hide) = fragment.hide {
            node.hide = hide;
        }
        if let Some(hide_key) = fragment.hide_key {
            node.set_explicit_hide_key(hide_key);
        }
        if let Some(stringify) = fragment.stringify {
            node.stringify = Some(stringify);
        }
        if fragment.node_type != Some(NodeType::Collection) {
            return Ok(());
        }

        let kind = fragment
            .kind
            .ok_or(ViewerError::IncompleteFragment("kind"))?;
        let size = fragment
            .size
            .ok_or(ViewerError::IncompleteFragment("size"))?;
        let children = fragment
            .children
            .ok_or(ViewerError::IncompleteFragment("children"))?;
        let chunk_policy = fragment
            .chunk_size
            .unwrap_or_else(|| self.options.chunk_size.clone());
        let overrides = self
            .options
            .default_props
            .merged_with(&fragment.overrides.unwrap_or_default());

        node.sizing = compute_sizing(&kind, size, &chunk_policy, node.is_root())?;
        node.shape = NodeShape::Collection(Rc::new(CollectionInfo {
            kind,
            type_label: fragment.type_label,
            opening_bracket: fragment.opening_bracket.unwrap_or_else(|| "{".into()),
            closing_bracket: fragment.closing_bracket.unwrap_or_else(|| "}".into()),
            collapsed_contents: fragment.collapsed_contents,
            show_size: fragment.show_size,
            overrides,
            children,
            chunk_policy,
        }));
        Ok(())
    }

    fn classify_builtin(&self, node: &mut NodeDescriptor, value: &Value) -> Result<(), ViewerError> {
        let literal = match value {
            Value::Undefined => Some("undefined".to_string()),
            Value::Function(f) => Some(f.source.clone()),
            Value::Symbol(sym) => Some(sym.to_string()),
            Value::BigInt(n) => Some(format!("{n}n")),
            _ => None,
        };
        if let Some(text) = literal {
            node.stringify = Some(Stringify::Literal(text));
            return Ok(());
        }

        let info = match value {
            Value::Array(items) => {
                let policy = self
                    .options
                    .array_chunk_size
                    .clone()
                    .unwrap_or_else(|| self.options.chunk_size.clone());
                BuiltinCollection {
                    kind: CollectionKind::Array,
                    type_label: None,
                    size: items.borrow().len(),
                    children: Rc::new(array_children),
                    policy,
                }
            }
            Value::Object(obj) => BuiltinCollection {
                kind: if obj.type_name.is_some() {
                    CollectionKind::Class
                } else {
                    CollectionKind::Object
                },
                type_label: obj.type_name.clone(),
                size: obj.properties.borrow().len(),
                children: Rc::new(object_children),
                policy: self.object_policy(),
            },
            Value::Set(_) | Value::Map(_) => BuiltinCollection {
                kind: CollectionKind::Class,
                type_label: value.type_name().map(str::to_string),
                size: 0,
                children: Rc::new(|_: &Value| Vec::new()),
                policy: self.object_policy(),
            },
            Value::Host(host) => BuiltinCollection {
                kind: CollectionKind::Class,
                type_label: Some(host.type_name().to_string()),
                size: host.entries().len(),
                children: Rc::new(host_children),
                policy: self.object_policy(),
            },
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Undefined
            | Value::Function(_)
            | Value::Symbol(_)
            | Value::BigInt(_) => return Ok(()),
        };

        node.sizing = compute_sizing(&info.kind, info.size, &info.policy, node.is_root())?;
        let is_array = info.kind == CollectionKind::Array;
        node.shape = NodeShape::Collection(Rc::new(CollectionInfo {
            opening_bracket: if is_array {
                Conditional::Toggle {
                    collapsed: "Array(".to_string(),
                    expanded: "[".to_string(),
                }
            } else {
                "{".into()
            },
            closing_bracket: if is_array {
                Conditional::Toggle {
                    collapsed: ")".to_string(),
                    expanded: "]".to_string(),
                }
            } else {
                "}".into()
            },
            collapsed_contents: is_array.then_some(CollapsedContents::ChildCount),
            show_size: is_array.then_some(Conditional::Toggle {
                collapsed: false,
                expanded: true,
            }),
            kind: info.kind,
            type_label: info.type_label,
            overrides: self.options.default_props.clone(),
            children: info.children,
            chunk_policy: info.policy,
        }));
        Ok(())
    }

    fn object_policy(&self) -> ChunkSizePolicy {
        self.options
            .object_chunk_size
            .clone()
            .unwrap_or_else(|| self.options.chunk_size.clone())
    }

    pub fn store(&self) -> &NodeStateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NodeStateStore {
        &mut self.store
    }

    pub fn snapshot(&self, node_key: &str) -> Rc<ControlledNodeState> {
        self.store.snapshot(node_key)
    }

    pub fn subscribe(
        &mut self,
        node_key: &str,
        node_type: NodeType,
        listener: impl Fn() + 'static,
    ) -> Subscription {
        self.store.subscribe(node_key, node_type, listener)
    }

    pub fn unsubscribe(&mut self, subscription: &Subscription) -> bool {
        self.store.unsubscribe(subscription)
    }

    pub fn set_hovered(&mut self, node_key: Option<&str>) {
        self.store.set_hovered(node_key);
    }

    pub fn set_hovered_collection(&mut self, node_key: Option<&str>) {
        self.store.set_hovered_collection(node_key);
    }

    /// Hover `node_key` and mark its nearest enclosing expanded
    /// collection: the node itself when it is an expanded collection,
    /// its parent collection otherwise.
    pub fn hover_node(
        &mut self,
        node_key: &str,
        parent_collection: Option<&str>,
        is_expanded_collection: bool,
    ) {
        self.store.set_hovered(Some(node_key));
        let collection = if is_expanded_collection {
            Some(node_key)
        } else {
            parent_collection
        };
        self.store.set_hovered_collection(collection);
    }

    pub fn set_expanded(
        &mut self,
        node_key: &str,
        update: impl Into<FlagUpdate>,
        overwrite: bool,
    ) -> bool {
        self.store.set_expanded(node_key, update, overwrite)
    }

    pub fn toggle_expanded(&mut self, node_key: &str) -> bool {
        self.store.toggle_expanded(node_key)
    }

    pub fn set_selected(&mut self, node_key: &str, update: impl Into<FlagUpdate>) -> bool {
        self.store.set_selected(node_key, update)
    }

    pub fn toggle_selected(&mut self, node_key: &str) -> bool {
        self.store.toggle_selected(node_key)
    }

    pub fn bulk_set_expanded(&mut self, flags: KeyFlags, notify: bool) -> Vec<String> {
        self.store.bulk_set_expanded(flags, notify)
    }

    pub fn bulk_set_selected(&mut self, flags: KeyFlags, notify: bool) -> Vec<String> {
        self.store.bulk_set_selected(flags, notify)
    }
}

impl std::fmt::Debug for ViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("options", &self.options)
            .field("chain", &self.chain)
            .field("memo", &self.memo.len())
            .field("store", &self.store)
            .field("generation", &self.generation)
            .finish()
    }
}

struct BuiltinCollection {
    kind: CollectionKind,
    type_label: Option<String>,
    size: usize,
    children: ChildAccessor,
    policy: ChunkSizePolicy,
}

fn array_children(value: &Value) -> Vec<Entry> {
    match value {
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| (PathSegment::Index(i), item.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn object_children(value: &Value) -> Vec<Entry> {
    match value {
        Value::Object(obj) => obj
            .properties
            .borrow()
            .iter()
            .map(|(k, v)| (PathSegment::Key(k.clone()), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn host_children(value: &Value) -> Vec<Entry> {
    match value {
        Value::Host(host) => host.entries(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::DefaultExpanded;
    use crate::descriptor::NodeOverrides;
    use crate::extension::FnExtension;
    use crate::path;
    use crate::testing;

    #[test]
    fn scalars_are_value_nodes_with_stringify() {
        let mut controller = ViewController::default();
        let cases = [
            (Value::Undefined, Some("undefined")),
            (Value::BigInt(12), Some("12n")),
            (Value::symbol(Some("tag")), Some("Symbol(tag)")),
            (Value::function(Some("f"), "function f() {}"), Some("function f() {}")),
            (Value::from(1), None),
            (Value::Null, None),
        ];
        for (value, expected) in cases {
            let node = controller.make_node(&path!["x"], &value).unwrap();
            assert_eq!(node.node_type(), NodeType::Value);
            let text = node.stringify.as_ref().map(|s| s.apply(&value));
            assert_eq!(text.as_deref(), expected);
        }
    }

    #[test]
    fn array_of_250_is_chunked_in_three() {
        let mut controller = ViewController::default();
        let value = testing::integer_array(250);
        let node = controller.make_node(&path!["items"], &value).unwrap();
        assert!(node.sizing.contents_chunked);
        assert_eq!(node.sizing.chunk_count, 3);

        let info = node.collection().unwrap();
        assert_eq!(info.kind, CollectionKind::Array);
        assert_eq!(info.opening_bracket.resolve(false), "Array(");
        assert_eq!(info.closing_bracket.resolve(true), "]");
        assert_eq!(node.children(&value).len(), node.sizing.size);
    }

    #[test]
    fn root_disables_chunking() {
        let mut controller = ViewController::default();
        let value = testing::integer_array(250);
        let node = controller.make_node(&[], &value).unwrap();
        assert!(!node.sizing.contents_chunked);
        assert!(node.hide_key);
    }

    #[test]
    fn objects_and_instances() {
        let mut controller = ViewController::default();
        let plain = Value::object([("a", Value::from(1))]);
        let node = controller.make_node(&path!["p"], &plain).unwrap();
        assert_eq!(node.collection().unwrap().kind, CollectionKind::Object);

        let point = Value::instance("Point", [("x", Value::from(1)), ("y", Value::from(2))]);
        let node = controller.make_node(&path!["q"], &point).unwrap();
        let info = node.collection().unwrap();
        assert_eq!(info.kind, CollectionKind::Class);
        assert_eq!(info.type_label.as_deref(), Some("Point"));
        assert_eq!(node.sizing.size, 2);
    }

    #[test]
    fn shared_reference_reuses_shape() {
        let mut controller = ViewController::default();
        let (root, shared) = testing::shared_reference();
        let a = controller.make_node(&path!["a"], &shared).unwrap();
        let b = controller.make_node(&path!["b"], &shared).unwrap();
        assert!(a.shares_shape_with(&b));
        assert_eq!(a.sizing, b.sizing);
        assert_ne!(a.node_key, b.node_key);
        assert_eq!(b.key, Some(PathSegment::from("b")));
        assert_eq!(b.path, path!["b"]);
        drop(root);
    }

    #[test]
    fn cyclic_value_terminates() {
        let mut controller = ViewController::default();
        let value = testing::cyclic_object();
        let count = testing::walk(&mut controller, &value, 16).unwrap();
        assert_eq!(count, 3);
        let root = controller.make_node(&[], &value).unwrap();
        let again = controller
            .make_child_node(&root, PathSegment::from("self"), &value)
            .unwrap();
        assert!(root.shares_shape_with(&again));
        assert_eq!(again.node_key, "self");
        assert!(!again.hide_key);
    }

    #[test]
    fn relocation_to_root_recomputes_sizing() {
        let mut controller = ViewController::default();
        let value = testing::integer_array(250);
        let nested = controller.make_node(&path!["a"], &value).unwrap();
        assert!(nested.sizing.contents_chunked);
        let root = controller.make_node(&[], &value).unwrap();
        assert!(!root.sizing.contents_chunked);
        let nested_again = controller.make_node(&path!["b"], &value).unwrap();
        assert_eq!(nested_again.sizing.chunk_count, 3);
    }

    #[test]
    fn memo_does_not_keep_values_alive() {
        let mut controller = ViewController::default();
        let value = Value::object([("a", Value::from(1))]);
        let anchor = value.downgrade().unwrap();
        controller.make_node(&path!["x"], &value).unwrap();
        assert_eq!(controller.memo_len(), 1);
        drop(value);
        assert!(!anchor.is_alive());
    }

    #[test]
    fn set_extension_scenario() {
        let mut controller = ViewController::default();
        let set = Value::set([Value::from(3), Value::from(1), Value::from(2)]);
        let node = controller.make_node(&path!["s"], &set).unwrap();
        let info = node.collection().unwrap();
        assert_eq!(info.kind, CollectionKind::Tagged("Set".into()));
        assert_eq!(node.sizing.size, 3);
        let children: Vec<(usize, f64)> = node
            .children(&set)
            .into_iter()
            .map(|(k, v)| (k.as_index().unwrap(), v.as_f64().unwrap()))
            .collect();
        assert_eq!(children, vec![(0, 3.0), (1, 1.0), (2, 2.0)]);

        let child = controller
            .make_child_node(&node, PathSegment::Index(0), &Value::from(3))
            .unwrap();
        assert!(child.hide_key);
    }

    #[test]
    fn set_without_extension_is_opaque_class() {
        let mut controller = ViewController::new(Vec::new(), MakeNodeOptions::default());
        let set = Value::set([Value::from(1)]);
        let node = controller.make_node(&path!["s"], &set).unwrap();
        let info = node.collection().unwrap();
        assert_eq!(info.kind, CollectionKind::Class);
        assert_eq!(info.type_label.as_deref(), Some("Set"));
        assert_eq!(node.sizing.size, 0);
    }

    #[test]
    fn host_values_list_their_entries() {
        let mut controller = ViewController::default();
        let point = Value::host(testing::Point { x: 1.0, y: 2.0 });
        let node = controller.make_node(&path!["p"], &point).unwrap();
        assert_eq!(node.collection().unwrap().type_label.as_deref(), Some("Point"));
        assert_eq!(node.sizing.size, 2);
    }

    #[test]
    fn strict_json_hides_unrepresentable_values() {
        let mut controller = ViewController::strict_json(MakeNodeOptions::default());
        let node = controller
            .make_node(&path!["f"], &Value::function(None, "() => 1"))
            .unwrap();
        assert!(node.hide);
        let node = controller.make_node(&path!["n"], &Value::from(1)).unwrap();
        assert!(!node.hide);
    }

    #[test]
    fn collection_fragment_requires_children() {
        let incomplete: Rc<dyn Extension> = Rc::new(FnExtension::new(
            "incomplete",
            |value| value.as_str().is_some(),
            |_| {
                Ok(Some(Fragment {
                    node_type: Some(NodeType::Collection),
                    kind: Some(CollectionKind::Tagged("Chars".into())),
                    size: Some(1),
                    ..Default::default()
                }))
            },
        ));
        let mut controller = ViewController::new(vec![incomplete], MakeNodeOptions::default());
        let err = controller
            .make_node(&path!["s"], &Value::from("abc"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::IncompleteFragment("children")));
    }

    #[test]
    fn extension_fragment_uses_its_chunk_size() {
        let chars: Rc<dyn Extension> = Rc::new(FnExtension::new(
            "chars",
            |value| value.as_str().is_some(),
            |value| {
                let len = value.as_str().map(|s| s.chars().count()).unwrap_or(0);
                Ok(Some(
                    Fragment::collection(CollectionKind::Tagged("Chars".into()), len, |v| {
                        v.as_str()
                            .unwrap_or_default()
                            .chars()
                            .enumerate()
                            .map(|(i, c)| (PathSegment::Index(i), Value::from(c.to_string())))
                            .collect()
                    })
                    .chunk_size(2usize),
                ))
            },
        ));
        let mut controller = ViewController::new(vec![chars], MakeNodeOptions::default());
        let value = Value::from("hello");
        let node = controller.make_node(&path!["s"], &value).unwrap();
        assert_eq!(node.sizing.chunk_size, 2);
        assert_eq!(node.sizing.chunk_count, 3);
        // Brackets default to braces.
        assert_eq!(node.collection().unwrap().opening_bracket.resolve(true), "{");
    }

    #[test]
    fn registering_extensions_invalidates_memo() {
        let mut controller = ViewController::default();
        let value = Value::array([Value::from(1)]);
        controller.make_node(&path!["a"], &value).unwrap();
        assert_eq!(controller.memo_len(), 1);
        let generation = controller.generation();

        let hide_arrays: Rc<dyn Extension> = Rc::new(FnExtension::new(
            "hide-arrays",
            |value| matches!(value, Value::Array(_)),
            |_| Ok(Some(Fragment::hidden())),
        ));
        controller.register_extension(hide_arrays);
        assert_eq!(controller.memo_len(), 0);
        assert_eq!(controller.generation(), generation + 1);
        assert!(controller.make_node(&path!["a"], &value).unwrap().hide);

        assert!(controller.deregister_extension("hide-arrays"));
        assert!(!controller.deregister_extension("hide-arrays"));
        assert!(!controller.make_node(&path!["a"], &value).unwrap().hide);
    }

    #[test]
    fn default_expansion_does_not_clobber_user_state() {
        let options = MakeNodeOptions {
            default_expanded: DefaultExpanded::Flag(true),
            ..Default::default()
        };
        let mut controller = ViewController::new(Vec::new(), options);
        controller.set_expanded("a", false, true);
        let value = Value::array([]);
        controller.make_node(&path!["a"], &value).unwrap();
        controller.make_node(&path!["b"], &value).unwrap();
        assert_eq!(controller.snapshot("a").is_expanded, Some(false));
        assert_eq!(controller.snapshot("b").is_expanded, Some(true));
    }

    #[test]
    fn default_expansion_policy_sees_sizing() {
        let options = MakeNodeOptions {
            default_expanded: DefaultExpanded::policy(|sizing, node| {
                node.is_collection() && !sizing.contents_chunked
            }),
            ..Default::default()
        };
        let mut controller = ViewController::new(Vec::new(), options);
        controller
            .make_node(&path!["small"], &testing::integer_array(3))
            .unwrap();
        controller
            .make_node(&path!["big"], &testing::integer_array(300))
            .unwrap();
        assert_eq!(controller.store().is_expanded("small"), Some(true));
        assert_eq!(controller.store().is_expanded("big"), None);
    }

    #[test]
    fn default_props_apply_to_nodes_and_child_overrides() {
        let options = MakeNodeOptions {
            default_props: NodeOverrides {
                hide_key: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = ViewController::new(default_extensions(), options);
        let node = controller
            .make_node(&path!["a"], &Value::from(1))
            .unwrap();
        assert!(node.hide_key);
        let map = controller
            .make_node(&path!["m"], &Value::map([]))
            .unwrap();
        assert_eq!(map.collection().unwrap().overrides.hide_key, Some(true));
    }

    #[test]
    fn base_parser_preempts_extensions() {
        let options = MakeNodeOptions {
            base_parser: Some(Rc::new(
                |value: &Value| -> anyhow::Result<Option<Fragment>> {
                    Ok(matches!(value, Value::Set(_))
                        .then(|| Fragment::value().type_label("base")))
                },
            )),
            ..Default::default()
        };
        let mut controller = ViewController::new(default_extensions(), options);
        let node = controller
            .make_node(&path!["s"], &Value::set([Value::from(1)]))
            .unwrap();
        assert_eq!(node.node_type(), NodeType::Value);

        let err = {
            let failing = MakeNodeOptions {
                base_parser: Some(Rc::new(
                    |_: &Value| -> anyhow::Result<Option<Fragment>> { Err(anyhow::anyhow!("nope")) },
                )),
                ..Default::default()
            };
            controller.set_options(failing);
            controller.make_node(&[], &Value::Null).unwrap_err()
        };
        assert!(matches!(err, ViewerError::BaseParser(_)));
    }

    #[test]
    fn hover_node_marks_enclosing_collection() {
        let mut controller = ViewController::default();
        let hits = Rc::new(Cell::new(0));
        let captured = hits.clone();
        controller.subscribe("list", NodeType::Collection, move || {
            captured.set(captured.get() + 1)
        });

        controller.hover_node("list.0", Some("list"), false);
        assert!(controller.snapshot("list").is_collection_hovered);
        assert!(controller.snapshot("list.0").is_hovered);
        assert_eq!(hits.get(), 1);

        controller.hover_node("other", None, true);
        assert!(controller.snapshot("other").is_collection_hovered);
        assert!(!controller.snapshot("list").is_collection_hovered);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn make_chunks_respects_nest_option() {
        let options = MakeNodeOptions {
            chunk_size: ChunkSizePolicy::Fixed(2),
            nest_chunks: false,
            ..Default::default()
        };
        let mut controller = ViewController::new(Vec::new(), options);
        let value = testing::integer_array(9);
        let node = controller.make_node(&path!["a"], &value).unwrap();
        match controller.make_chunks(&node, &value, false).unwrap() {
            Chunks::Chunked(chunks) => {
                assert_eq!(chunks.len(), 5);
                assert!(chunks.iter().all(|c| !c.is_nested()));
            }
            Chunks::Unchunked(_) => panic!("expected chunks"),
        }
    }
}
