/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Per-node interaction state.
//!
//! [`NodeStateStore`] keeps four independent channels keyed by node
//! key:
//!
//! - **hovered**: at most one key at a time.
//! - **hovered collection**: at most one key at a time; the nearest
//!   enclosing expanded collection of the hovered node.
//! - **expanded**: per-key flag, unset until first written.
//! - **selected**: per-key flag, unset until first written.
//!
//! A consumer hooks up once per key with [`NodeStateStore::subscribe`];
//! the store fans that single listener into every channel the key
//! needs. Value nodes never receive collection-hover notifications.
//! Notifications fire only on actual changes, and only for the keys
//! whose values changed.
//!
//! [`NodeStateStore::snapshot`] returns an `Rc` that stays the same
//! allocation until one of the key's four values changes, so callers
//! can detect changes with [`Rc::ptr_eq`].

mod keyed;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;

pub use self::keyed::Listener;
pub use self::keyed::RegistrationId;
use self::keyed::KeyedChannel;
use crate::descriptor::NodeType;

/// Combined interaction state of one node key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlledNodeState {
    pub is_hovered: bool,
    pub is_collection_hovered: bool,
    /// `None` means "use the caller's default".
    pub is_expanded: Option<bool>,
    pub is_selected: Option<bool>,
}

/// Handle returned by [`NodeStateStore::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    key: String,
    id: RegistrationId,
}

impl Subscription {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A new flag value, or a function of the current one (unset reads as
/// `false`).
pub enum FlagUpdate {
    Set(bool),
    Apply(Box<dyn FnOnce(bool) -> bool>),
}

impl FlagUpdate {
    pub fn toggle() -> Self {
        FlagUpdate::Apply(Box::new(|prev| !prev))
    }

    fn resolve(self, prev: Option<bool>) -> bool {
        match self {
            FlagUpdate::Set(next) => next,
            FlagUpdate::Apply(f) => f(prev.unwrap_or(false)),
        }
    }
}

impl From<bool> for FlagUpdate {
    fn from(next: bool) -> Self {
        FlagUpdate::Set(next)
    }
}

impl std::fmt::Debug for FlagUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagUpdate::Set(b) => f.debug_tuple("Set").field(b).finish(),
            FlagUpdate::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Keys to set in bulk: a list (all become `true`) or explicit flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyFlags {
    Keys(Vec<String>),
    Flags(BTreeMap<String, bool>),
}

impl KeyFlags {
    fn into_pairs(self) -> Vec<(String, bool)> {
        match self {
            KeyFlags::Keys(keys) => keys.into_iter().map(|k| (k, true)).collect(),
            KeyFlags::Flags(flags) => flags.into_iter().collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for KeyFlags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeyFlags::Keys(iter.into_iter().map(Into::into).collect())
    }
}

/// Seed for a fresh store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialNodeState {
    pub expanded: Option<KeyFlags>,
    pub selected: Option<KeyFlags>,
    pub hovered: Option<String>,
    pub hovered_collection: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    id: RegistrationId,
    node_type: NodeType,
}

/// Hover, collection-hover, expanded and selected flags for one viewer
/// session.
#[derive(Default)]
pub struct NodeStateStore {
    hovered: Option<String>,
    hovered_collection: Option<String>,
    expanded: HashMap<String, bool>,
    selected: HashMap<String, bool>,

    hover_channel: KeyedChannel,
    collection_hover_channel: KeyedChannel,
    expanded_channel: KeyedChannel,
    selected_channel: KeyedChannel,

    registrations: HashMap<String, Registration>,
    next_id: u64,
    snapshots: RefCell<HashMap<String, Rc<ControlledNodeState>>>,
}

impl NodeStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_state(initial: InitialNodeState) -> Self {
        let mut store = Self::new();
        if let Some(expanded) = initial.expanded {
            store.expanded.extend(expanded.into_pairs());
        }
        if let Some(selected) = initial.selected {
            store.selected.extend(selected.into_pairs());
        }
        store.hovered = initial.hovered;
        store.hovered_collection = initial.hovered_collection;
        store
    }

    /// Register `listener` as the single listener for `key`.
    ///
    /// The last registration for a key wins: an earlier one, whatever
    /// its node type, is detached from every channel first.
    pub fn subscribe(
        &mut self,
        key: &str,
        node_type: NodeType,
        listener: impl Fn() + 'static,
    ) -> Subscription {
        if let Some(previous) = self.registrations.remove(key) {
            tracing::trace!(key, "replacing node state subscription");
            self.detach_all(key, previous.id);
        }

        self.next_id += 1;
        let id = RegistrationId(self.next_id);
        let listener: Listener = Rc::new(listener);

        self.hover_channel.attach(key, id, listener.clone());
        if node_type == NodeType::Collection {
            self.collection_hover_channel
                .attach(key, id, listener.clone());
        }
        self.expanded_channel.attach(key, id, listener.clone());
        self.selected_channel.attach(key, id, listener);

        self.registrations
            .insert(key.to_string(), Registration { id, node_type });
        Subscription {
            key: key.to_string(),
            id,
        }
    }

    /// Detach a subscription. Superseded handles are ignored.
    pub fn unsubscribe(&mut self, subscription: &Subscription) -> bool {
        match self.registrations.get(&subscription.key) {
            Some(current) if current.id == subscription.id => {
                self.registrations.remove(&subscription.key);
                self.detach_all(&subscription.key, subscription.id);
                true
            }
            _ => false,
        }
    }

    fn detach_all(&mut self, key: &str, id: RegistrationId) {
        self.hover_channel.detach(key, id);
        self.collection_hover_channel.detach(key, id);
        self.expanded_channel.detach(key, id);
        self.selected_channel.detach(key, id);
    }

    pub fn subscribed_type(&self, key: &str) -> Option<NodeType> {
        self.registrations.get(key).map(|r| r.node_type)
    }

    pub fn subscription_count(&self) -> usize {
        self.registrations.len()
    }

    /// Combined state of `key`, referentially stable while unchanged.
    pub fn snapshot(&self, key: &str) -> Rc<ControlledNodeState> {
        let next = self.current(key);
        let mut snapshots = self.snapshots.borrow_mut();
        match snapshots.get(key) {
            Some(prev) if **prev == next => prev.clone(),
            _ => {
                let fresh = Rc::new(next);
                snapshots.insert(key.to_string(), fresh.clone());
                fresh
            }
        }
    }

    fn current(&self, key: &str) -> ControlledNodeState {
        ControlledNodeState {
            is_hovered: self.hovered.as_deref() == Some(key),
            is_collection_hovered: self.hovered_collection.as_deref() == Some(key),
            is_expanded: self.expanded.get(key).copied(),
            is_selected: self.selected.get(key).copied(),
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn hovered_collection(&self) -> Option<&str> {
        self.hovered_collection.as_deref()
    }

    pub fn is_expanded(&self, key: &str) -> Option<bool> {
        self.expanded.get(key).copied()
    }

    pub fn is_selected(&self, key: &str) -> Option<bool> {
        self.selected.get(key).copied()
    }

    /// Keys currently expanded, in no particular order.
    pub fn expanded_keys(&self) -> impl Iterator<Item = &str> {
        self.expanded
            .iter()
            .filter(|(_, expanded)| **expanded)
            .map(|(key, _)| key.as_str())
    }

    /// Keys currently selected, in no particular order.
    pub fn selected_keys(&self) -> impl Iterator<Item = &str> {
        self.selected
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(key, _)| key.as_str())
    }

    /// Replace the hovered key. Notifies the old and the new key.
    pub fn set_hovered(&mut self, key: Option<&str>) {
        if self.hovered.as_deref() == key {
            return;
        }
        let previous = std::mem::replace(&mut self.hovered, key.map(str::to_string));
        if let Some(previous) = previous {
            self.hover_channel.notify(&previous);
        }
        if let Some(key) = key {
            self.hover_channel.notify(key);
        }
    }

    /// Replace the hovered collection. Notifies the old and the new
    /// key.
    pub fn set_hovered_collection(&mut self, key: Option<&str>) {
        if self.hovered_collection.as_deref() == key {
            return;
        }
        let previous = std::mem::replace(&mut self.hovered_collection, key.map(str::to_string));
        if let Some(previous) = previous {
            self.collection_hover_channel.notify(&previous);
        }
        if let Some(key) = key {
            self.collection_hover_channel.notify(key);
        }
    }

    /// Update `key`'s expanded flag.
    ///
    /// With `overwrite == false` the call only takes effect while the
    /// key is unset, so default-expansion hints never clobber explicit
    /// user action. Returns whether the value changed.
    pub fn set_expanded(&mut self, key: &str, update: impl Into<FlagUpdate>, overwrite: bool) -> bool {
        let prev = self.expanded.get(key).copied();
        if !overwrite && prev.is_some() {
            return false;
        }
        let next = update.into().resolve(prev);
        if prev == Some(next) {
            return false;
        }
        self.expanded.insert(key.to_string(), next);
        self.expanded_channel.notify(key);
        true
    }

    /// Update `key`'s selected flag. Returns whether it changed.
    pub fn set_selected(&mut self, key: &str, update: impl Into<FlagUpdate>) -> bool {
        let prev = self.selected.get(key).copied();
        let next = update.into().resolve(prev);
        if prev == Some(next) {
            return false;
        }
        self.selected.insert(key.to_string(), next);
        self.selected_channel.notify(key);
        true
    }

    pub fn toggle_expanded(&mut self, key: &str) -> bool {
        self.set_expanded(key, FlagUpdate::toggle(), true)
    }

    pub fn toggle_selected(&mut self, key: &str) -> bool {
        self.set_selected(key, FlagUpdate::toggle())
    }

    /// Apply many expanded flags at once. With `notify`, every key
    /// whose value changed is notified once.
    pub fn bulk_set_expanded(&mut self, flags: KeyFlags, notify: bool) -> Vec<String> {
        let changed = bulk_apply(&mut self.expanded, flags);
        if notify {
            for key in &changed {
                self.expanded_channel.notify(key);
            }
        }
        changed
    }

    /// Apply many selected flags at once. With `notify`, every key
    /// whose value changed is notified once.
    pub fn bulk_set_selected(&mut self, flags: KeyFlags, notify: bool) -> Vec<String> {
        let changed = bulk_apply(&mut self.selected, flags);
        if notify {
            for key in &changed {
                self.selected_channel.notify(key);
            }
        }
        changed
    }

    /// The store's persistent part, for seeding a later session.
    pub fn export(&self) -> InitialNodeState {
        let flags = |map: &HashMap<String, bool>| {
            (!map.is_empty()).then(|| {
                KeyFlags::Flags(map.iter().map(|(k, v)| (k.clone(), *v)).collect())
            })
        };
        InitialNodeState {
            expanded: flags(&self.expanded),
            selected: flags(&self.selected),
            hovered: None,
            hovered_collection: None,
        }
    }
}

fn bulk_apply(map: &mut HashMap<String, bool>, flags: KeyFlags) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut changed = Vec::new();
    for (key, next) in flags.into_pairs() {
        let prev = map.insert(key.clone(), next);
        if prev != Some(next) && seen.insert(key.clone()) {
            changed.push(key);
        }
    }
    changed
}

impl std::fmt::Debug for NodeStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStateStore")
            .field("hovered", &self.hovered)
            .field("hovered_collection", &self.hovered_collection)
            .field("expanded", &self.expanded.len())
            .field("selected", &self.selected.len())
            .field("subscriptions", &self.registrations.len())
            .finish()
    }
}
