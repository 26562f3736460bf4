/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! One keyed notification channel.
//!
//! Each key has at most one listener slot. Attaching to an occupied
//! slot replaces the previous listener; detaching only clears the slot
//! if it still belongs to the registration that asks.

use std::collections::HashMap;
use std::rc::Rc;

/// Callback fired when a key's value in some channel changes.
pub type Listener = Rc<dyn Fn()>;

/// Identifies one registration so a stale handle cannot detach its
/// successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub(crate) u64);

#[derive(Default)]
pub(crate) struct KeyedChannel {
    slots: HashMap<String, (RegistrationId, Listener)>,
}

impl KeyedChannel {
    pub(crate) fn attach(&mut self, key: &str, id: RegistrationId, listener: Listener) {
        self.slots.insert(key.to_string(), (id, listener));
    }

    /// Clear `key`'s slot if `id` still owns it.
    pub(crate) fn detach(&mut self, key: &str, id: RegistrationId) -> bool {
        match self.slots.get(key) {
            Some((owner, _)) if *owner == id => {
                self.slots.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Fire `key`'s listener. Returns whether one was attached.
    pub(crate) fn notify(&self, key: &str) -> bool {
        match self.slots.get(key) {
            Some((_, listener)) => {
                let listener = listener.clone();
                listener();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    fn is_attached(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}
