/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Path segments and node-key derivation.
//!
//! A node key identifies a *location* in the value tree, not a value:
//! the same shared object reached through two paths has two keys.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use crate::value::Value;
use crate::value::number_text;

/// Separator between segments in a node key.
pub const KEY_SEPARATOR: &str = ".";

/// One step from a collection to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A property name or converted map key.
    Key(String),
    /// An ordinal position (array index, set position, integral map key).
    Index(usize),
    /// A numeric map key that is not an index: negative, fractional or
    /// non-finite.
    Number(MapNumber),
}

/// A numeric map key, totally ordered by [`f64::total_cmp`].
#[derive(Debug, Clone, Copy)]
pub struct MapNumber(pub f64);

impl MapNumber {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for MapNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MapNumber {}

impl PartialOrd for MapNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MapNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for MapNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for MapNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&number_text(self.0))
    }
}

impl PathSegment {
    /// Convert a map key into a segment.
    ///
    /// Non-negative integral numbers become [`PathSegment::Index`],
    /// other numbers [`PathSegment::Number`]; strings stay keys;
    /// everything else is keyed by its display text.
    pub fn from_map_key(key: &Value) -> Self {
        match key {
            Value::String(s) => PathSegment::Key(s.to_string()),
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= usize::MAX as f64 => {
                PathSegment::Index(*n as usize)
            }
            Value::Number(n) => PathSegment::Number(MapNumber(*n)),
            other => PathSegment::Key(other.key_text()),
        }
    }

    /// The segment as JSON text: quoted for keys, bare digits for
    /// indices.
    pub fn to_json_key(&self) -> String {
        match self {
            PathSegment::Key(k) => serde_json::Value::String(k.clone()).to_string(),
            PathSegment::Index(i) => i.to_string(),
            PathSegment::Number(n) if n.get().is_finite() => n.to_string(),
            PathSegment::Number(_) => "null".to_string(),
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) | PathSegment::Number(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(_) | PathSegment::Number(_) => None,
        }
    }

    /// Numeric value of an index or numeric map key.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(i) => Some(*i as f64),
            PathSegment::Number(n) => Some(n.get()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Join a path into its node key. The root path yields `""`.
pub fn node_key(path: &[PathSegment]) -> String {
    let mut key = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            key.push_str(KEY_SEPARATOR);
        }
        key.push_str(&segment.to_string());
    }
    key
}

/// Key of the child reached from `parent_key` through `segment`.
///
/// Agrees with [`node_key`] on the extended path.
pub fn child_key(parent_key: &str, segment: &PathSegment) -> String {
    if parent_key.is_empty() {
        segment.to_string()
    } else {
        format!("{parent_key}{KEY_SEPARATOR}{segment}")
    }
}

/// Convenience for building paths in tests and callers.
#[macro_export]
macro_rules! path {
    () => { Vec::<$crate::path::PathSegment>::new() };
    ($($seg:expr),+ $(,)?) => {
        vec![$($crate::path::PathSegment::from($seg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_key_is_empty() {
        assert_eq!(node_key(&[]), "");
    }

    #[test]
    fn keys_join_with_dots() {
        let path = path!["a", 3usize, "b"];
        assert_eq!(node_key(&path), "a.3.b");
    }

    #[test]
    fn child_key_agrees_with_node_key() {
        let parent = path!["users", 0usize];
        let child = PathSegment::from("name");
        let mut extended = parent.clone();
        extended.push(child.clone());
        assert_eq!(child_key(&node_key(&parent), &child), node_key(&extended));
        assert_eq!(child_key("", &child), "name");
    }

    #[test]
    fn map_keys_convert() {
        assert_eq!(
            PathSegment::from_map_key(&Value::Number(4.0)),
            PathSegment::Index(4)
        );
        assert_eq!(
            PathSegment::from_map_key(&Value::Number(-1.0)),
            PathSegment::Number(MapNumber(-1.0))
        );
        assert_eq!(
            PathSegment::from_map_key(&Value::Number(1.5)),
            PathSegment::Number(MapNumber(1.5))
        );
        assert_eq!(
            PathSegment::from_map_key(&Value::string("k")),
            PathSegment::Key("k".into())
        );
        assert_eq!(
            PathSegment::from_map_key(&Value::Bool(true)),
            PathSegment::Key("true".into())
        );
    }

    #[test]
    fn json_keys_quote_strings_only() {
        assert_eq!(PathSegment::from("a\"b").to_json_key(), r#""a\"b""#);
        assert_eq!(PathSegment::Index(7).to_json_key(), "7");
        assert_eq!(PathSegment::Number(MapNumber(-2.5)).to_json_key(), "-2.5");
    }

    #[test]
    fn numeric_map_keys_keep_their_text_in_node_keys() {
        let path = vec![
            PathSegment::from("m"),
            PathSegment::from_map_key(&Value::Number(-3.0)),
        ];
        assert_eq!(node_key(&path), "m.-3");
        let fractional = PathSegment::from_map_key(&Value::Number(10.5));
        assert_eq!(child_key("m", &fractional), "m.10.5");
        assert_eq!(fractional.as_number(), Some(10.5));
        assert_eq!(fractional.as_index(), None);
    }
}
