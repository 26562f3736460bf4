/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Value fixtures shared by unit tests and the terminal viewer's
//! tests.

use std::any::Any;

use crate::controller::ViewController;
use crate::descriptor::NodeDescriptor;
use crate::error::ViewerError;
use crate::path::PathSegment;
use crate::value::Entry;
use crate::value::HostValue;
use crate::value::Value;

/// `{ name: "loop", self: <itself> }`.
pub fn cyclic_object() -> Value {
    let value = Value::object([("name", Value::from("loop"))]);
    value.insert("self", value.clone());
    value
}

/// An object whose `a` and `b` properties hold the same array.
/// Returns the root and the shared array.
pub fn shared_reference() -> (Value, Value) {
    let shared = Value::array([Value::from(1), Value::from(2)]);
    let root = Value::object([("a", shared.clone()), ("b", shared.clone())]);
    (root, shared)
}

/// `[0, 1, ..., n - 1]`.
pub fn integer_array(n: usize) -> Value {
    Value::array((0..n).map(|i| Value::Number(i as f64)))
}

/// `{ k0: 0, k1: 1, ... }` with `n` properties.
pub fn wide_object(n: usize) -> Value {
    Value::object((0..n).map(|i| (format!("k{i}"), Value::Number(i as f64))))
}

/// A caller-defined type, shown through [`HostValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl HostValue for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn entries(&self) -> Vec<Entry> {
        vec![
            (PathSegment::from("x"), Value::from(self.x)),
            (PathSegment::from("y"), Value::from(self.y)),
        ]
    }

    fn to_json(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "x": self.x, "y": self.y }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Materialize `value` and its descendants depth first, the way a
/// fully expanded presentation would, without descending into values
/// that were already materialized. Stops after `limit` nodes. Returns
/// the number of nodes materialized.
pub fn walk(controller: &mut ViewController, value: &Value, limit: usize) -> Result<usize, ViewerError> {
    let root = controller.make_node(&[], value)?;
    let mut count = 1;
    let mut stack: Vec<(NodeDescriptor, Value)> = vec![(root, value.clone())];
    while let Some((node, value)) = stack.pop() {
        for (segment, child) in node.children(&value).into_iter().rev() {
            if count >= limit {
                return Ok(count);
            }
            let known = controller.is_materialized(&child);
            let child_node = controller.make_child_node(&node, segment, &child)?;
            count += 1;
            if !known && child_node.is_collection() {
                stack.push((child_node, child));
            }
        }
    }
    Ok(count)
}
