/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Copy payloads.
//!
//! Computes the text a copy action puts on the clipboard. Moving it
//! to an actual clipboard is up to the caller.

use std::fmt;
use std::str::FromStr;

use crate::descriptor::NodeDescriptor;
use crate::error::SerializeError;
use crate::path::PathSegment;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyTarget {
    /// The node's stringify output, or its JSON text.
    Value,
    Key,
    JsonKey,
    JsonValue,
}

impl CopyTarget {
    pub const ALL: [CopyTarget; 4] = [
        CopyTarget::Value,
        CopyTarget::Key,
        CopyTarget::JsonKey,
        CopyTarget::JsonValue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CopyTarget::Value => "Copy value",
            CopyTarget::Key => "Copy key",
            CopyTarget::JsonKey => "Copy JSON key",
            CopyTarget::JsonValue => "Copy JSON value",
        }
    }
}

impl fmt::Display for CopyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyTarget::Value => "value",
            CopyTarget::Key => "key",
            CopyTarget::JsonKey => "json-key",
            CopyTarget::JsonValue => "json-value",
        };
        f.write_str(name)
    }
}

impl FromStr for CopyTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(CopyTarget::Value),
            "key" => Ok(CopyTarget::Key),
            "json-key" => Ok(CopyTarget::JsonKey),
            "json-value" => Ok(CopyTarget::JsonValue),
            other => Err(format!("unknown copy target: {other}")),
        }
    }
}

/// Text copied for `target` on `node`.
///
/// Fails only where strict JSON serialization fails: a `Value` copy of
/// a node without `stringify`, or a `JsonValue` copy, of a cyclic or
/// big-integer value.
pub fn copy_text(
    node: &NodeDescriptor,
    value: &Value,
    target: CopyTarget,
) -> Result<String, SerializeError> {
    match target {
        CopyTarget::Value => match &node.stringify {
            Some(stringify) => Ok(stringify.apply(value)),
            None => json_text(value),
        },
        CopyTarget::Key => Ok(node
            .key
            .as_ref()
            .map(PathSegment::to_string)
            .unwrap_or_else(|| "undefined".to_string())),
        CopyTarget::JsonKey => Ok(node
            .key
            .as_ref()
            .map(PathSegment::to_json_key)
            .unwrap_or_else(|| "undefined".to_string())),
        CopyTarget::JsonValue => json_text(value),
    }
}

/// Compact JSON text of `value`; `undefined` when it has none.
pub fn json_text(value: &Value) -> Result<String, SerializeError> {
    Ok(match value.to_json()? {
        Some(json) => json.to_string(),
        None => "undefined".to_string(),
    })
}
