/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Error types surfaced by the viewer core.
//!
//! Caller-supplied policy (extensions, base parsers, chunk-size
//! closures) is trusted: its failures propagate as [`ViewerError`]
//! instead of being masked. Values that merely cannot be serialized
//! are not errors at this layer; they are hidden by the JSON
//! extension.

use std::path::PathBuf;

/// Failures while materializing nodes or building chunks.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// A registered extension returned an error from `parse`.
    #[error("extension `{name}` failed to parse value")]
    Extension {
        /// Name the extension was registered under.
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The caller-supplied base parser returned an error.
    #[error("base parser failed")]
    BaseParser(#[source] anyhow::Error),

    /// A chunk-size policy resolved to zero.
    #[error("chunk size policy for {kind} of size {size} resolved to 0")]
    InvalidChunkSize { kind: String, size: usize },

    /// A collection fragment omitted a field required to build a
    /// collection descriptor.
    #[error("collection fragment is missing `{0}`")]
    IncompleteFragment(&'static str),

    /// Chunking was requested for a value node.
    #[error("node `{0}` is not a collection")]
    NotACollection(String),
}

/// Failures loading or overriding [`crate::config::ViewerOptions`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the preference blob failed.
    #[error("failed to access preferences at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preference blob is not valid JSON for the options schema.
    #[error("failed to parse preferences at {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Why a value has no strict JSON text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// The value reaches itself through its own children.
    #[error("value contains a reference cycle")]
    Cycle,

    /// Big integers have no JSON representation.
    #[error("big integers cannot be serialized to JSON")]
    BigInt,

    /// A host value declined to provide a JSON form.
    #[error("host value of type {0} has no JSON form")]
    Opaque(String),
}
