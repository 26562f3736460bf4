/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Viewer configuration.
//!
//! [`ViewerOptions`] is the serializable form: the user-preference
//! blob a presentation layer persists, overridable per field from
//! `JSOVIEW_*` environment variables. [`MakeNodeOptions`] is the
//! runtime form the controller consumes; it can also carry closures
//! (chunk-size and default-expansion policies, a base parser) that
//! have no serialized representation.

use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::descriptor::NodeDescriptor;
use crate::descriptor::NodeOverrides;
use crate::error::ConfigError;
use crate::extension::BaseParser;
use crate::sizing::ChunkSizePolicy;
use crate::sizing::NodeSizing;

/// Chunk size for every collection kind, unless a per-kind size is
/// set.
pub const ENV_CHUNK_SIZE: &str = "JSOVIEW_CHUNK_SIZE";
/// Chunk size for arrays.
pub const ENV_ARRAY_CHUNK_SIZE: &str = "JSOVIEW_ARRAY_CHUNK_SIZE";
/// Chunk size for objects and custom-typed objects.
pub const ENV_OBJECT_CHUNK_SIZE: &str = "JSOVIEW_OBJECT_CHUNK_SIZE";
/// Group chunks into chunks-of-chunks when a level grows too wide.
pub const ENV_NEST_CHUNKS: &str = "JSOVIEW_NEST_CHUNKS";
/// Sort keys of every collection.
pub const ENV_SORT_KEYS: &str = "JSOVIEW_SORT_KEYS";
/// Expand every node on first sight.
pub const ENV_DEFAULT_EXPANDED: &str = "JSOVIEW_DEFAULT_EXPANDED";
/// Expand collections shallower than this depth on first sight.
pub const ENV_EXPAND_DEPTH: &str = "JSOVIEW_EXPAND_DEPTH";
/// Truncate string previews after this many characters; `0` disables.
pub const ENV_COLLAPSE_STRINGS_AFTER: &str = "JSOVIEW_COLLAPSE_STRINGS_AFTER";
/// Key quoting: `always`, `never` or `when-needed`.
pub const ENV_QUOTE_KEYS: &str = "JSOVIEW_QUOTE_KEYS";
/// What activating a row does: `expand` or `select`.
pub const ENV_CLICK_ACTION: &str = "JSOVIEW_CLICK_ACTION";
/// What the space key does: `expand` or `select`.
pub const ENV_SPACE_ACTION: &str = "JSOVIEW_SPACE_ACTION";
/// Hide everything strict JSON cannot represent.
pub const ENV_STRICT_JSON: &str = "JSOVIEW_STRICT_JSON";

/// Default string preview length.
pub const DEFAULT_COLLAPSE_STRINGS_AFTER: usize = 75;

/// When keys are wrapped in quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteKeys {
    Always,
    Never,
    /// Quote keys that are not identifiers.
    #[default]
    WhenNeeded,
}

impl FromStr for QuoteKeys {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(QuoteKeys::Always),
            "never" => Ok(QuoteKeys::Never),
            "when-needed" => Ok(QuoteKeys::WhenNeeded),
            other => Err(format!(
                "expected one of always, never, when-needed; got {other:?}"
            )),
        }
    }
}

impl fmt::Display for QuoteKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKeys::Always => write!(f, "always"),
            QuoteKeys::Never => write!(f, "never"),
            QuoteKeys::WhenNeeded => write!(f, "when-needed"),
        }
    }
}

/// What an activation gesture does to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeAction {
    #[default]
    Expand,
    Select,
}

impl FromStr for NodeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expand" => Ok(NodeAction::Expand),
            "select" => Ok(NodeAction::Select),
            other => Err(format!("expected expand or select; got {other:?}")),
        }
    }
}

impl fmt::Display for NodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeAction::Expand => write!(f, "expand"),
            NodeAction::Select => write!(f, "select"),
        }
    }
}

/// Serializable viewer configuration and preference blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    pub chunk_size: Option<usize>,
    pub array_chunk_size: Option<usize>,
    pub object_chunk_size: Option<usize>,
    pub nest_chunks: bool,
    pub sort_keys: bool,
    pub default_expanded: bool,
    pub expand_depth: Option<usize>,
    pub collapse_strings_after_length: Option<usize>,
    pub quote_keys: QuoteKeys,
    pub click_action: NodeAction,
    pub space_action: NodeAction,
    pub strict_json: bool,
    pub disable_default_extensions: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            array_chunk_size: None,
            object_chunk_size: None,
            nest_chunks: true,
            sort_keys: false,
            default_expanded: false,
            expand_depth: None,
            collapse_strings_after_length: Some(DEFAULT_COLLAPSE_STRINGS_AFTER),
            quote_keys: QuoteKeys::default(),
            click_action: NodeAction::default(),
            space_action: NodeAction::default(),
            strict_json: false,
            disable_default_extensions: false,
        }
    }
}

impl ViewerOptions {
    /// Read a preference blob written by [`ViewerOptions::save`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no preferences file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(io_err)
    }

    /// Override fields from the process environment.
    pub fn apply_process_env(self) -> Result<Self, ConfigError> {
        self.apply_env(|var| std::env::var(var).ok())
    }

    /// Override fields from `JSOVIEW_*` variables resolved by
    /// `lookup`.
    pub fn apply_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(n) = parse_var::<usize>(&lookup, ENV_CHUNK_SIZE)? {
            self.chunk_size = Some(n);
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_ARRAY_CHUNK_SIZE)? {
            self.array_chunk_size = Some(n);
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_OBJECT_CHUNK_SIZE)? {
            self.object_chunk_size = Some(n);
        }
        if let Some(b) = parse_flag(&lookup, ENV_NEST_CHUNKS)? {
            self.nest_chunks = b;
        }
        if let Some(b) = parse_flag(&lookup, ENV_SORT_KEYS)? {
            self.sort_keys = b;
        }
        if let Some(b) = parse_flag(&lookup, ENV_DEFAULT_EXPANDED)? {
            self.default_expanded = b;
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_EXPAND_DEPTH)? {
            self.expand_depth = Some(n);
        }
        if let Some(n) = parse_var::<usize>(&lookup, ENV_COLLAPSE_STRINGS_AFTER)? {
            self.collapse_strings_after_length = (n > 0).then_some(n);
        }
        if let Some(q) = parse_var::<QuoteKeys>(&lookup, ENV_QUOTE_KEYS)? {
            self.quote_keys = q;
        }
        if let Some(a) = parse_var::<NodeAction>(&lookup, ENV_CLICK_ACTION)? {
            self.click_action = a;
        }
        if let Some(a) = parse_var::<NodeAction>(&lookup, ENV_SPACE_ACTION)? {
            self.space_action = a;
        }
        if let Some(b) = parse_flag(&lookup, ENV_STRICT_JSON)? {
            self.strict_json = b;
        }
        Ok(self)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|err| ConfigError::InvalidEnv {
            var,
            value: raw.clone(),
            reason: err.to_string(),
        })
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw,
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Initial expansion of freshly materialized nodes.
#[derive(Clone)]
pub enum DefaultExpanded {
    Flag(bool),
    Policy(Rc<dyn Fn(&NodeSizing, &NodeDescriptor) -> bool>),
}

impl DefaultExpanded {
    pub fn policy(f: impl Fn(&NodeSizing, &NodeDescriptor) -> bool + 'static) -> Self {
        DefaultExpanded::Policy(Rc::new(f))
    }

    /// Expand collections whose path is shorter than `depth`.
    pub fn depth(depth: usize) -> Self {
        DefaultExpanded::policy(move |_, node| node.is_collection() && node.path.len() < depth)
    }

    pub fn evaluate(&self, sizing: &NodeSizing, node: &NodeDescriptor) -> bool {
        match self {
            DefaultExpanded::Flag(b) => *b,
            DefaultExpanded::Policy(f) => f(sizing, node),
        }
    }
}

impl Default for DefaultExpanded {
    fn default() -> Self {
        DefaultExpanded::Flag(false)
    }
}

impl fmt::Debug for DefaultExpanded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultExpanded::Flag(b) => f.debug_tuple("Flag").field(b).finish(),
            DefaultExpanded::Policy(_) => f.write_str("Policy(..)"),
        }
    }
}

/// Runtime materialization options.
#[derive(Clone)]
pub struct MakeNodeOptions {
    /// Fallback policy for every kind.
    pub chunk_size: ChunkSizePolicy,
    pub array_chunk_size: Option<ChunkSizePolicy>,
    pub object_chunk_size: Option<ChunkSizePolicy>,
    pub nest_chunks: bool,
    pub default_expanded: DefaultExpanded,
    /// Applied to every node, and under every collection's own
    /// overrides.
    pub default_props: NodeOverrides,
    /// Consulted before, and preempting, the extensions.
    pub base_parser: Option<BaseParser>,
}

impl Default for MakeNodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSizePolicy::default(),
            array_chunk_size: None,
            object_chunk_size: None,
            nest_chunks: true,
            default_expanded: DefaultExpanded::default(),
            default_props: NodeOverrides::default(),
            base_parser: None,
        }
    }
}

impl fmt::Debug for MakeNodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakeNodeOptions")
            .field("chunk_size", &self.chunk_size)
            .field("array_chunk_size", &self.array_chunk_size)
            .field("object_chunk_size", &self.object_chunk_size)
            .field("nest_chunks", &self.nest_chunks)
            .field("default_expanded", &self.default_expanded)
            .field("default_props", &self.default_props)
            .field("base_parser", &self.base_parser.is_some())
            .finish()
    }
}

impl From<&ViewerOptions> for MakeNodeOptions {
    fn from(options: &ViewerOptions) -> Self {
        let default_expanded = match (options.default_expanded, options.expand_depth) {
            (true, _) => DefaultExpanded::Flag(true),
            (false, Some(depth)) => DefaultExpanded::depth(depth),
            (false, None) => DefaultExpanded::Flag(false),
        };
        Self {
            chunk_size: options
                .chunk_size
                .map(ChunkSizePolicy::Fixed)
                .unwrap_or_default(),
            array_chunk_size: options.array_chunk_size.map(ChunkSizePolicy::Fixed),
            object_chunk_size: options.object_chunk_size.map(ChunkSizePolicy::Fixed),
            nest_chunks: options.nest_chunks,
            default_expanded,
            default_props: NodeOverrides::default(),
            base_parser: None,
        }
    }
}
