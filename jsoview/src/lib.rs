/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Core of a virtualized tree viewer for large, nested, possibly
//! cyclic values.
//!
//! The crate turns a root [`Value`] into the pieces a presentation
//! layer needs to show it lazily:
//!
//! - [`ViewController::make_node`] materializes one `(path, value)`
//!   pair into a [`NodeDescriptor`], consulting registered
//!   [`Extension`]s before built-in classification and remembering
//!   composites by identity so shared and cyclic values stay cheap.
//! - [`compute_sizing`] decides whether a collection's children are
//!   shown directly or split into chunks, and [`build_chunks`] does the
//!   split, nesting chunks when one level would still be too long.
//!   [`ChunkLane`] defers those builds off the interactive path.
//! - [`NodeStateStore`] holds hover, collection-hover, expanded and
//!   selected state per node key and notifies only the listener
//!   registered for the key that changed.
//!
//! ```
//! use jsoview::ViewController;
//! use jsoview::Value;
//! use jsoview::path;
//!
//! let mut controller = ViewController::default();
//! let value = Value::from(serde_json::json!({"items": [1, 2, 3]}));
//! let root = controller.make_node(&[], &value).unwrap();
//! assert!(root.is_collection());
//!
//! let items = controller.make_node(&path!["items"], &value).unwrap();
//! assert_eq!(items.node_key, "items");
//! ```

pub mod chunk;
pub mod config;
pub mod controller;
pub mod copy;
pub mod descriptor;
pub mod error;
pub mod extension;
pub mod format;
pub mod lane;
pub mod order;
pub mod path;
pub mod sizing;
pub mod store;
pub mod testing;
pub mod value;

pub use chunk::ChunkNode;
pub use chunk::ChunkOptions;
pub use chunk::Chunks;
pub use chunk::build_chunks;
pub use config::DefaultExpanded;
pub use config::MakeNodeOptions;
pub use config::ViewerOptions;
pub use controller::ViewController;
pub use descriptor::CollectionKind;
pub use descriptor::NodeDescriptor;
pub use descriptor::NodeType;
pub use error::ConfigError;
pub use error::SerializeError;
pub use error::ViewerError;
pub use extension::Extension;
pub use extension::Fragment;
pub use lane::ChunkLane;
pub use path::PathSegment;
pub use sizing::ChunkSizePolicy;
pub use sizing::NodeSizing;
pub use sizing::compute_sizing;
pub use store::ControlledNodeState;
pub use store::NodeStateStore;
pub use value::Value;
