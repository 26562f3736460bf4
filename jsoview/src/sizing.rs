/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Paging decisions for collections.

use std::fmt;
use std::rc::Rc;

use crate::descriptor::CollectionKind;
use crate::error::ViewerError;

/// Chunk size meaning "never chunk".
pub const UNBOUNDED: usize = usize::MAX;

/// Default chunk size for arrays.
pub const DEFAULT_ARRAY_CHUNK_SIZE: usize = 100;

/// Default chunk size for kinds without a dedicated rule.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

const OBJECT_CHUNK_FLOOR: usize = 50;
const OBJECT_CHUNK_CEILING: usize = 100;
const OBJECT_SCALE_THRESHOLD: usize = 100;

/// The paging decision for one collection node.
///
/// `contents_chunked == (size > chunk_size)`, and `chunk_count` is
/// `ceil(size / chunk_size)` when chunked, `0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSizing {
    pub size: usize,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub contents_chunked: bool,
}

impl NodeSizing {
    /// Sizing of a value node.
    pub const fn leaf() -> Self {
        Self::unchunked(0)
    }

    /// Sizing of a collection that is never paged.
    pub const fn unchunked(size: usize) -> Self {
        Self {
            size,
            chunk_size: UNBOUNDED,
            chunk_count: 0,
            contents_chunked: false,
        }
    }

    /// Sizing for `size` entries paged by `chunk_size`.
    pub fn with_chunk_size(size: usize, chunk_size: usize) -> Self {
        if size <= chunk_size {
            Self {
                size,
                chunk_size,
                chunk_count: 0,
                contents_chunked: false,
            }
        } else {
            Self {
                size,
                chunk_size,
                chunk_count: size.div_ceil(chunk_size),
                contents_chunked: true,
            }
        }
    }
}

/// How a collection's chunk size is chosen.
#[derive(Clone)]
pub enum ChunkSizePolicy {
    Fixed(usize),
    /// Computed from `(size, kind)`.
    Dynamic(Rc<dyn Fn(usize, &CollectionKind) -> usize>),
}

impl ChunkSizePolicy {
    pub fn unbounded() -> Self {
        ChunkSizePolicy::Fixed(UNBOUNDED)
    }

    pub fn dynamic(f: impl Fn(usize, &CollectionKind) -> usize + 'static) -> Self {
        ChunkSizePolicy::Dynamic(Rc::new(f))
    }

    /// Resolve to a concrete chunk size. Zero is rejected.
    pub fn resolve(&self, size: usize, kind: &CollectionKind) -> Result<usize, ViewerError> {
        let chunk_size = match self {
            ChunkSizePolicy::Fixed(n) => *n,
            ChunkSizePolicy::Dynamic(f) => f(size, kind),
        };
        if chunk_size == 0 {
            return Err(ViewerError::InvalidChunkSize {
                kind: kind.to_string(),
                size,
            });
        }
        Ok(chunk_size)
    }
}

impl Default for ChunkSizePolicy {
    fn default() -> Self {
        ChunkSizePolicy::dynamic(default_chunk_size)
    }
}

impl fmt::Debug for ChunkSizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkSizePolicy::Fixed(UNBOUNDED) => f.write_str("Unbounded"),
            ChunkSizePolicy::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            ChunkSizePolicy::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<usize> for ChunkSizePolicy {
    fn from(n: usize) -> Self {
        ChunkSizePolicy::Fixed(n)
    }
}

/// Default policy: fixed for arrays, size-scaled for objects.
pub fn default_chunk_size(size: usize, kind: &CollectionKind) -> usize {
    match kind {
        CollectionKind::Array => DEFAULT_ARRAY_CHUNK_SIZE,
        CollectionKind::Object | CollectionKind::Class => default_object_chunk_size(size),
        CollectionKind::Tagged(_) => DEFAULT_CHUNK_SIZE,
    }
}

/// Objects below 100 keys page by 50; larger ones by `size / 5`,
/// clamped to `[50, 100]`.
pub fn default_object_chunk_size(size: usize) -> usize {
    if size < OBJECT_SCALE_THRESHOLD {
        OBJECT_CHUNK_FLOOR
    } else {
        (size / 5).clamp(OBJECT_CHUNK_FLOOR, OBJECT_CHUNK_CEILING)
    }
}

/// Compute sizing for a collection of `size` entries.
///
/// Root nodes are never chunked, whatever the policy says.
pub fn compute_sizing(
    kind: &CollectionKind,
    size: usize,
    policy: &ChunkSizePolicy,
    is_root: bool,
) -> Result<NodeSizing, ViewerError> {
    if is_root {
        return Ok(NodeSizing::unchunked(size));
    }
    let chunk_size = policy.resolve(size, &kind.sizing_kind())?;
    Ok(NodeSizing::with_chunk_size(size, chunk_size))
}
