/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Partitioning a collection's children into chunks.
//!
//! Entries are cut into consecutive groups of `chunk_size`. When
//! nesting is enabled and a level still has more than `chunk_size`
//! groups, the groups themselves are grouped, repeatedly, until every
//! level fits. Leaves always hold entries, and every group at one
//! level spans the same nesting depth. A chunk size of 1 cannot
//! shorten a level, so it never nests.
//!
//! Chunk keys are derived from the parent key and the covered range,
//! so they are stable for a given parent and never collide with path
//! keys:
//!
//! ```text
//! {parent}|chunk|{open}{start}-{end}{close}
//! ```

use std::rc::Rc;

use crate::descriptor::CollectionInfo;
use crate::descriptor::NodeDescriptor;
use crate::error::ViewerError;
use crate::order::sort_entries;
use crate::path::PathSegment;
use crate::value::Entry;

/// Marks a key as belonging to a chunk rather than a path.
pub const CHUNK_MARKER: &str = "|chunk|";

/// How [`build_chunks`] orders and groups entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    pub sort: bool,
    pub nest: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            sort: false,
            nest: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChunkContents {
    Entries(Vec<Entry>),
    Nested(Vec<ChunkNode>),
}

/// A contiguous range of a collection's entries.
#[derive(Debug, Clone)]
pub struct ChunkNode {
    pub node_key: String,
    /// Key of the collection this chunk belongs to.
    pub source_key: String,
    /// Path of the collection this chunk belongs to.
    pub path: Vec<PathSegment>,
    /// First covered entry index, inclusive.
    pub start: usize,
    /// Last covered entry index, inclusive.
    pub end: usize,
    pub collection: Rc<CollectionInfo>,
    pub contents: ChunkContents,
}

impl ChunkNode {
    /// Number of entries covered.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.contents, ChunkContents::Nested(_))
    }

    /// Levels of chunks below this one, counting itself.
    pub fn depth(&self) -> usize {
        match &self.contents {
            ChunkContents::Entries(_) => 1,
            ChunkContents::Nested(children) => {
                1 + children.iter().map(ChunkNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Covered entries in order, flattening nested chunks.
    pub fn entries(&self) -> Vec<&Entry> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_entries(&mut out);
        out
    }

    fn collect_entries<'a>(&'a self, out: &mut Vec<&'a Entry>) {
        match &self.contents {
            ChunkContents::Entries(entries) => out.extend(entries),
            ChunkContents::Nested(children) => {
                for child in children {
                    child.collect_entries(out);
                }
            }
        }
    }
}

/// Result of [`build_chunks`].
#[derive(Debug, Clone)]
pub enum Chunks {
    /// Few enough entries to render directly.
    Unchunked(Vec<Entry>),
    Chunked(Vec<ChunkNode>),
}

impl Chunks {
    /// Total number of entries.
    pub fn len(&self) -> usize {
        match self {
            Chunks::Unchunked(entries) => entries.len(),
            Chunks::Chunked(chunks) => chunks.iter().map(ChunkNode::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Chunks::Chunked(_))
    }

    /// Entries in display order.
    pub fn entries(&self) -> Vec<&Entry> {
        match self {
            Chunks::Unchunked(entries) => entries.iter().collect(),
            Chunks::Chunked(chunks) => chunks.iter().flat_map(ChunkNode::entries).collect(),
        }
    }
}

/// Key of the chunk covering `start..=end` under `parent_key`.
pub fn chunk_key(parent_key: &str, info: &CollectionInfo, start: usize, end: usize) -> String {
    format!(
        "{parent_key}{CHUNK_MARKER}{}{start}-{end}{}",
        info.opening_bracket.resolve(true),
        info.closing_bracket.resolve(true),
    )
}

pub fn is_chunk_key(key: &str) -> bool {
    key.contains(CHUNK_MARKER)
}

/// Partition `entries` of the collection described by `parent`.
///
/// With `options.sort` the entries are ordered by
/// [`sort_entries`] before partitioning. Returns
/// [`Chunks::Unchunked`] when everything fits in one chunk.
pub fn build_chunks(
    mut entries: Vec<Entry>,
    chunk_size: usize,
    parent: &NodeDescriptor,
    options: ChunkOptions,
) -> Result<Chunks, ViewerError> {
    let info = parent
        .collection()
        .ok_or_else(|| ViewerError::NotACollection(parent.node_key.clone()))?;
    if chunk_size == 0 {
        return Err(ViewerError::InvalidChunkSize {
            kind: info.kind.to_string(),
            size: 0,
        });
    }
    if options.sort {
        sort_entries(&mut entries);
    }
    if entries.len() <= chunk_size {
        return Ok(Chunks::Unchunked(entries));
    }

    let total = entries.len();
    let mut level = Vec::with_capacity(total.div_ceil(chunk_size));
    let mut iter = entries.into_iter();
    let mut start = 0;
    while start < total {
        let group: Vec<Entry> = iter.by_ref().take(chunk_size).collect();
        let end = start + group.len() - 1;
        level.push(make_chunk(parent, info, start, end, ChunkContents::Entries(group)));
        start = end + 1;
    }

    if options.nest && chunk_size >= 2 {
        while level.len() > chunk_size {
            level = group_level(level, chunk_size, parent, info);
        }
    }

    tracing::trace!(
        parent = %parent.node_key,
        total,
        chunk_size,
        top = level.len(),
        depth = level.first().map(ChunkNode::depth).unwrap_or(0),
        "built chunks"
    );
    Ok(Chunks::Chunked(level))
}

fn group_level(
    level: Vec<ChunkNode>,
    chunk_size: usize,
    parent: &NodeDescriptor,
    info: &Rc<CollectionInfo>,
) -> Vec<ChunkNode> {
    let mut out = Vec::with_capacity(level.len().div_ceil(chunk_size));
    let mut iter = level.into_iter().peekable();
    while iter.peek().is_some() {
        let group: Vec<ChunkNode> = iter.by_ref().take(chunk_size).collect();
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            break;
        };
        let (start, end) = (first.start, last.end);
        out.push(make_chunk(parent, info, start, end, ChunkContents::Nested(group)));
    }
    out
}

fn make_chunk(
    parent: &NodeDescriptor,
    info: &Rc<CollectionInfo>,
    start: usize,
    end: usize,
    contents: ChunkContents,
) -> ChunkNode {
    ChunkNode {
        node_key: chunk_key(&parent.node_key, info, start, end),
        source_key: parent.node_key.clone(),
        path: parent.path.clone(),
        start,
        end,
        collection: info.clone(),
        contents,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::MakeNodeOptions;
    use crate::controller::ViewController;
    use crate::path;
    use crate::sizing::ChunkSizePolicy;
    use crate::testing;
    use crate::value::Value;

    fn array_node(n: usize) -> (NodeDescriptor, Value) {
        let mut controller = ViewController::new(Vec::new(), MakeNodeOptions::default());
        let value = testing::integer_array(n);
        let node = controller.make_node(&path!["items"], &value).unwrap();
        (node, value)
    }

    fn build(n: usize, chunk_size: usize, nest: bool) -> Chunks {
        let (node, value) = array_node(n);
        build_chunks(
            node.children(&value),
            chunk_size,
            &node,
            ChunkOptions { sort: false, nest },
        )
        .unwrap()
    }

    #[test]
    fn small_collections_stay_unchunked() {
        assert!(!build(5, 5, true).is_chunked());
        assert!(build(0, 5, true).is_empty());
    }

    #[test]
    fn partitions_array_of_250() {
        let Chunks::Chunked(chunks) = build(250, 100, true) else {
            panic!("expected chunks");
        };
        let ranges: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(0, 99), (100, 199), (200, 249)]);
        assert_eq!(chunks[0].node_key, "items|chunk|[0-99]");
        assert_eq!(chunks[2].source_key, "items");
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn nests_until_each_level_fits() {
        let Chunks::Chunked(top) = build(1000, 10, true) else {
            panic!("expected chunks");
        };
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].depth(), 2);
        assert_eq!((top[0].start, top[0].end), (0, 99));

        let Chunks::Chunked(deep) = build(1001, 10, true) else {
            panic!("expected chunks");
        };
        assert_eq!(deep.len(), 2);
        assert_eq!(deep[0].depth(), 3);
        assert_eq!((deep[1].start, deep[1].end), (1000, 1000));
    }

    #[test]
    fn flat_when_nesting_disabled() {
        let Chunks::Chunked(chunks) = build(1000, 10, false) else {
            panic!("expected chunks");
        };
        assert_eq!(chunks.len(), 100);
        assert!(chunks.iter().all(|c| !c.is_nested()));
    }

    #[test]
    fn sorts_before_partitioning() {
        let mut controller = ViewController::new(Vec::new(), MakeNodeOptions::default());
        let value = Value::object([
            ("c", Value::from(3)),
            ("a", Value::from(1)),
            ("b", Value::from(2)),
        ]);
        let node = controller.make_node(&path!["o"], &value).unwrap();
        let chunks = build_chunks(
            node.children(&value),
            2,
            &node,
            ChunkOptions {
                sort: true,
                nest: true,
            },
        )
        .unwrap();
        let keys: Vec<String> = chunks.entries().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        let Chunks::Chunked(chunks) = chunks else {
            panic!("expected chunks");
        };
        assert_eq!(chunks[0].node_key, "o|chunk|{0-1}");
    }

    #[test]
    fn rejects_value_nodes_and_zero_size() {
        let mut controller = ViewController::default();
        let scalar = controller.make_node(&path!["n"], &Value::from(1)).unwrap();
        assert!(matches!(
            build_chunks(Vec::new(), 10, &scalar, ChunkOptions::default()),
            Err(ViewerError::NotACollection(key)) if key == "n"
        ));

        let (node, value) = array_node(3);
        assert!(matches!(
            build_chunks(node.children(&value), 0, &node, ChunkOptions::default()),
            Err(ViewerError::InvalidChunkSize { size: 0, .. })
        ));
    }

    #[test]
    fn chunk_keys_never_look_like_paths() {
        let (node, value) = array_node(30);
        let Chunks::Chunked(chunks) =
            build_chunks(node.children(&value), 7, &node, ChunkOptions::default()).unwrap()
        else {
            panic!("expected chunks");
        };
        assert!(chunks.iter().all(|c| is_chunk_key(&c.node_key)));
        assert!(!is_chunk_key(&node.node_key));
    }

    fn ranges(chunks: &[ChunkNode]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start, c.end)).collect()
    }

    #[test]
    fn chunk_size_one_stays_flat_when_nesting() {
        let Chunks::Chunked(chunks) = build(3, 1, true) else {
            panic!("expected chunks");
        };
        assert_eq!(ranges(&chunks), vec![(0, 0), (1, 1), (2, 2)]);
        assert!(chunks.iter().all(|c| !c.is_nested()));
        assert_eq!(chunks[1].node_key, "items|chunk|[1-1]");
    }

    #[test]
    fn chunk_size_two_nests_pairs() {
        let Chunks::Chunked(three) = build(3, 2, true) else {
            panic!("expected chunks");
        };
        assert_eq!(ranges(&three), vec![(0, 1), (2, 2)]);
        assert!(three.iter().all(|c| !c.is_nested()));

        let Chunks::Chunked(five) = build(5, 2, true) else {
            panic!("expected chunks");
        };
        assert_eq!(ranges(&five), vec![(0, 3), (4, 4)]);
        assert_eq!(five[0].depth(), 2);
        let ChunkContents::Nested(children) = &five[0].contents else {
            panic!("expected nested chunk");
        };
        assert_eq!(ranges(children), vec![(0, 1), (2, 3)]);

        let Chunks::Chunked(nine) = build(9, 2, true) else {
            panic!("expected chunks");
        };
        assert_eq!(ranges(&nine), vec![(0, 7), (8, 8)]);
        assert_eq!(nine[0].depth(), 3);
        assert_eq!(nine[1].depth(), 3);
    }

    #[test]
    fn exactly_full_levels_do_not_nest() {
        let Chunks::Chunked(chunks) = build(100, 10, true) else {
            panic!("expected chunks");
        };
        assert_eq!(chunks.len(), 10);
        assert!(chunks.iter().all(|c| c.depth() == 1 && c.len() == 10));

        let Chunks::Chunked(chunks) = build(9, 3, true) else {
            panic!("expected chunks");
        };
        assert_eq!(ranges(&chunks), vec![(0, 2), (3, 5), (6, 8)]);
    }

    #[test]
    fn root_is_never_chunked_even_when_nesting() {
        let mut controller = ViewController::new(
            Vec::new(),
            MakeNodeOptions {
                array_chunk_size: Some(ChunkSizePolicy::Fixed(2)),
                nest_chunks: true,
                ..Default::default()
            },
        );
        let value = testing::integer_array(10);
        let root = controller.make_node(&[], &value).unwrap();
        assert!(!root.sizing.contents_chunked);
        assert_eq!(root.sizing.chunk_count, 0);

        let nested = controller.make_node(&path!["xs"], &value).unwrap();
        assert!(nested.sizing.contents_chunked);
        let Chunks::Chunked(top) = build_chunks(
            nested.children(&value),
            nested.sizing.chunk_size,
            &nested,
            controller.chunk_options(false),
        )
        .unwrap() else {
            panic!("expected chunks");
        };
        assert_eq!(top.len(), 2);
        assert_eq!(ranges(&top), vec![(0, 7), (8, 9)]);
    }

    fn check_level(chunks: &[ChunkNode], chunk_size: usize) -> Result<(), TestCaseError> {
        if chunk_size >= 2 {
            prop_assert!(chunks.len() <= chunk_size);
        }
        let depth = chunks[0].depth();
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
        }
        for chunk in chunks {
            prop_assert_eq!(chunk.depth(), depth);
            if let ChunkContents::Nested(children) = &chunk.contents {
                prop_assert_eq!(children[0].start, chunk.start);
                check_level(children, chunk_size)?;
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn chunks_partition_entries(n in 0usize..600, chunk_size in 1usize..40) {
            let chunks = build(n, chunk_size, true);
            let order: Vec<usize> = chunks
                .entries()
                .iter()
                .filter_map(|(k, _)| k.as_index())
                .collect();
            prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
            prop_assert_eq!(chunks.is_chunked(), n > chunk_size);
            if let Chunks::Chunked(top) = &chunks {
                prop_assert_eq!(top[0].start, 0);
                prop_assert_eq!(top[top.len() - 1].end, n - 1);
                check_level(top, chunk_size)?;
            }
        }

        #[test]
        fn leaf_chunks_are_full_except_the_last(n in 1usize..300, chunk_size in 1usize..20) {
            if let Chunks::Chunked(chunks) = build(n, chunk_size, false) {
                let (last, full) = chunks.split_last().unwrap();
                prop_assert!(full.iter().all(|c| c.len() == chunk_size));
                prop_assert!(last.len() <= chunk_size);
            }
        }
    }
}
