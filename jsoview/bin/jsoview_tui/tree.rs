/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Projection of expanded node and chunk state onto a flat row list.
//!
//! Only expanded collections are descended into, so the work done per
//! frame is proportional to what is visible. Chunked collections ask
//! the lane for their chunks; until a build completes they contribute
//! a single loading row.

use jsoview::ChunkLane;
use jsoview::ChunkNode;
use jsoview::Chunks;
use jsoview::NodeDescriptor;
use jsoview::Value;
use jsoview::ViewController;
use jsoview::ViewerError;
use jsoview::chunk::ChunkContents;
use jsoview::format::RenderOptions;
use jsoview::format::chunk_label;
use jsoview::format::node_label;
use jsoview::order::sort_entries;
use jsoview::value::Entry;

use crate::model::Row;
use crate::model::RowKind;

/// Suffix of the placeholder row shown under a collection whose chunks
/// are still being built.
pub(crate) const LOADING_SUFFIX: &str = "|loading";

/// Everything flattening reads or materializes through.
pub(crate) struct FlattenContext<'a> {
    pub(crate) controller: &'a mut ViewController,
    pub(crate) lane: &'a mut ChunkLane,
    pub(crate) sort: bool,
    pub(crate) render: RenderOptions,
}

/// Flatten the tree rooted at `root` into visible rows, in display
/// order.
pub(crate) fn flatten_rows(
    ctx: &mut FlattenContext<'_>,
    root: &Value,
) -> Result<Vec<Row>, ViewerError> {
    let mut rows = Vec::new();
    let node = ctx.controller.make_node(&[], root)?;
    push_node(ctx, node, root.clone(), 0, None, &mut rows)?;
    Ok(rows)
}

fn push_node(
    ctx: &mut FlattenContext<'_>,
    node: NodeDescriptor,
    value: Value,
    depth: usize,
    parent: Option<&str>,
    rows: &mut Vec<Row>,
) -> Result<(), ViewerError> {
    if node.hide {
        return Ok(());
    }
    let expandable = node.is_collection() && node.sizing.size > 0;
    let expanded = expandable
        && ctx
            .controller
            .store()
            .is_expanded(&node.node_key)
            .unwrap_or(false);
    rows.push(Row {
        key: node.node_key.clone(),
        label: node_label(&node, &value, expanded, &ctx.render),
        kind: RowKind::Node {
            node: node.clone(),
            value: value.clone(),
        },
        depth,
        parent_collection: parent.map(str::to_string),
        expandable,
        expanded,
    });
    if !expanded {
        return Ok(());
    }

    if node.sizing.contents_chunked {
        let options = ctx.controller.chunk_options(ctx.sort);
        let generation = ctx.controller.generation();
        match ctx.lane.request(&node, &value, options, generation) {
            Some(chunks) => match chunks.as_ref() {
                Chunks::Unchunked(entries) => {
                    push_entries(ctx, &node, entries.clone(), depth + 1, rows)?
                }
                Chunks::Chunked(list) => {
                    for chunk in list {
                        push_chunk(ctx, &node, chunk, depth + 1, rows)?;
                    }
                }
            },
            None => rows.push(Row {
                key: format!("{}{LOADING_SUFFIX}", node.node_key),
                kind: RowKind::Loading {
                    chunk_count: node.sizing.chunk_count,
                },
                depth: depth + 1,
                parent_collection: Some(node.node_key.clone()),
                label: "Loading...".to_string(),
                expandable: false,
                expanded: false,
            }),
        }
    } else {
        let mut entries = node.children(&value);
        if ctx.sort {
            sort_entries(&mut entries);
        }
        push_entries(ctx, &node, entries, depth + 1, rows)?;
    }
    Ok(())
}

fn push_chunk(
    ctx: &mut FlattenContext<'_>,
    parent: &NodeDescriptor,
    chunk: &ChunkNode,
    depth: usize,
    rows: &mut Vec<Row>,
) -> Result<(), ViewerError> {
    let expanded = ctx
        .controller
        .store()
        .is_expanded(&chunk.node_key)
        .unwrap_or(false);
    rows.push(Row {
        key: chunk.node_key.clone(),
        kind: RowKind::Chunk {
            start: chunk.start,
            end: chunk.end,
        },
        depth,
        parent_collection: Some(parent.node_key.clone()),
        label: chunk_label(chunk),
        expandable: true,
        expanded,
    });
    if !expanded {
        return Ok(());
    }
    match &chunk.contents {
        ChunkContents::Entries(entries) => push_entries(ctx, parent, entries.clone(), depth + 1, rows),
        ChunkContents::Nested(children) => {
            for child in children {
                push_chunk(ctx, parent, child, depth + 1, rows)?;
            }
            Ok(())
        }
    }
}

fn push_entries(
    ctx: &mut FlattenContext<'_>,
    parent: &NodeDescriptor,
    entries: Vec<Entry>,
    depth: usize,
    rows: &mut Vec<Row>,
) -> Result<(), ViewerError> {
    for (segment, value) in entries {
        let child = ctx.controller.make_child_node(parent, segment, &value)?;
        push_node(ctx, child, value, depth, Some(&parent.node_key), rows)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use jsoview::MakeNodeOptions;
    use jsoview::testing;

    use super::*;

    fn flatten(controller: &mut ViewController, lane: &mut ChunkLane, root: &Value) -> Vec<Row> {
        let mut ctx = FlattenContext {
            controller,
            lane,
            sort: false,
            render: RenderOptions::default(),
        };
        flatten_rows(&mut ctx, root).unwrap()
    }

    fn keys(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|row| row.key.as_str()).collect()
    }

    #[test]
    fn collapsed_root_is_a_single_row() {
        let mut controller = ViewController::default();
        let mut lane = ChunkLane::new();
        let root = Value::from(serde_json::json!({"a": 1, "b": [1, 2]}));
        let rows = flatten(&mut controller, &mut lane, &root);
        assert_eq!(keys(&rows), vec![""]);
        assert!(rows[0].expandable);
        assert!(!rows[0].expanded);
    }

    #[test]
    fn expanded_collections_show_children() {
        let mut controller = ViewController::default();
        let mut lane = ChunkLane::new();
        let root = Value::from(serde_json::json!({"a": 1, "b": [1, 2]}));
        controller.set_expanded("", true, true);
        controller.set_expanded("b", true, true);
        let rows = flatten(&mut controller, &mut lane, &root);
        assert_eq!(keys(&rows), vec!["", "a", "b", "b.0", "b.1"]);
        assert_eq!(rows[3].depth, 2);
        assert_eq!(rows[3].parent_collection.as_deref(), Some("b"));
        assert_eq!(rows[1].label, "a: 1");
    }

    #[test]
    fn chunked_collections_load_through_the_lane() {
        let mut controller = ViewController::default();
        let mut lane = ChunkLane::new();
        let root = Value::object([("xs", testing::integer_array(250))]);
        controller.set_expanded("", true, true);
        controller.set_expanded("xs", true, true);

        let rows = flatten(&mut controller, &mut lane, &root);
        assert_eq!(rows.len(), 3);
        assert!(rows[2].is_loading());
        assert!(lane.has_pending());

        lane.run_pending(4).unwrap();
        let rows = flatten(&mut controller, &mut lane, &root);
        let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels[2..], ["[0 - 99]", "[100 - 199]", "[200 - 249]"]);
        assert_eq!(rows[2].parent_collection.as_deref(), Some("xs"));
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let mut controller = ViewController::strict_json(MakeNodeOptions::default());
        let mut lane = ChunkLane::new();
        let root = Value::object([
            ("f", Value::function(Some("f"), "function f() {}")),
            ("n", Value::from(1)),
        ]);
        controller.set_expanded("", true, true);
        let rows = flatten(&mut controller, &mut lane, &root);
        assert_eq!(keys(&rows), vec!["", "n"]);
    }

    #[test]
    fn cycles_only_grow_when_expanded() {
        let mut controller = ViewController::default();
        let mut lane = ChunkLane::new();
        let root = testing::cyclic_object();
        controller.set_expanded("", true, true);
        controller.set_expanded("self", true, true);
        let rows = flatten(&mut controller, &mut lane, &root);
        assert_eq!(
            keys(&rows),
            vec!["", "name", "self", "self.name", "self.self"]
        );
        assert!(!rows[4].expanded);
    }
}
