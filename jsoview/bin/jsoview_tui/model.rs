/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use jsoview::NodeDescriptor;
use jsoview::NodeType;
use jsoview::Value;

/// Rows moved by PgUp/PgDn and their vi/Emacs aliases.
pub(crate) const PAGE_SIZE: usize = 10;

/// Navigation cursor over a bounded list.
///
/// Invariant: `pos < len` (or `pos == 0` when `len == 0`).
/// Movement methods return `true` when the position changes.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pos: usize,
    len: usize,
}

impl Cursor {
    pub(crate) fn new(len: usize) -> Self {
        Self { pos: 0, len }
    }

    pub(crate) fn move_up(&mut self) -> bool {
        if self.pos > 0 {
            self.pos -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn move_down(&mut self) -> bool {
        if self.pos + 1 < self.len {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn home(&mut self) -> bool {
        self.set_if_changed(0)
    }

    pub(crate) fn end(&mut self) -> bool {
        self.set_if_changed(self.len.saturating_sub(1))
    }

    pub(crate) fn page_down(&mut self, amount: usize) -> bool {
        self.set_if_changed((self.pos + amount).min(self.len.saturating_sub(1)))
    }

    pub(crate) fn page_up(&mut self, amount: usize) -> bool {
        self.set_if_changed(self.pos.saturating_sub(amount))
    }

    fn set_if_changed(&mut self, new_pos: usize) -> bool {
        if self.pos != new_pos {
            self.pos = new_pos;
            true
        } else {
            false
        }
    }

    /// Update length and clamp position to remain valid.
    pub(crate) fn update_len(&mut self, new_len: usize) {
        self.len = new_len;
        self.pos = self.pos.min(new_len.saturating_sub(1));
    }

    /// Set position directly, clamped to the valid range.
    pub(crate) fn set_pos(&mut self, new_pos: usize) {
        self.pos = new_pos.min(self.len.saturating_sub(1));
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[allow(dead_code)] // used by tests
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

/// What a flattened row shows.
#[derive(Debug, Clone)]
pub(crate) enum RowKind {
    /// A materialized node and the value it describes.
    Node { node: NodeDescriptor, value: Value },
    /// A range of a chunked collection.
    Chunk { start: usize, end: usize },
    /// Placeholder while a collection's chunks are being built.
    Loading { chunk_count: usize },
}

/// One line of the tree pane.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    /// Node key (or chunk key) used for state lookup.
    pub(crate) key: String,
    pub(crate) kind: RowKind,
    pub(crate) depth: usize,
    /// Key of the nearest enclosing collection; `None` at the root.
    pub(crate) parent_collection: Option<String>,
    pub(crate) label: String,
    pub(crate) expandable: bool,
    /// Expanded state observed when the row was flattened.
    pub(crate) expanded: bool,
}

impl Row {
    /// Channel set a row's subscription joins. Chunks behave like
    /// collections: they expand, and they are not hovered as values.
    pub(crate) fn node_type(&self) -> NodeType {
        match &self.kind {
            RowKind::Node { node, .. } => node.node_type(),
            RowKind::Chunk { .. } => NodeType::Collection,
            RowKind::Loading { .. } => NodeType::Value,
        }
    }

    pub(crate) fn node(&self) -> Option<(&NodeDescriptor, &Value)> {
        match &self.kind {
            RowKind::Node { node, value } => Some((node, value)),
            _ => None,
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self.kind, RowKind::Loading { .. })
    }
}

/// Flattened visible rows with cursor helpers.
#[derive(Debug, Default)]
pub(crate) struct VisibleRows {
    rows: Vec<Row>,
}

impl VisibleRows {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub(crate) fn get(&self, cursor: &Cursor) -> Option<&Row> {
        self.rows.get(cursor.pos())
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn as_slice(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    /// Index of the closest earlier row one level up.
    pub(crate) fn parent_of(&self, idx: usize) -> Option<usize> {
        let depth = self.rows.get(idx)?.depth;
        if depth == 0 {
            return None;
        }
        self.rows[..idx].iter().rposition(|row| row.depth == depth - 1)
    }

    /// Check whether a later row at the same depth exists (for tree
    /// connector rendering: `├─` vs `└─`).
    pub(crate) fn has_sibling_after(&self, idx: usize, depth: usize) -> bool {
        for row in &self.rows[idx + 1..] {
            if row.depth < depth {
                return false;
            }
            if row.depth == depth {
                return true;
            }
        }
        false
    }
}
