/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;

use crate::App;

/// Render the tree (left pane).
///
/// Only the rows inside the viewport become list items. Each row
/// carries indentation/connectors, a fold glyph for expandable rows,
/// a bar when it belongs to the hovered collection, and a mark when
/// it is selected.
pub(crate) fn render_tree(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let rows = &app.rows;
    let scheme = &app.theme.scheme;
    let labels = &app.theme.labels;
    let hovered_collection = app.controller.store().hovered_collection();

    let height = (area.height.saturating_sub(2) as usize).max(1);
    let start = app.tree_scroll_offset.min(rows.len());
    let end = (start + height).min(rows.len());

    let items: Vec<ListItem> = rows.as_slice()[start..end]
        .iter()
        .enumerate()
        .map(|(offset, row)| {
            let vis_idx = start + offset;
            let state = app.controller.snapshot(&row.key);
            let indent = "  ".repeat(row.depth);

            let connector = if row.depth == 0 {
                ""
            } else if rows.has_sibling_after(vis_idx, row.depth) {
                "├─ "
            } else {
                "└─ "
            };

            let fold = if row.expandable {
                if row.expanded { "▼ " } else { "▶ " }
            } else {
                "  "
            };

            let in_hovered_collection = hovered_collection.is_some()
                && (row.parent_collection.as_deref() == hovered_collection
                    || Some(row.key.as_str()) == hovered_collection);
            let bar = if in_hovered_collection {
                Span::styled(labels.collection_bar, scheme.collection_hover)
            } else {
                Span::raw(" ")
            };

            let selected = state.is_selected.unwrap_or(false);
            let mark = if selected { labels.selected_mark } else { "" };

            // Style precedence: cursor > selected > row kind.
            let style = if vis_idx == app.cursor.pos() {
                scheme.stat_selection.add_modifier(Modifier::BOLD)
            } else if selected {
                scheme.node_selected
            } else {
                scheme.row_style(row)
            };

            let marker = if vis_idx == app.cursor.pos() {
                labels.selection_caret
            } else {
                "  "
            };

            ListItem::new(Line::from(vec![
                Span::raw(marker),
                bar,
                Span::styled(
                    format!("{}{}{}{}{}", indent, connector, fold, mark, row.label),
                    style,
                ),
            ]))
        })
        .collect();

    let title = format!(
        "{} ({}/{})",
        labels.pane_tree,
        if rows.is_empty() { 0 } else { app.cursor.pos() + 1 },
        rows.len()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(scheme.border);

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default());
    let selected = app
        .cursor
        .pos()
        .checked_sub(start)
        .filter(|pos| start + pos < end);
    let mut list_state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut list_state);
}
