/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use jsoview::NodeDescriptor;
use jsoview::Value;
use jsoview::format::format_count;
use jsoview::format::segment_label;
use jsoview::format::size_label;
use jsoview::store::ControlledNodeState;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;

use crate::App;
use crate::Row;
use crate::RowKind;
use crate::theme::ColorScheme;
use crate::theme::Labels;

/// Render the details pane (right side) for the selected row.
pub(crate) fn render_detail_pane(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let scheme = &app.theme.scheme;
    let labels = &app.theme.labels;
    let block = Block::default()
        .title(labels.pane_details)
        .borders(Borders::ALL)
        .border_style(scheme.border);

    let Some(row) = app.current_row() else {
        let paragraph = Paragraph::new(Span::styled(labels.select_prompt, scheme.info)).block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = match &row.kind {
        RowKind::Node { node, value } => node_lines(app, row, node, value),
        RowKind::Chunk { start, end } => vec![
            field(scheme, labels.path, path_text(&row.key, labels)),
            field(
                scheme,
                labels.range,
                format!("{} - {}", format_count(*start), format_count(*end)),
            ),
            field(scheme, labels.size, size_label(end - start + 1)),
        ],
        RowKind::Loading { chunk_count } => vec![Line::from(Span::styled(
            format!("{} ({})", labels.loading, format_count(*chunk_count)),
            scheme.node_loading,
        ))],
    };

    let state = app.controller.snapshot(&row.key);
    lines.push(field(scheme, labels.state, state_text(&state)));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn node_lines(
    app: &App,
    row: &Row,
    node: &NodeDescriptor,
    value: &Value,
) -> Vec<Line<'static>> {
    let scheme = &app.theme.scheme;
    let labels = &app.theme.labels;
    let key = node
        .key
        .as_ref()
        .map(|key| segment_label(key, app.render_options.quote_keys))
        .unwrap_or_else(|| labels.root.to_string());

    let kind = match node.collection() {
        Some(info) => match &info.type_label {
            Some(label) => format!("{} ({label})", info.kind),
            None => info.kind.to_string(),
        },
        None => value.type_of().to_string(),
    };

    let mut lines = vec![
        field(scheme, labels.key, key),
        field(scheme, labels.path, path_text(&row.key, labels)),
        field(scheme, labels.kind, kind),
    ];

    if node.is_collection() {
        lines.push(field(scheme, labels.size, size_label(node.sizing.size)));
        if node.sizing.contents_chunked {
            lines.push(field(
                scheme,
                labels.chunks,
                format!(
                    "{} of {}",
                    format_count(node.sizing.chunk_count),
                    format_count(node.sizing.chunk_size)
                ),
            ));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("{} (y):", app.copy_target.label()),
        scheme.detail_label,
    )));
    match app.copy_preview() {
        Some(Ok(text)) => lines.push(Line::from(Span::styled(text, scheme.detail_copy))),
        Some(Err(err)) => lines.push(Line::from(Span::styled(err.to_string(), scheme.error))),
        None => {}
    }
    lines.push(Line::default());
    lines
}

fn field(scheme: &ColorScheme, label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, scheme.detail_label),
        Span::raw(value),
    ])
}

fn path_text(key: &str, labels: &Labels) -> String {
    if key.is_empty() {
        labels.root.to_string()
    } else {
        key.to_string()
    }
}

fn state_text(state: &ControlledNodeState) -> String {
    let mut flags = Vec::new();
    if state.is_expanded == Some(true) {
        flags.push("expanded");
    }
    if state.is_selected == Some(true) {
        flags.push("selected");
    }
    if state.is_hovered {
        flags.push("hovered");
    }
    if state.is_collection_hovered {
        flags.push("collection hovered");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(", ")
    }
}
