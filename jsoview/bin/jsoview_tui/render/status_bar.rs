/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use jsoview::format::format_count;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;

use crate::App;
use crate::theme::ColorScheme;
use crate::theme::Labels;
use crate::theme::ThemeName;

/// Render the top status bar.
///
/// Line 1 names the document and the view settings; line 2 shows the
/// selected row, or the last error or status message.
pub(crate) fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let l = &app.theme.labels;
    let scheme = &app.theme.scheme;

    let sort_state = if app.options.sort_keys { l.on } else { l.off };
    let selected_count = app.controller.store().selected_keys().count();

    let mut line1_spans = vec![
        Span::styled(l.app_name, scheme.app_name),
        Span::styled(l.separator, scheme.stat_label),
        Span::styled(&app.source, scheme.stat_label),
        Span::styled(l.separator, scheme.stat_label),
        Span::styled(l.rows, scheme.stat_label),
        Span::styled(format_count(app.rows.len()), scheme.stat_value),
        Span::styled(l.separator, scheme.stat_label),
        Span::styled(l.sort, scheme.stat_label),
        Span::styled(sort_state, scheme.stat_state),
    ];

    if selected_count > 0 {
        line1_spans.extend(vec![
            Span::styled(l.separator, scheme.stat_label),
            Span::styled(l.selected, scheme.stat_label),
            Span::styled(format_count(selected_count), scheme.stat_value),
        ]);
    }

    if app.options.strict_json {
        line1_spans.extend(vec![
            Span::styled(l.separator, scheme.stat_label),
            Span::styled(l.strict, scheme.stat_state),
        ]);
    }

    // Skip the default theme to reduce noise.
    if !matches!(app.theme_name, ThemeName::Nord) {
        line1_spans.extend(vec![
            Span::styled(l.separator, scheme.stat_label),
            Span::styled(format!("theme:{}", app.theme_name), scheme.stat_state),
        ]);
    }

    let line2 = if let Some(err) = &app.error {
        Line::from(Span::styled(format!("ERROR: {err}"), scheme.error))
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(status.as_str(), scheme.info))
    } else if let Some(row) = app.current_row() {
        Line::from(vec![
            Span::styled(l.selection_caret, scheme.stat_selection),
            Span::styled(row.key.as_str(), scheme.row_style(row)),
            Span::styled(" ", Style::default()),
            Span::styled(row.label.as_str(), scheme.stat_selection),
        ])
    } else {
        Line::from(Span::styled(l.no_selection, scheme.info))
    };

    let header = Paragraph::new(vec![Line::from(line1_spans), line2]).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(scheme.border),
    );

    frame.render_widget(header, area);
}

/// Render the bottom help bar showing the keyboard shortcuts.
pub(crate) fn render_footer(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    scheme: &ColorScheme,
    labels: &Labels,
) {
    let footer = Paragraph::new(labels.footer_help_text)
        .style(scheme.footer_help)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}
