/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use jsoview::Value;
use jsoview::config::NodeAction;
use jsoview::config::QuoteKeys;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;

use crate::model::Row;
use crate::model::RowKind;

/// Selectable color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ThemeName {
    /// Nord, an arctic, north-bluish color palette.
    #[default]
    Nord,
    /// doom-nord-light: desaturated Nord accents for light backgrounds.
    DoomNordLight,
}

impl std::fmt::Display for ThemeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeName::Nord => write!(f, "nord"),
            ThemeName::DoomNordLight => write!(f, "doom-nord-light"),
        }
    }
}

/// Command-line arguments for the terminal viewer.
///
/// Flags given here override `JSOVIEW_*` environment variables, which
/// override the preferences file.
#[derive(Debug, Default, Parser)]
#[command(name = "jsoview-tui", about = "Browse a JSON document as a lazily expanded tree")]
pub(crate) struct Args {
    /// JSON document to open; reads stdin when absent or `-`.
    pub(crate) path: Option<PathBuf>,

    /// Preferences file (a serialized `ViewerOptions`).
    #[arg(long, env = "JSOVIEW_PREFS")]
    pub(crate) prefs: Option<PathBuf>,

    /// Write tracing output to this file.
    #[arg(long, env = "JSOVIEW_LOG_FILE")]
    pub(crate) log_file: Option<PathBuf>,

    /// Page every collection by this many entries.
    #[arg(long)]
    pub(crate) chunk_size: Option<usize>,

    /// Do not nest chunks when one level would still be too long.
    #[arg(long)]
    pub(crate) flat_chunks: bool,

    /// Sort object keys.
    #[arg(long)]
    pub(crate) sort_keys: bool,

    /// Expand collections shallower than this depth.
    #[arg(long)]
    pub(crate) expand_depth: Option<usize>,

    /// Key quoting.
    #[arg(long)]
    pub(crate) quote_keys: Option<QuoteKeys>,

    /// What space does to the selected node.
    #[arg(long)]
    pub(crate) space_action: Option<NodeAction>,

    /// Hide everything strict JSON cannot represent.
    #[arg(long)]
    pub(crate) strict_json: bool,

    /// Color theme
    #[arg(long, default_value_t = ThemeName::Nord, value_enum)]
    pub(crate) theme: ThemeName,
}

/// All user-visible text in the viewer.
pub(crate) struct Labels {
    pub(crate) app_name: &'static str,

    pub(crate) separator: &'static str,
    pub(crate) selection_caret: &'static str,
    pub(crate) selected_mark: &'static str,
    pub(crate) collection_bar: &'static str,
    pub(crate) no_selection: &'static str,

    pub(crate) rows: &'static str,
    pub(crate) sort: &'static str,
    pub(crate) on: &'static str,
    pub(crate) off: &'static str,
    pub(crate) strict: &'static str,
    pub(crate) selected: &'static str,

    pub(crate) key: &'static str,
    pub(crate) path: &'static str,
    pub(crate) kind: &'static str,
    pub(crate) size: &'static str,
    pub(crate) chunks: &'static str,
    pub(crate) range: &'static str,
    pub(crate) state: &'static str,
    pub(crate) root: &'static str,
    pub(crate) loading: &'static str,

    pub(crate) pane_tree: &'static str,
    pub(crate) pane_details: &'static str,
    pub(crate) select_prompt: &'static str,

    pub(crate) footer_help_text: &'static str,
}

impl Labels {
    pub(crate) fn en() -> Self {
        Self {
            app_name: "jsoview",
            separator: " • ",
            selection_caret: "▸ ",
            selected_mark: "● ",
            collection_bar: "┃",
            no_selection: "No selection",
            rows: "rows:",
            sort: "sort:",
            on: "on",
            off: "off",
            strict: "strict",
            selected: "selected:",
            key: "Key: ",
            path: "Path: ",
            kind: "Kind: ",
            size: "Size: ",
            chunks: "Chunks: ",
            range: "Range: ",
            state: "State: ",
            root: "(root)",
            loading: "Building chunks",
            pane_tree: "Tree",
            pane_details: "Details",
            select_prompt: "Select a node to view details",
            footer_help_text: "q: quit | j/k: navigate | g/G: top/bottom | Tab/→: expand | ←: collapse/parent | space: select | s: sort keys | c: collapse all | y: copy target | w: save prefs",
        }
    }
}

/// Color scheme for the viewer.
///
/// Each field is a semantic role; themes assign concrete colors.
pub(crate) struct ColorScheme {
    // UI chrome
    pub(crate) app_name: Style,
    pub(crate) border: Style,
    pub(crate) footer_help: Style,

    // Tree rows by value kind
    pub(crate) node_collection: Style,
    pub(crate) node_string: Style,
    pub(crate) node_number: Style,
    pub(crate) node_keyword: Style,
    pub(crate) node_function: Style,
    pub(crate) node_chunk: Style,
    pub(crate) node_loading: Style,
    pub(crate) node_selected: Style,
    pub(crate) collection_hover: Style,

    // Semantic states
    pub(crate) error: Style,
    pub(crate) info: Style,

    // Header stats
    pub(crate) stat_selection: Style,
    pub(crate) stat_state: Style,
    pub(crate) stat_label: Style,
    pub(crate) stat_value: Style,

    // Detail pane
    pub(crate) detail_label: Style,
    pub(crate) detail_copy: Style,
}

impl ColorScheme {
    /// Nord color scheme (https://www.nordtheme.com/).
    pub(crate) fn nord() -> Self {
        // Polar Night
        let polar3 = Color::Rgb(76, 86, 106); // #4C566A
        // Snow Storm
        let snow0 = Color::Rgb(216, 222, 233); // #D8DEE9
        let snow2 = Color::Rgb(236, 239, 244); // #ECEFF4
        // Frost
        let frost_teal = Color::Rgb(143, 188, 187); // #8FBCBB
        let frost_cyan = Color::Rgb(136, 192, 208); // #88C0D0
        let frost_blue = Color::Rgb(129, 161, 193); // #81A1C1
        let frost_dark = Color::Rgb(94, 129, 172); // #5E81AC
        // Aurora
        let aurora_red = Color::Rgb(191, 97, 106); // #BF616A
        let aurora_orange = Color::Rgb(208, 135, 112); // #D08770
        let aurora_yellow = Color::Rgb(235, 203, 139); // #EBCB8B
        let aurora_green = Color::Rgb(163, 190, 140); // #A3BE8C
        let aurora_purple = Color::Rgb(180, 142, 173); // #B48EAD

        Self {
            app_name: Style::default().fg(frost_cyan).add_modifier(Modifier::BOLD),
            border: Style::default().fg(polar3),
            footer_help: Style::default().fg(polar3),

            node_collection: Style::default().fg(frost_teal),
            node_string: Style::default().fg(aurora_green),
            node_number: Style::default().fg(aurora_purple),
            node_keyword: Style::default().fg(frost_blue),
            node_function: Style::default().fg(aurora_orange),
            node_chunk: Style::default().fg(frost_dark),
            node_loading: Style::default().fg(polar3).add_modifier(Modifier::ITALIC),
            node_selected: Style::default().fg(aurora_yellow),
            collection_hover: Style::default().fg(frost_cyan),

            error: Style::default().fg(aurora_red),
            info: Style::default().fg(frost_cyan),

            stat_selection: Style::default().fg(aurora_purple),
            stat_state: Style::default().fg(frost_dark),
            stat_label: Style::default().fg(snow0),
            stat_value: Style::default().fg(snow2).add_modifier(Modifier::BOLD),

            detail_label: Style::default().fg(snow0),
            detail_copy: Style::default().fg(aurora_green),
        }
    }

    /// doom-nord-light color scheme.
    ///
    /// Desaturated Nord accents adapted for light backgrounds.
    pub(crate) fn doom_nord_light() -> Self {
        let base7 = Color::Rgb(96, 114, 140); // #60728C
        let fg = Color::Rgb(59, 66, 82); // #3B4252
        let fg_alt = Color::Rgb(46, 52, 64); // #2E3440
        let red = Color::Rgb(153, 50, 75); // #99324B
        let orange = Color::Rgb(172, 68, 38); // #AC4426
        let green = Color::Rgb(79, 137, 76); // #4F894C
        let yellow = Color::Rgb(154, 117, 0); // #9A7500
        let blue = Color::Rgb(59, 110, 168); // #3B6EA8
        let dark_blue = Color::Rgb(82, 114, 175); // #5272AF
        let teal = Color::Rgb(41, 131, 141); // #29838D
        let cyan = Color::Rgb(57, 142, 172); // #398EAC
        let violet = Color::Rgb(132, 40, 121); // #842879

        Self {
            app_name: Style::default().fg(teal).add_modifier(Modifier::BOLD),
            border: Style::default().fg(base7),
            footer_help: Style::default().fg(base7),

            node_collection: Style::default().fg(teal),
            node_string: Style::default().fg(green),
            node_number: Style::default().fg(violet),
            node_keyword: Style::default().fg(blue),
            node_function: Style::default().fg(orange),
            node_chunk: Style::default().fg(dark_blue),
            node_loading: Style::default().fg(base7).add_modifier(Modifier::ITALIC),
            node_selected: Style::default().fg(yellow),
            collection_hover: Style::default().fg(cyan),

            error: Style::default().fg(red),
            info: Style::default().fg(cyan),

            stat_selection: Style::default().fg(violet),
            stat_state: Style::default().fg(dark_blue),
            stat_label: Style::default().fg(fg),
            stat_value: Style::default().fg(fg_alt).add_modifier(Modifier::BOLD),

            detail_label: Style::default().fg(fg),
            detail_copy: Style::default().fg(green),
        }
    }

    /// Base style of a row, by what it shows.
    pub(crate) fn row_style(&self, row: &Row) -> Style {
        match &row.kind {
            RowKind::Chunk { .. } => self.node_chunk,
            RowKind::Loading { .. } => self.node_loading,
            RowKind::Node { node, .. } if node.is_collection() => self.node_collection,
            RowKind::Node { value, .. } => match value {
                Value::String(_) => self.node_string,
                Value::Number(_) | Value::BigInt(_) => self.node_number,
                Value::Function(_) | Value::Symbol(_) => self.node_function,
                _ => self.node_keyword,
            },
        }
    }
}

/// Visual presentation: colors plus text.
pub(crate) struct Theme {
    pub(crate) scheme: ColorScheme,
    pub(crate) labels: Labels,
}

impl Theme {
    pub(crate) fn new(name: ThemeName) -> Self {
        let scheme = match name {
            ThemeName::Nord => ColorScheme::nord(),
            ThemeName::DoomNordLight => ColorScheme::doom_nord_light(),
        };
        Self {
            scheme,
            labels: Labels::en(),
        }
    }
}
