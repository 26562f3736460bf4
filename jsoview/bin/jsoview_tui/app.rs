/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use futures::StreamExt;
use jsoview::ChunkLane;
use jsoview::SerializeError;
use jsoview::Value;
use jsoview::ViewController;
use jsoview::ViewerOptions;
use jsoview::config::NodeAction;
use jsoview::copy::CopyTarget;
use jsoview::copy::copy_text;
use jsoview::format::RenderOptions;
use jsoview::store::KeyFlags;
use jsoview::store::Subscription;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::Cursor;
use crate::FlattenContext;
use crate::KeyResult;
use crate::PAGE_SIZE;
use crate::Row;
use crate::RowKind;
use crate::Theme;
use crate::ThemeName;
use crate::VisibleRows;
use crate::flatten_rows;
use crate::ui;

/// Chunk builds run per event-loop turn while no input is waiting.
const LANE_BUDGET: usize = 4;

/// Runtime state for the terminal viewer.
///
/// `App` owns the controller (and with it the node state store), the
/// chunk lane, and the flattened rows of the current frame. Rows are
/// a pure projection of the root value and the store's expanded flags;
/// they are rebuilt whenever a subscribed key's expanded flag changes,
/// a chunk build lands, or a view setting changes.
pub(crate) struct App {
    /// Where the document came from, for the header.
    pub(crate) source: String,
    pub(crate) root: Value,
    pub(crate) controller: ViewController,
    pub(crate) lane: ChunkLane,
    pub(crate) options: ViewerOptions,
    pub(crate) render_options: RenderOptions,
    /// Preferences file `w` writes to.
    pub(crate) prefs_path: Option<PathBuf>,
    /// Set when the user requests exit (`q` / `Ctrl-C`).
    pub(crate) should_quit: bool,

    pub(crate) rows: VisibleRows,
    /// Navigation cursor over visible rows.
    pub(crate) cursor: Cursor,
    /// Scroll offset for the tree (top visible row).
    pub(crate) tree_scroll_offset: usize,
    /// Height of the tree viewport in rows (updated during rendering).
    pub(crate) tree_viewport_height: usize,

    /// What the detail pane shows as copy text.
    pub(crate) copy_target: CopyTarget,
    /// Transient message surfaced in the header.
    pub(crate) status: Option<String>,
    /// Materialization or chunking failure surfaced in the header.
    pub(crate) error: Option<String>,

    /// Keys whose state changed since the last frame, filled by store
    /// listeners.
    changed: Rc<RefCell<BTreeSet<String>>>,
    subscriptions: Vec<Subscription>,

    pub(crate) theme: Theme,
    pub(crate) theme_name: ThemeName,
}

impl App {
    pub(crate) fn new(
        source: impl Into<String>,
        root: Value,
        options: ViewerOptions,
        theme_name: ThemeName,
    ) -> Self {
        let mut controller = ViewController::from_options(&options, Vec::new());
        // The root starts open unless the session says otherwise.
        controller.set_expanded("", true, false);
        let mut app = Self {
            source: source.into(),
            root,
            controller,
            lane: ChunkLane::new(),
            render_options: RenderOptions::from(&options),
            options,
            prefs_path: None,
            should_quit: false,
            rows: VisibleRows::default(),
            cursor: Cursor::new(0),
            tree_scroll_offset: 0,
            tree_viewport_height: 20, // Default, updated during rendering
            copy_target: CopyTarget::Value,
            status: None,
            error: None,
            changed: Rc::new(RefCell::new(BTreeSet::new())),
            subscriptions: Vec::new(),
            theme: Theme::new(theme_name),
            theme_name,
        };
        app.refresh_rows();
        app.sync_hover();
        app
    }

    pub(crate) fn with_prefs_path(mut self, path: Option<PathBuf>) -> Self {
        self.prefs_path = path;
        self
    }

    pub(crate) fn current_row(&self) -> Option<&Row> {
        self.rows.get(&self.cursor)
    }

    /// `(expandable, expanded)` of the selected row.
    fn current_row_state(&self) -> Option<(bool, bool)> {
        self.current_row().map(|row| (row.expandable, row.expanded))
    }

    /// Flatten the tree again, keeping the cursor on the same key
    /// when it is still visible, and resubscribe every visible row.
    pub(crate) fn refresh_rows(&mut self) {
        let selected = self.current_row().map(|row| row.key.clone());
        let mut ctx = FlattenContext {
            controller: &mut self.controller,
            lane: &mut self.lane,
            sort: self.options.sort_keys,
            render: self.render_options,
        };
        match flatten_rows(&mut ctx, &self.root) {
            Ok(rows) => {
                self.rows = VisibleRows::new(rows);
                self.error = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to flatten rows");
                self.error = Some(err.to_string());
            }
        }

        self.cursor.update_len(self.rows.len());
        if let Some(key) = selected
            && let Some(pos) = self.rows.position(&key)
        {
            self.cursor.set_pos(pos);
        }
        self.ensure_cursor_visible();
        self.resubscribe();
    }

    fn resubscribe(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.controller.unsubscribe(&subscription);
        }
        for row in self.rows.as_slice() {
            let changed = self.changed.clone();
            let key = row.key.clone();
            let subscription = self
                .controller
                .subscribe(&row.key, row.node_type(), move || {
                    changed.borrow_mut().insert(key.clone());
                });
            self.subscriptions.push(subscription);
        }
        self.changed.borrow_mut().clear();
    }

    /// Consume store notifications. Rows are rebuilt only when a
    /// notified row's expanded flag no longer matches what it was
    /// flattened with; hover and selection changes just redraw.
    ///
    /// Returns whether anything changed.
    pub(crate) fn apply_store_changes(&mut self) -> bool {
        let changed = std::mem::take(&mut *self.changed.borrow_mut());
        if changed.is_empty() {
            return false;
        }
        let store = self.controller.store();
        let stale = changed.iter().any(|key| {
            self.rows
                .position(key)
                .and_then(|idx| self.rows.as_slice().get(idx))
                .is_some_and(|row| {
                    row.expandable && store.is_expanded(key).unwrap_or(false) != row.expanded
                })
        });
        if stale {
            tracing::trace!(keys = changed.len(), "expanded state changed, re-flattening");
            self.refresh_rows();
        }
        true
    }

    /// Run queued chunk builds. Returns whether any landed.
    pub(crate) fn run_lane(&mut self, budget: usize) -> bool {
        match self.lane.run_pending(budget) {
            Ok(ready) if ready.is_empty() => false,
            Ok(_) => {
                self.refresh_rows();
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "chunk build failed");
                self.error = Some(err.to_string());
                true
            }
        }
    }

    /// Hover the selected row and mark its nearest enclosing expanded
    /// collection.
    pub(crate) fn sync_hover(&mut self) {
        let Some(row) = self.rows.get(&self.cursor) else {
            self.controller.set_hovered(None);
            self.controller.set_hovered_collection(None);
            return;
        };
        let is_expanded_collection = match &row.kind {
            RowKind::Node { node, .. } => node.is_collection() && row.expanded,
            RowKind::Chunk { .. } | RowKind::Loading { .. } => false,
        };
        self.controller.hover_node(
            &row.key,
            row.parent_collection.as_deref(),
            is_expanded_collection,
        );
    }

    /// Copy text of the selected node for the current target.
    pub(crate) fn copy_preview(&self) -> Option<Result<String, SerializeError>> {
        let (node, value) = self.current_row()?.node()?;
        Some(copy_text(node, value, self.copy_target))
    }

    /// Adjust scroll offset to ensure the cursor remains visible
    /// within the viewport.
    pub(crate) fn ensure_cursor_visible(&mut self) {
        let pos = self.cursor.pos();
        if pos < self.tree_scroll_offset {
            self.tree_scroll_offset = pos;
        } else if pos >= self.tree_scroll_offset + self.tree_viewport_height {
            self.tree_scroll_offset = pos.saturating_sub(self.tree_viewport_height.saturating_sub(1));
        }
    }

    fn moved(&mut self, changed: bool) -> KeyResult {
        if changed {
            self.ensure_cursor_visible();
            KeyResult::DetailChanged
        } else {
            KeyResult::None
        }
    }

    fn set_row_expanded(&mut self, expanded: bool) -> KeyResult {
        if let Some(row) = self.rows.get(&self.cursor)
            && row.expandable
            && row.expanded != expanded
        {
            let key = row.key.clone();
            self.controller.set_expanded(&key, expanded, true);
        }
        KeyResult::None
    }

    fn activate(&mut self, action: NodeAction) -> KeyResult {
        let Some(row) = self.rows.get(&self.cursor) else {
            return KeyResult::None;
        };
        let key = row.key.clone();
        match action {
            NodeAction::Expand if row.expandable => {
                self.controller.toggle_expanded(&key);
            }
            NodeAction::Expand => {}
            NodeAction::Select if row.is_loading() => {}
            NodeAction::Select => {
                self.controller.toggle_selected(&key);
            }
        }
        KeyResult::None
    }

    fn collapse_all(&mut self) -> KeyResult {
        let flags: BTreeMap<String, bool> = self
            .controller
            .store()
            .expanded_keys()
            .filter(|key| !key.is_empty())
            .map(|key| (key.to_string(), false))
            .collect();
        let changed = self
            .controller
            .bulk_set_expanded(KeyFlags::Flags(flags), true);
        tracing::debug!(count = changed.len(), "collapsed all");
        self.cursor.home();
        KeyResult::NeedsRefresh
    }

    fn clear_selection(&mut self) -> KeyResult {
        let flags: BTreeMap<String, bool> = self
            .controller
            .store()
            .selected_keys()
            .map(|key| (key.to_string(), false))
            .collect();
        self.controller
            .bulk_set_selected(KeyFlags::Flags(flags), true);
        KeyResult::None
    }

    fn save_prefs(&mut self) -> KeyResult {
        let Some(path) = &self.prefs_path else {
            self.status = Some("no preferences file (use --prefs)".to_string());
            return KeyResult::None;
        };
        self.status = Some(match self.options.save(path) {
            Ok(()) => format!("saved preferences to {}", path.display()),
            Err(err) => {
                tracing::warn!(error = %err, "failed to save preferences");
                err.to_string()
            }
        });
        KeyResult::None
    }

    /// Handle a single keypress.
    ///
    /// Expand, collapse and select go through the state store; their
    /// effect on rows arrives through [`App::apply_store_changes`].
    pub(crate) fn on_key(&mut self, key: KeyEvent) -> KeyResult {
        self.status = None;
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                KeyResult::None
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                KeyResult::None
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                // Scroll selected item to top of visible area
                self.tree_scroll_offset = self.cursor.pos();
                KeyResult::None
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let changed = self.cursor.page_down(PAGE_SIZE);
                self.moved(changed)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let changed = self.cursor.page_up(PAGE_SIZE);
                self.moved(changed)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                let changed = self.cursor.move_up();
                self.moved(changed)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let changed = self.cursor.move_down();
                self.moved(changed)
            }
            KeyCode::Home | KeyCode::Char('g') => {
                let changed = self.cursor.home();
                self.moved(changed)
            }
            KeyCode::End | KeyCode::Char('G') => {
                let changed = self.cursor.end();
                self.moved(changed)
            }
            KeyCode::PageDown => {
                let changed = self.cursor.page_down(PAGE_SIZE);
                self.moved(changed)
            }
            KeyCode::PageUp => {
                let changed = self.cursor.page_up(PAGE_SIZE);
                self.moved(changed)
            }
            KeyCode::Tab => self.activate(NodeAction::Expand),
            KeyCode::Enter => self.activate(self.options.click_action),
            KeyCode::Char(' ') => self.activate(self.options.space_action),
            KeyCode::Right | KeyCode::Char('l') => {
                let Some((expandable, expanded)) = self.current_row_state() else {
                    return KeyResult::None;
                };
                if expandable && !expanded {
                    self.set_row_expanded(true)
                } else if expanded {
                    let changed = self.cursor.move_down();
                    self.moved(changed)
                } else {
                    KeyResult::None
                }
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let Some((_, expanded)) = self.current_row_state() else {
                    return KeyResult::None;
                };
                if expanded {
                    return self.set_row_expanded(false);
                }
                match self.rows.parent_of(self.cursor.pos()) {
                    Some(parent) => {
                        self.cursor.set_pos(parent);
                        self.moved(true)
                    }
                    None => KeyResult::None,
                }
            }
            KeyCode::Char('s') => {
                self.options.sort_keys = !self.options.sort_keys;
                KeyResult::NeedsRefresh
            }
            KeyCode::Char('c') => self.collapse_all(),
            KeyCode::Char('x') => self.clear_selection(),
            KeyCode::Char('y') => {
                let idx = CopyTarget::ALL
                    .iter()
                    .position(|target| *target == self.copy_target)
                    .unwrap_or(0);
                self.copy_target = CopyTarget::ALL[(idx + 1) % CopyTarget::ALL.len()];
                KeyResult::None
            }
            KeyCode::Char('w') => self.save_prefs(),
            _ => KeyResult::None,
        }
    }

    /// Apply a key event end to end: handle it, then bring rows and
    /// hover state up to date.
    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match self.on_key(key) {
            KeyResult::DetailChanged => self.sync_hover(),
            KeyResult::NeedsRefresh => {
                self.refresh_rows();
                self.sync_hover();
            }
            KeyResult::None => {}
        }
        if self.apply_store_changes() {
            self.sync_hover();
            self.apply_store_changes();
        }
    }
}

/// Drive the main event loop.
///
/// Renders, then waits for input. While no input is waiting, queued
/// chunk builds run a few at a time so expanding a large collection
/// never blocks the keyboard.
pub(crate) async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> io::Result<()> {
    let mut events = EventStream::new();

    loop {
        // The body area is terminal height minus header (3 rows),
        // footer (2 rows) and the tree pane's borders.
        let terminal_size = terminal.size()?;
        app.tree_viewport_height = terminal_size.height.saturating_sub(7).max(1) as usize;
        app.ensure_cursor_visible();

        terminal.draw(|frame| ui(frame, &app))?;

        tokio::select! {
            biased;
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => app.handle_key(key),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err),
                    None => break,
                }
            }
            _ = tokio::task::yield_now(), if app.lane.has_pending() => {
                if app.run_lane(LANE_BUDGET) {
                    app.sync_hover();
                    app.apply_store_changes();
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
