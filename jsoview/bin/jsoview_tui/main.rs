/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Terminal viewer for JSON documents, built on the `jsoview` core.
//!
//! Loads one document and shows it as a navigable tree. Selecting a
//! row shows its key, kind, sizing and copy text on the right.
//!
//! Invariants:
//! - **Rows are a projection**: the row list is recomputed from the
//!   root value and the store's expanded flags (`flatten_rows`); it is
//!   never edited in place.
//! - **State lives in the store**: expand, select and hover go through
//!   the controller's `NodeStateStore`. Every visible row subscribes
//!   to its key; a notification whose expanded flag disagrees with
//!   the row re-flattens, anything else only redraws.
//! - **Cursor laws**: `Cursor` keeps `pos < len` (or `pos == 0` when
//!   empty), and after a re-flatten the cursor stays on the same key
//!   when that key is still visible.
//! - **Chunking never blocks input**: chunk builds are queued on the
//!   `ChunkLane` and run only when no key event is waiting; until then
//!   the collection shows a loading row.
//!
//! ```bash
//! jsoview-tui data.json
//! jsoview-tui --sort-keys --prefs ~/.config/jsoview.json < data.json
//! ```

mod actions;
mod app;
mod model;
mod render;
mod theme;
mod tree;

use std::fs::File;
use std::io;
use std::io::IsTerminal;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

pub(crate) use actions::*;
pub(crate) use app::*;
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use jsoview::Value;
use jsoview::ViewerOptions;
pub(crate) use model::*;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
pub(crate) use render::*;
pub(crate) use theme::*;
pub(crate) use tree::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "jsoview=info,jsoview_tui=info";

// Terminal setup / teardown

/// Put the terminal into "TUI mode".
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Restore the terminal back to normal "shell mode".
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Send tracing output to `path`. Without a log file nothing is
/// installed: stdout belongs to the terminal UI.
fn init_tracing(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Effective options: the preferences file, then `JSOVIEW_*`
/// variables, then flags.
pub(crate) fn resolve_options(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ViewerOptions> {
    let base = match &args.prefs {
        Some(path) => ViewerOptions::load_or_default(path)?,
        None => ViewerOptions::default(),
    };
    let mut options = base.apply_env(env)?;
    if let Some(n) = args.chunk_size {
        options.chunk_size = Some(n);
    }
    if args.flat_chunks {
        options.nest_chunks = false;
    }
    if args.sort_keys {
        options.sort_keys = true;
    }
    if let Some(depth) = args.expand_depth {
        options.expand_depth = Some(depth);
    }
    if let Some(quote_keys) = args.quote_keys {
        options.quote_keys = quote_keys;
    }
    if let Some(action) = args.space_action {
        options.space_action = action;
    }
    if args.strict_json {
        options.strict_json = true;
    }
    Ok(options)
}

/// Read and parse the document named by `path`, or stdin.
pub(crate) fn load_document(path: Option<&Path>) -> anyhow::Result<(String, Value)> {
    let (source, text) = match path {
        Some(path) if path != Path::new("-") => (
            path.display().to_string(),
            std::fs::read_to_string(path)
                .map_err(|err| anyhow::anyhow!("reading {}: {err}", path.display()))?,
        ),
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            ("<stdin>".to_string(), text)
        }
    };
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| anyhow::anyhow!("parsing {source}: {err}"))?;
    Ok((source, Value::from(json)))
}

// Main loop

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    if !io::stdout().is_terminal() {
        eprintln!("This TUI requires a real terminal.");
        return Ok(());
    }

    let options = resolve_options(&args, |var| std::env::var(var).ok())?;
    let (source, root) = load_document(args.path.as_deref())?;
    tracing::info!(%source, ?options, "opened document");

    let app = App::new(source, root, options, args.theme).with_prefs_path(args.prefs.clone());

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, app).await;
    restore_terminal(&mut terminal)?;
    Ok(result?)
}

#[cfg(test)]
mod tests;
