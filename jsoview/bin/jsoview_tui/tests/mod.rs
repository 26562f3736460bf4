/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Integration tests that exercise multiple modules together (App +
//! tree flattening + store + lane). Per-module unit tests live in
//! each module's own `#[cfg(test)] mod tests` block.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use jsoview::config::NodeAction;
use jsoview::copy::CopyTarget;
use jsoview::testing;
use serde_json::json;

use super::*;

fn app(json: serde_json::Value) -> App {
    App::new("test", Value::from(json), ViewerOptions::default(), ThemeName::Nord)
}

fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn keys(app: &App) -> Vec<String> {
    app.rows.as_slice().iter().map(|row| row.key.clone()).collect()
}

fn selected_key(app: &App) -> Option<&str> {
    app.current_row().map(|row| row.key.as_str())
}

#[test]
fn root_starts_expanded_and_hovered() {
    let app = app(json!({"a": 1, "b": [1, 2]}));
    assert_eq!(keys(&app), vec!["", "a", "b"]);
    assert_eq!(app.cursor.pos(), 0);
    assert_eq!(app.controller.store().hovered(), Some(""));
    assert_eq!(app.controller.store().hovered_collection(), Some(""));
}

#[test]
fn cursor_movement_moves_hover_and_collection_hover() {
    let mut app = app(json!({"a": 1, "b": [1, 2]}));
    press(&mut app, KeyCode::Char('j'));
    assert_eq!(selected_key(&app), Some("a"));
    assert_eq!(app.controller.store().hovered(), Some("a"));
    assert_eq!(app.controller.store().hovered_collection(), Some(""));

    press(&mut app, KeyCode::Char('G'));
    press(&mut app, KeyCode::Tab);
    assert_eq!(selected_key(&app), Some("b"));
    assert_eq!(app.controller.store().hovered_collection(), Some("b"));
}

#[test]
fn tab_expands_through_the_store() {
    let mut app = app(json!({"a": 1, "b": [1, 2]}));
    press(&mut app, KeyCode::End);
    press(&mut app, KeyCode::Tab);
    assert_eq!(keys(&app), vec!["", "a", "b", "b.0", "b.1"]);
    assert_eq!(selected_key(&app), Some("b"));
    assert_eq!(app.controller.store().is_expanded("b"), Some(true));

    press(&mut app, KeyCode::Tab);
    assert_eq!(keys(&app), vec!["", "a", "b"]);
}

#[test]
fn left_jumps_to_parent_then_collapses() {
    let mut app = app(json!({"a": 1, "b": [1, 2]}));
    press(&mut app, KeyCode::End);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Down);
    assert_eq!(selected_key(&app), Some("b.0"));

    press(&mut app, KeyCode::Left);
    assert_eq!(selected_key(&app), Some("b"));
    press(&mut app, KeyCode::Left);
    assert_eq!(keys(&app), vec!["", "a", "b"]);
    assert_eq!(selected_key(&app), Some("b"));
}

#[test]
fn right_on_expanded_row_moves_to_first_child() {
    let mut app = app(json!({"a": 1}));
    press(&mut app, KeyCode::Right);
    assert_eq!(selected_key(&app), Some("a"));
}

#[test]
fn external_store_changes_reflatten() {
    let mut app = app(json!({"a": 1, "b": [1, 2]}));
    app.controller.set_expanded("b", true, true);
    assert!(app.apply_store_changes());
    assert_eq!(keys(&app), vec!["", "a", "b", "b.0", "b.1"]);
    assert!(!app.apply_store_changes());
}

#[test]
fn space_follows_space_action() {
    let options = ViewerOptions {
        space_action: NodeAction::Select,
        ..Default::default()
    };
    let mut app = App::new(
        "test",
        Value::from(json!({"a": 1, "b": [1]})),
        options,
        ThemeName::Nord,
    );
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char(' '));
    assert_eq!(app.controller.store().is_selected("a"), Some(true));
    assert_eq!(keys(&app), vec!["", "a", "b"]);

    press(&mut app, KeyCode::Char('x'));
    assert_eq!(app.controller.store().is_selected("a"), Some(false));
}

#[test]
fn sort_toggle_reorders_keys() {
    let mut app = app(json!({"b": 1, "a": 2}));
    assert_eq!(keys(&app), vec!["", "b", "a"]);
    press(&mut app, KeyCode::Char('s'));
    assert!(app.options.sort_keys);
    assert_eq!(keys(&app), vec!["", "a", "b"]);
}

#[test]
fn collapse_all_keeps_root_open() {
    let mut app = app(json!({"a": {"x": 1}, "b": [1, 2]}));
    app.controller.set_expanded("a", true, true);
    app.controller.set_expanded("b", true, true);
    app.apply_store_changes();
    assert_eq!(app.rows.len(), 6);
    press(&mut app, KeyCode::Char('G'));

    press(&mut app, KeyCode::Char('c'));
    assert_eq!(keys(&app), vec!["", "a", "b"]);
    assert_eq!(app.cursor.pos(), 0);
    assert_eq!(app.controller.store().is_expanded(""), Some(true));
}

#[test]
fn chunked_collection_loads_then_expands_chunks() {
    let root = Value::object([("xs", testing::integer_array(250))]);
    let mut app = App::new("test", root, ViewerOptions::default(), ThemeName::Nord);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.rows.len(), 3);
    assert!(app.rows.as_slice()[2].is_loading());
    assert!(app.lane.has_pending());

    assert!(app.run_lane(4));
    let labels: Vec<&str> = app.rows.as_slice()[2..]
        .iter()
        .map(|row| row.label.as_str())
        .collect();
    assert_eq!(labels, vec!["[0 - 99]", "[100 - 199]", "[200 - 249]"]);

    press(&mut app, KeyCode::Down);
    assert_eq!(app.controller.store().hovered_collection(), Some("xs"));
    press(&mut app, KeyCode::Right);
    assert_eq!(app.rows.len(), 105);
    assert_eq!(app.rows.as_slice()[3].key, "xs.0");
    assert_eq!(app.rows.as_slice()[3].depth, 3);
}

#[test]
fn copy_target_cycles() {
    let mut app = app(json!({"a": 1}));
    press(&mut app, KeyCode::Down);
    assert_eq!(app.copy_preview(), Some(Ok("1".to_string())));
    press(&mut app, KeyCode::Char('y'));
    assert_eq!(app.copy_target, CopyTarget::Key);
    assert_eq!(app.copy_preview(), Some(Ok("a".to_string())));
    for _ in 0..3 {
        press(&mut app, KeyCode::Char('y'));
    }
    assert_eq!(app.copy_target, CopyTarget::Value);
}

#[test]
fn cyclic_values_expand_one_level_at_a_time() {
    let mut app = App::new(
        "test",
        testing::cyclic_object(),
        ViewerOptions::default(),
        ThemeName::Nord,
    );
    assert_eq!(keys(&app), vec!["", "name", "self"]);
    press(&mut app, KeyCode::End);
    press(&mut app, KeyCode::Tab);
    assert_eq!(keys(&app), vec!["", "name", "self", "self.name", "self.self"]);
    assert!(matches!(
        app.copy_preview(),
        Some(Err(jsoview::SerializeError::Cycle))
    ));
}

#[test]
fn options_resolve_prefs_then_env_then_flags() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs.json");
    ViewerOptions {
        sort_keys: true,
        chunk_size: Some(7),
        ..Default::default()
    }
    .save(&prefs)
    .unwrap();

    let env = |var: &str| (var == "JSOVIEW_CHUNK_SIZE").then(|| "9".to_string());
    let mut args = Args {
        prefs: Some(prefs),
        ..Default::default()
    };
    let options = resolve_options(&args, env).unwrap();
    assert!(options.sort_keys);
    assert_eq!(options.chunk_size, Some(9));

    args.chunk_size = Some(11);
    args.flat_chunks = true;
    let options = resolve_options(&args, env).unwrap();
    assert_eq!(options.chunk_size, Some(11));
    assert!(!options.nest_chunks);

    let bad = |var: &str| (var == "JSOVIEW_SORT_KEYS").then(|| "maybe".to_string());
    assert!(resolve_options(&args, bad).is_err());
}

#[test]
fn save_writes_current_options() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("nested").join("prefs.json");
    let mut app = app(json!({"a": 1})).with_prefs_path(Some(prefs.clone()));
    press(&mut app, KeyCode::Char('s'));
    press(&mut app, KeyCode::Char('w'));
    assert!(app.status.as_deref().is_some_and(|s| s.starts_with("saved")));
    assert!(ViewerOptions::load(&prefs).unwrap().sort_keys);
}

#[test]
fn load_document_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, r#"{"xs": [1, 2, 3]}"#).unwrap();
    let (source, value) = load_document(Some(&path)).unwrap();
    assert_eq!(source, path.display().to_string());
    assert_eq!(value.len(), Some(1));

    std::fs::write(&path, "{not json").unwrap();
    assert!(load_document(Some(&path)).is_err());
}

#[test]
fn quit_keys() {
    let mut app = app(json!(null));
    assert_eq!(keys(&app), vec![""]);
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}
