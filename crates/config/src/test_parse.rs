use std::{env, fs, process};

use crate::{Config, Error, LoadedConfig, from_ron_str, load, load_from_path};

#[test]
fn empty_document_is_defaults() {
    assert_eq!(from_ron_str("()").unwrap(), Config::default());
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = from_ron_str(
        r#"(
            general: (excluded_apps: ["com.apple.Terminal"], restore_cursor_position: true),
            hints: (hint_characters: "jkl;", include_menubar_hints: true),
            scroll: (scroll_step: 80),
        )"#,
    )
    .unwrap();
    assert!(cfg.general.restore_cursor_position);
    assert_eq!(cfg.hints.hint_characters, "jkl;");
    assert_eq!(cfg.hints.max_depth, 12);
    assert_eq!(cfg.scroll.scroll_step, 80);
    assert_eq!(cfg.scroll.scroll_step_half, 500);
    assert!(cfg.is_app_excluded(" COM.apple.terminal "));
    assert!(!cfg.is_app_excluded(""));
}

#[test]
fn user_bindings_replace_defaults() {
    let cfg = from_ron_str(r#"(hotkeys: (bindings: {"Cmd+Ctrl+H": "hints actions"}))"#).unwrap();
    assert_eq!(cfg.hotkeys.bindings.len(), 1);
    assert_eq!(cfg.hotkeys.bindings["Cmd+Ctrl+H"], "hints actions");
    assert_eq!(Config::default().hotkeys.bindings.len(), 3);
}

#[test]
fn unknown_fields_and_bad_values() {
    match from_ron_str("(hints: (colour: \"#fff\"))") {
        Err(Error::Parse { .. }) => {}
        other => panic!("{:?}", other),
    }
    match from_ron_str("(grid: (enabled: false), hints: (enabled: false))") {
        Err(Error::Validation { .. }) => {}
        other => panic!("{:?}", other),
    }
}

#[test]
fn roles_merge_per_app() {
    let cfg = from_ron_str(
        r#"(hints: (
            clickable_roles: ["AXButton", " AXLink "],
            include_dock_hints: true,
            app_configs: [(bundle_id: "com.example.app", additional_clickable_roles: ["AXImage", "AXButton"], ignore_clickable_check: true)],
        ))"#,
    )
    .unwrap();
    let other = cfg.clickable_roles_for("com.other");
    assert_eq!(other.roles, vec!["AXButton", "AXDockItem", "AXLink"]);
    assert!(!other.ignore_clickable_check);
    let app = cfg.clickable_roles_for("com.example.app");
    assert_eq!(app.roles, vec!["AXButton", "AXDockItem", "AXImage", "AXLink"]);
    assert!(app.ignore_clickable_check);
}

#[test]
fn load_from_file_reports_path() {
    let path = env::temp_dir().join(format!("keynav-config-test-{}.ron", process::id()));
    fs::write(&path, "(logging: (log_level: \"shout\"))").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.pretty().contains("log_level"));

    fs::write(&path, "(logging: (log_level: \"debug\"))").unwrap();
    let loaded = load(Some(&path)).unwrap();
    assert_eq!(loaded.config.logging.log_level, "debug");
    assert_eq!(loaded.source(), path.display().to_string());
    let _ = fs::remove_file(&path);

    assert!(matches!(load_from_path(&path), Err(Error::Read { .. })));
    assert!(LoadedConfig::defaults().source().contains("default"));
}

#[test]
fn json_round_trip_shape() {
    let v = Config::default().to_json();
    assert_eq!(v["hints"]["hint_characters"], "asdfghjkl");
    assert_eq!(v["hotkeys"]["bindings"]["Cmd+Shift+S"], "action scroll");
}
