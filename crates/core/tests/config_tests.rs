use std::path::PathBuf;

use autobr_core::settings::{ConfigError, RunConfig};
use autobr_core::types::{Area, MatchMode, Point};

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunConfig::load(&dir.path().join("config.json"));
    assert_eq!(cfg, RunConfig::default());
}

#[test]
fn broken_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(RunConfig::try_load(&path), Err(ConfigError::Parse(_))));
    assert_eq!(RunConfig::load(&path), RunConfig::default());
}

#[test]
fn partial_file_merges_key_by_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "match_mode": "quick",
            "pos_1": [640, 480],
            "images": { "ultimate": "assets/ultimate.png" },
            "keys": { "forward": "z", "left": "q" }
        }"#,
    )
    .unwrap();

    let cfg = RunConfig::load(&path);
    assert_eq!(cfg.match_mode, MatchMode::Quick);
    assert_eq!(cfg.pos_1, Point::new(640, 480));
    assert_eq!(cfg.pos_2, Point::new(200, 200));
    assert_eq!(cfg.images.ultimate, PathBuf::from("assets/ultimate.png"));
    assert_eq!(cfg.images.change, PathBuf::from("change.png"));
    assert_eq!(cfg.keys.movement(), ["z", "q", "s", "d"]);
    assert_eq!(cfg.keys.menu, "m");
    assert!((cfg.confidence - 0.8).abs() < 1e-6);
}

#[test]
fn save_then_load_keeps_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut cfg = RunConfig::default();
    cfg.match_mode = MatchMode::Quick;
    cfg.outcome_area = Some(Area { x: 0, y: 0, w: 800, h: 600 });
    cfg.adjust_confidence(-0.1);
    cfg.save(&path).unwrap();

    let back = RunConfig::load(&path);
    assert_eq!(back, cfg);
    assert!(back.validate().is_ok());
}
