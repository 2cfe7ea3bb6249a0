//! # 回放集成测试
//!
//! 测试 配置 → Runner → 面板 → PNG 帧 的完整链路，不依赖字体文件。

use std::fs;
use std::path::Path;

use status_host::{AppConfig, Anchor, HostError, Runner};
use tile_grid::Size;

const LAYOUT: &str = r##"{
    "defaults": { "width": 20, "height": 6, "speed": 3 },
    "columns": [
        { "speed": 10, "border": "#00ff00", "cells": [
            { "kind": "threshold", "entity": "sensor.download", "compare": "<", "threshold": 100,
              "label": "{value}M", "precision": 0 },
            { "kind": "binary", "entity": "binary_sensor.door" }
        ] },
        { "speed": 10, "cells": [
            { "kind": "state", "entity": "alarm", "states": ["triggered"] }
        ] }
    ]
}"##;

const EVENTS: &str = r#"
{"frame": 0, "key": "sensor.download", "value": 42.7}
{"frame": 0, "key": "binary_sensor.door", "value": "off"}
{"frame": 10, "key": "alarm", "value": "triggered"}
# 警报解除
{"frame": 20, "key": "alarm", "value": "disarmed"}
"#;

fn write_fixture(dir: &Path) -> AppConfig {
    let layout = dir.join("layout.json");
    let events = dir.join("events.jsonl");
    fs::write(&layout, LAYOUT).unwrap();
    fs::write(&events, EVENTS).unwrap();

    let mut config = AppConfig {
        layout_path: layout,
        events_path: Some(events),
        ..AppConfig::default()
    };
    config.panel.width = 64;
    config.panel.height = 16;
    config.panel.anchor = Anchor::TopLeft;
    config.output.dir = dir.join("frames");
    config.output.write_frames = true;
    config
}

#[test]
fn test_replay_writes_dirty_frames() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    config.validate().unwrap();

    let mut runner = Runner::from_config(&config).unwrap();
    let stats = runner.run(40).unwrap();

    assert_eq!(stats.frames, 40);
    assert!(stats.dirty_frames > 0);
    assert!(stats.dirty_frames < 40);
    assert_eq!(stats.written_frames, stats.dirty_frames);

    let written = fs::read_dir(&config.output.dir).unwrap().count() as u64;
    assert_eq!(written, stats.written_frames);
    assert!(config.output.dir.join("frame_00000.png").exists());

    // 警报解除后第二列收起，只剩第一列
    assert_eq!(runner.grid().bounds(), Size::new(20, 6));
    assert!(!runner.grid().animating());
}

#[test]
fn test_panel_shows_grid_at_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());

    let mut runner = Runner::from_config(&config).unwrap();
    runner.run(15).unwrap();

    // 两列都已展开，左上角是第一列的边线
    assert_eq!(runner.grid().bounds(), Size::new(40, 6));
    let panel = runner.panel().image();
    assert_eq!(panel.get_pixel(0, 0).0, [0, 255, 0, 255]);
    // 网格之外是面板背景
    assert_eq!(panel.get_pixel(63, 15).0, [0, 0, 0, 255]);
}

#[test]
fn test_all_frames_written_when_not_only_dirty() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_fixture(dir.path());
    config.output.only_dirty = false;

    let mut runner = Runner::from_config(&config).unwrap();
    let stats = runner.run(12).unwrap();
    assert_eq!(stats.written_frames, 12);
}

#[test]
fn test_invalid_layout_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    fs::write(&config.layout_path, r#"{ "columns": [ { "cells": [] } ] }"#).unwrap();

    let err = Runner::from_config(&config).unwrap_err();
    assert!(matches!(err, HostError::Grid(_)));
}

#[test]
fn test_broken_events_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    if let Some(events) = &config.events_path {
        fs::write(events, "{\"frame\": 0}\n").unwrap();
    }

    let err = Runner::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("第 1 行"));
}
