/// Session replay tests
/// Runs complete scripts, read from disk like the CLI does
use echohub_player::{load_script, parse_script, OutputFormat, Replay, ReplayError};
use echohub_playback::{PlaybackStatus, PlayerConfig, RendererCommand};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

const LISTEN_AND_SKIP: &str = r#"[
    {"step": "select", "track": {
        "id": "podcast-42",
        "audioUrl": "https://cdn.echohub.test/podcast-42.mp3",
        "title": "Rust in Production",
        "author": "EchoHub AI",
        "imageUrl": "https://cdn.echohub.test/podcast-42.png"
    }},
    {"step": "deliver"},
    {"step": "notify", "notification": {"type": "metadata_ready", "duration_secs": 180}},
    {"step": "notify", "notification": {"type": "time_progress", "seconds": 178}},
    {"step": "forward"},
    {"step": "toggle_play_pause"},
    {"step": "deliver"}
]"#;

fn write_script(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("session.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn replay_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_script(&dir, LISTEN_AND_SKIP);

    let steps = load_script(&path).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps);

    assert_eq!(frames.len(), 7);
    assert_eq!(frames[0].snapshot.status, PlaybackStatus::Loading);
    assert_eq!(
        frames[0].commands,
        vec![
            RendererCommand::Load {
                url: "https://cdn.echohub.test/podcast-42.mp3".to_string()
            },
            RendererCommand::Play,
        ]
    );
    assert_eq!(frames[2].snapshot.status, PlaybackStatus::Playing);
    assert_eq!(frames[2].snapshot.duration_label, "3:00");

    // Skip near the end lands just before it
    let forward = &frames[4];
    assert!((forward.snapshot.current_time_secs - 179.999).abs() < 1e-9);
    assert_eq!(forward.snapshot.status, PlaybackStatus::Playing);

    assert_eq!(frames[5].snapshot.status, PlaybackStatus::Paused);
    assert_eq!(frames[5].commands, vec![RendererCommand::Pause]);
    assert!(frames.iter().all(|f| f.error.is_none()));
}

#[test]
fn json_frames_are_one_object_per_line() {
    let steps = parse_script(LISTEN_AND_SKIP).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();

    for frame in replay.run(&steps) {
        let line = frame.render(OutputFormat::Json, false).unwrap();
        assert!(!line.contains('\n'));

        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["index"], frame.index);
        assert!(value["snapshot"]["status"].is_string());
        assert!(value.get("error").is_none());
    }
}

#[test]
fn json_snapshot_uses_camel_case() {
    let steps = parse_script(LISTEN_AND_SKIP).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps[..4]);

    let line = frames[3].render(OutputFormat::Json, false).unwrap();
    let value: Value = serde_json::from_str(&line).unwrap();
    let snapshot = &value["snapshot"];

    assert_eq!(snapshot["status"], "playing");
    assert_eq!(snapshot["isPlaying"], true);
    assert_eq!(snapshot["currentTimeSecs"], 178.0);
    assert_eq!(snapshot["elapsedLabel"], "2:58");
    assert_eq!(snapshot["remainingLabel"], "0:02");
    assert_eq!(snapshot["artworkUrl"], "https://cdn.echohub.test/podcast-42.png");
}

#[test]
fn repeat_session_restarts_once() {
    let script = r#"[
        {"step": "toggle_repeat"},
        {"step": "select", "track": {
            "id": "ep-1",
            "audioUrl": "https://cdn.echohub.test/ep-1.mp3",
            "title": "Episode 1",
            "author": "EchoHub AI"
        }},
        {"step": "deliver"},
        {"step": "notify", "notification": {"type": "metadata_ready", "duration_secs": 60}},
        {"step": "finish"},
        {"step": "deliver"},
        {"step": "notify", "notification": {"type": "ended"}}
    ]"#;

    let steps = parse_script(script).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps);

    let restart = &frames[5];
    assert_eq!(
        restart.commands,
        vec![
            RendererCommand::Seek { position_secs: 0.0 },
            RendererCommand::Play
        ]
    );
    assert_eq!(restart.snapshot.status, PlaybackStatus::Playing);
    assert_eq!(restart.snapshot.current_time_secs, 0.0);

    // Late duplicate end does nothing
    assert!(frames[6].commands.is_empty());
    assert_eq!(frames[6].snapshot.status, PlaybackStatus::Playing);
}

#[test]
fn slider_session_follows_clock() {
    let script = r#"[
        {"step": "set_volume", "level": 0.4},
        {"step": "advance", "ms": 2000},
        {"step": "set_volume", "level": 0.6},
        {"step": "advance", "ms": 2999},
        {"step": "advance", "ms": 1}
    ]"#;

    let steps = parse_script(script).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps);

    let visible: Vec<bool> = frames.iter().map(|f| f.snapshot.slider_visible).collect();
    assert_eq!(visible, vec![true, true, true, true, false]);
    assert_eq!(frames[4].snapshot.volume, 0.6);
}

#[test]
fn blocked_autoplay_session() {
    let script = r#"[
        {"step": "block_autoplay", "blocked": true},
        {"step": "select", "track": {
            "id": "ep-2",
            "audioUrl": "https://cdn.echohub.test/ep-2.mp3",
            "title": "Episode 2",
            "author": "EchoHub AI"
        }},
        {"step": "deliver"},
        {"step": "block_autoplay", "blocked": false},
        {"step": "toggle_play_pause"}
    ]"#;

    let steps = parse_script(script).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps);

    assert_eq!(frames[2].snapshot.status, PlaybackStatus::Paused);
    assert!(frames[2].snapshot.playback_blocked.is_some());
    assert!(frames[2].render(OutputFormat::Text, false).unwrap().contains("blocked="));

    assert_eq!(frames[4].snapshot.status, PlaybackStatus::Playing);
    assert!(frames[4].snapshot.playback_blocked.is_none());
}

#[test]
fn text_output_lists_events_when_asked() {
    let steps = parse_script(r#"[{"step": "toggle_mute"}]"#).unwrap();
    let mut replay = Replay::new(PlayerConfig::default()).unwrap();
    let frames = replay.run(&steps);

    let text = frames[0].render(OutputFormat::Text, true).unwrap();
    assert!(text.contains("muted"));
    assert!(text.contains(r#""event":"volume_changed""#));
}

#[test]
fn unknown_step_is_a_script_error() {
    let result = parse_script(r#"[{"step": "rewind_to_start"}]"#);
    assert!(matches!(result, Err(ReplayError::Script(_))));
}

#[test]
fn missing_script_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = load_script(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(ReplayError::Io(_))));
}

#[test]
fn invalid_player_config_is_refused() {
    let config = PlayerConfig {
        seek_step_secs: -5.0,
        ..Default::default()
    };
    assert!(matches!(
        Replay::new(config),
        Err(ReplayError::Playback(_))
    ));
}
