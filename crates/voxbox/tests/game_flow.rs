//! Menu to play to shutdown, driven by the headless platform.

use std::fs;
use std::path::PathBuf;

use voxbox::core::ModelWriter;
use voxbox::{
    Event, Game, GameError, HeadlessPlatform, HeadlessPresenter, Key, LoadFlags, MenuState, ModelPlacement,
    PlayState, PlayStatsHandle, RendererConfig, VoxboxConfig,
};

fn small_config() -> VoxboxConfig {
    let mut config = VoxboxConfig::default();
    config.room.size = [16, 12, 16];
    config.room.step_interval_ms = 1;
    config.room.mark_interval_ms = 5;
    config.view.size = [16, 12, 16];
    config
}

fn temp_model(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("voxbox-{}-{name}.vox", std::process::id()));
    fs::write(&path, bytes).unwrap();
    path
}

fn game(config: VoxboxConfig, events: Vec<Event>) -> (Game<HeadlessPlatform>, PlayStatsHandle) {
    let play = PlayState::new(config);
    let stats = play.stats_handle();
    let mut game = Game::new(HeadlessPlatform::scripted(events));
    game.add_state(Box::new(MenuState::new()));
    game.add_state(Box::new(play));
    (game, stats)
}

#[test]
fn test_menu_forwards_to_play() {
    let (mut game, _) = game(small_config(), Vec::new());
    game.switch_state("menu").unwrap();
    assert_eq!(game.current_state_name(), "play");
    game.shutdown().unwrap();
}

#[test]
fn test_headless_run_titles_and_meshes() {
    let (mut game, stats) = game(small_config(), Vec::new());
    game.switch_state("menu").unwrap();

    let mut presenter = HeadlessPresenter::new(RendererConfig::default());
    let frames = game.run(&mut presenter, Some(5)).unwrap();
    assert_eq!(frames, 5);
    assert_eq!(presenter.frames(), 5);
    assert_eq!(presenter.titles().len(), 5);
    assert!(presenter.titles().iter().all(|t| t.starts_with("Voxbox - ") && t.ends_with(" fps")));

    let s = *stats.lock();
    assert_eq!(s.frames, 5);
    // 4 × 3 × 4 demo block.
    assert_eq!(s.voxels_in_view, 48);
    assert!(s.last_build.quads > 0);
    game.shutdown().unwrap();
}

#[test]
fn test_escape_stops_the_loop() {
    let (mut game, _) = game(small_config(), vec![Event::key_down(Key::Left), Event::key_down(Key::Esc)]);
    game.switch_state("menu").unwrap();
    let mut presenter = HeadlessPresenter::new(RendererConfig::default());
    let frames = game.run(&mut presenter, Some(100)).unwrap();
    assert_eq!(frames, 1);
    assert!(!game.is_running());
    game.shutdown().unwrap();
}

#[test]
fn test_configured_models_and_player() {
    let castle = ModelWriter::new(2, 2, 1)
        .voxel(0, 0, 0, 9)
        .voxel(1, 0, 0, 9)
        .voxel(0, 1, 0, 9)
        .voxel(1, 1, 0, 9)
        .to_bytes();
    let hero = ModelWriter::new(1, 1, 2).voxel(0, 0, 0, 3).voxel(0, 0, 1, 3).to_bytes();

    let mut config = small_config();
    config.play.demo_scene = false;
    config.play.models.push(ModelPlacement {
        path: temp_model("castle", &castle),
        at: [1, 0, 1],
        flags: LoadFlags::Attached,
    });
    config.play.player_model = Some(temp_model("hero", &hero));

    let (mut game, stats) = game(config, Vec::new());
    game.switch_state("menu").unwrap();
    let mut presenter = HeadlessPresenter::new(RendererConfig::default());
    game.run(&mut presenter, Some(1)).unwrap();
    let s = *stats.lock();
    assert!(s.player_alive);
    assert_eq!(s.voxels_in_view, 4 + 2);

    // Return drops the player into the room.
    game.platform_mut().push(Event::key_down(Key::Return));
    game.run(&mut presenter, Some(1)).unwrap();
    let s = *stats.lock();
    assert!(!s.player_alive);
    game.run(&mut presenter, Some(1)).unwrap();
    assert_eq!(stats.lock().voxels_in_view, 4 + 2);
    game.shutdown().unwrap();
}

#[test]
fn test_more_models_than_queue_slots() {
    let mut config = small_config();
    config.room.queue_capacity = 1;
    for i in 0..3 {
        let bytes = ModelWriter::new(1, 1, 1).voxel(0, 0, 0, 5).to_bytes();
        config.play.models.push(ModelPlacement {
            path: temp_model(&format!("pebble{i}"), &bytes),
            at: [2 + 4 * i, 0, 1],
            flags: LoadFlags::Attached,
        });
    }

    let (mut game, stats) = game(config, Vec::new());
    game.switch_state("menu").unwrap();
    assert_eq!(game.current_state_name(), "play");
    let mut presenter = HeadlessPresenter::new(RendererConfig::default());
    game.run(&mut presenter, Some(1)).unwrap();
    assert_eq!(stats.lock().voxels_in_view, 48 + 3);
    game.shutdown().unwrap();
}

#[test]
fn test_still_scene_is_built_once() {
    let castle = ModelWriter::new(2, 2, 1)
        .voxel(0, 0, 0, 9)
        .voxel(1, 0, 0, 9)
        .voxel(0, 1, 0, 9)
        .voxel(1, 1, 0, 9)
        .to_bytes();
    let hero = ModelWriter::new(1, 1, 1).voxel(0, 0, 0, 3).to_bytes();

    let mut config = small_config();
    config.play.demo_scene = false;
    config.play.models.push(ModelPlacement {
        path: temp_model("still-castle", &castle),
        at: [1, 0, 1],
        flags: LoadFlags::Attached,
    });
    config.play.player_model = Some(temp_model("still-hero", &hero));

    let (mut game, stats) = game(config, Vec::new());
    game.switch_state("menu").unwrap();
    let mut presenter = HeadlessPresenter::new(RendererConfig::default());
    game.run(&mut presenter, Some(5)).unwrap();
    let s = *stats.lock();
    assert_eq!(s.frames, 5);
    assert_eq!(s.builds, 1);
    assert!(s.last_build.quads > 0);

    // Moving the player changes the snapshot.
    game.platform_mut().push(Event::key_down(Key::Left));
    game.run(&mut presenter, Some(2)).unwrap();
    assert_eq!(stats.lock().builds, 2);
    game.shutdown().unwrap();
}

#[test]
fn test_missing_model_fails_enter() {
    let mut config = small_config();
    config.play.models.push(ModelPlacement {
        path: PathBuf::from("no/such/model.vox"),
        at: [0, 0, 0],
        flags: LoadFlags::None,
    });
    let (mut game, _) = game(config, Vec::new());
    let err = game.switch_state("menu").unwrap_err();
    assert!(matches!(err, GameError::Room(_)));
}

#[test]
fn test_unknown_state_name() {
    let (mut game, _) = game(small_config(), Vec::new());
    assert!(matches!(game.switch_state("credits"), Err(GameError::InvalidState(_))));
}
