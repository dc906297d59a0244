use bevy::{prelude::*, window::WindowResolution};

mod camera;
mod config;
mod cursor;
mod flight;
mod game;
mod session;
mod target;
mod ui;
mod world;

use camera::CameraPlugin;
use config::{GameConfig, CONFIG_PATH};
use cursor::CursorPlugin;
use game::GamePlugin;
use target::TargetPlugin;
use ui::HudPlugin;
use world::ScenePlugin;

/// Problems found while loading the config, logged once logging is up.
#[derive(Resource, Default)]
struct ConfigReport {
    error: Option<String>,
    warnings: Vec<String>,
}

fn report_config(report: Res<ConfigReport>) {
    match &report.error {
        Some(e) => warn!("Using default settings, could not load {CONFIG_PATH}: {e}"),
        None => info!("Loaded settings from {CONFIG_PATH}"),
    }
    for w in &report.warnings {
        warn!("Config: {w}");
    }
}

fn main() {
    let (config, error) = GameConfig::load_or_default(CONFIG_PATH);
    let report = ConfigReport {
        error: error.map(|e| e.to_string()),
        warnings: config.validate(),
    };
    let window = &config.window;
    let primary_window = Window {
        title: window.title.clone(),
        resolution: WindowResolution::new(window.width, window.height),
        ..default()
    };

    App::new()
        .insert_resource(config)
        .insert_resource(report)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        }))
        .add_plugins((GamePlugin, ScenePlugin, CameraPlugin, TargetPlugin, CursorPlugin, HudPlugin))
        .add_systems(Startup, report_config)
        .run();
}
