use bevy::prelude::*;
use serde::Deserialize;
use std::{fmt, fs, io, path::Path};

/// Default location of the RON configuration, relative to the working directory.
pub const CONFIG_PATH: &str = "assets/config/game.ron";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            title: "Clay Shooter".into(),
        }
    }
}

// Round rules: quotas and the two periodic ticks
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub max_targets: u32,
    pub max_ammo: u32,
    pub spawn_interval_secs: f32,
    pub clock_interval_secs: f32,
    pub min_per_tick: u32,
    pub max_per_tick: u32,
    /// Fixed seed for target placement. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_targets: 20,
            max_ammo: 20,
            spawn_interval_secs: 1.0,
            clock_interval_secs: 0.1,
            min_per_tick: 1,
            max_per_tick: 2,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    /// Width of the band targets spawn in, centred on x = 0.
    pub lateral_spread: f32,
    pub min_height: f32,
    pub max_height: f32,
    /// How far in front of the viewer (along -Z) targets appear.
    pub spawn_distance: f32,
    /// World Z every flight ends at.
    pub far_depth: f32,
    pub duration_secs: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            lateral_spread: 20.0,
            min_height: 5.0,
            max_height: 15.0,
            spawn_distance: 10.0,
            far_depth: -100.0,
            duration_secs: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetShape {
    #[default]
    Disc,
    Sphere,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub shape: TargetShape,
    pub radius: f32,
    pub thickness: f32,
    pub color: [f32; 3],
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            shape: TargetShape::Disc,
            radius: 1.0,
            thickness: 0.5,
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of orbit per pixel of mouse drag.
    pub orbit_sensitivity: f32,
    /// Fraction of the current radius removed per wheel line.
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 10.0, 100.0],
            look_at: [0.0, 5.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            orbit_sensitivity: 0.005,
            zoom_speed: 0.1,
            min_radius: 10.0,
            max_radius: 400.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SkyConfig {
    /// Sun elevation, 0 = horizon, 0.5 = overhead.
    pub inclination: f32,
    /// Sun heading as a fraction of a full turn.
    pub azimuth: f32,
    pub zenith_color: [f32; 3],
    pub horizon_color: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
    pub sun_illuminance: f32,
    pub ambient_brightness: f32,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            inclination: 0.5,
            azimuth: 0.25,
            zenith_color: [0.32, 0.55, 0.86],
            horizon_color: [0.78, 0.86, 0.93],
            fog_start: 150.0,
            fog_end: 900.0,
            sun_illuminance: 10_000.0,
            ambient_brightness: 800.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    pub ground_size: f32,
    pub ground_color: [f32; 3],
    pub mountain_color: [f32; 3],
    pub mountain_groups: Vec<[f32; 3]>,
    pub peaks_per_group: u32,
    pub radius_range: (f32, f32),
    pub height_range: (f32, f32),
    pub segments: u32,
    pub noise_scale: f32,
    pub noise_strength: f32,
    pub seed: Option<u64>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            ground_size: 200.0,
            // #4caf50
            ground_color: [0.298, 0.686, 0.314],
            // #6b4226
            mountain_color: [0.420, 0.259, 0.149],
            mountain_groups: vec![
                [35.0, 0.0, 0.0],
                [70.0, 0.0, -20.0],
                [-35.0, 0.0, -10.0],
                [-70.0, 0.0, 10.0],
            ],
            peaks_per_group: 3,
            radius_range: (15.0, 25.0),
            height_range: (20.0, 35.0),
            segments: 32,
            noise_scale: 0.1,
            noise_strength: 4.0,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CursorConfig {
    /// Share of the remaining distance covered each frame.
    pub follow_factor: f32,
    pub size: f32,
    pub pressed_size: f32,
    pub idle_color: [f32; 3],
    pub pressed_color: [f32; 3],
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            follow_factor: 0.2,
            size: 12.0,
            pressed_size: 36.0,
            idle_color: [1.0, 1.0, 1.0],
            pressed_color: [1.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub session: SessionConfig,
    pub flight: FlightConfig,
    pub target: TargetConfig,
    pub camera: CameraConfig,
    pub sky: SkyConfig,
    pub terrain: TerrainConfig,
    pub cursor: CursorConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Read(io::Error),
    Parse(ron::error::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read(e) => write!(f, "read config: {e}"),
            ConfigError::Parse(e) => write!(f, "parse RON: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Read(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Parse(e)
    }
}

impl GameConfig {
    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_ron_str(&data)
    }

    /// Falls back to defaults and hands back the error so the caller can log it.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Human-readable warnings for values the game can't play sensibly with.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        let s = &self.session;
        if s.max_targets == 0 {
            w.push("session.max_targets is 0: every round ends immediately".into());
        }
        if s.max_ammo == 0 {
            w.push("session.max_ammo is 0: every round ends immediately".into());
        }
        if s.spawn_interval_secs <= 0.0 {
            w.push(format!("session.spawn_interval_secs {} must be > 0", s.spawn_interval_secs));
        }
        if s.clock_interval_secs <= 0.0 {
            w.push(format!("session.clock_interval_secs {} must be > 0", s.clock_interval_secs));
        }
        if s.min_per_tick == 0 || s.min_per_tick > s.max_per_tick {
            w.push(format!(
                "session per-tick range {}..={} is empty or starts at 0",
                s.min_per_tick, s.max_per_tick
            ));
        }
        let f = &self.flight;
        if f.min_height >= f.max_height {
            w.push(format!("flight height range {}..{} is empty", f.min_height, f.max_height));
        }
        if f.lateral_spread < 0.0 {
            w.push("flight.lateral_spread is negative".into());
        }
        if f.duration_secs <= 0.0 {
            w.push(format!("flight.duration_secs {} must be > 0", f.duration_secs));
        }
        if self.target.radius <= 0.0 {
            w.push("target.radius must be > 0".into());
        }
        let c = &self.camera;
        if c.min_radius > c.max_radius {
            w.push(format!("camera radius range {}..{} is inverted", c.min_radius, c.max_radius));
        }
        let t = &self.terrain;
        if t.radius_range.0 > t.radius_range.1 || t.height_range.0 > t.height_range.1 {
            w.push("terrain cone ranges are inverted".into());
        }
        if t.segments < 3 {
            w.push(format!("terrain.segments {} is below 3", t.segments));
        }
        if !(0.0..=1.0).contains(&self.cursor.follow_factor) || self.cursor.follow_factor == 0.0 {
            w.push(format!(
                "cursor.follow_factor {} should be in (0, 1]",
                self.cursor.follow_factor
            ));
        }
        w
    }
}

pub fn rgb(c: [f32; 3]) -> Color {
    Color::srgb(c[0], c[1], c[2])
}

pub fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}
