use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel},
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
};
use std::f32::consts::FRAC_PI_2;

use crate::config::{rgb, vec3, CameraConfig, GameConfig};
use crate::game::{CoreSet, SessionStarted};
use crate::session::Session;

// Keeps the orbit away from the poles, where yaw degenerates.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.05;
// Pixel-delta scroll is roughly this many pixels per wheel line.
const PIXELS_PER_LINE: f32 = 100.0;

/// Orbit rig around a focus point. Transform is derived from these fields.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub focus: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    home: Vec3,
}

impl OrbitCamera {
    pub fn from_config(cfg: &CameraConfig) -> Self {
        let home = vec3(cfg.position);
        let focus = vec3(cfg.look_at);
        let mut camera = Self {
            focus,
            yaw: 0.0,
            pitch: 0.0,
            radius: 1.0,
            sensitivity: cfg.orbit_sensitivity,
            zoom_speed: cfg.zoom_speed,
            min_radius: cfg.min_radius,
            max_radius: cfg.max_radius,
            home,
        };
        camera.go_home();
        camera
    }

    /// Where the camera sits at the start of every round.
    pub fn home_translation(&self) -> Vec3 {
        self.home
    }

    pub fn go_home(&mut self) {
        let offset = self.home - self.focus;
        self.radius = offset.length().max(f32::EPSILON);
        self.yaw = offset.x.atan2(offset.z);
        self.pitch = (offset.y / self.radius).clamp(-1.0, 1.0).asin();
    }

    pub fn translation(&self) -> Vec3 {
        self.focus + orbit_offset(self.yaw, self.pitch, self.radius)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation()).looking_at(self.focus, Vec3::Y)
    }

    /// Drag in pixels: right moves the camera left around the focus, down raises it.
    pub fn rotate(&mut self, drag: Vec2) {
        self.yaw -= drag.x * self.sensitivity;
        self.pitch = (self.pitch + drag.y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Positive lines zoom in.
    pub fn zoom(&mut self, lines: f32) {
        let factor = (1.0 - lines * self.zoom_speed).max(0.1);
        self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
    }
}

pub fn orbit_offset(yaw: f32, pitch: f32, radius: f32) -> Vec3 {
    Vec3::new(
        radius * pitch.cos() * yaw.sin(),
        radius * pitch.sin(),
        radius * pitch.cos() * yaw.cos(),
    )
}

pub fn setup_camera(mut commands: Commands, config: Res<GameConfig>) {
    let cfg = &config.camera;
    let orbit = OrbitCamera::from_config(cfg);
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: cfg.fov_degrees.to_radians(),
            near: cfg.near,
            far: cfg.far,
            ..default()
        }),
        Tonemapping::AcesFitted,
        DistanceFog {
            color: rgb(config.sky.horizon_color),
            falloff: FogFalloff::Linear {
                start: config.sky.fog_start,
                end: config.sky.fog_end,
            },
            ..default()
        },
        orbit.transform(),
        orbit,
    ));
}

/// Left drag orbits, the wheel zooms. Locked while a round is running so clicks stay shots.
pub fn orbit_controls(
    session: Res<Session>,
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut camera_query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    if session.is_playing() {
        motion.clear();
        wheel.clear();
        return;
    }

    let drag: Vec2 = if mouse_button_input.pressed(MouseButton::Left) {
        motion.read().map(|e| e.delta).sum()
    } else {
        motion.clear();
        Vec2::ZERO
    };
    let lines: f32 = wheel
        .read()
        .map(|e| match e.unit {
            MouseScrollUnit::Line => e.y,
            MouseScrollUnit::Pixel => e.y / PIXELS_PER_LINE,
        })
        .sum();

    if drag == Vec2::ZERO && lines == 0.0 {
        return;
    }
    for (mut orbit, mut transform) in &mut camera_query {
        orbit.rotate(drag);
        orbit.zoom(lines);
        *transform = orbit.transform();
    }
}

pub fn reset_camera_on_start(
    mut started: EventReader<SessionStarted>,
    mut camera_query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    if started.read().count() == 0 {
        return;
    }
    for (mut orbit, mut transform) in &mut camera_query {
        orbit.go_home();
        *transform = orbit.transform();
    }
    debug!("Camera back to its starting pose");
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera).add_systems(
            Update,
            (reset_camera_on_start.after(CoreSet), orbit_controls.after(reset_camera_on_start)),
        );
    }
}
