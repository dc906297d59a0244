use bevy::{pbr::NotShadowCaster, prelude::*, window::PrimaryWindow};
use std::f32::consts::FRAC_PI_2;

use crate::camera::OrbitCamera;
use crate::config::{rgb, GameConfig, TargetConfig, TargetShape};
use crate::game::{CoreSet, ShotFired, TargetDestroyedEvent, TargetSpawnedEvent};
use crate::session::Session;

// --- Identity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Render-side tag. The session owns the target; this entity only draws it.
#[derive(Component, Debug, Clone, Copy)]
pub struct Target {
    pub id: TargetId,
}

// --- Hitbox Component & Logic ---

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum Hitbox {
    /// Flat cylinder whose axis is world Z, i.e. a clay disc facing the shooter.
    Disc { radius: f32, half_thickness: f32 },
    Sphere { radius: f32 },
}

const EPSILON: f32 = 1e-6;

impl Hitbox {
    pub fn from_config(cfg: &TargetConfig) -> Self {
        match cfg.shape {
            TargetShape::Disc => Hitbox::Disc { radius: cfg.radius, half_thickness: cfg.thickness * 0.5 },
            TargetShape::Sphere => Hitbox::Sphere { radius: cfg.radius },
        }
    }

    /// Distance along the ray to the first surface point in front of its origin.
    pub fn intersect_ray(&self, ray: Ray3d, center: Vec3) -> Option<f32> {
        match *self {
            Hitbox::Sphere { radius } => {
                let origin_to_center = center - ray.origin;
                let projection = origin_to_center.dot(*ray.direction);
                let distance_sq = origin_to_center.length_squared() - projection * projection;
                let radius_sq = radius * radius;
                if distance_sq > radius_sq {
                    return None;
                }
                let half_chord = (radius_sq - distance_sq).sqrt();
                first_in_front(projection - half_chord, projection + half_chord)
            }
            Hitbox::Disc { radius, half_thickness } => {
                let o = ray.origin - center;
                let d = *ray.direction;

                // Infinite cylinder around Z, solved in the XY plane.
                let a = d.x * d.x + d.y * d.y;
                let c = o.x * o.x + o.y * o.y - radius * radius;
                let (side_in, side_out) = if a < EPSILON {
                    if c > 0.0 {
                        return None;
                    }
                    (f32::NEG_INFINITY, f32::INFINITY)
                } else {
                    let b = 2.0 * (o.x * d.x + o.y * d.y);
                    let disc = b * b - 4.0 * a * c;
                    if disc < 0.0 {
                        return None;
                    }
                    let sq = disc.sqrt();
                    ((-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a))
                };

                // Slab between the two caps.
                let (cap_in, cap_out) = if d.z.abs() < EPSILON {
                    if o.z.abs() > half_thickness {
                        return None;
                    }
                    (f32::NEG_INFINITY, f32::INFINITY)
                } else {
                    let t0 = (-half_thickness - o.z) / d.z;
                    let t1 = (half_thickness - o.z) / d.z;
                    (t0.min(t1), t0.max(t1))
                };

                let enter = side_in.max(cap_in);
                let exit = side_out.min(cap_out);
                if enter > exit {
                    return None;
                }
                first_in_front(enter, exit)
            }
        }
    }
}

fn first_in_front(near: f32, far: f32) -> Option<f32> {
    if near > EPSILON {
        Some(near)
    } else if far > EPSILON {
        Some(far)
    } else {
        None
    }
}

// --- Visuals ---

#[derive(Resource)]
pub struct TargetAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub orientation: Quat,
}

pub fn setup_target_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GameConfig>,
) {
    let cfg = &config.target;
    let (mesh, orientation) = match cfg.shape {
        // Cylinder axis is Y; tip it over so the flat face looks down -Z at the camera.
        TargetShape::Disc => (
            meshes.add(Cylinder::new(cfg.radius, cfg.thickness).mesh().resolution(32).build()),
            Quat::from_rotation_x(FRAC_PI_2),
        ),
        TargetShape::Sphere => (meshes.add(Sphere::new(cfg.radius)), Quat::IDENTITY),
    };
    let material = materials.add(StandardMaterial {
        base_color: rgb(cfg.color),
        perceptual_roughness: 0.6,
        ..default()
    });
    commands.insert_resource(TargetAssets { mesh, material, orientation });
}

pub fn spawn_target_visuals(
    mut commands: Commands,
    assets: Res<TargetAssets>,
    mut spawned: EventReader<TargetSpawnedEvent>,
) {
    for event in spawned.read() {
        commands.spawn((
            Target { id: event.id },
            Mesh3d(assets.mesh.clone()),
            MeshMaterial3d(assets.material.clone()),
            Transform::from_translation(event.position).with_rotation(assets.orientation),
            NotShadowCaster,
        ));
    }
}

pub fn despawn_target_visuals(
    mut commands: Commands,
    mut destroyed: EventReader<TargetDestroyedEvent>,
    targets: Query<(Entity, &Target)>,
) {
    for event in destroyed.read() {
        debug!("Removing {} ({:?})", event.id, event.cause);
        for (entity, target) in &targets {
            if target.id == event.id {
                commands.entity(entity).despawn_recursive();
            }
        }
    }
}

pub fn sync_target_transforms(session: Res<Session>, mut targets: Query<(&Target, &mut Transform)>) {
    for (target, mut transform) in &mut targets {
        if let Some(active) = session.target(target.id) {
            transform.translation = active.position();
        }
    }
}

// --- Shooting input ---

/// A fresh left click during a round that isn't aimed at a HUD button.
pub fn click_is_shot<'a>(
    mouse_button_input: &ButtonInput<MouseButton>,
    session: &Session,
    ui_buttons: impl IntoIterator<Item = &'a Interaction>,
) -> bool {
    mouse_button_input.just_pressed(MouseButton::Left)
        && session.is_playing()
        && ui_buttons.into_iter().all(|i| *i == Interaction::None)
}

/// Turns a left click into a ray through the clicked pixel.
pub fn aim_shots(
    mouse_button_input: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<OrbitCamera>>,
    ui_buttons: Query<&Interaction, With<Button>>,
    session: Res<Session>,
    mut shots: EventWriter<ShotFired>,
) {
    if !click_is_shot(&mouse_button_input, &session, &ui_buttons) {
        return;
    }
    let Ok(window) = windows.get_single() else { return };
    let Ok((camera, camera_transform)) = camera_query.get_single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else { return };

    let ndc = Vec2::new(
        cursor.x / window.width() * 2.0 - 1.0,
        -(cursor.y / window.height()) * 2.0 + 1.0,
    );
    shots.send(ShotFired { ray, ndc });
}

pub struct TargetPlugin;

impl Plugin for TargetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_target_assets)
            .add_systems(Update, aim_shots.before(CoreSet))
            .add_systems(
                Update,
                (spawn_target_visuals, despawn_target_visuals, sync_target_transforms)
                    .chain()
                    .after(CoreSet),
            );
    }
}
