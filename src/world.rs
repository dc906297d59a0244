use bevy::{prelude::*, render::mesh::VertexAttributeValues};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::config::{rgb, vec3, GameConfig, TerrainConfig};

// Distance the sun is placed along its direction; only the angle matters.
const SUN_DISTANCE: f32 = 100.0;

/// Unit vector towards the sun. `inclination` 0 is the horizon, 1 straight up;
/// `azimuth` is a fraction of a full turn measured from +Z towards +X.
pub fn sun_direction(inclination: f32, azimuth: f32) -> Vec3 {
    let phi = (1.0 - inclination) * FRAC_PI_2;
    let theta = azimuth * TAU;
    Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos())
}

// ============================================================================
// Noise
// ============================================================================

fn hash21(p: Vec2) -> f32 {
    let p3 = Vec3::new(p.x, p.y, p.x) * 0.1031;
    let p3 = p3 - p3.floor();
    let p3 = p3 + Vec3::splat(p3.dot(Vec3::new(p3.y, p3.z, p3.x) + Vec3::splat(33.33)));
    ((p3.x + p3.y) * p3.z).fract()
}

/// Smooth value noise in [-1, 1].
pub fn noise2d(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let u = f * f * (Vec2::splat(3.0) - f * 2.0);

    let a = hash21(i);
    let b = hash21(i + Vec2::X);
    let c = hash21(i + Vec2::Y);
    let d = hash21(i + Vec2::ONE);

    let ab = a + (b - a) * u.x;
    let cd = c + (d - c) * u.x;
    (ab + (cd - ab) * u.y) * 2.0 - 1.0
}

/// Pushes a cone vertex (centred on the origin, apex up) sideways by noise.
/// The push grows linearly with height: 0.25x the strength at the base, 0.75x at the apex.
pub fn displace_vertex(v: Vec3, height: f32, cfg: &TerrainConfig, offset: Vec2) -> Vec3 {
    let n = noise2d(Vec2::new(v.x, v.z) * cfg.noise_scale + offset);
    let amp = (v.y / height) * 0.5 + 0.5;
    let push = n * cfg.noise_strength * amp;
    Vec3::new(v.x + push, v.y, v.z + push)
}

pub fn mountain_mesh(radius: f32, height: f32, cfg: &TerrainConfig, offset: Vec2) -> Mesh {
    let mut mesh = Cone { radius, height }
        .mesh()
        .resolution(cfg.segments.max(3))
        .build();
    if let Some(VertexAttributeValues::Float32x3(positions)) =
        mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION)
    {
        for p in positions.iter_mut() {
            *p = displace_vertex(Vec3::from_array(*p), height, cfg, offset).to_array();
        }
    }
    // Faceted shading reads better than smoothed normals on a low-poly cone.
    mesh.duplicate_vertices();
    mesh.compute_flat_normals();
    mesh
}

// ============================================================================
// Scene setup
// ============================================================================

pub fn setup_sky(mut commands: Commands, config: Res<GameConfig>) {
    let sky = &config.sky;
    commands.insert_resource(ClearColor(rgb(sky.zenith_color)));
    commands.insert_resource(AmbientLight {
        color: rgb(sky.horizon_color),
        brightness: sky.ambient_brightness,
    });

    let dir = sun_direction(sky.inclination, sky.azimuth);
    commands.spawn((
        DirectionalLight {
            illuminance: sky.sun_illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(dir * SUN_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    info!("Sun direction {dir:.3}");
}

pub fn setup_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GameConfig>,
) {
    let t = &config.terrain;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(t.ground_size, t.ground_size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: rgb(t.ground_color),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::IDENTITY,
    ));
}

/// Groups of noisy cones behind the shooting lane.
pub fn setup_mountains(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<GameConfig>,
) {
    let t = &config.terrain;
    let mut rng = match t.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let material = materials.add(StandardMaterial {
        base_color: rgb(t.mountain_color),
        perceptual_roughness: 1.0,
        ..default()
    });
    let (r_lo, r_hi) = t.radius_range;
    let (h_lo, h_hi) = t.height_range;

    for &group_pos in &t.mountain_groups {
        commands
            .spawn((Transform::from_translation(vec3(group_pos)), Visibility::default()))
            .with_children(|group| {
                for _ in 0..t.peaks_per_group {
                    let radius = r_lo + rng.gen::<f32>() * (r_hi - r_lo);
                    let height = h_lo + rng.gen::<f32>() * (h_hi - h_lo);
                    let offset = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0));
                    let local = Vec3::new(
                        (rng.gen::<f32>() - 0.5) * 20.0,
                        height / 2.0,
                        -50.0 + rng.gen::<f32>() * 10.0,
                    );
                    group.spawn((
                        Mesh3d(meshes.add(mountain_mesh(radius, height, t, offset))),
                        MeshMaterial3d(material.clone()),
                        Transform::from_translation(local),
                    ));
                }
            });
    }
    debug!(
        "Spawned {} mountain groups with {} peaks each",
        t.mountain_groups.len(),
        t.peaks_per_group
    );
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_sky, setup_ground, setup_mountains));
    }
}
