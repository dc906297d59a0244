use bevy::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use crate::camera::OrbitCamera;
use crate::config::GameConfig;
use crate::session::{HudSnapshot, RemovalCause, Session, SessionEvent, SessionSummary};
use crate::target::TargetId;

/// Core systems; presentation runs before (input) or after (visuals, HUD) this set.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct CoreSet;

// --- Requests into the core ---

#[derive(Event, Debug, Default)]
pub struct StartRequested;

#[derive(Event, Debug, Default)]
pub struct ResetRequested;

#[derive(Event, Debug, Clone, Copy)]
pub struct ShotFired {
    pub ray: Ray3d,
    /// Click position in normalized device coordinates, y up.
    pub ndc: Vec2,
}

// --- Notifications out of the core ---

#[derive(Event, Debug)]
pub struct SessionStarted;

#[derive(Event, Debug)]
pub struct TargetSpawnedEvent {
    pub id: TargetId,
    pub position: Vec3,
}

#[derive(Event, Debug)]
pub struct TargetDestroyedEvent {
    pub id: TargetId,
    pub cause: RemovalCause,
}

#[derive(Event, Debug)]
pub struct HudUpdated(pub HudSnapshot);

#[derive(Event, Debug)]
pub struct ClockTicked {
    pub elapsed_secs: f32,
}

#[derive(Event, Debug)]
pub struct SessionOverEvent(pub SessionSummary);

#[derive(Event, Debug)]
pub struct SessionResetEvent;

#[derive(Resource)]
pub struct SessionRng(pub StdRng);

impl FromWorld for SessionRng {
    fn from_world(world: &mut World) -> Self {
        let seed = world.get_resource::<GameConfig>().and_then(|cfg| cfg.session.seed);
        SessionRng(match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        })
    }
}

// --- Systems ---

pub fn handle_requests(
    mut session: ResMut<Session>,
    mut starts: EventReader<StartRequested>,
    mut resets: EventReader<ResetRequested>,
    camera_query: Query<&OrbitCamera>,
    config: Res<GameConfig>,
) {
    // Resets first so "back to start" and "try again" in one frame ends in a fresh round.
    if resets.read().count() > 0 {
        session.reset();
    }
    if starts.read().count() > 0 {
        // Spawn depth is measured from where the camera is put back to on start.
        let viewer = camera_query
            .get_single()
            .map(OrbitCamera::home_translation)
            .unwrap_or_else(|_| Vec3::from_array(config.camera.position));
        session.start(viewer);
    }
}

pub fn resolve_shots(mut session: ResMut<Session>, mut shots: EventReader<ShotFired>) {
    for shot in shots.read() {
        if let Some(outcome) = session.fire(shot.ray) {
            debug!(
                "Click at ({:.2}, {:.2}): {} hit(s), {} shot(s) left",
                shot.ndc.x,
                shot.ndc.y,
                outcome.hits.len(),
                outcome.ammo_left
            );
        }
    }
}

pub fn advance_session(time: Res<Time>, mut session: ResMut<Session>, mut rng: ResMut<SessionRng>) {
    session.advance(time.delta(), &mut rng.0);
}

/// Forwards the session outbox to ECS events for the presentation plugins.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_session_events(
    mut session: ResMut<Session>,
    mut started: EventWriter<SessionStarted>,
    mut spawned: EventWriter<TargetSpawnedEvent>,
    mut destroyed: EventWriter<TargetDestroyedEvent>,
    mut hud: EventWriter<HudUpdated>,
    mut clock: EventWriter<ClockTicked>,
    mut over: EventWriter<SessionOverEvent>,
    mut reset: EventWriter<SessionResetEvent>,
) {
    for event in session.drain_events() {
        match event {
            SessionEvent::Started => {
                started.send(SessionStarted);
            }
            SessionEvent::TargetSpawned { id, position } => {
                spawned.send(TargetSpawnedEvent { id, position });
            }
            SessionEvent::TargetRemoved { id, cause } => {
                destroyed.send(TargetDestroyedEvent { id, cause });
            }
            SessionEvent::HudChanged(snapshot) => {
                hud.send(HudUpdated(snapshot));
            }
            SessionEvent::ClockTick { elapsed_secs } => {
                clock.send(ClockTicked { elapsed_secs });
            }
            SessionEvent::Over(summary) => {
                report_results(&summary);
                over.send(SessionOverEvent(summary));
            }
            SessionEvent::ResetToIdle => {
                reset.send(SessionResetEvent);
            }
        }
    }
}

fn report_results(summary: &SessionSummary) {
    match serde_json::to_string(summary) {
        Ok(json) => {
            info!("CLAY_SHOOTER_RESULTS_START");
            info!("{json}");
            info!("CLAY_SHOOTER_RESULTS_END");
        }
        Err(e) => warn!("Error serializing results to JSON: {e}"),
    }
}

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<SessionRng>()
            .add_event::<StartRequested>()
            .add_event::<ResetRequested>()
            .add_event::<ShotFired>()
            .add_event::<SessionStarted>()
            .add_event::<TargetSpawnedEvent>()
            .add_event::<TargetDestroyedEvent>()
            .add_event::<HudUpdated>()
            .add_event::<ClockTicked>()
            .add_event::<SessionOverEvent>()
            .add_event::<SessionResetEvent>()
            .add_systems(
                Update,
                (handle_requests, resolve_shots, advance_session, dispatch_session_events)
                    .chain()
                    .in_set(CoreSet),
            );
    }
}
