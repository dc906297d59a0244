use bevy::{
    prelude::*,
    time::{Stopwatch, Timer, TimerMode},
};
use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::GameConfig;
use crate::flight::{Flight, SpawnLayout};
use crate::target::{Hitbox, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Over,
}

/// Fixed rules of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRules {
    pub max_targets: u32,
    pub max_ammo: u32,
    pub spawn_interval: Duration,
    pub clock_interval: Duration,
    pub min_per_tick: u32,
    pub max_per_tick: u32,
    pub layout: SpawnLayout,
    pub hitbox: Hitbox,
}

impl SessionRules {
    pub fn from_config(cfg: &GameConfig) -> Self {
        let s = &cfg.session;
        let min_per_tick = s.min_per_tick.max(1);
        Self {
            max_targets: s.max_targets,
            max_ammo: s.max_ammo,
            spawn_interval: positive_secs(s.spawn_interval_secs),
            clock_interval: positive_secs(s.clock_interval_secs),
            min_per_tick,
            max_per_tick: s.max_per_tick.max(min_per_tick),
            layout: SpawnLayout::from_config(&cfg.flight),
            hitbox: Hitbox::from_config(&cfg.target),
        }
    }
}

impl Default for SessionRules {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

// Repeating timers with a zero period would fire forever. Whole microseconds keep
// 0.1 at exactly 100 ms; `from_secs_f32` lands a nanosecond long and drifts.
fn positive_secs(secs: f32) -> Duration {
    Duration::from_micros((secs.max(0.001) * 1e6).round() as u64)
}

#[derive(Debug, Clone)]
pub struct ActiveTarget {
    pub id: TargetId,
    pub epoch: u64,
    pub flight: Flight,
    pub hitbox: Hitbox,
}

impl ActiveTarget {
    pub fn position(&self) -> Vec3 {
        self.flight.position()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    Hit,
    /// Reached the end of its flight unclaimed.
    Escaped,
    /// Dropped by a start or reset.
    Cleared,
}

/// Numbers the HUD shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub remaining_targets: u32,
    pub elapsed_secs: f32,
    pub score: u32,
    pub ammo: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub elapsed_secs: f32,
    pub score: u32,
    pub unspawned_targets: u32,
    pub shots_fired: u32,
    pub finished_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    TargetSpawned { id: TargetId, position: Vec3 },
    TargetRemoved { id: TargetId, cause: RemovalCause },
    HudChanged(HudSnapshot),
    ClockTick { elapsed_secs: f32 },
    Over(SessionSummary),
    ResetToIdle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotOutcome {
    pub hits: Vec<TargetId>,
    pub ammo_left: u32,
}

/// One player's round: counters, the active target set and the two periodic ticks.
///
/// Nothing here touches the ECS world. Systems feed it time, clicks and requests,
/// then drain [`SessionEvent`]s to update visuals and HUD.
#[derive(Resource, Debug)]
pub struct Session {
    rules: SessionRules,
    phase: SessionPhase,
    ammo: u32,
    spawned: u32,
    score: u32,
    shots_fired: u32,
    stopwatch: Stopwatch,
    spawn_timer: Timer,
    clock_timer: Timer,
    // Bumped on start/reset; expiries carrying an older value are ignored.
    epoch: u64,
    next_id: u64,
    viewer: Vec3,
    active: BTreeMap<TargetId, ActiveTarget>,
    summary: Option<SessionSummary>,
    outbox: Vec<SessionEvent>,
}

impl FromWorld for Session {
    fn from_world(world: &mut World) -> Self {
        let rules = world
            .get_resource::<GameConfig>()
            .map(SessionRules::from_config)
            .unwrap_or_default();
        Session::new(rules)
    }
}

impl Session {
    pub fn new(rules: SessionRules) -> Self {
        let mut stopwatch = Stopwatch::new();
        stopwatch.pause();
        Self {
            ammo: rules.max_ammo,
            spawn_timer: Timer::new(rules.spawn_interval, TimerMode::Repeating),
            clock_timer: Timer::new(rules.clock_interval, TimerMode::Repeating),
            rules,
            phase: SessionPhase::Idle,
            spawned: 0,
            score: 0,
            shots_fired: 0,
            stopwatch,
            epoch: 0,
            next_id: 0,
            viewer: Vec3::ZERO,
            active: BTreeMap::new(),
            summary: None,
            outbox: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn target(&self, id: TargetId) -> Option<&ActiveTarget> {
        self.active.get(&id)
    }

    /// Targets still to come plus targets in the air.
    pub fn remaining_targets(&self) -> u32 {
        self.rules.max_targets - self.spawned + self.active.len() as u32
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            remaining_targets: self.remaining_targets(),
            elapsed_secs: self.stopwatch.elapsed_secs(),
            score: self.score,
            ammo: self.ammo,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    // --- Transitions ---

    /// Begins a fresh round from Idle or Over. Returns false (and does nothing) while Active.
    pub fn start(&mut self, viewer: Vec3) -> bool {
        if self.is_playing() {
            return false;
        }
        self.epoch += 1;
        self.clear_active();
        self.ammo = self.rules.max_ammo;
        self.spawned = 0;
        self.score = 0;
        self.shots_fired = 0;
        self.summary = None;
        self.viewer = viewer;
        self.stopwatch.reset();
        self.stopwatch.unpause();
        self.spawn_timer.reset();
        self.clock_timer.reset();
        self.phase = SessionPhase::Active;

        info!(
            "Round started: {} targets, {} shots (epoch {})",
            self.rules.max_targets, self.rules.max_ammo, self.epoch
        );
        self.outbox.push(SessionEvent::Started);
        self.push_hud();
        // Degenerate rules (no ammo or no targets) end the round on the spot.
        self.check_over();
        true
    }

    /// Back to the title screen. Calling it again while Idle changes nothing.
    pub fn reset(&mut self) {
        if self.phase == SessionPhase::Idle && self.active.is_empty() {
            return;
        }
        self.epoch += 1;
        self.clear_active();
        self.ammo = self.rules.max_ammo;
        self.spawned = 0;
        self.score = 0;
        self.shots_fired = 0;
        self.summary = None;
        self.stopwatch.reset();
        self.stopwatch.pause();
        self.spawn_timer.reset();
        self.clock_timer.reset();
        self.phase = SessionPhase::Idle;

        info!("Session reset (epoch {})", self.epoch);
        self.outbox.push(SessionEvent::ResetToIdle);
        self.push_hud();
    }

    /// Per-frame driver: flights in Active and Over, ticks only in Active.
    pub fn advance<R: Rng + ?Sized>(&mut self, delta: Duration, rng: &mut R) {
        if self.phase == SessionPhase::Idle {
            return;
        }

        let epoch = self.epoch;
        let mut arrived = Vec::new();
        for target in self.active.values_mut() {
            target.flight.advance(delta);
            if target.flight.is_finished() {
                arrived.push((target.id, target.epoch));
            }
        }
        for (id, target_epoch) in arrived {
            debug_assert_eq!(target_epoch, epoch);
            self.expire(id, target_epoch);
        }

        if !self.is_playing() {
            return;
        }

        self.stopwatch.tick(delta);

        self.spawn_timer.tick(delta);
        for _ in 0..self.spawn_timer.times_finished_this_tick() {
            if !self.is_playing() {
                break;
            }
            self.spawn_tick(rng);
        }

        if self.is_playing() {
            self.clock_timer.tick(delta);
            if self.clock_timer.just_finished() {
                self.outbox.push(SessionEvent::ClockTick {
                    elapsed_secs: self.stopwatch.elapsed_secs(),
                });
            }
        }
    }

    /// Launches 1..=N targets unless the quota is used up.
    pub fn spawn_tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if !self.is_playing() || self.spawned >= self.rules.max_targets {
            return;
        }
        let count = rng.gen_range(self.rules.min_per_tick..=self.rules.max_per_tick);
        for _ in 0..count {
            if self.spawned >= self.rules.max_targets {
                break;
            }
            let id = TargetId(self.next_id);
            self.next_id += 1;
            let flight = self.rules.layout.launch(self.viewer, rng);
            let position = flight.position();
            self.active.insert(
                id,
                ActiveTarget { id, epoch: self.epoch, flight, hitbox: self.rules.hitbox },
            );
            self.spawned += 1;
            debug!("Spawned {id} at {position} ({}/{})", self.spawned, self.rules.max_targets);
            self.outbox.push(SessionEvent::TargetSpawned { id, position });
        }
        self.push_hud();
    }

    /// One click. Costs a bullet hit or miss, removes every target on the ray.
    pub fn fire(&mut self, ray: Ray3d) -> Option<ShotOutcome> {
        if !self.is_playing() || self.ammo == 0 {
            return None;
        }
        self.ammo -= 1;
        self.shots_fired += 1;

        let hits: Vec<TargetId> = self
            .active
            .values()
            .filter(|t| t.hitbox.intersect_ray(ray, t.position()).is_some())
            .map(|t| t.id)
            .collect();
        for id in &hits {
            self.active.remove(id);
            self.score += 1;
            self.outbox.push(SessionEvent::TargetRemoved { id: *id, cause: RemovalCause::Hit });
        }
        debug!("Shot {}: {} hit(s), {} left", self.shots_fired, hits.len(), self.ammo);

        self.push_hud();
        self.check_over();
        Some(ShotOutcome { hits, ammo_left: self.ammo })
    }

    /// Flight arrival. Ignored for stale epochs and targets already gone.
    pub fn expire(&mut self, id: TargetId, epoch: u64) -> bool {
        if epoch != self.epoch {
            debug!("Ignoring stale expiry of {id} (epoch {epoch}, now {})", self.epoch);
            return false;
        }
        if self.active.remove(&id).is_none() {
            return false;
        }
        debug!("{id} escaped");
        self.outbox.push(SessionEvent::TargetRemoved { id, cause: RemovalCause::Escaped });
        self.push_hud();
        self.check_over();
        true
    }

    /// Ends the round when ammo is gone or every target has been dealt with.
    pub fn check_over(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        let exhausted = self.ammo == 0;
        let cleared = self.spawned >= self.rules.max_targets && self.active.is_empty();
        if !(exhausted || cleared) {
            return false;
        }
        self.phase = SessionPhase::Over;
        self.stopwatch.pause();

        let summary = SessionSummary {
            elapsed_secs: self.stopwatch.elapsed_secs(),
            score: self.score,
            unspawned_targets: self.rules.max_targets - self.spawned,
            shots_fired: self.shots_fired,
            finished_at: Local::now(),
        };
        info!(
            "Round over ({}): score {}, {:.2}s, {} never spawned",
            if exhausted { "out of ammo" } else { "all targets done" },
            summary.score,
            summary.elapsed_secs,
            summary.unspawned_targets
        );
        self.summary = Some(summary.clone());
        self.outbox.push(SessionEvent::Over(summary));
        true
    }

    fn clear_active(&mut self) {
        for id in std::mem::take(&mut self.active).into_keys() {
            self.outbox.push(SessionEvent::TargetRemoved { id, cause: RemovalCause::Cleared });
        }
    }

    fn push_hud(&mut self) {
        let hud = self.hud();
        self.outbox.push(SessionEvent::HudChanged(hud));
    }
}

// Read-outs for assertions; the game itself only goes through the HUD snapshot and events.
#[cfg(test)]
impl Session {
    pub fn rules(&self) -> &SessionRules {
        &self.rules
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == SessionPhase::Over
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn targets(&self) -> impl Iterator<Item = &ActiveTarget> {
        self.active.values()
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const VIEWER: Vec3 = Vec3::new(0.0, 10.0, 100.0);

    fn rules() -> SessionRules {
        SessionRules::default()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn ray_at(p: Vec3) -> Ray3d {
        Ray3d { origin: Vec3::new(p.x, p.y, VIEWER.z), direction: Dir3::NEG_Z }
    }

    fn miss() -> Ray3d {
        Ray3d { origin: VIEWER, direction: Dir3::Y }
    }

    /// Spawns exactly `n` targets by pinning the per-tick range.
    fn spawn_exactly(session: &mut Session, n: u32, rng: &mut StdRng) {
        let (lo, hi) = (session.rules.min_per_tick, session.rules.max_per_tick);
        session.rules.min_per_tick = n;
        session.rules.max_per_tick = n;
        session.spawn_tick(rng);
        session.rules.min_per_tick = lo;
        session.rules.max_per_tick = hi;
    }

    fn assert_over_invariant(s: &Session) {
        if s.phase() == SessionPhase::Idle {
            return;
        }
        let condition = s.ammo() == 0
            || (s.spawned() == s.rules().max_targets && s.active_count() == 0);
        assert_eq!(s.is_over(), condition, "phase {:?}, ammo {}, spawned {}, active {}",
            s.phase(), s.ammo(), s.spawned(), s.active_count());
    }

    #[test]
    fn starts_idle_with_full_magazine() {
        let s = Session::new(rules());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.ammo(), 20);
        assert_eq!(s.remaining_targets(), 20);
        assert!(!s.is_playing());
    }

    #[test]
    fn start_is_ignored_while_active() {
        let mut s = Session::new(rules());
        assert!(s.start(VIEWER));
        let epoch = s.epoch();
        s.drain_events();
        assert!(!s.start(VIEWER));
        assert_eq!(s.epoch(), epoch);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn clicks_while_idle_do_nothing() {
        let mut s = Session::new(rules());
        assert!(s.fire(miss()).is_none());
        assert_eq!(s.ammo(), 20);
    }

    #[test]
    fn spawn_tick_respects_quota() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        for _ in 0..100 {
            s.spawn_tick(&mut rng);
            assert!(s.spawned() <= 20);
        }
        assert_eq!(s.spawned(), 20);
    }

    #[test]
    fn spawns_one_or_two_per_tick() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        let mut seen = [false; 3];
        for _ in 0..6 {
            let before = s.spawned();
            s.spawn_tick(&mut rng);
            let n = (s.spawned() - before) as usize;
            assert!((1..=2).contains(&n));
            seen[n] = true;
        }
        assert!(seen[1] || seen[2]);
    }

    #[test]
    fn spawned_targets_sit_in_front_of_the_viewer() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 2, &mut rng);
        for t in s.targets() {
            let p = t.position();
            assert_eq!(p.z, 90.0);
            assert!(p.x >= -10.0 && p.x < 10.0);
            assert!(p.y >= 5.0 && p.y < 15.0);
        }
    }

    #[test]
    fn every_click_costs_a_bullet() {
        let mut s = Session::new(rules());
        s.start(VIEWER);
        let outcome = s.fire(miss()).unwrap();
        assert!(outcome.hits.is_empty());
        assert_eq!(outcome.ammo_left, 19);
        assert_eq!(s.score(), 0);
        assert_eq!(s.shots_fired(), 1);
    }

    #[test]
    fn one_ray_can_drop_several_targets() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 1, &mut rng);
        let first = s.targets().next().unwrap().position();
        // Line up a second target directly behind the first.
        let id = TargetId(999);
        let flight = Flight::new(first - Vec3::Z * 5.0, first - Vec3::Z * 50.0, Duration::from_secs(5));
        s.active.insert(id, ActiveTarget { id, epoch: s.epoch(), flight, hitbox: s.rules.hitbox });

        let outcome = s.fire(ray_at(first)).unwrap();
        assert_eq!(outcome.hits.len(), 2);
        assert_eq!(s.score(), 2);
        assert_eq!(s.active_count(), 0);
    }

    #[test]
    fn classic_round_plays_to_the_end() {
        // Spawns are driven by hand here, so keep the spawn timer out of the way.
        let mut s = Session::new(SessionRules { spawn_interval: Duration::from_secs(1000), ..rules() });
        let mut rng = rng();
        s.start(VIEWER);

        spawn_exactly(&mut s, 2, &mut rng);
        assert_eq!(s.spawned(), 2);
        let ids: Vec<_> = s.targets().map(|t| t.id).collect();
        let aim = s.target(ids[0]).unwrap().position();
        let outcome = s.fire(ray_at(aim)).unwrap();
        assert!(outcome.hits.contains(&ids[0]));
        assert_eq!(s.score() as usize, outcome.hits.len());
        assert_eq!(s.ammo(), 19);
        let hits_so_far = s.score();

        // Let everything still airborne fly off.
        s.advance(Duration::from_secs_f32(5.0), &mut rng);
        assert_eq!(s.active_count(), 0);
        assert!(s.is_playing(), "only {} of 20 spawned", s.spawned());

        let mut total = hits_so_far;
        while s.spawned() < 20 {
            spawn_exactly(&mut s, 1, &mut rng);
            let aim = s.targets().next().unwrap().position();
            total += s.fire(ray_at(aim)).unwrap().hits.len() as u32;
            assert_over_invariant(&s);
        }
        // Every bullet but one was spent; the final kill ended the round.
        assert!(s.is_over());
        assert_eq!(s.score(), total);
        let summary = s.summary().unwrap();
        assert_eq!(summary.score, total);
        assert_eq!(summary.unspawned_targets, 0);
    }

    #[test]
    fn running_dry_ends_the_round_early() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        for _ in 0..5 {
            spawn_exactly(&mut s, 2, &mut rng);
        }
        assert_eq!(s.spawned(), 10);
        for _ in 0..19 {
            s.fire(miss());
            assert!(s.is_playing());
        }
        s.fire(miss());
        assert_eq!(s.ammo(), 0);
        assert!(s.is_over());
        assert_eq!(s.active_count(), 10);
        assert_eq!(s.summary().unwrap().unspawned_targets, 10);
        assert!(s.fire(miss()).is_none());
        assert_over_invariant(&s);
    }

    #[test]
    fn last_bullet_still_scores() {
        let mut s = Session::new(SessionRules { max_ammo: 1, ..rules() });
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 1, &mut rng);
        let aim = s.targets().next().unwrap().position();
        let outcome = s.fire(ray_at(aim)).unwrap();
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(s.score(), 1);
        assert!(s.is_over());
    }

    #[test]
    fn over_freezes_the_clock_and_stops_spawning() {
        let mut s = Session::new(SessionRules { max_ammo: 1, ..rules() });
        let mut rng = rng();
        s.start(VIEWER);
        s.advance(Duration::from_millis(1500), &mut rng);
        s.fire(miss());
        assert!(s.is_over());
        let elapsed = s.elapsed();
        let spawned = s.spawned();
        s.advance(Duration::from_secs(10), &mut rng);
        assert_eq!(s.elapsed(), elapsed);
        assert_eq!(s.spawned(), spawned);
        // Leftover targets still finish their flights.
        assert_eq!(s.active_count(), 0);
        assert!(s.is_over());
    }

    #[test]
    fn timers_drive_spawning_and_the_clock() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        s.drain_events();
        s.advance(Duration::from_millis(999), &mut rng);
        assert_eq!(s.spawned(), 0);
        s.drain_events();
        s.advance(Duration::from_millis(1), &mut rng);
        assert!(s.spawned() >= 1);
        let ticks = s
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::ClockTick { .. }))
            .count();
        assert_eq!(ticks, 1);
        assert!((s.elapsed().as_secs_f32() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn configured_intervals_are_exact() {
        assert_eq!(positive_secs(0.1), Duration::from_millis(100));
        assert_eq!(positive_secs(1.0), Duration::from_secs(1));
        assert_eq!(positive_secs(0.0), Duration::from_millis(1));
        let rules = SessionRules::default();
        assert_eq!(rules.clock_interval * 10, rules.spawn_interval);
    }

    #[test]
    fn ammo_never_increases_while_active() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        let mut last = s.ammo();
        for i in 0..40 {
            if i % 3 == 0 {
                s.spawn_tick(&mut rng);
            }
            s.fire(miss());
            s.advance(Duration::from_millis(250), &mut rng);
            assert!(s.ammo() <= last);
            last = s.ammo();
            assert_over_invariant(&s);
        }
        assert_eq!(s.ammo(), 0);
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 2, &mut rng);
        s.fire(miss());
        s.reset();
        let once = (s.phase(), s.hud(), s.epoch(), s.spawned(), s.active_count());
        s.drain_events();
        s.reset();
        let twice = (s.phase(), s.hud(), s.epoch(), s.spawned(), s.active_count());
        assert_eq!(once, twice);
        assert!(s.drain_events().is_empty());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.ammo(), 20);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn stale_expiry_after_reset_is_a_no_op() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 1, &mut rng);
        let target = s.targets().next().unwrap().clone();
        s.fire(miss());
        s.reset();
        s.drain_events();

        assert!(!s.expire(target.id, target.epoch));
        assert!(s.drain_events().is_empty());
        assert_eq!(s.ammo(), 20);
        assert_eq!(s.active_count(), 0);
        assert!(s.target(target.id).is_none());
    }

    #[test]
    fn stale_expiry_after_restart_keeps_new_round_intact() {
        let mut s = Session::new(SessionRules { max_ammo: 1, ..rules() });
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 1, &mut rng);
        let old = s.targets().next().unwrap().clone();
        s.fire(miss());
        assert!(s.is_over());
        assert!(s.start(VIEWER));
        assert!(!s.expire(old.id, old.epoch));
        assert!(s.is_playing());
        assert_eq!(s.remaining_targets(), 20);
    }

    #[test]
    fn restart_clears_leftovers_and_announces_them() {
        let mut s = Session::new(SessionRules { max_ammo: 1, ..rules() });
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 2, &mut rng);
        s.fire(miss());
        s.drain_events();
        s.start(VIEWER);
        let cleared = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::TargetRemoved { cause: RemovalCause::Cleared, .. }))
            .count();
        assert_eq!(cleared, 2);
        assert_eq!(s.active_count(), 0);
        assert_eq!(s.ammo(), 1);
    }

    #[test]
    fn remaining_counts_unspawned_and_airborne() {
        let mut s = Session::new(rules());
        let mut rng = rng();
        s.start(VIEWER);
        spawn_exactly(&mut s, 2, &mut rng);
        assert_eq!(s.remaining_targets(), 20);
        let aim = s.targets().next().unwrap().position();
        let hits = s.fire(ray_at(aim)).unwrap().hits.len() as u32;
        assert_eq!(s.remaining_targets(), 20 - hits);
    }

    #[test]
    fn hud_events_follow_mutations() {
        let mut s = Session::new(rules());
        s.start(VIEWER);
        let events = s.drain_events();
        assert_eq!(events[0], SessionEvent::Started);
        assert!(matches!(events.last(), Some(SessionEvent::HudChanged(h)) if h.ammo == 20));
        s.fire(miss());
        let events = s.drain_events();
        assert!(matches!(events.last(), Some(SessionEvent::HudChanged(h)) if h.ammo == 19));
    }

    #[test]
    fn empty_quota_ends_immediately() {
        let mut s = Session::new(SessionRules { max_targets: 0, ..rules() });
        s.start(VIEWER);
        assert!(s.is_over());
        assert_eq!(s.summary().unwrap().unspawned_targets, 0);
    }
}
