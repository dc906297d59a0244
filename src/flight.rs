use bevy::prelude::*;
use rand::Rng;
use std::time::Duration;

use crate::config::FlightConfig;

/// Straight-line motion from a spawn point to the far field over a fixed duration.
/// Position is a pure function of elapsed time, advanced once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    from: Vec3,
    to: Vec3,
    duration: Duration,
    elapsed: Duration,
}

impl Flight {
    pub fn new(from: Vec3, to: Vec3, duration: Duration) -> Self {
        Self { from, to, duration, elapsed: Duration::ZERO }
    }

    /// Progress in [0, 1]. A zero-length flight is finished immediately.
    pub fn progress_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn position_at(&self, elapsed: Duration) -> Vec3 {
        self.from.lerp(self.to, self.progress_at(elapsed))
    }

    pub fn advance(&mut self, delta: Duration) -> Vec3 {
        self.elapsed = (self.elapsed + delta).min(self.duration);
        self.position()
    }

    pub fn position(&self) -> Vec3 {
        self.position_at(self.elapsed)
    }

    pub fn progress(&self) -> f32 {
        self.progress_at(self.elapsed)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    #[cfg(test)]
    pub fn from(&self) -> Vec3 {
        self.from
    }

    #[cfg(test)]
    pub fn to(&self) -> Vec3 {
        self.to
    }
}

/// Where targets appear relative to the viewer and where they fly to.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnLayout {
    pub lateral_spread: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub spawn_distance: f32,
    pub far_depth: f32,
    pub duration: Duration,
}

impl SpawnLayout {
    pub fn from_config(cfg: &FlightConfig) -> Self {
        Self {
            lateral_spread: cfg.lateral_spread.max(0.0),
            min_height: cfg.min_height,
            max_height: cfg.max_height.max(cfg.min_height),
            spawn_distance: cfg.spawn_distance,
            far_depth: cfg.far_depth,
            duration: Duration::from_secs_f32(cfg.duration_secs.max(0.0)),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, viewer: Vec3, rng: &mut R) -> Vec3 {
        let x = (rng.gen::<f32>() - 0.5) * self.lateral_spread;
        let y = self.min_height + rng.gen::<f32>() * (self.max_height - self.min_height);
        Vec3::new(x, y, viewer.z - self.spawn_distance)
    }

    pub fn destination(&self, start: Vec3) -> Vec3 {
        Vec3::new(start.x, start.y, self.far_depth)
    }

    pub fn launch<R: Rng + ?Sized>(&self, viewer: Vec3, rng: &mut R) -> Flight {
        let start = self.sample(viewer, rng);
        Flight::new(start, self.destination(start), self.duration)
    }
}

impl Default for SpawnLayout {
    fn default() -> Self {
        Self::from_config(&FlightConfig::default())
    }
}
