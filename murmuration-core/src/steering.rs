//! The steering engine: two strategies for composing per-tick stimuli.
//!
//! Both strategies implement [`SteeringModel`]: given the pre-tick
//! [`Snapshot`], produce the starling's post-steering state without touching
//! the world. The tick driver collects every outcome into a [`SteerBuffer`]
//! first and applies them afterwards, so agent `i`'s decision can never
//! observe agent `j`'s already-updated state.

use crate::config::SimulationConfig;
use crate::geom;
use crate::types::AgentId;
use crate::world::Snapshot;
use glam::Vec2;
use rand::Rng;
use rand::rngs::SmallRng;
use std::f32::consts::PI;

/// Outcome of one starling's steering computation for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Steer {
    /// Heading after this tick's adjustments (heading model), or the
    /// unchanged pre-tick heading (velocity model).
    pub heading: f32,
    /// Velocity after this tick's forces (velocity model), or the unchanged
    /// pre-tick velocity (heading model).
    pub velocity: Vec2,
    /// Contact damage accumulated from obstacles and predators this tick.
    pub damage: f32,
}

impl Default for Steer {
    fn default() -> Self {
        Self {
            heading: 0.0,
            velocity: Vec2::ZERO,
            damage: 0.0,
        }
    }
}

/// Scratch buffer of per-starling steering outcomes.
///
/// Reused across ticks; the tick driver sizes it to the current flock with
/// [`SteerBuffer::ensure_len`], fills every slot during the steering phase,
/// and drains it during the movement phase.
#[derive(Debug)]
pub struct SteerBuffer {
    steers: Vec<Steer>,
}

impl SteerBuffer {
    /// Creates a buffer with the given length, all slots defaulted.
    pub fn with_len(len: usize) -> Self {
        Self {
            steers: vec![Steer::default(); len],
        }
    }

    /// Resizes to exactly `len` and resets every slot.
    pub fn ensure_len(&mut self, len: usize) {
        self.steers.clear();
        self.steers.resize(len, Steer::default());
    }

    /// Stores the outcome for starling `id`.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds for the buffer.
    #[inline]
    pub fn set(&mut self, id: AgentId, steer: Steer) {
        self.steers[id] = steer;
    }

    /// The stored outcome for starling `id`.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds for the buffer.
    #[inline]
    pub fn get(&self, id: AgentId) -> Steer {
        self.steers[id]
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.steers.len()
    }

    /// Whether the buffer holds no slots.
    pub fn is_empty(&self) -> bool {
        self.steers.is_empty()
    }
}

/// Turns `current` toward `target` along the shorter arc, limited to
/// `turn_angle` per call. The result is normalized into `[-π, π)`.
pub fn turn_toward(current: f32, target: f32, turn_angle: f32) -> f32 {
    let diff = geom::signed_angle_diff(current, target);
    geom::wrap_angle(current + diff.clamp(-turn_angle, turn_angle))
}

/// A strategy for computing one starling's steering outcome from the
/// pre-tick snapshot.
pub trait SteeringModel {
    /// Computes the outcome for starling `id`. Must not observe any state
    /// outside `snapshot`, so outcomes are independent of iteration order.
    fn steer(
        &self,
        snapshot: &Snapshot<'_>,
        id: AgentId,
        cfg: &SimulationConfig,
        rng: &mut SmallRng,
    ) -> Steer;
}

/// Incremental heading steering with a per-tick turn-rate cap.
///
/// Stimuli are visited in a fixed order — alignment, obstacles, predators,
/// attraction points — each turning the working heading by at most
/// `turn_angle`. The net change for the tick is then clamped to
/// `turn_angle` as well, so a crowded tick can never spin a starling
/// past its turn rate.
pub struct HeadingModel;

impl SteeringModel for HeadingModel {
    fn steer(
        &self,
        snapshot: &Snapshot<'_>,
        id: AgentId,
        cfg: &SimulationConfig,
        _rng: &mut SmallRng,
    ) -> Steer {
        let starling = &snapshot.starlings[id];
        let mut heading = starling.heading;
        let mut damage = 0.0;

        // Alignment: steer toward the arithmetic mean of neighbor headings.
        let neighbors = snapshot.starlings_within(id, cfg.align_radius);
        if !neighbors.is_empty() {
            let sum: f32 = neighbors
                .iter()
                .map(|&n| snapshot.starlings[n].heading)
                .sum();
            let mean = sum / neighbors.len() as f32;
            heading = turn_toward(heading, mean, cfg.turn_angle);
        }

        // Obstacles repel and damage on contact.
        let avoid_r2 = cfg.obstacle_avoid_radius * cfg.obstacle_avoid_radius;
        for obstacle in snapshot.obstacles {
            if starling.position.distance_squared(obstacle.position) < avoid_r2 {
                let away = geom::angle_between(starling.position, obstacle.position) + PI;
                heading = turn_toward(heading, geom::wrap_angle(away), cfg.turn_angle);
                damage += cfg.obstacle_damage;
            }
        }

        // Predators repel and damage the same way.
        let avoid_r2 = cfg.predator_avoid_radius * cfg.predator_avoid_radius;
        for predator in snapshot.predators {
            if starling.position.distance_squared(predator.position) < avoid_r2 {
                let away = geom::angle_between(starling.position, predator.position) + PI;
                heading = turn_toward(heading, geom::wrap_angle(away), cfg.turn_angle);
                damage += cfg.predator_damage;
            }
        }

        // Attraction points pull with no distance cutoff.
        for point in snapshot.attraction_points {
            let toward = geom::angle_between(starling.position, point.position);
            heading = turn_toward(heading, toward, cfg.turn_angle);
        }

        // Net per-tick change still respects the turn-rate cap.
        let net = geom::signed_angle_diff(starling.heading, heading);
        let heading = geom::wrap_angle(
            starling.heading + net.clamp(-cfg.turn_angle, cfg.turn_angle),
        );

        Steer {
            heading,
            velocity: starling.velocity,
            damage,
        }
    }
}

/// Force-summing velocity steering: separation, alignment toward the global
/// mean velocity, cohesion toward the global centroid, predator flight, and
/// uniform noise, with the resulting speed clamped to `max_speed`.
///
/// Obstacles and attraction points exert no force under this model, and no
/// contact damage is dealt; passive health decay still applies during
/// movement.
pub struct VelocityModel;

impl SteeringModel for VelocityModel {
    fn steer(
        &self,
        snapshot: &Snapshot<'_>,
        id: AgentId,
        cfg: &SimulationConfig,
        rng: &mut SmallRng,
    ) -> Steer {
        let starling = &snapshot.starlings[id];
        let mut steer = Vec2::ZERO;

        // Separation: push away from close neighbors, weighted by inverse
        // squared distance. Coincident pairs contribute nothing.
        let sep_r2 = cfg.separation_radius * cfg.separation_radius;
        let mut separation = Vec2::ZERO;
        let mut count = 0;
        for (other_id, other) in snapshot.starlings.iter().enumerate() {
            if other_id == id {
                continue;
            }
            let d2 = starling.position.distance_squared(other.position);
            if d2 > 0.0 && d2 < sep_r2 {
                separation += (starling.position - other.position) / d2;
                count += 1;
            }
        }
        if count > 0 {
            separation /= count as f32;
            separation = separation.normalize_or_zero();
        }
        steer += separation;

        // Alignment and cohesion read the whole flock, not a neighborhood.
        let others = snapshot.starlings.len().saturating_sub(1);
        if others > 0 {
            let mut mean_velocity = Vec2::ZERO;
            let mut centroid = Vec2::ZERO;
            for (other_id, other) in snapshot.starlings.iter().enumerate() {
                if other_id == id {
                    continue;
                }
                mean_velocity += other.velocity;
                centroid += other.position;
            }
            mean_velocity /= others as f32;
            centroid /= others as f32;

            steer += (mean_velocity - starling.velocity) * cfg.alignment_factor;
            steer += (centroid - starling.position) * cfg.cohesion_factor;
        }

        // Flee every predator inside the flight distance.
        for predator in snapshot.predators {
            if starling.position.distance_squared(predator.position) < cfg.predator_flee_distance_sq
            {
                steer += (starling.position - predator.position) * cfg.predator_flee_factor;
            }
        }

        // Noise keeps the flock from settling into a static pattern.
        if cfg.randomness_factor > 0.0 {
            steer += Vec2::new(
                rng.random_range(-cfg.randomness_factor..cfg.randomness_factor),
                rng.random_range(-cfg.randomness_factor..cfg.randomness_factor),
            );
        }

        let velocity = (starling.velocity + steer).clamp_length_max(cfg.max_speed);

        Steer {
            heading: starling.heading,
            velocity,
            damage: 0.0,
        }
    }
}
