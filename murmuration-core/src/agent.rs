//! Agent records and their movement / boundary / health rules.
//!
//! Steering decisions live in [`crate::steering`]; this module only knows
//! how to create agents and how to integrate one tick of motion.

use crate::config::{BoundaryPolicy, SimulationConfig};
use crate::geom;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::PI;

/// Discriminates entries of the per-tick render view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Flocking prey agent.
    Starling,
    /// Pursuing agent; never removed from the world.
    Predator,
    /// Static point that repels and damages starlings on contact.
    Obstacle,
    /// Static point that pulls starlings regardless of distance.
    AttractionPoint,
}

/// A flocking prey agent.
///
/// Carries both steering representations: `heading` drives the
/// heading-model update, `velocity` the velocity-model update. Only the
/// representation selected by [`SimulationConfig::steering`] is integrated.
#[derive(Debug, Clone, PartialEq)]
pub struct Starling {
    /// Continuous world position.
    pub position: Vec2,
    /// Facing direction in radians, kept in `[-π, π)`.
    pub heading: f32,
    /// Velocity vector, magnitude capped at `max_speed` by the steering engine.
    pub velocity: Vec2,
    /// Remaining health in `[0, starting_health]`; never increases.
    pub health: f32,
}

impl Starling {
    /// Creates a starling at a uniform random position with a random
    /// heading and a small random velocity.
    pub fn spawn(cfg: &SimulationConfig, rng: &mut impl Rng) -> Self {
        Self {
            position: random_position(cfg, rng),
            heading: rng.random_range(-PI..PI),
            velocity: Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
            health: cfg.starting_health,
        }
    }

    /// Applies the configured edge behavior after a position update.
    ///
    /// `Wrap` folds the position into `[0, width) × [0, height)`. `Bounce`
    /// clamps to the edge and inverts the crossed velocity component once;
    /// the heading is mirrored to match, so both representations stay
    /// consistent whichever model is active.
    pub fn apply_boundary(&mut self, policy: BoundaryPolicy, width: f32, height: f32) {
        match policy {
            BoundaryPolicy::Wrap => {
                self.position = wrap_position(self.position, width, height);
            }
            BoundaryPolicy::Bounce => {
                if self.position.x > width {
                    self.position.x = width;
                    self.velocity.x = -self.velocity.x;
                    self.heading = geom::wrap_angle(PI - self.heading);
                } else if self.position.x < 0.0 {
                    self.position.x = 0.0;
                    self.velocity.x = -self.velocity.x;
                    self.heading = geom::wrap_angle(PI - self.heading);
                }

                if self.position.y > height {
                    self.position.y = height;
                    self.velocity.y = -self.velocity.y;
                    self.heading = geom::wrap_angle(-self.heading);
                } else if self.position.y < 0.0 {
                    self.position.y = 0.0;
                    self.velocity.y = -self.velocity.y;
                    self.heading = geom::wrap_angle(-self.heading);
                }
            }
        }
    }

    /// Subtracts passive decay, clamping at zero.
    pub fn decay(&mut self, rate: f32) {
        self.health = (self.health - rate).max(0.0);
    }
}

/// A pursuing agent. Health decays like a starling's, but predators are
/// never removed from the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Predator {
    /// Continuous world position.
    pub position: Vec2,
    /// Facing direction in radians.
    pub heading: f32,
    /// Velocity vector used by the velocity model.
    pub velocity: Vec2,
    /// Remaining health; decays but never triggers removal.
    pub health: f32,
}

impl Predator {
    /// Creates a predator at a uniform random position with a random
    /// heading and a small random velocity.
    pub fn spawn(cfg: &SimulationConfig, rng: &mut impl Rng) -> Self {
        Self {
            position: random_position(cfg, rng),
            heading: rng.random_range(-PI..PI),
            velocity: Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
            health: cfg.starting_health,
        }
    }

    /// Folds the position into `[0, width) × [0, height)`. Predators wrap
    /// under every boundary policy.
    pub fn wrap(&mut self, width: f32, height: f32) {
        self.position = wrap_position(self.position, width, height);
    }

    /// Subtracts passive decay, clamping at zero.
    pub fn decay(&mut self, rate: f32) {
        self.health = (self.health - rate).max(0.0);
    }
}

/// Static point that repels and damages starlings inside its avoid radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Fixed world position.
    pub position: Vec2,
}

impl Obstacle {
    /// Places an obstacle at a uniform random position.
    pub fn spawn(cfg: &SimulationConfig, rng: &mut impl Rng) -> Self {
        Self {
            position: random_position(cfg, rng),
        }
    }
}

/// Static point that pulls every starling toward it, with no distance cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractionPoint {
    /// Fixed world position.
    pub position: Vec2,
}

impl AttractionPoint {
    /// Places an attraction point at a uniform random position.
    pub fn spawn(cfg: &SimulationConfig, rng: &mut impl Rng) -> Self {
        Self {
            position: random_position(cfg, rng),
        }
    }
}

fn random_position(cfg: &SimulationConfig, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        rng.random_range(0.0..cfg.width),
        rng.random_range(0.0..cfg.height),
    )
}

/// Folds a position into `[0, width) × [0, height)`, regardless of how far
/// outside it landed.
fn wrap_position(position: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(wrap_axis(position.x, width), wrap_axis(position.y, height))
}

fn wrap_axis(value: f32, extent: f32) -> f32 {
    // rem_euclid of a tiny negative value can round up to the modulus
    // itself, which would land exactly on the excluded upper bound.
    let wrapped = value.rem_euclid(extent);
    if wrapped >= extent { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn starling_at(x: f32, y: f32) -> Starling {
        Starling {
            position: Vec2::new(x, y),
            heading: 0.0,
            velocity: Vec2::ZERO,
            health: 100.0,
        }
    }

    #[test]
    fn spawn_places_agents_inside_the_bounds() {
        let cfg = SimulationConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..100 {
            let s = Starling::spawn(&cfg, &mut rng);
            assert!(s.position.x >= 0.0 && s.position.x < cfg.width);
            assert!(s.position.y >= 0.0 && s.position.y < cfg.height);
            assert_eq!(s.health, cfg.starting_health);

            let o = Obstacle::spawn(&cfg, &mut rng);
            assert!(o.position.x >= 0.0 && o.position.x < cfg.width);
            assert!(o.position.y >= 0.0 && o.position.y < cfg.height);
        }
    }

    #[test]
    fn wrap_folds_overshoot_back_into_bounds() {
        let mut s = starling_at(121.5, -1.0);
        s.apply_boundary(BoundaryPolicy::Wrap, 120.0, 40.0);
        assert!((s.position.x - 1.5).abs() < 1e-5);
        assert!((s.position.y - 39.0).abs() < 1e-5);

        // Far overshoot still lands inside.
        let mut s = starling_at(-250.0, 170.0);
        s.apply_boundary(BoundaryPolicy::Wrap, 120.0, 40.0);
        assert!(s.position.x >= 0.0 && s.position.x < 120.0);
        assert!(s.position.y >= 0.0 && s.position.y < 40.0);
    }

    #[test]
    fn bounce_clamps_and_inverts_the_crossed_component_once() {
        let mut s = starling_at(161.0, 30.0);
        s.velocity = Vec2::new(1.5, 0.5);
        s.apply_boundary(BoundaryPolicy::Bounce, 160.0, 60.0);

        assert_eq!(s.position.x, 160.0);
        assert_eq!(s.velocity.x, -1.5);
        // The untouched axis is left alone.
        assert_eq!(s.position.y, 30.0);
        assert_eq!(s.velocity.y, 0.5);
    }

    #[test]
    fn bounce_handles_both_axes_in_one_update() {
        let mut s = starling_at(-2.0, 61.0);
        s.velocity = Vec2::new(-1.0, 2.0);
        s.apply_boundary(BoundaryPolicy::Bounce, 160.0, 60.0);

        assert_eq!(s.position, Vec2::new(0.0, 60.0));
        assert_eq!(s.velocity, Vec2::new(1.0, -2.0));
    }

    #[test]
    fn bounce_mirrors_the_heading_with_the_velocity() {
        // Moving along +x into the right wall: heading 0 becomes π (flipped back).
        let mut s = starling_at(161.0, 30.0);
        s.heading = 0.0;
        s.apply_boundary(BoundaryPolicy::Bounce, 160.0, 60.0);
        assert!((s.heading.abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn decay_clamps_health_at_zero() {
        let mut s = starling_at(0.0, 0.0);
        s.health = 0.3;
        s.decay(0.2);
        assert!((s.health - 0.1).abs() < 1e-6);
        s.decay(0.2);
        assert_eq!(s.health, 0.0);
        s.decay(0.2);
        assert_eq!(s.health, 0.0);
    }

    #[test]
    fn predators_wrap_under_any_policy() {
        let cfg = SimulationConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut p = Predator::spawn(&cfg, &mut rng);
        p.position = Vec2::new(cfg.width + 0.5, -0.5);
        p.wrap(cfg.width, cfg.height);
        assert!((p.position.x - 0.5).abs() < 1e-5);
        assert!((p.position.y - (cfg.height - 0.5)).abs() < 1e-4);
    }
}
