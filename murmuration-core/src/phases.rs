//! The tick pipeline.
//!
//! [`advance`] runs one discrete step as five phases, in order:
//! 1. [`spawn_phase`] — wall-clock spawn timers emit new starlings and
//!    predators.
//! 2. [`predator_phase`] — predators retarget the nearest starling and move.
//! 3. [`steering_phase`] — every starling's steering outcome is computed
//!    from the same pre-movement [`Snapshot`] into a [`SteerBuffer`].
//! 4. [`movement_phase`] — outcomes are applied, positions integrate, edge
//!    policy and passive decay run.
//! 5. [`reap_phase`] — starlings that ran out of health are removed.
//!
//! The buffer between phases 3 and 4 is what makes iteration order
//! irrelevant: no starling's decision can observe another's same-tick
//! update. A starling that dies in phase 4 was still a valid neighbor in
//! phase 3 and disappears only at the end of the tick.

use crate::agent::{Predator, Starling};
use crate::config::SteeringMode;
use crate::geom;
use crate::steering::{HeadingModel, SteerBuffer, SteeringModel, VelocityModel};
use crate::world::{AgentView, Snapshot, World, nearest_starling};
use tracing::debug;

/// Checks the wall-clock spawn timers and emits due batches.
///
/// The first call only arms both timers to `now`; spawning starts one full
/// interval later. A due starling timer emits
/// `⌊num_starlings × starling_spawn_fraction⌋` new starlings; a due
/// predator timer emits a single predator. Each timer resets to `now` when
/// it fires, so cadence is independent of tick rate.
pub fn spawn_phase(world: &mut World, now: f64) {
    let World {
        starlings,
        predators,
        config,
        rng,
        last_starling_spawn,
        last_predator_spawn,
        ..
    } = world;

    let (Some(last_s), Some(last_p)) = (*last_starling_spawn, *last_predator_spawn) else {
        *last_starling_spawn = Some(now);
        *last_predator_spawn = Some(now);
        return;
    };

    if now - last_s >= config.starling_spawn_interval {
        let batch = (config.num_starlings as f32 * config.starling_spawn_fraction) as usize;
        for _ in 0..batch {
            starlings.push(Starling::spawn(config, rng));
        }
        *last_starling_spawn = Some(now);
        debug!(batch, population = starlings.len(), "spawned starling batch");
    }

    if now - last_p >= config.predator_spawn_interval {
        predators.push(Predator::spawn(config, rng));
        *last_predator_spawn = Some(now);
        debug!(population = predators.len(), "spawned predator");
    }
}

/// Moves every predator toward the starling nearest to it.
///
/// Under the heading model the predator's heading is replaced outright by
/// the bearing to its target; under the velocity model its velocity is set
/// to the unit direction scaled by `predator_speed`. With an empty flock
/// the previous heading/velocity carries the predator onward. Predators
/// wrap at the edges under every boundary policy.
pub fn predator_phase(world: &mut World) {
    let World {
        starlings,
        predators,
        config,
        ..
    } = world;

    for predator in predators.iter_mut() {
        let target = nearest_starling(starlings, predator.position);
        match config.steering {
            SteeringMode::Heading => {
                if let Some((id, _)) = target {
                    predator.heading =
                        geom::angle_between(predator.position, starlings[id].position);
                }
                predator.position += geom::heading_vec(predator.heading) * config.predator_speed;
            }
            SteeringMode::Velocity => {
                if let Some((id, _)) = target {
                    let toward =
                        (starlings[id].position - predator.position).normalize_or_zero();
                    predator.velocity = toward * config.predator_speed;
                }
                predator.position += predator.velocity;
            }
        }
        predator.wrap(config.width, config.height);
        predator.decay(config.health_decay_rate);
    }
}

/// Computes every starling's steering outcome from the pre-movement
/// snapshot into `acc`.
///
/// `acc` is resized to the current flock first; every slot is written.
pub fn steering_phase(world: &mut World, acc: &mut SteerBuffer) {
    acc.ensure_len(world.starlings.len());

    let model: &dyn SteeringModel = match world.config.steering {
        SteeringMode::Heading => &HeadingModel,
        SteeringMode::Velocity => &VelocityModel,
    };

    let World {
        starlings,
        predators,
        obstacles,
        attraction_points,
        config,
        rng,
        ..
    } = world;
    let snapshot = Snapshot {
        starlings: starlings.as_slice(),
        predators: predators.as_slice(),
        obstacles: obstacles.as_slice(),
        attraction_points: attraction_points.as_slice(),
    };

    for id in 0..snapshot.starlings.len() {
        acc.set(id, model.steer(&snapshot, id, config, rng));
    }
}

/// Applies the buffered steering outcomes and integrates one tick of motion.
///
/// Per starling: adopt the steered heading/velocity, take any contact
/// damage, advance (by `starling_speed` along the heading, or by the
/// velocity vector, per the active model), apply the boundary policy, then
/// passive decay. Health clamps at zero from below and never rises.
///
/// ### Panics
/// Panics if `acc` was not sized by [`steering_phase`] for this flock.
pub fn movement_phase(world: &mut World, acc: &SteerBuffer) {
    let cfg = world.config;
    for (id, starling) in world.starlings.iter_mut().enumerate() {
        let steer = acc.get(id);
        starling.heading = steer.heading;
        starling.velocity = steer.velocity;
        if steer.damage > 0.0 {
            starling.health = (starling.health - steer.damage).max(0.0);
        }

        match cfg.steering {
            SteeringMode::Heading => {
                starling.position += geom::heading_vec(starling.heading) * cfg.starling_speed;
            }
            SteeringMode::Velocity => {
                starling.position += starling.velocity;
            }
        }
        starling.apply_boundary(cfg.boundary, cfg.width, cfg.height);
        starling.decay(cfg.health_decay_rate);
    }
}

/// Removes starlings whose health reached zero. Returns how many were
/// removed. Predators are never reaped.
pub fn reap_phase(world: &mut World) -> usize {
    let before = world.starlings.len();
    world.starlings.retain(|s| s.health > 0.0);
    let removed = before - world.starlings.len();
    if removed > 0 {
        debug!(removed, remaining = world.starlings.len(), "reaped starlings");
    }
    removed
}

/// Advances the world by one tick and returns the render view.
///
/// Runs spawn, predator, steering, movement, and reap in that order. `now`
/// is wall-clock seconds from any fixed origin; only differences are used.
/// Deterministic for a given `(world, now)` pair, including the world's
/// RNG state.
pub fn advance(world: &mut World, acc: &mut SteerBuffer, now: f64) -> Vec<AgentView> {
    spawn_phase(world, now);
    predator_phase(world);
    steering_phase(world, acc);
    movement_phase(world, acc);
    reap_phase(world);
    world.view()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentKind, AttractionPoint, Obstacle};
    use crate::config::{BoundaryPolicy, SimulationConfig};
    use glam::Vec2;

    const EPS: f32 = 1e-4;

    /// A validated world with no agents at all, for hand-built scenarios.
    fn empty_world(mut cfg: SimulationConfig) -> World {
        cfg.num_starlings = 0;
        cfg.num_predators = 0;
        cfg.num_obstacles = 0;
        cfg.num_attraction_points = 0;
        cfg.seed = Some(1);
        World::new(cfg).unwrap()
    }

    fn starling_at(x: f32, y: f32, heading: f32, health: f32) -> Starling {
        Starling {
            position: Vec2::new(x, y),
            heading,
            velocity: Vec2::ZERO,
            health,
        }
    }

    fn predator_at(x: f32, y: f32) -> Predator {
        Predator {
            position: Vec2::new(x, y),
            heading: 0.0,
            velocity: Vec2::ZERO,
            health: 100.0,
        }
    }

    #[test]
    fn lone_starling_advances_toward_the_attraction_point() {
        let mut cfg = SimulationConfig::default();
        cfg.width = 100.0;
        cfg.height = 100.0;
        let mut world = empty_world(cfg);
        world.starlings.push(starling_at(0.0, 0.0, 0.0, 100.0));
        world.attraction_points.push(AttractionPoint {
            position: Vec2::new(10.0, 0.0),
        });

        let mut acc = SteerBuffer::with_len(0);
        advance(&mut world, &mut acc, 0.0);

        let s = &world.starlings[0];
        // Already aimed at the point: heading stays 0, one speed step in x.
        assert!(s.heading.abs() < EPS);
        assert!((s.position.x - cfg.starling_speed).abs() < EPS);
        assert!(s.position.y.abs() < EPS);
    }

    #[test]
    fn obstacle_contact_damages_and_turns_the_starling() {
        let mut cfg = SimulationConfig::default();
        cfg.width = 100.0;
        cfg.height = 100.0;
        let mut world = empty_world(cfg);
        world.starlings.push(starling_at(5.0, 5.0, 0.0, 100.0));
        world.obstacles.push(Obstacle {
            position: Vec2::new(5.0, 5.1),
        });

        let mut acc = SteerBuffer::with_len(0);
        advance(&mut world, &mut acc, 0.0);

        let s = &world.starlings[0];
        assert!((s.health - (100.0 - cfg.obstacle_damage)).abs() < EPS);
        let turned = geom::signed_angle_diff(0.0, s.heading);
        assert!(turned.abs() > 0.0 && turned.abs() <= cfg.turn_angle + EPS);
    }

    #[test]
    fn dying_starling_is_a_neighbor_this_tick_and_gone_the_next() {
        let mut cfg = SimulationConfig::default();
        cfg.width = 100.0;
        cfg.height = 100.0;
        let mut world = empty_world(cfg);
        // s0 sits on an obstacle with only 5 health left; s1 is 14 units
        // away: inside s0's align radius, outside the obstacle's reach.
        world.starlings.push(starling_at(5.0, 5.0, 0.0, 5.0));
        world.starlings.push(starling_at(19.0, 5.0, 1.0, 100.0));
        world.obstacles.push(Obstacle {
            position: Vec2::new(5.0, 5.05),
        });

        let mut acc = SteerBuffer::with_len(0);
        advance(&mut world, &mut acc, 0.0);

        // s0 died this tick, but s1 still aligned toward its heading.
        assert_eq!(world.starlings.len(), 1);
        let survivor_heading = world.starlings[0].heading;
        assert!(
            (survivor_heading - (1.0 - cfg.turn_angle)).abs() < EPS,
            "survivor should have turned toward the dying neighbor, got {survivor_heading}"
        );

        // Next tick there is no neighbor left; the heading holds.
        advance(&mut world, &mut acc, 0.1);
        assert_eq!(world.starlings.len(), 1);
        assert!((world.starlings[0].heading - survivor_heading).abs() < EPS);
    }

    #[test]
    fn predator_targets_the_nearer_starling() {
        let cfg = SimulationConfig::default();
        let mut world = empty_world(cfg);
        world.predators.push(predator_at(0.0, 0.0));
        world.starlings.push(starling_at(0.0, 10.0, 0.0, 100.0));
        world.starlings.push(starling_at(1.0, 0.0, 0.0, 100.0));

        predator_phase(&mut world);

        let p = &world.predators[0];
        // Bearing to (1, 0), not (0, 10).
        assert!(p.heading.abs() < EPS);
        assert!((p.position.x - cfg.predator_speed).abs() < EPS);
        assert!(p.position.y.abs() < EPS);
    }

    #[test]
    fn predator_with_no_prey_keeps_flying_straight() {
        let cfg = SimulationConfig::default();
        let mut world = empty_world(cfg);
        let mut p = predator_at(10.0, 10.0);
        p.heading = 0.5;
        world.predators.push(p);

        predator_phase(&mut world);

        let p = &world.predators[0];
        assert!((p.heading - 0.5).abs() < EPS);
        let expected = Vec2::new(10.0, 10.0) + geom::heading_vec(0.5) * cfg.predator_speed;
        assert!((p.position - expected).length() < EPS);
    }

    #[test]
    fn velocity_model_predator_moves_at_fixed_speed() {
        let mut cfg = SimulationConfig::velocity_preset();
        cfg.num_starlings = 0;
        cfg.num_predators = 0;
        cfg.seed = Some(1);
        let mut world = World::new(cfg).unwrap();
        world.predators.push(predator_at(10.0, 10.0));
        world.starlings.push(starling_at(10.0, 30.0, 0.0, 100.0));

        predator_phase(&mut world);

        let p = &world.predators[0];
        assert!((p.velocity - Vec2::new(0.0, cfg.predator_speed)).length() < EPS);
        assert!((p.position - Vec2::new(10.0, 11.5)).length() < EPS);
    }

    #[test]
    fn wrap_keeps_every_agent_inside_the_half_open_bounds() {
        let mut cfg = SimulationConfig::default();
        cfg.seed = Some(77);
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        for i in 0..40 {
            advance(&mut world, &mut acc, i as f64 * 0.05);
            for s in &world.starlings {
                assert!(s.position.x >= 0.0 && s.position.x < cfg.width);
                assert!(s.position.y >= 0.0 && s.position.y < cfg.height);
            }
            for p in &world.predators {
                assert!(p.position.x >= 0.0 && p.position.x < cfg.width);
                assert!(p.position.y >= 0.0 && p.position.y < cfg.height);
            }
        }
    }

    #[test]
    fn bounce_keeps_every_starling_inside_the_closed_bounds() {
        let mut cfg = SimulationConfig::velocity_preset();
        cfg.seed = Some(78);
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        for i in 0..40 {
            advance(&mut world, &mut acc, i as f64 * 0.05);
            for s in &world.starlings {
                assert!(s.position.x >= 0.0 && s.position.x <= cfg.width);
                assert!(s.position.y >= 0.0 && s.position.y <= cfg.height);
            }
        }
    }

    #[test]
    fn health_never_increases() {
        let mut cfg = SimulationConfig::default();
        cfg.seed = Some(5);
        cfg.health_decay_rate = 0.1;
        // High enough that contact damage cannot kill anyone mid-test, so
        // indices stay aligned across ticks.
        cfg.starting_health = 1000.0;
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        // Stay under the first spawn interval so indices line up.
        for i in 0..10 {
            let before: Vec<f32> = world.starlings.iter().map(|s| s.health).collect();
            advance(&mut world, &mut acc, i as f64 * 0.1);
            for (s, old) in world.starlings.iter().zip(&before) {
                assert!(s.health <= *old);
            }
        }
    }

    #[test]
    fn heading_change_per_tick_respects_the_turn_cap() {
        let mut cfg = SimulationConfig::default();
        cfg.seed = Some(6);
        cfg.num_starlings = 30;
        cfg.num_predators = 0;
        cfg.num_obstacles = 0;
        cfg.num_attraction_points = 5;
        cfg.starling_spawn_interval = 1e9;
        cfg.predator_spawn_interval = 1e9;
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        for i in 0..30 {
            let before: Vec<f32> = world.starlings.iter().map(|s| s.heading).collect();
            advance(&mut world, &mut acc, i as f64 * 0.05);
            for (s, old) in world.starlings.iter().zip(&before) {
                let delta = geom::signed_angle_diff(*old, s.heading);
                assert!(
                    delta.abs() <= cfg.turn_angle + EPS,
                    "turned {delta} in one tick"
                );
            }
        }
    }

    #[test]
    fn speed_never_exceeds_the_cap_under_the_velocity_model() {
        let mut cfg = SimulationConfig::velocity_preset();
        cfg.seed = Some(8);
        cfg.starling_spawn_interval = 1e9;
        cfg.predator_spawn_interval = 1e9;
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        for i in 0..30 {
            advance(&mut world, &mut acc, i as f64 * 0.05);
            for s in &world.starlings {
                assert!(s.velocity.length() <= cfg.max_speed + EPS);
            }
        }
    }

    #[test]
    fn spawn_timers_arm_on_the_first_tick_and_fire_on_schedule() {
        let mut cfg = SimulationConfig::default();
        cfg.seed = Some(3);
        cfg.num_starlings = 10;
        cfg.num_predators = 0;
        cfg.num_obstacles = 0;
        cfg.num_attraction_points = 0;
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        // First tick at t=50 only arms the timers, whatever t is.
        advance(&mut world, &mut acc, 50.0);
        assert_eq!(world.starlings.len(), 10);

        // Just short of the interval: nothing.
        advance(&mut world, &mut acc, 54.9);
        assert_eq!(world.starlings.len(), 10);
        assert_eq!(world.predators.len(), 0);

        // Starling interval elapses: one batch of ⌊0.7 × 10⌋ = 7.
        advance(&mut world, &mut acc, 55.0);
        assert_eq!(world.starlings.len(), 17);

        // Between intervals: nothing.
        advance(&mut world, &mut acc, 58.0);
        assert_eq!(world.starlings.len(), 17);

        // Predator interval elapses at t=60, plus another starling batch.
        advance(&mut world, &mut acc, 60.0);
        assert_eq!(world.starlings.len(), 24);
        assert_eq!(world.predators.len(), 1);
    }

    #[test]
    fn same_seed_and_clock_replay_identically() {
        let mut cfg = SimulationConfig::velocity_preset();
        cfg.seed = Some(21);
        let mut a = World::new(cfg).unwrap();
        let mut b = World::new(cfg).unwrap();
        let mut acc_a = SteerBuffer::with_len(0);
        let mut acc_b = SteerBuffer::with_len(0);

        for i in 0..10 {
            let t = i as f64 * 0.05;
            advance(&mut a, &mut acc_a, t);
            advance(&mut b, &mut acc_b, t);
        }

        assert_eq!(a.starlings, b.starlings);
        assert_eq!(a.predators, b.predators);
    }

    #[test]
    fn advance_returns_the_full_render_view() {
        let mut cfg = SimulationConfig::default();
        cfg.seed = Some(2);
        let mut world = World::new(cfg).unwrap();
        let mut acc = SteerBuffer::with_len(0);

        let view = advance(&mut world, &mut acc, 0.0);
        assert_eq!(
            view.len(),
            world.obstacles.len()
                + world.attraction_points.len()
                + world.starlings.len()
                + world.predators.len()
        );
        assert!(view.iter().any(|v| v.kind == AgentKind::Predator));
        assert!(view.iter().any(|v| v.kind == AgentKind::Starling));
    }

    #[test]
    fn bounce_inverts_the_crossed_velocity_component() {
        let mut cfg = SimulationConfig::velocity_preset();
        cfg.randomness_factor = 0.0;
        let mut world = empty_world(cfg);
        world.config.boundary = BoundaryPolicy::Bounce;
        // One starling racing at the right wall; alone, so the only forces
        // are zero and its velocity persists until the bounce.
        let mut s = starling_at(159.5, 30.0, 0.0, 100.0);
        s.velocity = Vec2::new(2.0, 0.0);
        world.starlings.push(s);

        let mut acc = SteerBuffer::with_len(0);
        advance(&mut world, &mut acc, 0.0);

        let s = &world.starlings[0];
        assert_eq!(s.position.x, world.config.width);
        assert!((s.velocity.x + 2.0).abs() < EPS);
    }
}
