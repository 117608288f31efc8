//! The owning aggregate: agent collections, bounds, RNG, spawn bookkeeping.

use crate::agent::{AgentKind, AttractionPoint, Obstacle, Predator, Starling};
use crate::config::{ConfigError, SimulationConfig};
use crate::types::AgentId;
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// One entry of the per-tick render view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    /// What to draw.
    pub kind: AgentKind,
    /// Where to draw it, in continuous world coordinates. The renderer is
    /// responsible for truncation to its grid and for clipping
    /// out-of-bounds static points.
    pub position: Vec2,
}

/// Read-only view of the agent state steering decisions are computed from.
///
/// Taken once per tick after predators have moved; every starling's
/// steering reads this same pre-movement state, so iteration order cannot
/// leak partially updated positions into later agents' decisions.
pub struct Snapshot<'a> {
    /// All starlings, dead-but-not-yet-reaped ones included.
    pub starlings: &'a [Starling],
    /// All predators, at their already-updated positions for this tick.
    pub predators: &'a [Predator],
    /// All obstacles.
    pub obstacles: &'a [Obstacle],
    /// All attraction points.
    pub attraction_points: &'a [AttractionPoint],
}

impl Snapshot<'_> {
    /// Ids of starlings within `radius` of starling `id`, excluding `id`
    /// itself. Naive linear scan; fine at the populations this runs at.
    pub fn starlings_within(&self, id: AgentId, radius: f32) -> Vec<AgentId> {
        let center = self.starlings[id].position;
        let r2 = radius * radius;
        self.starlings
            .iter()
            .enumerate()
            .filter(|(other_id, other)| {
                *other_id != id && other.position.distance_squared(center) < r2
            })
            .map(|(other_id, _)| other_id)
            .collect()
    }

    /// The starling closest to `pos` and its squared distance, or `None`
    /// for an empty flock. Ties go to the first minimal index.
    pub fn nearest_starling(&self, pos: Vec2) -> Option<(AgentId, f32)> {
        nearest_starling(self.starlings, pos)
    }
}

/// Linear-scan nearest-starling query. Ties go to the first minimal index.
pub fn nearest_starling(starlings: &[Starling], pos: Vec2) -> Option<(AgentId, f32)> {
    let mut best = None;
    let mut best_d2 = f32::MAX;
    for (id, s) in starlings.iter().enumerate() {
        let d2 = s.position.distance_squared(pos);
        if d2 < best_d2 {
            best_d2 = d2;
            best = Some(id);
        }
    }
    best.map(|id| (id, best_d2))
}

/// Owns every agent plus the bounds, RNG, and spawn timers.
///
/// Agents never hold references to one another; all neighbor lookups go
/// through a fresh [`Snapshot`] each tick, so removal cannot dangle.
pub struct World {
    /// Active flock. Compacted by the reap phase at the end of each tick.
    pub starlings: Vec<Starling>,
    /// Predators; grows over time, never shrinks.
    pub predators: Vec<Predator>,
    /// Static obstacles, fixed at construction.
    pub obstacles: Vec<Obstacle>,
    /// Static attraction points, fixed at construction.
    pub attraction_points: Vec<AttractionPoint>,
    /// The configuration this world runs under.
    pub config: SimulationConfig,

    pub(crate) rng: SmallRng,
    /// Wall-clock time of the last starling batch; `None` until the first tick.
    pub(crate) last_starling_spawn: Option<f64>,
    /// Wall-clock time of the last predator spawn; `None` until the first tick.
    pub(crate) last_predator_spawn: Option<f64>,
}

impl World {
    /// Builds a world with the configured initial populations.
    ///
    /// ### Returns
    /// - `Ok(World)` with freshly spawned agents.
    /// - `Err` if [`SimulationConfig::validate`] rejects the configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        };

        let starlings = (0..config.num_starlings)
            .map(|_| Starling::spawn(&config, &mut rng))
            .collect();
        let predators = (0..config.num_predators)
            .map(|_| Predator::spawn(&config, &mut rng))
            .collect();
        let obstacles = (0..config.num_obstacles)
            .map(|_| Obstacle::spawn(&config, &mut rng))
            .collect();
        let attraction_points = (0..config.num_attraction_points)
            .map(|_| AttractionPoint::spawn(&config, &mut rng))
            .collect();

        Ok(Self {
            starlings,
            predators,
            obstacles,
            attraction_points,
            config,
            rng,
            last_starling_spawn: None,
            last_predator_spawn: None,
        })
    }

    /// Read-only view of the current agent state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            starlings: &self.starlings,
            predators: &self.predators,
            obstacles: &self.obstacles,
            attraction_points: &self.attraction_points,
        }
    }

    /// Render view for this tick, ordered obstacles, attraction points,
    /// starlings, predators (so movers draw over static points).
    pub fn view(&self) -> Vec<AgentView> {
        let mut out = Vec::with_capacity(
            self.obstacles.len()
                + self.attraction_points.len()
                + self.starlings.len()
                + self.predators.len(),
        );
        out.extend(self.obstacles.iter().map(|o| AgentView {
            kind: AgentKind::Obstacle,
            position: o.position,
        }));
        out.extend(self.attraction_points.iter().map(|a| AgentView {
            kind: AgentKind::AttractionPoint,
            position: a.position,
        }));
        out.extend(self.starlings.iter().map(|s| AgentView {
            kind: AgentKind::Starling,
            position: s.position,
        }));
        out.extend(self.predators.iter().map(|p| AgentView {
            kind: AgentKind::Predator,
            position: p.position,
        }));
        out
    }
}
