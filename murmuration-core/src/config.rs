//! Simulation configuration: tunables, presets, and validation.

use thiserror::Error;

/// How starling steering contributions are composed each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SteeringMode {
    /// Incremental heading adjustments with a per-tick turn-rate cap.
    #[default]
    Heading,
    /// Separation / alignment / cohesion forces summed into a velocity
    /// vector, clamped to a maximum speed.
    Velocity,
}

/// What happens to a starling that crosses a world edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryPolicy {
    /// Exiting one edge re-enters the opposite edge.
    #[default]
    Wrap,
    /// Position clamps to the edge and the crossed velocity component
    /// inverts. Predators ignore this and always wrap.
    Bounce,
}

/// Errors produced by [`SimulationConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// World width or height is zero, negative, or not finite.
    #[error("world bounds must be positive, got {width}x{height}")]
    NonPositiveBounds {
        /// Configured width.
        width: f32,
        /// Configured height.
        height: f32,
    },

    /// A parameter that must be strictly positive is not.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Name of the offending field.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A parameter that must be non-negative is negative or not finite.
    #[error("{name} must be non-negative, got {value}")]
    Negative {
        /// Name of the offending field.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

/// All tunable parameters of the simulation.
///
/// [`SimulationConfig::default`] matches the heading-model murmuration
/// (120×40 world, 150 starlings, wraparound edges);
/// [`SimulationConfig::velocity_preset`] matches the vector-force variant
/// (160×60 world, 300 starlings, bouncing edges).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// World width; positions live in `[0, width)` under [`BoundaryPolicy::Wrap`].
    pub width: f32,
    /// World height.
    pub height: f32,

    /// Initial starling population; also the base of the spawn batch size.
    pub num_starlings: usize,
    /// Initial predator population.
    pub num_predators: usize,
    /// Obstacles placed once at construction.
    pub num_obstacles: usize,
    /// Attraction points placed once at construction.
    pub num_attraction_points: usize,

    /// Steering strategy used for starlings.
    pub steering: SteeringMode,
    /// Edge behavior for starlings.
    pub boundary: BoundaryPolicy,

    /// Distance a heading-model starling travels per tick.
    pub starling_speed: f32,
    /// Per-tick cap on heading change, radians.
    pub turn_angle: f32,
    /// Neighborhood radius for heading-model alignment.
    pub align_radius: f32,
    /// Radius inside which an obstacle repels and damages a starling.
    pub obstacle_avoid_radius: f32,
    /// Health lost on each tick spent inside an obstacle's avoid radius.
    pub obstacle_damage: f32,
    /// Radius inside which a predator repels and damages a starling.
    pub predator_avoid_radius: f32,
    /// Health lost on each tick spent inside a predator's avoid radius.
    pub predator_damage: f32,
    /// Distance a predator travels per tick.
    pub predator_speed: f32,

    /// Health each starling (and predator) spawns with; health never rises.
    pub starting_health: f32,
    /// Passive health loss per tick.
    pub health_decay_rate: f32,

    /// Neighborhood radius for velocity-model separation.
    pub separation_radius: f32,
    /// Gain applied to the global mean-velocity alignment force.
    pub alignment_factor: f32,
    /// Gain applied to the global-centroid cohesion force.
    pub cohesion_factor: f32,
    /// Squared distance below which a predator triggers a flee force.
    pub predator_flee_distance_sq: f32,
    /// Gain applied to the flee force.
    pub predator_flee_factor: f32,
    /// Half-width of the per-component uniform noise added each tick.
    pub randomness_factor: f32,
    /// Speed cap for velocity-model starlings.
    pub max_speed: f32,

    /// Wall-clock seconds between starling spawn batches.
    pub starling_spawn_interval: f64,
    /// Wall-clock seconds between single predator spawns.
    pub predator_spawn_interval: f64,
    /// Batch size as a fraction of `num_starlings`, floored.
    pub starling_spawn_fraction: f32,

    /// Optional RNG seed for reproducible runs; absent means OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 120.0,
            height: 40.0,
            num_starlings: 150,
            num_predators: 1,
            num_obstacles: 30,
            num_attraction_points: 5,
            steering: SteeringMode::Heading,
            boundary: BoundaryPolicy::Wrap,
            starling_speed: 2.0,
            turn_angle: std::f32::consts::FRAC_PI_4,
            align_radius: 15.0,
            obstacle_avoid_radius: 6.0,
            obstacle_damage: 5.0,
            predator_avoid_radius: 4.0,
            predator_damage: 5.0,
            predator_speed: 2.5,
            starting_health: 100.0,
            health_decay_rate: 0.0,
            separation_radius: 5.0,
            alignment_factor: 0.1,
            cohesion_factor: 0.05,
            predator_flee_distance_sq: 100.0,
            predator_flee_factor: 0.1,
            randomness_factor: 0.1,
            max_speed: 2.0,
            starling_spawn_interval: 5.0,
            predator_spawn_interval: 10.0,
            starling_spawn_fraction: 0.7,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Preset matching the vector-force variant: a larger world, a denser
    /// flock, bouncing edges, and no static obstacles or attraction points.
    pub fn velocity_preset() -> Self {
        Self {
            width: 160.0,
            height: 60.0,
            num_starlings: 300,
            num_obstacles: 0,
            num_attraction_points: 0,
            steering: SteeringMode::Velocity,
            boundary: BoundaryPolicy::Bounce,
            predator_speed: 1.5,
            ..Self::default()
        }
    }

    /// Checks that the configuration cannot produce NaN/Inf mid-simulation.
    ///
    /// Strictly positive: bounds, speeds, radii, turn angle, starting
    /// health, spawn intervals. Non-negative: damages, decay, force gains,
    /// noise, spawn fraction. NaN fails every check.
    ///
    /// ### Returns
    /// - `Ok(())` if every parameter is in range.
    /// - The first [`ConfigError`] encountered otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(ConfigError::NonPositiveBounds {
                width: self.width,
                height: self.height,
            });
        }

        let positive_f32 = [
            ("starling_speed", self.starling_speed),
            ("turn_angle", self.turn_angle),
            ("align_radius", self.align_radius),
            ("obstacle_avoid_radius", self.obstacle_avoid_radius),
            ("predator_avoid_radius", self.predator_avoid_radius),
            ("predator_speed", self.predator_speed),
            ("starting_health", self.starting_health),
            ("separation_radius", self.separation_radius),
            ("predator_flee_distance_sq", self.predator_flee_distance_sq),
            ("max_speed", self.max_speed),
        ];
        for (name, value) in positive_f32 {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::NonPositive {
                    name,
                    value: value.into(),
                });
            }
        }

        let positive_f64 = [
            ("starling_spawn_interval", self.starling_spawn_interval),
            ("predator_spawn_interval", self.predator_spawn_interval),
        ];
        for (name, value) in positive_f64 {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        let non_negative = [
            ("obstacle_damage", self.obstacle_damage),
            ("predator_damage", self.predator_damage),
            ("health_decay_rate", self.health_decay_rate),
            ("alignment_factor", self.alignment_factor),
            ("cohesion_factor", self.cohesion_factor),
            ("predator_flee_factor", self.predator_flee_factor),
            ("randomness_factor", self.randomness_factor),
            ("starling_spawn_fraction", self.starling_spawn_fraction),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigError::Negative {
                    name,
                    value: value.into(),
                });
            }
        }

        Ok(())
    }
}
