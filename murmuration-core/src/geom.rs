//! Angle and distance primitives on 2-D points.
//!
//! All functions here are pure and total; degenerate inputs (coincident
//! points, NaN angles) map to well-defined results instead of propagating
//! into the simulation.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Angle of the ray from `a` to `b`, in radians in `(-π, π]`.
///
/// Follows the `atan2` convention, including `atan2(0, 0) == 0` for
/// coincident points.
#[inline]
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Squared Euclidean distance, for hot-path radius comparisons.
#[inline]
pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    a.distance_squared(b)
}

/// Shortest signed angular distance from `from` to `to`, in `[-π, π)`.
///
/// Adding the result to `from` reaches `to` (mod 2π) along the shorter arc.
#[inline]
pub fn signed_angle_diff(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

/// Normalizes an angle into `[-π, π)`. NaN maps to `0`.
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if angle.is_nan() {
        return 0.0;
    }
    (angle + PI).rem_euclid(TAU) - PI
}

/// Unit vector pointing along `heading`.
#[inline]
pub fn heading_vec(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}
