//! A 2D ray optics tracer.
//!
//! Rays are emitted by the objects of a [`Scene`], then propagated breadth-first by a
//! [`Simulator`]: every ray is cut at its nearest intersection with an [`OpticalObject`],
//! which then decides what happens to the light (reflection, refraction, absorption...).

pub use nalgebra;
pub use rand;
pub use rand_pcg;

use nalgebra::{Point2, Unit, Vector2};

pub type Float = f64;
pub type Point = Point2<Float>;
pub type Vector = Vector2<Float>;

/// Intersections closer than this (times the scene's length scale)
/// to the origin of a ray are considered to be numerical noise.
pub const MIN_RAY_SEGMENT_LENGTH: Float = 1e-6;

pub const MIN_RAY_SEGMENT_LENGTH_SQUARED: Float =
    MIN_RAY_SEGMENT_LENGTH * MIN_RAY_SEGMENT_LENGTH;

pub const GREEN_WAVELENGTH: Float = 532.;
pub const RED_WAVELENGTH: Float = 650.;
pub const BLUE_WAVELENGTH: Float = 450.;

mod geometry;
mod object;
mod ray;
mod refraction;
mod scene;
mod simulator;

pub use geometry::*;
pub use object::*;
pub use ray::*;
pub use refraction::*;
pub use scene::*;
pub use simulator::*;
