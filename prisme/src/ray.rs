use super::*;

/// A light ray, represented as a directed segment from `p1` towards `p2`.
///
/// Before being traced, `p2` only indicates a direction. Once recorded by the
/// [`Simulator`], a ray is a segment of the path of light, ending at an
/// intersection, or at the extension distance.
#[derive(Clone, Debug, PartialEq)]
pub struct Ray {
    pub p1: Point,
    pub p2: Point,
    /// Brightness of the s-polarized component
    pub brightness_s: Float,
    /// Brightness of the p-polarized component
    pub brightness_p: Float,
    /// In nanometers, `None` means white light
    pub wavelength: Option<Float>,
    /// Segments with this flag set are not meant to be drawn
    pub gap: bool,
    /// Set until the simulator processes this ray
    pub is_new: bool,
    pub surface_merging: Option<SurfaceMerging>,
}

impl Ray {
    #[inline]
    #[must_use]
    pub fn new(
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        brightness_s: Float,
        brightness_p: Float,
        wavelength: Option<Float>,
    ) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
            brightness_s,
            brightness_p,
            wavelength,
            gap: false,
            is_new: true,
            surface_merging: None,
        }
    }

    /// A ray whose `brightness` is evenly split between both polarizations.
    #[inline]
    #[must_use]
    pub fn unpolarized(p1: impl Into<Point>, p2: impl Into<Point>, brightness: Float) -> Self {
        let half = brightness * 0.5;
        Self::new(p1, p2, half, half, None)
    }

    #[inline]
    #[must_use]
    pub fn with_wavelength(mut self, wavelength: Option<Float>) -> Self {
        self.wavelength = wavelength;
        self
    }

    #[inline]
    #[must_use]
    pub fn total_brightness(&self) -> Float {
        self.brightness_s + self.brightness_p
    }

    /// `p2 - p1`, not normalized.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vector {
        self.p2 - self.p1
    }

    /// Returns `None` if `p1` and `p2` are (almost) the same point.
    #[inline]
    #[must_use]
    pub fn unit_direction(&self) -> Option<Unit<Vector>> {
        Unit::try_new(self.direction(), Float::EPSILON)
    }

    /// Both endpoints are finite, and distinct.
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
        finite(&self.p1) && finite(&self.p2) && self.p1 != self.p2
    }

    /// Moves `p2` so that it lies at `distance` from `p1`, in the same direction.
    ///
    /// Does nothing if the direction of `self` is degenerate.
    #[inline]
    pub fn extend(&mut self, distance: Float) {
        let d = self.direction();
        let length = d.norm();
        if length > 1e-10 {
            self.p2 = self.p1 + d * (distance / length);
        }
    }

    #[inline]
    #[must_use]
    pub fn extended(mut self, distance: Float) -> Self {
        self.extend(distance);
        self
    }

    /// A copy of `self` ending at `p2`.
    #[inline]
    #[must_use]
    pub fn truncated(&self, p2: Point) -> Self {
        Self {
            p2,
            ..self.clone()
        }
    }

    /// A new ray starting at `origin`, heading towards `dir`, carrying the
    /// brightness, wavelength and flags of `self`.
    #[inline]
    #[must_use]
    pub fn redirected(&self, origin: Point, dir: &Vector) -> Self {
        Self {
            p1: origin,
            p2: origin + dir,
            is_new: true,
            ..self.clone()
        }
    }
}
