use nalgebra::Matrix2;

use super::*;

/// The (infinite) line through `p1` and `p2`.
///
/// Depending on the context, it may also be used as a segment,
/// or as a half-line starting at `p1` and passing through `p2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    #[inline]
    #[must_use]
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vector {
        self.p2 - self.p1
    }

    #[inline]
    #[must_use]
    pub fn midpoint(&self) -> Point {
        nalgebra::center(&self.p1, &self.p2)
    }

    /// Returns `(t, u)` such that
    ///
    /// `self.p1 + t * self.direction() = other.p1 + u * other.direction()`
    ///
    /// or `None` if both lines are parallel.
    #[inline]
    #[must_use]
    pub fn intersection_coordinates(&self, other: &Self) -> Option<(Float, Float)> {
        let a = Matrix2::from_columns(&[self.direction(), -other.direction()]);

        a.try_inverse().and_then(|inv| {
            let v = inv * (other.p1 - self.p1);
            (v.x.is_finite() && v.y.is_finite()).then_some((v.x, v.y))
        })
    }

    /// The intersection point of both (infinite) lines, if they aren't parallel.
    #[inline]
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Point> {
        self.intersection_coordinates(other)
            .map(|(t, _)| self.p1 + self.direction() * t)
    }

    /// Returns the intersection of the segment `self` with the half-line `ray`, if any.
    #[inline]
    #[must_use]
    pub fn segment_ray_intersection(&self, ray: &Self) -> Option<Point> {
        ray.intersection_coordinates(self)
            .filter(|&(t, u)| t >= 0. && (0. ..=1.).contains(&u))
            .map(|(t, _)| ray.p1 + ray.direction() * t)
    }

    #[inline]
    #[must_use]
    pub fn perpendicular_bisector(&self) -> Self {
        let m = self.midpoint();
        let d = self.direction();
        Self::new(m, m + Vector::new(-d.y, d.x))
    }

    /// Assuming `p` lies on this line, whether it is between `p1` and `p2`.
    #[inline]
    #[must_use]
    pub fn spans(&self, p: &Point) -> bool {
        (p - self.p1).dot(&(self.p2 - p)) >= 0.
    }

    /// Assuming `p` lies on this line, whether it is on the
    /// half-line starting at `p1` and passing through `p2`.
    #[inline]
    #[must_use]
    pub fn is_ahead(&self, p: &Point) -> bool {
        (p - self.p1).dot(&self.direction()) >= 0.
    }
}

impl From<&Ray> for Line {
    #[inline]
    fn from(ray: &Ray) -> Self {
        Self::new(ray.p1, ray.p2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    radius_sq: Float,
}

impl Circle {
    #[inline]
    #[must_use]
    pub fn new(center: impl Into<Point>, radius: Float) -> Self {
        Self {
            center: center.into(),
            radius_sq: radius * radius,
        }
    }

    /// The circle centered at `center`, passing through `p`.
    #[inline]
    #[must_use]
    pub fn through(center: Point, p: &Point) -> Self {
        Self {
            center,
            radius_sq: nalgebra::distance_squared(&center, p),
        }
    }

    /// The circle passing through all three points, or `None` if they are collinear.
    #[inline]
    #[must_use]
    pub fn circumscribed(p1: &Point, p2: &Point, p3: &Point) -> Option<Self> {
        Line::new(*p1, *p3)
            .perpendicular_bisector()
            .intersection(&Line::new(*p2, *p3).perpendicular_bisector())
            .map(|center| Self::through(center, p2))
    }

    #[inline]
    #[must_use]
    pub fn radius(&self) -> Float {
        self.radius_sq.sqrt()
    }

    /// The (up to two) points where the infinite `line` meets `self`,
    /// ordered along the direction of `line`.
    ///
    /// A tangent line yields the same point twice.
    #[inline]
    #[must_use]
    pub fn line_intersections(&self, line: &Line) -> Option<[Point; 2]> {
        let u = Unit::try_new(line.direction(), 0.)?;

        // projection of the center on the line
        let p = line.p1 + u.as_ref() * (self.center - line.p1).dot(u.as_ref());
        let delta = self.radius_sq - nalgebra::distance_squared(&p, &self.center);

        (delta >= 0.).then(|| {
            let d = u.as_ref() * delta.sqrt();
            [p - d, p + d]
        })
    }
}

/// Orthogonally reflects `v` with respect to the line orthogonal to `normal`.
#[inline]
#[must_use]
pub fn reflect(v: &Vector, normal: &Unit<Vector>) -> Vector {
    let n = normal.as_ref();
    v - n * (2. * v.dot(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn crossing_lines() {
        let l1 = Line::new([0., 0.], [2., 2.]);
        let l2 = Line::new([0., 2.], [2., 0.]);
        assert_relative_eq!(l1.intersection(&l2).unwrap(), Point::new(1., 1.));

        let (t, u) = l1.intersection_coordinates(&l2).unwrap();
        assert_relative_eq!(t, 0.5);
        assert_relative_eq!(u, 0.5);
    }

    #[test]
    fn parallel_lines_do_not_intersect() {
        let l1 = Line::new([0., 0.], [1., 1.]);
        let l2 = Line::new([0., 1.], [3., 4.]);
        assert!(l1.intersection(&l2).is_none());
    }

    #[test]
    fn segment_ray_intersection_checks_bounds_and_direction() {
        let segment = Line::new([5., -1.], [5., 1.]);

        let forward = Line::new([0., 0.], [1., 0.]);
        assert_relative_eq!(
            segment.segment_ray_intersection(&forward).unwrap(),
            Point::new(5., 0.)
        );

        let backward = Line::new([0., 0.], [-1., 0.]);
        assert!(segment.segment_ray_intersection(&backward).is_none());

        let missing = Line::new([0., 2.], [1., 2.]);
        assert!(segment.segment_ray_intersection(&missing).is_none());
    }

    #[test]
    fn spans_and_is_ahead() {
        let l = Line::new([0., 0.], [2., 0.]);
        assert!(l.spans(&Point::new(1., 0.)));
        assert!(!l.spans(&Point::new(3., 0.)));
        assert!(l.is_ahead(&Point::new(3., 0.)));
        assert!(!l.is_ahead(&Point::new(-1., 0.)));
    }

    #[test]
    fn circumscribed_circle() {
        let c = Circle::circumscribed(
            &Point::new(1., 0.),
            &Point::new(-1., 0.),
            &Point::new(0., 1.),
        )
        .unwrap();

        assert_abs_diff_eq!(c.center, Point::origin(), epsilon = 1e-12);
        assert_relative_eq!(c.radius(), 1.);
    }

    #[test]
    fn collinear_points_have_no_circumscribed_circle() {
        let c = Circle::circumscribed(
            &Point::new(0., 0.),
            &Point::new(2., 2.),
            &Point::new(1., 1.),
        );
        assert!(c.is_none());
    }

    #[test]
    fn line_circle_intersections_are_ordered() {
        let c = Circle::new([0., 0.], 2.);
        let [a, b] = c
            .line_intersections(&Line::new([-5., 0.], [5., 0.]))
            .unwrap();
        assert_relative_eq!(a, Point::new(-2., 0.));
        assert_relative_eq!(b, Point::new(2., 0.));

        let [a, b] = c
            .line_intersections(&Line::new([5., 0.], [-5., 0.]))
            .unwrap();
        assert_relative_eq!(a, Point::new(2., 0.));
        assert_relative_eq!(b, Point::new(-2., 0.));

        assert!(c
            .line_intersections(&Line::new([-5., 3.], [5., 3.]))
            .is_none());
    }

    #[test]
    fn reflection_flips_the_normal_component() {
        let n = Unit::new_normalize(Vector::new(0., 1.));
        let r = reflect(&Vector::new(1., -1.), &n);
        assert_relative_eq!(r, Vector::new(1., 1.));
    }
}
