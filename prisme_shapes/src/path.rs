use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use super::*;

/// A vertex of a [`BoundaryPath`].
///
/// An `arc` vertex isn't a corner: it is the point a circular arc passes through,
/// between its two neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathVertex {
    pub x: Float,
    pub y: Float,
    #[serde(default)]
    pub arc: bool,
}

impl PathVertex {
    #[inline]
    #[must_use]
    pub const fn new(x: Float, y: Float) -> Self {
        Self { x, y, arc: false }
    }

    #[inline]
    #[must_use]
    pub const fn arc(x: Float, y: Float) -> Self {
        Self { x, y, arc: true }
    }

    #[inline]
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    fn set_point(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }
}

/// A circular arc, from `p1` to `p2`, passing through `mid`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc {
    pub p1: Point,
    pub p2: Point,
    pub mid: Point,
    pub circle: Circle,
}

impl Arc {
    /// Returns `None` if all three points are collinear.
    #[inline]
    #[must_use]
    pub fn new(p1: Point, mid: Point, p2: Point) -> Option<Self> {
        Circle::circumscribed(&p1, &p2, &mid).map(|circle| Self {
            p1,
            p2,
            mid,
            circle,
        })
    }

    /// Assuming `p` is on `self.circle`, whether it is on the arc.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: &Point) -> bool {
        let towards_p = Line::new(self.mid, *p);

        // `p` is on the other side of the chord
        Line::new(self.p1, self.p2)
            .intersection(&towards_p)
            .map_or(true, |x| !towards_p.spans(&x))
    }

    /// The points where the (infinite) line meets the arc, ordered along `line`.
    #[inline]
    #[must_use]
    pub fn line_intersections(&self, line: &Line) -> ArrayVec<Point, 2> {
        self.circle
            .line_intersections(line)
            .into_iter()
            .flatten()
            .filter(|p| self.contains(p))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edge {
    Line(Line),
    Arc(Arc),
}

impl Edge {
    #[inline]
    #[must_use]
    pub fn endpoints(&self) -> [Point; 2] {
        match self {
            Edge::Line(l) => [l.p1, l.p2],
            Edge::Arc(a) => [a.p1, a.p2],
        }
    }
}

/// A closed path made of line segments and circular arcs.
///
/// The edge between vertices `i` and `i + 1` (indices wrap around) is:
/// - a line segment if neither vertex is an arc vertex.
/// - an arc from `i` to `i + 2`, through `i + 1`, if only `i + 1` is.
///
/// An arc whose three points are collinear degrades into a segment from `i` to `i + 2`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryPath {
    vertices: Vec<PathVertex>,
}

impl From<Vec<PathVertex>> for BoundaryPath {
    #[inline]
    fn from(vertices: Vec<PathVertex>) -> Self {
        Self { vertices }
    }
}

impl FromIterator<PathVertex> for BoundaryPath {
    #[inline]
    fn from_iter<I: IntoIterator<Item = PathVertex>>(iter: I) -> Self {
        Self::from(Vec::from_iter(iter))
    }
}

impl BoundaryPath {
    /// A polygon with the given corners.
    #[inline]
    #[must_use]
    pub fn polygon(corners: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        corners
            .into_iter()
            .map(|p| {
                let p = p.into();
                PathVertex::new(p.x, p.y)
            })
            .collect()
    }

    #[inline]
    pub fn vertices(&self) -> &[PathVertex] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn edge(&self, i: usize) -> Option<Edge> {
        let n = self.len();
        let [v0, v1, v2] = [i, i + 1, i + 2].map(|j| &self.vertices[j % n]);

        match (v0.arc, v1.arc) {
            (false, false) => Some(Edge::Line(Line::new(v0.point(), v1.point()))),
            (false, true) => Some(
                Arc::new(v0.point(), v1.point(), v2.point())
                    .map_or_else(|| Edge::Line(Line::new(v0.point(), v2.point())), Edge::Arc),
            ),
            _ => None,
        }
    }

    /// The edges of this path, in order.
    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        (0..self.len()).filter_map(|i| self.edge(i))
    }

    /// The average of all vertices, the origin if there are none.
    #[must_use]
    pub fn default_center(&self) -> Point {
        if self.is_empty() {
            return Point::origin();
        }

        let sum: Vector = self.vertices.iter().map(|v| v.point().coords).sum();
        (sum / self.len() as Float).into()
    }

    fn map_points(&mut self, f: impl Fn(Point) -> Point) {
        for v in &mut self.vertices {
            v.set_point(f(v.point()));
        }
    }

    pub fn translate(&mut self, v: &Vector) {
        self.map_points(|p| p + v);
    }

    /// Rotates all vertices by `angle` radians around `center`,
    /// or around [`Self::default_center`] if it's `None`.
    pub fn rotate(&mut self, angle: Float, center: Option<Point>) {
        let c = center.unwrap_or_else(|| self.default_center());
        let rotation = nalgebra::Rotation2::new(angle);
        self.map_points(|p| c + rotation * (p - c));
    }

    /// Scales all vertices by `factor` relative to `center`,
    /// or to [`Self::default_center`] if it's `None`.
    pub fn scale(&mut self, factor: Float, center: Option<Point>) {
        let c = center.unwrap_or_else(|| self.default_center());
        self.map_points(|p| c + (p - c) * factor);
    }
}
