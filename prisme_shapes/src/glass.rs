use rand::Rng;
use serde::Deserialize;

use super::*;

/// How a ray meets the boundary of a [`Glass`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncidentType {
    /// The ray comes from outside the body
    Entry,
    /// The ray comes from inside the body
    Exit,
    /// The ray hits an even number of coincident edges, which cancel out
    Overlap,
    /// The ray hits a vertex, where the normal isn't defined
    EdgeUndefined,
}

/// Where and how a ray hits a [`Glass`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Incidence {
    pub point: Point,
    /// Not normalized, points towards the side the ray comes from.
    pub normal: Vector,
    pub incident_type: IncidentType,
}

struct EdgeHit {
    point: Point,
    dist_sq: Float,
    normal: Vector,
    near_vertex: bool,
}

impl Edge {
    /// Points where the half-line `ray` crosses this edge, at least
    /// `sqrt(min_dist_sq)` away from its origin.
    fn crossings<'a>(
        &'a self,
        ray: &'a Line,
        min_dist_sq: Float,
    ) -> impl Iterator<Item = (Point, Float)> + 'a {
        let points = match self {
            Edge::Line(segment) => ray
                .intersection(segment)
                .filter(|p| segment.spans(p))
                .into_iter()
                .collect(),
            Edge::Arc(arc) => arc.line_intersections(ray),
        };

        points
            .into_iter()
            .filter(move |p| ray.is_ahead(p))
            .map(move |p| (p, nalgebra::distance_squared(&ray.p1, &p)))
            .filter(move |(_, d)| *d > min_dist_sq)
    }

    fn nearest_hit(&self, ray: &Line, min_dist_sq: Float) -> Option<EdgeHit> {
        let (point, dist_sq) = self
            .crossings(ray, min_dist_sq)
            .min_by(|(_, d1), (_, d2)| d1.total_cmp(d2))?;

        let r = ray.direction();

        let normal = match self {
            Edge::Line(segment) => {
                let d = segment.direction();
                d * r.dot(&d) - r * d.norm_squared()
            }
            Edge::Arc(arc) => {
                let c = arc.circle.center;

                // whether the ray crosses the circle again further away,
                // i. e. it is entering the circle
                let entering = arc
                    .circle
                    .line_intersections(ray)
                    .into_iter()
                    .flatten()
                    .any(|p| {
                        ray.is_ahead(&p) && nalgebra::distance_squared(&ray.p1, &p) > dist_sq
                    });

                if entering {
                    point - c
                } else {
                    c - point
                }
            }
        };

        let near_vertex = self
            .endpoints()
            .iter()
            .any(|v| nalgebra::distance_squared(v, &point) < min_dist_sq);

        Some(EdgeHit {
            point,
            dist_sq,
            normal,
            near_vertex,
        })
    }
}

/// A refracting body, bounded by a closed path of line segments and circular arcs.
#[derive(Clone, Debug, PartialEq)]
pub struct Glass {
    pub path: BoundaryPath,
    /// Refractive index, or the `A` coefficient of Cauchy's equation
    /// when the scene simulates colors.
    pub ref_index: Float,
    /// The `B` coefficient of Cauchy's equation, in µm²
    pub cauchy_b: Float,
    /// Set while the body is being drawn, it is then ignored by rays
    pub not_done: bool,
}

impl Default for Glass {
    #[inline]
    fn default() -> Self {
        Self {
            path: BoundaryPath::default(),
            ref_index: 1.5,
            cauchy_b: 0.004,
            not_done: false,
        }
    }
}

impl Glass {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<BoundaryPath>, ref_index: Float) -> Self {
        Self {
            path: path.into(),
            ref_index,
            ..Default::default()
        }
    }

    /// The refractive index seen by `ray`.
    #[inline]
    pub fn ref_index_at(&self, ray: &Ray, ctx: &SimulationCtx) -> Float {
        if ctx.simulate_colors() {
            let wavelength = ray.wavelength.unwrap_or(GREEN_WAVELENGTH);
            cauchy_index(self.ref_index, self.cauchy_b, wavelength)
        } else {
            self.ref_index
        }
    }

    /// Finds where `ray` first hits this body, with which normal, and whether
    /// it's entering or exiting it.
    ///
    /// The inside/outside test counts how many times a slightly perturbed copy
    /// of `ray` crosses the boundary, the perturbation is drawn from the scene's
    /// random generator.
    pub fn classify(&self, ray: &Ray, ctx: &mut SimulationCtx) -> Option<Incidence> {
        if self.path.is_empty() {
            return None;
        }

        let min_dist_sq = ctx.min_segment_length_squared();

        let rng = ctx.rng();
        let jitter_x = rng.gen::<Float>() * 1e-5;
        let jitter_y = rng.gen::<Float>() * 1e-5;

        let line = Line::from(ray);
        let probe = Line::new(ray.p1, ray.p2 + Vector::new(jitter_x, jitter_y));

        let mut nearest: Option<EdgeHit> = None;
        let mut multiplicity = 1usize;
        let mut crossings = 0usize;

        for edge in self.path.edges() {
            if let Some(hit) = edge.nearest_hit(&line, min_dist_sq) {
                match &nearest {
                    // coincident edges
                    Some(n) if nalgebra::distance_squared(&n.point, &hit.point) < min_dist_sq => {
                        multiplicity += 1
                    }
                    Some(n) if n.dist_sq <= hit.dist_sq => {}
                    _ => {
                        nearest = Some(hit);
                        multiplicity = 1;
                    }
                }
            }

            crossings += edge.crossings(&probe, min_dist_sq).count();
        }

        let hit = nearest?;

        let incident_type = if hit.near_vertex {
            IncidentType::EdgeUndefined
        } else if multiplicity % 2 == 0 {
            IncidentType::Overlap
        } else if crossings % 2 == 1 {
            IncidentType::Exit
        } else {
            IncidentType::Entry
        };

        Some(Incidence {
            point: hit.point,
            normal: hit.normal,
            incident_type,
        })
    }
}

impl OpticalObject for Glass {
    fn intersect(&self, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
        if self.not_done || self.ref_index <= 0. || self.path.is_empty() {
            return None;
        }

        let line = Line::from(ray);
        let min_dist_sq = ctx.min_segment_length_squared();

        self.path
            .edges()
            .filter_map(|edge| edge.nearest_hit(&line, min_dist_sq))
            .min_by(|h1, h2| h1.dist_sq.total_cmp(&h2.dist_sq))
            .map(|hit| hit.point)
    }

    fn respond(
        &self,
        ray: &Ray,
        _ray_index: usize,
        incident_point: &Point,
        _merging: Option<&SurfaceMerging>,
        ctx: &mut SimulationCtx,
    ) -> Response {
        if self.not_done {
            return Response::Absorbed;
        }

        let Some(incidence) = self.classify(ray, ctx) else {
            return Response::Absorbed;
        };

        let n1 = match incidence.incident_type {
            IncidentType::Exit => self.ref_index_at(ray, ctx),
            IncidentType::Entry => 1. / self.ref_index_at(ray, ctx),
            IncidentType::Overlap => 1.,
            IncidentType::EdgeUndefined => {
                ctx.flag_undefined_behavior(incident_point);
                return Response::Absorbed;
            }
        };

        refract(ray, incident_point, &incidence.normal, n1)
    }
}

impl JsonType for Glass {
    fn json_type() -> String {
        "Glass".into()
    }
}

impl JsonDes for Glass {
    /// Deserialize a new glass body from a JSON object.
    ///
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "path": [{ "x": 0.0, "y": 0.0, "arc": false }, ...],
    ///     "ref_index": 1.5,   // optional
    ///     "cauchy_b": 0.004,  // optional
    ///     "not_done": false,  // optional
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        let default = Self::default();

        let path = match json.get("path") {
            Some(path) => BoundaryPath::deserialize(path)?,
            None => BoundaryPath::default(),
        };

        Ok(Self {
            path,
            ref_index: float_field_or(json, "ref_index", default.ref_index)?,
            cauchy_b: float_field_or(json, "cauchy_b", default.cauchy_b)?,
            not_done: bool_field_or(json, "not_done", default.not_done)?,
        })
    }
}

impl JsonSer for Glass {
    /// Serialize a glass body into a JSON object.
    ///
    /// The format of the returned object is explained in [`Self::from_json`]
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path,
            "ref_index": self.ref_index,
            "cauchy_b": self.cauchy_b,
            "not_done": self.not_done,
        })
    }
}

impl Random for Glass {
    /// Either a convex polygon, or a biconvex lens.
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let center = rand_point(rng, SCENE_HALF_EXTENT);
        let radius = rng.gen_range(10.0..60.0);
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);

        let path = if rng.gen_bool(0.5) {
            let n = rng.gen_range(3usize..8);
            BoundaryPath::polygon((0..n).map(|i| {
                let a = angle + i as Float * std::f64::consts::TAU / n as Float;
                center + Vector::new(a.cos(), a.sin()) * radius
            }))
        } else {
            let bulge = rng.gen_range(0.1..0.5) * radius;
            let mut path = BoundaryPath::from(vec![
                PathVertex::new(center.x, center.y - radius),
                PathVertex::arc(center.x + bulge, center.y),
                PathVertex::new(center.x, center.y + radius),
                PathVertex::arc(center.x - bulge, center.y),
            ]);
            path.rotate(angle, Some(center));
            path
        };

        Self::new(path, rng.gen_range(1.2..2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn square() -> Glass {
        Glass::new(
            BoundaryPath::polygon([[0., 0.], [1., 0.], [1., 1.], [0., 1.]]),
            1.5,
        )
    }

    fn with_ctx<T>(f: impl FnOnce(&mut SimulationCtx) -> T) -> T {
        let settings = SceneSettings::default();
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        f(&mut SimulationCtx::new(&settings, &mut rng))
    }

    fn far_ray(p1: [Float; 2], towards: [Float; 2]) -> Ray {
        Ray::unpolarized(p1, towards, 1.).extended(10000.)
    }

    #[test]
    fn square_entry_and_exit() {
        let glass = square();

        with_ctx(|ctx| {
            let from_outside = far_ray([-1., 0.3], [0., 0.4]);
            let incidence = glass.classify(&from_outside, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::Entry);
            assert_relative_eq!(incidence.point, Point::new(0., 0.4), epsilon = 1e-12);
            // pointing back towards the ray's origin
            assert!(incidence.normal.x < 0.);
            assert_relative_eq!(incidence.normal.y, 0., epsilon = 1e-12);

            let from_inside = far_ray([0.5, 0.5], [0.7, 0.6]);
            let incidence = glass.classify(&from_inside, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::Exit);
            assert_relative_eq!(incidence.point, Point::new(1., 0.75), epsilon = 1e-12);
            assert!(incidence.normal.x < 0.);
        });
    }

    #[test]
    fn square_never_overlaps() {
        let glass = square();
        let mut rng = Pcg64Mcg::seed_from_u64(11);

        with_ctx(|ctx| {
            for _ in 0..200 {
                let origin = [rng.gen_range(-2.0..3.0), rng.gen_range(-2.0..3.0)];
                let towards = [rng.gen_range(0.2..0.8), rng.gen_range(0.2..0.8)];
                let ray = far_ray(origin, towards);

                if let Some(incidence) = glass.classify(&ray, ctx) {
                    let inside = (0.0..=1.0).contains(&origin[0]) && (0.0..=1.0).contains(&origin[1]);
                    let expected = if inside {
                        IncidentType::Exit
                    } else {
                        IncidentType::Entry
                    };
                    assert_ne!(incidence.incident_type, IncidentType::Overlap);
                    if incidence.incident_type != IncidentType::EdgeUndefined {
                        assert_eq!(incidence.incident_type, expected);
                    }
                }
            }
        });
    }

    #[test]
    fn coincident_edges_overlap() {
        // two unit squares sharing the edge x = 1, traced as a single path
        let glass = Glass::new(
            BoundaryPath::polygon([
                [0., 0.],
                [1., 0.],
                [1., 1.],
                [0., 1.],
                [0., 0.5],
                [2., 0.5],
                [2., -0.5],
                [1., -0.5],
                [1., 1.],
                [0., 1.],
            ]),
            1.5,
        );

        with_ctx(|ctx| {
            let ray = far_ray([0.5, 0.8], [1.5, 0.9]);
            let incidence = glass.classify(&ray, ctx).unwrap();
            assert_relative_eq!(incidence.point, Point::new(1., 0.85), epsilon = 1e-9);
            assert_eq!(incidence.incident_type, IncidentType::Overlap);
        });
    }

    #[test]
    fn vertex_hits_are_undefined() {
        let glass = square();
        let ray = far_ray([1e-8, -1.], [1e-8, 0.]);

        with_ctx(|ctx| {
            let point = glass.intersect(&ray, ctx).unwrap();
            assert_abs_diff_eq!(point, Point::origin(), epsilon = 1e-7);

            let incidence = glass.classify(&ray, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::EdgeUndefined);

            let response = glass.respond(&ray, 0, &point, None, ctx);
            assert_eq!(response, Response::Absorbed);
            assert_eq!(ctx.undefined_behavior_count(), 1);
        });
    }

    #[test]
    fn inactive_glass_is_transparent() {
        let ray = far_ray([-1., 0.5], [0., 0.5]);

        with_ctx(|ctx| {
            let mut glass = square();
            glass.not_done = true;
            assert!(glass.intersect(&ray, ctx).is_none());

            let mut glass = square();
            glass.ref_index = 0.;
            assert!(glass.intersect(&ray, ctx).is_none());

            assert!(Glass::default().intersect(&ray, ctx).is_none());
        });
    }

    #[test]
    fn intersections_at_the_origin_are_ignored() {
        let glass = square();
        // starts on the left edge, heading inside
        let ray = far_ray([0., 0.5], [0.5, 0.5]);

        with_ctx(|ctx| {
            let point = glass.intersect(&ray, ctx).unwrap();
            assert_relative_eq!(point, Point::new(1., 0.5), epsilon = 1e-12);
        });
    }

    #[test]
    fn degenerate_arc_behaves_like_its_chord() {
        let flat = Glass::new(
            BoundaryPath::from(vec![
                PathVertex::new(0., 0.),
                PathVertex::arc(0.5, 0.),
                PathVertex::new(1., 0.),
                PathVertex::new(1., 1.),
                PathVertex::new(0., 1.),
            ]),
            1.5,
        );

        let ray = far_ray([0.3, -1.], [0.4, 0.]);

        with_ctx(|ctx| {
            let hit = flat.intersect(&ray, ctx).unwrap();
            assert_relative_eq!(hit, square().intersect(&ray, ctx).unwrap(), epsilon = 1e-12);

            let incidence = flat.classify(&ray, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::Entry);
        });
    }

    #[test]
    fn arc_normals_face_the_ray() {
        // a disk of radius 1 made of two half circles
        let disk = Glass::new(
            BoundaryPath::from(vec![
                PathVertex::new(0., -1.),
                PathVertex::arc(1., 0.),
                PathVertex::new(0., 1.),
                PathVertex::arc(-1., 0.),
            ]),
            1.5,
        );

        with_ctx(|ctx| {
            let entering = far_ray([-5., 0.2], [0., 0.2]);
            let incidence = disk.classify(&entering, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::Entry);
            assert!(incidence.normal.dot(&entering.direction()) < 0.);
            assert_relative_eq!(incidence.point.x, -(1. - 0.04f64).sqrt(), epsilon = 1e-12);

            let exiting = far_ray([0., 0.2], [1., 0.2]);
            let incidence = disk.classify(&exiting, ctx).unwrap();
            assert_eq!(incidence.incident_type, IncidentType::Exit);
            assert!(incidence.normal.dot(&exiting.direction()) < 0.);
        });
    }

    #[test]
    fn dispersion_depends_on_wavelength() {
        let glass = square();
        let settings = SceneSettings {
            simulate_colors: true,
            ..Default::default()
        };
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let ctx = SimulationCtx::new(&settings, &mut rng);

        let red = Ray::unpolarized([0., 0.], [1., 0.], 1.).with_wavelength(Some(RED_WAVELENGTH));
        let blue = red.clone().with_wavelength(Some(BLUE_WAVELENGTH));

        assert!(glass.ref_index_at(&blue, &ctx) > glass.ref_index_at(&red, &ctx));

        with_ctx(|ctx| assert_eq!(glass.ref_index_at(&blue, ctx), 1.5));
    }

    #[test]
    fn json_defaults() {
        let glass = Glass::from_json(&serde_json::json!({
            "path": [{ "x": 0., "y": 0. }, { "x": 1., "y": 0., "arc": true }, { "x": 0., "y": 1. }]
        }))
        .unwrap();

        assert_eq!(glass.ref_index, 1.5);
        assert_eq!(glass.cauchy_b, 0.004);
        assert!(!glass.not_done);
        assert!(glass.path.vertices()[1].arc);
        assert!(!glass.path.vertices()[2].arc);

        assert_eq!(Glass::from_json(&glass.to_json()).unwrap(), glass);
    }

    #[test]
    fn random_glasses_are_closed_bodies() {
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        for _ in 0..20 {
            let glass = Glass::random(&mut rng);
            assert!(glass.path.len() >= 3);
            assert!(glass.path.edges().count() >= 2);
            assert!(glass.ref_index > 1.);
        }
    }
}
