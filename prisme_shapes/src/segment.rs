use super::*;

/// Where `ray` hits the segment `[p1, p2]`, if it does.
#[inline]
fn segment_hit(segment: &Line, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
    segment
        .segment_ray_intersection(&Line::from(ray))
        .and_then(|p| ctx.nearest_hit(&ray.p1, [p]))
}

fn segment_from_json(json: &serde_json::Value) -> Result<Line, JsonError> {
    Ok(Line::new(point_field(json, "p1")?, point_field(json, "p2")?))
}

fn segment_to_json(segment: &Line) -> serde_json::Value {
    serde_json::json!({
        "p1": point_to_json(&segment.p1),
        "p2": point_to_json(&segment.p2),
    })
}

fn random_segment(rng: &mut (impl rand::Rng + ?Sized)) -> Line {
    let p1 = rand_point(rng, SCENE_HALF_EXTENT);
    let length = rng.gen_range(10.0..80.0);
    Line::new(p1, p1 + rand_unit(rng).as_ref() * length)
}

/// A flat, two-sided, perfectly reflective segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mirror {
    pub segment: Line,
}

impl Mirror {
    #[inline]
    #[must_use]
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self {
            segment: Line::new(p1, p2),
        }
    }
}

impl OpticalObject for Mirror {
    fn intersect(&self, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
        segment_hit(&self.segment, ray, ctx)
    }

    fn respond(
        &self,
        ray: &Ray,
        _ray_index: usize,
        incident_point: &Point,
        _merging: Option<&SurfaceMerging>,
        _ctx: &mut SimulationCtx,
    ) -> Response {
        let d = self.segment.direction();

        let Some(normal) = Unit::try_new(Vector::new(-d.y, d.x), Float::EPSILON) else {
            return Response::Absorbed;
        };

        let dir = reflect(&ray.direction(), &normal);
        Response::Single(ray.redirected(*incident_point, &dir))
    }
}

impl JsonType for Mirror {
    fn json_type() -> String {
        "Mirror".into()
    }
}

impl JsonDes for Mirror {
    /// Deserialize a new mirror from a JSON object.
    ///
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "p1": { "x": 0.0, "y": 0.0 },
    ///     "p2": { "x": 1.0, "y": 0.0 },
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        segment_from_json(json).map(|segment| Self { segment })
    }
}

impl JsonSer for Mirror {
    fn to_json(&self) -> serde_json::Value {
        segment_to_json(&self.segment)
    }
}

impl Random for Mirror {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            segment: random_segment(rng),
        }
    }
}

/// A segment absorbing all incident light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blocker {
    pub segment: Line,
}

impl Blocker {
    #[inline]
    #[must_use]
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self {
            segment: Line::new(p1, p2),
        }
    }
}

impl OpticalObject for Blocker {
    fn intersect(&self, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
        segment_hit(&self.segment, ray, ctx)
    }
}

impl JsonType for Blocker {
    fn json_type() -> String {
        "Blocker".into()
    }
}

impl JsonDes for Blocker {
    /// Same format as [`Mirror::from_json`]
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        segment_from_json(json).map(|segment| Self { segment })
    }
}

impl JsonSer for Blocker {
    fn to_json(&self) -> serde_json::Value {
        segment_to_json(&self.segment)
    }
}

impl Random for Blocker {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            segment: random_segment(rng),
        }
    }
}
