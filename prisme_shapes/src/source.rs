use std::f64::consts::TAU;

use super::*;

/// Emits a single ray, from `p1`, towards `p2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingleRay {
    pub p1: Point,
    pub p2: Point,
    pub brightness: Float,
    /// Only taken into account if the scene simulates colors
    pub wavelength: Float,
}

impl SingleRay {
    #[inline]
    #[must_use]
    pub fn new(p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self {
            p1: p1.into(),
            p2: p2.into(),
            brightness: 1.,
            wavelength: GREEN_WAVELENGTH,
        }
    }
}

#[inline]
fn emitted_wavelength(wavelength: Float, ctx: &SimulationCtx) -> Option<Float> {
    ctx.simulate_colors().then_some(wavelength)
}

impl OpticalObject for SingleRay {
    fn is_optical(&self) -> bool {
        false
    }

    fn on_simulation_start(&self, ctx: &mut SimulationCtx) -> Emission {
        Emission::Single(
            Ray::unpolarized(self.p1, self.p2, self.brightness)
                .with_wavelength(emitted_wavelength(self.wavelength, ctx)),
        )
    }
}

impl JsonType for SingleRay {
    fn json_type() -> String {
        "SingleRay".into()
    }
}

impl JsonDes for SingleRay {
    /// Deserialize a new ray source from a JSON object.
    ///
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "p1": { "x": 0.0, "y": 0.0 },
    ///     "p2": { "x": 1.0, "y": 0.0 },
    ///     "brightness": 1.0,   // optional
    ///     "wavelength": 532.0, // optional
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        let p1 = point_field(json, "p1")?;
        let p2 = point_field(json, "p2")?;

        if p1 == p2 {
            return Err(JsonError::invalid("p2", "must be distinct from p1"));
        }

        Ok(Self {
            p1,
            p2,
            brightness: float_field_or(json, "brightness", 1.)?,
            wavelength: float_field_or(json, "wavelength", GREEN_WAVELENGTH)?,
        })
    }
}

impl JsonSer for SingleRay {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "p1": point_to_json(&self.p1),
            "p2": point_to_json(&self.p2),
            "brightness": self.brightness,
            "wavelength": self.wavelength,
        })
    }
}

impl Random for SingleRay {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let ray = Ray::random(rng);
        Self {
            brightness: ray.total_brightness(),
            wavelength: rng.gen_range(400.0..700.0),
            ..Self::new(ray.p1, ray.p2)
        }
    }
}

/// Emits rays in all directions, evenly spaced by the scene's ray density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointSource {
    pub center: Point,
    /// Brightness of each emitted ray
    pub brightness: Float,
    /// Only taken into account if the scene simulates colors
    pub wavelength: Float,
}

impl PointSource {
    #[inline]
    #[must_use]
    pub fn new(center: impl Into<Point>) -> Self {
        Self {
            center: center.into(),
            brightness: 0.5,
            wavelength: GREEN_WAVELENGTH,
        }
    }
}

impl OpticalObject for PointSource {
    fn is_optical(&self) -> bool {
        false
    }

    fn on_simulation_start(&self, ctx: &mut SimulationCtx) -> Emission {
        let n = (TAU / ctx.ray_density()).ceil() as usize;
        let step = TAU / n as Float;
        let wavelength = emitted_wavelength(self.wavelength, ctx);

        (0..n)
            .map(|i| {
                let a = i as Float * step;
                let dir = Vector::new(a.cos(), a.sin());
                Ray::unpolarized(self.center, self.center + dir, self.brightness)
                    .with_wavelength(wavelength)
            })
            .collect()
    }
}

impl JsonType for PointSource {
    fn json_type() -> String {
        "PointSource".into()
    }
}

impl JsonDes for PointSource {
    /// Deserialize a new point source from a JSON object.
    ///
    /// The JSON object must follow the following format:
    ///
    /// ```json
    /// {
    ///     "center": { "x": 0.0, "y": 0.0 },
    ///     "brightness": 0.5,   // optional
    ///     "wavelength": 532.0, // optional
    /// }
    /// ```
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        Ok(Self {
            center: point_field(json, "center")?,
            brightness: float_field_or(json, "brightness", 0.5)?,
            wavelength: float_field_or(json, "wavelength", GREEN_WAVELENGTH)?,
        })
    }
}

impl JsonSer for PointSource {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "center": point_to_json(&self.center),
            "brightness": self.brightness,
            "wavelength": self.wavelength,
        })
    }
}

impl Random for PointSource {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        Self {
            center: rand_point(rng, SCENE_HALF_EXTENT),
            brightness: rng.gen_range(0.1..=1.0),
            wavelength: rng.gen_range(400.0..700.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn point_sources_follow_the_ray_density() {
        let settings = SceneSettings {
            ray_density: TAU / 8.,
            ..Default::default()
        };
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut ctx = SimulationCtx::new(&settings, &mut rng);

        let rays = PointSource::new([2., 3.]).on_simulation_start(&mut ctx).into_vec();
        assert_eq!(rays.len(), 8);

        for (i, ray) in rays.iter().enumerate() {
            assert_eq!(ray.p1, Point::new(2., 3.));
            assert_relative_eq!(ray.direction().norm(), 1., epsilon = 1e-12);
            assert_relative_eq!(ray.total_brightness(), 0.5);
            assert_eq!(ray.wavelength, None);

            let a = ray.direction().y.atan2(ray.direction().x).rem_euclid(TAU);
            assert_relative_eq!(a, i as Float * TAU / 8., epsilon = 1e-9);
        }
    }

    #[test]
    fn wavelengths_only_with_colors() {
        let settings = SceneSettings {
            simulate_colors: true,
            ..Default::default()
        };
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut ctx = SimulationCtx::new(&settings, &mut rng);

        let source = SingleRay {
            wavelength: 450.,
            ..SingleRay::new([0., 0.], [1., 1.])
        };
        let Emission::Single(ray) = source.on_simulation_start(&mut ctx) else {
            panic!("expected a single ray");
        };
        assert_eq!(ray.wavelength, Some(450.));
        assert!(!source.is_optical());
    }

    #[test]
    fn degenerate_single_rays_are_rejected() {
        let json = serde_json::json!({ "p1": { "x": 1., "y": 1. }, "p2": { "x": 1., "y": 1. } });
        assert!(SingleRay::from_json(&json).is_err());
    }
}
