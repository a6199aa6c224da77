use std::fmt;

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("length scale must be positive and finite, got {0}")]
    InvalidLengthScale(Float),
    #[error("ray density must be finite and at least 1e-4, got {0}")]
    InvalidRayDensity(Float),
    #[error("extension distance must be positive and finite, got {0}")]
    InvalidExtensionDistance(Float),
}

/// Smallest angle between rays emitted by point sources, about 63 000 rays per source.
pub const MIN_RAY_DENSITY: Float = 1e-4;

/// Global parameters of a [`Scene`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Scales the geometric tolerances used by the objects of the scene
    pub length_scale: Float,
    /// Whether refractive indices depend on the wavelength of rays
    pub simulate_colors: bool,
    /// Angle, in radians, between two consecutive rays emitted by point sources
    pub ray_density: Float,
    pub seed: u64,
}

impl Default for SceneSettings {
    #[inline]
    fn default() -> Self {
        Self {
            length_scale: 1.,
            simulate_colors: false,
            ray_density: 0.1,
            seed: 0,
        }
    }
}

impl SceneSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = |x: Float| x.is_finite() && x > 0.;

        if !valid(self.length_scale) {
            return Err(ConfigError::InvalidLengthScale(self.length_scale));
        }

        if !(self.ray_density.is_finite() && self.ray_density >= MIN_RAY_DENSITY) {
            return Err(ConfigError::InvalidRayDensity(self.ray_density));
        }

        Ok(())
    }
}

/// An ordered collection of optical objects, along with the state they share
/// during a simulation.
pub struct Scene {
    objects: Vec<Box<dyn OpticalObject>>,
    settings: SceneSettings,
    rng: Pcg64Mcg,
    /// Set when a simulation fails to complete
    pub error: Option<String>,
    /// Set when a simulation returns partial results
    pub warning: Option<String>,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .field("settings", &self.settings)
            .field("error", &self.error)
            .field("warning", &self.warning)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    #[inline]
    fn default() -> Self {
        let settings = SceneSettings::default();
        Self {
            objects: Vec::new(),
            rng: Pcg64Mcg::seed_from_u64(settings.seed),
            settings,
            error: None,
            warning: None,
        }
    }
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Result<Self, ConfigError> {
        settings.validate()?;

        Ok(Self {
            objects: Vec::new(),
            rng: Pcg64Mcg::seed_from_u64(settings.seed),
            settings,
            error: None,
            warning: None,
        })
    }

    #[inline]
    pub fn add_object(&mut self, object: impl OpticalObject + 'static) {
        self.add_boxed(Box::new(object));
    }

    #[inline]
    pub fn add_boxed(&mut self, object: Box<dyn OpticalObject>) {
        self.objects.push(object);
    }

    #[inline]
    pub fn with_object(mut self, object: impl OpticalObject + 'static) -> Self {
        self.add_object(object);
        self
    }

    #[inline]
    pub fn objects(&self) -> &[Box<dyn OpticalObject>] {
        &self.objects
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    #[inline]
    pub fn set_seed(&mut self, seed: u64) {
        self.settings.seed = seed;
        self.reseed();
    }

    /// Resets the scene's random generator to the state given by its seed.
    #[inline]
    pub fn reseed(&mut self) {
        self.rng = Pcg64Mcg::seed_from_u64(self.settings.seed);
    }

    #[inline]
    pub fn clear_diagnostics(&mut self) {
        self.error = None;
        self.warning = None;
    }

    /// Borrows the objects of this scene, and the context they are simulated in.
    #[inline]
    pub fn split(&mut self) -> (&[Box<dyn OpticalObject>], SimulationCtx<'_>) {
        (
            self.objects.as_slice(),
            SimulationCtx::new(&self.settings, &mut self.rng),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn rejects_bad_length_scales() {
        for length_scale in [0., -1., Float::NAN, Float::INFINITY] {
            let settings = SceneSettings {
                length_scale,
                ..Default::default()
            };
            assert!(matches!(
                Scene::new(settings),
                Err(ConfigError::InvalidLengthScale(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_ray_densities() {
        let settings = SceneSettings {
            ray_density: 0.,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidRayDensity(0.))
        );

        // would emit billions of rays per point source
        let settings = SceneSettings {
            ray_density: 1e-12,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidRayDensity(1e-12))
        );

        let settings = SceneSettings {
            ray_density: MIN_RAY_DENSITY,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn reseeding_replays_the_generator() {
        let mut scene = Scene::default();
        scene.set_seed(42);

        let first: [f64; 4] = {
            let (_, mut ctx) = scene.split();
            std::array::from_fn(|_| ctx.rng().gen())
        };

        scene.reseed();

        let second: [f64; 4] = {
            let (_, mut ctx) = scene.split();
            std::array::from_fn(|_| ctx.rng().gen())
        };

        assert_eq!(first, second);
    }

    #[test]
    fn settings_fill_in_defaults() {
        let settings: SceneSettings = serde_json::from_str(r#"{"seed": 3}"#).unwrap();
        assert_eq!(
            settings,
            SceneSettings {
                seed: 3,
                ..Default::default()
            }
        );
    }
}
