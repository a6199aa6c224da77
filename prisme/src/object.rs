use std::{ops::Deref, rc::Rc, sync::Arc};

use log::debug;
use rand_pcg::Pcg64Mcg;

use super::*;

/// Reserved hook for coalescing coincident boundaries of adjacent bodies.
///
/// Never constructed for now, objects receive `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct SurfaceMerging;

/// What happens to a ray hitting an [`OpticalObject`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Response {
    #[default]
    Absorbed,
    Single(Ray),
    Many(Vec<Ray>),
}

/// The rays emitted by an [`OpticalObject`] when a simulation starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Emission {
    #[default]
    None,
    Single(Ray),
    Many(Vec<Ray>),
}

macro_rules! ray_collection {
    ($name:ident, $empty:ident) => {
        impl $name {
            #[inline]
            #[must_use]
            pub fn len(&self) -> usize {
                match self {
                    Self::$empty => 0,
                    Self::Single(_) => 1,
                    Self::Many(rays) => rays.len(),
                }
            }

            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            #[inline]
            #[must_use]
            pub fn into_vec(self) -> Vec<Ray> {
                match self {
                    Self::$empty => Vec::new(),
                    Self::Single(ray) => vec![ray],
                    Self::Many(rays) => rays,
                }
            }
        }

        impl IntoIterator for $name {
            type Item = Ray;
            type IntoIter = std::vec::IntoIter<Ray>;

            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.into_vec().into_iter()
            }
        }

        impl From<Ray> for $name {
            #[inline]
            fn from(ray: Ray) -> Self {
                Self::Single(ray)
            }
        }

        impl From<Vec<Ray>> for $name {
            #[inline]
            fn from(rays: Vec<Ray>) -> Self {
                Self::Many(rays)
            }
        }

        impl FromIterator<Ray> for $name {
            #[inline]
            fn from_iter<I: IntoIterator<Item = Ray>>(iter: I) -> Self {
                Self::Many(iter.into_iter().collect())
            }
        }
    };
}

ray_collection!(Response, Absorbed);
ray_collection!(Emission, None);

/// Everything an [`OpticalObject`] may need from its scene while a ray is being traced.
pub struct SimulationCtx<'a> {
    settings: &'a SceneSettings,
    rng: &'a mut Pcg64Mcg,
    undefined_behavior: usize,
}

impl<'a> SimulationCtx<'a> {
    #[inline]
    pub fn new(settings: &'a SceneSettings, rng: &'a mut Pcg64Mcg) -> Self {
        Self {
            settings,
            rng,
            undefined_behavior: 0,
        }
    }

    #[inline]
    pub fn settings(&self) -> &SceneSettings {
        self.settings
    }

    #[inline]
    pub fn length_scale(&self) -> Float {
        self.settings.length_scale
    }

    #[inline]
    pub fn simulate_colors(&self) -> bool {
        self.settings.simulate_colors
    }

    #[inline]
    pub fn ray_density(&self) -> Float {
        self.settings.ray_density
    }

    /// Squared distance under which two points are considered the same,
    /// scaled by the scene's length scale.
    #[inline]
    pub fn min_segment_length_squared(&self) -> Float {
        let l = MIN_RAY_SEGMENT_LENGTH * self.length_scale();
        l * l
    }

    /// The scene's seeded random generator.
    #[inline]
    pub fn rng(&mut self) -> &mut Pcg64Mcg {
        self.rng
    }

    /// Reports that a ray hit an object somewhere its behavior isn't defined.
    #[inline]
    pub fn flag_undefined_behavior(&mut self, incident_point: &Point) {
        debug!(
            "undefined behavior at ({}, {}), ray absorbed",
            incident_point.x, incident_point.y
        );
        self.undefined_behavior += 1;
    }

    #[inline]
    pub fn undefined_behavior_count(&self) -> usize {
        self.undefined_behavior
    }

    /// Among `candidates`, returns the point closest to `origin`, ignoring those
    /// closer than the (scaled) minimum segment length.
    #[inline]
    pub fn nearest_hit(
        &self,
        origin: &Point,
        candidates: impl IntoIterator<Item = Point>,
    ) -> Option<Point> {
        let min = self.min_segment_length_squared();

        candidates
            .into_iter()
            .map(|p| (nalgebra::distance_squared(origin, &p), p))
            .filter(|(d, _)| *d > min)
            .fold(None, |closest: Option<(Float, Point)>, (d, p)| match closest {
                Some((c, _)) if c <= d => closest,
                _ => Some((d, p)),
            })
            .map(|(_, p)| p)
    }
}

/// The core trait of this library, implemented by every member of a [`Scene`].
///
/// All methods have defaults making the object inert: a type implementing none
/// of them neither emits, intersects nor alters any ray.
pub trait OpticalObject {
    /// Whether rays should be tested against this object at all.
    #[inline]
    fn is_optical(&self) -> bool {
        true
    }

    /// Returns the point where `ray` (the half-line starting at `ray.p1`, passing
    /// through `ray.p2`) first hits this object, if any.
    ///
    /// Implementors should discard points closer to `ray.p1` than
    /// [`ctx.min_segment_length_squared()`](SimulationCtx::min_segment_length_squared)
    /// to avoid hitting the point the ray originates from.
    #[inline]
    fn intersect(&self, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
        let _ = (ray, ctx);
        None
    }

    /// Computes the rays resulting from `ray` hitting this object at `incident_point`.
    ///
    /// `ray` is given as it was before being truncated: it starts at its origin and
    /// points far beyond `incident_point`. `ray_index` is the number of rays
    /// processed before this one during the current simulation.
    #[inline]
    fn respond(
        &self,
        ray: &Ray,
        ray_index: usize,
        incident_point: &Point,
        merging: Option<&SurfaceMerging>,
        ctx: &mut SimulationCtx,
    ) -> Response {
        let _ = (ray, ray_index, incident_point, merging, ctx);
        Response::Absorbed
    }

    /// Called once per object, in scene order, at the start of a simulation.
    /// Returns the rays this object emits.
    #[inline]
    fn on_simulation_start(&self, ctx: &mut SimulationCtx) -> Emission {
        let _ = ctx;
        Emission::None
    }
}

// It's clear that all these impls use the `Deref` trait, but writing a blanket impl over all types implementing `Deref`
// makes it impossible to implement it for new types downstream.

macro_rules! forward_optical_object {
    ($($t:ty),*) => {$(
        impl<T: OpticalObject + ?Sized> OpticalObject for $t {
            #[inline]
            fn is_optical(&self) -> bool {
                self.deref().is_optical()
            }

            #[inline]
            fn intersect(&self, ray: &Ray, ctx: &SimulationCtx) -> Option<Point> {
                self.deref().intersect(ray, ctx)
            }

            #[inline]
            fn respond(
                &self,
                ray: &Ray,
                ray_index: usize,
                incident_point: &Point,
                merging: Option<&SurfaceMerging>,
                ctx: &mut SimulationCtx,
            ) -> Response {
                self.deref()
                    .respond(ray, ray_index, incident_point, merging, ctx)
            }

            #[inline]
            fn on_simulation_start(&self, ctx: &mut SimulationCtx) -> Emission {
                self.deref().on_simulation_start(ctx)
            }
        }
    )*};
}

forward_optical_object!(Box<T>, Rc<T>, Arc<T>, &T);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Inert;

    impl OpticalObject for Inert {}

    #[test]
    fn defaults_are_inert() {
        let settings = SceneSettings::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let mut ctx = SimulationCtx::new(&settings, &mut rng);

        let ray = Ray::unpolarized([0., 0.], [1., 0.], 1.);
        let obj: Box<dyn OpticalObject> = Box::new(Inert);

        assert!(obj.is_optical());
        assert!(obj.intersect(&ray, &ctx).is_none());
        assert!(obj.on_simulation_start(&mut ctx).is_empty());
        assert_eq!(
            obj.respond(&ray, 0, &Point::new(1., 0.), None, &mut ctx),
            Response::Absorbed
        );
    }

    #[test]
    fn nearest_hit_skips_points_at_the_origin() {
        let settings = SceneSettings::default();
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let ctx = SimulationCtx::new(&settings, &mut rng);

        let origin = Point::new(0., 0.);
        let hit = ctx.nearest_hit(
            &origin,
            [
                Point::new(1e-8, 0.),
                Point::new(3., 0.),
                Point::new(2., 0.),
                Point::new(5., 0.),
            ],
        );
        assert_eq!(hit, Some(Point::new(2., 0.)));
        assert_eq!(ctx.nearest_hit(&origin, [Point::new(0., 1e-9)]), None);
    }

    #[test]
    fn min_segment_length_follows_the_length_scale() {
        let settings = SceneSettings {
            length_scale: 10.,
            ..Default::default()
        };
        let mut rng = Pcg64Mcg::seed_from_u64(0);
        let ctx = SimulationCtx::new(&settings, &mut rng);

        approx::assert_relative_eq!(ctx.min_segment_length_squared(), 1e-10);
    }

    #[test]
    fn response_flattens_in_order() {
        let a = Ray::unpolarized([0., 0.], [1., 0.], 1.);
        let b = Ray::unpolarized([0., 0.], [0., 1.], 1.);

        assert!(Response::Absorbed.into_vec().is_empty());
        assert_eq!(Response::Single(a.clone()).len(), 1);

        let rays = Response::Many(vec![a.clone(), b.clone()]).into_vec();
        assert_eq!(rays, vec![a, b]);
    }
}
