use prisme::*;

use nalgebra::Unit;

use core::iter;

/// Half the side of the square random scenes are generated in.
pub const SCENE_HALF_EXTENT: Float = 200.;

pub trait Random: Sized {
    /// Generate a randomized version of this object using the provided `rng`
    ///
    /// This method must not fail. If creating an object is faillible, keep trying until success
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self;
}

impl Random for Ray {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let origin = rand_point(rng, SCENE_HALF_EXTENT);
        let direction = rand_unit(rng);
        let brightness = rng.gen_range(0.1..=1.0);

        Ray::unpolarized(origin, origin + direction.as_ref(), brightness)
    }
}

/// `n` randomly generated values.
pub fn rand_vec<T: Random>(n: usize, rng: &mut (impl rand::Rng + ?Sized)) -> Vec<T> {
    iter::repeat_with(|| T::random(rng)).take(n).collect()
}

pub fn rand_vect(rng: &mut (impl rand::Rng + ?Sized), max_coord_mag: Float) -> Vector {
    // the rng generates floats in 0.0..1.0, scale and translate the range accordingly

    Vector::from_fn(|_, _| (rng.gen::<Float>() - 0.5) * (max_coord_mag.abs() * 2.0))
}

#[inline]
pub fn rand_point(rng: &mut (impl rand::Rng + ?Sized), max_coord_mag: Float) -> Point {
    rand_vect(rng, max_coord_mag).into()
}

/// A uniformly distributed unit vector.
pub fn rand_unit(rng: &mut (impl rand::Rng + ?Sized)) -> Unit<Vector> {
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    Unit::new_unchecked(Vector::new(angle.cos(), angle.sin()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn random_rays_are_well_formed() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);

        for _ in 0..100 {
            let ray = Ray::random(&mut rng);
            assert!(ray.is_well_formed());
            assert!(ray.p1.x.abs() <= SCENE_HALF_EXTENT);
            assert!(ray.p1.y.abs() <= SCENE_HALF_EXTENT);
            assert!(ray.total_brightness() > 0.);
        }
    }

    #[test]
    fn same_seed_same_rays() {
        let mut a = Pcg64Mcg::seed_from_u64(9);
        let mut b = Pcg64Mcg::seed_from_u64(9);

        let rays_a: Vec<Ray> = rand_vec(16, &mut a);
        let rays_b: Vec<Ray> = rand_vec(16, &mut b);
        assert_eq!(rays_a.len(), 16);
        assert_eq!(rays_a, rays_b);
    }
}
