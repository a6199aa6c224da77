use super::*;

/// Reflected rays dimmer than this are not emitted by [`refract`].
pub const MIN_REFLECTED_BRIGHTNESS: Float = 0.01;

/// Applies Snell's law and Fresnel's equations to `ray`, hitting an interface at
/// `incident_point`.
///
/// `normal` needn't be normalized, but must point towards the side `ray` comes from.
/// `n1` is the ratio of the refractive index of the medium `ray` travels in, over that
/// of the medium it enters.
///
/// Returns the reflected ray alone in case of total internal reflection. Otherwise,
/// the reflected ray (only if it is bright enough), followed by the refracted one.
#[must_use]
pub fn refract(ray: &Ray, incident_point: &Point, normal: &Vector, n1: Float) -> Response {
    let (Some(r), Some(n)) = (ray.unit_direction(), Unit::try_new(*normal, Float::EPSILON))
    else {
        return Response::Absorbed;
    };

    let (r, n) = (r.as_ref(), n.as_ref());

    let cos1 = -n.dot(r);
    let sq1 = 1. - n1 * n1 * (1. - cos1 * cos1);

    if sq1 < 0. {
        // total internal reflection
        return Response::Single(ray.redirected(*incident_point, &(r + n * (2. * cos1))));
    }

    let cos2 = sq1.sqrt();

    let r_s = ((n1 * cos1 - cos2) / (n1 * cos1 + cos2)).powi(2);
    let r_p = ((n1 * cos2 - cos1) / (n1 * cos2 + cos1)).powi(2);

    let mut reflected = ray.redirected(*incident_point, &(r + n * (2. * cos1)));
    reflected.brightness_s *= r_s;
    reflected.brightness_p *= r_p;

    let mut refracted = ray.redirected(*incident_point, &(r * n1 + n * (n1 * cos1 - cos2)));
    refracted.brightness_s *= 1. - r_s;
    refracted.brightness_p *= 1. - r_p;

    if reflected.total_brightness() > MIN_REFLECTED_BRIGHTNESS {
        Response::Many(vec![reflected, refracted])
    } else {
        Response::Single(refracted)
    }
}

/// Refractive index at `wavelength` (in nm) according to Cauchy's equation,
/// with `b` in µm².
#[inline]
#[must_use]
pub fn cauchy_index(a: Float, b: Float, wavelength: Float) -> Float {
    a + b / (wavelength * wavelength * 1e-6)
}
