use std::ops::Deref;

use log::warn;
use prisme::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use serde_json;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown object type `{0}`")]
    UnknownType(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl JsonError {
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Returns `json[name]`, or an error if the field doesn't exist.
#[inline]
pub fn field<'a>(json: &'a Value, name: &'static str) -> Result<&'a Value, JsonError> {
    json.get(name).ok_or(JsonError::MissingField(name))
}

#[inline]
pub fn float_field(json: &Value, name: &'static str) -> Result<Float, JsonError> {
    field(json, name)?
        .as_f64()
        .filter(|x| x.is_finite())
        .ok_or_else(|| JsonError::invalid(name, "expected a finite number"))
}

/// Like [`float_field`], but returns `default` if the field is absent.
#[inline]
pub fn float_field_or(json: &Value, name: &'static str, default: Float) -> Result<Float, JsonError> {
    if json.get(name).is_some() {
        float_field(json, name)
    } else {
        Ok(default)
    }
}

#[inline]
pub fn bool_field_or(json: &Value, name: &'static str, default: bool) -> Result<bool, JsonError> {
    json.get(name).map_or(Ok(default), |v| {
        v.as_bool()
            .ok_or_else(|| JsonError::invalid(name, "expected a boolean"))
    })
}

/// Reads a point from a `{"x": ..., "y": ...}` object.
#[inline]
pub fn json_to_point(json: &Value) -> Option<Point> {
    let x = json.get("x")?.as_f64()?;
    let y = json.get("y")?.as_f64()?;
    (x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
}

#[inline]
pub fn point_field(json: &Value, name: &'static str) -> Result<Point, JsonError> {
    json_to_point(field(json, name)?)
        .ok_or_else(|| JsonError::invalid(name, "expected an object with finite `x` and `y`"))
}

#[inline]
pub fn point_to_json(p: &Point) -> Value {
    serde_json::json!({ "x": p.x, "y": p.y })
}

pub fn map_json_array<C: FromIterator<T>, T>(
    json: &Value,
    map: impl FnMut(&Value) -> Result<T, JsonError>,
) -> Result<C, JsonError> {
    json.as_array()
        .ok_or_else(|| JsonError::invalid("array", "json value must be an array"))?
        .iter()
        .map(map)
        .collect()
}

pub trait JsonType {
    /// Returns a string, unique to the type, found in the "type" field of the json
    /// representation of a "dynamic" object containing an object of this type
    fn json_type() -> String;
}

pub trait JsonSer {
    /// Serialize `self` into a JSON object.
    fn to_json(&self) -> Value;
}

impl<T: JsonSer> JsonSer for [T] {
    fn to_json(&self) -> Value {
        Value::Array(Vec::from_iter(self.iter().map(T::to_json)))
    }
}

// It's clear that all these impls use the `Deref` trait, but writing a blanket impl over all
// types implementing `Deref` makes the trait unusable downstream

impl<T: JsonSer + ?Sized> JsonSer for Box<T> {
    fn to_json(&self) -> Value {
        self.deref().to_json()
    }
}

impl<T: JsonSer> JsonSer for Vec<T> {
    fn to_json(&self) -> Value {
        self.as_slice().to_json()
    }
}

impl<T: JsonSer + ?Sized> JsonSer for &T {
    fn to_json(&self) -> Value {
        (*self).to_json()
    }
}

pub trait JsonDes {
    /// Deserialize from a JSON object.
    ///
    /// Returns an error if `json`'s format or values are invalid.
    fn from_json(json: &Value) -> Result<Self, JsonError>
    where
        Self: Sized;
}

impl<T: JsonDes> JsonDes for Vec<T> {
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        map_json_array(json, T::from_json)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonPoint {
    pub x: Float,
    pub y: Float,
}

impl From<Point> for JsonPoint {
    #[inline]
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<JsonPoint> for Point {
    #[inline]
    fn from(JsonPoint { x, y }: JsonPoint) -> Self {
        Point::new(x, y)
    }
}

#[inline]
fn default_is_new() -> bool {
    true
}

/// The JSON representation of a ray, as emitted by sources, or found in scene files.
///
/// ```json
/// {
///     "p1": { "x": 0.0, "y": 0.0 },
///     "p2": { "x": 1.0, "y": 0.0 },
///     "brightness_s": 0.5, // optional, defaults to 0
///     "brightness_p": 0.5, // optional, defaults to 0
///     "wavelength": 532.0, // optional
///     "gap": false,        // optional
///     "isNew": true        // optional, `is_new` also accepted
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RayDescriptor {
    pub p1: JsonPoint,
    pub p2: JsonPoint,
    #[serde(default)]
    pub brightness_s: Float,
    #[serde(default)]
    pub brightness_p: Float,
    #[serde(default)]
    pub wavelength: Option<Float>,
    #[serde(default)]
    pub gap: bool,
    #[serde(default = "default_is_new", alias = "isNew", skip_serializing)]
    pub is_new: bool,
}

impl From<&Ray> for RayDescriptor {
    fn from(ray: &Ray) -> Self {
        Self {
            p1: ray.p1.into(),
            p2: ray.p2.into(),
            brightness_s: ray.brightness_s,
            brightness_p: ray.brightness_p,
            wavelength: ray.wavelength,
            gap: ray.gap,
            is_new: ray.is_new,
        }
    }
}

impl TryFrom<RayDescriptor> for Ray {
    type Error = JsonError;

    fn try_from(desc: RayDescriptor) -> Result<Self, Self::Error> {
        let finite = |p: &JsonPoint| p.x.is_finite() && p.y.is_finite();

        if !finite(&desc.p1) {
            return Err(JsonError::invalid("p1", "non-finite coordinates"));
        }
        if !finite(&desc.p2) {
            return Err(JsonError::invalid("p2", "non-finite coordinates"));
        }

        let mut ray = Ray::new(
            desc.p1,
            desc.p2,
            desc.brightness_s,
            desc.brightness_p,
            desc.wavelength,
        );
        ray.gap = desc.gap;
        ray.is_new = desc.is_new;
        Ok(ray)
    }
}

impl JsonSer for Ray {
    /// Serialize a ray segment into a JSON object.
    ///
    /// The format of the returned object is explained in [`RayDescriptor`]
    fn to_json(&self) -> Value {
        serde_json::json!({
            "p1": point_to_json(&self.p1),
            "p2": point_to_json(&self.p2),
            "brightness_s": self.brightness_s,
            "brightness_p": self.brightness_p,
            "wavelength": self.wavelength,
            "gap": self.gap,
        })
    }
}

impl JsonDes for Ray {
    fn from_json(json: &Value) -> Result<Self, JsonError> {
        for name in ["p1", "p2"] {
            if json.get(name).is_none() {
                return Err(JsonError::MissingField(name));
            }
        }

        RayDescriptor::deserialize(json)?.try_into()
    }
}

/// Converts the rays emitted by an object into an [`Emission`].
///
/// `json` may be a single ray, an array of rays, or an object whose `newRays`
/// field is an array of rays. Invalid rays are skipped.
pub fn emission_from_json(json: &Value) -> Emission {
    let parse = |json: &Value| {
        Ray::from_json(json)
            .inspect_err(|e| warn!("dropping malformed ray descriptor: {e}"))
            .ok()
    };

    let rays = match json {
        Value::Null => return Emission::None,
        Value::Array(rays) => rays,
        Value::Object(map) => match map.get("newRays") {
            Some(Value::Array(rays)) => rays,
            Some(_) => {
                warn!("dropping emission: `newRays` must be an array");
                return Emission::None;
            }
            None => return parse(json).map_or(Emission::None, Emission::Single),
        },
        _ => {
            warn!("dropping emission: expected a ray, or an array of rays");
            return Emission::None;
        }
    };

    rays.iter().filter_map(parse).collect()
}

/// Serializes the traced segments of a simulation.
#[inline]
pub fn serialize_segments(segments: &[Ray]) -> Value {
    segments.to_json()
}
