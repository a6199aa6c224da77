use std::{collections::HashMap, ops::Deref, sync::OnceLock};

use serde::Deserialize;

use super::*;

pub trait JsonTypeDyn {
    fn json_type_dyn(&self) -> String;
}

impl<T: JsonType + ?Sized> JsonTypeDyn for T {
    fn json_type_dyn(&self) -> String {
        Self::json_type()
    }
}

/// An optical object that can be written to, and read from, a scene file.
pub trait SceneObject: OpticalObject + JsonSer + JsonTypeDyn {}

impl<T: OpticalObject + JsonSer + JsonTypeDyn + ?Sized> SceneObject for T {}

/// Wraps an object to (de)serialize it along with its type:
///
/// ```json
/// {
///     "type": "string",
///     "data": // <layout depends on the value at "type">
/// }
/// ```
pub struct Dynamic<T>(pub T);

impl<T: Deref> JsonSer for Dynamic<T>
where
    T::Target: JsonTypeDyn + JsonSer,
{
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.0.deref().json_type_dyn(),
            "data": self.0.deref().to_json(),
        })
    }
}

fn boxed<T: SceneObject + 'static>(object: T) -> Box<dyn SceneObject> {
    Box::new(object)
}

type ObjectDeserializer = fn(&serde_json::Value) -> Result<Box<dyn SceneObject>, JsonError>;

impl JsonDes for Dynamic<Box<dyn SceneObject>> {
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        static DESERIALIZERS: OnceLock<HashMap<String, ObjectDeserializer>> = OnceLock::new();

        #[rustfmt::skip]
        let deserializers = DESERIALIZERS.get_or_init(|| HashMap::from([
            (
                Glass::json_type(),
                (|json| Glass::from_json(json).map(boxed)) as ObjectDeserializer,
            ),
            (
                Mirror::json_type(),
                |json| Mirror::from_json(json).map(boxed),
            ),
            (
                Blocker::json_type(),
                |json| Blocker::from_json(json).map(boxed),
            ),
            (
                SingleRay::json_type(),
                |json| SingleRay::from_json(json).map(boxed),
            ),
            (
                PointSource::json_type(),
                |json| PointSource::from_json(json).map(boxed),
            ),
        ]));

        let object_type = field(json, "type")?
            .as_str()
            .ok_or_else(|| JsonError::invalid("type", "must be a string"))?;

        let deserializer = deserializers
            .get(object_type)
            .ok_or_else(|| JsonError::UnknownType(object_type.into()))?;

        deserializer(field(json, "data")?).map(Self)
    }
}

impl Random for Dynamic<Box<dyn SceneObject>> {
    fn random(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        // glass bodies are twice as likely
        Self(match rng.gen_range(0usize..4) {
            0 | 1 => boxed(Glass::random(rng)),
            2 => boxed(Mirror::random(rng)),
            3 => boxed(Blocker::random(rng)),
            _ => unreachable!(),
        })
    }
}

/// Everything found in a scene file.
///
/// ```json
/// {
///     "settings": { "length_scale": 1.0, "simulate_colors": false, "ray_density": 0.1, "seed": 0 },
///     "config": { "ray_budget": 10000, "extension_distance": 10000.0, "min_brightness": 1e-6 },
///     "objects": [{ "type": "Glass", "data": { ... } }, ...],
///     "rays": [{ "p1": { "x": 0.0, "y": 0.0 }, "p2": { "x": 1.0, "y": 0.0 } }, ...]
/// }
/// ```
///
/// All fields are optional. `rays` may also be a single ray, or an object
/// holding an array of rays in its `newRays` field.
#[derive(Default)]
pub struct SceneFile {
    pub settings: SceneSettings,
    pub config: SimulatorConfig,
    pub objects: Vec<Box<dyn SceneObject>>,
    /// Rays added to the simulator before running it
    pub rays: Vec<Ray>,
}

impl SceneFile {
    /// Builds the scene and simulator described by this file.
    pub fn into_simulation(self) -> Result<(Scene, Simulator), ConfigError> {
        let mut scene = Scene::new(self.settings)?;
        let mut simulator = Simulator::new(self.config)?;

        for object in self.objects {
            scene.add_object(object);
        }

        for ray in self.rays {
            simulator.add_ray(ray);
        }

        Ok((scene, simulator))
    }
}

impl JsonDes for SceneFile {
    fn from_json(json: &serde_json::Value) -> Result<Self, JsonError> {
        let settings: SceneSettings = match json.get("settings") {
            Some(v) => SceneSettings::deserialize(v)?,
            None => SceneSettings::default(),
        };
        settings.validate()?;

        let config: SimulatorConfig = match json.get("config") {
            Some(v) => SimulatorConfig::deserialize(v)?,
            None => SimulatorConfig::default(),
        };
        config.validate()?;

        let objects = match json.get("objects") {
            Some(v) => map_json_array(v, |json| {
                Dynamic::<Box<dyn SceneObject>>::from_json(json).map(|d| d.0)
            })?,
            None => Vec::new(),
        };

        let rays = json
            .get("rays")
            .map(|v| emission_from_json(v).into_vec())
            .unwrap_or_default();

        Ok(Self {
            settings,
            config,
            objects,
            rays,
        })
    }
}

impl JsonSer for SceneFile {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "settings": self.settings,
            "config": self.config,
            "objects": Vec::from_iter(self.objects.iter().map(|o| Dynamic(&**o).to_json())),
            "rays": self.rays.to_json(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;
    use serde_json::json;

    #[test]
    fn unknown_types_are_errors() {
        let err = Dynamic::<Box<dyn SceneObject>>::from_json(&json!({
            "type": "Lens",
            "data": {},
        }))
        .err()
        .unwrap();

        assert!(matches!(err, JsonError::UnknownType(t) if t == "Lens"));
    }

    #[test]
    fn scene_files_round_trip() {
        let mut rng = Pcg64Mcg::seed_from_u64(21);

        let file = SceneFile {
            settings: SceneSettings {
                seed: 4,
                ..Default::default()
            },
            objects: (0..6)
                .map(|_| Dynamic::<Box<dyn SceneObject>>::random(&mut rng).0)
                .chain([boxed(PointSource::new([1., 2.])), boxed(SingleRay::new([0., 0.], [1., 0.]))])
                .collect(),
            rays: vec![Ray::unpolarized([0., 0.], [0., 1.], 1.)],
            ..Default::default()
        };

        let json = file.to_json();
        let back = SceneFile::from_json(&json).unwrap();

        assert_eq!(back.settings, file.settings);
        assert_eq!(back.config, file.config);
        assert_eq!(back.objects.len(), 8);
        assert_eq!(back.rays.len(), 1);
        assert_eq!(back.to_json(), json);
    }

    #[test]
    fn legacy_ray_shapes() {
        let file = SceneFile::from_json(&json!({
            "rays": { "newRays": [
                { "p1": { "x": 0., "y": 0. }, "p2": { "x": 1., "y": 0. }, "brightness_s": 0.5 },
                { "p2": { "x": 1., "y": 0. } },
            ] }
        }))
        .unwrap();

        assert_eq!(file.rays.len(), 1);
        assert!(file.objects.is_empty());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let err = SceneFile::from_json(&json!({ "settings": { "length_scale": -2.0 } }))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            JsonError::Config(ConfigError::InvalidLengthScale(_))
        ));
    }
}
