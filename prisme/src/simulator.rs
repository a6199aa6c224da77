use std::collections::VecDeque;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::*;

/// Parameters bounding the work done by a [`Simulator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Maximum number of rays processed in one run
    pub ray_budget: usize,
    /// Length rays are extended to before searching for intersections
    pub extension_distance: Float,
    /// Rays whose total brightness doesn't exceed this are considered absorbed
    pub min_brightness: Float,
}

impl Default for SimulatorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            ray_budget: 10000,
            extension_distance: 10000.,
            min_brightness: 1e-6,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = self.extension_distance;
        if d.is_finite() && d > 0. {
            Ok(())
        } else {
            Err(ConfigError::InvalidExtensionDistance(d))
        }
    }
}

/// Diagnostics gathered during the last call to [`Simulator::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Rays taken out of the queue
    pub processed: usize,
    /// Rays whose response was [`Response::Absorbed`]
    pub absorbed: usize,
    /// Incidences an object had no defined behavior for (e.g. hitting a corner)
    pub undefined_behavior: usize,
    /// Rays dropped for being degenerate, or having non-finite coordinates
    pub malformed_dropped: usize,
    /// Rays dropped for being too dim
    pub dimmed_dropped: usize,
    /// Whether the ray budget was reached
    pub budget_exhausted: bool,
}

/// Propagates the rays emitted by the objects of a [`Scene`], breadth-first.
#[derive(Clone, Debug, Default)]
pub struct Simulator {
    config: SimulatorConfig,
    queue: VecDeque<Ray>,
    segments: Vec<Ray>,
    stats: TraceStats,
}

impl Simulator {
    #[inline]
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            ..Default::default()
        })
    }

    #[inline]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// The segments recorded during the last run, in the order they were traced.
    #[inline]
    pub fn segments(&self) -> &[Ray] {
        &self.segments
    }

    #[inline]
    pub fn into_segments(self) -> Vec<Ray> {
        self.segments
    }

    /// Rays waiting to be processed.
    #[inline]
    pub fn pending(&self) -> impl ExactSizeIterator<Item = &Ray> {
        self.queue.iter()
    }

    /// Queues `ray`, it will be processed, before any emitted ray, during the next
    /// run. Ignored once the ray budget is exhausted.
    #[inline]
    pub fn add_ray(&mut self, ray: Ray) {
        if self.stats.processed < self.config.ray_budget {
            self.queue.push_back(ray);
        }
    }

    fn check_well_formed(&mut self, ray: &Ray) -> bool {
        let ok = ray.is_well_formed();
        if !ok {
            debug!("dropping malformed ray {:?} -> {:?}", ray.p1, ray.p2);
            self.stats.malformed_dropped += 1;
        }
        ok
    }

    /// Checks a ray produced by an object's response, returns whether it should be traced.
    fn admit(&mut self, ray: &Ray) -> bool {
        if !self.check_well_formed(ray) {
            false
        } else if ray.total_brightness() <= self.config.min_brightness {
            trace!("dropping dim ray ({})", ray.total_brightness());
            self.stats.dimmed_dropped += 1;
            false
        } else {
            true
        }
    }

    /// Returns the object `ray` hits first, and where it hits it.
    fn nearest_intersection<'o>(
        objects: &'o [Box<dyn OpticalObject>],
        ray: &Ray,
        ctx: &SimulationCtx,
    ) -> Option<(&'o dyn OpticalObject, Point)> {
        let mut nearest: Option<(Float, &dyn OpticalObject, Point)> = None;

        for object in objects.iter().filter(|o| o.is_optical()) {
            let Some(p) = object.intersect(ray, ctx) else {
                continue;
            };

            let d = nalgebra::distance_squared(&ray.p1, &p);

            // ties go to the first object
            if d >= MIN_RAY_SEGMENT_LENGTH_SQUARED
                && nearest.as_ref().map_or(true, |(nd, ..)| d < *nd)
            {
                nearest = Some((d, object.as_ref(), p));
            }
        }

        nearest.map(|(_, object, p)| (object, p))
    }

    /// Runs a full simulation of `scene`, returning the traced segments.
    ///
    /// Rays added with [`Simulator::add_ray`] are processed first, then the rays
    /// emitted by the scene's objects, in scene order. Rays are processed in FIFO
    /// order until none remain, or the ray budget is reached, in which case the
    /// scene's warning is set.
    pub fn run(&mut self, scene: &mut Scene) -> &[Ray] {
        self.segments.clear();
        self.stats = TraceStats::default();
        scene.clear_diagnostics();
        scene.reseed();

        let (objects, mut ctx) = scene.split();

        for object in objects {
            for ray in object.on_simulation_start(&mut ctx) {
                if self.check_well_formed(&ray) {
                    self.queue.push_back(ray);
                }
            }
        }

        debug!(
            "starting simulation: {} objects, {} initial rays",
            objects.len(),
            self.queue.len()
        );

        while self.stats.processed < self.config.ray_budget {
            let Some(mut ray) = self.queue.pop_front() else {
                break;
            };

            ray.is_new = false;
            ray.extend(self.config.extension_distance);

            trace!("processing ray {}: {:?} -> {:?}", self.stats.processed, ray.p1, ray.p2);

            match Self::nearest_intersection(objects, &ray, &ctx) {
                None => self.segments.push(ray),
                Some((object, incident_point)) => {
                    self.segments.push(ray.truncated(incident_point));

                    let flagged = ctx.undefined_behavior_count();
                    let response = object.respond(
                        &ray,
                        self.stats.processed,
                        &incident_point,
                        ray.surface_merging.as_ref(),
                        &mut ctx,
                    );

                    if ctx.undefined_behavior_count() > flagged {
                        self.stats.undefined_behavior += 1;
                    }

                    if response.is_empty() {
                        self.stats.absorbed += 1;
                    }

                    for ray in response {
                        if self.admit(&ray) {
                            self.queue.push_back(ray);
                        }
                    }
                }
            }

            self.stats.processed += 1;
        }

        if self.stats.processed >= self.config.ray_budget {
            self.stats.budget_exhausted = true;

            let message = format!(
                "Simulation stopped: maximum ray count ({}) reached",
                self.config.ray_budget
            );
            warn!("{message}");
            scene.warning = Some(message);
        }

        info!(
            "simulation done: {} rays processed, {} segments, {} absorbed, {} discarded",
            self.stats.processed,
            self.segments.len(),
            self.stats.absorbed,
            self.queue.len(),
        );

        // untraced rays would otherwise leak into the next run
        self.queue.clear();

        &self.segments
    }
}
