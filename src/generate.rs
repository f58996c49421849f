//! Procedural scatter of instances around the origin.
//!
//! The generator consumes exactly six uniform draws per instance, in this
//! order: `position.x`, `position.y`, `position.z`, `rotation.x`,
//! `rotation.y`, `scale`. Reproducible layouts (and tests) rely on that order.

use std::{f32::consts::PI, sync::Arc};

use cgmath::{Euler, Rad, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::ScatterConfig,
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::MatcapMaterial,
        scene_graph::{NodeKind, SceneNode, SceneRegistry},
    },
};

/// A source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f32;
}

/// Adapts any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng>(pub R);

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Seeded if `seed` is given, OS entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os_rng(),
        }
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f32 {
        self.0.random::<f32>()
    }
}

/// Replays a fixed list of samples, starting over when exhausted.
///
/// An empty list yields `0.0` forever.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// How many samples have been handed out so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceGenerator {
    pub count: usize,
    /// Edge length of the cube positions are drawn from.
    pub spread: f32,
}

impl InstanceGenerator {
    pub fn new(count: usize, spread: f32) -> Self {
        Self { count, spread }
    }

    /// One transform from six consecutive draws.
    pub fn sample(&self, rng: &mut impl RandomSource) -> Instance {
        let mut axis = || (rng.next_unit() - 0.5) * self.spread;
        let position = Vector3::new(axis(), axis(), axis());
        let rotation = Euler::new(Rad(rng.next_unit() * PI), Rad(rng.next_unit() * PI), Rad(0.0));
        let mut instance = Instance {
            position,
            rotation,
            ..Default::default()
        };
        instance.set_uniform_scale(rng.next_unit());
        instance
    }

    /// Append `count` bulk nodes to `registry`, all sharing `geometry` and `material`.
    ///
    /// Returns the number of nodes appended.
    pub fn populate(
        &self,
        registry: &mut SceneRegistry,
        geometry: &Arc<Geometry>,
        material: &Arc<MatcapMaterial>,
        rng: &mut impl RandomSource,
    ) -> usize {
        let started = instant::Instant::now();
        for _ in 0..self.count {
            let transform = self.sample(rng);
            registry.add(SceneNode::new(
                NodeKind::Bulk,
                Arc::clone(geometry),
                Arc::clone(material),
                transform,
            ));
        }
        log::info!(
            "scattered {} x {} in {:?}",
            self.count,
            geometry.label,
            started.elapsed()
        );
        self.count
    }
}

impl From<&ScatterConfig> for InstanceGenerator {
    fn from(config: &ScatterConfig) -> Self {
        Self::new(config.count, config.spread)
    }
}
