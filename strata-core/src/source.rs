//! Label source and climate sampler abstractions.
//!
//! A [`LabelSource`] is the pluggable component mapping coordinates to
//! region labels; the host engine supplies one per partition and a
//! [`SliceOverlay`](crate::SliceOverlay) wraps it without owning it.
//! Coordinates are quart positions (one quart = 4 blocks per axis), the
//! granularity the host samples labels at.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use strata_utils::Identifier;
use strata_utils::climate::TargetPoint;

/// A categorical region classification for a coordinate (e.g. a biome key).
pub type Label = Identifier;

/// External multi-noise sampler interface.
///
/// Supplies the climate sample consumed by hypercube-noise providers.
/// Implementations must be pure functions of position.
pub trait ClimateSampler: Send + Sync {
    /// Sample the climate point at a quart position.
    fn sample(&self, quart_x: i32, quart_y: i32, quart_z: i32) -> TargetPoint;
}

/// A climate sampler returning the same point everywhere.
///
/// For partitions without a multi-noise pipeline, and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClimateSampler {
    point: TargetPoint,
}

impl FixedClimateSampler {
    /// Create a sampler that always returns `point`.
    #[must_use]
    pub const fn new(point: TargetPoint) -> Self {
        Self { point }
    }
}

impl Default for FixedClimateSampler {
    fn default() -> Self {
        Self::new(TargetPoint::zero())
    }
}

impl ClimateSampler for FixedClimateSampler {
    fn sample(&self, _quart_x: i32, _quart_y: i32, _quart_z: i32) -> TargetPoint {
        self.point
    }
}

/// A coordinate-to-label source.
///
/// Implementations must be immutable after construction and safe to read
/// from any number of threads concurrently; `label_at` must be a pure
/// function of position for a fixed source.
pub trait LabelSource: Send + Sync {
    /// Resolve the label at a quart position.
    fn label_at(
        &self,
        quart_x: i32,
        quart_y: i32,
        quart_z: i32,
        climate: &dyn ClimateSampler,
    ) -> Label;

    /// The finite superset of labels this source can ever return.
    fn possible_labels(&self) -> &FxHashSet<Label>;

    /// Rebuild this source over a different world seed.
    fn with_seed(&self, seed: u64) -> Arc<dyn LabelSource>;

    /// Whether this source returns the same label for every position.
    ///
    /// Overlaying a constant source is meaningless, so the manager skips
    /// such partitions.
    fn is_constant(&self) -> bool {
        false
    }
}

/// A label source returning a single fixed label everywhere.
///
/// The analog of a fixed biome source under a flat generator; exists so
/// hosts have a trivial source for flat or debug partitions, and so the
/// manager's constant-source skip rule has something to skip.
pub struct FixedLabelSource {
    label: Label,
    possible: FxHashSet<Label>,
}

impl FixedLabelSource {
    /// Create a source that always returns `label`.
    #[must_use]
    pub fn new(label: Label) -> Self {
        let mut possible = FxHashSet::default();
        possible.insert(label.clone());
        Self { label, possible }
    }

    /// The fixed label.
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl LabelSource for FixedLabelSource {
    fn label_at(
        &self,
        _quart_x: i32,
        _quart_y: i32,
        _quart_z: i32,
        _climate: &dyn ClimateSampler,
    ) -> Label {
        self.label.clone()
    }

    fn possible_labels(&self) -> &FxHashSet<Label> {
        &self.possible
    }

    fn with_seed(&self, _seed: u64) -> Arc<dyn LabelSource> {
        Arc::new(Self::new(self.label.clone()))
    }

    fn is_constant(&self) -> bool {
        true
    }
}
