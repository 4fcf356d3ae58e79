//! Slice definitions and their label providers.
//!
//! A [`Slice`] is a named, weighted bundle competing for cells within a
//! partition. Its [`LabelProvider`] decides what label a coordinate gets
//! once the slice has won that coordinate's cell.
//!
//! Providers form a closed enum; the external serialization layer is the
//! only place new kinds are registered, and this engine only ever sees
//! already-resolved instances. Enum dispatch keeps the per-column hot
//! path free of vtable lookups, the same trade the biome source kinds
//! make.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use strata_utils::Identifier;
use strata_utils::climate::{ParameterPoint, TargetPoint};

use crate::source::{ClimateSampler, Label, LabelSource};

/// A named, weighted slice of a partition.
///
/// Immutable; created once at load time from configuration. Weight 0 is
/// representable (the configuration allows it) but such a slice is never
/// selected and the manager drops it before overlay construction.
#[derive(Clone)]
pub struct Slice {
    /// Resource name identifying this slice in logs and diagnostics.
    pub name: Identifier,
    /// Selection weight; the share of cells this slice wins is
    /// proportional to it.
    pub weight: u32,
    /// The provider resolving labels inside cells this slice owns.
    pub provider: LabelProvider,
}

impl Slice {
    /// Create a slice definition.
    #[must_use]
    pub const fn new(name: Identifier, weight: u32, provider: LabelProvider) -> Self {
        Self {
            name,
            weight,
            provider,
        }
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("provider", &self.provider.kind())
            .finish()
    }
}

/// How a winning slice resolves the label for a coordinate.
#[derive(Clone)]
pub enum LabelProvider {
    /// Always defer to the underlying source.
    Passthrough,
    /// Nearest-hypercube match against a multi-dimensional climate sample.
    HypercubeNoise(HypercubeNoise),
    /// Re-route the underlying label through a nested source when it
    /// belongs to a configured label set.
    MembershipOverlay(MembershipOverlay),
    /// Delegate entirely to another label source.
    NestedSource(Arc<dyn LabelSource>),
}

impl LabelProvider {
    /// Resolve the label at a quart position, or `None` to defer to the
    /// underlying source.
    ///
    /// `None` is the reserved defer sentinel: the overlay answers with
    /// `underlying.label_at(..)` for the same coordinates.
    #[must_use]
    pub fn resolve_label(
        &self,
        quart_x: i32,
        quart_y: i32,
        quart_z: i32,
        climate: &dyn ClimateSampler,
        underlying: &dyn LabelSource,
    ) -> Option<Label> {
        match self {
            Self::Passthrough => None,
            Self::HypercubeNoise(hypercube) => {
                Some(hypercube.resolve(&climate.sample(quart_x, quart_y, quart_z)))
            }
            Self::MembershipOverlay(membership) => {
                Some(membership.resolve(quart_x, quart_y, quart_z, climate, underlying))
            }
            Self::NestedSource(source) => {
                Some(source.label_at(quart_x, quart_y, quart_z, climate))
            }
        }
    }

    /// The finite superset of labels this provider can produce on its own.
    ///
    /// Deferred results are excluded; the overlay unions in the underlying
    /// source's labels separately.
    #[must_use]
    pub fn possible_labels(&self) -> FxHashSet<Label> {
        match self {
            Self::Passthrough => FxHashSet::default(),
            Self::HypercubeNoise(hypercube) => hypercube
                .entries
                .iter()
                .map(|(_, label)| label.clone())
                .collect(),
            Self::MembershipOverlay(membership) => membership
                .entries
                .iter()
                .flat_map(|(_, source)| source.possible_labels().iter().cloned())
                .collect(),
            Self::NestedSource(source) => source.possible_labels().clone(),
        }
    }

    /// Short kind name for logs and `Debug` output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::HypercubeNoise(_) => "hypercube_noise",
            Self::MembershipOverlay(_) => "membership_overlay",
            Self::NestedSource(_) => "nested_source",
        }
    }
}

/// Ordered `(hypercube, label)` pairs matched by minimum fitness.
///
/// The earliest entry wins fitness ties, mirroring the registration-order
/// tie-break used for slice selection itself.
#[derive(Clone)]
pub struct HypercubeNoise {
    entries: Vec<(ParameterPoint, Label)>,
}

impl HypercubeNoise {
    /// Create a provider from ordered `(hypercube, label)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if `entries` is empty; the configuration loader guarantees
    /// a non-empty list.
    #[must_use]
    pub fn new(entries: Vec<(ParameterPoint, Label)>) -> Self {
        assert!(
            !entries.is_empty(),
            "hypercube noise provider needs at least one entry"
        );
        Self { entries }
    }

    /// The configured entries, in registration order.
    #[must_use]
    pub fn entries(&self) -> &[(ParameterPoint, Label)] {
        &self.entries
    }

    fn resolve(&self, target: &TargetPoint) -> Label {
        let mut best = 0;
        let mut best_fitness = i64::MAX;
        for (index, (hypercube, _)) in self.entries.iter().enumerate() {
            let fitness = hypercube.fitness(target);
            if fitness < best_fitness {
                best = index;
                best_fitness = fitness;
            }
        }
        self.entries[best].1.clone()
    }
}

/// Ordered `(label set, nested source)` pairs.
///
/// The underlying label is resolved first; the first set containing it
/// re-routes the position to its nested source, otherwise the underlying
/// label stands.
#[derive(Clone)]
pub struct MembershipOverlay {
    entries: Vec<(FxHashSet<Label>, Arc<dyn LabelSource>)>,
}

impl MembershipOverlay {
    /// Create a provider from ordered `(label set, nested source)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(FxHashSet<Label>, Arc<dyn LabelSource>)>) -> Self {
        Self { entries }
    }

    fn resolve(
        &self,
        quart_x: i32,
        quart_y: i32,
        quart_z: i32,
        climate: &dyn ClimateSampler,
        underlying: &dyn LabelSource,
    ) -> Label {
        let label = underlying.label_at(quart_x, quart_y, quart_z, climate);
        for (members, source) in &self.entries {
            if members.contains(&label) {
                return source.label_at(quart_x, quart_y, quart_z, climate);
            }
        }
        label
    }
}
