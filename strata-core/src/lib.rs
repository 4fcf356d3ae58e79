//! Weighted slice overlays for procedural region-label pipelines.
//!
//! A [`SliceOverlay`] sits on top of an existing [`LabelSource`] (a biome
//! classifier or similar) and deterministically assigns a named, weighted
//! [`Slice`] to every horizontal coordinate of an effectively infinite
//! plane, without materializing any of it. Each slice carries a
//! [`LabelProvider`] that either produces its own labels or defers to the
//! underlying source, so an overlay is a drop-in substitute wherever the
//! original source was used.
//!
//! Selection is a pure function of `(seed, coordinate)`: any number of
//! worker threads compute identical answers with no shared mutable state.
//! The per-thread memoization layer never affects results.
//!
//! The [`OverlayManager`] is the world-start glue: it groups declarative
//! slice assignments per partition, builds one overlay per eligible
//! partition, and splices it into that partition's pipeline.

pub mod manager;
pub mod overlay;
mod slice;
mod source;

pub use manager::{ConditionSelector, LabelPipeline, OverlayManager, PartitionId, SliceAssignment};
pub use overlay::{OverlayError, SliceOverlay};
pub use slice::{HypercubeNoise, LabelProvider, MembershipOverlay, Slice};
pub use source::{ClimateSampler, FixedClimateSampler, FixedLabelSource, Label, LabelSource};
