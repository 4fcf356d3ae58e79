//! World-start overlay assembly.
//!
//! The manager holds raw `(selector, slice)` pairs between load time and
//! world start. Selectors are evaluated lazily against the partitions
//! that actually exist once the world starts, never at load time, since
//! partition identities may not exist yet when data loads.
//!
//! Lifecycle is strictly one-shot: `load` then `on_world_start`, once per
//! world run. A reload builds a new manager wholesale; a live overlay is
//! never mutated in place.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_utils::Identifier;
use tracing::{debug, warn};

use crate::overlay::SliceOverlay;
use crate::slice::Slice;
use crate::source::LabelSource;

/// A named, independently generated partition of the world.
pub type PartitionId = Identifier;

/// External eligibility predicate mapping a slice to applicable
/// partitions.
///
/// Implemented by the condition subsystem; this engine only calls
/// `resolve` once per assignment at world start. A selector may match
/// zero, one, or many partitions.
pub trait ConditionSelector: Send + Sync {
    /// Which of the candidate partitions this selector matches.
    fn resolve(&self, candidates: &[PartitionId]) -> FxHashSet<PartitionId>;
}

/// A slice bound to its eligibility selector, as the loader delivers it.
#[derive(Clone)]
pub struct SliceAssignment {
    /// Eligibility predicate, resolved at world start.
    pub selector: Arc<dyn ConditionSelector>,
    /// The slice competing for the matched partitions.
    pub slice: Slice,
}

impl SliceAssignment {
    /// Pair a slice with its selector.
    #[must_use]
    pub fn new(selector: Arc<dyn ConditionSelector>, slice: Slice) -> Self {
        Self { selector, slice }
    }
}

/// The splice point between the manager and a partition's generation
/// pipeline.
///
/// `replace_label_source` is where a host invalidates any cached state
/// that depends on the partition's label source; the manager calls it
/// exactly once per spliced partition, single-threaded, before any
/// worker reads.
pub trait LabelPipeline {
    /// The partition's active label source.
    fn label_source(&self) -> &Arc<dyn LabelSource>;

    /// Swap in a new active label source.
    fn replace_label_source(&mut self, source: Arc<dyn LabelSource>);
}

/// A pipeline that is nothing but a label source slot.
impl LabelPipeline for Arc<dyn LabelSource> {
    fn label_source(&self) -> &Arc<dyn LabelSource> {
        self
    }

    fn replace_label_source(&mut self, source: Arc<dyn LabelSource>) {
        *self = source;
    }
}

/// Groups slice assignments per destination partition at world start and
/// splices one [`SliceOverlay`] into each eligible partition's pipeline.
pub struct OverlayManager {
    assignments: Vec<SliceAssignment>,
}

impl OverlayManager {
    /// Store raw assignments from the loader. No selector is evaluated
    /// here.
    #[must_use]
    pub fn load(assignments: Vec<SliceAssignment>) -> Self {
        Self { assignments }
    }

    /// Loaded assignments, in registration order.
    #[must_use]
    pub fn assignments(&self) -> &[SliceAssignment] {
        &self.assignments
    }

    /// Resolve selectors, group slices per partition, and splice an
    /// overlay into every eligible partition.
    ///
    /// Consumes the manager: the lifecycle is one-shot per world run.
    /// Degenerate assignments are dropped with a log line and never
    /// fatal; a partition left untouched keeps generating from its
    /// original source. Returns the number of spliced partitions.
    pub fn on_world_start<P: LabelPipeline>(
        self,
        partitions: &mut FxHashMap<PartitionId, P>,
        world_seed: u64,
        base_cell_size: u32,
    ) -> usize {
        let candidates: Vec<PartitionId> = partitions.keys().cloned().collect();
        let mut grouped: FxHashMap<PartitionId, Vec<Slice>> = FxHashMap::default();

        for assignment in self.assignments {
            if assignment.slice.weight == 0 {
                warn!(
                    slice = %assignment.slice.name,
                    "dropping slice assignment with zero weight"
                );
                continue;
            }

            let matched = assignment.selector.resolve(&candidates);
            if matched.is_empty() {
                debug!(
                    slice = %assignment.slice.name,
                    "slice assignment matched no partition; skipping"
                );
                continue;
            }

            for partition in matched {
                grouped
                    .entry(partition)
                    .or_default()
                    .push(assignment.slice.clone());
            }
        }

        let mut spliced = 0;
        for (partition, pipeline) in partitions.iter_mut() {
            let Some(slices) = grouped.remove(partition) else {
                continue;
            };

            if pipeline.label_source().is_constant() {
                warn!(
                    partition = %partition,
                    "skipping slice overlay; partition label source is constant"
                );
                continue;
            }

            let slice_count = slices.len();
            let overlay = SliceOverlay::new(
                partition.clone(),
                world_seed,
                base_cell_size,
                slices,
                Arc::clone(pipeline.label_source()),
            );
            match overlay {
                Ok(overlay) => {
                    pipeline.replace_label_source(Arc::new(overlay));
                    spliced += 1;
                    debug!(
                        partition = %partition,
                        slices = slice_count,
                        "spliced slice overlay into partition pipeline"
                    );
                }
                Err(error) => {
                    warn!(
                        partition = %partition,
                        %error,
                        "failed to build slice overlay; partition left untouched"
                    );
                }
            }
        }
        spliced
    }
}
