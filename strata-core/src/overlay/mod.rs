//! Weighted slice overlay over an existing label source.
//!
//! A [`SliceOverlay`] wraps a partition's label source and a resolved
//! slice list. Every horizontal coordinate deterministically belongs to
//! one cell, every cell to one winning slice; the winning slice's
//! provider resolves the final label, deferring to the underlying source
//! on the reserved sentinel. All state is immutable after construction
//! and shared read-only; the only mutable state anywhere is the
//! per-thread resolution cache.

mod cache;
mod zoom;

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use strata_utils::Identifier;
use strata_utils::random::{derive_seed, mix_seed};
use thiserror::Error;

use self::cache::SliceCache;
use crate::slice::Slice;
use crate::source::{ClimateSampler, Label, LabelSource};

/// Salts for the three per-partition seed derivatives. Fixed additive
/// constants; changing any of them reshuffles every existing world's
/// slice layout.
const VALUE_SEED_SALT: i64 = 1_586_309_141;
const CELL_SEED_SALT: i64 = 873_258_177;
const CELL_ZOOM_SEED_SALT: i64 = 121_510_973;

thread_local! {
    static SLICE_CACHE: RefCell<SliceCache> = const { RefCell::new(SliceCache::new()) };
}

/// Process-unique identity tokens for cache entries. Seeds alone cannot
/// serve as identity: a reload rebuilds an overlay for the same partition
/// and world seed with a possibly different slice list, and a warm
/// per-thread cache must never replay the predecessor's indices against
/// the new list.
static NEXT_CACHE_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Construction-time overlay rejection.
///
/// Query paths never produce errors; a malformed overlay is refused
/// up front instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// The partition had an assignment group with no slices in it.
    #[error("partition `{partition}` has no slices assigned")]
    EmptySliceList {
        /// Destination partition of the rejected overlay.
        partition: Identifier,
    },
    /// Every assigned slice had weight 0.
    #[error("partition `{partition}` has a non-positive total slice weight")]
    NonPositiveWeight {
        /// Destination partition of the rejected overlay.
        partition: Identifier,
    },
}

/// A deterministic weighted slice overlay for one partition.
///
/// Constructed once at world start, immutable thereafter. Shares the
/// underlying source, does not own it exclusively. Implements
/// [`LabelSource`] so it drops in wherever the original source was used.
pub struct SliceOverlay {
    partition: Identifier,
    base_cell_size: u32,
    underlying: Arc<dyn LabelSource>,
    slices: SmallVec<[Slice; 4]>,
    total_weight: u64,
    cell_exponent: u32,
    value_seed: i64,
    cell_seed: i64,
    cell_zoom_seed: i64,
    cache_token: u64,
    possible: FxHashSet<Label>,
}

impl core::fmt::Debug for SliceOverlay {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SliceOverlay")
            .field("partition", &self.partition)
            .field("base_cell_size", &self.base_cell_size)
            .field("slices", &self.slices)
            .field("total_weight", &self.total_weight)
            .field("cell_exponent", &self.cell_exponent)
            .field("value_seed", &self.value_seed)
            .field("cell_seed", &self.cell_seed)
            .field("cell_zoom_seed", &self.cell_zoom_seed)
            .field("cache_token", &self.cache_token)
            .field("possible", &self.possible)
            .finish_non_exhaustive()
    }
}

impl SliceOverlay {
    /// Build an overlay for `partition` from a resolved slice list.
    ///
    /// Fails fast on a degenerate configuration: an empty slice list or a
    /// total weight of zero. Weight-0 slices are representable but the
    /// list must carry at least one positive weight.
    pub fn new(
        partition: Identifier,
        world_seed: u64,
        base_cell_size: u32,
        slices: Vec<Slice>,
        underlying: Arc<dyn LabelSource>,
    ) -> Result<Self, OverlayError> {
        if slices.is_empty() {
            return Err(OverlayError::EmptySliceList { partition });
        }
        let total_weight: u64 = slices.iter().map(|slice| u64::from(slice.weight)).sum();
        if total_weight == 0 {
            return Err(OverlayError::NonPositiveWeight { partition });
        }

        Ok(Self::build(
            partition,
            world_seed,
            base_cell_size,
            slices.into(),
            total_weight,
            underlying,
        ))
    }

    /// Internal constructor over an already-validated slice list.
    fn build(
        partition: Identifier,
        world_seed: u64,
        base_cell_size: u32,
        slices: SmallVec<[Slice; 4]>,
        total_weight: u64,
        underlying: Arc<dyn LabelSource>,
    ) -> Self {
        let cell_exponent = ceil_log2(slices.len()) + base_cell_size;
        let partition_seed = partition_seed(&partition, world_seed);

        let mut possible = underlying.possible_labels().clone();
        for slice in &slices {
            possible.extend(slice.provider.possible_labels());
        }

        Self {
            partition,
            base_cell_size,
            underlying,
            slices,
            total_weight,
            cell_exponent,
            value_seed: derive_seed(partition_seed, VALUE_SEED_SALT),
            cell_seed: derive_seed(partition_seed, CELL_SEED_SALT),
            cell_zoom_seed: derive_seed(partition_seed, CELL_ZOOM_SEED_SALT),
            cache_token: NEXT_CACHE_TOKEN.fetch_add(1, Ordering::Relaxed),
            possible,
        }
    }

    /// The winning slice at a quart position. Height never participates
    /// in slice selection.
    #[must_use]
    pub fn slice_at(&self, quart_x: i32, quart_z: i32) -> &Slice {
        let index = SLICE_CACHE.with_borrow_mut(|cache| {
            cache.get_or_insert(self.cache_token, quart_x, quart_z, || {
                self.resolve_slice_index(quart_x, quart_z) as u32
            })
        }) as usize;
        match self.slices.get(index) {
            Some(slice) => slice,
            // A foreign index can only mean a corrupt cache entry;
            // recompute rather than fail the query.
            None => &self.slices[self.resolve_slice_index(quart_x, quart_z)],
        }
    }

    /// Name of the winning slice at a quart position. Diagnostics hook;
    /// `quart_y` is accepted for signature parity with label queries but
    /// never affects the answer.
    #[must_use]
    pub fn slice_name_at(&self, quart_x: i32, _quart_y: i32, quart_z: i32) -> &Identifier {
        &self.slice_at(quart_x, quart_z).name
    }

    /// The winning slice at the host's externally visible granularity.
    ///
    /// Matches the coarser nearest-point selection external callers
    /// observe from the underlying source: the eight surrounding
    /// quart-cell corners compete by fiddled squared distance and the
    /// nearest corner's column resolves the slice. Takes block
    /// coordinates. A separate concern from the internal zoom; exists
    /// solely to stay visually consistent with the host.
    #[must_use]
    pub fn zoomed_slice_at(&self, block_x: i32, block_y: i32, block_z: i32) -> &Slice {
        let off_x = block_x - 2;
        let off_y = block_y - 2;
        let off_z = block_z - 2;
        let grid_x = off_x >> 2;
        let grid_y = off_y >> 2;
        let grid_z = off_z >> 2;
        let frac_x = f64::from(off_x & 3) / 4.0;
        let frac_y = f64::from(off_y & 3) / 4.0;
        let frac_z = f64::from(off_z & 3) / 4.0;

        let mut best_corner = 0;
        let mut best_distance = f64::INFINITY;
        for corner in 0..8_u8 {
            let max_x = corner & 4 != 0;
            let max_y = corner & 2 != 0;
            let max_z = corner & 1 != 0;
            let corner_x = if max_x { grid_x + 1 } else { grid_x };
            let corner_y = if max_y { grid_y + 1 } else { grid_y };
            let corner_z = if max_z { grid_z + 1 } else { grid_z };
            let corner_frac_x = if max_x { frac_x - 1.0 } else { frac_x };
            let corner_frac_y = if max_y { frac_y - 1.0 } else { frac_y };
            let corner_frac_z = if max_z { frac_z - 1.0 } else { frac_z };

            let distance = zoom::fiddled_distance(
                self.cell_seed,
                i64::from(corner_x),
                i64::from(corner_y),
                i64::from(corner_z),
                corner_frac_x,
                corner_frac_y,
                corner_frac_z,
            );
            if best_distance > distance {
                best_corner = corner;
                best_distance = distance;
            }
        }

        let quart_x = if best_corner & 4 != 0 { grid_x + 1 } else { grid_x };
        let quart_z = if best_corner & 1 != 0 { grid_z + 1 } else { grid_z };
        self.slice_at(quart_x, quart_z)
    }

    /// Destination partition of this overlay.
    #[must_use]
    pub fn partition(&self) -> &Identifier {
        &self.partition
    }

    /// The wrapped source the overlay defers to.
    #[must_use]
    pub fn underlying(&self) -> &Arc<dyn LabelSource> {
        &self.underlying
    }

    /// The resolved slice list, in registration order.
    #[must_use]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Precomputed sum of slice weights.
    #[must_use]
    pub const fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Number of zoom rounds applied per resolution.
    #[must_use]
    pub const fn cell_exponent(&self) -> u32 {
        self.cell_exponent
    }

    /// The cell a quart position belongs to. Diagnostics hook; slice
    /// selection is constant within a cell.
    #[must_use]
    pub fn cell_at(&self, quart_x: i32, quart_z: i32) -> (i64, i64) {
        zoom::zoom_to_cell(self.cell_zoom_seed, self.cell_exponent, quart_x, quart_z)
    }

    /// Cache-free resolution, for verifying cache transparency.
    fn resolve_slice_index(&self, quart_x: i32, quart_z: i32) -> usize {
        let (cell_x, cell_z) =
            zoom::zoom_to_cell(self.cell_zoom_seed, self.cell_exponent, quart_x, quart_z);
        zoom::pick_slice_index(
            self.value_seed,
            self.total_weight,
            &self.slices,
            cell_x,
            cell_z,
        )
    }
}

impl LabelSource for SliceOverlay {
    fn label_at(
        &self,
        quart_x: i32,
        quart_y: i32,
        quart_z: i32,
        climate: &dyn ClimateSampler,
    ) -> Label {
        let slice = self.slice_at(quart_x, quart_z);
        match slice.provider.resolve_label(
            quart_x,
            quart_y,
            quart_z,
            climate,
            self.underlying.as_ref(),
        ) {
            Some(label) => label,
            None => self
                .underlying
                .label_at(quart_x, quart_y, quart_z, climate),
        }
    }

    fn possible_labels(&self) -> &FxHashSet<Label> {
        &self.possible
    }

    fn with_seed(&self, seed: u64) -> Arc<dyn LabelSource> {
        Arc::new(Self::build(
            self.partition.clone(),
            seed,
            self.base_cell_size,
            self.slices.clone(),
            self.total_weight,
            self.underlying.with_seed(seed),
        ))
    }
}

/// Fold a partition identifier into the world seed so partitions never
/// alias each other's slice layouts.
fn partition_seed(partition: &Identifier, world_seed: u64) -> i64 {
    let mut seed = world_seed as i64;
    for byte in partition
        .namespace()
        .bytes()
        .chain([b':'])
        .chain(partition.path().bytes())
    {
        seed = mix_seed(seed, i64::from(byte));
    }
    seed
}

/// Ceiling of log2 for a non-empty slice count.
const fn ceil_log2(count: usize) -> u32 {
    (count as u64).next_power_of_two().trailing_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::LabelProvider;
    use crate::source::{FixedClimateSampler, FixedLabelSource};

    fn passthrough_slice(path: &str, weight: u32) -> Slice {
        Slice::new(Identifier::vanilla(path), weight, LabelProvider::Passthrough)
    }

    fn underlying() -> Arc<dyn LabelSource> {
        Arc::new(FixedLabelSource::new(Identifier::vanilla("plains")))
    }

    fn overlay(slices: Vec<Slice>) -> SliceOverlay {
        SliceOverlay::new(
            Identifier::vanilla("overworld"),
            42,
            4,
            slices,
            underlying(),
        )
        .expect("valid overlay")
    }

    #[test]
    fn rejects_empty_slice_list() {
        let err = SliceOverlay::new(
            Identifier::vanilla("overworld"),
            42,
            4,
            Vec::new(),
            underlying(),
        )
        .expect_err("empty list must be rejected");
        assert!(matches!(err, OverlayError::EmptySliceList { .. }));
    }

    #[test]
    fn rejects_all_zero_weights() {
        let err = SliceOverlay::new(
            Identifier::vanilla("overworld"),
            42,
            4,
            vec![passthrough_slice("a", 0), passthrough_slice("b", 0)],
            underlying(),
        )
        .expect_err("zero total weight must be rejected");
        assert!(matches!(err, OverlayError::NonPositiveWeight { .. }));
    }

    #[test]
    fn cell_exponent_grows_with_slice_count() {
        let two = overlay(vec![passthrough_slice("a", 1), passthrough_slice("b", 1)]);
        assert_eq!(two.cell_exponent(), 1 + 4);

        let five = overlay(vec![
            passthrough_slice("a", 1),
            passthrough_slice("b", 1),
            passthrough_slice("c", 1),
            passthrough_slice("d", 1),
            passthrough_slice("e", 1),
        ]);
        assert_eq!(five.cell_exponent(), 3 + 4);
    }

    #[test]
    fn cache_never_changes_the_answer() {
        let overlay = overlay(vec![passthrough_slice("a", 1), passthrough_slice("b", 3)]);
        for x in -64_i32..64 {
            for z in -64_i32..64 {
                let uncached = overlay.resolve_slice_index(x, z);
                let cached = &overlay.slice_at(x, z).name;
                assert_eq!(&overlay.slices()[uncached].name, cached, "at ({x}, {z})");
                // A second cached read must agree with the first.
                assert_eq!(&overlay.slice_at(x, z).name, cached);
            }
        }
    }

    #[test]
    fn rebuilt_overlay_never_reuses_warm_cache_entries() {
        // Reload semantics: a new overlay for the same partition and
        // world seed, with a shorter slice list, queried on a thread
        // whose cache is warm from the old one. Stale indices from the
        // five-slice layout would be out of bounds for the single-slice
        // list.
        let wide = overlay(vec![
            passthrough_slice("a", 1),
            passthrough_slice("b", 1),
            passthrough_slice("c", 1),
            passthrough_slice("d", 1),
            passthrough_slice("e", 1),
        ]);
        for x in 0..16 {
            for z in 0..16 {
                let _ = wide.slice_at(x, z);
            }
        }

        let narrow = overlay(vec![passthrough_slice("only", 1)]);
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(
                    narrow.slice_at(x, z).name,
                    Identifier::vanilla("only"),
                    "stale cache entry replayed at ({x}, {z})"
                );
            }
        }

        // The old overlay stays coherent too.
        for x in 0..16 {
            for z in 0..16 {
                let index = wide.resolve_slice_index(x, z);
                assert_eq!(wide.slice_at(x, z).name, wide.slices()[index].name);
            }
        }
    }

    #[test]
    fn partitions_never_alias() {
        let slices = vec![passthrough_slice("a", 1), passthrough_slice("b", 1)];
        let first = SliceOverlay::new(
            Identifier::vanilla("overworld"),
            42,
            4,
            slices.clone(),
            underlying(),
        )
        .expect("valid overlay");
        let second = SliceOverlay::new(
            Identifier::vanilla("the_nether"),
            42,
            4,
            slices,
            underlying(),
        )
        .expect("valid overlay");

        let disagreements = (0..64)
            .flat_map(|x| (0..64).map(move |z| (x * 97, z * 97)))
            .filter(|&(x, z)| first.slice_at(x, z).name != second.slice_at(x, z).name)
            .count();
        assert!(disagreements > 0, "partition salting had no effect");
    }

    #[test]
    fn possible_labels_union_includes_underlying() {
        let nested: Arc<dyn LabelSource> =
            Arc::new(FixedLabelSource::new(Identifier::vanilla("cherry_grove")));
        let overlay = overlay(vec![
            passthrough_slice("a", 1),
            Slice::new(
                Identifier::vanilla("b"),
                1,
                LabelProvider::NestedSource(nested),
            ),
        ]);

        assert!(overlay.possible_labels().contains(&Identifier::vanilla("plains")));
        assert!(
            overlay
                .possible_labels()
                .contains(&Identifier::vanilla("cherry_grove"))
        );
    }

    #[test]
    fn passthrough_label_matches_underlying_exactly() {
        let overlay = overlay(vec![passthrough_slice("a", 1)]);
        let climate = FixedClimateSampler::default();

        for (x, y, z) in [(0, 64, 0), (-31, 0, 17), (1000, -8, -1000)] {
            assert_eq!(
                overlay.label_at(x, y, z, &climate),
                overlay.underlying().label_at(x, y, z, &climate)
            );
        }
    }

    #[test]
    fn with_seed_changes_layout_not_slices() {
        let overlay = overlay(vec![passthrough_slice("a", 1), passthrough_slice("b", 1)]);
        let reseeded = overlay.with_seed(43);
        let climate = FixedClimateSampler::default();

        // Same label universe either way.
        assert_eq!(reseeded.possible_labels(), overlay.possible_labels());
        // Labels still resolve (passthrough, so the underlying answers).
        assert_eq!(
            reseeded.label_at(0, 64, 0, &climate),
            Identifier::vanilla("plains")
        );
    }

    #[test]
    fn zoomed_query_is_deterministic_and_coarse() {
        let overlay = overlay(vec![passthrough_slice("a", 1), passthrough_slice("b", 1)]);

        for (x, y, z) in [(0, 64, 0), (123, 70, -456), (-1, 0, -1)] {
            let first = overlay.zoomed_slice_at(x, y, z).name.clone();
            let second = overlay.zoomed_slice_at(x, y, z).name.clone();
            assert_eq!(first, second);

            // The winner is always one of the four surrounding quart
            // columns' slices.
            let grid_x = (x - 2) >> 2;
            let grid_z = (z - 2) >> 2;
            let candidates: Vec<_> = (0..=1)
                .flat_map(|dx| (0..=1).map(move |dz| (grid_x + dx, grid_z + dz)))
                .map(|(qx, qz)| overlay.slice_at(qx, qz).name.clone())
                .collect();
            assert!(candidates.contains(&first), "winner outside corner set");
        }
    }

    #[test]
    fn slice_name_at_ignores_height() {
        let overlay = overlay(vec![passthrough_slice("a", 1), passthrough_slice("b", 1)]);
        for (x, z) in [(0, 0), (-77, 12), (300, -300)] {
            assert_eq!(
                overlay.slice_name_at(x, -64, z),
                overlay.slice_name_at(x, 320, z)
            );
        }
    }
}
