//! Deterministic coordinate-to-cell-to-slice resolution.
//!
//! Reproduces the host grid's own zoom transform bit-for-bit so overlay
//! cell boundaries line up with the boundaries players already see. The
//! input quart coordinate is scaled to the underlying block sampling grid
//! (x4), then walked down `exponent` halving rounds; every round either
//! snaps cleanly (both coordinates even) or resolves the ambiguity with a
//! position-seeded hash shared by the whole 2x2 block.

use strata_utils::random::{bounded_choice, floor_mod, mix_seed, pos_hash};

use crate::slice::Slice;

/// Walk a quart coordinate down to its slice cell.
///
/// Pure function of `(cell_zoom_seed, exponent, position)`.
pub(crate) fn zoom_to_cell(
    cell_zoom_seed: i64,
    exponent: u32,
    quart_x: i32,
    quart_z: i32,
) -> (i64, i64) {
    let mut x = i64::from(quart_x) << 2;
    let mut z = i64::from(quart_z) << 2;

    for _ in 0..exponent {
        // Seed on the even-aligned corner so all four fine coordinates of
        // a 2x2 block share one choice.
        let even_x = x & !1;
        let even_z = z & !1;
        let half_x = x >> 1;
        let half_z = z >> 1;
        let odd_x = x & 1 == 1;
        let odd_z = z & 1 == 1;

        (x, z) = if odd_x && odd_z {
            match bounded_choice(cell_zoom_seed, even_x, even_z, 4) {
                0 => (half_x, half_z),
                1 => (half_x + 1, half_z),
                2 => (half_x, half_z + 1),
                _ => (half_x + 1, half_z + 1),
            }
        } else if odd_x {
            if bounded_choice(cell_zoom_seed, even_x, even_z, 2) == 0 {
                (half_x, half_z)
            } else {
                (half_x + 1, half_z)
            }
        } else if odd_z {
            if bounded_choice(cell_zoom_seed, even_x, even_z, 2) == 0 {
                (half_x, half_z)
            } else {
                (half_x, half_z + 1)
            }
        } else {
            (half_x, half_z)
        };
    }

    (x, z)
}

/// Weighted pick over the slice list for a resolved cell.
///
/// Hashes into `[0, total_weight)` and walks the list in registration
/// order subtracting weights until the remainder goes negative.
/// Registration order is the tie-break and must be preserved exactly.
pub(crate) fn pick_slice_index(
    value_seed: i64,
    total_weight: u64,
    slices: &[Slice],
    cell_x: i64,
    cell_z: i64,
) -> usize {
    let mut remainder = floor_mod(pos_hash(value_seed, cell_x, cell_z) >> 24, total_weight as i64);
    for (index, slice) in slices.iter().enumerate() {
        remainder -= i64::from(slice.weight);
        if remainder < 0 {
            return index;
        }
    }
    // Unreachable unless the precomputed total drifts from the list; a
    // latent bug must not halt generation, so the first slice stands in.
    0
}

/// Squared distance to a corner candidate, offset by a position-seeded
/// "fiddle" on every axis.
///
/// The chained mixing order and the unit-offset derivation match the
/// host's externally visible nearest-point selection exactly.
pub(crate) fn fiddled_distance(
    seed: i64,
    x: i64,
    y: i64,
    z: i64,
    frac_x: f64,
    frac_y: f64,
    frac_z: f64,
) -> f64 {
    let mut s = mix_seed(seed, x);
    s = mix_seed(s, y);
    s = mix_seed(s, z);
    s = mix_seed(s, x);
    s = mix_seed(s, y);
    s = mix_seed(s, z);
    let offset_x = fiddle(s);
    s = mix_seed(s, seed);
    let offset_y = fiddle(s);
    s = mix_seed(s, seed);
    let offset_z = fiddle(s);

    square(frac_z + offset_z) + square(frac_y + offset_y) + square(frac_x + offset_x)
}

/// Map a seed to a deterministic offset in `[-0.45, 0.45)`.
#[inline]
fn fiddle(seed: i64) -> f64 {
    let unit = floor_mod(seed >> 24, 1024) as f64 / 1024.0;
    (unit - 0.5) * 0.9
}

#[inline]
fn square(value: f64) -> f64 {
    value * value
}
