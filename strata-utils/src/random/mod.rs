//! Seeded linear-congruential mixing for deterministic spatial hashing.
//!
//! These are the same mixing constants the host grid uses for its own
//! coordinate-seeded decisions, so anything derived from them stays
//! pixel-aligned with the host's zoom boundaries. The constants are
//! load-bearing for reproducing existing worlds; treat the whole module
//! as an opaque derivation, not something to tune.
//!
//! Every function here is a pure function of its arguments, which is what
//! lets arbitrarily many worker threads compute identical answers without
//! shared state.

/// LCG multiplier used by every seed-mixing step.
pub const MULTIPLIER: i64 = 6_364_136_223_846_793_005;

/// LCG increment used by every seed-mixing step.
pub const INCREMENT: i64 = 1_442_695_040_888_963_407;

/// Advance `seed` by one LCG round and fold `salt` into it.
#[inline]
#[must_use]
pub const fn mix_seed(seed: i64, salt: i64) -> i64 {
    seed.wrapping_mul(seed.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT))
        .wrapping_add(salt)
}

/// Floored modulo; the result is always in `[0, divisor)` for the
/// positive divisors used here, regardless of the sign of `value`.
#[inline]
#[must_use]
pub const fn floor_mod(value: i64, divisor: i64) -> i64 {
    value.rem_euclid(divisor)
}

/// Derive a decorrelated seed from a world seed and a fixed salt.
///
/// The salt is self-mixed three times, then folded into the world seed
/// three times. Distinct salts over the same world seed produce streams
/// with no observable correlation.
#[must_use]
pub const fn derive_seed(world_seed: i64, salt: i64) -> i64 {
    let mut mixed_salt = mix_seed(salt, salt);
    mixed_salt = mix_seed(mixed_salt, salt);
    mixed_salt = mix_seed(mixed_salt, salt);

    let mut seed = mix_seed(world_seed, mixed_salt);
    seed = mix_seed(seed, mixed_salt);
    seed = mix_seed(seed, mixed_salt);
    seed
}

/// Hash a seed with a 2D position.
///
/// Mixes `x`, `z`, `x`, then `z` again. The doubled mixing order mirrors
/// the host grid's own hash and must be kept bit-for-bit; do not simplify.
#[inline]
#[must_use]
pub const fn pos_hash(seed: i64, x: i64, z: i64) -> i64 {
    let mut s = mix_seed(seed, x);
    s = mix_seed(s, z);
    s = mix_seed(s, x);
    mix_seed(s, z)
}

/// Position-seeded uniform choice in `[0, bound)`.
///
/// Reads the hash from bit 24 up and reduces by floored modulo, matching
/// the host grid's selection bits.
#[inline]
#[must_use]
pub const fn bounded_choice(seed: i64, x: i64, z: i64, bound: i64) -> i64 {
    floor_mod(pos_hash(seed, x, z) >> 24, bound)
}
