//! Quantized climate parameters for nearest-hypercube label matching.
//!
//! Climate values are quantized to long integers so distance math is
//! integer-exact, the same trick vanilla's `Climate.java` uses for biome
//! lookup. A multi-dimensional sample ([`TargetPoint`]) is matched
//! against axis-aligned hypercubes ([`ParameterPoint`]) by squared
//! distance; ties resolve to the earliest registered hypercube.

mod types;

pub use types::{Parameter, ParameterPoint, TargetPoint};

/// Quantization factor used to convert floats to longs
/// (vanilla `Climate.java`'s exact value).
pub const QUANTIZATION_FACTOR: f32 = 10000.0;

/// Quantize a climate value to a long integer.
///
/// The input goes through f32 before the multiply, matching vanilla's
/// `Climate.quantizeCoord()` float behavior bit-for-bit.
#[inline]
#[must_use]
pub fn quantize_coord(coord: f64) -> i64 {
    ((coord as f32) * QUANTIZATION_FACTOR) as i64
}

/// Unquantize a long integer back to a float.
#[inline]
#[must_use]
pub fn unquantize_coord(coord: i64) -> f32 {
    coord as f32 / QUANTIZATION_FACTOR
}
