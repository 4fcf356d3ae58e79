//! Climate parameter types.

use super::{QUANTIZATION_FACTOR, quantize_coord};

/// A sampled climate point with six quantized parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPoint {
    /// Temperature parameter.
    pub temperature: i64,
    /// Humidity/vegetation parameter.
    pub humidity: i64,
    /// Continentalness parameter (inland vs ocean).
    pub continentalness: i64,
    /// Erosion parameter.
    pub erosion: i64,
    /// Depth parameter (surface vs underground).
    pub depth: i64,
    /// Weirdness/ridges parameter.
    pub weirdness: i64,
}

impl TargetPoint {
    /// Create a target point from already-quantized values.
    #[must_use]
    pub const fn new(
        temperature: i64,
        humidity: i64,
        continentalness: i64,
        erosion: i64,
        depth: i64,
        weirdness: i64,
    ) -> Self {
        Self {
            temperature,
            humidity,
            continentalness,
            erosion,
            depth,
            weirdness,
        }
    }

    /// Create a target point from float values (quantized on the way in).
    #[must_use]
    pub fn from_floats(
        temperature: f64,
        humidity: f64,
        continentalness: f64,
        erosion: f64,
        depth: f64,
        weirdness: f64,
    ) -> Self {
        Self {
            temperature: quantize_coord(temperature),
            humidity: quantize_coord(humidity),
            continentalness: quantize_coord(continentalness),
            erosion: quantize_coord(erosion),
            depth: quantize_coord(depth),
            weirdness: quantize_coord(weirdness),
        }
    }

    /// The all-zero point. Handy as a neutral sample in tests and for
    /// fixed samplers.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0, 0, 0, 0, 0)
    }
}

/// A quantized `[min, max]` range one climate axis can match.
///
/// Distance is 0 inside the range and grows linearly outside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    /// Minimum value (quantized).
    pub min: i64,
    /// Maximum value (quantized).
    pub max: i64,
}

impl Parameter {
    /// Create a range from already-quantized bounds.
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Create a single-value range.
    #[must_use]
    pub fn point(value: f32) -> Self {
        Self::span(value, value)
    }

    /// Create a range from float bounds.
    #[must_use]
    pub fn span(min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "min > max: {min} > {max}");
        Self {
            min: (min * QUANTIZATION_FACTOR) as i64,
            max: (max * QUANTIZATION_FACTOR) as i64,
        }
    }

    /// Distance from a target value to this range.
    #[inline]
    #[must_use]
    pub const fn distance(&self, target: i64) -> i64 {
        let above = target - self.max;
        let below = self.min - target;
        if above > 0 {
            above
        } else if below > 0 {
            below
        } else {
            0
        }
    }
}

/// An axis-aligned hypercube over all six climate parameters, plus a
/// quantized offset acting as a built-in selection penalty.
#[derive(Debug, Clone, Copy)]
pub struct ParameterPoint {
    /// Temperature range.
    pub temperature: Parameter,
    /// Humidity range.
    pub humidity: Parameter,
    /// Continentalness range.
    pub continentalness: Parameter,
    /// Erosion range.
    pub erosion: Parameter,
    /// Depth range.
    pub depth: Parameter,
    /// Weirdness range.
    pub weirdness: Parameter,
    /// Offset (quantized), added to every fitness as a tiebreaker bias.
    pub offset: i64,
}

impl ParameterPoint {
    /// Create a new hypercube.
    #[must_use]
    pub const fn new(
        temperature: Parameter,
        humidity: Parameter,
        continentalness: Parameter,
        erosion: Parameter,
        depth: Parameter,
        weirdness: Parameter,
        offset: i64,
    ) -> Self {
        Self {
            temperature,
            humidity,
            continentalness,
            erosion,
            depth,
            weirdness,
            offset,
        }
    }

    /// A hypercube covering a single point in climate space, zero offset.
    #[must_use]
    pub fn point(
        temperature: f32,
        humidity: f32,
        continentalness: f32,
        erosion: f32,
        depth: f32,
        weirdness: f32,
    ) -> Self {
        Self::new(
            Parameter::point(temperature),
            Parameter::point(humidity),
            Parameter::point(continentalness),
            Parameter::point(erosion),
            Parameter::point(depth),
            Parameter::point(weirdness),
            0,
        )
    }

    /// Fitness (squared distance) between this hypercube and a target.
    ///
    /// Lower is better; 0 means the target lies inside the hypercube and
    /// the offset is 0.
    #[must_use]
    #[expect(clippy::many_single_char_names, reason = "axis-per-letter math")]
    pub const fn fitness(&self, target: &TargetPoint) -> i64 {
        let t = self.temperature.distance(target.temperature);
        let h = self.humidity.distance(target.humidity);
        let c = self.continentalness.distance(target.continentalness);
        let e = self.erosion.distance(target.erosion);
        let d = self.depth.distance(target.depth);
        let w = self.weirdness.distance(target.weirdness);

        t * t + h * h + c * c + e * e + d * d + w * w + self.offset * self.offset
    }
}
