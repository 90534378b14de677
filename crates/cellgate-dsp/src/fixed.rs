//! Saturating fixed-point scalars for the CSI correlation path.
//!
//! Two formats, matching the reference hardware configuration:
//!
//! - [`Sample`]: Q8.8 in an `i16`, one per channel component
//! - [`Accum`]: Q16.16 in an `i32`, for inner products and norms
//!
//! All arithmetic saturates at the format limits and narrowing rounds
//! to nearest. Multiplying two samples widens into an accumulator, the
//! way a hardware multiply-accumulate does.

use std::ops::{Add, Mul, Neg, Sub};

/// Integer bits of a [`Sample`].
pub const SAMPLE_INT_BITS: u32 = 8;
/// Fractional bits of a [`Sample`].
pub const SAMPLE_FRAC_BITS: u32 = 8;
/// Integer bits of an [`Accum`].
pub const ACCUM_INT_BITS: u32 = 16;
/// Fractional bits of an [`Accum`].
pub const ACCUM_FRAC_BITS: u32 = 16;

/// Newton-iteration bound for [`Accum::sqrt`].
///
/// Convergence from the x/2 seed needs up to a dozen passes at the
/// edges of the supported range; the loop exits early once the guess
/// stabilises to one ulp.
const MAX_SQRT_ITERATIONS: usize = 12;

// =============================================================================
// Sample (Q8.8)
// =============================================================================

/// Signed Q8.8 fixed-point scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sample(i16);

impl Sample {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One half, the quantisation boundary magnitude.
    pub const HALF: Self = Self(0x0080);
    /// Negative one half.
    pub const NEG_HALF: Self = Self(-0x0080);
    /// Largest representable value (~127.996).
    pub const MAX: Self = Self(i16::MAX);
    /// Smallest representable value (-128.0).
    pub const MIN: Self = Self(i16::MIN);

    /// Creates a sample from its raw Q8.8 bits.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Self {
        Self(raw)
    }

    /// Returns the raw Q8.8 bits.
    #[must_use]
    pub const fn raw(&self) -> i16 {
        self.0
    }

    /// Converts from `f64`, rounding to nearest and saturating.
    ///
    /// Non-finite inputs saturate (NaN maps to zero); callers that
    /// need to reject them validate before converting.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * f64::from(1u32 << SAMPLE_FRAC_BITS)).round();
        Self(scaled as i16)
    }

    /// Converts to `f64` exactly.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        f64::from(self.0) / f64::from(1u32 << SAMPLE_FRAC_BITS)
    }

    /// Widens into a Q16.16 accumulator, losslessly.
    #[must_use]
    pub const fn widen(&self) -> Accum {
        Accum((self.0 as i32) << (ACCUM_FRAC_BITS - SAMPLE_FRAC_BITS))
    }

    /// Saturating division.
    ///
    /// A zero divisor saturates to the signed extreme of the dividend
    /// (zero over zero is zero).
    #[must_use]
    pub fn saturating_div(self, rhs: Sample) -> Self {
        if rhs.0 == 0 {
            return match self.0.signum() {
                1 => Self::MAX,
                -1 => Self::MIN,
                _ => Self::ZERO,
            };
        }
        let num = (i32::from(self.0)) << SAMPLE_FRAC_BITS;
        Self(clamp_i16(num / i32::from(rhs.0)))
    }
}

impl Add for Sample {
    type Output = Sample;

    fn add(self, rhs: Sample) -> Sample {
        Sample(clamp_i16(i32::from(self.0) + i32::from(rhs.0)))
    }
}

impl Sub for Sample {
    type Output = Sample;

    fn sub(self, rhs: Sample) -> Sample {
        Sample(clamp_i16(i32::from(self.0) - i32::from(rhs.0)))
    }
}

impl Neg for Sample {
    type Output = Sample;

    fn neg(self) -> Sample {
        Sample(clamp_i16(-i32::from(self.0)))
    }
}

impl Mul for Sample {
    type Output = Accum;

    /// Widening multiply: Q8.8 × Q8.8 yields Q16.16 without loss.
    fn mul(self, rhs: Sample) -> Accum {
        Accum(i32::from(self.0) * i32::from(rhs.0))
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

// =============================================================================
// Accum (Q16.16)
// =============================================================================

/// Signed Q16.16 fixed-point accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Accum(i32);

impl Accum {
    /// Zero.
    pub const ZERO: Self = Self(0);
    /// One.
    pub const ONE: Self = Self(1 << ACCUM_FRAC_BITS);
    /// Largest representable value (~32767.99998).
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value (-32768.0).
    pub const MIN: Self = Self(i32::MIN);

    /// Creates an accumulator from its raw Q16.16 bits.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw Q16.16 bits.
    #[must_use]
    pub const fn raw(&self) -> i32 {
        self.0
    }

    /// Converts from `f64`, rounding to nearest and saturating.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * f64::from(1u32 << ACCUM_FRAC_BITS)).round();
        Self(scaled as i32)
    }

    /// Converts to `f64` exactly.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        f64::from(self.0) / f64::from(1u32 << ACCUM_FRAC_BITS)
    }

    /// Narrows to a Q8.8 sample, rounding to nearest and saturating.
    #[must_use]
    pub fn narrow(&self) -> Sample {
        let shift = ACCUM_FRAC_BITS - SAMPLE_FRAC_BITS;
        let rounded = (i64::from(self.0) + (1 << (shift - 1))) >> shift;
        Sample(clamp_i16_from_i64(rounded))
    }

    /// Saturating division.
    ///
    /// A zero divisor saturates to the signed extreme of the dividend.
    #[must_use]
    pub fn saturating_div(self, rhs: Accum) -> Self {
        if rhs.0 == 0 {
            return match self.0.signum() {
                1 => Self::MAX,
                -1 => Self::MIN,
                _ => Self::ZERO,
            };
        }
        let num = i64::from(self.0) << ACCUM_FRAC_BITS;
        Self(clamp_i32(num / i64::from(rhs.0)))
    }

    /// Approximate square root of a non-negative accumulator.
    ///
    /// Newton mean iteration seeded with the argument shifted right by
    /// one, run until the guess stabilises (at most
    /// `MAX_SQRT_ITERATIONS` passes). Zero and negative arguments map
    /// to zero. Relative error stays within 0.5 % for arguments in
    /// [1/16, 16]; outside that band the result is best effort.
    #[must_use]
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        let x = i64::from(self.0);
        let mut guess = (x >> 1).max(1);
        for _ in 0..MAX_SQRT_ITERATIONS {
            let quotient = (x << ACCUM_FRAC_BITS) / guess;
            let next = (guess + quotient) >> 1;
            let settled = (next - guess).abs() <= 1;
            guess = next;
            if settled {
                break;
            }
        }
        Self(clamp_i32(guess))
    }
}

impl Add for Accum {
    type Output = Accum;

    fn add(self, rhs: Accum) -> Accum {
        Accum(clamp_i32(i64::from(self.0) + i64::from(rhs.0)))
    }
}

impl Sub for Accum {
    type Output = Accum;

    fn sub(self, rhs: Accum) -> Accum {
        Accum(clamp_i32(i64::from(self.0) - i64::from(rhs.0)))
    }
}

impl Neg for Accum {
    type Output = Accum;

    fn neg(self) -> Accum {
        Accum(clamp_i32(-i64::from(self.0)))
    }
}

impl Mul for Accum {
    type Output = Accum;

    /// Q16.16 × Q16.16, rounded to nearest back into Q16.16, saturating.
    fn mul(self, rhs: Accum) -> Accum {
        let wide = i64::from(self.0) * i64::from(rhs.0);
        let rounded = (wide + (1 << (ACCUM_FRAC_BITS - 1))) >> ACCUM_FRAC_BITS;
        Accum(clamp_i32(rounded))
    }
}

impl std::fmt::Display for Accum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn clamp_i16_from_i64(value: i64) -> i16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
