//! Complex fixed-point samples and the per-measurement channel vector.

use num_complex::Complex64;

use cellgate_core::{DspError, ANTENNA_COUNT};

use crate::fixed::{Accum, Sample};

/// One complex channel coefficient in Q8.8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ComplexSample {
    /// Real component.
    pub re: Sample,
    /// Imaginary component.
    pub im: Sample,
}

impl ComplexSample {
    /// Zero.
    pub const ZERO: Self = Self {
        re: Sample::ZERO,
        im: Sample::ZERO,
    };

    /// Creates a complex sample from its components.
    #[must_use]
    pub const fn new(re: Sample, im: Sample) -> Self {
        Self { re, im }
    }

    /// Quantises a double-precision complex value, saturating.
    #[must_use]
    pub fn from_complex64(value: Complex64) -> Self {
        Self {
            re: Sample::from_f64(value.re),
            im: Sample::from_f64(value.im),
        }
    }

    /// Converts back to double precision exactly.
    #[must_use]
    pub fn to_complex64(&self) -> Complex64 {
        Complex64::new(self.re.to_f64(), self.im.to_f64())
    }

    /// Squared magnitude, widened into the accumulator format.
    #[must_use]
    pub fn magnitude_squared(&self) -> Accum {
        self.re * self.re + self.im * self.im
    }
}

/// An ordered sequence of exactly [`ANTENNA_COUNT`] complex samples,
/// one per antenna element.
///
/// The vector has no identity beyond its values. Fixed-size by
/// construction so the correlation path never allocates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelVector([ComplexSample; ANTENNA_COUNT]);

impl ChannelVector {
    /// Wraps an already-quantised sample array.
    #[must_use]
    pub const fn from_samples(samples: [ComplexSample; ANTENNA_COUNT]) -> Self {
        Self(samples)
    }

    /// Quantises a slice of double-precision CSI coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`DspError::AntennaCount`] if the slice length differs
    /// from [`ANTENNA_COUNT`], and [`DspError::NonFiniteSample`] if
    /// any coefficient is NaN or infinite.
    pub fn from_complex(coefficients: &[Complex64]) -> Result<Self, DspError> {
        if coefficients.len() != ANTENNA_COUNT {
            return Err(DspError::AntennaCount {
                expected: ANTENNA_COUNT,
                actual: coefficients.len(),
            });
        }
        let mut samples = [ComplexSample::ZERO; ANTENNA_COUNT];
        for (index, &c) in coefficients.iter().enumerate() {
            if !c.re.is_finite() || !c.im.is_finite() {
                return Err(DspError::NonFiniteSample {
                    index,
                    value: if c.re.is_finite() { c.im } else { c.re },
                });
            }
            samples[index] = ComplexSample::from_complex64(c);
        }
        Ok(Self(samples))
    }

    /// Borrows the sample array.
    #[must_use]
    pub const fn samples(&self) -> &[ComplexSample; ANTENNA_COUNT] {
        &self.0
    }

    /// Iterates over the samples in antenna order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplexSample> {
        self.0.iter()
    }

    /// Squared Euclidean norm over all antennas, saturating.
    #[must_use]
    pub fn norm_squared(&self) -> Accum {
        self.0
            .iter()
            .fold(Accum::ZERO, |acc, s| acc + s.magnitude_squared())
    }
}
