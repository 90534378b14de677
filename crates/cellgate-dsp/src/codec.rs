//! Fingerprint codec: channel vector to 256-bit handle and back.
//!
//! Each antenna contributes one nibble: the real component's 2-bit
//! quantisation code in the high two bits, the imaginary component's
//! in the low two. Nibble `i` sits at bit offset `4·i` of the handle.
//!
//! Quantisation boundaries are {−∞, −0.5, 0, +0.5, +∞} giving codes
//! {0, 1, 2, 3}. Dequantisation uses the interval midpoints
//! −¾, −¼, +¼, +¾. The mapping is deliberately asymmetric: the sign
//! and magnitude ordering survives the correlation step, and no
//! dequantised value is zero (a zero would nullify its products).

use serde::{Deserialize, Serialize};

use cellgate_core::{ANTENNA_COUNT, HANDLE_BYTES};

use crate::fixed::Sample;
use crate::vector::{ChannelVector, ComplexSample};

/// Dequantisation midpoints indexed by code, in Q8.8 raw form.
const MIDPOINTS: [i16; 4] = [-0x00C0, -0x0040, 0x0040, 0x00C0];

/// 256-bit opaque fingerprint of a channel vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerprintHandle([u8; HANDLE_BYTES]);

impl FingerprintHandle {
    /// Encodes a channel vector into its fingerprint handle.
    ///
    /// Deterministic and order-sensitive: the same vector always
    /// yields the same handle, and permuting antennas changes it.
    #[must_use]
    pub fn from_vector(vector: &ChannelVector) -> Self {
        let mut bytes = [0u8; HANDLE_BYTES];
        for (i, sample) in vector.iter().enumerate() {
            let nibble = (quantise(sample.re) << 2) | quantise(sample.im);
            bytes[i / 2] |= nibble << (4 * (i % 2));
        }
        Self(bytes)
    }

    /// Wraps raw handle bytes (e.g. read back from the registry).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HANDLE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Borrows the handle bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HANDLE_BYTES] {
        &self.0
    }

    /// Dequantises the stored sample for one antenna.
    ///
    /// # Panics
    ///
    /// Panics if `antenna >= ANTENNA_COUNT`.
    #[must_use]
    pub fn sample_at(&self, antenna: usize) -> ComplexSample {
        assert!(antenna < ANTENNA_COUNT, "antenna index out of range");
        let nibble = (self.0[antenna / 2] >> (4 * (antenna % 2))) & 0x0F;
        ComplexSample::new(
            Sample::from_raw(MIDPOINTS[usize::from(nibble >> 2)]),
            Sample::from_raw(MIDPOINTS[usize::from(nibble & 0x03)]),
        )
    }
}

impl std::fmt::Display for FingerprintHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Maps a Q8.8 component to its 2-bit quantisation code.
fn quantise(sample: Sample) -> u8 {
    if sample < Sample::NEG_HALF {
        0
    } else if sample < Sample::ZERO {
        1
    } else if sample < Sample::HALF {
        2
    } else {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn vector_of(value: Complex64) -> ChannelVector {
        ChannelVector::from_complex(&vec![value; ANTENNA_COUNT]).unwrap()
    }

    #[test]
    fn test_quantisation_codes() {
        assert_eq!(quantise(Sample::from_f64(-2.0)), 0);
        assert_eq!(quantise(Sample::from_f64(-0.51)), 0);
        assert_eq!(quantise(Sample::NEG_HALF), 1);
        assert_eq!(quantise(Sample::from_f64(-0.1)), 1);
        assert_eq!(quantise(Sample::ZERO), 2);
        assert_eq!(quantise(Sample::from_f64(0.49)), 2);
        assert_eq!(quantise(Sample::HALF), 3);
        assert_eq!(quantise(Sample::from_f64(3.0)), 3);
    }

    #[test]
    fn test_nibble_layout() {
        // Antenna 0 occupies the low nibble of byte 0, antenna 1 the
        // high nibble. Real code sits in the high two bits of each.
        let mut samples = [ComplexSample::ZERO; ANTENNA_COUNT];
        samples[0] = ComplexSample::new(Sample::from_f64(0.75), Sample::from_f64(-0.75));
        samples[1] = ComplexSample::new(Sample::from_f64(-0.25), Sample::from_f64(0.25));
        let handle = FingerprintHandle::from_vector(&ChannelVector::from_samples(samples));
        // codes: a0 = (3, 0) -> 0b1100; a1 = (1, 2) -> 0b0110
        assert_eq!(handle.as_bytes()[0], 0b0110_1100);
    }

    #[test]
    fn test_encoding_is_deterministic_and_order_sensitive() {
        let mut samples = [ComplexSample::ZERO; ANTENNA_COUNT];
        samples[0] = ComplexSample::new(Sample::from_f64(0.75), Sample::ZERO);
        let a = FingerprintHandle::from_vector(&ChannelVector::from_samples(samples));
        let b = FingerprintHandle::from_vector(&ChannelVector::from_samples(samples));
        assert_eq!(a, b);

        samples.swap(0, 1);
        let c = FingerprintHandle::from_vector(&ChannelVector::from_samples(samples));
        assert_ne!(a, c);
    }

    #[test]
    fn test_dequantisation_midpoints() {
        let handle = FingerprintHandle::from_vector(&vector_of(Complex64::new(0.6, -0.6)));
        let s = handle.sample_at(17);
        assert!((s.re.to_f64() - 0.75).abs() < 1e-9);
        assert!((s.im.to_f64() + 0.75).abs() < 1e-9);

        let handle = FingerprintHandle::from_vector(&vector_of(Complex64::new(0.1, -0.1)));
        let s = handle.sample_at(0);
        assert!((s.re.to_f64() - 0.25).abs() < 1e-9);
        assert!((s.im.to_f64() + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_no_dequantised_value_is_zero() {
        let handle = FingerprintHandle::from_vector(&vector_of(Complex64::new(0.0, 0.0)));
        for antenna in 0..ANTENNA_COUNT {
            let s = handle.sample_at(antenna);
            assert_ne!(s.re, Sample::ZERO);
            assert_ne!(s.im, Sample::ZERO);
        }
    }

    #[test]
    fn test_display_is_hex() {
        let handle = FingerprintHandle::from_bytes([0xAB; HANDLE_BYTES]);
        assert_eq!(handle.to_string(), "ab".repeat(HANDLE_BYTES));
    }
}
