//! # cellgate DSP
//!
//! Fixed-point signal path for Gate 1: quantisation, the fingerprint
//! codec, and the correlation scorer.
//!
//! The pipeline is allocation-free and produces one score per input
//! vector:
//!
//! 1. A live CSI measurement arrives as [`ChannelVector`] (Q8.8
//!    complex samples, one per antenna).
//! 2. Enrolment encodes a vector into a 256-bit
//!    [`FingerprintHandle`] via [`FingerprintHandle::from_vector`].
//! 3. Admission computes [`score`] between the live vector and the
//!    stored handle, in Q16.16 throughout.
//!
//! ## Example
//!
//! ```rust
//! use cellgate_dsp::{score, ChannelVector, FingerprintHandle};
//! use num_complex::Complex64;
//!
//! let coeffs = vec![Complex64::new(0.8, -0.3); cellgate_core::ANTENNA_COUNT];
//! let live = ChannelVector::from_complex(&coeffs).unwrap();
//! let handle = FingerprintHandle::from_vector(&live);
//! assert!(score(&live, &handle).to_f64() > 0.8);
//! ```

#![forbid(unsafe_code)]

pub mod codec;
pub mod correlation;
pub mod fixed;
pub mod vector;

pub use codec::FingerprintHandle;
pub use correlation::{score, DENOMINATOR_EPSILON};
pub use fixed::{Accum, Sample};
pub use vector::{ChannelVector, ComplexSample};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
