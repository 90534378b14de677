//! # cellgate PLAB
//!
//! Physical-layer admission binding: the fixed-capacity fingerprint
//! registry and the Gate 1 engine that correlates live channel
//! measurements against enrolled fingerprints.
//!
//! Admission is a pure decision pipeline (lookup, freshness check,
//! correlation, threshold) with four outcomes:
//! [`AdmitDecision::Accept`], [`AdmitDecision::Reject`],
//! [`AdmitDecision::Unknown`], [`AdmitDecision::Expired`].

#![forbid(unsafe_code)]

pub mod gate;
pub mod registry;

pub use gate::{AdmissionGate, AdmissionRequest, AdmitDecision, AdmitOutcome, BindingUpdate};
pub use registry::{BindingEntry, BindingRegistry, RegistryStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
