//! # cellgate Core
//!
//! Core types, errors, and constants for the cellgate two-stage
//! admission-control engine.
//!
//! This crate provides the foundational building blocks shared by the
//! rest of the cellgate workspace:
//!
//! - **Identity and time**: [`SubscriberId`], [`PlmnId`], and the
//!   wrap-tolerant modular [`Timestamp`] used for every freshness and
//!   validity comparison.
//! - **Authorisation**: [`RatBitmap`], the 4-bit radio-access-technology
//!   mask carried on permits and emitted on every gate action, and
//!   [`IssuerKey`], the configured home-network public key.
//! - **Errors**: the [`error`] module, with per-subsystem error types
//!   aggregated into [`CoreError`].
//!
//! ## Example
//!
//! ```rust
//! use cellgate_core::{RatBitmap, Timestamp};
//!
//! let rats = RatBitmap::NR_ONLY;
//! assert!(rats.permits(RatBitmap::NR));
//! assert!(!rats.permits(RatBitmap::GSM));
//!
//! let enrolled = Timestamp::new(1_000);
//! let now = Timestamp::new(1_100);
//! assert_eq!(now.age_since(enrolled), 100);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult, DspError, PermitError, RegistryError, StreamError};
pub use types::{IssuerKey, PlmnId, RatBitmap, SubscriberId, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of antenna elements in a channel vector.
///
/// Compile-time configuration; 64 is the reference massive-MIMO panel.
pub const ANTENNA_COUNT: usize = 64;

/// Size of a fingerprint handle in bytes (256 bits).
pub const HANDLE_BYTES: usize = 32;

/// Default correlation acceptance threshold for Gate 1.
pub const DEFAULT_ACCEPT_THRESHOLD: f64 = 0.8;

/// Default binding validity window in timestamp ticks (500 ms at 1 GHz).
pub const DEFAULT_BINDING_VALIDITY: u64 = 500_000_000;

/// Default cap on a downgrade permit's validity window (1 h at 1 GHz).
pub const DEFAULT_MAX_PERMIT_VALIDITY: u64 = 3_600_000_000_000;

/// Default binding-registry capacity.
pub const DEFAULT_REGISTRY_CAPACITY: usize = 10_000;

/// Default linear-probe limit for the binding registry.
pub const DEFAULT_PROBE_LIMIT: usize = 4;

/// Default number of concurrent session contexts.
pub const DEFAULT_SESSION_CAPACITY: usize = 8;

/// Default per-context transition bound before forced fail-safe.
pub const DEFAULT_MAX_TRANSITIONS: u32 = 64;

/// Packed ASCII literal "911".
pub const EMERGENCY_911: u32 = 0x39_3131;

/// Packed ASCII literal "112".
pub const EMERGENCY_112: u32 = 0x31_3132;

/// Prelude module for convenient imports.
///
/// ```rust
/// use cellgate_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{IssuerKey, PlmnId, RatBitmap, SubscriberId, Timestamp};
}
