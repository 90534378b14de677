//! # cellgate Engine
//!
//! The top-level two-stage admission-control engine for cellular
//! baseband registration:
//!
//! - **Gate 1** correlates a live multi-antenna channel fingerprint
//!   against the subscriber's enrolled fingerprint; a spoofed
//!   identity or a relay measures a different channel and fails to
//!   correlate.
//! - **Gate 2** forbids attachment to any pre-5G radio unless an
//!   authenticated, unexpired downgrade permit from the subscriber's
//!   home network has been validated. Emergency calls bypass the
//!   permit requirement.
//!
//! The engine is single-threaded and cooperative: push records onto
//! the input streams, call [`AdmissionEngine::step`] to make
//! progress, poll decisions and actions off the output streams.
//!
//! ## Example
//!
//! ```rust
//! use cellgate_core::{SubscriberId, Timestamp};
//! use cellgate_engine::{AdmissionEngine, EngineConfig};
//! use cellgate_guard::{EventRecord, GateEvent, GateState};
//!
//! let mut engine = AdmissionEngine::new(EngineConfig::default()).unwrap();
//! let subscriber = SubscriberId::new(0x12345678);
//!
//! engine
//!     .push_event(EventRecord::new(GateEvent::NrFound, subscriber, Timestamp::new(1)))
//!     .unwrap();
//! engine.step();
//!
//! let action = engine.poll_action().unwrap();
//! assert_eq!(action.new_state, GateState::NrAttaching);
//! assert!(action.allow_attach);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;

pub use config::{EngineConfig, EngineConfigBuilder, DEFAULT_STREAM_DEPTH};
pub use engine::AdmissionEngine;

// Re-export the record types an embedding needs to drive the engine.
pub use cellgate_guard::{
    ActionRecord, DowngradePermit, EmergencyNumberSet, EventPayload, EventRecord, GateEvent,
    GateState, PermitVerifier, Signature, SignaturePresenceVerifier, PERMIT_VERSION,
};
pub use cellgate_plab::{AdmissionRequest, AdmitDecision, AdmitOutcome, BindingUpdate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
