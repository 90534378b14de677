//! # cellgate Guard
//!
//! Gate 2 of the admission-control engine: the protocol-downgrade
//! guard. A handset may only attach to a pre-5G radio when an
//! authenticated, unexpired downgrade permit from its home network has
//! been presented and validated. This is the defence against
//! false-base-station downgrade attacks.
//!
//! The crate provides:
//!
//! - [`DowngradePermit`] with its fixed wire codec and the
//!   [`PermitVerifier`] signature seam
//! - [`SessionContext`]/[`SessionPool`]: bounded per-subscriber state
//! - The 12-state machine ([`GateState`], [`GateEvent`]) driven
//!   through [`DowngradeGuard::handle`]
//!
//! Emergency calls ([`GateEvent::EmergencyDial`] with a recognised
//! number) bypass the permit requirement from any state.

#![forbid(unsafe_code)]

pub mod fsm;
pub mod guard;
pub mod permit;
pub mod session;

pub use fsm::{
    ActionRecord, EmergencyNumberSet, EventPayload, EventRecord, GateEvent, GateState,
    GuardConfig,
};
pub use guard::DowngradeGuard;
pub use permit::{
    DowngradePermit, GeoBound, PermitVerifier, Signature, SignaturePresenceVerifier,
    PERMIT_VERSION,
};
pub use session::{SessionContext, SessionPool};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
