//! The downgrade-prevention state machine.
//!
//! Twelve states, fourteen events, one action per event. The safety
//! property the whole engine rests on: no path reaches a legacy
//! connection without passing through permit validation with a
//! verifying signature and a covering window. Emergency calls bypass
//! everything but never touch the cached permit.

use serde::{Deserialize, Serialize};

use cellgate_core::{
    IssuerKey, RatBitmap, SubscriberId, Timestamp, DEFAULT_MAX_PERMIT_VALIDITY,
    DEFAULT_MAX_TRANSITIONS, DEFAULT_SESSION_CAPACITY, EMERGENCY_112, EMERGENCY_911,
};

use crate::permit::{DowngradePermit, PermitVerifier};
use crate::session::SessionContext;

// ---------------------------------------------------------------------------
// States and events
// ---------------------------------------------------------------------------

/// Machine state of one subscriber's downgrade guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateState {
    /// Power-on; no network access yet.
    Init,
    /// Searching for 5G cells.
    NrScanning,
    /// 5G NAS registration in progress.
    NrAttaching,
    /// Attached to 5G.
    NrConnected,
    /// Downgrade permit requested from the home network.
    PermitRequest,
    /// Cached permit under validation.
    PermitValidation,
    /// Permit valid; legacy attachment authorised.
    LegacyAllowed,
    /// Attaching to a 4G/3G/2G network.
    LegacyAttaching,
    /// Attached to a legacy network under a live permit.
    LegacyConnected,
    /// Emergency call in progress; permit requirement waived.
    EmergencyBypass,
    /// Downgrade denied; returning to 5G scanning.
    Reject,
    /// Unrecoverable; emergency-only mode.
    FailSafe,
}

impl GateState {
    /// Every reachable state, for exhaustive checks.
    pub const ALL: [GateState; 12] = [
        GateState::Init,
        GateState::NrScanning,
        GateState::NrAttaching,
        GateState::NrConnected,
        GateState::PermitRequest,
        GateState::PermitValidation,
        GateState::LegacyAllowed,
        GateState::LegacyAttaching,
        GateState::LegacyConnected,
        GateState::EmergencyBypass,
        GateState::Reject,
        GateState::FailSafe,
    ];
}

/// Input event kind for the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateEvent {
    /// 5G cell detected during scan.
    NrFound,
    /// 5G registration succeeded.
    NrAttached,
    /// 5G signal lost.
    NrLost,
    /// NAS service reject received.
    ServiceReject,
    /// Downgrade permit arrived from the home network.
    PermitReceived,
    /// External validation reported the permit valid.
    PermitValid,
    /// External validation reported the permit invalid.
    PermitInvalid,
    /// Permit validity period elapsed.
    PermitExpired,
    /// Legacy attachment succeeded.
    LegacyAttached,
    /// Legacy attachment failed.
    LegacyFailed,
    /// User dialled a number flagged as emergency.
    EmergencyDial,
    /// Emergency call ended.
    EmergencyEnd,
    /// Operation timed out.
    Timeout,
    /// Unspecified error.
    Error,
}

impl GateEvent {
    /// Every event kind, for exhaustive checks.
    pub const ALL: [GateEvent; 14] = [
        GateEvent::NrFound,
        GateEvent::NrAttached,
        GateEvent::NrLost,
        GateEvent::ServiceReject,
        GateEvent::PermitReceived,
        GateEvent::PermitValid,
        GateEvent::PermitInvalid,
        GateEvent::PermitExpired,
        GateEvent::LegacyAttached,
        GateEvent::LegacyFailed,
        GateEvent::EmergencyDial,
        GateEvent::EmergencyEnd,
        GateEvent::Timeout,
        GateEvent::Error,
    ];
}

/// Event payload, discriminated by event kind.
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    /// No payload.
    #[default]
    Empty,
    /// Carried by [`GateEvent::PermitReceived`].
    Permit(DowngradePermit),
    /// Carried by [`GateEvent::EmergencyDial`]: packed ASCII digits.
    DialedNumber(u32),
    /// Carried by [`GateEvent::ServiceReject`]: NAS cause code.
    CauseCode(u8),
}

/// One input record for the guard.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// Event kind.
    pub kind: GateEvent,
    /// Subscriber the event belongs to.
    pub subscriber: SubscriberId,
    /// Event timestamp.
    pub timestamp: Timestamp,
    /// Kind-discriminated payload.
    pub payload: EventPayload,
    /// Stream framing: final record of a burst.
    pub last: bool,
}

impl EventRecord {
    /// Payload-free event.
    #[must_use]
    pub fn new(kind: GateEvent, subscriber: SubscriberId, timestamp: Timestamp) -> Self {
        Self {
            kind,
            subscriber,
            timestamp,
            payload: EventPayload::Empty,
            last: false,
        }
    }

    /// Permit delivery event.
    #[must_use]
    pub fn permit_received(
        subscriber: SubscriberId,
        timestamp: Timestamp,
        permit: DowngradePermit,
    ) -> Self {
        Self {
            kind: GateEvent::PermitReceived,
            subscriber,
            timestamp,
            payload: EventPayload::Permit(permit),
            last: false,
        }
    }

    /// Emergency dial event with the packed ASCII number.
    #[must_use]
    pub fn emergency_dial(subscriber: SubscriberId, timestamp: Timestamp, number: u32) -> Self {
        Self {
            kind: GateEvent::EmergencyDial,
            subscriber,
            timestamp,
            payload: EventPayload::DialedNumber(number),
            last: false,
        }
    }

    /// Service reject event with its NAS cause code.
    #[must_use]
    pub fn service_reject(subscriber: SubscriberId, timestamp: Timestamp, cause: u8) -> Self {
        Self {
            kind: GateEvent::ServiceReject,
            subscriber,
            timestamp,
            payload: EventPayload::CauseCode(cause),
            last: false,
        }
    }
}

/// One output action, emitted per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Subscriber the action applies to.
    pub subscriber: SubscriberId,
    /// State after the transition.
    pub new_state: GateState,
    /// State before the transition.
    pub previous_state: GateState,
    /// Event that triggered the transition.
    pub trigger: GateEvent,
    /// Whether attachment may proceed.
    pub allow_attach: bool,
    /// Whether a permit request should be sent to the home network.
    pub request_permit: bool,
    /// Whether a security event must be logged.
    pub log_security: bool,
    /// RATs permitted after this transition.
    pub allowed_rats: RatBitmap,
    /// Stream framing passthrough.
    pub last: bool,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Emergency-number recognition set.
///
/// A dialled number is recognised when it equals a configured packed
/// ASCII literal, or when its upper 24 bits do (so "911" plus one
/// trailing digit still bypasses). The reference set covers "911" and
/// "112"; deployments tighten or extend it as policy requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyNumberSet(Vec<u32>);

impl EmergencyNumberSet {
    /// Builds a set from packed ASCII literals.
    #[must_use]
    pub fn new(numbers: Vec<u32>) -> Self {
        Self(numbers)
    }

    /// Whether `dialed` is treated as an emergency number.
    #[must_use]
    pub fn recognises(&self, dialed: u32) -> bool {
        self.0
            .iter()
            .any(|&literal| dialed == literal || (dialed >> 8) == literal)
    }
}

impl Default for EmergencyNumberSet {
    fn default() -> Self {
        Self(vec![EMERGENCY_911, EMERGENCY_112])
    }
}

/// Configuration for the downgrade guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Concurrent session contexts (default: 8)
    pub session_capacity: usize,
    /// Transition bound per context before forced fail-safe (default: 64)
    pub max_transitions: u32,
    /// Attach failures tolerated before fail-safe (default: 3)
    pub max_attach_failures: u32,
    /// Cap on a permit's validity window length in ticks
    pub max_permit_validity: u64,
    /// Emergency-number recognition set
    pub emergency_numbers: EmergencyNumberSet,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            session_capacity: DEFAULT_SESSION_CAPACITY,
            max_transitions: DEFAULT_MAX_TRANSITIONS,
            max_attach_failures: 3,
            max_permit_validity: DEFAULT_MAX_PERMIT_VALIDITY,
            emergency_numbers: EmergencyNumberSet::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// Applies one event to a context, producing exactly one action.
///
/// Total over every (state, event) pair. The emergency override runs
/// before the state-indexed logic and is exempt from the
/// transition-storm fail-safe so emergency liveness survives an event
/// flood.
pub(crate) fn transition<V: PermitVerifier>(
    ctx: &mut SessionContext,
    input: &EventRecord,
    verifier: &V,
    issuer_key: &IssuerKey,
    config: &GuardConfig,
) -> ActionRecord {
    let mut action = ActionRecord {
        subscriber: ctx.subscriber,
        new_state: ctx.current_state,
        previous_state: ctx.current_state,
        trigger: input.kind,
        allow_attach: false,
        request_permit: false,
        log_security: false,
        allowed_rats: RatBitmap::NR_ONLY,
        last: input.last,
    };
    ctx.previous_state = ctx.current_state;

    let overridden = apply_emergency_override(ctx, input, &mut action, config);
    if !overridden {
        apply_state_transition(ctx, input, verifier, issuer_key, config, &mut action);
    }
    action.new_state = ctx.current_state;

    ctx.transition_count = ctx.transition_count.saturating_add(1);
    if !overridden && ctx.transition_count > config.max_transitions {
        ctx.current_state = GateState::FailSafe;
        action.new_state = GateState::FailSafe;
        action.log_security = true;
    }
    ctx.state_entry_time = input.timestamp;

    action
}

/// Emergency priority path. Returns `true` when it consumed the event.
fn apply_emergency_override(
    ctx: &mut SessionContext,
    input: &EventRecord,
    action: &mut ActionRecord,
    config: &GuardConfig,
) -> bool {
    if input.kind == GateEvent::EmergencyDial {
        if let EventPayload::DialedNumber(number) = input.payload {
            if config.emergency_numbers.recognises(number) {
                ctx.current_state = GateState::EmergencyBypass;
                ctx.in_emergency = true;
                ctx.emergency_number = number;
                action.allow_attach = true;
                action.allowed_rats = RatBitmap::ALL;
                action.log_security = true;
                return true;
            }
        }
    }

    if input.kind == GateEvent::EmergencyEnd && ctx.in_emergency {
        ctx.in_emergency = false;
        ctx.current_state = GateState::NrScanning;
        action.allowed_rats = RatBitmap::NR_ONLY;
        return true;
    }

    false
}

/// State-indexed transition logic. Anything unlisted stays put.
fn apply_state_transition<V: PermitVerifier>(
    ctx: &mut SessionContext,
    input: &EventRecord,
    verifier: &V,
    issuer_key: &IssuerKey,
    config: &GuardConfig,
    action: &mut ActionRecord,
) {
    let window_covers = ctx
        .cached_permit
        .as_ref()
        .is_some_and(|p| p.covers(input.timestamp));
    let permit_rats = ctx
        .cached_permit
        .as_ref()
        .map(|p| p.allowed_rats)
        .unwrap_or(RatBitmap::NONE);

    match ctx.current_state {
        GateState::Init => {
            // Power-on advance is automatic; the triggering event is
            // then interpreted under scanning rules so the first real
            // event (e.g. a found cell) is not swallowed.
            ctx.current_state = GateState::NrScanning;
            apply_state_transition(ctx, input, verifier, issuer_key, config, action);
        }

        GateState::NrScanning => match input.kind {
            GateEvent::NrFound => {
                ctx.current_state = GateState::NrAttaching;
                action.allow_attach = true;
            }
            GateEvent::Timeout => {
                // No 5G within the scan window: legacy needs a permit
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
                action.log_security = true;
            }
            _ => {}
        },

        GateState::NrAttaching => match input.kind {
            GateEvent::NrAttached => {
                ctx.current_state = GateState::NrConnected;
                action.allow_attach = true;
            }
            GateEvent::ServiceReject => {
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
                action.log_security = true;
            }
            GateEvent::Timeout | GateEvent::Error => {
                ctx.attach_failures = ctx.attach_failures.saturating_add(1);
                if ctx.attach_failures > config.max_attach_failures {
                    ctx.current_state = GateState::FailSafe;
                    action.log_security = true;
                } else {
                    ctx.current_state = GateState::NrScanning;
                }
            }
            _ => {}
        },

        GateState::NrConnected => match input.kind {
            GateEvent::NrLost | GateEvent::ServiceReject => {
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
                action.log_security = true;
            }
            _ => {
                action.allow_attach = true;
            }
        },

        GateState::PermitRequest => match (input.kind, &input.payload) {
            (GateEvent::PermitReceived, EventPayload::Permit(permit)) => {
                ctx.cached_permit = Some(permit.clone());
                ctx.current_state = GateState::PermitValidation;
            }
            (GateEvent::NrFound, _) => {
                // 5G came back; cancel the permit request
                ctx.current_state = GateState::NrAttaching;
                action.allow_attach = true;
            }
            (GateEvent::Timeout, _) => {
                ctx.current_state = GateState::Reject;
                action.log_security = true;
            }
            _ => {
                action.request_permit = true;
            }
        },

        GateState::PermitValidation => {
            let verdict = ctx.cached_permit.as_ref().map(|p| {
                let valid = verifier.verify(p, issuer_key)
                    && p.covers(input.timestamp)
                    && p.window_length() <= config.max_permit_validity;
                (valid, p.allowed_rats, p.valid_until)
            });
            match verdict {
                Some((true, rats, valid_until)) => {
                    ctx.has_permit = true;
                    ctx.permit_expiry = valid_until;
                    ctx.permit_failures = 0;
                    ctx.current_state = GateState::LegacyAllowed;
                    action.allow_attach = true;
                    action.allowed_rats = rats;
                }
                _ => {
                    ctx.permit_failures = ctx.permit_failures.saturating_add(1);
                    ctx.current_state = GateState::Reject;
                    action.log_security = true;
                }
            }
        }

        GateState::LegacyAllowed => match input.kind {
            GateEvent::NrFound => {
                // Prefer 5G whenever available
                ctx.current_state = GateState::NrAttaching;
                action.allow_attach = true;
            }
            GateEvent::PermitExpired => {
                ctx.has_permit = false;
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
            }
            _ if !window_covers => {
                ctx.has_permit = false;
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
            }
            _ => {
                ctx.current_state = GateState::LegacyAttaching;
                action.allow_attach = true;
                action.allowed_rats = permit_rats;
            }
        },

        GateState::LegacyAttaching => {
            // Permit re-check precedes everything else in this state
            if !ctx.has_permit || !window_covers {
                ctx.current_state = GateState::Reject;
                action.log_security = true;
            } else {
                match input.kind {
                    GateEvent::LegacyAttached => {
                        ctx.current_state = GateState::LegacyConnected;
                        action.allow_attach = true;
                        action.allowed_rats = permit_rats;
                    }
                    GateEvent::LegacyFailed => {
                        ctx.attach_failures = ctx.attach_failures.saturating_add(1);
                        ctx.current_state = GateState::NrScanning;
                    }
                    GateEvent::NrFound => {
                        ctx.current_state = GateState::NrAttaching;
                        action.allow_attach = true;
                    }
                    _ => {
                        action.allow_attach = true;
                        action.allowed_rats = permit_rats;
                    }
                }
            }
        }

        GateState::LegacyConnected => {
            // Re-checked on every event; an invalid permit forces
            // disconnect (allow_attach stays false)
            if !ctx.has_permit || !window_covers {
                ctx.current_state = GateState::PermitRequest;
                action.request_permit = true;
                action.log_security = true;
            } else {
                match input.kind {
                    GateEvent::NrFound => {
                        ctx.current_state = GateState::NrAttaching;
                        action.allow_attach = true;
                    }
                    GateEvent::PermitExpired => {
                        ctx.has_permit = false;
                        ctx.current_state = GateState::PermitRequest;
                        action.request_permit = true;
                    }
                    _ => {
                        action.allow_attach = true;
                        action.allowed_rats = permit_rats;
                    }
                }
            }
        }

        GateState::EmergencyBypass => match input.kind {
            GateEvent::EmergencyEnd => {
                ctx.in_emergency = false;
                ctx.current_state = GateState::NrScanning;
            }
            _ => {
                action.allow_attach = true;
                action.allowed_rats = RatBitmap::ALL;
            }
        },

        GateState::Reject => {
            ctx.current_state = GateState::NrScanning;
            action.log_security = true;
        }

        GateState::FailSafe => {
            // Emergency-only mode; the recognised-number override is
            // the single way out
            action.allowed_rats = RatBitmap::NONE;
        }
    }
}
