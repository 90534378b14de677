//! Randomized safety-invariant tests for the downgrade guard.
//!
//! These drive long random event sequences through the public API and
//! check the properties the gate exists to enforce:
//!
//! 1. No legacy connection is ever reached without a prior permit
//!    validation that succeeded.
//! 2. Emergency bypass is only ever entered on a recognised dialled
//!    number (or continued from an existing bypass).
//! 3. The machine is total: every event yields one action whose new
//!    state is one of the twelve.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cellgate_core::{IssuerKey, PlmnId, RatBitmap, SubscriberId, Timestamp, EMERGENCY_911};
use cellgate_guard::{
    ActionRecord, DowngradeGuard, DowngradePermit, EventRecord, GateEvent, GateState,
    GuardConfig, Signature, SignaturePresenceVerifier,
};

const RECOGNISED: u32 = EMERGENCY_911;
const UNRECOGNISED: u32 = 0x34_3131; // "411"

fn guard() -> DowngradeGuard {
    let config = GuardConfig {
        // High bound so long random walks exercise the machine rather
        // than the storm breaker (which has its own tests)
        max_transitions: 1_000_000,
        ..GuardConfig::default()
    };
    DowngradeGuard::new(config, IssuerKey::default(), SignaturePresenceVerifier)
}

fn random_permit(rng: &mut StdRng, subscriber: SubscriberId, now: Timestamp) -> DowngradePermit {
    let signed: bool = rng.gen();
    let from = now.ticks().saturating_sub(rng.gen_range(0..500));
    let len = rng.gen_range(0..2_000);
    DowngradePermit {
        version: cellgate_guard::PERMIT_VERSION,
        subject: subscriber,
        issuer: PlmnId::new(0x13F001),
        allowed_rats: RatBitmap::new(rng.gen_range(1..=0x0F)),
        emergency_only: false,
        valid_from: Timestamp::new(from),
        valid_until: Timestamp::new(from + len),
        geo_bound: None,
        signature: if signed {
            Signature::from_bytes([rng.gen_range(1..=255u8); 64])
        } else {
            Signature::default()
        },
    }
}

fn random_event(rng: &mut StdRng, subscriber: SubscriberId, now: Timestamp) -> EventRecord {
    let kind = GateEvent::ALL[rng.gen_range(0..GateEvent::ALL.len())];
    match kind {
        GateEvent::PermitReceived => {
            EventRecord::permit_received(subscriber, now, random_permit(rng, subscriber, now))
        }
        GateEvent::EmergencyDial => {
            let number = if rng.gen() { RECOGNISED } else { UNRECOGNISED };
            EventRecord::emergency_dial(subscriber, now, number)
        }
        GateEvent::ServiceReject => EventRecord::service_reject(subscriber, now, 15),
        _ => EventRecord::new(kind, subscriber, now),
    }
}

/// Runs one random walk for one subscriber, returning the action log
/// paired with the dialled number fed alongside each event (if any).
fn random_walk(seed: u64, events: usize) -> Vec<(ActionRecord, Option<u32>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut guard = guard();
    let subscriber = SubscriberId::new(seed);
    let mut now = Timestamp::new(1_000);
    let mut log = Vec::with_capacity(events);

    for _ in 0..events {
        now = now.advanced_by(rng.gen_range(1..50));
        let event = random_event(&mut rng, subscriber, now);
        let dialled = match (event.kind, &event.payload) {
            (GateEvent::EmergencyDial, cellgate_guard::EventPayload::DialedNumber(n)) => Some(*n),
            _ => None,
        };
        let action = guard.handle(&event);
        log.push((action, dialled));
    }
    log
}

#[test]
fn no_legacy_connection_without_validated_permit() {
    for seed in 0..200u64 {
        let log = random_walk(seed, 400);
        let mut validated = false;
        for (action, _) in &log {
            if action.previous_state == GateState::PermitValidation
                && action.new_state == GateState::LegacyAllowed
            {
                validated = true;
            }
            if action.new_state == GateState::LegacyConnected {
                assert!(
                    validated,
                    "seed {seed}: reached LegacyConnected with no successful validation"
                );
            }
        }
    }
}

#[test]
fn emergency_bypass_only_on_recognised_number() {
    for seed in 200..400u64 {
        let log = random_walk(seed, 400);
        for (action, dialled) in &log {
            if action.new_state == GateState::EmergencyBypass
                && action.previous_state != GateState::EmergencyBypass
            {
                assert_eq!(
                    *dialled,
                    Some(RECOGNISED),
                    "seed {seed}: entered EmergencyBypass without a recognised number"
                );
            }
        }
    }
}

#[test]
fn machine_is_total_under_random_walks() {
    for seed in 400..450u64 {
        let log = random_walk(seed, 600);
        assert_eq!(log.len(), 600);
        for (action, _) in &log {
            assert!(GateState::ALL.contains(&action.new_state));
            assert!(GateState::ALL.contains(&action.previous_state));
        }
    }
}

#[test]
fn forced_disconnect_never_allows_attach() {
    // Whenever a legacy connection is torn down for a permit problem,
    // the emitted action must not allow attachment.
    for seed in 450..600u64 {
        let log = random_walk(seed, 400);
        for (action, _) in &log {
            if action.previous_state == GateState::LegacyConnected
                && action.new_state == GateState::PermitRequest
            {
                assert!(
                    !action.allow_attach,
                    "seed {seed}: disconnect action allowed attach"
                );
                assert!(action.request_permit);
            }
        }
    }
}
