//! Scripted end-to-end demonstration.
//!
//! Drives one engine through both gates: enrolment and the four
//! Gate 1 outcomes, then a permit-gated downgrade to a legacy
//! connection and an emergency bypass. Every decision and action is
//! printed as one JSON line stamped with wall-clock time (engine time
//! stays the modular tick counter throughout).

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use num_complex::Complex64;
use serde::Serialize;

use cellgate_core::{
    PlmnId, RatBitmap, SubscriberId, Timestamp, ANTENNA_COUNT, DEFAULT_BINDING_VALIDITY,
    EMERGENCY_911,
};
use cellgate_dsp::{ChannelVector, FingerprintHandle};
use cellgate_engine::{
    AdmissionEngine, AdmissionRequest, BindingUpdate, DowngradePermit, EngineConfig, EventRecord,
    GateEvent, Signature, SignaturePresenceVerifier, PERMIT_VERSION,
};

/// Arguments for the demo subcommand
#[derive(Args)]
pub struct DemoArgs {
    /// Subscriber identity to drive through the gates
    #[arg(long, default_value_t = 0x1234_5678)]
    pub subscriber: u64,

    /// Pretty-print JSON records instead of one line each
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Serialize)]
struct LogLine<T: Serialize> {
    logged_at: DateTime<Utc>,
    kind: &'static str,
    record: T,
}

fn emit<T: Serialize>(kind: &'static str, record: T, pretty: bool) -> Result<()> {
    let line = LogLine {
        logged_at: Utc::now(),
        kind,
        record,
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&line)?
    } else {
        serde_json::to_string(&line)?
    };
    println!("{rendered}");
    Ok(())
}

fn vector(seed: u64) -> Result<ChannelVector> {
    let coeffs: Vec<Complex64> = (0..ANTENNA_COUNT)
        .map(|i| {
            let t = (i as f64 + 1.0) * (seed as f64 + 1.0);
            Complex64::new(0.7 * (t * 1.37).sin(), 0.7 * (t * 2.11).cos())
        })
        .collect();
    Ok(ChannelVector::from_complex(&coeffs)?)
}

fn signed_permit(subject: SubscriberId, now: Timestamp) -> DowngradePermit {
    DowngradePermit {
        version: PERMIT_VERSION,
        subject,
        issuer: PlmnId::new(0x13F001),
        allowed_rats: RatBitmap::new(0b0110),
        emergency_only: false,
        valid_from: now,
        valid_until: now.advanced_by(10_000),
        geo_bound: None,
        signature: Signature::from_bytes([0x5A; 64]),
    }
}

/// Runs the demonstration.
pub fn execute(args: &DemoArgs) -> Result<()> {
    let mut engine: AdmissionEngine<SignaturePresenceVerifier> =
        AdmissionEngine::new(EngineConfig::default())?;
    let subscriber = SubscriberId::new(args.subscriber);
    let enrolled = vector(1)?;

    tracing::info!(engine = %engine.engine_id(), %subscriber, "demo starting");

    // -- Gate 1: enrolment and the four decisions ---------------------------

    engine.push_binding_update(BindingUpdate {
        subscriber,
        handle: FingerprintHandle::from_vector(&enrolled),
        timestamp: Timestamp::new(1_000),
        is_refresh: false,
    })?;

    engine.push_admission(AdmissionRequest {
        subscriber,
        channel: enrolled.clone(),
        timestamp: Timestamp::new(1_100),
        last: false,
    })?;
    engine.push_admission(AdmissionRequest {
        subscriber,
        channel: vector(2)?,
        timestamp: Timestamp::new(1_200),
        last: false,
    })?;
    engine.push_admission(AdmissionRequest {
        subscriber: SubscriberId::new(0xDEAD_BEEF),
        channel: vector(3)?,
        timestamp: Timestamp::new(1_300),
        last: false,
    })?;
    engine.push_admission(AdmissionRequest {
        subscriber,
        channel: enrolled,
        timestamp: Timestamp::new(1_000 + DEFAULT_BINDING_VALIDITY + 1),
        last: true,
    })?;

    engine.run_until_idle();
    while let Some(decision) = engine.poll_decision() {
        emit("gate1-decision", decision, args.pretty)?;
    }

    // -- Gate 2: permit-gated downgrade, then emergency bypass --------------

    let now = Timestamp::new(2_000);
    let script = [
        EventRecord::new(GateEvent::NrFound, subscriber, now),
        EventRecord::new(GateEvent::NrAttached, subscriber, now.advanced_by(10)),
        EventRecord::service_reject(subscriber, now.advanced_by(20), 15),
        EventRecord::permit_received(subscriber, now.advanced_by(30), signed_permit(subscriber, now)),
        EventRecord::new(GateEvent::LegacyAttached, subscriber, now.advanced_by(40)),
        EventRecord::new(GateEvent::LegacyAttached, subscriber, now.advanced_by(50)),
        EventRecord::new(GateEvent::LegacyAttached, subscriber, now.advanced_by(60)),
        EventRecord::emergency_dial(subscriber, now.advanced_by(70), EMERGENCY_911),
        EventRecord::new(GateEvent::EmergencyEnd, subscriber, now.advanced_by(80)),
    ];

    for event in script {
        engine.push_event(event)?;
        engine.run_until_idle();
        if let Some(action) = engine.poll_action() {
            emit("gate2-action", action, args.pretty)?;
        }
    }

    let stats = engine.registry_stats();
    tracing::info!(
        bindings = stats.count,
        sessions = engine.active_sessions(),
        "demo finished"
    );

    Ok(())
}
