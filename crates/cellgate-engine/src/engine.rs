//! The top-level admission-control engine.
//!
//! Owns both gates and four logical streams: binding updates and
//! admission requests in, Gate 1 decisions out; guard events in,
//! guard actions out. Single-threaded cooperative: the caller drives
//! progress by invoking [`AdmissionEngine::step`], which consumes at
//! most one record per input stream and never blocks. All stream and
//! table storage is allocated at construction.

use std::collections::VecDeque;

use uuid::Uuid;

use cellgate_core::{CoreResult, StreamError, SubscriberId, Timestamp};
use cellgate_dsp::Accum;
use cellgate_guard::{
    ActionRecord, DowngradeGuard, EventRecord, GateState, GuardConfig, PermitVerifier,
    SignaturePresenceVerifier,
};
use cellgate_plab::{
    AdmissionGate, AdmissionRequest, AdmitOutcome, BindingRegistry, BindingUpdate, RegistryStats,
};

use crate::config::EngineConfig;

/// Two-stage admission-control engine.
pub struct AdmissionEngine<V = SignaturePresenceVerifier> {
    engine_id: Uuid,
    plab: AdmissionGate,
    guard: DowngradeGuard<V>,
    stream_depth: usize,

    updates_in: VecDeque<BindingUpdate>,
    admissions_in: VecDeque<AdmissionRequest>,
    events_in: VecDeque<EventRecord>,
    decisions_out: VecDeque<AdmitOutcome>,
    actions_out: VecDeque<ActionRecord>,
}

impl AdmissionEngine<SignaturePresenceVerifier> {
    /// Constructs an engine with the built-in presence verifier.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` fails validation.
    pub fn new(config: EngineConfig) -> CoreResult<Self> {
        Self::with_verifier(config, SignaturePresenceVerifier)
    }
}

impl<V: PermitVerifier> AdmissionEngine<V> {
    /// Constructs an engine with a caller-supplied permit verifier.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `config` fails validation.
    pub fn with_verifier(config: EngineConfig, verifier: V) -> CoreResult<Self> {
        config.validate()?;

        let registry = BindingRegistry::new(
            config.registry_capacity,
            config.probe_limit,
            config.binding_validity_window,
        );
        let plab = AdmissionGate::new(registry, Accum::from_f64(config.acceptance_threshold));

        let guard_config = GuardConfig {
            session_capacity: config.session_capacity,
            max_transitions: config.max_transitions,
            max_attach_failures: config.max_attach_failures,
            max_permit_validity: config.max_permit_validity,
            emergency_numbers: config.emergency_numbers.clone(),
        };
        let guard = DowngradeGuard::new(guard_config, config.issuer_key, verifier);

        let engine_id = Uuid::new_v4();
        tracing::info!(
            engine = %engine_id,
            registry_capacity = config.registry_capacity,
            session_capacity = config.session_capacity,
            threshold = config.acceptance_threshold,
            "admission engine constructed"
        );

        let depth = config.stream_depth;
        Ok(Self {
            engine_id,
            plab,
            guard,
            stream_depth: depth,
            updates_in: VecDeque::with_capacity(depth),
            admissions_in: VecDeque::with_capacity(depth),
            events_in: VecDeque::with_capacity(depth),
            decisions_out: VecDeque::with_capacity(depth),
            actions_out: VecDeque::with_capacity(depth),
        })
    }

    /// This instance's id, for correlating log streams.
    #[must_use]
    pub fn engine_id(&self) -> Uuid {
        self.engine_id
    }

    // -- inputs -------------------------------------------------------------

    /// Enqueues a binding update.
    ///
    /// # Errors
    ///
    /// Refuses with [`StreamError::Backpressure`] when the stream is
    /// full; retry after [`step`](Self::step).
    pub fn push_binding_update(&mut self, update: BindingUpdate) -> Result<(), StreamError> {
        push_bounded(&mut self.updates_in, update, "binding-updates", self.stream_depth)
    }

    /// Enqueues an admission request.
    ///
    /// # Errors
    ///
    /// Refuses with [`StreamError::Backpressure`] when the stream is
    /// full; retry after [`step`](Self::step).
    pub fn push_admission(&mut self, request: AdmissionRequest) -> Result<(), StreamError> {
        push_bounded(&mut self.admissions_in, request, "admissions", self.stream_depth)
    }

    /// Enqueues a guard event.
    ///
    /// # Errors
    ///
    /// Refuses with [`StreamError::Backpressure`] when the stream is
    /// full; retry after [`step`](Self::step).
    pub fn push_event(&mut self, event: EventRecord) -> Result<(), StreamError> {
        push_bounded(&mut self.events_in, event, "events", self.stream_depth)
    }

    // -- scheduling ---------------------------------------------------------

    /// One cooperative scheduling quantum.
    ///
    /// Inspects each input stream in turn (binding updates, then
    /// admission requests, then guard events), consuming at most one
    /// record from each and fully processing it. A stream whose output
    /// side is full is skipped for this quantum (nothing is dropped).
    /// Returns the number of records consumed; zero means idle.
    pub fn step(&mut self) -> usize {
        let mut consumed = 0;

        if let Some(update) = self.updates_in.pop_front() {
            if let Err(err) = self.plab.apply_update(&update) {
                tracing::warn!(
                    engine = %self.engine_id,
                    subscriber = %update.subscriber,
                    error = %err,
                    "binding update refused"
                );
            }
            consumed += 1;
        }

        if self.decisions_out.len() < self.stream_depth {
            if let Some(request) = self.admissions_in.pop_front() {
                let outcome = self.plab.admit(&request);
                self.decisions_out.push_back(outcome);
                consumed += 1;
            }
        }

        if self.actions_out.len() < self.stream_depth {
            if let Some(event) = self.events_in.pop_front() {
                let action = self.guard.handle(&event);
                self.actions_out.push_back(action);
                consumed += 1;
            }
        }

        consumed
    }

    /// Steps until every input stream is drained or output
    /// backpressure stalls progress. Returns total records consumed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut total = 0;
        loop {
            let consumed = self.step();
            if consumed == 0 {
                return total;
            }
            total += consumed;
        }
    }

    // -- outputs ------------------------------------------------------------

    /// Dequeues the next Gate 1 decision, if any.
    pub fn poll_decision(&mut self) -> Option<AdmitOutcome> {
        self.decisions_out.pop_front()
    }

    /// Dequeues the next Gate 2 action, if any.
    pub fn poll_action(&mut self) -> Option<ActionRecord> {
        self.actions_out.pop_front()
    }

    // -- maintenance and diagnostics ----------------------------------------

    /// Sweeps aged-out bindings from the registry.
    pub fn expire_bindings(&mut self, now: Timestamp) -> usize {
        self.plab.expire(now)
    }

    /// Registry occupancy summary.
    #[must_use]
    pub fn registry_stats(&self) -> RegistryStats {
        self.plab.stats()
    }

    /// Releases a subscriber's session context on detach.
    pub fn detach(&mut self, subscriber: SubscriberId) -> bool {
        self.guard.detach(subscriber)
    }

    /// Current guard state of a subscriber, if a context exists.
    #[must_use]
    pub fn guard_state(&self, subscriber: SubscriberId) -> Option<GateState> {
        self.guard.state_of(subscriber)
    }

    /// Number of allocated session contexts.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.guard.active_sessions()
    }
}

fn push_bounded<T>(
    queue: &mut VecDeque<T>,
    record: T,
    stream: &'static str,
    depth: usize,
) -> Result<(), StreamError> {
    if queue.len() >= depth {
        return Err(StreamError::Backpressure { stream, depth });
    }
    queue.push_back(record);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgate_dsp::{ChannelVector, FingerprintHandle};
    use cellgate_guard::GateEvent;
    use num_complex::Complex64;

    fn test_vector() -> ChannelVector {
        let coeffs: Vec<Complex64> = (0..cellgate_core::ANTENNA_COUNT)
            .map(|i| {
                let t = i as f64;
                Complex64::new(0.6 * (t * 0.37).sin(), 0.6 * (t * 0.83).cos())
            })
            .collect();
        ChannelVector::from_complex(&coeffs).unwrap()
    }

    fn small_engine() -> AdmissionEngine {
        AdmissionEngine::new(
            EngineConfig::builder()
                .registry_capacity(64)
                .session_capacity(4)
                .stream_depth(4)
                .build(),
        )
        .unwrap()
    }

    fn update_for(id: u64, at: u64) -> BindingUpdate {
        BindingUpdate {
            subscriber: SubscriberId::new(id),
            handle: FingerprintHandle::from_vector(&test_vector()),
            timestamp: Timestamp::new(at),
            is_refresh: false,
        }
    }

    fn request_for(id: u64, at: u64) -> AdmissionRequest {
        AdmissionRequest {
            subscriber: SubscriberId::new(id),
            channel: test_vector(),
            timestamp: Timestamp::new(at),
            last: false,
        }
    }

    #[test]
    fn test_step_consumes_one_per_stream() {
        let mut engine = small_engine();
        engine.push_binding_update(update_for(1, 100)).unwrap();
        engine.push_binding_update(update_for(2, 100)).unwrap();
        engine.push_admission(request_for(1, 150)).unwrap();
        engine
            .push_event(EventRecord::new(
                GateEvent::NrFound,
                SubscriberId::new(1),
                Timestamp::new(150),
            ))
            .unwrap();

        // First quantum: one update, one request, one event
        assert_eq!(engine.step(), 3);
        // Second quantum: the remaining update only
        assert_eq!(engine.step(), 1);
        assert_eq!(engine.step(), 0);
    }

    #[test]
    fn test_update_processed_before_request_within_quantum() {
        let mut engine = small_engine();
        // Enrolment and admission for the same subscriber pushed in
        // the same quantum: the update lands first, so the request is
        // admitted rather than Unknown.
        engine.push_binding_update(update_for(7, 100)).unwrap();
        engine.push_admission(request_for(7, 150)).unwrap();

        engine.run_until_idle();
        let decision = engine.poll_decision().unwrap();
        assert_eq!(decision.decision, cellgate_plab::AdmitDecision::Accept);
    }

    #[test]
    fn test_backpressure_refuses_without_dropping() {
        let mut engine = small_engine();
        for i in 0..4 {
            engine.push_admission(request_for(i, 100)).unwrap();
        }
        let err = engine.push_admission(request_for(9, 100)).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Backpressure {
                stream: "admissions",
                depth: 4
            }
        ));

        // After a step there is room again
        engine.step();
        engine.push_admission(request_for(9, 100)).unwrap();
    }

    #[test]
    fn test_output_backpressure_stalls_input() {
        let mut engine = small_engine();
        for i in 0..4 {
            engine.push_admission(request_for(i, 100)).unwrap();
        }
        engine.run_until_idle();
        // Decisions queue is now at depth; a fifth request stays queued
        engine.push_admission(request_for(9, 100)).unwrap();
        assert_eq!(engine.step(), 0);

        // Draining one decision unblocks the next quantum
        assert!(engine.poll_decision().is_some());
        assert_eq!(engine.step(), 1);
    }

    #[test]
    fn test_fifo_order_within_streams() {
        let mut engine = small_engine();
        engine.push_admission(request_for(1, 100)).unwrap();
        engine.push_admission(request_for(2, 100)).unwrap();
        engine.run_until_idle();

        assert_eq!(engine.poll_decision().unwrap().subscriber, SubscriberId::new(1));
        assert_eq!(engine.poll_decision().unwrap().subscriber, SubscriberId::new(2));
    }

    #[test]
    fn test_detach_and_diagnostics() {
        let mut engine = small_engine();
        engine
            .push_event(EventRecord::new(
                GateEvent::NrFound,
                SubscriberId::new(5),
                Timestamp::new(10),
            ))
            .unwrap();
        engine.run_until_idle();

        assert_eq!(engine.active_sessions(), 1);
        assert_eq!(
            engine.guard_state(SubscriberId::new(5)),
            Some(GateState::NrAttaching)
        );
        assert!(engine.detach(SubscriberId::new(5)));
        assert_eq!(engine.active_sessions(), 0);
    }

    #[test]
    fn test_registry_maintenance_surface() {
        let mut engine = small_engine();
        engine.push_binding_update(update_for(1, 100)).unwrap();
        engine.run_until_idle();
        assert_eq!(engine.registry_stats().count, 1);

        let window = EngineConfig::default().binding_validity_window;
        assert_eq!(engine.expire_bindings(Timestamp::new(100 + window + 1)), 1);
        assert_eq!(engine.registry_stats().count, 0);
    }
}
