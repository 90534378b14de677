//! Gate 1: physical-layer admission engine.
//!
//! On each admission request: registry lookup, freshness check,
//! correlation against the stored fingerprint, threshold comparison.
//! Enrolments and refreshes arrive as [`BindingUpdate`] records on a
//! logically separate channel.

use serde::{Deserialize, Serialize};

use cellgate_core::{RegistryError, SubscriberId, Timestamp};
use cellgate_dsp::{score, Accum, ChannelVector, FingerprintHandle};

use crate::registry::{BindingRegistry, RegistryStats};

/// Gate 1 admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmitDecision {
    /// Correlation above threshold; proceed to Gate 2.
    Accept,
    /// Correlation at or below threshold; likely spoofed or relayed.
    Reject,
    /// Subscriber not enrolled; full authentication required.
    Unknown,
    /// Binding aged out; fingerprint refresh required.
    Expired,
}

/// One admission request from the radio frontend.
#[derive(Debug, Clone)]
pub struct AdmissionRequest {
    /// Subscriber requesting admission.
    pub subscriber: SubscriberId,
    /// Live channel measurement.
    pub channel: ChannelVector,
    /// Current timestamp.
    pub timestamp: Timestamp,
    /// Stream framing: final record of a burst.
    pub last: bool,
}

/// One enrolment or refresh for the binding registry.
#[derive(Debug, Clone)]
pub struct BindingUpdate {
    /// Subscriber being enrolled or refreshed.
    pub subscriber: SubscriberId,
    /// Fingerprint to store.
    pub handle: FingerprintHandle,
    /// Enrolment time.
    pub timestamp: Timestamp,
    /// `true` when refreshing an existing binding.
    pub is_refresh: bool,
}

/// One admission decision, emitted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitOutcome {
    /// Subscriber the decision applies to.
    pub subscriber: SubscriberId,
    /// The decision.
    pub decision: AdmitDecision,
    /// Correlation score (zero for Unknown/Expired).
    pub score: f64,
    /// Stream framing passthrough.
    pub last: bool,
}

/// Gate 1 engine: registry plus threshold comparator.
pub struct AdmissionGate {
    registry: BindingRegistry,
    threshold: Accum,
}

impl AdmissionGate {
    /// Creates the gate over a registry with the given acceptance
    /// threshold (already converted to Q16.16).
    #[must_use]
    pub fn new(registry: BindingRegistry, threshold: Accum) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    /// Decides one admission request.
    ///
    /// Never fails: absence and staleness are decisions, not errors.
    #[must_use]
    pub fn admit(&self, request: &AdmissionRequest) -> AdmitOutcome {
        let entry = match self.registry.lookup(request.subscriber) {
            Some(entry) => entry,
            None => {
                tracing::debug!(subscriber = %request.subscriber, "no binding enrolled");
                return self.outcome(request, AdmitDecision::Unknown, Accum::ZERO);
            }
        };

        if !self.registry.is_fresh(entry, request.timestamp) {
            tracing::debug!(
                subscriber = %request.subscriber,
                age = request.timestamp.age_since(entry.timestamp),
                "binding expired"
            );
            return self.outcome(request, AdmitDecision::Expired, Accum::ZERO);
        }

        let rho = score(&request.channel, &entry.handle);
        if rho > self.threshold {
            self.outcome(request, AdmitDecision::Accept, rho)
        } else {
            tracing::warn!(
                target: "security",
                subscriber = %request.subscriber,
                score = rho.to_f64(),
                threshold = self.threshold.to_f64(),
                "channel fingerprint mismatch"
            );
            self.outcome(request, AdmitDecision::Reject, rho)
        }
    }

    /// Applies one enrolment or refresh.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Full`] when the probe window has no
    /// room; the caller may [`expire`](Self::expire) and retry.
    pub fn apply_update(&mut self, update: &BindingUpdate) -> Result<(), RegistryError> {
        self.registry
            .upsert(update.subscriber, update.handle, update.timestamp)?;
        tracing::debug!(
            subscriber = %update.subscriber,
            refresh = update.is_refresh,
            "binding stored"
        );
        Ok(())
    }

    /// Sweeps aged-out bindings; returns the number cleared.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        self.registry.expire(now)
    }

    /// Registry occupancy summary.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    fn outcome(
        &self,
        request: &AdmissionRequest,
        decision: AdmitDecision,
        rho: Accum,
    ) -> AdmitOutcome {
        AdmitOutcome {
            subscriber: request.subscriber,
            decision,
            score: rho.to_f64(),
            last: request.last,
        }
    }
}
