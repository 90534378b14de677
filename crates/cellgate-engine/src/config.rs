//! Engine configuration.
//!
//! One [`EngineConfig`] carries every bound the engine is constructed
//! with; [`EngineConfig::validate`] rejects inconsistent values before
//! any storage is allocated. Reference defaults match the hardware
//! configuration the behavioural model was lifted from.

use serde::{Deserialize, Serialize};

use cellgate_core::{
    CoreError, CoreResult, IssuerKey, ANTENNA_COUNT, DEFAULT_ACCEPT_THRESHOLD,
    DEFAULT_BINDING_VALIDITY, DEFAULT_MAX_PERMIT_VALIDITY, DEFAULT_MAX_TRANSITIONS,
    DEFAULT_PROBE_LIMIT, DEFAULT_REGISTRY_CAPACITY, DEFAULT_SESSION_CAPACITY,
};
use cellgate_dsp::fixed::{SAMPLE_FRAC_BITS, SAMPLE_INT_BITS};
use cellgate_guard::EmergencyNumberSet;

/// Default depth of each engine stream.
pub const DEFAULT_STREAM_DEPTH: usize = 64;

/// Construction parameters for [`AdmissionEngine`](crate::AdmissionEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Antennas per channel vector; must match the compiled width
    pub antenna_count: usize,

    /// Integer bits of a channel sample; must match the compiled format
    pub sample_int_bits: u32,

    /// Fractional bits of a channel sample; must match the compiled format
    pub sample_frac_bits: u32,

    /// Gate 1 correlation acceptance threshold, exclusive bounds (0, 1)
    pub acceptance_threshold: f64,

    /// Binding validity window in timestamp ticks
    pub binding_validity_window: u64,

    /// Cap on a permit's validity window length in ticks
    pub max_permit_validity: u64,

    /// Binding-registry slot count
    pub registry_capacity: usize,

    /// Linear-probe limit for the registry
    pub probe_limit: usize,

    /// Concurrent session contexts for Gate 2
    pub session_capacity: usize,

    /// Per-context transition bound before forced fail-safe
    pub max_transitions: u32,

    /// Attach failures tolerated before fail-safe
    pub max_attach_failures: u32,

    /// Depth of each input/output stream
    pub stream_depth: usize,

    /// Home-network public key for permit verification
    pub issuer_key: IssuerKey,

    /// Emergency-number recognition set
    pub emergency_numbers: EmergencyNumberSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            antenna_count: ANTENNA_COUNT,
            sample_int_bits: SAMPLE_INT_BITS,
            sample_frac_bits: SAMPLE_FRAC_BITS,
            acceptance_threshold: DEFAULT_ACCEPT_THRESHOLD,
            binding_validity_window: DEFAULT_BINDING_VALIDITY,
            max_permit_validity: DEFAULT_MAX_PERMIT_VALIDITY,
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            probe_limit: DEFAULT_PROBE_LIMIT,
            session_capacity: DEFAULT_SESSION_CAPACITY,
            max_transitions: DEFAULT_MAX_TRANSITIONS,
            max_attach_failures: 3,
            stream_depth: DEFAULT_STREAM_DEPTH,
            issuer_key: IssuerKey::default(),
            emergency_numbers: EmergencyNumberSet::default(),
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Starts from the reference defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the acceptance threshold.
    #[must_use]
    pub fn acceptance_threshold(mut self, threshold: f64) -> Self {
        self.config.acceptance_threshold = threshold;
        self
    }

    /// Sets the binding validity window.
    #[must_use]
    pub fn binding_validity_window(mut self, ticks: u64) -> Self {
        self.config.binding_validity_window = ticks;
        self
    }

    /// Sets the permit validity cap.
    #[must_use]
    pub fn max_permit_validity(mut self, ticks: u64) -> Self {
        self.config.max_permit_validity = ticks;
        self
    }

    /// Sets the registry capacity.
    #[must_use]
    pub fn registry_capacity(mut self, capacity: usize) -> Self {
        self.config.registry_capacity = capacity;
        self
    }

    /// Sets the probe limit.
    #[must_use]
    pub fn probe_limit(mut self, limit: usize) -> Self {
        self.config.probe_limit = limit;
        self
    }

    /// Sets the session-pool capacity.
    #[must_use]
    pub fn session_capacity(mut self, capacity: usize) -> Self {
        self.config.session_capacity = capacity;
        self
    }

    /// Sets the per-context transition bound.
    #[must_use]
    pub fn max_transitions(mut self, bound: u32) -> Self {
        self.config.max_transitions = bound;
        self
    }

    /// Sets the tolerated attach-failure count.
    #[must_use]
    pub fn max_attach_failures(mut self, bound: u32) -> Self {
        self.config.max_attach_failures = bound;
        self
    }

    /// Sets the stream depth.
    #[must_use]
    pub fn stream_depth(mut self, depth: usize) -> Self {
        self.config.stream_depth = depth;
        self
    }

    /// Sets the issuer public key.
    #[must_use]
    pub fn issuer_key(mut self, key: IssuerKey) -> Self {
        self.config.issuer_key = key;
        self
    }

    /// Sets the emergency-number recognition set.
    #[must_use]
    pub fn emergency_numbers(mut self, numbers: EmergencyNumberSet) -> Self {
        self.config.emergency_numbers = numbers;
        self
    }

    /// Finishes the build.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl EngineConfig {
    /// Creates a new config builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] describing the first
    /// inconsistency found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.antenna_count != ANTENNA_COUNT {
            return Err(CoreError::configuration(format!(
                "engine is compiled for {ANTENNA_COUNT} antennas, config asks for {}",
                self.antenna_count
            )));
        }
        if (self.sample_int_bits, self.sample_frac_bits) != (SAMPLE_INT_BITS, SAMPLE_FRAC_BITS) {
            return Err(CoreError::configuration(format!(
                "engine is compiled for Q{SAMPLE_INT_BITS}.{SAMPLE_FRAC_BITS} samples, \
                 config asks for Q{}.{}",
                self.sample_int_bits, self.sample_frac_bits
            )));
        }
        if !(self.acceptance_threshold > 0.0 && self.acceptance_threshold < 1.0) {
            return Err(CoreError::configuration(format!(
                "acceptance_threshold must lie in (0, 1), got {}",
                self.acceptance_threshold
            )));
        }
        if self.binding_validity_window == 0 || self.binding_validity_window >= u64::MAX / 2 {
            return Err(CoreError::configuration(
                "binding_validity_window must be nonzero and shorter than half the counter range",
            ));
        }
        if self.max_permit_validity >= u64::MAX / 2 {
            return Err(CoreError::configuration(
                "max_permit_validity must be shorter than half the counter range",
            ));
        }
        if self.registry_capacity == 0 {
            return Err(CoreError::configuration("registry_capacity must be nonzero"));
        }
        if self.probe_limit == 0 || self.probe_limit > self.registry_capacity {
            return Err(CoreError::configuration(format!(
                "probe_limit must lie in 1..={}, got {}",
                self.registry_capacity, self.probe_limit
            )));
        }
        if self.session_capacity == 0 {
            return Err(CoreError::configuration("session_capacity must be nonzero"));
        }
        if self.max_transitions == 0 {
            return Err(CoreError::configuration("max_transitions must be nonzero"));
        }
        if self.max_attach_failures == 0 {
            return Err(CoreError::configuration(
                "max_attach_failures must be nonzero",
            ));
        }
        if self.stream_depth == 0 {
            return Err(CoreError::configuration("stream_depth must be nonzero"));
        }
        Ok(())
    }
}
