//! Error types for the cellgate engine.
//!
//! Admission decisions (Accept/Reject/Unknown/Expired) are outcomes,
//! not errors, and never appear here. Errors cover the refusals and
//! failures an embedding must handle:
//!
//! - [`CoreError`]: top-level error aggregating all subsystems
//! - [`DspError`]: channel-vector construction failures
//! - [`RegistryError`]: binding-registry refusals
//! - [`PermitError`]: permit wire-codec failures
//! - [`StreamError`]: engine stream backpressure
//!
//! Session-pool exhaustion is deliberately absent: the guard answers
//! it with the synthetic fail-safe action, not an error.

use thiserror::Error;

/// A specialized `Result` type for cellgate operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the cellgate engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Signal-path error
    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    /// Binding-registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Permit codec error
    #[error("Permit error: {0}")]
    Permit(#[from] PermitError),

    /// Engine stream error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Configuration rejected at construction
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Input data failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if the operation may succeed on retry.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Registry(e) => e.is_recoverable(),
            Self::Stream(_) => true,
            Self::Dsp(_)
            | Self::Permit(_)
            | Self::Configuration { .. }
            | Self::Validation { .. } => false,
        }
    }
}

/// Errors from channel-vector construction and the fixed-point path.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DspError {
    /// Wrong number of antenna samples supplied
    #[error("Invalid antenna count: expected {expected}, got {actual}")]
    AntennaCount {
        /// Expected number of antennas
        expected: usize,
        /// Actual number supplied
        actual: usize,
    },

    /// A sample was NaN or infinite
    #[error("Non-finite sample at antenna {index}: {value}")]
    NonFiniteSample {
        /// Antenna index of the offending sample
        index: usize,
        /// The offending value
        value: f64,
    },
}

/// Errors from the binding registry.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// Every slot in the probe window is held by a different subscriber
    #[error("Registry full: no free slot within {probe_limit} probes of index {index}")]
    Full {
        /// Home index the probe started from
        index: usize,
        /// Configured probe limit
        probe_limit: usize,
    },
}

impl RegistryError {
    /// Returns `true` if the operation may succeed on retry.
    ///
    /// A full probe window can clear after an `expire` sweep.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}

/// Errors from the permit wire codec.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PermitError {
    /// Buffer too short for the declared layout
    #[error("Truncated permit: need {needed} bytes, got {actual}")]
    Truncated {
        /// Bytes required by the layout
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Unknown permit format version
    #[error("Unsupported permit version: {version:#04x}")]
    UnsupportedVersion {
        /// The version byte encountered
        version: u8,
    },
}

/// Errors from the engine's bounded input streams.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    /// The target stream is at capacity; retry after `step`
    #[error("Stream '{stream}' full at depth {depth}")]
    Backpressure {
        /// Which logical stream refused
        stream: &'static str,
        /// Configured stream depth
        depth: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = CoreError::from(RegistryError::Full {
            index: 42,
            probe_limit: 4,
        });
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("4 probes"));
    }

    #[test]
    fn test_registry_full_is_recoverable() {
        let err = CoreError::from(RegistryError::Full {
            index: 0,
            probe_limit: 4,
        });
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_permit_errors_are_terminal() {
        let err = CoreError::from(PermitError::UnsupportedVersion { version: 0x7F });
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("0x7f"));
    }

    #[test]
    fn test_backpressure_is_recoverable() {
        let err = CoreError::from(StreamError::Backpressure {
            stream: "events",
            depth: 64,
        });
        assert!(err.is_recoverable());
    }
}
