//! Core value types shared across the cellgate workspace.
//!
//! # Type categories
//!
//! - **Identity**: [`SubscriberId`], [`PlmnId`]
//! - **Time**: [`Timestamp`] (modular, wrap-tolerant counter)
//! - **Authorisation**: [`RatBitmap`], [`IssuerKey`]

use serde::{Deserialize, Serialize};

// =============================================================================
// Identity
// =============================================================================

/// Opaque subscriber identity.
///
/// The engine never interprets the bits beyond equality and hashing;
/// uniqueness is the caller's responsibility. 32-bit identities widen
/// losslessly via [`SubscriberId::from_u32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Creates a subscriber id from a raw 64-bit value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Widens a 32-bit identity (e.g. a C-RNTI) into a subscriber id.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw as u64)
    }

    /// Returns the raw identity value.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Home-network identifier (MCC-MNC), 24 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlmnId(u32);

impl PlmnId {
    /// Creates a PLMN id, masking to the 24-bit field width.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw & 0x00FF_FFFF)
    }

    /// Returns the raw 24-bit value.
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PlmnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06x}", self.0)
    }
}

// =============================================================================
// Time
// =============================================================================

/// Monotonically non-decreasing unsigned counter timestamp.
///
/// All freshness comparisons use modular subtraction with windows
/// strictly shorter than half the counter range, so a single counter
/// wrap is tolerated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from a raw counter value.
    #[must_use]
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.0
    }

    /// Modular age of `earlier` as seen from `self`.
    ///
    /// Correct across a single counter wrap provided the window being
    /// compared against is shorter than half the counter range.
    #[must_use]
    pub const fn age_since(&self, earlier: Timestamp) -> u64 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns this timestamp advanced by `ticks`, wrapping.
    #[must_use]
    pub const fn advanced_by(&self, ticks: u64) -> Self {
        Self(self.0.wrapping_add(ticks))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Authorisation
// =============================================================================

/// Radio-access-technology bitmap.
///
/// Bit 3: NR (5G), bit 2: LTE (4G), bit 1: UMTS (3G), bit 0: GSM (2G).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct RatBitmap(u8);

impl RatBitmap {
    /// NR (5G).
    pub const NR: Self = Self(0b1000);
    /// LTE (4G).
    pub const LTE: Self = Self(0b0100);
    /// UMTS (3G).
    pub const UMTS: Self = Self(0b0010);
    /// GSM (2G).
    pub const GSM: Self = Self(0b0001);

    /// No radio permitted.
    pub const NONE: Self = Self(0b0000);
    /// 5G only (the default posture).
    pub const NR_ONLY: Self = Self(0b1000);
    /// Every RAT permitted (emergency posture).
    pub const ALL: Self = Self(0b1111);

    /// Creates a bitmap, masking to the 4-bit field width.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    /// Returns the raw 4-bit value.
    #[must_use]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Returns `true` if every RAT in `mask` is permitted.
    #[must_use]
    pub const fn permits(&self, mask: RatBitmap) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// Returns `true` if any legacy (pre-5G) RAT is permitted.
    #[must_use]
    pub const fn permits_legacy(&self) -> bool {
        self.0 & 0b0111 != 0
    }

    /// Returns `true` if no RAT is permitted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for RatBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06b}", self.0)
    }
}

/// Issuer (home network) public key, 256 bits.
///
/// Opaque to the engine; only the configured verifier interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerKey([u8; 32]);

impl IssuerKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Borrows the key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Default for IssuerKey {
    fn default() -> Self {
        Self([0; 32])
    }
}
