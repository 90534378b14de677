//! Downgrade permits: the signed authorisation a home network issues
//! to allow a bounded-time, bounded-RAT fallback below 5G.
//!
//! The permit carries its own validity window and RAT bitmap and is
//! transported in a fixed binary layout (see [`DowngradePermit::encode`]).
//! Signature verification is an external collaborator behind
//! [`PermitVerifier`]; the state machine never inspects signature
//! internals.

use cellgate_core::{IssuerKey, PermitError, PlmnId, RatBitmap, SubscriberId, Timestamp};

/// Supported permit format version.
pub const PERMIT_VERSION: u8 = 0x01;

/// Wire size without the optional geographic bound.
pub const PERMIT_BASE_LEN: usize = 88;

/// Wire size of the optional geographic bound.
pub const PERMIT_GEO_LEN: usize = 10;

/// Mask for the 40-bit wire timestamps.
const TIMESTAMP_MASK: u64 = 0xFF_FFFF_FFFF;

// Authorisation word bit assignments (bits 9..=0 reserved).
const AUTH_RAT_SHIFT: u16 = 12;
const AUTH_EMERGENCY_BIT: u16 = 1 << 11;
const AUTH_GEO_BIT: u16 = 1 << 10;

/// Opaque 64-byte permit signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wraps raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Borrows the signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Whether any signature bytes are set.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0; 64])
    }
}

/// Optional geographic restriction: centre plus radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBound {
    /// Centre latitude in degrees.
    pub latitude_deg: f64,
    /// Centre longitude in degrees.
    pub longitude_deg: f64,
    /// Restriction radius in kilometres.
    pub radius_km: u16,
}

/// A downgrade permit as issued by the subscriber's home network.
#[derive(Debug, Clone, PartialEq)]
pub struct DowngradePermit {
    /// Permit format version.
    pub version: u8,
    /// Subject subscriber.
    pub subject: SubscriberId,
    /// Issuing home network.
    pub issuer: PlmnId,
    /// RATs this permit authorises.
    pub allowed_rats: RatBitmap,
    /// If set, only emergency traffic is authorised.
    pub emergency_only: bool,
    /// Window start (40-bit wire precision).
    pub valid_from: Timestamp,
    /// Window end, inclusive (40-bit wire precision).
    pub valid_until: Timestamp,
    /// Optional geographic restriction.
    pub geo_bound: Option<GeoBound>,
    /// Issuer signature over the permit body.
    pub signature: Signature,
}

impl DowngradePermit {
    /// Whether `now` lies inside the validity window.
    ///
    /// Modular comparison, tolerant of a single counter wrap: the
    /// elapsed time since `valid_from` is compared against the window
    /// length rather than the raw endpoints.
    #[must_use]
    pub fn covers(&self, now: Timestamp) -> bool {
        now.age_since(self.valid_from) <= self.window_length()
    }

    /// Length of the validity window in ticks.
    #[must_use]
    pub fn window_length(&self) -> u64 {
        self.valid_until.age_since(self.valid_from)
    }

    /// Serialises to the fixed wire layout.
    ///
    /// Layout: version (1 B), subject (8 B), issuer (3 B),
    /// authorisation word (2 B), valid-from (5 B), valid-until (5 B),
    /// geographic bound (10 B when present), signature (64 B).
    /// Multi-byte fields are big-endian; reserved bits encode as zero.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PERMIT_BASE_LEN + PERMIT_GEO_LEN);
        out.push(self.version);
        out.extend_from_slice(&self.subject.raw().to_be_bytes());
        out.extend_from_slice(&self.issuer.raw().to_be_bytes()[1..]);

        let mut auth = u16::from(self.allowed_rats.bits()) << AUTH_RAT_SHIFT;
        if self.emergency_only {
            auth |= AUTH_EMERGENCY_BIT;
        }
        if self.geo_bound.is_some() {
            auth |= AUTH_GEO_BIT;
        }
        out.extend_from_slice(&auth.to_be_bytes());

        out.extend_from_slice(&encode_timestamp(self.valid_from));
        out.extend_from_slice(&encode_timestamp(self.valid_until));

        if let Some(geo) = &self.geo_bound {
            out.extend_from_slice(&encode_coordinate(geo.latitude_deg));
            out.extend_from_slice(&encode_coordinate(geo.longitude_deg));
            out.extend_from_slice(&geo.radius_km.to_be_bytes());
        }

        out.extend_from_slice(self.signature.as_bytes());
        out
    }

    /// Parses the fixed wire layout.
    ///
    /// # Errors
    ///
    /// [`PermitError::Truncated`] when the buffer is shorter than the
    /// declared layout, [`PermitError::UnsupportedVersion`] for an
    /// unknown version byte. Nonzero reserved bits are tolerated.
    pub fn decode(bytes: &[u8]) -> Result<Self, PermitError> {
        if bytes.len() < PERMIT_BASE_LEN {
            return Err(PermitError::Truncated {
                needed: PERMIT_BASE_LEN,
                actual: bytes.len(),
            });
        }
        let version = bytes[0];
        if version != PERMIT_VERSION {
            return Err(PermitError::UnsupportedVersion { version });
        }

        let mut subject_bytes = [0u8; 8];
        subject_bytes.copy_from_slice(&bytes[1..9]);
        let subject = SubscriberId::new(u64::from_be_bytes(subject_bytes));
        let issuer = PlmnId::new(u32::from_be_bytes([0, bytes[9], bytes[10], bytes[11]]));

        let auth = u16::from_be_bytes([bytes[12], bytes[13]]);
        let allowed_rats = RatBitmap::new((auth >> AUTH_RAT_SHIFT) as u8);
        let emergency_only = auth & AUTH_EMERGENCY_BIT != 0;
        let has_geo = auth & AUTH_GEO_BIT != 0;

        let valid_from = decode_timestamp(&bytes[14..19]);
        let valid_until = decode_timestamp(&bytes[19..24]);

        let mut offset = 24;
        let geo_bound = if has_geo {
            if bytes.len() < PERMIT_BASE_LEN + PERMIT_GEO_LEN {
                return Err(PermitError::Truncated {
                    needed: PERMIT_BASE_LEN + PERMIT_GEO_LEN,
                    actual: bytes.len(),
                });
            }
            let latitude_deg = decode_coordinate(&bytes[offset..offset + 4]);
            let longitude_deg = decode_coordinate(&bytes[offset + 4..offset + 8]);
            let radius_km = u16::from_be_bytes([bytes[offset + 8], bytes[offset + 9]]);
            offset += PERMIT_GEO_LEN;
            Some(GeoBound {
                latitude_deg,
                longitude_deg,
                radius_km,
            })
        } else {
            None
        };

        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[offset..offset + 64]);

        Ok(Self {
            version,
            subject,
            issuer,
            allowed_rats,
            emergency_only,
            valid_from,
            valid_until,
            geo_bound,
            signature: Signature::from_bytes(signature),
        })
    }
}

fn encode_timestamp(timestamp: Timestamp) -> [u8; 5] {
    let bytes = (timestamp.ticks() & TIMESTAMP_MASK).to_be_bytes();
    [bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
}

fn decode_timestamp(bytes: &[u8]) -> Timestamp {
    let mut raw = [0u8; 8];
    raw[3..8].copy_from_slice(bytes);
    Timestamp::new(u64::from_be_bytes(raw))
}

/// Degrees in signed Q16.16, big-endian.
fn encode_coordinate(degrees: f64) -> [u8; 4] {
    let raw = (degrees * 65_536.0).round() as i32;
    raw.to_be_bytes()
}

fn decode_coordinate(bytes: &[u8]) -> f64 {
    let raw = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    f64::from(raw) / 65_536.0
}

// ---------------------------------------------------------------------------
// Verification seam
// ---------------------------------------------------------------------------

/// External signature-verification collaborator.
///
/// A pure predicate over the permit and the configured issuer key.
pub trait PermitVerifier {
    /// Whether the permit's signature verifies against `issuer_key`.
    fn verify(&self, permit: &DowngradePermit, issuer_key: &IssuerKey) -> bool;
}

/// Verifier stand-in that treats any nonzero signature as valid.
///
/// Sufficient for state-machine behaviour; production embeddings plug
/// in a real asymmetric implementation behind the same trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignaturePresenceVerifier;

impl PermitVerifier for SignaturePresenceVerifier {
    fn verify(&self, permit: &DowngradePermit, _issuer_key: &IssuerKey) -> bool {
        permit.signature.is_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_permit() -> DowngradePermit {
        DowngradePermit {
            version: PERMIT_VERSION,
            subject: SubscriberId::new(0x1122_3344_5566_7788),
            issuer: PlmnId::new(0x13F_001),
            allowed_rats: RatBitmap::new(0b0110),
            emergency_only: false,
            valid_from: Timestamp::new(1_000),
            valid_until: Timestamp::new(5_000),
            geo_bound: None,
            signature: Signature::from_bytes([0x5A; 64]),
        }
    }

    #[test]
    fn test_wire_layout_offsets() {
        let bytes = sample_permit().encode();
        assert_eq!(bytes.len(), PERMIT_BASE_LEN);
        assert_eq!(bytes[0], PERMIT_VERSION);
        assert_eq!(bytes[1..9], 0x1122_3344_5566_7788u64.to_be_bytes());
        assert_eq!(&bytes[9..12], &[0x13, 0xF0, 0x01]);
        // RAT bitmap 0b0110 in the top nibble of the auth word
        assert_eq!(bytes[12] >> 4, 0b0110);
        // valid-from as 5-byte big-endian
        assert_eq!(&bytes[14..19], &[0, 0, 0, 0x03, 0xE8]);
        assert_eq!(&bytes[24..], &[0x5A; 64][..]);
    }

    #[test]
    fn test_decode_matches_encode() {
        let permit = sample_permit();
        let decoded = DowngradePermit::decode(&permit.encode()).unwrap();
        assert_eq!(decoded, permit);
    }

    #[test]
    fn test_geo_bound_flagged_and_carried() {
        let mut permit = sample_permit();
        permit.geo_bound = Some(GeoBound {
            latitude_deg: 51.5074,
            longitude_deg: -0.1278,
            radius_km: 25,
        });
        let bytes = permit.encode();
        assert_eq!(bytes.len(), PERMIT_BASE_LEN + PERMIT_GEO_LEN);
        // Geo-present bit (bit 10) lands in the auth word's high byte
        assert_eq!(bytes[12] & 0b0000_0100, 0b0000_0100);

        let decoded = DowngradePermit::decode(&bytes).unwrap();
        let geo = decoded.geo_bound.unwrap();
        assert!((geo.latitude_deg - 51.5074).abs() < 1e-4);
        assert!((geo.longitude_deg + 0.1278).abs() < 1e-4);
        assert_eq!(geo.radius_km, 25);
    }

    #[test]
    fn test_truncated_buffer_rejected() {
        let bytes = sample_permit().encode();
        let err = DowngradePermit::decode(&bytes[..40]).unwrap_err();
        assert!(matches!(
            err,
            PermitError::Truncated {
                needed: PERMIT_BASE_LEN,
                actual: 40
            }
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = sample_permit().encode();
        bytes[0] = 0x02;
        let err = DowngradePermit::decode(&bytes).unwrap_err();
        assert!(matches!(err, PermitError::UnsupportedVersion { version: 0x02 }));
    }

    #[test]
    fn test_window_coverage() {
        let permit = sample_permit();
        assert!(!permit.covers(Timestamp::new(999)));
        assert!(permit.covers(Timestamp::new(1_000)));
        assert!(permit.covers(Timestamp::new(3_000)));
        assert!(permit.covers(Timestamp::new(5_000)));
        assert!(!permit.covers(Timestamp::new(5_001)));
        assert_eq!(permit.window_length(), 4_000);
    }

    #[test]
    fn test_window_coverage_across_wrap() {
        let mut permit = sample_permit();
        permit.valid_from = Timestamp::new(u64::MAX - 50);
        permit.valid_until = permit.valid_from.advanced_by(100);
        assert!(permit.covers(permit.valid_from.advanced_by(75)));
        assert!(!permit.covers(permit.valid_from.advanced_by(101)));
    }

    #[test]
    fn test_presence_verifier() {
        let permit = sample_permit();
        let key = IssuerKey::default();
        assert!(SignaturePresenceVerifier.verify(&permit, &key));

        let mut unsigned = permit;
        unsigned.signature = Signature::default();
        assert!(!SignaturePresenceVerifier.verify(&unsigned, &key));
    }
}
