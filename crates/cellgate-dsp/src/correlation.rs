//! Normalised correlation between a live channel vector and a stored
//! fingerprint handle.
//!
//! The score is the magnitude of the normalised Hermitian inner
//! product between the live vector and the dequantised stored vector:
//!
//! ```text
//! ρ² = (Re⟨·,·⟩² + Im⟨·,·⟩²) / (‖live‖² · ‖stored‖²)
//! ```
//!
//! computed entirely in Q16.16 with saturating accumulation, then
//! rooted with the approximate square root. Norm products saturate for
//! inputs far outside unit scale; callers feed unit-scaled CSI.

use crate::codec::FingerprintHandle;
use crate::fixed::Accum;
use crate::vector::ChannelVector;

/// Denominator guard: 10⁻⁴ in Q16.16.
pub const DENOMINATOR_EPSILON: Accum = Accum::from_raw(7);

/// Correlation score between a live vector and a stored handle.
///
/// Returns a value in [0, 1]. Monotone in the Hermitian inner-product
/// magnitude; degenerate inputs (either norm vanishing) score zero.
#[must_use]
pub fn score(live: &ChannelVector, stored: &FingerprintHandle) -> Accum {
    let mut inner_re = Accum::ZERO;
    let mut inner_im = Accum::ZERO;
    let mut norm_live = Accum::ZERO;
    let mut norm_stored = Accum::ZERO;

    for (antenna, cur) in live.iter().enumerate() {
        let st = stored.sample_at(antenna);

        // Hermitian inner product (conjugating the stored vector):
        // Re = ac + bd, Im = bc - ad
        inner_re = inner_re + cur.re * st.re + cur.im * st.im;
        inner_im = inner_im + cur.im * st.re - cur.re * st.im;

        norm_live = norm_live + cur.magnitude_squared();
        norm_stored = norm_stored + st.magnitude_squared();
    }

    let inner_mag_sq = inner_re * inner_re + inner_im * inner_im;
    let norm_product = norm_live * norm_stored;

    if norm_product < DENOMINATOR_EPSILON {
        return Accum::ZERO;
    }

    let rho_sq = inner_mag_sq.saturating_div(norm_product);
    rho_sq.sqrt().min(Accum::ONE)
}
