//! Clock-Domain Conversion
//!
//! Every chip counts cycles of its own clock. A timestamp moves from one
//! chip's domain to another's only through [`to_domain`] or
//! [`to_domain_ceil`].
//!
//! The product `cycle * freq_to` would overflow `u64` after a few hours of
//! 8 MHz time, so the quotient and the remainder of `cycle / freq_from` are
//! scaled separately and recombined.

/// A cycle count in the machine (processor) clock domain.
pub type MachineCycle = u64;

/// A cycle count in one device's own clock domain.
pub type DeviceCycle = u64;

/// Convert `cycle` from `freq_from` to `freq_to`, truncating.
///
/// # Panics
///
/// Panics if `freq_from` is zero.
#[inline]
pub fn to_domain(freq_to: u32, freq_from: u32, cycle: u64) -> u64 {
    assert!(freq_from != 0, "clock domain conversion from a zero frequency");
    let (to, from) = (u64::from(freq_to), u64::from(freq_from));
    let q = cycle / from;
    let r = cycle % from;
    q * to + r * to / from
}

/// Convert `cycle` from `freq_from` to `freq_to`, rounding up.
///
/// Used whenever a device's future event is turned into a machine-domain
/// timestamp: the device must never be woken before the cycle it asked for.
///
/// # Panics
///
/// Panics if `freq_from` is zero.
#[inline]
pub fn to_domain_ceil(freq_to: u32, freq_from: u32, cycle: u64) -> u64 {
    assert!(freq_from != 0, "clock domain conversion from a zero frequency");
    let (to, from) = (u64::from(freq_to), u64::from(freq_from));
    let q = cycle / from;
    let r = cycle % from;
    q * to + (r * to).div_ceil(from)
}
