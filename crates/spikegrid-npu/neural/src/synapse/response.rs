// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Postsynaptic response (PSR) formulas
//!
//! A synapse is a discrete leaky integrator:
//!
//! ```text
//! on arrival:   psr += weight / decay
//! every tick:   psr *= decay
//! ```
//!
//! Dividing by `decay` before the same-tick decay means an arrival contributes
//! exactly `weight` to the tick it lands in.

/// Per-tick decay factor `exp(-delta_t / tau)`
///
/// Returns `None` unless `tau` and `delta_t` are finite and strictly positive
/// and the factor lands strictly inside `(0, 1)`.
///
/// # Example
/// ```
/// use spikegrid_npu_neural::synapse::compute_decay;
///
/// let decay = compute_decay(3e-3, 1e-4).unwrap();
/// assert!(decay > 0.96 && decay < 0.97);
/// assert_eq!(compute_decay(0.0, 1e-4), None);
/// assert_eq!(compute_decay(3e-3, f32::NAN), None);
/// ```
#[inline]
pub fn compute_decay(tau: f32, delta_t: f32) -> Option<f32> {
    if !(is_positive_finite(tau) && is_positive_finite(delta_t)) {
        return None;
    }
    let decay = (-delta_t / tau).exp();
    is_valid_decay(decay).then_some(decay)
}

/// `0 < decay < 1`
#[inline]
pub fn is_valid_decay(decay: f32) -> bool {
    decay > 0.0 && decay < 1.0
}

#[inline]
fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Transmission delay in seconds, discretized into ticks: `floor(delay / delta_t) + 1`
///
/// # Example
/// ```
/// use spikegrid_npu_neural::synapse::delay_in_ticks;
///
/// assert_eq!(delay_in_ticks(1.5e-3, 1e-4), Some(16));
/// assert_eq!(delay_in_ticks(1.5e-3, 0.0), None);
/// ```
///
/// Returns `None` for a non-positive or non-finite `delta_t`, a negative or
/// non-finite `delay`, or a tick count outside `u32`.
#[inline]
pub fn delay_in_ticks(delay: f32, delta_t: f32) -> Option<u32> {
    if !is_positive_finite(delta_t) || !(delay.is_finite() && delay >= 0.0) {
        return None;
    }
    // Small bias so exact multiples do not round down from float error
    let ticks = ((delay / delta_t) + 1e-4).floor();
    if !(ticks < u32::MAX as f32) {
        return None;
    }
    (ticks as u32).checked_add(1)
}

/// Base PSR change on spike arrival
#[inline(always)]
pub fn spiking_change_psr(psr: f32, weight: f32, decay: f32) -> f32 {
    psr + weight / decay
}

/// One tick of exponential decay
#[inline(always)]
pub fn decay_psr(psr: f32, decay: f32) -> f32 {
    psr * decay
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_decay() {
        let decay = compute_decay(1.0, 1.0).unwrap();
        assert!((decay - (-1.0f32).exp()).abs() < 1e-7);
        assert_eq!(compute_decay(-1.0, 1.0), None);
        assert_eq!(compute_decay(1.0, 0.0), None);
        assert_eq!(compute_decay(1.0, f32::INFINITY), None);
        // exp underflows to 0 or rounds to 1
        assert_eq!(compute_decay(1e-6, 1.0), None);
        assert_eq!(compute_decay(1.0, 1e-12), None);
    }

    #[test]
    fn test_delay_in_ticks() {
        assert_eq!(delay_in_ticks(0.8e-3, 1e-4), Some(9));
        assert_eq!(delay_in_ticks(0.0, 1e-4), Some(1));
        assert_eq!(delay_in_ticks(0.5e-4, 1e-4), Some(1));
    }

    #[test]
    fn test_delay_in_ticks_rejects_unrepresentable() {
        assert_eq!(delay_in_ticks(1.5e-3, 0.0), None);
        assert_eq!(delay_in_ticks(1.5e-3, -1e-4), None);
        assert_eq!(delay_in_ticks(1.5e-3, f32::NAN), None);
        assert_eq!(delay_in_ticks(f32::NAN, 1e-4), None);
        assert_eq!(delay_in_ticks(-1.0, 1e-4), None);
        // saturates the cast
        assert_eq!(delay_in_ticks(1.0, 1e-12), None);
        assert_eq!(delay_in_ticks(f32::MAX, f32::MIN_POSITIVE), None);
    }

    #[test]
    fn test_arrival_contributes_weight_in_same_tick() {
        let decay = 0.9;
        let psr = decay_psr(spiking_change_psr(0.0, 1.0, decay), decay);
        assert!((psr - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_leak_without_arrivals() {
        let mut psr = 2.0f32;
        for _ in 0..10 {
            psr = decay_psr(psr, 0.5);
        }
        assert!((psr - 2.0 * 0.5f32.powi(10)).abs() < 1e-9);
    }
}
