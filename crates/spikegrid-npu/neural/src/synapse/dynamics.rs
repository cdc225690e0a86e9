// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Short-term synaptic dynamics (depression and facilitation)
//!
//! Tsodyks–Markram style: each arrival scales the base PSR jump by `u · r`,
//! where `r` is the recovered resource fraction and `u` the utilization.
//!
//! ```text
//! isi = (step - last_spike) * delta_t
//! r   = 1 + (r (1 - u) - 1) e^(-isi / D)
//! u   = U + u (1 - U) e^(-isi / F)
//! psr += (weight / decay) * u * r
//! ```

use crate::types::SynapseKind;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// Utilization a freshly created dynamic synapse starts with
pub const DEFAULT_UTILIZATION: f32 = 0.4;

/// Sentinel for "never spiked" in packed `last_spike` lanes
pub const NO_SPIKE: u64 = u64::MAX;

/// Short-term dynamics state of one synapse
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct ShortTermDynamics {
    /// Recovered resource fraction `r`
    pub recovered: f32,
    /// Current utilization `u`
    pub utilization: f32,
    /// Baseline utilization `U`
    pub base_utilization: f32,
    /// Depression (recovery) time constant `D` in seconds
    pub depression_tau: f32,
    /// Facilitation time constant `F` in seconds
    pub facilitation_tau: f32,
    /// Tick of the previous arrival
    pub last_spike: Option<u64>,
}

impl ShortTermDynamics {
    /// Kind defaults `(U, D, F)`; `None` for undefined kinds
    pub fn defaults_for(kind: SynapseKind) -> Option<Self> {
        let (base_utilization, depression_tau, facilitation_tau) = match kind {
            SynapseKind::InhibitoryInhibitory => (0.32, 0.144, 0.06),
            SynapseKind::InhibitoryExcitatory => (0.25, 0.7, 0.02),
            SynapseKind::ExcitatoryInhibitory => (0.05, 0.125, 1.2),
            SynapseKind::ExcitatoryExcitatory => (0.5, 1.1, 0.05),
            SynapseKind::Undefined => return None,
        };
        Some(Self {
            recovered: 1.0,
            utilization: DEFAULT_UTILIZATION,
            base_utilization,
            depression_tau,
            facilitation_tau,
            last_spike: None,
        })
    }

    /// Return `r`, `u` and the last spike to their initial values; `U`/`D`/`F` are kept
    pub fn reset(&mut self) {
        self.recovered = 1.0;
        self.utilization = DEFAULT_UTILIZATION;
        self.last_spike = None;
    }

    /// Update `r`/`u` for an arrival at `step` and return the PSR scale `u · r`
    #[inline]
    pub fn on_arrival(&mut self, step: u64, delta_t: f32) -> f32 {
        if let Some(last) = self.last_spike {
            let isi = step.saturating_sub(last) as f32 * delta_t;
            let r = self.recovered;
            let u = self.utilization;
            let big_u = self.base_utilization;
            self.recovered = 1.0 + (r * (1.0 - u) - 1.0) * (-isi / self.depression_tau).exp();
            self.utilization = big_u + u * (1.0 - big_u) * (-isi / self.facilitation_tau).exp();
        }
        self.last_spike = Some(step);
        self.utilization * self.recovered
    }

    #[inline(always)]
    pub fn pack_last_spike(last_spike: Option<u64>) -> u64 {
        last_spike.unwrap_or(NO_SPIKE)
    }

    #[inline(always)]
    pub fn unpack_last_spike(packed: u64) -> Option<u64> {
        (packed != NO_SPIKE).then_some(packed)
    }
}
