// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse kind (source/destination polarity) and neuron polarity

use core::fmt;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// Neuron polarity, as seen by the synapses leaving it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum NeuronType {
    Excitatory,
    Inhibitory,
}

/// Synapse kind, named `<source polarity><destination polarity>`
///
/// Fixed at creation. Decides the weight sign and which default time constant,
/// delay and short-term dynamics parameters apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "std", serde(rename_all = "snake_case"))]
pub enum SynapseKind {
    ExcitatoryExcitatory,
    ExcitatoryInhibitory,
    InhibitoryExcitatory,
    InhibitoryInhibitory,
    Undefined,
}

impl SynapseKind {
    /// All defined kinds, in a stable order
    pub const DEFINED: [SynapseKind; 4] = [
        SynapseKind::ExcitatoryExcitatory,
        SynapseKind::ExcitatoryInhibitory,
        SynapseKind::InhibitoryExcitatory,
        SynapseKind::InhibitoryInhibitory,
    ];

    /// Kind of a synapse running from a `source` neuron to a `dest` neuron
    pub fn from_neuron_types(source: NeuronType, dest: NeuronType) -> Self {
        match (source, dest) {
            (NeuronType::Excitatory, NeuronType::Excitatory) => Self::ExcitatoryExcitatory,
            (NeuronType::Excitatory, NeuronType::Inhibitory) => Self::ExcitatoryInhibitory,
            (NeuronType::Inhibitory, NeuronType::Excitatory) => Self::InhibitoryExcitatory,
            (NeuronType::Inhibitory, NeuronType::Inhibitory) => Self::InhibitoryInhibitory,
        }
    }

    /// Weight sign: +1 for excitatory sources, -1 for inhibitory sources, 0 when undefined
    #[inline(always)]
    pub fn sign(self) -> f32 {
        match self {
            Self::ExcitatoryExcitatory | Self::ExcitatoryInhibitory => 1.0,
            Self::InhibitoryExcitatory | Self::InhibitoryInhibitory => -1.0,
            Self::Undefined => 0.0,
        }
    }

    #[inline(always)]
    pub fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Two-letter code used in configuration tables and logs
    pub fn code(self) -> &'static str {
        match self {
            Self::ExcitatoryExcitatory => "ee",
            Self::ExcitatoryInhibitory => "ei",
            Self::InhibitoryExcitatory => "ie",
            Self::InhibitoryInhibitory => "ii",
            Self::Undefined => "undefined",
        }
    }

    /// Default synaptic time constant τ in seconds
    pub fn default_time_constant(self) -> f32 {
        match self {
            Self::InhibitoryInhibitory | Self::InhibitoryExcitatory => 6e-3,
            Self::ExcitatoryInhibitory | Self::ExcitatoryExcitatory => 3e-3,
            Self::Undefined => 0.0,
        }
    }

    /// Default transmission delay in seconds
    pub fn default_delay(self) -> f32 {
        match self {
            Self::ExcitatoryExcitatory => 1.5e-3,
            Self::ExcitatoryInhibitory
            | Self::InhibitoryExcitatory
            | Self::InhibitoryInhibitory => 0.8e-3,
            Self::Undefined => 0.0,
        }
    }
}

impl fmt::Display for SynapseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
