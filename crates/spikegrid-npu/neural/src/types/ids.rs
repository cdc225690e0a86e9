// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types for neurons, synapses and summation points

use core::fmt;

#[cfg(feature = "std")]
use serde::{Deserialize, Serialize};

/// Neuron ID (index into every per-neuron array)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct NeuronId(pub u32);

impl NeuronId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Flat synapse ID
///
/// Always `source_neuron × max_synapses_per_neuron + local_slot`, so the owning
/// neuron and slot can be recovered without a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct SynapseId(pub u32);

impl SynapseId {
    /// Compose the flat ID of `local_slot` inside `neuron`'s block
    #[inline(always)]
    pub fn from_slot(neuron: NeuronId, local_slot: usize, max_synapses_per_neuron: usize) -> Self {
        Self((neuron.index() * max_synapses_per_neuron + local_slot) as u32)
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Owning source neuron
    #[inline(always)]
    pub fn owner(self, max_synapses_per_neuron: usize) -> NeuronId {
        NeuronId((self.index() / max_synapses_per_neuron) as u32)
    }

    /// Position inside the owner's block
    #[inline(always)]
    pub fn local_slot(self, max_synapses_per_neuron: usize) -> usize {
        self.index() % max_synapses_per_neuron
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synapse({})", self.0)
    }
}

/// Non-owning reference into a destination neuron's input accumulator.
///
/// The neuron side owns the accumulator memory; a synapse only remembers which
/// entry it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(Serialize, Deserialize))]
pub struct SummationPointRef(pub u32);

impl SummationPointRef {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<NeuronId> for SummationPointRef {
    fn from(neuron: NeuronId) -> Self {
        Self(neuron.0)
    }
}
