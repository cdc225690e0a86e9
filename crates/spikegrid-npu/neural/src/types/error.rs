// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for synapse setup and topology operations
//!
//! Every variant is a setup-time or configuration-time condition. The per-tick
//! advance path never produces one.

use super::ids::{NeuronId, SynapseId};
use super::kind::SynapseKind;

/// Errors raised by synapse storage and topology operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynapseError {
    #[error("{neuron} already holds its maximum of {max} synapses")]
    CapacityExceeded { neuron: NeuronId, max: usize },

    #[error("delay of {delay} ticks does not fit a delay queue of length {queue_length}")]
    InvalidDelay { delay: u32, queue_length: u32 },

    #[error("{neuron} is out of range (network has {num_neurons} neurons)")]
    NeuronOutOfRange { neuron: NeuronId, num_neurons: usize },

    #[error("{synapse} is out of range (store capacity {capacity})")]
    SynapseOutOfRange { synapse: SynapseId, capacity: usize },

    #[error("local slot {slot} is out of range (max {max} synapses per neuron)")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("{0} is not in use")]
    SynapseNotInUse(SynapseId),

    #[error("cannot create a synapse of undefined kind")]
    UndefinedKind,

    #[error("weight {weight} has the wrong sign for a {kind} synapse")]
    WeightSignMismatch { weight: f32, kind: SynapseKind },

    #[error("cannot derive decay from tau={tau}s and delta_t={delta_t}s (both must be > 0)")]
    InvalidTimeConstant { tau: f32, delta_t: f32 },

    #[error("tick duration {delta_t}s must be finite and positive")]
    InvalidTickDuration { delta_t: f32 },

    #[error("weight {weight} is not a finite number")]
    NonFiniteWeight { weight: f32 },

    #[error("store layout mismatch: {0}")]
    InvalidLayout(String),

    #[error("snapshot does not match store: {0}")]
    SnapshotMismatch(String),

    #[error("synapse model '{model}' needs short-term dynamics lanes, but the store has none")]
    MissingDynamicLanes { model: String },
}

pub type Result<T> = core::result::Result<T, SynapseError>;
