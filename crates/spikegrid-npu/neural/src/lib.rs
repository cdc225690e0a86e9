// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Spikegrid Synapse Computation (Platform-Agnostic)
//!
//! Everything a synapse needs that does not depend on how it is stored:
//! - **Types**: identifiers, synapse kinds, neuron polarity, errors, `AtomicF32`
//! - **Synapse**: delay-queue bit arithmetic, decay and PSR formulas,
//!   short-term (facilitation/depression) dynamics
//!
//! Storage lives in `spikegrid-npu-runtime`; the per-tick kernel and behavior
//! dispatch live in `spikegrid-npu-engine`.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

// Synaptic algorithms
pub mod synapse;

// Re-export types
pub use types::{
    AtomicF32, NeuronId, NeuronType, Result, SummationPointRef, SynapseError, SynapseId,
    SynapseKind,
};

// Re-export synapse module
pub use synapse::{
    compute_decay, spiking_change_psr, DelayQueue, ShortTermDynamics, LENGTH_OF_DELAYQUEUE,
};
