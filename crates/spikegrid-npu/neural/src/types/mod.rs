// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Synapse Types Module
//!
//! Core type definitions shared by storage and the advance engine.

pub mod atomic;
pub mod error;
pub mod ids;
pub mod kind;

pub use atomic::AtomicF32;
pub use error::{Result, SynapseError};
pub use ids::{NeuronId, SummationPointRef, SynapseId};
pub use kind::{NeuronType, SynapseKind};
