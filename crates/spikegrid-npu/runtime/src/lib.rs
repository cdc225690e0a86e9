// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # Spikegrid Synapse Storage
//!
//! Owns every per-synapse array of a network:
//! - [`SynapseStore`]: structure-of-arrays storage, one fixed block of
//!   `max_synapses_per_neuron` slots per source neuron, first-fit slot reuse
//! - [`SynapseIndexMap`]: active synapses grouped by destination (incoming)
//!   and by source (outgoing)
//! - [`SummationMap`]: per-neuron input accumulators written with atomic adds
//! - [`StoreSnapshot`]: serializable copy of all live synapses
//!
//! Per-tick state (PSR, delay-queue words and heads, short-term dynamics) is
//! held in atomic lanes so the advance kernel can run over a shared
//! `&SynapseStore` from many threads. Topology mutation takes `&mut self` and
//! therefore cannot overlap a tick.
//!
//! ```rust
//! use spikegrid_npu_neural::{NeuronId, SynapseKind};
//! use spikegrid_npu_runtime::{NewSynapse, StoreLayout, SynapseStore};
//!
//! let layout = StoreLayout::new(4, 2).unwrap();
//! let mut store = SynapseStore::new(layout);
//! let id = store
//!     .create(
//!         NewSynapse::new(NeuronId(1), NeuronId(2), SynapseKind::ExcitatoryExcitatory, 0.5, 3),
//!         1e-4,
//!     )
//!     .unwrap();
//! assert_eq!(id.index(), 2);
//! assert_eq!(store.synapse_count(NeuronId(1)), 1);
//! ```

#![warn(missing_docs)]

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Standard (Vec-backed) storage
#[cfg(feature = "std")]
pub mod std_impl;

#[cfg(feature = "std")]
pub use std_impl::{
    DynamicLanes, NewSynapse, StoreLayout, StoreSnapshot, SummationMap, SynapseIndexMap,
    SynapseRecord, SynapseStore,
};
