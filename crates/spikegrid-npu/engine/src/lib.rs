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

//! # Spikegrid Synapse Engine
//!
//! Per-tick state advance for large populations of spiking synapses.
//!
//! ## Architecture
//! - **Models** (`model`): named behaviors sharing one store layout
//! - **Dispatch** (`dispatch`): model operations resolved once per device
//!   initialization into plain function pointers
//! - **Kernel** (`kernel`): consume arrival, change PSR, decay, accumulate
//! - **Backends** (`backend`): where the kernel runs (rayon CPU pool)
//! - **Engine** (`synapse_engine`): topology and per-tick entry points
//!
//! ## Example
//! ```rust
//! use spikegrid_npu_engine::{EngineConfig, SynapseEngine};
//! use spikegrid_npu_neural::{NeuronId, SynapseKind};
//! use spikegrid_npu_runtime::StoreLayout;
//!
//! let dt = 1e-4;
//! let mut engine = SynapseEngine::new(EngineConfig::new(StoreLayout::new(2, 4).unwrap(), dt)).unwrap();
//! engine.initialize().unwrap();
//!
//! let id = engine
//!     .add_synapse(SynapseKind::ExcitatoryExcitatory, NeuronId(0), NeuronId(1), None, dt)
//!     .unwrap();
//! engine.notify_pre_synaptic_spike(id).unwrap();
//!
//! let sums = engine.new_summation_map();
//! for tick in 0..20 {
//!     engine.advance_all_synapses(tick, dt, &sums).unwrap();
//! }
//! assert!(engine.psr(id).unwrap() > 0.0);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backend;
pub mod dispatch;
pub mod error;
pub mod kernel;
pub mod model;
pub mod synapse_engine;

pub use backend::{
    create_backend, AdvanceResult, BackendConfig, BackendType, CPUBackend, ComputeBackend,
    DeviceGeneration,
};
pub use dispatch::{DispatchTable, SynapseOperation};
pub use error::{EngineError, Result};
pub use kernel::KernelCounts;
pub use model::{
    ChangePsrFn, DynamicSpikingSynapses, ModelRegistry, PostSpikeHitFn, PreSpikeHitFn,
    SpikingSynapses, SynapseModel,
};
pub use synapse_engine::{EngineConfig, KindParameters, SynapseEngine};

/// Cumulative engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks_advanced: u64,
    pub synapses_advanced: u64,
    pub arrivals_delivered: u64,
    /// Spikes merged into an already pending delay slot
    pub duplicate_arrivals: u64,
    pub pre_spike_notifications: u64,
    pub post_spike_notifications: u64,
    pub index_rebuilds: u64,
    /// Ticks that fanned out over the thread pool
    pub parallel_ticks: u64,
    pub last_tick_duration_us: u64,
    pub total_processing_time_us: u64,
}

impl EngineStats {
    /// Mean tick wall time (μs)
    pub fn avg_tick_duration_us(&self) -> f64 {
        if self.ticks_advanced == 0 {
            0.0
        } else {
            self.total_processing_time_us as f64 / self.ticks_advanced as f64
        }
    }

    pub fn avg_synapses_per_tick(&self) -> f64 {
        if self.ticks_advanced == 0 {
            0.0
        } else {
            self.synapses_advanced as f64 / self.ticks_advanced as f64
        }
    }
}
