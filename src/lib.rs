// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spikegrid
//!
//! Synapse state engine for large spiking neural networks. Every synapse
//! keeps a 32-tick delay queue and a postsynaptic response that decays each
//! tick; arrivals add to the response and every response is accumulated into
//! its destination neuron's summation point.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spikegrid::prelude::*;
//!
//! let config = spikegrid::config::load_config(None, None)?;
//! let _logging = spikegrid::init_logging_from_config(&config.logging)?;
//!
//! let mut engine = SynapseEngine::from_config(&config)?;
//! engine.initialize()?;
//!
//! let dt = config.simulation.delta_t;
//! let id = engine.add_synapse(SynapseKind::ExcitatoryExcitatory, NeuronId(0), NeuronId(1), None, dt)?;
//!
//! let sums = engine.new_summation_map();
//! engine.notify_pre_synaptic_spike(id)?;
//! for tick in 0..100 {
//!     engine.advance_all_synapses(tick, dt, &sums)?;
//!     let _input_per_neuron = sums.drain();
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: spikegrid-npu-neural                       │
//! │  (ids, kinds, delay queue, response formulas)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Storage: spikegrid-npu-runtime                         │
//! │  (SoA store, index map, summation points, snapshots)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Execution: spikegrid-npu-engine                        │
//! │  (models, dispatch tables, CPU backend, kernel)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration (`spikegrid-config`) and logging (`spikegrid-observability`)
//! are shared by all layers.
//!
//! ## License
//!
//! Apache-2.0

use anyhow::Context;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use spikegrid_config as config;
pub use spikegrid_npu_engine as engine;
pub use spikegrid_npu_neural as neural;
pub use spikegrid_npu_runtime as runtime;
pub use spikegrid_observability as observability;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::SpikegridConfig;
    pub use crate::engine::{
        BackendConfig, BackendType, ComputeBackend, EngineConfig, EngineError, EngineStats,
        SynapseEngine, SynapseModel,
    };
    pub use crate::neural::{NeuronId, SummationPointRef, SynapseError, SynapseId, SynapseKind};
    pub use crate::runtime::{NewSynapse, StoreLayout, StoreSnapshot, SummationMap};
}

/// Convert the `[logging]` section of the configuration file into logging options
pub fn logging_config_from(
    config: &config::LoggingConfig,
) -> anyhow::Result<observability::LoggingConfig> {
    let format = config
        .format
        .parse::<observability::LogFormat>()
        .context("Invalid [logging] format")?;
    Ok(observability::LoggingConfig {
        level: config.level.clone(),
        format,
        file_logging: config.file_logging,
        log_dir: config.log_dir.clone(),
        ..observability::LoggingConfig::default()
    })
}

/// Initialize logging from the configuration file, honoring `--debug-*` flags
///
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_logging_from_config(
    config: &config::LoggingConfig,
) -> anyhow::Result<observability::LoggingGuard> {
    let logging = logging_config_from(config)?;
    let flags = observability::parse_debug_flags();
    observability::init_logging(&flags, &logging)
}
