// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine error type

use spikegrid_config::ConfigError;
use spikegrid_npu_neural::SynapseError;

use crate::backend::DeviceGeneration;

/// Errors raised while configuring or driving the engine.
///
/// The per-tick kernel itself never fails; these come from setup, topology
/// changes and the dispatch check that runs once per tick.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Synapse(#[from] SynapseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(
        "dispatch table is stale: resolved against {}, device is at {current}",
        describe_generation(.resolved)
    )]
    StaleDispatchHandle {
        resolved: Option<DeviceGeneration>,
        current: DeviceGeneration,
    },

    #[error("compute device is not initialized")]
    DeviceNotInitialized,

    #[error("unknown backend '{0}'")]
    InvalidBackend(String),

    #[error("unknown synapse model '{0}'")]
    UnknownModel(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

fn describe_generation(generation: &Option<DeviceGeneration>) -> String {
    match generation {
        Some(generation) => generation.to_string(),
        None => "nothing (never resolved)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
