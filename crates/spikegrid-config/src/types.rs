// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to a section of `spikegrid_configuration.toml`. All
//! sections are `#[serde(default)]`, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};

#[cfg(feature = "std")]
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikegridConfig {
    pub system: SystemConfig,
    pub network: NetworkConfig,
    pub simulation: SimulationConfig,
    pub synapses: SynapsesConfig,
    pub logging: LoggingConfig,
}

/// System-level configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Worker threads for the CPU backend (0 = rayon default)
    pub max_threads: usize,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            log_level: "info".to_string(),
        }
    }
}

/// Network size
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub num_neurons: usize,
    pub max_synapses_per_neuron: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_neurons: 100,
            max_synapses_per_neuron: 100,
        }
    }
}

/// Tick duration and execution backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per tick
    pub delta_t: f32,
    /// "cpu" or "auto"
    pub backend: String,
    /// Active synapses below which the CPU backend stays single-threaded
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delta_t: 1e-4,
            backend: "auto".to_string(),
            parallel_threshold: 4096,
        }
    }
}

/// Time constant and delay for one synapse kind (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct KindConfig {
    pub tau: f32,
    pub delay: f32,
}

/// Synapse model and per-kind parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynapsesConfig {
    /// "spiking" (static) or "dynamic" (short-term facilitation/depression)
    pub model: String,
    /// Scale applied to weight-matrix values
    pub strength_adjustment: f32,
    /// Weight magnitude used when no weight matrix is installed
    pub default_weight: f32,
    pub ee: KindConfig,
    pub ei: KindConfig,
    pub ie: KindConfig,
    pub ii: KindConfig,
}

impl Default for SynapsesConfig {
    fn default() -> Self {
        Self {
            model: "spiking".to_string(),
            strength_adjustment: 1e-8,
            default_weight: 10.0,
            ee: KindConfig {
                tau: 3e-3,
                delay: 1.5e-3,
            },
            ei: KindConfig {
                tau: 3e-3,
                delay: 0.8e-3,
            },
            ie: KindConfig {
                tau: 6e-3,
                delay: 0.8e-3,
            },
            ii: KindConfig {
                tau: 6e-3,
                delay: 0.8e-3,
            },
        }
    }
}

impl SynapsesConfig {
    /// `(code, parameters)` for every kind, in `ee, ei, ie, ii` order
    pub fn kinds(&self) -> [(&'static str, KindConfig); 4] {
        [
            ("ee", self.ee),
            ("ei", self.ei),
            ("ie", self.ie),
            ("ii", self.ii),
        ]
    }

    /// Parameters for a kind code (`"ee"`, `"ei"`, `"ie"`, `"ii"`)
    pub fn kind(&self, code: &str) -> Option<KindConfig> {
        self.kinds()
            .into_iter()
            .find(|(name, _)| *name == code)
            .map(|(_, params)| params)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json"
    pub format: String,
    pub file_logging: bool,
    #[cfg(feature = "std")]
    pub log_dir: PathBuf,
    #[cfg(not(feature = "std"))]
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file_logging: false,
            #[cfg(feature = "std")]
            log_dir: PathBuf::from("./logs"),
            #[cfg(not(feature = "std"))]
            log_dir: String::from("./logs"),
        }
    }
}
