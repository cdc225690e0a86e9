// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every problem in one pass so a bad file is fixed in one edit.

use crate::{ConfigError, ConfigResult, SpikegridConfig};

/// Bit width of a synapse's spike delay queue
pub const DELAY_QUEUE_LENGTH: u32 = 32;

const SYNAPSE_MODELS: [&str; 2] = ["spiking", "dynamic"];
const BACKENDS: [&str; 2] = ["cpu", "auto"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    DelayTooLong { kind: String, ticks: u32 },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::DelayTooLong { kind, ticks } => {
                write!(
                    f,
                    "synapses.{}.delay is {} ticks, must be below the delay queue length {}",
                    kind, ticks, DELAY_QUEUE_LENGTH
                )
            }
        }
    }
}

/// Delay in ticks for a delay in seconds (`floor(delay / delta_t) + 1`)
///
/// Saturates at `u32::MAX`, which never fits the delay queue.
pub fn delay_ticks(delay: f32, delta_t: f32) -> u32 {
    (((delay / delta_t) + 1e-4).floor().min(u32::MAX as f32) as u32).saturating_add(1)
}

/// Validate the complete configuration
///
/// Checks for:
/// - Non-zero network size
/// - Positive tick duration and time constants
/// - Per-kind delays that fit the delay queue at the configured tick duration
/// - Known model, backend and log format names
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failure
pub fn validate_config(config: &SpikegridConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_network(config, &mut errors);
    validate_simulation(config, &mut errors);
    validate_synapses(config, &mut errors);
    validate_logging(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_network(config: &SpikegridConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.network.num_neurons == 0 {
        errors.push(ConfigValidationError::MissingRequired {
            field: "network.num_neurons".to_string(),
        });
    }
    if config.network.max_synapses_per_neuron == 0 {
        errors.push(ConfigValidationError::MissingRequired {
            field: "network.max_synapses_per_neuron".to_string(),
        });
    }
    let slots = config
        .network
        .num_neurons
        .checked_mul(config.network.max_synapses_per_neuron);
    if !matches!(slots, Some(n) if n <= u32::MAX as usize) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "network".to_string(),
            reason: "num_neurons × max_synapses_per_neuron exceeds the 32-bit synapse ID space"
                .to_string(),
        });
    }
}

fn validate_simulation(config: &SpikegridConfig, errors: &mut Vec<ConfigValidationError>) {
    let delta_t = config.simulation.delta_t;
    if !(delta_t.is_finite() && delta_t > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.delta_t".to_string(),
            reason: format!("must be a positive number of seconds, got {}", delta_t),
        });
    }
    let backend = config.simulation.backend.to_lowercase();
    if !BACKENDS.contains(&backend.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "simulation.backend".to_string(),
            reason: format!(
                "unknown backend '{}' (expected one of {:?})",
                config.simulation.backend, BACKENDS
            ),
        });
    }
}

fn validate_synapses(config: &SpikegridConfig, errors: &mut Vec<ConfigValidationError>) {
    let synapses = &config.synapses;
    if !SYNAPSE_MODELS.contains(&synapses.model.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "synapses.model".to_string(),
            reason: format!(
                "unknown model '{}' (expected one of {:?})",
                synapses.model, SYNAPSE_MODELS
            ),
        });
    }
    if !(synapses.strength_adjustment.is_finite() && synapses.strength_adjustment > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "synapses.strength_adjustment".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if !(synapses.default_weight.is_finite() && synapses.default_weight > 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "synapses.default_weight".to_string(),
            reason: "must be a positive magnitude (the kind supplies the sign)".to_string(),
        });
    }

    let delta_t = config.simulation.delta_t;
    for (kind, params) in synapses.kinds() {
        if !(params.tau.is_finite() && params.tau > 0.0) {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("synapses.{}.tau", kind),
                reason: format!("must be positive, got {}", params.tau),
            });
        } else if delta_t.is_finite() && delta_t > 0.0 {
            let decay = (-delta_t / params.tau).exp();
            if !(decay > 0.0 && decay < 1.0) {
                errors.push(ConfigValidationError::InvalidValue {
                    field: format!("synapses.{}.tau", kind),
                    reason: format!(
                        "decay per tick exp(-{}/{}) = {} must lie strictly between 0 and 1",
                        delta_t, params.tau, decay
                    ),
                });
            }
        }
        if !(params.delay.is_finite() && params.delay >= 0.0) {
            errors.push(ConfigValidationError::InvalidValue {
                field: format!("synapses.{}.delay", kind),
                reason: format!("must be non-negative, got {}", params.delay),
            });
            continue;
        }
        if delta_t > 0.0 {
            let ticks = delay_ticks(params.delay, delta_t);
            if ticks >= DELAY_QUEUE_LENGTH {
                errors.push(ConfigValidationError::DelayTooLong {
                    kind: kind.to_string(),
                    ticks,
                });
            }
        }
    }
}

fn validate_logging(config: &SpikegridConfig, errors: &mut Vec<ConfigValidationError>) {
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.format".to_string(),
            reason: format!(
                "unknown format '{}' (expected one of {:?})",
                config.logging.format, LOG_FORMATS
            ),
        });
    }
}
