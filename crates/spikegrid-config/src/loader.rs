// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones win:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, SpikegridConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "spikegrid_configuration.toml";

/// Find the Spikegrid configuration file
///
/// Search order:
/// 1. `SPIKEGRID_CONFIG_PATH` environment variable
/// 2. Current working directory: `./spikegrid_configuration.toml`
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SPIKEGRID_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by SPIKEGRID_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|path| path.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet SPIKEGRID_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML.
/// Call [`crate::validate_config`] on the result to check values.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SpikegridConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: SpikegridConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SPIKEGRID_MAX_THREADS` -> `system.max_threads`
/// - `SPIKEGRID_LOG_LEVEL` -> `system.log_level` and `logging.level`
/// - `SPIKEGRID_NUM_NEURONS` -> `network.num_neurons`
/// - `SPIKEGRID_MAX_SYNAPSES_PER_NEURON` -> `network.max_synapses_per_neuron`
/// - `SPIKEGRID_DELTA_T` -> `simulation.delta_t`
/// - `SPIKEGRID_BACKEND` -> `simulation.backend`
/// - `SPIKEGRID_PARALLEL_THRESHOLD` -> `simulation.parallel_threshold`
/// - `SPIKEGRID_SYNAPSE_MODEL` -> `synapses.model`
/// - `SPIKEGRID_LOG_FORMAT` -> `logging.format`
/// - `SPIKEGRID_FILE_LOGGING` -> `logging.file_logging`
/// - `SPIKEGRID_LOG_DIR` -> `logging.log_dir`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut SpikegridConfig) {
    if let Ok(value) = env::var("SPIKEGRID_MAX_THREADS") {
        if let Ok(threads) = value.parse::<usize>() {
            config.system.max_threads = threads;
        }
    }
    if let Ok(value) = env::var("SPIKEGRID_LOG_LEVEL") {
        config.system.log_level = value.clone();
        config.logging.level = value;
    }

    if let Ok(value) = env::var("SPIKEGRID_NUM_NEURONS") {
        if let Ok(n) = value.parse::<usize>() {
            config.network.num_neurons = n;
        }
    }
    if let Ok(value) = env::var("SPIKEGRID_MAX_SYNAPSES_PER_NEURON") {
        if let Ok(n) = value.parse::<usize>() {
            config.network.max_synapses_per_neuron = n;
        }
    }

    if let Ok(value) = env::var("SPIKEGRID_DELTA_T") {
        if let Ok(delta_t) = value.parse::<f32>() {
            config.simulation.delta_t = delta_t;
        }
    }
    if let Ok(value) = env::var("SPIKEGRID_BACKEND") {
        config.simulation.backend = value;
    }
    if let Ok(value) = env::var("SPIKEGRID_PARALLEL_THRESHOLD") {
        if let Ok(threshold) = value.parse::<usize>() {
            config.simulation.parallel_threshold = threshold;
        }
    }

    if let Ok(value) = env::var("SPIKEGRID_SYNAPSE_MODEL") {
        config.synapses.model = value;
    }

    if let Ok(value) = env::var("SPIKEGRID_LOG_FORMAT") {
        config.logging.format = value;
    }
    if let Ok(value) = env::var("SPIKEGRID_FILE_LOGGING") {
        config.logging.file_logging = parse_bool(&value);
    }
    if let Ok(value) = env::var("SPIKEGRID_LOG_DIR") {
        config.logging.log_dir = PathBuf::from(value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// Keys are `section.field` (e.g. `{"simulation.delta_t": "0.0002"}`); the
/// per-kind tables use `synapses.<kind>.tau` and `synapses.<kind>.delay`.
/// Unknown keys and unparsable values are ignored.
pub fn apply_cli_overrides(config: &mut SpikegridConfig, cli_args: &HashMap<String, String>) {
    for (key, value) in cli_args {
        match key.as_str() {
            "system.max_threads" => {
                if let Ok(threads) = value.parse() {
                    config.system.max_threads = threads;
                }
            }
            "system.log_level" => config.system.log_level = value.clone(),
            "network.num_neurons" => {
                if let Ok(n) = value.parse() {
                    config.network.num_neurons = n;
                }
            }
            "network.max_synapses_per_neuron" => {
                if let Ok(n) = value.parse() {
                    config.network.max_synapses_per_neuron = n;
                }
            }
            "simulation.delta_t" => {
                if let Ok(delta_t) = value.parse() {
                    config.simulation.delta_t = delta_t;
                }
            }
            "simulation.backend" => config.simulation.backend = value.clone(),
            "simulation.parallel_threshold" => {
                if let Ok(threshold) = value.parse() {
                    config.simulation.parallel_threshold = threshold;
                }
            }
            "synapses.model" => config.synapses.model = value.clone(),
            "synapses.strength_adjustment" => {
                if let Ok(strength) = value.parse() {
                    config.synapses.strength_adjustment = strength;
                }
            }
            "synapses.default_weight" => {
                if let Ok(weight) = value.parse() {
                    config.synapses.default_weight = weight;
                }
            }
            "logging.level" => config.logging.level = value.clone(),
            "logging.format" => config.logging.format = value.clone(),
            "logging.file_logging" => config.logging.file_logging = parse_bool(value),
            "logging.log_dir" => config.logging.log_dir = PathBuf::from(value),
            other => apply_kind_override(config, other, value),
        }
    }
}

fn apply_kind_override(config: &mut SpikegridConfig, key: &str, value: &str) {
    let mut parts = key.split('.');
    let (Some("synapses"), Some(kind), Some(field), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return;
    };
    let target = match kind {
        "ee" => &mut config.synapses.ee,
        "ei" => &mut config.synapses.ei,
        "ie" => &mut config.synapses.ie,
        "ii" => &mut config.synapses.ii,
        _ => return,
    };
    let Ok(parsed) = value.parse::<f32>() else {
        return;
    };
    match field {
        "tau" => target.tau = parsed,
        "delay" => target.delay = parsed,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("SPIKEGRID_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("SPIKEGRID_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var(
            "SPIKEGRID_CONFIG_PATH",
            dir.path().join("absent.toml").to_str().unwrap(),
        );
        let result = find_config_file();
        env::remove_var("SPIKEGRID_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved_delta_t = env::var("SPIKEGRID_DELTA_T").ok();
        env::remove_var("SPIKEGRID_DELTA_T");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[network]").unwrap();
        writeln!(file, "num_neurons = 64").unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "delta_t = 0.0002").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.network.num_neurons, 64);
        assert_eq!(config.simulation.delta_t, 0.0002);

        if let Some(value) = saved_delta_t {
            env::set_var("SPIKEGRID_DELTA_T", value);
        }
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&config_path, "[network\nnum_neurons = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = SpikegridConfig::default();

        env::set_var("SPIKEGRID_SYNAPSE_MODEL", "dynamic");
        env::set_var("SPIKEGRID_MAX_THREADS", "3");
        env::set_var("SPIKEGRID_PARALLEL_THRESHOLD", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("SPIKEGRID_SYNAPSE_MODEL");
        env::remove_var("SPIKEGRID_MAX_THREADS");
        env::remove_var("SPIKEGRID_PARALLEL_THRESHOLD");

        assert_eq!(config.synapses.model, "dynamic");
        assert_eq!(config.system.max_threads, 3);
        assert_eq!(
            config.simulation.parallel_threshold,
            SpikegridConfig::default().simulation.parallel_threshold
        );
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SpikegridConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.backend".to_string(), "cpu".to_string());
        cli_args.insert("synapses.ii.delay".to_string(), "0.001".to_string());
        cli_args.insert("synapses.xx.delay".to_string(), "0.5".to_string());
        cli_args.insert("unknown.key".to_string(), "1".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.simulation.backend, "cpu");
        assert_eq!(config.synapses.ii.delay, 0.001);
        assert_eq!(config.synapses.ii.tau, 6e-3);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "backend = \"auto\"").unwrap();
        writeln!(file, "parallel_threshold = 10").unwrap();

        env::set_var("SPIKEGRID_BACKEND", "env-backend");
        env::set_var("SPIKEGRID_PARALLEL_THRESHOLD", "20");

        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.backend".to_string(), "cpu".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("SPIKEGRID_BACKEND");
        env::remove_var("SPIKEGRID_PARALLEL_THRESHOLD");

        // CLI wins for backend, env wins for threshold (no CLI override)
        assert_eq!(config.simulation.backend, "cpu");
        assert_eq!(config.simulation.parallel_threshold, 20);
    }
}
