// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Compute Backend Abstraction
//!
//! A backend owns the execution resources a tick runs on. Every
//! (re)initialization hands out a fresh `DeviceGeneration`; dispatch tables
//! remember the generation they were resolved against, so a table that
//! survives a re-initialization is detected instead of silently reused.

mod cpu;

pub use cpu::CPUBackend;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use spikegrid_npu_neural::SynapseId;
use spikegrid_npu_runtime::{SummationMap, SynapseStore};
use tracing::info;

use crate::dispatch::DispatchTable;
use crate::error::{EngineError, Result};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identifies one initialization of a compute device.
///
/// Unique across every backend in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceGeneration(pub u64);

impl DeviceGeneration {
    /// Allocate the next process-wide generation
    pub fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeviceGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generation {}", self.0)
    }
}

/// Outcome of one tick on a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Live synapses stepped
    pub synapses_advanced: usize,
    /// Arrivals consumed this tick
    pub arrivals: usize,
    /// Whether the tick fanned out over the thread pool
    pub parallel: bool,
    /// Wall time (μs)
    pub duration_us: u64,
}

/// Compute backend trait
pub trait ComputeBackend: Send + Sync {
    /// Backend name for logging/debugging
    fn backend_name(&self) -> &str;

    fn backend_type(&self) -> BackendType;

    /// (Re)initialize the device. Any dispatch table resolved earlier is stale
    /// afterwards.
    fn initialize(&mut self) -> Result<DeviceGeneration>;

    /// Current generation, `None` before the first `initialize`
    fn generation(&self) -> Option<DeviceGeneration>;

    /// Step every synapse in `active` once.
    ///
    /// The caller has already checked `table` against `generation()`.
    fn advance(
        &self,
        table: &DispatchTable,
        store: &SynapseStore,
        active: &[SynapseId],
        step: u64,
        delta_t: f32,
        sums: &SummationMap,
    ) -> Result<AdvanceResult>;

    /// Topology changed (invalidate caches)
    fn on_topology_change(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Backend type enum for construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    /// Rayon thread pool
    CPU,

    /// Pick the best available backend
    #[default]
    Auto,
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendType::CPU => write!(f, "CPU"),
            BackendType::Auto => write!(f, "Auto"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(BackendType::CPU),
            "auto" => Ok(BackendType::Auto),
            _ => Err(EngineError::InvalidBackend(s.to_string())),
        }
    }
}

/// Execution resources for a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    /// Worker threads (0 = rayon default)
    pub max_threads: usize,

    /// Minimum active synapses before a tick fans out over the pool
    pub parallel_threshold: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            parallel_threshold: 4096,
        }
    }
}

/// Construct a backend; it still needs `initialize`
pub fn create_backend(
    backend_type: BackendType,
    config: BackendConfig,
) -> Result<Box<dyn ComputeBackend>> {
    match backend_type {
        BackendType::CPU => Ok(Box::new(CPUBackend::new(config))),
        BackendType::Auto => {
            info!("Auto-selected CPU backend (no accelerator backends are built in)");
            Ok(Box::new(CPUBackend::new(config)))
        }
    }
}
