// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # CPU Backend
//!
//! Runs the advance kernel on a dedicated rayon pool. Small ticks stay on the
//! calling thread; the pool only pays off once enough synapses are active.

use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use spikegrid_npu_neural::SynapseId;
use spikegrid_npu_runtime::{SummationMap, SynapseStore};
use tracing::info;

use super::{AdvanceResult, BackendConfig, BackendType, ComputeBackend, DeviceGeneration};
use crate::dispatch::DispatchTable;
use crate::error::{EngineError, Result};
use crate::kernel;

/// CPU backend backed by a rayon thread pool
pub struct CPUBackend {
    /// Backend name for logging
    name: String,
    config: BackendConfig,
    pool: Option<ThreadPool>,
    generation: Option<DeviceGeneration>,
}

impl CPUBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            name: "CPU (rayon)".to_string(),
            config,
            pool: None,
            generation: None,
        }
    }

    pub fn config(&self) -> BackendConfig {
        self.config
    }

    /// Worker threads in the pool (0 before initialization)
    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(0, |pool| pool.current_num_threads())
    }
}

impl Default for CPUBackend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl ComputeBackend for CPUBackend {
    fn backend_name(&self) -> &str {
        &self.name
    }

    fn backend_type(&self) -> BackendType {
        BackendType::CPU
    }

    fn initialize(&mut self) -> Result<DeviceGeneration> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.max_threads)
            .thread_name(|i| format!("spikegrid-cpu-{}", i))
            .build()
            .map_err(|e| EngineError::Backend(format!("failed to build thread pool: {}", e)))?;
        let generation = DeviceGeneration::next();
        info!(
            backend = %self.name,
            threads = pool.current_num_threads(),
            %generation,
            "Compute device initialized"
        );
        self.pool = Some(pool);
        self.generation = Some(generation);
        Ok(generation)
    }

    fn generation(&self) -> Option<DeviceGeneration> {
        self.generation
    }

    fn advance(
        &self,
        table: &DispatchTable,
        store: &SynapseStore,
        active: &[SynapseId],
        step: u64,
        delta_t: f32,
        sums: &SummationMap,
    ) -> Result<AdvanceResult> {
        let pool = self.pool.as_ref().ok_or(EngineError::DeviceNotInitialized)?;
        let start = Instant::now();

        let parallel = active.len() >= self.config.parallel_threshold;
        let counts = if parallel {
            pool.install(|| kernel::advance_parallel(table, store, active, step, delta_t, sums))
        } else {
            kernel::advance_serial(table, store, active, step, delta_t, sums)
        };

        Ok(AdvanceResult {
            synapses_advanced: counts.advanced,
            arrivals: counts.arrivals,
            parallel,
            duration_us: start.elapsed().as_micros() as u64,
        })
    }
}
