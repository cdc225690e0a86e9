// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synapse Engine
//!
//! Ties the store, the index map, the selected model and a compute backend
//! together behind the operations a topology builder and a simulation driver
//! call:
//!
//! ```text
//! setup:     initialize_device → resolve_dispatch → add_synapse / remove_synapse
//! per tick:  notify_pre_synaptic_spike* → advance_all_synapses(tick, delta_t)
//! ```
//!
//! Re-initializing the device invalidates the dispatch table; the next tick
//! fails with `StaleDispatchHandle` until `resolve_dispatch` runs again.

use ahash::AHashMap;
use ndarray::Array2;
use spikegrid_config::{validate_config, SpikegridConfig};
use spikegrid_npu_neural::synapse::{delay_in_ticks, LENGTH_OF_DELAYQUEUE};
use spikegrid_npu_neural::{NeuronId, SummationPointRef, SynapseError, SynapseId, SynapseKind};
use spikegrid_npu_runtime::{
    NewSynapse, StoreLayout, StoreSnapshot, SummationMap, SynapseIndexMap, SynapseStore,
};
use tracing::{debug, info, trace, warn};

use crate::backend::{
    create_backend, AdvanceResult, BackendConfig, BackendType, ComputeBackend, DeviceGeneration,
};
use crate::dispatch::DispatchTable;
use crate::error::{EngineError, Result};
use crate::model::{ModelRegistry, SynapseModel};
use crate::EngineStats;

/// Per-kind defaults applied by `add_synapse`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindParameters {
    /// Time constant τ in seconds
    pub time_constant: f32,
    /// Transmission delay in seconds
    pub delay: f32,
}

impl KindParameters {
    pub fn defaults_for(kind: SynapseKind) -> Option<Self> {
        kind.is_defined().then(|| Self {
            time_constant: kind.default_time_constant(),
            delay: kind.default_delay(),
        })
    }
}

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub layout: StoreLayout,
    /// Seconds per tick used for decay factors
    pub delta_t: f32,
    /// Registered model name
    pub model: String,
    /// Global weight scale
    pub strength_adjustment: f32,
    /// Weight magnitude used when no weight matrix is installed
    pub default_weight: f32,
    pub kinds: AHashMap<SynapseKind, KindParameters>,
    pub backend: BackendType,
    pub backend_config: BackendConfig,
}

impl EngineConfig {
    /// Spiking model, kind defaults, auto backend
    pub fn new(layout: StoreLayout, delta_t: f32) -> Self {
        let kinds = SynapseKind::DEFINED
            .into_iter()
            .filter_map(|kind| KindParameters::defaults_for(kind).map(|params| (kind, params)))
            .collect();
        Self {
            layout,
            delta_t,
            model: "spiking".to_string(),
            strength_adjustment: 1e-8,
            default_weight: 10.0,
            kinds,
            backend: BackendType::Auto,
            backend_config: BackendConfig::default(),
        }
    }

    /// Build from a loaded configuration file (validated first)
    pub fn from_config(config: &SpikegridConfig) -> Result<Self> {
        validate_config(config)?;
        let layout = StoreLayout::new(
            config.network.num_neurons,
            config.network.max_synapses_per_neuron,
        )?;

        let mut kinds = AHashMap::new();
        for kind in SynapseKind::DEFINED {
            if let Some(params) = config.synapses.kind(kind.code()) {
                kinds.insert(
                    kind,
                    KindParameters {
                        time_constant: params.tau,
                        delay: params.delay,
                    },
                );
            }
        }

        Ok(Self {
            layout,
            delta_t: config.simulation.delta_t,
            model: config.synapses.model.clone(),
            strength_adjustment: config.synapses.strength_adjustment,
            default_weight: config.synapses.default_weight,
            kinds,
            backend: config.simulation.backend.parse()?,
            backend_config: BackendConfig {
                max_threads: config.system.max_threads,
                parallel_threshold: config.simulation.parallel_threshold,
            },
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_backend(mut self, backend: BackendType, backend_config: BackendConfig) -> Self {
        self.backend = backend;
        self.backend_config = backend_config;
        self
    }

    pub fn kind_parameters(&self, kind: SynapseKind) -> Option<KindParameters> {
        self.kinds.get(&kind).copied()
    }
}

/// Synapse state-advance engine
pub struct SynapseEngine {
    config: EngineConfig,
    model: Box<dyn SynapseModel>,
    backend: Box<dyn ComputeBackend>,
    store: SynapseStore,
    index_map: SynapseIndexMap,
    index_dirty: bool,
    dispatch: Option<DispatchTable>,
    weight_matrix: Option<Array2<f32>>,
    stats: EngineStats,
}

impl SynapseEngine {
    /// Engine using the built-in models
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_registry(config, &ModelRegistry::default())
    }

    /// Engine resolving `config.model` through a custom registry
    pub fn with_registry(config: EngineConfig, registry: &ModelRegistry) -> Result<Self> {
        let model = registry.create(&config.model)?;
        let backend = create_backend(config.backend, config.backend_config)?;
        let store = model.new_store(config.layout);
        info!(
            model = model.name(),
            backend = backend.backend_name(),
            neurons = config.layout.num_neurons,
            max_synapses_per_neuron = config.layout.max_synapses_per_neuron,
            "[SYNAPSE-ENGINE] Created"
        );
        Ok(Self {
            config,
            model,
            backend,
            index_map: SynapseIndexMap::build(&store),
            store,
            index_dirty: false,
            dispatch: None,
            weight_matrix: None,
            stats: EngineStats::default(),
        })
    }

    /// Engine from a loaded configuration file
    pub fn from_config(config: &SpikegridConfig) -> Result<Self> {
        Self::new(EngineConfig::from_config(config)?)
    }

    // ------------------------------------------------------------------------
    // Device and dispatch
    // ------------------------------------------------------------------------

    /// (Re)initialize the compute device. The dispatch table must be resolved
    /// again before the next tick.
    pub fn initialize_device(&mut self) -> Result<DeviceGeneration> {
        let generation = self.backend.initialize()?;
        if let Some(table) = &self.dispatch {
            debug!(
                resolved = %table.generation(),
                current = %generation,
                "[SYNAPSE-ENGINE] Dispatch table invalidated by device initialization"
            );
        }
        Ok(generation)
    }

    /// Resolve the model's operations against the current device
    pub fn resolve_dispatch(&mut self) -> Result<()> {
        let generation = self
            .backend
            .generation()
            .ok_or(EngineError::DeviceNotInitialized)?;
        let table = DispatchTable::resolve(self.model.as_ref(), &self.store, generation)?;
        info!(
            model = table.model(),
            %generation,
            "[SYNAPSE-ENGINE] Dispatch table resolved"
        );
        self.dispatch = Some(table);
        Ok(())
    }

    /// `initialize_device` followed by `resolve_dispatch`
    pub fn initialize(&mut self) -> Result<()> {
        self.initialize_device()?;
        self.resolve_dispatch()
    }

    // ------------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------------

    /// Create a synapse with the kind's τ and delay.
    ///
    /// Weight is `W(source, dest) × sign(kind) × strength_adjustment`, where
    /// `W` comes from the weight matrix or `default_weight`. `summation_point`
    /// defaults to the destination's own accumulator.
    pub fn add_synapse(
        &mut self,
        kind: SynapseKind,
        source: NeuronId,
        dest: NeuronId,
        summation_point: Option<SummationPointRef>,
        delta_t: f32,
    ) -> Result<SynapseId> {
        let params = self
            .config
            .kind_parameters(kind)
            .ok_or(SynapseError::UndefinedKind)?;
        check_delta_t(delta_t)?;
        let total_delay =
            delay_in_ticks(params.delay, delta_t).ok_or(SynapseError::InvalidDelay {
                delay: u32::MAX,
                queue_length: LENGTH_OF_DELAYQUEUE,
            })?;
        let weight = self.weight_between(source, dest) * kind.sign() * self.config.strength_adjustment;
        let synapse = NewSynapse::new(source, dest, kind, weight, total_delay)
            .with_time_constant(params.time_constant)
            .with_summation_point(Some(summation_point.unwrap_or_else(|| dest.into())));
        self.insert_synapse(synapse, delta_t)
    }

    /// Create a synapse with explicit attributes
    pub fn insert_synapse(&mut self, synapse: NewSynapse, delta_t: f32) -> Result<SynapseId> {
        check_delta_t(delta_t)?;
        let id = self.store.create(synapse, delta_t)?;
        self.topology_changed()?;
        debug!(
            synapse = id.0,
            source = synapse.source.0,
            dest = synapse.dest.0,
            kind = %synapse.kind,
            total_delay = synapse.total_delay,
            "[SYNAPSE-ENGINE] Added synapse"
        );
        Ok(id)
    }

    /// Erase the synapse in `local_slot` of `source`'s block
    pub fn remove_synapse(&mut self, source: NeuronId, local_slot: usize) -> Result<SynapseId> {
        let id = self.store.erase_slot(source, local_slot)?;
        self.topology_changed()?;
        debug!(
            synapse = id.0,
            source = source.0,
            local_slot,
            "[SYNAPSE-ENGINE] Removed synapse"
        );
        Ok(id)
    }

    /// Install a dense `num_neurons × num_neurons` matrix of weight magnitudes
    pub fn set_weight_matrix(&mut self, matrix: Array2<f32>) -> Result<()> {
        let n = self.config.layout.num_neurons;
        if matrix.dim() != (n, n) {
            return Err(SynapseError::InvalidLayout(format!(
                "weight matrix is {:?}, network needs {}×{}",
                matrix.dim(),
                n,
                n
            ))
            .into());
        }
        self.weight_matrix = Some(matrix);
        Ok(())
    }

    fn weight_between(&self, source: NeuronId, dest: NeuronId) -> f32 {
        self.weight_matrix
            .as_ref()
            .and_then(|matrix| matrix.get((source.index(), dest.index())).copied())
            .unwrap_or(self.config.default_weight)
    }

    fn topology_changed(&mut self) -> Result<()> {
        self.index_dirty = true;
        self.backend.on_topology_change()
    }

    /// Rebuild the index map from the store
    pub fn rebuild_synapse_index_map(&mut self) {
        self.index_map = SynapseIndexMap::build(&self.store);
        self.index_dirty = false;
        self.stats.index_rebuilds += 1;
        debug!(
            active = self.index_map.len(),
            "[SYNAPSE-ENGINE] Rebuilt synapse index map"
        );
    }

    // ------------------------------------------------------------------------
    // Per tick
    // ------------------------------------------------------------------------

    /// Advance every active synapse by one tick and add each PSR into `sums`.
    ///
    /// `tick` is the global step index (used by models that track spike
    /// times). Rebuilds the index map first if the topology changed.
    pub fn advance_all_synapses(
        &mut self,
        tick: u64,
        delta_t: f32,
        sums: &SummationMap,
    ) -> Result<AdvanceResult> {
        if sums.len() < self.config.layout.num_neurons {
            return Err(SynapseError::InvalidLayout(format!(
                "summation map has {} points, network has {} neurons",
                sums.len(),
                self.config.layout.num_neurons
            ))
            .into());
        }
        if self.index_dirty {
            self.rebuild_synapse_index_map();
        }

        let table = checked_dispatch(&self.dispatch, self.backend.as_ref())?;
        let result = self.backend.advance(
            table,
            &self.store,
            self.index_map.active(),
            tick,
            delta_t,
            sums,
        )?;

        self.stats.ticks_advanced += 1;
        self.stats.synapses_advanced += result.synapses_advanced as u64;
        self.stats.arrivals_delivered += result.arrivals as u64;
        if result.parallel {
            self.stats.parallel_ticks += 1;
        }
        self.stats.last_tick_duration_us = result.duration_us;
        self.stats.total_processing_time_us += result.duration_us;

        trace!(
            tick,
            synapses = result.synapses_advanced,
            arrivals = result.arrivals,
            parallel = result.parallel,
            duration_us = result.duration_us,
            "[SYNAPSE-ENGINE] Tick advanced"
        );
        Ok(result)
    }

    /// Presynaptic neuron fired: schedule an arrival on `id`.
    ///
    /// Returns `false` if an arrival was already pending in the same queue
    /// slot; the spike is merged into it.
    pub fn notify_pre_synaptic_spike(&mut self, id: SynapseId) -> Result<bool> {
        self.store.check_live(id)?;
        let table = checked_dispatch(&self.dispatch, self.backend.as_ref())?;
        let scheduled = (table.pre_spike_hit())(&self.store, id);
        self.stats.pre_spike_notifications += 1;
        if !scheduled {
            self.stats.duplicate_arrivals += 1;
            warn!(
                synapse = id.0,
                total_delay = self.store.total_delay(id),
                "[SYNAPSE-ENGINE] Arrival already pending in this delay slot; spikes merged"
            );
        }
        Ok(scheduled)
    }

    /// Postsynaptic neuron fired: back-propagation hook
    pub fn notify_post_synaptic_spike(&mut self, id: SynapseId) -> Result<()> {
        self.store.check_live(id)?;
        let table = checked_dispatch(&self.dispatch, self.backend.as_ref())?;
        (table.post_spike_hit())(&self.store, id);
        self.stats.post_spike_notifications += 1;
        Ok(())
    }

    /// Current PSR of a live synapse
    pub fn psr(&self, id: SynapseId) -> Result<f32> {
        self.store.check_live(id)?;
        Ok(self.store.psr(id))
    }

    /// Zero every PSR and recompute decay for a new tick duration.
    ///
    /// All-or-nothing: if any synapse cannot take the new tick duration, no
    /// synapse is touched.
    pub fn reset_synapses(&mut self, delta_t: f32) -> Result<()> {
        check_delta_t(delta_t)?;
        let reset = self.store.reset_all(delta_t)?;
        self.config.delta_t = delta_t;
        info!(
            synapses = reset,
            delta_t,
            "[SYNAPSE-ENGINE] Reset synapse state"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Copy of every live synapse, enough to resume a run
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Replace the store's contents; the index map is rebuilt at the next tick
    pub fn restore(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        self.store.restore(snapshot)?;
        self.topology_changed()?;
        info!(
            synapses = self.store.count(),
            "[SYNAPSE-ENGINE] Restored from snapshot"
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn store(&self) -> &SynapseStore {
        &self.store
    }

    /// Index map as of the last rebuild (may lag behind pending topology changes)
    pub fn index_map(&self) -> &SynapseIndexMap {
        &self.index_map
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub fn dispatch_table(&self) -> Option<&DispatchTable> {
        self.dispatch.as_ref()
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Zeroed accumulators sized for this network
    pub fn new_summation_map(&self) -> SummationMap {
        SummationMap::new(self.config.layout.num_neurons)
    }
}

/// Tick durations must be finite and positive before any delay or decay is derived
fn check_delta_t(delta_t: f32) -> Result<()> {
    if delta_t.is_finite() && delta_t > 0.0 {
        Ok(())
    } else {
        Err(SynapseError::InvalidTickDuration { delta_t }.into())
    }
}

fn checked_dispatch<'a>(
    dispatch: &'a Option<DispatchTable>,
    backend: &dyn ComputeBackend,
) -> Result<&'a DispatchTable> {
    let current = backend
        .generation()
        .ok_or(EngineError::DeviceNotInitialized)?;
    let table = dispatch.as_ref().ok_or(EngineError::StaleDispatchHandle {
        resolved: None,
        current,
    })?;
    table.validate(current)?;
    Ok(table)
}
