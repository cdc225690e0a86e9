// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Synapse Model Architecture
//!
//! A synapse model is a bundle of plain functions over the shared store
//! layout. Models never appear in the hot loop as trait objects: the dispatch
//! table copies their function pointers out once, and the kernel calls those.
//!
//! ## Adding a New Synapse Model
//!
//! 1. Implement `SynapseModel` (usually only `name` and `change_psr_fn`)
//! 2. Register a constructor with `ModelRegistry::register`
//! 3. Add tests

use std::fmt;
use std::sync::atomic::Ordering;

use ahash::AHashMap;
use spikegrid_npu_neural::synapse::spiking_change_psr;
use spikegrid_npu_neural::SynapseId;
use spikegrid_npu_runtime::{StoreLayout, SynapseStore};

use crate::error::{EngineError, Result};

/// Change a synapse's PSR for a spike arriving at `step`
pub type ChangePsrFn = fn(store: &SynapseStore, id: SynapseId, step: u64, delta_t: f32);

/// Presynaptic spike reached the synapse; returns `false` on a duplicate schedule
pub type PreSpikeHitFn = fn(store: &SynapseStore, id: SynapseId) -> bool;

/// Postsynaptic neuron fired
pub type PostSpikeHitFn = fn(store: &SynapseStore, id: SynapseId);

/// Behavior of one synapse model over the shared store layout
pub trait SynapseModel: Send + Sync + fmt::Debug {
    /// Registry name, also used in logs
    fn name(&self) -> &str;

    /// Whether the store needs short-term dynamics lanes
    fn requires_dynamics(&self) -> bool {
        false
    }

    /// Whether postsynaptic spikes are reported back to synapses
    fn allow_back_propagation(&self) -> bool {
        false
    }

    /// Arrival handler used by the advance kernel
    fn change_psr_fn(&self) -> ChangePsrFn;

    fn pre_spike_hit_fn(&self) -> PreSpikeHitFn {
        schedule_arrival
    }

    fn post_spike_hit_fn(&self) -> PostSpikeHitFn {
        ignore_post_spike
    }

    /// Empty store with the lanes this model needs
    fn new_store(&self, layout: StoreLayout) -> SynapseStore {
        if self.requires_dynamics() {
            SynapseStore::with_dynamics(layout)
        } else {
            SynapseStore::new(layout)
        }
    }
}

/// `psr += weight / decay`
pub fn spiking_arrival(store: &SynapseStore, id: SynapseId, _step: u64, _delta_t: f32) {
    let cell = store.psr_cell(id);
    let psr = cell.load(Ordering::Relaxed);
    cell.store(
        spiking_change_psr(psr, store.weight(id), store.decay(id)),
        Ordering::Relaxed,
    );
}

/// `psr += (weight / decay) · u · r` after updating the short-term dynamics.
///
/// Stores without dynamics lanes fall back to the plain spiking response;
/// dispatch resolution rejects that combination before a tick can run.
pub fn dynamic_arrival(store: &SynapseStore, id: SynapseId, step: u64, delta_t: f32) {
    let Some(lanes) = store.dynamics_lanes() else {
        spiking_arrival(store, id, step, delta_t);
        return;
    };
    let mut state = lanes.load(id);
    let scale = state.on_arrival(step, delta_t);
    lanes.store_state(id, &state);

    let cell = store.psr_cell(id);
    let psr = cell.load(Ordering::Relaxed);
    cell.store(
        psr + store.weight(id) / store.decay(id) * scale,
        Ordering::Relaxed,
    );
}

/// Put the spike into the synapse's delay queue
pub fn schedule_arrival(store: &SynapseStore, id: SynapseId) -> bool {
    store.schedule_arrival(id)
}

pub fn ignore_post_spike(_store: &SynapseStore, _id: SynapseId) {}

/// Plain exponentially decaying synapse
#[derive(Debug, Clone, Copy, Default)]
pub struct SpikingSynapses;

impl SynapseModel for SpikingSynapses {
    fn name(&self) -> &str {
        "spiking"
    }

    fn change_psr_fn(&self) -> ChangePsrFn {
        spiking_arrival
    }
}

/// Spiking synapse with short-term depression and facilitation
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicSpikingSynapses;

impl SynapseModel for DynamicSpikingSynapses {
    fn name(&self) -> &str {
        "dynamic"
    }

    fn requires_dynamics(&self) -> bool {
        true
    }

    fn change_psr_fn(&self) -> ChangePsrFn {
        dynamic_arrival
    }
}

type ModelConstructor = fn() -> Box<dyn SynapseModel>;

/// Name → model constructor
pub struct ModelRegistry {
    constructors: AHashMap<String, ModelConstructor>,
}

impl ModelRegistry {
    /// Registry with no models
    pub fn empty() -> Self {
        Self {
            constructors: AHashMap::new(),
        }
    }

    /// Registry with `spiking` and `dynamic`
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::empty();
        registry.register("spiking", || Box::new(SpikingSynapses));
        registry.register("dynamic", || Box::new(DynamicSpikingSynapses));
        registry
    }

    /// Add or replace a model
    pub fn register(&mut self, name: &str, constructor: ModelConstructor) {
        self.constructors.insert(name.to_lowercase(), constructor);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn SynapseModel>> {
        self.constructors
            .get(&name.to_lowercase())
            .map(|constructor| constructor())
            .ok_or_else(|| EngineError::UnknownModel(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtin_models()
    }
}
