// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Structure-of-arrays synapse store
//!
//! Storage is preallocated for `num_neurons × max_synapses_per_neuron` slots.
//! Source neuron `n` owns slots `n × max .. (n + 1) × max`, so a synapse ID is
//! also its array index and encodes its owner.

use core::ops::Range;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use spikegrid_npu_neural::synapse::{
    compute_decay, DelayQueue, ShortTermDynamics, LENGTH_OF_DELAYQUEUE,
};
use spikegrid_npu_neural::types::{
    AtomicF32, NeuronId, Result, SummationPointRef, SynapseError, SynapseId, SynapseKind,
};

/// Shape of a store: neuron count and per-neuron slot capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLayout {
    /// Number of neurons that may own synapses
    pub num_neurons: usize,
    /// Slots reserved per source neuron
    pub max_synapses_per_neuron: usize,
}

impl StoreLayout {
    /// Validate and build a layout
    pub fn new(num_neurons: usize, max_synapses_per_neuron: usize) -> Result<Self> {
        if num_neurons == 0 || max_synapses_per_neuron == 0 {
            return Err(SynapseError::InvalidLayout(format!(
                "num_neurons ({}) and max_synapses_per_neuron ({}) must be non-zero",
                num_neurons, max_synapses_per_neuron
            )));
        }
        match num_neurons.checked_mul(max_synapses_per_neuron) {
            Some(capacity) if capacity <= u32::MAX as usize => Ok(Self {
                num_neurons,
                max_synapses_per_neuron,
            }),
            _ => Err(SynapseError::InvalidLayout(format!(
                "{} × {} slots exceed the 32-bit synapse ID space",
                num_neurons, max_synapses_per_neuron
            ))),
        }
    }

    /// Total slot count
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.num_neurons * self.max_synapses_per_neuron
    }

    /// Slot range owned by `neuron`
    #[inline(always)]
    pub fn block(&self, neuron: NeuronId) -> Range<usize> {
        let begin = neuron.index() * self.max_synapses_per_neuron;
        begin..begin + self.max_synapses_per_neuron
    }
}

/// Attributes of a synapse to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewSynapse {
    /// Source (owning) neuron
    pub source: NeuronId,
    /// Destination neuron
    pub dest: NeuronId,
    /// Polarity pair, fixed for the synapse's lifetime
    pub kind: SynapseKind,
    /// Signed weight; sign must match `kind`
    pub weight: f32,
    /// Time constant τ in seconds
    pub time_constant: f32,
    /// Transmission delay in ticks (`< LENGTH_OF_DELAYQUEUE`)
    pub total_delay: u32,
    /// Accumulator this synapse feeds, if attached
    pub summation_point: Option<SummationPointRef>,
}

impl NewSynapse {
    /// Synapse with the kind's default τ, fed into the destination's own summation point
    pub fn new(
        source: NeuronId,
        dest: NeuronId,
        kind: SynapseKind,
        weight: f32,
        total_delay: u32,
    ) -> Self {
        Self {
            source,
            dest,
            kind,
            weight,
            time_constant: kind.default_time_constant(),
            total_delay,
            summation_point: Some(SummationPointRef::from(dest)),
        }
    }

    /// Override the time constant
    pub fn with_time_constant(mut self, time_constant: f32) -> Self {
        self.time_constant = time_constant;
        self
    }

    /// Override the summation point
    pub fn with_summation_point(mut self, summation_point: Option<SummationPointRef>) -> Self {
        self.summation_point = summation_point;
        self
    }
}

/// Short-term dynamics lanes (present only for stores built for dynamic synapses)
#[derive(Debug)]
pub struct DynamicLanes {
    recovered: Vec<AtomicF32>,
    utilization: Vec<AtomicF32>,
    base_utilization: Vec<f32>,
    depression_tau: Vec<f32>,
    facilitation_tau: Vec<f32>,
    last_spike: Vec<AtomicU64>,
}

impl DynamicLanes {
    fn new(capacity: usize) -> Self {
        Self {
            recovered: (0..capacity).map(|_| AtomicF32::new(1.0)).collect(),
            utilization: (0..capacity).map(|_| AtomicF32::new(0.0)).collect(),
            base_utilization: vec![0.0; capacity],
            depression_tau: vec![0.0; capacity],
            facilitation_tau: vec![0.0; capacity],
            last_spike: (0..capacity)
                .map(|_| AtomicU64::new(ShortTermDynamics::pack_last_spike(None)))
                .collect(),
        }
    }

    /// Value view of one synapse's dynamics
    #[inline]
    pub fn load(&self, id: SynapseId) -> ShortTermDynamics {
        let i = id.index();
        ShortTermDynamics {
            recovered: self.recovered[i].load(Ordering::Relaxed),
            utilization: self.utilization[i].load(Ordering::Relaxed),
            base_utilization: self.base_utilization[i],
            depression_tau: self.depression_tau[i],
            facilitation_tau: self.facilitation_tau[i],
            last_spike: ShortTermDynamics::unpack_last_spike(
                self.last_spike[i].load(Ordering::Relaxed),
            ),
        }
    }

    /// Write back the time-varying part (`r`, `u`, last spike)
    #[inline]
    pub fn store_state(&self, id: SynapseId, state: &ShortTermDynamics) {
        let i = id.index();
        self.recovered[i].store(state.recovered, Ordering::Relaxed);
        self.utilization[i].store(state.utilization, Ordering::Relaxed);
        self.last_spike[i].store(
            ShortTermDynamics::pack_last_spike(state.last_spike),
            Ordering::Relaxed,
        );
    }

    fn set(&mut self, id: SynapseId, state: &ShortTermDynamics) {
        let i = id.index();
        self.base_utilization[i] = state.base_utilization;
        self.depression_tau[i] = state.depression_tau;
        self.facilitation_tau[i] = state.facilitation_tau;
        self.store_state(id, state);
    }
}

/// Fixed-capacity structure-of-arrays synapse storage
#[derive(Debug)]
pub struct SynapseStore {
    pub(crate) layout: StoreLayout,

    // Identity (written only by create/erase)
    pub(crate) in_use: Vec<bool>,
    pub(crate) source_neurons: Vec<u32>,
    pub(crate) dest_neurons: Vec<u32>,
    pub(crate) kinds: Vec<SynapseKind>,
    pub(crate) summation_points: Vec<Option<SummationPointRef>>,

    // Parameters
    pub(crate) weights: Vec<f32>,
    pub(crate) time_constants: Vec<f32>,
    pub(crate) decay: Vec<f32>,
    pub(crate) total_delay: Vec<u32>,
    pub(crate) delay_queue_length: Vec<u32>,

    // Per-tick state
    pub(crate) psr: Vec<AtomicF32>,
    pub(crate) delay_queue: Vec<AtomicU32>,
    pub(crate) delay_queue_index: Vec<AtomicU32>,
    pub(crate) dynamics: Option<DynamicLanes>,

    pub(crate) synapse_counts: Vec<usize>,
    pub(crate) total_count: usize,
}

impl SynapseStore {
    /// Store for plain spiking synapses
    pub fn new(layout: StoreLayout) -> Self {
        let capacity = layout.capacity();
        Self {
            layout,
            in_use: vec![false; capacity],
            source_neurons: vec![0; capacity],
            dest_neurons: vec![0; capacity],
            kinds: vec![SynapseKind::Undefined; capacity],
            summation_points: vec![None; capacity],
            weights: vec![0.0; capacity],
            time_constants: vec![0.0; capacity],
            decay: vec![0.0; capacity],
            total_delay: vec![0; capacity],
            delay_queue_length: vec![LENGTH_OF_DELAYQUEUE; capacity],
            psr: (0..capacity).map(|_| AtomicF32::new(0.0)).collect(),
            delay_queue: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            delay_queue_index: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            dynamics: None,
            synapse_counts: vec![0; layout.num_neurons],
            total_count: 0,
        }
    }

    /// Store with short-term dynamics lanes
    pub fn with_dynamics(layout: StoreLayout) -> Self {
        let mut store = Self::new(layout);
        store.dynamics = Some(DynamicLanes::new(layout.capacity()));
        store
    }

    /// Layout this store was built for
    pub fn layout(&self) -> StoreLayout {
        self.layout
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.layout.capacity()
    }

    /// Number of live synapses
    pub fn count(&self) -> usize {
        self.total_count
    }

    /// Live synapses owned by `neuron` (0 when out of range)
    pub fn synapse_count(&self, neuron: NeuronId) -> usize {
        self.synapse_counts.get(neuron.index()).copied().unwrap_or(0)
    }

    /// Whether `id` names a live synapse
    #[inline(always)]
    pub fn is_in_use(&self, id: SynapseId) -> bool {
        self.in_use.get(id.index()).copied().unwrap_or(false)
    }

    /// Whether short-term dynamics lanes are allocated
    pub fn has_dynamics(&self) -> bool {
        self.dynamics.is_some()
    }

    /// Short-term dynamics lanes, if allocated
    #[inline(always)]
    pub fn dynamics_lanes(&self) -> Option<&DynamicLanes> {
        self.dynamics.as_ref()
    }

    /// IDs of all live synapses in ascending order
    pub fn live_ids(&self) -> impl Iterator<Item = SynapseId> + '_ {
        self.in_use
            .iter()
            .enumerate()
            .filter(|&(_, &used)| used)
            .map(|(i, _)| SynapseId(i as u32))
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Claim the first free slot in the source neuron's block.
    ///
    /// Every check runs before anything is written, so a failed create leaves
    /// the store untouched.
    pub fn create(&mut self, synapse: NewSynapse, delta_t: f32) -> Result<SynapseId> {
        self.check_neuron(synapse.source)?;
        self.check_neuron(synapse.dest)?;
        if !synapse.kind.is_defined() {
            return Err(SynapseError::UndefinedKind);
        }
        check_weight(synapse.weight, synapse.kind)?;
        self.check_summation_point(synapse.summation_point)?;
        DelayQueue::validate_delay(synapse.total_delay, LENGTH_OF_DELAYQUEUE)?;
        let decay = compute_decay(synapse.time_constant, delta_t).ok_or(
            SynapseError::InvalidTimeConstant {
                tau: synapse.time_constant,
                delta_t,
            },
        )?;

        let max = self.layout.max_synapses_per_neuron;
        let capacity_exceeded = SynapseError::CapacityExceeded {
            neuron: synapse.source,
            max,
        };
        if self.synapse_counts[synapse.source.index()] >= max {
            return Err(capacity_exceeded);
        }
        let block = self.layout.block(synapse.source);
        let slot = self.in_use[block]
            .iter()
            .position(|&used| !used)
            .ok_or(capacity_exceeded)?;

        let id = SynapseId::from_slot(synapse.source, slot, max);
        let i = id.index();
        self.in_use[i] = true;
        self.source_neurons[i] = synapse.source.0;
        self.dest_neurons[i] = synapse.dest.0;
        self.kinds[i] = synapse.kind;
        self.summation_points[i] = synapse.summation_point;
        self.weights[i] = synapse.weight;
        self.time_constants[i] = synapse.time_constant;
        self.decay[i] = decay;
        self.total_delay[i] = synapse.total_delay;
        self.delay_queue_length[i] = LENGTH_OF_DELAYQUEUE;
        self.psr[i].store(0.0, Ordering::Relaxed);
        self.delay_queue[i].store(0, Ordering::Relaxed);
        self.delay_queue_index[i].store(0, Ordering::Relaxed);
        if let Some(lanes) = self.dynamics.as_mut() {
            if let Some(defaults) = ShortTermDynamics::defaults_for(synapse.kind) {
                lanes.set(id, &defaults);
            }
        }

        self.synapse_counts[synapse.source.index()] += 1;
        self.total_count += 1;
        Ok(id)
    }

    /// Release a live synapse: clears `in_use`, detaches its summation point
    /// and decrements the owner's counter. The slot becomes reusable.
    pub fn erase(&mut self, id: SynapseId) -> Result<()> {
        self.check_synapse(id)?;
        if !self.in_use[id.index()] {
            return Err(SynapseError::SynapseNotInUse(id));
        }
        let i = id.index();
        self.in_use[i] = false;
        self.summation_points[i] = None;
        let owner = id.owner(self.layout.max_synapses_per_neuron);
        self.synapse_counts[owner.index()] -= 1;
        self.total_count -= 1;
        Ok(())
    }

    /// Erase by `(source neuron, local slot)`
    pub fn erase_slot(&mut self, neuron: NeuronId, local_slot: usize) -> Result<SynapseId> {
        self.check_neuron(neuron)?;
        let max = self.layout.max_synapses_per_neuron;
        if local_slot >= max {
            return Err(SynapseError::SlotOutOfRange {
                slot: local_slot,
                max,
            });
        }
        let id = SynapseId::from_slot(neuron, local_slot, max);
        self.erase(id)?;
        Ok(id)
    }

    /// Zero the PSR and recompute decay for a new tick duration.
    ///
    /// Identity fields, weight and pending spikes are left alone. Dynamic
    /// lanes return to their initial `r`/`u` with no previous spike.
    pub fn reset_state(&mut self, id: SynapseId, delta_t: f32) -> Result<()> {
        self.check_live(id)?;
        let decay = self.decay_for(id, delta_t)?;
        self.reset_slot(id, decay);
        Ok(())
    }

    /// `reset_state` for every live synapse.
    ///
    /// Every new decay is computed before any synapse is written, so a
    /// failure leaves the store untouched. Returns the number reset.
    pub fn reset_all(&mut self, delta_t: f32) -> Result<usize> {
        let live: Vec<SynapseId> = self.live_ids().collect();
        let decays = live
            .iter()
            .map(|&id| self.decay_for(id, delta_t))
            .collect::<Result<Vec<f32>>>()?;
        for (&id, decay) in live.iter().zip(decays) {
            self.reset_slot(id, decay);
        }
        Ok(live.len())
    }

    fn decay_for(&self, id: SynapseId, delta_t: f32) -> Result<f32> {
        let tau = self.time_constants[id.index()];
        compute_decay(tau, delta_t).ok_or(SynapseError::InvalidTimeConstant { tau, delta_t })
    }

    fn reset_slot(&mut self, id: SynapseId, decay: f32) {
        let i = id.index();
        self.decay[i] = decay;
        self.psr[i].store(0.0, Ordering::Relaxed);
        if let Some(lanes) = self.dynamics.as_mut() {
            let mut state = lanes.load(id);
            state.reset();
            lanes.store_state(id, &state);
        }
    }

    /// Change τ and recompute decay
    pub fn set_time_constant(&mut self, id: SynapseId, tau: f32, delta_t: f32) -> Result<()> {
        self.check_live(id)?;
        let decay =
            compute_decay(tau, delta_t).ok_or(SynapseError::InvalidTimeConstant { tau, delta_t })?;
        let i = id.index();
        self.time_constants[i] = tau;
        self.decay[i] = decay;
        Ok(())
    }

    /// Change the weight, keeping the kind's sign
    pub fn set_weight(&mut self, id: SynapseId, weight: f32) -> Result<()> {
        self.check_live(id)?;
        check_weight(weight, self.kinds[id.index()])?;
        self.weights[id.index()] = weight;
        Ok(())
    }

    /// Overwrite a synapse's short-term dynamics parameters and state
    pub fn set_dynamics(&mut self, id: SynapseId, state: ShortTermDynamics) -> Result<()> {
        self.check_live(id)?;
        let lanes = self
            .dynamics
            .as_mut()
            .ok_or_else(|| SynapseError::MissingDynamicLanes {
                model: "dynamic".to_string(),
            })?;
        lanes.set(id, &state);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Delay queue
    // ------------------------------------------------------------------------

    /// Schedule an arrival `total_delay` ticks after the current read head.
    ///
    /// Returns `false` when that slot was already pending; the bit stays set.
    #[inline]
    pub fn schedule_arrival(&self, id: SynapseId) -> bool {
        let i = id.index();
        let index = self.delay_queue_index[i].load(Ordering::Relaxed);
        let slot = (index + self.total_delay[i]) % self.delay_queue_length[i];
        let mask = 1u32 << slot;
        self.delay_queue[i].fetch_or(mask, Ordering::Relaxed) & mask == 0
    }

    /// Read and clear the slot under the head, then advance the head.
    ///
    /// Called once per synapse per tick by the advance kernel; the only place
    /// the head moves.
    #[inline]
    pub fn consume_arrival(&self, id: SynapseId) -> bool {
        let i = id.index();
        let index = self.delay_queue_index[i].load(Ordering::Relaxed);
        let mask = 1u32 << index;
        let hit = self.delay_queue[i].fetch_and(!mask, Ordering::Relaxed) & mask != 0;
        let next = index + 1;
        let next = if next >= self.delay_queue_length[i] { 0 } else { next };
        self.delay_queue_index[i].store(next, Ordering::Relaxed);
        hit
    }

    /// Value view of one synapse's delay queue
    pub fn delay_queue(&self, id: SynapseId) -> DelayQueue {
        let i = id.index();
        DelayQueue {
            bits: self.delay_queue[i].load(Ordering::Relaxed),
            index: self.delay_queue_index[i].load(Ordering::Relaxed),
            length: self.delay_queue_length[i],
        }
    }

    // ------------------------------------------------------------------------
    // Hot-path accessors (panic on out-of-range IDs)
    // ------------------------------------------------------------------------

    /// PSR accumulator cell
    #[inline(always)]
    pub fn psr_cell(&self, id: SynapseId) -> &AtomicF32 {
        &self.psr[id.index()]
    }

    /// Current PSR
    #[inline(always)]
    pub fn psr(&self, id: SynapseId) -> f32 {
        self.psr[id.index()].load(Ordering::Relaxed)
    }

    /// Signed weight
    #[inline(always)]
    pub fn weight(&self, id: SynapseId) -> f32 {
        self.weights[id.index()]
    }

    /// Per-tick decay factor
    #[inline(always)]
    pub fn decay(&self, id: SynapseId) -> f32 {
        self.decay[id.index()]
    }

    /// Time constant τ in seconds
    #[inline(always)]
    pub fn time_constant(&self, id: SynapseId) -> f32 {
        self.time_constants[id.index()]
    }

    /// Transmission delay in ticks
    #[inline(always)]
    pub fn total_delay(&self, id: SynapseId) -> u32 {
        self.total_delay[id.index()]
    }

    /// Synapse kind
    #[inline(always)]
    pub fn kind(&self, id: SynapseId) -> SynapseKind {
        self.kinds[id.index()]
    }

    /// Source neuron
    #[inline(always)]
    pub fn source(&self, id: SynapseId) -> NeuronId {
        NeuronId(self.source_neurons[id.index()])
    }

    /// Destination neuron
    #[inline(always)]
    pub fn dest(&self, id: SynapseId) -> NeuronId {
        NeuronId(self.dest_neurons[id.index()])
    }

    /// Attached summation point
    #[inline(always)]
    pub fn summation_point(&self, id: SynapseId) -> Option<SummationPointRef> {
        self.summation_points[id.index()]
    }

    // ------------------------------------------------------------------------
    // Validation helpers
    // ------------------------------------------------------------------------

    pub(crate) fn check_neuron(&self, neuron: NeuronId) -> Result<()> {
        if neuron.index() >= self.layout.num_neurons {
            return Err(SynapseError::NeuronOutOfRange {
                neuron,
                num_neurons: self.layout.num_neurons,
            });
        }
        Ok(())
    }

    pub(crate) fn check_summation_point(&self, point: Option<SummationPointRef>) -> Result<()> {
        match point {
            Some(point) if point.index() >= self.layout.num_neurons => {
                Err(SynapseError::NeuronOutOfRange {
                    neuron: NeuronId(point.0),
                    num_neurons: self.layout.num_neurons,
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn check_synapse(&self, id: SynapseId) -> Result<()> {
        if id.index() >= self.capacity() {
            return Err(SynapseError::SynapseOutOfRange {
                synapse: id,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Range and liveness check
    pub fn check_live(&self, id: SynapseId) -> Result<()> {
        self.check_synapse(id)?;
        if !self.in_use[id.index()] {
            return Err(SynapseError::SynapseNotInUse(id));
        }
        Ok(())
    }
}

/// Weights are finite, non-zero and carry the kind's sign
pub(crate) fn check_weight(weight: f32, kind: SynapseKind) -> Result<()> {
    if !weight.is_finite() {
        return Err(SynapseError::NonFiniteWeight { weight });
    }
    if !(weight * kind.sign() > 0.0) {
        return Err(SynapseError::WeightSignMismatch { weight, kind });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1e-4;

    fn store(num_neurons: usize, max: usize) -> SynapseStore {
        SynapseStore::new(StoreLayout::new(num_neurons, max).unwrap())
    }

    fn ee(source: u32, dest: u32) -> NewSynapse {
        NewSynapse::new(
            NeuronId(source),
            NeuronId(dest),
            SynapseKind::ExcitatoryExcitatory,
            1.0,
            2,
        )
    }

    #[test]
    fn test_layout_rejects_empty() {
        assert!(StoreLayout::new(0, 4).is_err());
        assert!(StoreLayout::new(4, 0).is_err());
        assert_eq!(StoreLayout::new(3, 4).unwrap().capacity(), 12);
        assert_eq!(StoreLayout::new(3, 4).unwrap().block(NeuronId(2)), 8..12);
    }

    #[test]
    fn test_create_uses_owner_block() {
        let mut store = store(4, 3);
        let id = store.create(ee(2, 0), DT).unwrap();
        assert_eq!(id, SynapseId(6));
        assert_eq!(store.source(id), NeuronId(2));
        assert_eq!(store.dest(id), NeuronId(0));
        assert_eq!(store.summation_point(id), Some(SummationPointRef(0)));
        assert_eq!(store.delay_queue(id), DelayQueue::empty());
        assert_eq!(store.psr(id), 0.0);
        assert!((store.decay(id) - compute_decay(3e-3, DT).unwrap()).abs() < 1e-7);
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_first_fit_reuses_freed_slot() {
        let mut store = store(2, 4);
        let ids: Vec<_> = (0..3).map(|_| store.create(ee(1, 0), DT).unwrap()).collect();
        assert_eq!(ids, vec![SynapseId(4), SynapseId(5), SynapseId(6)]);

        store.erase(ids[1]).unwrap();
        assert_eq!(store.summation_point(ids[1]), None);
        assert_eq!(store.synapse_count(NeuronId(1)), 2);

        let reused = store.create(ee(1, 0), DT).unwrap();
        assert_eq!(reused, ids[1]);
        assert_eq!(store.synapse_count(NeuronId(1)), 3);
    }

    #[test]
    fn test_churn_does_not_grow() {
        let mut store = store(1, 2);
        for _ in 0..100 {
            let id = store.create(ee(0, 0), DT).unwrap();
            assert_eq!(id, SynapseId(0));
            store.erase(id).unwrap();
        }
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_capacity_exceeded_leaves_store_unchanged() {
        let mut store = store(2, 2);
        store.create(ee(0, 1), DT).unwrap();
        store.create(ee(0, 1), DT).unwrap();
        let err = store.create(ee(0, 1), DT).unwrap_err();
        assert_eq!(
            err,
            SynapseError::CapacityExceeded {
                neuron: NeuronId(0),
                max: 2
            }
        );
        assert_eq!(store.synapse_count(NeuronId(0)), 2);
        assert_eq!(store.count(), 2);
        assert_eq!(store.live_ids().count(), 2);
    }

    #[test]
    fn test_create_validation() {
        let mut store = store(2, 2);
        let mut bad_delay = ee(0, 1);
        bad_delay.total_delay = LENGTH_OF_DELAYQUEUE;
        assert!(matches!(
            store.create(bad_delay, DT),
            Err(SynapseError::InvalidDelay { delay: 32, .. })
        ));

        let mut bad_sign = ee(0, 1);
        bad_sign.weight = -1.0;
        assert!(matches!(
            store.create(bad_sign, DT),
            Err(SynapseError::WeightSignMismatch { .. })
        ));

        let mut undefined = ee(0, 1);
        undefined.kind = SynapseKind::Undefined;
        assert_eq!(store.create(undefined, DT), Err(SynapseError::UndefinedKind));

        assert!(matches!(
            store.create(ee(0, 5), DT),
            Err(SynapseError::NeuronOutOfRange { .. })
        ));
        assert!(matches!(
            store.create(ee(0, 1).with_time_constant(0.0), DT),
            Err(SynapseError::InvalidTimeConstant { .. })
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_zero_and_non_finite_weights_rejected() {
        let mut store = store(2, 2);
        for weight in [0.0, -0.0, f32::NAN, f32::INFINITY] {
            let mut synapse = ee(0, 1);
            synapse.weight = weight;
            assert!(store.create(synapse, DT).is_err(), "weight {}", weight);
        }

        let mut inhibitory = ee(0, 1);
        inhibitory.kind = SynapseKind::InhibitoryInhibitory;
        inhibitory.weight = 0.0;
        assert!(matches!(
            store.create(inhibitory, DT),
            Err(SynapseError::WeightSignMismatch { .. })
        ));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_summation_point_must_exist() {
        let mut store = store(2, 2);
        let detached = store.create(ee(0, 1).with_summation_point(None), DT).unwrap();
        assert_eq!(store.summation_point(detached), None);
        assert!(matches!(
            store.create(ee(0, 1).with_summation_point(Some(SummationPointRef(2))), DT),
            Err(SynapseError::NeuronOutOfRange { .. })
        ));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_erase_errors() {
        let mut store = store(2, 2);
        assert_eq!(
            store.erase(SynapseId(1)),
            Err(SynapseError::SynapseNotInUse(SynapseId(1)))
        );
        assert!(matches!(
            store.erase(SynapseId(40)),
            Err(SynapseError::SynapseOutOfRange { .. })
        ));
        assert!(matches!(
            store.erase_slot(NeuronId(0), 2),
            Err(SynapseError::SlotOutOfRange { slot: 2, max: 2 })
        ));
        let id = store.create(ee(1, 0), DT).unwrap();
        assert_eq!(store.erase_slot(NeuronId(1), 0), Ok(id));
    }

    #[test]
    fn test_schedule_and_consume() {
        let mut store = store(1, 1);
        let id = store.create(ee(0, 0), DT).unwrap();
        assert!(store.schedule_arrival(id));
        assert!(!store.schedule_arrival(id));
        let hits: Vec<bool> = (0..4).map(|_| store.consume_arrival(id)).collect();
        assert_eq!(hits, vec![false, false, true, false]);
        assert_eq!(store.delay_queue(id).index, 4);
        assert_eq!(store.delay_queue(id).bits, 0);
    }

    #[test]
    fn test_reset_state() {
        let mut store = store(1, 1);
        let id = store.create(ee(0, 0), DT).unwrap();
        store.psr_cell(id).store(3.0, Ordering::Relaxed);
        store.reset_state(id, 2e-4).unwrap();
        assert_eq!(store.psr(id), 0.0);
        assert!((store.decay(id) - compute_decay(3e-3, 2e-4).unwrap()).abs() < 1e-7);
        assert_eq!(store.kind(id), SynapseKind::ExcitatoryExcitatory);
        assert!(store.reset_state(id, 0.0).is_err());
        assert!(store.reset_state(id, f32::NAN).is_err());
    }

    #[test]
    fn test_reset_all_is_all_or_nothing() {
        let mut store = store(2, 1);
        let fast = store.create(ee(0, 1).with_time_constant(1e-3), DT).unwrap();
        let slow = store.create(ee(1, 0).with_time_constant(1e-4), DT).unwrap();
        store.psr_cell(fast).store(1.0, Ordering::Relaxed);
        store.psr_cell(slow).store(2.0, Ordering::Relaxed);
        let decays = (store.decay(fast), store.decay(slow));

        // 20 ms ticks underflow the 0.1 ms synapse's decay to 0
        assert!(matches!(
            store.reset_all(0.02),
            Err(SynapseError::InvalidTimeConstant { .. })
        ));
        assert_eq!((store.decay(fast), store.decay(slow)), decays);
        assert_eq!(store.psr(fast), 1.0);
        assert_eq!(store.psr(slow), 2.0);

        assert_eq!(store.reset_all(2e-4), Ok(2));
        assert_eq!(store.psr(fast), 0.0);
        assert_eq!(store.psr(slow), 0.0);
    }

    #[test]
    fn test_dynamic_lanes_get_kind_defaults() {
        let mut store = SynapseStore::with_dynamics(StoreLayout::new(2, 2).unwrap());
        let kind = SynapseKind::InhibitoryExcitatory;
        let id = store
            .create(NewSynapse::new(NeuronId(0), NeuronId(1), kind, -0.5, 1), DT)
            .unwrap();
        let lanes = store.dynamics_lanes().unwrap();
        assert_eq!(lanes.load(id), ShortTermDynamics::defaults_for(kind).unwrap());

        let mut state = lanes.load(id);
        state.on_arrival(5, DT);
        lanes.store_state(id, &state);
        assert_eq!(store.dynamics_lanes().unwrap().load(id).last_spike, Some(5));

        store.reset_state(id, DT).unwrap();
        assert_eq!(store.dynamics_lanes().unwrap().load(id).last_spike, None);
    }

    #[test]
    fn test_set_dynamics_requires_lanes() {
        let mut store = store(1, 1);
        let id = store.create(ee(0, 0), DT).unwrap();
        let state = ShortTermDynamics::defaults_for(SynapseKind::ExcitatoryExcitatory).unwrap();
        assert!(matches!(
            store.set_dynamics(id, state),
            Err(SynapseError::MissingDynamicLanes { .. })
        ));
    }

    #[test]
    fn test_set_weight_and_time_constant() {
        let mut store = store(1, 1);
        let id = store.create(ee(0, 0), DT).unwrap();
        store.set_weight(id, 2.5).unwrap();
        assert_eq!(store.weight(id), 2.5);
        assert!(store.set_weight(id, -2.5).is_err());
        assert!(store.set_weight(id, 0.0).is_err());
        assert!(matches!(
            store.set_weight(id, f32::NAN),
            Err(SynapseError::NonFiniteWeight { .. })
        ));
        assert_eq!(store.weight(id), 2.5);
        store.set_time_constant(id, 1e-3, DT).unwrap();
        assert_eq!(store.time_constant(id), 1e-3);
        assert!((store.decay(id) - (-0.1f32).exp()).abs() < 1e-6);
    }
}
