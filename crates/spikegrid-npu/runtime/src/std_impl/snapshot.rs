// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-synapse state records and whole-store snapshots
//!
//! A record carries everything needed to resume a synapse mid-run: identity,
//! weight, τ and decay, the delay-queue word with its read head, the PSR and
//! (for dynamic stores) the short-term dynamics state.

use core::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};
use spikegrid_npu_neural::synapse::{
    is_valid_decay, DelayQueue, ShortTermDynamics, LENGTH_OF_DELAYQUEUE,
};
use spikegrid_npu_neural::types::{
    NeuronId, Result, SummationPointRef, SynapseError, SynapseId, SynapseKind,
};
use tracing::debug;

use super::synapse_store::{check_weight, StoreLayout, SynapseStore};

/// Complete state of one synapse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseRecord {
    pub source: NeuronId,
    pub dest: NeuronId,
    pub kind: SynapseKind,
    pub summation_point: Option<SummationPointRef>,
    pub weight: f32,
    pub psr: f32,
    pub time_constant: f32,
    pub decay: f32,
    pub total_delay: u32,
    pub delay_queue: u32,
    pub delay_queue_index: u32,
    pub delay_queue_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<ShortTermDynamics>,
}

/// Serializable copy of every live synapse in a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub layout: StoreLayout,
    pub has_dynamics: bool,
    pub synapses: Vec<(SynapseId, SynapseRecord)>,
}

impl SynapseStore {
    /// Read one live synapse
    pub fn synapse_record(&self, id: SynapseId) -> Result<SynapseRecord> {
        self.check_live(id)?;
        let i = id.index();
        Ok(SynapseRecord {
            source: NeuronId(self.source_neurons[i]),
            dest: NeuronId(self.dest_neurons[i]),
            kind: self.kinds[i],
            summation_point: self.summation_points[i],
            weight: self.weights[i],
            psr: self.psr[i].load(Ordering::Relaxed),
            time_constant: self.time_constants[i],
            decay: self.decay[i],
            total_delay: self.total_delay[i],
            delay_queue: self.delay_queue[i].load(Ordering::Relaxed),
            delay_queue_index: self.delay_queue_index[i].load(Ordering::Relaxed),
            delay_queue_length: self.delay_queue_length[i],
            dynamics: self.dynamics.as_ref().map(|lanes| lanes.load(id)),
        })
    }

    /// Write a record into slot `id`, claiming the slot if it was free.
    ///
    /// The record must satisfy everything `create` guarantees (owner, kind,
    /// weight sign, decay, summation point, delay) and its queue must be
    /// valid. Nothing is written if any check fails.
    pub fn apply_record(&mut self, id: SynapseId, record: &SynapseRecord) -> Result<()> {
        self.validate_record(id, record)?;

        let i = id.index();
        if !self.in_use[i] {
            self.in_use[i] = true;
            self.synapse_counts[record.source.index()] += 1;
            self.total_count += 1;
        }
        self.source_neurons[i] = record.source.0;
        self.dest_neurons[i] = record.dest.0;
        self.kinds[i] = record.kind;
        self.summation_points[i] = record.summation_point;
        self.weights[i] = record.weight;
        self.psr[i].store(record.psr, Ordering::Relaxed);
        self.time_constants[i] = record.time_constant;
        self.decay[i] = record.decay;
        self.total_delay[i] = record.total_delay;
        self.delay_queue[i].store(record.delay_queue, Ordering::Relaxed);
        self.delay_queue_index[i].store(record.delay_queue_index, Ordering::Relaxed);
        self.delay_queue_length[i] = record.delay_queue_length;
        if let Some(state) = record.dynamics {
            self.set_dynamics(id, state)?;
        }
        Ok(())
    }

    /// Check a record against this store without writing it
    pub fn validate_record(&self, id: SynapseId, record: &SynapseRecord) -> Result<()> {
        self.check_synapse(id)?;
        self.check_neuron(record.source)?;
        self.check_neuron(record.dest)?;
        let max = self.layout.max_synapses_per_neuron;
        if id.owner(max) != record.source {
            return Err(SynapseError::SnapshotMismatch(format!(
                "{} belongs to {}, record names {}",
                id,
                id.owner(max),
                record.source
            )));
        }
        if !record.kind.is_defined() {
            return Err(SynapseError::UndefinedKind);
        }
        check_weight(record.weight, record.kind)?;
        self.check_summation_point(record.summation_point)?;
        if !(record.time_constant.is_finite() && record.time_constant > 0.0) {
            return Err(SynapseError::SnapshotMismatch(format!(
                "{} has time constant {}s, must be finite and positive",
                id, record.time_constant
            )));
        }
        if !is_valid_decay(record.decay) {
            return Err(SynapseError::SnapshotMismatch(format!(
                "{} has decay {}, must lie strictly between 0 and 1",
                id, record.decay
            )));
        }
        if !record.psr.is_finite() {
            return Err(SynapseError::SnapshotMismatch(format!(
                "{} has a non-finite PSR ({})",
                id, record.psr
            )));
        }
        if record.delay_queue_length == 0
            || record.delay_queue_length > LENGTH_OF_DELAYQUEUE
            || record.delay_queue_index >= record.delay_queue_length
        {
            return Err(SynapseError::SnapshotMismatch(format!(
                "{} has an invalid delay queue (index {}, length {})",
                id, record.delay_queue_index, record.delay_queue_length
            )));
        }
        DelayQueue::validate_delay(record.total_delay, record.delay_queue_length)?;
        match (&record.dynamics, self.has_dynamics()) {
            (Some(_), false) => {
                return Err(SynapseError::MissingDynamicLanes {
                    model: "dynamic".to_string(),
                })
            }
            (None, true) => {
                return Err(SynapseError::SnapshotMismatch(format!(
                    "{} has no short-term dynamics, but the store tracks them",
                    id
                )))
            }
            (Some(state), true) if !dynamics_are_finite(state) => {
                return Err(SynapseError::SnapshotMismatch(format!(
                    "{} has non-finite short-term dynamics",
                    id
                )))
            }
            _ => {}
        }
        Ok(())
    }

    /// Copy every live synapse
    pub fn snapshot(&self) -> StoreSnapshot {
        let synapses = self
            .live_ids()
            .filter_map(|id| self.synapse_record(id).ok().map(|record| (id, record)))
            .collect();
        StoreSnapshot {
            layout: self.layout,
            has_dynamics: self.has_dynamics(),
            synapses,
        }
    }

    /// Replace the store's contents with a snapshot.
    ///
    /// The layout and dynamics lanes must match. All records are checked
    /// before the store is touched.
    pub fn restore(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        if snapshot.layout != self.layout {
            return Err(SynapseError::SnapshotMismatch(format!(
                "layout {:?} does not match store layout {:?}",
                snapshot.layout, self.layout
            )));
        }
        if snapshot.has_dynamics != self.has_dynamics() {
            return Err(SynapseError::SnapshotMismatch(format!(
                "snapshot dynamics lanes: {}, store dynamics lanes: {}",
                snapshot.has_dynamics,
                self.has_dynamics()
            )));
        }
        let mut per_neuron = vec![0usize; self.layout.num_neurons];
        for (id, record) in &snapshot.synapses {
            self.check_synapse(*id)?;
            self.check_neuron(record.source)?;
            per_neuron[record.source.index()] += 1;
        }
        if let Some(neuron) =
            per_neuron.iter().position(|&n| n > self.layout.max_synapses_per_neuron)
        {
            return Err(SynapseError::CapacityExceeded {
                neuron: NeuronId(neuron as u32),
                max: self.layout.max_synapses_per_neuron,
            });
        }

        let mut fresh = if self.has_dynamics() {
            SynapseStore::with_dynamics(self.layout)
        } else {
            SynapseStore::new(self.layout)
        };
        for (id, record) in &snapshot.synapses {
            fresh.apply_record(*id, record)?;
        }
        *self = fresh;
        debug!(
            "[SYNAPSE-STORE] Restored {} synapses from snapshot",
            self.total_count
        );
        Ok(())
    }
}

fn dynamics_are_finite(state: &ShortTermDynamics) -> bool {
    [
        state.recovered,
        state.utilization,
        state.base_utilization,
        state.depression_tau,
        state.facilitation_tau,
    ]
    .iter()
    .all(|value| value.is_finite())
}
