// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Active-synapse index map
//!
//! A compact view of the live synapses, rebuilt after topology changes:
//!
//! ```text
//! incoming_synapse_ids: [ dest 0 ... | dest 1 ... | dest 2 ... ]
//!                         ^begin[0]    ^begin[1]    ^begin[2]
//! ```
//!
//! `incoming_synapse_ids` doubles as the kernel's active list; the outgoing
//! grouping serves back-propagation and per-source queries. The map is a
//! snapshot: it goes stale on the next create/erase and must be rebuilt.

use spikegrid_npu_neural::types::{NeuronId, SynapseId};

use super::synapse_store::SynapseStore;

/// Live synapses grouped by destination and by source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynapseIndexMap {
    /// Live synapse IDs ordered by destination neuron (then by ID)
    pub incoming_synapse_ids: Vec<SynapseId>,
    /// Start of each destination's run in `incoming_synapse_ids`
    pub incoming_begin: Vec<u32>,
    /// Length of each destination's run
    pub incoming_count: Vec<u32>,
    /// Live synapse IDs ordered by source neuron (then by slot)
    pub outgoing_synapse_ids: Vec<SynapseId>,
    /// Start of each source's run in `outgoing_synapse_ids`
    pub outgoing_begin: Vec<u32>,
    /// Length of each source's run
    pub outgoing_count: Vec<u32>,
}

impl SynapseIndexMap {
    /// Build the map from the store's current `in_use` flags (counting sort
    /// by destination; the store's block layout already orders by source)
    pub fn build(store: &SynapseStore) -> Self {
        let num_neurons = store.layout.num_neurons;

        let mut outgoing_synapse_ids = Vec::with_capacity(store.count());
        let mut outgoing_begin = vec![0u32; num_neurons];
        let mut outgoing_count = vec![0u32; num_neurons];
        let mut incoming_count = vec![0u32; num_neurons];

        for neuron in 0..num_neurons {
            outgoing_begin[neuron] = outgoing_synapse_ids.len() as u32;
            let block = store.layout.block(NeuronId(neuron as u32));
            for i in block {
                if store.in_use[i] {
                    outgoing_synapse_ids.push(SynapseId(i as u32));
                    incoming_count[store.dest_neurons[i] as usize] += 1;
                }
            }
            outgoing_count[neuron] = outgoing_synapse_ids.len() as u32 - outgoing_begin[neuron];
        }
        debug_assert_eq!(outgoing_synapse_ids.len(), store.count());

        let mut incoming_begin = vec![0u32; num_neurons];
        let mut running = 0u32;
        for neuron in 0..num_neurons {
            incoming_begin[neuron] = running;
            running += incoming_count[neuron];
        }

        let mut cursor = incoming_begin.clone();
        let mut incoming_synapse_ids = vec![SynapseId(0); outgoing_synapse_ids.len()];
        for &id in &outgoing_synapse_ids {
            let dest = store.dest_neurons[id.index()] as usize;
            incoming_synapse_ids[cursor[dest] as usize] = id;
            cursor[dest] += 1;
        }

        Self {
            incoming_synapse_ids,
            incoming_begin,
            incoming_count,
            outgoing_synapse_ids,
            outgoing_begin,
            outgoing_count,
        }
    }

    /// Active list walked by the advance kernel
    #[inline(always)]
    pub fn active(&self) -> &[SynapseId] {
        &self.incoming_synapse_ids
    }

    /// Number of active synapses
    pub fn len(&self) -> usize {
        self.incoming_synapse_ids.len()
    }

    /// Whether no synapse is active
    pub fn is_empty(&self) -> bool {
        self.incoming_synapse_ids.is_empty()
    }

    /// Synapses arriving at `neuron`
    pub fn incoming(&self, neuron: NeuronId) -> &[SynapseId] {
        Self::run(
            &self.incoming_synapse_ids,
            &self.incoming_begin,
            &self.incoming_count,
            neuron,
        )
    }

    /// Synapses leaving `neuron`
    pub fn outgoing(&self, neuron: NeuronId) -> &[SynapseId] {
        Self::run(
            &self.outgoing_synapse_ids,
            &self.outgoing_begin,
            &self.outgoing_count,
            neuron,
        )
    }

    fn run<'a>(
        ids: &'a [SynapseId],
        begin: &[u32],
        count: &[u32],
        neuron: NeuronId,
    ) -> &'a [SynapseId] {
        match (begin.get(neuron.index()), count.get(neuron.index())) {
            (Some(&begin), Some(&count)) => &ids[begin as usize..(begin + count) as usize],
            _ => &[],
        }
    }
}
