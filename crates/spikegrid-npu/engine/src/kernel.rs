// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Advance Kernel
//!
//! One tick for one synapse:
//!
//! ```text
//! 1. arrived = consume_arrival(id)
//! 2. if arrived: change_psr(id)        (resolved model handle)
//! 3. psr *= decay
//! 4. summation_point += psr            (atomic)
//! ```
//!
//! Synapses are independent apart from step 4, so the active list can be
//! walked in any order and split across threads. Nothing here allocates,
//! logs or fails.

use std::ops::Add;
use std::sync::atomic::Ordering;

use rayon::prelude::*;
use spikegrid_npu_neural::synapse::decay_psr;
use spikegrid_npu_neural::SynapseId;
use spikegrid_npu_runtime::{SummationMap, SynapseStore};

use crate::dispatch::DispatchTable;

/// Per-tick counters produced by the kernel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelCounts {
    pub advanced: usize,
    pub arrivals: usize,
}

impl Add for KernelCounts {
    type Output = KernelCounts;

    fn add(self, other: KernelCounts) -> KernelCounts {
        KernelCounts {
            advanced: self.advanced + other.advanced,
            arrivals: self.arrivals + other.arrivals,
        }
    }
}

/// Advance one synapse by one tick. Slots no longer in use are skipped.
#[inline]
pub fn advance_synapse(
    table: &DispatchTable,
    store: &SynapseStore,
    id: SynapseId,
    step: u64,
    delta_t: f32,
    sums: &SummationMap,
) -> KernelCounts {
    if !store.is_in_use(id) {
        return KernelCounts::default();
    }

    let arrived = store.consume_arrival(id);
    if arrived {
        (table.change_psr())(store, id, step, delta_t);
    }

    let cell = store.psr_cell(id);
    let psr = decay_psr(cell.load(Ordering::Relaxed), store.decay(id));
    cell.store(psr, Ordering::Relaxed);

    if let Some(point) = store.summation_point(id) {
        sums.add(point, psr);
    }

    KernelCounts {
        advanced: 1,
        arrivals: arrived as usize,
    }
}

/// Advance `active` on the calling thread
pub fn advance_serial(
    table: &DispatchTable,
    store: &SynapseStore,
    active: &[SynapseId],
    step: u64,
    delta_t: f32,
    sums: &SummationMap,
) -> KernelCounts {
    active.iter().fold(KernelCounts::default(), |counts, &id| {
        counts + advance_synapse(table, store, id, step, delta_t, sums)
    })
}

/// Advance `active` on the current rayon pool
pub fn advance_parallel(
    table: &DispatchTable,
    store: &SynapseStore,
    active: &[SynapseId],
    step: u64,
    delta_t: f32,
    sums: &SummationMap,
) -> KernelCounts {
    active
        .par_iter()
        .map(|&id| advance_synapse(table, store, id, step, delta_t, sums))
        .reduce(KernelCounts::default, |a, b| a + b)
}
