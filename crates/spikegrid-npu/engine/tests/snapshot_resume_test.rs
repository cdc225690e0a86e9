// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Snapshot / Resume Tests
//!
//! A run interrupted mid-way, serialized, and restored into a fresh engine
//! must continue on exactly the trajectory of an uninterrupted run.

use spikegrid_npu_engine::*;
use spikegrid_npu_neural::{NeuronId, SummationPointRef, SynapseError, SynapseId, SynapseKind};
use spikegrid_npu_runtime::{StoreLayout, StoreSnapshot};

const DT: f32 = 1e-4;
const TICKS: u64 = 80;
const SPLIT: u64 = 37;

fn fresh(model: &str) -> SynapseEngine {
    let config = EngineConfig::new(StoreLayout::new(6, 3).unwrap(), DT)
        .with_model(model)
        .with_backend(BackendType::CPU, BackendConfig::default());
    let mut engine = SynapseEngine::new(config).unwrap();
    engine.initialize().unwrap();
    engine
}

fn wire(engine: &mut SynapseEngine) -> Vec<SynapseId> {
    let edges = [
        (0, 1, SynapseKind::ExcitatoryExcitatory),
        (0, 2, SynapseKind::ExcitatoryInhibitory),
        (1, 2, SynapseKind::ExcitatoryInhibitory),
        (2, 0, SynapseKind::InhibitoryExcitatory),
        (3, 4, SynapseKind::InhibitoryInhibitory),
        (4, 5, SynapseKind::ExcitatoryExcitatory),
        (5, 3, SynapseKind::ExcitatoryExcitatory),
    ];
    edges
        .iter()
        .map(|&(source, dest, kind)| {
            engine
                .add_synapse(kind, NeuronId(source), NeuronId(dest), None, DT)
                .unwrap()
        })
        .collect()
}

/// Same input on every run: synapse `i` spikes whenever `(tick + i) % 7 == 0`
fn step(engine: &mut SynapseEngine, ids: &[SynapseId], tick: u64) -> Vec<f32> {
    for (i, &id) in ids.iter().enumerate() {
        if (tick + i as u64) % 7 == 0 {
            engine.notify_pre_synaptic_spike(id).unwrap();
        }
    }
    let sums = engine.new_summation_map();
    engine.advance_all_synapses(tick, DT, &sums).unwrap();
    ids.iter().map(|&id| engine.psr(id).unwrap()).collect()
}

fn check_resume(model: &str) {
    let mut reference = fresh(model);
    let ids = wire(&mut reference);
    let expected: Vec<Vec<f32>> = (0..TICKS).map(|tick| step(&mut reference, &ids, tick)).collect();

    let mut interrupted = fresh(model);
    let interrupted_ids = wire(&mut interrupted);
    assert_eq!(interrupted_ids, ids);
    for tick in 0..SPLIT {
        step(&mut interrupted, &ids, tick);
    }
    let json = serde_json::to_string(&interrupted.snapshot()).unwrap();
    drop(interrupted);

    let snapshot: StoreSnapshot = serde_json::from_str(&json).unwrap();
    let mut resumed = fresh(model);
    resumed.restore(&snapshot).unwrap();
    assert_eq!(resumed.store().count(), ids.len());

    for tick in SPLIT..TICKS {
        let actual = step(&mut resumed, &ids, tick);
        assert_eq!(actual, expected[tick as usize], "{} model, tick {}", model, tick);
    }
}

#[test]
fn test_spiking_resume_matches_uninterrupted_run() {
    check_resume("spiking");
}

#[test]
fn test_dynamic_resume_matches_uninterrupted_run() {
    check_resume("dynamic");
}

#[test]
fn test_snapshot_carries_queue_contents() {
    let mut engine = fresh("spiking");
    let ids = wire(&mut engine);
    engine.notify_pre_synaptic_spike(ids[0]).unwrap();
    let sums = engine.new_summation_map();
    for tick in 0..3 {
        engine.advance_all_synapses(tick, DT, &sums).unwrap();
    }

    let snapshot = engine.snapshot();
    let (_, record) = snapshot
        .synapses
        .iter()
        .find(|(id, _)| *id == ids[0])
        .unwrap();
    assert_eq!(record.delay_queue_index, 3);
    assert_eq!(record.delay_queue.count_ones(), 1);
    assert_eq!(record.total_delay, engine.store().total_delay(ids[0]));
    assert_eq!(record.decay, engine.store().decay(ids[0]));
    assert_eq!(record.time_constant, engine.store().time_constant(ids[0]));
}

#[test]
fn test_restore_rejects_other_model_lanes() {
    let mut dynamic = fresh("dynamic");
    wire(&mut dynamic);
    let snapshot = dynamic.snapshot();

    let mut spiking = fresh("spiking");
    let err = spiking.restore(&snapshot).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Synapse(SynapseError::SnapshotMismatch(_))
    ));
    assert_eq!(spiking.store().count(), 0);
}

#[test]
fn test_restore_rejects_corrupted_records() {
    let mut source = fresh("spiking");
    let ids = wire(&mut source);
    let good = source.snapshot();

    let mut target = fresh("spiking");
    let kept = target
        .add_synapse(SynapseKind::ExcitatoryExcitatory, NeuronId(1), NeuronId(0), None, DT)
        .unwrap();
    let before = target.snapshot();

    let mut missing_neuron = good.clone();
    missing_neuron.synapses[0].1.summation_point = Some(SummationPointRef(99));
    let mut flipped_sign = good.clone();
    flipped_sign.synapses[3].1.weight = 1.0;
    let mut stuck_decay = good.clone();
    stuck_decay.synapses[1].1.decay = 1.0;

    for snapshot in [&missing_neuron, &flipped_sign, &stuck_decay] {
        assert!(target.restore(snapshot).is_err());
        assert_eq!(target.snapshot(), before);
    }
    let err = target.restore(&missing_neuron).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Synapse(SynapseError::NeuronOutOfRange { .. })
    ));

    // the engine keeps running on its previous topology
    target.notify_pre_synaptic_spike(kept).unwrap();
    let sums = target.new_summation_map();
    for tick in 0..40 {
        target.advance_all_synapses(tick, DT, &sums).unwrap();
    }
    assert!(sums.drain()[0] > 0.0);

    target.restore(&good).unwrap();
    assert_eq!(target.store().count(), ids.len());
}
