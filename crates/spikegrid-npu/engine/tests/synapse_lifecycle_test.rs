// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Topology lifecycle through the engine: slot reuse, churn, capacity and
//! weight signs.

use spikegrid_npu_engine::*;
use spikegrid_npu_neural::{NeuronId, NeuronType, SynapseError, SynapseId, SynapseKind};
use spikegrid_npu_runtime::StoreLayout;

const DT: f32 = 1e-4;
const MAX: usize = 3;

fn engine() -> SynapseEngine {
    let config = EngineConfig::new(StoreLayout::new(4, MAX).unwrap(), DT)
        .with_backend(BackendType::CPU, BackendConfig::default());
    let mut engine = SynapseEngine::new(config).unwrap();
    engine.initialize().unwrap();
    engine
}

fn connect(engine: &mut SynapseEngine, source: u32, dest: u32) -> Result<SynapseId> {
    engine.add_synapse(
        SynapseKind::ExcitatoryExcitatory,
        NeuronId(source),
        NeuronId(dest),
        None,
        DT,
    )
}

#[test]
fn test_erased_slot_is_reused() {
    let mut engine = engine();
    let ids: Vec<SynapseId> = (1..=3).map(|dest| connect(&mut engine, 1, dest).unwrap()).collect();
    assert_eq!(ids, vec![SynapseId(3), SynapseId(4), SynapseId(5)]);

    let removed = engine.remove_synapse(NeuronId(1), 1).unwrap();
    assert_eq!(removed, SynapseId(4));
    assert_eq!(engine.store().synapse_count(NeuronId(1)), 2);

    // first fit: the hole in the middle is taken before anything else
    let reused = connect(&mut engine, 1, 0).unwrap();
    assert_eq!(reused, SynapseId(4));
    assert_eq!(engine.store().dest(reused), NeuronId(0));
    assert_eq!(engine.store().synapse_count(NeuronId(1)), 3);
}

#[test]
fn test_reused_slot_starts_clean() {
    let mut engine = engine();
    let id = connect(&mut engine, 0, 1).unwrap();
    let sums = engine.new_summation_map();
    engine.notify_pre_synaptic_spike(id).unwrap();
    for tick in 0..5 {
        engine.advance_all_synapses(tick, DT, &sums).unwrap();
    }
    engine.notify_pre_synaptic_spike(id).unwrap();

    engine.remove_synapse(NeuronId(0), 0).unwrap();
    let reused = connect(&mut engine, 0, 2).unwrap();
    assert_eq!(reused, id);
    assert_eq!(engine.psr(reused).unwrap(), 0.0);
    assert_eq!(engine.store().delay_queue(reused).pending_count(), 0);
}

#[test]
fn test_no_growth_under_churn() {
    let mut engine = engine();
    let capacity = engine.store().capacity();
    for dest in 0..MAX as u32 {
        connect(&mut engine, 2, dest).unwrap();
    }

    for round in 0..200usize {
        let slot = round % MAX;
        engine.remove_synapse(NeuronId(2), slot).unwrap();
        let id = connect(&mut engine, 2, (round % 4) as u32).unwrap();
        assert_eq!(id.local_slot(MAX), slot);
        assert_eq!(id.owner(MAX), NeuronId(2));
    }

    assert_eq!(engine.store().count(), MAX);
    assert_eq!(engine.store().capacity(), capacity);

    let sums = engine.new_summation_map();
    engine.advance_all_synapses(0, DT, &sums).unwrap();
    assert_eq!(engine.index_map().len(), MAX);
}

#[test]
fn test_capacity_exceeded_leaves_store_unchanged() {
    let mut engine = engine();
    for dest in 0..MAX as u32 {
        connect(&mut engine, 3, dest).unwrap();
    }
    let before = engine.snapshot();

    let err = connect(&mut engine, 3, 0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Synapse(SynapseError::CapacityExceeded { neuron: NeuronId(3), max: MAX })
    ));
    assert_eq!(engine.snapshot(), before);

    // other neurons are unaffected
    assert!(connect(&mut engine, 0, 3).is_ok());
}

#[test]
fn test_double_remove_is_rejected() {
    let mut engine = engine();
    connect(&mut engine, 0, 1).unwrap();
    engine.remove_synapse(NeuronId(0), 0).unwrap();
    let err = engine.remove_synapse(NeuronId(0), 0).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Synapse(SynapseError::SynapseNotInUse(SynapseId(0)))
    ));
    assert_eq!(engine.store().synapse_count(NeuronId(0)), 0);
}

#[test]
fn test_weight_sign_follows_source_polarity() {
    let mut engine = engine();
    let pairs = [
        (NeuronType::Excitatory, NeuronType::Excitatory),
        (NeuronType::Excitatory, NeuronType::Inhibitory),
        (NeuronType::Inhibitory, NeuronType::Excitatory),
        (NeuronType::Inhibitory, NeuronType::Inhibitory),
    ];
    for (i, (source_type, dest_type)) in pairs.into_iter().enumerate() {
        let kind = SynapseKind::from_neuron_types(source_type, dest_type);
        let id = engine
            .add_synapse(kind, NeuronId(i as u32), NeuronId(0), None, DT)
            .unwrap();
        let weight = engine.store().weight(id);
        match source_type {
            NeuronType::Excitatory => assert!(weight > 0.0, "{}", kind),
            NeuronType::Inhibitory => assert!(weight < 0.0, "{}", kind),
        }
        assert_eq!(weight.signum(), kind.sign());
    }
}

#[test]
fn test_add_synapse_rejects_bad_tick_duration() {
    let mut engine = engine();
    for delta_t in [0.0, -1e-4, f32::NAN, f32::INFINITY] {
        let err = engine
            .add_synapse(SynapseKind::ExcitatoryExcitatory, NeuronId(0), NeuronId(1), None, delta_t)
            .unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Synapse(SynapseError::InvalidTickDuration { .. })
            ),
            "delta_t {}",
            delta_t
        );
    }
    assert_eq!(engine.store().count(), 0);

    // the delay no longer fits the 32-tick queue
    let err = engine
        .add_synapse(SynapseKind::ExcitatoryExcitatory, NeuronId(0), NeuronId(1), None, 1e-12)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Synapse(SynapseError::InvalidDelay { .. })
    ));
    assert_eq!(engine.store().count(), 0);
    assert!(connect(&mut engine, 0, 1).is_ok());
}

#[test]
fn test_reset_rejects_bad_tick_duration() {
    let mut engine = engine();
    let id = connect(&mut engine, 0, 1).unwrap();
    engine.store().psr_cell(id).store(0.25, std::sync::atomic::Ordering::Relaxed);
    let decay = engine.store().decay(id);
    let before = engine.snapshot();

    for delta_t in [0.0, -1e-4, f32::NAN] {
        let err = engine.reset_synapses(delta_t).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Synapse(SynapseError::InvalidTickDuration { .. })
        ));
    }
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.store().decay(id), decay);
    assert_eq!(engine.psr(id).unwrap(), 0.25);
    assert_eq!(engine.config().delta_t, DT);

    engine.reset_synapses(2e-4).unwrap();
    assert_eq!(engine.psr(id).unwrap(), 0.0);
    assert_eq!(engine.config().delta_t, 2e-4);
}
