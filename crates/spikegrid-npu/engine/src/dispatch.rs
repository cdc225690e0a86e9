// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Behavior dispatch table
//!
//! Resolves a model's named operations into plain function pointers once per
//! device initialization. The kernel receives the table by reference and
//! calls the pointers directly; no trait objects are touched per synapse.

use std::fmt;

use spikegrid_npu_neural::SynapseError;
use spikegrid_npu_runtime::SynapseStore;
use tracing::debug;

use crate::backend::DeviceGeneration;
use crate::error::{EngineError, Result};
use crate::model::{ChangePsrFn, PostSpikeHitFn, PreSpikeHitFn, SynapseModel};

/// Operations a synapse model provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynapseOperation {
    ChangePsr,
    PreSpikeHit,
    PostSpikeHit,
}

impl SynapseOperation {
    /// Resolution order
    pub const ALL: [SynapseOperation; 3] = [
        SynapseOperation::ChangePsr,
        SynapseOperation::PreSpikeHit,
        SynapseOperation::PostSpikeHit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SynapseOperation::ChangePsr => "change_psr",
            SynapseOperation::PreSpikeHit => "pre_spike_hit",
            SynapseOperation::PostSpikeHit => "post_spike_hit",
        }
    }
}

impl fmt::Display for SynapseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolved handles for one model on one device generation
#[derive(Clone)]
pub struct DispatchTable {
    generation: DeviceGeneration,
    model: String,
    allow_back_propagation: bool,
    change_psr: ChangePsrFn,
    pre_spike_hit: PreSpikeHitFn,
    post_spike_hit: PostSpikeHitFn,
}

impl DispatchTable {
    /// Resolve every operation of `model` against `generation`.
    ///
    /// Fails when the model needs lanes that `store` was not built with.
    pub fn resolve(
        model: &dyn SynapseModel,
        store: &SynapseStore,
        generation: DeviceGeneration,
    ) -> Result<Self> {
        if model.requires_dynamics() && !store.has_dynamics() {
            return Err(SynapseError::MissingDynamicLanes {
                model: model.name().to_string(),
            }
            .into());
        }

        let change_psr = model.change_psr_fn();
        let pre_spike_hit = model.pre_spike_hit_fn();
        let post_spike_hit = model.post_spike_hit_fn();

        for operation in SynapseOperation::ALL {
            let handle = match operation {
                SynapseOperation::ChangePsr => change_psr as usize,
                SynapseOperation::PreSpikeHit => pre_spike_hit as usize,
                SynapseOperation::PostSpikeHit => post_spike_hit as usize,
            };
            debug!(
                model = model.name(),
                %operation,
                handle = %format!("{:#x}", handle),
                %generation,
                "Resolved synapse operation"
            );
        }

        Ok(Self {
            generation,
            model: model.name().to_string(),
            allow_back_propagation: model.allow_back_propagation(),
            change_psr,
            pre_spike_hit,
            post_spike_hit,
        })
    }

    /// Check the table against the device's current generation
    pub fn validate(&self, current: DeviceGeneration) -> Result<()> {
        if self.generation != current {
            return Err(EngineError::StaleDispatchHandle {
                resolved: Some(self.generation),
                current,
            });
        }
        Ok(())
    }

    pub fn generation(&self) -> DeviceGeneration {
        self.generation
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn allow_back_propagation(&self) -> bool {
        self.allow_back_propagation
    }

    #[inline(always)]
    pub fn change_psr(&self) -> ChangePsrFn {
        self.change_psr
    }

    #[inline(always)]
    pub fn pre_spike_hit(&self) -> PreSpikeHitFn {
        self.pre_spike_hit
    }

    #[inline(always)]
    pub fn post_spike_hit(&self) -> PostSpikeHitFn {
        self.post_spike_hit
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("generation", &self.generation)
            .field("model", &self.model)
            .field("allow_back_propagation", &self.allow_back_propagation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{dynamic_arrival, spiking_arrival, DynamicSpikingSynapses, SpikingSynapses};
    use spikegrid_npu_runtime::StoreLayout;

    fn layout() -> StoreLayout {
        StoreLayout::new(2, 2).unwrap()
    }

    #[test]
    fn test_resolves_model_functions() {
        let store = SynapseStore::new(layout());
        let generation = DeviceGeneration::next();
        let table = DispatchTable::resolve(&SpikingSynapses, &store, generation).unwrap();
        assert_eq!(table.model(), "spiking");
        assert_eq!(table.generation(), generation);
        assert_eq!(table.change_psr() as usize, spiking_arrival as usize);

        let store = SynapseStore::with_dynamics(layout());
        let table = DispatchTable::resolve(&DynamicSpikingSynapses, &store, generation).unwrap();
        assert_eq!(table.change_psr() as usize, dynamic_arrival as usize);
    }

    #[test]
    fn test_dynamic_model_needs_lanes() {
        let store = SynapseStore::new(layout());
        let err = DispatchTable::resolve(&DynamicSpikingSynapses, &store, DeviceGeneration::next())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Synapse(SynapseError::MissingDynamicLanes { .. })
        ));
    }

    #[test]
    fn test_validate_detects_new_generation() {
        let store = SynapseStore::new(layout());
        let old = DeviceGeneration::next();
        let table = DispatchTable::resolve(&SpikingSynapses, &store, old).unwrap();
        assert!(table.validate(old).is_ok());

        let new = DeviceGeneration::next();
        match table.validate(new) {
            Err(EngineError::StaleDispatchHandle { resolved, current }) => {
                assert_eq!(resolved, Some(old));
                assert_eq!(current, new);
            }
            other => panic!("expected stale handle, got {:?}", other),
        }
    }
}
