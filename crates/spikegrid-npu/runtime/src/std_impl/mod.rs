// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Standard library storage implementation
//!
//! Vec-backed, preallocated at construction; nothing grows while a network runs.

mod index_map;
mod snapshot;
mod summation_map;
mod synapse_store;

pub use index_map::SynapseIndexMap;
pub use snapshot::{StoreSnapshot, SynapseRecord};
pub use summation_map::SummationMap;
pub use synapse_store::{DynamicLanes, NewSynapse, StoreLayout, SynapseStore};
