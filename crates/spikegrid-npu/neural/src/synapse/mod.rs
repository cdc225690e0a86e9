// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! Synaptic computation module
//!
//! Pure, storage-independent pieces of a synapse step: the spike delay queue,
//! decay and PSR formulas, and short-term dynamics.

pub mod delay_queue;
pub mod dynamics;
pub mod response;

pub use delay_queue::*;
pub use dynamics::*;
pub use response::*;
