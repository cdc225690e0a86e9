// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spike delay queue
//!
//! One machine word per synapse. Bit `i` set means a spike arrives when the read
//! head reaches slot `i`. The head moves exactly once per tick, in `consume`.
//!
//! ```text
//! bits:  0 0 0 0 0 1 0 0 ... 0      (length = 32)
//!        ^ index     ^ index + total_delay
//! ```

use crate::types::{Result, SynapseError};

/// Number of representable future slots (bit width of the queue word)
pub const LENGTH_OF_DELAYQUEUE: u32 = u32::BITS;

/// Value view of one synapse's delay queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayQueue {
    /// Pending-spike flags, one per slot
    pub bits: u32,
    /// Read head, always `< length`
    pub index: u32,
    /// Number of slots in use (`1..=LENGTH_OF_DELAYQUEUE`)
    pub length: u32,
}

impl Default for DelayQueue {
    fn default() -> Self {
        Self::empty()
    }
}

impl DelayQueue {
    /// Empty queue with the read head at slot 0
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            index: 0,
            length: LENGTH_OF_DELAYQUEUE,
        }
    }

    /// Check that a delay fits the representable window
    pub fn validate_delay(total_delay: u32, length: u32) -> Result<()> {
        if total_delay >= length {
            return Err(SynapseError::InvalidDelay {
                delay: total_delay,
                queue_length: length,
            });
        }
        Ok(())
    }

    /// Slot a spike scheduled now with `total_delay` lands in
    #[inline(always)]
    pub fn slot_for(&self, total_delay: u32) -> u32 {
        (self.index + total_delay) % self.length
    }

    /// Mark a spike arriving `total_delay` ticks from now.
    ///
    /// Returns `false` when that slot was already pending (the bit stays set).
    #[inline]
    pub fn schedule(&mut self, total_delay: u32) -> bool {
        debug_assert!(total_delay < self.length);
        let mask = 1u32 << self.slot_for(total_delay);
        let fresh = self.bits & mask == 0;
        self.bits |= mask;
        fresh
    }

    /// Read and clear the slot under the head, then advance the head
    #[inline]
    pub fn consume(&mut self) -> bool {
        let mask = 1u32 << self.index;
        let hit = self.bits & mask != 0;
        self.bits &= !mask;
        self.index += 1;
        if self.index >= self.length {
            self.index = 0;
        }
        hit
    }

    /// Whether a spike is pending `offset` ticks from now
    pub fn is_pending(&self, offset: u32) -> bool {
        self.bits & (1u32 << self.slot_for(offset)) != 0
    }

    pub fn pending_count(&self) -> u32 {
        self.bits.count_ones()
    }
}
