// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lock-free `f32` cell
//!
//! Used for per-synapse PSR lanes (one writer per tick) and for summation
//! points (many converging writers, combined with `fetch_add`).

use core::sync::atomic::{AtomicU32, Ordering};

/// Atomic `f32` stored as its bit pattern in an `AtomicU32`
#[derive(Debug, Default)]
pub struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits: AtomicU32::new(bits),
        }
    }

    pub fn new(value: f32) -> Self {
        Self::from_bits(value.to_bits())
    }

    #[inline(always)]
    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.bits.load(order))
    }

    #[inline(always)]
    pub fn store(&self, value: f32, order: Ordering) {
        self.bits.store(value.to_bits(), order);
    }

    /// Add `delta`, returning the previous value (CAS loop)
    #[inline]
    pub fn fetch_add(&self, delta: f32, order: Ordering) -> f32 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, order, Ordering::Relaxed)
            {
                Ok(previous) => return f32::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Replace the value, returning the previous one
    #[inline]
    pub fn swap(&self, value: f32, order: Ordering) -> f32 {
        f32::from_bits(self.bits.swap(value.to_bits(), order))
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.bits.into_inner())
    }
}

impl Clone for AtomicF32 {
    fn clone(&self) -> Self {
        Self::new(self.load(Ordering::Relaxed))
    }
}

impl From<f32> for AtomicF32 {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_load_store() {
        let cell = AtomicF32::new(1.5);
        assert_eq!(cell.load(Ordering::Relaxed), 1.5);
        cell.store(-2.25, Ordering::Relaxed);
        assert_eq!(cell.load(Ordering::Relaxed), -2.25);
    }

    #[test]
    fn test_swap_and_into_inner() {
        let cell = AtomicF32::new(3.0);
        assert_eq!(cell.swap(6.0, Ordering::Relaxed), 3.0);
        assert_eq!(cell.into_inner(), 6.0);
    }

    #[test]
    fn test_concurrent_fetch_add() {
        let cell = Arc::new(AtomicF32::new(0.0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        cell.fetch_add(1.0, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.load(Ordering::Relaxed), 4000.0);
    }
}
