// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-neuron input accumulators
//!
//! Owned by the neuron side of the simulation. Synapses converging on the same
//! neuron add into the same entry during a tick, so every write is an atomic
//! add and the result does not depend on execution order beyond float rounding.

use core::sync::atomic::Ordering;

use spikegrid_npu_neural::types::{AtomicF32, SummationPointRef};

/// Summation points, one per destination neuron
#[derive(Debug, Clone, Default)]
pub struct SummationMap {
    points: Vec<AtomicF32>,
}

impl SummationMap {
    /// `len` zeroed accumulators
    pub fn new(len: usize) -> Self {
        Self {
            points: (0..len).map(|_| AtomicF32::new(0.0)).collect(),
        }
    }

    /// Number of accumulators
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the map holds no accumulators
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Atomically add `value`; references outside the map are ignored
    #[inline(always)]
    pub fn add(&self, point: SummationPointRef, value: f32) {
        debug_assert!(point.index() < self.points.len(), "summation point out of range");
        if let Some(cell) = self.points.get(point.index()) {
            cell.fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of one accumulator
    pub fn get(&self, point: SummationPointRef) -> Option<f32> {
        self.points
            .get(point.index())
            .map(|cell| cell.load(Ordering::Relaxed))
    }

    /// Copy of every accumulator
    pub fn values(&self) -> Vec<f32> {
        self.points
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }

    /// Zero every accumulator (the neuron side does this once it consumed a tick)
    pub fn clear(&mut self) {
        for cell in &mut self.points {
            *cell = AtomicF32::new(0.0);
        }
    }

    /// Read every accumulator and zero it
    pub fn drain(&self) -> Vec<f32> {
        self.points
            .iter()
            .map(|cell| cell.swap(0.0, Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_and_drain() {
        let map = SummationMap::new(3);
        map.add(SummationPointRef(1), 0.5);
        map.add(SummationPointRef(1), 0.25);
        map.add(SummationPointRef(2), -1.0);
        assert_eq!(map.get(SummationPointRef(1)), Some(0.75));
        assert_eq!(map.drain(), vec![0.0, 0.75, -1.0]);
        assert_eq!(map.values(), vec![0.0; 3]);
        assert_eq!(map.get(SummationPointRef(9)), None);
    }

    #[test]
    fn test_converging_writers() {
        let map = Arc::new(SummationMap::new(1));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        map.add(SummationPointRef(0), 1.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.get(SummationPointRef(0)), Some(4000.0));
    }

    #[test]
    fn test_clear() {
        let mut map = SummationMap::new(2);
        map.add(SummationPointRef(0), 3.0);
        map.clear();
        assert_eq!(map.values(), vec![0.0, 0.0]);
    }
}
