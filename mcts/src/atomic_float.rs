//! Atomic f64 built on `AtomicU64` bit-casts
//!
//! Reward sums are mutated concurrently by search workers; a CAS loop on
//! the raw bits gives a lock-free `fetch_add` without imposing an order on
//! the additions (floating-point addition is applied in whatever order
//! the workers win the race).

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` updated atomically through its bit pattern.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub fn new(value: f64) -> AtomicF64 {
        AtomicF64 {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.bits.load(order))
    }

    pub fn store(&self, value: f64, order: Ordering) {
        self.bits.store(value.to_bits(), order);
    }

    /// Add `delta` and return the previous value.
    pub fn fetch_add(&self, delta: f64, order: Ordering) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, order, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(observed) => current = observed,
            }
        }
    }
}
