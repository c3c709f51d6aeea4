//! Single-slot setpoint handoff.
//!
//! Command intake (service calls, message callbacks) runs on its own worker
//! while the simulation thread reads the setpoint once per tick. The slot holds
//! exactly one `f64`; every store replaces the previous value and every load
//! sees the most recent completed store. There is no queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Owner side of a setpoint slot.
#[derive(Debug, Clone)]
pub struct SetpointSlot {
    bits: Arc<AtomicU64>,
}

impl SetpointSlot {
    pub fn new(initial: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(initial.to_bits())),
        }
    }

    /// Most recently stored setpoint.
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Handle for a writer on another thread.
    pub fn handle(&self) -> SetpointHandle {
        SetpointHandle {
            bits: Arc::clone(&self.bits),
        }
    }
}

impl Default for SetpointSlot {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Writer side of a setpoint slot. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct SetpointHandle {
    bits: Arc<AtomicU64>,
}

impl SetpointHandle {
    /// Replace the setpoint. Non-finite values are ignored.
    pub fn store(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.bits.store(value.to_bits(), Ordering::Release);
        true
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
