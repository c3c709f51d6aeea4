//! Optional visualization output.
//!
//! The muscle unit offers one message per tendon segment after each
//! successful update. Sinks are best-effort: nothing they do can affect the
//! simulation, and dropping every message is a valid implementation.

use nalgebra::Vector3;

/// Visual description of one tendon segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TendonSegmentVisual {
    pub muscle: String,
    pub index: usize,
    pub mid_point: Vector3<f64>,
    pub orientation: Vector3<f64>,
    pub length: f64,
    pub pitch: f64,
    pub roll: f64,
    pub force: Vector3<f64>,
}

/// Fire-and-forget consumer of visualization messages.
pub trait VisualSink: Send {
    fn publish(&mut self, segment: &TendonSegmentVisual);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVisualSink;

impl VisualSink for NoopVisualSink {
    fn publish(&mut self, _segment: &TendonSegmentVisual) {}
}
