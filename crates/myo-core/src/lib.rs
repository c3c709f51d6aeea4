//! myo-core: shared foundation for the myo-muscle workspace.
//!
//! Contains:
//! - error (shared parameter validation error)
//! - numeric (finite/positive checks used by every parameter set)
//! - units (uom SI time and frequency)
//! - throttle (rate-limited diagnostics)

pub mod error;
pub mod numeric;
pub mod throttle;
pub mod units;

pub use error::{MyoError, MyoResult};
pub use numeric::{ensure_finite, ensure_non_negative, ensure_positive};
pub use throttle::Throttle;
