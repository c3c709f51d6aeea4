//! Validation helpers for physical parameters.
//!
//! Each helper returns the value unchanged on success so it can be used inline
//! while building parameter structs.

use crate::{MyoError, MyoResult};

pub fn ensure_finite(v: f64, what: &'static str) -> MyoResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MyoError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: f64, what: &'static str) -> MyoResult<f64> {
    ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(MyoError::InvalidArg { what })
    }
}

/// Finite and not below zero.
pub fn ensure_non_negative(v: f64, what: &'static str) -> MyoResult<f64> {
    ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(MyoError::InvalidArg { what })
    }
}
