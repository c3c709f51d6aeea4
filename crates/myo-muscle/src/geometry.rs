//! Tendon geometry: via-point paths and force projection.
//!
//! A tendon runs through an ordered list of via-points. Segment `i` spans
//! `p[i] → p[i+1]`; its direction vector points from `p[i]` toward `p[i+1]`,
//! which is the direction the tendon pulls on `p[i]` when under tension.

use nalgebra::Vector3;
use thiserror::Error;

/// Magnitude below which a vector has no usable direction.
pub const DEGENERATE_EPS: f64 = 1e-9;

/// Errors raised when geometry cannot be evaluated for a frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Degenerate vector in {what} (magnitude {magnitude:e})")]
    DegenerateVector { what: &'static str, magnitude: f64 },

    #[error("Insufficient via-points: need at least 2, got {got}")]
    InsufficientPoints { got: usize },
}

pub type GeometryResult<T> = Result<T, GeometryError>;

fn checked_norm(v: &Vector3<f64>, what: &'static str) -> GeometryResult<f64> {
    let magnitude = v.norm();
    if !magnitude.is_finite() || magnitude < DEGENERATE_EPS {
        return Err(GeometryError::DegenerateVector { what, magnitude });
    }
    Ok(magnitude)
}

/// Angle between two vectors in radians, in `[0, π]`.
pub fn angle_between(v1: &Vector3<f64>, v2: &Vector3<f64>) -> GeometryResult<f64> {
    let n1 = checked_norm(v1, "first vector")?;
    let n2 = checked_norm(v2, "second vector")?;
    let cos = (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0);
    Ok(cos.acos())
}

/// Force vector of magnitude `elastic_force + motor_force` along the tendon.
pub fn project_force(
    elastic_force: f64,
    motor_force: f64,
    tendon_direction: &Vector3<f64>,
) -> GeometryResult<Vector3<f64>> {
    let magnitude = checked_norm(tendon_direction, "tendon direction")?;
    Ok((elastic_force + motor_force) * (tendon_direction / magnitude))
}

/// Per-segment description of a tendon path.
///
/// All vectors are index-aligned and hold one entry per segment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TendonTopology {
    pub mid_points: Vec<Vector3<f64>>,
    /// Unnormalized segment vectors `p[i+1] - p[i]`.
    pub vectors: Vec<Vector3<f64>>,
    /// Unit segment directions.
    pub orientations: Vec<Vector3<f64>>,
    pub pitch: Vec<f64>,
    pub roll: Vec<f64>,
}

impl TendonTopology {
    pub fn segment_count(&self) -> usize {
        self.vectors.len()
    }

    /// Total path length (m).
    pub fn length(&self) -> f64 {
        self.vectors.iter().map(|v| v.norm()).sum()
    }

    /// Angle between each pair of consecutive segments (radians).
    pub fn bend_angles(&self) -> GeometryResult<Vec<f64>> {
        self.vectors
            .windows(2)
            .map(|pair| angle_between(&pair[0], &pair[1]))
            .collect()
    }
}

/// Derive the segment topology from an ordered via-point list.
///
/// # Errors
/// - `InsufficientPoints` for fewer than two points.
/// - `DegenerateVector` if two consecutive points coincide.
pub fn build_topology(via_points: &[Vector3<f64>]) -> GeometryResult<TendonTopology> {
    if via_points.len() < 2 {
        return Err(GeometryError::InsufficientPoints {
            got: via_points.len(),
        });
    }

    let n = via_points.len() - 1;
    let mut topology = TendonTopology {
        mid_points: Vec::with_capacity(n),
        vectors: Vec::with_capacity(n),
        orientations: Vec::with_capacity(n),
        pitch: Vec::with_capacity(n),
        roll: Vec::with_capacity(n),
    };

    for pair in via_points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let vector = b - a;
        let length = checked_norm(&vector, "tendon segment")?;
        let o = vector / length;

        topology.mid_points.push((a + b) * 0.5);
        topology.vectors.push(vector);
        topology.orientations.push(o);
        topology.pitch.push(o.x.atan2(o.z));
        topology
            .roll
            .push(-(o.x * o.x + o.z * o.z).sqrt().clamp(0.0, 1.0).acos());
    }

    Ok(topology)
}
