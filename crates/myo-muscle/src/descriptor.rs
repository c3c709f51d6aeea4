//! Static muscle descriptors: schema, validation and file loading.
//!
//! A descriptor names the joints a tendon crosses, in order from insertion to
//! actuator, and lists the via-points of each joint in that link's local
//! frame. Physical parameters fall back to the standard myo-muscle unit when
//! omitted.

use myo_actuator::{Gear, Motor, SeriesElastic, Spindle};
use myo_controls::PidController;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} ({reason})")]
    InvalidValue { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MuscleDescriptor {
    pub name: String,
    /// Joints crossed by the tendon, insertion first.
    pub joints: Vec<String>,
    /// Via-points per joint, in the joint link's local frame.
    pub via_points: BTreeMap<String, Vec<[f64; 3]>>,
    #[serde(default)]
    pub motor: Motor,
    #[serde(default)]
    pub gear: Gear,
    #[serde(default)]
    pub spindle: Spindle,
    #[serde(default)]
    pub see: SeriesElastic,
    #[serde(default)]
    pub pid: PidController,
}

impl MuscleDescriptor {
    /// Total number of via-points across all joints.
    pub fn via_point_count(&self) -> usize {
        self.joints
            .iter()
            .filter_map(|j| self.via_points.get(j))
            .map(Vec::len)
            .sum()
    }

    /// Number of tendon segments, one less than the via-point count.
    pub fn segment_count(&self) -> usize {
        self.via_point_count().saturating_sub(1)
    }

    /// Via-points of one joint as vectors.
    pub fn joint_via_points(&self, joint: &str) -> Option<Vec<Vector3<f64>>> {
        self.via_points
            .get(joint)
            .map(|pts| pts.iter().map(|p| Vector3::from(*p)).collect())
    }

    /// All via-points concatenated in joint order, each in its local frame.
    pub fn local_via_points(&self) -> Vec<Vector3<f64>> {
        self.joints
            .iter()
            .filter_map(|j| self.via_points.get(j))
            .flatten()
            .map(|p| Vector3::from(*p))
            .collect()
    }

    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::InvalidValue {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.joints.is_empty() {
            return Err(DescriptorError::InvalidValue {
                field: format!("muscle '{}' joints", self.name),
                reason: "at least one joint is required".to_string(),
            });
        }

        let mut joint_ids = HashSet::new();
        for joint in &self.joints {
            if !joint_ids.insert(joint) {
                return Err(DescriptorError::DuplicateId {
                    id: joint.clone(),
                    context: format!("muscle '{}' joints", self.name),
                });
            }
            let points =
                self.via_points
                    .get(joint)
                    .ok_or_else(|| DescriptorError::MissingReference {
                        id: joint.clone(),
                        context: format!("muscle '{}' via_points", self.name),
                    })?;
            if points.is_empty() {
                return Err(DescriptorError::InvalidValue {
                    field: format!("via_points.{joint}"),
                    reason: "joint has no via-points".to_string(),
                });
            }
            if points.iter().flatten().any(|c| !c.is_finite()) {
                return Err(DescriptorError::InvalidValue {
                    field: format!("via_points.{joint}"),
                    reason: "coordinates must be finite".to_string(),
                });
            }
        }

        for key in self.via_points.keys() {
            if !joint_ids.contains(key) {
                return Err(DescriptorError::MissingReference {
                    id: key.clone(),
                    context: format!("muscle '{}' joints", self.name),
                });
            }
        }

        let count = self.via_point_count();
        if count < 2 {
            return Err(DescriptorError::InvalidValue {
                field: format!("muscle '{}' via_points", self.name),
                reason: format!("a tendon needs at least 2 via-points, got {count}"),
            });
        }

        check_param("motor", self.motor.validate())?;
        check_param("gear", self.gear.validate())?;
        check_param("spindle", self.spindle.validate())?;
        check_param("see", self.see.validate())?;
        if let Err(e) = self.pid.validate() {
            return Err(DescriptorError::InvalidValue {
                field: "pid".to_string(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }
}

fn check_param(
    field: &str,
    result: myo_actuator::ActuatorResult<()>,
) -> Result<(), DescriptorError> {
    result.map_err(|e| DescriptorError::InvalidValue {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

pub fn load_yaml(path: &Path) -> Result<MuscleDescriptor, DescriptorError> {
    let content = std::fs::read_to_string(path)?;
    let descriptor: MuscleDescriptor = serde_yaml::from_str(&content)?;
    descriptor.validate()?;
    Ok(descriptor)
}

pub fn load_json(path: &Path) -> Result<MuscleDescriptor, DescriptorError> {
    let content = std::fs::read_to_string(path)?;
    let descriptor: MuscleDescriptor = serde_json::from_str(&content)?;
    descriptor.validate()?;
    Ok(descriptor)
}
