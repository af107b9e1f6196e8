use serde::{Deserialize, Serialize};
use thiserror::Error;
use tsify_next::Tsify;

use crate::types::SkillId;

/// Structural problems found by `SkillGraph::validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify, Error)]
#[tsify(into_wasm_abi)]
pub enum ValidationError {
    /// Non-fatal: planning may proceed, but skills depending on the missing
    /// prerequisite can never become reachable.
    #[error("missing prerequisite: {prerequisite} -> {dependent}")]
    MissingPrerequisite {
        prerequisite: SkillId,
        dependent: SkillId,
    },

    /// Fatal for every component that walks prerequisite edges.
    #[error("cycle detected in the prerequisite graph")]
    CycleDetected,
}

impl ValidationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::CycleDetected)
    }
}

/// Errors returned by the planning entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("prerequisite graph contains a cycle; planning halted")]
    CycleDetected,

    #[error("unknown skill '{0}'")]
    UnknownSkill(SkillId),

    #[error("expected {expected} critical skills, found {}: {found:?}", .found.len())]
    ConfigurationMismatch {
        expected: usize,
        found: Vec<SkillId>,
    },

    #[error("exhaustive search supports at most {limit} candidates, got {count}")]
    TooManyCandidates { count: usize, limit: usize },

    #[error("scenario probabilities sum to {0}, expected 1.0")]
    InvalidScenarioProbabilities(f64),

    #[error("invalid skill catalog: {0}")]
    Catalog(String),
}

impl From<serde_json::Error> for PlanError {
    fn from(err: serde_json::Error) -> Self {
        PlanError::Catalog(err.to_string())
    }
}
