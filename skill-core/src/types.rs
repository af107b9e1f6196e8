use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

// ============================================================================
// Core aliases
// ============================================================================

/// Skill identifiers are free-form strings ("S1", "H10", ...).
pub type SkillId = String;

/// Acquisition time, in whole hours.
pub type Hours = u32;

// ============================================================================
// Usage - How a skill is used by the planning components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Usage {
    /// Entry-level skill, candidate for the fast-pivot subset search
    Base,
    /// One of the designated critical skills ordered by the permutation analyzer
    Critical,
    NonCritical,
    /// The long-term target of the acquisition path search
    FinalObjective,
    ExtendedList,
}

// ============================================================================
// Skill - A node in the prerequisite graph
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub time: Hours,
    pub value: f64,
    pub complexity: u32,
    #[serde(default)]
    pub prerequisites: Vec<SkillId>,
    pub usage: Usage,
}

impl Skill {
    pub fn new(
        id: impl Into<SkillId>,
        name: impl Into<String>,
        time: Hours,
        value: f64,
        complexity: u32,
        usage: Usage,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            time,
            value,
            complexity,
            prerequisites: Vec::new(),
            usage,
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SkillId>,
    {
        for prereq in prerequisites {
            let prereq = prereq.into();
            if !self.prerequisites.contains(&prereq) {
                self.prerequisites.push(prereq);
            }
        }
        self
    }

    pub fn has_prerequisites(&self) -> bool {
        !self.prerequisites.is_empty()
    }
}

// ============================================================================
// Ordering result - (ordered ids, cost) shared by the ranking components
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct OrderingResult {
    pub order: Vec<SkillId>,
    pub cost: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerequisites_are_deduplicated_in_order() {
        let skill = Skill::new("S4", "ML", 120, 8.0, 9, Usage::NonCritical)
            .with_prerequisites(["S1", "S3", "S1"]);
        assert_eq!(skill.prerequisites, vec!["S1", "S3"]);
    }
}
