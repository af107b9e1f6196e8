// Skill graph: skill records plus prerequisite adjacency in both directions

use std::collections::{HashMap, HashSet};

use crate::error::{PlanError, ValidationError};
use crate::types::{Skill, SkillId, Usage};

/// Read-only prerequisite graph shared by every planning component.
///
/// - `dependents`: prerequisite → skills that require it (forward edges)
/// - `prerequisites`: skill → its direct prerequisites (reverse edges)
///
/// Edges are stored by id, so a prerequisite that was never added still
/// appears as an edge endpoint; `validate` reports those.
#[derive(Debug, Clone, Default)]
pub struct SkillGraph {
    skills: HashMap<SkillId, Skill>,
    // Insertion order of skill ids
    order: Vec<SkillId>,
    dependents: HashMap<SkillId, Vec<SkillId>>,
    prerequisites: HashMap<SkillId, Vec<SkillId>>,
}

impl SkillGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_skills(skills: impl IntoIterator<Item = Skill>) -> Self {
        let mut graph = Self::new();
        for skill in skills {
            graph.add_skill(skill);
        }
        graph
    }

    // === Construction ===

    /// Insert a skill, overwriting any previous record with the same id.
    ///
    /// Overwrites keep the original insertion position and replace the old
    /// record's edges. Repeated prerequisites collapse to their first mention.
    pub fn add_skill(&mut self, mut skill: Skill) {
        let id = skill.id.clone();

        // Records from serde skip `with_prerequisites`
        let mut seen: HashSet<SkillId> = HashSet::new();
        skill.prerequisites.retain(|p| seen.insert(p.clone()));

        if let Some(previous) = self.skills.remove(&id) {
            for prereq in &previous.prerequisites {
                if let Some(deps) = self.dependents.get_mut(prereq) {
                    deps.retain(|d| d != &id);
                }
            }
            self.prerequisites.remove(&id);
        } else {
            self.order.push(id.clone());
        }

        for prereq in &skill.prerequisites {
            self.dependents
                .entry(prereq.clone())
                .or_default()
                .push(id.clone());
            self.prerequisites
                .entry(id.clone())
                .or_default()
                .push(prereq.clone());
        }

        self.skills.insert(id, skill);
    }

    // === Lookup ===

    pub fn get_skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All skill ids, in insertion order
    pub fn all_skills(&self) -> &[SkillId] {
        &self.order
    }

    /// Skills in insertion order
    pub fn skills(&self) -> impl Iterator<Item = &Skill> {
        self.order.iter().filter_map(|id| self.skills.get(id))
    }

    pub fn skills_by_usage(&self, usage: Usage) -> Vec<SkillId> {
        self.skills()
            .filter(|s| s.usage == usage)
            .map(|s| s.id.clone())
            .collect()
    }

    /// Skills with no prerequisites, in insertion order
    pub fn start_skills(&self) -> Vec<SkillId> {
        self.skills()
            .filter(|s| !s.has_prerequisites())
            .map(|s| s.id.clone())
            .collect()
    }

    /// Skills that list `id` as a direct prerequisite
    pub fn dependents(&self, id: &str) -> &[SkillId] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct prerequisites of `id`
    pub fn prerequisites(&self, id: &str) -> &[SkillId] {
        self.prerequisites.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    // === Validation ===

    /// Check graph integrity: dangling prerequisites, then cycles.
    ///
    /// At most one `CycleDetected` entry is produced; the search stops at the
    /// first back edge.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors: Vec<ValidationError> = self
            .skills()
            .flat_map(|skill| {
                skill
                    .prerequisites
                    .iter()
                    .filter(move |p| !self.contains(p))
                    .map(move |p| ValidationError::MissingPrerequisite {
                        prerequisite: p.clone(),
                        dependent: skill.id.clone(),
                    })
            })
            .collect();

        if self.has_cycle() {
            errors.push(ValidationError::CycleDetected);
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "validation",
            skills = self.len() as u64,
            missing = errors.iter().filter(|e| !e.is_fatal()).count() as u64,
            cycle = errors.iter().any(ValidationError::is_fatal),
        );

        errors
    }

    /// Validate and refuse to continue on a cycle.
    ///
    /// Returns the non-fatal findings so callers can surface them.
    pub fn ensure_acyclic(&self) -> Result<Vec<ValidationError>, PlanError> {
        let errors = self.validate();
        if errors.iter().any(ValidationError::is_fatal) {
            #[cfg(feature = "instrument")]
            tracing::error!(target: "validation", "cycle detected, refusing to plan");
            return Err(PlanError::CycleDetected);
        }

        #[cfg(feature = "instrument")]
        for err in &errors {
            tracing::warn!(target: "validation", error = %err);
        }

        Ok(errors)
    }

    /// Depth-first search over reverse edges (skill → prerequisite) with an
    /// explicit stack. A prerequisite already on the active path is a back edge.
    fn has_cycle(&self) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_path: HashSet<&str> = HashSet::new();

        for root in &self.order {
            if !visited.insert(root.as_str()) {
                continue;
            }
            on_path.insert(root.as_str());
            // (node, index of the next prerequisite to examine)
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];

            while let Some(&(node, cursor)) = stack.last() {
                match self.prerequisites(node).get(cursor) {
                    Some(prereq) => {
                        if let Some(top) = stack.last_mut() {
                            top.1 += 1;
                        }
                        if on_path.contains(prereq.as_str()) {
                            return true;
                        }
                        if visited.insert(prereq.as_str()) {
                            on_path.insert(prereq.as_str());
                            stack.push((prereq.as_str(), 0));
                        }
                    }
                    None => {
                        on_path.remove(node);
                        stack.pop();
                    }
                }
            }
        }

        false
    }
}
