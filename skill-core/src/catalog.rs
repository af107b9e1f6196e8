// Skill catalogs: the built-in reference catalog and JSON-provided ones

use crate::error::PlanError;
use crate::graph::SkillGraph;
use crate::types::{Skill, Usage};

/// Target skill of the reference catalog's path search.
pub const FINAL_OBJECTIVE: &str = "S6";

/// Critical skills ordered by the permutation analyzer in the reference catalog.
pub const DESIGNATED_CRITICAL: [&str; 5] = ["S3", "S5", "S7", "S8", "S9"];

/// The twelve-skill reference catalog.
///
/// Values and complexities are on a 1-10 scale; times are hours.
pub fn standard_catalog() -> Vec<Skill> {
    // (id, name, time, value, complexity, prerequisites, usage)
    let rows: [(&str, &str, u32, f64, u32, &[&str], Usage); 12] = [
        ("S1", "Programming Fundamentals (Python)", 80, 3.0, 4, &[], Usage::Base),
        ("S2", "Data Modeling (SQL)", 60, 4.0, 3, &[], Usage::Base),
        ("S3", "Advanced Algorithms", 100, 7.0, 8, &["S1"], Usage::Critical),
        ("S4", "Machine Learning Fundamentals", 120, 8.0, 9, &["S1", "S3"], Usage::NonCritical),
        ("S5", "Data Visualization (BI)", 40, 6.0, 5, &["S2"], Usage::Critical),
        ("S6", "Ethical Generative AI", 150, 10.0, 10, &["S4"], Usage::FinalObjective),
        ("S7", "Cloud Infrastructure (AWS/Azure)", 70, 5.0, 7, &["S2"], Usage::Critical),
        ("S8", "APIs and Microservices", 90, 6.0, 6, &["S1"], Usage::Critical),
        ("S9", "DevOps / CI-CD", 110, 9.0, 8, &["S7", "S8"], Usage::Critical),
        ("H10", "Data Security", 60, 5.0, 6, &[], Usage::ExtendedList),
        ("H11", "Big Data Analytics", 90, 8.0, 8, &["S4"], Usage::ExtendedList),
        ("H12", "Introduction to IoT", 30, 3.0, 3, &[], Usage::ExtendedList),
    ];

    rows.into_iter()
        .map(|(id, name, time, value, complexity, prereqs, usage)| {
            Skill::new(id, name, time, value, complexity, usage)
                .with_prerequisites(prereqs.iter().copied())
        })
        .collect()
}

impl SkillGraph {
    /// Graph over the reference catalog
    pub fn standard() -> Self {
        Self::from_skills(standard_catalog())
    }

    /// Build a graph from a JSON array of skill records.
    ///
    /// `prerequisites` may be omitted for entry-level skills.
    pub fn from_catalog_json(json: &str) -> Result<Self, PlanError> {
        let skills: Vec<Skill> = serde_json::from_str(json)?;
        validate_records(&skills)?;
        Ok(Self::from_skills(skills))
    }
}

/// Reject records the planners cannot reason about.
pub(crate) fn validate_records(skills: &[Skill]) -> Result<(), PlanError> {
    for skill in skills {
        if skill.id.is_empty() {
            return Err(PlanError::Catalog("skill with empty id".to_string()));
        }
        if skill.time == 0 {
            return Err(PlanError::Catalog(format!(
                "skill '{}' must take a positive number of hours",
                skill.id
            )));
        }
        if !skill.value.is_finite() {
            return Err(PlanError::Catalog(format!(
                "skill '{}' has a non-finite value",
                skill.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_valid() {
        let graph = SkillGraph::standard();
        assert_eq!(graph.len(), 12);
        assert!(graph.validate().is_empty());
        assert_eq!(graph.start_skills(), vec!["S1", "S2", "H10", "H12"]);
        assert_eq!(
            graph.skills_by_usage(Usage::Critical),
            DESIGNATED_CRITICAL.to_vec()
        );
        assert_eq!(
            graph.skills_by_usage(Usage::FinalObjective),
            vec![FINAL_OBJECTIVE]
        );
    }

    #[test]
    fn loads_catalog_from_json() {
        let json = r#"[
            {"id": "A", "name": "Alpha", "time": 10, "value": 2.5, "complexity": 1, "usage": "Base"},
            {"id": "B", "name": "Beta", "time": 20, "value": 4.0, "complexity": 2,
             "prerequisites": ["A"], "usage": "Critical"}
        ]"#;
        let graph = SkillGraph::from_catalog_json(json).unwrap();
        assert_eq!(graph.all_skills(), ["A", "B"]);
        assert_eq!(graph.dependents("A"), ["B"]);
        assert_eq!(graph.get_skill("B").unwrap().usage, Usage::Critical);
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        let err = SkillGraph::from_catalog_json("[{\"id\": 3}]").unwrap_err();
        assert!(matches!(err, PlanError::Catalog(_)));
    }

    #[test]
    fn zero_time_skill_is_rejected() {
        let json = r#"[{"id": "A", "name": "A", "time": 0, "value": 1.0, "complexity": 1, "usage": "Base"}]"#;
        assert!(matches!(
            SkillGraph::from_catalog_json(json),
            Err(PlanError::Catalog(_))
        ));
    }
}
