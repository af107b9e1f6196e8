use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod error;
pub mod graph;
pub mod market;
pub mod paths;
pub mod permutations;
pub mod planner;
pub mod stats;
pub mod subsets;
pub mod types;

pub use catalog::*;
pub use error::*;
pub use graph::*;
pub use market::*;
pub use paths::*;
pub use permutations::*;
pub use planner::*;
pub use subsets::*;
pub use types::*;

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - SkillPlanner
// ============================================================================

/// Findings of a structural check, wrapped for the JS boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

#[wasm_bindgen]
pub struct SkillPlanner {
    graph: SkillGraph,
    scenarios: MarketScenarioSet,
    config: PlannerConfig,
}

#[wasm_bindgen]
impl SkillPlanner {
    /// Planner over the reference catalog and standard market outlook
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self {
            graph: SkillGraph::standard(),
            scenarios: MarketScenarioSet::standard(),
            config: PlannerConfig::default(),
        }
    }

    /// Planner over a caller-provided array of skill records
    #[wasm_bindgen]
    pub fn from_catalog(skills: JsValue) -> Result<SkillPlanner, JsError> {
        let skills: Vec<Skill> = serde_wasm_bindgen::from_value(skills)?;
        catalog::validate_records(&skills)?;

        let mut planner = Self::new();
        planner.graph = SkillGraph::from_skills(skills);
        Ok(planner)
    }

    #[wasm_bindgen]
    pub fn validate(&self) -> ValidationReport {
        ValidationReport {
            errors: self.graph.validate(),
        }
    }

    #[wasm_bindgen]
    pub fn skills_by_usage(&self, usage: Usage) -> Vec<String> {
        self.graph.skills_by_usage(usage)
    }

    #[wasm_bindgen]
    pub fn set_hours_per_week(&mut self, hours: u32) {
        self.config.hours_per_week = hours;
    }

    /// Monte Carlo-valued best path to `target` within the budgets
    #[wasm_bindgen]
    pub fn max_value_path(
        &self,
        target: String,
        max_time: u32,
        max_complexity: u32,
        samples: usize,
        seed: Option<u64>,
    ) -> Result<PathOutcome, JsError> {
        let mut query = PathQuery::new(target)
            .with_budget(max_time, max_complexity)
            .with_samples(samples);
        if let Some(seed) = seed {
            query = query.with_seed(seed);
        }
        Ok(paths::max_value_path(&self.graph, &query)?)
    }

    #[wasm_bindgen]
    pub fn critical_orderings(&self) -> Result<PermutationAnalysis, JsError> {
        Ok(analyze_critical_orderings(
            &self.graph,
            &designated_critical(),
        )?)
    }

    #[wasm_bindgen]
    pub fn fast_pivot(&self, min_adaptability: f64) -> Result<PivotAnalysis, JsError> {
        Ok(subsets::fast_pivot(&self.graph, min_adaptability)?)
    }

    #[wasm_bindgen]
    pub fn recommend(
        &self,
        starting_skills: Vec<String>,
        horizon_years: u32,
    ) -> Result<Recommendation, JsError> {
        Ok(recommend_next_skills(
            &self.graph,
            &starting_skills,
            horizon_years,
            &self.scenarios,
            &self.config,
        )?)
    }

    /// Yearly trend table as a plain JS array
    #[wasm_bindgen]
    pub fn market_outlook(&self) -> Result<JsValue, JsError> {
        Ok(serde_wasm_bindgen::to_value(&trend_outlook())?)
    }
}

impl SkillPlanner {
    /// Native constructor for callers that already hold a graph
    pub fn with_graph(graph: SkillGraph) -> Self {
        Self {
            graph,
            scenarios: MarketScenarioSet::standard(),
            config: PlannerConfig::default(),
        }
    }

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }
}

impl Default for SkillPlanner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn designated_critical() -> Vec<SkillId> {
    DESIGNATED_CRITICAL.iter().map(|id| id.to_string()).collect()
}

// ============================================================================
// Tests
// ============================================================================
