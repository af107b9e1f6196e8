// Market scenarios: probabilistic regimes that scale skill values

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::PlanError;
use crate::types::SkillId;

const PROBABILITY_TOLERANCE: f64 = 1e-9;

// ============================================================================
// Scenario - One market regime
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct MarketScenario {
    pub name: String,
    pub probability: f64,
    /// Value multipliers by skill; unlisted skills use 1.0
    #[serde(default)]
    pub multipliers: HashMap<SkillId, f64>,
}

impl MarketScenario {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            multipliers: HashMap::new(),
        }
    }

    pub fn with_multiplier(mut self, skill: impl Into<SkillId>, multiplier: f64) -> Self {
        self.multipliers.insert(skill.into(), multiplier);
        self
    }

    pub fn multiplier(&self, skill: &str) -> f64 {
        self.multipliers.get(skill).copied().unwrap_or(1.0)
    }
}

// ============================================================================
// Scenario set - Probabilities sum to 1.0
// ============================================================================

/// Deserialization goes through [`MarketScenarioSet::new`], so every set in
/// memory is normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(try_from = "ScenarioSetRecord")]
pub struct MarketScenarioSet {
    scenarios: Vec<MarketScenario>,
}

/// Unchecked wire form of a scenario set
#[derive(Deserialize)]
struct ScenarioSetRecord {
    scenarios: Vec<MarketScenario>,
}

impl TryFrom<ScenarioSetRecord> for MarketScenarioSet {
    type Error = PlanError;

    fn try_from(record: ScenarioSetRecord) -> Result<Self, Self::Error> {
        Self::new(record.scenarios)
    }
}

impl Default for MarketScenarioSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl MarketScenarioSet {
    /// Build a set, rejecting probabilities that do not sum to 1.0.
    pub fn new(scenarios: Vec<MarketScenario>) -> Result<Self, PlanError> {
        let total: f64 = scenarios.iter().map(|s| s.probability).sum();
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE
            || scenarios.iter().any(|s| s.probability < 0.0)
        {
            return Err(PlanError::InvalidScenarioProbabilities(total));
        }
        Ok(Self { scenarios })
    }

    /// AI boom / cloud focus / balanced outlook
    pub fn standard() -> Self {
        Self {
            scenarios: vec![
                MarketScenario::new("ai_boom", 0.3)
                    .with_multiplier("S4", 1.2)
                    .with_multiplier("S6", 1.3)
                    .with_multiplier("H11", 1.1),
                MarketScenario::new("cloud_focus", 0.4)
                    .with_multiplier("S7", 1.2)
                    .with_multiplier("S9", 1.3)
                    .with_multiplier("S8", 1.1),
                MarketScenario::new("balanced", 0.3),
            ],
        }
    }

    pub fn scenarios(&self) -> &[MarketScenario] {
        &self.scenarios
    }

    /// Probability-weighted multiplier for `skill`
    pub fn expected_multiplier(&self, skill: &str) -> f64 {
        self.scenarios
            .iter()
            .map(|s| s.probability * s.multiplier(skill))
            .sum()
    }
}

// ============================================================================
// Trend outlook - Documented yearly shifts, informational only
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct TrendRow {
    pub period: String,
    pub ml_up: f64,
    pub cloud_up: f64,
    pub bi_up: f64,
    pub azure_down: f64,
}

/// Yearly probabilities of demand shifts, published alongside recommendations.
/// The planner does not consume these.
pub fn trend_outlook() -> Vec<TrendRow> {
    [("Year 1", 0.35, 0.25, 0.20, 0.10), ("Year 2", 0.40, 0.30, 0.15, 0.05)]
        .into_iter()
        .map(|(period, ml_up, cloud_up, bi_up, azure_down)| TrendRow {
            period: period.to_string(),
            ml_up,
            cloud_up,
            bi_up,
            azure_down,
        })
        .collect()
}
