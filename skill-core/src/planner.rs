//! Finite-horizon recommendation of the next skills to acquire.
//!
//! A bounded-depth search over (acquired set, remaining hours, depth). At each
//! state every available skill is scored by its scenario-weighted value plus
//! the best continuation after acquiring it:
//!
//! ```text
//! E[skill] = Σ_s p_s · (value · multiplier_s(skill) + future)
//! ```
//!
//! The depth cap keeps the search at most (available skills)^depth.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::PlanError;
use crate::graph::SkillGraph;
use crate::market::MarketScenarioSet;
use crate::types::{Hours, Skill, SkillId};

/// How many skills of the best path are surfaced as "next".
pub const NEXT_SKILLS: usize = 3;

// === CONFIG ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct PlannerConfig {
    /// Study hours available each week
    pub hours_per_week: Hours,
    pub weeks_per_year: u32,
    /// Look-ahead depth of the recursive search
    pub max_depth: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            hours_per_week: 10,
            weeks_per_year: 52,
            max_depth: 3,
        }
    }
}

impl PlannerConfig {
    /// Total hours available over `years`
    pub fn budget_for(&self, years: u32) -> Hours {
        years
            .saturating_mul(self.weeks_per_year)
            .saturating_mul(self.hours_per_week)
    }
}

// === RESULT ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Recommendation {
    pub starting_skills: Vec<SkillId>,
    pub horizon_years: u32,
    pub total_time_budget: Hours,
    /// First entries of `full_path`, at most [`NEXT_SKILLS`]
    pub recommended_next: Vec<SkillId>,
    pub full_path: Vec<SkillId>,
    /// Hours needed for `full_path`
    pub path_time: Hours,
    pub expected_value: f64,
}

// === SEARCH ===

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanValue {
    pub expected_value: f64,
    pub path: Vec<SkillId>,
}

/// Inputs shared by every level of the recursion
struct PlanContext<'a> {
    graph: &'a SkillGraph,
    scenarios: &'a MarketScenarioSet,
    max_depth: usize,
}

impl<'a> PlanContext<'a> {
    /// Skills not yet held whose prerequisites are all held and that fit in `time_left`
    fn available(&self, held: &HashSet<SkillId>, time_left: Hours) -> Vec<&'a Skill> {
        let graph: &'a SkillGraph = self.graph;
        graph
            .skills()
            .filter(|s| {
                !held.contains(&s.id)
                    && s.time <= time_left
                    && s.prerequisites.iter().all(|p| held.contains(p))
            })
            .collect()
    }

    fn search(&self, held: &mut HashSet<SkillId>, time_left: Hours, depth: usize) -> PlanValue {
        if depth >= self.max_depth || time_left == 0 {
            return PlanValue::default();
        }

        let mut best: Option<PlanValue> = None;
        for skill in self.available(held, time_left) {
            held.insert(skill.id.clone());
            let future = self.search(held, time_left - skill.time, depth + 1);
            held.remove(&skill.id);

            let expected_value: f64 = self
                .scenarios
                .scenarios()
                .iter()
                .map(|s| {
                    s.probability * (skill.value * s.multiplier(&skill.id) + future.expected_value)
                })
                .sum();

            // Strict comparison: the first maximum in graph order wins
            if best
                .as_ref()
                .is_none_or(|b| expected_value > b.expected_value)
            {
                let mut path = Vec::with_capacity(future.path.len() + 1);
                path.push(skill.id.clone());
                path.extend(future.path);
                best = Some(PlanValue {
                    expected_value,
                    path,
                });
            }
        }

        best.unwrap_or_default()
    }
}

/// Planner with memoization at the outer call, keyed by (acquired set, budget).
///
/// The inner recursion is not cached; repeated sub-states inside one call are
/// recomputed, which the depth cap keeps cheap.
pub struct FiniteHorizonPlanner<'a> {
    ctx: PlanContext<'a>,
    memo: HashMap<(Vec<SkillId>, Hours), PlanValue>,
}

impl<'a> FiniteHorizonPlanner<'a> {
    pub fn new(
        graph: &'a SkillGraph,
        scenarios: &'a MarketScenarioSet,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            ctx: PlanContext {
                graph,
                scenarios,
                max_depth: config.max_depth,
            },
            memo: HashMap::new(),
        }
    }

    pub fn plan(&mut self, acquired: &[SkillId], budget: Hours) -> PlanValue {
        let mut key_set = acquired.to_vec();
        key_set.sort();
        key_set.dedup();
        let key = (key_set, budget);

        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }

        let mut held: HashSet<SkillId> = acquired.iter().cloned().collect();
        let value = self.ctx.search(&mut held, budget, 0);
        self.memo.insert(key, value.clone());
        value
    }

    pub fn memoized_states(&self) -> usize {
        self.memo.len()
    }
}

/// Recommend the next skills to acquire over a horizon of `horizon_years`.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "recommend_next_skills"))]
pub fn recommend_next_skills(
    graph: &SkillGraph,
    starting_skills: &[SkillId],
    horizon_years: u32,
    scenarios: &MarketScenarioSet,
    config: &PlannerConfig,
) -> Result<Recommendation, PlanError> {
    graph.ensure_acyclic()?;
    if let Some(unknown) = starting_skills.iter().find(|id| !graph.contains(id)) {
        return Err(PlanError::UnknownSkill(unknown.clone()));
    }

    let total_time_budget = config.budget_for(horizon_years);
    let mut planner = FiniteHorizonPlanner::new(graph, scenarios, config);
    let PlanValue {
        expected_value,
        path,
    } = planner.plan(starting_skills, total_time_budget);

    let path_time: Hours = path
        .iter()
        .filter_map(|id| graph.get_skill(id))
        .map(|s| s.time)
        .sum();

    #[cfg(feature = "instrument")]
    for (step, id) in path.iter().enumerate() {
        tracing::info!(
            target: "plan_choice",
            step = step as u64,
            skill = %id,
            expected_value = expected_value,
        );
    }

    Ok(Recommendation {
        starting_skills: starting_skills.to_vec(),
        horizon_years,
        total_time_budget,
        recommended_next: path.iter().take(NEXT_SKILLS).cloned().collect(),
        full_path: path,
        path_time,
        expected_value,
    })
}
