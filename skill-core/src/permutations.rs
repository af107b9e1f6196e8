//! Ordering of the designated critical skills.
//!
//! Every permutation of the five critical skills is costed by the sum of
//! cumulative elapsed time after each acquisition, so placing short skills
//! first is rewarded. The result is compared with a plain sort by duration.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::PlanError;
use crate::graph::SkillGraph;
use crate::stats;
use crate::types::{OrderingResult, SkillId, Usage};

pub const CRITICAL_SKILL_COUNT: usize = 5;
const TOP_ORDERINGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PermutationAnalysis {
    pub best_order: Vec<SkillId>,
    pub best_cost: u64,
    pub top3: Vec<OrderingResult>,
    /// Costs of all orderings, ascending
    pub all_costs: Vec<u64>,
    pub mean_cost: f64,
    pub std_dev_cost: f64,
    /// The skills sorted by ascending acquisition time
    pub duration_order: Vec<SkillId>,
    pub duration_order_cost: u64,
    /// Whether sorting by duration alone reaches the optimum
    pub matches_duration_heuristic: bool,
    pub heuristic_note: String,
}

/// Per-invocation cost cache keyed by the exact ordering
struct OrderingCosts<'a> {
    graph: &'a SkillGraph,
    cache: HashMap<Vec<SkillId>, u64>,
}

impl<'a> OrderingCosts<'a> {
    fn new(graph: &'a SkillGraph) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
        }
    }

    fn cost(&mut self, order: &[SkillId]) -> u64 {
        if let Some(&cost) = self.cache.get(order) {
            return cost;
        }
        let cost = cumulative_time_cost(self.graph, order);
        self.cache.insert(order.to_vec(), cost);
        cost
    }
}

/// Σ over steps of the elapsed time once that step completes:
/// `t1 + (t1+t2) + ... + (t1+...+tn)`.
pub fn cumulative_time_cost(graph: &SkillGraph, order: &[SkillId]) -> u64 {
    order
        .iter()
        .filter_map(|id| graph.get_skill(id))
        .scan(0u64, |elapsed, skill| {
            *elapsed += u64::from(skill.time);
            Some(*elapsed)
        })
        .sum()
}

/// Designated ids that exist with `Critical` usage, in graph insertion order.
fn critical_subset(graph: &SkillGraph, designated: &[SkillId]) -> Vec<SkillId> {
    graph
        .skills_by_usage(Usage::Critical)
        .into_iter()
        .filter(|id| designated.contains(id))
        .collect()
}

fn heuristic_note(best: &[SkillId], duration_order: &[SkillId], matches: bool) -> String {
    let best = best.join(" → ");
    let by_time = duration_order.join(" → ");
    if matches {
        format!(
            "The optimal order is the shortest-duration-first order. Cost is the sum of \
             cumulative elapsed times, so a short skill placed early shortens every later \
             step. Duration order: {by_time}. Best order found: {best}."
        )
    } else {
        format!(
            "The optimal order differs from the shortest-duration-first order, so duration \
             alone does not determine the optimum for this set; shorter skills still tend to \
             appear early. Duration order: {by_time}. Best order found: {best}."
        )
    }
}

/// Rank every ordering of the designated critical skills by cumulative-time cost.
///
/// Exactly [`CRITICAL_SKILL_COUNT`] of the designated ids must exist in the
/// graph with `Critical` usage, otherwise `PlanError::ConfigurationMismatch`.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "critical_orderings"))]
pub fn analyze_critical_orderings(
    graph: &SkillGraph,
    designated: &[SkillId],
) -> Result<PermutationAnalysis, PlanError> {
    graph.ensure_acyclic()?;

    let critical = critical_subset(graph, designated);
    if critical.len() != CRITICAL_SKILL_COUNT {
        #[cfg(feature = "instrument")]
        tracing::error!(target: "ordering", found = critical.len() as u64, "critical skill set mismatch");
        return Err(PlanError::ConfigurationMismatch {
            expected: CRITICAL_SKILL_COUNT,
            found: critical,
        });
    }

    let mut costs = OrderingCosts::new(graph);
    let mut results: Vec<OrderingResult> = critical
        .iter()
        .cloned()
        .permutations(critical.len())
        .map(|order| {
            let cost = costs.cost(&order);
            OrderingResult { order, cost }
        })
        .collect();

    // Stable: equal costs keep permutation order
    results.sort_by_key(|r| r.cost);

    let all_costs: Vec<u64> = results.iter().map(|r| r.cost).collect();
    let as_f64: Vec<f64> = all_costs.iter().map(|&c| c as f64).collect();
    let mean_cost = stats::mean(&as_f64);
    let std_dev_cost = stats::population_std_dev(&as_f64, mean_cost);

    let mut duration_order = critical.clone();
    duration_order.sort_by_key(|id| graph.get_skill(id).map(|s| s.time).unwrap_or_default());
    let duration_order_cost = costs.cost(&duration_order);

    let best = results[0].clone();
    let matches_duration_heuristic = best.order == duration_order;

    #[cfg(feature = "instrument")]
    for (rank, result) in results.iter().enumerate().take(TOP_ORDERINGS) {
        tracing::info!(
            target: "ordering",
            rank = rank as u64 + 1,
            order = %result.order.join(","),
            cost = result.cost,
        );
    }

    Ok(PermutationAnalysis {
        heuristic_note: heuristic_note(&best.order, &duration_order, matches_duration_heuristic),
        best_order: best.order,
        best_cost: best.cost,
        top3: results.into_iter().take(TOP_ORDERINGS).collect(),
        all_costs,
        mean_cost,
        std_dev_cost,
        duration_order,
        duration_order_cost,
        matches_duration_heuristic,
    })
}
