//! Fastest pivot: the cheapest set of basic skills that reaches a minimum
//! adaptability (summed value).
//!
//! Two strategies are compared:
//!
//! - greedy by value/time ratio, which may overshoot and is not optimal in general
//! - exhaustive bitmask search over all 2^n subsets, bounded to
//!   [`MAX_EXHAUSTIVE_CANDIDATES`] candidates
//!
//! A fixed three-skill counterexample shows the greedy strategy losing.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::PlanError;
use crate::graph::SkillGraph;
use crate::types::{Hours, SkillId, Usage};

// === CONSTANTS ===

pub const DEFAULT_MIN_ADAPTABILITY: f64 = 15.0;

/// 2^20 subsets is the most the exhaustive search will enumerate.
pub const MAX_EXHAUSTIVE_CANDIDATES: usize = 20;

// === TYPES ===

/// A skill reduced to what the selector needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Candidate {
    pub id: SkillId,
    pub value: f64,
    pub time: Hours,
}

impl Candidate {
    pub fn new(id: impl Into<SkillId>, value: f64, time: Hours) -> Self {
        Self {
            id: id.into(),
            value,
            time,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.time > 0 {
            self.value / self.time as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Selection {
    pub skills: Vec<SkillId>,
    pub total_value: f64,
    pub total_time: Hours,
    /// value / time, zero when no time is spent
    pub efficiency: f64,
}

impl Selection {
    fn empty() -> Self {
        Self::from_members(&[])
    }

    fn from_members(members: &[&Candidate]) -> Self {
        let total_value: f64 = members.iter().map(|c| c.value).sum();
        let total_time = members
            .iter()
            .fold(0 as Hours, |acc, c| acc.saturating_add(c.time));
        Self {
            skills: members.iter().map(|c| c.id.clone()).collect(),
            total_value,
            total_time,
            efficiency: if total_time > 0 {
                total_value / total_time as f64
            } else {
                0.0
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct CounterexampleSkill {
    pub id: SkillId,
    pub value: f64,
    pub time: Hours,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Counterexample {
    pub min_adaptability: f64,
    pub skills: Vec<CounterexampleSkill>,
    pub greedy: Selection,
    pub greedy_explanation: String,
    pub optimal: Selection,
    pub optimal_explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PivotAnalysis {
    pub basic_skills: Vec<SkillId>,
    pub min_adaptability: f64,
    pub greedy: Selection,
    pub exhaustive: Selection,
    pub counterexample: Counterexample,
}

// === STRATEGIES ===

/// Take skills by descending value/time ratio while the running value is
/// still below `min_adaptability`. The last pick may overshoot.
pub fn greedy_selection(candidates: &[Candidate], min_adaptability: f64) -> Selection {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    // Stable: equal ratios keep candidate order
    ranked.sort_by(|a, b| b.ratio().total_cmp(&a.ratio()));

    let mut picked: Vec<&Candidate> = Vec::new();
    let mut accumulated = 0.0;
    for candidate in ranked {
        if accumulated >= min_adaptability {
            break;
        }
        accumulated += candidate.value;
        picked.push(candidate);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "greedy_pick",
            skill = %candidate.id,
            ratio = candidate.ratio(),
            accumulated = accumulated,
        );
    }

    Selection::from_members(&picked)
}

/// Minimum-time subset whose value reaches `min_adaptability`.
///
/// Subsets are visited by increasing bitmask; the first subset seen at the
/// minimal time wins. No qualifying subset yields an empty selection.
pub fn exhaustive_selection(
    candidates: &[Candidate],
    min_adaptability: f64,
) -> Result<Selection, PlanError> {
    let n = candidates.len();
    if n > MAX_EXHAUSTIVE_CANDIDATES {
        return Err(PlanError::TooManyCandidates {
            count: n,
            limit: MAX_EXHAUSTIVE_CANDIDATES,
        });
    }

    let mut best: Option<(u32, Hours)> = None;
    for mask in 1u32..(1u32 << n) {
        let (value, time) = candidates
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .fold((0.0, 0 as Hours), |(v, t), (_, c)| {
                (v + c.value, t.saturating_add(c.time))
            });

        if value >= min_adaptability && best.is_none_or(|(_, best_time)| time < best_time) {
            best = Some((mask, time));
        }
    }

    let Some((mask, _)) = best else {
        return Ok(Selection::empty());
    };

    let members: Vec<&Candidate> = candidates
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, c)| c)
        .collect();

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "exhaustive_best",
        candidates = n as u64,
        subsets = (1u64 << n) - 1,
        chosen = members.len() as u64,
    );

    Ok(Selection::from_members(&members))
}

// === COUNTEREXAMPLE ===

const COUNTEREXAMPLE_MIN_ADAPTABILITY: f64 = 12.0;

/// Literal instance where ratio-greedy spends 19h but 14h suffices.
pub fn greedy_counterexample() -> Counterexample {
    let candidates = [
        Candidate::new("H_A", 8.0, 10),
        Candidate::new("H_B", 5.0, 5),
        Candidate::new("H_C", 4.0, 4),
    ];

    let greedy = greedy_selection(&candidates, COUNTEREXAMPLE_MIN_ADAPTABILITY);
    // Three candidates never exceed the exhaustive bound
    let optimal = exhaustive_selection(&candidates, COUNTEREXAMPLE_MIN_ADAPTABILITY)
        .unwrap_or_else(|_| Selection::empty());

    Counterexample {
        min_adaptability: COUNTEREXAMPLE_MIN_ADAPTABILITY,
        skills: candidates
            .iter()
            .map(|c| CounterexampleSkill {
                id: c.id.clone(),
                value: c.value,
                time: c.time,
                ratio: c.ratio(),
            })
            .collect(),
        greedy_explanation: format!(
            "Greedy takes H_B and H_C first (ratio 1.0) but still needs H_A (ratio 0.8) \
             to reach {COUNTEREXAMPLE_MIN_ADAPTABILITY}, ending at {}h.",
            greedy.total_time
        ),
        optimal_explanation: format!(
            "H_A + H_C reaches exactly {COUNTEREXAMPLE_MIN_ADAPTABILITY} in {}h, so the \
             ratio heuristic is not optimal.",
            optimal.total_time
        ),
        greedy,
        optimal,
    }
}

// === ENTRY POINT ===

/// Compare greedy and exhaustive selection over the graph's `Base` skills.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "fast_pivot"))]
pub fn fast_pivot(graph: &SkillGraph, min_adaptability: f64) -> Result<PivotAnalysis, PlanError> {
    let basic_skills = graph.skills_by_usage(Usage::Base);
    let candidates: Vec<Candidate> = basic_skills
        .iter()
        .filter_map(|id| graph.get_skill(id))
        .map(|s| Candidate::new(s.id.clone(), s.value, s.time))
        .collect();

    Ok(PivotAnalysis {
        greedy: greedy_selection(&candidates, min_adaptability),
        exhaustive: exhaustive_selection(&candidates, min_adaptability)?,
        counterexample: greedy_counterexample(),
        basic_skills,
        min_adaptability,
    })
}
