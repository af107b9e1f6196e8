//! Constrained acquisition paths to a target skill.
//!
//! Paths are found by depth-first backtracking along forward edges
//! (prerequisite → dependent) from every skill without prerequisites. Each
//! feasible path is then valued twice:
//!
//! - deterministically, by summing the nominal value/time/complexity
//! - stochastically, by a Monte Carlo run that jitters every skill's value
//!   uniformly within ±10% and reports the trial mean and population spread

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::catalog::FINAL_OBJECTIVE;
use crate::error::PlanError;
use crate::graph::SkillGraph;
use crate::stats;
use crate::types::{Hours, Skill, SkillId};

// === CONSTANTS ===

pub const DEFAULT_MAX_TIME: Hours = 350;
pub const DEFAULT_MAX_COMPLEXITY: u32 = 30;
pub const DEFAULT_SAMPLES: usize = 1000;

/// Half-width of the uniform value multiplier: values vary in [0.9, 1.1].
const VALUE_JITTER: f64 = 0.1;

// === QUERY ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(from_wasm_abi)]
pub struct PathQuery {
    pub target: SkillId,
    pub max_time: Hours,
    pub max_complexity: u32,
    /// Monte Carlo trials per feasible path
    pub samples: usize,
    /// Fixed seed for reproducible valuations; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Only enter a skill once all of its prerequisites are on the path.
    /// Off by default: the search then follows single dependency chains.
    #[serde(default)]
    pub require_all_prerequisites: bool,
}

impl Default for PathQuery {
    fn default() -> Self {
        Self::new(FINAL_OBJECTIVE)
    }
}

impl PathQuery {
    pub fn new(target: impl Into<SkillId>) -> Self {
        Self {
            target: target.into(),
            max_time: DEFAULT_MAX_TIME,
            max_complexity: DEFAULT_MAX_COMPLEXITY,
            samples: DEFAULT_SAMPLES,
            seed: None,
            require_all_prerequisites: false,
        }
    }

    pub fn with_budget(mut self, max_time: Hours, max_complexity: u32) -> Self {
        self.max_time = max_time;
        self.max_complexity = max_complexity;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn requiring_all_prerequisites(mut self) -> Self {
        self.require_all_prerequisites = true;
        self
    }
}

// === RESULTS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PathValuation {
    pub sequence: Vec<SkillId>,
    pub total_value: f64,
    pub total_time: Hours,
    pub total_complexity: u32,
    pub expected_value: f64,
    pub std_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PathAnalysis {
    pub best_path: PathValuation,
    /// Ranked by expected value, descending; ties keep discovery order.
    pub all_feasible_paths: Vec<PathValuation>,
}

/// Outcome of a path search. `NoSolution` means the search ran and nothing
/// fits the budgets; misconfiguration is reported through `PlanError` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PathOutcome {
    Found(PathAnalysis),
    NoSolution,
}

impl PathOutcome {
    pub fn best(&self) -> Option<&PathValuation> {
        match self {
            PathOutcome::Found(analysis) => Some(&analysis.best_path),
            PathOutcome::NoSolution => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }
}

// === MONTE CARLO ===

/// Monte Carlo valuator with a per-invocation cache keyed by path sequence.
pub struct MonteCarloValuator {
    samples: usize,
    rng: StdRng,
    cache: HashMap<Vec<SkillId>, (f64, f64)>,
}

impl MonteCarloValuator {
    pub fn new(samples: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            samples: samples.max(1),
            rng,
            cache: HashMap::new(),
        }
    }

    /// Returns `(expected_value, std_deviation)` of the path's total value.
    pub fn value(&mut self, graph: &SkillGraph, path: &[SkillId]) -> (f64, f64) {
        if let Some(&cached) = self.cache.get(path) {
            return cached;
        }

        let nominal: Vec<f64> = path
            .iter()
            .filter_map(|id| graph.get_skill(id))
            .map(|s| s.value)
            .collect();

        let trials: Vec<f64> = (0..self.samples)
            .map(|_| {
                nominal
                    .iter()
                    .map(|v| {
                        v * self
                            .rng
                            .random_range(1.0 - VALUE_JITTER..=1.0 + VALUE_JITTER)
                    })
                    .sum::<f64>()
            })
            .collect();

        let expected = stats::mean(&trials);
        let result = (expected, stats::population_std_dev(&trials, expected));
        self.cache.insert(path.to_vec(), result);
        result
    }

    pub fn cached_paths(&self) -> usize {
        self.cache.len()
    }
}

// === SEARCH ===

/// Parameters shared by every level of the backtracking search
struct SearchContext<'a> {
    graph: &'a SkillGraph,
    target: &'a str,
    max_time: Hours,
    max_complexity: u32,
    require_all_prerequisites: bool,
}

/// Current path plus its running totals
#[derive(Default)]
struct SearchState {
    path: Vec<SkillId>,
    on_path: HashSet<SkillId>,
    time: Hours,
    complexity: u32,
}

impl SearchState {
    fn push(&mut self, skill: &Skill) {
        self.path.push(skill.id.clone());
        self.on_path.insert(skill.id.clone());
        self.time += skill.time;
        self.complexity += skill.complexity;
    }

    fn pop(&mut self, skill: &Skill) {
        self.path.pop();
        self.on_path.remove(&skill.id);
        self.time -= skill.time;
        self.complexity -= skill.complexity;
    }
}

impl SearchContext<'_> {
    fn fits(&self, state: &SearchState, skill: &Skill) -> bool {
        let time = state.time.saturating_add(skill.time);
        let complexity = state.complexity.saturating_add(skill.complexity);
        time <= self.max_time && complexity <= self.max_complexity
    }

    fn extend(&self, current: &str, state: &mut SearchState, found: &mut Vec<Vec<SkillId>>) {
        // The target is terminal: record and backtrack
        if current == self.target {
            found.push(state.path.clone());
            return;
        }

        for neighbor in self.graph.dependents(current) {
            if state.on_path.contains(neighbor) {
                continue;
            }
            let Some(skill) = self.graph.get_skill(neighbor) else {
                continue;
            };
            if !self.fits(state, skill) {
                continue;
            }
            if self.require_all_prerequisites
                && !skill.prerequisites.iter().all(|p| state.on_path.contains(p))
            {
                continue;
            }

            state.push(skill);
            self.extend(neighbor, state, found);
            state.pop(skill);
        }
    }
}

/// Every budget-feasible path from a prerequisite-free skill to the target,
/// in discovery order.
pub fn feasible_paths(graph: &SkillGraph, query: &PathQuery) -> Result<Vec<Vec<SkillId>>, PlanError> {
    graph.ensure_acyclic()?;
    if !graph.contains(&query.target) {
        return Err(PlanError::UnknownSkill(query.target.clone()));
    }

    let ctx = SearchContext {
        graph,
        target: &query.target,
        max_time: query.max_time,
        max_complexity: query.max_complexity,
        require_all_prerequisites: query.require_all_prerequisites,
    };

    let mut found = Vec::new();
    for start in graph.skills().filter(|s| !s.has_prerequisites()) {
        let mut state = SearchState::default();
        if !ctx.fits(&state, start) {
            continue;
        }
        state.push(start);
        ctx.extend(&start.id, &mut state, &mut found);
    }

    Ok(found)
}

fn valuate(graph: &SkillGraph, valuator: &mut MonteCarloValuator, sequence: Vec<SkillId>) -> PathValuation {
    let members: Vec<&Skill> = sequence.iter().filter_map(|id| graph.get_skill(id)).collect();
    let (expected_value, std_deviation) = valuator.value(graph, &sequence);

    PathValuation {
        total_value: members.iter().map(|s| s.value).sum(),
        total_time: members.iter().map(|s| s.time).sum(),
        total_complexity: members.iter().map(|s| s.complexity).sum(),
        expected_value,
        std_deviation,
        sequence,
    }
}

/// Find the path to `query.target` with the highest Monte Carlo expected value.
#[cfg_attr(feature = "instrument", tracing::instrument(skip_all, name = "max_value_path"))]
pub fn max_value_path(graph: &SkillGraph, query: &PathQuery) -> Result<PathOutcome, PlanError> {
    let paths = feasible_paths(graph, query)?;
    let mut valuator = MonteCarloValuator::new(query.samples, query.seed);

    let mut ranked: Vec<PathValuation> = paths
        .into_iter()
        .map(|sequence| valuate(graph, &mut valuator, sequence))
        .collect();

    #[cfg(feature = "instrument")]
    for path in &ranked {
        tracing::info!(
            target: "feasible_path",
            length = path.sequence.len() as u64,
            total_value = path.total_value,
            total_time = path.total_time as u64,
            total_complexity = path.total_complexity as u64,
            expected_value = path.expected_value,
            std_deviation = path.std_deviation,
        );
    }

    // Stable sort: equal expected values keep discovery order
    ranked.sort_by(|a, b| b.expected_value.total_cmp(&a.expected_value));

    let Some(best_path) = ranked.first().cloned() else {
        return Ok(PathOutcome::NoSolution);
    };

    Ok(PathOutcome::Found(PathAnalysis {
        best_path,
        all_feasible_paths: ranked,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;

    fn skill(id: &str, time: Hours, value: f64, complexity: u32, prereqs: &[&str]) -> Skill {
        Skill::new(id, id, time, value, complexity, Usage::Base)
            .with_prerequisites(prereqs.iter().copied())
    }

    /// Two routes to T: A→B→T (cheap) and A→C→T (valuable)
    fn fork() -> SkillGraph {
        SkillGraph::from_skills([
            skill("A", 10, 1.0, 1, &[]),
            skill("B", 10, 2.0, 1, &["A"]),
            skill("C", 30, 9.0, 5, &["A"]),
            skill("T", 10, 5.0, 1, &["B", "C"]),
        ])
    }

    #[test]
    fn finds_every_branch_to_target() {
        let query = PathQuery::new("T").with_budget(100, 100);
        let paths = feasible_paths(&fork(), &query).unwrap();
        assert_eq!(paths, vec![vec!["A", "B", "T"], vec!["A", "C", "T"]]);
    }

    #[test]
    fn budget_prunes_expensive_branch() {
        let query = PathQuery::new("T").with_budget(35, 100);
        let paths = feasible_paths(&fork(), &query).unwrap();
        assert_eq!(paths, vec![vec!["A", "B", "T"]]);

        let query = PathQuery::new("T").with_budget(100, 6);
        let paths = feasible_paths(&fork(), &query).unwrap();
        assert_eq!(paths, vec![vec!["A", "B", "T"]]);
    }

    #[test]
    fn strict_mode_requires_every_prerequisite() {
        // T needs both B and C, which never share a single dependency chain
        let query = PathQuery::new("T")
            .with_budget(100, 100)
            .requiring_all_prerequisites();
        assert!(feasible_paths(&fork(), &query).unwrap().is_empty());
    }

    #[test]
    fn start_skill_can_be_the_target() {
        let query = PathQuery::new("A").with_budget(100, 100).with_seed(1);
        let outcome = max_value_path(&fork(), &query).unwrap();
        assert_eq!(outcome.best().unwrap().sequence, vec!["A"]);
    }

    #[test]
    fn start_skill_over_budget_is_skipped() {
        let query = PathQuery::new("A").with_budget(5, 100);
        assert_eq!(max_value_path(&fork(), &query).unwrap(), PathOutcome::NoSolution);
    }

    #[test]
    fn ranks_by_expected_value() {
        let query = PathQuery::new("T").with_budget(100, 100).with_seed(7);
        let PathOutcome::Found(analysis) = max_value_path(&fork(), &query).unwrap() else {
            panic!("expected a feasible path");
        };
        assert_eq!(analysis.best_path.sequence, vec!["A", "C", "T"]);
        assert_eq!(analysis.best_path.total_value, 15.0);
        assert_eq!(analysis.best_path.total_time, 50);
        assert_eq!(analysis.best_path.total_complexity, 7);
        assert_eq!(analysis.all_feasible_paths.len(), 2);
        assert!(
            analysis.all_feasible_paths[0].expected_value
                >= analysis.all_feasible_paths[1].expected_value
        );
    }

    #[test]
    fn unknown_target_is_an_error() {
        let query = PathQuery::new("Nope");
        assert_eq!(
            max_value_path(&fork(), &query),
            Err(PlanError::UnknownSkill("Nope".to_string()))
        );
    }

    #[test]
    fn cycle_halts_search() {
        let graph = SkillGraph::from_skills([
            skill("A", 10, 1.0, 1, &[]),
            skill("B", 10, 1.0, 1, &["A", "C"]),
            skill("C", 10, 1.0, 1, &["B"]),
        ]);
        assert_eq!(
            max_value_path(&graph, &PathQuery::new("C")),
            Err(PlanError::CycleDetected)
        );
    }

    #[test]
    fn monte_carlo_is_cached_per_path() {
        let graph = fork();
        let path: Vec<SkillId> = vec!["A".into(), "B".into(), "T".into()];
        let mut valuator = MonteCarloValuator::new(100, Some(3));
        let first = valuator.value(&graph, &path);
        let second = valuator.value(&graph, &path);
        assert_eq!(first, second);
        assert_eq!(valuator.cached_paths(), 1);
    }

    #[test]
    fn monte_carlo_converges_to_nominal_sum() {
        let graph = fork();
        let path: Vec<SkillId> = vec!["A".into(), "C".into(), "T".into()];
        let mut valuator = MonteCarloValuator::new(20_000, Some(11));
        let (expected, spread) = valuator.value(&graph, &path);
        assert!((expected - 15.0).abs() < 0.05, "expected = {}", expected);
        // Each term has sd v * 0.2 / sqrt(12); the sum's sd is ~0.6
        assert!(spread > 0.4 && spread < 0.8, "spread = {}", spread);
    }

    #[test]
    fn seeded_runs_are_bit_identical() {
        let query = PathQuery::new("T").with_budget(100, 100).with_seed(42);
        let a = max_value_path(&fork(), &query).unwrap();
        let b = max_value_path(&fork(), &query).unwrap();
        assert_eq!(a, b);
    }
}
