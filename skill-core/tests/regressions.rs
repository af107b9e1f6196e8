//! Regression scenarios over the reference catalog.
//!
//! Expected numbers are derived by hand from the catalog table: any change to
//! search order, tie-breaking or cost formulas shows up here first.

use skill_core::{
    DEFAULT_MIN_ADAPTABILITY, DESIGNATED_CRITICAL, MarketScenarioSet, PathOutcome, PathQuery,
    PlanError, PlannerConfig, SkillGraph, SkillId, ValidationError, analyze_critical_orderings,
    fast_pivot, feasible_paths, greedy_counterexample, max_value_path, recommend_next_skills,
};

// === FIXTURES ===

fn ids(raw: &[&str]) -> Vec<SkillId> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn designated() -> Vec<SkillId> {
    ids(&DESIGNATED_CRITICAL)
}

// === GRAPH ===

#[test]
fn reference_catalog_validates_clean() {
    let graph = SkillGraph::standard();
    assert_eq!(graph.len(), 12);
    assert!(graph.validate().is_empty());
    assert_eq!(graph.start_skills(), ids(&["S1", "S2", "H10", "H12"]));
    assert_eq!(graph.dependents("S1"), ids(&["S3", "S4", "S8"]));
}

#[test]
fn catalog_json_with_dangling_prerequisite_is_reported_not_fatal() {
    let json = r#"[
        {"id": "A", "name": "Alpha", "time": 10, "value": 2.0, "complexity": 1, "usage": "Base"},
        {"id": "B", "name": "Beta", "time": 20, "value": 3.0, "complexity": 2,
         "prerequisites": ["A", "Ghost"], "usage": "FinalObjective"}
    ]"#;
    let graph = SkillGraph::from_catalog_json(json).unwrap();
    assert_eq!(
        graph.validate(),
        vec![ValidationError::MissingPrerequisite {
            prerequisite: "Ghost".to_string(),
            dependent: "B".to_string(),
        }]
    );

    // Planning proceeds past non-fatal findings
    let paths = feasible_paths(&graph, &PathQuery::new("B")).unwrap();
    assert_eq!(paths, vec![ids(&["A", "B"])]);
}

#[test]
fn repeated_prerequisite_in_json_yields_one_path() {
    let json = r#"[
        {"id": "A", "name": "Alpha", "time": 10, "value": 2.0, "complexity": 1, "usage": "Base"},
        {"id": "B", "name": "Beta", "time": 20, "value": 3.0, "complexity": 2,
         "prerequisites": ["A", "A"], "usage": "FinalObjective"}
    ]"#;
    let graph = SkillGraph::from_catalog_json(json).unwrap();
    assert_eq!(graph.dependents("A"), ids(&["B"]));

    let paths = feasible_paths(&graph, &PathQuery::new("B")).unwrap();
    assert_eq!(paths, vec![ids(&["A", "B"])]);

    let outcome = max_value_path(&graph, &PathQuery::new("B").with_seed(5)).unwrap();
    let PathOutcome::Found(analysis) = outcome else {
        panic!("expected a feasible path");
    };
    assert_eq!(analysis.all_feasible_paths.len(), 1);
}

#[test]
fn malformed_catalog_json_is_a_catalog_error() {
    let err = SkillGraph::from_catalog_json("[{\"id\": 3}]").unwrap_err();
    assert!(matches!(err, PlanError::Catalog(_)), "got {err:?}");
}

// === PATHS ===

#[test]
fn default_budget_admits_single_chain_to_objective() {
    let graph = SkillGraph::standard();
    let query = PathQuery::default().with_seed(42);

    let outcome = max_value_path(&graph, &query).unwrap();
    let PathOutcome::Found(analysis) = outcome else {
        panic!("expected a feasible path");
    };

    assert_eq!(analysis.all_feasible_paths.len(), 1);
    let best = &analysis.best_path;
    assert_eq!(best.sequence, ids(&["S1", "S4", "S6"]));
    assert_eq!(best.total_value, 21.0);
    assert_eq!(best.total_time, 350);
    assert_eq!(best.total_complexity, 23);
    assert!(
        (best.expected_value - 21.0).abs() < 0.2,
        "expected value {} should sit near the nominal 21",
        best.expected_value
    );
    // Uniform ±10% jitter on 3, 8 and 10 gives σ ≈ 0.76
    assert!(best.std_deviation > 0.5 && best.std_deviation < 1.0);
}

#[test]
fn strict_prerequisites_need_the_longer_chain() {
    let graph = SkillGraph::standard();

    let strict_default = PathQuery::default().requiring_all_prerequisites();
    assert!(feasible_paths(&graph, &strict_default).unwrap().is_empty());

    let strict_wide = PathQuery::default()
        .with_budget(450, 31)
        .requiring_all_prerequisites();
    assert_eq!(
        feasible_paths(&graph, &strict_wide).unwrap(),
        vec![ids(&["S1", "S3", "S4", "S6"])]
    );
}

#[test]
fn tight_budget_has_no_solution() {
    let graph = SkillGraph::standard();
    let outcome = max_value_path(&graph, &PathQuery::default().with_budget(100, 30)).unwrap();
    assert_eq!(outcome, PathOutcome::NoSolution);
    assert!(outcome.best().is_none());
}

#[test]
fn unknown_target_is_an_error() {
    let graph = SkillGraph::standard();
    assert_eq!(
        max_value_path(&graph, &PathQuery::new("S99")),
        Err(PlanError::UnknownSkill("S99".to_string()))
    );
}

#[test]
fn seeded_valuation_is_reproducible() {
    let graph = SkillGraph::standard();
    let query = PathQuery::default().with_budget(600, 60).with_seed(7);
    let first = max_value_path(&graph, &query).unwrap();
    let second = max_value_path(&graph, &query).unwrap();
    assert_eq!(first, second);
}

// === ORDERINGS ===

#[test]
fn critical_orderings_match_shortest_first() {
    let graph = SkillGraph::standard();
    let analysis = analyze_critical_orderings(&graph, &designated()).unwrap();

    assert_eq!(analysis.best_order, ids(&["S5", "S7", "S8", "S3", "S9"]));
    assert_eq!(analysis.best_cost, 1060);
    assert!(analysis.matches_duration_heuristic);
    assert_eq!(analysis.duration_order, analysis.best_order);

    let top: Vec<u64> = analysis.top3.iter().map(|r| r.cost).collect();
    assert_eq!(top, vec![1060, 1070, 1070]);

    assert_eq!(analysis.all_costs.len(), 120);
    assert_eq!(analysis.all_costs.last(), Some(&1400));
    // Average position weight is 3, times sum to 410
    assert!((analysis.mean_cost - 1230.0).abs() < 1e-9);
    assert!(analysis.std_dev_cost > 0.0);
}

#[test]
fn missing_critical_skill_is_a_configuration_error() {
    let mut skills = skill_core::standard_catalog();
    // Nothing depends on S9, so the rest of the graph stays intact
    skills.retain(|s| s.id != "S9");
    let graph = SkillGraph::from_skills(skills);

    let err = analyze_critical_orderings(&graph, &designated()).unwrap_err();
    assert_eq!(
        err,
        PlanError::ConfigurationMismatch {
            expected: 5,
            found: ids(&["S3", "S5", "S7", "S8"]),
        }
    );
    assert_eq!(
        err.to_string(),
        "expected 5 critical skills, found 4: [\"S3\", \"S5\", \"S7\", \"S8\"]"
    );
}

// === PIVOT ===

#[test]
fn reference_base_skills_cannot_reach_default_adaptability() {
    let graph = SkillGraph::standard();
    let pivot = fast_pivot(&graph, DEFAULT_MIN_ADAPTABILITY).unwrap();

    assert_eq!(pivot.basic_skills, ids(&["S1", "S2"]));
    // Greedy exhausts the candidates without reaching 15
    assert_eq!(pivot.greedy.skills, ids(&["S2", "S1"]));
    assert_eq!(pivot.greedy.total_value, 7.0);
    assert_eq!(pivot.greedy.total_time, 140);
    assert!(pivot.exhaustive.is_empty());

    assert_eq!(pivot.counterexample, greedy_counterexample());
}

#[test]
fn reachable_threshold_gives_optimal_subset() {
    let graph = SkillGraph::standard();
    let pivot = fast_pivot(&graph, 4.0).unwrap();
    assert_eq!(pivot.exhaustive.skills, ids(&["S2"]));
    assert_eq!(pivot.exhaustive.total_time, 60);
    assert_eq!(pivot.greedy, pivot.exhaustive);
}

// === PLANNER ===

#[test]
fn five_year_plan_from_scratch() {
    let graph = SkillGraph::standard();
    let rec = recommend_next_skills(
        &graph,
        &[],
        5,
        &MarketScenarioSet::standard(),
        &PlannerConfig::default(),
    )
    .unwrap();

    assert_eq!(rec.total_time_budget, 2600);
    assert_eq!(rec.full_path, ids(&["S1", "S3", "S4"]));
    assert_eq!(rec.recommended_next, rec.full_path);
    assert_eq!(rec.path_time, 300);
    // 3 + 7 + 8 · 1.06 under the standard outlook
    assert!((rec.expected_value - 18.48).abs() < 1e-9, "got {}", rec.expected_value);
}

#[test]
fn plan_builds_on_acquired_skills() {
    let graph = SkillGraph::standard();
    let rec = recommend_next_skills(
        &graph,
        &ids(&["S1", "S3", "S4"]),
        5,
        &MarketScenarioSet::standard(),
        &PlannerConfig::default(),
    )
    .unwrap();

    for held in ["S1", "S3", "S4"] {
        assert!(!rec.full_path.iter().any(|id| id == held));
    }
    // S6 (10 · 1.09), H11 (8 · 1.03) and S8 (6 · 1.04) in some order
    let mut chosen = rec.full_path.clone();
    chosen.sort();
    assert_eq!(chosen, ids(&["H11", "S6", "S8"]));
    assert!((rec.expected_value - 25.38).abs() < 1e-9, "got {}", rec.expected_value);
}

#[test]
fn zero_year_horizon_recommends_nothing() {
    let graph = SkillGraph::standard();
    let rec = recommend_next_skills(
        &graph,
        &[],
        0,
        &MarketScenarioSet::standard(),
        &PlannerConfig::default(),
    )
    .unwrap();
    assert!(rec.full_path.is_empty());
    assert!(rec.recommended_next.is_empty());
    assert_eq!(rec.expected_value, 0.0);
}
