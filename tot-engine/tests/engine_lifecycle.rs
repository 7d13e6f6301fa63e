//! Lifecycle scenarios driving a registry through whole runs.
//!
//! Each test starts from a fresh registry, submits batches the way a caller
//! would after `request_samples`, and checks enforcement, pruning and path
//! selection from the outside.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tot_engine::core::invariants::validate_invariants;
use tot_engine::core::types::{Candidate, RunStatus, SampleSubmission};
use tot_engine::test_support::{ManualClock, registry_with_clock, submission};
use tot_engine::tree::NodeState;
use tot_engine::{EngineError, Registry};

/// Enforced shallow run: sixteen single-candidate batches meet the minimum.
///
/// Before the sixteenth node the gated best-path call fails and reports how
/// many nodes are still needed; afterwards it succeeds.
#[test]
fn enforced_shallow_run_unlocks_after_minimum() {
    let mut registry = Registry::default();
    let started = registry
        .start_run("enforced", "Design a rate limiter", "shallow")
        .expect("start");
    let run_id = started.run_id;
    let root = started.root_node_id;
    assert_eq!(started.enforcement.min_required, 16);

    for i in 0..15 {
        registry
            .submit_samples(&run_id, &[submission(&root, &[0.9])])
            .expect("submit");
        let status = registry.get_enforcement_status(&run_id).expect("status");
        assert_eq!(status.nodes_created, i + 1);
        assert!(!status.requirement_met);
    }

    let err = registry.get_best_path(&run_id, true).expect_err("gated");
    let EngineError::EnforcementNotMet(status) = err else {
        panic!("expected EnforcementNotMet, got {err}");
    };
    assert_eq!(status.nodes_remaining(), 1);

    registry
        .submit_samples(&run_id, &[submission(&root, &[0.9])])
        .expect("submit");
    let status = registry.get_enforcement_status(&run_id).expect("status");
    assert!(status.requirement_met);
    assert!(status.complete);

    let path = registry.get_best_path(&run_id, true).expect("path");
    assert_eq!(path.status, RunStatus::Complete);
    assert_eq!(path.path_length, 1);
    assert!((path.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn out_of_range_estimate_creates_nothing() {
    let mut registry = Registry::default();
    let started = registry
        .start_run("regular", "Pick a queue", "moderate")
        .expect("start");
    let batch = [SampleSubmission {
        parent_node_id: started.root_node_id.clone(),
        candidates: vec![Candidate::new("bad", 0.5, 0.5, 1.1)],
    }];

    let err = registry
        .submit_samples(&started.run_id, &batch)
        .expect_err("invalid");
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let run = registry.get_run(&started.run_id).expect("run");
    assert_eq!(run.total_node_count(), 0);
    assert_eq!(run.tree().len(), 1);
}

/// Identical progress and feasibility: lower risk wins the path.
#[test]
fn lower_risk_sibling_is_preferred() {
    let mut registry = Registry::default();
    let started = registry
        .start_run("regular", "Pick a vendor", "shallow")
        .expect("start");
    let batch = [SampleSubmission {
        parent_node_id: started.root_node_id,
        candidates: vec![
            Candidate::new("risky vendor", 0.7, 0.7, 0.3),
            Candidate::new("safe vendor", 0.7, 0.7, 0.1),
        ],
    }];
    registry
        .submit_samples(&started.run_id, &batch)
        .expect("submit");

    let path = registry.get_best_path(&started.run_id, false).expect("path");
    assert_eq!(path.final_answer, "safe vendor");
    assert_eq!(path.thought_chain, vec!["safe vendor"]);
}

/// Follow `request_samples` for a whole run and check the invariants the
/// caller relies on after every batch.
#[test]
fn sampling_loop_respects_frontier_and_budget() {
    let mut registry = Registry::default();
    let run_id = registry
        .start_run("regular", "Plan a migration", "moderate")
        .expect("start")
        .run_id;
    let budget = registry.get_run(&run_id).expect("run").limits.node_budget;
    let mut rounds = 0;

    loop {
        let batch = registry.request_samples(&run_id).expect("samples");
        if batch.requests.is_empty() {
            break;
        }
        rounds += 1;
        assert!(rounds < 100, "sampling loop did not terminate");

        let run = registry.get_run(&run_id).expect("run");
        let mut seen = HashSet::new();
        let mut submissions = Vec::new();
        for (i, request) in batch.requests.iter().enumerate() {
            assert!(seen.insert(request.node_id.clone()), "duplicate request");
            let node = run.tree().find(&request.node_id).expect("node");
            assert_eq!(node.state, NodeState::Frontier);
            assert!(request.depth < run.limits.max_depth);
            assert!(request.num_candidates >= 1);

            let scores: Vec<f64> = (0..request.num_candidates)
                .map(|j| 0.3 + 0.1 * ((i + j) % 6) as f64)
                .collect();
            submissions.push(submission(&request.node_id, &scores));
        }

        let outcome = registry
            .submit_samples(&run_id, &submissions)
            .expect("submit");
        assert!(outcome.total_node_count <= budget);
        let run = registry.get_run(&run_id).expect("run");
        assert_eq!(validate_invariants(run.tree()), Vec::<String>::new());
    }

    let run = registry.get_run(&run_id).expect("run");
    assert!(run.total_node_count() <= budget);
    assert!(run.tree().max_depth() <= run.limits.max_depth);

    let path = registry.get_best_path(&run_id, false).expect("path");
    assert!(path.path_length >= 1);
    let run = registry.get_run(&run_id).expect("run");
    let best = run.best_node().expect("best node");
    assert_eq!(best.state, NodeState::Terminal);
    assert_eq!(run.status, RunStatus::Complete);
}

#[test]
fn repeated_status_queries_agree() {
    let clock = Arc::new(ManualClock::new());
    let mut registry = registry_with_clock(clock.clone());
    let started = registry
        .start_run("enforced", "Name a product", "deep")
        .expect("start");
    registry
        .submit_samples(&started.run_id, &[submission(&started.root_node_id, &[0.4, 0.6])])
        .expect("submit");

    let first = registry.get_enforcement_status(&started.run_id).expect("status");
    let second = registry.get_enforcement_status(&started.run_id).expect("status");
    assert_eq!(first, second);

    clock.advance(Duration::from_secs(2 * 60 * 60));
    let later = registry.get_enforcement_status(&started.run_id).expect("status");
    assert!(later.time_exceeded);
    assert!(later.complete);
    assert_eq!(later.nodes_created, first.nodes_created);
}

#[test]
fn runs_are_independent() {
    let mut registry = Registry::default();
    let a = registry.start_run("regular", "first", "shallow").expect("start");
    let b = registry.start_run("regular", "second", "shallow").expect("start");

    let err = registry
        .submit_samples(&b.run_id, &[submission(&a.root_node_id, &[0.5])])
        .expect_err("foreign parent");
    assert!(matches!(err, EngineError::NotFound { .. }));

    registry
        .submit_samples(&a.run_id, &[submission(&a.root_node_id, &[0.5, 0.7])])
        .expect("submit");
    assert_eq!(registry.get_run(&a.run_id).expect("run").total_node_count(), 2);
    assert_eq!(registry.get_run(&b.run_id).expect("run").total_node_count(), 0);
    assert_eq!(registry.list_runs().len(), 2);
}

/// Asking for the best path mid-run labels the leaf terminal, but the leaf
/// stays on the frontier and can still be expanded.
#[test]
fn mid_run_best_path_does_not_close_the_leaf() {
    let mut registry = Registry::default();
    let started = registry
        .start_run("regular", "Choose a cache", "deep")
        .expect("start");
    let first = registry
        .submit_samples(&started.run_id, &[submission(&started.root_node_id, &[0.8, 0.6])])
        .expect("submit");
    let leaf = first.node_ids[0].clone();

    let early = registry.get_best_path(&started.run_id, false).expect("path");
    assert_eq!(early.path_length, 1);

    let batch = registry.request_samples(&started.run_id).expect("samples");
    assert_eq!(batch.requests[0].node_id, leaf);
    assert_eq!(batch.requests[0].guideline.depth, 1);

    let second = registry
        .submit_samples(&started.run_id, &[submission(&leaf, &[0.7, 0.75])])
        .expect("submit");
    let run = registry.get_run(&started.run_id).expect("run");
    assert_eq!(validate_invariants(run.tree()), Vec::<String>::new());
    assert_eq!(second.node_ids.len(), 2);

    let later = registry.get_best_path(&started.run_id, false).expect("path");
    assert_eq!(later.path_length, 2);
}
