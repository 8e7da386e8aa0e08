//! End-to-end refreshes against a JSON vote file and an on-disk store.

mod common;

use caucus::analysis::{AnalysisError, FewerRowsPolicy, PLACEHOLDER_RANGE, SimilarityMode};
use caucus::io::ExitCode;
use caucus::{CaucusError, ClusteringView, RefreshOutcome};
use common::{SCENARIO, TWO_BLOCS, TestProject, run_date};
use std::collections::HashMap;

fn by_id(views: &[ClusteringView]) -> HashMap<String, ClusteringView> {
    views
        .iter()
        .map(|v| (v.legislator_id.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_results_survive_reopening_the_store() {
    let project = TestProject::new();
    project.write_votes(SCENARIO);

    let before = {
        let service = project.service();
        assert!(matches!(
            service.refresh().unwrap(),
            RefreshOutcome::Completed(_)
        ));
        service.results().unwrap()
    };

    let service = project.service();
    let after = service.results().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 3);

    let views = by_id(&after);
    assert_eq!(views["A"].id, "cluster_A_20241105");
    assert_eq!(views["A"].name, "Avery");
    assert_eq!(views["C"].party, "Red");
    assert!(after.iter().all(|v| v.model_version == "v1.0"));
    assert!(after.iter().all(|v| v.computed_at == run_date()));

    let run = service.last_run().unwrap().unwrap();
    assert_eq!(run.legislators, 3);
    assert_eq!(run.clusters, 3);
}

#[test]
fn test_reads_proceed_while_another_handle_holds_the_store() {
    let project = TestProject::new();
    project.write_votes(SCENARIO);

    let running = project.service();
    running.refresh().unwrap();
    let before = running.results().unwrap();

    // Same lock a refresh holds from start to commit
    let lock = running.store().writer().unwrap();

    let other = project.service();
    assert_eq!(other.results().unwrap(), before);
    assert_eq!(
        other.summary().unwrap().iter().map(|c| c.members).sum::<usize>(),
        3
    );
    assert_eq!(other.last_run().unwrap().map(|r| r.legislators), Some(3));

    let err = other.refresh().unwrap_err();
    assert!(matches!(err, CaucusError::RefreshInProgress));
    assert_eq!(ExitCode::from_error(&err), ExitCode::Busy);

    drop(lock);
    project.write_votes(TWO_BLOCS);
    assert!(matches!(
        other.refresh().unwrap(),
        RefreshOutcome::Completed(_)
    ));

    // The first handle sees the other's commit without reopening
    assert_eq!(running.store().count().unwrap(), 8);
}

#[test]
fn test_blank_legislator_id_is_a_persistence_failure() {
    let project = TestProject::new();
    project.write_votes(SCENARIO);
    let service = project.service();
    service.refresh().unwrap();
    let before = service.store().snapshot().unwrap();

    project.write_votes(
        r#"{
            "legislators": [
                {"id": "A", "name": "Avery", "party": "Blue"},
                {"id": "", "name": "Nobody", "party": "None"}
            ],
            "votes": [
                {"legislator_id": "A", "bill_id": "X", "position": "agree"},
                {"legislator_id": "", "bill_id": "X", "position": "disagree"}
            ]
        }"#,
    );

    let err = service.refresh().unwrap_err();
    assert!(matches!(err, CaucusError::PersistenceFailure(_)));
    assert_eq!(ExitCode::from_error(&err), ExitCode::IoError);
    assert_eq!(service.store().snapshot().unwrap(), before);
}

#[test]
fn test_identical_input_gives_identical_output() {
    let first = TestProject::new();
    let second = TestProject::new();
    first.write_votes(TWO_BLOCS);
    second.write_votes(TWO_BLOCS);

    let a = first.service();
    let b = second.service();
    a.refresh().unwrap();
    b.refresh().unwrap();

    assert_eq!(a.results().unwrap(), b.results().unwrap());
}

#[test]
fn test_two_blocs_separate_with_two_clusters() {
    let mut project = TestProject::new();
    project.settings.clustering.k = 2;
    project.write_votes(TWO_BLOCS);

    let service = project.service();
    service.refresh().unwrap();
    let views = by_id(&service.results().unwrap());

    for id in ["L2", "L3"] {
        assert_eq!(views[id].cluster_id, views["L1"].cluster_id, "{id}");
    }
    for id in ["R2", "R3"] {
        assert_eq!(views[id].cluster_id, views["R1"].cluster_id, "{id}");
    }
    assert_ne!(views["L1"].cluster_id, views["R1"].cluster_id);
    assert!(views.values().all(|v| v.cluster_id.index() < 2));
}

#[test]
fn test_results_are_ordered_by_cluster_then_similarity() {
    let project = TestProject::new();
    project.write_votes(TWO_BLOCS);

    let service = project.service();
    service.refresh().unwrap();
    let views = service.results().unwrap();

    assert_eq!(views.len(), 8);
    for pair in views.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.cluster_id <= b.cluster_id);
        if a.cluster_id == b.cluster_id {
            assert!(a.similarity >= b.similarity);
        }
    }
}

#[test]
fn test_vote_file_without_positions_keeps_results() {
    let project = TestProject::new();
    project.write_votes(SCENARIO);
    let service = project.service();
    service.refresh().unwrap();
    let before = service.results().unwrap();

    project.write_votes(
        r#"{
            "legislators": [{"id": "A", "name": "Avery", "party": "Blue"}],
            "votes": [{"legislator_id": "A", "bill_id": "X", "position": null}]
        }"#,
    );

    assert_eq!(service.refresh().unwrap(), RefreshOutcome::NoData);
    assert_eq!(service.results().unwrap(), before);
}

#[test]
fn test_unreadable_vote_file_is_input_unavailable() {
    let project = TestProject::new();
    project.write_votes(SCENARIO);
    let service = project.service();
    service.refresh().unwrap();

    project.write_votes("{ \"legislators\": [");
    let err = service.refresh().unwrap_err();

    assert!(matches!(err, CaucusError::InputUnavailable(_)));
    assert_eq!(err.status_code(), "INPUT_UNAVAILABLE");
    assert_eq!(service.store().count().unwrap(), 3);
}

#[test]
fn test_fewer_legislators_than_clusters_can_fail() {
    let mut project = TestProject::new();
    project.settings.clustering.when_fewer_rows = FewerRowsPolicy::Fail;
    project.write_votes(SCENARIO);

    let err = project.service().refresh().unwrap_err();
    assert!(matches!(
        err,
        CaucusError::Analysis(AnalysisError::DegenerateMatrix {
            rows: 3,
            required: 5,
            ..
        })
    ));
}

#[test]
fn test_placeholder_similarity_stays_in_range() {
    let mut project = TestProject::new();
    project.settings.analysis.similarity = SimilarityMode::Placeholder;
    project.write_votes(TWO_BLOCS);

    let service = project.service();
    service.refresh().unwrap();
    let views = service.results().unwrap();

    assert!(
        views
            .iter()
            .all(|v| PLACEHOLDER_RANGE.contains(&v.similarity))
    );
}

#[test]
fn test_summary_covers_every_member() {
    let project = TestProject::new();
    project.write_votes(TWO_BLOCS);

    let service = project.service();
    service.refresh().unwrap();
    let summary = service.summary().unwrap();

    assert_eq!(summary.iter().map(|c| c.members).sum::<usize>(), 8);
    let greens: usize = summary
        .iter()
        .filter_map(|c| c.parties.get("Green"))
        .sum();
    assert_eq!(greens, 2);
}
