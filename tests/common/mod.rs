#![allow(dead_code)]

use caucus::source::{JsonVoteSource, VoteFile};
use caucus::{ClusteringService, ResultStore, Settings};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Scratch workspace with a vote file and an on-disk result store.
pub struct TestProject {
    pub dir: TempDir,
    pub settings: Settings,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut settings = Settings::default();
        settings.workspace_root = Some(dir.path().to_path_buf());
        settings.store_path = dir.path().join("store");
        settings.source.path = dir.path().join("votes.json");
        Self { dir, settings }
    }

    pub fn write_votes(&self, content: &str) -> PathBuf {
        fs::write(&self.settings.source.path, content).expect("Failed to write vote file");
        self.settings.source.path.clone()
    }

    /// Service over the vote file and store, stamped with a fixed date.
    ///
    /// Each call opens its own handle on the store, like a separate CLI run.
    pub fn service(&self) -> ClusteringService {
        let source = JsonVoteSource::new(&self.settings.source.path);
        let roster = source
            .load()
            .map(|file| file.roster())
            .unwrap_or_else(|_| VoteFile::default().roster());
        let store = ResultStore::open(&self.settings.store_path).expect("Failed to open store");

        ClusteringService::new(
            self.settings.clone(),
            Arc::new(source),
            Arc::new(roster),
            store,
        )
        .expect("Invalid settings")
        .with_run_date(run_date())
    }
}

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 5).expect("valid date")
}

/// Three legislators, two bills: A agrees/disagrees, B agrees twice, C disagrees twice.
pub const SCENARIO: &str = r#"{
    "legislators": [
        {"id": "A", "name": "Avery", "party": "Blue"},
        {"id": "B", "name": "Blake", "party": "Blue"},
        {"id": "C", "name": "Casey", "party": "Red"}
    ],
    "votes": [
        {"legislator_id": "A", "bill_id": "X", "position": "agree"},
        {"legislator_id": "A", "bill_id": "Y", "position": "disagree"},
        {"legislator_id": "B", "bill_id": "X", "position": "agree"},
        {"legislator_id": "B", "bill_id": "Y", "position": "agree"},
        {"legislator_id": "C", "bill_id": "X", "position": "disagree"},
        {"legislator_id": "C", "bill_id": "Y", "position": "disagree"}
    ]
}"#;

/// Two blocs of four voting on six bills, with one defector per bloc.
pub const TWO_BLOCS: &str = r#"{
    "legislators": [
        {"id": "L1", "name": "Lee", "party": "Blue"},
        {"id": "L2", "name": "Lou", "party": "Blue"},
        {"id": "L3", "name": "Lyn", "party": "Blue"},
        {"id": "L4", "name": "Liv", "party": "Green"},
        {"id": "R1", "name": "Ray", "party": "Red"},
        {"id": "R2", "name": "Rex", "party": "Red"},
        {"id": "R3", "name": "Roy", "party": "Red"},
        {"id": "R4", "name": "Ren", "party": "Green"}
    ],
    "votes": [
        {"legislator_id": "L1", "bill_id": "B1", "position": "agree"},
        {"legislator_id": "L1", "bill_id": "B2", "position": "agree"},
        {"legislator_id": "L1", "bill_id": "B3", "position": "disagree"},
        {"legislator_id": "L2", "bill_id": "B1", "position": "agree"},
        {"legislator_id": "L2", "bill_id": "B2", "position": "agree"},
        {"legislator_id": "L2", "bill_id": "B3", "position": "disagree"},
        {"legislator_id": "L3", "bill_id": "B1", "position": "agree"},
        {"legislator_id": "L3", "bill_id": "B2", "position": "abstain"},
        {"legislator_id": "L3", "bill_id": "B3", "position": "disagree"},
        {"legislator_id": "L4", "bill_id": "B1", "position": "agree"},
        {"legislator_id": "L4", "bill_id": "B2", "position": "agree"},
        {"legislator_id": "L4", "bill_id": "B3", "position": "agree"},
        {"legislator_id": "R1", "bill_id": "B1", "position": "disagree"},
        {"legislator_id": "R1", "bill_id": "B2", "position": "disagree"},
        {"legislator_id": "R1", "bill_id": "B3", "position": "agree"},
        {"legislator_id": "R2", "bill_id": "B1", "position": "disagree"},
        {"legislator_id": "R2", "bill_id": "B2", "position": "disagree"},
        {"legislator_id": "R2", "bill_id": "B3", "position": "agree"},
        {"legislator_id": "R3", "bill_id": "B1", "position": "disagree"},
        {"legislator_id": "R3", "bill_id": "B2", "position": null},
        {"legislator_id": "R3", "bill_id": "B3", "position": "agree"},
        {"legislator_id": "R4", "bill_id": "B1", "position": "disagree"},
        {"legislator_id": "R4", "bill_id": "B2", "position": "disagree"},
        {"legislator_id": "R4", "bill_id": "B3", "position": "disagree"}
    ]
}"#;
