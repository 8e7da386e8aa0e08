//! Refresh orchestration: source -> matrix -> analysis -> store.

use crate::analysis::{self, EMBEDDING_COMPONENTS, VoteMatrix};
use crate::config::{ConcurrentRefresh, Settings};
use crate::error::{CaucusError, CaucusResult};
use crate::source::{LegislatorDirectory, VoteSource};
use crate::storage::{
    ClusterSummary, ClusteringResult, ClusteringView, ResultReader, ResultStore, RunMetadata,
    StorageError, StoreWriter,
};
use chrono::NaiveDate;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// What a refresh did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The source had no usable votes; stored results were not touched.
    NoData,
    Completed(RefreshSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub legislators: usize,
    pub bills: usize,
    pub clusters: usize,
    pub degenerate: bool,
    pub explained_variance: [f64; EMBEDDING_COMPONENTS],
    pub model_version: String,
    pub computed_at: NaiveDate,
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "No data available"),
            Self::Completed(summary) => {
                write!(
                    f,
                    "Clustered {} legislators over {} bills into {} clusters ({:.1}% variance in view)",
                    summary.legislators,
                    summary.bills,
                    summary.clusters,
                    summary.explained_variance.iter().sum::<f64>() * 100.0
                )?;
                if summary.degenerate {
                    write!(f, "\nWarning: embedding was zero padded")?;
                }
                Ok(())
            }
        }
    }
}

/// Runs refreshes against one result store and serves its contents.
pub struct ClusteringService {
    settings: Settings,
    source: Arc<dyn VoteSource>,
    directory: Arc<dyn LegislatorDirectory>,
    store: ResultStore,
    gate: Mutex<()>,
    run_date: Option<NaiveDate>,
}

impl ClusteringService {
    pub fn new(
        settings: Settings,
        source: Arc<dyn VoteSource>,
        directory: Arc<dyn LegislatorDirectory>,
        store: ResultStore,
    ) -> CaucusResult<Self> {
        settings
            .validate()
            .map_err(|reason| CaucusError::Config { reason })?;

        Ok(Self {
            settings,
            source,
            directory,
            store,
            gate: Mutex::new(()),
            run_date: None,
        })
    }

    /// Stamp results with `date` instead of today's local date.
    pub fn with_run_date(mut self, date: NaiveDate) -> Self {
        self.run_date = Some(date);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Recompute every legislator's placement and replace the stored set.
    pub fn refresh(&self) -> CaucusResult<RefreshOutcome> {
        let _gate = self.acquire_gate()?;
        let writer = self.acquire_writer()?;
        let started = Instant::now();
        tracing::info!("refresh started");

        let rows = self.source.fetch_votes()?;
        let matrix = VoteMatrix::from_rows(&rows);
        tracing::debug!(
            rows = rows.len(),
            legislators = matrix.rows(),
            bills = matrix.columns(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vote matrix built"
        );

        if matrix.is_empty() {
            tracing::info!("no votes available, keeping stored results");
            return Ok(RefreshOutcome::NoData);
        }

        let analysis = analysis::analyze(&matrix, &self.settings.analysis_options())?;
        tracing::debug!(
            iterations = analysis.iterations,
            inertia = analysis.inertia,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis finished"
        );

        let computed_at = self
            .run_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let model_version = self.settings.model_version.clone();

        let results: Vec<ClusteringResult> = analysis
            .placements
            .iter()
            .map(|placement| {
                ClusteringResult::from_placement(placement, &model_version, computed_at)
            })
            .collect();

        let metadata = RunMetadata {
            model_version: model_version.clone(),
            computed_at,
            legislators: results.len(),
            clusters: analysis.effective_k,
            degenerate: analysis.degenerate,
            explained_variance: analysis.explained_variance_ratio,
        };

        writer
            .replace(&results, &metadata)
            .map_err(CaucusError::PersistenceFailure)?;

        tracing::info!(
            legislators = results.len(),
            clusters = analysis.effective_k,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "refresh completed"
        );

        Ok(RefreshOutcome::Completed(RefreshSummary {
            legislators: results.len(),
            bills: matrix.columns(),
            clusters: analysis.effective_k,
            degenerate: analysis.degenerate,
            explained_variance: analysis.explained_variance_ratio,
            model_version,
            computed_at,
        }))
    }

    /// Stored results ordered by cluster, then similarity descending.
    pub fn results(&self) -> CaucusResult<Vec<ClusteringView>> {
        Ok(self.reader().list_results()?)
    }

    pub fn summary(&self) -> CaucusResult<Vec<ClusterSummary>> {
        Ok(self.reader().summary()?)
    }

    pub fn last_run(&self) -> CaucusResult<Option<RunMetadata>> {
        Ok(self.store.metadata()?)
    }

    fn reader(&self) -> ResultReader<'_, dyn LegislatorDirectory> {
        ResultReader::new(&self.store, self.directory.as_ref())
    }

    fn acquire_gate(&self) -> CaucusResult<MutexGuard<'_, ()>> {
        match self.settings.refresh.concurrent {
            ConcurrentRefresh::Reject => {
                self.gate.try_lock().ok_or(CaucusError::RefreshInProgress)
            }
            ConcurrentRefresh::Wait => Ok(self.gate.lock()),
        }
    }

    /// The store lock covers refreshes running in other processes.
    fn acquire_writer(&self) -> CaucusResult<StoreWriter<'_>> {
        let writer = match self.settings.refresh.concurrent {
            ConcurrentRefresh::Reject => self.store.writer(),
            ConcurrentRefresh::Wait => self.store.wait_for_writer(),
        };
        writer.map_err(|e| match e {
            StorageError::WriterBusy => CaucusError::RefreshInProgress,
            other => CaucusError::Store(other),
        })
    }
}
