//! Read side: stored results joined with legislator identity.

use super::error::StorageResult;
use super::results::{ClusteringResult, ResultStore};
use crate::source::LegislatorDirectory;
use crate::types::{ClusterId, LegislatorId};
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A stored result with the legislator's display identity attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringView {
    pub id: String,
    pub legislator_id: LegislatorId,
    pub name: String,
    pub party: String,
    pub cluster_id: ClusterId,
    pub x: f64,
    pub y: f64,
    pub similarity: f64,
    pub model_version: String,
    pub computed_at: NaiveDate,
}

impl fmt::Display for ClusteringView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) {:.3} at ({:.3}, {:.3})",
            self.cluster_id, self.name, self.party, self.similarity, self.x, self.y
        )
    }
}

/// Per-cluster aggregate of the current result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: ClusterId,
    pub members: usize,
    pub mean_similarity: f64,
    /// Party name to member count.
    pub parties: BTreeMap<String, usize>,
}

impl fmt::Display for ClusterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parties = self
            .parties
            .iter()
            .map(|(party, count)| format!("{party}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "cluster {}: {} members, mean similarity {:.3} ({parties})",
            self.cluster_id, self.members, self.mean_similarity
        )
    }
}

/// Orders views by cluster, most similar first, then legislator id.
pub fn view_order(a: &ClusteringView, b: &ClusteringView) -> Ordering {
    a.cluster_id
        .cmp(&b.cluster_id)
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.legislator_id.cmp(&b.legislator_id))
}

pub struct ResultReader<'a, D: LegislatorDirectory + ?Sized> {
    store: &'a ResultStore,
    directory: &'a D,
}

impl<'a, D: LegislatorDirectory + ?Sized> ResultReader<'a, D> {
    pub fn new(store: &'a ResultStore, directory: &'a D) -> Self {
        Self { store, directory }
    }

    /// Current results, ordered by [`view_order`].
    ///
    /// Results whose legislator the directory does not know are left out.
    pub fn list_results(&self) -> StorageResult<Vec<ClusteringView>> {
        let snapshot = self.store.snapshot()?;
        let stored = snapshot.len();

        let mut views: Vec<ClusteringView> = snapshot
            .into_iter()
            .filter_map(|result| self.join(result))
            .collect();
        views.sort_by(view_order);

        if views.len() < stored {
            tracing::debug!(
                stored,
                joined = views.len(),
                "dropped results for legislators missing from the directory"
            );
        }
        Ok(views)
    }

    /// Member count, mean similarity and party mix per cluster.
    pub fn summary(&self) -> StorageResult<Vec<ClusterSummary>> {
        let mut clusters: BTreeMap<ClusterId, (usize, f64, BTreeMap<String, usize>)> =
            BTreeMap::new();

        for view in self.list_results()? {
            let (members, similarity, parties) = clusters.entry(view.cluster_id).or_default();
            *members += 1;
            *similarity += view.similarity;
            *parties.entry(view.party).or_insert(0) += 1;
        }

        Ok(clusters
            .into_iter()
            .map(|(cluster_id, (members, similarity, parties))| ClusterSummary {
                cluster_id,
                members,
                mean_similarity: similarity / members as f64,
                parties,
            })
            .collect())
    }

    fn join(&self, result: ClusteringResult) -> Option<ClusteringView> {
        let legislator = self.directory.legislator(&result.legislator_id)?;
        Some(ClusteringView {
            id: result.id,
            legislator_id: result.legislator_id,
            name: legislator.name,
            party: legislator.party,
            cluster_id: result.cluster_id,
            x: result.x,
            y: result.y,
            similarity: result.similarity,
            model_version: result.model_version,
            computed_at: result.computed_at,
        })
    }
}
