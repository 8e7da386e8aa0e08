//! Where vote rows and legislator identities come from.
//!
//! The pipeline only sees the [`VoteSource`] and [`LegislatorDirectory`]
//! traits. A JSON file backs the CLI; tests use the in-memory source.

mod json;
mod memory;

pub use json::{JsonVoteSource, VoteFile, VoteEntry};
pub use memory::InMemoryVoteSource;

use crate::types::{Legislator, LegislatorId, VoteRow};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read vote file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse vote file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Supplies joined legislator/vote rows. Rows with a null position are
/// never returned.
pub trait VoteSource: Send + Sync {
    fn fetch_votes(&self) -> Result<Vec<VoteRow>, SourceError>;
}

/// Read-only lookup of display identity by legislator id.
pub trait LegislatorDirectory: Send + Sync {
    fn legislator(&self, id: &LegislatorId) -> Option<Legislator>;

    /// Number of known legislators.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Map-backed [`LegislatorDirectory`].
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: HashMap<LegislatorId, Legislator>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries with the same id replace earlier ones.
    pub fn insert(&mut self, legislator: Legislator) {
        self.members.insert(legislator.id.clone(), legislator);
    }

    /// Collect identities from joined rows.
    pub fn from_rows(rows: &[VoteRow]) -> Self {
        rows.iter().map(VoteRow::legislator).collect()
    }
}

impl FromIterator<Legislator> for Roster {
    fn from_iter<I: IntoIterator<Item = Legislator>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for legislator in iter {
            roster.insert(legislator);
        }
        roster
    }
}

impl LegislatorDirectory for Roster {
    fn legislator(&self, id: &LegislatorId) -> Option<Legislator> {
        self.members.get(id).cloned()
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}
