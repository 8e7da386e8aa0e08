use super::{SourceError, VoteSource};
use crate::types::VoteRow;
use parking_lot::RwLock;

/// [`VoteSource`] over rows held in memory. Rows can be swapped between
/// refreshes.
#[derive(Debug, Default)]
pub struct InMemoryVoteSource {
    rows: RwLock<Vec<VoteRow>>,
}

impl InMemoryVoteSource {
    pub fn new(rows: Vec<VoteRow>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub fn set_rows(&self, rows: Vec<VoteRow>) {
        *self.rows.write() = rows;
    }
}

impl VoteSource for InMemoryVoteSource {
    fn fetch_votes(&self) -> Result<Vec<VoteRow>, SourceError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| row.position.is_some())
            .cloned()
            .collect())
    }
}
