use super::{Roster, SourceError, VoteSource};
use crate::types::{BillId, Legislator, LegislatorId, VoteRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk shape of a vote file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteFile {
    #[serde(default)]
    pub legislators: Vec<Legislator>,
    #[serde(default)]
    pub votes: Vec<VoteEntry>,
}

/// One cast vote. `position` may be null or an unrecognised string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEntry {
    pub legislator_id: LegislatorId,
    pub bill_id: BillId,
    #[serde(default)]
    pub position: Option<String>,
}

impl VoteFile {
    /// Legislators joined with their votes, skipping null positions.
    ///
    /// Row order follows the legislator list, then vote order within each
    /// legislator. Votes cast by ids missing from the legislator list are
    /// not returned.
    pub fn joined_rows(&self) -> Vec<VoteRow> {
        let mut by_legislator: HashMap<&LegislatorId, Vec<&VoteEntry>> = HashMap::new();
        for vote in &self.votes {
            by_legislator.entry(&vote.legislator_id).or_default().push(vote);
        }

        self.legislators
            .iter()
            .flat_map(|legislator| {
                by_legislator
                    .get(&legislator.id)
                    .into_iter()
                    .flatten()
                    .filter(|vote| vote.position.is_some())
                    .map(move |vote| VoteRow {
                        legislator_id: legislator.id.clone(),
                        name: legislator.name.clone(),
                        party: legislator.party.clone(),
                        bill_id: vote.bill_id.clone(),
                        position: vote.position.clone(),
                    })
            })
            .collect()
    }

    pub fn roster(&self) -> Roster {
        self.legislators.iter().cloned().collect()
    }
}

/// [`VoteSource`] reading a [`VoteFile`] on every fetch.
#[derive(Debug, Clone)]
pub struct JsonVoteSource {
    path: PathBuf,
}

impl JsonVoteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<VoteFile, SourceError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl VoteSource for JsonVoteSource {
    fn fetch_votes(&self) -> Result<Vec<VoteRow>, SourceError> {
        let file = self.load()?;
        tracing::debug!(
            path = %self.path.display(),
            legislators = file.legislators.len(),
            votes = file.votes.len(),
            "loaded vote file"
        );
        Ok(file.joined_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LegislatorDirectory;
    use std::fs;
    use tempfile::TempDir;

    const FILE: &str = r#"{
        "legislators": [
            {"id": "A", "name": "Alice", "party": "Blue"},
            {"id": "B", "name": "Bob", "party": "Red"},
            {"id": "Q", "name": "Quiet", "party": "Green"}
        ],
        "votes": [
            {"legislator_id": "B", "bill_id": "X", "position": "agree"},
            {"legislator_id": "A", "bill_id": "X", "position": "agree"},
            {"legislator_id": "A", "bill_id": "Y", "position": null},
            {"legislator_id": "Z", "bill_id": "X", "position": "agree"}
        ]
    }"#;

    #[test]
    fn test_join_skips_nulls_and_unknown_members() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("votes.json");
        fs::write(&path, FILE).unwrap();

        let rows = JsonVoteSource::new(&path).fetch_votes().unwrap();

        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.legislator_id.as_str(), r.bill_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "X"), ("B", "X")]);
        assert_eq!(rows[0].name, "Alice");
    }

    #[test]
    fn test_roster_keeps_silent_members() {
        let file: VoteFile = serde_json::from_str(FILE).unwrap();
        let roster = file.roster();
        assert_eq!(roster.len(), 3);
        assert!(roster.legislator(&"Q".into()).is_some());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = JsonVoteSource::new(temp_dir.path().join("absent.json"));
        assert!(matches!(
            source.fetch_votes(),
            Err(SourceError::Read { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("votes.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonVoteSource::new(&path).fetch_votes(),
            Err(SourceError::Parse { .. })
        ));
    }
}
