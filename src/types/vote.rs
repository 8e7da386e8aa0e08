//! Vote events and legislator identity as delivered by the data-access layer.

use super::{BillId, LegislatorId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recognised vote position.
///
/// "Did not vote" has no variant: it is the absence of a record and ends up
/// as `0.0` in the vote matrix, exactly like `Abstain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePosition {
    Agree,
    Disagree,
    Abstain,
}

impl VotePosition {
    /// Numeric encoding used as the matrix cell value.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Agree => 1.0,
            Self::Disagree => -1.0,
            Self::Abstain => 0.0,
        }
    }

    /// Parse a raw position string, returning `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl FromStr for VotePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agree" => Ok(Self::Agree),
            "disagree" => Ok(Self::Disagree),
            "abstain" => Ok(Self::Abstain),
            other => Err(format!("unrecognised vote position '{other}'")),
        }
    }
}

impl fmt::Display for VotePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Agree => "agree",
            Self::Disagree => "disagree",
            Self::Abstain => "abstain",
        };
        f.write_str(s)
    }
}

/// One cast vote of one legislator on one bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub legislator_id: LegislatorId,
    pub bill_id: BillId,
    pub position: VotePosition,
}

impl VoteRecord {
    pub fn new(
        legislator_id: impl Into<LegislatorId>,
        bill_id: impl Into<BillId>,
        position: VotePosition,
    ) -> Self {
        Self {
            legislator_id: legislator_id.into(),
            bill_id: bill_id.into(),
            position,
        }
    }
}

/// Joined row of the member registry and the vote table.
///
/// `position` is kept raw: the registry may hold nulls or spellings the
/// matrix builder does not understand, and those rows are dropped there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRow {
    pub legislator_id: LegislatorId,
    pub name: String,
    pub party: String,
    pub bill_id: BillId,
    pub position: Option<String>,
}

impl VoteRow {
    /// Convert into a [`VoteRecord`] if the position is recognised.
    pub fn to_record(&self) -> Option<VoteRecord> {
        let position = VotePosition::parse(self.position.as_deref()?)?;
        Some(VoteRecord {
            legislator_id: self.legislator_id.clone(),
            bill_id: self.bill_id.clone(),
            position,
        })
    }

    pub fn legislator(&self) -> Legislator {
        Legislator {
            id: self.legislator_id.clone(),
            name: self.name.clone(),
            party: self.party.clone(),
        }
    }
}

/// Display identity of a legislator. Never mutated by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legislator {
    pub id: LegislatorId,
    pub name: String,
    pub party: String,
}
