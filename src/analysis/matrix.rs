//! Dense legislator x bill vote matrix.
//!
//! Rows and columns are ordered by first appearance in the input. The matrix
//! owns its row index, so every consumer that needs to map a row back to a
//! legislator does so through [`VoteMatrix::legislator_ids`] rather than by
//! assuming an ordering of its own.

use crate::types::{BillId, LegislatorId, VoteRecord, VoteRow};
use std::collections::HashMap;

/// Row-major `f64` matrix of vote weights with its row and column index.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteMatrix {
    legislator_ids: Vec<LegislatorId>,
    bill_ids: Vec<BillId>,
    values: Vec<f64>,
}

impl VoteMatrix {
    /// An empty 0 x 0 matrix.
    pub fn empty() -> Self {
        Self {
            legislator_ids: Vec::new(),
            bill_ids: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from recognised vote records.
    ///
    /// For a repeated `(legislator, bill)` pair the first record wins.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VoteRecord>,
    {
        let mut row_of: HashMap<&LegislatorId, usize> = HashMap::new();
        let mut col_of: HashMap<&BillId, usize> = HashMap::new();
        let mut legislator_ids = Vec::new();
        let mut bill_ids = Vec::new();
        let mut cells: HashMap<(usize, usize), f64> = HashMap::new();

        for record in records {
            let row = *row_of.entry(&record.legislator_id).or_insert_with(|| {
                legislator_ids.push(record.legislator_id.clone());
                legislator_ids.len() - 1
            });
            let col = *col_of.entry(&record.bill_id).or_insert_with(|| {
                bill_ids.push(record.bill_id.clone());
                bill_ids.len() - 1
            });
            cells
                .entry((row, col))
                .or_insert_with(|| record.position.weight());
        }

        let width = bill_ids.len();
        let mut values = vec![0.0; legislator_ids.len() * width];
        for ((row, col), value) in cells {
            values[row * width + col] = value;
        }

        Self {
            legislator_ids,
            bill_ids,
            values,
        }
    }

    /// Build from joined registry rows, dropping null or unrecognised positions.
    pub fn from_rows(rows: &[VoteRow]) -> Self {
        let records: Vec<VoteRecord> = rows.iter().filter_map(VoteRow::to_record).collect();
        Self::from_records(&records)
    }

    /// Build directly from dense rows. Used by tests and benches.
    ///
    /// # Panics
    /// Panics if the rows have differing lengths or the id counts do not match.
    pub fn from_dense(
        legislator_ids: Vec<LegislatorId>,
        bill_ids: Vec<BillId>,
        rows: Vec<Vec<f64>>,
    ) -> Self {
        assert_eq!(legislator_ids.len(), rows.len(), "one id per row");
        assert!(
            rows.iter().all(|r| r.len() == bill_ids.len()),
            "every row needs one value per bill"
        );
        Self {
            legislator_ids,
            bill_ids,
            values: rows.into_iter().flatten().collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legislator_ids.is_empty()
    }

    /// Number of legislators.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.legislator_ids.len()
    }

    /// Number of bills.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.bill_ids.len()
    }

    pub fn legislator_ids(&self) -> &[LegislatorId] {
        &self.legislator_ids
    }

    pub fn bill_ids(&self) -> &[BillId] {
        &self.bill_ids
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.columns();
        &self.values[index * width..(index + 1) * width]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows()).map(move |i| self.row(i))
    }

    /// Cell lookup by identifiers.
    pub fn get(&self, legislator: &LegislatorId, bill: &BillId) -> Option<f64> {
        let row = self.legislator_ids.iter().position(|id| id == legislator)?;
        let col = self.bill_ids.iter().position(|id| id == bill)?;
        Some(self.values[row * self.columns() + col])
    }

    /// Row index of a legislator.
    pub fn row_of(&self, legislator: &LegislatorId) -> Option<usize> {
        self.legislator_ids.iter().position(|id| id == legislator)
    }

    /// Per-column mean.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.columns()];
        if self.is_empty() {
            return means;
        }
        for row in self.iter_rows() {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        let n = self.rows() as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }

    /// Copy of the values with each column's mean subtracted.
    pub fn centered(&self) -> Vec<Vec<f64>> {
        let means = self.column_means();
        self.iter_rows()
            .map(|row| row.iter().zip(&means).map(|(v, m)| v - m).collect())
            .collect()
    }

    /// Number of distinct rows.
    pub fn distinct_rows(&self) -> usize {
        let mut seen: Vec<&[f64]> = Vec::new();
        for row in self.iter_rows() {
            if !seen.contains(&row) {
                seen.push(row);
            }
        }
        seen.len()
    }
}
