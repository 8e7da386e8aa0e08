//! Table formatting utilities for structured output.

use crate::storage::{ClusterSummary, ClusteringView, RunMetadata};
use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Add a row of pre-styled cells.
    pub fn add_cells(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// One row per legislator, in the order given.
pub fn create_results_table(views: &[ClusteringView]) -> String {
    let mut table = TableBuilder::new().set_headers(vec![
        "Cluster",
        "Legislator",
        "Party",
        "Similarity",
        "X",
        "Y",
    ]);

    for view in views {
        let similarity =
            Cell::new(format!("{:.3}", view.similarity)).fg(similarity_color(view.similarity));
        table = table.add_cells(vec![
            Cell::new(view.cluster_id).add_attribute(Attribute::Bold),
            Cell::new(&view.name),
            Cell::new(&view.party),
            similarity,
            Cell::new(format!("{:.3}", view.x)),
            Cell::new(format!("{:.3}", view.y)),
        ]);
    }

    table.build()
}

/// One row per cluster with its party breakdown.
pub fn create_summary_table(clusters: &[ClusterSummary], run: Option<&RunMetadata>) -> String {
    let mut table = TableBuilder::new().set_headers(vec![
        "Cluster",
        "Members",
        "Mean similarity",
        "Parties",
    ]);

    for cluster in clusters {
        let parties = cluster
            .parties
            .iter()
            .map(|(party, count)| format!("{party} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        table = table.add_row(vec![
            cluster.cluster_id.to_string(),
            cluster.members.to_string(),
            format!("{:.3}", cluster.mean_similarity),
            parties,
        ]);
    }

    let mut rendered = table.build();
    if let Some(run) = run {
        rendered.push_str(&format!(
            "\nModel {} computed {} ({} legislators, {} clusters{})",
            run.model_version,
            run.computed_at,
            run.legislators,
            run.clusters,
            if run.degenerate { ", zero padded" } else { "" }
        ));
    }
    rendered
}

fn similarity_color(similarity: f64) -> Color {
    if similarity >= 0.75 {
        Color::Green
    } else if similarity >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}
