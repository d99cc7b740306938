//! Derived display artifacts over the classification output
//!
//! Three pure views that follow the labeled table with no gating of their
//! own: status counts, MA-plot coordinates, and the padj-sorted display
//! table. Memoized on the labeled table's generation stamp.

use serde::{Deserialize, Serialize};

use crate::data::{cmp_padj, GeneRecord, Status};
use crate::report::classify::LabeledTable;

/// Count of genes per status; all three statuses are always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub up: usize,
    pub down: usize,
    pub no_change: usize,
}

impl StatusSummary {
    pub fn from_records(records: &[GeneRecord]) -> Self {
        let mut summary = StatusSummary::default();
        for record in records {
            match record.status {
                Status::Up => summary.up += 1,
                Status::Down => summary.down += 1,
                Status::NoChange => summary.no_change += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.up + self.down + self.no_change
    }

    pub fn count(&self, status: Status) -> usize {
        match status {
            Status::Up => self.up,
            Status::Down => self.down,
            Status::NoChange => self.no_change,
        }
    }

    /// Counts keyed by status, every status present even at zero
    pub fn counts(&self) -> [(Status, usize); 3] {
        [
            (Status::Up, self.up),
            (Status::Down, self.down),
            (Status::NoChange, self.no_change),
        ]
    }
}

impl std::fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Differential expression summary")?;
        writeln!(f, "===============================")?;
        writeln!(f, "Total genes: {}", self.total())?;
        writeln!(f, "  Up:        {}", self.up)?;
        writeln!(f, "  Down:      {}", self.down)?;
        writeln!(f, "  NoChange:  {}", self.no_change)?;
        Ok(())
    }
}

/// One MA-plot point: abundance vs effect size, flagged when the gene is
/// differentially expressed under the committed thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub log_cpm: f64,
    pub log_fc: f64,
    pub is_de: bool,
}

/// Memoized derived artifacts
#[derive(Debug)]
pub struct DerivedArtifacts {
    last_generation: u64,
    summary: StatusSummary,
    scatter: Vec<ScatterPoint>,
    sorted: Vec<GeneRecord>,
}

impl DerivedArtifacts {
    pub fn new(labeled: &LabeledTable) -> Self {
        let mut artifacts = Self {
            last_generation: labeled.generation(),
            summary: StatusSummary::default(),
            scatter: Vec::new(),
            sorted: Vec::new(),
        };
        artifacts.compute(labeled);
        artifacts
    }

    fn compute(&mut self, labeled: &LabeledTable) {
        let records = labeled.records();
        self.summary = StatusSummary::from_records(records);
        self.scatter = records
            .iter()
            .map(|r| ScatterPoint {
                log_cpm: r.log_cpm,
                log_fc: r.log_fc,
                is_de: r.status != Status::NoChange,
            })
            .collect();
        // Stable sort: padj ties keep base-table order, NaN last
        self.sorted = records.to_vec();
        self.sorted.sort_by(|a, b| cmp_padj(a.padj, b.padj));
    }

    /// Recompute whenever the classification output generation changed
    pub fn refresh(&mut self, labeled: &LabeledTable) {
        if labeled.generation() == self.last_generation {
            return;
        }
        self.compute(labeled);
        self.last_generation = labeled.generation();
    }

    pub fn summary(&self) -> &StatusSummary {
        &self.summary
    }

    /// MA-plot coordinates, in base-table record order
    pub fn scatter(&self) -> &[ScatterPoint] {
        &self.scatter
    }

    /// Labeled records re-sorted by adjusted p-value ascending
    pub fn sorted_table(&self) -> &[GeneRecord] {
        &self.sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneRecord, GeneTable};
    use crate::report::classify::ClassifyStage;
    use crate::report::params::{ParameterStore, Stage};

    fn labeled() -> (GeneTable, ParameterStore, ClassifyStage) {
        let base = GeneTable::new(vec![
            GeneRecord::new("up", 2.0, 6.0, 0.001, 0.01),
            GeneRecord::new("down", -2.0, 6.0, 0.002, 0.02),
            GeneRecord::new("flat", 0.1, 6.0, 0.9, 0.95),
        ])
        .unwrap();
        let store = ParameterStore::new();
        let stage = ClassifyStage::new(&base, &store);
        (base, store, stage)
    }

    #[test]
    fn test_summary_counts_sum_to_total() {
        let (_, _, stage) = labeled();
        let artifacts = DerivedArtifacts::new(stage.output());
        let summary = artifacts.summary();
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.up, 1);
        assert_eq!(summary.down, 1);
        assert_eq!(summary.no_change, 1);
        let sum: usize = summary.counts().iter().map(|(_, c)| c).sum();
        assert_eq!(sum, summary.total());
    }

    #[test]
    fn test_all_statuses_present_even_at_zero() {
        let base = GeneTable::new(vec![GeneRecord::new("flat", 0.0, 6.0, 0.9, 0.95)]).unwrap();
        let store = ParameterStore::new();
        let stage = ClassifyStage::new(&base, &store);
        let artifacts = DerivedArtifacts::new(stage.output());
        let counts = artifacts.summary().counts();
        assert_eq!(counts.len(), 3);
        assert_eq!(artifacts.summary().count(Status::Up), 0);
        assert_eq!(artifacts.summary().count(Status::NoChange), 1);
    }

    #[test]
    fn test_scatter_preserves_order_and_flags() {
        let (_, _, stage) = labeled();
        let artifacts = DerivedArtifacts::new(stage.output());
        let scatter = artifacts.scatter();
        assert_eq!(scatter.len(), 3);
        assert!(scatter[0].is_de);
        assert!(scatter[1].is_de);
        assert!(!scatter[2].is_de);
        assert_eq!(scatter[0].log_fc, 2.0);
    }

    #[test]
    fn test_sorted_table_stable_with_ties_and_nan_last() {
        let base = GeneTable::new(vec![
            GeneRecord::new("a", 1.0, 6.0, 0.01, 0.05),
            GeneRecord::new("b", 1.0, 6.0, 0.01, 0.05),
            GeneRecord::new("c", 1.0, 6.0, 0.001, 0.01),
            GeneRecord::new("d", 1.0, 6.0, f64::NAN, f64::NAN),
        ])
        .unwrap();
        let store = ParameterStore::new();
        let stage = ClassifyStage::new(&base, &store);
        let artifacts = DerivedArtifacts::new(stage.output());
        let ids: Vec<&str> = artifacts.sorted_table().iter().map(|r| r.id.as_str()).collect();
        // a before b: tie keeps base order; NaN sorts last
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_refresh_follows_generation() {
        let (base, mut store, mut stage) = labeled();
        let mut artifacts = DerivedArtifacts::new(stage.output());
        assert_eq!(artifacts.summary().up, 1);

        store.live_thresholds_mut().fdr = 0.001;
        store.commit(Stage::Classification).unwrap();
        stage.refresh(&base, &store);
        artifacts.refresh(stage.output());
        assert_eq!(artifacts.summary().up, 0);
    }
}
