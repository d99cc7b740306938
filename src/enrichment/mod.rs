//! Ontology enrichment stage
//!
//! A second gated pipeline over the classification output: genes are
//! reduced to binary DE labels, a probability weighting function corrects
//! for gene length bias, and a category test produces over/under
//! representation p-values. The stage is gated by its own commit counter
//! and is suppressed entirely until that counter first advances.

mod category;
mod methods;
mod pwf;

pub use category::{CategoryInfo, CategoryMap};
pub use methods::StandardEnrichment;
pub use pwf::BinnedPwf;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::Status;
use crate::error::{ExplorerError, Result};
use crate::report::classify::LabeledTable;
use crate::report::params::{ParameterStore, Stage};

/// Reference genome and identifier space the weighting engine is configured
/// against; fixed for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeConfig {
    /// Genome build, e.g. "hg38"
    pub genome: String,
    /// Gene identifier space, e.g. "ensGene"
    pub id_space: String,
}

impl GenomeConfig {
    pub fn new(genome: impl Into<String>, id_space: impl Into<String>) -> Self {
        Self {
            genome: genome.into(),
            id_space: id_space.into(),
        }
    }
}

/// Per-gene bias-correction weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneWeight {
    pub id: String,
    pub de: bool,
    pub length: f64,
    pub weight: f64,
}

/// One point of the length-bias plot: median length and DE proportion of a
/// length bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasPlotPoint {
    pub median_length: f64,
    pub proportion_de: f64,
}

/// Weighting engine output: per-gene weights plus the bias plot bins
#[derive(Debug, Clone)]
pub struct PwfResult {
    pub weights: Vec<GeneWeight>,
    pub bins: Vec<BiasPlotPoint>,
}

/// One row of the enrichment table; the column identities are fixed
/// regardless of which test method ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category: String,
    pub over_represented_pvalue: f64,
    pub under_represented_pvalue: f64,
    pub num_de_in_cat: usize,
    pub num_in_cat: usize,
    pub term: String,
    pub ontology: String,
}

/// Which enrichment test to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentMethod {
    /// Resampling null weighted by the probability weighting function
    Weighted,
    /// Plain hypergeometric test, no bias correction
    Hypergeometric,
}

/// Computes per-gene bias-correction weights from binary DE labels
pub trait BiasWeightingEngine {
    fn weights(
        &self,
        labels: &[(String, bool)],
        lengths: &HashMap<String, f64>,
        config: &GenomeConfig,
    ) -> Result<PwfResult>;
}

/// Tests categories for over/under representation of DE genes
pub trait EnrichmentEngine {
    fn test(
        &self,
        weights: &[GeneWeight],
        method: EnrichmentMethod,
        categories: &CategoryMap,
    ) -> Result<Vec<CategoryRecord>>;
}

/// Everything the enrichment stage needs besides the labeled table
pub struct EnrichmentResources {
    pub lengths: HashMap<String, f64>,
    pub categories: CategoryMap,
    pub genome: GenomeConfig,
    pub weighting: Box<dyn BiasWeightingEngine>,
    pub enrichment: Box<dyn EnrichmentEngine>,
}

impl EnrichmentResources {
    /// Resources with the reference engines
    pub fn new(
        lengths: HashMap<String, f64>,
        categories: CategoryMap,
        genome: GenomeConfig,
    ) -> Self {
        Self {
            lengths,
            categories,
            genome,
            weighting: Box::new(BinnedPwf::default()),
            enrichment: Box::new(StandardEnrichment::default()),
        }
    }
}

/// Results of one enrichment pass
#[derive(Debug, Clone)]
pub struct EnrichmentOutput {
    pub weights: Vec<GeneWeight>,
    pub bias_plot: Vec<BiasPlotPoint>,
    pub table: Vec<CategoryRecord>,
}

/// Stage state: `Unrun` is the "never computed" sentinel, distinct from a
/// run that produced an empty table
#[derive(Debug, Clone)]
pub enum EnrichmentState {
    Unrun,
    Ready(EnrichmentOutput),
}

impl EnrichmentState {
    pub fn is_unrun(&self) -> bool {
        matches!(self, EnrichmentState::Unrun)
    }

    /// The output, when the stage has run at least once
    pub fn output(&self) -> Option<&EnrichmentOutput> {
        match self {
            EnrichmentState::Unrun => None,
            EnrichmentState::Ready(output) => Some(output),
        }
    }
}

/// Memoized, counter-gated enrichment stage
///
/// Counter 0 leaves the stage `Unrun` and invokes no engine. The first
/// commit transitions to `Ready`; later commits refresh both sub-results
/// (weights and table) together, even when only the method flag changed.
/// On engine failure the stamp still advances, the previous `Ready` output
/// is retained, and the error is surfaced to the caller.
pub struct EnrichmentStage {
    last_commit: u64,
    state: EnrichmentState,
}

impl Default for EnrichmentStage {
    fn default() -> Self {
        Self::new()
    }
}

impl EnrichmentStage {
    pub fn new() -> Self {
        Self {
            last_commit: 0,
            state: EnrichmentState::Unrun,
        }
    }

    pub fn state(&self) -> &EnrichmentState {
        &self.state
    }

    /// Recompute if and only if the enrichment commit counter has advanced
    /// past the last processed value (and at least one commit happened)
    pub fn refresh(
        &mut self,
        labeled: &LabeledTable,
        store: &ParameterStore,
        resources: &EnrichmentResources,
    ) -> Result<()> {
        let counter = store.commits(Stage::Enrichment);
        if counter == 0 || counter == self.last_commit {
            return Ok(());
        }
        self.last_commit = counter;

        match Self::compute(labeled, store, resources) {
            Ok(output) => {
                self.state = EnrichmentState::Ready(output);
                Ok(())
            }
            Err(e) => {
                log::warn!("enrichment pass failed, keeping previous results: {}", e);
                Err(ExplorerError::computation("enrichment", e))
            }
        }
    }

    fn compute(
        labeled: &LabeledTable,
        store: &ParameterStore,
        resources: &EnrichmentResources,
    ) -> Result<EnrichmentOutput> {
        let labels: Vec<(String, bool)> = labeled
            .records()
            .iter()
            .map(|r| (r.id.clone(), r.status != Status::NoChange))
            .collect();

        let pwf = resources
            .weighting
            .weights(&labels, &resources.lengths, &resources.genome)?;

        let method = if store.committed_enrichment().length_bias_correction {
            EnrichmentMethod::Weighted
        } else {
            EnrichmentMethod::Hypergeometric
        };
        let table = resources
            .enrichment
            .test(&pwf.weights, method, &resources.categories)?;

        Ok(EnrichmentOutput {
            weights: pwf.weights,
            bias_plot: pwf.bins,
            table,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneRecord, GeneTable};
    use crate::report::classify::ClassifyStage;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Weighting probe that counts calls; the count proves the first-pass
    /// skip never reaches an engine
    struct CountingWeighting {
        calls: Rc<Cell<usize>>,
        inner: BinnedPwf,
    }

    impl BiasWeightingEngine for CountingWeighting {
        fn weights(
            &self,
            labels: &[(String, bool)],
            lengths: &HashMap<String, f64>,
            config: &GenomeConfig,
        ) -> Result<PwfResult> {
            self.calls.set(self.calls.get() + 1);
            self.inner.weights(labels, lengths, config)
        }
    }

    struct FailingEnrichment;

    impl EnrichmentEngine for FailingEnrichment {
        fn test(
            &self,
            _weights: &[GeneWeight],
            _method: EnrichmentMethod,
            _categories: &CategoryMap,
        ) -> Result<Vec<CategoryRecord>> {
            Err(ExplorerError::computation("enrichment-test", "engine down"))
        }
    }

    fn fixture() -> (GeneTable, ParameterStore, EnrichmentResources, Rc<Cell<usize>>) {
        // 8 genes, first 3 DE under the defaults
        let mut records = Vec::new();
        for i in 0..8 {
            let (log_fc, padj) = if i < 3 { (3.0, 0.001) } else { (0.0, 0.9) };
            records.push(GeneRecord::new(format!("g{}", i), log_fc, 6.0, padj, padj));
        }
        let base = GeneTable::new(records).unwrap();

        let lengths: HashMap<String, f64> =
            (0..8).map(|i| (format!("g{}", i), 500.0 + i as f64 * 250.0)).collect();
        let mut categories = CategoryMap::new();
        for i in 0..3 {
            categories.add(format!("g{}", i), "GO:de", "stress response", "BP");
        }
        for i in 3..8 {
            categories.add(format!("g{}", i), "GO:rest", "membrane", "CC");
        }
        let mut resources = EnrichmentResources::new(
            lengths,
            categories,
            GenomeConfig::new("hg38", "ensGene"),
        );
        let calls = Rc::new(Cell::new(0));
        resources.weighting = Box::new(CountingWeighting {
            calls: Rc::clone(&calls),
            inner: BinnedPwf::new(4),
        });
        resources.enrichment = Box::new(StandardEnrichment::new(200, 11));

        (base, ParameterStore::new(), resources, calls)
    }

    #[test]
    fn test_unrun_at_counter_zero_invokes_nothing() {
        let (base, store, resources, calls) = fixture();
        let classify = ClassifyStage::new(&base, &store);
        let mut stage = EnrichmentStage::new();

        stage.refresh(classify.output(), &store, &resources).unwrap();
        assert!(stage.state().is_unrun());
        assert_eq!(calls.get(), 0, "no engine call before the first commit");
    }

    #[test]
    fn test_unrun_to_ready_once_then_never_back() {
        let (base, mut store, resources, calls) = fixture();
        let classify = ClassifyStage::new(&base, &store);
        let mut stage = EnrichmentStage::new();

        store.commit(Stage::Enrichment).unwrap();
        stage.refresh(classify.output(), &store, &resources).unwrap();
        assert!(!stage.state().is_unrun());
        assert_eq!(calls.get(), 1);
        let output = stage.state().output().unwrap();
        assert!(!output.weights.is_empty());
        assert!(!output.bias_plot.is_empty());
        assert!(!output.table.is_empty());

        // further refreshes without commits never revert to Unrun, and
        // recompute nothing
        stage.refresh(classify.output(), &store, &resources).unwrap();
        assert!(!stage.state().is_unrun());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_flag_only_recommit_refreshes_both_subresults() {
        let (base, mut store, resources, calls) = fixture();
        let classify = ClassifyStage::new(&base, &store);
        let mut stage = EnrichmentStage::new();

        store.commit(Stage::Enrichment).unwrap();
        stage.refresh(classify.output(), &store, &resources).unwrap();
        let first = stage.state().output().unwrap().table.clone();

        // only the method flag changes; labels are identical
        store.live_enrichment_mut().length_bias_correction = false;
        store.commit(Stage::Enrichment).unwrap();
        stage.refresh(classify.output(), &store, &resources).unwrap();
        let second = stage.state().output().unwrap().table.clone();

        // both sub-results recomputed: the weighting engine ran again
        assert_eq!(calls.get(), 2);
        // hypergeometric and resampled p-values differ
        assert_ne!(
            first[0].over_represented_pvalue,
            second[0].over_represented_pvalue
        );
        // fixed output schema either way
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_failure_retains_previous_output() {
        let (base, mut store, mut resources, _calls) = fixture();
        let classify = ClassifyStage::new(&base, &store);
        let mut stage = EnrichmentStage::new();

        store.commit(Stage::Enrichment).unwrap();
        stage.refresh(classify.output(), &store, &resources).unwrap();
        let good_table = stage.state().output().unwrap().table.clone();

        resources.enrichment = Box::new(FailingEnrichment);
        store.commit(Stage::Enrichment).unwrap();
        let err = stage
            .refresh(classify.output(), &store, &resources)
            .unwrap_err();
        assert!(matches!(
            err,
            ExplorerError::Computation { ref stage, .. } if stage == "enrichment"
        ));

        // previous Ready output is still there
        let retained = stage.state().output().unwrap();
        assert_eq!(retained.table, good_table);

        // the failed commit was consumed: no retry storm on refresh
        assert!(stage.refresh(classify.output(), &store, &resources).is_ok());
    }
}
