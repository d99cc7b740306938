//! Report session: the trigger-gated recomputation graph
//!
//! The presentation layer owns a single mutable `ReportSession`; the stages
//! inside it are pure functions over explicit snapshots. Parameter edits go
//! to the store's live values, an explicit commit snapshots them and
//! advances one stage's counter, and the session then refreshes exactly the
//! stages whose memo stamps are stale. Commits are serialized by `&mut self`
//! so the output always reflects exactly the most recent commit.

pub mod artifacts;
pub mod classify;
pub mod params;

pub use artifacts::{DerivedArtifacts, ScatterPoint, StatusSummary};
pub use classify::{classify_status, ClassifyStage, LabeledTable};
pub use params::{EnrichmentParams, ParameterStore, Stage, ThresholdParams};

use crate::data::{GeneRecord, GeneTable};
use crate::enrichment::{EnrichmentResources, EnrichmentStage, EnrichmentState};
use crate::error::{ExplorerError, Result};

/// Interactive report over an immutable base statistics table
pub struct ReportSession {
    base: GeneTable,
    store: ParameterStore,
    classify: ClassifyStage,
    artifacts: DerivedArtifacts,
    enrichment: EnrichmentStage,
    resources: Option<EnrichmentResources>,
}

impl ReportSession {
    /// Open a session; classification and the derived artifacts run once
    /// with the default thresholds, the enrichment stage stays unrun
    pub fn new(base: GeneTable) -> Self {
        let store = ParameterStore::new();
        let classify = ClassifyStage::new(&base, &store);
        let artifacts = DerivedArtifacts::new(classify.output());
        Self {
            base,
            store,
            classify,
            artifacts,
            enrichment: EnrichmentStage::new(),
            resources: None,
        }
    }

    /// Attach gene length / category resources for the enrichment stage
    pub fn with_enrichment(mut self, resources: EnrichmentResources) -> Self {
        self.resources = Some(resources);
        self
    }

    /// The immutable base statistics table
    pub fn base(&self) -> &GeneTable {
        &self.base
    }

    /// Live parameter edit: FDR cutoff
    pub fn set_fdr(&mut self, fdr: f64) {
        self.store.live_thresholds_mut().fdr = fdr;
    }

    /// Live parameter edit: minimum absolute log2 fold change
    pub fn set_min_abs_log_fc(&mut self, min_abs_log_fc: f64) {
        self.store.live_thresholds_mut().min_abs_log_fc = min_abs_log_fc;
    }

    /// Live parameter edit: minimum log2 CPM
    pub fn set_min_log_cpm(&mut self, min_log_cpm: f64) {
        self.store.live_thresholds_mut().min_log_cpm = min_log_cpm;
    }

    /// Live parameter edit: length-bias correction for enrichment
    pub fn set_length_bias_correction(&mut self, enabled: bool) {
        self.store.live_enrichment_mut().length_bias_correction = enabled;
    }

    /// The parameter store (live values, snapshots, counters)
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Commit the live thresholds and refresh classification plus the
    /// derived artifacts; the enrichment stage is not touched
    pub fn commit_thresholds(&mut self) -> Result<()> {
        self.store.commit(Stage::Classification)?;
        self.classify.refresh(&self.base, &self.store);
        self.artifacts.refresh(self.classify.output());
        Ok(())
    }

    /// Commit the live enrichment options and run the enrichment stage
    /// against the current classification output
    pub fn commit_enrichment(&mut self) -> Result<()> {
        let resources = match self.resources.as_ref() {
            Some(resources) => resources,
            None => {
                return Err(ExplorerError::computation(
                    "enrichment",
                    "no gene length / category resources loaded",
                ))
            }
        };
        self.store.commit(Stage::Enrichment)?;
        self.enrichment
            .refresh(self.classify.output(), &self.store, resources)
    }

    /// Current labeled table (base order)
    pub fn labeled(&self) -> &LabeledTable {
        self.classify.output()
    }

    /// Current status counts
    pub fn summary(&self) -> &StatusSummary {
        self.artifacts.summary()
    }

    /// Current MA-plot coordinates
    pub fn scatter(&self) -> &[ScatterPoint] {
        self.artifacts.scatter()
    }

    /// Current display table, sorted by adjusted p-value
    pub fn sorted_table(&self) -> &[GeneRecord] {
        self.artifacts.sorted_table()
    }

    /// Current enrichment state (`Unrun` until the first enrichment commit)
    pub fn enrichment(&self) -> &EnrichmentState {
        self.enrichment.state()
    }
}
