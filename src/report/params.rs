//! Parameter store: live edits, committed snapshots, commit counters
//!
//! User-editable parameters are buffered as live values that downstream
//! stages never read directly. An explicit commit validates the live values,
//! snapshots them, and advances that stage's counter by exactly one; stages
//! read only the snapshot and their counter, so edits to one parameter (or
//! commits of the other stage) can never re-trigger an unrelated stage.

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};

/// The two independently gated recomputation stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classification,
    Enrichment,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Classification => "classification",
            Stage::Enrichment => "enrichment",
        }
    }
}

/// Thresholds observed by the classification stage at commit time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// FDR cutoff on the adjusted p-value, in (0, 0.25]
    pub fdr: f64,
    /// Minimum absolute log2 fold change, >= 0
    pub min_abs_log_fc: f64,
    /// Minimum log2 CPM abundance, >= 0
    pub min_log_cpm: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            fdr: 0.05,
            min_abs_log_fc: 1.0,
            min_log_cpm: 0.5,
        }
    }
}

impl ThresholdParams {
    /// Check the declared parameter domains
    pub fn validate(&self) -> Result<()> {
        if !self.fdr.is_finite() || self.fdr <= 0.0 || self.fdr > 0.25 {
            return Err(ExplorerError::InvalidParameter {
                name: "fdr".to_string(),
                reason: format!("must be in (0, 0.25], got {}", self.fdr),
            });
        }
        if !self.min_abs_log_fc.is_finite() || self.min_abs_log_fc < 0.0 {
            return Err(ExplorerError::InvalidParameter {
                name: "min_abs_log_fc".to_string(),
                reason: format!("must be >= 0, got {}", self.min_abs_log_fc),
            });
        }
        if !self.min_log_cpm.is_finite() || self.min_log_cpm < 0.0 {
            return Err(ExplorerError::InvalidParameter {
                name: "min_log_cpm".to_string(),
                reason: format!("must be >= 0, got {}", self.min_log_cpm),
            });
        }
        Ok(())
    }
}

/// Options observed by the enrichment stage at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentParams {
    /// Correct for gene length bias in the enrichment test
    pub length_bias_correction: bool,
}

impl Default for EnrichmentParams {
    fn default() -> Self {
        Self {
            length_bias_correction: true,
        }
    }
}

/// Holds live parameter edits, committed snapshots and the two counters
///
/// Counter value 0 is the "never committed" sentinel; the snapshots are
/// initialized from the defaults so a counter-0 read is well-defined.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    live_thresholds: ThresholdParams,
    live_enrichment: EnrichmentParams,
    committed_thresholds: ThresholdParams,
    committed_enrichment: EnrichmentParams,
    classification_commits: u64,
    enrichment_commits: u64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self {
            live_thresholds: ThresholdParams::default(),
            live_enrichment: EnrichmentParams::default(),
            committed_thresholds: ThresholdParams::default(),
            committed_enrichment: EnrichmentParams::default(),
            classification_commits: 0,
            enrichment_commits: 0,
        }
    }

    /// Current live (uncommitted) threshold values
    pub fn live_thresholds(&self) -> &ThresholdParams {
        &self.live_thresholds
    }

    /// Edit the live threshold values; not observed until the next commit
    pub fn live_thresholds_mut(&mut self) -> &mut ThresholdParams {
        &mut self.live_thresholds
    }

    /// Current live (uncommitted) enrichment options
    pub fn live_enrichment(&self) -> &EnrichmentParams {
        &self.live_enrichment
    }

    /// Edit the live enrichment options; not observed until the next commit
    pub fn live_enrichment_mut(&mut self) -> &mut EnrichmentParams {
        &mut self.live_enrichment
    }

    /// Thresholds as of the last classification commit (defaults at counter 0)
    pub fn committed_thresholds(&self) -> &ThresholdParams {
        &self.committed_thresholds
    }

    /// Options as of the last enrichment commit (defaults at counter 0)
    pub fn committed_enrichment(&self) -> &EnrichmentParams {
        &self.committed_enrichment
    }

    /// Number of accepted commits for a stage; 0 means never committed
    pub fn commits(&self, stage: Stage) -> u64 {
        match stage {
            Stage::Classification => self.classification_commits,
            Stage::Enrichment => self.enrichment_commits,
        }
    }

    /// Validate and snapshot the live values for a stage, advancing its
    /// counter by exactly one
    ///
    /// Out-of-domain values are rejected before the commit is accepted: the
    /// counter does not advance and the previous snapshot stays in place.
    /// No recomputation is triggered here.
    pub fn commit(&mut self, stage: Stage) -> Result<u64> {
        match stage {
            Stage::Classification => {
                self.live_thresholds.validate()?;
                self.committed_thresholds = self.live_thresholds;
                self.classification_commits += 1;
                log::debug!(
                    "classification commit #{}: fdr={} |logFC|>={} logCPM>={}",
                    self.classification_commits,
                    self.committed_thresholds.fdr,
                    self.committed_thresholds.min_abs_log_fc,
                    self.committed_thresholds.min_log_cpm
                );
                Ok(self.classification_commits)
            }
            Stage::Enrichment => {
                self.committed_enrichment = self.live_enrichment;
                self.enrichment_commits += 1;
                log::debug!(
                    "enrichment commit #{}: length_bias_correction={}",
                    self.enrichment_commits,
                    self.committed_enrichment.length_bias_correction
                );
                Ok(self.enrichment_commits)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_increments_by_one() {
        let mut store = ParameterStore::new();
        assert_eq!(store.commits(Stage::Classification), 0);
        assert_eq!(store.commit(Stage::Classification).unwrap(), 1);
        assert_eq!(store.commit(Stage::Classification).unwrap(), 2);
        // the other counter is untouched
        assert_eq!(store.commits(Stage::Enrichment), 0);
    }

    #[test]
    fn test_live_edits_invisible_until_commit() {
        let mut store = ParameterStore::new();
        store.live_thresholds_mut().fdr = 0.01;
        store.live_thresholds_mut().min_abs_log_fc = 2.0;
        assert_eq!(store.committed_thresholds().fdr, 0.05);
        assert_eq!(store.committed_thresholds().min_abs_log_fc, 1.0);

        store.commit(Stage::Classification).unwrap();
        assert_eq!(store.committed_thresholds().fdr, 0.01);
        assert_eq!(store.committed_thresholds().min_abs_log_fc, 2.0);
    }

    #[test]
    fn test_invalid_commit_rejected_without_advancing() {
        let mut store = ParameterStore::new();
        store.live_thresholds_mut().fdr = 0.3;
        assert!(store.commit(Stage::Classification).is_err());
        assert_eq!(store.commits(Stage::Classification), 0);
        assert_eq!(store.committed_thresholds().fdr, 0.05);

        store.live_thresholds_mut().fdr = f64::NAN;
        assert!(store.commit(Stage::Classification).is_err());

        store.live_thresholds_mut().fdr = 0.0;
        assert!(store.commit(Stage::Classification).is_err());

        store.live_thresholds_mut().fdr = 0.25;
        assert!(store.commit(Stage::Classification).is_ok());
    }

    #[test]
    fn test_negative_thresholds_rejected() {
        let mut store = ParameterStore::new();
        store.live_thresholds_mut().min_abs_log_fc = -1.0;
        assert!(store.commit(Stage::Classification).is_err());

        store.live_thresholds_mut().min_abs_log_fc = 0.0;
        store.live_thresholds_mut().min_log_cpm = -0.5;
        assert!(store.commit(Stage::Classification).is_err());
    }

    #[test]
    fn test_enrichment_commit_independent() {
        let mut store = ParameterStore::new();
        store.live_enrichment_mut().length_bias_correction = false;
        assert!(store.committed_enrichment().length_bias_correction);

        store.commit(Stage::Enrichment).unwrap();
        assert!(!store.committed_enrichment().length_bias_correction);
        assert_eq!(store.commits(Stage::Classification), 0);
    }
}
