//! Differential expression engine contract
//!
//! The statistical test itself is a pluggable collaborator: given the count
//! matrix and two-group sample labels it returns per-gene effect size,
//! abundance and raw p-value. Multiple-testing correction stays in-core
//! (see [`fdr`]).

mod fdr;
mod welch;

pub use fdr::benjamini_hochberg;
pub use welch::WelchEngine;

use crate::data::{CountMatrix, SampleGroups};
use crate::error::Result;

/// Per-gene output of a differential expression engine, as parallel vectors
/// aligned to the count matrix gene order
#[derive(Debug, Clone)]
pub struct DeStatistics {
    /// Log2 fold change (comparison over reference)
    pub log_fc: Vec<f64>,
    /// Log2 mean counts per million
    pub log_cpm: Vec<f64>,
    /// Raw p-values; NaN where the test was not applicable
    pub pvalues: Vec<f64>,
}

/// A differential expression test over a two-group count matrix
pub trait DifferentialExpressionEngine {
    /// Run the test; output vectors must match the matrix gene order
    fn test(&self, counts: &CountMatrix, groups: &SampleGroups) -> Result<DeStatistics>;
}
