//! Reference differential expression engine
//!
//! A deliberately simple two-group test: counts are normalized to CPM,
//! log2-transformed with a prior count, and compared per gene with a Welch
//! t-test. Genes are processed in parallel. This stands in for a full
//! dispersion-modeling engine behind the same trait.

use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::data::{CountMatrix, SampleGroups};
use crate::engine::{DeStatistics, DifferentialExpressionEngine};
use crate::error::{ExplorerError, Result};

/// Welch t-test engine over log2 CPM values
#[derive(Debug, Clone)]
pub struct WelchEngine {
    /// Prior count added before log transform to damp low-count ratios
    pub prior_count: f64,
}

impl Default for WelchEngine {
    fn default() -> Self {
        Self { prior_count: 0.5 }
    }
}

impl WelchEngine {
    pub fn new(prior_count: f64) -> Self {
        Self { prior_count }
    }
}

/// Mean and sample variance of a slice
fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, f64::NAN);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Two-sided Welch t-test p-value; NaN when either group lacks replicates
fn welch_pvalue(a: &[f64], b: &[f64]) -> f64 {
    if a.len() < 2 || b.len() < 2 {
        return f64::NAN;
    }
    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);
    let na = a.len() as f64;
    let nb = b.len() as f64;

    let se2 = var_a / na + var_b / nb;
    let diff = mean_b - mean_a;
    if se2 == 0.0 {
        // No within-group variance at all
        return if diff == 0.0 { 1.0 } else { 0.0 };
    }

    let t = diff / se2.sqrt();
    let df = se2 * se2
        / ((var_a / na).powi(2) / (na - 1.0) + (var_b / nb).powi(2) / (nb - 1.0));
    if !df.is_finite() || df <= 0.0 {
        return f64::NAN;
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    }
}

impl DifferentialExpressionEngine for WelchEngine {
    fn test(&self, counts: &CountMatrix, groups: &SampleGroups) -> Result<DeStatistics> {
        if groups.labels().len() != counts.n_samples() {
            return Err(ExplorerError::DimensionMismatch {
                expected: format!("{} group labels", counts.n_samples()),
                got: format!("{} group labels", groups.labels().len()),
            });
        }

        let cpm = counts.cpm()?;
        let prior = self.prior_count;
        let ref_idx = groups.reference_indices();
        let cmp_idx = groups.comparison_indices();

        log::debug!(
            "Testing {} genes: {} vs {} ({} + {} samples)",
            counts.n_genes(),
            groups.comparison(),
            groups.reference(),
            cmp_idx.len(),
            ref_idx.len()
        );

        let cpm_view = cpm.view();
        let rows: Vec<(f64, f64, f64)> = (0..counts.n_genes())
            .into_par_iter()
            .map(|g| {
                let row = cpm_view.row(g);
                let log_all: Vec<f64> = row.iter().map(|&x| (x + prior).log2()).collect();
                let log_ref: Vec<f64> = ref_idx.iter().map(|&j| log_all[j]).collect();
                let log_cmp: Vec<f64> = cmp_idx.iter().map(|&j| log_all[j]).collect();

                let log_cpm = log_all.iter().sum::<f64>() / log_all.len() as f64;
                let log_fc = log_cmp.iter().sum::<f64>() / log_cmp.len() as f64
                    - log_ref.iter().sum::<f64>() / log_ref.len() as f64;
                let pvalue = welch_pvalue(&log_ref, &log_cmp);
                (log_fc, log_cpm, pvalue)
            })
            .collect();

        let mut stats = DeStatistics {
            log_fc: Vec::with_capacity(rows.len()),
            log_cpm: Vec::with_capacity(rows.len()),
            pvalues: Vec::with_capacity(rows.len()),
        };
        for (log_fc, log_cpm, pvalue) in rows {
            stats.log_fc.push(log_fc);
            stats.log_cpm.push(log_cpm);
            stats.pvalues.push(pvalue);
        }

        let untested = stats.pvalues.iter().filter(|p| p.is_nan()).count();
        if untested > 0 {
            log::warn!("{} gene(s) could not be tested (insufficient replicates)", untested);
        }

        Ok(stats)
    }
}
