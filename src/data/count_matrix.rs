//! Count matrix and sample grouping for RNA-seq data

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::collections::HashSet;

use crate::error::{ExplorerError, Result};

/// A count matrix of RNA-seq read counts
/// Rows are genes, columns are samples
#[derive(Debug, Clone)]
pub struct CountMatrix {
    /// Raw count data (genes x samples)
    counts: Array2<f64>,
    /// Gene identifiers (unique)
    gene_ids: Vec<String>,
    /// Sample identifiers
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new count matrix from raw data
    ///
    /// Gene identifiers must be unique; duplicates are rejected rather than
    /// renamed, since every downstream table is keyed by identifier.
    pub fn new(
        counts: Array2<f64>,
        gene_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (n_genes, n_samples) = counts.dim();

        if gene_ids.len() != n_genes {
            return Err(ExplorerError::DimensionMismatch {
                expected: format!("{} gene IDs", n_genes),
                got: format!("{} gene IDs", gene_ids.len()),
            });
        }
        if sample_ids.len() != n_samples {
            return Err(ExplorerError::DimensionMismatch {
                expected: format!("{} sample IDs", n_samples),
                got: format!("{} sample IDs", sample_ids.len()),
            });
        }

        if counts.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err(ExplorerError::InvalidCountMatrix {
                reason: "Counts must be non-negative finite values".to_string(),
            });
        }

        if !counts.is_empty() && counts.iter().all(|&x| x == 0.0) {
            return Err(ExplorerError::InvalidCountMatrix {
                reason: "All samples have 0 counts for all genes".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(gene_ids.len());
        for id in &gene_ids {
            if !seen.insert(id.as_str()) {
                return Err(ExplorerError::InvalidCountMatrix {
                    reason: format!("Duplicate gene identifier '{}'", id),
                });
            }
        }

        if counts.iter().any(|&x| x != x.round()) {
            log::warn!("Some count values are not integers; counts are expected to be raw reads");
        }

        Ok(Self {
            counts,
            gene_ids,
            sample_ids,
        })
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.counts.nrows()
    }

    /// Get the number of samples
    pub fn n_samples(&self) -> usize {
        self.counts.ncols()
    }

    /// Get the raw counts as a view
    pub fn counts(&self) -> ArrayView2<'_, f64> {
        self.counts.view()
    }

    /// Get gene IDs
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Get sample IDs
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get counts for a specific gene
    pub fn gene_counts(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.counts.row(gene_idx)
    }

    /// Get sample index by ID
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|id| id == sample_id)
    }

    /// Sum of counts per sample (library size)
    pub fn library_sizes(&self) -> Vec<f64> {
        self.counts
            .axis_iter(Axis(1))
            .map(|col| col.sum())
            .collect()
    }

    /// Counts per million, normalized by library size
    pub fn cpm(&self) -> Result<Array2<f64>> {
        let lib_sizes = self.library_sizes();
        if lib_sizes.iter().any(|&s| s == 0.0) {
            return Err(ExplorerError::InvalidCountMatrix {
                reason: "Sample with zero library size".to_string(),
            });
        }
        let mut cpm = self.counts.clone();
        for (j, &size) in lib_sizes.iter().enumerate() {
            cpm.column_mut(j).mapv_inplace(|x| x / size * 1e6);
        }
        Ok(cpm)
    }
}

/// Two-group sample labels, aligned to the count matrix column order
#[derive(Debug, Clone)]
pub struct SampleGroups {
    labels: Vec<String>,
    /// Reference (denominator) group, the alphabetically first level
    reference: String,
    /// Comparison (numerator) group
    comparison: String,
}

impl SampleGroups {
    /// Create sample groups from per-sample labels
    ///
    /// Exactly two distinct labels are required. The alphabetically first
    /// label becomes the reference (denominator) level.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        let mut levels: Vec<&String> = Vec::new();
        for label in &labels {
            if !levels.contains(&label) {
                levels.push(label);
            }
        }
        if levels.len() != 2 {
            return Err(ExplorerError::InvalidMetadata {
                reason: format!("Expected exactly 2 sample groups, found {}", levels.len()),
            });
        }
        levels.sort();
        let reference = levels[0].clone();
        let comparison = levels[1].clone();
        Ok(Self {
            labels,
            reference,
            comparison,
        })
    }

    /// Per-sample labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Reference (denominator) group label
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Comparison (numerator) group label
    pub fn comparison(&self) -> &str {
        &self.comparison
    }

    /// Sample indices of the reference group
    pub fn reference_indices(&self) -> Vec<usize> {
        self.indices_of(&self.reference)
    }

    /// Sample indices of the comparison group
    pub fn comparison_indices(&self) -> Vec<usize> {
        self.indices_of(&self.comparison)
    }

    fn indices_of(&self, level: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_str() == level)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_count_matrix_creation() {
        let counts = array![[10.0, 20.0, 30.0], [5.0, 15.0, 25.0]];
        let matrix = CountMatrix::new(
            counts,
            vec!["g1".to_string(), "g2".to_string()],
            vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
        )
        .unwrap();
        assert_eq!(matrix.n_genes(), 2);
        assert_eq!(matrix.n_samples(), 3);
        assert_eq!(matrix.library_sizes(), vec![15.0, 35.0, 55.0]);
    }

    #[test]
    fn test_negative_counts_rejected() {
        let counts = array![[10.0, -5.0], [5.0, 15.0]];
        let result = CountMatrix::new(
            counts,
            vec!["g1".to_string(), "g2".to_string()],
            vec!["s1".to_string(), "s2".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_gene_ids_rejected() {
        let counts = array![[10.0, 5.0], [5.0, 15.0]];
        let result = CountMatrix::new(
            counts,
            vec!["g1".to_string(), "g1".to_string()],
            vec!["s1".to_string(), "s2".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cpm_normalization() {
        let counts = array![[10.0, 20.0], [90.0, 180.0]];
        let matrix = CountMatrix::new(
            counts,
            vec!["g1".to_string(), "g2".to_string()],
            vec!["s1".to_string(), "s2".to_string()],
        )
        .unwrap();
        let cpm = matrix.cpm().unwrap();
        assert!((cpm[[0, 0]] - 1e5).abs() < 1e-9);
        assert!((cpm[[0, 1]] - 1e5).abs() < 1e-9);
        assert!((cpm[[1, 0]] - 9e5).abs() < 1e-9);
    }

    #[test]
    fn test_sample_groups_two_levels() {
        let groups = SampleGroups::new(vec![
            "treated".to_string(),
            "control".to_string(),
            "treated".to_string(),
            "control".to_string(),
        ])
        .unwrap();
        assert_eq!(groups.reference(), "control");
        assert_eq!(groups.comparison(), "treated");
        assert_eq!(groups.reference_indices(), vec![1, 3]);
        assert_eq!(groups.comparison_indices(), vec![0, 2]);
    }

    #[test]
    fn test_sample_groups_rejects_one_level() {
        let result = SampleGroups::new(vec!["a".to_string(), "a".to_string()]);
        assert!(result.is_err());
    }
}
