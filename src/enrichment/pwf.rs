//! Probability weighting function for gene length bias
//!
//! Long transcripts accumulate more reads, so they reach significance more
//! easily; the enrichment test corrects for this with a per-gene weight
//! estimating P(DE | length). The reference implementation bins genes by
//! length and uses the within-bin proportion of DE genes, which also yields
//! the bias plot points. R equivalent: goseq's nullp() fit, simplified to a
//! binned estimate.

use std::collections::HashMap;

use crate::enrichment::{BiasPlotPoint, BiasWeightingEngine, GeneWeight, GenomeConfig, PwfResult};
use crate::error::{ExplorerError, Result};

/// Floor for weights so every gene stays sampleable
const MIN_WEIGHT: f64 = 1e-4;

/// Binned proportion-DE weighting engine
#[derive(Debug, Clone)]
pub struct BinnedPwf {
    /// Genes per length bin
    pub bin_size: usize,
}

impl Default for BinnedPwf {
    fn default() -> Self {
        Self { bin_size: 200 }
    }
}

impl BinnedPwf {
    pub fn new(bin_size: usize) -> Self {
        Self {
            bin_size: bin_size.max(1),
        }
    }
}

impl BiasWeightingEngine for BinnedPwf {
    fn weights(
        &self,
        labels: &[(String, bool)],
        lengths: &HashMap<String, f64>,
        config: &GenomeConfig,
    ) -> Result<PwfResult> {
        log::debug!(
            "weighting {} genes against {} / {}",
            labels.len(),
            config.genome,
            config.id_space
        );

        // Genes without length data fall out of the enrichment universe
        let mut retained: Vec<(usize, f64)> = Vec::with_capacity(labels.len());
        for (i, (id, _)) in labels.iter().enumerate() {
            match lengths.get(id) {
                Some(&len) if len.is_finite() && len > 0.0 => retained.push((i, len)),
                _ => {}
            }
        }
        let dropped = labels.len() - retained.len();
        if dropped > 0 {
            log::warn!("{} gene(s) without length data dropped from enrichment", dropped);
        }
        if retained.is_empty() {
            return Err(ExplorerError::EmptyData {
                reason: "No genes with length data".to_string(),
            });
        }

        let n_de = retained.iter().filter(|(i, _)| labels[*i].1).count();
        if n_de == 0 {
            return Err(ExplorerError::computation(
                "bias-weighting",
                "degenerate label vector: no differentially expressed genes",
            ));
        }
        if n_de == retained.len() {
            return Err(ExplorerError::computation(
                "bias-weighting",
                "degenerate label vector: every gene is differentially expressed",
            ));
        }

        // Bin by length and take the within-bin DE proportion as the weight
        let mut by_length = retained.clone();
        by_length.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut weight_by_index: HashMap<usize, f64> = HashMap::with_capacity(by_length.len());
        let mut bins = Vec::new();
        for chunk in by_length.chunks(self.bin_size) {
            let de_in_bin = chunk.iter().filter(|(i, _)| labels[*i].1).count();
            let proportion = de_in_bin as f64 / chunk.len() as f64;
            let weight = proportion.max(MIN_WEIGHT);

            let mut chunk_lengths: Vec<f64> = chunk.iter().map(|(_, l)| *l).collect();
            chunk_lengths.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            bins.push(BiasPlotPoint {
                median_length: chunk_lengths[chunk_lengths.len() / 2],
                proportion_de: proportion,
            });

            for (i, _) in chunk {
                weight_by_index.insert(*i, weight);
            }
        }

        // Emit weights in the labeled-table order of the retained genes
        let weights = retained
            .iter()
            .map(|(i, len)| GeneWeight {
                id: labels[*i].0.clone(),
                de: labels[*i].1,
                length: *len,
                weight: weight_by_index[i],
            })
            .collect();

        Ok(PwfResult { weights, bins })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenomeConfig {
        GenomeConfig::new("hg38", "ensGene")
    }

    fn labels_and_lengths(n: usize, de_every: usize) -> (Vec<(String, bool)>, HashMap<String, f64>) {
        let labels: Vec<(String, bool)> = (0..n)
            .map(|i| (format!("g{}", i), i % de_every == 0))
            .collect();
        let lengths = labels
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), 500.0 + i as f64 * 100.0))
            .collect();
        (labels, lengths)
    }

    #[test]
    fn test_weights_cover_retained_genes() {
        let (labels, lengths) = labels_and_lengths(50, 5);
        let result = BinnedPwf::new(10).weights(&labels, &lengths, &config()).unwrap();
        assert_eq!(result.weights.len(), 50);
        assert_eq!(result.bins.len(), 5);
        assert!(result.weights.iter().all(|w| w.weight >= MIN_WEIGHT));
    }

    #[test]
    fn test_missing_lengths_dropped() {
        let (labels, mut lengths) = labels_and_lengths(20, 4);
        lengths.remove("g3");
        lengths.remove("g7");
        let result = BinnedPwf::new(5).weights(&labels, &lengths, &config()).unwrap();
        assert_eq!(result.weights.len(), 18);
        assert!(result.weights.iter().all(|w| w.id != "g3" && w.id != "g7"));
    }

    #[test]
    fn test_degenerate_all_de_rejected() {
        let (mut labels, lengths) = labels_and_lengths(10, 3);
        for label in &mut labels {
            label.1 = true;
        }
        let err = BinnedPwf::default().weights(&labels, &lengths, &config()).unwrap_err();
        assert!(matches!(err, ExplorerError::Computation { .. }));
    }

    #[test]
    fn test_degenerate_no_de_rejected() {
        let (mut labels, lengths) = labels_and_lengths(10, 3);
        for label in &mut labels {
            label.1 = false;
        }
        assert!(BinnedPwf::default().weights(&labels, &lengths, &config()).is_err());
    }

    #[test]
    fn test_bias_reflected_in_bins() {
        // DE concentrated in long genes: last bin proportion above first
        let labels: Vec<(String, bool)> = (0..40).map(|i| (format!("g{}", i), i >= 30)).collect();
        let lengths: HashMap<String, f64> = labels
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), 100.0 * (i + 1) as f64))
            .collect();
        let result = BinnedPwf::new(10).weights(&labels, &lengths, &config()).unwrap();
        assert!(result.bins.last().unwrap().proportion_de > result.bins[0].proportion_de);
    }
}
