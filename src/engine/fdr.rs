//! Multiple testing correction
//!
//! Benjamini-Hochberg FDR correction, the default for differential
//! expression results. R equivalent: p.adjust(method="BH").

/// Apply Benjamini-Hochberg FDR correction to raw p-values
///
/// Returns adjusted p-values controlling the false discovery rate. NaN
/// inputs stay NaN and are excluded from the number of tests. Adjusted
/// values are monotone non-decreasing when sorted by rank (step-up with
/// a running minimum from the largest rank down).
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    if n == 0 {
        return Vec::new();
    }

    // Ranks over finite p-values only, ascending
    let mut order: Vec<usize> = (0..n).filter(|&i| pvalues[i].is_finite()).collect();
    order.sort_by(|&a, &b| {
        pvalues[a]
            .partial_cmp(&pvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let m = order.len();
    let mut padj = vec![f64::NAN; n];
    if m == 0 {
        return padj;
    }

    let mut running_min = 1.0_f64;
    for (rank0, &i) in order.iter().enumerate().rev() {
        let rank = rank0 + 1;
        let adjusted = (pvalues[i] * m as f64 / rank as f64).min(1.0);
        running_min = running_min.min(adjusted);
        padj[i] = running_min;
    }

    padj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bh_known_vector() {
        // Ten synthetic p-values with hand-computed BH output
        let pvalues = vec![0.01, 0.02, 0.03, 0.04, 0.05, 0.2, 0.3, 0.4, 0.5, 0.9];
        let expected = vec![
            0.1,
            0.1,
            0.1,
            0.1,
            0.1,
            1.0 / 3.0,
            3.0 / 7.0,
            0.5,
            5.0 / 9.0,
            0.9,
        ];
        let padj = benjamini_hochberg(&pvalues);
        for (got, want) in padj.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-12, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_bh_monotone_by_rank() {
        let pvalues = vec![0.04, 0.001, 0.3, 0.02, 0.9, 0.007, 0.11, 0.05, 0.6, 0.25];
        let padj = benjamini_hochberg(&pvalues);

        let mut order: Vec<usize> = (0..pvalues.len()).collect();
        order.sort_by(|&a, &b| pvalues[a].partial_cmp(&pvalues[b]).unwrap());
        for pair in order.windows(2) {
            assert!(padj[pair[0]] <= padj[pair[1]]);
        }
        for (p, adj) in pvalues.iter().zip(padj.iter()) {
            assert!(adj >= p && *adj <= 1.0);
        }
    }

    #[test]
    fn test_bh_nan_preserved() {
        let pvalues = vec![0.01, f64::NAN, 0.02];
        let padj = benjamini_hochberg(&pvalues);
        assert!(padj[0].is_finite());
        assert!(padj[1].is_nan());
        assert!(padj[2].is_finite());
        // m = 2 finite tests, so the largest finite adjustment is p * 2 / 2
        assert!((padj[2] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_bh_empty() {
        assert!(benjamini_hochberg(&[]).is_empty());
    }
}
