//! de_explorer: interactive differential expression report engine
//!
//! Loads a fixed RNA-seq dataset, runs a two-group differential expression
//! test once, and drives an interactive report over the resulting table:
//! thresholds are live-edited, committed explicitly, and propagated through
//! a memoized recomputation graph (classification, display artifacts, and a
//! separately gated ontology enrichment stage).
//!
//! # Example
//!
//! ```ignore
//! use de_explorer::prelude::*;
//!
//! let matrix = read_count_matrix("counts.csv")?;
//! let groups = read_sample_groups("groups.csv", &matrix)?;
//! let base = build_gene_table(&matrix, &groups, &WelchEngine::default(), None)?;
//!
//! let mut session = ReportSession::new(base);
//! session.set_fdr(0.01);
//! session.commit_thresholds()?;
//! println!("{}", session.summary());
//! ```

pub mod cli;
pub mod data;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod io;
pub mod report;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::build_gene_table;
    pub use crate::data::{
        annotate_table, AnnotationResolver, CountMatrix, GeneRecord, GeneTable, SampleGroups,
        Status, TableAnnotationResolver,
    };
    pub use crate::engine::{
        benjamini_hochberg, DeStatistics, DifferentialExpressionEngine, WelchEngine,
    };
    pub use crate::enrichment::{
        BinnedPwf, CategoryMap, CategoryRecord, EnrichmentResources, EnrichmentState,
        GenomeConfig, StandardEnrichment,
    };
    pub use crate::error::{ExplorerError, Result};
    pub use crate::io::{
        read_annotation_table, read_category_map, read_count_matrix, read_gene_lengths,
        read_sample_groups, write_enrichment_table, write_labeled_table, write_summary_json,
    };
    pub use crate::report::{
        EnrichmentParams, ParameterStore, ReportSession, ScatterPoint, Stage, StatusSummary,
        ThresholdParams,
    };
}

use data::{AnnotationResolver, CountMatrix, GeneRecord, GeneTable, SampleGroups};
use engine::{benjamini_hochberg, DifferentialExpressionEngine};
use error::{ExplorerError, Result};

/// Build the base statistics table: run the differential expression engine,
/// apply BH correction, attach annotations, and sort by adjusted p-value
pub fn build_gene_table(
    counts: &CountMatrix,
    groups: &SampleGroups,
    engine: &dyn DifferentialExpressionEngine,
    resolver: Option<&dyn AnnotationResolver>,
) -> Result<GeneTable> {
    let stats = engine.test(counts, groups)?;
    let n = counts.n_genes();
    if stats.log_fc.len() != n || stats.log_cpm.len() != n || stats.pvalues.len() != n {
        return Err(ExplorerError::DimensionMismatch {
            expected: format!("{} statistics per gene", n),
            got: format!(
                "{}/{}/{} (logFC/logCPM/p)",
                stats.log_fc.len(),
                stats.log_cpm.len(),
                stats.pvalues.len()
            ),
        });
    }

    let padj = benjamini_hochberg(&stats.pvalues);
    let records: Vec<GeneRecord> = counts
        .gene_ids()
        .iter()
        .enumerate()
        .map(|(i, id)| {
            GeneRecord::new(
                id.clone(),
                stats.log_fc[i],
                stats.log_cpm[i],
                stats.pvalues[i],
                padj[i],
            )
        })
        .collect();

    let mut table = GeneTable::new(records)?;
    if let Some(resolver) = resolver {
        data::annotate_table(&mut table, resolver)?;
    }
    Ok(table)
}
