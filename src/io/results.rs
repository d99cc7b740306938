//! Writers for report artifacts

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data::GeneRecord;
use crate::enrichment::CategoryRecord;
use crate::error::Result;
use crate::report::{StatusSummary, ThresholdParams};

/// Write the labeled gene table as TSV
pub fn write_labeled_table<P: AsRef<Path>>(path: P, records: &[GeneRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "gene_id\tsymbol\tdescription\tlogFC\tlogCPM\tPValue\tFDR\tstatus"
    )?;
    for record in records {
        writeln!(
            file,
            "{}\t{}\t{}\t{:.6}\t{:.6}\t{:.6e}\t{:.6e}\t{}",
            record.id,
            record.symbol.as_deref().unwrap_or("NA"),
            record.description.as_deref().unwrap_or("NA"),
            record.log_fc,
            record.log_cpm,
            record.pvalue,
            record.padj,
            record.status,
        )?;
    }
    Ok(())
}

/// Write the enrichment table as TSV, goseq-shaped columns
pub fn write_enrichment_table<P: AsRef<Path>>(path: P, rows: &[CategoryRecord]) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "category\tover_represented_pvalue\tunder_represented_pvalue\tnumDEInCat\tnumInCat\tterm\tontology"
    )?;
    for row in rows {
        writeln!(
            file,
            "{}\t{:.6e}\t{:.6e}\t{}\t{}\t{}\t{}",
            row.category,
            row.over_represented_pvalue,
            row.under_represented_pvalue,
            row.num_de_in_cat,
            row.num_in_cat,
            row.term,
            row.ontology,
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    thresholds: &'a ThresholdParams,
    up: usize,
    down: usize,
    no_change: usize,
    total: usize,
}

/// Write the status summary plus the thresholds it reflects as JSON
pub fn write_summary_json<P: AsRef<Path>>(
    path: P,
    summary: &StatusSummary,
    thresholds: &ThresholdParams,
) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(
        file,
        &SummaryFile {
            thresholds,
            up: summary.up,
            down: summary.down,
            no_change: summary.no_change,
            total: summary.total(),
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Status;
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_labeled_table_na_for_missing_annotation() {
        let mut record = GeneRecord::new("g1", 1.5, 6.2, 0.001, 0.01);
        record.status = Status::Up;

        let file = NamedTempFile::new().unwrap();
        write_labeled_table(file.path(), &[record]).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("gene_id\tsymbol"));
        assert!(text.contains("g1\tNA\tNA\t"));
        assert!(text.contains("\tUp\n"));
    }

    #[test]
    fn test_write_enrichment_table_columns() {
        let row = CategoryRecord {
            category: "GO:0006950".to_string(),
            over_represented_pvalue: 0.001,
            under_represented_pvalue: 0.999,
            num_de_in_cat: 4,
            num_in_cat: 10,
            term: "response to stress".to_string(),
            ontology: "BP".to_string(),
        };
        let file = NamedTempFile::new().unwrap();
        write_enrichment_table(file.path(), &[row]).unwrap();
        let text = fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("numDEInCat\tnumInCat"));
        assert!(text.contains("GO:0006950"));
        assert!(text.contains("response to stress\tBP"));
    }

    #[test]
    fn test_write_summary_json_round_trips() {
        let summary = StatusSummary {
            up: 3,
            down: 1,
            no_change: 6,
        };
        let file = NamedTempFile::new().unwrap();
        write_summary_json(file.path(), &summary, &ThresholdParams::default()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["up"], 3);
        assert_eq!(value["total"], 10);
        assert_eq!(value["thresholds"]["fdr"], 0.05);
    }
}
