//! Loaders for count matrices, sample groups and enrichment resources
//!
//! The count matrix and sample-group files use the same hand-rolled reader
//! (delimiter autodetected, quotes stripped). The annotation, gene-length
//! and category files go through the csv crate with serde rows.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use crate::data::{CountMatrix, SampleGroups, TableAnnotationResolver};
use crate::enrichment::CategoryMap;
use crate::error::{ExplorerError, Result};

/// Strip surrounding quotes from a field
fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Read all non-empty rows of a delimited file, autodetecting tab vs comma
/// from the header line
fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<String>>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut delimiter = None;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sep = *delimiter.get_or_insert(if line.contains('\t') { '\t' } else { ',' });
        rows.push(
            line.split(sep)
                .map(|f| strip_quotes(f).to_string())
                .collect(),
        );
    }

    if rows.is_empty() {
        return Err(ExplorerError::EmptyData {
            reason: "Empty input file".to_string(),
        });
    }
    Ok(rows)
}

/// Read a count matrix
/// Expected format: first column gene IDs, first row sample IDs
pub fn read_count_matrix<P: AsRef<Path>>(path: P) -> Result<CountMatrix> {
    let rows = read_rows(path)?;

    let header = &rows[0];
    if header.len() < 2 {
        return Err(ExplorerError::InvalidCountMatrix {
            reason: "Not enough columns in header".to_string(),
        });
    }
    let sample_ids: Vec<String> = header[1..].to_vec();
    let n_samples = sample_ids.len();

    if rows.len() < 2 {
        return Err(ExplorerError::EmptyData {
            reason: "No genes found in count matrix".to_string(),
        });
    }

    let n_genes = rows.len() - 1;
    let mut gene_ids = Vec::with_capacity(n_genes);
    let mut counts = Array2::zeros((n_genes, n_samples));

    for (i, row) in rows[1..].iter().enumerate() {
        if row.len() != n_samples + 1 {
            return Err(ExplorerError::InvalidCountMatrix {
                reason: format!("Row has {} columns, expected {}", row.len(), n_samples + 1),
            });
        }
        gene_ids.push(row[0].clone());
        for (j, field) in row[1..].iter().enumerate() {
            counts[[i, j]] = field.parse::<f64>().map_err(|_| {
                ExplorerError::InvalidCountMatrix {
                    reason: format!("Invalid count value: {}", field),
                }
            })?;
        }
    }

    CountMatrix::new(counts, gene_ids, sample_ids)
}

/// Read sample group labels and align them to the count matrix column order
/// Expected format: first column sample ID, second column group label
pub fn read_sample_groups<P: AsRef<Path>>(path: P, matrix: &CountMatrix) -> Result<SampleGroups> {
    let rows = read_rows(path)?;

    let mut by_sample: HashMap<&str, &str> = HashMap::new();
    // skip the header row
    for row in &rows[1..] {
        if row.len() < 2 {
            return Err(ExplorerError::InvalidMetadata {
                reason: "Sample group rows need at least 2 columns".to_string(),
            });
        }
        by_sample.insert(row[0].as_str(), row[1].as_str());
    }

    let mut labels = Vec::with_capacity(matrix.n_samples());
    for sample_id in matrix.sample_ids() {
        match by_sample.get(sample_id.as_str()) {
            Some(group) => labels.push(group.to_string()),
            None => {
                return Err(ExplorerError::InvalidMetadata {
                    reason: format!("No group label for sample '{}'", sample_id),
                })
            }
        }
    }

    SampleGroups::new(labels)
}

#[derive(Debug, Deserialize)]
struct AnnotationRow {
    gene_id: String,
    symbol: String,
    description: String,
}

/// Read a gene annotation table (columns: gene_id, symbol, description);
/// identifiers may repeat, one row per match
pub fn read_annotation_table<P: AsRef<Path>>(path: P) -> Result<TableAnnotationResolver> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut resolver = TableAnnotationResolver::new();
    for row in reader.deserialize() {
        let row: AnnotationRow = row?;
        resolver.add(row.gene_id, row.symbol, row.description);
    }
    log::debug!("loaded annotations for {} gene(s)", resolver.len());
    Ok(resolver)
}

#[derive(Debug, Deserialize)]
struct LengthRow {
    gene_id: String,
    length: f64,
}

/// Read per-gene transcript lengths (columns: gene_id, length)
pub fn read_gene_lengths<P: AsRef<Path>>(path: P) -> Result<HashMap<String, f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut lengths = HashMap::new();
    for row in reader.deserialize() {
        let row: LengthRow = row?;
        lengths.insert(row.gene_id, row.length);
    }
    if lengths.is_empty() {
        return Err(ExplorerError::EmptyData {
            reason: "No gene lengths found".to_string(),
        });
    }
    Ok(lengths)
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    gene_id: String,
    category: String,
    term: String,
    ontology: String,
}

/// Read gene-to-category associations
/// (columns: gene_id, category, term, ontology)
pub fn read_category_map<P: AsRef<Path>>(path: P) -> Result<CategoryMap> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut map = CategoryMap::new();
    for row in reader.deserialize() {
        let row: CategoryRow = row?;
        map.add(row.gene_id, row.category, row.term, row.ontology);
    }
    if map.is_empty() {
        return Err(ExplorerError::EmptyData {
            reason: "No category associations found".to_string(),
        });
    }
    Ok(map)
}
