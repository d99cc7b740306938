//! The base statistics table: one record per gene, ordered by adjusted p-value

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::{ExplorerError, Result};

/// Differential expression status of a gene under the committed thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Up,
    Down,
    NoChange,
}

impl Status {
    /// All status values, in display order
    pub const ALL: [Status; 3] = [Status::Up, Status::Down, Status::NoChange];
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Up => write!(f, "Up"),
            Status::Down => write!(f, "Down"),
            Status::NoChange => write!(f, "NoChange"),
        }
    }
}

/// Per-gene statistics plus optional annotation and classification status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneRecord {
    /// Gene identifier (unique within a table)
    pub id: String,
    /// Log2 fold change between conditions
    pub log_fc: f64,
    /// Log2 mean abundance (counts per million)
    pub log_cpm: f64,
    /// Raw p-value
    pub pvalue: f64,
    /// BH-adjusted p-value
    pub padj: f64,
    /// Gene symbol; absent when the annotation source had no match
    pub symbol: Option<String>,
    /// Gene description; absent when the annotation source had no match
    pub description: Option<String>,
    /// Classification status under the committed thresholds
    pub status: Status,
}

impl GeneRecord {
    /// Create an unannotated record with NoChange status
    pub fn new(id: impl Into<String>, log_fc: f64, log_cpm: f64, pvalue: f64, padj: f64) -> Self {
        Self {
            id: id.into(),
            log_fc,
            log_cpm,
            pvalue,
            padj,
            symbol: None,
            description: None,
            status: Status::NoChange,
        }
    }
}

/// Compare adjusted p-values ascending, NaN last
pub(crate) fn cmp_padj(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// The immutable base statistics table
///
/// Produced once by the differential expression pipeline, then owned
/// read-only by the classification stage. Records are sorted by adjusted
/// p-value ascending (NaN last) and identifiers are unique.
#[derive(Debug, Clone)]
pub struct GeneTable {
    records: Vec<GeneRecord>,
}

impl GeneTable {
    /// Build a table from records, sorting by adjusted p-value
    pub fn new(mut records: Vec<GeneRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(ExplorerError::EmptyData {
                reason: "Gene table has no records".to_string(),
            });
        }
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id.clone()) {
                return Err(ExplorerError::InvalidGeneTable {
                    reason: format!("Duplicate gene identifier '{}'", record.id),
                });
            }
        }
        records.sort_by(|a, b| cmp_padj(a.padj, b.padj));
        Ok(Self { records })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table holds no records (constructor forbids this)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records, in adjusted-p-value order
    pub fn records(&self) -> &[GeneRecord] {
        &self.records
    }

    /// Look up a record by identifier
    pub fn get(&self, id: &str) -> Option<&GeneRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Mutable record access, for the annotation pass only
    pub(crate) fn records_mut(&mut self) -> &mut [GeneRecord] {
        &mut self.records
    }
}
