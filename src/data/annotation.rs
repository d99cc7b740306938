//! Gene annotation lookup and collapsing
//!
//! An annotation source may return zero or more (symbol, description) pairs
//! per identifier. Multiple matches are collapsed into single comma-joined
//! strings; identifiers with no match keep their fields absent rather than
//! being dropped from the table.

use std::collections::HashMap;

use crate::data::GeneTable;
use crate::error::Result;

/// One (symbol, description) pair from an annotation source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneAnnotation {
    pub symbol: String,
    pub description: String,
}

/// Resolves gene identifiers to annotation matches
pub trait AnnotationResolver {
    /// Return all matches per identifier; identifiers without matches may be
    /// omitted from the map entirely
    fn resolve(&self, ids: &[String]) -> Result<HashMap<String, Vec<GeneAnnotation>>>;
}

/// Collapse multiple annotation matches into comma-joined symbol and
/// description strings; `None` when there are no matches
pub fn collapse_annotations(matches: &[GeneAnnotation]) -> Option<(String, String)> {
    if matches.is_empty() {
        return None;
    }
    let symbols: Vec<&str> = matches.iter().map(|a| a.symbol.as_str()).collect();
    let descriptions: Vec<&str> = matches.iter().map(|a| a.description.as_str()).collect();
    Some((symbols.join(","), descriptions.join(",")))
}

/// Fill in symbol/description fields of a gene table from a resolver
pub fn annotate_table(table: &mut GeneTable, resolver: &dyn AnnotationResolver) -> Result<()> {
    let ids: Vec<String> = table.records().iter().map(|r| r.id.clone()).collect();
    let matches = resolver.resolve(&ids)?;

    let mut unmatched = 0usize;
    for record in table.records_mut() {
        match matches.get(&record.id).map(|m| collapse_annotations(m)) {
            Some(Some((symbol, description))) => {
                record.symbol = Some(symbol);
                record.description = Some(description);
            }
            _ => unmatched += 1,
        }
    }
    if unmatched > 0 {
        log::info!("{} gene(s) without annotation match", unmatched);
    }
    Ok(())
}

/// In-memory annotation table, typically loaded from a CSV file
#[derive(Debug, Clone, Default)]
pub struct TableAnnotationResolver {
    rows: HashMap<String, Vec<GeneAnnotation>>,
}

impl TableAnnotationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one annotation row; identifiers may repeat
    pub fn add(&mut self, id: impl Into<String>, symbol: impl Into<String>, description: impl Into<String>) {
        self.rows.entry(id.into()).or_default().push(GeneAnnotation {
            symbol: symbol.into(),
            description: description.into(),
        });
    }

    /// Number of distinct annotated identifiers
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AnnotationResolver for TableAnnotationResolver {
    fn resolve(&self, ids: &[String]) -> Result<HashMap<String, Vec<GeneAnnotation>>> {
        let mut out = HashMap::new();
        for id in ids {
            if let Some(matches) = self.rows.get(id) {
                out.insert(id.clone(), matches.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GeneRecord;

    #[test]
    fn test_collapse_multiple_matches() {
        let matches = vec![
            GeneAnnotation {
                symbol: "TP53".to_string(),
                description: "tumor protein p53".to_string(),
            },
            GeneAnnotation {
                symbol: "TP53B".to_string(),
                description: "tumor protein p53 beta".to_string(),
            },
        ];
        let (symbol, description) = collapse_annotations(&matches).unwrap();
        assert_eq!(symbol, "TP53,TP53B");
        assert_eq!(description, "tumor protein p53,tumor protein p53 beta");
    }

    #[test]
    fn test_collapse_no_matches() {
        assert!(collapse_annotations(&[]).is_none());
    }

    #[test]
    fn test_annotate_preserves_unmatched() {
        let mut table = GeneTable::new(vec![
            GeneRecord::new("g1", 1.0, 5.0, 0.01, 0.02),
            GeneRecord::new("g2", -1.0, 6.0, 0.03, 0.04),
        ])
        .unwrap();

        let mut resolver = TableAnnotationResolver::new();
        resolver.add("g1", "TP53", "tumor protein p53");
        resolver.add("g1", "TP53B", "tumor protein p53 beta");

        annotate_table(&mut table, &resolver).unwrap();

        let g1 = table.get("g1").unwrap();
        assert_eq!(g1.symbol.as_deref(), Some("TP53,TP53B"));

        // g2 has no match: kept in the table, fields left absent
        let g2 = table.get("g2").unwrap();
        assert!(g2.symbol.is_none());
        assert!(g2.description.is_none());
    }
}
