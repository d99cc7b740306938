//! Gene-to-category mapping with term metadata

use std::collections::{BTreeMap, HashMap};

/// Term label and ontology branch for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub term: String,
    pub ontology: String,
}

/// Bidirectional gene <-> category mapping
///
/// Categories are kept in a sorted map so iteration order, and therefore
/// output row order on p-value ties, is deterministic.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    categories: BTreeMap<String, CategoryInfo>,
    category_genes: BTreeMap<String, Vec<String>>,
    gene_categories: HashMap<String, Vec<String>>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one gene-to-category association
    ///
    /// The first term/ontology seen for a category wins; later rows for the
    /// same category only extend its gene set.
    pub fn add(
        &mut self,
        gene_id: impl Into<String>,
        category: impl Into<String>,
        term: impl Into<String>,
        ontology: impl Into<String>,
    ) {
        let gene_id = gene_id.into();
        let category = category.into();

        self.categories.entry(category.clone()).or_insert_with(|| CategoryInfo {
            term: term.into(),
            ontology: ontology.into(),
        });

        let genes = self.category_genes.entry(category.clone()).or_default();
        if !genes.contains(&gene_id) {
            genes.push(gene_id.clone());
        }

        let cats = self.gene_categories.entry(gene_id).or_default();
        if !cats.contains(&category) {
            cats.push(category);
        }
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories in sorted order with their metadata
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryInfo)> {
        self.categories.iter()
    }

    /// Term metadata for a category
    pub fn info(&self, category: &str) -> Option<&CategoryInfo> {
        self.categories.get(category)
    }

    /// Genes annotated to a category
    pub fn genes_of(&self, category: &str) -> &[String] {
        self.category_genes
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Categories a gene is annotated to
    pub fn categories_of(&self, gene_id: &str) -> &[String] {
        self.gene_categories
            .get(gene_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
