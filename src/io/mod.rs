//! File loading and artifact writing

mod csv;
mod results;

pub use csv::{
    read_annotation_table, read_category_map, read_count_matrix, read_gene_lengths,
    read_sample_groups,
};
pub use results::{write_enrichment_table, write_labeled_table, write_summary_json};
