//! Data structures: count matrix, sample groups, gene table, annotations

mod annotation;
mod count_matrix;
mod gene_table;

pub use annotation::{
    annotate_table, collapse_annotations, AnnotationResolver, GeneAnnotation,
    TableAnnotationResolver,
};
pub use count_matrix::{CountMatrix, SampleGroups};
pub use gene_table::{GeneRecord, GeneTable, Status};

pub(crate) use gene_table::cmp_padj;
