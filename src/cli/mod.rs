//! Command-line interface for de_explorer

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "de_explorer")]
#[command(version)]
#[command(about = "Interactive differential expression report engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one full report cycle: test, classify, optionally enrich
    #[command(
        long_about = "Run one full report cycle.\n\n\
            Loads the count matrix and sample groups, runs the differential\n\
            expression test with BH correction, commits the given thresholds\n\
            to classify genes as Up/Down/NoChange, and writes the labeled\n\
            table, summary and MA-plot inputs. With --enrich it additionally\n\
            commits the enrichment stage against gene length and category\n\
            files.",
        after_long_help = "\
Examples:
  # Classify with custom thresholds
  de_explorer report -c counts.csv -g groups.csv --fdr 0.01 --lfc 1.5

  # With annotation and ontology enrichment
  de_explorer report -c counts.csv -g groups.csv -a annotations.csv \\
    --enrich --lengths lengths.csv --categories go_map.csv

  # Enrichment without length-bias correction
  de_explorer report -c counts.csv -g groups.csv --enrich \\
    --lengths lengths.csv --categories go_map.csv --no-length-bias"
    )]
    Report {
        /// Path to count matrix CSV/TSV file
        #[arg(short, long,
            long_help = "Path to count matrix file.\n\
                Format: first column = gene IDs, remaining columns = raw counts\n\
                per sample. CSV and TSV delimiters are auto-detected.")]
        counts: String,

        /// Path to sample group file
        #[arg(short, long,
            long_help = "Path to sample group file.\n\
                Format: first column = sample ID (matching count matrix\n\
                columns), second column = group label. Exactly two distinct\n\
                groups are required; the alphabetically first is the\n\
                reference level.")]
        groups: String,

        /// Path to gene annotation file (gene_id,symbol,description)
        #[arg(short, long)]
        annotations: Option<String>,

        /// FDR cutoff on the adjusted p-value [default: 0.05]
        #[arg(long, default_value = "0.05",
            long_help = "FDR cutoff on the BH-adjusted p-value.\n\
                Must lie in (0, 0.25].")]
        fdr: f64,

        /// Minimum absolute log2 fold change [default: 1.0]
        #[arg(long, default_value = "1.0")]
        lfc: f64,

        /// Minimum log2 CPM abundance [default: 0.5]
        #[arg(long, default_value = "0.5")]
        cpm: f64,

        /// Run the ontology enrichment stage
        #[arg(long,
            long_help = "Run the ontology enrichment stage after classification.\n\
                Requires --lengths and --categories.")]
        enrich: bool,

        /// Path to gene length file (gene_id,length)
        #[arg(long)]
        lengths: Option<String>,

        /// Path to category map file (gene_id,category,term,ontology)
        #[arg(long)]
        categories: Option<String>,

        /// Disable gene length bias correction
        #[arg(long,
            long_help = "Disable gene length bias correction.\n\
                By default the enrichment test resamples DE sets weighted by\n\
                a length-bias probability weighting function; with this flag\n\
                it falls back to a plain hypergeometric test.")]
        no_length_bias: bool,

        /// Resampling iterations for the bias-corrected test [default: 2000]
        #[arg(long, default_value = "2000")]
        iterations: usize,

        /// RNG seed for the resampling null [default: 0]
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Genome build for the weighting configuration [default: hg38]
        #[arg(long, default_value = "hg38")]
        genome: String,

        /// Gene identifier space [default: ensGene]
        #[arg(long, default_value = "ensGene")]
        id_space: String,

        /// Output path for the labeled table [default: de_table.tsv]
        #[arg(short, long, default_value = "de_table.tsv")]
        output: String,

        /// Output path for the status summary [default: de_summary.json]
        #[arg(long, default_value = "de_summary.json")]
        summary: String,

        /// Output path for the enrichment table [default: enrichment.tsv]
        #[arg(long, default_value = "enrichment.tsv")]
        enrichment_output: String,
    },
}
