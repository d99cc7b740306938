//! de_explorer command-line interface

use clap::Parser;
use log::{info, LevelFilter};

use de_explorer::cli::{Cli, Commands};
use de_explorer::prelude::*;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Report {
            counts,
            groups,
            annotations,
            fdr,
            lfc,
            cpm,
            enrich,
            lengths,
            categories,
            no_length_bias,
            iterations,
            seed,
            genome,
            id_space,
            output,
            summary,
            enrichment_output,
        }) => run_report(ReportArgs {
            counts,
            groups,
            annotations,
            fdr,
            lfc,
            cpm,
            enrich,
            lengths,
            categories,
            no_length_bias,
            iterations,
            seed,
            genome,
            id_space,
            output,
            summary,
            enrichment_output,
        }),
        None => {
            eprintln!("No command given. Try 'de_explorer report --help'.");
            return;
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

struct ReportArgs {
    counts: String,
    groups: String,
    annotations: Option<String>,
    fdr: f64,
    lfc: f64,
    cpm: f64,
    enrich: bool,
    lengths: Option<String>,
    categories: Option<String>,
    no_length_bias: bool,
    iterations: usize,
    seed: u64,
    genome: String,
    id_space: String,
    output: String,
    summary: String,
    enrichment_output: String,
}

fn run_report(args: ReportArgs) -> Result<()> {
    info!("Loading count matrix from {}", args.counts);
    let matrix = read_count_matrix(&args.counts)?;
    let groups = read_sample_groups(&args.groups, &matrix)?;
    info!(
        "{} genes x {} samples ({} vs {})",
        matrix.n_genes(),
        matrix.n_samples(),
        groups.comparison(),
        groups.reference()
    );

    let resolver = match &args.annotations {
        Some(path) => Some(read_annotation_table(path)?),
        None => None,
    };

    let engine = WelchEngine::default();
    let base = build_gene_table(
        &matrix,
        &groups,
        &engine,
        resolver.as_ref().map(|r| r as &dyn AnnotationResolver),
    )?;

    let mut session = ReportSession::new(base);
    if args.enrich {
        let lengths_path = args.lengths.as_deref().ok_or_else(|| {
            ExplorerError::InvalidParameter {
                name: "lengths".to_string(),
                reason: "--enrich requires --lengths".to_string(),
            }
        })?;
        let categories_path = args.categories.as_deref().ok_or_else(|| {
            ExplorerError::InvalidParameter {
                name: "categories".to_string(),
                reason: "--enrich requires --categories".to_string(),
            }
        })?;
        let mut resources = EnrichmentResources::new(
            read_gene_lengths(lengths_path)?,
            read_category_map(categories_path)?,
            GenomeConfig::new(&args.genome, &args.id_space),
        );
        resources.enrichment = Box::new(StandardEnrichment::new(args.iterations, args.seed));
        session = session.with_enrichment(resources);
    }

    // One classification commit with the requested thresholds
    session.set_fdr(args.fdr);
    session.set_min_abs_log_fc(args.lfc);
    session.set_min_log_cpm(args.cpm);
    session.commit_thresholds()?;

    print!("{}", session.summary());
    write_labeled_table(&args.output, session.sorted_table())?;
    write_summary_json(
        &args.summary,
        session.summary(),
        session.store().committed_thresholds(),
    )?;
    info!("Labeled table written to {}", args.output);

    if args.enrich {
        session.set_length_bias_correction(!args.no_length_bias);
        session.commit_enrichment()?;
        if let Some(output) = session.enrichment().output() {
            write_enrichment_table(&args.enrichment_output, &output.table)?;
            info!(
                "Enrichment table ({} categories) written to {}",
                output.table.len(),
                args.enrichment_output
            );
        }
    }

    Ok(())
}
