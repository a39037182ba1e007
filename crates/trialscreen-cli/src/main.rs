mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trialscreen_core::export::{write_csv, write_jsonl};
use trialscreen_core::{CompiledCriteria, Criteria, ExportRow, Record, Screener, Summary, Verification};
use trialscreen_runtime::{
    load_records, provider_from_config, LoggingApplier, Orchestrator, RuntimeConfig,
};

use cli::{Cli, Commands, ExportFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout may carry the export
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Screen {
            input,
            criteria,
            config,
            output,
            format,
            mode,
            verify_doi,
            limit,
            apply,
        } => {
            let mut config = match config {
                Some(path) => RuntimeConfig::from_file(&path)
                    .with_context(|| format!("loading runtime config {}", path.display()))?,
                None => RuntimeConfig::default(),
            };
            if let Some(mode) = mode {
                config.mode = mode.into();
            }
            if verify_doi {
                config.verification.enabled = true;
            }

            cmd_screen(
                &input,
                &criteria,
                config,
                output.as_deref(),
                format,
                limit,
                apply,
            )
            .await
        }
        Commands::Check { file } => cmd_check(&file),
        Commands::Explain {
            title,
            abstract_text,
            criteria,
        } => cmd_explain(title, abstract_text, criteria.as_deref()),
    }
}

fn load_criteria(path: &Path) -> Result<CompiledCriteria> {
    Criteria::from_file(path)
        .and_then(Criteria::compile)
        .with_context(|| format!("loading criteria {}", path.display()))
}

async fn cmd_screen(
    input: &Path,
    criteria: &Path,
    config: RuntimeConfig,
    output: Option<&Path>,
    format: ExportFormat,
    limit: Option<usize>,
    apply: bool,
) -> Result<()> {
    let criteria = Arc::new(load_criteria(criteria)?);

    let mut records = load_records(input)
        .with_context(|| format!("reading records from {}", input.display()))?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    let mut builder = Orchestrator::builder()
        .config(config.clone())
        .criteria(criteria);
    if config.mode.needs_provider() {
        let provider = provider_from_config(&config)
            .with_context(|| format!("creating '{}' provider", config.provider.kind))?;
        builder = builder.provider(provider);
    }
    if apply {
        builder = builder.applier(Arc::new(LoggingApplier));
    }
    let orchestrator = builder.build()?;

    let screened = orchestrator.screen_all(records).await;
    let rows: Vec<ExportRow> = screened
        .iter()
        .map(|s| ExportRow::new(&s.record, &s.result))
        .collect();

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            export(BufWriter::new(file), format, &rows)?;
            tracing::info!(path = %path.display(), rows = rows.len(), "results written");
        }
        None => export(io::stdout().lock(), format, &rows)?,
    }

    let summary = Summary::from_results(screened.iter().map(|s| &s.result));
    eprintln!("{}", summary);
    Ok(())
}

fn export<W: Write>(mut out: W, format: ExportFormat, rows: &[ExportRow]) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(&mut out, rows),
        ExportFormat::Jsonl => write_jsonl(&mut out, rows),
    }
    .context("writing results")?;
    out.flush().context("writing results")?;
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let compiled = load_criteria(path)?;
    let criteria = compiled.criteria();
    println!("{}: valid", path.display());
    println!("  exclude_keywords:    {}", criteria.exclude_keywords.len());
    println!("  study_types_exclude: {}", criteria.study_types_exclude.len());
    println!("  include_keywords:    {}", criteria.include_keywords.len());
    if !criteria.research_topic.is_empty() {
        println!("  research_topic:      {}", criteria.research_topic);
    }
    Ok(())
}

fn cmd_explain(title: String, abstract_text: String, criteria: Option<&Path>) -> Result<()> {
    let criteria = match criteria {
        Some(path) => load_criteria(path)?,
        None => CompiledCriteria::empty(),
    };

    let record = Record::new(title, abstract_text);
    let report = Screener::default().screen_detailed(&record, &criteria, Verification::Unknown);

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
