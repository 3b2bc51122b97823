mod cli;

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lendutan_converter_lib::config::{self, default_output_path, normalize_output_path};
use lendutan_converter_lib::inputs::{collect_inputs, load_documents};
use lendutan_converter_lib::{pipeline, DocumentOutcome, FunctlogDb, OutputWorkbook, RunConfig};

use crate::cli::Cli;

fn main() {
    config::load_env();
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "conversion failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RunConfig {
        start_row: cli.start_row,
        sheet_name: cli.sheet.clone(),
        append_after_last_row: cli.append_after_last_row,
    };
    config.validate()?;

    let paths = collect_inputs(&cli.inputs).context("collecting input documents")?;
    if paths.is_empty() {
        bail!("no .docx documents found in the given inputs");
    }
    let documents = load_documents(&paths).context("reading input documents")?;

    let store = FunctlogDb::open(&cli.db).context("opening reference database")?;
    let mut workbook = OutputWorkbook::open(cli.template.as_deref(), config.sheet_name.as_deref())?;

    config.start_row = workbook
        .start_row(&config)
        .context("scanning template for its last used row")?;
    info!(
        documents = documents.len(),
        start_row = config.start_row,
        sheet = %workbook.sheet_name(),
        "starting conversion"
    );

    let report = pipeline::run(documents, store, &mut workbook, &config)?;

    let output = cli
        .output
        .as_deref()
        .map(normalize_output_path)
        .unwrap_or_else(default_output_path);
    workbook
        .save(&output)
        .with_context(|| format!("saving workbook to {}", output.display()))?;
    info!(path = %output.display(), "saved workbook");

    if let Some(report_path) = cli.report.as_deref() {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(report_path, json)
            .with_context(|| format!("writing report to {}", report_path.display()))?;
        info!(path = %report_path.display(), "wrote run report");
    }

    let skipped = report.count(|o| !matches!(o, DocumentOutcome::RowsAppended { .. }));
    println!(
        "{} rows appended (rows {}..{}), {} of {} documents skipped, {} lookup warnings -> {}",
        report.rows_appended,
        report.first_row,
        report.next_row,
        skipped,
        report.documents.len(),
        report.warnings.len(),
        output.display()
    );

    if cli.open {
        opener::open(&output).with_context(|| format!("opening {}", output.display()))?;
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
