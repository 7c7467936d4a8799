use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::Path;
use std::process;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use env_logger::Env;

use osv_table::cli::Cli;
use osv_table::config::{load_config_or_default, load_project_config, ProjectConfig};
use osv_table::report::{Presentation, TableReporter};
use osv_table::results::{self, ScanResult};

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::init_from_env(Env::default().default_filter_or(log_level));

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            process::exit(2);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = match std::env::current_dir() {
        Ok(dir) => Some(dir),
        Err(err) => {
            log::debug!("Cannot resolve working directory: {}", err);
            None
        }
    };

    let config = match &cli.config {
        Some(path) => load_project_config(path)?,
        None => cwd
            .as_deref()
            .map(load_config_or_default)
            .unwrap_or_default(),
    };

    let scan = read_results(cli)?;
    let groups = scan.groups().count();
    log::info!(
        "Rendering {} vulnerability groups from {} sources",
        groups,
        scan.results.len()
    );

    let stdout = io::stdout();
    let reporter = build_reporter(cli, &config, Presentation::detect(&stdout), cwd);

    let mut out = stdout.lock();
    let rows = reporter.write_to(&scan, &mut out)?;
    out.flush()?;

    if rows > 0 && !cli.exit_zero {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn read_results(cli: &Cli) -> Result<ScanResult> {
    if cli.reads_stdin() {
        results::from_reader(io::stdin().lock())
    } else {
        results::load_results(Path::new(&cli.input))
    }
}

fn build_reporter(
    cli: &Cli,
    config: &ProjectConfig,
    detected: Presentation,
    cwd: Option<std::path::PathBuf>,
) -> TableReporter {
    let presentation = detected
        .with_color(cli.color.unwrap_or(config.color))
        .with_max_width(cli.max_width.or(config.max_width).map(NonZeroUsize::get));

    let advisory_url = cli
        .advisory_url
        .clone()
        .unwrap_or_else(|| config.advisory_url().to_string());

    TableReporter::new(presentation)
        .with_advisory_url(advisory_url)
        .with_base_path(cli.base_path.clone().or(cwd))
}
