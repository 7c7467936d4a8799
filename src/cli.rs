use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::report::presentation::ColorChoice;

#[derive(Debug, Parser)]
#[command(
    name = "osv-table",
    about = "Render osv-scanner results as a human friendly table",
    version
)]
pub struct Cli {
    /// osv-scanner JSON results (`osv-scanner --format json`), `-` for stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Configuration file (defaults to ./.osv-table.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// When to style the table
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,

    /// Directory source paths are shown relative to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub base_path: Option<PathBuf>,

    /// Prefix of the advisory links
    #[arg(long, value_name = "URL")]
    pub advisory_url: Option<String>,

    /// Maximum row width
    #[arg(long, value_name = "COLUMNS")]
    pub max_width: Option<NonZeroUsize>,

    /// Exit with 0 even when vulnerabilities are reported
    #[arg(long)]
    pub exit_zero: bool,

    /// Turn debugging information on
    #[arg(short, long, action(ArgAction::Count))]
    pub verbose: u8,
}

impl Cli {
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}
