pub mod presentation;
pub mod rows;
pub mod table;

use crate::results::ScanResult;
use anyhow::Result;

pub use presentation::{Bold, ColorChoice, Emphasis, Plain, Presentation};
pub use rows::{build_partition, build_rows, DisplayRow, Partition, PartitionedRows, RowContext};
pub use table::{TableReporter, VulnerabilityTable};

pub trait Reporter {
    fn render(&self, results: &ScanResult) -> Result<String>;
}
