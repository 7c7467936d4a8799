use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::object::{Cell, Rows};
use tabled::settings::style::{BorderSpanCorrection, HorizontalLine, Style};
use tabled::settings::{Modify, Span, Width};
use tabled::Table;

use super::presentation::{Presentation, TableStyle};
use super::rows::{build_rows, DisplayRow, RowContext, DEFAULT_ADVISORY_URL};
use super::Reporter;
use crate::results::ScanResult;

pub const HEADERS: [&str; 6] = [
    "OSV URL (ID In Bold)",
    "Ecosystem",
    "Package",
    "Version",
    "Fixed Versions",
    "Source",
];

pub const UNCALLED_SECTION: &str = "Uncalled vulnerabilities";

/// Marker appended to cells cut to fit the allowed row length.
const TRUNCATION_MARKER: &str = "~";

/// Rows of a table with an optional section row framed by separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VulnerabilityTable {
    headers: Vec<String>,
    rows: Vec<DisplayRow>,
    section: Option<usize>,
}

impl VulnerabilityTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            section: None,
        }
    }

    pub fn append_row(&mut self, row: DisplayRow) {
        self.rows.push(row);
    }

    /// Append a single cell row spanning every column, with a separator
    /// above and below it.
    pub fn append_section(&mut self, title: &str) {
        self.section = Some(self.rows.len());
        self.rows.push(DisplayRow {
            cells: vec![title.to_string()],
            merge: false,
        });
    }

    /// Number of rows, section row included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table, or an empty string when it has no rows.
    pub fn render(&self, presentation: &Presentation) -> String {
        if self.is_empty() {
            return String::new();
        }
        let columns = self.headers.len();

        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.to_uppercase()));

        // (table row, first column, columns covered)
        let mut spans: Vec<(usize, usize, usize)> = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let mut cells = row.cells.clone();
            cells.resize(columns, String::new());
            if self.section == Some(i) {
                spans.push((i + 1, 0, columns));
            } else if row.merge {
                for (start, len) in merged_runs(&cells) {
                    for covered in &mut cells[start + 1..start + len] {
                        covered.clear();
                    }
                    spans.push((i + 1, start, len));
                }
            }
            builder.push_record(cells);
        }

        let mut table = builder.build();
        for (row, column, len) in spans {
            table.with(Modify::new(Cell::new(row, column)).with(Span::column(len as _)));
        }

        let style = presentation.table_style();
        match self.section {
            Some(i) => frame(&mut table, style, [1, i + 1, i + 2]),
            None => frame(&mut table, style, [1]),
        }

        if let Some(colors) = presentation.row_colors() {
            for i in 0..self.rows.len() {
                let color = colors[i % 2].clone();
                table.with(Modify::new(Rows::single(i + 1)).with(color));
            }
        }

        if let Some(max) = presentation.max_width.filter(|&w| w > 0) {
            table.with(Width::truncate(max).suffix(TRUNCATION_MARKER));
        }

        let mut out = table.to_string();
        out.push('\n');
        out
    }
}

/// Runs of identical adjacent non-empty cells, as (start, length).
fn merged_runs(cells: &[String]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=cells.len() {
        if i < cells.len() && !cells[i].is_empty() && cells[i] == cells[start] {
            continue;
        }
        if i - start > 1 {
            runs.push((start, i - start));
        }
        start = i;
    }
    runs
}

/// Borders with horizontal lines only above the given table rows.
fn frame<const N: usize>(table: &mut Table, style: TableStyle, lines: [usize; N]) {
    match style {
        TableStyle::Ascii => {
            let line = HorizontalLine::full('-', '+', '+', '+');
            table.with(
                Style::ascii()
                    .remove_horizontal()
                    .horizontals(lines.map(|i| (i, line))),
            );
        }
        TableStyle::Rounded => {
            let line = HorizontalLine::full('─', '┼', '├', '┤');
            table.with(Style::rounded().horizontals(lines.map(|i| (i, line))));
        }
    }
    table.with(BorderSpanCorrection);
}

/// Renders scan results as a table of vulnerable packages.
pub struct TableReporter {
    pub advisory_url: String,
    pub base_path: Option<PathBuf>,
    pub presentation: Presentation,
}

impl TableReporter {
    pub fn new(presentation: Presentation) -> Self {
        Self {
            advisory_url: DEFAULT_ADVISORY_URL.to_string(),
            base_path: None,
            presentation,
        }
    }

    pub fn with_advisory_url(mut self, url: impl Into<String>) -> Self {
        self.advisory_url = url.into();
        self
    }

    pub fn with_base_path(mut self, base_path: Option<PathBuf>) -> Self {
        self.base_path = base_path;
        self
    }

    /// Assemble the table: called rows, then a section of uncalled rows.
    pub fn build_table(&self, results: &ScanResult) -> VulnerabilityTable {
        let ctx = RowContext {
            advisory_url: &self.advisory_url,
            base_path: self.base_path.as_deref(),
            emphasis: self.presentation.emphasis(),
        };
        let rows = build_rows(results, &ctx);

        let mut table = VulnerabilityTable::new(HEADERS);
        for row in rows.called {
            table.append_row(row);
        }

        if rows.uncalled.is_empty() {
            return table;
        }

        table.append_section(UNCALLED_SECTION);
        for row in rows.uncalled {
            table.append_row(row);
        }

        table
    }

    /// Write the table to `out`. Nothing is written when there are no rows.
    pub fn write_to<W: Write>(&self, results: &ScanResult, out: &mut W) -> Result<usize> {
        let table = self.build_table(results);
        if table.is_empty() {
            return Ok(0);
        }
        out.write_all(table.render(&self.presentation).as_bytes())?;
        out.flush()?;
        Ok(table.len())
    }
}

impl Reporter for TableReporter {
    fn render(&self, results: &ScanResult) -> Result<String> {
        Ok(self.build_table(results).render(&self.presentation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::presentation::{Bold, Emphasis};
    use crate::results::*;

    fn row(cells: &[&str], merge: bool) -> DisplayRow {
        DisplayRow {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            merge,
        }
    }

    fn package(ecosystem: &str, name: &str, groups: Vec<VulnerabilityGroup>) -> PackageResult {
        PackageResult {
            package: PackageInfo {
                name: name.to_string(),
                version: "1.0.0".to_string(),
                ecosystem: ecosystem.to_string(),
            },
            vulnerabilities: vec![],
            groups,
        }
    }

    fn scan(packages: Vec<PackageResult>) -> ScanResult {
        ScanResult {
            results: vec![SourceResult {
                source: SourceInfo {
                    path: "/work/Cargo.lock".to_string(),
                    source_type: "lockfile".to_string(),
                },
                packages,
            }],
        }
    }

    fn mixed_results() -> ScanResult {
        scan(vec![
            package(
                "crates.io",
                "called-crate",
                vec![VulnerabilityGroup::new(["RUSTSEC-1"])],
            ),
            package(
                "crates.io",
                "quiet-crate",
                vec![VulnerabilityGroup::new(["RUSTSEC-2"]).with_analysis("RUSTSEC-2", false)],
            ),
            package(
                "crates.io",
                "other-crate",
                vec![VulnerabilityGroup::new(["RUSTSEC-3"])],
            ),
        ])
    }

    fn lines(out: &str) -> Vec<String> {
        console::strip_ansi_codes(out)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_ascii_layout() {
        let mut table = VulnerabilityTable::new(["A", "Bb"]);
        table.append_row(row(&["x", "yyyy"], false));
        assert_eq!(
            table.render(&Presentation::plain()),
            "+---+------+\n\
             | A | BB   |\n\
             +---+------+\n\
             | x | yyyy |\n\
             +---+------+\n"
        );
    }

    #[test]
    fn test_multiline_cells() {
        let mut table = VulnerabilityTable::new(["Id", "Fix"]);
        table.append_row(row(&["a\nbb", "1"], false));
        let out = table.render(&Presentation::plain());
        assert!(out.contains("| a  | 1   |\n| bb |     |\n"));
    }

    #[test]
    fn test_merged_cells_span_columns() {
        let mut table = VulnerabilityTable::new(["Eco", "Name", "Version"]);
        table.append_row(row(&["GIT", "abcdef", "abcdef"], true));
        let out = lines(&table.render(&Presentation::plain()));
        assert_eq!(out[3].matches("abcdef").count(), 1);
        assert!(out[3].starts_with("| GIT | abcdef"));
        assert_eq!(out[3].matches('|').count(), 3);
    }

    #[test]
    fn test_identical_cells_not_merged_without_flag() {
        let mut table = VulnerabilityTable::new(["Eco", "Name", "Version"]);
        table.append_row(row(&["GIT", "abcdef", "abcdef"], false));
        assert_eq!(table.render(&Presentation::plain()).matches("abcdef").count(), 2);
    }

    #[test]
    fn test_empty_cells_never_merge() {
        let cells = |texts: &[&str]| texts.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert!(merged_runs(&cells(&["a", "", ""])).is_empty());
        assert_eq!(merged_runs(&cells(&["x", "y", "y", "y"])), vec![(1, 3)]);
    }

    #[test]
    fn test_section_row_spans_table() {
        let mut table = VulnerabilityTable::new(["A", "B"]);
        table.append_row(row(&["1", "2"], false));
        table.append_section("Section");
        table.append_row(row(&["3", "4"], false));
        assert_eq!(table.len(), 3);

        let out = lines(&table.render(&Presentation::plain()));
        assert_eq!(out.len(), 9);
        assert!(out[4].starts_with("+-"));
        assert!(out[5].starts_with("| Section"));
        assert_eq!(out[5].matches('|').count(), 2);
        assert!(out[6].starts_with("+-"));
        assert!(out[7].starts_with("| 3 "));
    }

    #[test]
    fn test_rounded_junctions_follow_spans() {
        let mut table = VulnerabilityTable::new(["A", "B"]);
        table.append_row(row(&["1", "2"], false));
        table.append_section("Section");
        let out = lines(&table.render(&Presentation::interactive(None)));
        assert!(out[0].starts_with('╭'));
        assert!(out[4].starts_with('├'));
        assert!(out[4].contains('┴'));
        assert!(!out[4].contains('┼'));
        assert!(out[6].starts_with('╰'));
    }

    #[test]
    fn test_rows_clipped_to_allowed_length() {
        let mut table = VulnerabilityTable::new(["Name"]);
        table.append_row(row(&["a-very-long-package-name"], false));
        let out = lines(&table.render(&Presentation::interactive(Some(10))));
        assert!(out.iter().any(|line| line.contains('~')));
        for line in out {
            assert!(line.chars().count() <= 10, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_zero_row_length_is_not_applied() {
        let mut table = VulnerabilityTable::new(["Name"]);
        table.append_row(row(&["a-very-long-package-name"], false));
        let presentation = Presentation {
            interactive: false,
            max_width: Some(0),
        };
        assert!(table
            .render(&presentation)
            .contains("| a-very-long-package-name |"));
    }

    #[test]
    fn test_background_covers_emphasized_cell() {
        let mut table = VulnerabilityTable::new(["Id"]);
        let cell = format!("x{}y", Bold.emphasize("B"));
        table.append_row(row(&[cell.as_str()], false));
        let out = table.render(&Presentation::interactive(None));

        let line = out.lines().nth(3).unwrap();
        assert!(line.contains("\u{1b}[100m"));
        assert!(line.contains("\u{1b}[1mB\u{1b}[22my"));
        assert!(!line.contains("\u{1b}[0my"));
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let table = VulnerabilityTable::new(HEADERS);
        assert!(table.is_empty());
        assert_eq!(table.render(&Presentation::interactive(Some(80))), "");
    }

    #[test]
    fn test_no_groups_writes_zero_bytes() {
        let results = scan(vec![package("npm", "clean", vec![])]);
        let reporter = TableReporter::new(Presentation::plain());
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(reporter.write_to(&results, &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert_eq!(reporter.render(&results).unwrap(), "");
    }

    #[test]
    fn test_uncalled_section_after_called_rows() {
        let reporter = TableReporter::new(Presentation::plain());
        let out = reporter.render(&mixed_results()).unwrap();

        assert_eq!(out.matches(UNCALLED_SECTION).count(), 1);
        let section = out.find(UNCALLED_SECTION).unwrap();
        assert!(out.find("called-crate").unwrap() < section);
        assert!(out.find("other-crate").unwrap() < section);
        assert!(out.find("quiet-crate").unwrap() > section);
    }

    #[test]
    fn test_no_section_without_uncalled_rows() {
        let results = scan(vec![package(
            "npm",
            "x",
            vec![VulnerabilityGroup::new(["GHSA-1"])],
        )]);
        let reporter = TableReporter::new(Presentation::plain());
        let table = reporter.build_table(&results);
        assert_eq!(table.len(), 1);
        assert!(!table.render(&reporter.presentation).contains(UNCALLED_SECTION));
    }

    #[test]
    fn test_only_uncalled_rows_still_rendered() {
        let results = scan(vec![package(
            "npm",
            "x",
            vec![VulnerabilityGroup::new(["GHSA-1"]).with_analysis("GHSA-1", false)],
        )]);
        let reporter = TableReporter::new(Presentation::plain());
        let out = reporter.render(&results).unwrap();
        assert!(out.contains(UNCALLED_SECTION));
        assert!(out.contains("https://osv.dev/GHSA-1"));
    }

    #[test]
    fn test_headers_and_links() {
        let reporter = TableReporter::new(Presentation::plain())
            .with_advisory_url("https://example.test/vuln/")
            .with_base_path(Some(PathBuf::from("/work")));
        let out = reporter.render(&mixed_results()).unwrap();
        assert!(out.contains("OSV URL (ID IN BOLD)"));
        assert!(out.contains("FIXED VERSIONS"));
        assert!(out.contains("https://example.test/vuln/RUSTSEC-1"));
        assert!(out.contains(" Cargo.lock "));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_interactive_output_is_styled() {
        let reporter = TableReporter::new(Presentation::interactive(None));
        let out = reporter.render(&mixed_results()).unwrap();
        assert!(out.contains('\u{1b}'));
        assert!(out.contains('╭'));
        assert!(console::strip_ansi_codes(&out).contains("https://osv.dev/RUSTSEC-1"));
    }
}
