//! Turns scan results into display rows.
//!
//! One row is produced per vulnerability group. Rows of groups whose
//! vulnerable code is called and rows of uncalled groups are collected in a
//! single traversal into [`PartitionedRows`].

use std::path::{Component, Path, PathBuf};

use super::presentation::Emphasis;
use crate::results::{PackageResult, ScanResult, VulnerabilityGroup};

/// Default prefix for advisory links.
pub const DEFAULT_ADVISORY_URL: &str = "https://osv.dev/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Called,
    Uncalled,
}

impl Partition {
    pub fn of(group: &VulnerabilityGroup) -> Partition {
        if group.is_called() {
            Partition::Called
        } else {
            Partition::Uncalled
        }
    }
}

/// One table row: cell texts plus whether identical neighbours are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub cells: Vec<String>,
    pub merge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionedRows {
    pub called: Vec<DisplayRow>,
    pub uncalled: Vec<DisplayRow>,
}

impl PartitionedRows {
    pub fn take(self, partition: Partition) -> Vec<DisplayRow> {
        match partition {
            Partition::Called => self.called,
            Partition::Uncalled => self.uncalled,
        }
    }

    fn push(&mut self, partition: Partition, row: DisplayRow) {
        match partition {
            Partition::Called => self.called.push(row),
            Partition::Uncalled => self.uncalled.push(row),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.called.is_empty() && self.uncalled.is_empty()
    }
}

/// Inputs of row building that do not come from the scan results.
pub struct RowContext<'a> {
    pub advisory_url: &'a str,
    pub base_path: Option<&'a Path>,
    pub emphasis: &'a dyn Emphasis,
}

/// Build the rows of both partitions.
pub fn build_rows(results: &ScanResult, ctx: &RowContext<'_>) -> PartitionedRows {
    let mut rows = PartitionedRows::default();

    for source_result in &results.results {
        let source_path = simplify_path(&source_result.source.path, ctx.base_path);

        for pkg in &source_result.packages {
            for group in &pkg.groups {
                let row = build_row(pkg, group, &source_path, ctx);
                rows.push(Partition::of(group), row);
            }
        }
    }

    rows
}

/// Build the rows of a single partition.
pub fn build_partition(
    results: &ScanResult,
    ctx: &RowContext<'_>,
    partition: Partition,
) -> Vec<DisplayRow> {
    build_rows(results, ctx).take(partition)
}

fn build_row(
    pkg: &PackageResult,
    group: &VulnerabilityGroup,
    source_path: &str,
    ctx: &RowContext<'_>,
) -> DisplayRow {
    let links = group
        .ids
        .iter()
        .map(|id| format!("{}{}", ctx.advisory_url, ctx.emphasis.emphasize(id)))
        .collect::<Vec<_>>()
        .join("\n");

    let package = &pkg.package;
    let mut cells = vec![links];
    let merge = if package.is_git() {
        cells.push("GIT".to_string());
        cells.push(package.version.clone());
        cells.push(package.version.clone());
        true
    } else {
        cells.push(package.ecosystem.clone());
        cells.push(package.name.clone());
        cells.push(package.version.clone());
        false
    };

    let fixed = fixed_versions(pkg, group)
        .iter()
        .map(|v| ctx.emphasis.emphasize(v))
        .collect::<Vec<_>>()
        .join("\n");
    cells.push(fixed);
    cells.push(source_path.to_string());

    DisplayRow { cells, merge }
}

/// Distinct fixed versions of the group's vulnerabilities for this package,
/// in first-seen order.
pub fn fixed_versions(pkg: &PackageResult, group: &VulnerabilityGroup) -> Vec<String> {
    let mut versions: Vec<String> = Vec::new();

    let vulns = pkg.vulnerabilities.iter().filter(|v| group.contains(&v.id));
    for vuln in vulns {
        let affected = vuln
            .affected
            .iter()
            .filter(|a| a.matches(&pkg.package.ecosystem, &pkg.package.name));
        for aff in affected {
            for range in &aff.ranges {
                let Some(fixed) = range.fixed_version() else {
                    log::debug!(
                        "Skipping {} range of {} without a fixed event at position 1",
                        range.range_type,
                        vuln.id
                    );
                    continue;
                };
                if !versions.contains(&fixed) {
                    versions.push(fixed);
                }
            }
        }
    }

    versions
}

/// Express `path` relative to `base` for display, or return it unchanged.
pub fn simplify_path(path: &str, base: Option<&Path>) -> String {
    let Some(base) = base else {
        return path.to_string();
    };
    match relative_to(Path::new(path), base) {
        Some(rel) => rel.to_string_lossy().to_string(),
        None => {
            log::debug!(
                "Keeping source path {:?}, not expressible relative to {}",
                path,
                base.display()
            );
            path.to_string()
        }
    }
}

/// Lexical relative path from `base` to `path`.
///
/// Both paths must be absolute or both relative, and share the same root.
/// Returns `None` when `base` has `..` components past the common prefix.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path: Vec<Component> = normalized(path);
    let base: Vec<Component> = normalized(base);

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Roots and drive prefixes must be shared.
    if common < root_len(&path).max(root_len(&base)) {
        return None;
    }

    let mut rel = PathBuf::new();
    for comp in &base[common..] {
        match comp {
            Component::Normal(_) => rel.push(".."),
            _ => return None,
        }
    }
    for comp in &path[common..] {
        rel.push(comp.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

fn root_len(components: &[Component<'_>]) -> usize {
    components
        .iter()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .count()
}

/// Lexically clean a path: drop `.` and resolve `..` against preceding names.
fn normalized(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir) => {}
                _ => out.push(comp),
            },
            _ => out.push(comp),
        }
    }
    out
}
