pub mod vulnerability;

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use vulnerability::{Affected, AffectedPackage, Event, Range, RangeType, Vulnerability};

/// Results of one osv-scanner run, as written by `osv-scanner --format json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub results: Vec<SourceResult>,
}

impl ScanResult {
    /// Iterate every group of every package, in traversal order.
    pub fn groups(&self) -> impl Iterator<Item = &VulnerabilityGroup> {
        self.results
            .iter()
            .flat_map(|source| source.packages.iter())
            .flat_map(|pkg| pkg.groups.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceResult {
    pub source: SourceInfo,
    #[serde(default)]
    pub packages: Vec<PackageResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub path: String,
    #[serde(rename = "type", default)]
    pub source_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    pub package: PackageInfo,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub groups: Vec<VulnerabilityGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub ecosystem: String,
}

impl PackageInfo {
    /// Packages resolved from a git commit carry no name of their own.
    pub fn is_git(&self) -> bool {
        self.ecosystem == vulnerability::GIT_ECOSYSTEM
    }
}

/// Vulnerability ids that describe the same advisory for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityGroup {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(
        rename = "experimentalAnalysis",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub experimental_analysis: BTreeMap<String, AnalysisInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_severity: Option<String>,
}

impl VulnerabilityGroup {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_analysis(mut self, id: &str, called: bool) -> Self {
        self.experimental_analysis
            .insert(id.to_string(), AnalysisInfo { called });
        self
    }

    /// Whether the vulnerable code is reachable from the scanned project.
    ///
    /// A group without ids is never called. Without any call analysis the
    /// group is assumed to be called; otherwise a single positive analysis
    /// is enough.
    pub fn is_called(&self) -> bool {
        if self.ids.is_empty() {
            return false;
        }
        if self.experimental_analysis.is_empty() {
            return true;
        }
        self.experimental_analysis.values().any(|a| a.called)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|gid| gid == id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisInfo {
    #[serde(default)]
    pub called: bool,
}

/// Parse osv-scanner JSON results from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<ScanResult> {
    let results: ScanResult =
        serde_json::from_reader(reader).context("Failed to parse osv-scanner results")?;
    Ok(results)
}

/// Load osv-scanner JSON results from a file.
pub fn load_results(path: &Path) -> Result<ScanResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open results file {}", path.display()))?;
    let results = from_reader(std::io::BufReader::new(file))?;
    log::debug!(
        "Loaded {} source results from {}",
        results.results.len(),
        path.display()
    );
    Ok(results)
}
