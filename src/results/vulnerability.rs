use serde::{Deserialize, Serialize};
use std::fmt;

/// Ecosystem tag osv-scanner assigns to packages resolved from git commits.
pub const GIT_ECOSYSTEM: &str = "GIT";

/// Number of characters of a commit hash shown as a fixed version.
pub const COMMIT_DISPLAY_LEN: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub affected: Vec<Affected>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affected {
    #[serde(default)]
    pub package: AffectedPackage,
    #[serde(default)]
    pub ranges: Vec<Range>,
}

impl Affected {
    /// Exact match on both ecosystem and name.
    pub fn matches(&self, ecosystem: &str, name: &str) -> bool {
        self.package.ecosystem == ecosystem && self.package.name == name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedPackage {
    #[serde(default)]
    pub ecosystem: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeType {
    Semver,
    Ecosystem,
    Git,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeType::Semver => write!(f, "SEMVER"),
            RangeType::Ecosystem => write!(f, "ECOSYSTEM"),
            RangeType::Git => write!(f, "GIT"),
            RangeType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(rename = "type")]
    pub range_type: RangeType,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Range {
    /// The fixed point of this range, read from the second event.
    ///
    /// Events are ordered introduced-then-fixed. Returns `None` when the
    /// range has no second event or that event is not a fix. Commit hashes
    /// of `GIT` ranges are shortened to [`COMMIT_DISPLAY_LEN`] characters.
    pub fn fixed_version(&self) -> Option<String> {
        let fixed = self.events.get(1)?.fixed.as_deref()?;
        match self.range_type {
            RangeType::Git => Some(fixed.chars().take(COMMIT_DISPLAY_LEN).collect()),
            _ => Some(fixed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_affected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl Event {
    pub fn introduced(version: &str) -> Self {
        Self {
            introduced: Some(version.to_string()),
            ..Self::default()
        }
    }

    pub fn fixed(version: &str) -> Self {
        Self {
            fixed: Some(version.to_string()),
            ..Self::default()
        }
    }
}
