//! Parsers for the text and JSON the package tool prints.
//!
//! The plain-text listings are tables with a fixed two-line header
//! (`Package Version` and a dashed rule); they are counted, not parsed.
//! Anything that needs names goes through the JSON format instead.

use crate::error::{InstallerError, Result};
use serde::Deserialize;

/// Rows of header printed above every `list` table.
const TABLE_HEADER_ROWS: usize = 2;

/// One entry of `list --outdated --format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub latest_filetype: Option<String>,
}

/// Number of package rows in a plain `list` table.
pub fn count_table_rows(stdout: &str) -> usize {
    stdout
        .trim()
        .lines()
        .count()
        .saturating_sub(TABLE_HEADER_ROWS)
}

/// Outdated packages in listing order, entries with blank names dropped.
pub fn parse_outdated_json(stdout: &str) -> Result<Vec<OutdatedPackage>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut packages: Vec<OutdatedPackage> = serde_json::from_str(trimmed).map_err(|e| {
        InstallerError::OutputParsing(format!("Outdated package list is not valid JSON: {}", e))
    })?;
    packages.retain(|p| !p.name.trim().is_empty());
    Ok(packages)
}

/// Versions from `index versions <name>`.
///
/// ```text
/// requests (2.31.0)
/// Available versions: 2.31.0, 2.30.0, 2.29.0
///   INSTALLED: 2.30.0
///   LATEST:    2.31.0
/// ```
pub fn parse_index_versions(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Available versions:"))
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `Version:` field of `show <name>`.
pub fn parse_show_version(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("Version:")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Version number out of `pip 24.0 from /usr/lib/python3/site-packages/pip (python 3.12)`.
pub fn parse_tool_version(stdout: &str) -> Option<String> {
    let mut words = stdout.split_whitespace();
    words.next()?;
    words.next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTDATED_JSON: &str = r#"[
        {"name": "certifi", "version": "2023.7.22", "latest_version": "2024.2.2", "latest_filetype": "wheel"},
        {"name": "pip", "version": "23.2.1", "latest_version": "24.0", "latest_filetype": "wheel"},
        {"name": "urllib3", "version": "2.0.4"}
    ]"#;

    #[test]
    fn counts_rows_below_header() {
        let table = "Package    Version\n---------- -------\ncertifi    2024.2.2\npip        24.0\n";
        assert_eq!(count_table_rows(table), 2);
    }

    #[test]
    fn empty_or_header_only_table_counts_zero() {
        assert_eq!(count_table_rows(""), 0);
        assert_eq!(count_table_rows("Package Version\n------- -------\n"), 0);
        assert_eq!(count_table_rows("\n"), 0);
    }

    #[test]
    fn outdated_json_yields_exactly_contained_names() {
        let packages = parse_outdated_json(OUTDATED_JSON).unwrap();
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["certifi", "pip", "urllib3"]);
        assert_eq!(packages[0].latest_version.as_deref(), Some("2024.2.2"));
        assert_eq!(packages[2].latest_version, None);
    }

    #[test]
    fn empty_outdated_output_is_empty_list() {
        assert!(parse_outdated_json("").unwrap().is_empty());
        assert!(parse_outdated_json("[]\n").unwrap().is_empty());
    }

    #[test]
    fn malformed_outdated_output_is_parse_error() {
        let err = parse_outdated_json("Package Version\n").unwrap_err();
        assert!(matches!(err, InstallerError::OutputParsing(_)));
    }

    #[test]
    fn blank_names_are_dropped() {
        let packages = parse_outdated_json(r#"[{"name": " ", "version": "1"}]"#).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn index_versions_line_is_split() {
        let out = "requests (2.31.0)\nAvailable versions: 2.31.0, 2.30.0, 2.29.0\n  INSTALLED: 2.30.0\n";
        assert_eq!(parse_index_versions(out), vec!["2.31.0", "2.30.0", "2.29.0"]);
        assert!(parse_index_versions("WARNING: nothing here").is_empty());
    }

    #[test]
    fn show_and_tool_versions() {
        let show = "Name: requests\nVersion: 2.31.0\nSummary: HTTP for Humans.\n";
        assert_eq!(parse_show_version(show).as_deref(), Some("2.31.0"));
        assert_eq!(
            parse_tool_version("pip 24.0 from /usr/lib/python3/site-packages/pip (python 3.12)")
                .as_deref(),
            Some("24.0")
        );
        assert_eq!(parse_tool_version(""), None);
    }
}
