use crate::agents::package_tool::{OutputMode, PackageTool};
use crate::error::{InstallerError, Result};
use crate::pip::output::{
    count_table_rows, parse_index_versions, parse_outdated_json, parse_show_version,
};
use crate::pip::{OutdatedPackage, VersionComparator};
use tracing::debug;

/// Installed and outdated package counts shown in the menu header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub installed: usize,
    pub outdated: usize,
}

/// InventoryAgent answers questions about what the tool has installed
pub struct InventoryAgent<'a> {
    tool: &'a dyn PackageTool,
}

impl<'a> InventoryAgent<'a> {
    pub fn new(tool: &'a dyn PackageTool) -> Self {
        Self { tool }
    }

    /// Counts for the menu header; a failed listing counts as zero.
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            installed: self.installed_count().unwrap_or(0),
            outdated: self.outdated_count().unwrap_or(0),
        }
    }

    pub fn installed_count(&self) -> Result<usize> {
        let output = self.tool.run(&["list"], OutputMode::Capture)?;
        Ok(count_table_rows(&output.stdout))
    }

    pub fn outdated_count(&self) -> Result<usize> {
        let output = self.tool.run(&["list", "--outdated"], OutputMode::Capture)?;
        Ok(count_table_rows(&output.stdout))
    }

    pub fn outdated_packages(&self) -> Result<Vec<OutdatedPackage>> {
        let output = self
            .tool
            .run(&["list", "--outdated", "--format=json"], OutputMode::Capture)?;
        parse_outdated_json(&output.stdout)
    }

    /// Installed version according to `show`, `None` when not installed.
    pub fn installed_version(&self, name: &str) -> Result<Option<String>> {
        match self.tool.run(&["show", name], OutputMode::Capture) {
            Ok(output) => Ok(Some(
                parse_show_version(&output.stdout).unwrap_or_else(|| "unknown".to_string()),
            )),
            Err(InstallerError::ToolFailed { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Versions the index offers, newest first; empty when the lookup fails.
    pub fn available_versions(&self, name: &str) -> Vec<String> {
        match self
            .tool
            .run(&["index", "versions", name], OutputMode::Capture)
        {
            Ok(output) => VersionComparator::sort_descending(&parse_index_versions(&output.stdout)),
            Err(err) => {
                debug!(package = name, error = %err, "Version lookup failed");
                Vec::new()
            }
        }
    }
}
