use crate::agents::package_tool::{OutputMode, PackageTool};
use crate::error::{InstallerError, Result};
use crate::pip::output::parse_tool_version;
use tracing::warn;

/// What the availability probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The tool answered `--version`
    Present(Option<String>),
    /// The tool was missing and has just been bootstrapped
    Bootstrapped,
}

/// AvailabilityAgent makes sure the package tool can be invoked
pub struct AvailabilityAgent<'a> {
    tool: &'a dyn PackageTool,
}

impl<'a> AvailabilityAgent<'a> {
    pub fn new(tool: &'a dyn PackageTool) -> Self {
        Self { tool }
    }

    /// Probe the tool once; bootstrap it once if the probe fails.
    pub fn ensure_available(&self) -> Result<Availability> {
        match self.tool.run(&["--version"], OutputMode::Capture) {
            Ok(output) => Ok(Availability::Present(parse_tool_version(&output.stdout))),
            Err(err @ (InstallerError::ToolFailed { .. } | InstallerError::ToolUnavailable(_))) => {
                warn!(error = %err, "Package tool probe failed, bootstrapping");
                self.tool.bootstrap()?;
                Ok(Availability::Bootstrapped)
            }
            Err(err) => Err(err),
        }
    }
}
