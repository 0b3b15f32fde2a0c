use thiserror::Error;

/// Exit code when the package tool is missing and cannot be bootstrapped.
pub const TOOL_NOT_INSTALLED_EXIT: i32 = 1;
/// Exit code when a package installation fails fatally.
pub const PACKAGE_INSTALLATION_EXIT: i32 = 2;
/// Exit code when the update flow cannot run.
pub const PACKAGE_UPDATE_EXIT: i32 = 3;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Package tool is not available: {0}")]
    ToolUnavailable(String),

    #[error("`{command}` exited with code {code}{}", format_stderr(.stderr))]
    ToolFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Bootstrapping the package tool failed: {0}")]
    Bootstrap(String),

    #[error("Installation failed: {0}")]
    Installation(String),

    #[error("Uninstall failed: {0}")]
    Uninstall(String),

    #[error("Update failed: {0}")]
    Update(String),

    #[error("Failed to parse tool output: {0}")]
    OutputParsing(String),

    #[error("Invalid package spec: {0}")]
    InvalidPackageSpec(String),

    #[error("Package scaffold failed: {0}")]
    Scaffold(String),

    #[error("Changelog generation failed: {0}")]
    Changelog(String),

    #[error("Git operation failed: {0}")]
    GitOperation(String),

    #[error("Project validation failed: {0}")]
    ProjectValidation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallerError {
    /// Process exit code reported by `main` for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallerError::ToolUnavailable(_) | InstallerError::Bootstrap(_) => {
                TOOL_NOT_INSTALLED_EXIT
            }
            InstallerError::Installation(_) => PACKAGE_INSTALLATION_EXIT,
            InstallerError::Update(_) => PACKAGE_UPDATE_EXIT,
            _ => 1,
        }
    }

    /// Stderr captured from a failed tool run, if any.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            InstallerError::ToolFailed { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;
