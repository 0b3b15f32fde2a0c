use crate::error::{InstallerError, Result};
use crate::utils::path_validator::PathValidator;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// VersionControlAgent reads commit history with hardened input validation.
pub struct VersionControlAgent {
    repo_path: PathBuf,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Result<Self> {
        let repo_path = Self::validate_git_path(repo_path.as_ref())?;
        Ok(Self { repo_path })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Subject lines of the commits in `from..to`, newest first.
    pub fn commit_subjects(&self, from: &str, to: &str) -> Result<Vec<String>> {
        Self::validate_ref(from)?;
        Self::validate_ref(to)?;

        let range = format!("{}..{}", from, to);
        let output = self.run_git(&["log", &range, "--pretty=format:%s"])?;
        Self::ensure_success(&output, "git log")?;

        // One line per commit; an empty subject still yields a bullet.
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim_end)
            .map(str::to_string)
            .collect())
    }

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        debug!(repo = %self.repo_path.display(), ?args, "Running git");
        Command::new("git")
            .current_dir(&self.repo_path)
            .args(args)
            .output()
            .map_err(|e| {
                InstallerError::GitOperation(format!(
                    "Failed to execute git command '{}': {e}",
                    args.join(" ")
                ))
            })
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(InstallerError::GitOperation(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    /// Refs end up as a single argv entry, but a leading `-` would still be
    /// read as an option and `..` would change the range.
    fn validate_ref(reference: &str) -> Result<()> {
        let invalid = reference.is_empty()
            || reference.starts_with('-')
            || reference.contains("..")
            || reference
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ':' | '\\'));

        if invalid {
            return Err(InstallerError::GitOperation(format!(
                "'{}' is not a usable git reference",
                reference
            )));
        }
        Ok(())
    }

    fn validate_git_path(path: &Path) -> Result<PathBuf> {
        let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
        let path_str = path.to_string_lossy();
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(InstallerError::GitOperation(format!(
                "Path contains dangerous character: '{}'",
                ch
            )));
        }

        PathValidator::validate_project_path(path)
            .map_err(|err| InstallerError::GitOperation(format!("Invalid Git path: {}", err)))
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::{commit, tagged_repo};
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn subjects_cover_range_newest_first() {
        let dir = tempdir().unwrap();
        tagged_repo(dir.path());
        commit(dir.path(), "first");
        commit(dir.path(), "second");

        let agent = VersionControlAgent::new(dir.path()).unwrap();

        assert_eq!(
            agent.commit_subjects("v1.0.0", "HEAD").unwrap(),
            vec!["second", "first"]
        );
        assert!(agent.commit_subjects("HEAD", "HEAD").unwrap().is_empty());
    }

    #[test]
    fn empty_subject_is_kept() {
        let dir = tempdir().unwrap();
        tagged_repo(dir.path());
        commit(dir.path(), "");
        commit(dir.path(), "fix");

        let agent = VersionControlAgent::new(dir.path()).unwrap();

        assert_eq!(
            agent.commit_subjects("v1.0.0", "HEAD").unwrap(),
            vec!["fix", ""]
        );
    }

    #[test]
    fn unknown_tag_is_git_error() {
        let dir = tempdir().unwrap();
        tagged_repo(dir.path());
        let agent = VersionControlAgent::new(dir.path()).unwrap();
        let err = agent.commit_subjects("v9.9.9", "HEAD").unwrap_err();
        assert!(matches!(err, InstallerError::GitOperation(_)));
    }

    #[test]
    fn rejects_dangerous_paths() {
        let dir = tempdir().unwrap();
        let dangerous = dir.path().join("sub;dir");
        fs::create_dir_all(&dangerous).unwrap();
        assert!(VersionControlAgent::new(dangerous).is_err());
    }

    #[test]
    fn rejects_missing_paths() {
        let dir = tempdir().unwrap();
        assert!(VersionControlAgent::new(dir.path().join("missing")).is_err());
    }

    #[test]
    fn accepts_tags_and_branches() {
        for reference in ["1.0.0", "v2.3.4", "HEAD", "release/1.x", "HEAD^", "HEAD~3"] {
            assert!(VersionControlAgent::validate_ref(reference).is_ok(), "{reference}");
        }
    }

    #[test]
    fn rejects_option_like_and_range_refs() {
        for reference in ["", "--output=/tmp/x", "a..b", "v1 v2", "a:b"] {
            assert!(VersionControlAgent::validate_ref(reference).is_err(), "{reference}");
        }
    }

    #[test]
    fn invalid_ref_fails_before_running_git() {
        let dir = tempdir().unwrap();
        let agent = VersionControlAgent::new(dir.path()).unwrap();
        let err = agent.commit_subjects("-p", "HEAD").unwrap_err();
        assert!(matches!(err, InstallerError::GitOperation(_)));
    }
}
