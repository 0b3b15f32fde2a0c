use crate::error::{InstallerError, Result};
use jiff::civil::Date;
use std::fs;
use std::path::{Path, PathBuf};

/// ChangelogWriter appends release notes to the bottom of a README
pub struct ChangelogWriter {
    readme_path: PathBuf,
}

impl ChangelogWriter {
    pub fn new<P: AsRef<Path>>(readme_path: P) -> Self {
        Self {
            readme_path: readme_path.as_ref().to_path_buf(),
        }
    }

    /// `### Version <release> (<date>)`, a blank line, then one bullet per subject.
    pub fn render_entry(release: &str, date: Date, subjects: &[String]) -> String {
        let mut entry = format!(
            "### Version {} ({})\n\n",
            release,
            date.strftime("%Y-%m-%d")
        );
        entry.push_str(
            &subjects
                .iter()
                .map(|subject| format!("- {}", subject))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        entry
    }

    /// Append `entry` after a single newline; the README must already exist.
    pub fn append(&self, entry: &str) -> Result<()> {
        let mut content = fs::read_to_string(&self.readme_path).map_err(|e| {
            InstallerError::Changelog(format!(
                "Failed to read '{}': {}",
                self.readme_path.display(),
                e
            ))
        })?;

        content.push('\n');
        content.push_str(entry);

        fs::write(&self.readme_path, content).map_err(|e| {
            InstallerError::Changelog(format!(
                "Failed to write '{}': {}",
                self.readme_path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use tempfile::tempdir;

    #[test]
    fn renders_heading_and_bullets() {
        let subjects = vec!["Add batch mode".to_string(), "Fix typo".to_string()];
        let entry = ChangelogWriter::render_entry("1.1.0", date(2024, 3, 9), &subjects);
        assert_eq!(
            entry,
            "### Version 1.1.0 (2024-03-09)\n\n- Add batch mode\n- Fix typo"
        );
    }

    #[test]
    fn renders_heading_only_without_commits() {
        let entry = ChangelogWriter::render_entry("2.0.0", date(2025, 1, 1), &[]);
        assert_eq!(entry, "### Version 2.0.0 (2025-01-01)\n\n");
    }

    #[test]
    fn appends_after_existing_content() {
        let dir = tempdir().unwrap();
        let readme = dir.path().join("README.md");
        fs::write(&readme, "# Project\n").unwrap();

        let writer = ChangelogWriter::new(&readme);
        writer.append("### Version 1.1.0 (2024-03-09)\n\n- One").unwrap();

        assert_eq!(
            fs::read_to_string(&readme).unwrap(),
            "# Project\n\n### Version 1.1.0 (2024-03-09)\n\n- One"
        );
    }

    #[test]
    fn missing_readme_is_an_error() {
        let dir = tempdir().unwrap();
        let writer = ChangelogWriter::new(dir.path().join("README.md"));
        let err = writer.append("entry").unwrap_err();
        assert!(matches!(err, InstallerError::Changelog(_)));
        assert!(!dir.path().join("README.md").exists());
    }
}
