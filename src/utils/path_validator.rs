use crate::error::{InstallerError, Result};
use std::path::{Path, PathBuf};

/// System locations a scaffold or changelog must never be written into.
const SYSTEM_DIRS: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Path checks for directories and files the installer writes to.
pub struct PathValidator;

impl PathValidator {
    /// Canonical form of `path`, which must be an existing directory outside
    /// the system locations.
    pub fn validate_project_path(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let canonical = canonicalize(path, "directory")?;

        if !canonical.is_dir() {
            return Err(invalid(format!(
                "'{}' is not a directory",
                canonical.display()
            )));
        }
        if let Some(system_dir) = system_dir_of(path, &canonical) {
            return Err(invalid(format!(
                "Refusing to work inside system directory '{}'",
                system_dir
            )));
        }

        Ok(canonical)
    }

    /// Canonical form of `file_path`, which must exist below `base_dir`.
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file = canonicalize(file_path.as_ref(), "file")?;
        let base = canonicalize(base_dir.as_ref(), "base directory")?;

        if file.starts_with(&base) {
            Ok(file)
        } else {
            Err(invalid(format!(
                "'{}' is outside '{}'",
                file.display(),
                base.display()
            )))
        }
    }
}

fn canonicalize(path: &Path, what: &str) -> Result<PathBuf> {
    path.canonicalize()
        .map_err(|e| invalid(format!("Invalid {} '{}': {e}", what, path.display())))
}

/// Both the given and the resolved path are checked so symlinked system
/// directories (`/etc` -> `/private/etc`) are caught too.
fn system_dir_of(given: &Path, canonical: &Path) -> Option<&'static str> {
    SYSTEM_DIRS.iter().copied().find(|dir| {
        let dir_path = Path::new(dir);
        given.starts_with(dir_path)
            || canonical.starts_with(dir_path)
            || dir_path
                .canonicalize()
                .is_ok_and(|resolved| canonical.starts_with(resolved))
    })
}

fn invalid(message: String) -> InstallerError {
    InstallerError::ProjectValidation(message)
}
