use crate::error::{InstallerError, Result};
use crate::utils::path_validator::PathValidator;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static SCAFFOLD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]*$").expect("valid scaffold name regex")
});

/// Everything needed to lay out a new package
#[derive(Debug, Clone, Default)]
pub struct ScaffoldRequest {
    pub author: String,
    pub name: String,
    pub version: String,
    pub requirements: Vec<String>,
    pub main_file: Option<PathBuf>,
    pub force: bool,
}

impl ScaffoldRequest {
    /// Split a comma-separated requirement string, trimming and dropping blanks.
    pub fn parse_requirements(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Directory name of the importable package.
    pub fn package_dir(&self) -> String {
        self.name.trim().to_lowercase().replace(' ', "_")
    }
}

/// Files written by a successful scaffold.
#[derive(Debug, Clone)]
pub struct ScaffoldResult {
    pub package_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// PackageScaffolder writes setup.py, README.md and a package directory
pub struct PackageScaffolder {
    root: PathBuf,
}

impl PackageScaffolder {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = PathValidator::validate_project_path(root)?;
        Ok(Self { root })
    }

    pub fn create(&self, request: &ScaffoldRequest) -> Result<ScaffoldResult> {
        Self::validate(request)?;

        let package_name = request.package_dir();
        let package_dir = self.root.join(&package_name);
        let setup_path = self.root.join("setup.py");
        let readme_path = self.root.join("README.md");

        if package_dir.exists() {
            return Err(InstallerError::Scaffold(format!(
                "'{}' already exists",
                package_dir.display()
            )));
        }
        if !request.force {
            for existing in [&setup_path, &readme_path] {
                if existing.exists() {
                    return Err(InstallerError::Scaffold(format!(
                        "'{}' already exists (use --force to overwrite)",
                        existing.display()
                    )));
                }
            }
        }

        let main_content = match &request.main_file {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                InstallerError::Scaffold(format!("Failed to read '{}': {}", path.display(), e))
            })?,
            None => default_main(request.name.trim()),
        };

        debug!(root = %self.root.display(), package = %package_name, "Scaffolding package");
        fs::create_dir(&package_dir)?;

        let init_path = package_dir.join("__init__.py");
        let main_path = package_dir.join("main.py");
        fs::write(&init_path, "")?;
        fs::write(&main_path, main_content)?;
        fs::write(&setup_path, render_setup(request, &package_name))?;
        fs::write(&readme_path, render_readme(request.name.trim()))?;

        Ok(ScaffoldResult {
            package_dir,
            files: vec![init_path, main_path, setup_path, readme_path],
        })
    }

    fn validate(request: &ScaffoldRequest) -> Result<()> {
        let name = request.name.trim();
        if !SCAFFOLD_NAME.is_match(name) {
            return Err(InstallerError::Scaffold(format!(
                "'{}' is not a usable package name",
                name
            )));
        }
        if request.version.trim().is_empty() {
            return Err(InstallerError::Scaffold(
                "Package version cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_main(name: &str) -> String {
    format!(
        r#"
def hello():
    print({})

if __name__ == "__main__":
    hello()
"#,
        python_str(&format!("Hello, {}!", name))
    )
}

fn render_setup(request: &ScaffoldRequest, package_dir: &str) -> String {
    let name = request.name.trim();
    let requirements = request
        .requirements
        .iter()
        .map(|r| python_str(r))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
from setuptools import setup

with open("README.md", "r", encoding="utf-8") as fh:
    long_description = fh.read()

setup(
    name={name},
    version={version},
    author={author},
    description={description},
    long_description=long_description,
    long_description_content_type="text/markdown",
    packages=[{package}],
    install_requires=[{requirements}],
    classifiers=[
        "Programming Language :: Python :: 3",
        "License :: OSI Approved :: MIT License",
        "Operating System :: OS Independent",
    ],
    python_requires='>=3.6',
)
"#,
        name = python_str(name),
        version = python_str(request.version.trim()),
        author = python_str(request.author.trim()),
        description = python_str(&format!("{} package", name)),
        package = python_str(package_dir),
        requirements = requirements,
    )
}

fn render_readme(name: &str) -> String {
    format!("# {}\n\nThis is the {} package.\n", name, name)
}

/// Single-quoted Python string literal.
fn python_str(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            _ => literal.push(ch),
        }
    }
    literal.push('\'');
    literal
}
