use crate::error::{InstallerError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("valid package name regex")
});

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.+!_-]*$").expect("valid version regex")
});

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("valid separator regex"));

/// A package name with an optional exact version pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    /// Parse `name` or `name==version`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.split_once("==") {
            Some((name, version)) => Self::with_version(name, Some(version)),
            None => Self::with_version(raw, None),
        }
    }

    pub fn with_version(name: &str, version: Option<&str>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InstallerError::InvalidPackageSpec(
                "Package name cannot be empty".to_string(),
            ));
        }
        if !NAME_PATTERN.is_match(name) {
            return Err(InstallerError::InvalidPackageSpec(format!(
                "'{}' is not a valid package name",
                name
            )));
        }

        let version = match version.map(str::trim) {
            None | Some("") => None,
            Some(v) if VERSION_PATTERN.is_match(v) => Some(v.to_string()),
            Some(v) => {
                return Err(InstallerError::InvalidPackageSpec(format!(
                    "'{}' is not a valid version for {}",
                    v, name
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            version,
        })
    }

    /// The argument handed to `install`.
    pub fn requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} version {}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// Lowercase and collapse runs of `-`, `_` and `.` into a single `-`.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RUN
        .replace_all(&name.trim().to_lowercase(), "-")
        .into_owned()
}

/// One item of a comma-separated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEntry {
    Valid(PackageSpec),
    Invalid { raw: String, reason: String },
}

impl BatchEntry {
    pub fn label(&self) -> &str {
        match self {
            BatchEntry::Valid(spec) => &spec.name,
            BatchEntry::Invalid { raw, .. } => raw,
        }
    }
}

/// Ordered, de-duplicated list of package specs parsed from user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageList {
    entries: Vec<BatchEntry>,
}

impl PackageList {
    /// Split on commas, trim, drop blanks and later duplicates.
    pub fn parse(input: &str) -> Self {
        Self::from_items(input.split(','))
    }

    /// Same as [`PackageList::parse`] for several already-split arguments,
    /// each of which may itself be comma-separated.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::from_items(args.iter().flat_map(|arg| arg.as_ref().split(',')))
    }

    fn from_items<'a>(items: impl Iterator<Item = &'a str>) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for item in items {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            match PackageSpec::parse(item) {
                Ok(spec) => {
                    if seen.insert(spec.normalized_name()) {
                        entries.push(BatchEntry::Valid(spec));
                    }
                }
                Err(err) => entries.push(BatchEntry::Invalid {
                    raw: item.to_string(),
                    reason: err.to_string(),
                }),
            }
        }

        Self { entries }
    }

    pub fn single(spec: PackageSpec) -> Self {
        Self {
            entries: vec![BatchEntry::Valid(spec)],
        }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
