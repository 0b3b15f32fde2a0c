use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static RELEASE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[vV]?(\d+(?:\.\d+)*)").expect("valid release regex"));

static PRE_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[._-]?(a|b|c|rc|alpha|beta|pre|preview)\d*|[._+-]?dev\d*)")
        .expect("valid pre-release regex")
});

static SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[._+-]?(dev|alpha|a|beta|b|rc|c|preview|pre|post|rev|r)[._-]?(\d*)")
        .expect("valid suffix regex")
});

/// Rank of a version with no recognised suffix: after pre-releases, before post-releases.
const FINAL_RANK: u8 = 4;

/// Package version as reported by the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub original: String,
    pub parsed: VersionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionType {
    Semantic(semver::Version),
    Release(Vec<u64>),
    Unknown(String),
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim();
        let parsed = if let Ok(v) = semver::Version::parse(trimmed) {
            VersionType::Semantic(v)
        } else if let Some(release) = Self::parse_release(trimmed) {
            VersionType::Release(release)
        } else {
            VersionType::Unknown(trimmed.to_string())
        };

        Version {
            original: trimmed.to_string(),
            parsed,
        }
    }

    fn parse_release(version: &str) -> Option<Vec<u64>> {
        let captures = RELEASE_PREFIX.captures(version)?;
        captures[1]
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect()
    }

    /// Release segment with trailing zeros removed, so `1.0` equals `1.0.0`.
    fn release(&self) -> Option<Vec<u64>> {
        let mut parts = match &self.parsed {
            VersionType::Semantic(v) => vec![v.major, v.minor, v.patch],
            VersionType::Release(parts) => parts.clone(),
            VersionType::Unknown(_) => return None,
        };
        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
        }
        Some(parts)
    }

    /// Phase rank (`dev` < `a` < `b` < `rc` < final < `post`) and its number.
    fn suffix(&self) -> (u8, u64) {
        let rest = RELEASE_PREFIX
            .find(&self.original)
            .map_or("", |m| &self.original[m.end()..]);
        let Some(captures) = SUFFIX.captures(rest) else {
            return (FINAL_RANK, 0);
        };
        let rank = match captures[1].to_ascii_lowercase().as_str() {
            "dev" => 0,
            "a" | "alpha" => 1,
            "b" | "beta" => 2,
            "rc" | "c" | "pre" | "preview" => 3,
            _ => 5,
        };
        (rank, captures[2].parse().unwrap_or(0))
    }

    pub fn is_stable(&self) -> bool {
        match &self.parsed {
            VersionType::Semantic(v) => v.pre.is_empty() && !PRE_RELEASE.is_match(&self.original),
            _ => !PRE_RELEASE.is_match(&self.original),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.release(), other.release()) {
            (Some(a), Some(b)) => a
                .cmp(&b)
                .then_with(|| self.suffix().cmp(&other.suffix()))
                .then_with(|| self.original.cmp(&other.original)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.original.cmp(&other.original),
        }
    }
}
