pub mod output;
pub mod spec;
pub mod version;

pub use output::OutdatedPackage;
pub use spec::{BatchEntry, PackageList, PackageSpec};
pub use version::{Version, VersionComparator};

/// Name of the package tool's own distribution.
pub const TOOL_PACKAGE: &str = "pip";
