pub mod availability;
pub mod changelog_writer;
pub mod interaction;
pub mod inventory;
pub mod package_installer;
pub mod package_scaffolder;
pub mod package_tool;
pub mod report;
pub mod version_control;

pub use availability::{Availability, AvailabilityAgent};
pub use changelog_writer::ChangelogWriter;
pub use interaction::{MenuChoice, MenuInteraction};
pub use inventory::{InventoryAgent, InventorySnapshot};
pub use package_installer::{PackageInstaller, UpdateOptions, UpdateResult};
pub use package_scaffolder::{PackageScaffolder, ScaffoldRequest};
pub use package_tool::{OutputMode, PackageTool, PipAgent};
pub use report::{OperationReport, Outcome};
pub use version_control::VersionControlAgent;
