use crate::agents::inventory::InventoryAgent;
use crate::agents::package_tool::{OutputMode, PackageTool};
use crate::agents::report::{OperationReport, Outcome};
use crate::error::{InstallerError, Result};
use crate::pip::{BatchEntry, OutdatedPackage, PackageList, PackageSpec, TOOL_PACKAGE};
use crate::utils::pattern::PatternMatcher;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::debug;

/// Stderr prefix the tool uses for requirements it cannot even parse.
const INVALID_REQUIREMENT: &str = "ERROR: Invalid requirement:";

/// Options for [`PackageInstaller::update_all`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Upgrade the tool's own package before the batch
    pub self_upgrade: bool,
    /// Only upgrade packages whose name matches
    pub filter: Option<PatternMatcher>,
}

/// What an update pass did.
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub report: OperationReport,
    /// Outdated packages that were upgraded, excluding the self-upgrade
    pub upgraded: Vec<OutdatedPackage>,
}

/// PackageInstaller runs install, upgrade and uninstall requests against the tool
pub struct PackageInstaller<'a> {
    tool: &'a dyn PackageTool,
    mode: OutputMode,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(tool: &'a dyn PackageTool, mode: OutputMode) -> Self {
        Self { tool, mode }
    }

    fn inventory(&self) -> InventoryAgent<'a> {
        InventoryAgent::new(self.tool)
    }

    /// Install one package without checking whether it is already present.
    pub fn install_one(&self, spec: &PackageSpec) -> Outcome {
        let requirement = spec.requirement();
        match self.tool.run(&["install", &requirement], self.mode) {
            Ok(_) => Outcome::Succeeded,
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }

    /// Install every entry in order, skipping packages that are already there.
    ///
    /// Each entry is attempted at most once and failures never stop the loop.
    pub fn install_batch(&self, list: &PackageList) -> OperationReport {
        let mut report = OperationReport::new(list.len());
        let pb = self.progress_bar(list.len());

        for entry in list.entries() {
            pb.set_message(format!("Installing {}", entry.label()));

            let outcome = match entry {
                BatchEntry::Invalid { reason, .. } => Outcome::Failed(reason.clone()),
                BatchEntry::Valid(spec) => match self.already_satisfied(spec) {
                    Ok(true) => Outcome::AlreadyInstalled,
                    Ok(false) => self.install_one(spec),
                    Err(err) => Outcome::Failed(err.to_string()),
                },
            };

            let line = match (&outcome, entry) {
                (Outcome::AlreadyInstalled, _) => {
                    format!("Package '{}' already installed", entry.label())
                        .dimmed()
                        .to_string()
                }
                (Outcome::Succeeded, BatchEntry::Valid(spec)) => {
                    format!("✓ Successfully installed {}", spec).green().to_string()
                }
                (Outcome::Failed(reason), _) => {
                    format!("✗ Error installing {}: {}", entry.label(), reason)
                        .red()
                        .to_string()
                }
                _ => String::new(),
            };
            emit(&pb, &line);

            report.record(entry.label(), outcome);
            pb.inc(1);
        }

        pb.finish_and_clear();
        report
    }

    /// Uninstall every entry in order without prompting the tool.
    pub fn uninstall_batch(&self, list: &PackageList) -> OperationReport {
        let mut report = OperationReport::new(list.len());
        let pb = self.progress_bar(list.len());

        for entry in list.entries() {
            pb.set_message(format!("Uninstalling {}", entry.label()));

            let outcome = match entry {
                BatchEntry::Invalid { reason, .. } => Outcome::Failed(reason.clone()),
                BatchEntry::Valid(spec) => {
                    match self.tool.run(&["uninstall", "-y", &spec.name], self.mode) {
                        Ok(_) => Outcome::Succeeded,
                        Err(err) => Outcome::Failed(err.to_string()),
                    }
                }
            };

            match &outcome {
                Outcome::Succeeded => emit(
                    &pb,
                    &format!("✓ Uninstalled {}", entry.label()).green().to_string(),
                ),
                Outcome::Failed(reason) => emit(
                    &pb,
                    &format!("✗ Error uninstalling {}: {}", entry.label(), reason)
                        .red()
                        .to_string(),
                ),
                _ => {}
            }

            report.record(entry.label(), outcome);
            pb.inc(1);
        }

        pb.finish_and_clear();
        report
    }

    /// `install --upgrade <name>`, classifying unparseable requirements as skipped.
    pub fn upgrade_one(&self, name: &str) -> Outcome {
        match self.tool.run(&["install", "--upgrade", name], self.mode) {
            Ok(_) => Outcome::Succeeded,
            Err(err) => match err.tool_stderr().map(str::trim) {
                Some(stderr) if stderr.starts_with(INVALID_REQUIREMENT) => {
                    Outcome::Skipped(stderr.to_string())
                }
                _ => Outcome::Failed(err.to_string()),
            },
        }
    }

    /// Upgrade the tool itself (optionally), then every outdated package.
    ///
    /// Only a failure to list outdated packages aborts the pass, and it runs
    /// after the self-upgrade so that still happens.
    pub fn update_all(&self, options: &UpdateOptions) -> Result<UpdateResult> {
        let mut report = OperationReport::new(usize::from(options.self_upgrade));

        if options.self_upgrade {
            let outcome = self.upgrade_one(TOOL_PACKAGE);
            match &outcome {
                Outcome::Succeeded => println!("{}", format!("✓ Upgraded {}", TOOL_PACKAGE).green()),
                Outcome::Skipped(_) => println!(
                    "{}",
                    format!(
                        "Skipped updating package '{}' due to an invalid requirement",
                        TOOL_PACKAGE
                    )
                    .yellow()
                ),
                Outcome::Failed(reason) => println!(
                    "{}",
                    format!("✗ Error upgrading {}: {}", TOOL_PACKAGE, reason).red()
                ),
                Outcome::AlreadyInstalled => {}
            }
            report.record(TOOL_PACKAGE, outcome);
        }

        let outdated = self.inventory().outdated_packages().map_err(|e| {
            InstallerError::Update(format!("Could not list outdated packages: {}", e))
        })?;

        let targets: Vec<OutdatedPackage> = outdated
            .into_iter()
            .filter(|p| !(options.self_upgrade && p.name.eq_ignore_ascii_case(TOOL_PACKAGE)))
            .filter(|p| {
                options
                    .filter
                    .as_ref()
                    .is_none_or(|matcher| matcher.matches(&p.name))
            })
            .collect();
        debug!(count = targets.len(), "Outdated packages selected");
        report.expect_more(targets.len());

        let pb = self.progress_bar(targets.len());
        let mut upgraded = Vec::new();

        for package in targets {
            pb.set_message(format!("Updating {}", package.name));
            let outcome = self.upgrade_one(&package.name);

            match &outcome {
                Outcome::Succeeded => emit(
                    &pb,
                    &format!("✓ Updated package '{}'", package.name)
                        .green()
                        .to_string(),
                ),
                Outcome::Skipped(_) => emit(
                    &pb,
                    &format!(
                        "Skipped updating package '{}' due to an invalid requirement",
                        package.name
                    )
                    .yellow()
                    .to_string(),
                ),
                Outcome::Failed(reason) => emit(
                    &pb,
                    &format!("✗ Error updating package '{}': {}", package.name, reason)
                        .red()
                        .to_string(),
                ),
                Outcome::AlreadyInstalled => {}
            }

            let succeeded = outcome == Outcome::Succeeded;
            report.record(package.name.clone(), outcome);
            if succeeded {
                upgraded.push(package);
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(UpdateResult { report, upgraded })
    }

    /// Installed and, when pinned, already at the pinned version.
    pub(crate) fn already_satisfied(&self, spec: &PackageSpec) -> Result<bool> {
        let installed = self.inventory().installed_version(&spec.name)?;
        Ok(match (installed, &spec.version) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(current), Some(pinned)) => &current == pinned,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if self.mode == OutputMode::Stream {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    }
}

/// Print above the bar, or straight to stdout when the bar is hidden.
fn emit(pb: &ProgressBar, line: &str) {
    if line.is_empty() {
        return;
    }
    if pb.is_hidden() {
        println!("{}", line);
    } else {
        pb.println(line);
    }
}
