use crate::agents::changelog_writer::ChangelogWriter;
use crate::agents::{
    Availability, AvailabilityAgent, InventoryAgent, MenuChoice, MenuInteraction,
    OperationReport, OutputMode, Outcome, PackageInstaller, PackageScaffolder, PackageTool,
    ScaffoldRequest, UpdateOptions, UpdateResult, VersionControlAgent,
};
use crate::error::{InstallerError, Result};
use crate::pip::{OutdatedPackage, PackageList, PackageSpec, Version};
use crate::utils::path_validator::PathValidator;
use crate::utils::pattern::PatternMatcher;
use colored::Colorize;
use jiff::Zoned;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Shared handles for every command: the tool and how its output is shown.
pub struct Context<'a> {
    tool: &'a dyn PackageTool,
    mode: OutputMode,
}

impl<'a> Context<'a> {
    pub fn new(tool: &'a dyn PackageTool, mode: OutputMode) -> Self {
        Self { tool, mode }
    }

    fn installer(&self) -> PackageInstaller<'a> {
        PackageInstaller::new(self.tool, self.mode)
    }

    fn inventory(&self) -> InventoryAgent<'a> {
        InventoryAgent::new(self.tool)
    }
}

/// Make sure the package tool answers, bootstrapping it if needed
fn ensure_tool(ctx: &Context<'_>, step: usize) -> Result<()> {
    println!(
        "\n{}",
        format!("{}. Checking {} availability...", step, ctx.tool.program()).yellow()
    );
    match AvailabilityAgent::new(ctx.tool).ensure_available()? {
        Availability::Present(Some(version)) => println!(
            "{}",
            format!("✓ {} {} is available", ctx.tool.program(), version).green()
        ),
        Availability::Present(None) => {
            println!("{}", format!("✓ {} is available", ctx.tool.program()).green())
        }
        Availability::Bootstrapped => println!(
            "{}",
            format!("✓ Successfully installed {}", ctx.tool.program()).green()
        ),
    }
    Ok(())
}

/// Install packages given on the command line
pub fn execute_install(ctx: &Context<'_>, packages: &[String], pin: Option<&str>) -> Result<()> {
    println!("{}", "Installing packages...".cyan().bold());

    let list = match pin {
        Some(version) => {
            let names = PackageList::from_args(packages);
            let [entry] = names.entries() else {
                return Err(InstallerError::InvalidPackageSpec(
                    "--version can only be used with exactly one package".to_string(),
                ));
            };
            PackageList::single(PackageSpec::with_version(entry.label(), Some(version))?)
        }
        None => PackageList::from_args(packages),
    };

    if list.is_empty() {
        return Err(InstallerError::InvalidPackageSpec(
            "No package names given".to_string(),
        ));
    }

    ensure_tool(ctx, 1)?;

    println!(
        "\n{}",
        format!("2. Installing {} package(s)...", list.len()).yellow()
    );
    let report = ctx.installer().install_batch(&list);
    print_summary(&report);

    if report.has_errors() {
        return Err(InstallerError::Installation(format!(
            "{} of {} package(s) failed",
            report.errors(),
            report.requested()
        )));
    }
    Ok(())
}

/// Upgrade the tool and every outdated package
pub fn execute_update(ctx: &Context<'_>, filter: Option<String>, self_upgrade: bool) -> Result<()> {
    println!("{}", "Starting package update process...".cyan().bold());

    let filter = filter.as_deref().map(PatternMatcher::new).transpose()?;

    ensure_tool(ctx, 1)?;

    println!("\n{}", "2. Updating packages...".yellow());
    let result = ctx.installer().update_all(&UpdateOptions {
        self_upgrade,
        filter,
    })?;

    print_update_result(&result);
    print_summary(&result.report);

    if result.report.has_errors() {
        return Err(InstallerError::Update(format!(
            "{} package(s) could not be updated",
            result.report.errors()
        )));
    }
    Ok(())
}

/// Show outdated packages without changing anything
pub fn execute_outdated(ctx: &Context<'_>) -> Result<()> {
    println!("{}", "Checking for outdated packages...".cyan().bold());

    ensure_tool(ctx, 1)?;

    println!("\n{}", "2. Listing outdated packages...".yellow());
    let packages = ctx.inventory().outdated_packages()?;
    println!("{}", "✓ Check completed".green());

    print_outdated(&packages);
    Ok(())
}

/// Uninstall packages given on the command line
pub fn execute_uninstall(ctx: &Context<'_>, packages: &[String], assume_yes: bool) -> Result<()> {
    println!("{}", "Uninstalling packages...".cyan().bold());

    let list = PackageList::from_args(packages);
    if list.is_empty() {
        return Err(InstallerError::InvalidPackageSpec(
            "No package names given".to_string(),
        ));
    }

    ensure_tool(ctx, 1)?;

    if !assume_yes {
        let mut ui = MenuInteraction::stdio();
        if !confirm_uninstall(&mut ui, &list)? {
            println!("{}", "Nothing was uninstalled.".yellow());
            return Ok(());
        }
    }

    println!(
        "\n{}",
        format!("2. Uninstalling {} package(s)...", list.len()).yellow()
    );
    let report = ctx.installer().uninstall_batch(&list);
    print_summary(&report);

    if report.has_errors() {
        return Err(InstallerError::Uninstall(format!(
            "{} of {} package(s) could not be uninstalled",
            report.errors(),
            report.requested()
        )));
    }
    Ok(())
}

/// Print installed and outdated package counts
pub fn execute_stats(ctx: &Context<'_>) -> Result<()> {
    println!("{}", "Collecting package statistics...".cyan().bold());

    ensure_tool(ctx, 1)?;

    println!("\n{}", "2. Counting packages...".yellow());
    let inventory = ctx.inventory();
    let installed = inventory.installed_count()?;
    let outdated = inventory.outdated_count()?;

    println!("\n{}", "Summary:".cyan().bold());
    println!("  {} installed packages", installed.to_string().yellow());
    println!("  {} updatable packages", outdated.to_string().yellow());
    Ok(())
}

/// Scaffold a new package under `root`
pub fn execute_create<P: AsRef<Path>>(root: P, request: &ScaffoldRequest) -> Result<()> {
    println!(
        "{}",
        format!("Creating package '{}'...", request.name.trim())
            .cyan()
            .bold()
    );

    let scaffolder = PackageScaffolder::new(root)?;
    let result = scaffolder.create(request)?;

    for file in &result.files {
        println!("  {} {}", "•".dimmed(), file.display());
    }
    println!(
        "\n{}",
        format!("✨ Package '{}' created successfully!", request.name.trim())
            .green()
            .bold()
    );
    Ok(())
}

/// Append a changelog entry for `release` built from `from..to`
pub fn execute_changelog<P: AsRef<Path>>(
    repo: P,
    readme: &Path,
    from: &str,
    to: &str,
    release: &str,
) -> Result<()> {
    println!("{}", "Generating changelog...".cyan().bold());

    println!("\n{}", "1. Validating repository...".yellow());
    let git = VersionControlAgent::new(repo)?;
    let readme_path = resolve_readme(git.repo_path(), readme)?;
    println!("{}", "✓ Repository and README found".green());

    println!(
        "\n{}",
        format!("2. Reading commits {}..{}...", from, to).yellow()
    );
    let subjects = git.commit_subjects(from, to)?;
    if subjects.is_empty() {
        println!(
            "{}",
            format!("⚠ No commits found between {} and {}", from, to).red()
        );
    } else {
        println!("   Found {} commit(s)", subjects.len());
    }

    println!("\n{}", "3. Writing changelog entry...".yellow());
    let entry = ChangelogWriter::render_entry(release, Zoned::now().date(), &subjects);
    ChangelogWriter::new(&readme_path).append(&entry)?;

    println!(
        "\n{}",
        "✨ Changelog generated successfully.".green().bold()
    );
    Ok(())
}

fn resolve_readme(repo: &Path, readme: &Path) -> Result<PathBuf> {
    let candidate = if readme.is_absolute() {
        readme.to_path_buf()
    } else {
        repo.join(readme)
    };
    PathValidator::validate_file_path(&candidate, repo)
        .map_err(|e| InstallerError::Changelog(e.to_string()))
}

/// Run the interactive menu on stdin/stdout
pub fn execute_menu(ctx: &Context<'_>) -> Result<()> {
    run_menu(ctx, &mut MenuInteraction::stdio())
}

fn run_menu<R: BufRead, W: Write>(
    ctx: &Context<'_>,
    ui: &mut MenuInteraction<R, W>,
) -> Result<()> {
    ensure_tool(ctx, 1)?;

    loop {
        let snapshot = ctx.inventory().snapshot();
        ui.render_menu(ctx.tool.program(), &snapshot)?;

        let outcome = match ui.read_choice()? {
            MenuChoice::SingleMode => single_mode(ctx, ui),
            MenuChoice::MultiMode => multi_mode(ctx, ui),
            MenuChoice::ViewOutdated => ctx
                .inventory()
                .outdated_packages()
                .map(|packages| print_outdated(&packages)),
            MenuChoice::Update => ctx
                .installer()
                .update_all(&UpdateOptions {
                    self_upgrade: true,
                    filter: None,
                })
                .map(|result| {
                    print_update_result(&result);
                    print_summary(&result.report);
                }),
            MenuChoice::Uninstall => uninstall_mode(ctx, ui),
            MenuChoice::CreatePackage => create_mode(ui),
            MenuChoice::Exit => break,
            MenuChoice::Invalid(_) => ui.say("Invalid choice. Please try again.".red()),
        };

        match outcome {
            Ok(()) => {}
            Err(InstallerError::Io(e)) => return Err(InstallerError::Io(e)),
            Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
        }
    }

    Ok(())
}

fn single_mode<R: BufRead, W: Write>(
    ctx: &Context<'_>,
    ui: &mut MenuInteraction<R, W>,
) -> Result<()> {
    let inventory = ctx.inventory();
    let installer = ctx.installer();
    let mut report = OperationReport::new(0);

    while let Some(raw) =
        ui.prompt_or_quit("Enter the package name to install (or type 'q' to quit): ")?
    {
        if raw.is_empty() {
            continue;
        }
        report.expect_more(1);

        let mut spec = match PackageSpec::parse(&raw) {
            Ok(spec) => spec,
            Err(err) => {
                ui.say(err.to_string().red())?;
                report.record(raw, Outcome::Failed(err.to_string()));
                continue;
            }
        };

        match installer.already_satisfied(&spec) {
            Ok(false) => {}
            Ok(true) => {
                ui.say(format!("Package '{}' already installed", spec.requirement()).dimmed())?;
                report.record(spec.name, Outcome::AlreadyInstalled);
                continue;
            }
            Err(err) => {
                ui.say(format!("✗ Error checking {}: {}", spec.name, err).red())?;
                report.record(spec.name, Outcome::Failed(err.to_string()));
                continue;
            }
        }

        if spec.version.is_none() {
            let versions = inventory.available_versions(&spec.name);
            spec.version = ui.choose_version(&spec.name, &versions)?;
        }

        let outcome = installer.install_one(&spec);
        match &outcome {
            Outcome::Succeeded => {
                ui.say(format!("✓ Successfully installed {}", spec).green())?
            }
            Outcome::Failed(reason) => {
                ui.say(format!("✗ Error installing {}: {}", spec, reason).red())?
            }
            _ => {}
        }
        report.record(spec.name, outcome);
    }

    print_summary(&report);
    Ok(())
}

fn multi_mode<R: BufRead, W: Write>(
    ctx: &Context<'_>,
    ui: &mut MenuInteraction<R, W>,
) -> Result<()> {
    let Some(input) =
        ui.prompt_or_quit("Enter package names separated by commas (or type 'q' to quit): ")?
    else {
        return Ok(());
    };

    let list = PackageList::parse(&input);
    if list.is_empty() {
        return ui.say("No package names given.".yellow());
    }

    let report = ctx.installer().install_batch(&list);
    print_summary(&report);
    Ok(())
}

fn uninstall_mode<R: BufRead, W: Write>(
    ctx: &Context<'_>,
    ui: &mut MenuInteraction<R, W>,
) -> Result<()> {
    let Some(input) =
        ui.prompt_or_quit("Enter the package name to uninstall (or type 'q' to quit): ")?
    else {
        return Ok(());
    };

    let list = PackageList::parse(&input);
    if list.is_empty() {
        return ui.say("No package names given.".yellow());
    }
    if !confirm_uninstall(ui, &list)? {
        return ui.say("Nothing was uninstalled.".yellow());
    }

    let report = ctx.installer().uninstall_batch(&list);
    print_summary(&report);
    Ok(())
}

fn create_mode<R: BufRead, W: Write>(ui: &mut MenuInteraction<R, W>) -> Result<()> {
    let author = ui.prompt("Enter the author name: ")?.unwrap_or_default();
    let name = ui.prompt("Enter the package name: ")?.unwrap_or_default();
    let version = ui.prompt("Enter the package version: ")?.unwrap_or_default();
    let requirements = ui
        .prompt("Enter the package requirements (comma-separated): ")?
        .unwrap_or_default();
    let main_file = ui
        .prompt("Enter the path to the main.py file (leave blank to use default content): ")?
        .filter(|path| !path.is_empty())
        .map(PathBuf::from);

    let request = ScaffoldRequest {
        author,
        name,
        version,
        requirements: ScaffoldRequest::parse_requirements(&requirements),
        main_file,
        force: false,
    };
    execute_create(".", &request)
}

fn confirm_uninstall<R: BufRead, W: Write>(
    ui: &mut MenuInteraction<R, W>,
    list: &PackageList,
) -> Result<bool> {
    let names = list
        .entries()
        .iter()
        .map(|entry| entry.label())
        .collect::<Vec<_>>()
        .join(", ");
    ui.confirm(&format!("Uninstall {}?", names))
}

fn print_summary(report: &OperationReport) {
    println!("\n{}", "---------- Statistics ----------".cyan());
    println!(
        "Time elapsed: {:.2} seconds",
        report.elapsed().as_secs_f64()
    );
    let errors = report.errors().to_string();
    println!(
        "Errors encountered: {}",
        if report.has_errors() {
            errors.red()
        } else {
            errors.green()
        }
    );
    println!(
        "Number of updated/installed packages: {}",
        report.successes().to_string().green()
    );
    if report.already_installed() > 0 {
        println!("Already installed: {}", report.already_installed());
    }
    if report.skipped() > 0 {
        println!("Skipped: {}", report.skipped());
    }
    for (name, reason) in report.failures() {
        println!("  {} {}: {}", "✗".red(), name, reason.dimmed());
    }
    println!("{}", "--------------------------------".cyan());
}

fn print_update_result(result: &UpdateResult) {
    if result.upgraded.is_empty() {
        println!("\n{}", "All packages are up to date.".green().bold());
        return;
    }

    println!(
        "\n{}",
        format!("{} package(s) updated successfully.", result.upgraded.len())
            .green()
            .bold()
    );
    for package in &result.upgraded {
        let latest = package.latest_version.as_deref().unwrap_or("latest");
        println!(
            "  • {} {} → {}",
            package.name.white().bold(),
            package.version.red(),
            latest.green()
        );
    }
}

fn print_outdated(packages: &[OutdatedPackage]) {
    if packages.is_empty() {
        println!("\n{}", "✨ All packages are up to date!".green().bold());
        return;
    }

    println!("\n{}", "📦 Outdated Packages:".cyan().bold());
    println!(
        "{}",
        format!("Found {} update(s)", packages.len()).yellow()
    );

    for package in packages {
        match package.latest_version.as_deref() {
            Some(latest) => {
                let stability = if Version::parse(latest).is_stable() {
                    "stable".green()
                } else {
                    "pre-release".yellow()
                };
                println!(
                    "  • {} {} → {} ({})",
                    package.name.white().bold(),
                    package.version.dimmed(),
                    latest.green().bold(),
                    stability
                );
            }
            None => println!(
                "  • {} {}",
                package.name.white().bold(),
                package.version.dimmed()
            ),
        }
    }

    println!("\n{}", "To apply these updates, run:".dimmed());
    println!("  {}", "pip-installer update".cyan());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::package_tool::mock::{MockTool, fail, ok};
    use crate::agents::version_control::fixture::{commit, tagged_repo};
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn tool() -> MockTool {
        MockTool::new(|args| match args {
            ["--version"] => ok("pip 24.0 from /site-packages/pip (python 3.12)\n"),
            ["list"] => ok("Package Version\n------- -------\npip 24.0\nrequests 2.31.0\n"),
            ["list", "--outdated"] => ok("Package Version Latest Type\n------- ------- ------ -----\n"),
            ["list", "--outdated", "--format=json"] => ok("[]"),
            ["show", "requests"] => ok("Name: requests\nVersion: 2.31.0\n"),
            ["show", _] => fail(1, "WARNING: Package(s) not found"),
            ["index", "versions", "flask"] => {
                ok("flask (3.0.0)\nAvailable versions: 2.0.0, 3.0.0\n")
            }
            ["index", "versions", _] => fail(1, "ERROR: No matching distribution"),
            ["install", "broken"] => fail(1, "ERROR: could not build"),
            ["install", _] => ok(""),
            ["install", "--upgrade", _] => ok(""),
            ["uninstall", "-y", _] => ok(""),
            _ => fail(1, "unexpected"),
        })
    }

    fn ui(input: &str) -> MenuInteraction<Cursor<Vec<u8>>, Vec<u8>> {
        MenuInteraction::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn menu_multi_mode_installs_missing_packages_only() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        run_menu(&ctx, &mut ui("2\nflask, requests\n0\n")).unwrap();

        assert_eq!(tool.calls_starting_with("install"), vec!["install flask"]);
        assert_eq!(tool.calls_starting_with("show"), vec!["show flask", "show requests"]);
        assert_eq!(tool.bootstrap_count(), 0);
    }

    #[test]
    fn menu_single_mode_offers_versions_until_quit() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        run_menu(&ctx, &mut ui("1\nflask\n2\nrequests\nnumpy\n\nq\n0\n")).unwrap();

        assert_eq!(
            tool.calls_starting_with("install"),
            vec!["install flask==2.0.0", "install numpy"]
        );
    }

    #[test]
    fn menu_single_mode_installs_pin_that_differs_from_installed() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        run_menu(
            &ctx,
            &mut ui("1\nrequests==2.30.0\nrequests==2.31.0\nrequests\nq\n0\n"),
        )
        .unwrap();

        assert_eq!(
            tool.calls_starting_with("install"),
            vec!["install requests==2.30.0"]
        );
    }

    #[test]
    fn menu_single_mode_keeps_going_when_show_cannot_run() {
        let tool = MockTool::new(|args| match args {
            ["--version"] => ok("pip 24.0\n"),
            ["show", _] => fail(1, "WARNING: Package(s) not found"),
            ["index", "versions", _] => fail(1, "ERROR: No matching distribution"),
            ["install", _] => ok(""),
            _ => fail(1, ""),
        })
        .with_spawn_error("show flask");
        let ctx = Context::new(&tool, OutputMode::Capture);
        let mut menu = ui("1\nflask\nnumpy\nq\n0\n");

        run_menu(&ctx, &mut menu).unwrap();

        assert_eq!(tool.calls_starting_with("install"), vec!["install numpy"]);
        let printed = String::from_utf8(menu.into_output()).unwrap();
        assert!(printed.contains("Error checking flask"));
    }

    #[test]
    fn menu_rejects_unknown_choice_and_survives_failures() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);
        let mut menu = ui("9\n2\nbroken\n0\n");

        run_menu(&ctx, &mut menu).unwrap();

        let printed = String::from_utf8(menu.into_output()).unwrap();
        assert!(printed.contains("Invalid choice. Please try again."));
        assert_eq!(tool.calls_starting_with("install"), vec!["install broken"]);
    }

    #[test]
    fn menu_uninstall_requires_confirmation() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        run_menu(&ctx, &mut ui("5\nsix\nn\n5\nsix\ny\n0\n")).unwrap();

        assert_eq!(tool.calls_starting_with("uninstall"), vec!["uninstall -y six"]);
    }

    #[test]
    fn menu_ends_at_end_of_input() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);
        run_menu(&ctx, &mut ui("")).unwrap();
        assert_eq!(tool.calls()[0], "--version");
    }

    #[test]
    fn install_reports_failures_as_installation_error() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        let err = execute_install(&ctx, &["flask,broken".to_string()], None).unwrap_err();

        assert!(matches!(err, InstallerError::Installation(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            tool.calls_starting_with("install"),
            vec!["install flask", "install broken"]
        );
    }

    #[test]
    fn install_pin_requires_single_package() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        let err = execute_install(&ctx, &["a,b".to_string()], Some("1.0")).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidPackageSpec(_)));
        assert!(tool.calls().is_empty());

        execute_install(&ctx, &["flask".to_string()], Some("2.0.0")).unwrap();
        assert_eq!(
            tool.calls_starting_with("install"),
            vec!["install flask==2.0.0"]
        );
    }

    #[test]
    fn update_with_nothing_outdated_only_self_upgrades() {
        let tool = tool();
        let ctx = Context::new(&tool, OutputMode::Capture);

        execute_update(&ctx, None, true).unwrap();

        assert_eq!(
            tool.calls_starting_with("install"),
            vec!["install --upgrade pip"]
        );
    }

    #[test]
    fn changelog_appends_commits_since_tag_to_readme() {
        let dir = tempdir().unwrap();
        tagged_repo(dir.path());
        commit(dir.path(), "first");
        commit(dir.path(), "second");
        fs::write(dir.path().join("README.md"), "# demo\n").unwrap();

        execute_changelog(dir.path(), Path::new("README.md"), "v1.0.0", "HEAD", "1.1.0").unwrap();

        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        let today = Zoned::now().date().strftime("%Y-%m-%d").to_string();
        assert_eq!(
            readme,
            format!("# demo\n\n### Version 1.1.0 ({})\n\n- second\n- first", today)
        );
    }

    #[test]
    fn changelog_requires_existing_readme_inside_repo() {
        let dir = tempdir().unwrap();
        let err = execute_changelog(dir.path(), Path::new("README.md"), "1.0.0", "HEAD", "1.1.0")
            .unwrap_err();
        assert!(matches!(err, InstallerError::Changelog(_)));
    }

    #[test]
    fn readme_outside_repo_is_rejected() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("repo");
        fs::create_dir(&repo).unwrap();
        fs::write(dir.path().join("README.md"), "# outside").unwrap();

        let repo = repo.canonicalize().unwrap();
        assert!(resolve_readme(&repo, Path::new("../README.md")).is_err());
    }
}
