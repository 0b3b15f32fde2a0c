mod agents;
mod cli;
mod error;
mod pip;
mod utils;
mod workflow;

use agents::package_tool::{OutputMode, PackageTool, PipAgent};
use agents::package_scaffolder::ScaffoldRequest;
use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use std::backtrace::Backtrace;
use std::panic;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use workflow::Context;

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    install_crash_report(cli.pip.clone());

    let tool = PipAgent::new(cli.pip.clone(), cli.python.clone());
    let mode = if cli.quiet {
        OutputMode::Capture
    } else {
        OutputMode::Stream
    };
    let ctx = Context::new(&tool, mode);

    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => workflow::execute_menu(&ctx),
        Commands::Install { packages, pin } => {
            workflow::execute_install(&ctx, &packages, pin.as_deref())
        }
        Commands::Update {
            filter,
            no_self_upgrade,
        } => workflow::execute_update(&ctx, filter, !no_self_upgrade),
        Commands::Outdated => workflow::execute_outdated(&ctx),
        Commands::Uninstall {
            packages,
            assume_yes,
        } => workflow::execute_uninstall(&ctx, &packages, assume_yes),
        Commands::Stats => workflow::execute_stats(&ctx),
        Commands::Create {
            name,
            author,
            release,
            requires,
            main_file,
            dir,
            force,
        } => workflow::execute_create(
            &dir,
            &ScaffoldRequest {
                author,
                name,
                version: release,
                requirements: ScaffoldRequest::parse_requirements(&requires),
                main_file,
                force,
            },
        ),
        Commands::Changelog {
            from,
            to,
            release,
            readme,
            repo,
        } => workflow::execute_changelog(&repo, &readme, &from, &to, &release),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(e.exit_code());
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Replace the default panic output with a report users can paste into an issue.
fn install_crash_report(tool_program: String) {
    panic::set_hook(Box::new(move |info| {
        let tool_version = PipAgent::new(tool_program.clone(), String::new())
            .run(&["--version"], OutputMode::Capture)
            .map(|output| output.stdout.trim().to_string())
            .unwrap_or_else(|e| format!("unavailable ({})", e));

        eprintln!("\n{}", "========== Crash Report ==========".red().bold());
        eprintln!("An error occurred while running the program.");
        eprintln!("Please help us improve by reporting this issue.");
        eprintln!("{}", "-----------------------------------".dimmed());
        eprintln!("System Information:");
        eprintln!("pip-installer version: {}", env!("CARGO_PKG_VERSION"));
        eprintln!("Package tool: {}", tool_version);
        eprintln!(
            "Operating System: {} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        eprintln!("{}", "-----------------------------------".dimmed());
        eprintln!("Error Details:");
        eprintln!("{}", info);
        eprintln!("{}", Backtrace::force_capture());
        eprintln!("{}", "===================================".red().bold());
    }));
}
