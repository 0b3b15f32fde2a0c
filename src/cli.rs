use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pip-installer",
    about = "Pip Installer - install, update, list, and uninstall Python packages through pip",
    version,
    author
)]
pub struct Cli {
    /// Package tool executable to drive
    #[arg(long = "pip", env = "PIP_INSTALLER_TOOL", default_value = "pip", global = true)]
    pub pip: String,

    /// Python interpreter used to bootstrap the package tool with ensurepip
    #[arg(long, env = "PIP_INSTALLER_PYTHON", default_value = "python3", global = true)]
    pub python: String,

    /// Capture the tool's own output and show progress bars instead
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive numbered menu (default)
    Menu,

    /// Install one or more packages (comma-separated lists are accepted)
    Install {
        /// Package specs, e.g. "requests" or "flask==3.0.0" or "numpy,pandas"
        #[arg(value_name = "PACKAGE", required = true)]
        packages: Vec<String>,

        /// Pin a single package to an exact version
        #[arg(long = "version", value_name = "VERSION")]
        pin: Option<String>,
    },

    /// Upgrade the package tool itself and then every outdated package
    Update {
        /// Only upgrade packages whose name matches this glob (e.g. "django*")
        #[arg(long, value_name = "GLOB")]
        filter: Option<String>,

        /// Skip upgrading the package tool before the batch
        #[arg(long)]
        no_self_upgrade: bool,
    },

    /// List outdated packages without changing anything
    Outdated,

    /// Uninstall one or more packages
    Uninstall {
        /// Package names (comma-separated lists are accepted)
        #[arg(value_name = "PACKAGE", required = true)]
        packages: Vec<String>,

        /// Do not ask for confirmation
        #[arg(short = 'y', long = "yes")]
        assume_yes: bool,
    },

    /// Show installed and outdated package counts
    Stats,

    /// Scaffold a new Python package (setup.py, README.md, package directory)
    Create {
        /// Package name
        #[arg(long)]
        name: String,

        /// Author name
        #[arg(long)]
        author: String,

        /// Initial package version
        #[arg(long = "release", value_name = "VERSION", default_value = "0.1.0")]
        release: String,

        /// Requirements, comma-separated
        #[arg(long, value_name = "LIST", default_value = "")]
        requires: String,

        /// File whose contents become main.py
        #[arg(long = "main", value_name = "PATH")]
        main_file: Option<PathBuf>,

        /// Directory to create the package in
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Overwrite an existing setup.py and README.md
        #[arg(long)]
        force: bool,
    },

    /// Append a changelog entry built from git commit subjects to a README
    Changelog {
        /// Previous release tag (start of the range, exclusive)
        #[arg(long = "from", value_name = "REF")]
        from: String,

        /// End of the range
        #[arg(long = "to", value_name = "REF", default_value = "HEAD")]
        to: String,

        /// Version label of the new release
        #[arg(long = "release", value_name = "VERSION")]
        release: String,

        /// README file to append to, relative to the repository
        #[arg(long, default_value = "README.md")]
        readme: PathBuf,

        /// Path to the git repository
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}
