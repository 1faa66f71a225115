//! stagepack - stages a compiled application tree and builds its installer.
//!
//! Declarative selection rules pick files out of the build tree; the staged
//! result is turned into an installer whose uninstall section removes exactly
//! what the install section created.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use stagepack::commands;
use stagepack::config::{Action, Config, Platform};

#[derive(Parser)]
#[command(name = "stagepack")]
#[command(about = "Stage an application tree and build its installer")]
#[command(
    after_help = "QUICK START:\n  stagepack show config    Check the resolved configuration\n  stagepack build          Stage files and build the package\n  stagepack show script    Inspect the generated install/uninstall commands\n  stagepack clean          Remove staged output"
)]
struct Cli {
    /// Enable verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage files and build the package
    Build {
        /// Target platform (windows, darwin, linux-i686, linux-x86_64)
        #[arg(long)]
        platform: Option<Platform>,

        /// Source (build) tree root
        #[arg(long)]
        source: Option<PathBuf>,

        /// Staging tree root
        #[arg(long)]
        dest: Option<PathBuf>,

        /// JSON rule file to use instead of the built-in platform rules
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Comma-separated actions: copy, package
        #[arg(long, default_value = "copy,package")]
        actions: String,

        /// Skip mandatory rules that match nothing instead of failing
        #[arg(long)]
        permissive: bool,

        /// Hard-link files into the staging tree instead of copying
        #[arg(long)]
        link: bool,

        /// Kill external tools (installer compiler, signer) after SECS seconds
        #[arg(long, value_name = "SECS")]
        tool_timeout: Option<u64>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Remove staged output (default: staging tree and records)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show the staged-file record of the last build
    Manifest,
    /// Show install/uninstall commands for the last build
    Script,
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Clean the staging tree, manifest record and script
    Staging,
    /// Also clean the installer or archive
    All,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "stagepack=info",
        1 => "stagepack=debug",
        _ => "stagepack=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present; real environment variables win.
    dotenvy::dotenv().ok();
    init_logging(cli.verbose);
    let mut config = Config::load()?;

    match cli.command {
        Commands::Build {
            platform,
            source,
            dest,
            rules,
            actions,
            permissive,
            link,
            tool_timeout,
        } => {
            if let Some(platform) = platform {
                config.platform = platform;
            }
            if let Some(source) = source {
                config.source = source;
            }
            if let Some(dest) = dest {
                config.dest = dest;
            }
            config.permissive |= permissive;
            config.link |= link;

            let options = commands::build::BuildOptions {
                rules,
                actions: Action::parse_list(&actions)?,
                tool_timeout: tool_timeout.map(Duration::from_secs),
            };
            commands::cmd_build(&config, &options)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Manifest => commands::show::ShowTarget::Manifest,
                ShowTarget::Script => commands::show::ShowTarget::Script,
            };
            commands::cmd_show(show_target, &config)?;
        }

        Commands::Clean { what } => {
            let clean_target = match what {
                None | Some(CleanTarget::Staging) => commands::clean::CleanTarget::Staging,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(clean_target, &config)?;
        }
    }

    Ok(())
}
