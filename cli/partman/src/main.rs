//! partman CLI: resolve a flash partition layout from per-image declarations.

mod commands;
mod input;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use input::InputArgs;

#[derive(Parser)]
#[command(
    name = "partman",
    version,
    about = "Resolve relative partition placements into a flash layout"
)]
struct Cli {
    /// Log every placement and address decision
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the layout and write override and pm_config headers
    Generate {
        #[command(flatten)]
        input: InputOpts,
        /// Override header file name, written next to each image's declarations
        #[arg(short = 'o', long = "override", default_value = "override.h")]
        override_name: String,
        /// Aggregate header file name, written next to each image's declarations
        #[arg(short = 'p', long = "pm-config-file-name", default_value = "pm_config.h")]
        pm_config: String,
        /// Path of the application's own override header
        #[arg(short = 'a', long)]
        app_override_file: PathBuf,
        /// Also write KEY=value layout files under this name
        #[arg(long)]
        kv_config: Option<String>,
        /// Flash driver name reported for every area
        #[arg(long, default_value = "NRF_FLASH_DRV_NAME")]
        flash_device: String,
    },
    /// Resolve the layout and print it
    Show {
        #[command(flatten)]
        input: InputOpts,
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Resolve the layout and report whether it is valid
    Check {
        #[command(flatten)]
        input: InputOpts,
    },
}

#[derive(Args)]
struct InputOpts {
    /// Partition declaration files (pm.toml), one per image
    #[arg(short, long = "input", num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,
    /// Generated autoconf.h files; the first one gives the flash size
    #[arg(short, long = "configs", num_args = 1.., required = true)]
    configs: Vec<PathBuf>,
    /// Anchor partition added when no declaration marks one
    #[arg(long, default_value = "app")]
    anchor: String,
}

impl InputOpts {
    fn into_args(self, app_override_file: Option<PathBuf>) -> InputArgs {
        InputArgs {
            inputs: self.inputs,
            configs: self.configs,
            anchor: self.anchor,
            app_override_file,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Log to stderr, filtered by `PARTMAN_LOG`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PARTMAN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            input,
            override_name,
            pm_config,
            app_override_file,
            kv_config,
            flash_device,
        } => commands::generate::run(
            &input.into_args(Some(app_override_file)),
            &commands::generate::Outputs {
                override_name,
                pm_config,
                kv_config,
                flash_device,
            },
        ),

        Commands::Show { input, format } => commands::show::run(&input.into_args(None), &format),

        Commands::Check { input } => commands::check::run(&input.into_args(None)),
    }
}
