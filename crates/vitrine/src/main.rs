//! vitrine CLI - static site assembler with build-time configuration injection.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use vitrine_static::Delivery;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(about = "Static site assembler with build-time configuration injection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to site.toml config file
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a site in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Assemble the deployable site
    Build {
        /// Source directory (defaults to config or ".")
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory (defaults to config or "public")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How the runtime configuration is delivered: inline or file
        #[arg(long)]
        delivery: Option<Delivery>,

        /// Minify HTML output
        #[arg(long)]
        minify: bool,
    },

    /// Build, serve and rebuild on change with live reload
    Dev {
        /// Port to listen on
        #[arg(short, long, default_value = "7777")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Preview the built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = "public")]
        dir: PathBuf,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(yes).await?;
        }
        Commands::Build {
            source,
            output,
            delivery,
            minify,
        } => {
            let overrides = config::Overrides {
                source,
                output,
                delivery,
                minify,
            };
            commands::build::run(&cli.config, overrides).await?;
        }
        Commands::Dev { port, no_open } => {
            commands::dev::run(&cli.config, port, !no_open).await?;
        }
        Commands::Serve { port, dir, no_open } => {
            commands::serve::run(port, dir, !no_open).await?;
        }
    }

    Ok(())
}
