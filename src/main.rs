//! stackview: print a captured stack trace the way a crash viewer shows it
//!
//! Reads an error report as JSON (platform, stacktrace and
//! `debug_meta.images`) and prints the rendered frame list as text or JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stackview::{stackview, Config, OutputFormat};

#[derive(Parser)]
#[command(name = "stackview")]
#[command(about = "Render stack traces from error reports")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the stack trace of a JSON report
    Render {
        /// Path to the JSON report
        #[arg(short, long)]
        input: PathBuf,

        /// Show library and runtime frames too
        #[arg(short = 's', long)]
        include_system_frames: bool,

        /// Expand the last app frame with its source context
        #[arg(short, long)]
        expand_first_frame: bool,

        /// Print the most recent call first
        #[arg(short, long)]
        newest_first: bool,

        /// Platform tag (defaults to the report's platform)
        #[arg(short, long)]
        platform: Option<String>,

        /// Show absolute addresses instead of image-relative ones
        #[arg(short, long)]
        absolute: bool,

        /// Show full function names
        #[arg(long)]
        full_function_names: bool,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            include_system_frames,
            expand_first_frame,
            newest_first,
            platform,
            absolute,
            full_function_names,
            format,
        } => {
            let config = Config {
                verbosity: cli.verbose,
                input,
                include_system_frames,
                expand_first_frame,
                newest_first,
                platform,
                absolute_addresses: absolute,
                full_function_names,
                format,
            };
            init_logging(&config);
            println!("{}", stackview(&config)?);
            Ok(())
        }
    }
}
