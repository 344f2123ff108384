mod app;
mod config;
mod effects;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use engine_logging::LogDestination;
use log::LevelFilter;

use crate::app::ConvertRequest;
use crate::config::AppConfig;

/// Convert batches of files through a remote conversion service.
#[derive(Parser, Debug)]
#[command(name = "batchconv", version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (RON). Defaults to ./batchconv.ron when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors, or with a log file configured, log to it alone.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List categories, accepted inputs and operations.
    Catalog,
    /// Convert files with one operation.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Category id, e.g. image, video, ocr, pdf.
    #[arg(long, default_value = "image")]
    category: String,

    /// Operation id or output format, e.g. webp or pdf-to-docx.
    #[arg(long)]
    operation: String,

    /// Conversion service base URL.
    #[arg(long, env = "BATCHCONV_SERVER")]
    server: Option<String>,

    /// Save converted files here.
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(cli.config.as_deref())?;

    // Quiet with a log file keeps the terminal clear and logs to the file only.
    let (destination, level) = match (&config.log_file, cli.quiet) {
        (Some(path), true) => (LogDestination::File(path.clone()), config.level_filter()),
        (Some(path), false) => (LogDestination::Both(path.clone()), config.level_filter()),
        (None, true) => (LogDestination::Terminal, LevelFilter::Error),
        (None, false) => (LogDestination::Terminal, config.level_filter()),
    };
    let level = if cli.verbose { LevelFilter::Debug } else { level };
    engine_logging::initialize(destination, level);

    match cli.command {
        Command::Catalog => Ok(app::run_catalog()),
        Command::Convert(args) => app::run_convert(
            &config,
            ConvertRequest {
                category: args.category,
                operation: args.operation,
                server: args.server,
                download_dir: args.download_dir,
                files: args.files,
            },
        ),
    }
}
