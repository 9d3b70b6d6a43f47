//! dicom-codec-eval CLI - DICOM compression evaluation tool

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dicom_codec_eval::OutputNaming;

mod commands;

/// Compression ratio, timing and image quality evaluation for DICOM sets.
#[derive(Parser)]
#[command(name = "dicom-codec-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcode every image of the given sets and report quality metrics
    Evaluate {
        /// Input directories of single-image DICOM files
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Output root for reconstructed files and reports
        #[arg(short, long)]
        out: PathBuf,

        /// Target transfer syntax UID (default: JPEG Baseline)
        #[arg(long, default_value = commands::evaluate::JPEG_BASELINE)]
        transfer_syntax: String,

        /// Transcode back to Explicit VR Little Endian before writing
        #[arg(long)]
        decompress: bool,

        /// Naming scheme for reconstructed files
        #[arg(long, value_enum, default_value_t = Naming::Timestamp)]
        naming: Naming,

        /// Fixed SSIM data range instead of the pixel-type table
        #[arg(long)]
        data_range: Option<f64>,

        /// Do not write metrics.csv, summary.csv and summary.json
        #[arg(long)]
        no_reports: bool,
    },

    /// Summarise a previously written metrics.csv
    Stats {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show pixel type, shape and data range of a DICOM file
    Inspect {
        /// DICOM file
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Naming {
    /// reconstructed-<timestamp>.dcm
    Timestamp,
    /// <source file name>-reconstructed.dcm
    Source,
}

impl From<Naming> for OutputNaming {
    fn from(naming: Naming) -> Self {
        match naming {
            Naming::Timestamp => Self::Timestamp,
            Naming::Source => Self::SourceName,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Evaluate {
            dirs,
            out,
            transfer_syntax,
            decompress,
            naming,
            data_range,
            no_reports,
        } => commands::evaluate::run(commands::evaluate::Options {
            dirs,
            out,
            transfer_syntax,
            decompress,
            naming: naming.into(),
            data_range,
            write_reports: !no_reports,
        }),
        Commands::Stats { input, json } => commands::stats::run(input, json),
        Commands::Inspect { path } => commands::inspect::run(path),
    }
}
