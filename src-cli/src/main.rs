//! specsheet - Spec sheet and catalog exporter
//!
//! Builds page documents from a template or catalog sections and a data
//! file, runs them through the export job protocol and prints where the
//! finished artifact was written.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use page_render::OutputMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "specsheet")]
#[command(version, about = "Spec sheet and catalog exporter", long_about = None)]
#[command(after_help = "EXAMPLES:
    specsheet single sheet.json products.csv --record 3
    specsheet catalog sections.json products.csv --out-dir exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Export configuration (JSON); defaults apply when absent
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory the chunks and artifacts are written to
    #[arg(long, global = true, default_value = "exports")]
    pub out_dir: PathBuf,

    /// Output medium: digital or print
    #[arg(long, global = true)]
    pub mode: Option<OutputMode>,

    /// Omit the preview watermark
    #[arg(long, global = true)]
    pub licensed: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export a single template bound to one data row
    Single {
        /// Template JSON
        template: PathBuf,
        /// CSV, TSV or JSON data file
        data: PathBuf,
        /// Zero-based row to bind
        #[arg(long, default_value_t = 0)]
        record: usize,
        /// Output file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Export a catalog with cover, contents, chapters and product pages
    Catalog {
        /// Catalog sections JSON
        sections: PathBuf,
        /// CSV, TSV or JSON data file
        data: PathBuf,
        /// Output file name
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match commands::run(cli).await {
        Ok(location) => {
            println!("{}", location);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Export failed: {:#}", e);
            eprintln!("error: {}", export_jobs::USER_FACING_ERROR);
            ExitCode::FAILURE
        }
    }
}
