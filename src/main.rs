use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing::error;

mod config;
mod error;
mod extract;
mod format;
mod logging;
mod lookup;
mod parser;
mod pipeline;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::features::FeatureEngineer;
use crate::pipeline::{write_features, ResumePipeline};

#[derive(Parser)]
#[command(name = "resume_refinery")]
#[command(about = "Resume document to feature record refinement pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Input resume document
    input: PathBuf,

    /// Format tag override (pdf, docx); inferred from the extension otherwise
    #[arg(long)]
    format: Option<String>,

    /// Output path for the feature record JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    logging::init_logging();

    if let Err(e) = run() {
        error!("pipeline failed: {e}");
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let started = Instant::now();

    let pipeline = ResumePipeline::new().with_engineer(
        FeatureEngineer::new().with_fallback_birth_year(config.pipeline.fallback_birth_year),
    );

    let features = pipeline.run_file(&cli.input, cli.format.as_deref())?;

    let output_path = cli.output.unwrap_or_else(|| {
        let stem = cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string());
        PathBuf::from(&config.output.dir).join(format!("features_{stem}.json"))
    });
    write_features(&features, &output_path)?;

    println!("✅ Feature record written to {}", output_path.display());
    println!("   Fields: {}", features.len());
    println!("   Elapsed: {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}
