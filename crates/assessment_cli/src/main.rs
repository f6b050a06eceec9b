//! CLI entry point for the assessment builder core.
//!
//! # Responsibility
//! - Verify `assessment_core` linkage with a deterministic probe.
//! - Inspect and export assessment JSON blobs outside the host app.

use std::path::PathBuf;

use anyhow::{Context, Result};
use assessment_core::{
    check_invariants, decode_str, encode_pretty, sample_assessment, sanitize, write_export,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "assessment_cli",
    about = "Inspect and export assessment builder documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the linked core version
    Ping,
    /// Print the sample assessment for a job
    Sample {
        #[arg(long, default_value = "job-1")]
        job_id: String,
    },
    /// Decode a blob, repair it, and report its shape
    Check { blob: PathBuf },
    /// Write the portable export document for a blob
    Export { blob: PathBuf, out_dir: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Ping) {
        Commands::Ping => {
            println!("assessment_core ping={}", assessment_core::ping());
            println!("assessment_core version={}", assessment_core::core_version());
        }
        Commands::Sample { job_id } => {
            println!("{}", encode_pretty(&sample_assessment(&job_id))?);
        }
        Commands::Check { blob } => {
            let text = std::fs::read_to_string(&blob)
                .with_context(|| format!("failed to read {}", blob.display()))?;
            let decoded = decode_str(&text)
                .with_context(|| format!("failed to decode {}", blob.display()))?;
            let (assessment, repairs) = sanitize(decoded);
            for repair in &repairs {
                println!("repair: {repair}");
            }
            check_invariants(&assessment)?;
            println!(
                "title={} sections={} questions={} repairs={}",
                assessment.title,
                assessment.sections.len(),
                assessment.question_count(),
                repairs.len()
            );
        }
        Commands::Export { blob, out_dir } => {
            let text = std::fs::read_to_string(&blob)
                .with_context(|| format!("failed to read {}", blob.display()))?;
            let (assessment, _) = sanitize(decode_str(&text)?);
            let path = write_export(&assessment, &out_dir)?;
            println!("exported {}", path.display());
        }
    }
    Ok(())
}
