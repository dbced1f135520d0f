use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use brf_scraper::config::Settings;
use brf_scraper::dom::Snapshot;
use brf_scraper::export::{self, ExportOptions};
use brf_scraper::parser;

#[derive(Parser)]
#[command(name = "brf_scraper", about = "Brief record field extractor for CRM page snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one snapshot into an export file
    Extract {
        /// HTML snapshot of a rendered record page
        snapshot: PathBuf,
        /// Page URL (default: the snapshot's canonical link)
        #[arg(long)]
        url: Option<String>,
        /// Include the flat key → value map
        #[arg(long)]
        details: bool,
        /// Print the payload instead of writing a file
        #[arg(long)]
        stdout: bool,
        /// Output directory (default: from settings)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Extract every *.html snapshot in a directory
    Batch {
        dir: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        details: bool,
    },
    /// Show the raw label/value pairs of a snapshot
    Inspect {
        snapshot: PathBuf,
        /// Print the pairs as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings = ?settings, "settings loaded");

    let result = match cli.command {
        Commands::Extract {
            snapshot,
            url,
            details,
            stdout,
            out,
        } => {
            let snap = load_snapshot(&snapshot)?;
            let url = url.or_else(|| snap.page_url()).unwrap_or_default();
            if url.is_empty() {
                warn!(path = %snapshot.display(), "no page URL; record id will be unknown");
            }
            let options = ExportOptions {
                include_details: details,
                chatter_max: settings.chatter_max,
            };
            let payload = export::build_payload(&snap, &url, &options, chrono::Utc::now());
            if stdout {
                println!("{}", export::to_json(&payload, settings.pretty)?);
            } else {
                let dir = out.unwrap_or_else(|| settings.out_dir.clone());
                let path = export::write_payload(&payload, &dir, settings.pretty)?;
                println!("Exported {}", path.display());
            }
            Ok(())
        }
        Commands::Batch { dir, out, details } => {
            let snapshots = list_snapshots(&dir)?;
            if snapshots.is_empty() {
                println!("No .html snapshots in {}.", dir.display());
                return Ok(());
            }
            println!("Extracting {} snapshots...", snapshots.len());
            let options = ExportOptions {
                include_details: details,
                chatter_max: settings.chatter_max,
            };
            let out_dir = out.unwrap_or_else(|| settings.out_dir.clone());
            let counts = extract_batch(&snapshots, &out_dir, &options, settings.pretty);
            counts.print();
            Ok(())
        }
        Commands::Inspect { snapshot, json } => {
            let snap = load_snapshot(&snapshot)?;
            let pairs = parser::extract_pairs(&snap)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pairs)?);
                return Ok(());
            }
            if pairs.is_empty() {
                println!("No field labels found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<22} | {:<32} | {}",
                "#", "Label", "Section", "Value", "Link"
            );
            println!("{}", "-".repeat(110));
            for (i, p) in pairs.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<22} | {:<32} | {}",
                    i + 1,
                    truncate(&p.label, 28),
                    truncate(&p.section_title_hint, 22),
                    truncate(&p.value, 32),
                    truncate(&p.link, 40),
                );
            }
            println!("\n{} labels", pairs.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::from_path(path).with_context(|| format!("Failed to read snapshot {}", path.display()))
}

fn list_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("html")))
        .collect();
    paths.sort();
    Ok(paths)
}

struct BatchCounts {
    exported: usize,
    fields: usize,
    errors: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!(
            "Exported {} snapshots ({} populated fields), {} errors.",
            self.exported, self.fields, self.errors,
        );
    }
}

fn extract_batch(
    snapshots: &[PathBuf],
    out_dir: &Path,
    options: &ExportOptions,
    pretty: bool,
) -> BatchCounts {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(snapshots.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results: Vec<Result<usize>> = snapshots
        .par_iter()
        .map(|path| {
            let outcome = export_one(path, out_dir, options, pretty);
            pb.inc(1);
            outcome
        })
        .collect();
    pb.finish_and_clear();

    let mut counts = BatchCounts {
        exported: 0,
        fields: 0,
        errors: 0,
    };
    for (path, result) in snapshots.iter().zip(results) {
        match result {
            Ok(fields) => {
                counts.exported += 1;
                counts.fields += fields;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "snapshot failed");
                counts.errors += 1;
            }
        }
    }
    counts
}

/// Returns the number of populated fields written.
fn export_one(path: &Path, out_dir: &Path, options: &ExportOptions, pretty: bool) -> Result<usize> {
    let snap = load_snapshot(path)?;
    let url = snap.page_url().unwrap_or_default();
    let payload = export::build_payload(&snap, &url, options, chrono::Utc::now());
    let fields = payload
        .sections
        .values()
        .flat_map(|s| s.values())
        .filter(|v| v.is_some())
        .count();
    export::write_payload(&payload, out_dir, pretty)?;
    Ok(fields)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
