//! terradelta CLI - change detection between two acquisitions of a scene

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use terradelta_algorithms::detection::{detect, DetectionMethod, DetectionOutcome, DetectionRequest};
use terradelta_algorithms::difference::{difference, DifferenceMethod};
use terradelta_algorithms::normalize::band_ranges;
use terradelta_algorithms::overlay::change_overlay;
use terradelta_algorithms::regions::ChangeStatistics;
use terradelta_algorithms::vegetation::{VegetationOutcome, VegetationParams};
use terradelta_core::io::{
    read_multiband_geotiff, read_multiband_geotiff_with_info, write_geotiff, write_mask_geotiff,
    write_rgb_geotiff,
};
use terradelta_core::MultiBandRaster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terradelta")]
#[command(author, version, about = "Change detection between two satellite rasters", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Write the band-averaged difference map of two rasters
    Difference {
        /// Raster at the earlier date
        before: PathBuf,
        /// Raster at the later date
        after: PathBuf,
        /// Output file (32-bit float)
        output: PathBuf,
        /// Difference method: absolute, ratio, log_ratio
        #[arg(short, long, default_value = "absolute")]
        method: String,
    },
    /// Detect changes and write a binary change mask
    Detect {
        /// Raster at the earlier date
        before: PathBuf,
        /// Raster at the later date
        after: PathBuf,
        /// Output mask file (8-bit, 1 = changed)
        output: PathBuf,
        /// Detection method: threshold, otsu, cvd, vegetation
        #[arg(short, long, default_value = "threshold")]
        method: String,
        /// Change threshold (threshold: 0.15, cvd: 0.1 when omitted)
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Cleanup disk radius in pixels
        #[arg(short, long, default_value = "2")]
        radius: usize,
        /// Red band index (vegetation)
        #[arg(long, default_value = "0")]
        red: usize,
        /// Near-infrared band index (vegetation)
        #[arg(long, default_value = "1")]
        nir: usize,
        /// Index change below which a pixel is vegetation loss
        #[arg(long, default_value = "-0.1", allow_hyphen_values = true)]
        loss_threshold: f64,
        /// Index change above which a pixel is vegetation gain
        #[arg(long, default_value = "0.1", allow_hyphen_values = true)]
        gain_threshold: f64,
        /// Write the change statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,
        /// Write an RGB preview with changes painted red
        #[arg(long)]
        overlay: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<MultiBandRaster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_multiband_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!(
        "Input: {} x {} x {} band(s)",
        raster.cols(),
        raster.rows(),
        raster.bands()
    );
    Ok(raster)
}

fn read_pair(before: &Path, after: &Path) -> Result<(MultiBandRaster<f64>, MultiBandRaster<f64>)> {
    let before = read_raster(before)?;
    let after = read_raster(after)?;
    if !before.transform().is_aligned_with(after.transform(), 1e-9) {
        warn!("Rasters have different georeferencing; comparing pixel grids as-is");
    }
    Ok((before, after))
}

fn write_stats(stats: &ChangeStatistics, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), stats).context("Failed to write statistics")?;
    Ok(())
}

fn print_statistics(stats: &ChangeStatistics) {
    println!("\nChange statistics:");
    println!("  Total pixels:      {}", stats.total_pixels);
    println!("  Changed pixels:    {}", stats.changed_pixels);
    println!("  Unchanged pixels:  {}", stats.unchanged_pixels);
    println!("  Change:            {:.2}%", stats.change_percentage);
    println!("  Change regions:    {}", stats.num_change_regions);
    println!("  Mean region size:  {:.1}", stats.mean_region_size);
    println!("  Max region size:   {}", stats.max_region_size);

    let severity = stats.severity();
    println!("\n{}", severity.description());
}

fn print_method_details(outcome: &DetectionOutcome) {
    if let Some(threshold) = outcome.threshold {
        println!("Threshold: {}", threshold);
    }
    if let Some(otsu) = outcome.otsu {
        match otsu.level() {
            Some(level) => println!("Otsu threshold: {} / 255", level),
            None => println!("Otsu threshold: none (constant difference image)"),
        }
    }
    match &outcome.vegetation {
        Some(VegetationOutcome::Available(change)) => {
            let s = change.summary;
            println!(
                "Vegetation loss: {} px ({:.2}%), gain: {} px ({:.2}%)",
                s.loss_pixels, s.loss_percentage, s.gain_pixels, s.gain_percentage
            );
        }
        Some(VegetationOutcome::Unavailable {
            required_bands,
            available_bands,
        }) => {
            println!(
                "Vegetation index unavailable: needs {} bands, raster has {}",
                required_bands, available_bands
            );
        }
        None => {}
    }
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let (raster, meta) = read_multiband_geotiff_with_info(&input)
                .with_context(|| format!("Failed to read raster {}", input.display()))?;
            let bounds = meta.transform.bounds(meta.width, meta.height);

            println!("File: {}", input.display());
            println!(
                "Dimensions: {} x {} ({} cells), {} band(s)",
                meta.width,
                meta.height,
                meta.width * meta.height,
                meta.bands
            );
            println!("Data type: {}", meta.dtype);
            println!(
                "Pixel size: {} x {}",
                meta.transform.pixel_width, meta.transform.pixel_height
            );
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = meta.nodata {
                println!("NoData: {}", nodata);
            }

            println!("\nBand ranges:");
            for (band, range) in band_ranges(&raster).into_iter().enumerate() {
                match range {
                    Some((min, max)) => println!("  Band {}: {:.4} .. {:.4}", band, min, max),
                    None => println!("  Band {}: no valid cells", band),
                }
            }
        }

        // ── Difference ───────────────────────────────────────────────
        Commands::Difference {
            before,
            after,
            output,
            method,
        } => {
            let method: DifferenceMethod = method.parse()?;
            let (before, after) = read_pair(&before, &after)?;
            let start = Instant::now();
            let diff = difference(&before, &after, method)
                .context("Failed to compute difference map")?;
            let elapsed = start.elapsed();

            let pb = spinner("Writing output...");
            write_geotiff(&diff, &output).context("Failed to write output")?;
            pb.finish_and_clear();
            done(&format!("Difference map ({})", method), &output, elapsed);
        }

        // ── Detect ───────────────────────────────────────────────────
        Commands::Detect {
            before,
            after,
            output,
            method,
            threshold,
            radius,
            red,
            nir,
            loss_threshold,
            gain_threshold,
            stats,
            overlay,
        } => {
            let method: DetectionMethod = method.parse()?;
            if threshold.is_some()
                && matches!(method, DetectionMethod::Otsu | DetectionMethod::Vegetation)
            {
                bail!("--threshold has no effect with the {} method", method);
            }

            let mut request = DetectionRequest::new(method)
                .with_radius(radius)
                .with_vegetation(VegetationParams {
                    red_band: red,
                    nir_band: nir,
                    loss_threshold,
                    gain_threshold,
                });
            if let Some(t) = threshold {
                request = request.with_threshold(t);
            }

            let (before, after) = read_pair(&before, &after)?;
            let start = Instant::now();
            let outcome = detect(&before, &after, &request).context("Change detection failed")?;
            let summary = outcome.statistics();
            let elapsed = start.elapsed();

            let pb = spinner("Writing output...");
            write_mask_geotiff(&outcome.mask, &output).context("Failed to write output")?;
            if let Some(path) = &overlay {
                let rgb = change_overlay(&after, &outcome.mask)?;
                write_rgb_geotiff(&rgb, after.transform(), path)
                    .context("Failed to write overlay")?;
            }
            if let Some(path) = &stats {
                write_stats(&summary, path)?;
            }
            pb.finish_and_clear();

            done(&format!("Change mask ({})", method), &output, elapsed);
            if let Some(path) = &overlay {
                println!("Overlay saved to: {}", path.display());
            }
            print_method_details(&outcome);
            print_statistics(&summary);
        }
    }

    Ok(())
}
