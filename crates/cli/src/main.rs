//! mapalg CLI - map algebra over GeoTIFF grids

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use mapalg_algorithms::focal::{focal_statistics, FocalParams, FocalStatistic};
use mapalg_algorithms::{binary, con, LocalOp, Operand, ProcessingMode};
use mapalg_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use mapalg_core::{Grid, GridInfo, Statistics};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "mapalg")]
#[command(author, version, about = "Local, focal and conditional map algebra", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads (default: all cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show grid metadata and statistics
    Info {
        /// Input raster file
        input: PathBuf,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Neighborhood statistic of every cell
    Focal {
        /// Input raster file
        input: PathBuf,
        /// Output raster file
        output: PathBuf,
        /// Statistic: avg, max, min, range, sum, stdev
        #[arg(short, long, default_value = "avg")]
        stat: String,
        /// Window radius in cells
        #[arg(short, long, default_value = "1")]
        radius: i64,
        /// Circular window instead of square
        #[arg(long)]
        circle: bool,
        /// Save as Float32 instead of Int16
        #[arg(long)]
        float: bool,
    },
    /// Cell-by-cell operator on two operands
    Calc {
        /// Operator: add, sub, mul, div, mod, pow, min, max, eq, ne, gt, lt, ge, le, and, or
        op: String,
        /// Left operand: raster file or number
        a: String,
        /// Right operand: raster file or number
        b: String,
        /// Output raster file
        output: PathBuf,
        /// Save as Float32 instead of Int16
        #[arg(long)]
        float: bool,
    },
    /// Pick from one of two operands where a predicate raster is 1
    Con {
        /// Predicate raster file
        predicate: PathBuf,
        /// Value where the predicate is 1: raster file or number
        when_true: String,
        /// Value elsewhere: raster file or number
        when_false: String,
        /// Output raster file
        output: PathBuf,
        /// Save as Float32 instead of Int16
        #[arg(long)]
        float: bool,
    },
}

/// Operand given on the command line
enum Arg {
    Raster(PathBuf),
    Value(f32),
}

/// Operand after loading
enum Loaded {
    Grid(Grid),
    Value(f32),
}

impl Loaded {
    fn operand(&self) -> Operand<'_> {
        match self {
            Loaded::Grid(g) => Operand::Grid(g),
            Loaded::Value(v) => Operand::Scalar(Some(*v)),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    file: String,
    info: &'a GridInfo,
    statistics: &'a Statistics,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_grid(path: &Path) -> Result<Grid> {
    let pb = spinner("Reading raster...");
    let grid = read_geotiff(path, 1)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} ({})", grid.width(), grid.height(), path.display());
    Ok(grid)
}

fn write_result(grid: &Grid, path: &Path, float: bool) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(grid, path, &GeoTiffOptions::floating_point(float))
        .with_context(|| format!("Failed to write output {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_arg(s: &str) -> Arg {
    match s.parse::<f32>() {
        Ok(v) => Arg::Value(v),
        Err(_) => Arg::Raster(PathBuf::from(s)),
    }
}

fn load(arg: Arg) -> Result<Loaded> {
    Ok(match arg {
        Arg::Raster(path) => Loaded::Grid(read_grid(&path)?),
        Arg::Value(v) => Loaded::Value(v),
    })
}

fn parse_local_op(s: &str) -> Result<LocalOp> {
    match s.to_lowercase().as_str() {
        "add" | "+" => Ok(LocalOp::Add),
        "subtract" | "sub" | "-" => Ok(LocalOp::Subtract),
        "multiply" | "mul" | "*" => Ok(LocalOp::Multiply),
        "divide" | "div" | "/" => Ok(LocalOp::Divide),
        "modulo" | "mod" | "%" => Ok(LocalOp::Modulo),
        "power" | "pow" | "^" => Ok(LocalOp::Power),
        "min" => Ok(LocalOp::Min),
        "max" => Ok(LocalOp::Max),
        "eq" | "==" => Ok(LocalOp::Equal),
        "ne" | "!=" => Ok(LocalOp::NotEqual),
        "gt" | ">" => Ok(LocalOp::Greater),
        "lt" | "<" => Ok(LocalOp::Less),
        "ge" | ">=" => Ok(LocalOp::GreaterEqual),
        "le" | "<=" => Ok(LocalOp::LessEqual),
        "and" | "&" => Ok(LocalOp::And),
        "or" | "|" => Ok(LocalOp::Or),
        _ => anyhow::bail!(
            "Unknown operation: {}. Use add, sub, mul, div, mod, pow, min, max, eq, ne, gt, lt, ge, le, and, or.",
            s
        ),
    }
}

fn parse_focal_stat(s: &str) -> Result<FocalStatistic> {
    match s.to_lowercase().as_str() {
        "avg" | "average" | "mean" => Ok(FocalStatistic::Average),
        "max" => Ok(FocalStatistic::Max),
        "min" => Ok(FocalStatistic::Min),
        "range" => Ok(FocalStatistic::Range),
        "sum" => Ok(FocalStatistic::Sum),
        "stdev" | "std" => Ok(FocalStatistic::StdDev),
        _ => anyhow::bail!(
            "Unknown statistic: {}. Use avg, max, min, range, sum, stdev.",
            s
        ),
    }
}

fn fmt_opt(v: Option<f32>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let mode = match cli.threads {
        Some(n) => ProcessingMode::ParallelWith(n),
        None => ProcessingMode::Parallel,
    };
    debug!("Processing mode: {:?}", mode);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let grid = read_grid(&input)?;
            let info = grid.info();
            let stats = grid.statistics();

            if json {
                let report = Report {
                    file: input.display().to_string(),
                    info,
                    statistics: stats,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let extent = info.extent();
            let (px, py) = info.pixel_size();
            println!("File: {}", input.display());
            println!(
                "Dimensions: {} x {} ({} cells)",
                grid.width(),
                grid.height(),
                grid.len()
            );
            println!("Pixel size: {} x {}", px, py);
            println!(
                "Extent: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                extent.xmin, extent.ymin, extent.xmax, extent.ymax
            );
            if !info.projection().is_empty() {
                println!("Projection: {}", info.projection());
            }
            println!("\nStatistics:");
            println!("  Min: {}", fmt_opt(stats.min));
            println!("  Max: {}", fmt_opt(stats.max));
            println!("  Average: {}", fmt_opt(stats.average));
            println!("  Range: {}", fmt_opt(stats.range));
            println!("  Stdev: {}", fmt_opt(stats.stdev));
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / grid.len() as f64
            );
        }

        // ── Focal ────────────────────────────────────────────────────
        Commands::Focal {
            input,
            output,
            stat,
            radius,
            circle,
            float,
        } => {
            let statistic = parse_focal_stat(&stat)?;
            let grid = read_grid(&input)?;
            let params = FocalParams {
                radius,
                circular: circle,
                statistic,
                mode,
            };

            let start = Instant::now();
            let pb = spinner("Computing focal statistic...");
            let result = focal_statistics(&grid, &params).context("Focal statistic failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            write_result(&result, &output, float)?;
            done(&format!("Focal {:?}", statistic), &output, elapsed);
        }

        // ── Calc ─────────────────────────────────────────────────────
        Commands::Calc {
            op,
            a,
            b,
            output,
            float,
        } => {
            let op = parse_local_op(&op)?;
            let a = load(parse_arg(&a))?;
            let b = load(parse_arg(&b))?;

            let start = Instant::now();
            let pb = spinner("Computing...");
            let result = mode
                .install(|| binary(op, a.operand(), b.operand()))?
                .with_context(|| format!("Operator {} failed", op))?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            write_result(&result, &output, float)?;
            done(&format!("Result of {}", op), &output, elapsed);
        }

        // ── Con ──────────────────────────────────────────────────────
        Commands::Con {
            predicate,
            when_true,
            when_false,
            output,
            float,
        } => {
            let predicate = read_grid(&predicate)?;
            let when_true = load(parse_arg(&when_true))?;
            let when_false = load(parse_arg(&when_false))?;

            let start = Instant::now();
            let pb = spinner("Computing...");
            let result = mode
                .install(|| con(&predicate, when_true.operand(), when_false.operand()))?
                .context("Conditional failed")?;
            pb.finish_and_clear();
            let elapsed = start.elapsed();

            write_result(&result, &output, float)?;
            done("Conditional", &output, elapsed);
        }
    }

    Ok(())
}
