// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use nalgebra::{Matrix4, Vector3};
use polyframe_csg::{
    analyze, io, BooleanOp, CsgConfig, CsgModeller, GeometryStats, Mesh, Primitive,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyframe-csg")]
#[command(about = "Polyframe CSG - boolean operations on closed triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./csg.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine two STL solids
    Run {
        /// First operand
        a: PathBuf,

        /// Second operand
        b: PathBuf,

        /// Operation: union, intersection, difference, reverse-difference
        #[arg(short = 'p', long, default_value = "union")]
        op: BooleanOp,

        /// Translate the second operand before combining
        #[arg(short, long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
        translate: Option<Vec<f64>>,

        /// Output STL file
        #[arg(short, long)]
        output: PathBuf,

        /// Print statistics of the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Combine a cube and a sphere, all four operations
    Demo {
        /// Directory to write the results to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run {
            a,
            b,
            op,
            translate,
            output,
            json,
        } => {
            let offset = match translate.as_deref() {
                Some([x, y, z]) => Vector3::new(*x, *y, *z),
                _ => Vector3::zeros(),
            };
            run_command(a, b, *op, offset, output, *json, &config, cli.verbose)?;
        }
        Commands::Demo { out } => demo_command(out.as_deref(), &config)?,
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Version => println!("Polyframe CSG v{}", env!("CARGO_PKG_VERSION")),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("polyframe_csg=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CsgConfig> {
    let config = match path {
        Some(path) => {
            let mut config = CsgConfig::from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides()?;
            config
        }
        None => CsgConfig::load().context("Failed to load configuration")?,
    };
    config.validate()?;
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
fn run_command(
    a: &Path,
    b: &Path,
    op: BooleanOp,
    offset: Vector3<f64>,
    output: &Path,
    json: bool,
    config: &CsgConfig,
    verbose: bool,
) -> Result<()> {
    let mesh_a =
        io::read_stl(a).with_context(|| format!("Failed to read STL file: {}", a.display()))?;
    let mesh_b =
        io::read_stl(b).with_context(|| format!("Failed to read STL file: {}", b.display()))?;

    for (path, mesh) in [(a, &mesh_a), (b, &mesh_b)] {
        if !mesh.is_closed() {
            eprintln!(
                "{} {} is not a closed solid, results may be wrong",
                "Warning:".yellow().bold(),
                path.display()
            );
        }
    }

    let start = Instant::now();
    let result = CsgModeller::new(
        &mesh_a,
        &Matrix4::identity(),
        &mesh_b,
        &Matrix4::new_translation(&offset),
        config,
    )
    .result(op);
    let elapsed = start.elapsed();

    io::write_stl(&result, output)
        .with_context(|| format!("Failed to write STL file: {}", output.display()))?;

    let stats = analyze(&result);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "{} {} {} {} -> {} in {:.2?}",
            "✔".green(),
            op.to_string().bold(),
            a.display(),
            b.display(),
            output.display().to_string().cyan(),
            elapsed
        );
        if verbose {
            print_stats(&stats);
        }
    }
    Ok(())
}

fn demo_command(out: Option<&Path>, config: &CsgConfig) -> Result<()> {
    let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let sphere = Primitive::sphere(1.3, 32).to_mesh();

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let start = Instant::now();
    let identity = Matrix4::identity();
    let modeller = CsgModeller::new(&cube, &identity, &sphere, &identity, config);
    println!(
        "{} operands prepared in {:.2?}",
        "cube ∘ sphere".bold(),
        start.elapsed()
    );

    for op in BooleanOp::ALL {
        let result: Mesh = modeller.result(op);
        let stats = analyze(&result);
        println!(
            "  {:<20} {:>6} triangles  volume {:>10.5}  {}",
            op.to_string().cyan(),
            stats.triangle_count,
            stats.volume,
            if stats.is_watertight {
                "watertight".green()
            } else {
                "open".red()
            }
        );

        if let Some(dir) = out {
            let path = dir.join(format!("{op}.stl"));
            io::write_stl(&result, &path)
                .with_context(|| format!("Failed to write STL file: {}", path.display()))?;
        }
    }
    Ok(())
}

fn print_stats(stats: &GeometryStats) {
    println!("{}", "─".repeat(60).bright_black());
    for line in stats.to_string().lines() {
        println!("  {line}");
    }
    println!("{}", "─".repeat(60).bright_black());
}
