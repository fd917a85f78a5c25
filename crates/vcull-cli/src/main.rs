//! vcull CLI - hidden geometry removal for closed meshes
//!
//! Loads an OBJ or STL mesh, casts rays from a sphere of viewpoints and
//! deletes (or selects) the faces no viewpoint can see.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use vcull_math::{BoundingSphere, Point3};
use vcull_mesh::{load_mesh, obj, save_mesh, MeshAccess, PolyMesh};
use vcull_visibility::{
    remove_hidden_geometry, Precision, RemovalMode, RemovalReport, RemovalSettings,
};

#[derive(Parser)]
#[command(name = "vcull")]
#[command(about = "Remove geometry that cannot be seen from outside a mesh", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete hidden faces and write the cleaned mesh
    Remove {
        /// Input mesh (.obj or .stl)
        input: PathBuf,
        /// Output mesh (format determined by extension: .obj, .stl)
        output: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Select visible faces and write their indices as JSON
    Select {
        /// Input mesh (.obj or .stl)
        input: PathBuf,
        /// Where to write the selected face indices (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Display information about a mesh
    Info {
        /// Path to the mesh
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PrecisionArg {
    High,
    Low,
}

impl From<PrecisionArg> for Precision {
    fn from(p: PrecisionArg) -> Self {
        match p {
            PrecisionArg::High => Precision::High,
            PrecisionArg::Low => Precision::Low,
        }
    }
}

#[derive(Args)]
struct RunArgs {
    /// JSON settings file; flags below override its values
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Latitude bands of viewpoints (2-12)
    #[arg(long)]
    rows: Option<u32>,
    /// Viewpoints per band (even, 2-12)
    #[arg(long)]
    cameras: Option<u32>,
    /// Camera sphere radius as a multiple of the bounding sphere
    #[arg(long)]
    distance: Option<f64>,
    /// Sample points per face
    #[arg(long, value_enum)]
    precision: Option<PrecisionArg>,
    /// Only ray-test a random subset of faces
    #[arg(long)]
    experimental: bool,
    /// Percentage of faces sampled in experimental mode (1-100)
    #[arg(long)]
    sampling_ratio: Option<f64>,
    /// Flatness angle in degrees for experimental grouping (10-90)
    #[arg(long)]
    flatness: Option<f64>,
    /// Random seed for experimental sampling
    #[arg(long)]
    seed: Option<u64>,
    /// Camera field of view in degrees
    #[arg(long)]
    fov: Option<f64>,
    /// Classify faces on a single thread
    #[arg(long)]
    sequential: bool,
    /// Write viewpoint positions as an OBJ point cloud
    #[arg(long)]
    cameras_out: Option<PathBuf>,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    fn settings(&self, mode: RemovalMode) -> Result<RemovalSettings> {
        let mut settings = match &self.settings {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading settings {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("parsing settings {}", path.display()))?
            }
            None => RemovalSettings::default(),
        };

        settings.mode = mode;
        if let Some(rows) = self.rows {
            settings.rows = rows;
        }
        if let Some(cameras) = self.cameras {
            settings.cameras_per_row = cameras;
        }
        if let Some(distance) = self.distance {
            settings.camera_distance_factor = distance;
        }
        if let Some(precision) = self.precision {
            settings.precision = precision.into();
        }
        if self.experimental {
            settings.experimental = true;
        }
        if let Some(ratio) = self.sampling_ratio {
            settings.face_sampling_ratio = ratio;
        }
        if let Some(angle) = self.flatness {
            settings.flatness_angle = angle;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if self.fov.is_some() {
            settings.field_of_view = self.fov;
        }
        if self.sequential {
            settings.parallel = false;
        }
        if self.cameras_out.is_some() {
            settings.keep_cameras = true;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn write_outputs(&self, report: &RemovalReport) -> Result<()> {
        if let Some(path) = &self.report {
            write_json(path, report)?;
        }
        if let Some(path) = &self.cameras_out {
            let points: Vec<Point3> = report
                .cameras
                .iter()
                .map(|c| Point3::new(c.position[0], c.position[1], c.position[2]))
                .collect();
            let mut writer = BufWriter::new(File::create(path)?);
            obj::write_obj_points(&points, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote {} camera markers to {}", points.len(), path.display());
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Remove { input, output, run } => {
            remove(&input, &output, &run)?;
        }
        Commands::Select { input, out, run } => {
            select(&input, out.as_deref(), &run)?;
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn remove(input: &Path, output: &Path, run: &RunArgs) -> Result<()> {
    check_output_format(output)?;
    let settings = run.settings(RemovalMode::Delete)?;
    let mut mesh = load_mesh(input).with_context(|| format!("loading {}", input.display()))?;
    debug!(?settings, "running hidden geometry removal");

    let report = remove_hidden_geometry(&mut mesh, &settings)?;
    save_mesh(&mesh, output).with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Processed geometry using {} cameras: removed {} of {} faces ({} vertices)",
        report.viewpoint_count, report.faces_removed, report.faces_total, report.vertices_removed
    );
    if report.unknown > 0 {
        println!("  {} faces could not be classified and were kept", report.unknown);
    }
    println!("Wrote {}", output.display());
    run.write_outputs(&report)
}

fn select(input: &Path, out: Option<&Path>, run: &RunArgs) -> Result<()> {
    let settings = run.settings(RemovalMode::Select)?;
    let mut mesh = load_mesh(input).with_context(|| format!("loading {}", input.display()))?;

    let report = remove_hidden_geometry(&mut mesh, &settings)?;
    match out {
        Some(path) => {
            write_json(path, &report.selected_faces)?;
            eprintln!(
                "Selected {} of {} faces using {} cameras",
                report.selected_faces.len(),
                report.faces_total,
                report.viewpoint_count
            );
        }
        None => println!("{}", serde_json::to_string(&report.selected_faces)?),
    }
    run.write_outputs(&report)
}

fn show_info(file: &Path) -> Result<()> {
    let mesh: PolyMesh = load_mesh(file).with_context(|| format!("loading {}", file.display()))?;

    println!("mesh: {}", file.display());
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Faces: {}", mesh.face_count());
    println!("  Edges: {}", mesh.edges().len());

    let degenerate = mesh.degenerate_faces();
    if !degenerate.is_empty() {
        println!("  Degenerate faces: {}", degenerate.len());
    }

    if let Some(sphere) = BoundingSphere::from_aabb(&mesh.bounds()) {
        let c = sphere.center;
        println!(
            "\nBounding sphere:\n  Center: ({:.4}, {:.4}, {:.4})\n  Radius: {:.4}",
            c.x, c.y, c.z, sphere.radius
        );
    }

    Ok(())
}

/// Reject output paths `save_mesh` cannot write, before any rays are cast.
fn check_output_format(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("obj" | "stl") => Ok(()),
        _ => bail!(
            "unsupported output format for {} (use .obj or .stl)",
            path.display()
        ),
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> RunArgs {
        let argv = ["vcull", "remove", "in.obj", "out.obj"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Remove { run, .. } => run,
            _ => panic!("expected remove"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let run = run_args(&[
            "--rows", "6", "--cameras", "10", "--precision", "low", "--sequential",
        ]);
        let settings = run.settings(RemovalMode::Delete).unwrap();
        assert_eq!(settings.rows, 6);
        assert_eq!(settings.cameras_per_row, 10);
        assert_eq!(settings.precision, Precision::Low);
        assert!(!settings.parallel);
        assert!(!settings.keep_cameras);
    }

    #[test]
    fn test_odd_cameras_rejected() {
        let run = run_args(&["--cameras", "5"]);
        assert!(run.settings(RemovalMode::Delete).is_err());
    }

    #[test]
    fn test_output_format_checked_up_front() {
        assert!(check_output_format(Path::new("clean.obj")).is_ok());
        assert!(check_output_format(Path::new("CLEAN.STL")).is_ok());
        let err = check_output_format(Path::new("clean.ply")).unwrap_err();
        assert!(err.to_string().contains("clean.ply"));
        assert!(check_output_format(Path::new("clean")).is_err());
    }

    #[test]
    fn test_cameras_out_keeps_cameras() {
        let run = run_args(&["--cameras-out", "cams.obj"]);
        let settings = run.settings(RemovalMode::Select).unwrap();
        assert!(settings.keep_cameras);
        assert_eq!(settings.mode, RemovalMode::Select);
    }
}
