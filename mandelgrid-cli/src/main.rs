mod config;
mod error;
mod export;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use mandelgrid_core::{classify, Complex};
use mandelgrid_render::{JobObserver, JobState, OrbitTracer, RenderJob, Rgb};

use config::ProjectConfig;
use error::{CliError, Result};
use export::{export_png, ExportMetadata};

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;
/// Fill for the letterbox margins around the rendered area.
const BACKGROUND: Rgb = Rgb::BLACK;

#[derive(Debug, Parser)]
#[command(name = "mandelgrid", version, about = "Render the Mandelbrot set from project files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a project file to a PNG image
    Render {
        project: PathBuf,
        output: PathBuf,
        /// Print build statistics
        #[arg(short, long)]
        verbose: bool,
        /// Number of row bands evaluated in parallel
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Write a project file with default settings
    Init {
        project: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Report whether a point belongs to the set
    #[command(allow_negative_numbers = true)]
    Point {
        re: f64,
        im: f64,
        #[arg(short = 'n', long, default_value_t = 100)]
        max_iterations: u32,
    },
    /// Print the orbit of a point
    #[command(allow_negative_numbers = true)]
    Orbit {
        re: f64,
        im: f64,
        #[arg(short = 'n', long, default_value_t = 50)]
        max_iterations: u32,
    },
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

struct ProgressBar;

impl JobObserver for ProgressBar {
    fn on_progress(&self, percent: u8) {
        eprint!("\r{}", progress_line(percent));
    }

    fn on_complete(&self) {
        eprintln!();
    }

    fn on_aborted(&self) {
        eprintln!(" aborted");
    }
}

fn progress_line(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        percent
    )
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn render(project: &Path, output: &Path, verbose: bool, threads: Option<usize>) -> Result<()> {
    let config = ProjectConfig::load(project)?.to_render_config()?;
    let metadata = ExportMetadata::from_config(&config);

    let mut job = RenderJob::new(config)?;
    if let Some(threads) = threads {
        job = job.with_worker_count(threads);
    }
    job.start(Arc::new(ProgressBar))?;
    job.wait();

    if job.state() != JobState::Built {
        return Err(CliError::Incomplete("render"));
    }
    let image = job.image(BACKGROUND).ok_or(CliError::Incomplete("render"))?;
    export_png(&image, output, &metadata)?;
    info!("Wrote {}", output.display());

    if verbose {
        if let (Some(grid), Some(elapsed)) = (job.grid(), job.elapsed()) {
            let stats = grid.stats();
            let pixels = grid.data().len().max(1);
            println!("area:             {}x{}", grid.width, grid.height);
            println!("total iterations: {}", stats.total_iterations);
            println!("mean iterations:  {:.2}", stats.mean_iterations);
            println!(
                "inside:           {:.2}%",
                stats.inside_pixels as f64 * 100.0 / pixels as f64
            );
            println!("build time:       {:.3}s", elapsed.as_secs_f64());
        }
    }
    Ok(())
}

fn init(project: &Path, force: bool) -> Result<()> {
    if project.exists() && !force {
        return Err(CliError::AlreadyExists(project.to_path_buf()));
    }
    ProjectConfig::default().save(project)?;
    info!("Wrote default project to {}", project.display());
    Ok(())
}

fn point(c: Complex, max_iterations: u32) {
    println!("c = {c}: {}", classify(c, max_iterations));
}

fn orbit(c: Complex, max_iterations: u32) -> Result<()> {
    let tracer = OrbitTracer::new();
    let (tx, rx) = mpsc::channel();
    tracer.request(c, max_iterations, move |points| {
        let _ = tx.send(points);
    })?;
    // The sender is dropped without sending if the trace fails.
    let points = rx.recv().map_err(|_| CliError::Incomplete("orbit trace"))?;
    for (k, z) in points.iter().enumerate() {
        println!("{k:>6}  {:>24}  {:>24}", z.re, z.im);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render {
            project,
            output,
            verbose,
            threads,
        } => render(&project, &output, verbose, threads),
        Command::Init { project, force } => init(&project, force),
        Command::Point {
            re,
            im,
            max_iterations,
        } => {
            point(Complex::new(re, im), max_iterations);
            Ok(())
        }
        Command::Orbit {
            re,
            im,
            max_iterations,
        } => orbit(Complex::new(re, im), max_iterations),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_render_arguments() {
        let cli = Cli::try_parse_from([
            "mandelgrid",
            "render",
            "view.json",
            "out.png",
            "-v",
            "--threads",
            "4",
        ])
        .unwrap();
        match cli.command {
            Command::Render {
                project,
                output,
                verbose,
                threads,
            } => {
                assert_eq!(project, PathBuf::from("view.json"));
                assert_eq!(output, PathBuf::from("out.png"));
                assert!(verbose);
                assert_eq!(threads, Some(4));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn point_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["mandelgrid", "point", "-0.75", "-0.1", "-n", "500"]).unwrap();
        match cli.command {
            Command::Point {
                re,
                im,
                max_iterations,
            } => {
                assert_eq!((re, im), (-0.75, -0.1));
                assert_eq!(max_iterations, 500);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn progress_line_has_fixed_width() {
        assert_eq!(progress_line(0), format!("[{}]   0%", " ".repeat(BAR_WIDTH)));
        assert_eq!(progress_line(100), format!("[{}] 100%", "#".repeat(BAR_WIDTH)));
        assert_eq!(progress_line(50).len(), BAR_WIDTH + 7);
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = std::env::temp_dir().join("mandelgrid_test_init");
        let path = dir.join("project.json");
        let _ = std::fs::remove_dir_all(&dir);
        init(&path, false).unwrap();
        assert!(matches!(init(&path, false), Err(CliError::AlreadyExists(_))));
        init(&path, true).unwrap();
        assert_eq!(ProjectConfig::load(&path).unwrap(), ProjectConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn render_writes_png() {
        let dir = std::env::temp_dir().join("mandelgrid_test_render");
        let _ = std::fs::remove_dir_all(&dir);
        let project = dir.join("project.json");
        let output = dir.join("out.png");
        ProjectConfig {
            width: 64,
            height: 48,
            max_iterations: 30,
            ..ProjectConfig::default()
        }
        .save(&project)
        .unwrap();

        render(&project, &output, false, Some(3)).unwrap();
        let decoder = png::Decoder::new(std::fs::File::open(&output).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (64, 48));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
