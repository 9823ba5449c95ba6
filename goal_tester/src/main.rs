use anyhow::{Context, Result};
use clap::Parser;
use goal_vision::core_modules::geometry;
use goal_vision::core_modules::utils::image_helper;
use goal_vision::{Frame, GoalPipeline, ParallelPipeline, PipelineConfig, ReferenceShapeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "goal_tester")]
#[command(about = "Find the retro-reflective goal in still images and print the angles to it")]
#[command(version)]
struct Args {
    /// Reference goal outlines (JSON array of point sequences).
    #[arg(long, short)]
    references: PathBuf,

    /// Pipeline configuration (TOML). Defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory to write per-stage debug renders into.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Process all images concurrently on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker count for --parallel. Defaults to the number of CPUs.
    #[arg(long)]
    workers: Option<usize>,

    /// Images to process.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?;
    Ok(image.to_rgb8())
}

fn report(path: &Path, result: &goal_vision::Result<goal_vision::AngleResult>) {
    match result {
        Ok(angles) => println!(
            "{}: horizontal {:.2} deg, vertical {:.2} deg",
            path.display(),
            angles.horizontal_degrees,
            angles.vertical_degrees
        ),
        Err(error) if error.is_goal_not_found() => println!("{}: goal not found", path.display()),
        Err(error) => println!("{}: {error}", path.display()),
    }
}

fn run_sequential(pipeline: &GoalPipeline, args: &Args) -> Result<()> {
    for path in &args.inputs {
        let frame = load_frame(path)?;
        let analysis = pipeline.analyze(&frame);
        report(path, &analysis.result);

        if let Some(dir) = &args.debug_dir {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
            analysis
                .save_debug_renders(&frame, dir, stem)
                .with_context(|| format!("failed to write debug renders for {}", path.display()))?;

            if let Some(corners) = &analysis.corners {
                match geometry::rectify(&frame, corners, &pipeline.config().rectify) {
                    Ok(view) => {
                        let target = dir.join(format!("{stem}_rectified.png"));
                        image_helper::save_frame(target, &view)?
                    }
                    Err(error) => log::warn!("{}: no rectified view: {error}", path.display()),
                }
            }
        }
    }
    Ok(())
}

async fn run_parallel(pipeline: GoalPipeline, args: &Args) -> Result<()> {
    let parallel = match args.workers {
        Some(count) => ParallelPipeline::with_workers(pipeline, count),
        None => ParallelPipeline::new(pipeline),
    };

    let frames = args
        .inputs
        .iter()
        .map(|path| load_frame(path))
        .collect::<Result<Vec<_>>>()?;

    let outcomes = parallel.process_batch(&frames).await;
    for (path, outcome) in args.inputs.iter().zip(outcomes) {
        let outcome = outcome.context("frame worker pool stopped")?;
        log::debug!("{} processed in {:?}", path.display(), outcome.latency);
        report(path, &outcome.result);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing & Setup ---
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    // --- 2. Reference Shapes ---
    let references = ReferenceShapeSet::load(&args.references)
        .with_context(|| format!("failed to load reference shapes {}", args.references.display()))?;

    // --- 3. Vision Pipeline Initialization ---
    let pipeline = GoalPipeline::new(config, Arc::new(references))?;

    // --- 4. Main Processing Loop ---
    if args.parallel {
        if args.debug_dir.is_some() {
            log::warn!("--debug-dir is ignored in --parallel mode");
        }
        run_parallel(pipeline, &args).await
    } else {
        run_sequential(&pipeline, &args)
    }
}
