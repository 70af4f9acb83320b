use std::path::PathBuf;
use std::process;

use clap::Parser;

use clipmark_core::annotation::infrastructure::pts_store::PtsAnnotationStore;
use clipmark_core::dataset::infrastructure::file_image_importer::FileImageImporter;
use clipmark_core::dataset::training_set_loader::TrainingSetLoader;
use clipmark_core::detection::domain::detector::TrainingOptions;
use clipmark_core::detection::infrastructure::correlation_detector::CorrelationBackend;
use clipmark_core::detection::infrastructure::model_cache::ModelCache;
use clipmark_core::landmarks::infrastructure::ert_predictor::ErtShapePredictor;
use clipmark_core::pipeline::frame_predictor::FramePredictor;
use clipmark_core::pipeline::pipeline_logger::TeePipelineLogger;
use clipmark_core::pipeline::run_pipeline_use_case::RunPipelineUseCase;
use clipmark_core::shared::constants::MAX_TRAINING_IMAGES;
use clipmark_core::shared::run_paths::{FolderLayout, RunPaths};

/// Train a per-clip detector from annotated frames and localize facial
/// landmarks across every frame of every clip under the root folder.
#[derive(Parser)]
#[command(name = "clipmark")]
struct Cli {
    /// Root folder containing frames/<clip>/ directories.
    root: PathBuf,

    /// Folder-name overrides: <in_bbox> <out_bbox> <out_models>
    /// <out_landmarks>. Give all four or none.
    #[arg(num_args = 0..=4)]
    folders: Vec<String>,

    /// Directory of generic non-target images used as negative examples.
    #[arg(long)]
    negatives: PathBuf,

    /// Trained landmark predictor model file.
    #[arg(long)]
    shape_model: PathBuf,

    /// Retrain clips even when a cached model exists.
    #[arg(long)]
    overwrite: bool,

    /// Maximum positive training images sampled per clip.
    #[arg(long, default_value_t = MAX_TRAINING_IMAGES)]
    max_train: usize,

    /// Seed for training-set sampling; omit for a fresh sample each run.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let paths = RunPaths::resolve(&cli.root, folder_layout(&cli.folders))?;
    let mut logger = TeePipelineLogger::with_file(&paths.log_file_path())?;

    let landmarker = ErtShapePredictor::load(&cli.shape_model)?;
    log::info!(
        "loaded landmark model with {} points, {} cascade stages",
        landmarker.num_landmarks(),
        landmarker.num_cascade_stages()
    );

    let use_case = RunPipelineUseCase::new(
        Box::new(CorrelationBackend::new()),
        TrainingSetLoader::new(
            Box::new(FileImageImporter),
            Box::new(PtsAnnotationStore),
            cli.max_train,
            cli.seed,
        ),
        FramePredictor::new(
            Box::new(FileImageImporter),
            Box::new(PtsAnnotationStore),
            Box::new(landmarker),
        ),
        ModelCache::new(cli.overwrite),
        TrainingOptions::default(),
        Box::new(FileImageImporter),
        cli.negatives.clone(),
    );

    let summary = use_case.execute(&paths, &mut logger)?;
    log::info!(
        "{} clips processed, {} skipped",
        summary.clips_processed,
        summary.clips_skipped
    );
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.root.is_dir() {
        return Err(format!("Root folder not found: {}", cli.root.display()).into());
    }
    if !cli.folders.is_empty() && cli.folders.len() != 4 {
        return Err(
            "Folder overrides must be given together: <in_bbox> <out_bbox> <out_models> <out_landmarks>"
                .into(),
        );
    }
    if !cli.negatives.is_dir() {
        return Err(format!(
            "Negative image directory not found: {}",
            cli.negatives.display()
        )
        .into());
    }
    if !cli.shape_model.is_file() {
        return Err(format!(
            "Landmark model file not found: {}",
            cli.shape_model.display()
        )
        .into());
    }
    Ok(())
}

fn folder_layout(folders: &[String]) -> Option<FolderLayout> {
    if folders.len() == 4 {
        Some(FolderLayout {
            in_bbox: folders[0].clone(),
            out_bbox: folders[1].clone(),
            out_models: folders[2].clone(),
            out_landmarks: folders[3].clone(),
        })
    } else {
        None
    }
}
