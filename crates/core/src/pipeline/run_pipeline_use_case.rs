use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dataset::domain::image_importer::ImageImporter;
use crate::dataset::negative_pool::NegativePool;
use crate::dataset::training_set_loader::TrainingSetLoader;
use crate::detection::domain::detector::{DetectorBackend, TrainingOptions};
use crate::detection::infrastructure::model_cache::ModelCache;
use crate::pipeline::clip_outcome::ClipOutcome;
use crate::pipeline::frame_predictor::FramePredictor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::process_clip_use_case::ProcessClipUseCase;
use crate::shared::constants::{IMAGE_EXTENSIONS, NEGATIVE_POOL_MAX};
use crate::shared::run_paths::RunPaths;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no clips found under {0}")]
    NoClips(PathBuf),
    #[error("the path {0} seems to be empty, so cannot find images or their extension")]
    EmptyClipDir(PathBuf),
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub clips_processed: usize,
    pub clips_skipped: usize,
    pub frames_seen: usize,
    pub frames_detected: usize,
}

/// Whole-run orchestration: probes the common image extension, loads the
/// negative pool once, and drives every clip in sorted order.
///
/// A skipped clip never aborts the run; failures from the detector backend
/// or the filesystem during prediction do.
pub struct RunPipelineUseCase {
    backend: Box<dyn DetectorBackend>,
    loader: TrainingSetLoader,
    predictor: FramePredictor,
    cache: ModelCache,
    options: TrainingOptions,
    pool_importer: Box<dyn ImageImporter>,
    negatives_dir: PathBuf,
}

impl RunPipelineUseCase {
    pub fn new(
        backend: Box<dyn DetectorBackend>,
        loader: TrainingSetLoader,
        predictor: FramePredictor,
        cache: ModelCache,
        options: TrainingOptions,
        pool_importer: Box<dyn ImageImporter>,
        negatives_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            loader,
            predictor,
            cache,
            options,
            pool_importer,
            negatives_dir,
        }
    }

    pub fn execute(
        &self,
        paths: &RunPaths,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        logger.info("training person-specific detection models");

        let frames_root = paths.frames_root();
        let clips = list_clips(&frames_root)?;
        if clips.is_empty() {
            return Err(Box::new(PipelineError::NoClips(frames_root)));
        }

        // One extension for the whole run, probed from the first clip; clips
        // with a different extension must be run separately.
        let image_ext = probe_image_extension(&frames_root, &clips[0])?;
        logger.info(&format!("detected image extension: .{image_ext}"));

        let negatives = NegativePool::load(
            &self.negatives_dir,
            NEGATIVE_POOL_MAX,
            self.pool_importer.as_ref(),
            logger,
        )?;
        logger.info(&format!("loaded {} negative images", negatives.len()));

        let mut summary = RunSummary::default();
        for clip in &clips {
            logger.info(clip);
            let use_case = ProcessClipUseCase::new(
                paths,
                self.backend.as_ref(),
                &self.loader,
                &self.predictor,
                &self.cache,
                negatives.images(),
                &image_ext,
                self.options,
            );
            match use_case.execute(clip, logger)? {
                ClipOutcome::Processed {
                    frames_seen,
                    frames_detected,
                    ..
                } => {
                    summary.clips_processed += 1;
                    summary.frames_seen += frames_seen;
                    summary.frames_detected += frames_detected;
                }
                ClipOutcome::Skipped(_) => summary.clips_skipped += 1,
            }
        }

        logger.info(&format!(
            "run complete: {} clips processed, {} skipped, detections in {}/{} frames",
            summary.clips_processed,
            summary.clips_skipped,
            summary.frames_detected,
            summary.frames_seen
        ));
        Ok(summary)
    }
}

/// Clip directory names under the frames root, lexically sorted.
fn list_clips(frames_root: &Path) -> Result<Vec<String>, PipelineError> {
    let entries = fs::read_dir(frames_root).map_err(|source| PipelineError::ReadDir {
        path: frames_root.to_path_buf(),
        source,
    })?;
    let mut clips: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    clips.sort();
    Ok(clips)
}

/// Extension of the images in the first clip. An empty first clip is fatal
/// since the probed extension applies to the whole run.
fn probe_image_extension(frames_root: &Path, first_clip: &str) -> Result<String, PipelineError> {
    let dir = frames_root.join(first_clip);
    let entries = fs::read_dir(&dir).map_err(|source| PipelineError::ReadDir {
        path: dir.clone(),
        source,
    })?;
    let mut names: Vec<PathBuf> = entries.filter_map(|entry| entry.ok().map(|e| e.path())).collect();
    names.sort();

    names
        .iter()
        .filter_map(|path| path.extension().and_then(|ext| ext.to_str()))
        .map(|ext| ext.to_ascii_lowercase())
        .find(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
        .ok_or(PipelineError::EmptyClipDir(dir))
}
