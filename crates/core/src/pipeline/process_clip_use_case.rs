use std::fs;
use std::path::Path;

use crate::dataset::training_set_loader::TrainingSetLoader;
use crate::detection::domain::detector::{DetectorBackend, TrainingOptions};
use crate::detection::infrastructure::model_cache::{ModelCache, TrainError};
use crate::pipeline::clip_outcome::{ClipOutcome, SkipReason};
use crate::pipeline::frame_predictor::{FrameOutcome, FramePredictor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::grey_image::GreyImage;
use crate::shared::run_paths::RunPaths;

/// Per-clip pipeline: input checks, model training or cache load, then
/// sequential prediction over every frame.
pub struct ProcessClipUseCase<'a> {
    paths: &'a RunPaths,
    backend: &'a dyn DetectorBackend,
    loader: &'a TrainingSetLoader,
    predictor: &'a FramePredictor,
    cache: &'a ModelCache,
    negatives: &'a [GreyImage],
    image_ext: &'a str,
    options: TrainingOptions,
}

impl<'a> ProcessClipUseCase<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        paths: &'a RunPaths,
        backend: &'a dyn DetectorBackend,
        loader: &'a TrainingSetLoader,
        predictor: &'a FramePredictor,
        cache: &'a ModelCache,
        negatives: &'a [GreyImage],
        image_ext: &'a str,
        options: TrainingOptions,
    ) -> Self {
        Self {
            paths,
            backend,
            loader,
            predictor,
            cache,
            negatives,
            image_ext,
            options,
        }
    }

    /// Skippable conditions come back as [`ClipOutcome::Skipped`]; backend
    /// and I/O failures during prediction propagate and abort the run.
    pub fn execute(
        &self,
        clip: &str,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ClipOutcome, Box<dyn std::error::Error>> {
        let frames_dir = self.paths.clip_frames_dir(clip);
        if !frames_dir.is_dir() {
            logger.warn(&format!(
                "skipped clip {clip} because {} is not a valid path",
                frames_dir.display()
            ));
            return Ok(ClipOutcome::Skipped(SkipReason::MissingFrames));
        }
        let in_bbox_dir = self.paths.clip_in_bbox_dir(clip);
        if !in_bbox_dir.is_dir() {
            logger.warn(&format!(
                "skipped clip {clip} because it does not have previous bounding boxes"
            ));
            return Ok(ClipOutcome::Skipped(SkipReason::MissingAnnotations));
        }

        let frame_names = list_frames(&frames_dir, self.image_ext)?;
        let in_bbox_root = self.paths.in_bbox_root();
        let mut load_positives = |logger: &mut dyn PipelineLogger| {
            self.loader
                .load(&frame_names, &frames_dir, &in_bbox_root, clip, logger)
        };

        let cache_path = self.paths.model_path(clip);
        let (detector, cache_hit) = match self.cache.train_or_load(
            self.backend,
            clip,
            &mut load_positives,
            self.negatives,
            &self.options,
            &cache_path,
            logger,
        ) {
            Ok(result) => result,
            Err(TrainError::NoTrainingData(_)) => {
                logger.warn(&format!("no positives found for the clip {clip}, skipping it"));
                return Ok(ClipOutcome::Skipped(SkipReason::NoTrainingData));
            }
            Err(e) => return Err(Box::new(e)),
        };

        let out_bbox_dir = self.paths.out_bbox_dir(clip)?;
        let out_landmark_dir = self.paths.out_landmark_dir(clip)?;

        let total = frame_names.len();
        let mut frames_detected = 0usize;
        for (index, name) in frame_names.iter().enumerate() {
            logger.progress(clip, index + 1, total);
            let outcome = self.predictor.predict(
                &frames_dir.join(name),
                detector.as_ref(),
                &out_bbox_dir,
                &out_landmark_dir,
            )?;
            if matches!(outcome, FrameOutcome::Written { .. }) {
                frames_detected += 1;
            }
        }

        Ok(ClipOutcome::Processed {
            frames_seen: total,
            frames_detected,
            cache_hit,
        })
    }
}

/// File names in `dir` with the given extension, lexically sorted.
fn list_frames(dir: &Path, extension: &str) -> Result<Vec<String>, std::io::Error> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    names.sort();
    Ok(names)
}
