use std::path::Path;

use thiserror::Error;

use crate::dataset::domain::training_image::TrainingImage;
use crate::detection::domain::detector::{ClipDetector, DetectorBackend, TrainingOptions};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::grey_image::GreyImage;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("no positive training images for clip {0}")]
    NoTrainingData(String),
    #[error("detector backend error: {0}")]
    Backend(Box<dyn std::error::Error>),
    #[error("failed to persist model: {0}")]
    Persist(Box<dyn std::error::Error>),
}

/// Train-or-load policy around a [`DetectorBackend`] and a per-clip cache
/// file. Training is the most expensive step of the whole pipeline, so a
/// cached model is never retrained unless overwrite is requested.
pub struct ModelCache {
    overwrite: bool,
}

impl ModelCache {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Returns the detector and whether it came from the cache.
    ///
    /// Positives are produced lazily: on a cache hit the loader callback is
    /// never invoked, so a cached clip costs no image loading at all.
    #[allow(clippy::too_many_arguments)]
    pub fn train_or_load(
        &self,
        backend: &dyn DetectorBackend,
        clip: &str,
        load_positives: &mut dyn FnMut(&mut dyn PipelineLogger) -> Vec<TrainingImage>,
        negatives: &[GreyImage],
        options: &TrainingOptions,
        cache_path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(Box<dyn ClipDetector>, bool), TrainError> {
        if cache_path.exists() && !self.overwrite {
            logger.info(&format!(
                "the model {} already exists and was loaded from disk",
                cache_path.display()
            ));
            let detector = backend.load(cache_path).map_err(TrainError::Backend)?;
            return Ok((detector, true));
        }

        let positives = load_positives(logger);
        if positives.is_empty() {
            return Err(TrainError::NoTrainingData(clip.to_string()));
        }
        let detector = backend
            .train(&positives, negatives, options)
            .map_err(TrainError::Backend)?;
        detector.save(cache_path).map_err(TrainError::Persist)?;
        Ok((detector, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::region::Region;
    use crate::detection::domain::detector::Detection;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // --- Stubs ---

    #[derive(Default)]
    struct Calls {
        train: usize,
        load: usize,
        save: usize,
    }

    struct StubDetector {
        calls: Arc<Mutex<Calls>>,
    }

    impl ClipDetector for StubDetector {
        fn detect(
            &self,
            _image: &GreyImage,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(vec![])
        }

        fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().save += 1;
            fs::write(path, b"stub model")?;
            Ok(())
        }
    }

    struct StubBackend {
        calls: Arc<Mutex<Calls>>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Calls::default())),
            }
        }
    }

    impl DetectorBackend for StubBackend {
        fn train(
            &self,
            _positives: &[TrainingImage],
            _negatives: &[GreyImage],
            _options: &TrainingOptions,
        ) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().train += 1;
            Ok(Box::new(StubDetector {
                calls: self.calls.clone(),
            }))
        }

        fn load(&self, _path: &Path) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().load += 1;
            Ok(Box::new(StubDetector {
                calls: self.calls.clone(),
            }))
        }
    }

    fn positive() -> TrainingImage {
        TrainingImage {
            image: GreyImage::new(vec![0u8; 100], 10, 10),
            region: Region::new(1.0, 1.0, 8.0, 8.0),
        }
    }

    // --- Tests ---

    #[test]
    fn test_trains_and_persists_when_cache_missing() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("a.model");
        let backend = StubBackend::new();
        let calls = backend.calls.clone();

        let (_, cache_hit) = ModelCache::new(false)
            .train_or_load(
                &backend,
                "a",
                &mut |_| vec![positive()],
                &[],
                &TrainingOptions::default(),
                &cache_path,
                &mut NullPipelineLogger,
            )
            .unwrap();

        assert!(!cache_hit);
        assert!(cache_path.exists());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.train, 1);
        assert_eq!(calls.save, 1);
        assert_eq!(calls.load, 0);
    }

    #[test]
    fn test_cache_hit_skips_training_and_loading_positives() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("a.model");
        fs::write(&cache_path, b"existing").unwrap();
        let backend = StubBackend::new();
        let calls = backend.calls.clone();
        let mut positives_requested = false;

        let (_, cache_hit) = ModelCache::new(false)
            .train_or_load(
                &backend,
                "a",
                &mut |_| {
                    positives_requested = true;
                    vec![positive()]
                },
                &[],
                &TrainingOptions::default(),
                &cache_path,
                &mut NullPipelineLogger,
            )
            .unwrap();

        assert!(cache_hit);
        assert!(!positives_requested);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.train, 0);
        assert_eq!(calls.load, 1);
    }

    #[test]
    fn test_overwrite_retrains_despite_cache() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("a.model");
        fs::write(&cache_path, b"existing").unwrap();
        let backend = StubBackend::new();
        let calls = backend.calls.clone();

        let (_, cache_hit) = ModelCache::new(true)
            .train_or_load(
                &backend,
                "a",
                &mut |_| vec![positive()],
                &[],
                &TrainingOptions::default(),
                &cache_path,
                &mut NullPipelineLogger,
            )
            .unwrap();

        assert!(!cache_hit);
        assert_eq!(calls.lock().unwrap().train, 1);
    }

    #[test]
    fn test_empty_positives_is_no_training_data() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("a.model");
        let backend = StubBackend::new();

        let result = ModelCache::new(false).train_or_load(
            &backend,
            "clip_a",
            &mut |_| vec![],
            &[],
            &TrainingOptions::default(),
            &cache_path,
            &mut NullPipelineLogger,
        );

        assert!(matches!(result, Err(TrainError::NoTrainingData(ref c)) if c == "clip_a"));
        assert!(!cache_path.exists());
    }
}
