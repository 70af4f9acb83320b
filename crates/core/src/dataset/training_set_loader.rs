use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::annotation::domain::annotation_store::AnnotationStore;
use crate::dataset::domain::image_importer::ImageImporter;
use crate::dataset::domain::preprocess::crop_rescale;
use crate::dataset::domain::training_image::TrainingImage;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::{CROP_PROPORTION, RESCALE_THRESHOLD};

/// Optional transform applied to each accepted training image (identity
/// when unset).
pub type FeatureTransform = Box<dyn Fn(TrainingImage) -> TrainingImage + Send>;

/// Loads a shuffled, capped set of positive training images for one clip.
///
/// Candidates are taken in random order so the sample covers the clip
/// rather than its first frames; pass a seed for reproducible selection.
/// Frames that fail to decode or have no annotation are skipped.
pub struct TrainingSetLoader {
    importer: Box<dyn ImageImporter>,
    store: Box<dyn AnnotationStore>,
    max_images: usize,
    seed: Option<u64>,
    crop_proportion: f64,
    size_threshold: u32,
    transform: Option<FeatureTransform>,
}

impl TrainingSetLoader {
    pub fn new(
        importer: Box<dyn ImageImporter>,
        store: Box<dyn AnnotationStore>,
        max_images: usize,
        seed: Option<u64>,
    ) -> Self {
        Self {
            importer,
            store,
            max_images,
            seed,
            crop_proportion: CROP_PROPORTION,
            size_threshold: RESCALE_THRESHOLD,
            transform: None,
        }
    }

    pub fn with_transform(mut self, transform: FeatureTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Up to `max_images` processed positives; order is shuffled-input
    /// order restricted to accepted frames.
    pub fn load(
        &self,
        frame_names: &[String],
        frames_dir: &Path,
        annotation_root: &Path,
        clip: &str,
        logger: &mut dyn PipelineLogger,
    ) -> Vec<TrainingImage> {
        let mut names: Vec<&String> = frame_names.iter().collect();
        match self.seed {
            Some(seed) => names.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => names.shuffle(&mut rand::rng()),
        }

        let annotation_dir = annotation_root.join(clip);
        let mut result = Vec::new();
        for name in names {
            if result.len() >= self.max_images {
                break;
            }
            let image = match self.importer.import(&frames_dir.join(name)) {
                Ok(image) => image,
                Err(e) => {
                    logger.warn(&format!("ignoring the 'image' {name}: {e}"));
                    continue;
                }
            };
            let stem = match Path::new(name).file_stem() {
                Some(stem) => stem.to_string_lossy().into_owned(),
                None => continue,
            };
            let matches = match self.store.find_for_stem(&annotation_dir, &stem) {
                Ok(matches) => matches,
                Err(e) => {
                    logger.warn(&format!("annotation lookup failed for {name}: {e}"));
                    continue;
                }
            };
            let first = match matches.first() {
                Some(first) => first,
                None => continue,
            };
            if matches.len() > 1 {
                logger.warn(&format!(
                    "the image {name} has more than one annotation, loading only the first one"
                ));
            }
            let points = match self.store.load(first) {
                Ok(points) => points,
                Err(e) => {
                    logger.warn(&format!("ignoring unreadable annotation for {name}: {e}"));
                    continue;
                }
            };
            let region = match points.bounding_region() {
                Some(region) => region,
                None => continue,
            };

            let mut sample = crop_rescale(image, region, self.crop_proportion, self.size_threshold);
            if let Some(transform) = &self.transform {
                sample = transform(sample);
            }
            result.push(sample);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::grey_image::GreyImage;
    use crate::shared::point_set::{Point, PointSet};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImporter {
        fail_for: Vec<String>,
    }

    impl StubImporter {
        fn new() -> Self {
            Self { fail_for: vec![] }
        }
    }

    impl ImageImporter for StubImporter {
        fn import(&self, path: &Path) -> Result<GreyImage, Box<dyn std::error::Error>> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.fail_for.contains(&name) {
                return Err("decode failure".into());
            }
            Ok(GreyImage::new(vec![128; 50 * 50], 50, 50))
        }
    }

    struct StubStore {
        // stem -> annotation files that "exist"
        matches: HashMap<String, Vec<PathBuf>>,
        loaded: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl StubStore {
        fn with_single_matches(stems: &[&str]) -> Self {
            let matches = stems
                .iter()
                .map(|s| (s.to_string(), vec![PathBuf::from(format!("{s}_0.pts"))]))
                .collect();
            Self {
                matches,
                loaded: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl AnnotationStore for StubStore {
        fn find_for_stem(
            &self,
            _dir: &Path,
            stem: &str,
        ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
            Ok(self.matches.get(stem).cloned().unwrap_or_default())
        }

        fn load(&self, path: &Path) -> Result<PointSet, Box<dyn std::error::Error>> {
            self.loaded.lock().unwrap().push(path.to_path_buf());
            Ok(PointSet::new(vec![
                Point::new(10.0, 10.0),
                Point::new(30.0, 30.0),
            ]))
        }

        fn save(&self, _path: &Path, _points: &PointSet) -> Result<(), Box<dyn std::error::Error>> {
            unreachable!("loader never saves");
        }
    }

    struct RecordingLogger {
        warnings: Vec<String>,
    }

    impl RecordingLogger {
        fn new() -> Self {
            Self {
                warnings: Vec::new(),
            }
        }
    }

    impl PipelineLogger for RecordingLogger {
        fn info(&mut self, _message: &str) {}
        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
        fn progress(&mut self, _clip: &str, _current: usize, _total: usize) {}
    }

    fn frame_names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("frame_{i:03}.png")).collect()
    }

    fn loader_with(store: StubStore, max: usize, seed: Option<u64>) -> TrainingSetLoader {
        TrainingSetLoader::new(Box::new(StubImporter::new()), Box::new(store), max, seed)
    }

    // --- Tests ---

    #[test]
    fn test_never_exceeds_max_images() {
        let stems: Vec<String> = (0..10).map(|i| format!("frame_{i:03}")).collect();
        let stem_refs: Vec<&str> = stems.iter().map(String::as_str).collect();
        let loader = loader_with(StubStore::with_single_matches(&stem_refs), 3, Some(7));

        let result = loader.load(
            &frame_names(10),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut NullPipelineLogger,
        );

        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_frames_without_annotations_are_excluded() {
        let loader = loader_with(
            StubStore::with_single_matches(&["frame_001", "frame_003"]),
            400,
            Some(1),
        );

        let result = loader.load(
            &frame_names(5),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut NullPipelineLogger,
        );

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_decode_failure_is_skipped_with_warning() {
        let stems: Vec<String> = (0..3).map(|i| format!("frame_{i:03}")).collect();
        let stem_refs: Vec<&str> = stems.iter().map(String::as_str).collect();
        let store = StubStore::with_single_matches(&stem_refs);
        let importer = StubImporter {
            fail_for: vec!["frame_001.png".to_string()],
        };
        let loader = TrainingSetLoader::new(Box::new(importer), Box::new(store), 400, Some(1));
        let mut logger = RecordingLogger::new();

        let result = loader.load(
            &frame_names(3),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut logger,
        );

        assert_eq!(result.len(), 2);
        assert!(logger.warnings.iter().any(|w| w.contains("frame_001.png")));
    }

    #[test]
    fn test_ambiguous_annotation_uses_first_and_warns() {
        let mut store = StubStore::with_single_matches(&["frame_000"]);
        store.matches.insert(
            "frame_000".to_string(),
            vec![
                PathBuf::from("frame_000_0.pts"),
                PathBuf::from("frame_000_1.pts"),
            ],
        );
        let loaded = store.loaded.clone();
        let loader = loader_with(store, 400, Some(1));
        let mut logger = RecordingLogger::new();

        let result = loader.load(
            &frame_names(1),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut logger,
        );

        assert_eq!(result.len(), 1);
        assert_eq!(
            loaded.lock().unwrap().as_slice(),
            &[PathBuf::from("frame_000_0.pts")]
        );
        assert!(logger
            .warnings
            .iter()
            .any(|w| w.contains("more than one annotation")));
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let stems: Vec<String> = (0..20).map(|i| format!("frame_{i:03}")).collect();
        let stem_refs: Vec<&str> = stems.iter().map(String::as_str).collect();

        let load = |seed| {
            let store = StubStore::with_single_matches(&stem_refs);
            let loaded = store.loaded.clone();
            let loader = loader_with(store, 5, Some(seed));
            loader.load(
                &frame_names(20),
                Path::new("frames"),
                Path::new("annotations"),
                "clip_a",
                &mut NullPipelineLogger,
            );
            let snapshot = loaded.lock().unwrap().clone();
            snapshot
        };

        assert_eq!(load(42), load(42));
    }

    #[test]
    fn test_samples_are_preprocessed() {
        let loader = loader_with(StubStore::with_single_matches(&["frame_000"]), 400, Some(1));

        let result = loader.load(
            &frame_names(1),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut NullPipelineLogger,
        );

        // 20x20 annotation on a 50x50 frame, cropped with a 30% margin.
        assert_eq!(result[0].image.width(), 32);
        assert!(result[0].region.min_x < 10.0);
    }

    #[test]
    fn test_feature_transform_is_applied() {
        let loader = loader_with(StubStore::with_single_matches(&["frame_000"]), 400, Some(1))
            .with_transform(Box::new(|mut sample| {
                sample.region = sample.region.scale(2.0);
                sample
            }));

        let result = loader.load(
            &frame_names(1),
            Path::new("frames"),
            Path::new("annotations"),
            "clip_a",
            &mut NullPipelineLogger,
        );

        assert!(result[0].region.max_x > 32.0);
    }
}
