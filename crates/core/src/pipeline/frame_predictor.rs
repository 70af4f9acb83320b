use std::path::{Path, PathBuf};

use crate::annotation::domain::annotation_store::AnnotationStore;
use crate::dataset::domain::image_importer::ImageImporter;
use crate::detection::domain::detector::{ClipDetector, Detection};
use crate::landmarks::domain::landmark_predictor::LandmarkPredictor;
use crate::shared::constants::{ANNOTATION_EXTENSION, ANNOTATION_SUFFIX};
use crate::shared::point_set::PointSet;

/// What happened to one frame.
#[derive(Debug, PartialEq)]
pub enum FrameOutcome {
    /// The detector produced no candidates; nothing was written.
    NoDetection,
    Written {
        bbox_path: PathBuf,
        landmark_path: PathBuf,
    },
}

/// Per-frame prediction: detect, keep the best candidate, persist it, and
/// refine it into landmarks.
///
/// Only the single highest-confidence detection is kept per frame; further
/// candidates are discarded even if they mark real additional targets.
pub struct FramePredictor {
    importer: Box<dyn ImageImporter>,
    store: Box<dyn AnnotationStore>,
    landmarker: Box<dyn LandmarkPredictor>,
}

impl FramePredictor {
    pub fn new(
        importer: Box<dyn ImageImporter>,
        store: Box<dyn AnnotationStore>,
        landmarker: Box<dyn LandmarkPredictor>,
    ) -> Self {
        Self {
            importer,
            store,
            landmarker,
        }
    }

    /// Writes the winning detection and its landmarks, overwriting existing
    /// files. A miss writes nothing. Detector and landmarker errors
    /// propagate to the caller.
    pub fn predict(
        &self,
        frame_path: &Path,
        detector: &dyn ClipDetector,
        out_bbox_dir: &Path,
        out_landmark_dir: &Path,
    ) -> Result<FrameOutcome, Box<dyn std::error::Error>> {
        let image = self.importer.import(frame_path)?;
        let detections = detector.detect(&image)?;
        let Some(best) = best_detection(&detections) else {
            return Ok(FrameOutcome::NoDetection);
        };

        let stem = frame_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("invalid frame file name: {}", frame_path.display()))?;
        let file_name = format!("{stem}{ANNOTATION_SUFFIX}.{ANNOTATION_EXTENSION}");

        let bbox_path = out_bbox_dir.join(&file_name);
        self.store
            .save(&bbox_path, &PointSet::new(best.region.corner_points()))?;

        let landmarks = self.landmarker.predict(&image, &best.region)?;
        let landmark_path = out_landmark_dir.join(&file_name);
        self.store.save(&landmark_path, &landmarks)?;

        Ok(FrameOutcome::Written {
            bbox_path,
            landmark_path,
        })
    }
}

/// First maximum-confidence detection, preserving detector order on ties.
fn best_detection(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        if best.map_or(true, |b| detection.confidence > b.confidence) {
            best = Some(detection);
        }
    }
    best
}
