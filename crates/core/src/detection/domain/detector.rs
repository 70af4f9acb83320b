use std::path::Path;

use crate::dataset::domain::training_image::TrainingImage;
use crate::shared::constants::{TRAIN_COMPONENTS, TRAIN_RELABEL_ROUNDS};
use crate::shared::grey_image::GreyImage;
use crate::shared::region::Region;

/// A single candidate detection in a frame.
#[derive(Clone, Debug)]
pub struct Detection {
    pub region: Region,
    pub confidence: f64,
}

/// Hyperparameters forwarded to the training capability.
#[derive(Clone, Copy, Debug)]
pub struct TrainingOptions {
    pub components: usize,
    pub relabel_rounds: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            components: TRAIN_COMPONENTS,
            relabel_rounds: TRAIN_RELABEL_ROUNDS,
        }
    }
}

/// A trained per-clip detector.
///
/// The on-disk representation is owned by the backend that produced it;
/// the orchestration layer only moves the file around.
pub trait ClipDetector: Send {
    /// Candidate detections for one frame, ordered by descending confidence.
    fn detect(&self, image: &GreyImage) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;

    /// Persists the model, overwriting any existing file.
    fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>>;
}

/// External detection-learning capability: trains a detector from positive
/// and negative examples and reloads persisted models.
pub trait DetectorBackend: Send {
    fn train(
        &self,
        positives: &[TrainingImage],
        negatives: &[GreyImage],
        options: &TrainingOptions,
    ) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>>;

    fn load(&self, path: &Path) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>>;
}
