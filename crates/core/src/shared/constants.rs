/// Clip frame directories live under `<root>/frames/<clip>/`.
pub const FRAMES_FOLDER: &str = "frames";
pub const LOGS_FOLDER: &str = "logs";

pub const DEFAULT_IN_BBOX_FOLDER: &str = "1_dlib_detect";
pub const DEFAULT_OUT_BBOX_FOLDER: &str = "2_ffld";
pub const DEFAULT_OUT_MODEL_FOLDER: &str = "2_ffld_models";
pub const DEFAULT_OUT_LANDMARK_FOLDER: &str = "3_ffld_ln";

pub const MODEL_EXTENSION: &str = "model";
pub const ANNOTATION_EXTENSION: &str = "pts";
/// Suffix appended to a frame stem when exporting its annotation file.
pub const ANNOTATION_SUFFIX: &str = "_0";

/// Positive training images sampled per clip.
pub const MAX_TRAINING_IMAGES: usize = 400;
/// Negative pool size, shared across all clips in a run.
pub const NEGATIVE_POOL_MAX: usize = 300;

/// Margin kept around a training annotation when cropping, as a proportion
/// of the annotation's extent per axis.
pub const CROP_PROPORTION: f64 = 0.3;
/// Training images with either dimension above this are rescaled so their
/// diagonal equals it.
pub const RESCALE_THRESHOLD: u32 = 330;

pub const TRAIN_COMPONENTS: usize = 1;
pub const TRAIN_RELABEL_ROUNDS: usize = 6;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
