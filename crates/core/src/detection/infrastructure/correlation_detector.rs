use std::fs;
use std::path::Path;

use ndarray::{s, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::dataset::domain::training_image::TrainingImage;
use crate::detection::domain::detector::{ClipDetector, Detection, DetectorBackend, TrainingOptions};
use crate::shared::grey_image::GreyImage;
use crate::shared::region::Region;

/// Pyramid downscale factor between scan levels.
const SCALE_STEP: f64 = 1.2;
/// Sliding-window stride in pixels at each level.
const STRIDE: usize = 4;
/// Template height; width follows the mean aspect of the positive regions.
const TEMPLATE_HEIGHT: u32 = 48;
const MIN_TEMPLATE_WIDTH: u32 = 8;
const MAX_TEMPLATE_WIDTH: u32 = 128;
/// Lowest score the calibrated threshold may reach. A blank frame scores
/// 0 everywhere, so a positive floor keeps it detection-free.
const THRESHOLD_FLOOR: f32 = 0.05;
const THRESHOLD_CEILING: f32 = 0.95;
const THRESHOLD_MARGIN: f32 = 1e-3;

#[derive(Serialize, Deserialize)]
struct TemplateModel {
    width: u32,
    height: u32,
    /// Zero-mean, unit-norm template weights, row-major.
    weights: Vec<f32>,
    threshold: f32,
}

impl TemplateModel {
    fn weights_view(&self) -> ArrayView2<'_, f32> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.weights)
            .expect("template weights must match dimensions")
    }
}

/// Baseline detector: normalized cross-correlation of a mean template over
/// a scale pyramid.
///
/// Heavier learned backends plug in through [`ClipDetector`] without
/// touching the orchestration. Objects smaller than the template are not
/// found, since the pyramid only downscales.
pub struct CorrelationDetector {
    model: TemplateModel,
}

impl CorrelationDetector {
    fn scan_pyramid(&self, image: &GreyImage, min_score: f32) -> Vec<Detection> {
        let template = self.model.weights_view();
        let (tw, th) = (self.model.width, self.model.height);
        let mut detections = Vec::new();

        let mut scale = 1.0_f64;
        loop {
            let scaled = if (scale - 1.0).abs() < f64::EPSILON {
                image.clone()
            } else {
                image.rescale(scale)
            };
            if scaled.width() < tw || scaled.height() < th {
                break;
            }
            scan_level(&template, &scaled, scale, min_score, &mut detections);
            scale /= SCALE_STEP;
        }

        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        detections
    }

    fn best_score(&self, image: &GreyImage) -> f32 {
        self.scan_pyramid(image, f32::MIN)
            .first()
            .map(|d| d.confidence as f32)
            .unwrap_or(0.0)
    }
}

fn scan_level(
    template: &ArrayView2<'_, f32>,
    scaled: &GreyImage,
    scale: f64,
    min_score: f32,
    detections: &mut Vec<Detection>,
) {
    let (th, tw) = (template.nrows(), template.ncols());
    let pixels = to_f32(scaled);
    let inv = 1.0 / scale;

    for y in (0..=pixels.nrows() - th).step_by(STRIDE) {
        for x in (0..=pixels.ncols() - tw).step_by(STRIDE) {
            let patch = pixels.slice(s![y..y + th, x..x + tw]);
            let score = ncc(template, &patch);
            if score > min_score {
                detections.push(Detection {
                    region: Region::new(
                        x as f64 * inv,
                        y as f64 * inv,
                        (x + tw) as f64 * inv,
                        (y + th) as f64 * inv,
                    ),
                    confidence: score as f64,
                });
            }
        }
    }
}

fn to_f32(image: &GreyImage) -> Array2<f32> {
    image.as_ndarray().mapv(|v| v as f32)
}

/// Correlation of a zero-mean unit-norm template with a patch, in [-1, 1].
/// Flat patches score 0.
fn ncc(template: &ArrayView2<'_, f32>, patch: &ArrayView2<'_, f32>) -> f32 {
    let n = template.len() as f32;
    let mut sum = 0.0_f32;
    let mut sum_sq = 0.0_f32;
    let mut dot = 0.0_f32;
    for (w, p) in template.iter().zip(patch.iter()) {
        sum += p;
        sum_sq += p * p;
        dot += w * p;
    }
    let variance = sum_sq - sum * sum / n;
    if variance <= f32::EPSILON {
        return 0.0;
    }
    dot / variance.sqrt()
}

impl ClipDetector for CorrelationDetector {
    fn detect(&self, image: &GreyImage) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        Ok(self.scan_pyramid(image, self.model.threshold))
    }

    fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, bincode::serialize(&self.model)?)?;
        Ok(())
    }
}

/// Trains [`CorrelationDetector`]s: averages the annotated windows of the
/// positives into a template and calibrates the score threshold so no
/// negative image fires.
///
/// Single-component only; relabeling rounds do not apply to a mean
/// template and are accepted for interface parity.
pub struct CorrelationBackend;

impl CorrelationBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CorrelationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for CorrelationBackend {
    fn train(
        &self,
        positives: &[TrainingImage],
        negatives: &[GreyImage],
        options: &TrainingOptions,
    ) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>> {
        if positives.is_empty() {
            return Err("cannot train on an empty positive set".into());
        }
        if options.components > 1 {
            log::warn!(
                "correlation backend is single-component; ignoring {} extra components",
                options.components - 1
            );
        }

        let (width, height) = template_dimensions(positives);
        let mut accumulator = Array2::<f32>::zeros((height as usize, width as usize));
        let mut count = 0usize;
        for positive in positives {
            let (x, y, w, h) = positive
                .region
                .to_pixel_rect(positive.image.width(), positive.image.height());
            if w == 0 || h == 0 {
                continue;
            }
            let window = positive.image.crop(x, y, w, h).resize_to(width, height);
            accumulator += &to_f32(&window);
            count += 1;
        }
        if count == 0 {
            return Err("no usable positive windows".into());
        }

        let mut template = accumulator / count as f32;
        let mean = template.mean().unwrap_or(0.0);
        template -= mean;
        let norm = template.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            return Err("positive windows have no variance".into());
        }
        template /= norm;

        let mut detector = CorrelationDetector {
            model: TemplateModel {
                width,
                height,
                weights: template.into_raw_vec_and_offset().0,
                threshold: THRESHOLD_FLOOR,
            },
        };

        let best_negative = negatives
            .iter()
            .map(|n| detector.best_score(n))
            .fold(0.0_f32, f32::max);
        detector.model.threshold = (best_negative + THRESHOLD_MARGIN)
            .clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING);

        Ok(Box::new(detector))
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ClipDetector>, Box<dyn std::error::Error>> {
        let model: TemplateModel = bincode::deserialize(&fs::read(path)?)?;
        Ok(Box::new(CorrelationDetector { model }))
    }
}

/// Template height is fixed; width follows the mean aspect ratio of the
/// positive regions.
fn template_dimensions(positives: &[TrainingImage]) -> (u32, u32) {
    let mut aspect_sum = 0.0_f64;
    let mut count = 0usize;
    for positive in positives {
        if positive.region.height() > 0.0 {
            aspect_sum += positive.region.width() / positive.region.height();
            count += 1;
        }
    }
    let aspect = if count > 0 { aspect_sum / count as f64 } else { 1.0 };
    let width = ((TEMPLATE_HEIGHT as f64 * aspect).round() as u32)
        .clamp(MIN_TEMPLATE_WIDTH, MAX_TEMPLATE_WIDTH);
    (width, TEMPLATE_HEIGHT)
}
