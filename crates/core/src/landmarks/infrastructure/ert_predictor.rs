use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::landmarks::domain::landmark_predictor::LandmarkPredictor;
use crate::shared::grey_image::GreyImage;
use crate::shared::point_set::{Point, PointSet};
use crate::shared::region::Region;

/// A split feature: intensity difference between two pixels, each anchored
/// to a current landmark estimate with an offset in region-normalized
/// coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SplitFeature {
    pub anchor1: u16,
    pub offset1: [f32; 2],
    pub anchor2: u16,
    pub offset2: [f32; 2],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: SplitFeature,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Shape delta in region-normalized coordinates, one entry per landmark.
    Leaf { delta: Vec<[f32; 2]> },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walks from the root (node 0) to a leaf. Feature above threshold goes
    /// left (dlib convention).
    fn traverse<F>(&self, get_feature: F) -> &[[f32; 2]]
    where
        F: Fn(&SplitFeature) -> f32,
    {
        let mut index = 0usize;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if get_feature(feature) > *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                TreeNode::Leaf { delta } => return delta,
            }
        }
    }
}

/// Ensemble-of-regression-trees landmark predictor, inference only.
///
/// Starts from a mean shape scaled into the detected region and refines it
/// through cascade stages; each stage sums the leaf deltas of its trees,
/// with split features sampled as pixel differences around the current
/// estimate. The trained model is produced externally and loaded from disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErtShapePredictor {
    /// Mean shape in [0, 1] coordinates relative to the detection region.
    mean_shape: Vec<[f32; 2]>,
    cascade: Vec<Vec<RegressionTree>>,
}

impl ErtShapePredictor {
    pub fn new(mean_shape: Vec<[f32; 2]>, cascade: Vec<Vec<RegressionTree>>) -> Self {
        Self { mean_shape, cascade }
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(bincode::deserialize(&fs::read(path)?)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    pub fn num_landmarks(&self) -> usize {
        self.mean_shape.len()
    }

    pub fn num_cascade_stages(&self) -> usize {
        self.cascade.len()
    }

    fn feature_value(
        &self,
        image: &GreyImage,
        shape: &[Point],
        region: &Region,
        feature: &SplitFeature,
    ) -> f32 {
        let sample = |anchor: u16, offset: [f32; 2]| -> f32 {
            let base = shape[anchor as usize % shape.len()];
            let x = base.x + offset[0] as f64 * region.width();
            let y = base.y + offset[1] as f64 * region.height();
            image.get_clamped(x.round() as i64, y.round() as i64) as f32
        };
        sample(feature.anchor1, feature.offset1) - sample(feature.anchor2, feature.offset2)
    }
}

impl LandmarkPredictor for ErtShapePredictor {
    fn predict(
        &self,
        image: &GreyImage,
        region: &Region,
    ) -> Result<PointSet, Box<dyn std::error::Error>> {
        if self.mean_shape.is_empty() {
            return Err("landmark model has no mean shape".into());
        }

        // Mean shape scaled into the detection region.
        let mut shape: Vec<Point> = self
            .mean_shape
            .iter()
            .map(|p| {
                Point::new(
                    region.min_x + p[0] as f64 * region.width(),
                    region.min_y + p[1] as f64 * region.height(),
                )
            })
            .collect();

        for stage in &self.cascade {
            let mut delta = vec![[0.0_f32; 2]; shape.len()];
            for tree in stage {
                let leaf =
                    tree.traverse(|feature| self.feature_value(image, &shape, region, feature));
                for (d, l) in delta.iter_mut().zip(leaf.iter()) {
                    d[0] += l[0];
                    d[1] += l[1];
                }
            }
            for (point, d) in shape.iter_mut().zip(delta.iter()) {
                point.x += d[0] as f64 * region.width();
                point.y += d[1] as f64 * region.height();
            }
        }

        Ok(PointSet::new(shape))
    }
}
