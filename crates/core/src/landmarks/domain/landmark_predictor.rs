use crate::shared::grey_image::GreyImage;
use crate::shared::point_set::PointSet;
use crate::shared::region::Region;

/// Port for refining a detected region into a dense landmark point set.
pub trait LandmarkPredictor: Send {
    /// Landmark positions in full-image coordinates.
    fn predict(
        &self,
        image: &GreyImage,
        region: &Region,
    ) -> Result<PointSet, Box<dyn std::error::Error>>;
}
