use crate::shared::grey_image::GreyImage;
use crate::shared::region::Region;

/// A positive training example: a preprocessed greyscale image together
/// with its annotation's bounding region, both in the image's coordinate
/// frame after cropping and rescaling.
#[derive(Clone, Debug)]
pub struct TrainingImage {
    pub image: GreyImage,
    pub region: Region,
}
