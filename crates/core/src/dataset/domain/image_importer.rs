use std::path::Path;

use crate::shared::grey_image::GreyImage;

/// Port for decoding image files into unnormalized greyscale buffers.
pub trait ImageImporter: Send {
    fn import(&self, path: &Path) -> Result<GreyImage, Box<dyn std::error::Error>>;
}
