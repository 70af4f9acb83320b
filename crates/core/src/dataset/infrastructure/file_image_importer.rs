use std::path::Path;

use crate::dataset::domain::image_importer::ImageImporter;
use crate::shared::grey_image::GreyImage;

/// Decodes image files with the `image` crate and converts multi-channel
/// content to greyscale by luminosity.
pub struct FileImageImporter;

impl ImageImporter for FileImageImporter {
    fn import(&self, path: &Path) -> Result<GreyImage, Box<dyn std::error::Error>> {
        let decoded = image::open(path)?;
        Ok(GreyImage::from_luma(decoded.to_luma8()))
    }
}
