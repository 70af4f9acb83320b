use crate::dataset::domain::training_image::TrainingImage;
use crate::shared::grey_image::GreyImage;
use crate::shared::region::Region;

/// Crops the image to a margin around its annotation and bounds its size.
///
/// The crop keeps `crop_proportion` of the annotation's extent as margin on
/// each side. If either dimension of the crop exceeds `size_threshold`, the
/// result is rescaled (aspect preserved) so its diagonal equals the
/// threshold. The annotation region is carried into the output coordinate
/// frame.
pub fn crop_rescale(
    image: GreyImage,
    region: Region,
    crop_proportion: f64,
    size_threshold: u32,
) -> TrainingImage {
    let (x, y, width, height) = region
        .expand(crop_proportion)
        .to_pixel_rect(image.width(), image.height());
    let (cropped, region) = if width == 0 || height == 0 {
        // Degenerate annotation: keep the whole frame.
        (image, region)
    } else {
        (
            image.crop(x, y, width, height),
            region.translate(-(x as f64), -(y as f64)),
        )
    };

    if cropped.width() > size_threshold || cropped.height() > size_threshold {
        let factor = size_threshold as f64 / cropped.diagonal();
        TrainingImage {
            image: cropped.rescale(factor),
            region: region.scale(factor),
        }
    } else {
        TrainingImage {
            image: cropped,
            region,
        }
    }
}
