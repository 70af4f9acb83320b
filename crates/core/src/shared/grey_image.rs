use image::imageops::{self, FilterType};
use ndarray::ArrayView2;

/// A single-channel 8-bit image: contiguous luma bytes in row-major order.
///
/// Every image in the pipeline is greyscale; colour conversion happens at
/// the import boundary. Values are unnormalized (0-255).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreyImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GreyImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_luma(image: image::GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn diagonal(&self) -> f64 {
        let w = self.width as f64;
        let h = self.height as f64;
        (w * w + h * h).sqrt()
    }

    /// Pixel value at `(x, y)`, clamped to the image bounds.
    pub fn get_clamped(&self, x: i64, y: i64) -> u8 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[y * self.width as usize + x]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("image data length must match dimensions")
    }

    /// Copies out the `width` x `height` rectangle anchored at `(x, y)`.
    ///
    /// The rectangle must lie fully inside the image.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> GreyImage {
        assert!(x + width <= self.width && y + height <= self.height);
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for row in y..y + height {
            let start = (row as usize) * (self.width as usize) + x as usize;
            data.extend_from_slice(&self.data[start..start + width as usize]);
        }
        GreyImage::new(data, width, height)
    }

    /// Resamples by `factor` in both dimensions, preserving aspect ratio.
    pub fn rescale(&self, factor: f64) -> GreyImage {
        let width = ((self.width as f64 * factor).round() as u32).max(1);
        let height = ((self.height as f64 * factor).round() as u32).max(1);
        self.resize_to(width, height)
    }

    /// Resamples to exactly `width` x `height`.
    pub fn resize_to(&self, width: u32, height: u32) -> GreyImage {
        let buffer = image::GrayImage::from_raw(self.width, self.height, self.data.clone())
            .expect("image data length must match dimensions");
        Self::from_luma(imageops::resize(&buffer, width, height, FilterType::Triangle))
    }
}
