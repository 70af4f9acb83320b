use std::fs;
use std::path::{Path, PathBuf};

use crate::dataset::domain::image_importer::ImageImporter;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::grey_image::GreyImage;

/// A fixed pool of generic non-target images, loaded once per run and
/// shared read-only across all clip-training calls.
pub struct NegativePool {
    images: Vec<GreyImage>,
}

impl NegativePool {
    /// Loads up to `max_images` greyscale images from `dir` in lexical
    /// order, skipping files that fail to decode. A missing directory is
    /// an error: without negatives no detector can be trained.
    pub fn load(
        dir: &Path,
        max_images: usize,
        importer: &dyn ImageImporter,
        logger: &mut dyn PipelineLogger,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        let mut images = Vec::new();
        for path in entries {
            if images.len() >= max_images {
                break;
            }
            match importer.import(&path) {
                Ok(image) => images.push(image),
                Err(e) => logger.warn(&format!(
                    "ignoring negative image {}: {e}",
                    path.display()
                )),
            }
        }
        Ok(Self { images })
    }

    pub fn images(&self) -> &[GreyImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
