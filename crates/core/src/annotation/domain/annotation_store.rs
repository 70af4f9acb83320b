use std::path::{Path, PathBuf};

use crate::shared::point_set::PointSet;

/// Port for point-based annotation files.
///
/// One file per frame; the same format carries bounding regions (corner
/// control points) and dense landmark sets.
pub trait AnnotationStore: Send {
    /// Annotation files for a frame stem inside `dir`, lexically sorted.
    /// A missing directory yields an empty list.
    fn find_for_stem(&self, dir: &Path, stem: &str)
        -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>;

    fn load(&self, path: &Path) -> Result<PointSet, Box<dyn std::error::Error>>;

    /// Writes the annotation, overwriting any existing file.
    fn save(&self, path: &Path, points: &PointSet) -> Result<(), Box<dyn std::error::Error>>;
}
