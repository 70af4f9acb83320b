use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::annotation::domain::annotation_store::AnnotationStore;
use crate::shared::constants::ANNOTATION_EXTENSION;
use crate::shared::point_set::{Point, PointSet};

#[derive(Error, Debug)]
pub enum PtsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed pts file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// PTS text format store:
///
/// ```text
/// version: 1
/// n_points: 4
/// {
/// 12.5 34.0
/// ...
/// }
/// ```
pub struct PtsAnnotationStore;

impl PtsAnnotationStore {
    fn parse(path: &Path, content: &str) -> Result<PointSet, PtsError> {
        let malformed = |reason: &str| PtsError::Malformed {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let version = lines.next().ok_or_else(|| malformed("empty file"))?;
        if !version.starts_with("version:") {
            return Err(malformed("missing version header"));
        }
        let count_line = lines.next().ok_or_else(|| malformed("missing n_points"))?;
        let n_points: usize = count_line
            .strip_prefix("n_points:")
            .map(str::trim)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| malformed("invalid n_points"))?;
        if lines.next() != Some("{") {
            return Err(malformed("missing opening brace"));
        }

        let mut points = Vec::with_capacity(n_points);
        for line in lines.by_ref() {
            if line == "}" {
                break;
            }
            let mut fields = line.split_whitespace();
            let x = fields.next().and_then(|v| v.parse::<f64>().ok());
            let y = fields.next().and_then(|v| v.parse::<f64>().ok());
            match (x, y) {
                (Some(x), Some(y)) => points.push(Point::new(x, y)),
                _ => return Err(malformed(&format!("invalid point line '{line}'"))),
            }
        }
        if points.len() != n_points {
            return Err(malformed(&format!(
                "n_points is {n_points} but {} points were given",
                points.len()
            )));
        }
        Ok(PointSet::new(points))
    }

    fn serialize(points: &PointSet) -> String {
        let mut out = String::new();
        out.push_str("version: 1\n");
        out.push_str(&format!("n_points: {}\n{{\n", points.len()));
        for p in points.points() {
            out.push_str(&format!("{} {}\n", p.x, p.y));
        }
        out.push_str("}\n");
        out
    }
}

impl AnnotationStore for PtsAnnotationStore {
    fn find_for_stem(
        &self,
        dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                name.starts_with(stem)
                    && path
                        .extension()
                        .is_some_and(|ext| ext == ANNOTATION_EXTENSION)
            })
            .collect();
        matches.sort();
        Ok(matches)
    }

    fn load(&self, path: &Path) -> Result<PointSet, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path).map_err(|source| PtsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(path, &content)?)
    }

    fn save(&self, path: &Path, points: &PointSet) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, Self::serialize(points)).map_err(|source| PtsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}
