use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_IN_BBOX_FOLDER, DEFAULT_OUT_BBOX_FOLDER, DEFAULT_OUT_LANDMARK_FOLDER,
    DEFAULT_OUT_MODEL_FOLDER, FRAMES_FOLDER, LOGS_FOLDER, MODEL_EXTENSION,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("root path does not exist or is not a directory: {0}")]
    RootNotFound(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Folder names for the four derived directories. Overrides come as a
/// complete set or not at all; partial overrides are rejected by the CLI.
#[derive(Clone, Debug)]
pub struct FolderLayout {
    pub in_bbox: String,
    pub out_bbox: String,
    pub out_models: String,
    pub out_landmarks: String,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            in_bbox: DEFAULT_IN_BBOX_FOLDER.to_string(),
            out_bbox: DEFAULT_OUT_BBOX_FOLDER.to_string(),
            out_models: DEFAULT_OUT_MODEL_FOLDER.to_string(),
            out_landmarks: DEFAULT_OUT_LANDMARK_FOLDER.to_string(),
        }
    }
}

/// Resolves every directory a run touches from the single root path.
///
/// The model and log directories are created eagerly; per-clip output
/// directories are created on first access.
pub struct RunPaths {
    root: PathBuf,
    layout: FolderLayout,
}

impl RunPaths {
    pub fn resolve(root: &Path, layout: Option<FolderLayout>) -> Result<Self, ConfigError> {
        if !root.is_dir() {
            return Err(ConfigError::RootNotFound(root.to_path_buf()));
        }
        let paths = Self {
            root: root.to_path_buf(),
            layout: layout.unwrap_or_default(),
        };
        ensure_dir(&paths.models_dir())?;
        ensure_dir(&paths.logs_dir())?;
        Ok(paths)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames_root(&self) -> PathBuf {
        self.root.join(FRAMES_FOLDER)
    }

    pub fn clip_frames_dir(&self, clip: &str) -> PathBuf {
        self.frames_root().join(clip)
    }

    pub fn in_bbox_root(&self) -> PathBuf {
        self.root.join(&self.layout.in_bbox)
    }

    pub fn clip_in_bbox_dir(&self, clip: &str) -> PathBuf {
        self.in_bbox_root().join(clip)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join(&self.layout.out_models)
    }

    pub fn model_path(&self, clip: &str) -> PathBuf {
        self.models_dir().join(format!("{clip}.{MODEL_EXTENSION}"))
    }

    /// Per-clip detection output directory, created if missing.
    pub fn out_bbox_dir(&self, clip: &str) -> Result<PathBuf, ConfigError> {
        let dir = self.root.join(&self.layout.out_bbox).join(clip);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Per-clip landmark output directory, created if missing.
    pub fn out_landmark_dir(&self, clip: &str) -> Result<PathBuf, ConfigError> {
        let dir = self.root.join(&self.layout.out_landmarks).join(clip);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_FOLDER)
    }

    /// Timestamped run log file, mirrored to the console by the logger.
    pub fn log_file_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y.%m.%d.%H.%M.%S");
        self.logs_dir().join(format!("{stamp}_verification.log"))
    }
}

fn ensure_dir(path: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(path).map_err(|source| ConfigError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
