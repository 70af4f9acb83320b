use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples use cases from specific output mechanisms so callers can
/// observe pipeline behavior without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Log a recoverable problem (skipped frame, skipped clip, ...).
    fn warn(&mut self, message: &str);

    /// Report frame-level progress within a clip.
    fn progress(&mut self, clip: &str, current: usize, total: usize);
}

/// Silent logger that discards all events. Used by tests where logger
/// output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
    fn progress(&mut self, _clip: &str, _current: usize, _total: usize) {}
}

/// Logger that sends every message to the `log` facade and mirrors it to a
/// run log file, so a finished run leaves a complete on-disk record of what
/// the console showed.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct TeePipelineLogger {
    file: Option<File>,
    throttle_frames: usize,
}

impl TeePipelineLogger {
    pub fn new() -> Self {
        Self {
            file: None,
            throttle_frames: 10,
        }
    }

    /// Mirrors messages into `path` in addition to the console.
    pub fn with_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            file: Some(File::create(path)?),
            ..Self::new()
        })
    }

    fn mirror(&mut self, message: &str) {
        if let Some(file) = &mut self.file {
            // Best-effort: a failed log write must not abort the run.
            let _ = writeln!(file, "{message}");
        }
    }
}

impl Default for TeePipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for TeePipelineLogger {
    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.mirror(message);
    }

    fn warn(&mut self, message: &str) {
        log::warn!("{message}");
        self.mirror(message);
    }

    fn progress(&mut self, clip: &str, current: usize, total: usize) {
        if total == 0 || (current % self.throttle_frames != 0 && current != total) {
            return;
        }
        let message = format!("{clip}: frame {current}/{total}");
        log::info!("{message}");
        self.mirror(&message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_null_logger_is_noop() {
        let mut logger = NullPipelineLogger;
        logger.info("hello");
        logger.warn("problem");
        logger.progress("clip", 1, 10);
    }

    #[test]
    fn test_tee_logger_mirrors_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");
        {
            let mut logger = TeePipelineLogger::with_file(&path).unwrap();
            logger.info("starting");
            logger.warn("skipped clip a");
        }
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("starting"));
        assert!(content.contains("skipped clip a"));
    }

    #[test]
    fn test_progress_is_throttled() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");
        {
            let mut logger = TeePipelineLogger::with_file(&path).unwrap();
            for i in 1..=25 {
                logger.progress("clip_a", i, 25);
            }
        }
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // Frames 10 and 20 on the throttle, 25 as the final frame.
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("frame 25/25"));
    }

    #[test]
    fn test_logger_without_file_does_not_panic() {
        let mut logger = TeePipelineLogger::new();
        logger.info("console only");
        logger.progress("clip", 10, 10);
    }
}
