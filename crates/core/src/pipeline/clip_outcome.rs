use std::fmt;

/// Why a clip was skipped without aborting the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingFrames,
    MissingAnnotations,
    NoTrainingData,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingFrames => write!(f, "frames directory is missing"),
            SkipReason::MissingAnnotations => {
                write!(f, "previous bounding box directory is missing")
            }
            SkipReason::NoTrainingData => write!(f, "no usable positive training images"),
        }
    }
}

/// Result of processing one clip. Skips are ordinary values so the
/// orchestrator can continue the run; hard failures are `Err`s.
#[derive(Debug, PartialEq, Eq)]
pub enum ClipOutcome {
    Processed {
        frames_seen: usize,
        frames_detected: usize,
        cache_hit: bool,
    },
    Skipped(SkipReason),
}
