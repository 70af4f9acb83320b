//! Per-clip detector training and facial landmark localization.
//!
//! The pipeline bootstraps a person-specific detector for each video clip
//! from a small set of annotated frames plus a shared negative image pool,
//! caches the trained model on disk, runs it over every frame of the clip,
//! and refines the best detection per frame into a dense landmark set.
//!
//! The detection-learning algorithm and the landmark predictor are ports
//! ([`detection::domain::detector::DetectorBackend`],
//! [`landmarks::domain::landmark_predictor::LandmarkPredictor`]); reference
//! implementations live under the respective `infrastructure` modules.

pub mod annotation;
pub mod dataset;
pub mod detection;
pub mod landmarks;
pub mod pipeline;
pub mod shared;
