pub mod correlation_detector;
pub mod model_cache;
