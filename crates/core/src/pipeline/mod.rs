pub mod clip_outcome;
pub mod frame_predictor;
pub mod pipeline_logger;
pub mod process_clip_use_case;
pub mod run_pipeline_use_case;
