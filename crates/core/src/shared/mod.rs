pub mod constants;
pub mod grey_image;
pub mod point_set;
pub mod region;
pub mod run_paths;
