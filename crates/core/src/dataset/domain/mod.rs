pub mod image_importer;
pub mod preprocess;
pub mod training_image;
