pub mod file_image_importer;
