pub mod annotation_store;
