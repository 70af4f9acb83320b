pub mod domain;
pub mod infrastructure;
pub mod negative_pool;
pub mod training_set_loader;
