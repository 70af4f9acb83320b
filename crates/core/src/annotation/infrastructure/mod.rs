pub mod pts_store;
