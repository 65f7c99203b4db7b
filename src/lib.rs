pub mod catalog;
pub mod color;
pub mod config;
pub mod errors;
pub mod models;
pub mod sources;
pub mod utils;
