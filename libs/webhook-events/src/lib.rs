//! GitHub webhook event models

pub mod models;

pub use models::*;
