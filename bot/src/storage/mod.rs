//! Persisted bot settings

pub mod settings;
