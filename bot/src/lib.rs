//! Deploybot Library
//!
//! Core modules for the GitHub deployment bot: webhook intake, repository
//! deploy configuration, and deployment orchestration.

pub mod app;
pub mod config;
pub mod context;
pub mod deploy;
pub mod errors;
pub mod events;
pub mod github;
pub mod logs;
pub mod server;
pub mod storage;
pub mod template;
pub mod utils;
