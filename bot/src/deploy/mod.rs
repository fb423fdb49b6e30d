//! Deployment orchestration

pub mod auto;
pub mod command;
pub mod committer;
pub mod lock;
pub mod reconcile;
