//! Per-repository deployment configuration

pub mod resolver;
pub mod schema;
pub mod target;

pub use resolver::{parse_config, resolve_config, Config, CONFIG_PATH};
pub use target::Target;
