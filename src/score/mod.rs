pub mod config;
pub mod files;

pub use config::{ConfigError, Orchestra, OrchestraConfig, UnitSpec};
