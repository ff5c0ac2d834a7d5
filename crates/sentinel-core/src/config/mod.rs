//! Layered `sentinel.toml` configuration.
//!
//! The global layer holds per-user defaults; the project layer lives in the
//! target repository and overrides it. Command-line flags override both.

pub mod merge;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use merge::merge_configs;
pub use parser::{parse_sentinel_toml, parse_sentinel_toml_str};
pub use paths::{CONFIG_FILE_NAME, ConfigLayer, config_path_for_layer};
pub use schema::SentinelConfig;
pub use store::ConfigStore;
