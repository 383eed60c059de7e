//! # Primitives
//!
//! Hardcoded limits for the composite graph. They protect the process itself
//! and are not configurable.

/// Maximum size of a configuration file (1 MB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Environment variable consulted by `CompositeConfig::from_env`.
pub const CONFIG_PATH_ENV: &str = "COMPOSITE_CONFIG";
