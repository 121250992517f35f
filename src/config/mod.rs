//! Configuration system — YAML config files, environment overrides.

pub mod loader;
pub mod schema;

// Re-export the most commonly used items.
pub use loader::load_config;
pub use schema::TaskdeckConfig;
