//! Configuration file loading and application over CLI defaults.
mod apply;
mod loader;
pub mod types;


pub use apply::apply_config;
pub use loader::{load_config, load_config_file};
