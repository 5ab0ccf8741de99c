pub mod loader;

pub use loader::{load_config, load_config_layered, load_config_str, validate_config};
