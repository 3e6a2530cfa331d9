pub mod env;
pub mod loader;
pub mod types;

pub use loader::{discover_config_file, load_config, resolve_config};
pub use types::{ClientConfig, ConfigFile};
