//! Profile loading, saving and initialization.
mod init;
mod loader;
pub mod types;


pub use init::build_init_config;
pub use loader::{load_config, resolve_config_path, save_config};
