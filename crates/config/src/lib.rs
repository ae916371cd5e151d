//! Configuration loading, validation, and env substitution.
//!
//! Config file: `portero.toml`, searched in `./` then `~/.config/portero/`.
//! Supports `${ENV_VAR}` substitution in the raw file contents.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{CameraUrls, DoorConfig, PorteroConfig},
};
