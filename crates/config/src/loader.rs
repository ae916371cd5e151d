use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::PorteroConfig};

const CONFIG_FILENAME: &str = "portero.toml";

/// Load config from the given path, with `${ENV}` substitution.
pub fn load_config(path: &Path) -> anyhow::Result<PorteroConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let cfg = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(cfg)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./portero.toml` (project-local)
/// 2. `~/.config/portero/portero.toml` (user-global)
pub fn discover_and_load() -> anyhow::Result<PorteroConfig> {
    match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => anyhow::bail!("no {CONFIG_FILENAME} found in ./ or the user config dir"),
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(dir) = config_dir() {
        let p = dir.join(CONFIG_FILENAME);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

/// The user-global config directory (`~/.config/portero/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "portero").map(|d| d.config_dir().to_path_buf())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let raw = r#"
            bot_name = "portero"
            environment = "staging"
            db_path = "test.db"
            startup_notify_numbers = ["5215511111111", "5215522222222"]

            [door]
            api_base = "http://door.local"

            [cameras]
            visits_rtsp = "rtsp://cam/1"
            pedestrian_rtsp = "rtsp://cam/2"
            front_door_rtsp = "rtsp://cam/3"
        "#;
        let cfg: PorteroConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.bot_name, "portero");
        assert_eq!(cfg.startup_notify_numbers.len(), 2);
        assert!(cfg.missing_required().is_empty());
    }

    #[test]
    fn partial_document_defaults_the_rest() {
        let cfg: PorteroConfig = toml::from_str("bot_name = \"p\"").unwrap();
        assert!(cfg.db_path.is_empty());
        assert!(cfg.missing_required().contains(&"door.api_base"));
    }
}
