use serde::{Deserialize, Serialize};

/// Top-level portero configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PorteroConfig {
    /// Display name used in the startup banner.
    pub bot_name: String,
    /// Deployment environment label (shown in the startup banner).
    pub environment: String,
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Numbers bootstrapped as admins and notified at startup.
    pub startup_notify_numbers: Vec<String>,
    pub door: DoorConfig,
    pub cameras: CameraUrls,
}

/// Door actuator endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Base URL of the door service, without a trailing slash.
    pub api_base: String,
}

/// RTSP sources for the capture service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraUrls {
    pub visits_rtsp: String,
    pub pedestrian_rtsp: String,
    pub front_door_rtsp: String,
}

impl PorteroConfig {
    /// Check that every value the runtime depends on is present.
    ///
    /// Returns the list of missing field names so startup can report them
    /// all at once instead of failing one variable at a time.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.db_path.trim().is_empty() {
            missing.push("db_path");
        }
        if self.bot_name.trim().is_empty() {
            missing.push("bot_name");
        }
        if self.door.api_base.trim().is_empty() {
            missing.push("door.api_base");
        }
        if self.cameras.visits_rtsp.trim().is_empty() {
            missing.push("cameras.visits_rtsp");
        }
        if self.cameras.pedestrian_rtsp.trim().is_empty() {
            missing.push("cameras.pedestrian_rtsp");
        }
        if self.cameras.front_door_rtsp.trim().is_empty() {
            missing.push("cameras.front_door_rtsp");
        }
        missing
    }

    /// Door base URL with any trailing slash stripped.
    #[must_use]
    pub fn door_api_base(&self) -> &str {
        self.door.api_base.trim_end_matches('/')
    }
}
