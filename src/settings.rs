//! User settings stored as settings.json in the app data directory

use crate::types::{SortField, SortOrder, View};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,

    // View
    pub view: View,
    pub browse_sort: SortField,
    pub browse_order: SortOrder,

    // Backend
    pub backend_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
            view: View::Browse,
            browse_sort: SortField::CreatedAt,
            browse_order: SortOrder::Desc,
            backend_url: None,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join("settings.json");
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "token-catalog-desk-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = scratch_dir("settings-roundtrip");
        let settings = Settings {
            window_w: Some(1280.0),
            view: View::Manage,
            browse_sort: SortField::Price,
            browse_order: SortOrder::Asc,
            backend_url: Some("https://api.example.com".into()),
            ..Settings::default()
        };
        settings.save(&dir);
        assert_eq!(Settings::load(&dir), settings);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = scratch_dir("settings-broken");
        assert_eq!(Settings::load(&dir), Settings::default());
        std::fs::write(dir.join("settings.json"), "{ not json").unwrap();
        assert_eq!(Settings::load(&dir), Settings::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"view":"Manage"}"#).unwrap();
        assert_eq!(settings.view, View::Manage);
        assert_eq!(settings.browse_sort, SortField::CreatedAt);
        assert_eq!(settings.browse_order, SortOrder::Desc);
    }
}
