use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Client-side state kept between runs.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Prefs {
    pub rolls_show_details: bool,
    pub input_rolls_show_details: bool,
    /// Last `/api/users/me` answer.
    pub session_user: Option<User>,
}

pub fn default_prefs_path() -> Option<PathBuf> {
    Some(super::app_dir()?.join("state.json"))
}

impl Prefs {
    /// A missing or unreadable state file yields the defaults.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                format!(
                    "failed to create state directory '{}': {e}",
                    parent.display()
                )
            })?;
        }
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| format!("failed to encode state: {e}"))?;
        std::fs::write(path, body)
            .map_err(|e| format!("failed to write state file '{}': {e}", path.display()))
    }
}
