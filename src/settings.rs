//! Player preferences
//!
//! Persisted separately from stats in LocalStorage.

use serde::{Deserialize, Serialize};

/// Longest display name shown in rooms
pub const MAX_NAME_LEN: usize = 16;

/// On-screen touch buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TouchControls {
    /// Shown when the device reports touch support
    #[default]
    Auto,
    Always,
    Never,
}

impl TouchControls {
    pub fn visible(&self, has_touch: bool) -> bool {
        match self {
            TouchControls::Auto => has_touch,
            TouchControls::Always => true,
            TouchControls::Never => false,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name shown to other players
    pub display_name: String,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    pub touch_controls: TouchControls,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_name: "Kitty".to_string(),
            show_fps: false,
            touch_controls: TouchControls::Auto,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "kitty_courier_settings";

    /// Volume actually applied to sound effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Set the display name, trimmed and cut to `MAX_NAME_LEN`.
    /// Blank names keep the previous one.
    pub fn set_display_name(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.display_name = name.chars().take(MAX_NAME_LEN).collect();
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_silences() {
        let mut settings = Settings::default();
        assert!(settings.effective_sfx_volume() > 0.0);
        settings.muted = true;
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_display_name_trimmed() {
        let mut settings = Settings::default();
        settings.set_display_name("   ");
        assert_eq!(settings.display_name, "Kitty");
        settings.set_display_name("  Sir Whiskers the Magnificent ");
        assert_eq!(settings.display_name.chars().count(), MAX_NAME_LEN);
        assert!(settings.display_name.starts_with("Sir Whiskers"));
    }

    #[test]
    fn test_old_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"show_fps": true}"#).unwrap();
        assert!(settings.show_fps);
        assert_eq!(settings.touch_controls, TouchControls::Auto);
        assert!(settings.touch_controls.visible(true));
        assert!(!settings.touch_controls.visible(false));
    }
}
