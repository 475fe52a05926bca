//! Desktop boot configuration, loadable from TOML or JSON.

use platform_host::VfsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    model::{DesktopViewport, PlacementConfig},
    session::SessionConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML desktop config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON desktop config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Every knob the desktop host reads at boot. Missing sections and fields take their defaults.
pub struct DesktopConfig {
    pub viewport: DesktopViewport,
    pub placement: PlacementConfig,
    pub vfs: VfsConfig,
    pub session: SessionConfig,
}

impl DesktopConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_sources_yield_defaults() {
        assert_eq!(
            DesktopConfig::from_toml_str("").expect("toml"),
            DesktopConfig::default()
        );
        assert_eq!(
            DesktopConfig::from_json_str("{}").expect("json"),
            DesktopConfig::default()
        );
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = DesktopConfig::from_toml_str(
            r#"
            [viewport]
            width = 1920
            height = 1080

            [placement]
            cascade_step = 32

            [session]
            restore_on_boot = false
            "#,
        )
        .expect("toml");

        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.viewport.top_inset, DesktopViewport::default().top_inset);
        assert_eq!(config.placement.cascade_step, 32);
        assert_eq!(config.placement.min_width, PlacementConfig::default().min_width);
        assert!(!config.session.restore_on_boot);
        assert_eq!(config.vfs, VfsConfig::default());
    }

    #[test]
    fn json_vfs_section_is_honored() {
        let config = DesktopConfig::from_json_str(
            r#"{ "vfs": { "home_directory": "/home/guest", "autosave_interval_ms": 5000 } }"#,
        )
        .expect("json");
        assert_eq!(config.vfs.home_directory, "/home/guest");
        assert_eq!(config.vfs.autosave_interval_ms, 5000);
    }

    #[test]
    fn wrong_types_are_reported() {
        assert!(matches!(
            DesktopConfig::from_toml_str("[viewport]\nwidth = \"wide\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            DesktopConfig::from_json_str("{ \"session\": 3 }"),
            Err(ConfigError::Json(_))
        ));
    }
}
