use crate::error::{PhotoOnboardError, Result};
use photo_onboard_common::layout::DEFAULT_JPEG_QUALITY;
use photo_onboard_common::{CollisionPolicy, ExportOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub jpeg_quality: u8,
    pub collision_policy: CollisionPolicy,
    pub default_palette: u8,
    pub item_timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            collision_policy: CollisionPolicy::Overwrite,
            default_palette: 1,
            item_timeout_seconds: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &std::path::Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotoOnboardError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-onboard").join("config.json"))
    }

    fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PhotoOnboardError::Config(format!(
                "jpeg_quality は 1〜100 で指定してください: {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    pub fn set_default_palette(&mut self, id: u8) -> Result<()> {
        if !(1..=3).contains(&id) {
            return Err(PhotoOnboardError::Config(format!("パレットIDは 1〜3 です: {}", id)));
        }
        self.default_palette = id;
        self.save()
    }

    pub fn set_collision_policy(&mut self, policy: CollisionPolicy) -> Result<()> {
        self.collision_policy = policy;
        self.save()
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_seconds.map(Duration::from_secs)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            collision: self.collision_policy,
        }
    }
}
