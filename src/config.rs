use crate::wallpaper::WallpaperStyle;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub display: DisplayConfig,
    pub wallpaper: WallpaperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub categories: String,
    pub purity: String,
    pub resolutions: String,
    pub order: String,
    pub api_key: Option<String>,
    pub fetch_concurrency: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub primary: Option<String>,
    pub desktop_opacity: f32,
    pub overlay_opacity: f32,
    pub surfaces: Vec<SurfaceConfig>,
}

/// Statically declared surface, used when no compositor can be queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WallpaperConfig {
    pub style: WallpaperStyle,
    pub cache_dir: PathBuf,
    pub transition: String,
    pub transition_duration: u32,
    pub command_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://wallhaven.cc/api/v1/search".to_string(),
            categories: "100".to_string(),
            purity: "100".to_string(),
            resolutions: "1920x1080".to_string(),
            order: "desc".to_string(),
            api_key: None,
            fetch_concurrency: 4,
            timeout_secs: 20,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            primary: None,
            desktop_opacity: 0.1,
            overlay_opacity: 0.75,
            surfaces: vec![SurfaceConfig {
                name: "default".to_string(),
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            }],
        }
    }
}

impl Default for WallpaperConfig {
    fn default() -> Self {
        Self {
            style: WallpaperStyle::Stretched,
            cache_dir: PathBuf::from("~/.cache/desktop2"),
            transition: "simple".to_string(),
            transition_duration: 1,
            command_timeout_secs: 6,
        }
    }
}

impl WallpaperConfig {
    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache_dir.to_string_lossy()).into_owned())
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("desktop2/config.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(PathBuf::from)
            .or_else(Self::default_path)
            .context("Could not determine config path")?;

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = path
            .map(PathBuf::from)
            .or_else(Self::default_path)
            .context("Could not determine config path")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Config saved to {:?}", path);
        Ok(())
    }
}
