use crate::wallpaper::WallpaperStyle;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Last wallpaper handed to the system.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppliedWallpaper {
    pub path: PathBuf,
    pub style: WallpaperStyle,
    pub applied_at: DateTime<Local>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct State {
    pub current: Option<AppliedWallpaper>,
}

pub fn default_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|p| p.join("desktop2/state.toml"))
}

pub fn load_state(path: &Path) -> Result<State> {
    if !path.exists() {
        return Ok(State::default());
    }

    let content = fs::read_to_string(path)?;
    // a corrupt state file is not worth failing over
    let state: State = toml::from_str(&content).unwrap_or_default();
    Ok(state)
}

pub fn save_state(path: &Path, state: &State) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml_string = toml::to_string_pretty(state)?;
    fs::write(path, toml_string).with_context(|| format!("Failed to write state: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        assert_eq!(load_state(&path).unwrap(), State::default());

        let state = State {
            current: Some(AppliedWallpaper {
                path: PathBuf::from("/tmp/wallpaper.bmp"),
                style: WallpaperStyle::Centered,
                applied_at: Local::now(),
            }),
        };
        save_state(&path, &state).unwrap();

        let loaded = load_state(&path).unwrap();
        let current = loaded.current.unwrap();
        assert_eq!(current.path, PathBuf::from("/tmp/wallpaper.bmp"));
        assert_eq!(current.style, WallpaperStyle::Centered);
    }

    #[test]
    fn test_corrupt_state_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, "current = [[[").unwrap();
        assert_eq!(load_state(&path).unwrap(), State::default());
    }
}
