use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

#[derive(Clone)]
pub struct HyprlandIPC {
    socket_path: PathBuf,
}

impl HyprlandIPC {
    pub fn new() -> Result<Self> {
        let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
            .context("HYPRLAND_INSTANCE_SIGNATURE not set. Are you running under Hyprland?")?;

        let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
            .unwrap_or_else(|_| format!("/run/user/{}", users::get_current_uid()));

        let socket_path = PathBuf::from(runtime_dir)
            .join("hypr")
            .join(his)
            .join(".socket.sock");

        if !socket_path.exists() {
            anyhow::bail!("Hyprland socket not found at {:?}", socket_path);
        }

        Ok(Self { socket_path })
    }

    pub async fn dispatch(&self, command: &str) -> Result<String> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .context("Failed to connect to Hyprland socket")?;

        stream.write_all(command.as_bytes()).await?;
        stream.flush().await?;

        let mut response = String::new();
        stream.read_to_string(&mut response).await?;

        Ok(response)
    }

    pub async fn dispatch_json(&self, command: &str) -> Result<String> {
        let cmd = format!("j/{}", command);
        self.dispatch(&cmd).await
    }

    pub async fn get_monitors(&self) -> Result<Vec<Monitor>> {
        let response = self.dispatch_json("monitors").await?;
        parse_monitors(&response)
    }
}

pub fn parse_monitors(json: &str) -> Result<Vec<Monitor>> {
    serde_json::from_str(json).context("Failed to parse monitors JSON")
}

#[derive(Debug, Clone, Deserialize)]
pub struct Monitor {
    pub id: i32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub transform: i32,
    #[serde(default)]
    pub focused: bool,
}

fn default_scale() -> f32 {
    1.0
}

impl Monitor {
    /// Size in layout coordinates: scaled, and swapped for 90/270 degree transforms.
    pub fn logical_size(&self) -> (u32, u32) {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let width = (self.width as f32 / scale).round() as u32;
        let height = (self.height as f32 / scale).round() as u32;

        match self.transform {
            1 | 3 | 5 | 7 => (height, width),
            _ => (width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITORS: &str = r#"[
        {"id": 1, "name": "HDMI-A-1", "description": "x", "width": 1920, "height": 1080,
         "refreshRate": 60.0, "x": 2560, "y": 0, "scale": 1.0, "transform": 1, "focused": false},
        {"id": 0, "name": "DP-1", "description": "y", "width": 3840, "height": 2160,
         "refreshRate": 144.0, "x": 0, "y": 0, "scale": 1.5, "transform": 0, "focused": true}
    ]"#;

    #[test]
    fn test_parse_monitors() {
        let monitors = parse_monitors(MONITORS).unwrap();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[1].name, "DP-1");
        assert!(monitors[1].focused);
    }

    #[test]
    fn test_logical_size() {
        let monitors = parse_monitors(MONITORS).unwrap();
        assert_eq!(monitors[0].logical_size(), (1080, 1920));
        assert_eq!(monitors[1].logical_size(), (2560, 1440));
    }

    #[tokio::test]
    #[ignore] // Only run in Hyprland environment
    async fn test_get_monitors() {
        let ipc = HyprlandIPC::new().unwrap();
        let monitors = ipc.get_monitors().await.unwrap();
        assert!(!monitors.is_empty());
    }
}
