use crate::config::WallpaperConfig;
use crate::error::ApplyError;
use crate::image_source::ImageCandidate;
use crate::screen::Rect;
use crate::state::{self, AppliedWallpaper, State};
use crate::window::SurfaceWindow;
use futures::FutureExt;
use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallpaperStyle {
    Tiled,
    Centered,
    #[default]
    Stretched,
}

/// The pair of system settings a style translates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleParams {
    pub wallpaper_style: u8,
    pub tile: bool,
}

impl WallpaperStyle {
    pub fn params(self) -> StyleParams {
        match self {
            Self::Stretched => StyleParams { wallpaper_style: 2, tile: false },
            Self::Centered => StyleParams { wallpaper_style: 1, tile: false },
            Self::Tiled => StyleParams { wallpaper_style: 1, tile: true },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyFlags {
    pub update_persisted_config: bool,
    pub notify_live_session: bool,
}

impl ApplyFlags {
    pub const ALL: ApplyFlags = ApplyFlags {
        update_persisted_config: true,
        notify_live_session: true,
    };
}

/// The system-level wallpaper setter.
pub trait WallpaperSink {
    fn set<'a>(
        &'a self,
        path: &'a Path,
        style: WallpaperStyle,
        flags: ApplyFlags,
    ) -> BoxFuture<'a, Result<(), ApplyError>>;
}

/// Sets the wallpaper through the `swww` daemon.
pub struct SwwwSink {
    transition: String,
    transition_duration: u32,
    command_timeout: Duration,
    state_path: Option<PathBuf>,
}

impl SwwwSink {
    pub fn new(config: &WallpaperConfig) -> Self {
        Self {
            transition: config.transition.clone(),
            transition_duration: config.transition_duration,
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            state_path: state::default_path(),
        }
    }

    fn resize_mode(params: StyleParams) -> &'static str {
        // tiled images arrive already tiled to the surface size
        match params {
            StyleParams { tile: true, .. } => "no",
            StyleParams { wallpaper_style: 2, .. } => "stretch",
            _ => "no",
        }
    }

    async fn run_swww(&self, path: &Path, params: StyleParams) -> Result<(), ApplyError> {
        info!("Setting wallpaper: {:?}", path);

        let duration = self.transition_duration.to_string();
        let cmd = Command::new("swww")
            .arg("img")
            .arg(path)
            .args([
                "--resize",
                Self::resize_mode(params),
                "--transition-type",
                self.transition.as_str(),
                "--transition-duration",
                duration.as_str(),
            ])
            .output();

        let output = match timeout(self.command_timeout, cmd).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ApplyError::Os(format!(
                    "failed to execute swww, is the daemon running? ({})",
                    e
                )));
            }
            Err(_) => return Err(ApplyError::Timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApplyError::Os(format!("swww command failed: {}", stderr.trim())));
        }

        Ok(())
    }

    fn record(&self, path: &Path, style: WallpaperStyle) -> Result<(), ApplyError> {
        let Some(state_path) = &self.state_path else {
            return Ok(());
        };

        let state = State {
            current: Some(AppliedWallpaper {
                path: path.to_path_buf(),
                style,
                applied_at: chrono::Local::now(),
            }),
        };

        state::save_state(state_path, &state).map_err(|e| ApplyError::Os(format!("{:#}", e)))
    }
}

impl WallpaperSink for SwwwSink {
    fn set<'a>(
        &'a self,
        path: &'a Path,
        style: WallpaperStyle,
        flags: ApplyFlags,
    ) -> BoxFuture<'a, Result<(), ApplyError>> {
        async move {
            if flags.notify_live_session {
                self.run_swww(path, style.params()).await?;
            }
            if flags.update_persisted_config {
                self.record(path, style)?;
            }
            Ok(())
        }
        .boxed()
    }
}

/// Tracks what is rendered and what the system has been told to show.
pub struct WallpaperController {
    sink: Box<dyn WallpaperSink>,
    cache_dir: PathBuf,
    applied: Option<ImageCandidate>,
}

impl WallpaperController {
    pub fn new(sink: Box<dyn WallpaperSink>, cache_dir: PathBuf) -> Self {
        Self {
            sink,
            cache_dir,
            applied: None,
        }
    }

    /// The wallpaper the system last accepted.
    pub fn applied(&self) -> Option<&ImageCandidate> {
        self.applied.as_ref()
    }

    pub fn preview(&self, window: &mut SurfaceWindow, image: ImageCandidate) {
        debug!("Previewing {}", image.origin());
        window.set_background(image);
    }

    /// Renders `image` on `window` right away, then hands it to the system.
    /// A failing system step leaves the render in place and the previously
    /// applied wallpaper recorded as current.
    pub async fn apply(
        &mut self,
        window: &mut SurfaceWindow,
        image: ImageCandidate,
        style: WallpaperStyle,
    ) -> Result<(), ApplyError> {
        window.set_background(image.clone());

        match self.persist(&image, style, window.surface().bounds).await {
            Ok(()) => {
                info!("Wallpaper applied: {} ({:?})", image.origin(), style);
                self.applied = Some(image);
                Ok(())
            }
            Err(e) => {
                error!("Failed to set wallpaper: {}", e);
                Err(e)
            }
        }
    }

    async fn persist(
        &self,
        image: &ImageCandidate,
        style: WallpaperStyle,
        bounds: Rect,
    ) -> Result<(), ApplyError> {
        std::fs::create_dir_all(&self.cache_dir)?;
        let path = self.cache_dir.join("wallpaper.bmp");

        let encoded = image.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || encode(encoded.image(), style, bounds, &target))
            .await
            .map_err(|e| ApplyError::Os(format!("encoder task failed: {}", e)))??;

        self.sink.set(&path, style, ApplyFlags::ALL).await
    }
}

fn encode(
    image: &DynamicImage,
    style: WallpaperStyle,
    bounds: Rect,
    path: &Path,
) -> Result<(), ApplyError> {
    let rgb = image.to_rgb8();
    let rgb = if style.params().tile {
        tile_to(&rgb, bounds.width, bounds.height)
    } else {
        rgb
    };

    rgb.save_with_format(path, ImageFormat::Bmp)
        .map_err(|e| ApplyError::Encode {
            path: path.to_path_buf(),
            source: e,
        })
}

fn tile_to(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(width.max(1), height.max(1));
    image::imageops::tile(&mut canvas, image);
    canvas
}
