pub mod app;
pub mod browser;
pub mod classify;
pub mod config;
pub mod console;
pub mod error;
pub mod hyprland_ipc;
pub mod image_source;
pub mod overlay;
pub mod screen;
pub mod search;
pub mod state;
pub mod wallhaven;
pub mod wallpaper;
pub mod window;

pub use app::{Desktop, DesktopOptions, Flow, UiEvent};
pub use config::Config;
pub use hyprland_ipc::HyprlandIPC;
pub use screen::{DisplaySurface, ScreenRegistry};
pub use search::SearchPipeline;
pub use wallpaper::{WallpaperController, WallpaperStyle};
