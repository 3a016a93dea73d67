use crate::config::SurfaceConfig;
use crate::error::ScreenError;
use crate::hyprland_ipc::{HyprlandIPC, Monitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Snapshot of one monitor taken at enumeration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySurface {
    pub id: i32,
    pub name: String,
    pub bounds: Rect,
    pub is_primary: bool,
}

impl DisplaySurface {
    /// `{width}x{height}` of the surface.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.bounds.width, self.bounds.height)
    }
}

impl fmt::Display for DisplaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} at {},{})",
            self.name,
            self.resolution(),
            self.bounds.x,
            self.bounds.y
        )
    }
}

/// Ordered set of surfaces, computed once at startup. Never empty.
#[derive(Debug, Clone)]
pub struct ScreenRegistry {
    screens: Vec<DisplaySurface>,
    primary: usize,
}

impl ScreenRegistry {
    pub fn new(screens: Vec<DisplaySurface>) -> Result<Self, ScreenError> {
        if screens.is_empty() {
            return Err(ScreenError::NoSurfaces);
        }

        let primary = screens.iter().position(|s| s.is_primary).unwrap_or(0);
        Ok(Self { screens, primary })
    }

    /// Enumerates Hyprland monitors, falling back to the statically configured
    /// surfaces when the compositor cannot be reached.
    pub async fn detect(
        primary: Option<&str>,
        fallback: &[SurfaceConfig],
    ) -> Result<Self, ScreenError> {
        let monitors = match hyprland_monitors().await {
            Ok(monitors) => monitors,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        };

        let screens = if monitors.is_empty() {
            info!("Using {} configured fallback surface(s)", fallback.len());
            from_config(fallback, primary)
        } else {
            from_monitors(monitors, primary)
        };

        let registry = Self::new(screens)?;
        for surface in registry.enumerate() {
            debug!("Surface {}: {} at {:?}", surface.id, surface, surface.bounds);
        }
        info!(
            "Enumerated {} surface(s), primary: {}",
            registry.len(),
            registry.primary()
        );
        Ok(registry)
    }

    pub fn enumerate(&self) -> &[DisplaySurface] {
        &self.screens
    }

    pub fn primary(&self) -> &DisplaySurface {
        &self.screens[self.primary]
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Maps a function-key number to a surface. Indices at or beyond the
    /// surface count wrap around, so F1 on a single monitor stays put and
    /// F4 on three monitors lands on the second one.
    pub fn select_by_index(&self, index: usize) -> &DisplaySurface {
        let count = self.screens.len();
        if index < count {
            &self.screens[index]
        } else {
            &self.screens[index % count]
        }
    }
}

async fn hyprland_monitors() -> Result<Vec<Monitor>, ScreenError> {
    let ipc = HyprlandIPC::new()?;
    Ok(ipc.get_monitors().await?)
}

fn mark_primary(screens: &mut [DisplaySurface], preferred: Option<&str>) {
    let chosen = preferred
        .and_then(|name| screens.iter().position(|s| s.name == name))
        .or_else(|| {
            screens
                .iter()
                .position(|s| s.bounds.x == 0 && s.bounds.y == 0)
        })
        .unwrap_or(0);

    for (i, screen) in screens.iter_mut().enumerate() {
        screen.is_primary = i == chosen;
    }
}

fn from_monitors(mut monitors: Vec<Monitor>, primary: Option<&str>) -> Vec<DisplaySurface> {
    monitors.sort_by_key(|m| m.id);

    let mut screens: Vec<DisplaySurface> = monitors
        .into_iter()
        .map(|m| {
            let (width, height) = m.logical_size();
            DisplaySurface {
                id: m.id,
                name: m.name,
                bounds: Rect::new(m.x, m.y, width, height),
                is_primary: false,
            }
        })
        .collect();

    mark_primary(&mut screens, primary);
    screens
}

fn from_config(surfaces: &[SurfaceConfig], primary: Option<&str>) -> Vec<DisplaySurface> {
    let mut screens: Vec<DisplaySurface> = surfaces
        .iter()
        .enumerate()
        .map(|(i, s)| DisplaySurface {
            id: i as i32,
            name: s.name.clone(),
            bounds: Rect::new(s.x, s.y, s.width, s.height),
            is_primary: false,
        })
        .collect();

    mark_primary(&mut screens, primary);
    screens
}

#[cfg(test)]
pub(crate) fn test_surfaces(count: usize) -> Vec<DisplaySurface> {
    (0..count)
        .map(|i| DisplaySurface {
            id: i as i32,
            name: format!("OUT-{}", i),
            bounds: Rect::new(1920 * i as i32, 0, 1920 + i as u32, 1080 + i as u32),
            is_primary: i == 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_is_fatal() {
        assert!(matches!(
            ScreenRegistry::new(Vec::new()),
            Err(ScreenError::NoSurfaces)
        ));
    }

    #[test]
    fn test_select_by_index_wraps_around() {
        let registry = ScreenRegistry::new(test_surfaces(3)).unwrap();
        let picked: Vec<i32> = (0..8).map(|i| registry.select_by_index(i).id).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_select_by_index_single_surface() {
        let registry = ScreenRegistry::new(test_surfaces(1)).unwrap();
        for i in 0..5 {
            assert_eq!(registry.select_by_index(i).id, 0);
        }
    }

    #[test]
    fn test_resolution_format() {
        let surface = &test_surfaces(1)[0];
        assert_eq!(surface.resolution(), "1920x1080");
    }

    #[test]
    fn test_primary_prefers_configured_name() {
        let surfaces = vec![
            SurfaceConfig { name: "DP-1".into(), x: 0, y: 0, width: 2560, height: 1440 },
            SurfaceConfig { name: "HDMI-A-1".into(), x: 2560, y: 0, width: 1920, height: 1080 },
        ];

        let registry = ScreenRegistry::new(from_config(&surfaces, Some("HDMI-A-1"))).unwrap();
        assert_eq!(registry.primary().name, "HDMI-A-1");

        let registry = ScreenRegistry::new(from_config(&surfaces, None)).unwrap();
        assert_eq!(registry.primary().name, "DP-1");
    }

    #[test]
    fn test_primary_falls_back_to_origin() {
        let surfaces = vec![
            SurfaceConfig { name: "right".into(), x: 1920, y: 0, width: 1920, height: 1080 },
            SurfaceConfig { name: "left".into(), x: 0, y: 0, width: 1920, height: 1080 },
        ];
        let registry = ScreenRegistry::new(from_config(&surfaces, Some("missing"))).unwrap();
        assert_eq!(registry.primary().name, "left");
        assert_eq!(registry.enumerate().iter().filter(|s| s.is_primary).count(), 1);
    }
}
