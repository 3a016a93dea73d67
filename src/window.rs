use crate::image_source::ImageCandidate;
use crate::screen::{DisplaySurface, Rect};
use tracing::debug;

/// What the windowing toolkit has to provide for a full-screen window.
pub trait Window {
    /// Moves and resizes the window in one step.
    fn place(&mut self, bounds: Rect);
    fn bounds(&self) -> Rect;
    fn set_background(&mut self, image: Option<&ImageCandidate>);
    fn set_visible(&mut self, visible: bool);
    fn set_opacity(&mut self, opacity: f32);
}

/// Toolkit-less window that only tracks and logs what it was asked to show.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    label: String,
    bounds: Rect,
    visible: bool,
}

impl HeadlessWindow {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl Window for HeadlessWindow {
    fn place(&mut self, bounds: Rect) {
        debug!("[{}] placed at {:?}", self.label, bounds);
        self.bounds = bounds;
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_background(&mut self, image: Option<&ImageCandidate>) {
        match image {
            Some(image) => debug!("[{}] background: {}", self.label, image.origin()),
            None => debug!("[{}] background cleared", self.label),
        }
    }

    fn set_visible(&mut self, visible: bool) {
        debug!("[{}] visible: {}", self.label, visible);
        self.visible = visible;
    }

    fn set_opacity(&mut self, opacity: f32) {
        debug!("[{}] opacity: {}", self.label, opacity);
    }
}

pub type SurfaceListener = Box<dyn FnMut(&DisplaySurface)>;

/// A full-screen backdrop bound to exactly one display surface.
///
/// Rebinding is the only way the window's bounds change. Listeners registered
/// through [`SurfaceWindow::on_surface_changed_first`] run before the ones
/// registered through [`SurfaceWindow::on_surface_changed`], synchronously,
/// inside [`SurfaceWindow::move_to_surface`].
pub struct SurfaceWindow {
    window: Box<dyn Window>,
    surface: DisplaySurface,
    background: Option<ImageCandidate>,
    opacity: f32,
    sync_listeners: Vec<SurfaceListener>,
    listeners: Vec<SurfaceListener>,
}

impl SurfaceWindow {
    pub fn new(mut window: Box<dyn Window>, surface: DisplaySurface, opacity: f32) -> Self {
        window.place(surface.bounds);
        window.set_opacity(opacity);
        Self {
            window,
            surface,
            background: None,
            opacity,
            sync_listeners: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    pub fn bounds(&self) -> Rect {
        self.window.bounds()
    }

    pub fn resolution(&self) -> String {
        self.surface.resolution()
    }

    pub fn move_to_surface(&mut self, target: &DisplaySurface) {
        self.window.place(target.bounds);
        self.surface = target.clone();
        debug!("Window bound to {}", self.surface);

        let surface = &self.surface;
        for listener in self.sync_listeners.iter_mut() {
            listener(surface);
        }
        for listener in self.listeners.iter_mut() {
            listener(surface);
        }
    }

    pub fn on_surface_changed_first(&mut self, listener: SurfaceListener) {
        self.sync_listeners.push(listener);
    }

    pub fn on_surface_changed(&mut self, listener: SurfaceListener) {
        self.listeners.push(listener);
    }

    pub fn background(&self) -> Option<&ImageCandidate> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, image: ImageCandidate) {
        self.window.set_background(Some(&image));
        self.background = Some(image);
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if (self.opacity - opacity).abs() > f32::EPSILON {
            self.opacity = opacity;
            self.window.set_opacity(opacity);
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }
}
