use crate::browser::Browser;
use crate::classify::{self, InputAction, InputKind};
use crate::image_source::{self, ImageCandidate, ImageSource, SearchQuery};
use crate::overlay::OverlayWindow;
use crate::screen::ScreenRegistry;
use crate::search::{DOWNLOADING, OPENING, SearchOutcome, SearchPipeline, StatusLabel};
use crate::wallpaper::{WallpaperController, WallpaperStyle};
use crate::window::{SurfaceWindow, Window};
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Which of the two windows an input event was delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Desktop,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// F1..F12
    Function(u8),
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    KeyUp { target: Target, key: Key },
    DoubleClick(Target),
    /// Enter pressed in the search box.
    Submit(String),
    CloseButton,
    ThumbnailEnter(usize),
    ThumbnailLeave,
    ThumbnailClick(usize),
    ThumbnailDoubleClick(usize),
    /// Logs the gallery contents.
    ListGallery,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone)]
pub struct DesktopOptions {
    pub desktop_opacity: f32,
    pub overlay_opacity: f32,
    pub style: WallpaperStyle,
    pub fetch_concurrency: usize,
    /// Apply the first image of the startup search.
    pub random_on_start: bool,
}

/// The desktop backdrop, its search overlay and everything they drive.
/// Lives on the UI task; only the search worker runs elsewhere.
pub struct Desktop {
    screens: ScreenRegistry,
    window: SurfaceWindow,
    overlay: Rc<RefCell<OverlayWindow>>,
    search: SearchPipeline,
    status: StatusLabel,
    gallery: Vec<ImageCandidate>,
    source: Arc<dyn ImageSource>,
    wallpapers: WallpaperController,
    browser: Box<dyn Browser>,
    style: WallpaperStyle,
    desktop_opacity: f32,
    apply_first_result: bool,
}

impl Desktop {
    /// Builds both windows on the primary surface and kicks off a random
    /// search to fill the gallery. Must run inside a tokio runtime.
    pub fn new(
        screens: ScreenRegistry,
        desktop_window: Box<dyn Window>,
        overlay_window: Box<dyn Window>,
        source: Arc<dyn ImageSource>,
        wallpapers: WallpaperController,
        browser: Box<dyn Browser>,
        options: DesktopOptions,
    ) -> Self {
        let primary = screens.primary().clone();
        let mut window = SurfaceWindow::new(desktop_window, primary, options.desktop_opacity);
        let overlay = OverlayWindow::attach(&mut window, overlay_window, options.overlay_opacity);
        window.set_visible(true);

        let mut status = StatusLabel::default();
        let mut search = SearchPipeline::spawn(source.clone(), options.fetch_concurrency);
        search.start(SearchQuery::Random, &mut status);

        info!("{}", overlay.borrow().title());

        Self {
            screens,
            window,
            overlay,
            search,
            status,
            gallery: Vec::new(),
            source,
            wallpapers,
            browser,
            style: options.style,
            desktop_opacity: options.desktop_opacity,
            apply_first_result: options.random_on_start,
        }
    }

    pub fn window(&self) -> &SurfaceWindow {
        &self.window
    }

    pub fn overlay(&self) -> &Rc<RefCell<OverlayWindow>> {
        &self.overlay
    }

    pub fn status(&self) -> &StatusLabel {
        &self.status
    }

    pub fn gallery(&self) -> &[ImageCandidate] {
        &self.gallery
    }

    pub fn wallpapers(&self) -> &WallpaperController {
        &self.wallpapers
    }

    /// Single entry point for input delivered to either window.
    pub async fn handle(&mut self, event: UiEvent) -> Flow {
        debug!("Event: {:?}", event);

        match event {
            UiEvent::KeyUp { target, key: Key::Function(n) } => self.switch_surface(target, n),
            UiEvent::KeyUp { target: Target::Overlay, key: Key::Escape } => {
                self.overlay.borrow_mut().hide();
            }
            UiEvent::KeyUp { target: Target::Desktop, key: Key::Escape } => {}
            UiEvent::DoubleClick(Target::Desktop) => {
                self.overlay.borrow_mut().show();
            }
            UiEvent::DoubleClick(Target::Overlay) => {
                self.overlay.borrow_mut().hide();
            }
            UiEvent::CloseButton => {
                if !self.overlay.borrow_mut().hide() {
                    info!("Closing desktop");
                    return Flow::Exit;
                }
            }
            UiEvent::Submit(text) => self.submit(&text).await,
            UiEvent::ThumbnailEnter(_) => self.window.set_opacity(1.0),
            UiEvent::ThumbnailLeave => self.window.set_opacity(self.desktop_opacity),
            UiEvent::ThumbnailClick(index) => {
                if let Some(image) = self.gallery.get(index).cloned() {
                    self.wallpapers.preview(&mut self.window, image);
                }
            }
            UiEvent::ThumbnailDoubleClick(index) => {
                if let Some(image) = self.gallery.get(index).cloned() {
                    self.set_wallpaper(image).await;
                }
            }
            UiEvent::ListGallery => {
                if self.gallery.is_empty() {
                    info!("Gallery is empty ({})", self.status.text());
                }
                for (i, image) in self.gallery.iter().enumerate() {
                    info!("  [{}] {}", i, image.origin());
                }
            }
            UiEvent::Quit => return Flow::Exit,
        }

        Flow::Continue
    }

    fn switch_surface(&mut self, target: Target, key: u8) {
        if !(1..=12).contains(&key) {
            return;
        }

        let surface = self.screens.select_by_index(key as usize).clone();
        info!("F{} -> {:?} on {}", key, target, surface);
        match target {
            Target::Desktop => self.window.move_to_surface(&surface),
            Target::Overlay => self.overlay.borrow_mut().window_mut().move_to_surface(&surface),
        }
        debug!("{}", self.overlay.borrow().title());
    }

    async fn submit(&mut self, text: &str) {
        let Some(kind) = classify::classify(text) else {
            return;
        };

        let status = match &kind {
            InputKind::LocalFile(_) => Some(OPENING),
            InputKind::VideoLink(_) | InputKind::WebLink(_) => Some(DOWNLOADING),
            InputKind::SearchTerm(_) => None,
        };
        if let Some(label) = status {
            self.status.set(label);
        }

        let action = classify::resolve(kind, self.source.as_ref()).await;
        self.perform(action).await;

        if status.is_some() {
            self.status.reset();
        }
    }

    async fn perform(&mut self, action: InputAction) {
        match action {
            InputAction::OpenFile(path) => match image_source::load_file(&path) {
                Ok(image) => self.set_wallpaper(image).await,
                Err(e) => warn!("Failed to open wallpaper: {}", e),
            },
            InputAction::ApplyImage(image) => self.set_wallpaper(image).await,
            InputAction::OpenVideo(url) | InputAction::OpenLink(url) => self.browse(&url),
            InputAction::Search(query) => {
                if !self.search.start(query, &mut self.status) {
                    info!("Search already running, ignoring");
                }
            }
        }
    }

    /// Applies to the desktop and dismisses the overlay.
    async fn set_wallpaper(&mut self, image: ImageCandidate) {
        self.wallpapers
            .apply(&mut self.window, image, self.style)
            .await
            .ok();
        self.overlay.borrow_mut().hide();
    }

    fn browse(&mut self, url: &str) {
        self.window.set_opacity(1.0);
        if let Err(e) = self.browser.open(url) {
            warn!("Failed to open {}: {}", url, e);
        }
    }

    /// Hands finished search results to the gallery.
    pub async fn deliver(&mut self, outcome: SearchOutcome) {
        let Some(results) = self.search.complete(outcome, &mut self.status) else {
            return;
        };
        self.gallery = results;

        if std::mem::take(&mut self.apply_first_result) {
            match self.gallery.first().cloned() {
                Some(first) => {
                    self.wallpapers
                        .apply(&mut self.window, first, self.style)
                        .await
                        .ok();
                }
                None => warn!("No wallpapers found for startup"),
            }
        }
    }

    /// Runs until the input channel closes, the desktop is closed or ctrl-c.
    pub async fn run(mut self, mut events: mpsc::Receiver<UiEvent>) -> Result<()> {
        loop {
            tokio::select! {
                Some(outcome) = self.search.next_outcome() => {
                    self.deliver(outcome).await;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        if self.handle(event).await == Flow::Exit {
                            break;
                        }
                    }
                    None => {
                        info!("Input closed");
                        break;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Shutting down...");
        Ok(())
    }
}
