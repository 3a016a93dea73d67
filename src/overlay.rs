use crate::screen::DisplaySurface;
use crate::window::{SurfaceWindow, Window};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// Secondary full-screen window that stays on whatever surface its owner is
/// bound to. The owner keeps only a weak handle to it.
pub struct OverlayWindow {
    surface: SurfaceWindow,
    visibility: Visibility,
}

impl OverlayWindow {
    /// Creates the overlay on the owner's current surface and hooks it into the
    /// owner's surface-change notification ahead of every other listener.
    pub fn attach(
        owner: &mut SurfaceWindow,
        window: Box<dyn Window>,
        opacity: f32,
    ) -> Rc<RefCell<OverlayWindow>> {
        let mut surface = SurfaceWindow::new(window, owner.surface().clone(), opacity);
        surface.set_visible(false);

        let overlay = Rc::new(RefCell::new(OverlayWindow {
            surface,
            visibility: Visibility::Hidden,
        }));

        let weak: Weak<RefCell<OverlayWindow>> = Rc::downgrade(&overlay);
        owner.on_surface_changed_first(Box::new(move |target: &DisplaySurface| {
            if let Some(overlay) = weak.upgrade() {
                overlay.borrow_mut().sync_to(target);
            }
        }));

        overlay
    }

    fn sync_to(&mut self, target: &DisplaySurface) {
        debug!("Overlay following owner to {}", target);
        self.surface.move_to_surface(target);
    }

    pub fn window(&self) -> &SurfaceWindow {
        &self.surface
    }

    pub fn window_mut(&mut self) -> &mut SurfaceWindow {
        &mut self.surface
    }

    pub fn surface(&self) -> &DisplaySurface {
        self.surface.surface()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// Returns whether the visibility actually changed.
    pub fn show(&mut self) -> bool {
        self.set_visibility(Visibility::Visible)
    }

    pub fn hide(&mut self) -> bool {
        self.set_visibility(Visibility::Hidden)
    }

    fn set_visibility(&mut self, visibility: Visibility) -> bool {
        if self.visibility == visibility {
            return false;
        }

        info!("Overlay {:?}", visibility);
        self.visibility = visibility;
        self.surface.set_visible(visibility == Visibility::Visible);
        true
    }

    /// Header text shown on the overlay.
    pub fn title(&self) -> String {
        format!("Desktop2 ({})", self.surface.resolution())
    }
}
