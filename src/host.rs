//! Viewport events supplied by the hosting page.

use crate::error::MountError;

pub type ResizeHandler = Box<dyn FnMut(u32, u32)>;
pub type ScrollHandler = Box<dyn FnMut(f64)>;

/// Registered event handler. Dropping the guard deregisters it.
#[must_use = "dropping a Subscription deregisters the handler"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Deregister now rather than at drop.
    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

/// The window the engines are mounted in.
pub trait Viewport {
    /// Current inner size in CSS pixels.
    fn inner_size(&self) -> (u32, u32);

    /// Call `handler` with the new inner size on every resize.
    fn on_resize(&self, handler: ResizeHandler) -> Result<Subscription, MountError>;

    /// Call `handler` with the vertical scroll offset on every scroll.
    fn on_scroll(&self, handler: ScrollHandler) -> Result<Subscription, MountError>;
}
