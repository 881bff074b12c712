//! Page scroll offset shared by both engines.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::MountError;
use crate::host::{Subscription, Viewport};

/// Read side of the scroll offset. Cloning shares the same value.
///
/// Starts at 0 and holds the raw offset of the latest scroll event, with no
/// smoothing. Only [`ScrollTracker`] writes it.
#[derive(Debug, Clone, Default)]
pub struct ScrollSignal(Rc<Cell<f64>>);

impl ScrollSignal {
    pub fn get(&self) -> f64 {
        self.0.get()
    }

    fn set(&self, offset: f64) {
        self.0.set(offset);
    }
}

/// Owns the single scroll subscription and the signal it feeds.
pub struct ScrollTracker {
    signal: ScrollSignal,
    subscription: Option<Subscription>,
}

impl ScrollTracker {
    /// A tracker not bound to any viewport; fed through [`publish`](Self::publish).
    pub fn detached() -> Self {
        Self {
            signal: ScrollSignal::default(),
            subscription: None,
        }
    }

    pub fn attach(viewport: &dyn Viewport) -> Result<Self, MountError> {
        let signal = ScrollSignal::default();
        let writer = signal.clone();
        let subscription = viewport.on_scroll(Box::new(move |offset| writer.set(offset)))?;
        log::debug!("scroll tracker attached");
        Ok(Self {
            signal,
            subscription: Some(subscription),
        })
    }

    pub fn signal(&self) -> ScrollSignal {
        self.signal.clone()
    }

    pub fn publish(&self, offset: f64) {
        self.signal.set(offset);
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop listening. The signal keeps its last value.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            log::debug!("scroll tracker detached");
        }
    }
}
