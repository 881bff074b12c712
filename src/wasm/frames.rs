use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::Window;

use crate::frame::{FrameId, FrameQueue, FrameSource, FrameTask};

struct Dispatch {
    window: Window,
    queue: RefCell<FrameQueue>,
    /// `requestAnimationFrame` handle while a callback is pending.
    handle: Cell<Option<i32>>,
    // `callback` holds the one closure handed to every
    // `request_animation_frame`. It only sees a weak reference back to the
    // dispatcher so the two do not keep each other alive.
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Dispatch {
    fn run(&self) {
        self.handle.set(None);
        let due = self.queue.borrow_mut().take_due();
        for task in due {
            task();
        }
    }

    fn arm(&self) -> Result<(), JsValue> {
        if self.handle.get().is_some() {
            return Ok(());
        }
        let callback = self.callback.borrow();
        let callback = callback.as_ref().ok_or("frame dispatcher released")?;
        let handle = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?;
        self.handle.set(Some(handle));
        Ok(())
    }

    fn disarm(&self) {
        if let Some(handle) = self.handle.take() {
            self.window.cancel_animation_frame(handle).ok();
        }
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// [`FrameSource`] over `requestAnimationFrame`. All tasks due in a frame
/// share one browser callback.
pub struct RafFrameSource {
    dispatch: Rc<Dispatch>,
}

impl RafFrameSource {
    pub fn new(window: Window) -> Self {
        let dispatch = Rc::new(Dispatch {
            window,
            queue: RefCell::new(FrameQueue::new()),
            handle: Cell::new(None),
            callback: RefCell::new(None),
        });
        let weak = Rc::downgrade(&dispatch);
        *dispatch.callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            if let Some(dispatch) = weak.upgrade() {
                dispatch.run();
            }
        }) as Box<dyn FnMut()>));
        Self { dispatch }
    }
}

impl FrameSource for RafFrameSource {
    fn request(&self, task: FrameTask) -> Option<FrameId> {
        let id = self.dispatch.queue.borrow_mut().push(task);
        if let Err(err) = self.dispatch.arm() {
            log::warn!("requestAnimationFrame failed: {err:?}");
            self.dispatch.queue.borrow_mut().cancel(id);
            return None;
        }
        Some(id)
    }

    fn cancel(&self, id: FrameId) {
        let idle = {
            let mut queue = self.dispatch.queue.borrow_mut();
            queue.cancel(id);
            queue.is_empty()
        };
        if idle {
            self.dispatch.disarm();
        }
    }
}
