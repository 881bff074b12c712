use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use crate::error::MountError;
use crate::host::{ResizeHandler, ScrollHandler, Subscription, Viewport};

/// The browser window as a [`Viewport`].
pub struct WindowViewport {
    window: Window,
}

impl WindowViewport {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn listen(
        &self,
        event: &'static str,
        closure: Closure<dyn FnMut()>,
    ) -> Result<Subscription, MountError> {
        self.window
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(|err| MountError::Subscription(format!("{event}: {err:?}")))?;

        let window = self.window.clone();
        Ok(Subscription::new(move || {
            window
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
                .ok();
        }))
    }
}

fn inner_size(window: &Window) -> (u32, u32) {
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32
    };
    (
        dimension(window.inner_width()),
        dimension(window.inner_height()),
    )
}

impl Viewport for WindowViewport {
    fn inner_size(&self) -> (u32, u32) {
        inner_size(&self.window)
    }

    fn on_resize(&self, mut handler: ResizeHandler) -> Result<Subscription, MountError> {
        let window = self.window.clone();
        let closure = Closure::wrap(Box::new(move || {
            let (width, height) = inner_size(&window);
            handler(width, height);
        }) as Box<dyn FnMut()>);
        self.listen("resize", closure)
    }

    fn on_scroll(&self, mut handler: ScrollHandler) -> Result<Subscription, MountError> {
        let window = self.window.clone();
        let closure = Closure::wrap(Box::new(move || {
            handler(window.scroll_y().unwrap_or(0.0));
        }) as Box<dyn FnMut()>);
        self.listen("scroll", closure)
    }
}
