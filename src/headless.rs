//! Browser-free host: hand-ticked frames, a scriptable viewport and
//! recording surfaces. Drives the engines in native tests and tooling.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::camera::PerspectiveCamera;
use crate::error::MountError;
use crate::frame::{FrameId, FrameQueue, FrameSource, FrameTask};
use crate::host::{ResizeHandler, ScrollHandler, Subscription, Viewport};
use crate::orbit::{OrbitScene, SceneRenderer};
use crate::surface::{DrawSurface, Rgba};

struct ManualSource(RefCell<FrameQueue>);

impl FrameSource for ManualSource {
    fn request(&self, task: FrameTask) -> Option<FrameId> {
        Some(self.0.borrow_mut().push(task))
    }

    fn cancel(&self, id: FrameId) {
        self.0.borrow_mut().cancel(id);
    }
}

/// Frame source that only advances when [`tick`](Self::tick) is called.
#[derive(Clone)]
pub struct ManualFrames {
    source: Rc<ManualSource>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self {
            source: Rc::new(ManualSource(RefCell::new(FrameQueue::new()))),
        }
    }

    pub fn source(&self) -> Rc<dyn FrameSource> {
        self.source.clone()
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn tick(&self) -> usize {
        let due = self.source.0.borrow_mut().take_due();
        let ran = due.len();
        for task in due {
            task();
        }
        ran
    }

    pub fn advance(&self, frames: usize) {
        for _ in 0..frames {
            self.tick();
        }
    }

    pub fn pending(&self) -> usize {
        self.source.0.borrow().len()
    }
}

impl Default for ManualFrames {
    fn default() -> Self {
        Self::new()
    }
}

type Shared<T> = Rc<RefCell<T>>;

struct ViewportState {
    size: (u32, u32),
    next_id: u64,
    refuse: bool,
    resize: Vec<(u64, Shared<ResizeHandler>)>,
    scroll_handlers: Vec<(u64, Shared<ScrollHandler>)>,
}

/// Viewport whose size and scroll position are set by the caller.
#[derive(Clone)]
pub struct HeadlessViewport {
    state: Shared<ViewportState>,
}

impl HeadlessViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(ViewportState {
                size: (width, height),
                next_id: 0,
                refuse: false,
                resize: Vec::new(),
                scroll_handlers: Vec::new(),
            })),
        }
    }

    /// Make every later subscription attempt fail.
    pub fn refuse_subscriptions(&self, refuse: bool) {
        self.state.borrow_mut().refuse = refuse;
    }

    pub fn resize(&self, width: u32, height: u32) {
        let handlers: Vec<_> = {
            let mut state = self.state.borrow_mut();
            state.size = (width, height);
            state.resize.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            (handler.borrow_mut())(width, height);
        }
    }

    pub fn scroll_to(&self, offset: f64) {
        let handlers: Vec<_> = {
            let state = self.state.borrow();
            state.scroll_handlers.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            (handler.borrow_mut())(offset);
        }
    }

    pub fn resize_listeners(&self) -> usize {
        self.state.borrow().resize.len()
    }

    pub fn scroll_listeners(&self) -> usize {
        self.state.borrow().scroll_handlers.len()
    }

    fn register(&self, kind: &str) -> Result<(u64, Weak<RefCell<ViewportState>>), MountError> {
        let mut state = self.state.borrow_mut();
        if state.refuse {
            return Err(MountError::Subscription(format!("{kind} listener refused")));
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok((id, Rc::downgrade(&self.state)))
    }
}

impl Viewport for HeadlessViewport {
    fn inner_size(&self) -> (u32, u32) {
        self.state.borrow().size
    }

    fn on_resize(&self, handler: ResizeHandler) -> Result<Subscription, MountError> {
        let (id, weak) = self.register("resize")?;
        self.state
            .borrow_mut()
            .resize
            .push((id, Rc::new(RefCell::new(handler))));
        Ok(Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().resize.retain(|(h, _)| *h != id);
            }
        }))
    }

    fn on_scroll(&self, handler: ScrollHandler) -> Result<Subscription, MountError> {
        let (id, weak) = self.register("scroll")?;
        self.state
            .borrow_mut()
            .scroll_handlers
            .push((id, Rc::new(RefCell::new(handler))));
        Ok(Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().scroll_handlers.retain(|(h, _)| *h != id);
            }
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize {
        width: u32,
        height: u32,
    },
    Clear,
    Disc {
        x: f64,
        y: f64,
        radius: f64,
        color: Rgba,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        color: Rgba,
    },
}

#[derive(Default)]
struct DisplayLog {
    size: (u32, u32),
    commands: Vec<DrawCommand>,
}

/// [`DrawSurface`] that records every command. Clones share one log, so a
/// handle kept by the caller sees what an engine draws.
#[derive(Clone, Default)]
pub struct DisplayList {
    log: Shared<DisplayLog>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        let list = Self::default();
        list.log.borrow_mut().size = (width, height);
        list
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.log.borrow().commands.clone()
    }

    /// Commands issued since the most recent clear.
    pub fn last_frame(&self) -> Vec<DrawCommand> {
        let log = self.log.borrow();
        let start = log
            .commands
            .iter()
            .rposition(|c| *c == DrawCommand::Clear)
            .map_or(0, |i| i + 1);
        log.commands[start..].to_vec()
    }

    pub fn draw_calls(&self) -> usize {
        self.log
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Disc { .. } | DrawCommand::Line { .. }))
            .count()
    }

    pub fn reset(&self) {
        self.log.borrow_mut().commands.clear();
    }

    /// Live handles to this log, including the caller's.
    pub fn handles(&self) -> usize {
        Rc::strong_count(&self.log)
    }

    fn record(&self, command: DrawCommand) {
        self.log.borrow_mut().commands.push(command);
    }
}

impl DrawSurface for DisplayList {
    fn size(&self) -> (u32, u32) {
        self.log.borrow().size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = (width, height);
        self.record(DrawCommand::Resize { width, height });
    }

    fn clear(&mut self) {
        self.record(DrawCommand::Clear);
    }

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgba) {
        self.record(DrawCommand::Disc {
            x,
            y,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) {
        self.record(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }
}

/// What one `render` call saw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedFrame {
    pub mesh_rotation: Vec3,
    pub cloud_rotation: Vec3,
    pub aspect: f32,
}

#[derive(Default)]
struct RecorderLog {
    size: (u32, u32),
    frames: Vec<RenderedFrame>,
    disposed: bool,
}

/// [`SceneRenderer`] that keeps a log instead of rasterizing.
#[derive(Clone, Default)]
pub struct SceneRecorder {
    log: Shared<RecorderLog>,
}

impl SceneRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        self.log.borrow().size
    }

    pub fn frames(&self) -> Vec<RenderedFrame> {
        self.log.borrow().frames.clone()
    }

    pub fn last_frame(&self) -> Option<RenderedFrame> {
        self.log.borrow().frames.last().copied()
    }

    pub fn is_disposed(&self) -> bool {
        self.log.borrow().disposed
    }
}

impl SceneRenderer for SceneRecorder {
    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = (width, height);
    }

    fn render(&mut self, scene: &OrbitScene, camera: &PerspectiveCamera) {
        self.log.borrow_mut().frames.push(RenderedFrame {
            mesh_rotation: scene.mesh.rotation,
            cloud_rotation: scene.cloud.rotation,
            aspect: camera.aspect(),
        });
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn manual_frames_defer_nested_requests() {
        let frames = ManualFrames::new();
        let source = frames.source();
        let hits = Rc::new(Cell::new(0));
        let (inner_source, inner_hits) = (source.clone(), hits.clone());
        source.request(Box::new(move || {
            inner_hits.set(inner_hits.get() + 1);
            let again = inner_hits.clone();
            inner_source.request(Box::new(move || again.set(again.get() + 10)));
        }));

        assert_eq!(frames.tick(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(frames.pending(), 1);
        assert_eq!(frames.tick(), 1);
        assert_eq!(hits.get(), 11);
    }

    #[test]
    fn cancelled_task_never_runs() {
        let frames = ManualFrames::new();
        let source = frames.source();
        let hit = Rc::new(Cell::new(false));
        let flag = hit.clone();
        let id = source.request(Box::new(move || flag.set(true))).unwrap();
        source.cancel(id);
        assert_eq!(frames.tick(), 0);
        assert!(!hit.get());
    }

    #[test]
    fn viewport_dispatches_and_releases() {
        let viewport = HeadlessViewport::new(100, 100);
        let seen = Rc::new(Cell::new((0, 0)));
        let sink = seen.clone();
        let sub = viewport
            .on_resize(Box::new(move |w, h| sink.set((w, h))))
            .unwrap();

        viewport.resize(640, 480);
        assert_eq!(seen.get(), (640, 480));
        assert_eq!(viewport.inner_size(), (640, 480));

        drop(sub);
        assert_eq!(viewport.resize_listeners(), 0);
        viewport.resize(10, 10);
        assert_eq!(seen.get(), (640, 480));
    }

    #[test]
    fn refused_subscription_is_an_error() {
        let viewport = HeadlessViewport::new(100, 100);
        viewport.refuse_subscriptions(true);
        let err = viewport.on_scroll(Box::new(|_| {})).err();
        assert!(matches!(err, Some(MountError::Subscription(_))));
    }

    #[test]
    fn display_list_splits_frames_at_clear() {
        let list = DisplayList::new(10, 10);
        let mut surface = list.clone();
        let color = Rgba::new(1, 2, 3, 0.5);
        surface.clear();
        surface.fill_disc(1.0, 1.0, 0.5, color);
        surface.clear();
        surface.stroke_line((0.0, 0.0), (1.0, 1.0), 0.3, color);

        assert_eq!(list.commands().len(), 4);
        assert_eq!(list.last_frame().len(), 1);
        assert_eq!(list.draw_calls(), 2);
        assert_eq!(list.handles(), 2);
    }
}
