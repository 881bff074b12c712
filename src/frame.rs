//! Per-frame scheduling.
//!
//! A [`FrameSource`] runs one-shot tasks on the next display refresh. The
//! browser backs it with `requestAnimationFrame`; tests tick it by hand.
//! [`AnimationLoop`] turns a step closure into an endless loop on top of a
//! source by re-requesting a frame after every step.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub type FrameTask = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

pub trait FrameSource {
    /// Queue `task` for the next frame. `None` if the host refused.
    fn request(&self, task: FrameTask) -> Option<FrameId>;

    /// Drop a queued task. Unknown or already-run ids are ignored.
    fn cancel(&self, id: FrameId);
}

/// Tasks waiting for the next frame, in request order.
#[derive(Default)]
pub struct FrameQueue {
    next_id: u64,
    tasks: Vec<(FrameId, FrameTask)>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: FrameTask) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        self.tasks.push((id, task));
        id
    }

    /// Returns whether a task was removed.
    pub fn cancel(&mut self, id: FrameId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(queued, _)| *queued != id);
        self.tasks.len() != before
    }

    /// Everything due this frame. Tasks requested while these run land in
    /// the queue for the following frame.
    pub fn take_due(&mut self) -> Vec<FrameTask> {
        self.tasks.drain(..).map(|(_, task)| task).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

struct LoopInner {
    source: Rc<dyn FrameSource>,
    step: RefCell<Option<Box<dyn FnMut()>>>,
    pending: Cell<Option<FrameId>>,
    running: Cell<bool>,
}

/// Endless per-frame loop with at most one frame pending at any time.
///
/// Stopping (or dropping) the loop cancels the pending frame and drops the
/// step closure along with whatever it captured.
pub struct AnimationLoop {
    inner: Rc<LoopInner>,
}

impl AnimationLoop {
    pub fn start(source: Rc<dyn FrameSource>, step: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(LoopInner {
            source,
            step: RefCell::new(Some(Box::new(step))),
            pending: Cell::new(None),
            running: Cell::new(true),
        });
        schedule(&inner);
        Self { inner }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn stop(&self) {
        halt(&self.inner);
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        halt(&self.inner);
    }
}

fn halt(inner: &LoopInner) {
    if !inner.running.replace(false) {
        return;
    }
    if let Some(id) = inner.pending.take() {
        inner.source.cancel(id);
    }
    // Busy means we are inside the step; `tick` drops it on the way out.
    if let Ok(mut step) = inner.step.try_borrow_mut() {
        step.take();
    }
    log::debug!("animation loop stopped");
}

fn schedule(inner: &Rc<LoopInner>) {
    let weak: Weak<LoopInner> = Rc::downgrade(inner);
    let id = inner.source.request(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
            tick(&inner);
        }
    }));
    if id.is_none() {
        log::warn!("frame source refused a request, animation loop halted");
        inner.running.set(false);
        inner.step.borrow_mut().take();
    }
    inner.pending.set(id);
}

fn tick(inner: &Rc<LoopInner>) {
    inner.pending.set(None);
    if !inner.running.get() {
        return;
    }
    if let Some(step) = inner.step.borrow_mut().as_mut() {
        step();
    }
    if inner.running.get() {
        schedule(inner);
    } else {
        inner.step.borrow_mut().take();
    }
}
