//! The host's display-refresh primitive.
//!
//! [`crate::Canvg::start`] requests a frame; when the host's frame fires it
//! calls [`crate::Canvg::tick`], which requests the next one.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

pub trait FrameScheduler {
    /// Asks for one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraws a pending request. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Monotonic time in milliseconds.
    fn now(&self) -> f64;
}

#[derive(Debug, Default)]
struct ManualState {
    now: f64,
    next_handle: u64,
    pending: Option<FrameHandle>,
}

/// A scheduler whose clock only moves when told to. Clones share state, so a
/// host can keep one clone and hand another to [`crate::Canvg::start`].
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, milliseconds: f64) {
        self.state.borrow_mut().now += milliseconds;
    }

    /// The frame requested and not yet cancelled, if any.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.state.borrow().pending
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = FrameHandle(state.next_handle);
        state.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        if state.pending == Some(handle) {
            state.pending = None;
        }
    }

    fn now(&self) -> f64 {
        self.state.borrow().now
    }
}

/// Wall-clock scheduler for hosts that drive [`crate::Canvg::tick`] from
/// their own loop.
#[derive(Debug)]
pub struct InstantScheduler {
    origin: Instant,
    next_handle: u64,
    pending: Option<FrameHandle>,
}

impl Default for InstantScheduler {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            next_handle: 0,
            pending: None,
        }
    }
}

impl InstantScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }
}

impl FrameScheduler for InstantScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}
