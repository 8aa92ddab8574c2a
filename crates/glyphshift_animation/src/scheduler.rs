//! Frame scheduler
//!
//! Provides the "run this once before the next frame" primitive scrambles are
//! driven by. Callbacks are one-shot: a callback that wants another frame requests
//! one, and anything requested while a frame is running fires on the following frame.
//!
//! The scheduler itself does not know about time. Hosts call
//! [`FrameScheduler::tick`] from their own render loop, tests step frames by hand
//! with [`FrameScheduler::step_frames`], and [`FrameScheduler::run_until_idle`]
//! paces frames in real time for simple drivers such as the CLI.

use slotmap::{new_key_type, SlotMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a pending frame request
    pub struct FrameRequestId;
}

/// One-shot callback run on the next frame
pub type FrameCallback = Box<dyn FnOnce() + Send>;

struct PendingFrame {
    /// Request order, so callbacks fire in the order they were requested
    sequence: u64,
    callback: FrameCallback,
}

/// Internal state of the frame scheduler
struct SchedulerInner {
    pending: SlotMap<FrameRequestId, PendingFrame>,
    next_sequence: u64,
    frame: u64,
}

impl SchedulerInner {
    fn request(&mut self, callback: FrameCallback) -> FrameRequestId {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(PendingFrame { sequence, callback })
    }
}

fn lock(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of all pending frame callbacks
///
/// Typically held by whatever drives rendering; components receive a
/// [`SchedulerHandle`] instead.
///
/// ```ignore
/// let scheduler = FrameScheduler::new();
/// let scrambler = TextScrambler::new(TextBuffer::default(), scheduler.handle());
/// scrambler.set_text("HELLO", SetTextOptions::default());
///
/// while scheduler.tick() {
///     // present the frame
/// }
/// ```
pub struct FrameScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                pending: SlotMap::with_key(),
                next_sequence: 0,
                frame: 0,
            })),
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Request `callback` to run on the next frame
    pub fn request_frame<F>(&self, callback: F) -> FrameRequestId
    where
        F: FnOnce() + Send + 'static,
    {
        lock(&self.inner).request(Box::new(callback))
    }

    /// Cancel a pending request; returns `false` if it already fired or was cancelled
    pub fn cancel_frame(&self, id: FrameRequestId) -> bool {
        lock(&self.inner).pending.remove(id).is_some()
    }

    /// Run one frame
    ///
    /// Every callback pending when the frame starts runs once, in request order,
    /// with the scheduler lock released. Returns true if callbacks are waiting
    /// for the next frame.
    pub fn tick(&self) -> bool {
        let mut due: Vec<PendingFrame> = {
            let mut inner = lock(&self.inner);
            inner.frame += 1;
            inner.pending.drain().map(|(_, pending)| pending).collect()
        };
        due.sort_by_key(|pending| pending.sequence);

        for pending in due {
            (pending.callback)();
        }

        self.has_pending()
    }

    /// Tick until no callbacks remain or `max_frames` frames ran
    ///
    /// Returns the number of frames run. Frames are not paced, which makes this the
    /// deterministic stepper for tests and offline rendering.
    pub fn step_frames(&self, max_frames: u64) -> u64 {
        let mut frames = 0;
        while frames < max_frames && self.has_pending() {
            self.tick();
            frames += 1;
        }
        frames
    }

    /// Tick at `fps` frames per second until no callbacks remain
    ///
    /// Blocks the calling thread, sleeping off whatever is left of each frame.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, fps: u32) -> u64 {
        let frame_duration = Duration::from_micros(1_000_000 / u64::from(fps.max(1)));
        let started = Instant::now();
        let mut frames = 0;

        while self.has_pending() {
            let start = Instant::now();
            self.tick();
            frames += 1;

            let elapsed = start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }

        tracing::debug!(
            "FrameScheduler: idle after {} frames ({:?})",
            frames,
            started.elapsed()
        );
        frames
    }

    /// Whether any callbacks are waiting for the next frame
    pub fn has_pending(&self) -> bool {
        !lock(&self.inner).pending.is_empty()
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_count(&self) -> usize {
        lock(&self.inner).pending.len()
    }

    /// Frames ticked since the scheduler was created
    pub fn frame_count(&self) -> u64 {
        lock(&self.inner).frame
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the frame scheduler
///
/// Passed to components that need frames. It won't keep the scheduler alive; once
/// the scheduler is dropped every operation is a no-op.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Request `callback` to run on the next frame
    ///
    /// Returns `None` if the scheduler is gone; the callback is dropped unrun.
    pub fn request_frame<F>(&self, callback: F) -> Option<FrameRequestId>
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .upgrade()
            .map(|inner| lock(&inner).request(Box::new(callback)))
    }

    /// Cancel a pending request
    pub fn cancel_frame(&self, id: FrameRequestId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| lock(&inner).pending.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Check if a request is still waiting for its frame
    pub fn is_pending(&self, id: FrameRequestId) -> bool {
        self.inner
            .upgrade()
            .map(|inner| lock(&inner).pending.contains_key(id))
            .unwrap_or(false)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
