//! Text scrambler
//!
//! Binds a [`ScrambleEngine`] to one [`RenderTarget`] and drives it from a
//! [`SchedulerHandle`]: every frame callback renders one frame, writes it to the
//! target, and requests exactly one more frame until the text converges.
//!
//! Only one transition is ever in flight per scrambler. `set_text` cancels the
//! pending frame request before planning a new schedule, and each request carries
//! the generation it was made for, so a callback that was already dequeued when a
//! newer transition started does nothing.

use glyphshift_core::{Alphabet, RenderTarget, Result};
use rand::rngs::SmallRng;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::ScrambleConfig;
use crate::engine::{ScrambleEngine, SetTextOptions};
use crate::scheduler::{FrameRequestId, SchedulerHandle};

struct ScramblerState<T, R> {
    engine: ScrambleEngine<R>,
    target: T,
    pending: Option<FrameRequestId>,
    generation: u64,
}

type SharedState<T, R> = Arc<Mutex<ScramblerState<T, R>>>;

fn lock<T, R>(state: &Mutex<ScramblerState<T, R>>) -> MutexGuard<'_, ScramblerState<T, R>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scramble effect bound to a render target
///
/// # Example
///
/// ```ignore
/// use glyphshift_animation::{FrameScheduler, SetTextOptions, TextScrambler};
/// use glyphshift_core::TextBuffer;
///
/// let scheduler = FrameScheduler::new();
/// let scrambler = TextScrambler::new(TextBuffer::default(), scheduler.handle());
///
/// scrambler.set_text("Welcome", SetTextOptions::new().with_duration(0.9).from_blank(true));
/// scheduler.run_until_idle(60);
/// assert_eq!(scrambler.text(), "Welcome");
/// ```
pub struct TextScrambler<T, R = SmallRng>
where
    T: RenderTarget + Send + 'static,
    R: Rng + Send + 'static,
{
    state: SharedState<T, R>,
    handle: SchedulerHandle,
}

impl<T> TextScrambler<T, SmallRng>
where
    T: RenderTarget + Send + 'static,
{
    /// Create a scrambler with the default glyphs and tuning
    pub fn new(target: T, handle: SchedulerHandle) -> Self {
        Self::with_engine(target, ScrambleEngine::new(Alphabet::default()), handle)
    }

    /// Create a scrambler drawing substitutes from `alphabet`
    pub fn with_alphabet(target: T, alphabet: Alphabet, handle: SchedulerHandle) -> Self {
        Self::with_engine(target, ScrambleEngine::new(alphabet), handle)
    }

    /// Create a scrambler with custom glyphs and tuning
    pub fn with_config(
        target: T,
        alphabet: Alphabet,
        config: ScrambleConfig,
        handle: SchedulerHandle,
    ) -> Result<Self> {
        let engine = ScrambleEngine::new(alphabet).with_config(config)?;
        Ok(Self::with_engine(target, engine, handle))
    }
}

impl<T, R> TextScrambler<T, R>
where
    T: RenderTarget + Send + 'static,
    R: Rng + Send + 'static,
{
    /// Create a scrambler around a prepared engine (custom RNG, seeded tests)
    pub fn with_engine(target: T, engine: ScrambleEngine<R>, handle: SchedulerHandle) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScramblerState {
                engine,
                target,
                pending: None,
                generation: 0,
            })),
            handle,
        }
    }

    /// Scramble the target's text into `text`
    ///
    /// Frame 0 is written immediately; later frames are written from scheduler
    /// callbacks. Any transition still in flight is abandoned.
    pub fn set_text(&self, text: &str, options: SetTextOptions) {
        let generation = {
            let mut state = lock(&self.state);
            if let Some(id) = state.pending.take() {
                self.handle.cancel_frame(id);
            }
            state.generation += 1;

            if state.engine.config().reduce_motion {
                state.engine.jump_to(text);
                state.target.set_text(text);
                return;
            }

            let previous = if options.from_blank {
                String::new()
            } else {
                state.target.text()
            };
            state.engine.begin(&previous, text, &options);
            state.generation
        };

        render_frame(&self.state, &self.handle, generation);
    }

    /// Complete the transition in flight, writing the final text now
    pub fn finish(&self) {
        let mut state = lock(&self.state);
        if let Some(id) = state.pending.take() {
            self.handle.cancel_frame(id);
        }
        state.generation += 1;
        if let Some(text) = state.engine.finish() {
            state.target.set_text(&text);
        }
    }

    /// Stop animating, leaving the last rendered frame on the target
    pub fn cancel(&self) {
        let mut state = lock(&self.state);
        if let Some(id) = state.pending.take() {
            self.handle.cancel_frame(id);
        }
        state.generation += 1;
        state.engine.cancel();
    }

    /// Whether a transition is in flight
    pub fn is_animating(&self) -> bool {
        lock(&self.state).engine.is_active()
    }

    /// The text currently shown by the target
    pub fn text(&self) -> String {
        lock(&self.state).target.text()
    }

    /// Access the render target
    pub fn with_target<F, O>(&self, f: F) -> O
    where
        F: FnOnce(&mut T) -> O,
    {
        f(&mut lock(&self.state).target)
    }
}

impl<T, R> Drop for TextScrambler<T, R>
where
    T: RenderTarget + Send + 'static,
    R: Rng + Send + 'static,
{
    fn drop(&mut self) {
        // Clean up the pending frame so no callback outlives the scrambler
        if let Some(id) = lock(&self.state).pending.take() {
            self.handle.cancel_frame(id);
        }
    }
}

/// Render one frame for `generation` and request the next one if needed
fn render_frame<T, R>(state: &SharedState<T, R>, handle: &SchedulerHandle, generation: u64)
where
    T: RenderTarget + Send + 'static,
    R: Rng + Send + 'static,
{
    let mut guard = lock(state);
    if guard.generation != generation {
        return;
    }
    guard.pending = None;

    let output = guard.engine.render_frame();
    guard.target.set_text(&output.text);
    if output.converged {
        return;
    }

    let weak = Arc::downgrade(state);
    let next = handle.clone();
    guard.pending = handle.request_frame(move || {
        if let Some(state) = weak.upgrade() {
            render_frame(&state, &next, generation);
        }
    });

    if guard.pending.is_none() {
        tracing::debug!(
            "TextScrambler: scheduler gone, transition stopped at frame {}",
            output.frame
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FrameScheduler;
    use glyphshift_core::{RecordingTarget, TextBuffer};

    fn seeded<T>(target: T, glyphs: &str, seed: u64, handle: SchedulerHandle) -> TextScrambler<T>
    where
        T: RenderTarget + Send + 'static,
    {
        let engine = ScrambleEngine::seeded(Alphabet::new(glyphs).unwrap(), seed);
        TextScrambler::with_engine(target, engine, handle)
    }

    #[test]
    fn test_from_blank_reveal() {
        let scheduler = FrameScheduler::new();
        let scrambler = seeded(RecordingTarget::new("ignored"), "XY", 11, scheduler.handle());

        scrambler.set_text(
            "AB",
            SetTextOptions::new().with_duration(1.0).from_blank(true),
        );
        scheduler.step_frames(100);

        assert!(!scheduler.has_pending());
        assert!(!scrambler.is_animating());
        assert_eq!(scrambler.text(), "AB");

        let frames = scrambler.with_target(|t| t.frames().to_vec());
        assert!(frames.len() > 1);
        let (last, intermediate) = frames.split_last().unwrap();
        assert_eq!(last, "AB");
        assert!(intermediate
            .iter()
            .any(|frame| frame.contains('X') || frame.contains('Y')));
        // Blank start: nothing from the old content ever shows
        assert!(frames.iter().all(|frame| !frame.contains('i')));
    }

    #[test]
    fn test_converges_to_longer_and_shorter_text() {
        let scheduler = FrameScheduler::new();
        let scrambler = seeded(TextBuffer::new("HI"), "#", 12, scheduler.handle());

        scrambler.set_text("HELLO WORLD", SetTextOptions::default());
        scheduler.step_frames(200);
        assert_eq!(scrambler.text(), "HELLO WORLD");

        scrambler.set_text("OK", SetTextOptions::default());
        scheduler.step_frames(200);
        assert_eq!(scrambler.text(), "OK");
    }

    #[test]
    fn test_empty_text_converges_to_empty() {
        let scheduler = FrameScheduler::new();
        let scrambler = seeded(RecordingTarget::new("HELLO"), "#", 13, scheduler.handle());

        scrambler.set_text("", SetTextOptions::default());
        // Old characters scramble out over five slots before clearing
        let first = scrambler.with_target(|t| t.frames()[0].clone());
        assert_eq!(first.chars().count(), 5);

        scheduler.step_frames(200);
        assert_eq!(scrambler.text(), "");
    }

    #[test]
    fn test_second_call_supersedes_first() {
        let scheduler = FrameScheduler::new();
        let scrambler = seeded(RecordingTarget::new(""), "XY", 14, scheduler.handle());

        scrambler.set_text("AAAAA", SetTextOptions::default());
        scheduler.tick();
        scheduler.tick();
        assert!(scrambler.is_animating());

        scrambler.with_target(|t| t.clear_frames());
        scrambler.set_text("BBBBB", SetTextOptions::default());
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.step_frames(200);
        assert_eq!(scrambler.text(), "BBBBB");

        // No slot of the first transition had settled, so 'A' can never reappear
        let frames = scrambler.with_target(|t| t.frames().to_vec());
        assert!(frames.iter().all(|frame| !frame.contains('A')));
    }

    #[test]
    fn test_same_text_still_scrambles() {
        let scheduler = FrameScheduler::new();
        let scrambler = seeded(RecordingTarget::new(""), "#", 15, scheduler.handle());

        scrambler.set_text("SAME", SetTextOptions::default());
        scheduler.step_frames(200);
        assert_eq!(scrambler.text(), "SAME");

        scrambler.with_target(|t| t.clear_frames());
        scrambler.set_text("SAME", SetTextOptions::default());
        assert!(scrambler.is_animating());
        scheduler.step_frames(200);

        let frames = scrambler.with_target(|t| t.frames().to_vec());
        assert!(frames.len() >= 7);
        assert!(frames.iter().any(|frame| frame.contains('#')));
        assert_eq!(frames.last().map(String::as_str), Some("SAME"));
    }

    #[test]
    fn test_reduce_motion_writes_immediately() {
        let scheduler = FrameScheduler::new();
        let config = ScrambleConfig {
            reduce_motion: true,
            ..Default::default()
        };
        let scrambler = TextScrambler::with_config(
            RecordingTarget::new("OLD"),
            Alphabet::default(),
            config,
            scheduler.handle(),
        )
        .unwrap();

        scrambler.set_text("NEW", SetTextOptions::default());
        assert!(!scheduler.has_pending());
        assert!(!scrambler.is_animating());
        assert_eq!(scrambler.text(), "NEW");
        assert_eq!(scrambler.with_target(|t| t.frame_count()), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let scheduler = FrameScheduler::new();
        let config = ScrambleConfig {
            reroll_probability: -1.0,
            ..Default::default()
        };
        let result = TextScrambler::with_config(
            TextBuffer::default(),
            Alphabet::default(),
            config,
            scheduler.handle(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_finish_and_cancel() {
        let scheduler = FrameScheduler::new();
        let scrambler = TextScrambler::new(TextBuffer::new("ONE"), scheduler.handle());

        scrambler.set_text("TWO", SetTextOptions::default());
        scrambler.finish();
        assert_eq!(scrambler.text(), "TWO");
        assert!(!scheduler.has_pending());

        scrambler.set_text("THREE", SetTextOptions::default());
        let shown = scrambler.text();
        scrambler.cancel();
        assert!(!scheduler.has_pending());
        assert!(!scrambler.is_animating());

        scheduler.step_frames(10);
        assert_eq!(scrambler.text(), shown);
    }

    #[test]
    fn test_drop_cancels_pending_frame() {
        let scheduler = FrameScheduler::new();
        {
            let scrambler = TextScrambler::new(TextBuffer::default(), scheduler.handle());
            scrambler.set_text("GONE", SetTextOptions::default());
            assert_eq!(scheduler.pending_count(), 1);
        }
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_dropped_scheduler_stops_after_first_frame() {
        let handle = {
            let scheduler = FrameScheduler::new();
            scheduler.handle()
        };
        let scrambler = seeded(RecordingTarget::new(""), "#", 16, handle);

        scrambler.set_text("STUCK", SetTextOptions::default());
        assert_eq!(scrambler.with_target(|t| t.frame_count()), 1);
    }

    #[test]
    fn test_scramblers_share_scheduler() {
        let scheduler = FrameScheduler::new();
        let a = seeded(TextBuffer::default(), "#", 17, scheduler.handle());
        let b = seeded(TextBuffer::default(), "#", 18, scheduler.handle());

        a.set_text("LEFT", SetTextOptions::default());
        b.set_text("RIGHT", SetTextOptions::new().with_duration(0.2));
        assert_eq!(scheduler.pending_count(), 2);

        scheduler.step_frames(200);
        assert_eq!(a.text(), "LEFT");
        assert_eq!(b.text(), "RIGHT");
    }

    #[test]
    fn test_dequeued_callback_from_older_transition_is_ignored() {
        let scheduler = FrameScheduler::new();
        let scrambler = Arc::new(seeded(
            RecordingTarget::new(""),
            "#",
            19,
            scheduler.handle(),
        ));

        // Queued ahead of the scrambler's own frame, so both run in the same tick
        let restarter = Arc::clone(&scrambler);
        scheduler.request_frame(move || restarter.set_text("BBBB", SetTextOptions::default()));

        scrambler.set_text("AAAA", SetTextOptions::default());
        scrambler.with_target(|t| t.clear_frames());

        // The restart renders frame 0 of "BBBB"; the "AAAA" callback was already
        // dequeued and must neither draw nor request another frame
        scheduler.tick();
        assert_eq!(scrambler.with_target(|t| t.frame_count()), 1);
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.step_frames(200);
        assert!(!scheduler.has_pending());
        assert_eq!(scrambler.text(), "BBBB");
    }
}
