//! Scramble engine
//!
//! Plans and renders one text-scramble transition at a time. Each character slot
//! gets its own randomized frame window: before the window the slot shows its old
//! character, inside it flickers through random glyphs, and from the window's end on
//! it shows the new character. Staggered windows make the characters land at
//! different times.
//!
//! The engine knows nothing about time or displays. A host calls
//! [`ScrambleEngine::render_frame`] once per frame and writes the returned text
//! wherever it is shown; [`TextScrambler`](crate::TextScrambler) does exactly that
//! on top of the frame scheduler.

use glyphshift_core::{Alphabet, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::ScrambleConfig;

/// Options for a single `set_text` transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SetTextOptions {
    /// Desired length in seconds; converted into a frame budget
    pub duration: f64,
    /// Start from a blank line of the new text's length instead of the shown text
    pub from_blank: bool,
}

impl Default for SetTextOptions {
    fn default() -> Self {
        Self {
            duration: 1.0,
            from_blank: false,
        }
    }
}

impl SetTextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn from_blank(mut self, from_blank: bool) -> Self {
        self.from_blank = from_blank;
        self
    }
}

/// Transition record for one character position
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    /// Character shown before the window opens
    pub from: char,
    /// Character shown once the window closes
    pub to: char,
    /// First frame of the scramble window
    pub start_frame: u32,
    /// First frame showing `to`
    pub end_frame: u32,
    glyph: Option<char>,
}

impl Slot {
    /// The random glyph currently shown while scrambling, if one was rolled
    pub fn glyph(&self) -> Option<char> {
        self.glyph
    }

    /// Number of frames this slot spends scrambling
    pub fn scramble_frames(&self) -> u32 {
        self.end_frame - self.start_frame
    }

    /// What this slot displays at `frame`, without rolling new glyphs
    pub fn char_at(&self, frame: u32) -> Option<char> {
        if frame >= self.end_frame {
            Some(self.to)
        } else if frame >= self.start_frame {
            self.glyph
        } else {
            Some(self.from)
        }
    }
}

/// Result of rendering a single frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    /// Full text to display for this frame
    pub text: String,
    /// Frame number this text was rendered for
    pub frame: u32,
    /// Slots showing their final character
    pub settled: usize,
    /// Every slot has settled and the engine is idle
    pub converged: bool,
}

/// Per-character scramble scheduler and renderer
///
/// Holds at most one transition. [`begin`](Self::begin) replaces whatever was in
/// flight; between transitions only the last rendered text is kept.
pub struct ScrambleEngine<R = SmallRng> {
    alphabet: Alphabet,
    config: ScrambleConfig,
    rng: R,
    slots: Vec<Slot>,
    /// Length of the target text; slots past it are padding
    target_len: usize,
    frame: u32,
    total_frames: u32,
    active: bool,
    rendered: String,
}

impl ScrambleEngine<SmallRng> {
    /// Create an engine with default tuning and an entropy-seeded RNG
    pub fn new(alphabet: Alphabet) -> Self {
        Self::with_rng(alphabet, SmallRng::from_entropy())
    }

    /// Create an engine whose schedules and glyphs are reproducible for `seed`
    pub fn seeded(alphabet: Alphabet, seed: u64) -> Self {
        Self::with_rng(alphabet, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ScrambleEngine<R> {
    /// Create an engine drawing randomness from `rng`
    pub fn with_rng(alphabet: Alphabet, rng: R) -> Self {
        Self {
            alphabet,
            config: ScrambleConfig::default(),
            rng,
            slots: Vec::new(),
            target_len: 0,
            frame: 0,
            total_frames: 0,
            active: false,
            rendered: String::new(),
        }
    }

    /// Replace the tuning, rejecting out-of-range values
    pub fn with_config(mut self, config: ScrambleConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn config(&self) -> &ScrambleConfig {
        &self.config
    }

    /// The active schedule; empty while idle
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Frames elapsed since the current transition began
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Frame budget of the current transition
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Whether a transition is in flight
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Text produced by the most recent frame
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Start a transition from `previous` to `text`, discarding any in-flight one
    pub fn begin(&mut self, previous: &str, text: &str, options: &SetTextOptions) {
        let new_chars: Vec<char> = text.chars().collect();
        let old_chars: Vec<char> = if options.from_blank {
            vec![' '; new_chars.len()]
        } else {
            previous.chars().collect()
        };

        let total_frames = self.config.frame_budget(options.duration);
        let start_window = self.config.start_window(total_frames);
        let spread_window = self.config.spread_window(total_frames);
        let floor = self.config.min_scramble_frames;

        let len = old_chars.len().max(new_chars.len());
        self.slots.clear();
        self.slots.reserve(len);
        for i in 0..len {
            let start_frame = draw_frames(&mut self.rng, start_window);
            let end_frame = start_frame
                .saturating_add(draw_frames(&mut self.rng, spread_window))
                .saturating_add(floor);
            self.slots.push(Slot {
                from: old_chars.get(i).copied().unwrap_or(' '),
                to: new_chars.get(i).copied().unwrap_or(' '),
                start_frame,
                end_frame,
                glyph: None,
            });
        }

        self.target_len = new_chars.len();
        self.total_frames = total_frames;
        self.frame = 0;
        self.active = true;

        tracing::debug!(
            "Scramble: begin {} slots over {} frames (from_blank={})",
            len,
            total_frames,
            options.from_blank
        );
    }

    /// Render the current frame and advance the frame counter
    ///
    /// Once every slot has settled the output is exactly the target text, padding
    /// slots past its end are dropped, and the engine goes idle. Rendering while idle
    /// repeats the last text.
    pub fn render_frame(&mut self) -> FrameOutput {
        if !self.active {
            return FrameOutput {
                text: self.rendered.clone(),
                frame: self.frame,
                settled: 0,
                converged: true,
            };
        }

        let frame = self.frame;
        let mut output = String::with_capacity(self.slots.len());
        let mut settled = 0;

        for slot in self.slots.iter_mut() {
            if frame >= slot.end_frame {
                settled += 1;
                output.push(slot.to);
            } else if frame >= slot.start_frame {
                let reroll = match slot.glyph {
                    None => true,
                    Some(_) => self.rng.gen::<f64>() < self.config.reroll_probability,
                };
                if reroll {
                    let index = self.rng.gen_range(0..self.alphabet.len());
                    slot.glyph = Some(self.alphabet.glyph(index));
                }
                output.push(slot.glyph.unwrap_or(slot.to));
            } else {
                output.push(slot.from);
            }
        }

        let converged = settled == self.slots.len();
        if converged {
            output = self.slots[..self.target_len].iter().map(|s| s.to).collect();
            tracing::debug!(
                "Scramble: converged after {} frames",
                frame.saturating_add(1)
            );
            self.active = false;
            self.slots.clear();
        } else {
            tracing::trace!(
                "Scramble: frame {} ({}/{} settled)",
                frame,
                settled,
                self.slots.len()
            );
            self.frame += 1;
        }

        self.rendered.clone_from(&output);
        FrameOutput {
            text: output,
            frame,
            settled,
            converged,
        }
    }

    /// Jump straight to the end of the current transition
    ///
    /// Returns the final text, or `None` when idle.
    pub fn finish(&mut self) -> Option<String> {
        if !self.active {
            return None;
        }
        let text: String = self.slots[..self.target_len].iter().map(|s| s.to).collect();
        self.jump_to(&text);
        Some(text)
    }

    /// Drop any transition and treat `text` as the rendered text
    pub fn jump_to(&mut self, text: &str) {
        self.cancel();
        self.rendered = text.to_string();
    }

    /// Abandon the current transition, keeping the last rendered frame
    pub fn cancel(&mut self) {
        if self.active {
            tracing::debug!("Scramble: cancelled at frame {}", self.frame);
        }
        self.active = false;
        self.slots.clear();
        self.target_len = 0;
        self.frame = 0;
    }
}

/// Uniform integer in `[0, window)`, or 0 for an empty window
fn draw_frames<R: Rng>(rng: &mut R, window: f64) -> u32 {
    (rng.gen::<f64>() * window).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(seed: u64) -> ScrambleEngine {
        ScrambleEngine::seeded(Alphabet::default(), seed)
    }

    fn run_to_end(engine: &mut ScrambleEngine) -> Vec<FrameOutput> {
        let mut frames = Vec::new();
        for _ in 0..1000 {
            let out = engine.render_frame();
            let done = out.converged;
            frames.push(out);
            if done {
                break;
            }
        }
        frames
    }

    #[test]
    fn test_schedule_windows() {
        let texts = ["", "A", "HELLO", "a much longer line of text to scramble"];
        let durations = [0.0, 0.1, 0.5, 1.0, 3.0];

        for seed in 0..20 {
            let mut engine = engine(seed);
            for previous in texts {
                for text in texts {
                    for duration in durations {
                        let options = SetTextOptions::new().with_duration(duration);
                        engine.begin(previous, text, &options);

                        let expected = previous.chars().count().max(text.chars().count());
                        assert_eq!(engine.slots().len(), expected);

                        for slot in engine.slots() {
                            assert!(slot.start_frame < slot.end_frame);
                            assert!(slot.scramble_frames() >= 6);
                            assert!(slot.start_frame < 20);
                            assert!(slot.scramble_frames() < 30 + 6);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_slot_characters() {
        let mut engine = engine(1);
        engine.begin("HELLO", "HI", &SetTextOptions::default());

        let from: String = engine.slots().iter().map(|s| s.from).collect();
        let to: String = engine.slots().iter().map(|s| s.to).collect();
        assert_eq!(from, "HELLO");
        assert_eq!(to, "HI   ");

        engine.begin("HI", "HELLO", &SetTextOptions::default());
        let from: String = engine.slots().iter().map(|s| s.from).collect();
        assert_eq!(from, "HI   ");
    }

    #[test]
    fn test_from_blank_ignores_previous() {
        let mut engine = engine(2);
        engine.begin(
            "SOMETHING LONG",
            "WELCOME",
            &SetTextOptions::new().from_blank(true),
        );

        assert_eq!(engine.slots().len(), 7);
        assert!(engine.slots().iter().all(|s| s.from == ' '));
    }

    #[test]
    fn test_converges_to_exact_text() {
        let cases = [("HELLO", "HI"), ("HI", "HELLO"), ("", "NEW"), ("HELLO", "")];

        for (previous, text) in cases {
            let mut engine = engine(3);
            engine.begin(previous, text, &SetTextOptions::default());
            let frames = run_to_end(&mut engine);

            let last = frames.last().unwrap();
            assert!(last.converged);
            assert_eq!(last.text, text);
            assert_eq!(engine.rendered(), text);
            assert!(!engine.is_active());
            assert!(engine.slots().is_empty());
        }
    }

    #[test]
    fn test_frame_zero_shows_from_or_glyph() {
        let mut engine = ScrambleEngine::seeded(Alphabet::new("#").unwrap(), 4);
        engine.begin("ABCDEF", "UVWXYZ", &SetTextOptions::default());

        let out = engine.render_frame();
        assert_eq!(out.frame, 0);
        assert!(!out.converged);
        assert_eq!(out.settled, 0);
        for (c, slot) in out.text.chars().zip("ABCDEF".chars()) {
            assert!(c == '#' || c == slot);
        }
        assert_eq!(engine.frame(), 1);
    }

    #[test]
    fn test_visible_char_follows_window() {
        let mut engine = ScrambleEngine::seeded(Alphabet::new("*").unwrap(), 5);
        engine.begin("abcdefgh", "ABCDEFGH", &SetTextOptions::default());

        loop {
            let out = engine.render_frame();
            if out.converged {
                break;
            }
            for (slot, c) in engine.slots().iter().zip(out.text.chars()) {
                let expected = if out.frame < slot.start_frame {
                    slot.from
                } else if out.frame < slot.end_frame {
                    '*'
                } else {
                    slot.to
                };
                assert_eq!(slot.char_at(out.frame), Some(expected));
                assert_eq!(c, expected);
            }
        }
    }

    #[test]
    fn test_large_windows_keep_scramble_floor() {
        let config = ScrambleConfig {
            max_start_frames: 4.0e9,
            start_ratio: 1e6,
            max_spread_frames: 2.9e8,
            spread_ratio: 1e6,
            ..Default::default()
        };
        let mut engine = engine(11).with_config(config).unwrap();
        engine.begin("", "ABCDEFGH", &SetTextOptions::new().with_duration(1e6));

        assert_eq!(engine.slots().len(), 8);
        for slot in engine.slots() {
            assert!(slot.start_frame < slot.end_frame);
            assert!(slot.scramble_frames() >= 6);
        }
    }

    #[test]
    fn test_zero_reroll_keeps_first_glyph() {
        let config = ScrambleConfig {
            reroll_probability: 0.0,
            ..Default::default()
        };
        let mut engine = engine(6).with_config(config).unwrap();
        engine.begin("", "STEADY", &SetTextOptions::new().from_blank(true));

        let mut first: Vec<Option<char>> = vec![None; 6];
        while engine.is_active() {
            let frame = engine.frame();
            engine.render_frame();
            for (i, slot) in engine.slots().iter().enumerate() {
                if frame >= slot.start_frame && frame < slot.end_frame {
                    let glyph = slot.glyph();
                    assert!(glyph.is_some());
                    match first[i] {
                        None => first[i] = glyph,
                        Some(seen) => assert_eq!(Some(seen), glyph),
                    }
                }
            }
        }
    }

    #[test]
    fn test_seeded_engines_agree() {
        let mut a = engine(42);
        let mut b = engine(42);
        a.begin("OLD", "NEW TEXT", &SetTextOptions::default());
        b.begin("OLD", "NEW TEXT", &SetTextOptions::default());
        assert_eq!(a.slots(), b.slots());

        let frames_a: Vec<String> = run_to_end(&mut a).into_iter().map(|f| f.text).collect();
        let frames_b: Vec<String> = run_to_end(&mut b).into_iter().map(|f| f.text).collect();
        assert_eq!(frames_a, frames_b);
    }

    #[test]
    fn test_begin_replaces_in_flight_transition() {
        let mut engine = engine(7);
        engine.begin("", "FIRST", &SetTextOptions::default());
        engine.render_frame();
        engine.render_frame();
        assert_eq!(engine.frame(), 2);

        let shown = engine.rendered().to_string();
        engine.begin(&shown, "SECOND", &SetTextOptions::default());
        assert_eq!(engine.frame(), 0);
        assert_eq!(engine.slots().len(), 6);
        assert!(engine.slots().iter().all(|s| "SECOND".contains(s.to)));

        let last = run_to_end(&mut engine).pop().unwrap();
        assert_eq!(last.text, "SECOND");
    }

    #[test]
    fn test_empty_to_empty_converges_immediately() {
        let mut engine = engine(8);
        engine.begin("", "", &SetTextOptions::default());
        let out = engine.render_frame();
        assert!(out.converged);
        assert_eq!(out.text, "");
    }

    #[test]
    fn test_finish_and_cancel() {
        let mut engine = engine(9);
        assert_eq!(engine.finish(), None);

        engine.begin("ABC", "XYZW", &SetTextOptions::default());
        engine.render_frame();
        assert_eq!(engine.finish(), Some("XYZW".to_string()));
        assert_eq!(engine.rendered(), "XYZW");
        assert!(!engine.is_active());

        engine.begin("XYZW", "Q", &SetTextOptions::default());
        let out = engine.render_frame();
        engine.cancel();
        assert!(!engine.is_active());
        assert_eq!(engine.rendered(), out.text);

        let idle = engine.render_frame();
        assert!(idle.converged);
        assert_eq!(idle.text, out.text);
    }

    #[test]
    fn test_idle_render_repeats_text() {
        let mut engine = engine(10);
        engine.jump_to("STATIC");
        let out = engine.render_frame();
        assert!(out.converged);
        assert_eq!(out.text, "STATIC");
    }
}
