//! Scramble tuning parameters
//!
//! Every constant that shapes the look of a scramble lives here. The defaults
//! reproduce the classic decode effect: a 60 Hz frame budget, staggered starts over
//! at most 20 frames, and a flicker that re-rolls roughly one frame in four.

use glyphshift_core::{Result, ScrambleError};
use serde::{Deserialize, Serialize};

/// Tuning for schedule generation and per-frame flicker
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScrambleConfig {
    /// Assumed display refresh rate used to turn a duration into a frame budget
    ///
    /// This is a budget, not a clock: a host ticking at 120 Hz finishes twice as fast.
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    /// Smallest frame budget any transition gets
    #[serde(default = "default_min_total_frames")]
    pub min_total_frames: u32,
    /// Cap on the window slot start frames are drawn from
    #[serde(default = "default_max_start_frames")]
    pub max_start_frames: f64,
    /// Start window as a fraction of the frame budget
    #[serde(default = "default_start_ratio")]
    pub start_ratio: f64,
    /// Cap on the random extra scramble length
    #[serde(default = "default_max_spread_frames")]
    pub max_spread_frames: f64,
    /// Random extra scramble length as a fraction of the frame budget
    #[serde(default = "default_spread_ratio")]
    pub spread_ratio: f64,
    /// Every slot scrambles for at least this many frames once started
    #[serde(default = "default_min_scramble_frames")]
    pub min_scramble_frames: u32,
    /// Chance per frame that a scrambling slot picks a new glyph
    #[serde(default = "default_reroll_probability")]
    pub reroll_probability: f64,
    /// Skip the animation and write target text immediately
    #[serde(default)]
    pub reduce_motion: bool,
}

fn default_refresh_rate() -> f64 {
    60.0
}

fn default_min_total_frames() -> u32 {
    8
}

fn default_max_start_frames() -> f64 {
    20.0
}

fn default_start_ratio() -> f64 {
    0.4
}

fn default_max_spread_frames() -> f64 {
    30.0
}

fn default_spread_ratio() -> f64 {
    0.6
}

fn default_min_scramble_frames() -> u32 {
    6
}

fn default_reroll_probability() -> f64 {
    0.28
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        Self {
            refresh_rate: default_refresh_rate(),
            min_total_frames: default_min_total_frames(),
            max_start_frames: default_max_start_frames(),
            start_ratio: default_start_ratio(),
            max_spread_frames: default_max_spread_frames(),
            spread_ratio: default_spread_ratio(),
            min_scramble_frames: default_min_scramble_frames(),
            reroll_probability: default_reroll_probability(),
            reduce_motion: false,
        }
    }
}

impl ScrambleConfig {
    /// Check every field is in range
    pub fn validate(&self) -> Result<()> {
        if !self.refresh_rate.is_finite() || self.refresh_rate <= 0.0 {
            return Err(invalid(format!(
                "refresh_rate must be a positive number, got {}",
                self.refresh_rate
            )));
        }

        let non_negative = [
            ("max_start_frames", self.max_start_frames),
            ("start_ratio", self.start_ratio),
            ("max_spread_frames", self.max_spread_frames),
            ("spread_ratio", self.spread_ratio),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.min_scramble_frames == 0 {
            return Err(invalid("min_scramble_frames must be at least 1".to_string()));
        }

        // Slot frames are u32; the largest possible end frame must fit
        let longest =
            self.max_start_frames + self.max_spread_frames + self.min_scramble_frames as f64;
        if longest > u32::MAX as f64 {
            return Err(invalid(format!(
                "max_start_frames + max_spread_frames + min_scramble_frames must not exceed {}, got {}",
                u32::MAX,
                longest
            )));
        }

        if !(0.0..=1.0).contains(&self.reroll_probability) {
            return Err(invalid(format!(
                "reroll_probability must be within [0, 1], got {}",
                self.reroll_probability
            )));
        }

        Ok(())
    }

    /// Number of frames a transition of `duration` seconds is planned over
    ///
    /// Degenerate durations (zero, negative, NaN, infinite) fall back to
    /// `min_total_frames` instead of failing.
    pub fn frame_budget(&self, duration: f64) -> u32 {
        let frames = (self.refresh_rate * duration).round();
        if !frames.is_finite() || frames <= self.min_total_frames as f64 {
            return self.min_total_frames;
        }
        if frames >= u32::MAX as f64 {
            u32::MAX
        } else {
            frames as u32
        }
    }

    /// Width of the window slot start frames are drawn from
    pub fn start_window(&self, total_frames: u32) -> f64 {
        self.max_start_frames.min(total_frames as f64 * self.start_ratio)
    }

    /// Width of the window the extra scramble length is drawn from
    pub fn spread_window(&self, total_frames: u32) -> f64 {
        self.max_spread_frames.min(total_frames as f64 * self.spread_ratio)
    }
}

fn invalid(message: String) -> ScrambleError {
    ScrambleError::InvalidConfig(message)
}
