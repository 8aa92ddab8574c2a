//! Glyphshift Animation System
//!
//! Frame-driven text-scramble transitions.
//!
//! # Features
//!
//! - **Scramble Engine**: per-character randomized windows that land at staggered times
//! - **Frame Scheduler**: one-shot next-frame callbacks with cancellation
//! - **Text Scrambler**: binds an engine to a render target and a scheduler
//! - **Seedable**: every random draw goes through an injected RNG
//! - **Tunable**: frame budget, windows, and flicker rate live in [`ScrambleConfig`]

pub mod config;
pub mod engine;
pub mod scheduler;
pub mod scrambler;

pub use config::ScrambleConfig;
pub use engine::{FrameOutput, ScrambleEngine, SetTextOptions, Slot};
pub use scheduler::{FrameCallback, FrameRequestId, FrameScheduler, SchedulerHandle};
pub use scrambler::TextScrambler;
