//! Glyphshift Core
//!
//! Shared vocabulary for the glyphshift text-scramble effect.
//!
//! - [`Alphabet`] - validated set of substitution glyphs
//! - [`RenderTarget`] - the text-bearing output a scramble writes every frame
//! - [`ScrambleError`] - construction and configuration errors
//!
//! The scramble engine and frame scheduler live in `glyphshift_animation`.

mod alphabet;
mod error;
mod target;

pub use alphabet::{Alphabet, DEFAULT_GLYPHS};
pub use error::{Result, ScrambleError};
pub use target::{RecordingTarget, RenderTarget, TextBuffer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alphabet::{Alphabet, DEFAULT_GLYPHS};
    pub use crate::error::{Result, ScrambleError};
    pub use crate::target::{RecordingTarget, RenderTarget, TextBuffer};
}
