//! Glyph alphabets
//!
//! An [`Alphabet`] is the ordered set of characters a scramble draws its random
//! substitutes from. It is validated once at construction and never changes.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScrambleError};

/// Default substitution glyphs: uppercase letters, digits, and punctuation
pub const DEFAULT_GLYPHS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890!@#$%^&*()_+-={}[]<>?/";

/// A non-empty, immutable sequence of substitution glyphs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    glyphs: Vec<char>,
}

impl Alphabet {
    /// Create an alphabet from the characters of `glyphs`
    ///
    /// Duplicates are kept, so a glyph listed twice is drawn twice as often.
    pub fn new(glyphs: &str) -> Result<Self> {
        Self::from_chars(glyphs.chars())
    }

    /// Create an alphabet from any sequence of characters
    pub fn from_chars<I>(glyphs: I) -> Result<Self>
    where
        I: IntoIterator<Item = char>,
    {
        let glyphs: Vec<char> = glyphs.into_iter().collect();
        if glyphs.is_empty() {
            return Err(ScrambleError::EmptyAlphabet);
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs (always at least 1)
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; present for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Glyph at `index`, wrapping around the alphabet length
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index % self.glyphs.len()]
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains(&c)
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_GLYPHS.chars().collect(),
        }
    }
}

impl FromStr for Alphabet {
    type Err = ScrambleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.glyphs {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
