//! Terminal render target
//!
//! Redraws a single terminal line in place: every frame returns the cursor to
//! column 0, clears the line, and writes the new text.

use glyphshift_core::RenderTarget;
use std::io::{self, Write};

const CLEAR_LINE: &str = "\r\x1b[2K";

/// A render target that owns one line of a terminal
pub struct TerminalLine<W: Write> {
    out: W,
    current: String,
    /// First write failure; later frames are skipped once set
    error: Option<io::Error>,
}

impl<W: Write> TerminalLine<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            current: String::new(),
            error: None,
        }
    }

    /// End the line so later output starts on a fresh one
    pub fn finish_line(&mut self) -> io::Result<()> {
        self.take_error()?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Return the first write error, if any occurred
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn draw(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{}{}", CLEAR_LINE, text)?;
        self.out.flush()
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> RenderTarget for TerminalLine<W> {
    fn text(&self) -> String {
        self.current.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.current = text.to_string();
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.draw(text) {
            tracing::warn!("Terminal write failed: {}", err);
            self.error = Some(err);
        }
    }
}
