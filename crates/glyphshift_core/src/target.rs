//! Render targets
//!
//! A render target is the single text-bearing output a scramble writes to once per
//! frame. Hosts implement [`RenderTarget`] for whatever displays the text (a terminal
//! line, a label widget, a DOM node through bindings).

/// Text-bearing output written once per frame
pub trait RenderTarget {
    /// The text currently displayed
    fn text(&self) -> String;

    /// Replace the displayed text
    fn set_text(&mut self, text: &str);
}

impl<T: RenderTarget + ?Sized> RenderTarget for Box<T> {
    fn text(&self) -> String {
        (**self).text()
    }

    fn set_text(&mut self, text: &str) {
        (**self).set_text(text)
    }
}

/// In-memory render target holding the last written text
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl RenderTarget for TextBuffer {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }
}

/// Render target that remembers every frame written to it
///
/// Useful for previews and for asserting on intermediate frames.
#[derive(Clone, Debug, Default)]
pub struct RecordingTarget {
    current: String,
    frames: Vec<String>,
}

impl RecordingTarget {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            current: text.into(),
            frames: Vec::new(),
        }
    }

    /// Every text written so far, oldest first
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Number of writes received
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Forget recorded frames, keeping the current text
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }
}

impl RenderTarget for RecordingTarget {
    fn text(&self) -> String {
        self.current.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.current = text.to_string();
        self.frames.push(self.current.clone());
    }
}
