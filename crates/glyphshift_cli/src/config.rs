//! Glyphshift configuration file handling
//!
//! Settings live in `glyphshift.toml`:
//! - `[scramble]` - engine tuning (frame budget, windows, flicker)
//! - `[alphabet]` - substitution glyphs
//! - `[playback]` - terminal playback defaults

use anyhow::{Context, Result};
use glyphshift_animation::ScrambleConfig;
use glyphshift_core::{Alphabet, DEFAULT_GLYPHS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "glyphshift.toml";

/// Complete configuration stored in glyphshift.toml
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GlyphshiftConfig {
    #[serde(default)]
    pub scramble: ScrambleConfig,
    #[serde(default)]
    pub alphabet: AlphabetConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Substitution glyphs
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct AlphabetConfig {
    #[serde(default = "default_glyphs")]
    pub glyphs: String,
}

fn default_glyphs() -> String {
    DEFAULT_GLYPHS.to_string()
}

impl Default for AlphabetConfig {
    fn default() -> Self {
        Self {
            glyphs: default_glyphs(),
        }
    }
}

/// Terminal playback defaults
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct PlaybackConfig {
    /// Frames per second the terminal is redrawn at
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Transition duration in seconds
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Seconds a converged phrase stays up before the next one starts
    #[serde(default = "default_hold")]
    pub hold: f64,
}

fn default_fps() -> u32 {
    60
}

fn default_duration() -> f64 {
    1.0
}

fn default_hold() -> f64 {
    1.0
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            duration: default_duration(),
            hold: default_hold(),
        }
    }
}

impl GlyphshiftConfig {
    /// Load glyphshift.toml from `dir`, falling back to defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, dir.display());
            return Ok(Self::default());
        }
        Self::load(&config_path)
    }

    /// Load an explicit configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: GlyphshiftConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section is usable
    pub fn validate(&self) -> Result<()> {
        self.scramble.validate()?;
        self.alphabet()?;
        if self.playback.fps == 0 {
            anyhow::bail!("playback.fps must be at least 1");
        }
        if !self.playback.hold.is_finite() || self.playback.hold < 0.0 {
            anyhow::bail!(
                "playback.hold must be a non-negative number, got {}",
                self.playback.hold
            );
        }
        Ok(())
    }

    /// The configured alphabet
    pub fn alphabet(&self) -> Result<Alphabet> {
        Ok(Alphabet::new(&self.alphabet.glyphs)?)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
