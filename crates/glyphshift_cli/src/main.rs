//! Glyphshift CLI
//!
//! Play, inspect, and configure text-scramble transitions from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glyphshift_animation::{
    FrameScheduler, ScrambleConfig, ScrambleEngine, SetTextOptions, TextScrambler,
};
use glyphshift_core::Alphabet;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod terminal;

use config::{GlyphshiftConfig, CONFIG_FILE};
use terminal::TerminalLine;

#[derive(Parser)]
#[command(name = "glyphshift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Text-scramble transitions for the terminal", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ./glyphshift.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scramble through one or more phrases on a single terminal line
    Play {
        /// Phrases to show, in order
        #[arg(required = true)]
        phrases: Vec<String>,

        /// Transition duration in seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// Reveal each phrase from a blank line
        #[arg(short = 'b', long)]
        from_blank: bool,

        /// Seconds to hold each converged phrase
        #[arg(long)]
        hold: Option<f64>,

        /// Redraw rate in frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,

        /// Substitution glyphs
        #[arg(short, long)]
        alphabet: Option<String>,

        /// Write each phrase without animating
        #[arg(long)]
        reduce_motion: bool,
    },

    /// Print the per-character schedule for a transition
    Schedule {
        /// Target text
        text: String,

        /// Text shown before the transition
        #[arg(short, long, default_value = "")]
        from: String,

        /// Transition duration in seconds
        #[arg(short, long, default_value = "1.0")]
        duration: f64,

        /// Plan from a blank line instead of --from
        #[arg(short = 'b', long)]
        from_blank: bool,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Write a glyphshift.toml with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version and effective settings
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging on stderr, stdout belongs to the animated line
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play {
            phrases,
            duration,
            from_blank,
            hold,
            fps,
            seed,
            alphabet,
            reduce_motion,
        } => {
            let options = PlayOptions {
                duration: duration.unwrap_or(config.playback.duration),
                from_blank,
                hold: hold.unwrap_or(config.playback.hold),
                fps: fps.unwrap_or(config.playback.fps),
                seed,
                alphabet,
                reduce_motion,
            };
            cmd_play(&config, &phrases, &options)
        }

        Commands::Schedule {
            text,
            from,
            duration,
            from_blank,
            seed,
        } => cmd_schedule(&config, &text, &from, duration, from_blank, seed),

        Commands::Init { force } => cmd_init(force),

        Commands::Info => cmd_info(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<GlyphshiftConfig> {
    match path {
        Some(path) => GlyphshiftConfig::load(path),
        None => {
            let cwd = std::env::current_dir()?;
            GlyphshiftConfig::load_from_dir(&cwd)
        }
    }
}

struct PlayOptions {
    duration: f64,
    from_blank: bool,
    hold: f64,
    fps: u32,
    seed: Option<u64>,
    alphabet: Option<String>,
    reduce_motion: bool,
}

fn build_engine(
    config: &GlyphshiftConfig,
    scramble: ScrambleConfig,
    alphabet: Option<&str>,
    seed: Option<u64>,
) -> Result<ScrambleEngine> {
    let alphabet = match alphabet {
        Some(glyphs) => Alphabet::new(glyphs).context("Invalid --alphabet")?,
        None => config.alphabet()?,
    };

    let engine = match seed {
        Some(seed) => ScrambleEngine::seeded(alphabet, seed),
        None => ScrambleEngine::new(alphabet),
    };
    Ok(engine.with_config(scramble)?)
}

fn cmd_play(config: &GlyphshiftConfig, phrases: &[String], options: &PlayOptions) -> Result<()> {
    if options.fps == 0 {
        anyhow::bail!("--fps must be at least 1");
    }
    if !options.hold.is_finite() || options.hold < 0.0 {
        anyhow::bail!("--hold must be a non-negative number of seconds");
    }

    let mut scramble = config.scramble.clone();
    scramble.reduce_motion |= options.reduce_motion;

    let engine = build_engine(config, scramble, options.alphabet.as_deref(), options.seed)?;

    info!(
        "Playing {} phrase(s) at {} fps ({}s each)",
        phrases.len(),
        options.fps,
        options.duration
    );

    let scheduler = FrameScheduler::new();
    let scrambler = TextScrambler::with_engine(
        TerminalLine::new(io::stdout()),
        engine,
        scheduler.handle(),
    );

    let set_options = SetTextOptions::new()
        .with_duration(options.duration)
        .from_blank(options.from_blank);
    let hold = Duration::from_secs_f64(options.hold);

    for (i, phrase) in phrases.iter().enumerate() {
        scrambler.set_text(phrase, set_options);
        let frames = scheduler.run_until_idle(options.fps);
        tracing::debug!("Phrase {} converged after {} frames", i + 1, frames);

        scrambler
            .with_target(|line| line.take_error())
            .context("Failed to draw to the terminal")?;

        if i + 1 < phrases.len() {
            thread::sleep(hold);
        }
    }

    scrambler
        .with_target(|line| line.finish_line())
        .context("Failed to draw to the terminal")?;

    Ok(())
}

fn cmd_schedule(
    config: &GlyphshiftConfig,
    text: &str,
    from: &str,
    duration: f64,
    from_blank: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut engine = build_engine(config, config.scramble.clone(), None, seed)?;
    let options = SetTextOptions::new()
        .with_duration(duration)
        .from_blank(from_blank);
    engine.begin(from, text, &options);

    println!(
        "{} slots, {} frame budget ({}s at {} Hz)",
        engine.slots().len(),
        engine.total_frames(),
        duration,
        config.scramble.refresh_rate
    );
    println!();
    println!(
        "{:>5}  {:>4}  {:>4}  {:>5}  {:>5}  {:>6}",
        "slot", "from", "to", "start", "end", "frames"
    );

    let mut last_frame = 0;
    for (i, slot) in engine.slots().iter().enumerate() {
        println!(
            "{:>5}  {:>4}  {:>4}  {:>5}  {:>5}  {:>6}",
            i,
            format!("{:?}", slot.from),
            format!("{:?}", slot.to),
            slot.start_frame,
            slot.end_frame,
            slot.scramble_frames()
        );
        last_frame = last_frame.max(slot.end_frame);
    }

    println!();
    println!("Converges on frame {}", last_frame);

    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let path = cwd.join(CONFIG_FILE);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    GlyphshiftConfig::default().save(&path)?;
    info!("Wrote {}", path.display());

    Ok(())
}

fn cmd_info(config: &GlyphshiftConfig) -> Result<()> {
    let scramble = &config.scramble;

    println!("Glyphshift");
    println!("==========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Scramble:");
    println!("  - Assumed refresh rate: {} Hz", scramble.refresh_rate);
    println!("  - Minimum frame budget: {}", scramble.min_total_frames);
    println!(
        "  - Start window: min({}, budget x {})",
        scramble.max_start_frames, scramble.start_ratio
    );
    println!(
        "  - Spread window: min({}, budget x {})",
        scramble.max_spread_frames, scramble.spread_ratio
    );
    println!("  - Minimum scramble: {} frames", scramble.min_scramble_frames);
    println!("  - Re-roll probability: {}", scramble.reroll_probability);
    println!("  - Reduce motion: {}", scramble.reduce_motion);
    println!();
    println!("Alphabet: {}", config.alphabet.glyphs);
    println!();
    println!("Playback:");
    println!("  - {} fps", config.playback.fps);
    println!("  - {}s per transition", config.playback.duration);
    println!("  - {}s hold", config.playback.hold);

    Ok(())
}
