use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ─── Notes ──────────────────────────────────────────────────────────────────

/// A note name paired with the colour it is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Note {
    pub name: &'static str,
    /// `#RRGGBB`
    pub color: &'static str,
}

impl Note {
    /// Parse `color` into an RGB triple. Malformed colours fall back to white.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.color.trim_start_matches('#');
        if hex.len() != 6 {
            return (255, 255, 255);
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
        (channel(0), channel(2), channel(4))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.color)
    }
}

// ─── Scale ──────────────────────────────────────────────────────────────────

/// Which note list the selector draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Major,
    Minor,
}

impl Scale {
    pub fn toggled(self) -> Self {
        match self {
            Scale::Major => Scale::Minor,
            Scale::Minor => Scale::Major,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Major => "major",
            Scale::Minor => "minor",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Scale::Major),
            "minor" => Ok(Scale::Minor),
            other => Err(format!("unknown scale {other:?} (expected \"major\" or \"minor\")")),
        }
    }
}

// ─── User parameters ────────────────────────────────────────────────────────

/// User-controlled tempo and scale. Mutable in both phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Params {
    pub bpm: u32,
    pub scale: Scale,
}

impl Params {
    pub fn new(bpm: i64, scale: Scale) -> Self {
        Self {
            bpm: Self::clamp_bpm(bpm),
            scale,
        }
    }

    /// Clamp any requested tempo into [`BPM_MIN`, `BPM_MAX`].
    pub fn clamp_bpm(bpm: i64) -> u32 {
        bpm.clamp(BPM_MIN as i64, BPM_MAX as i64) as u32
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bpm: BPM_DEFAULT,
            scale: Scale::Major,
        }
    }
}

// ─── Controller state & events ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
}

/// User input, delivered to the controller over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    /// Start when idle, stop when running (the single toggle button).
    Toggle,
    SetBpm(i64),
    NudgeBpm(i64),
    SetScale(Scale),
    ToggleScale,
    Quit,
}

/// Snapshot of everything the UI needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct View {
    pub phase: Phase,
    pub bpm: u32,
    pub scale: Scale,
    pub beat: i64,
    /// Present only while running with a beat counted.
    pub note: Option<Note>,
}

impl View {
    pub fn button_label(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "Start",
            Phase::Running => "Stop",
        }
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

/// Beat count while no note is due (stopped, or started but before the first tick).
pub const BEAT_IDLE: i64 = -1;

pub const BPM_MIN: u32 = 40;
pub const BPM_MAX: u32 = 180;
pub const BPM_DEFAULT: u32 = 40;

/// Click played on every beat, relative to the working directory.
pub const TICK_ASSET_PATH: &str = "assets/tick.wav";
