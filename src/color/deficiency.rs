use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::color::error::ColorError;

/// Colour-vision deficiency being simulated and compensated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DeficiencyMode {
    /// Pass-through, no transformation.
    #[default]
    None = 0,
    Protanopia = 1,
    Deuteranopia = 2,
    Tritanopia = 3,
}

impl DeficiencyMode {
    /// All modes that carry a transform profile.
    pub const DEFICIENCIES: [DeficiencyMode; 3] = [
        DeficiencyMode::Protanopia,
        DeficiencyMode::Deuteranopia,
        DeficiencyMode::Tritanopia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeficiencyMode::None => "none",
            DeficiencyMode::Protanopia => "protanopia",
            DeficiencyMode::Deuteranopia => "deuteranopia",
            DeficiencyMode::Tritanopia => "tritanopia",
        }
    }

    /// Whether frames in this mode pass through untouched.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, DeficiencyMode::None)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => DeficiencyMode::Protanopia,
            2 => DeficiencyMode::Deuteranopia,
            3 => DeficiencyMode::Tritanopia,
            _ => DeficiencyMode::None,
        }
    }
}

impl fmt::Display for DeficiencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeficiencyMode {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(DeficiencyMode::None),
            "protanopia" => Ok(DeficiencyMode::Protanopia),
            "deuteranopia" => Ok(DeficiencyMode::Deuteranopia),
            "tritanopia" => Ok(DeficiencyMode::Tritanopia),
            other => Err(ColorError::UnknownMode(other.to_string())),
        }
    }
}

/// Process-wide active mode, shared between the control surface and every
/// running stream.
///
/// Cloning yields another handle to the same selector. Reads and writes are
/// single-word atomics; a mode change is picked up by each stream on its next
/// frame.
#[derive(Debug, Clone, Default)]
pub struct ModeSelector {
    current: Arc<AtomicU8>,
}

impl ModeSelector {
    pub fn new(initial: DeficiencyMode) -> Self {
        Self {
            current: Arc::new(AtomicU8::new(initial as u8)),
        }
    }

    pub fn get(&self) -> DeficiencyMode {
        DeficiencyMode::from_u8(self.current.load(Ordering::Relaxed))
    }

    /// Replace the active mode, returning the previous one.
    pub fn set(&self, mode: DeficiencyMode) -> DeficiencyMode {
        DeficiencyMode::from_u8(self.current.swap(mode as u8, Ordering::Relaxed))
    }
}
