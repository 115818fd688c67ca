use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::capture::error::Result as CaptureResult;
use crate::capture::sequence::ImageSequence;
use crate::capture::source::CaptureSource;
use crate::capture::synthetic::SyntheticCamera;
use crate::color::deficiency::DeficiencyMode;
use crate::stream::encode::{DEFAULT_JPEG_QUALITY, MAX_JPEG_DIMENSION};

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_VAR: &str = "DALTONVIEW_CONFIG";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where frames come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Generated test pattern.
    Synthetic {
        width: u32,
        height: u32,
        fps: f32,
        #[serde(default)]
        max_frames: Option<u64>,
    },
    /// Directory of still images replayed in name order.
    Images {
        dir: PathBuf,
        fps: f32,
        #[serde(default = "default_looping")]
        looping: bool,
    },
}

fn default_looping() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Synthetic {
            width: 640,
            height: 480,
            fps: 30.0,
            max_frames: None,
        }
    }
}

impl SourceConfig {
    /// Acquire the capture source.
    pub fn open(&self) -> CaptureResult<Box<dyn CaptureSource>> {
        match self {
            SourceConfig::Synthetic {
                width,
                height,
                fps,
                max_frames,
            } => {
                let mut camera = SyntheticCamera::new(*width, *height, *fps)?;
                if let Some(limit) = max_frames {
                    camera = camera.with_max_frames(*limit);
                }
                Ok(Box::new(camera))
            }
            SourceConfig::Images { dir, fps, looping } => {
                Ok(Box::new(ImageSequence::open(dir, *fps, *looping)?))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let fps = match self {
            SourceConfig::Synthetic {
                width, height, fps, ..
            } => {
                if *width == 0 || *height == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "synthetic source size must be non-zero, got {width}x{height}"
                    )));
                }
                if *width > MAX_JPEG_DIMENSION || *height > MAX_JPEG_DIMENSION {
                    return Err(ConfigError::Invalid(format!(
                        "synthetic source size {width}x{height} exceeds the JPEG limit of {MAX_JPEG_DIMENSION}"
                    )));
                }
                *fps
            }
            SourceConfig::Images { fps, .. } => *fps,
        };
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "source fps must be positive, got {fps}"
            )));
        }
        Ok(())
    }
}

/// Top-level application configuration. Read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server listens on.
    pub bind: String,
    /// Mode active before any control request arrives.
    pub initial_mode: DeficiencyMode,
    pub jpeg_quality: u8,
    /// tracing level: error, warn, info, debug or trace.
    pub log_level: String,
    pub source: SourceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            initial_mode: DeficiencyMode::None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            log_level: "info".to_string(),
            source: SourceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, returning defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build from the process environment: the file named by
    /// `DALTONVIEW_CONFIG` (if any), then per-field overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DALTONVIEW_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(bind) = lookup("DALTONVIEW_BIND") {
            self.bind = bind;
        }
        if let Some(mode) = lookup("DALTONVIEW_MODE") {
            self.initial_mode = mode
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("DALTONVIEW_MODE: {e}")))?;
        }
        if let Some(quality) = lookup("DALTONVIEW_JPEG_QUALITY") {
            self.jpeg_quality = quality.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("DALTONVIEW_JPEG_QUALITY: not a number: '{quality}'"))
            })?;
        }
        if let Some(level) = lookup("DALTONVIEW_LOG") {
            self.log_level = level;
        }
        if let Some(source) = lookup("DALTONVIEW_SOURCE") {
            self.source = if source.eq_ignore_ascii_case("synthetic") {
                SourceConfig::default()
            } else {
                SourceConfig::Images {
                    dir: PathBuf::from(source),
                    fps: 30.0,
                    looping: true,
                }
            };
        }
        Ok(())
    }

    /// Check ranges and parse-ability of every field.
    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        self.log_level()?;
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        self.source.validate()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind address '{}': {e}", self.bind)))
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))
    }
}
