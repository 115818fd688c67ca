pub mod capture;
pub mod color;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod server;
pub mod stream;

use std::sync::Arc;

use capture::source::{CaptureSource, SharedCapture};
use color::deficiency::ModeSelector;
use color::engine::ColorTransform;
use config::AppConfig;
use error::AppError;
use server::state::AppState;
use stream::encode::JpegEncoder;

/// Build the shared server state from a validated config.
///
/// Fails fast if the transform constants are unusable or the capture source
/// cannot be opened; nothing is served in either case.
pub fn build_state(config: &AppConfig) -> Result<AppState, AppError> {
    let engine = Arc::new(ColorTransform::new()?);
    let source = config.source.open()?;
    tracing::info!("capture source: {}", source.describe());

    Ok(AppState::new(
        SharedCapture::new(source),
        engine,
        ModeSelector::new(config.initial_mode),
        JpegEncoder::new(config.jpeg_quality),
    ))
}

/// Load config, serve until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.bind_addr()?;
    let state = build_state(&config)?;

    server::serve(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {e}");
        }
    })
    .await
    .map_err(AppError::Server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::deficiency::DeficiencyMode;
    use crate::config::SourceConfig;

    #[test]
    fn build_state_uses_config() {
        let config = AppConfig {
            initial_mode: DeficiencyMode::Tritanopia,
            jpeg_quality: 60,
            source: SourceConfig::Synthetic {
                width: 8,
                height: 6,
                fps: 0.0,
                max_frames: Some(1),
            },
            ..AppConfig::default()
        };
        let state = build_state(&config).unwrap();
        assert_eq!(state.mode.get(), DeficiencyMode::Tritanopia);
        assert_eq!(state.encoder.quality(), 60);
        assert_eq!(&*state.source_name, "synthetic 8x6");
    }

    #[test]
    fn build_state_fails_on_missing_image_dir() {
        let config = AppConfig {
            source: SourceConfig::Images {
                dir: "/nonexistent/daltonview-frames".into(),
                fps: 30.0,
                looping: true,
            },
            ..AppConfig::default()
        };
        assert!(matches!(build_state(&config), Err(AppError::Capture(_))));
    }
}
