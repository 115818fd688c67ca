use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Form, Json};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::color::deficiency::DeficiencyMode;
use crate::diagnostics::stats::StatsSnapshot;
use crate::server::state::AppState;
use crate::stream::multipart;

const INDEX_HTML: &str = include_str!("index.html");

/// Fields posted by the control page. Only the pressed button is present.
#[derive(Debug, Default, Deserialize)]
pub struct ModeForm {
    pro: Option<String>,
    deu: Option<String>,
    tri: Option<String>,
    none: Option<String>,
}

impl ModeForm {
    /// The mode requested by the pressed button, if any.
    fn requested_mode(&self) -> Option<DeficiencyMode> {
        let pressed = |field: &Option<String>, label: &str| field.as_deref() == Some(label);
        if pressed(&self.pro, "Protanopia") {
            Some(DeficiencyMode::Protanopia)
        } else if pressed(&self.deu, "Deuteranopia") {
            Some(DeficiencyMode::Deuteranopia)
        } else if pressed(&self.tri, "Tritanopia") {
            Some(DeficiencyMode::Tritanopia)
        } else if pressed(&self.none, "None") {
            Some(DeficiencyMode::None)
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsBody {
    pub mode: DeficiencyMode,
    pub source: String,
    pub active_streams: usize,
    pub stats: StatsSnapshot,
}

/// `GET /` — control page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `POST /` — apply the pressed mode button, then stream.
///
/// A submission without a recognised button leaves the mode as it was.
pub async fn select_and_stream(
    State(state): State<AppState>,
    Form(form): Form<ModeForm>,
) -> Response {
    if let Some(mode) = form.requested_mode() {
        let previous = state.mode.set(mode);
        info!("mode changed: {previous} -> {mode}");
    }
    mjpeg_response(&state)
}

/// `GET /stream` — stream with whatever mode is active.
pub async fn stream(State(state): State<AppState>) -> Response {
    mjpeg_response(&state)
}

/// `GET /api/mode`
pub async fn get_mode(State(state): State<AppState>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: state.mode.get().to_string(),
    })
}

/// `PUT /api/mode` — body `{"mode": "tritanopia"}`.
pub async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeBody>) -> Response {
    match body.mode.parse::<DeficiencyMode>() {
        Ok(mode) => {
            let previous = state.mode.set(mode);
            info!("mode changed: {previous} -> {mode}");
            Json(ModeBody {
                mode: mode.to_string(),
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `GET /api/diagnostics`
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsBody> {
    Json(DiagnosticsBody {
        mode: state.mode.get(),
        source: state.source_name.to_string(),
        active_streams: state.active_stream_count(),
        stats: state.stats.lock().snapshot(),
    })
}

/// Start a stream loop on a blocking worker and hand its frames to the
/// response body as multipart parts.
///
/// The channel holds one frame, so the loop runs at most one frame ahead of
/// the client. The loop checks for a closed channel or server shutdown before
/// every capture read, so it ends even while every frame is being skipped.
fn mjpeg_response(state: &AppState) -> Response {
    let (tx, rx) = mpsc::channel::<Result<Bytes, Infallible>>(1);
    let worker_state = state.clone();

    let watch_tx = tx.clone();
    let watch_state = state.clone();
    let stream_loop = state.stream_loop().with_cancel(move || {
        if watch_state.is_shutting_down() {
            debug!("server shutting down, closing stream");
            true
        } else if watch_tx.is_closed() {
            debug!("client disconnected");
            true
        } else {
            false
        }
    });

    tokio::task::spawn_blocking(move || {
        let active = worker_state.active_streams.fetch_add(1, Ordering::Relaxed) + 1;
        info!("stream opened ({active} active)");

        for encoded in stream_loop {
            if tx.blocking_send(Ok(multipart::frame_part(&encoded))).is_err() {
                debug!("client disconnected");
                break;
            }
        }

        let remaining = worker_state.active_streams.fetch_sub(1, Ordering::Relaxed) - 1;
        info!("stream closed ({remaining} active)");
    });

    (
        [
            (header::CONTENT_TYPE, multipart::CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store"),
        ],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}
