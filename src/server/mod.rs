// HTTP transport — control page, MJPEG stream, and JSON control API.

pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::index).post(handlers::select_and_stream),
        )
        .route("/stream", get(handlers::stream))
        .route(
            "/api/mode",
            get(handlers::get_mode).put(handlers::set_mode),
        )
        .route("/api/diagnostics", get(handlers::diagnostics))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then stop open streams and drain.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    let stop_flag = Arc::clone(&state.shutdown);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutdown requested, closing streams");
            stop_flag.store(true, Ordering::Relaxed);
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::error::{CaptureError, Result as CaptureResult};
    use crate::capture::source::{CaptureSource, SharedCapture};
    use crate::capture::synthetic::SyntheticCamera;
    use crate::color::deficiency::{DeficiencyMode, ModeSelector};
    use crate::color::engine::ColorTransform;
    use crate::frame::Frame;
    use crate::stream::encode::JpegEncoder;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    /// Source that is already at end-of-stream.
    struct EmptySource;

    impl CaptureSource for EmptySource {
        fn read_frame(&mut self) -> CaptureResult<Frame> {
            Err(CaptureError::EndOfStream)
        }

        fn describe(&self) -> String {
            "empty".to_string()
        }
    }

    fn make_state(source: Box<dyn CaptureSource>) -> AppState {
        AppState::new(
            SharedCapture::new(source),
            Arc::new(ColorTransform::new().unwrap()),
            ModeSelector::new(DeficiencyMode::None),
            JpegEncoder::default(),
        )
    }

    fn synthetic_state(max_frames: u64) -> AppState {
        let camera = SyntheticCamera::new(32, 24, 0.0)
            .unwrap()
            .with_max_frames(max_frames);
        make_state(Box::new(camera))
    }

    /// Source whose frames are too wide to encode, so its stream never yields.
    fn unencodable_state() -> AppState {
        let camera = SyntheticCamera::new(70_000, 1, 0.0).unwrap();
        make_state(Box::new(camera))
    }

    /// Poll until `check` holds, failing after a few seconds.
    async fn wait_until(what: &str, check: impl Fn() -> bool) {
        for _ in 0..500 {
            if check() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {what}");
    }

    async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    fn form_post(body: &'static str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn json_put(uri: &str, body: &'static str) -> Request<Body> {
        Request::put(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn index_serves_control_form() {
        let app = router(synthetic_state(0));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
        assert!(html.contains("name=\"pro\" value=\"Protanopia\""));
        assert!(html.contains("name=\"tri\" value=\"Tritanopia\""));
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let app = router(synthetic_state(0));
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b"ok");
    }

    #[tokio::test]
    async fn form_post_sets_mode_and_streams_frames() {
        let state = synthetic_state(2);
        let app = router(state.clone());

        let response = app.oneshot(form_post("pro=Protanopia")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.mode.get(), DeficiencyMode::Protanopia);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "multipart/x-mixed-replace; boundary=frame"
        );

        let body = body_bytes(response).await;
        let boundaries = body.windows(9).filter(|w| *w == b"--frame\r\n").count();
        assert_eq!(boundaries, 2);
        assert_eq!(state.stats.lock().frame_count(), 2);
    }

    #[tokio::test]
    async fn form_post_without_known_button_keeps_mode() {
        let state = synthetic_state(0);
        state.mode.set(DeficiencyMode::Tritanopia);
        let app = router(state.clone());

        let response = app.oneshot(form_post("pro=Something")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.mode.get(), DeficiencyMode::Tritanopia);
    }

    #[tokio::test]
    async fn form_post_none_button_clears_mode() {
        let state = synthetic_state(0);
        state.mode.set(DeficiencyMode::Deuteranopia);
        let app = router(state.clone());

        app.oneshot(form_post("none=None")).await.unwrap();
        assert_eq!(state.mode.get(), DeficiencyMode::None);
    }

    #[tokio::test]
    async fn stream_from_ended_source_is_empty() {
        let state = make_state(Box::new(EmptySource));
        let app = router(state.clone());
        let response = app
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(state.active_stream_count(), 0);
    }

    #[tokio::test]
    async fn dropped_client_ends_stream_that_never_yields() {
        let state = unencodable_state();
        let response = router(state.clone())
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        wait_until("a skipped frame", || state.stats.lock().drop_count() > 0).await;
        assert_eq!(state.active_stream_count(), 1);

        drop(response);
        wait_until("the stream to close", || state.active_stream_count() == 0).await;
    }

    #[tokio::test]
    async fn shutdown_ends_stream_that_never_yields() {
        let state = unencodable_state();
        let response = router(state.clone())
            .oneshot(Request::get("/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();
        wait_until("a skipped frame", || state.stats.lock().drop_count() > 0).await;

        state.shutdown.store(true, Ordering::Relaxed);
        wait_until("the stream to close", || state.active_stream_count() == 0).await;
        assert!(body_bytes(response).await.is_empty());
        assert_eq!(state.stats.lock().frame_count(), 0);
    }

    #[tokio::test]
    async fn put_mode_updates_selector() {
        let state = synthetic_state(0);
        let app = router(state.clone());
        let response = app
            .oneshot(json_put("/api/mode", r#"{"mode":"Deuteranopia"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.mode.get(), DeficiencyMode::Deuteranopia);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["mode"], "deuteranopia");
    }

    #[tokio::test]
    async fn put_unknown_mode_is_bad_request() {
        let state = synthetic_state(0);
        let app = router(state.clone());
        let response = app
            .oneshot(json_put("/api/mode", r#"{"mode":"sepia"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.mode.get(), DeficiencyMode::None);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().contains("sepia"));
    }

    #[tokio::test]
    async fn get_mode_reports_current_mode() {
        let state = synthetic_state(0);
        state.mode.set(DeficiencyMode::Tritanopia);
        let response = router(state)
            .oneshot(Request::get("/api/mode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["mode"], "tritanopia");
    }

    #[tokio::test]
    async fn diagnostics_reports_stats_and_source() {
        let state = synthetic_state(0);
        let response = router(state)
            .oneshot(
                Request::get("/api/diagnostics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["mode"], "none");
        assert_eq!(json["source"], "synthetic 32x24");
        assert_eq!(json["activeStreams"], 0);
        assert_eq!(json["stats"]["frameCount"], 0);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let state = synthetic_state(0);
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let result = serve(state.clone(), addr, async {}).await;
        assert!(result.is_ok());
        assert!(state.is_shutting_down());
    }
}
