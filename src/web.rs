use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::worker::InferencePool;

/// Drawing page served on `/`.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Body of `POST /predict`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PredictRequest {
    /// The drawing as a `data:image/png;base64,...` URL.
    pub image: String,
}

/// Body returned by `POST /predict`, either `{"label": ..}` or `{"error": ..}`.
///
/// Failures are reported in the body only; the status code is always 200.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredictResponse {
    Label(String),
    Error(String),
}

/// Routes of the prediction server.
///
/// A body over `max_body_bytes` is rejected while extracting the JSON, so it is
/// answered like any other malformed payload.
pub fn router(pool: InferencePool, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(pool)
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn predict(
    State(pool): State<InferencePool>,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Json<PredictResponse> {
    let response = match classify(&pool, payload).await {
        Ok(label) => PredictResponse::Label(label.to_string()),
        Err(err) => {
            log::warn!("Prediction failed: {err}");
            PredictResponse::Error(err.to_string())
        }
    };

    Json(response)
}

async fn classify(
    pool: &InferencePool,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<&'static str> {
    let Json(request) = payload.map_err(|rejection| Error::Payload(rejection.body_text()))?;

    pool.classify(request.image).await
}

/// Serves the drawing page and the prediction endpoint until Ctrl-C.
pub async fn serve(pool: InferencePool, config: &ServerConfig) -> Result<()> {
    let address = config.address()?;
    let app = router(pool, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(address).await?;
    log::info!("Start server on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown requested"),
        Err(err) => {
            log::error!("Cannot listen for Ctrl-C, the server will only stop when killed: {err}");
            std::future::pending::<()>().await;
        }
    }
}
