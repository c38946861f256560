/**
 * Logs Route Handler
 * Endpoint for receiving client error reports from the front end
 */

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use tower_http::request_id::RequestId;

use crate::logging::config::{ClientLogBatch, ClientLogEntry, LogLevel, LogResponse};
use crate::state::SharedState;

/// Most entries accepted from one batch.
const MAX_BATCH: usize = 50;

/// POST /api/logs - Receive client logs
#[tracing::instrument(skip(state, logs), fields(batch_size = logs.logs.len()))]
pub async fn receive_client_logs(
    State(state): State<SharedState>,
    request_id: Option<Extension<RequestId>>,
    Json(logs): Json<ClientLogBatch>,
) -> impl IntoResponse {
    let req_id = request_id
        .as_ref()
        .and_then(|ext| ext.0.header_value().to_str().ok())
        .unwrap_or("unknown");

    let min_level = LogLevel::parse(&state.config.client_log_min_severity).unwrap_or(LogLevel::Info);

    let mut processed = 0;
    for log in logs.logs.iter().take(MAX_BATCH) {
        match process_client_log(log, req_id, min_level) {
            Ok(true) => processed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(request_id = %req_id, error = %e, "failed to process client log"),
        }
    }

    tracing::debug!(
        request_id = %req_id,
        received = logs.logs.len(),
        processed,
        "received client logs"
    );

    let response = LogResponse {
        success: true,
        received: logs.logs.len(),
        processed,
        error: None,
    };

    (StatusCode::ACCEPTED, Json(response))
}

/// Re-emit one entry at its own level. `Ok(false)` when filtered out.
fn process_client_log(log: &ClientLogEntry, request_id: &str, min_level: LogLevel) -> Result<bool, String> {
    let level = LogLevel::parse(&log.level).ok_or_else(|| format!("unknown level {:?}", log.level))?;
    if level < min_level {
        return Ok(false);
    }

    let span = tracing::info_span!(
        "client_log",
        request_id = %request_id,
        timestamp = %log.timestamp,
        source = "client",
    );
    let _enter = span.enter();

    match level {
        LogLevel::Trace => tracing::trace!(
            message = %log.message,
            context = ?log.context,
            metadata = ?log.metadata,
            "client log"
        ),
        LogLevel::Debug => tracing::debug!(
            message = %log.message,
            context = ?log.context,
            metadata = ?log.metadata,
            "client log"
        ),
        LogLevel::Info => tracing::info!(
            message = %log.message,
            context = ?log.context,
            metadata = ?log.metadata,
            "client log"
        ),
        LogLevel::Warn => tracing::warn!(
            message = %log.message,
            context = ?log.context,
            metadata = ?log.metadata,
            "client log"
        ),
        LogLevel::Error => tracing::error!(
            message = %log.message,
            context = ?log.context,
            metadata = ?log.metadata,
            "client log"
        ),
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, json_request, test_state};
    use axum::{routing::post, Router};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_entries_below_minimum_are_dropped() {
        let app = Router::new()
            .route("/api/logs", post(receive_client_logs))
            .with_state(test_state());

        let batch = json!({
            "logs": [
                { "timestamp": "2025-01-01T00:00:00Z", "level": "debug", "message": "noise" },
                { "timestamp": "2025-01-01T00:00:01Z", "level": "error", "message": "chart failed to load" },
                { "timestamp": "2025-01-01T00:00:02Z", "level": "bogus", "message": "?" }
            ]
        });
        let res = app
            .oneshot(json_request("POST", "/api/logs", None, &batch))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        let body = body_json(res).await;
        assert_eq!(body["received"], 3);
        assert_eq!(body["processed"], 1);
    }
}
