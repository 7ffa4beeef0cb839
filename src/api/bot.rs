//! Chat-bot webhook endpoint

use crate::api::ApiState;
use crate::bot::Update;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, warn};

/// `POST /bot/webhook`
///
/// Always answers 200 so the platform does not redeliver; the reply, when
/// there is one, travels back in the response body.
pub async fn webhook_handler(
    State(state): State<ApiState>,
    body: Result<Json<Update>, JsonRejection>,
) -> Response {
    let Some(handler) = &state.bot else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let timer = state.metrics_collector.start_timer();

    let reply = match body {
        Ok(Json(update)) => {
            let reply = handler.handle_update(&update).await;
            debug!("Handled update {}", update.update_id);
            reply
        }
        Err(rejection) => {
            warn!("Ignoring malformed webhook update: {}", rejection.body_text());
            None
        }
    };
    state.metrics_collector.record_webhook(timer.stop());

    match reply {
        Some(reply) => {
            debug!("Replying in chat {}", reply.chat_id);
            Json(reply).into_response()
        }
        None => StatusCode::OK.into_response(),
    }
}
