//! Lobby endpoints consumed by the mini-app

use crate::api::response::{ApiError, ApiResponse, GameStateData, MembershipData};
use crate::api::ApiState;
use crate::error::LobbyError;
use crate::lobby::{validate_membership_request, MembershipRequest};
use crate::types::ChatId;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Query string of `GET /api/game-state`
#[derive(Debug, Default, Deserialize)]
pub struct GameStateQuery {
    #[serde(rename = "chatId")]
    pub chat_id: Option<ChatId>,
}

/// `POST /api/join`
pub async fn join_handler(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<MembershipData>>, ApiError> {
    let request = parse_membership(body)?;
    let snapshot = state
        .lobby_manager
        .join(request.user_id, request.chat_id)
        .await?;

    Ok(ApiResponse::ok(MembershipData::from(&snapshot)))
}

/// `POST /api/leave`
pub async fn leave_handler(
    State(state): State<ApiState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<MembershipData>>, ApiError> {
    let request = parse_membership(body)?;
    let snapshot = state
        .lobby_manager
        .leave(request.user_id, request.chat_id)
        .await?;

    Ok(ApiResponse::ok(MembershipData::from(&snapshot)))
}

/// `GET /api/game-state[?chatId=N]`
pub async fn game_state_handler(
    State(state): State<ApiState>,
    query: Result<Query<GameStateQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<GameStateData>>, ApiError> {
    let Query(query) =
        query.map_err(|_| LobbyError::validation("Invalid chatId type"))?;
    debug!("Game state requested for chat {:?}", query.chat_id);

    let snapshot = state.lobby_manager.status(query.chat_id)?;
    Ok(ApiResponse::ok(GameStateData::from(&snapshot)))
}

fn parse_membership(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<MembershipRequest, LobbyError> {
    match body {
        Ok(Json(value)) => validate_membership_request(&value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            match rejection {
                JsonRejection::JsonSyntaxError(_) => {
                    Err(LobbyError::validation("Malformed request body"))
                }
                // No usable body at all, same as an empty object
                _ => Err(LobbyError::validation("Missing userId or chatId")),
            }
        }
    }
}
