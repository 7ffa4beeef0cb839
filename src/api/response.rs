//! JSON envelopes and error-to-status mapping for the lobby endpoints

use crate::error::{LobbyError, LobbyErrorKind};
use crate::types::{ChatId, LobbySnapshot, UserId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Payload of `join` and `leave` responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipData {
    pub players: Vec<UserId>,
    pub player_count: usize,
    pub is_game_full: bool,
}

impl From<&LobbySnapshot> for MembershipData {
    fn from(snapshot: &LobbySnapshot) -> Self {
        Self {
            players: snapshot.players.clone(),
            player_count: snapshot.player_count,
            is_game_full: snapshot.is_full,
        }
    }
}

/// Payload of `game-state` responses; `chatId` is `null` before any join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateData {
    pub players: Vec<UserId>,
    pub player_count: usize,
    pub chat_id: Option<ChatId>,
    pub max_players: usize,
}

impl From<&LobbySnapshot> for GameStateData {
    fn from(snapshot: &LobbySnapshot) -> Self {
        Self {
            players: snapshot.players.clone(),
            player_count: snapshot.player_count,
            chat_id: snapshot.chat_id,
            max_players: snapshot.max_players,
        }
    }
}

/// Lobby error rendered as `{ "success": false, "error": ... }`
#[derive(Debug)]
pub struct ApiError(pub LobbyError);

impl From<LobbyError> for ApiError {
    fn from(error: LobbyError) -> Self {
        Self(error)
    }
}

/// HTTP status for each error kind
pub fn status_for(kind: LobbyErrorKind) -> StatusCode {
    match kind {
        LobbyErrorKind::Validation => StatusCode::BAD_REQUEST,
        LobbyErrorKind::Game => StatusCode::CONFLICT,
        LobbyErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let message = match kind {
            LobbyErrorKind::Internal => {
                error!("Lobby request failed: {}", self.0);
                "Internal server error".to_string()
            }
            _ => self.0.to_string(),
        };

        (
            status_for(kind),
            Json(json!({
                "success": false,
                "error": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(LobbyErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(LobbyErrorKind::Game), StatusCode::CONFLICT);
        assert_eq!(
            status_for(LobbyErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_game_state_serializes_null_chat() {
        let data = GameStateData::from(&LobbySnapshot::empty(4));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            json!({"players": [], "playerCount": 0, "chatId": null, "maxPlayers": 4})
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = ApiError(LobbyError::internal("lock poisoned")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError(LobbyError::Full { max_players: 4 }).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
