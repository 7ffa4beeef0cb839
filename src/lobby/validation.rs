//! Request validation for lobby operations
//!
//! Transports hand raw JSON to these functions and get back typed requests,
//! so the same rules apply to the HTTP API and the bot.

use crate::error::{LobbyError, Result};
use crate::types::{ChatId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MISSING_IDS: &str = "Missing userId or chatId";
const INVALID_ID_TYPES: &str = "Invalid userId or chatId type";

/// A validated `join`/`leave` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub user_id: UserId,
    pub chat_id: ChatId,
}

/// Validate a `{ userId, chatId }` body
///
/// Absent, null and zero identifiers count as missing. Integral numbers are
/// accepted in either integer (`1`) or float (`1.0`) form; anything else is
/// the wrong type.
pub fn validate_membership_request(body: &Value) -> Result<MembershipRequest> {
    let user_id = body.get("userId");
    let chat_id = body.get("chatId");

    if is_missing(user_id) || is_missing(chat_id) {
        return Err(LobbyError::validation(MISSING_IDS));
    }

    match (as_identifier(user_id), as_identifier(chat_id)) {
        (Some(user_id), Some(chat_id)) => Ok(MembershipRequest { user_id, chat_id }),
        _ => Err(LobbyError::validation(INVALID_ID_TYPES)),
    }
}

/// Validate a single user identifier taken from a mini-app payload
pub fn validate_user_id(value: Option<&Value>) -> Result<UserId> {
    if is_missing(value) {
        return Err(LobbyError::validation("Missing userId"));
    }
    as_identifier(value).ok_or_else(|| LobbyError::validation("Invalid userId type"))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        _ => false,
    }
}

fn as_identifier(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
