//! Wire types for the skirmish battle REST API.
//!
//! Every request and response body exchanged with the battle server is
//! modelled here. Field names follow the server's JSON (camelCase, with a
//! handful of legacy spellings such as `_id` and `currentHP`).

use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod combatant;
pub mod request;
pub mod response;
pub mod side;


pub use combatant::{CombatantData, MoveData, SpeciesData, SpriteRefs, StatsData};
pub use request::{ActionType, EndBattleRequest, StartBattleRequest, SwitchRequest, TurnRequest};
pub use response::{
    ActionResult, Ack, EvolutionData, LocalizedName, StartBattleResponse, TurnResult, XpGain,
};
pub use side::{BattleType, Side};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Server rejected request: {0}")]
    Server(String),

    #[error("Empty response body")]
    EmptyBody,
}

/// Decode a JSON response body.
///
/// A body of the shape `{"error": "..."}` is reported as
/// [`ProtocolError::Server`] rather than as a decoding failure, since the
/// battle server uses it for every rejected action.
pub fn decode<T: DeserializeOwned>(body: &str) -> anyhow::Result<T> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ProtocolError::EmptyBody.into());
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ProtocolError::InvalidFormat(e.to_string()))?;

    if let Some(message) = server_error(&value) {
        return Err(ProtocolError::Server(message).into());
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidFormat(e.to_string()).into())
}

fn server_error(value: &serde_json::Value) -> Option<String> {
    value
        .as_object()?
        .get("error")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
