//! Async client for the skirmish battle API.
//!
//! [`BattleApi`] is the seam the battle scene talks through;
//! [`HttpBattleApi`] is the production implementation over reqwest.
//! Every call is bounded by [`ApiConfig::request_timeout`], and idempotent
//! calls are retried according to [`RetryPolicy`].

mod config;
mod error;
mod http;
mod names;

use anyhow::Result;

pub use config::{ApiConfig, DEFAULT_API_URL, RetryPolicy};
pub use error::{ApiError, is_timeout};
pub use http::HttpBattleApi;
pub use names::MoveNameCache;

pub use skirmish_protocol::{
    ActionResult, BattleType, CombatantData, EndBattleRequest, Side, StartBattleRequest,
    StartBattleResponse, SwitchRequest, TurnRequest, TurnResult, XpGain,
};

/// Remote battle operations consumed by the turn manager
#[allow(async_fn_in_trait)]
pub trait BattleApi {
    /// Start an encounter
    async fn start_battle(&self, request: &StartBattleRequest) -> Result<StartBattleResponse>;

    /// Resolve one turn around the player's chosen move
    async fn take_turn(&self, request: &TurnRequest) -> Result<TurnResult>;

    /// Persist a change of the player's active combatant
    async fn switch_combatant(&self, request: &SwitchRequest) -> Result<()>;

    /// Close an encounter
    async fn end_battle(&self, request: &EndBattleRequest) -> Result<()>;

    /// Localized display name of a move key
    async fn move_name(&self, key: &str, locale: &str) -> Result<String>;
}
