//! Request bodies sent to the battle server

use serde::{Deserialize, Serialize};

use crate::side::{BattleType, Side};

/// POST /battle/start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBattleRequest {
    pub player_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<String>,

    pub battle_type: BattleType,
}

/// The only action the turn endpoint accepts from this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Move,
}

/// POST /battle/turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub battle_id: String,
    pub action_type: ActionType,
    pub move_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

impl TurnRequest {
    /// Build a move action against the opponent's active combatant
    pub fn use_move(battle_id: impl Into<String>, move_name: impl Into<String>) -> Self {
        Self {
            battle_id: battle_id.into(),
            action_type: ActionType::Move,
            move_name: move_name.into(),
            target_id: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }
}

/// POST /battle/switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRequest {
    pub battle_id: String,
    pub new_index: usize,
}

/// POST /battle/end
///
/// `winner` is `None` when the player fled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndBattleRequest {
    pub battle_id: String,
    pub winner: Option<Side>,
}
