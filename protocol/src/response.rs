//! Response bodies returned by the battle server

use serde::{Deserialize, Serialize};

use crate::combatant::CombatantData;
use crate::side::Side;

/// Response to a successful battle start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartBattleResponse {
    pub battle_id: String,

    #[serde(default)]
    pub player_team: Vec<CombatantData>,

    #[serde(default)]
    pub opponent_team: Vec<CombatantData>,

    /// Advisory history; never used for control flow
    #[serde(default)]
    pub battle_log: Vec<serde_json::Value>,
}

/// Authoritative resolution of one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    #[serde(default)]
    pub player_action: Option<ActionResult>,

    #[serde(default)]
    pub opponent_action: Option<ActionResult>,

    #[serde(rename = "playerHP")]
    pub player_hp: u32,

    #[serde(rename = "opponentHP")]
    pub opponent_hp: u32,

    #[serde(default)]
    pub is_over: bool,

    #[serde(default)]
    pub winner: Option<Side>,

    #[serde(default)]
    pub xp_gains: Vec<XpGain>,

    /// Trainer battles only: the opponent sent out a new combatant
    #[serde(default)]
    pub opponent_switched: bool,

    #[serde(default)]
    pub new_opponent_active: Option<CombatantData>,

    #[serde(default)]
    pub new_opponent_active_index: Option<usize>,
}

impl TurnResult {
    pub fn player_won(&self) -> bool {
        self.winner == Some(Side::Player)
    }

    /// The replacement opponent, when the server signalled an auto-switch
    pub fn auto_switch(&self) -> Option<&CombatantData> {
        if self.opponent_switched {
            self.new_opponent_active.as_ref()
        } else {
            None
        }
    }
}

/// Outcome of one side's action within a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    #[serde(default)]
    pub missed: bool,

    #[serde(default)]
    pub damage: u32,

    #[serde(default = "neutral")]
    pub effectiveness: f32,

    #[serde(default)]
    pub critical: bool,

    #[serde(default, alias = "move")]
    pub move_name: Option<String>,

    /// Attached by the client before animation dispatch; the server never
    /// sends it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
}

fn neutral() -> f32 {
    1.0
}

impl ActionResult {
    pub fn tagged(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }
}

/// Experience earned by one teammate at the end of a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpGain {
    #[serde(alias = "pokemonId")]
    pub combatant_id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub xp_gained: u32,

    #[serde(default)]
    pub leveled_up: bool,

    #[serde(default)]
    pub new_level: Option<u8>,

    #[serde(default)]
    pub new_moves_available: Vec<String>,

    #[serde(default)]
    pub evolution: Option<EvolutionData>,

    /// Experience before the gain; the client falls back to its own party
    /// state when absent
    #[serde(default)]
    pub old_experience: Option<u32>,

    #[serde(default)]
    pub old_level: Option<u8>,
}

/// Evolution triggered by a level-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionData {
    #[serde(default)]
    pub from: Option<String>,

    pub to: String,

    /// Full post-evolution payload, when the server already has it
    #[serde(default)]
    pub evolved: Option<CombatantData>,
}

/// Generic acknowledgement body (switch, battle end)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    #[serde(default = "accepted")]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,
}

fn accepted() -> bool {
    true
}

/// GET /moves/{key}/name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
}
