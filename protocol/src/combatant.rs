//! Combatant payloads
//!
//! The server sends full party members in battle-start responses and in
//! trainer auto-switch notifications. Almost every field is optional on the
//! wire; the domain layer decides what a missing value means.

use serde::{Deserialize, Serialize};

/// A party member as sent by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantData {
    #[serde(rename = "_id")]
    pub id: String,

    /// Generic name, used when nothing better is known
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub nickname: Option<String>,

    #[serde(default)]
    pub species: Option<SpeciesData>,

    /// May be missing or stale on older saves; see `experience`
    #[serde(default)]
    pub level: Option<u8>,

    #[serde(default)]
    pub experience: u32,

    #[serde(rename = "currentHP", default)]
    pub current_hp: u32,

    #[serde(rename = "maxHP", default)]
    pub max_hp: u32,

    #[serde(default)]
    pub stats: StatsData,

    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub moveset: Vec<MoveData>,

    #[serde(default)]
    pub sprites: SpriteRefs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub localized_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    #[serde(default)]
    pub attack: u32,
    #[serde(default)]
    pub defense: u32,
    #[serde(default)]
    pub sp_attack: u32,
    #[serde(default)]
    pub sp_defense: u32,
    #[serde(default)]
    pub speed: u32,
}

/// A move entry. Entries without a name are malformed but still delivered
/// so the client can keep slot positions stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveData {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub move_type: Option<String>,

    /// "physical", "special" or "status"
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub power: Option<u32>,

    #[serde(default)]
    pub accuracy: Option<u32>,

    #[serde(default)]
    pub pp: Option<u32>,

    #[serde(rename = "maxPP", default)]
    pub max_pp: Option<u32>,
}

/// Opaque sprite references; resolved by the rendering host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteRefs {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    #[serde(default)]
    pub front_animated: Option<String>,
    #[serde(default)]
    pub back_animated: Option<String>,
}
