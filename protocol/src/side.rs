use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two sides of an encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    /// The side facing this one
    pub fn other(self) -> Self {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Opponent => "opponent",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of encounter requested at battle start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleType {
    Wild,
    Pvp,
    Trainer,
}

impl BattleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BattleType::Wild => "wild",
            BattleType::Pvp => "pvp",
            BattleType::Trainer => "trainer",
        }
    }

    /// Only wild encounters can be fled from
    pub fn can_flee(&self) -> bool {
        matches!(self, BattleType::Wild)
    }
}

impl fmt::Display for BattleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
