use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{Result, anyhow};
use skirmish_protocol::{BattleType, StartBattleRequest};

/// Game-wide player context shared between scenes
#[derive(Debug)]
pub struct GameSession {
    player_id: String,
    defeated_trainers: RwLock<HashSet<String>>,
}

impl GameSession {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            defeated_trainers: RwLock::new(HashSet::new()),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn mark_trainer_defeated(&self, trainer_id: &str) -> Result<()> {
        self.defeated_trainers
            .write()
            .map_err(|_| anyhow!("Session state poisoned"))?
            .insert(trainer_id.to_string());
        Ok(())
    }

    pub fn has_defeated(&self, trainer_id: &str) -> bool {
        self.defeated_trainers
            .read()
            .map(|t| t.contains(trainer_id))
            .unwrap_or(false)
    }
}

/// Parameters a battle scene is launched with
#[derive(Debug, Clone, PartialEq)]
pub struct BattleLaunch {
    pub player_id: String,
    pub battle_type: BattleType,
    pub opponent_id: Option<String>,
    /// Overworld NPC to mark as beaten on a win
    pub trainer_id: Option<String>,
    /// Scene to hand control back to once the battle ends
    pub return_scene: String,
}

impl BattleLaunch {
    pub fn wild(player_id: impl Into<String>, return_scene: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            battle_type: BattleType::Wild,
            opponent_id: None,
            trainer_id: None,
            return_scene: return_scene.into(),
        }
    }

    pub fn trainer(
        player_id: impl Into<String>,
        trainer_id: impl Into<String>,
        return_scene: impl Into<String>,
    ) -> Self {
        let trainer_id = trainer_id.into();
        Self {
            player_id: player_id.into(),
            battle_type: BattleType::Trainer,
            opponent_id: Some(trainer_id.clone()),
            trainer_id: Some(trainer_id),
            return_scene: return_scene.into(),
        }
    }

    pub fn with_opponent(mut self, opponent_id: impl Into<String>) -> Self {
        self.opponent_id = Some(opponent_id.into());
        self
    }

    pub fn start_request(&self) -> StartBattleRequest {
        StartBattleRequest {
            player_id: self.player_id.clone(),
            opponent_id: self.opponent_id.clone(),
            battle_type: self.battle_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainer_defeat_marking() {
        let session = GameSession::new("ash");
        assert!(!session.has_defeated("brock"));
        session.mark_trainer_defeated("brock").unwrap();
        assert!(session.has_defeated("brock"));
        assert_eq!(session.player_id(), "ash");
    }

    #[test]
    fn test_start_request() {
        let wild = BattleLaunch::wild("ash", "route-1").start_request();
        assert_eq!(wild.opponent_id, None);
        assert_eq!(wild.battle_type, BattleType::Wild);

        let trainer = BattleLaunch::trainer("ash", "brock", "gym").start_request();
        assert_eq!(trainer.opponent_id.as_deref(), Some("brock"));
        assert_eq!(trainer.battle_type, BattleType::Trainer);
    }
}
