//! BattleState - root aggregate for one encounter

use skirmish_protocol::{BattleType, CombatantData, Side, StartBattleResponse};

use super::StateError;
use super::party::Party;
use crate::types::Combatant;

/// Full mutable state of one encounter
///
/// Created from a successful battle-start response and dropped when the
/// encounter ends. Every mutation replaces whole fields or whole party
/// members.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleState {
    pub battle_id: String,
    pub battle_type: BattleType,
    pub player: Party,
    pub opponent: Party,

    /// Turns resolved so far
    turn: u32,

    /// Append-only turn summaries; advisory only
    log: Vec<String>,
}

impl BattleState {
    pub fn new(battle_id: impl Into<String>, battle_type: BattleType, player: Party, opponent: Party) -> Self {
        Self {
            battle_id: battle_id.into(),
            battle_type,
            player,
            opponent,
            turn: 0,
            log: Vec::new(),
        }
    }

    /// Build from the server's battle-start response
    pub fn from_start(response: &StartBattleResponse, battle_type: BattleType) -> Result<Self, StateError> {
        let player = Party::leading_with_first_alive(
            response.player_team.iter().map(Combatant::from_protocol).collect(),
        )?;
        let opponent = Party::leading_with_first_alive(
            response.opponent_team.iter().map(Combatant::from_protocol).collect(),
        )?;

        let mut state = Self::new(&response.battle_id, battle_type, player, opponent);
        state.log = response.battle_log.iter().map(|entry| entry.to_string()).collect();
        Ok(state)
    }

    pub fn side(&self, side: Side) -> &Party {
        match side {
            Side::Player => &self.player,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Party {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    pub fn active(&self, side: Side) -> &Combatant {
        self.side(side).active()
    }

    pub fn player_active(&self) -> &Combatant {
        self.player.active()
    }

    pub fn opponent_active(&self) -> &Combatant {
        self.opponent.active()
    }

    /// Replace the HP of one side's active member
    pub fn apply_hp(&mut self, side: Side, hp: u32) {
        self.side_mut(side).set_active_hp(hp);
    }

    /// Apply a server-driven opponent switch and return the new active index.
    ///
    /// Without an explicit index the member is matched by id, and failing
    /// that it takes the place of the current active member.
    pub fn apply_opponent_switch(
        &mut self,
        index: Option<usize>,
        data: &CombatantData,
    ) -> Result<usize, StateError> {
        let incoming = Combatant::from_protocol(data);
        let index = index
            .or_else(|| self.opponent.index_of(&incoming.id))
            .unwrap_or_else(|| self.opponent.active_index());

        self.opponent.put(index, incoming)?;
        self.opponent.set_active(index)?;
        Ok(index)
    }

    /// Replace a player member's level and experience
    pub fn apply_progress(&mut self, id: &str, level: u8, experience: u32) -> Result<(), StateError> {
        let index = self
            .player
            .index_of(id)
            .ok_or_else(|| StateError::UnknownCombatant(id.to_string()))?;
        let updated = self.player.members()[index].with_progress(level, experience);
        self.player.replace(index, updated)
    }

    /// Replace a player member wholesale (evolution, newly learned moves)
    pub fn replace_player_member(&mut self, member: Combatant) -> Result<(), StateError> {
        let index = self
            .player
            .index_of(&member.id)
            .ok_or_else(|| StateError::UnknownCombatant(member.id.clone()))?;
        self.player.replace(index, member)
    }

    /// Spend one PP of the player's active move
    pub fn spend_player_move(&mut self, move_name: &str) {
        let updated = self.player.active().with_move_spent(move_name);
        // Same id at the same index, so this cannot fail
        let _ = self.player.replace_active(updated);
    }

    /// Append a turn summary and advance the turn counter
    pub fn record_turn(&mut self, summary: impl Into<String>) {
        self.turn += 1;
        self.log.push(summary.into());
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }
}
