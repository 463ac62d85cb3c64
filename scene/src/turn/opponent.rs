use rand::seq::SliceRandom;
use skirmish_battle::{Move, Side, damage, with_placeholders};
use skirmish_client::BattleApi;
use skirmish_protocol::ActionResult;

use super::{TurnContext, TurnManager};
use crate::config::OpponentReply;
use crate::stage::Stage;

impl TurnManager {
    /// Opponent reply outside a server-resolved turn (after a voluntary
    /// switch). Picks a known move uniformly at random and rolls its damage
    /// locally. Returns whether the opponent acted.
    pub async fn opponent_turn<A: BattleApi, S: Stage>(&mut self, ctx: &mut TurnContext<'_, A, S>) -> bool {
        if ctx.config.opponent_reply == OpponentReply::Skip {
            tracing::debug!("Opponent reply disabled");
            return false;
        }

        let attacker = ctx.state.opponent_active().clone();
        if attacker.is_fainted() {
            return false;
        }
        let defender = ctx.state.player_active().clone();

        let known: Vec<Move> = attacker
            .moveset
            .iter()
            .filter(|m| m.is_valid())
            .cloned()
            .collect();
        let pool = if known.is_empty() {
            with_placeholders(&[])
        } else {
            known
        };
        let Some(mv) = pool.choose(&mut self.rng).cloned() else {
            return false;
        };

        let roll = damage::roll_damage(&mut self.rng, &attacker, &defender, &mv);
        tracing::debug!(
            move_name = %mv.name,
            damage = roll.damage,
            effectiveness = roll.effectiveness,
            stab = roll.stab,
            "Rolled opponent reply"
        );

        let action = ActionResult {
            missed: false,
            damage: roll.damage,
            effectiveness: roll.effectiveness,
            critical: false,
            move_name: Some(mv.name.clone()),
            side: Some(Side::Opponent),
        };
        self.announce(ctx, &action).await;
        self.play_action(ctx, &action, defender.current_hp.saturating_sub(roll.damage))
            .await;
        true
    }
}
