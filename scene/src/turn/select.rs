use skirmish_battle::{Side, with_placeholders};
use skirmish_client::BattleApi;
use skirmish_protocol::{ActionResult, CombatantData, TurnRequest, TurnResult};

use super::{TurnContext, TurnFlow, TurnManager, bounded};
use crate::event::BattleOutcome;
use crate::menu::{MenuState, owner_prefix};
use crate::stage::Stage;

impl TurnManager {
    /// Play out a move turn. The gate is already held.
    pub(crate) async fn resolve_move<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        move_name: &str,
    ) -> TurnFlow {
        let attacker = ctx.state.player_active().clone();
        let Some(mv) = with_placeholders(&attacker.moveset)
            .into_iter()
            .find(|m| m.name == move_name)
        else {
            tracing::warn!(move_name, combatant = attacker.name(), "Move not in moveset");
            ctx.prompt();
            self.gate.release();
            return TurnFlow::Continue;
        };

        if !mv.is_selectable() {
            ctx.say("There's no PP left for this move!").await;
            ctx.prompt();
            self.gate.release();
            return TurnFlow::Continue;
        }

        ctx.view.set_menu(MenuState::Hidden);
        let label = ctx.names.resolve(ctx.api, &mv.name).await;
        ctx.view.say(format!("{} used {}!", attacker.name(), label));
        tokio::time::sleep(ctx.config.timings.dramatic_pause).await;

        let request = TurnRequest::use_move(&ctx.state.battle_id, &mv.name)
            .with_target(&ctx.state.opponent_active().id);
        tracing::debug!(battle_id = %ctx.state.battle_id, move_name = %mv.name, "Submitting turn");

        let result = match bounded(
            ctx.config.request_timeout,
            "take turn",
            ctx.api.take_turn(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(battle_id = %ctx.state.battle_id, error = %e, "Turn submission failed");
                ctx.report_failure(&e).await;
                ctx.prompt();
                self.gate.release();
                return TurnFlow::Continue;
            }
        };

        if !mv.synthetic {
            ctx.state.spend_player_move(&mv.name);
        }
        self.play_turn(ctx, result).await
    }

    /// Animate a resolved turn: the player's reaction in full, then the
    /// opponent's, then any auto-switch, then the terminal checks
    async fn play_turn<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        result: TurnResult,
    ) -> TurnFlow {
        let player_action = result.player_action.clone().map(|a| a.tagged(Side::Player));
        let opponent_action = result
            .opponent_action
            .clone()
            .map(|a| a.tagged(Side::Opponent));

        match &player_action {
            Some(action) => self.play_action(ctx, action, result.opponent_hp).await,
            None => ctx.sync_hp(Side::Opponent, result.opponent_hp),
        }

        if ctx.state.opponent_active().is_fainted() {
            if opponent_action.is_some() {
                tracing::debug!("Opponent fainted first, dropping its action");
            }
        } else if let Some(action) = &opponent_action {
            self.announce(ctx, action).await;
            self.play_action(ctx, action, result.player_hp).await;
        }
        ctx.sync_hp(Side::Player, result.player_hp);

        let mut consistent = true;
        if let Some(incoming) = result.auto_switch() {
            consistent = self
                .apply_auto_switch(ctx, result.new_opponent_active_index, incoming)
                .await;
        }

        let summary = format!(
            "{} {}/{} vs {} {}/{}",
            ctx.state.player_active().name(),
            result.player_hp,
            ctx.state.player_active().max_hp,
            ctx.state.opponent_active().name(),
            result.opponent_hp,
            ctx.state.opponent_active().max_hp,
        );
        ctx.state.record_turn(summary);

        if !consistent {
            // No usable opponent to fight. The gate stays held and the
            // encounter is closed on the way out.
            ctx.say("An error occurred.").await;
            return TurnFlow::Over(BattleOutcome::Aborted);
        }
        if result.is_over {
            return self.finish_battle(ctx, &result).await;
        }
        self.after_exchange(ctx).await
    }

    /// "The foe X used Y!"
    pub(super) async fn announce<A: BattleApi, S: Stage>(
        &self,
        ctx: &mut TurnContext<'_, A, S>,
        action: &ActionResult,
    ) {
        let side = action.side.unwrap_or(Side::Opponent);
        let attacker = ctx.state.active(side).name().to_string();
        let line = match &action.move_name {
            Some(key) => {
                let label = ctx.names.resolve(ctx.api, key).await;
                format!("{}{} used {}!", owner_prefix(side), attacker, label)
            }
            None => format!("{}{} attacks!", owner_prefix(side), attacker),
        };
        ctx.say(line).await;
    }

    /// One side's reaction: attack, HP drain on the defender, effectiveness
    /// and critical lines, KO
    pub(super) async fn play_action<A: BattleApi, S: Stage>(
        &self,
        ctx: &mut TurnContext<'_, A, S>,
        action: &ActionResult,
        defender_hp: u32,
    ) {
        let Some(side) = action.side else {
            tracing::error!(?action, "Untagged action, skipping");
            return;
        };
        let defender = side.other();
        let attacker_name = ctx.state.active(side).name().to_string();

        if action.missed {
            ctx.say(format!("{}{}'s attack missed!", owner_prefix(side), attacker_name))
                .await;
            return;
        }

        ctx.animations.animate_attack(ctx.view, action).await;

        ctx.state.apply_hp(defender, defender_hp);
        let target = ctx.state.active(defender).clone();
        ctx.animations
            .animate_hp_drain(ctx.view, defender, target.current_hp, target.max_hp)
            .await;

        if action.critical {
            ctx.say("A critical hit!").await;
        }
        if action.effectiveness == 0.0 {
            ctx.say(format!("It doesn't affect {}{}...", owner_prefix(defender).to_lowercase(), target.name()))
                .await;
        } else if action.effectiveness > 1.0 {
            ctx.say("It's super effective!").await;
        } else if action.effectiveness < 1.0 {
            ctx.say("It's not very effective...").await;
        }

        if target.is_fainted() {
            ctx.animations.animate_ko(ctx.view, defender).await;
            ctx.say(format!("{}{} fainted!", owner_prefix(defender), target.name()))
                .await;
        }
    }

    /// Server-driven opponent replacement in trainer battles. Returns
    /// `false` if the incoming combatant could not be placed, in which case
    /// the opponent's sprite and HUD are left as they were.
    async fn apply_auto_switch<A: BattleApi, S: Stage>(
        &self,
        ctx: &mut TurnContext<'_, A, S>,
        index: Option<usize>,
        incoming: &CombatantData,
    ) -> bool {
        let placed = match ctx.state.apply_opponent_switch(index, incoming) {
            Err(e) if index.is_some() => {
                // Bad slot from the server: place by id, or over the
                // fainted active member
                tracing::warn!(?index, id = %incoming.id, error = %e, "Ignoring opponent switch index");
                ctx.state.apply_opponent_switch(None, incoming)
            }
            other => other,
        };
        if let Err(e) = placed {
            tracing::error!(?index, id = %incoming.id, error = %e, "Rejected opponent switch");
            return false;
        }

        let next = ctx.state.opponent_active().clone();
        tracing::debug!(name = next.name(), "Opponent switched in");

        let view = &mut *ctx.view;
        view.sprites.destroy_sprite(&mut view.stage, Side::Opponent);
        if let Err(e) = view.ui.update_complete_opponent_ui(&mut view.stage, &next) {
            tracing::warn!(error = %e, "Failed to rebuild opponent HUD");
        }
        if let Err(e) = view.sprites.create_opponent_sprite(&mut view.stage, &next) {
            tracing::warn!(error = %e, "Failed to build opponent sprite");
        }

        ctx.say(format!("The opponent sent out {}!", next.name())).await;
        ctx.animations
            .animate_hp_drain(ctx.view, Side::Opponent, next.current_hp, next.max_hp)
            .await;
        true
    }
}
