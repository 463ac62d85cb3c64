use skirmish_battle::Side;
use skirmish_client::BattleApi;
use skirmish_protocol::SwitchRequest;

use super::{TurnContext, TurnFlow, TurnManager, bounded};
use crate::event::BattleOutcome;
use crate::menu::MenuState;
use crate::stage::Stage;

impl TurnManager {
    /// Change the player's active combatant. The gate is already held.
    ///
    /// A switch away from a fainted combatant is forced: no recall line and
    /// no opponent reply. A voluntary switch costs the player the turn.
    pub(crate) async fn resolve_switch<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        new_index: usize,
    ) -> TurnFlow {
        let current = ctx.state.player_active().clone();
        let forced = current.is_fainted();

        let Some(target) = ctx.state.player.get(new_index).cloned() else {
            tracing::warn!(new_index, "Switch target out of range");
            ctx.say("That combatant isn't in your party.").await;
            return self.reopen(ctx, forced);
        };
        if new_index == ctx.state.player.active_index() {
            ctx.say(format!("{} is already in battle!", target.name())).await;
            return self.reopen(ctx, forced);
        }
        if target.is_fainted() {
            ctx.say(format!("{} has no energy left to battle!", target.name()))
                .await;
            return self.reopen(ctx, forced);
        }

        ctx.view.set_menu(MenuState::Hidden);
        if !forced {
            ctx.say(format!("{}, come back!", current.name())).await;
            ctx.animations.fade_out_sprite(ctx.view, Side::Player).await;
        }

        let request = SwitchRequest {
            battle_id: ctx.state.battle_id.clone(),
            new_index,
        };
        let switched = bounded(
            ctx.config.request_timeout,
            "switch",
            ctx.api.switch_combatant(&request),
        )
        .await
        .and_then(|()| ctx.state.player.set_active(new_index).map_err(Into::into));

        if let Err(e) = switched {
            tracing::warn!(battle_id = %ctx.state.battle_id, new_index, error = %e, "Switch failed");
            ctx.report_failure(&e).await;
            if !forced {
                self.restore_player(ctx).await;
            }
            return self.reopen(ctx, forced);
        }

        let incoming = ctx.state.player_active().clone();
        tracing::debug!(name = incoming.name(), forced, "Player switched");
        let view = &mut *ctx.view;
        view.sprites.destroy_sprite(&mut view.stage, Side::Player);
        if let Err(e) = view.ui.update_complete_player_ui(&mut view.stage, &incoming) {
            tracing::warn!(error = %e, "Failed to rebuild player HUD");
        }
        view.say(format!("Go! {}!", incoming.name()));
        if let Err(e) = view
            .sprites
            .create_or_update_player_sprite(&mut view.stage, &incoming, true, ctx.config.timings.sprite_fade)
            .await
        {
            tracing::warn!(error = %e, "Failed to build player sprite");
        }
        ctx.animations
            .animate_hp_drain(ctx.view, Side::Player, incoming.current_hp, incoming.max_hp)
            .await;
        tokio::time::sleep(ctx.config.timings.message_pause).await;

        if !forced {
            self.opponent_turn(ctx).await;
        }
        self.after_exchange(ctx).await
    }

    /// Put the current active combatant back on screen after an aborted
    /// switch
    async fn restore_player<A: BattleApi, S: Stage>(&self, ctx: &mut TurnContext<'_, A, S>) {
        let fade = ctx.config.timings.sprite_fade;
        let view = &mut *ctx.view;
        let restored = if view.sprites.handle(Side::Player).is_some() {
            view.sprites.fade_in_sprite(&mut view.stage, Side::Player, fade).await
        } else {
            let current = ctx.state.player_active().clone();
            view.sprites
                .create_or_update_player_sprite(&mut view.stage, &current, true, fade)
                .await
                .map(|_| ())
        };
        if let Err(e) = restored {
            tracing::warn!(error = %e, "Failed to restore player sprite");
        }
    }

    pub(crate) async fn resolve_flee<A: BattleApi, S: Stage>(&mut self, ctx: &mut TurnContext<'_, A, S>) -> TurnFlow {
        if !ctx.state.battle_type.can_flee() {
            ctx.say("There's no running from this battle!").await;
            return self.reopen(ctx, false);
        }

        ctx.view.set_menu(MenuState::Hidden);
        ctx.say("Got away safely!").await;
        ctx.end_battle(None).await;
        TurnFlow::Over(BattleOutcome::Fled)
    }
}
