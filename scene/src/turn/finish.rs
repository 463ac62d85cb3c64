use skirmish_battle::progression::level_from_xp;
use skirmish_battle::{BattleType, Combatant, Side};
use skirmish_client::BattleApi;
use skirmish_protocol::{TurnResult, XpGain};

use super::{TurnContext, TurnFlow, TurnManager};
use crate::event::{BattleOutcome, SceneEvent};
use crate::interstitial::{InterstitialKind, InterstitialOutcome};
use crate::stage::Stage;
use crate::ui::hp_percent;

impl TurnManager {
    /// Battle-over branch: result line, experience, bookkeeping, end call.
    /// The gate stays held; nothing more can be input.
    pub(super) async fn finish_battle<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        result: &TurnResult,
    ) -> TurnFlow {
        let won = match result.winner {
            Some(side) => side == Side::Player,
            None => result.opponent_hp == 0,
        };
        tracing::info!(battle_id = %ctx.state.battle_id, won, turns = ctx.state.turn(), "Battle over");

        ctx.say(if won {
            "You won the battle!"
        } else {
            "You lost the battle..."
        })
        .await;
        tokio::time::sleep(ctx.config.timings.dramatic_pause).await;

        if won {
            for gain in &result.xp_gains {
                self.award_experience(ctx, gain).await;
            }
            mark_trainer_defeated(ctx);
        }

        ctx.end_battle(Some(if won { Side::Player } else { Side::Opponent }))
            .await;
        TurnFlow::Over(if won {
            BattleOutcome::Won
        } else {
            BattleOutcome::Lost
        })
    }

    /// Show one teammate's gain, fill the bar if it is the active combatant
    /// and run any move-learn or evolution flow it unlocked
    async fn award_experience<A: BattleApi, S: Stage>(&self, ctx: &mut TurnContext<'_, A, S>, gain: &XpGain) {
        let Some(member) = ctx.state.player.find(&gain.combatant_id).cloned() else {
            tracing::warn!(id = %gain.combatant_id, "Experience for unknown combatant");
            return;
        };
        let name = member.name().to_string();
        ctx.say(format!("{} gained {} XP!", name, gain.xp_gained)).await;

        let old_xp = gain.old_experience.unwrap_or(member.experience);
        let old_level = gain.old_level.unwrap_or_else(|| member.effective_level());
        let total = old_xp.saturating_add(gain.xp_gained);
        let is_active = member.id == ctx.state.player_active().id;

        let animated = if is_active {
            ctx.animations
                .animate_xp_gain(ctx.view, &name, gain.xp_gained, old_xp, old_level)
                .await
        } else {
            false
        };

        let new_level = gain
            .new_level
            .unwrap_or_else(|| level_from_xp(total))
            .max(old_level);
        if new_level > old_level && !animated {
            ctx.say(format!("{} grew to level {}!", name, new_level)).await;
        }
        if is_active
            && let Err(e) = ctx.view.ui.set_level(&mut ctx.view.stage, Side::Player, new_level)
        {
            tracing::warn!(error = %e, "Failed to update level badge");
        }
        if let Err(e) = ctx.state.apply_progress(&member.id, new_level, total) {
            tracing::warn!(id = %member.id, error = %e, "Failed to record experience");
        }

        if !gain.new_moves_available.is_empty() {
            let kind = InterstitialKind::MoveLearn {
                combatant_id: member.id.clone(),
                moves: gain.new_moves_available.clone(),
            };
            self.run_interstitial(ctx, kind, None).await;
        }
        if let Some(evolution) = &gain.evolution {
            let kind = InterstitialKind::Evolution {
                combatant_id: member.id.clone(),
                from: evolution.from.clone().unwrap_or_else(|| name.clone()),
                to: evolution.to.clone(),
            };
            let evolved = evolution.evolved.as_ref().map(Combatant::from_protocol);
            self.run_interstitial(ctx, kind, evolved).await;
        }
    }

    /// Suspend the battle for a satellite flow and apply what it returns.
    /// `fallback` replaces the combatant when the flow changes nothing.
    async fn run_interstitial<A: BattleApi, S: Stage>(
        &self,
        ctx: &mut TurnContext<'_, A, S>,
        kind: InterstitialKind,
        fallback: Option<Combatant>,
    ) {
        let id = match &kind {
            InterstitialKind::MoveLearn { combatant_id, .. }
            | InterstitialKind::Evolution { combatant_id, .. } => combatant_id.clone(),
        };
        let Some(member) = ctx.state.player.find(&id).cloned() else {
            return;
        };

        tracing::info!(?kind, "Suspending battle for interstitial");
        ctx.view.events.emit(SceneEvent::Suspended(kind.clone()));
        let outcome = ctx.satellites.run(kind.clone(), member).await;

        let replacement = match outcome {
            InterstitialOutcome::Replaced(combatant) => Some(*combatant),
            InterstitialOutcome::Done => fallback,
        };
        if let Some(replacement) = replacement {
            self.replace_member(ctx, replacement).await;
        }

        ctx.view.events.emit(SceneEvent::Resumed(kind));
        tracing::info!("Battle resumed");
    }

    async fn replace_member<A: BattleApi, S: Stage>(&self, ctx: &mut TurnContext<'_, A, S>, member: Combatant) {
        let is_active = member.id == ctx.state.player_active().id;
        if let Err(e) = ctx.state.replace_player_member(member.clone()) {
            tracing::warn!(id = %member.id, error = %e, "Failed to apply interstitial result");
            return;
        }
        if !is_active {
            return;
        }

        let view = &mut *ctx.view;
        if let Err(e) = view
            .sprites
            .create_or_update_player_sprite(&mut view.stage, &member, false, ctx.config.timings.sprite_fade)
            .await
        {
            tracing::warn!(error = %e, "Failed to rebuild player sprite");
        }
        let rebuilt = view
            .ui
            .update_complete_player_ui(&mut view.stage, &member)
            .and_then(|()| {
                view.ui.render_hp(
                    &mut view.stage,
                    Side::Player,
                    hp_percent(member.current_hp, member.max_hp),
                    Some((member.current_hp, member.max_hp)),
                )
            });
        if let Err(e) = rebuilt {
            tracing::warn!(error = %e, "Failed to rebuild player HUD");
        }
    }
}

fn mark_trainer_defeated<A, S>(ctx: &TurnContext<'_, A, S>) {
    if ctx.state.battle_type != BattleType::Trainer {
        return;
    }
    let Some(trainer) = &ctx.launch.trainer_id else {
        return;
    };
    match ctx.session.mark_trainer_defeated(trainer) {
        Ok(()) => tracing::debug!(trainer = %trainer, "Trainer marked as defeated"),
        Err(e) => tracing::warn!(trainer = %trainer, error = %e, "Failed to mark trainer as defeated"),
    }
}
