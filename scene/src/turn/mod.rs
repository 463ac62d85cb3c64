//! Turn orchestration
//!
//! The [`TurnManager`] owns the battle's control flow. A turn moves through
//!
//! ```text
//! Idle (menu) ──select/switch/flee──▶ InFlight (gate held)
//!                                        │
//!             ┌──────────────────────────┼────────────────────┐
//!             ▼                          ▼                    ▼
//!        Idle (menu)            AwaitingSwitch (gate      BattleOver
//!                               released early)
//! ```
//!
//! Everything inside a turn is awaited in sequence: server call, player
//! reaction, opponent reaction, opponent auto-switch, terminal checks.

mod finish;
mod opponent;
mod select;
mod switch;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use skirmish_battle::{BattleState, Side};
use skirmish_client::{ApiError, BattleApi, MoveNameCache, is_timeout};
use skirmish_protocol::EndBattleRequest;

use crate::animation::AnimationManager;
use crate::config::SceneConfig;
use crate::event::BattleOutcome;
use crate::interstitial::Satellites;
use crate::menu::{MenuState, prompt_line};
use crate::session::{BattleLaunch, GameSession};
use crate::stage::Stage;
use crate::ui::hp_percent;
use crate::view::View;

/// The "turn in progress" flag. At most one holder at a time.
#[derive(Debug, Clone, Default)]
pub struct TurnGate(Arc<AtomicBool>);

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that starts out held, e.g. until the intro has played
    pub fn locked() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Take the gate. Returns `false` if a turn is already in flight.
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Where control went after a player action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFlow {
    /// Back at the main menu, gate released
    Continue,
    /// The active combatant fainted; a forced switch is pending
    AwaitingSwitch,
    Over(BattleOutcome),
    /// The action was dropped because a turn was in flight
    Ignored,
}

/// Borrowed view of the scene for the duration of one action
pub struct TurnContext<'a, A, S> {
    pub(crate) api: &'a A,
    pub(crate) view: &'a mut View<S>,
    pub(crate) animations: &'a AnimationManager,
    pub(crate) state: &'a mut BattleState,
    pub(crate) names: &'a MoveNameCache,
    pub(crate) launch: &'a BattleLaunch,
    pub(crate) session: &'a GameSession,
    pub(crate) satellites: &'a Satellites,
    pub(crate) config: &'a SceneConfig,
}

impl<A: BattleApi, S: Stage> TurnContext<'_, A, S> {
    /// Show a line and hold it for the message pause
    async fn say(&mut self, text: impl Into<String>) {
        self.view.say(text);
        tokio::time::sleep(self.config.timings.message_pause).await;
    }

    /// "What will X do?" with the main menu up
    fn prompt(&mut self) {
        let line = prompt_line(self.state.player_active().name());
        self.view.say(line);
        self.view.set_menu(MenuState::MainMenu);
    }

    async fn report_failure(&mut self, err: &anyhow::Error) {
        let line = if is_timeout(err) {
            "The connection timed out."
        } else {
            "An error occurred."
        };
        self.view.say(line);
        tokio::time::sleep(self.config.timings.error_release).await;
    }

    /// Bring one side's state and HP bar in line with `hp` without
    /// animating
    fn sync_hp(&mut self, side: Side, hp: u32) {
        let current = self.state.active(side);
        if current.current_hp == hp.min(current.max_hp) {
            return;
        }
        self.state.apply_hp(side, hp);
        let member = self.state.active(side);
        let (hp, max) = (member.current_hp, member.max_hp);
        if let Err(e) = self
            .view
            .ui
            .render_hp(&mut self.view.stage, side, hp_percent(hp, max), Some((hp, max)))
        {
            tracing::warn!(%side, error = %e, "Failed to update HP bar");
        }
    }

    async fn end_battle(&self, winner: Option<Side>) {
        end_battle(
            self.api,
            self.config.request_timeout,
            &self.state.battle_id,
            winner,
        )
        .await;
    }
}

/// Run a battle API call under the scene's watchdog
pub(crate) async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout {
            operation,
            after: limit,
        }
        .into()),
    }
}

/// Close the encounter server-side. Failures are logged only.
pub(crate) async fn end_battle<A: BattleApi>(
    api: &A,
    limit: Duration,
    battle_id: &str,
    winner: Option<Side>,
) {
    let request = EndBattleRequest {
        battle_id: battle_id.to_string(),
        winner,
    };
    match bounded(limit, "end battle", api.end_battle(&request)).await {
        Ok(()) => tracing::debug!(battle_id, ?winner, "Battle ended"),
        Err(e) => tracing::warn!(battle_id, error = %e, "Failed to end battle"),
    }
}

pub struct TurnManager {
    gate: TurnGate,
    rng: StdRng,
}

impl TurnManager {
    pub fn new(gate: TurnGate, rng: StdRng) -> Self {
        Self { gate, rng }
    }

    pub fn gate(&self) -> &TurnGate {
        &self.gate
    }

    /// Submit a move. A no-op while another turn is in flight.
    pub async fn select_move<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        move_name: &str,
    ) -> TurnFlow {
        if !self.gate.try_acquire() {
            tracing::debug!(move_name, "Turn in flight, ignoring move selection");
            return TurnFlow::Ignored;
        }
        self.resolve_move(ctx, move_name).await
    }

    /// Switch the player's active combatant. A no-op while another turn is
    /// in flight.
    pub async fn switch_combatant<A: BattleApi, S: Stage>(
        &mut self,
        ctx: &mut TurnContext<'_, A, S>,
        new_index: usize,
    ) -> TurnFlow {
        if !self.gate.try_acquire() {
            tracing::debug!(new_index, "Turn in flight, ignoring switch");
            return TurnFlow::Ignored;
        }
        self.resolve_switch(ctx, new_index).await
    }

    pub async fn flee<A: BattleApi, S: Stage>(&mut self, ctx: &mut TurnContext<'_, A, S>) -> TurnFlow {
        if !self.gate.try_acquire() {
            tracing::debug!("Turn in flight, ignoring flee");
            return TurnFlow::Ignored;
        }
        self.resolve_flee(ctx).await
    }

    /// Common tail of a turn that did not end the battle
    async fn after_exchange<A: BattleApi, S: Stage>(&mut self, ctx: &mut TurnContext<'_, A, S>) -> TurnFlow {
        if ctx.state.player_active().is_fainted() {
            if ctx.state.player.has_reserves() {
                // Released before the prompt so the forced switch is not
                // itself gated
                self.gate.release();
                self.open_party_menu(ctx, true);
                return TurnFlow::AwaitingSwitch;
            }

            ctx.say("You have no combatants left that can fight!").await;
            ctx.say("You were defeated...").await;
            ctx.end_battle(Some(Side::Opponent)).await;
            return TurnFlow::Over(BattleOutcome::Lost);
        }

        ctx.view.hide_dialogue();
        ctx.prompt();
        self.gate.release();
        TurnFlow::Continue
    }

    pub(crate) fn open_party_menu<A: BattleApi, S: Stage>(&self, ctx: &mut TurnContext<'_, A, S>, forced: bool) {
        if let Err(e) = ctx.view.ui.create_party_menu(&mut ctx.view.stage, &ctx.state.player) {
            tracing::warn!(error = %e, "Failed to build party menu");
        }
        ctx.view.say(if forced {
            "Choose a combatant to send out!"
        } else {
            "Choose a combatant."
        });
        ctx.view.set_menu(MenuState::PartyMenu { forced });
    }

    /// Back to the menu the player came from, gate released
    fn reopen<A: BattleApi, S: Stage>(&self, ctx: &mut TurnContext<'_, A, S>, forced: bool) -> TurnFlow {
        self.gate.release();
        if forced {
            self.open_party_menu(ctx, true);
            TurnFlow::AwaitingSwitch
        } else {
            ctx.prompt();
            TurnFlow::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_admits_one_holder() {
        let gate = TurnGate::new();
        let other = gate.clone();

        assert!(gate.try_acquire());
        assert!(!other.try_acquire());
        assert!(other.is_locked());

        gate.release();
        assert!(other.try_acquire());
    }

    #[test]
    fn test_locked_gate() {
        let gate = TurnGate::locked();
        assert!(!gate.try_acquire());
        gate.release();
        assert!(gate.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let err = bounded(
            Duration::from_secs(1),
            "take turn",
            std::future::pending::<Result<()>>(),
        )
        .await
        .unwrap_err();
        assert!(is_timeout(&err));
    }
}
