//! Composition root of one encounter
//!
//! [`BattleScene`] owns the battle state and every manager, and is the only
//! place that talks to the battle API. Input arrives through a cloneable
//! [`BattleHandle`]; the scene's [`run`](BattleScene::run) loop applies
//! commands one at a time until the encounter is over.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_battle::{BattleState, with_placeholders};
use skirmish_client::{BattleApi, MoveNameCache, is_timeout};
use tokio::sync::mpsc;

use crate::animation::AnimationManager;
use crate::config::SceneConfig;
use crate::event::{BattleOutcome, EventSink, SceneEvent};
use crate::interstitial::Satellites;
use crate::menu::{MenuManager, MenuState, prompt_line};
use crate::session::{BattleLaunch, GameSession};
use crate::sprite::SpriteManager;
use crate::stage::Stage;
use crate::turn::{TurnContext, TurnFlow, TurnGate, TurnManager, bounded, end_battle};
use crate::ui::UiManager;
use crate::view::View;

/// Player input, as delivered by a [`BattleHandle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    SelectMove(String),
    Switch(usize),
    Flee,
    OpenMoves,
    CloseMoves,
    OpenParty,
    CloseParty,
}

impl PlayerCommand {
    /// Commands that start a turn and so need the gate
    fn is_gated(&self) -> bool {
        matches!(
            self,
            PlayerCommand::SelectMove(_) | PlayerCommand::Switch(_) | PlayerCommand::Flee
        )
    }
}

/// Input side of a [`BattleScene`]
///
/// Turn-starting commands take the turn gate before they are queued, so a
/// burst of them while a turn is in flight dispatches only the first.
#[derive(Debug, Clone)]
pub struct BattleHandle {
    tx: mpsc::UnboundedSender<PlayerCommand>,
    gate: TurnGate,
}

impl BattleHandle {
    fn send(&self, command: PlayerCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow!("Battle scene closed"))
    }

    fn send_gated(&self, command: PlayerCommand) -> Result<bool> {
        if !self.gate.try_acquire() {
            tracing::debug!(?command, "Turn in flight, dropping command");
            return Ok(false);
        }
        if let Err(e) = self.send(command) {
            self.gate.release();
            return Err(e);
        }
        Ok(true)
    }

    /// Returns `false` if a turn was already in flight
    pub fn select_move(&self, move_name: &str) -> Result<bool> {
        self.send_gated(PlayerCommand::SelectMove(move_name.to_string()))
    }

    pub fn switch_to(&self, index: usize) -> Result<bool> {
        self.send_gated(PlayerCommand::Switch(index))
    }

    pub fn flee(&self) -> Result<bool> {
        self.send_gated(PlayerCommand::Flee)
    }

    pub fn open_moves(&self) -> Result<()> {
        self.send(PlayerCommand::OpenMoves)
    }

    pub fn close_moves(&self) -> Result<()> {
        self.send(PlayerCommand::CloseMoves)
    }

    pub fn open_party(&self) -> Result<()> {
        self.send(PlayerCommand::OpenParty)
    }

    pub fn close_party(&self) -> Result<()> {
        self.send(PlayerCommand::CloseParty)
    }

    pub fn is_turn_in_flight(&self) -> bool {
        self.gate.is_locked()
    }
}

/// Where control goes once an encounter is over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleExit {
    pub return_scene: String,
    pub outcome: BattleOutcome,
}

/// Split `$scene` into a [`TurnContext`] over `$state` without borrowing the
/// turn manager
macro_rules! turn_context {
    ($scene:ident, $state:expr) => {
        TurnContext {
            api: &$scene.api,
            view: &mut $scene.view,
            animations: &$scene.animations,
            state: $state,
            names: &$scene.names,
            launch: &$scene.launch,
            session: $scene.session.as_ref(),
            satellites: &$scene.satellites,
            config: &$scene.config,
        }
    };
}

pub struct BattleScene<A, S> {
    api: A,
    view: View<S>,
    animations: AnimationManager,
    turns: TurnManager,
    state: Option<BattleState>,
    session: Arc<GameSession>,
    launch: BattleLaunch,
    names: MoveNameCache,
    satellites: Satellites,
    config: SceneConfig,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    started: bool,
}

impl<A: BattleApi, S: Stage> BattleScene<A, S> {
    /// Build a scene for one encounter. Nothing happens until
    /// [`start`](Self::start) or [`run`](Self::run); the handle refuses
    /// turn commands until the intro has played.
    pub fn new(
        api: A,
        stage: S,
        launch: BattleLaunch,
        session: Arc<GameSession>,
        config: SceneConfig,
    ) -> (Self, BattleHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let gate = TurnGate::locked();
        let handle = BattleHandle {
            tx,
            gate: gate.clone(),
        };

        let view = View {
            stage,
            ui: UiManager::new(config.layout.clone()),
            sprites: SpriteManager::new(config.layout.clone(), config.prefer_animated_sprites),
            menu: MenuManager::new(),
            events: EventSink::disabled(),
        };
        let scene = Self {
            api,
            view,
            animations: AnimationManager::new(config.timings.clone()),
            turns: TurnManager::new(gate, StdRng::from_entropy()),
            state: None,
            session,
            launch,
            names: MoveNameCache::new(config.locale.clone())
                .with_timeout(config.request_timeout),
            satellites: Satellites::none(),
            config,
            commands,
            started: false,
        };
        (scene, handle)
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.view.events = events;
        self
    }

    pub fn with_satellites(mut self, satellites: Satellites) -> Self {
        self.satellites = satellites;
        self
    }

    /// Deterministic opponent replies
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        let gate = self.turns.gate().clone();
        self.turns = TurnManager::new(gate, StdRng::seed_from_u64(seed));
        self
    }

    /// Live battle state, once the encounter has started
    pub fn state(&self) -> Option<&BattleState> {
        self.state.as_ref()
    }

    pub fn view(&self) -> &View<S> {
        &self.view
    }

    pub fn stage(&self) -> &S {
        &self.view.stage
    }

    pub fn gate(&self) -> &TurnGate {
        self.turns.gate()
    }

    /// Play the entry transition, start the encounter server-side and bring
    /// in the HUDs. Opens the gate on success.
    pub async fn start(&mut self) -> TurnFlow {
        self.started = true;
        self.animations.play_entry_transition(&mut self.view).await;

        let request = self.launch.start_request();
        tracing::info!(
            player_id = %request.player_id,
            battle_type = %request.battle_type,
            "Starting battle"
        );
        let started = bounded(
            self.config.request_timeout,
            "start battle",
            self.api.start_battle(&request),
        )
        .await
        .and_then(|response| {
            BattleState::from_start(&response, self.launch.battle_type).map_err(Into::into)
        });

        let state = match started {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start battle");
                self.view.say(if is_timeout(&e) {
                    "The connection timed out."
                } else {
                    "The battle could not be started."
                });
                tokio::time::sleep(self.config.timings.error_release).await;
                return TurnFlow::Over(BattleOutcome::Aborted);
            }
        };
        tracing::info!(battle_id = %state.battle_id, "Battle started");

        self.build_view(&state).await;
        self.animations.play_ui_entry(&mut self.view, &state).await;
        self.state = Some(state);
        self.turns.gate().release();
        TurnFlow::Continue
    }

    async fn build_view(&mut self, state: &BattleState) {
        let view = &mut self.view;
        let foe = state.opponent_active();
        let me = state.player_active();

        if let Err(e) = view.sprites.create_opponent_sprite(&mut view.stage, foe) {
            tracing::warn!(error = %e, "Failed to build opponent sprite");
        }
        if let Err(e) = view
            .sprites
            .create_or_update_player_sprite(&mut view.stage, me, false, self.config.timings.sprite_fade)
            .await
        {
            tracing::warn!(error = %e, "Failed to build player sprite");
        }
        let hud = view
            .ui
            .create_opponent_ui(&mut view.stage, foe)
            .and_then(|()| view.ui.create_player_ui(&mut view.stage, me))
            .and_then(|()| view.ui.create_main_menu(&mut view.stage).map(|_| ()));
        if let Err(e) = hud {
            tracing::warn!(error = %e, "Failed to build HUD");
        }
    }

    /// Submit a move directly, bypassing the handle
    pub async fn select_move(&mut self, move_name: &str) -> TurnFlow {
        let Some(state) = self.state.as_mut() else {
            return TurnFlow::Ignored;
        };
        let mut ctx = turn_context!(self, state);
        self.turns.select_move(&mut ctx, move_name).await
    }

    pub async fn switch_to(&mut self, index: usize) -> TurnFlow {
        let Some(state) = self.state.as_mut() else {
            return TurnFlow::Ignored;
        };
        let mut ctx = turn_context!(self, state);
        self.turns.switch_combatant(&mut ctx, index).await
    }

    pub async fn flee(&mut self) -> TurnFlow {
        let Some(state) = self.state.as_mut() else {
            return TurnFlow::Ignored;
        };
        let mut ctx = turn_context!(self, state);
        self.turns.flee(&mut ctx).await
    }

    /// Show the move selector for the active combatant, short movesets
    /// backfilled with placeholder moves
    pub async fn open_moves(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        if self.view.menu.state() != MenuState::MainMenu {
            tracing::debug!(menu = ?self.view.menu.state(), "Move selector not reachable");
            return;
        }

        let moves = with_placeholders(&state.player_active().moveset);
        let mut labelled = Vec::with_capacity(moves.len());
        for mv in moves {
            let label = if mv.is_valid() {
                self.names.resolve(&self.api, &mv.name).await
            } else {
                String::new()
            };
            labelled.push((mv, label));
        }

        let view = &mut self.view;
        if let Err(e) = view.ui.create_move_selector(&mut view.stage, &labelled) {
            tracing::warn!(error = %e, "Failed to build move selector");
            return;
        }
        view.set_menu(MenuState::MoveSelector);
    }

    pub fn close_moves(&mut self) {
        if self.view.menu.state() == MenuState::MoveSelector {
            self.view.set_menu(MenuState::MainMenu);
        }
    }

    /// Voluntary switch prompt
    pub fn open_party(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if !matches!(
            self.view.menu.state(),
            MenuState::MainMenu | MenuState::MoveSelector
        ) {
            return;
        }
        let mut ctx = turn_context!(self, state);
        self.turns.open_party_menu(&mut ctx, false);
    }

    /// Back out of a voluntary switch prompt. A forced one stays open.
    pub fn close_party(&mut self) {
        if self.view.menu.state() != (MenuState::PartyMenu { forced: false }) {
            return;
        }
        let line = self
            .state
            .as_ref()
            .map(|s| prompt_line(s.player_active().name()));
        if let Some(line) = line {
            self.view.say(line);
        }
        self.view.set_menu(MenuState::MainMenu);
    }

    /// Apply one queued command. Turn commands arrive with the gate already
    /// held by the handle that sent them.
    async fn dispatch(&mut self, command: PlayerCommand) -> TurnFlow {
        tracing::debug!(?command, "Dispatching command");
        let Some(state) = self.state.as_mut() else {
            if command.is_gated() {
                self.turns.gate().release();
            }
            return TurnFlow::Ignored;
        };

        let forced_pending = state.player_active().is_fainted();
        match command {
            PlayerCommand::SelectMove(_) | PlayerCommand::Flee if forced_pending => {
                tracing::debug!("Forced switch pending, ignoring command");
                self.turns.gate().release();
                TurnFlow::AwaitingSwitch
            }
            PlayerCommand::SelectMove(name) => {
                let mut ctx = turn_context!(self, state);
                self.turns.resolve_move(&mut ctx, &name).await
            }
            PlayerCommand::Switch(index) => {
                let mut ctx = turn_context!(self, state);
                self.turns.resolve_switch(&mut ctx, index).await
            }
            PlayerCommand::Flee => {
                let mut ctx = turn_context!(self, state);
                self.turns.resolve_flee(&mut ctx).await
            }
            PlayerCommand::OpenMoves => {
                self.open_moves().await;
                TurnFlow::Continue
            }
            PlayerCommand::CloseMoves => {
                self.close_moves();
                TurnFlow::Continue
            }
            PlayerCommand::OpenParty => {
                self.open_party();
                TurnFlow::Continue
            }
            PlayerCommand::CloseParty => {
                self.close_party();
                TurnFlow::Continue
            }
        }
    }

    /// Drive the encounter to its end: intro (unless [`start`](Self::start)
    /// already ran), then commands until the battle is over or every handle
    /// is gone.
    pub async fn run(&mut self) -> BattleExit {
        let mut flow = if self.started {
            TurnFlow::Continue
        } else {
            self.start().await
        };

        loop {
            if let TurnFlow::Over(outcome) = flow {
                return self.leave(outcome).await;
            }
            let Some(command) = self.commands.recv().await else {
                tracing::info!("All battle handles dropped");
                return self.leave(BattleOutcome::Aborted).await;
            };
            flow = self.dispatch(command).await;
        }
    }

    /// Tear the scene down and hand control back to the return scene
    async fn leave(&mut self, outcome: BattleOutcome) -> BattleExit {
        // Keep late commands out
        let _ = self.turns.gate().try_acquire();

        if outcome == BattleOutcome::Aborted
            && let Some(state) = &self.state
        {
            end_battle(&self.api, self.config.request_timeout, &state.battle_id, None).await;
        }
        if let Some(state) = &self.state {
            tracing::info!(
                battle_id = %state.battle_id,
                ?outcome,
                turns = state.turn(),
                "Leaving battle"
            );
        }

        self.view.clear();
        self.state = None;
        self.view.events.emit(SceneEvent::Transition {
            scene: self.launch.return_scene.clone(),
            outcome,
        });
        BattleExit {
            return_scene: self.launch.return_scene.clone(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AnimationKind;
    use crate::interstitial::{InterstitialKind, InterstitialOutcome};
    use crate::stage::Prop;
    use crate::testing::{
        ApiCall, RecordingStage, Reply, ScriptedApi, combatant, drain_events, start_response,
        turn_result,
    };
    use serde_json::{Value, json};
    use skirmish_battle::Side;
    use skirmish_battle::progression::level_progress;
    use skirmish_protocol::{BattleType, EndBattleRequest, SwitchRequest};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        scene: BattleScene<ScriptedApi, RecordingStage>,
        handle: BattleHandle,
        api: ScriptedApi,
        events: UnboundedReceiver<SceneEvent>,
        session: Arc<GameSession>,
    }

    fn fixture(launch: BattleLaunch, player: Vec<Value>, opponent: Vec<Value>) -> Fixture {
        configured(launch, player, opponent, SceneConfig::default())
    }

    fn configured(
        launch: BattleLaunch,
        player: Vec<Value>,
        opponent: Vec<Value>,
        config: SceneConfig,
    ) -> Fixture {
        let api = ScriptedApi::new();
        api.on_start(Reply::Ok(start_response(player, opponent)));
        let session = Arc::new(GameSession::new("ash"));
        let (sink, events) = EventSink::channel();
        let (scene, handle) = BattleScene::new(
            api.clone(),
            RecordingStage::new(),
            launch,
            session.clone(),
            config,
        );
        Fixture {
            scene: scene.with_events(sink).with_rng_seed(7),
            handle,
            api,
            events,
            session,
        }
    }

    fn wild_with(player: Vec<Value>) -> Fixture {
        fixture(
            BattleLaunch::wild("ash", "overworld"),
            player,
            vec![combatant("o1", "rattata", 5, 18, 18)],
        )
    }

    fn wild() -> Fixture {
        wild_with(vec![combatant("p1", "pikachu", 5, 20, 20)])
    }

    fn trainer(opponent: Vec<Value>) -> Fixture {
        fixture(
            BattleLaunch::trainer("ash", "youngster-joey", "route-1"),
            vec![combatant("p1", "pikachu", 5, 20, 20)],
            opponent,
        )
    }

    async fn started(mut f: Fixture) -> Fixture {
        assert_eq!(f.scene.start().await, TurnFlow::Continue);
        drain_events(&mut f.events);
        f
    }

    fn hit(damage: u32) -> Value {
        json!({ "missed": false, "damage": damage, "effectiveness": 1.0, "critical": false, "moveName": "tackle" })
    }

    fn lines(events: &[SceneEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                SceneEvent::Dialogue(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count_started(events: &[SceneEvent], kind: AnimationKind, side: Option<Side>) -> usize {
        events
            .iter()
            .filter(|e| **e == SceneEvent::AnimationStarted { kind, side })
            .count()
    }

    fn position(events: &[SceneEvent], event: &SceneEvent) -> usize {
        events
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("{:?} not emitted", event))
    }

    #[tokio::test(start_paused = true)]
    async fn test_intro_opens_gate_and_prompts() {
        let mut f = wild();
        assert!(!f.handle.select_move("tackle").unwrap());

        assert_eq!(f.scene.start().await, TurnFlow::Continue);

        assert!(!f.handle.is_turn_in_flight());
        assert_eq!(f.scene.view().menu.state(), MenuState::MainMenu);
        let events = drain_events(&mut f.events);
        let said = lines(&events);
        assert_eq!(said, vec!["A wild rattata appeared!", "What will pikachu do?"]);
        assert_eq!(f.api.turns().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_selections_dispatch_once() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(5),
            "opponentAction": hit(3),
            "playerHP": 17,
            "opponentHP": 13
        }))));

        assert!(f.handle.select_move("tackle").unwrap());
        assert!(!f.handle.select_move("tackle").unwrap());
        assert!(!f.handle.flee().unwrap());
        assert!(f.handle.is_turn_in_flight());
        drop(f.handle);

        let exit = f.scene.run().await;

        assert_eq!(f.api.turns().len(), 1);
        assert_eq!(exit.outcome, BattleOutcome::Aborted);
        assert_eq!(exit.return_scene, "overworld");
        // Abandoned encounters are still closed server-side
        assert_eq!(f.api.ends().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_reaction_completes_before_opponent_reaction() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(5),
            "opponentAction": hit(3),
            "playerHP": 17,
            "opponentHP": 13
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        let player_drain_done = position(
            &events,
            &SceneEvent::AnimationFinished {
                kind: AnimationKind::HpDrain,
                side: Some(Side::Opponent),
            },
        );
        let opponent_drain_start = position(
            &events,
            &SceneEvent::AnimationStarted {
                kind: AnimationKind::HpDrain,
                side: Some(Side::Player),
            },
        );
        assert!(player_drain_done < opponent_drain_start);

        let state = f.scene.state().unwrap();
        assert_eq!(state.player_active().current_hp, 17);
        assert_eq!(state.opponent_active().current_hp, 13);
        assert_eq!(state.player_active().moveset[0].pp, 34);
        assert_eq!(
            f.api.turns()[0].target_id.as_deref(),
            Some("o1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wild_knockout_ends_battle() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(18),
            "opponentAction": hit(4),
            "playerHP": 20,
            "opponentHP": 0,
            "isOver": true,
            "winner": "player"
        }))));

        assert!(f.handle.select_move("tackle").unwrap());
        let exit = f.scene.run().await;

        assert_eq!(
            exit,
            BattleExit {
                return_scene: "overworld".to_string(),
                outcome: BattleOutcome::Won,
            }
        );
        let events = drain_events(&mut f.events);
        assert_eq!(count_started(&events, AnimationKind::Ko, Some(Side::Opponent)), 1);
        assert_eq!(count_started(&events, AnimationKind::Ko, Some(Side::Player)), 0);
        assert_eq!(count_started(&events, AnimationKind::Attack, Some(Side::Opponent)), 0);
        assert!(lines(&events).contains(&"The foe rattata fainted!"));
        assert!(lines(&events).contains(&"You won the battle!"));
        assert_eq!(
            events.last(),
            Some(&SceneEvent::Transition {
                scene: "overworld".to_string(),
                outcome: BattleOutcome::Won,
            })
        );
        assert_eq!(
            f.api.ends(),
            vec![EndBattleRequest {
                battle_id: "battle-1".to_string(),
                winner: Some(Side::Player),
            }]
        );
        assert_eq!(f.scene.stage().node_count(), 0);
        assert!(f.handle.is_turn_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missed_attack_without_reply() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": { "missed": true, "damage": 0 },
            "opponentAction": null,
            "playerHP": 20,
            "opponentHP": 18
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        let missed: Vec<_> = lines(&events)
            .into_iter()
            .filter(|l| l.contains("missed"))
            .collect();
        assert_eq!(missed, vec!["pikachu's attack missed!"]);
        assert_eq!(count_started(&events, AnimationKind::HpDrain, Some(Side::Player)), 0);
        assert_eq!(count_started(&events, AnimationKind::HpDrain, Some(Side::Opponent)), 0);
        assert!(!f.scene.gate().is_locked());
        assert_eq!(f.scene.view().menu.state(), MenuState::MainMenu);
        assert_eq!(
            events.last(),
            Some(&SceneEvent::MenuChanged(MenuState::MainMenu))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_level_up_while_awarding_experience() {
        let mut me = combatant("p1", "pikachu", 5, 20, 20);
        me["experience"] = json!(140);
        let mut f = started(wild_with(vec![me])).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(18),
            "playerHP": 20,
            "opponentHP": 0,
            "isOver": true,
            "winner": "player",
            "xpGains": [{ "combatantId": "p1", "xpGained": 50 }]
        }))));

        assert_eq!(
            f.scene.select_move("tackle").await,
            TurnFlow::Over(BattleOutcome::Won)
        );

        let events = drain_events(&mut f.events);
        assert_eq!(count_started(&events, AnimationKind::LevelUp, Some(Side::Player)), 1);
        let said = lines(&events);
        assert!(said.contains(&"pikachu gained 50 XP!"));
        assert_eq!(
            said.iter().filter(|l| **l == "pikachu grew to level 6!").count(),
            1
        );

        let view = f.scene.view();
        assert!(view.stage.has_text("Lv6"));
        let xp_fill = view.ui.xp_fill_node().unwrap();
        let width = view.stage.get(xp_fill, Prop::Width).unwrap();
        let expected = view.ui.xp_width(level_progress(6, 190));
        assert!((width - expected).abs() < 1e-3);
        assert!((expected - 220.0 * 11.0 / 57.0).abs() < 1e-3);

        let me = f.scene.state().unwrap().player_active();
        assert_eq!(me.level, 6);
        assert_eq!(me.experience, 190);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trainer_auto_switch_rebuilds_opponent() {
        let mut f = started(trainer(vec![
            combatant("o1", "rattata", 5, 10, 10),
            combatant("o2", "pidgey", 5, 30, 30),
        ]))
        .await;
        let old_nodes = f
            .scene
            .view()
            .sprites
            .handle(Side::Opponent)
            .unwrap()
            .nodes();
        let old_hud = f.scene.view().ui.hud_container(Side::Opponent).unwrap();
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(10),
            "opponentAction": null,
            "playerHP": 20,
            "opponentHP": 0,
            "opponentSwitched": true,
            "newOpponentActive": combatant("o2", "pidgey", 5, 15, 30),
            "newOpponentActiveIndex": 1
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let view = f.scene.view();
        for node in old_nodes {
            assert!(!view.stage.exists(node));
        }
        assert!(!view.stage.exists(old_hud));
        let new_sprite = view.sprites.handle(Side::Opponent).unwrap();
        assert!(view.stage.exists(new_sprite.node()));

        let fill = view.ui.hp_fill_node(Side::Opponent).unwrap();
        let widths = view.stage.widths_set(fill);
        assert!(widths[0] > 145.0);
        assert!((widths[widths.len() - 1] - 75.0).abs() < 1e-3);
        assert_eq!(view.ui.last_hp_percent(Side::Opponent), Some(50.0));

        let state = f.scene.state().unwrap();
        assert_eq!(state.opponent_active().id, "o2");
        assert_eq!(state.opponent.active_index(), 1);
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"The opponent sent out pidgey!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_switch_with_bad_index_still_places_opponent() {
        let mut f = started(trainer(vec![combatant("o1", "rattata", 5, 10, 10)])).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(10),
            "opponentAction": null,
            "playerHP": 20,
            "opponentHP": 0,
            "opponentSwitched": true,
            "newOpponentActive": combatant("o2", "pidgey", 5, 30, 30),
            "newOpponentActiveIndex": 4
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let state = f.scene.state().unwrap();
        assert_eq!(state.opponent_active().id, "o2");
        assert_eq!(state.opponent_active().current_hp, 30);
        assert_eq!(state.opponent.len(), 1);
        let view = f.scene.view();
        let sprite = view.sprites.handle(Side::Opponent).unwrap();
        assert!(view.stage.exists(sprite.node()));
        assert_eq!(view.ui.last_hp_percent(Side::Opponent), Some(100.0));
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"The opponent sent out pidgey!"));
        assert!(!lines(&events).contains(&"An error occurred."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_names_use_configured_locale() {
        let config =
            SceneConfig::from_lookup(|k| (k == "SKIRMISH_LOCALE").then(|| "fr".to_string()));
        let f = configured(
            BattleLaunch::wild("ash", "overworld"),
            vec![combatant("p1", "pikachu", 5, 20, 20)],
            vec![combatant("o1", "rattata", 5, 18, 18)],
            config,
        );
        f.api.name("tackle", "Charge");
        let mut f = started(f).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(5),
            "playerHP": 20,
            "opponentHP": 13
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        assert!(
            f.api
                .calls()
                .contains(&ApiCall::MoveName("tackle".to_string(), "fr".to_string()))
        );
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"pikachu used Charge!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_name_lookup_cannot_stall_turn() {
        let mut f = started(wild()).await;
        f.api.stall_names();
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(5),
            "opponentAction": hit(3),
            "playerHP": 17,
            "opponentHP": 13
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        assert_eq!(f.api.turns().len(), 1);
        assert!(!f.scene.gate().is_locked());
        assert_eq!(f.scene.view().menu.state(), MenuState::MainMenu);
        let events = drain_events(&mut f.events);
        let said = lines(&events);
        assert!(said.contains(&"pikachu used tackle!"));
        assert!(said.contains(&"The foe rattata used tackle!"));
    }

    fn two_member_party() -> Fixture {
        wild_with(vec![
            combatant("p1", "pikachu", 5, 20, 20),
            combatant("p2", "eevee", 5, 25, 25),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_voluntary_switch_gives_opponent_a_turn() {
        let mut f = started(two_member_party()).await;

        assert_eq!(f.scene.switch_to(1).await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        let said = lines(&events);
        assert!(said.contains(&"pikachu, come back!"));
        assert!(said.contains(&"Go! eevee!"));
        assert!(said.contains(&"The foe rattata used tackle!"));
        assert_eq!(count_started(&events, AnimationKind::Attack, Some(Side::Opponent)), 1);
        assert_eq!(
            f.api.switches(),
            vec![SwitchRequest {
                battle_id: "battle-1".to_string(),
                new_index: 1,
            }]
        );
        let me = f.scene.state().unwrap().player_active();
        assert_eq!(me.id, "p2");
        assert!(me.current_hp < 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_switch_skips_opponent_reply() {
        let mut f = started(two_member_party()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(3),
            "opponentAction": hit(20),
            "playerHP": 0,
            "opponentHP": 15
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::AwaitingSwitch);
        assert!(!f.scene.gate().is_locked());
        assert_eq!(
            f.scene.view().menu.state(),
            MenuState::PartyMenu { forced: true }
        );
        drain_events(&mut f.events);

        assert_eq!(f.scene.switch_to(1).await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        assert_eq!(count_started(&events, AnimationKind::Attack, Some(Side::Opponent)), 0);
        assert!(!lines(&events).iter().any(|l| l.contains("come back")));
        assert_eq!(f.scene.state().unwrap().player_active().current_hp, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_to_fainted_member_is_refused() {
        let mut f = started(wild_with(vec![
            combatant("p1", "pikachu", 5, 20, 20),
            combatant("p2", "eevee", 5, 0, 25),
        ]))
        .await;

        assert_eq!(f.scene.switch_to(1).await, TurnFlow::Continue);

        assert!(f.api.switches().is_empty());
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"eevee has no energy left to battle!"));
        assert!(!f.scene.gate().is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_switch_leaves_party_unchanged() {
        let mut f = started(two_member_party()).await;
        f.api.on_switch(Reply::Fail("switch rejected"));

        assert_eq!(f.scene.switch_to(1).await, TurnFlow::Continue);

        let state = f.scene.state().unwrap();
        assert_eq!(state.player.active_index(), 0);
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"An error occurred."));
        assert_eq!(count_started(&events, AnimationKind::Attack, Some(Side::Opponent)), 0);
        let sprite = f.scene.view().sprites.handle(Side::Player).unwrap().node();
        assert_eq!(f.scene.stage().get(sprite, Prop::Alpha), Some(1.0));
        assert!(!f.scene.gate().is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_turn_times_out() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Hang);

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"The connection timed out."));
        assert!(!f.scene.gate().is_locked());
        assert_eq!(f.scene.view().menu.state(), MenuState::MainMenu);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_error_keeps_battle_resumable() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Fail("server exploded"));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"An error occurred."));
        assert!(!f.scene.gate().is_locked());
        // Nothing was spent on a turn that never happened
        assert_eq!(f.scene.state().unwrap().player_active().moveset[0].pp, 35);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_start_aborts() {
        let api = ScriptedApi::new();
        api.on_start(Reply::Fail("server down"));
        let (sink, mut events) = EventSink::channel();
        let (scene, handle) = BattleScene::new(
            api.clone(),
            RecordingStage::new(),
            BattleLaunch::wild("ash", "overworld"),
            Arc::new(GameSession::new("ash")),
            SceneConfig::default(),
        );
        let mut scene = scene.with_events(sink);

        let exit = scene.run().await;

        assert_eq!(exit.outcome, BattleOutcome::Aborted);
        assert_eq!(exit.return_scene, "overworld");
        let events = drain_events(&mut events);
        assert!(lines(&events).contains(&"The battle could not be started."));
        assert!(api.ends().is_empty());
        assert!(!handle.select_move("tackle").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_timeout_is_reported_as_such() {
        let api = ScriptedApi::new();
        api.on_start(Reply::Timeout);
        let (sink, mut events) = EventSink::channel();
        let (scene, _handle) = BattleScene::new(
            api,
            RecordingStage::new(),
            BattleLaunch::wild("ash", "overworld"),
            Arc::new(GameSession::new("ash")),
            SceneConfig::default(),
        );
        let mut scene = scene.with_events(sink);

        assert_eq!(scene.start().await, TurnFlow::Over(BattleOutcome::Aborted));

        let events = drain_events(&mut events);
        assert!(lines(&events).contains(&"The connection timed out."));
        assert!(scene.state().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flee_from_wild_battle() {
        let mut f = started(wild()).await;

        assert_eq!(f.scene.flee().await, TurnFlow::Over(BattleOutcome::Fled));

        assert_eq!(
            f.api.ends(),
            vec![EndBattleRequest {
                battle_id: "battle-1".to_string(),
                winner: None,
            }]
        );
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"Got away safely!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_end_call_does_not_block_exit() {
        let mut f = started(wild()).await;
        f.api.on_end(Reply::Fail("end rejected"));

        assert!(f.handle.flee().unwrap());
        let exit = f.scene.run().await;

        assert_eq!(exit.outcome, BattleOutcome::Fled);
        assert_eq!(f.api.ends().len(), 1);
        let events = drain_events(&mut f.events);
        assert!(matches!(
            events.last(),
            Some(SceneEvent::Transition {
                outcome: BattleOutcome::Fled,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trainer_battle_cannot_be_fled() {
        let mut f = started(trainer(vec![combatant("o1", "rattata", 5, 10, 10)])).await;
        assert_eq!(f.scene.state().unwrap().battle_type, BattleType::Trainer);

        assert_eq!(f.scene.flee().await, TurnFlow::Continue);

        assert!(f.api.ends().is_empty());
        assert!(!f.scene.gate().is_locked());
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"There's no running from this battle!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_with_unreported_pp_is_sent() {
        let mut me = combatant("p1", "pikachu", 5, 20, 20);
        let tackle = me["moveset"][0].as_object_mut().unwrap();
        tackle.remove("pp");
        tackle.remove("maxPP");
        let mut f = started(wild_with(vec![me])).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(5),
            "playerHP": 20,
            "opponentHP": 13
        }))));

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        assert_eq!(f.api.turns().len(), 1);
        let events = drain_events(&mut f.events);
        assert!(!lines(&events).contains(&"There's no PP left for this move!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_without_pp_is_not_sent() {
        let mut me = combatant("p1", "pikachu", 5, 20, 20);
        me["moveset"][0]["pp"] = json!(0);
        let mut f = started(wild_with(vec![me])).await;

        assert_eq!(f.scene.select_move("tackle").await, TurnFlow::Continue);

        assert!(f.api.turns().is_empty());
        let events = drain_events(&mut f.events);
        assert!(lines(&events).contains(&"There's no PP left for this move!"));
        assert!(!f.scene.gate().is_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_selector_backfills_placeholders() {
        let mut f = started(wild()).await;
        f.api.name("tackle", "Charge");

        f.scene.open_moves().await;

        let view = f.scene.view();
        assert_eq!(view.menu.state(), MenuState::MoveSelector);
        let buttons = view.ui.move_buttons();
        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[0].move_name.as_deref(), Some("tackle"));
        assert!(!buttons[0].synthetic);
        assert!(buttons[1..].iter().all(|b| b.synthetic && b.selectable));
        assert!(view.stage.has_text("Charge 35/35"));

        f.scene.close_moves();
        assert_eq!(f.scene.view().menu.state(), MenuState::MainMenu);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trainer_win_marks_defeat_and_hands_off_move_learning() {
        let f = trainer(vec![combatant("o1", "rattata", 5, 10, 10)]);
        let (satellites, mut requests) = Satellites::channel();
        let mut f = Fixture {
            scene: f.scene.with_satellites(satellites),
            ..f
        };
        f = started(f).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(10),
            "playerHP": 20,
            "opponentHP": 0,
            "isOver": true,
            "winner": "player",
            "xpGains": [{ "combatantId": "p1", "xpGained": 10, "newMovesAvailable": ["thunderbolt"] }]
        }))));

        let (flow, kind) = tokio::join!(f.scene.select_move("tackle"), async {
            let request = requests.recv().await.unwrap();
            let kind = request.kind.clone();
            request.complete(InterstitialOutcome::Done);
            kind
        });

        assert_eq!(flow, TurnFlow::Over(BattleOutcome::Won));
        let expected = InterstitialKind::MoveLearn {
            combatant_id: "p1".to_string(),
            moves: vec!["thunderbolt".to_string()],
        };
        assert_eq!(kind, expected);
        assert!(f.session.has_defeated("youngster-joey"));

        let events = drain_events(&mut f.events);
        let suspended = position(&events, &SceneEvent::Suspended(expected.clone()));
        let resumed = position(&events, &SceneEvent::Resumed(expected));
        assert!(suspended < resumed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evolution_without_host_applies_server_payload() {
        let mut f = started(wild()).await;
        f.api.on_turn(Reply::Ok(turn_result(json!({
            "playerAction": hit(18),
            "playerHP": 20,
            "opponentHP": 0,
            "isOver": true,
            "winner": "player",
            "xpGains": [{
                "combatantId": "p1",
                "xpGained": 10,
                "evolution": { "to": "raichu", "evolved": combatant("p1", "raichu", 5, 30, 30) }
            }]
        }))));

        assert_eq!(
            f.scene.select_move("tackle").await,
            TurnFlow::Over(BattleOutcome::Won)
        );

        let me = f.scene.state().unwrap().player_active();
        assert_eq!(me.name(), "raichu");
        assert_eq!(me.max_hp, 30);
        assert!(f.scene.stage().has_text("raichu"));
        let events = drain_events(&mut f.events);
        assert!(events.contains(&SceneEvent::Suspended(InterstitialKind::Evolution {
            combatant_id: "p1".to_string(),
            from: "pikachu".to_string(),
            to: "raichu".to_string(),
        })));
        // A wild win marks nobody
        assert!(!f.session.has_defeated("rattata"));
    }
}
