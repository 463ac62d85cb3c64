//! Visual effect routines
//!
//! Every routine resolves once its effect has finished on screen. The turn
//! manager awaits them one after another, so two routines never drive the
//! same node at once. Stage failures inside a routine are logged and the
//! routine carries on; an animation never stalls a turn.

use skirmish_battle::progression::{MAX_LEVEL, level_progress, xp_for_level};
use skirmish_battle::{BattleState, Side};
use skirmish_protocol::ActionResult;

use crate::config::Timings;
use crate::event::AnimationKind;
use crate::menu::{MenuState, prompt_line};
use crate::stage::{Color, Easing, NodeKind, NodeSpec, Prop, Stage, StageError, Tween};
use crate::ui::hp_percent;
use crate::view::View;

const SHAKE_OFFSET: f32 = 8.0;
const KO_SINK: f32 = 40.0;
const LUNGE_FRACTION: f32 = 0.3;

fn soft<T>(result: Result<T, StageError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "{} failed", what);
            None
        }
    }
}

pub struct AnimationManager {
    timings: Timings,
}

impl AnimationManager {
    pub fn new(timings: Timings) -> Self {
        Self { timings }
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    /// Two white pulses, then a ring closing in to black
    pub async fn play_entry_transition<S: Stage>(&self, view: &mut View<S>) {
        view.events.started(AnimationKind::EntryTransition, None);

        for _ in 0..2 {
            soft(
                view.stage.flash(Color::WHITE, self.timings.entry_flash).await,
                "Entry flash",
            );
        }

        let (width, height) = view.stage.screen_size();
        let radius = width.hypot(height) / 2.0;
        let ring = view.stage.spawn(
            NodeSpec::new(NodeKind::Ring {
                radius,
                thickness: radius,
                color: Color::BLACK,
            })
            .at(width / 2.0, height / 2.0)
            .depth(100),
        );
        if let Some(ring) = soft(ring, "Ring wipe") {
            soft(
                view.stage
                    .tween(
                        Tween::new(ring, self.timings.ring_wipe)
                            .to(Prop::Scale, 0.0)
                            .ease(Easing::QuadIn),
                    )
                    .await,
                "Ring wipe",
            );
            view.stage.despawn(ring);
        }

        view.events.finished(AnimationKind::EntryTransition, None);
    }

    /// Bring in both HUDs and both combatants, then the main menu and the
    /// opening lines
    pub async fn play_ui_entry<S: Stage>(&self, view: &mut View<S>, state: &BattleState) {
        view.events.started(AnimationKind::UiEntry, None);

        self.fade_in_hud(view, Side::Opponent).await;
        self.slide_in(view, Side::Opponent, state.opponent_active().species_key())
            .await;
        self.fade_in_hud(view, Side::Player).await;
        self.slide_in(view, Side::Player, state.player_active().species_key())
            .await;

        if let Some(menu) = view.ui.main_menu_node() {
            soft(view.stage.set(menu, Prop::Alpha, 0.0), "Menu fade");
            soft(
                view.stage
                    .tween(Tween::new(menu, self.timings.sprite_fade).to(Prop::Alpha, 1.0))
                    .await,
                "Menu fade",
            );
        }
        view.set_menu(MenuState::MainMenu);
        view.events.finished(AnimationKind::UiEntry, None);

        let foe = state.opponent_active().name();
        let intro = if state.battle_type.can_flee() {
            format!("A wild {} appeared!", foe)
        } else {
            format!("The opponent sent out {}!", foe)
        };
        view.say(intro);
        tokio::time::sleep(self.timings.message_pause).await;
        view.say(prompt_line(state.player_active().name()));
    }

    async fn fade_in_hud<S: Stage>(&self, view: &mut View<S>, side: Side) {
        let nodes = view.ui.hud_nodes(side);
        for node in &nodes {
            soft(view.stage.set(*node, Prop::Alpha, 0.0), "HUD fade");
        }
        let tweens = nodes
            .into_iter()
            .map(|n| Tween::new(n, self.timings.sprite_fade).to(Prop::Alpha, 1.0))
            .collect();
        soft(view.stage.tween_all(tweens).await, "HUD fade");
    }

    /// Opponent enters from the left, player from the right. The cry plays
    /// just before the slide.
    async fn slide_in<S: Stage>(&self, view: &mut View<S>, side: Side, species: &str) {
        let Some(handle) = view.sprites.handle(side).cloned() else {
            return;
        };
        let (width, _) = view.stage.screen_size();
        let (size, _) = handle.display_size(&view.stage);
        let start = match side {
            Side::Opponent => -size,
            Side::Player => width + size,
        };
        let offset = start - handle.home().x;

        for node in handle.nodes() {
            let x = view.stage.get(node, Prop::X).unwrap_or(handle.home().x);
            soft(view.stage.set(node, Prop::X, x + offset), "Sprite placement");
        }
        if let Err(e) = view.stage.play_sound(&format!("cry-{}", species)) {
            tracing::debug!(species, error = %e, "No cry available");
        }

        let tweens = handle
            .nodes()
            .into_iter()
            .map(|node| {
                let x = view.stage.get(node, Prop::X).unwrap_or(start) - offset;
                Tween::new(node, self.timings.entry_slide)
                    .to(Prop::X, x)
                    .ease(Easing::QuadOut)
            })
            .collect();
        soft(view.stage.tween_all(tweens).await, "Sprite slide");
    }

    /// Lunge 30% of the way towards the defender and back, then the impact.
    ///
    /// Returns `false` when the action carries no side tag or a
    /// representation is missing; the step is skipped in that case.
    pub async fn animate_attack<S: Stage>(&self, view: &mut View<S>, action: &ActionResult) -> bool {
        let Some(side) = action.side else {
            tracing::error!(?action, "Action has no side tag, skipping attack animation");
            return false;
        };
        let (Some(attacker), Some(defender)) = (
            view.sprites.handle(side).cloned(),
            view.sprites.handle(side.other()).cloned(),
        ) else {
            tracing::error!(%side, "Attack target not on screen, skipping attack animation");
            return false;
        };

        view.events.started(AnimationKind::Attack, Some(side));

        let from = attacker.position(&view.stage);
        let to = defender.position(&view.stage);
        let hit = from.lerp(to, LUNGE_FRACTION);
        soft(
            view.stage
                .tween(
                    Tween::new(attacker.node(), self.timings.lunge)
                        .to(Prop::X, hit.x)
                        .to(Prop::Y, hit.y)
                        .ease(Easing::QuadOut)
                        .yoyo(),
                )
                .await,
            "Lunge",
        );

        let cue = action
            .move_name
            .as_deref()
            .map(|m| format!("move-{}", m))
            .unwrap_or_else(|| "hit".to_string());
        if view.stage.play_sound(&cue).is_err() {
            soft(view.stage.play_sound("hit"), "Impact sound");
        }

        soft(
            view.stage
                .tween(
                    Tween::new(defender.node(), self.timings.shake)
                        .to(Prop::X, to.x + SHAKE_OFFSET)
                        .yoyo()
                        .repeat(2),
                )
                .await,
            "Shake",
        );
        if action.critical {
            soft(
                view.stage.flash(Color::WHITE, self.timings.critical_flash).await,
                "Critical flash",
            );
        }

        view.events.finished(AnimationKind::Attack, Some(side));
        true
    }

    /// Move one side's HP bar from the last rendered percentage to `hp`,
    /// frame by frame. Without a baseline the bar starts full.
    pub async fn animate_hp_drain<S: Stage>(&self, view: &mut View<S>, side: Side, hp: u32, max_hp: u32) {
        view.events.started(AnimationKind::HpDrain, Some(side));

        let from = view.ui.last_hp_percent(side).unwrap_or(100.0);
        let to = hp_percent(hp, max_hp);
        let frame = self.timings.frame;
        let frames = (self.timings.hp_drain.as_millis() / frame.as_millis().max(1)).max(1) as u32;

        for i in 1..=frames {
            let t = i as f32 / frames as f32;
            let percent = from + (to - from) * t;
            let shown = if i == frames {
                hp
            } else {
                (percent / 100.0 * max_hp as f32).round() as u32
            };
            soft(
                view.ui
                    .render_hp(&mut view.stage, side, percent, Some((shown, max_hp))),
                "HP drain",
            );
            tokio::time::sleep(frame).await;
        }

        view.events.finished(AnimationKind::HpDrain, Some(side));
    }

    /// Fill the active player's XP bar by `xp_gained`, playing a level-up
    /// for every boundary crossed. Returns whether any level was gained.
    pub async fn animate_xp_gain<S: Stage>(
        &self,
        view: &mut View<S>,
        name: &str,
        xp_gained: u32,
        old_xp: u32,
        old_level: u8,
    ) -> bool {
        view.events.started(AnimationKind::XpGain, Some(Side::Player));

        let target = old_xp.saturating_add(xp_gained);
        let mut level = old_level.clamp(1, MAX_LEVEL);
        let mut leveled = false;
        soft(
            view.ui.set_xp_percent(&mut view.stage, level_progress(level, old_xp)),
            "XP bar",
        );

        while level < MAX_LEVEL && target >= xp_for_level(level + 1) {
            self.fill_xp(view, 100.0).await;

            view.events.started(AnimationKind::LevelUp, Some(Side::Player));
            self.flash_xp_bar(view).await;
            level += 1;
            soft(view.ui.set_level(&mut view.stage, Side::Player, level), "Level badge");
            tokio::time::sleep(self.timings.message_pause).await;
            view.say(format!("{} grew to level {}!", name, level));
            tokio::time::sleep(self.timings.message_pause).await;
            view.events.finished(AnimationKind::LevelUp, Some(Side::Player));

            soft(view.ui.set_xp_percent(&mut view.stage, 0.0), "XP bar");
            leveled = true;
        }

        self.fill_xp(view, level_progress(level, target)).await;
        view.events.finished(AnimationKind::XpGain, Some(Side::Player));
        leveled
    }

    async fn fill_xp<S: Stage>(&self, view: &mut View<S>, percent: f32) {
        let Some(node) = view.ui.xp_fill_node() else {
            return;
        };
        let width = view.ui.xp_width(percent);
        soft(
            view.stage
                .tween(Tween::new(node, self.timings.xp_fill).to(Prop::Width, width))
                .await,
            "XP fill",
        );
    }

    async fn flash_xp_bar<S: Stage>(&self, view: &mut View<S>) {
        let Some(node) = view.ui.xp_fill_node() else {
            return;
        };
        for color in [Color::WHITE, Color::GOLD, Color::WHITE] {
            soft(view.stage.set_color(node, color), "Level-up flash");
            tokio::time::sleep(self.timings.level_up_flash).await;
        }
        soft(view.stage.set_color(node, Color::BLUE), "Level-up flash");
    }

    /// Faint cue first, then sink and fade the combatant with its shadow and
    /// HUD together
    pub async fn animate_ko<S: Stage>(&self, view: &mut View<S>, side: Side) {
        soft(view.stage.play_sound("faint"), "Faint sound");
        view.events.started(AnimationKind::Ko, Some(side));

        let duration = self.timings.ko;
        let mut tweens = Vec::new();
        if let Some(handle) = view.sprites.handle(side) {
            let y = handle.position(&view.stage).y;
            tweens.push(
                Tween::new(handle.node(), duration)
                    .to(Prop::Y, y + KO_SINK)
                    .to(Prop::Alpha, 0.0)
                    .ease(Easing::QuadIn),
            );
            tweens.push(Tween::new(handle.shadow(), duration).to(Prop::Alpha, 0.0));
        }
        tweens.extend(
            view.ui
                .hud_nodes(side)
                .into_iter()
                .map(|n| Tween::new(n, duration).to(Prop::Alpha, 0.0)),
        );
        soft(view.stage.tween_all(tweens).await, "KO");

        view.events.finished(AnimationKind::Ko, Some(side));
    }

    /// Recall animation for a voluntary switch
    pub async fn fade_out_sprite<S: Stage>(&self, view: &mut View<S>, side: Side) {
        let Some(handle) = view.sprites.handle(side).cloned() else {
            return;
        };
        view.events.started(AnimationKind::SpriteFade, Some(side));
        soft(
            handle.fade_out(&mut view.stage, self.timings.sprite_fade).await,
            "Sprite fade",
        );
        view.events.finished(AnimationKind::SpriteFade, Some(side));
    }
}
