//! HUD projection: name and level badges, HP and XP bars, menus
//!
//! Nothing here decides anything about the battle. The manager turns
//! combatant snapshots into nodes and keeps the one piece of display state
//! that matters for animation: the HP percentage last rendered per side.

use skirmish_battle::{Combatant, Move, Party, Side, progression};

use crate::config::{Layout, Point};
use crate::stage::{Color, NodeId, NodeKind, NodeSpec, Prop, Stage, StageError};

const HUD_DEPTH: i32 = 20;
const MENU_DEPTH: i32 = 30;
const BAR_HEIGHT: f32 = 6.0;
const BUTTON_WIDTH: f32 = 140.0;
const BUTTON_HEIGHT: f32 = 36.0;

/// Fill percentage of an HP bar, always within `0.0..=100.0`
pub fn hp_percent(hp: u32, max_hp: u32) -> f32 {
    if max_hp == 0 {
        return 0.0;
    }
    (hp as f32 / max_hp as f32 * 100.0).clamp(0.0, 100.0)
}

/// Green above half, orange above a quarter, red otherwise
pub fn hp_color(percent: f32) -> Color {
    if percent > 50.0 {
        Color::GREEN
    } else if percent > 25.0 {
        Color::ORANGE
    } else {
        Color::RED
    }
}

#[derive(Debug)]
struct Hud {
    container: NodeId,
    level: NodeId,
    hp_fill: NodeId,
    hp_text: Option<NodeId>,
    xp_fill: Option<NodeId>,
    nodes: Vec<NodeId>,
    /// HP percentage on screen; `None` right after a rebuild
    shown_hp: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveButton {
    pub node: NodeId,
    pub label: Option<NodeId>,
    /// `None` for inert placeholders
    pub move_name: Option<String>,
    pub synthetic: bool,
    pub selectable: bool,
}

impl MoveButton {
    pub fn is_inert(&self) -> bool {
        self.move_name.is_none()
    }
}

#[derive(Debug)]
struct Panel {
    container: NodeId,
}

pub struct UiManager {
    layout: Layout,
    player: Option<Hud>,
    opponent: Option<Hud>,
    main_menu: Option<Panel>,
    move_selector: Option<Panel>,
    move_buttons: Vec<MoveButton>,
    party_menu: Option<Panel>,
}

impl UiManager {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            player: None,
            opponent: None,
            main_menu: None,
            move_selector: None,
            move_buttons: Vec::new(),
            party_menu: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn hud(&self, side: Side) -> Option<&Hud> {
        match side {
            Side::Player => self.player.as_ref(),
            Side::Opponent => self.opponent.as_ref(),
        }
    }

    fn hud_mut(&mut self, side: Side) -> Option<&mut Hud> {
        match side {
            Side::Player => self.player.as_mut(),
            Side::Opponent => self.opponent.as_mut(),
        }
    }

    pub fn create_opponent_ui<S: Stage>(&mut self, stage: &mut S, combatant: &Combatant) -> Result<(), StageError> {
        let hud = self.build_hud(stage, Side::Opponent, combatant, true)?;
        self.replace_hud(stage, Side::Opponent, hud);
        Ok(())
    }

    pub fn create_player_ui<S: Stage>(&mut self, stage: &mut S, combatant: &Combatant) -> Result<(), StageError> {
        let hud = self.build_hud(stage, Side::Player, combatant, true)?;
        self.replace_hud(stage, Side::Player, hud);
        Ok(())
    }

    /// Tear down and rebuild the player HUD. The HP bar restarts full with
    /// no baseline, so the next drain plays from 100%.
    pub fn update_complete_player_ui<S: Stage>(
        &mut self,
        stage: &mut S,
        combatant: &Combatant,
    ) -> Result<(), StageError> {
        self.destroy_hud(stage, Side::Player);
        let hud = self.build_hud(stage, Side::Player, combatant, false)?;
        self.player = Some(hud);
        Ok(())
    }

    /// Opponent counterpart of [`UiManager::update_complete_player_ui`]
    pub fn update_complete_opponent_ui<S: Stage>(
        &mut self,
        stage: &mut S,
        combatant: &Combatant,
    ) -> Result<(), StageError> {
        self.destroy_hud(stage, Side::Opponent);
        let hud = self.build_hud(stage, Side::Opponent, combatant, false)?;
        self.opponent = Some(hud);
        Ok(())
    }

    pub fn destroy_hud<S: Stage>(&mut self, stage: &mut S, side: Side) {
        let hud = match side {
            Side::Player => self.player.take(),
            Side::Opponent => self.opponent.take(),
        };
        if let Some(hud) = hud {
            for node in hud.nodes.iter().rev() {
                stage.despawn(*node);
            }
        }
    }

    fn replace_hud<S: Stage>(&mut self, stage: &mut S, side: Side, hud: Hud) {
        self.destroy_hud(stage, side);
        match side {
            Side::Player => self.player = Some(hud),
            Side::Opponent => self.opponent = Some(hud),
        }
    }

    fn build_hud<S: Stage>(
        &self,
        stage: &mut S,
        side: Side,
        combatant: &Combatant,
        with_baseline: bool,
    ) -> Result<Hud, StageError> {
        let origin = match side {
            Side::Player => self.layout.player_hud,
            Side::Opponent => self.layout.opponent_hud,
        };
        let level = combatant.effective_level();
        let percent = if with_baseline {
            hp_percent(combatant.current_hp, combatant.max_hp)
        } else {
            100.0
        };

        let container = stage.spawn(
            NodeSpec::new(NodeKind::rect(260.0, 80.0, Color::PANEL))
                .at(origin.x, origin.y)
                .depth(HUD_DEPTH),
        )?;
        let mut nodes = vec![container];
        let mut spawn = |stage: &mut S, spec: NodeSpec| -> Result<NodeId, StageError> {
            let node = stage.spawn(spec.within(container).depth(HUD_DEPTH + 1))?;
            nodes.push(node);
            Ok(node)
        };

        spawn(stage, NodeSpec::new(NodeKind::text(combatant.name(), 20)).at(12.0, 8.0))?;
        let level_node = spawn(
            stage,
            NodeSpec::new(NodeKind::text(format!("Lv{}", level), 18)).at(200.0, 8.0),
        )?;
        spawn(
            stage,
            NodeSpec::new(NodeKind::rect(self.layout.hp_bar_width, BAR_HEIGHT, Color::GREY)).at(90.0, 38.0),
        )?;
        let hp_fill = spawn(
            stage,
            NodeSpec::new(NodeKind::rect(
                self.layout.hp_bar_width * percent / 100.0,
                BAR_HEIGHT,
                hp_color(percent),
            ))
            .at(90.0, 38.0),
        )?;

        let mut hp_text = None;
        let mut xp_fill = None;
        if side == Side::Player {
            hp_text = Some(spawn(
                stage,
                NodeSpec::new(NodeKind::text(
                    format!("{}/{}", combatant.current_hp, combatant.max_hp),
                    16,
                ))
                .at(150.0, 48.0),
            )?);
            spawn(
                stage,
                NodeSpec::new(NodeKind::rect(self.layout.xp_bar_width, BAR_HEIGHT / 2.0, Color::GREY))
                    .at(30.0, 72.0),
            )?;
            let xp = progression::level_progress(level, combatant.experience);
            xp_fill = Some(spawn(
                stage,
                NodeSpec::new(NodeKind::rect(
                    self.layout.xp_bar_width * xp / 100.0,
                    BAR_HEIGHT / 2.0,
                    Color::BLUE,
                ))
                .at(30.0, 72.0),
            )?);
        }

        Ok(Hud {
            container,
            level: level_node,
            hp_fill,
            hp_text,
            xp_fill,
            nodes,
            shown_hp: with_baseline.then_some(percent),
        })
    }

    /// Container plus every element of one side's HUD
    pub fn hud_nodes(&self, side: Side) -> Vec<NodeId> {
        self.hud(side).map(|h| h.nodes.clone()).unwrap_or_default()
    }

    pub fn hud_container(&self, side: Side) -> Option<NodeId> {
        self.hud(side).map(|h| h.container)
    }

    pub fn hp_fill_node(&self, side: Side) -> Option<NodeId> {
        self.hud(side).map(|h| h.hp_fill)
    }

    pub fn xp_fill_node(&self) -> Option<NodeId> {
        self.player.as_ref().and_then(|h| h.xp_fill)
    }

    /// Percentage the HP bar was last rendered at
    pub fn last_hp_percent(&self, side: Side) -> Option<f32> {
        self.hud(side).and_then(|h| h.shown_hp)
    }

    pub fn reset_hp_baseline(&mut self, side: Side) {
        if let Some(hud) = self.hud_mut(side) {
            hud.shown_hp = None;
        }
    }

    /// Draw the HP bar at `percent` and remember it as the new baseline
    pub fn render_hp<S: Stage>(
        &mut self,
        stage: &mut S,
        side: Side,
        percent: f32,
        hp_text: Option<(u32, u32)>,
    ) -> Result<(), StageError> {
        let width = self.layout.hp_bar_width;
        let Some(hud) = self.hud_mut(side) else {
            return Ok(());
        };
        let percent = percent.clamp(0.0, 100.0);
        stage.set(hud.hp_fill, Prop::Width, width * percent / 100.0)?;
        stage.set_color(hud.hp_fill, hp_color(percent))?;
        if let (Some(node), Some((hp, max))) = (hud.hp_text, hp_text) {
            stage.set_text(node, &format!("{}/{}", hp, max))?;
        }
        hud.shown_hp = Some(percent);
        Ok(())
    }

    pub fn set_level<S: Stage>(&self, stage: &mut S, side: Side, level: u8) -> Result<(), StageError> {
        match self.hud(side) {
            Some(hud) => stage.set_text(hud.level, &format!("Lv{}", level)),
            None => Ok(()),
        }
    }

    /// Width of the XP fill at `percent`
    pub fn xp_width(&self, percent: f32) -> f32 {
        self.layout.xp_bar_width * percent.clamp(0.0, 100.0) / 100.0
    }

    pub fn set_xp_percent<S: Stage>(&self, stage: &mut S, percent: f32) -> Result<(), StageError> {
        match self.xp_fill_node() {
            Some(node) => stage.set(node, Prop::Width, self.xp_width(percent)),
            None => Ok(()),
        }
    }

    pub fn create_main_menu<S: Stage>(&mut self, stage: &mut S) -> Result<NodeId, StageError> {
        self.destroy_panel(stage, MenuPanel::Main);
        let origin = self.layout.menu;
        let container = spawn_panel(stage, origin)?;
        for (i, label) in ["FIGHT", "PARTY", "RUN"].iter().enumerate() {
            stage.spawn(
                NodeSpec::new(NodeKind::text(*label, 22))
                    .at(16.0 + (i % 2) as f32 * BUTTON_WIDTH, 12.0 + (i / 2) as f32 * BUTTON_HEIGHT)
                    .within(container)
                    .depth(MENU_DEPTH + 1),
            )?;
        }
        self.main_menu = Some(Panel { container });
        Ok(container)
    }

    /// Buttons for the active combatant's moves. `moves` comes already
    /// backfilled, paired with display labels.
    pub fn create_move_selector<S: Stage>(
        &mut self,
        stage: &mut S,
        moves: &[(Move, String)],
    ) -> Result<&[MoveButton], StageError> {
        self.destroy_panel(stage, MenuPanel::Moves);
        let container = spawn_panel(stage, Point::new(self.layout.dialogue.x, self.layout.menu.y))?;

        let mut buttons = Vec::with_capacity(moves.len());
        for (slot, (mv, label)) in moves.iter().enumerate() {
            buttons.push(self.create_move_button(stage, container, slot, mv, label)?);
        }

        self.move_selector = Some(Panel { container });
        self.move_buttons = buttons;
        Ok(&self.move_buttons)
    }

    /// One move button. A move without a key becomes an inert placeholder.
    pub fn create_move_button<S: Stage>(
        &self,
        stage: &mut S,
        parent: NodeId,
        slot: usize,
        mv: &Move,
        label: &str,
    ) -> Result<MoveButton, StageError> {
        let x = (slot % 2) as f32 * (BUTTON_WIDTH + 8.0) + 8.0;
        let y = (slot / 2) as f32 * (BUTTON_HEIGHT + 4.0) + 8.0;

        if !mv.is_valid() {
            tracing::warn!(slot, ?mv, "Invalid move data, rendering placeholder");
            let node = stage.spawn(
                NodeSpec::new(NodeKind::rect(BUTTON_WIDTH, BUTTON_HEIGHT, Color::GREY))
                    .at(x, y)
                    .alpha(0.4)
                    .within(parent)
                    .depth(MENU_DEPTH + 1),
            )?;
            return Ok(MoveButton {
                node,
                label: None,
                move_name: None,
                synthetic: mv.synthetic,
                selectable: false,
            });
        }

        let selectable = mv.is_selectable();
        let node = stage.spawn(
            NodeSpec::new(NodeKind::rect(BUTTON_WIDTH, BUTTON_HEIGHT, Color::WHITE))
                .at(x, y)
                .alpha(if selectable { 1.0 } else { 0.5 })
                .within(parent)
                .depth(MENU_DEPTH + 1),
        )?;
        let text = stage.spawn(
            NodeSpec::new(NodeKind::text(format!("{} {}/{}", label, mv.pp, mv.max_pp), 16))
                .at(6.0, 8.0)
                .within(node)
                .depth(MENU_DEPTH + 2),
        )?;

        Ok(MoveButton {
            node,
            label: Some(text),
            move_name: Some(mv.name.clone()),
            synthetic: mv.synthetic,
            selectable,
        })
    }

    pub fn move_buttons(&self) -> &[MoveButton] {
        &self.move_buttons
    }

    /// List of party members for a switch prompt. Fainted members are dimmed.
    pub fn create_party_menu<S: Stage>(&mut self, stage: &mut S, party: &Party) -> Result<NodeId, StageError> {
        self.destroy_panel(stage, MenuPanel::Party);
        let container = spawn_panel(stage, Point::new(self.layout.dialogue.x, 40.0))?;
        for (i, member) in party.members().iter().enumerate() {
            let marker = if i == party.active_index() { ">" } else { " " };
            stage.spawn(
                NodeSpec::new(NodeKind::text(
                    format!(
                        "{} {} Lv{} {}/{}",
                        marker,
                        member.name(),
                        member.effective_level(),
                        member.current_hp,
                        member.max_hp
                    ),
                    18,
                ))
                .at(16.0, 12.0 + i as f32 * 28.0)
                .alpha(if member.is_alive() { 1.0 } else { 0.4 })
                .within(container)
                .depth(MENU_DEPTH + 1),
            )?;
        }
        self.party_menu = Some(Panel { container });
        Ok(container)
    }

    pub fn main_menu_node(&self) -> Option<NodeId> {
        self.main_menu.as_ref().map(|p| p.container)
    }

    pub fn move_selector_node(&self) -> Option<NodeId> {
        self.move_selector.as_ref().map(|p| p.container)
    }

    pub fn party_menu_node(&self) -> Option<NodeId> {
        self.party_menu.as_ref().map(|p| p.container)
    }

    fn destroy_panel<S: Stage>(&mut self, stage: &mut S, which: MenuPanel) {
        let panel = match which {
            MenuPanel::Main => self.main_menu.take(),
            MenuPanel::Moves => {
                self.move_buttons.clear();
                self.move_selector.take()
            }
            MenuPanel::Party => self.party_menu.take(),
        };
        if let Some(panel) = panel {
            stage.despawn(panel.container);
        }
    }

    pub fn clear<S: Stage>(&mut self, stage: &mut S) {
        self.destroy_hud(stage, Side::Player);
        self.destroy_hud(stage, Side::Opponent);
        self.destroy_panel(stage, MenuPanel::Main);
        self.destroy_panel(stage, MenuPanel::Moves);
        self.destroy_panel(stage, MenuPanel::Party);
    }
}

#[derive(Clone, Copy)]
enum MenuPanel {
    Main,
    Moves,
    Party,
}

fn spawn_panel<S: Stage>(stage: &mut S, origin: Point) -> Result<NodeId, StageError> {
    stage.spawn(
        NodeSpec::new(NodeKind::rect(300.0, 100.0, Color::PANEL))
            .at(origin.x, origin.y)
            .alpha(0.0)
            .depth(MENU_DEPTH),
    )
}
