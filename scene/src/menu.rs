use skirmish_battle::Side;

use crate::config::Point;
use crate::stage::{Color, NodeId, NodeKind, NodeSpec, Prop, Stage, StageError};
use crate::ui::UiManager;

const DIALOGUE_DEPTH: i32 = 40;

/// Which menu is visible. Exactly one, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Hidden,
    MainMenu,
    MoveSelector,
    /// Switch prompt; `forced` after the active combatant fainted, in which
    /// case it cannot be dismissed
    PartyMenu { forced: bool },
}

#[derive(Debug)]
struct DialogueBox {
    panel: NodeId,
    text: NodeId,
}

/// Menu visibility plus the single-line dialogue overlay
#[derive(Debug, Default)]
pub struct MenuManager {
    state: MenuState,
    dialogue: Option<DialogueBox>,
    line: Option<String>,
}

impl MenuManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Line currently on screen
    pub fn dialogue(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn set_state<S: Stage>(&mut self, stage: &mut S, ui: &UiManager, state: MenuState) -> Result<(), StageError> {
        let panels = [
            (ui.main_menu_node(), state == MenuState::MainMenu),
            (ui.move_selector_node(), state == MenuState::MoveSelector),
            (
                ui.party_menu_node(),
                matches!(state, MenuState::PartyMenu { .. }),
            ),
        ];
        for (node, visible) in panels {
            if let Some(node) = node {
                stage.set(node, Prop::Alpha, if visible { 1.0 } else { 0.0 })?;
            }
        }
        if self.state != state {
            tracing::trace!(from = ?self.state, to = ?state, "Menu state changed");
        }
        self.state = state;
        Ok(())
    }

    /// Show a line, replacing whatever line is up
    pub fn show_dialogue<S: Stage>(&mut self, stage: &mut S, origin: Point, text: &str) -> Result<(), StageError> {
        let dialogue = match self.dialogue.take() {
            Some(d) if stage.exists(d.panel) => d,
            _ => {
                let panel = stage.spawn(
                    NodeSpec::new(NodeKind::rect(440.0, 100.0, Color::WHITE))
                        .at(origin.x, origin.y)
                        .depth(DIALOGUE_DEPTH),
                )?;
                let text = stage.spawn(
                    NodeSpec::new(NodeKind::text("", 20))
                        .at(16.0, 16.0)
                        .within(panel)
                        .depth(DIALOGUE_DEPTH + 1),
                )?;
                DialogueBox { panel, text }
            }
        };

        stage.set_text(dialogue.text, text)?;
        stage.set(dialogue.panel, Prop::Alpha, 1.0)?;
        stage.set(dialogue.text, Prop::Alpha, 1.0)?;
        self.dialogue = Some(dialogue);
        self.line = Some(text.to_string());
        Ok(())
    }

    pub fn hide_dialogue<S: Stage>(&mut self, stage: &mut S) -> Result<(), StageError> {
        if let Some(d) = &self.dialogue {
            stage.set(d.panel, Prop::Alpha, 0.0)?;
            stage.set(d.text, Prop::Alpha, 0.0)?;
        }
        self.line = None;
        Ok(())
    }

    pub fn clear<S: Stage>(&mut self, stage: &mut S) {
        if let Some(d) = self.dialogue.take() {
            stage.despawn(d.text);
            stage.despawn(d.panel);
        }
        self.line = None;
        self.state = MenuState::Hidden;
    }
}

/// "What will X do?"
pub fn prompt_line(name: &str) -> String {
    format!("What will {} do?", name)
}

/// Dialogue prefix naming the owner of a combatant
pub fn owner_prefix(side: Side) -> &'static str {
    match side {
        Side::Player => "",
        Side::Opponent => "The foe ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use crate::testing::RecordingStage;

    #[test]
    fn test_menus_are_mutually_exclusive() {
        let mut stage = RecordingStage::new();
        let mut ui = UiManager::new(Layout::default());
        let main = ui.create_main_menu(&mut stage).unwrap();
        let moves = ui.create_move_selector(&mut stage, &[]).unwrap().len();
        assert_eq!(moves, 0);
        let selector = ui.move_selector_node().unwrap();
        let mut menu = MenuManager::new();

        menu.set_state(&mut stage, &ui, MenuState::MainMenu).unwrap();
        assert_eq!(stage.get(main, Prop::Alpha), Some(1.0));
        assert_eq!(stage.get(selector, Prop::Alpha), Some(0.0));

        menu.set_state(&mut stage, &ui, MenuState::MoveSelector).unwrap();
        assert_eq!(stage.get(main, Prop::Alpha), Some(0.0));
        assert_eq!(stage.get(selector, Prop::Alpha), Some(1.0));
        assert_eq!(menu.state(), MenuState::MoveSelector);
    }

    #[test]
    fn test_dialogue_replaces_text_without_queueing() {
        let mut stage = RecordingStage::new();
        let mut menu = MenuManager::new();
        let origin = Layout::default().dialogue;

        menu.show_dialogue(&mut stage, origin, "first").unwrap();
        let nodes = stage.node_count();
        menu.show_dialogue(&mut stage, origin, "second").unwrap();

        assert_eq!(stage.node_count(), nodes);
        assert_eq!(menu.dialogue(), Some("second"));
        assert!(!stage.has_text("first"));

        menu.hide_dialogue(&mut stage).unwrap();
        assert_eq!(menu.dialogue(), None);
    }

    #[test]
    fn test_dialogue_is_independent_of_menu_state() {
        let mut stage = RecordingStage::new();
        let ui = UiManager::new(Layout::default());
        let mut menu = MenuManager::new();

        menu.set_state(&mut stage, &ui, MenuState::PartyMenu { forced: true })
            .unwrap();
        menu.show_dialogue(&mut stage, Point::new(0.0, 0.0), "Choose!")
            .unwrap();
        assert_eq!(menu.state(), MenuState::PartyMenu { forced: true });
        assert_eq!(menu.dialogue(), Some("Choose!"));
    }
}
