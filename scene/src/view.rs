use crate::event::{EventSink, SceneEvent};
use crate::menu::{MenuManager, MenuState};
use crate::sprite::SpriteManager;
use crate::stage::Stage;
use crate::ui::UiManager;

/// Everything on screen: the stage and the managers projecting onto it
pub struct View<S> {
    pub stage: S,
    pub ui: UiManager,
    pub sprites: SpriteManager,
    pub menu: MenuManager,
    pub events: EventSink,
}

impl<S: Stage> View<S> {
    /// Put a line in the dialogue box
    pub fn say(&mut self, text: impl Into<String>) {
        let text = text.into();
        let origin = self.ui.layout().dialogue;
        if let Err(e) = self.menu.show_dialogue(&mut self.stage, origin, &text) {
            tracing::warn!(error = %e, "Failed to show dialogue");
        }
        tracing::debug!(line = %text, "Dialogue");
        self.events.emit(SceneEvent::Dialogue(text));
    }

    pub fn hide_dialogue(&mut self) {
        if let Err(e) = self.menu.hide_dialogue(&mut self.stage) {
            tracing::warn!(error = %e, "Failed to hide dialogue");
        }
        self.events.emit(SceneEvent::DialogueHidden);
    }

    pub fn set_menu(&mut self, state: MenuState) {
        if let Err(e) = self.menu.set_state(&mut self.stage, &self.ui, state) {
            tracing::warn!(error = %e, ?state, "Failed to switch menu");
        }
        self.events.emit(SceneEvent::MenuChanged(state));
    }

    /// Remove every node the managers own
    pub fn clear(&mut self) {
        self.sprites.clear(&mut self.stage);
        self.ui.clear(&mut self.stage);
        self.menu.clear(&mut self.stage);
    }
}
