use skirmish_protocol::Side;
use tokio::sync::mpsc;

use crate::interstitial::InterstitialKind;
use crate::menu::MenuState;

/// How an encounter ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Won,
    Lost,
    Fled,
    /// The encounter never started or every input handle went away
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    EntryTransition,
    UiEntry,
    Attack,
    HpDrain,
    XpGain,
    LevelUp,
    Ko,
    SpriteFade,
}

/// Observable presentation steps, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Dialogue(String),
    DialogueHidden,
    AnimationStarted {
        kind: AnimationKind,
        side: Option<Side>,
    },
    AnimationFinished {
        kind: AnimationKind,
        side: Option<Side>,
    },
    MenuChanged(MenuState),
    Suspended(InterstitialKind),
    Resumed(InterstitialKind),
    Transition {
        scene: String,
        outcome: BattleOutcome,
    },
}

/// Fan-out point for [`SceneEvent`]s. Events are dropped when nobody
/// listens.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<SceneEvent>>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SceneEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: SceneEvent) {
        if let Some(tx) = &self.tx {
            tracing::trace!(?event, "Scene event");
            let _ = tx.send(event);
        }
    }

    pub(crate) fn started(&self, kind: AnimationKind, side: Option<Side>) {
        self.emit(SceneEvent::AnimationStarted { kind, side });
    }

    pub(crate) fn finished(&self, kind: AnimationKind, side: Option<Side>) {
        self.emit(SceneEvent::AnimationFinished { kind, side });
    }
}
