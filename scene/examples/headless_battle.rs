//! Headless Battle Example
//!
//! Plays a wild encounter against a running battle server with no graphics:
//! dialogue is printed to stdout and the player always picks the same move.
//!
//! ```text
//! SKIRMISH_API_URL=http://localhost:3000/api RUST_LOG=skirmish_scene=debug \
//!     cargo run -p skirmish-scene --example headless_battle -- ash tackle
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use skirmish_client::{ApiConfig, HttpBattleApi};
use skirmish_scene::{
    BattleHandle, BattleLaunch, BattleScene, Color, EventSink, GameSession, MenuState, NodeId,
    NodeKind, NodeSpec, Prop, SceneConfig, SceneEvent, Stage, StageError, Tween,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

/// Keeps node properties so tweens have something to land on; everything
/// else is a no-op
#[derive(Default)]
struct HeadlessStage {
    next: u64,
    nodes: HashMap<NodeId, HashMap<Prop, f32>>,
}

impl Stage for HeadlessStage {
    fn spawn(&mut self, spec: NodeSpec) -> Result<NodeId, StageError> {
        self.next += 1;
        let id = NodeId(self.next);
        let mut props = HashMap::from([
            (Prop::X, spec.x),
            (Prop::Y, spec.y),
            (Prop::Alpha, spec.alpha),
            (Prop::Scale, spec.scale),
        ]);
        if let NodeKind::Rect { width, .. } = spec.kind {
            props.insert(Prop::Width, width);
        }
        self.nodes.insert(id, props);
        Ok(id)
    }

    fn despawn(&mut self, node: NodeId) {
        self.nodes.remove(&node);
    }

    fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn set(&mut self, node: NodeId, prop: Prop, value: f32) -> Result<(), StageError> {
        self.nodes
            .get_mut(&node)
            .ok_or(StageError::UnknownNode(node))?
            .insert(prop, value);
        Ok(())
    }

    fn get(&self, node: NodeId, prop: Prop) -> Option<f32> {
        self.nodes.get(&node)?.get(&prop).copied()
    }

    fn set_text(&mut self, _node: NodeId, _text: &str) -> Result<(), StageError> {
        Ok(())
    }

    fn set_color(&mut self, _node: NodeId, _color: Color) -> Result<(), StageError> {
        Ok(())
    }

    fn size(&self, node: NodeId) -> Option<(f32, f32)> {
        let width = self.get(node, Prop::Width)?;
        Some((width, width))
    }

    fn screen_size(&self) -> (f32, f32) {
        (800.0, 600.0)
    }

    async fn tween(&mut self, tween: Tween) -> Result<(), StageError> {
        tokio::time::sleep(tween.total_duration()).await;
        if !tween.yoyo {
            for (prop, value) in tween.props {
                self.set(tween.target, prop, value)?;
            }
        }
        Ok(())
    }

    async fn tween_all(&mut self, tweens: Vec<Tween>) -> Result<(), StageError> {
        let longest = tweens
            .iter()
            .map(Tween::total_duration)
            .max()
            .unwrap_or(Duration::ZERO);
        tokio::time::sleep(longest).await;
        for tween in tweens.into_iter().filter(|t| !t.yoyo) {
            for (prop, value) in tween.props {
                self.set(tween.target, prop, value)?;
            }
        }
        Ok(())
    }

    async fn flash(&mut self, _color: Color, duration: Duration) -> Result<(), StageError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn play_sound(&mut self, key: &str) -> Result<(), StageError> {
        tracing::trace!(key, "Sound");
        Ok(())
    }
}

/// Print the dialogue and answer every prompt until the scene hands back
async fn autoplay(handle: BattleHandle, mut events: UnboundedReceiver<SceneEvent>, move_name: String) {
    let mut next_reserve = 1;
    while let Some(event) = events.recv().await {
        match event {
            // The prompt is the last line before the gate opens
            SceneEvent::Dialogue(line) if line.starts_with("What will") => {
                println!("  {}", line);
                if let Err(e) = handle.select_move(&move_name) {
                    tracing::warn!(error = %e, "Failed to send move");
                }
            }
            SceneEvent::Dialogue(line) => println!("  {}", line),
            SceneEvent::MenuChanged(MenuState::PartyMenu { forced: true }) => {
                if let Err(e) = handle.switch_to(next_reserve) {
                    tracing::warn!(error = %e, "Failed to send switch");
                }
                next_reserve += 1;
            }
            SceneEvent::Transition { scene, outcome } => {
                println!("=> {:?}, back to {}", outcome, scene);
                break;
            }
            _ => {}
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let player_id = args.next().unwrap_or_else(|| "ash".to_string());
    let move_name = args.next().unwrap_or_else(|| "tackle".to_string());

    let config = SceneConfig::from_env();
    let api = HttpBattleApi::new(ApiConfig::from_env())?;

    let (events, rx) = EventSink::channel();
    let (scene, handle) = BattleScene::new(
        api,
        HeadlessStage::default(),
        BattleLaunch::wild(player_id.as_str(), "overworld"),
        Arc::new(GameSession::new(player_id.as_str())),
        config,
    );
    let mut scene = scene.with_events(events);

    let (exit, ()) = tokio::join!(scene.run(), autoplay(handle, rx, move_name));
    tracing::info!(outcome = ?exit.outcome, "Battle finished");
    Ok(())
}
