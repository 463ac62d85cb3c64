//! In-memory stage and scripted battle server shared by the unit tests

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use skirmish_client::{ApiError, BattleApi};
use skirmish_protocol::{
    EndBattleRequest, StartBattleRequest, StartBattleResponse, SwitchRequest, TurnRequest,
    TurnResult,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::event::SceneEvent;
use crate::stage::{Color, NodeId, NodeKind, NodeSpec, Prop, Stage, StageError, Tween};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StageOp {
    Spawn(NodeId),
    Despawn(NodeId),
    Set(NodeId, Prop, f32),
    Tween(NodeId),
    Flash(Color),
    Sound(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    props: HashMap<Prop, f32>,
    text: Option<String>,
    color: Option<Color>,
}

/// Node graph kept in memory. Tweens sleep for their duration on the tokio
/// clock and then jump to their end values.
#[derive(Debug)]
pub(crate) struct RecordingStage {
    next: u64,
    nodes: BTreeMap<NodeId, Node>,
    missing: HashSet<String>,
    ops: Vec<StageOp>,
}

impl RecordingStage {
    pub fn new() -> Self {
        Self {
            next: 1,
            nodes: BTreeMap::new(),
            missing: HashSet::new(),
            ops: Vec::new(),
        }
    }

    /// Make an image, animation or sound key fail to resolve
    pub fn mark_missing(&mut self, key: &str) {
        self.missing.insert(key.to_string());
    }

    pub fn ops(&self) -> &[StageOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn text_of(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).and_then(|n| n.text.clone())
    }

    pub fn color_of(&self, node: NodeId) -> Option<Color> {
        self.nodes.get(&node).and_then(|n| n.color)
    }

    pub fn has_text(&self, text: &str) -> bool {
        self.nodes.values().any(|n| n.text.as_deref() == Some(text))
    }

    /// Widths explicitly set on a node, in order
    pub fn widths_set(&self, node: NodeId) -> Vec<f32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StageOp::Set(n, Prop::Width, w) if *n == node => Some(*w),
                _ => None,
            })
            .collect()
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, StageError> {
        self.nodes.get_mut(&node).ok_or(StageError::UnknownNode(node))
    }

    fn settle(&mut self, tween: &Tween) {
        if tween.yoyo {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&tween.target) {
            for (prop, value) in &tween.props {
                node.props.insert(*prop, *value);
            }
        }
    }
}

impl Stage for RecordingStage {
    fn spawn(&mut self, spec: NodeSpec) -> Result<NodeId, StageError> {
        if let NodeKind::Image { key } | NodeKind::Animation { key } = &spec.kind
            && self.missing.contains(key)
        {
            return Err(StageError::MissingAsset(key.clone()));
        }
        if let Some(parent) = spec.parent
            && !self.nodes.contains_key(&parent)
        {
            return Err(StageError::UnknownNode(parent));
        }

        let id = NodeId(self.next);
        self.next += 1;

        let mut props = HashMap::from([
            (Prop::X, spec.x),
            (Prop::Y, spec.y),
            (Prop::Alpha, spec.alpha),
            (Prop::Scale, spec.scale),
        ]);
        let (text, color) = match &spec.kind {
            NodeKind::Text { text, .. } => (Some(text.clone()), None),
            NodeKind::Rect { width, color, .. } => {
                props.insert(Prop::Width, *width);
                (None, Some(*color))
            }
            NodeKind::Ellipse { color, .. } | NodeKind::Ring { color, .. } => (None, Some(*color)),
            _ => (None, None),
        };

        self.nodes.insert(
            id,
            Node {
                kind: spec.kind,
                parent: spec.parent,
                props,
                text,
                color,
            },
        );
        self.ops.push(StageOp::Spawn(id));
        Ok(id)
    }

    fn despawn(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_none() {
            return;
        }
        self.ops.push(StageOp::Despawn(node));
        let children: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent == Some(node))
            .map(|(id, _)| *id)
            .collect();
        for child in children {
            self.despawn(child);
        }
    }

    fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn set(&mut self, node: NodeId, prop: Prop, value: f32) -> Result<(), StageError> {
        self.node_mut(node)?.props.insert(prop, value);
        self.ops.push(StageOp::Set(node, prop, value));
        Ok(())
    }

    fn get(&self, node: NodeId, prop: Prop) -> Option<f32> {
        self.nodes.get(&node)?.props.get(&prop).copied()
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), StageError> {
        self.node_mut(node)?.text = Some(text.to_string());
        Ok(())
    }

    fn set_color(&mut self, node: NodeId, color: Color) -> Result<(), StageError> {
        self.node_mut(node)?.color = Some(color);
        Ok(())
    }

    fn size(&self, node: NodeId) -> Option<(f32, f32)> {
        let n = self.nodes.get(&node)?;
        let scale = n.props.get(&Prop::Scale).copied().unwrap_or(1.0);
        match n.kind {
            NodeKind::Rect { height, .. } => {
                let width = n.props.get(&Prop::Width).copied().unwrap_or(0.0);
                Some((width * scale, height * scale))
            }
            _ => None,
        }
    }

    fn screen_size(&self) -> (f32, f32) {
        (800.0, 600.0)
    }

    async fn tween(&mut self, tween: Tween) -> Result<(), StageError> {
        if !self.exists(tween.target) {
            return Err(StageError::UnknownNode(tween.target));
        }
        self.ops.push(StageOp::Tween(tween.target));
        tokio::time::sleep(tween.total_duration()).await;
        self.settle(&tween);
        Ok(())
    }

    async fn tween_all(&mut self, tweens: Vec<Tween>) -> Result<(), StageError> {
        let longest = tweens
            .iter()
            .map(Tween::total_duration)
            .max()
            .unwrap_or(Duration::ZERO);
        for tween in &tweens {
            self.ops.push(StageOp::Tween(tween.target));
        }
        tokio::time::sleep(longest).await;
        for tween in &tweens {
            self.settle(tween);
        }
        Ok(())
    }

    async fn flash(&mut self, color: Color, duration: Duration) -> Result<(), StageError> {
        self.ops.push(StageOp::Flash(color));
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn play_sound(&mut self, key: &str) -> Result<(), StageError> {
        if self.missing.contains(key) {
            return Err(StageError::MissingAsset(key.to_string()));
        }
        self.ops.push(StageOp::Sound(key.to_string()));
        Ok(())
    }
}

pub(crate) fn drain_events(rx: &mut UnboundedReceiver<SceneEvent>) -> Vec<SceneEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub(crate) enum Reply<T> {
    Ok(T),
    Fail(&'static str),
    Timeout,
    /// Never resolves
    Hang,
}

impl<T> Reply<T> {
    async fn resolve(self, operation: &'static str) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Fail(message) => Err(anyhow!(message)),
            Reply::Timeout => Err(ApiError::Timeout {
                operation,
                after: Duration::from_secs(10),
            }
            .into()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    Start(StartBattleRequest),
    Turn(TurnRequest),
    Switch(SwitchRequest),
    End(EndBattleRequest),
    /// Key and locale
    MoveName(String, String),
}

#[derive(Default)]
struct Script {
    start: Mutex<VecDeque<Reply<StartBattleResponse>>>,
    turns: Mutex<VecDeque<Reply<TurnResult>>>,
    switches: Mutex<VecDeque<Reply<()>>>,
    ends: Mutex<VecDeque<Reply<()>>>,
    names: Mutex<HashMap<String, String>>,
    stall_names: AtomicBool,
    calls: Mutex<Vec<ApiCall>>,
}

/// Battle server answering from queued replies. Clones share the script.
/// Switch and end calls succeed unless a reply was queued for them.
#[derive(Clone, Default)]
pub(crate) struct ScriptedApi {
    script: Arc<Script>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(&self, reply: Reply<StartBattleResponse>) -> &Self {
        self.script.start.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_turn(&self, reply: Reply<TurnResult>) -> &Self {
        self.script.turns.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_switch(&self, reply: Reply<()>) -> &Self {
        self.script.switches.lock().unwrap().push_back(reply);
        self
    }

    pub fn on_end(&self, reply: Reply<()>) -> &Self {
        self.script.ends.lock().unwrap().push_back(reply);
        self
    }

    pub fn name(&self, key: &str, localized: &str) -> &Self {
        self.script
            .names
            .lock()
            .unwrap()
            .insert(key.to_string(), localized.to_string());
        self
    }

    /// Name lookups never answer from now on
    pub fn stall_names(&self) -> &Self {
        self.script.stall_names.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.script.calls.lock().unwrap().clone()
    }

    pub fn turns(&self) -> Vec<TurnRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Turn(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn switches(&self) -> Vec<SwitchRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Switch(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn ends(&self) -> Vec<EndBattleRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::End(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.script.calls.lock().unwrap().push(call);
    }
}

impl BattleApi for ScriptedApi {
    async fn start_battle(&self, request: &StartBattleRequest) -> Result<StartBattleResponse> {
        self.record(ApiCall::Start(request.clone()));
        let reply = self.script.start.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve("start battle").await,
            None => Err(anyhow!("no scripted start")),
        }
    }

    async fn take_turn(&self, request: &TurnRequest) -> Result<TurnResult> {
        self.record(ApiCall::Turn(request.clone()));
        let reply = self.script.turns.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply.resolve("take turn").await,
            None => Err(anyhow!("no scripted turn")),
        }
    }

    async fn switch_combatant(&self, request: &SwitchRequest) -> Result<()> {
        self.record(ApiCall::Switch(request.clone()));
        let reply = self.script.switches.lock().unwrap().pop_front();
        reply.unwrap_or(Reply::Ok(())).resolve("switch").await
    }

    async fn end_battle(&self, request: &EndBattleRequest) -> Result<()> {
        self.record(ApiCall::End(request.clone()));
        let reply = self.script.ends.lock().unwrap().pop_front();
        reply.unwrap_or(Reply::Ok(())).resolve("end battle").await
    }

    async fn move_name(&self, key: &str, locale: &str) -> Result<String> {
        self.record(ApiCall::MoveName(key.to_string(), locale.to_string()));
        if self.script.stall_names.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let name = self.script.names.lock().unwrap().get(key).cloned();
        name.ok_or_else(|| anyhow!("no name for {}", key))
    }
}

/// Combatant payload with one damaging move
pub(crate) fn combatant(id: &str, species: &str, level: u8, hp: u32, max_hp: u32) -> Value {
    json!({
        "_id": id,
        "species": { "name": species },
        "level": level,
        "experience": skirmish_battle::progression::xp_for_level(level),
        "currentHP": hp,
        "maxHP": max_hp,
        "stats": { "attack": 12, "defense": 10, "spAttack": 11, "spDefense": 10, "speed": 9 },
        "types": ["normal"],
        "moveset": [
            { "name": "tackle", "type": "normal", "category": "physical", "power": 40, "accuracy": 100, "pp": 35, "maxPP": 35 }
        ],
        "sprites": { "front": format!("{}-front", species), "back": format!("{}-back", species) }
    })
}

pub(crate) fn start_response(player: Vec<Value>, opponent: Vec<Value>) -> StartBattleResponse {
    serde_json::from_value(json!({
        "battleId": "battle-1",
        "playerTeam": player,
        "opponentTeam": opponent,
        "battleLog": []
    }))
    .unwrap()
}

pub(crate) fn turn_result(value: Value) -> TurnResult {
    serde_json::from_value(value).unwrap()
}
