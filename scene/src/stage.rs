//! Rendering boundary
//!
//! The battle core never draws anything itself. It spawns retained nodes on
//! a [`Stage`], mutates their properties and awaits tweens; the host engine
//! decides what a node looks like.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 0xRRGGBB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);
    pub const GOLD: Color = Color(0xffd700);
    pub const GREEN: Color = Color(0x00c000);
    pub const ORANGE: Color = Color(0xff9900);
    pub const RED: Color = Color(0xe00000);
    pub const BLUE: Color = Color(0x3080ff);
    pub const GREY: Color = Color(0x808080);
    pub const PANEL: Color = Color(0xf8f8d8);
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Static texture
    Image { key: String },
    /// Looping animated overlay
    Animation { key: String },
    Text { text: String, size: u16 },
    Rect { width: f32, height: f32, color: Color },
    Ellipse { width: f32, height: f32, color: Color },
    Ring { radius: f32, thickness: f32, color: Color },
    /// Grouping node with no visual of its own
    Container,
}

impl NodeKind {
    pub fn text(text: impl Into<String>, size: u16) -> Self {
        NodeKind::Text {
            text: text.into(),
            size,
        }
    }

    pub fn rect(width: f32, height: f32, color: Color) -> Self {
        NodeKind::Rect {
            width,
            height,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
    pub scale: f32,
    pub depth: i32,
    /// Positions are relative to the parent when one is set
    pub parent: Option<NodeId>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            x: 0.0,
            y: 0.0,
            alpha: 1.0,
            scale: 1.0,
            depth: 0,
            parent: None,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn depth(mut self, depth: i32) -> Self {
        self.depth = depth;
        self
    }

    pub fn within(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Numeric node properties that can be set and tweened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    X,
    Y,
    Alpha,
    Scale,
    /// Horizontal extent of rects (bar fills)
    Width,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    SineInOut,
}

/// Interpolation of one node's properties towards target values
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: NodeId,
    pub props: Vec<(Prop, f32)>,
    pub duration: Duration,
    pub easing: Easing,
    /// Play back to the starting values once the targets are reached
    pub yoyo: bool,
    /// Additional plays after the first
    pub repeat: u32,
}

impl Tween {
    pub fn new(target: NodeId, duration: Duration) -> Self {
        Self {
            target,
            props: Vec::new(),
            duration,
            easing: Easing::default(),
            yoyo: false,
            repeat: 0,
        }
    }

    pub fn to(mut self, prop: Prop, value: f32) -> Self {
        self.props.push((prop, value));
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn yoyo(mut self) -> Self {
        self.yoyo = true;
        self
    }

    pub fn repeat(mut self, times: u32) -> Self {
        self.repeat = times;
        self
    }

    /// Wall time until the tween settles
    pub fn total_duration(&self) -> Duration {
        let legs = if self.yoyo { 2 } else { 1 };
        self.duration * legs * (self.repeat + 1)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Asset not available: {0}")]
    MissingAsset(String),

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
}

/// Retained-mode display and audio surface provided by the host engine.
///
/// Async methods resolve once the effect has finished playing, which is
/// what lets the turn manager sequence animations with plain `.await`.
#[allow(async_fn_in_trait)]
pub trait Stage {
    fn spawn(&mut self, spec: NodeSpec) -> Result<NodeId, StageError>;

    /// Remove a node and its children. Unknown ids are ignored.
    fn despawn(&mut self, node: NodeId);

    fn exists(&self, node: NodeId) -> bool;

    fn set(&mut self, node: NodeId, prop: Prop, value: f32) -> Result<(), StageError>;

    fn get(&self, node: NodeId, prop: Prop) -> Option<f32>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), StageError>;

    fn set_color(&mut self, node: NodeId, color: Color) -> Result<(), StageError>;

    /// Displayed width and height, scale applied
    fn size(&self, node: NodeId) -> Option<(f32, f32)>;

    fn screen_size(&self) -> (f32, f32);

    async fn tween(&mut self, tween: Tween) -> Result<(), StageError>;

    /// Run several tweens together, resolving when the longest settles
    async fn tween_all(&mut self, tweens: Vec<Tween>) -> Result<(), StageError>;

    /// Full-screen color pulse
    async fn flash(&mut self, color: Color, duration: Duration) -> Result<(), StageError>;

    /// Start a sound cue; does not wait for it to finish
    fn play_sound(&mut self, key: &str) -> Result<(), StageError>;
}
