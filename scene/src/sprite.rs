//! On-screen combatant representations
//!
//! A representation is a static image, a looping animated overlay or, when
//! neither asset resolves, a text glyph of the combatant's initials. Every
//! one is paired with an elliptical shadow. Callers only ever see a
//! [`SpriteHandle`].

use std::time::Duration;

use skirmish_battle::{Combatant, Side};

use crate::config::{Layout, Point};
use crate::stage::{Color, NodeId, NodeKind, NodeSpec, Prop, Stage, StageError, Tween};

const SPRITE_DEPTH: i32 = 10;
const SHADOW_DEPTH: i32 = 9;
const SHADOW_ALPHA: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteKind {
    Static,
    Animated,
    /// Initials drawn as text
    Glyph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteHandle {
    node: NodeId,
    shadow: NodeId,
    kind: SpriteKind,
    side: Side,
    home: Point,
    size: f32,
}

impl SpriteHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn shadow(&self) -> NodeId {
        self.shadow
    }

    pub fn kind(&self) -> SpriteKind {
        self.kind
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Resting position on screen
    pub fn home(&self) -> Point {
        self.home
    }

    /// Current position, falling back to the resting one
    pub fn position<S: Stage>(&self, stage: &S) -> Point {
        Point::new(
            stage.get(self.node, Prop::X).unwrap_or(self.home.x),
            stage.get(self.node, Prop::Y).unwrap_or(self.home.y),
        )
    }

    pub fn display_size<S: Stage>(&self, stage: &S) -> (f32, f32) {
        stage.size(self.node).unwrap_or((self.size, self.size))
    }

    /// Nodes that make up this representation
    pub fn nodes(&self) -> [NodeId; 2] {
        [self.node, self.shadow]
    }

    pub async fn fade_in<S: Stage>(&self, stage: &mut S, duration: Duration) -> Result<(), StageError> {
        stage
            .tween_all(vec![
                Tween::new(self.node, duration).to(Prop::Alpha, 1.0),
                Tween::new(self.shadow, duration).to(Prop::Alpha, SHADOW_ALPHA),
            ])
            .await
    }

    pub async fn fade_out<S: Stage>(&self, stage: &mut S, duration: Duration) -> Result<(), StageError> {
        stage
            .tween_all(vec![
                Tween::new(self.node, duration).to(Prop::Alpha, 0.0),
                Tween::new(self.shadow, duration).to(Prop::Alpha, 0.0),
            ])
            .await
    }

    pub fn destroy<S: Stage>(&self, stage: &mut S) {
        stage.despawn(self.node);
        stage.despawn(self.shadow);
    }
}

pub struct SpriteManager {
    layout: Layout,
    prefer_animated: bool,
    player: Option<SpriteHandle>,
    opponent: Option<SpriteHandle>,
}

impl SpriteManager {
    pub fn new(layout: Layout, prefer_animated: bool) -> Self {
        Self {
            layout,
            prefer_animated,
            player: None,
            opponent: None,
        }
    }

    pub fn handle(&self, side: Side) -> Option<&SpriteHandle> {
        match side {
            Side::Player => self.player.as_ref(),
            Side::Opponent => self.opponent.as_ref(),
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<SpriteHandle> {
        match side {
            Side::Player => &mut self.player,
            Side::Opponent => &mut self.opponent,
        }
    }

    pub fn home(&self, side: Side) -> Point {
        match side {
            Side::Player => self.layout.player_sprite,
            Side::Opponent => self.layout.opponent_sprite,
        }
    }

    /// Build the opponent's representation, replacing any previous one
    pub fn create_opponent_sprite<S: Stage>(
        &mut self,
        stage: &mut S,
        combatant: &Combatant,
    ) -> Result<SpriteHandle, StageError> {
        self.create(stage, Side::Opponent, combatant, 1.0)
    }

    /// Build or rebuild the player's representation. With `animate` it
    /// starts transparent and fades in.
    pub async fn create_or_update_player_sprite<S: Stage>(
        &mut self,
        stage: &mut S,
        combatant: &Combatant,
        animate: bool,
        fade: Duration,
    ) -> Result<SpriteHandle, StageError> {
        let alpha = if animate { 0.0 } else { 1.0 };
        let handle = self.create(stage, Side::Player, combatant, alpha)?;
        if animate {
            handle.fade_in(stage, fade).await?;
        }
        Ok(handle)
    }

    pub fn destroy_sprite<S: Stage>(&mut self, stage: &mut S, side: Side) {
        if let Some(handle) = self.slot(side).take() {
            handle.destroy(stage);
        }
    }

    pub async fn fade_in_sprite<S: Stage>(
        &self,
        stage: &mut S,
        side: Side,
        duration: Duration,
    ) -> Result<(), StageError> {
        match self.handle(side) {
            Some(handle) => handle.fade_in(stage, duration).await,
            None => Ok(()),
        }
    }

    pub fn clear<S: Stage>(&mut self, stage: &mut S) {
        self.destroy_sprite(stage, Side::Player);
        self.destroy_sprite(stage, Side::Opponent);
    }

    fn create<S: Stage>(
        &mut self,
        stage: &mut S,
        side: Side,
        combatant: &Combatant,
        alpha: f32,
    ) -> Result<SpriteHandle, StageError> {
        self.destroy_sprite(stage, side);

        let home = self.home(side);
        let size = self.layout.sprite_size;
        let shadow = stage.spawn(
            NodeSpec::new(NodeKind::Ellipse {
                width: size * 0.8,
                height: size * 0.2,
                color: Color::BLACK,
            })
            .at(home.x, home.y + size / 2.0 - 8.0)
            .alpha(alpha * SHADOW_ALPHA)
            .depth(SHADOW_DEPTH),
        )?;

        let (node, kind) = match self.spawn_body(stage, side, combatant, home, alpha) {
            Ok(body) => body,
            Err(e) => {
                stage.despawn(shadow);
                return Err(e);
            }
        };

        tracing::debug!(%side, name = combatant.name(), ?kind, "Created sprite");
        let handle = SpriteHandle {
            node,
            shadow,
            kind,
            side,
            home,
            size,
        };
        *self.slot(side) = Some(handle.clone());
        Ok(handle)
    }

    /// Animated overlay, then static image, then initials
    fn spawn_body<S: Stage>(
        &self,
        stage: &mut S,
        side: Side,
        combatant: &Combatant,
        home: Point,
        alpha: f32,
    ) -> Result<(NodeId, SpriteKind), StageError> {
        let refs = &combatant.sprites;
        let (still, animated) = match side {
            Side::Player => (&refs.back, &refs.back_animated),
            Side::Opponent => (&refs.front, &refs.front_animated),
        };

        let mut candidates = Vec::with_capacity(2);
        if self.prefer_animated
            && let Some(key) = animated
        {
            candidates.push((NodeKind::Animation { key: key.clone() }, SpriteKind::Animated));
        }
        if let Some(key) = still {
            candidates.push((NodeKind::Image { key: key.clone() }, SpriteKind::Static));
        }

        for (kind, sprite_kind) in candidates {
            let spec = NodeSpec::new(kind)
                .at(home.x, home.y)
                .alpha(alpha)
                .depth(SPRITE_DEPTH);
            match stage.spawn(spec) {
                Ok(node) => return Ok((node, sprite_kind)),
                Err(StageError::MissingAsset(key)) => {
                    tracing::warn!(%side, key, "Sprite asset missing, trying fallback");
                }
                Err(e) => return Err(e),
            }
        }

        let glyph = NodeSpec::new(NodeKind::text(combatant.initials(), 48))
            .at(home.x, home.y)
            .alpha(alpha)
            .depth(SPRITE_DEPTH);
        Ok((stage.spawn(glyph)?, SpriteKind::Glyph))
    }
}
