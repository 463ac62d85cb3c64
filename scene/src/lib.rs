//! Battle scene orchestration for the skirmish client.
//!
//! # Overview
//!
//! `skirmish-scene` drives one encounter from the entry transition to the
//! hand-back to the overworld:
//!
//! ```text
//! BattleHandle ──commands──▶ BattleScene ──▶ TurnManager ──▶ BattleApi
//!                                │                 │
//!                                ▼                 ▼
//!                              View ◀──── AnimationManager
//!              (UiManager, SpriteManager, MenuManager, Stage)
//! ```
//!
//! Rendering goes through the [`Stage`] trait, a retained node graph with
//! awaitable tweens. Everything inside a turn is awaited in sequence, so the
//! player's reaction always finishes on screen before the opponent's starts.
//!
//! # Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use skirmish_client::{ApiConfig, HttpBattleApi};
//! use skirmish_scene::{BattleLaunch, BattleScene, GameSession, SceneConfig};
//!
//! let api = HttpBattleApi::new(ApiConfig::default())?;
//! let session = Arc::new(GameSession::new("ash"));
//! let (mut scene, handle) = BattleScene::new(
//!     api,
//!     my_stage,
//!     BattleLaunch::wild("ash", "route-1"),
//!     session,
//!     SceneConfig::default(),
//! );
//!
//! // Wire `handle` to input, then:
//! let exit = scene.run().await;
//! switch_to(&exit.return_scene);
//! ```

pub mod animation;
pub mod config;
pub mod event;
pub mod interstitial;
pub mod menu;
pub mod scene;
pub mod session;
pub mod sprite;
pub mod stage;
pub mod turn;
pub mod ui;
pub mod view;

#[cfg(test)]
mod testing;

pub use animation::AnimationManager;
pub use config::{Layout, OpponentReply, Point, SceneConfig, Timings};
pub use event::{AnimationKind, BattleOutcome, EventSink, SceneEvent};
pub use interstitial::{InterstitialKind, InterstitialOutcome, InterstitialRequest, Satellites};
pub use menu::{MenuManager, MenuState};
pub use scene::{BattleExit, BattleHandle, BattleScene, PlayerCommand};
pub use session::{BattleLaunch, GameSession};
pub use sprite::{SpriteHandle, SpriteKind, SpriteManager};
pub use stage::{Color, Easing, NodeId, NodeKind, NodeSpec, Prop, Stage, StageError, Tween};
pub use turn::{TurnFlow, TurnGate, TurnManager};
pub use ui::{MoveButton, UiManager, hp_color, hp_percent};
pub use view::View;
