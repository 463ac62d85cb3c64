//! Battle domain types and state for the skirmish client.
//!
//! # Overview
//!
//! `skirmish-battle` sits between `skirmish-protocol` (wire format) and the
//! presentation layer:
//!
//! ```text
//! skirmish-protocol (wire format)
//!        │
//!        ▼
//! skirmish-battle (domain types + state) ← THIS CRATE
//!        │
//!        ▼
//! skirmish-scene (turn orchestration + presentation)
//! ```
//!
//! # Main Types
//!
//! - [`Combatant`] - one party member (identity, HP, moves, stats)
//! - [`Move`] - a move slot, including synthetic placeholder moves
//! - [`Type`] - elemental types with the effectiveness chart
//! - [`Party`] / [`BattleState`] - per-encounter state with an index-held
//!   active member per side
//! - [`progression`] - the cubic experience curve
//! - [`damage`] - the client-side fallback damage formula
//!
//! # Example Usage
//!
//! ```ignore
//! use skirmish_battle::{BattleState, progression};
//!
//! let state = BattleState::from_start(&response, BattleType::Wild)?;
//! let me = state.player_active();
//! println!("{} Lv{} ({}%)", me.name(), me.effective_level(),
//!     progression::level_progress(me.effective_level(), me.experience));
//! ```

pub mod damage;
pub mod progression;
pub mod state;
pub mod types;

pub use state::{BattleState, MAX_PARTY_SIZE, Party, StateError};
pub use types::{
    BaseStats, Combatant, DEFAULT_PP, MAX_MOVES, Move, MoveCategory, TYPE_CHART, Type, UNKNOWN_NAME,
    UnknownType, with_placeholders,
};

// Re-export commonly used protocol types
pub use skirmish_protocol::{BattleType, Side};
