//! Domain types for the battle core

mod combatant;
mod element;
mod moves;
mod stats;

pub use combatant::{Combatant, UNKNOWN_NAME};
pub use element::{TYPE_CHART, Type, UnknownType};
pub use moves::{DEFAULT_PP, MAX_MOVES, Move, MoveCategory, with_placeholders};
pub use stats::BaseStats;
