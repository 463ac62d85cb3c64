//! Live battle state

mod battle;
mod party;

use thiserror::Error;

pub use battle::BattleState;
pub use party::{MAX_PARTY_SIZE, Party};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Party has no members")]
    EmptyParty,

    #[error("Party has {0} members, more than allowed")]
    PartyTooLarge(usize),

    #[error("Party index {index} out of range (party size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Combatant {0} appears twice in one party")]
    DuplicateMember(String),

    #[error("No combatant with id {0}")]
    UnknownCombatant(String),
}
