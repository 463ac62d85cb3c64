//! Moves and the placeholder-move policy

use skirmish_protocol::MoveData;

use super::element::Type;

/// Maximum number of moves a combatant can know
pub const MAX_MOVES: usize = 4;

/// Damage category of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl MoveCategory {
    /// Parse a server category. Unknown values fall back on power: damaging
    /// moves are treated as physical, the rest as status.
    pub fn from_protocol(s: Option<&str>, power: u32) -> Self {
        match s.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("physical") => MoveCategory::Physical,
            Some("special") => MoveCategory::Special,
            Some("status") => MoveCategory::Status,
            _ if power > 0 => MoveCategory::Physical,
            _ => MoveCategory::Status,
        }
    }
}

/// A move slot
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    /// Canonical server key. Empty for malformed entries.
    pub name: String,

    pub move_type: Option<Type>,

    pub category: MoveCategory,

    /// 0 means non-damaging
    pub power: u32,

    pub accuracy: Option<u32>,

    /// Remaining uses
    pub pp: u32,

    pub max_pp: u32,

    /// True for placeholder moves inserted to fill an incomplete moveset
    pub synthetic: bool,
}

/// Pool assumed for moves whose payload carries no PP at all
pub const DEFAULT_PP: u32 = 35;

/// (key, type, category, power, accuracy, pp)
const PLACEHOLDER_MOVES: [(&str, Type, MoveCategory, u32, u32, u32); MAX_MOVES] = [
    ("tackle", Type::Normal, MoveCategory::Physical, 40, 100, 35),
    ("growl", Type::Normal, MoveCategory::Status, 0, 100, 40),
    ("scratch", Type::Normal, MoveCategory::Physical, 40, 100, 35),
    ("tail-whip", Type::Normal, MoveCategory::Status, 0, 100, 30),
];

impl Move {
    pub fn new(name: impl Into<String>, move_type: Type, power: u32) -> Self {
        let category = if power > 0 {
            MoveCategory::Physical
        } else {
            MoveCategory::Status
        };
        Self {
            name: name.into(),
            move_type: Some(move_type),
            category,
            power,
            accuracy: Some(100),
            pp: DEFAULT_PP,
            max_pp: DEFAULT_PP,
            synthetic: false,
        }
    }

    pub fn from_protocol(data: &MoveData) -> Self {
        let power = data.power.unwrap_or(0);
        let max_pp = data.max_pp.or(data.pp).unwrap_or(DEFAULT_PP);
        Self {
            name: data.name.clone().unwrap_or_default(),
            move_type: data.move_type.as_deref().and_then(Type::from_protocol),
            category: MoveCategory::from_protocol(data.category.as_deref(), power),
            power,
            accuracy: data.accuracy,
            pp: data.pp.unwrap_or(max_pp),
            max_pp,
            synthetic: false,
        }
    }

    /// The fixed placeholder list used to backfill short movesets
    pub fn placeholders() -> Vec<Move> {
        PLACEHOLDER_MOVES
            .iter()
            .map(|&(name, move_type, category, power, accuracy, pp)| Move {
                name: name.to_string(),
                move_type: Some(move_type),
                category,
                power,
                accuracy: Some(accuracy),
                pp,
                max_pp: pp,
                synthetic: true,
            })
            .collect()
    }

    /// Malformed entries have no key
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn is_damaging(&self) -> bool {
        self.power > 0 && self.category != MoveCategory::Status
    }

    pub fn is_selectable(&self) -> bool {
        self.is_valid() && self.pp > 0
    }

    /// Whole-value copy with one use spent
    pub fn spent(&self) -> Move {
        Move {
            pp: self.pp.saturating_sub(1),
            ..self.clone()
        }
    }
}

/// Fill a moveset up to [`MAX_MOVES`] with placeholder moves it does not
/// already contain. Real moves keep their positions; placeholders are
/// appended and flagged `synthetic`.
pub fn with_placeholders(moves: &[Move]) -> Vec<Move> {
    let mut filled: Vec<Move> = moves.iter().take(MAX_MOVES).cloned().collect();
    for placeholder in Move::placeholders() {
        if filled.len() >= MAX_MOVES {
            break;
        }
        if !filled.iter().any(|m| m.name == placeholder.name) {
            filled.push(placeholder);
        }
    }
    filled
}
