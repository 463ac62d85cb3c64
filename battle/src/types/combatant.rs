//! Combatant state

use skirmish_protocol::{CombatantData, SpriteRefs};

use super::element::Type;
use super::moves::{MAX_MOVES, Move};
use super::stats::BaseStats;
use crate::progression::level_from_xp;

/// Name shown when a payload carries no usable name at all
pub const UNKNOWN_NAME: &str = "???";

/// One party member's in-battle data
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    /// Server identity, unique within a party
    pub id: String,

    // === Display identity ===
    pub nickname: Option<String>,
    pub localized_species: Option<String>,
    pub species: Option<String>,
    pub generic_name: Option<String>,

    // === Progression ===
    /// Reported level; 1 when the server omitted it
    pub level: u8,
    pub experience: u32,

    // === HP (0 <= current_hp <= max_hp) ===
    pub current_hp: u32,
    pub max_hp: u32,

    pub stats: BaseStats,

    /// 1-2 elemental tags
    pub types: Vec<Type>,

    /// At most [`MAX_MOVES`] entries, in slot order
    pub moveset: Vec<Move>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub sprites: SpriteRefs,
}

impl Combatant {
    /// Create a bare combatant at full health
    pub fn new(id: impl Into<String>, species: impl Into<String>, level: u8, max_hp: u32) -> Self {
        Self {
            id: id.into(),
            nickname: None,
            localized_species: None,
            species: Some(species.into()),
            generic_name: None,
            level,
            experience: 0,
            current_hp: max_hp,
            max_hp,
            stats: BaseStats::default(),
            types: Vec::new(),
            moveset: Vec::new(),
            sprites: SpriteRefs::default(),
        }
    }

    /// Create from a server payload
    pub fn from_protocol(data: &CombatantData) -> Self {
        let species = data.species.as_ref();
        let max_hp = data.max_hp.max(data.current_hp);
        Self {
            id: data.id.clone(),
            nickname: non_empty(data.nickname.as_deref()),
            localized_species: non_empty(species.and_then(|s| s.localized_name.as_deref())),
            species: non_empty(species.and_then(|s| s.name.as_deref())),
            generic_name: non_empty(data.name.as_deref()),
            level: data.level.unwrap_or(1),
            experience: data.experience,
            current_hp: data.current_hp,
            max_hp,
            stats: BaseStats::from_protocol(&data.stats),
            types: Type::parse_all(&data.types).into_iter().take(2).collect(),
            moveset: data
                .moveset
                .iter()
                .take(MAX_MOVES)
                .map(Move::from_protocol)
                .collect(),
            sprites: data.sprites.clone(),
        }
    }

    /// Display name: nickname, then localized species, then species, then
    /// the generic name
    pub fn name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.localized_species.as_deref())
            .or(self.species.as_deref())
            .or(self.generic_name.as_deref())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Key used for cries and other per-species assets
    pub fn species_key(&self) -> &str {
        self.species
            .as_deref()
            .or(self.generic_name.as_deref())
            .unwrap_or(UNKNOWN_NAME)
    }

    /// Up to two uppercase initials, used when no sprite can be shown
    pub fn initials(&self) -> String {
        let name = self.name();
        let words: Vec<&str> = name
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|w| !w.is_empty())
            .collect();

        let initials: String = if words.len() >= 2 {
            words.iter().take(2).filter_map(|w| w.chars().next()).collect()
        } else {
            name.chars().take(2).collect()
        };
        initials.to_uppercase()
    }

    /// Level to display. A missing or level-1 report is cross-checked
    /// against experience, since older saves never updated the field.
    pub fn effective_level(&self) -> u8 {
        if self.level <= 1 {
            level_from_xp(self.experience).max(1)
        } else {
            self.level
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_fainted()
    }

    /// Copy with HP replaced, clamped to `0..=max_hp`
    pub fn with_hp(&self, hp: u32) -> Combatant {
        Combatant {
            current_hp: hp.min(self.max_hp),
            ..self.clone()
        }
    }

    /// Copy with progression replaced
    pub fn with_progress(&self, level: u8, experience: u32) -> Combatant {
        Combatant {
            level,
            experience,
            ..self.clone()
        }
    }

    /// Copy with one move's PP spent. Unknown moves leave it unchanged.
    pub fn with_move_spent(&self, move_name: &str) -> Combatant {
        Combatant {
            moveset: self
                .moveset
                .iter()
                .map(|m| if m.name == move_name { m.spent() } else { m.clone() })
                .collect(),
            ..self.clone()
        }
    }

    pub fn find_move(&self, move_name: &str) -> Option<&Move> {
        self.moveset.iter().find(|m| m.name == move_name)
    }

    pub fn has_type(&self, t: Type) -> bool {
        self.types.contains(&t)
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
