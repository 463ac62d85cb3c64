//! Elemental types and the effectiveness chart

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Elemental type tag (18 types)
///
/// The discriminant doubles as the row/column index into [`TYPE_CHART`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Type {
    Normal = 0,
    Fire = 1,
    Water = 2,
    Electric = 3,
    Grass = 4,
    Ice = 5,
    Fighting = 6,
    Poison = 7,
    Ground = 8,
    Flying = 9,
    Psychic = 10,
    Bug = 11,
    Rock = 12,
    Ghost = 13,
    Dragon = 14,
    Dark = 15,
    Steel = 16,
    Fairy = 17,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown type: {0}")]
pub struct UnknownType(pub String);

impl Type {
    const NAMES: [&'static str; 18] = [
        "normal", "fire", "water", "electric", "grass", "ice", "fighting", "poison", "ground",
        "flying", "psychic", "bug", "rock", "ghost", "dragon", "dark", "steel", "fairy",
    ];

    const ALL: [Type; 18] = [
        Type::Normal,
        Type::Fire,
        Type::Water,
        Type::Electric,
        Type::Grass,
        Type::Ice,
        Type::Fighting,
        Type::Poison,
        Type::Ground,
        Type::Flying,
        Type::Psychic,
        Type::Bug,
        Type::Rock,
        Type::Ghost,
        Type::Dragon,
        Type::Dark,
        Type::Steel,
        Type::Fairy,
    ];

    /// Multiplier of an attack of this type against one defending type
    pub fn against(self, defender: Type) -> f32 {
        TYPE_CHART[self as usize][defender as usize]
    }

    /// Combined multiplier against a (possibly dual-typed) defender.
    /// An empty type list is neutral.
    pub fn against_all(self, defenders: &[Type]) -> f32 {
        defenders.iter().map(|t| self.against(*t)).product()
    }

    /// Parse a server type tag, ignoring case
    pub fn from_protocol(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Parse every recognised tag, dropping unknown ones
    pub fn parse_all<S: AsRef<str>>(tags: &[S]) -> Vec<Type> {
        tags.iter()
            .filter_map(|t| Type::from_protocol(t.as_ref()))
            .collect()
    }

    /// Lowercase server spelling
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }
}

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::NAMES
            .iter()
            .position(|name| *name == wanted)
            .map(|idx| Self::ALL[idx])
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 18x18 type effectiveness chart
/// Row = attacking type, Column = defending type
/// Values: 0.0 = immune, 0.5 = not very effective, 1.0 = neutral, 2.0 = super effective
///
/// Order: Normal, Fire, Water, Electric, Grass, Ice, Fighting, Poison, Ground,
///        Flying, Psychic, Bug, Rock, Ghost, Dragon, Dark, Steel, Fairy
#[rustfmt::skip]
pub static TYPE_CHART: [[f32; 18]; 18] = [
    // Normal attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 0.0, 1.0, 1.0, 0.5, 1.0],
    // Fire attacking
    [1.0, 0.5, 0.5, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 0.5, 1.0, 2.0, 1.0],
    // Water attacking
    [1.0, 2.0, 0.5, 1.0, 0.5, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 1.0, 1.0],
    // Electric attacking
    [1.0, 1.0, 2.0, 0.5, 0.5, 1.0, 1.0, 1.0, 0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0],
    // Grass attacking
    [1.0, 0.5, 2.0, 1.0, 0.5, 1.0, 1.0, 0.5, 2.0, 0.5, 1.0, 0.5, 2.0, 1.0, 0.5, 1.0, 0.5, 1.0],
    // Ice attacking
    [1.0, 0.5, 0.5, 1.0, 2.0, 0.5, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0],
    // Fighting attacking
    [2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 0.5, 0.5, 0.5, 2.0, 0.0, 1.0, 2.0, 2.0, 0.5],
    // Poison attacking
    [1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 0.0, 2.0],
    // Ground attacking
    [1.0, 2.0, 1.0, 2.0, 0.5, 1.0, 1.0, 2.0, 1.0, 0.0, 1.0, 0.5, 2.0, 1.0, 1.0, 1.0, 2.0, 1.0],
    // Flying attacking
    [1.0, 1.0, 1.0, 0.5, 2.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 1.0, 1.0, 0.5, 1.0],
    // Psychic attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.0, 0.5, 1.0],
    // Bug attacking
    [1.0, 0.5, 1.0, 1.0, 2.0, 1.0, 0.5, 0.5, 1.0, 0.5, 2.0, 1.0, 1.0, 0.5, 1.0, 2.0, 0.5, 0.5],
    // Rock attacking
    [1.0, 2.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 0.5, 2.0, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0],
    // Ghost attacking
    [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 1.0],
    // Dragon attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 0.5, 0.0],
    // Dark attacking
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 1.0, 0.5, 1.0, 0.5],
    // Steel attacking
    [1.0, 0.5, 0.5, 0.5, 1.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 0.5, 2.0],
    // Fairy attacking
    [1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 2.0, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 0.5, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_type_matchups() {
        assert_eq!(Type::Water.against(Type::Fire), 2.0);
        assert_eq!(Type::Fire.against(Type::Water), 0.5);
        assert_eq!(Type::Electric.against(Type::Ground), 0.0);
        assert_eq!(Type::Normal.against(Type::Normal), 1.0);
    }

    #[test]
    fn test_dual_type_matchups() {
        assert_eq!(Type::Ice.against_all(&[Type::Dragon, Type::Flying]), 4.0);
        assert_eq!(Type::Grass.against_all(&[Type::Fire, Type::Flying]), 0.25);
        assert_eq!(Type::Ground.against_all(&[Type::Rock, Type::Flying]), 0.0);
        assert_eq!(Type::Fire.against_all(&[]), 1.0);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Electric".parse::<Type>(), Ok(Type::Electric));
        assert_eq!(Type::from_protocol(" GHOST "), Some(Type::Ghost));
        assert_eq!(
            "shadow".parse::<Type>(),
            Err(UnknownType("shadow".to_string()))
        );
    }

    #[test]
    fn test_parse_all_drops_unknown() {
        let types = Type::parse_all(&["grass", "???", "poison"]);
        assert_eq!(types, vec![Type::Grass, Type::Poison]);
    }

    #[test]
    fn test_names_line_up_with_discriminants() {
        for (idx, ty) in Type::ALL.iter().enumerate() {
            assert_eq!(*ty as usize, idx);
            assert_eq!(Type::from_protocol(ty.as_str()), Some(*ty));
        }
    }
}
