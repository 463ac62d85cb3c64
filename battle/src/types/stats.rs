//! Base stats

use skirmish_protocol::StatsData;

/// Stats the damage formula reads. The server owns the real values; the
/// client only needs them for the fallback reply formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub sp_attack: u32,
    pub sp_defense: u32,
    pub speed: u32,
}

impl BaseStats {
    pub fn from_protocol(stats: &StatsData) -> Self {
        Self {
            attack: stats.attack,
            defense: stats.defense,
            sp_attack: stats.sp_attack,
            sp_defense: stats.sp_defense,
            speed: stats.speed,
        }
    }
}
