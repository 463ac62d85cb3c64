//! Experience curve
//!
//! Total experience needed to reach level `L` is
//! `floor(1.2·L³ − 15·L² + 100·L − 140)`, and 0 below level 2. The cubic
//! term is evaluated as `floor(6·L³ / 5)` in integers so that levels whose
//! cube is a multiple of 5 never land one point short through float error.

/// Highest reachable level
pub const MAX_LEVEL: u8 = 100;

/// Total experience required to reach `level`
pub fn xp_for_level(level: u8) -> u32 {
    if level < 2 {
        return 0;
    }
    let l = i64::from(level);
    let total = (6 * l * l * l).div_euclid(5) - 15 * l * l + 100 * l - 140;
    total.max(0) as u32
}

/// Highest level whose requirement `xp` meets, capped at [`MAX_LEVEL`]
pub fn level_from_xp(xp: u32) -> u8 {
    let mut level = 1;
    while level < MAX_LEVEL && xp_for_level(level + 1) <= xp {
        level += 1;
    }
    level
}

/// Fill percentage of the experience bar within `level`, in `0.0..=100.0`
pub fn level_progress(level: u8, xp: u32) -> f32 {
    if level >= MAX_LEVEL {
        return 100.0;
    }
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level + 1);
    if ceiling <= floor {
        return 0.0;
    }
    let into_level = xp.saturating_sub(floor) as f32;
    (into_level / (ceiling - floor) as f32 * 100.0).clamp(0.0, 100.0)
}
