use std::time::Duration;

use serde::Deserialize;

/// Who decides the opponent's reply after a voluntary switch.
///
/// The switch endpoint only acknowledges, so the server never resolves that
/// reply. Every move turn is resolved server-side regardless of this
/// setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpponentReply {
    /// Roll the reply locally with the standard damage formula
    #[default]
    ClientFallback,
    /// The opponent does not act after a voluntary switch
    Skip,
}

/// Durations of every pause and animation the scene plays
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Hold after a dialogue line before the next step
    #[serde(with = "millis")]
    pub message_pause: Duration,
    /// Between announcing a move and submitting it
    #[serde(with = "millis")]
    pub dramatic_pause: Duration,
    /// Before the gate is released after a failed call
    #[serde(with = "millis")]
    pub error_release: Duration,
    #[serde(with = "millis")]
    pub lunge: Duration,
    #[serde(with = "millis")]
    pub shake: Duration,
    #[serde(with = "millis")]
    pub critical_flash: Duration,
    #[serde(with = "millis")]
    pub hp_drain: Duration,
    #[serde(with = "millis")]
    pub xp_fill: Duration,
    #[serde(with = "millis")]
    pub level_up_flash: Duration,
    #[serde(with = "millis")]
    pub ko: Duration,
    #[serde(with = "millis")]
    pub sprite_fade: Duration,
    #[serde(with = "millis")]
    pub entry_slide: Duration,
    #[serde(with = "millis")]
    pub entry_flash: Duration,
    #[serde(with = "millis")]
    pub ring_wipe: Duration,
    /// Step of frame-driven animations (HP drain)
    #[serde(with = "millis")]
    pub frame: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            message_pause: Duration::from_millis(1000),
            dramatic_pause: Duration::from_millis(500),
            error_release: Duration::from_millis(1500),
            lunge: Duration::from_millis(150),
            shake: Duration::from_millis(50),
            critical_flash: Duration::from_millis(120),
            hp_drain: Duration::from_millis(600),
            xp_fill: Duration::from_millis(800),
            level_up_flash: Duration::from_millis(100),
            ko: Duration::from_millis(600),
            sprite_fade: Duration::from_millis(400),
            entry_slide: Duration::from_millis(900),
            entry_flash: Duration::from_millis(150),
            ring_wipe: Duration::from_millis(700),
            frame: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// The point `t` of the way from `self` to `other`
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Screen geometry in stage units
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub opponent_sprite: Point,
    pub player_sprite: Point,
    /// Edge length sprites are scaled to
    pub sprite_size: f32,
    pub opponent_hud: Point,
    pub player_hud: Point,
    pub hp_bar_width: f32,
    pub xp_bar_width: f32,
    pub dialogue: Point,
    pub menu: Point,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            opponent_sprite: Point::new(600.0, 160.0),
            player_sprite: Point::new(200.0, 340.0),
            sprite_size: 160.0,
            opponent_hud: Point::new(60.0, 50.0),
            player_hud: Point::new(470.0, 300.0),
            hp_bar_width: 150.0,
            xp_bar_width: 220.0,
            dialogue: Point::new(20.0, 470.0),
            menu: Point::new(480.0, 470.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub timings: Timings,
    pub layout: Layout,
    /// Use animated overlays when the combatant has one
    pub prefer_animated_sprites: bool,
    pub opponent_reply: OpponentReply,
    /// Language move names are displayed in
    pub locale: String,
    /// Watchdog over every battle API call made by the scene
    #[serde(with = "millis")]
    pub request_timeout: Duration,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            layout: Layout::default(),
            prefer_animated_sprites: true,
            opponent_reply: OpponentReply::default(),
            locale: "en".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl SceneConfig {
    /// Defaults with the move name language taken from `SKIRMISH_LOCALE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(locale) = lookup("SKIRMISH_LOCALE").filter(|v| !v.trim().is_empty()) {
            config.locale = locale.trim().to_string();
        }
        config
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
