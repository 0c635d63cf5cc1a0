use core::fmt;
use serde::{Deserialize, Serialize};

/// Unique identity of one card instance.
///
/// Duplicate copies of the same hero carry distinct ids; selections are
/// checked for id uniqueness, never hero uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(u32);

impl CardId {
    pub const fn new(raw: u32) -> Self {
        CardId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hero identity shared by every copy of the same hero.
///
/// Historical score series, overrides, and scoring policies are all keyed
/// by hero, so duplicate copies project the same score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeroId(String);

impl HeroId {
    pub fn new(name: impl Into<String>) -> Self {
        HeroId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeroId {
    fn from(name: &str) -> Self {
        HeroId(name.to_string())
    }
}

/// One selectable card: a copy of a hero at a star cost, optionally
/// carrying a pinned score that bypasses projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroCard {
    pub id: CardId,
    pub hero: HeroId,
    pub stars: u8,
    #[serde(default)]
    pub override_score: Option<f64>,
}

impl HeroCard {
    pub fn new(id: CardId, hero: HeroId, stars: u8) -> Self {
        HeroCard {
            id,
            hero,
            stars,
            override_score: None,
        }
    }

    pub fn with_override(mut self, score: f64) -> Self {
        self.override_score = Some(score);
        self
    }

    /// Star cost widened for budget arithmetic.
    pub fn cost(&self) -> u32 {
        u32::from(self.stars)
    }
}

impl fmt::Display for HeroCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}*]{}", self.hero, self.stars, self.id)
    }
}
