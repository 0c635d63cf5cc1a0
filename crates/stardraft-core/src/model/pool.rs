use serde::{Deserialize, Serialize};

use crate::model::card::{CardId, HeroCard};

/// The cards currently eligible for selection.
///
/// Kept sorted by (stars, hero, id) so every downstream pass sees the same
/// order regardless of how the feed delivered the cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPool {
    cards: Vec<HeroCard>,
}

impl CardPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: Vec<HeroCard>) -> Self {
        let mut pool = CardPool { cards };
        pool.sort();
        pool
    }

    pub fn add(&mut self, card: HeroCard) {
        self.cards.push(card);
        self.sort();
    }

    pub fn remove(&mut self, id: CardId) -> bool {
        if let Some(index) = self.cards.iter().position(|card| card.id == id) {
            self.cards.remove(index);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.cards.iter().any(|card| card.id == id)
    }

    pub fn get(&self, id: CardId) -> Option<&HeroCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeroCard> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[HeroCard] {
        &self.cards
    }

    fn sort(&mut self) {
        self.cards
            .sort_by(|a, b| (a.stars, &a.hero, a.id).cmp(&(b.stars, &b.hero, b.id)));
    }
}
