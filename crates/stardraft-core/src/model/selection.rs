use serde::{Deserialize, Serialize};

use crate::model::card::{CardId, HeroCard, HeroId};

/// An accepted draft: the chosen cards in presentation order plus the
/// totals reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSelection {
    cards: Vec<HeroCard>,
    total_stars: u32,
    total_score: f64,
}

impl DraftSelection {
    /// Builds a selection from the chosen cards, deriving the star total.
    /// The score total comes from the solver, which is the only place the
    /// per-card projections are known.
    pub fn new(cards: Vec<HeroCard>, total_score: f64) -> Self {
        let total_stars = cards.iter().map(HeroCard::cost).sum();
        DraftSelection {
            cards,
            total_stars,
            total_score,
        }
    }

    pub fn cards(&self) -> &[HeroCard] {
        &self.cards
    }

    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().map(|card| card.id)
    }

    pub fn heroes(&self) -> impl Iterator<Item = &HeroId> {
        self.cards.iter().map(|card| &card.hero)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub const fn total_stars(&self) -> u32 {
        self.total_stars
    }

    pub const fn total_score(&self) -> f64 {
        self.total_score
    }
}

#[cfg(test)]
mod tests {
    use super::DraftSelection;
    use crate::model::card::{CardId, HeroCard, HeroId};

    #[test]
    fn totals_are_derived_from_cards() {
        let selection = DraftSelection::new(
            vec![
                HeroCard::new(CardId::new(1), HeroId::new("ash"), 2),
                HeroCard::new(CardId::new(2), HeroId::new("bram"), 5),
            ],
            31.5,
        );
        assert_eq!(selection.total_stars(), 7);
        assert_eq!(selection.total_score(), 31.5);
        assert_eq!(selection.len(), 2);
        let ids: Vec<u32> = selection.ids().map(|id| id.raw()).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
