use std::collections::BTreeMap;

use crate::model::card::HeroCard;

/// A card paired with its projected score and score-per-star efficiency.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCard {
    pub card: HeroCard,
    pub score: f64,
    pub efficiency: f64,
}

impl ScoredCard {
    pub fn new(card: HeroCard, score: f64) -> Self {
        let efficiency = if card.stars == 0 {
            0.0
        } else {
            score / f64::from(card.stars)
        };
        ScoredCard {
            card,
            score,
            efficiency,
        }
    }
}

/// Ranks candidates by efficiency and trims each star bucket to its best
/// `bucket_cap` entries, then returns the merged list sorted by
/// efficiency, best first.
///
/// The cap is a deliberate approximation: a draft that could only be
/// completed by a below-cap card is lost, in exchange for a search space
/// bounded by cap times the number of distinct costs. Zero-cost cards
/// have no defined efficiency and are dropped here. Ties keep their
/// incoming order, so repeated runs over the same pool agree.
pub fn rank_and_prune(cards: Vec<ScoredCard>, bucket_cap: usize) -> Vec<ScoredCard> {
    let mut buckets: BTreeMap<u8, Vec<ScoredCard>> = BTreeMap::new();
    for card in cards {
        if card.card.stars == 0 {
            continue;
        }
        buckets.entry(card.card.stars).or_default().push(card);
    }
    let mut merged = Vec::new();
    for (_, mut bucket) in buckets {
        bucket.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
        bucket.truncate(bucket_cap);
        merged.append(&mut bucket);
    }
    merged.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    merged
}

#[cfg(test)]
mod tests {
    use super::{ScoredCard, rank_and_prune};
    use crate::model::card::{CardId, HeroCard, HeroId};

    fn scored(id: u32, stars: u8, score: f64) -> ScoredCard {
        ScoredCard::new(
            HeroCard::new(CardId::new(id), HeroId::new(format!("hero{id}")), stars),
            score,
        )
    }

    #[test]
    fn efficiency_is_score_per_star() {
        let card = scored(1, 4, 10.0);
        assert_eq!(card.efficiency, 2.5);
    }

    #[test]
    fn zero_cost_cards_are_dropped() {
        let ranked = rank_and_prune(vec![scored(1, 0, 99.0), scored(2, 1, 1.0)], 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].card.id, CardId::new(2));
    }

    #[test]
    fn buckets_keep_only_the_cap_most_efficient() {
        let cards = vec![
            scored(1, 2, 2.0),
            scored(2, 2, 8.0),
            scored(3, 2, 6.0),
            scored(4, 2, 4.0),
        ];
        let ranked = rank_and_prune(cards, 2);
        let ids: Vec<u32> = ranked.iter().map(|c| c.card.id.raw()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn merged_list_is_sorted_across_buckets() {
        let cards = vec![scored(1, 1, 3.0), scored(2, 3, 30.0), scored(3, 2, 4.0)];
        let ranked = rank_and_prune(cards, 5);
        let efficiencies: Vec<f64> = ranked.iter().map(|c| c.efficiency).collect();
        assert_eq!(efficiencies, vec![10.0, 3.0, 2.0]);
    }

    #[test]
    fn pruning_twice_changes_nothing() {
        let cards = vec![
            scored(1, 1, 5.0),
            scored(2, 1, 4.0),
            scored(3, 2, 9.0),
            scored(4, 2, 1.0),
            scored(5, 3, 12.0),
        ];
        let once = rank_and_prune(cards, 2);
        let twice = rank_and_prune(once.clone(), 2);
        assert_eq!(once, twice);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let first = scored(1, 2, 6.0);
        let second = scored(2, 2, 6.0);
        let ranked = rank_and_prune(vec![first.clone(), second.clone()], 5);
        assert_eq!(ranked[0].card.id, first.card.id);
        assert_eq!(ranked[1].card.id, second.card.id);
    }
}
