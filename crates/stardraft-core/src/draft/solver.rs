use std::collections::HashMap;

use crate::draft::ranking::ScoredCard;

/// Outcome of one search: indices into the candidate list plus the score
/// they add up to.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvedDraft {
    pub indices: Vec<usize>,
    pub total_score: f64,
}

type MemoKey = (usize, u32, u32);

#[derive(Clone)]
struct PartialPick {
    score: f64,
    picks: Vec<usize>,
}

/// Cheapest and dearest totals achievable by picking exactly r cards from
/// each candidate suffix. Lets the search discard a branch whose budget
/// cannot be landed before exploring it.
struct FeasibilityBounds {
    min_total: Vec<Vec<u32>>,
    max_total: Vec<Vec<u32>>,
}

impl FeasibilityBounds {
    fn new(costs: &[u32], max_picks: usize) -> Self {
        let n = costs.len();
        let mut min_total = Vec::with_capacity(n + 1);
        let mut max_total = Vec::with_capacity(n + 1);
        for index in 0..=n {
            let mut suffix: Vec<u32> = costs[index..].to_vec();
            suffix.sort_unstable();
            let depth = suffix.len().min(max_picks);
            let mut mins = Vec::with_capacity(depth + 1);
            let mut maxs = Vec::with_capacity(depth + 1);
            mins.push(0);
            maxs.push(0);
            let mut low = 0u32;
            let mut high = 0u32;
            for r in 1..=depth {
                low += suffix[r - 1];
                high += suffix[suffix.len() - r];
                mins.push(low);
                maxs.push(high);
            }
            min_total.push(mins);
            max_total.push(maxs);
        }
        FeasibilityBounds {
            min_total,
            max_total,
        }
    }

    /// Whether exactly `picks` cards taken from the suffix at `index` can
    /// spend exactly `stars`. False when fewer than `picks` remain.
    fn admits(&self, index: usize, stars: u32, picks: u32) -> bool {
        let r = picks as usize;
        let mins = &self.min_total[index];
        if r >= mins.len() {
            return false;
        }
        stars >= mins[r] && stars <= self.max_total[index][r]
    }
}

/// Include/exclude search for the best subset of exactly `picks` cards
/// spending exactly the target, over a candidate list ranked by
/// [`rank_and_prune`](crate::draft::ranking::rank_and_prune).
///
/// One solver value serves one optimization pass. Memo entries describe
/// absolute subproblems (position, stars left, picks left), so relaxed
/// retries at lower targets within the same pass reuse them.
pub struct ExactSolver<'a> {
    candidates: &'a [ScoredCard],
    costs: Vec<u32>,
    bounds: FeasibilityBounds,
    memo: HashMap<MemoKey, Option<PartialPick>>,
}

impl<'a> ExactSolver<'a> {
    pub fn new(candidates: &'a [ScoredCard], max_picks: u32) -> Self {
        let costs: Vec<u32> = candidates.iter().map(|c| c.card.cost()).collect();
        let bounds = FeasibilityBounds::new(&costs, max_picks as usize);
        ExactSolver {
            candidates,
            costs,
            bounds,
            memo: HashMap::new(),
        }
    }

    /// Best subset of exactly `picks` candidates spending exactly
    /// `target_stars`, or `None` when no such subset exists. `picks` must
    /// not exceed the ceiling given to [`ExactSolver::new`].
    pub fn solve(&mut self, target_stars: u32, picks: u32) -> Option<SolvedDraft> {
        self.search(0, target_stars, picks).map(|best| SolvedDraft {
            indices: best.picks,
            total_score: best.score,
        })
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    fn search(&mut self, index: usize, stars_left: u32, picks_left: u32) -> Option<PartialPick> {
        if picks_left == 0 {
            return (stars_left == 0).then(|| PartialPick {
                score: 0.0,
                picks: Vec::new(),
            });
        }
        if index >= self.candidates.len() || !self.bounds.admits(index, stars_left, picks_left) {
            return None;
        }
        let key = (index, stars_left, picks_left);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        // Exclude first; include only replaces it on a strictly better
        // score, so ties resolve the same way every run.
        let mut best = self.search(index + 1, stars_left, picks_left);
        let cost = self.costs[index];
        if cost <= stars_left {
            if let Some(tail) = self.search(index + 1, stars_left - cost, picks_left - 1) {
                let score = tail.score + self.candidates[index].score;
                let improves = match &best {
                    None => true,
                    Some(current) => score > current.score,
                };
                if improves {
                    let mut picks = Vec::with_capacity(tail.picks.len() + 1);
                    picks.push(index);
                    picks.extend_from_slice(&tail.picks);
                    best = Some(PartialPick { score, picks });
                }
            }
        }
        self.memo.insert(key, best.clone());
        best
    }
}

/// Greedy rescue for when the exact search fails: fill each slot in turn
/// with the highest-scoring affordable candidate among the `pool_limit`
/// most efficient ones left. The final slot breaks score ties toward the
/// total closest to the target. Returns `None` as soon as any slot cannot
/// be filled.
pub fn greedy_fill(
    candidates: &[ScoredCard],
    target_stars: u32,
    picks: u32,
    pool_limit: usize,
) -> Option<SolvedDraft> {
    let mut used = vec![false; candidates.len()];
    let mut chosen = Vec::with_capacity(picks as usize);
    let mut spent = 0u32;
    let mut total_score = 0.0;
    for slot in 0..picks {
        let final_slot = slot + 1 == picks;
        let mut best: Option<(usize, f64, u32)> = None;
        for (index, candidate) in candidates.iter().enumerate().take(pool_limit) {
            if used[index] {
                continue;
            }
            let total = spent + candidate.card.cost();
            if total > target_stars {
                continue;
            }
            let replace = match best {
                None => true,
                Some((_, best_score, best_total)) => {
                    candidate.score > best_score
                        || (final_slot
                            && candidate.score == best_score
                            && target_stars - total < target_stars - best_total)
                }
            };
            if replace {
                best = Some((index, candidate.score, total));
            }
        }
        let (index, score, total) = best?;
        used[index] = true;
        chosen.push(index);
        spent = total;
        total_score += score;
    }
    Some(SolvedDraft {
        indices: chosen,
        total_score,
    })
}
