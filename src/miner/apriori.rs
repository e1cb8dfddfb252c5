//! Level-wise (Apriori) mining

use super::{record, CancelToken};
use crate::encoder::BasketMatrix;
use crate::error::Result;
use crate::itemset::{FrequentItemset, Itemset};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

pub(super) fn mine(
    basket: &BasketMatrix,
    min_count: usize,
    max_len: usize,
    cancel: &CancelToken,
) -> Result<Vec<FrequentItemset>> {
    let n = basket.n_transactions();
    let mut found = Vec::new();

    let mut level: Vec<Itemset> = Vec::new();
    for (column, count) in basket.column_counts().into_iter().enumerate() {
        if count >= min_count {
            let itemset = Itemset::single(column);
            found.push(record(itemset.clone(), count, n));
            level.push(itemset);
        }
    }
    debug!(k = 1, frequent = level.len(), "Apriori round");

    let mut k = 2;
    while k <= max_len && !level.is_empty() {
        cancel.check()?;

        let candidates = generate_candidates(&level);
        if candidates.is_empty() {
            break;
        }

        let counts: Vec<usize> = candidates
            .par_iter()
            .map(|candidate| count_containing(basket, candidate))
            .collect();

        let mut next = Vec::new();
        for (candidate, count) in candidates.into_iter().zip(counts) {
            if count >= min_count {
                found.push(record(candidate.clone(), count, n));
                next.push(candidate);
            }
        }
        debug!(k, frequent = next.len(), "Apriori round");

        level = next;
        k += 1;
    }

    Ok(found)
}

/// Join (k-1)-itemsets sharing their first k-2 items, then drop any candidate
/// with an infrequent (k-1)-subset.
///
/// `level` must be sorted; the output is sorted too.
fn generate_candidates(level: &[Itemset]) -> Vec<Itemset> {
    let known: HashSet<&Itemset> = level.iter().collect();
    let mut candidates = Vec::new();

    for (i, left) in level.iter().enumerate() {
        let prefix = &left.columns()[..left.len() - 1];
        for right in &level[i + 1..] {
            if &right.columns()[..right.len() - 1] != prefix {
                break;
            }
            let last = right.columns()[right.len() - 1];
            let candidate = left.extended(last);
            // dropping either of the last two elements yields left or right
            let all_subsets_frequent =
                (0..candidate.len() - 2).all(|p| known.contains(&candidate.without(p)));
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn count_containing(basket: &BasketMatrix, itemset: &Itemset) -> usize {
    basket
        .matrix()
        .outer_iter()
        .filter(|row| itemset.columns().iter().all(|&c| row[c]))
        .count()
}
