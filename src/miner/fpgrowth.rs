//! Prefix-tree projection (FP-Growth) mining
//!
//! The tree is an arena of nodes addressed by index. Every conditional tree
//! is built into its own fresh arena.

use super::{record, CancelToken};
use crate::encoder::BasketMatrix;
use crate::error::Result;
use crate::itemset::{FrequentItemset, Itemset};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct FpNode {
    item: usize,
    count: usize,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Next node carrying the same item
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct HeaderEntry {
    item: usize,
    count: usize,
    head: Option<usize>,
    tail: Option<usize>,
}

/// A weighted prefix path: items plus how many transactions it stands for
type WeightedPath = (Vec<usize>, usize);

#[derive(Debug)]
struct FpTree {
    nodes: Vec<FpNode>,
    /// Frequent items, most frequent first; ties by ascending column
    header: Vec<HeaderEntry>,
}

impl FpTree {
    /// Build a tree from weighted paths, keeping items whose total weight
    /// reaches `min_count`.
    fn build(paths: &[WeightedPath], min_count: usize) -> Self {
        let mut totals: HashMap<usize, usize> = HashMap::new();
        for (items, weight) in paths {
            for &item in items {
                *totals.entry(item).or_insert(0) += weight;
            }
        }

        let mut ranked: Vec<(usize, usize)> = totals
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let rank: HashMap<usize, usize> = ranked
            .iter()
            .enumerate()
            .map(|(position, &(item, _))| (item, position))
            .collect();

        let mut tree = FpTree {
            nodes: vec![FpNode {
                item: usize::MAX,
                count: 0,
                parent: None,
                children: Vec::new(),
                next: None,
            }],
            header: ranked
                .iter()
                .map(|&(item, count)| HeaderEntry {
                    item,
                    count,
                    head: None,
                    tail: None,
                })
                .collect(),
        };

        for (items, weight) in paths {
            let mut ordered: Vec<usize> = items
                .iter()
                .copied()
                .filter(|item| rank.contains_key(item))
                .collect();
            ordered.sort_by_key(|item| rank[item]);
            tree.insert(&ordered, *weight, &rank);
        }

        tree
    }

    fn insert(&mut self, ordered: &[usize], weight: usize, rank: &HashMap<usize, usize>) {
        let mut current = ROOT;
        for &item in ordered {
            let existing = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].item == item);

            current = match existing {
                Some(child) => {
                    self.nodes[child].count += weight;
                    child
                }
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(FpNode {
                        item,
                        count: weight,
                        parent: Some(current),
                        children: Vec::new(),
                        next: None,
                    });
                    self.nodes[current].children.push(id);

                    let entry = &mut self.header[rank[&item]];
                    match entry.tail {
                        Some(tail) => self.nodes[tail].next = Some(id),
                        None => entry.head = Some(id),
                    }
                    entry.tail = Some(id);
                    id
                }
            };
        }
    }

    fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// The root-to-leaf chain when the tree has no branches
    fn single_path(&self) -> Option<Vec<(usize, usize)>> {
        let mut path = Vec::new();
        let mut current = ROOT;
        loop {
            match self.nodes[current].children.as_slice() {
                [] => return Some(path),
                [only] => {
                    current = *only;
                    path.push((self.nodes[current].item, self.nodes[current].count));
                }
                _ => return None,
            }
        }
    }

    /// Prefix paths leading to every node of one header entry
    fn conditional_pattern_base(&self, entry: &HeaderEntry) -> Vec<WeightedPath> {
        let mut base = Vec::new();
        let mut link = entry.head;
        while let Some(node) = link {
            let mut prefix = Vec::new();
            let mut parent = self.nodes[node].parent;
            while let Some(p) = parent {
                if p == ROOT {
                    break;
                }
                prefix.push(self.nodes[p].item);
                parent = self.nodes[p].parent;
            }
            if !prefix.is_empty() {
                base.push((prefix, self.nodes[node].count));
            }
            link = self.nodes[node].next;
        }
        base
    }
}

struct Miner<'a> {
    min_count: usize,
    max_len: usize,
    n: usize,
    cancel: &'a CancelToken,
}

impl Miner<'_> {
    /// Mine one header entry of `tree` combined with `suffix`
    fn mine_entry(
        &self,
        tree: &FpTree,
        entry: &HeaderEntry,
        suffix: &[usize],
        out: &mut Vec<FrequentItemset>,
    ) -> Result<()> {
        self.cancel.check()?;

        let mut itemset = suffix.to_vec();
        itemset.push(entry.item);
        out.push(record(Itemset::new(itemset.clone()), entry.count, self.n));

        if itemset.len() >= self.max_len {
            return Ok(());
        }

        let base = tree.conditional_pattern_base(entry);
        let conditional = FpTree::build(&base, self.min_count);
        if !conditional.is_empty() {
            self.mine_tree(&conditional, &itemset, out)?;
        }
        Ok(())
    }

    fn mine_tree(
        &self,
        tree: &FpTree,
        suffix: &[usize],
        out: &mut Vec<FrequentItemset>,
    ) -> Result<()> {
        if let Some(path) = tree.single_path() {
            self.expand_single_path(&path, suffix, out);
            return Ok(());
        }
        for entry in tree.header.iter().rev() {
            self.mine_entry(tree, entry, suffix, out)?;
        }
        Ok(())
    }

    /// Every combination of nodes on a branchless path is frequent; its count
    /// is the count of its deepest node.
    fn expand_single_path(
        &self,
        path: &[(usize, usize)],
        suffix: &[usize],
        out: &mut Vec<FrequentItemset>,
    ) {
        let room = self.max_len.saturating_sub(suffix.len());
        let mut chosen = Vec::with_capacity(room);
        self.combine(path, 0, room, suffix, &mut chosen, out);
    }

    fn combine(
        &self,
        path: &[(usize, usize)],
        start: usize,
        room: usize,
        suffix: &[usize],
        chosen: &mut Vec<usize>,
        out: &mut Vec<FrequentItemset>,
    ) {
        if chosen.len() == room {
            return;
        }
        for position in start..path.len() {
            chosen.push(position);

            let (_, count) = path[position];
            let mut itemset = suffix.to_vec();
            itemset.extend(chosen.iter().map(|&p| path[p].0));
            out.push(record(Itemset::new(itemset), count, self.n));

            self.combine(path, position + 1, room, suffix, chosen, out);
            chosen.pop();
        }
    }
}

pub(super) fn mine(
    basket: &BasketMatrix,
    min_count: usize,
    max_len: usize,
    cancel: &CancelToken,
) -> Result<Vec<FrequentItemset>> {
    let paths: Vec<WeightedPath> = basket
        .row_indices()
        .into_iter()
        .map(|items| (items, 1))
        .collect();
    let tree = FpTree::build(&paths, min_count);
    debug!(
        nodes = tree.nodes.len(),
        frequent_items = tree.header.len(),
        "Built FP-tree"
    );

    let miner = Miner {
        min_count,
        max_len,
        n: basket.n_transactions(),
        cancel,
    };

    // top-level conditional trees are independent of each other
    let per_item: Vec<Vec<FrequentItemset>> = tree
        .header
        .par_iter()
        .rev()
        .map(|entry| -> Result<Vec<FrequentItemset>> {
            let mut out = Vec::new();
            miner.mine_entry(&tree, entry, &[], &mut out)?;
            Ok(out)
        })
        .collect::<Result<_>>()?;

    Ok(per_item.into_iter().flatten().collect())
}
