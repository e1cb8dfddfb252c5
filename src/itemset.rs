//! Itemsets and the frequent itemset table

use serde::Serialize;
use std::collections::HashMap;

/// A set of items, stored as sorted column indices into the item universe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Itemset(Vec<usize>);

impl Itemset {
    /// Build an itemset from any column indices; duplicates collapse
    pub fn new(mut columns: Vec<usize>) -> Self {
        columns.sort_unstable();
        columns.dedup();
        Itemset(columns)
    }

    pub fn single(column: usize) -> Self {
        Itemset(vec![column])
    }

    pub fn columns(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: usize) -> bool {
        self.0.binary_search(&column).is_ok()
    }

    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        self.0.iter().all(|&c| other.contains(c))
    }

    /// Copy of this itemset without the element at `position`
    pub fn without(&self, position: usize) -> Itemset {
        let mut columns = self.0.clone();
        columns.remove(position);
        Itemset(columns)
    }

    /// Copy of this itemset with `column` appended; `column` must sort last
    pub(crate) fn extended(&self, column: usize) -> Itemset {
        debug_assert!(self.0.last().map_or(true, |&last| last < column));
        let mut columns = Vec::with_capacity(self.0.len() + 1);
        columns.extend_from_slice(&self.0);
        columns.push(column);
        Itemset(columns)
    }

    /// Elements selected by a bit mask over positions
    pub(crate) fn select(&self, mask: u64) -> Itemset {
        Itemset(
            self.0
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &c)| c)
                .collect(),
        )
    }
}

impl From<Vec<usize>> for Itemset {
    fn from(columns: Vec<usize>) -> Self {
        Itemset::new(columns)
    }
}

/// One row of the frequent itemset table
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    pub items: Itemset,
    /// Number of transactions containing every item
    pub count: usize,
    /// `count / n_transactions`, unrounded
    pub support: f64,
}

/// Itemset row with item names, for export and display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemsetRow {
    pub items: Vec<String>,
    pub length: usize,
    pub count: usize,
    pub support: f64,
}

/// All itemsets that met the support threshold
///
/// Records are kept in canonical order: by length, then by column indices.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemsetTable {
    records: Vec<FrequentItemset>,
    index: HashMap<Itemset, usize>,
    items: Vec<String>,
    n_transactions: usize,
}

impl FrequentItemsetTable {
    pub(crate) fn from_records(
        mut records: Vec<FrequentItemset>,
        items: Vec<String>,
        n_transactions: usize,
    ) -> Self {
        records.sort_by(|a, b| {
            a.items
                .len()
                .cmp(&b.items.len())
                .then_with(|| a.items.cmp(&b.items))
        });
        let index = records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.items.clone(), i))
            .collect();
        Self {
            records,
            index,
            items,
            n_transactions,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrequentItemset> {
        self.records.iter()
    }

    pub fn records(&self) -> &[FrequentItemset] {
        &self.records
    }

    pub fn get(&self, itemset: &Itemset) -> Option<&FrequentItemset> {
        self.index.get(itemset).map(|&i| &self.records[i])
    }

    pub fn support(&self, itemset: &Itemset) -> Option<f64> {
        self.get(itemset).map(|record| record.support)
    }

    pub fn contains(&self, itemset: &Itemset) -> bool {
        self.index.contains_key(itemset)
    }

    /// The item universe the column indices refer to
    pub fn universe(&self) -> &[String] {
        &self.items
    }

    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    pub fn item_names(&self, itemset: &Itemset) -> Vec<String> {
        itemset
            .columns()
            .iter()
            .map(|&c| self.items[c].clone())
            .collect()
    }

    /// Itemsets with exactly `len` items
    pub fn of_len(&self, len: usize) -> impl Iterator<Item = &FrequentItemset> {
        self.records.iter().filter(move |r| r.items.len() == len)
    }

    /// Largest itemset cardinality present, 0 when empty
    pub fn max_itemset_len(&self) -> usize {
        self.records.last().map_or(0, |r| r.items.len())
    }

    /// The `n` most supported itemsets; ties keep canonical order
    pub fn top_by_support(&self, n: usize) -> Vec<&FrequentItemset> {
        let mut ranked: Vec<&FrequentItemset> = self.records.iter().collect();
        ranked.sort_by(|a, b| b.support.total_cmp(&a.support));
        ranked.truncate(n);
        ranked
    }

    pub fn max_support(&self) -> Option<f64> {
        self.records.iter().map(|r| r.support).reduce(f64::max)
    }

    pub fn rows(&self) -> Vec<ItemsetRow> {
        self.records
            .iter()
            .map(|r| ItemsetRow {
                items: self.item_names(&r.items),
                length: r.items.len(),
                count: r.count,
                support: r.support,
            })
            .collect()
    }
}
