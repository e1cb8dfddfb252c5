//! Association rule generation from a frequent itemset table

use crate::config::{self, SUPPORT_EPSILON};
use crate::error::{BasketError, Result};
use crate::itemset::{FrequentItemsetTable, Itemset};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Largest itemset whose splits can be enumerated with a 64-bit mask
const MAX_SPLIT_LEN: usize = 63;

/// Business reading of a rule's lift
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStrength {
    Moderate,
    Strong,
    VeryStrong,
}

impl RuleStrength {
    pub fn from_lift(lift: f64) -> Self {
        if lift >= 2.0 {
            RuleStrength::VeryStrong
        } else if lift >= 1.5 {
            RuleStrength::Strong
        } else {
            RuleStrength::Moderate
        }
    }
}

impl fmt::Display for RuleStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuleStrength::Moderate => "Moderate",
            RuleStrength::Strong => "Strong",
            RuleStrength::VeryStrong => "Very Strong",
        };
        f.write_str(label)
    }
}

/// An "if antecedent then consequent" rule with its metrics
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of antecedent and consequent together
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// Infinite when confidence is 1
    pub conviction: f64,
}

impl AssociationRule {
    /// Antecedent and consequent combined
    pub fn itemset(&self) -> Itemset {
        let mut columns = self.antecedent.columns().to_vec();
        columns.extend_from_slice(self.consequent.columns());
        Itemset::new(columns)
    }

    pub fn strength(&self) -> RuleStrength {
        RuleStrength::from_lift(self.lift)
    }

    /// "A, B → C" using the table's item names
    pub fn describe(&self, table: &FrequentItemsetTable) -> String {
        format!(
            "{} → {}",
            table.item_names(&self.antecedent).join(", "),
            table.item_names(&self.consequent).join(", ")
        )
    }
}

/// Rule with item names, for export and display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRow {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `None` stands for an infinite conviction
    pub conviction: Option<f64>,
    pub strength: RuleStrength,
}

/// Derive every rule meeting `min_confidence` and `min_lift` (0 disables the
/// lift filter).
///
/// Rules come out sorted by confidence then lift, both descending; ties keep
/// generation order. An empty result is not an error.
pub fn generate_rules(
    table: &FrequentItemsetTable,
    min_confidence: f64,
    min_lift: f64,
) -> Result<Vec<AssociationRule>> {
    config::validate_min_confidence(min_confidence)?;
    config::validate_min_lift(min_lift)?;

    let n = table.n_transactions() as f64;
    let mut rules = Vec::new();
    let mut skipped = 0usize;

    for record in table.iter().filter(|r| r.items.len() >= 2) {
        let len = record.items.len();
        if len > MAX_SPLIT_LEN {
            return Err(BasketError::invalid(
                "max_len",
                format!("rules need itemsets of at most {MAX_SPLIT_LEN} items, got {len}"),
            ));
        }
        let full: u64 = (1u64 << len) - 1;

        for mask in 1..full {
            let antecedent = record.items.select(mask);
            let consequent = record.items.select(full & !mask);

            let (Some(ante), Some(cons)) = (table.get(&antecedent), table.get(&consequent))
            else {
                skipped += 1;
                continue;
            };

            let confidence = record.count as f64 / ante.count as f64;
            let lift = (record.count as f64 * n) / (ante.count as f64 * cons.count as f64);
            if confidence < min_confidence - SUPPORT_EPSILON || lift < min_lift - SUPPORT_EPSILON {
                continue;
            }

            let conviction = if confidence >= 1.0 {
                f64::INFINITY
            } else {
                (1.0 - cons.support) / (1.0 - confidence)
            };

            rules.push(AssociationRule {
                antecedent,
                consequent,
                antecedent_support: ante.support,
                consequent_support: cons.support,
                support: record.support,
                confidence,
                lift,
                leverage: record.support - ante.support * cons.support,
                conviction,
            });
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped splits with a side missing from the table");
    }

    verify(table, &rules)?;

    rules.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.lift.total_cmp(&a.lift))
    });

    info!(
        rules = rules.len(),
        min_confidence, min_lift, "Association rules generated"
    );
    Ok(rules)
}

/// Fail loudly on rules the generator must never produce
fn verify(table: &FrequentItemsetTable, rules: &[AssociationRule]) -> Result<()> {
    for rule in rules {
        if rule.antecedent.is_empty() || rule.consequent.is_empty() {
            return Err(BasketError::Invariant(
                "rule with an empty side was generated".into(),
            ));
        }
        if rule
            .antecedent
            .columns()
            .iter()
            .any(|&c| rule.consequent.contains(c))
        {
            return Err(BasketError::Invariant(format!(
                "antecedent {:?} overlaps consequent {:?}",
                rule.antecedent, rule.consequent
            )));
        }
        if !table.contains(&rule.itemset()) {
            return Err(BasketError::Invariant(format!(
                "rule itemset {:?} is not in the frequent itemset table",
                rule.itemset()
            )));
        }
        if !(0.0..=1.0).contains(&rule.confidence) || rule.lift < 0.0 {
            return Err(BasketError::Invariant(format!(
                "rule metrics out of range: confidence {}, lift {}",
                rule.confidence, rule.lift
            )));
        }
    }
    Ok(())
}

/// Rules with item names resolved against `table`
pub fn rule_rows(table: &FrequentItemsetTable, rules: &[AssociationRule]) -> Vec<RuleRow> {
    rules
        .iter()
        .map(|rule| RuleRow {
            antecedents: table.item_names(&rule.antecedent),
            consequents: table.item_names(&rule.consequent),
            antecedent_support: rule.antecedent_support,
            consequent_support: rule.consequent_support,
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
            leverage: rule.leverage,
            conviction: rule.conviction.is_finite().then_some(rule.conviction),
            strength: rule.strength(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Algorithm;
    use crate::encoder::TransactionEncoder;
    use crate::miner::mine;

    fn grocery_table(min_support: f64) -> FrequentItemsetTable {
        let basket = TransactionEncoder::encode(vec![
            vec!["Bread", "Milk"],
            vec!["Bread", "Milk", "Eggs"],
            vec!["Bread", "Eggs"],
            vec!["Milk", "Eggs"],
            vec!["Bread", "Milk", "Eggs"],
        ])
        .unwrap();
        mine(&basket, min_support, 3, Algorithm::Apriori).unwrap()
    }

    #[test]
    fn test_grocery_rules_at_seventy_percent() {
        let table = grocery_table(0.4);
        let rules = generate_rules(&table, 0.7, 0.0).unwrap();

        assert_eq!(rules.len(), 6);
        for rule in &rules {
            assert_eq!(rule.antecedent.len(), 1);
            assert_eq!(rule.consequent.len(), 1);
            assert!((rule.confidence - 0.75).abs() < 1e-12);
            assert!((rule.lift - 0.9375).abs() < 1e-12);
            assert!((rule.support - 0.6).abs() < 1e-12);
            assert!((rule.leverage - (0.6 - 0.64)).abs() < 1e-12);
            assert!((rule.conviction - 0.8).abs() < 1e-12);
            assert_eq!(rule.strength(), RuleStrength::Moderate);
        }

        let described: Vec<String> = rules.iter().map(|r| r.describe(&table)).collect();
        assert!(described.contains(&"Bread → Milk".to_string()));
        assert!(described.contains(&"Milk → Eggs".to_string()));
    }

    #[test]
    fn test_ties_keep_table_order() {
        let table = grocery_table(0.4);
        let rules = generate_rules(&table, 0.5, 0.0).unwrap();
        let described: Vec<String> = rules.iter().map(|r| r.describe(&table)).collect();

        // equal confidence and lift inside each group; pairs before the
        // triple, then split masks in ascending order
        assert_eq!(
            described,
            vec![
                "Bread → Eggs",
                "Eggs → Bread",
                "Bread → Milk",
                "Milk → Bread",
                "Eggs → Milk",
                "Milk → Eggs",
                "Bread, Eggs → Milk",
                "Bread, Milk → Eggs",
                "Eggs, Milk → Bread",
                "Bread → Eggs, Milk",
                "Eggs → Bread, Milk",
                "Milk → Bread, Eggs",
            ]
        );
    }

    #[test]
    fn test_lower_confidence_includes_triple_splits() {
        let table = grocery_table(0.4);
        let rules = generate_rules(&table, 0.5, 0.0).unwrap();

        // 6 pair rules, 3 pair→single, 3 single→pair
        assert_eq!(rules.len(), 12);
        // sorted by confidence descending
        assert!(rules.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!((rules.last().unwrap().confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_lift_filter() {
        let table = grocery_table(0.4);
        let rules = generate_rules(&table, 0.5, 1.0).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_singles_only_table_has_no_rules() {
        let table = grocery_table(0.7);
        assert_eq!(table.len(), 3);
        assert!(generate_rules(&table, 0.1, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_thresholds() {
        let table = grocery_table(0.4);
        assert!(generate_rules(&table, 0.0, 0.0).is_err());
        assert!(generate_rules(&table, 0.5, -1.0).is_err());
    }

    #[test]
    fn test_perfect_confidence_has_infinite_conviction() {
        let basket =
            TransactionEncoder::encode(vec![vec!["a", "b"], vec!["a", "b"], vec!["a"]]).unwrap();
        let table = mine(&basket, 0.5, 2, Algorithm::FpGrowth).unwrap();
        let rules = generate_rules(&table, 0.5, 0.0).unwrap();

        let b_to_a = &rules[0];
        assert_eq!(b_to_a.describe(&table), "b → a");
        assert_eq!(b_to_a.confidence, 1.0);
        assert!(b_to_a.conviction.is_infinite());

        let rows = rule_rows(&table, &rules);
        assert_eq!(rows[0].conviction, None);
        assert_eq!(rows[0].antecedents, vec!["b".to_string()]);
    }

    #[test]
    fn test_strength_bands() {
        assert_eq!(RuleStrength::from_lift(2.5), RuleStrength::VeryStrong);
        assert_eq!(RuleStrength::from_lift(1.5), RuleStrength::Strong);
        assert_eq!(RuleStrength::from_lift(1.1), RuleStrength::Moderate);
        assert_eq!(RuleStrength::VeryStrong.to_string(), "Very Strong");
    }
}
