//! Integration tests for BasketForge

use basketforge::{
    export, generate_rules, load_transactions, mine, Algorithm, BasketError, CancelToken,
    ColumnMapping, Itemset, MiningConfig, PipelineContext, QualityWeights, TransactionEncoder,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// Create a test CSV file with sample grocery orders
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "OrderID,Product,Customer,Price,Quantity").unwrap();

    let rows = [
        ("O001", "Bread", "John", 2.50, 1),
        ("O001", "Milk", "John", 3.00, 1),
        ("O001", "Butter", "John", 1.80, 2),
        ("O002", "Bread", "Alice", 2.50, 1),
        ("O002", "Eggs", "Alice", 2.20, 3),
        ("O003", "Milk", "Bob", 3.00, 1),
        ("O003", "Cheese", "Bob", 4.50, 1),
        ("O003", "Yogurt", "Bob", 1.50, 2),
        ("O004", "Bread", "Carol", 2.50, 2),
        ("O004", "Milk", "Carol", 3.00, 1),
        ("O005", "Coffee", "David", 5.00, 1),
        ("O005", "Sugar", "David", 2.00, 1),
        ("O006", "Tea", "Eve", 3.50, 1),
        ("O006", "Cookies", "Eve", 4.00, 1),
        ("O006", "Milk", "Eve", 3.00, 1),
        ("O007", "Bread", "Frank", 2.50, 1),
        ("O008", "Apples", "Grace", 4.00, 3),
        ("O008", "Bananas", "Grace", 3.00, 2),
        ("O009", "Milk", "Henry", 3.00, 1),
        ("O009", "Bread", "Henry", 2.50, 2),
        ("O010", "Juice", "Ivy", 2.50, 1),
        ("O010", "Cereal", "Ivy", 5.50, 1),
        ("O010", "Milk", "Ivy", 3.00, 1),
    ];
    for (order, product, customer, price, quantity) in rows {
        writeln!(file, "{order},{product},{customer},{price},{quantity}").unwrap();
    }

    file
}

fn sample_mapping() -> ColumnMapping {
    ColumnMapping {
        transaction: "OrderID".to_string(),
        item: "Product".to_string(),
        quantity: Some("Quantity".to_string()),
    }
}

#[test]
fn test_end_to_end_pipeline() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();

    let data = load_transactions(file_path, &sample_mapping(), QualityWeights::default()).unwrap();
    assert_eq!(data.transactions.len(), 10);
    assert_eq!(data.quality.unique_items, 14);

    let config = MiningConfig {
        algorithm: Algorithm::FpGrowth,
        min_support: 0.3,
        min_confidence: 0.5,
        min_lift: 0.0,
        max_len: 4,
    };
    let context = PipelineContext::run(config, &data.transactions, &CancelToken::new()).unwrap();

    // Bread 5/10, Milk 6/10, Bread+Milk 3/10
    let table = context.itemsets().unwrap();
    assert_eq!(table.len(), 3);

    let basket = context.basket().unwrap();
    let bread = basket.item_index("Bread").unwrap();
    let milk = basket.item_index("Milk").unwrap();
    let pair = Itemset::new(vec![bread, milk]);
    assert!((table.support(&pair).unwrap() - 0.3).abs() < 1e-12);

    let rules = context.rules().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].describe(table), "Bread → Milk");
    assert!((rules[0].confidence - 0.6).abs() < 1e-12);
    assert_eq!(rules[1].describe(table), "Milk → Bread");
    assert!((rules[1].confidence - 0.5).abs() < 1e-12);
}

#[test]
fn test_both_algorithms_agree_on_csv_data() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();
    let data = load_transactions(file_path, &sample_mapping(), QualityWeights::default()).unwrap();
    let basket = TransactionEncoder::encode(&data.transactions).unwrap();

    for min_support in [0.1, 0.2, 0.3] {
        let apriori = mine(&basket, min_support, 4, Algorithm::Apriori).unwrap();
        let fpgrowth = mine(&basket, min_support, 4, Algorithm::FpGrowth).unwrap();
        assert_eq!(apriori.len(), fpgrowth.len());
        for record in apriori.iter() {
            let other = fpgrowth.support(&record.items).unwrap();
            assert!((record.support - other).abs() < 1e-9);
        }
    }
}

#[test]
fn test_grocery_scenario() {
    let basket = TransactionEncoder::encode(vec![
        vec!["Bread", "Milk"],
        vec!["Bread", "Milk", "Eggs"],
        vec!["Bread", "Eggs"],
        vec!["Milk", "Eggs"],
        vec!["Bread", "Milk", "Eggs"],
    ])
    .unwrap();
    let table = mine(&basket, 0.4, 3, Algorithm::Apriori).unwrap();

    let named: Vec<(Vec<String>, f64)> = table
        .rows()
        .into_iter()
        .map(|row| (row.items, row.support))
        .collect();
    let expected = [
        (vec!["Bread"], 0.8),
        (vec!["Eggs"], 0.8),
        (vec!["Milk"], 0.8),
        (vec!["Bread", "Eggs"], 0.6),
        (vec!["Bread", "Milk"], 0.6),
        (vec!["Eggs", "Milk"], 0.6),
        (vec!["Bread", "Eggs", "Milk"], 0.4),
    ];
    assert_eq!(named.len(), expected.len());
    for ((items, support), (expected_items, expected_support)) in named.iter().zip(expected) {
        assert_eq!(items, &expected_items);
        assert!((support - expected_support).abs() < 1e-12);
    }

    let rules = generate_rules(&table, 0.7, 0.0).unwrap();
    let mut described: Vec<String> = rules.iter().map(|r| r.describe(&table)).collect();
    described.sort();
    assert_eq!(
        described,
        vec![
            "Bread → Eggs",
            "Bread → Milk",
            "Eggs → Bread",
            "Eggs → Milk",
            "Milk → Bread",
            "Milk → Eggs",
        ]
    );
}

#[test]
fn test_empty_result_is_not_an_error() {
    let basket = TransactionEncoder::encode(vec![
        vec!["Bread", "Milk"],
        vec!["Bread", "Milk", "Eggs"],
        vec!["Bread", "Eggs"],
        vec!["Milk", "Eggs"],
        vec!["Bread", "Milk", "Eggs"],
    ])
    .unwrap();

    let table = mine(&basket, 0.9, 3, Algorithm::FpGrowth).unwrap();
    assert!(table.is_empty());
    assert!(generate_rules(&table, 0.5, 0.0).unwrap().is_empty());
}

#[test]
fn test_empty_input_is_distinct_from_no_results() {
    let nothing: Vec<Vec<String>> = Vec::new();
    let err = PipelineContext::run(MiningConfig::default(), nothing, &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, BasketError::EmptyInput(_)));
}

#[test]
fn test_export_after_csv_load() {
    let test_file = create_test_csv();
    let file_path = test_file.path().to_str().unwrap();
    let data = load_transactions(file_path, &sample_mapping(), QualityWeights::default()).unwrap();

    let config = MiningConfig {
        min_support: 0.2,
        min_confidence: 0.5,
        min_lift: 1.0,
        ..MiningConfig::default()
    };
    let context = PipelineContext::run(config, &data.transactions, &CancelToken::new()).unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let written = export::export_results(&context, out_dir.path(), false).unwrap();
    assert_eq!(written.len(), 2);

    let itemsets_csv = std::fs::read_to_string(&written[0]).unwrap();
    assert!(itemsets_csv.starts_with("itemsets,length,count,support"));
    assert!(itemsets_csv.contains("Bread, Milk"));
}
