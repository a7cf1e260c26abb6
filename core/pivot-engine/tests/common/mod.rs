//! FILENAME: tests/common/mod.rs
//! Fixtures for cross-tab engine integration tests.

use engine::{Row, Scalar};

/// Builds one row from (column, value) pairs.
pub fn row(pairs: &[(&str, Scalar)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A sales dataset with regions, mixed-shape categories, dates, and
/// formatted amounts.
pub fn sales_rows() -> Vec<Row> {
    let data: Vec<(&str, &str, &str, &str)> = vec![
        ("East", "1. 食品", "2024-01-05", "¥1,200"),
        ("East", "2. 服饰", "2024-01-12", "850"),
        ("West", "1. 食品", "2024-02-03", "2.5k"),
        ("West", "随便写的", "2024-02-20", "300"),
        ("East", "2. 服饰", "2024-03-01", "1,100"),
        ("North", "1. 食品", "2024-03-15", "junk"),
        ("West", "随便写的", "2024-03-18", "95"),
    ];
    data.into_iter()
        .map(|(region, category, date, amount)| {
            row(&[
                ("region", Scalar::Text(region.to_string())),
                ("category", Scalar::Text(category.to_string())),
                ("date", Scalar::Text(date.to_string())),
                ("amount", Scalar::Text(amount.to_string())),
            ])
        })
        .collect()
}
