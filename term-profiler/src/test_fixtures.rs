//! Shared tables, views and models for tests.
//!
//! Compiled for this crate's unit tests and, with the `test-utils` feature,
//! for downstream test suites.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};

use crate::context::ProfilerContextConfig;
use crate::model::{BagOfWordsClassifier, TextClassifier};
use crate::table::TabularTable;
use crate::view::DataFusionView;

fn build(columns: Vec<(&str, ArrayRef)>) -> TabularTable {
    match TabularTable::from_columns(columns) {
        Ok(table) => table,
        Err(e) => panic!("invalid fixture table: {e}"),
    }
}

/// Five people with three blank cells: one null name, one empty name and
/// one null age. Rows 1 and 5 are identical apart from `id`.
pub fn people_table() -> TabularTable {
    build(vec![
        ("id", Arc::new(Int64Array::from_iter_values(1..=5)) as ArrayRef),
        (
            "name",
            Arc::new(StringArray::from(vec![
                Some("Alice"),
                None,
                Some(""),
                Some("Dave"),
                Some("Alice"),
            ])) as ArrayRef,
        ),
        (
            "age",
            Arc::new(Int64Array::from(vec![Some(34), Some(28), None, Some(45), Some(34)])) as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec!["London", "Leeds", "York", "Leeds", "London"])) as ArrayRef,
        ),
    ])
}

/// [`people_table`] registered as `public.people` and exposed as a view.
pub async fn people_view() -> DataFusionView {
    let ctx = ProfilerContextConfig::default()
        .with_target_partitions(1)
        .build_session();
    if let Err(e) = ctx.register_batch("people", people_table().into_batch()) {
        panic!("failed to register people: {e}");
    }
    match DataFusionView::builder(ctx).table("public", "people").build().await {
        Ok(view) => view,
        Err(e) => panic!("failed to build people view: {e}"),
    }
}

/// Card holders with one outlying Gold credit rate (id 11).
///
/// Id 15's card type carries a trademark sign that is stripped before
/// grouping, and id 18 has no card type.
pub fn cards_table() -> TabularTable {
    let mut cards: Vec<Option<&str>> = vec![Some("Gold"); 11];
    let mut rates: Vec<f64> = vec![10.0; 10];
    rates.push(30.0);

    cards.extend([Some("Classic"), Some("Classic"), Some("Classic"), Some("Classic™")]);
    rates.extend([5.0, 5.0, 6.0, 6.0]);

    cards.extend([Some("Platinum"), Some("Platinum"), None]);
    rates.extend([3.0, 3.0, 4.0]);

    build(vec![
        ("id", Arc::new(Int64Array::from_iter_values(1..=18)) as ArrayRef),
        ("card_type", Arc::new(StringArray::from(cards)) as ArrayRef),
        ("credit_rate", Arc::new(Float64Array::from(rates)) as ArrayRef),
    ])
}

/// Addresses split over `addr` and `city`: one non-ASCII, one upper case
/// and one with a missing first line.
pub fn address_table() -> TabularTable {
    build(vec![
        ("id", Arc::new(Int64Array::from_iter_values(1..=4)) as ArrayRef),
        (
            "addr",
            Arc::new(StringArray::from(vec![
                Some("12 High Street"),
                Some("1 Café Road"),
                Some("FLAT 9 TOWER"),
                None,
            ])) as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec!["London", "London", "LEEDS", "Leeds"])) as ArrayRef,
        ),
    ])
}

/// Free-text notes, one of them missing.
pub fn notes_table() -> TabularTable {
    build(vec![
        ("id", Arc::new(Int64Array::from_iter_values(1..=4)) as ArrayRef),
        (
            "client_notes",
            Arc::new(StringArray::from(vec![
                Some("Called about card"),
                None,
                Some("Customer deceased, notified by family"),
                Some("Address change"),
            ])) as ArrayRef,
        ),
    ])
}

/// A dataset carrying every column the standard dashboard reads.
///
/// Postcodes of ids 4, 5 and 6 are invalid.
pub fn mortgage_table() -> TabularTable {
    build(vec![
        ("id", Arc::new(Int64Array::from_iter_values(1..=6)) as ArrayRef),
        (
            "card_type",
            Arc::new(StringArray::from(vec![
                "Gold", "Gold", "Classic", "Classic", "Platinum", "Gold",
            ])) as ArrayRef,
        ),
        (
            "credit_rate",
            Arc::new(Float64Array::from(vec![10.0, 11.0, 5.0, 6.0, 3.0, 12.0])) as ArrayRef,
        ),
        (
            "postcode",
            Arc::new(StringArray::from(vec![
                Some("SW1A 1AA"),
                Some("RG44RF"),
                Some("SE210AA"),
                Some("453"),
                None,
                Some("@2BG"),
            ])) as ArrayRef,
        ),
        (
            "addr",
            Arc::new(StringArray::from(vec![
                Some("12 High Street"),
                Some("1 Café Road"),
                Some("FLAT 9 TOWER"),
                None,
                Some("5 Mill Lane"),
                Some("7 Oak Road"),
            ])) as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec![
                "London", "London", "LEEDS", "Leeds", "York", "Bath",
            ])) as ArrayRef,
        ),
        (
            "client_notes",
            Arc::new(StringArray::from(vec![
                Some("Called about card"),
                None,
                Some("Customer deceased, notified by family"),
                Some("Address change"),
                Some(""),
                Some("Asked for a payment holiday"),
            ])) as ArrayRef,
        ),
    ])
}

/// A classifier that scores a few keywords.
pub fn keyword_classifier() -> Arc<dyn TextClassifier> {
    let weights = HashMap::from([
        ("deceased".to_string(), 4.0),
        ("street".to_string(), 2.0),
        ("road".to_string(), 1.0),
    ]);
    Arc::new(BagOfWordsClassifier::new(weights, 0.0))
}
