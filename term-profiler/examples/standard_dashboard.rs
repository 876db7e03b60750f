//! Builds the standard data quality dashboard over a small mortgage book.
//!
//! Run with `cargo run --example standard_dashboard`. Set `RUST_LOG` to
//! override the default log filter.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use term_profiler::logging::setup::{init_logging, LoggingConfig};
use term_profiler::metrics::{
    BasicProfile, ClassifyClientNotes, DetectBadAddress, DuplicateRows, ExtractBadPostcode,
    ExtractDataRules, ExtractPIIAttributes, GroupedZScore, TotalBlankCells, TotalRowsCols,
};
use term_profiler::model::BagOfWordsClassifier;
use term_profiler::prelude::*;

fn mortgage_book() -> Result<TabularTable> {
    TabularTable::from_columns(vec![
        ("user_id", Arc::new(Int64Array::from_iter_values(1..=8)) as ArrayRef),
        (
            "card_type",
            Arc::new(StringArray::from(vec![
                "Gold", "Gold", "Gold", "Gold", "Gold", "Classic", "Classic", "Platinum",
            ])) as ArrayRef,
        ),
        (
            "credit_rate",
            Arc::new(Float64Array::from(vec![9.9, 10.1, 10.0, 9.8, 24.0, 5.1, 4.9, 3.0])) as ArrayRef,
        ),
        (
            "PostCode",
            Arc::new(StringArray::from(vec![
                Some("SW1A 1AA"),
                Some("RG44RF"),
                Some("SE210AA"),
                Some("453"),
                None,
                Some("LS1 4AP"),
                Some("@2BG"),
                Some("YO1 7HH"),
            ])) as ArrayRef,
        ),
        (
            "address",
            Arc::new(StringArray::from(vec![
                Some("12 High Street"),
                Some("1 Mill Road"),
                Some("FLAT 9 TOWER"),
                Some("xx"),
                Some("4 Oak Street"),
                None,
                Some("9 Elm Road"),
                Some("2 Station Road"),
            ])) as ArrayRef,
        ),
        (
            "city",
            Arc::new(StringArray::from(vec![
                "London", "Reading", "LONDON", "Leeds", "Bath", "Leeds", "York", "York",
            ])) as ArrayRef,
        ),
        (
            "client_notes",
            Arc::new(StringArray::from(vec![
                Some("Called about card"),
                None,
                Some("Customer deceased, notified by family"),
                Some("Address change"),
                Some("Asked for statement"),
                Some("Complaint about fees"),
                Some(""),
                Some("Requested payment holiday"),
            ])) as ArrayRef,
        ),
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_profiler_level(tracing::Level::INFO))?;

    let source = DataSource::in_memory(mortgage_book()?);
    let classifier = Arc::new(BagOfWordsClassifier::new(
        HashMap::from([
            ("street".to_string(), 2.0),
            ("road".to_string(), 1.5),
            ("xx".to_string(), -3.0),
            ("deceased".to_string(), 4.0),
            ("complaint".to_string(), 2.0),
        ]),
        -0.5,
    ));
    let ids = |params: MetricParams| params.with("id_col", "user_id");

    let metrics = StandardMetrics {
        column_views: Metric::new(Arc::new(BasicProfile), &source),
        data_rules: Metric::new(Arc::new(ExtractDataRules), &source),
        anomaly_detect: Metric::new(Arc::new(GroupedZScore), &source)
            .with_params(ids(MetricParams::new().with("conf", 0.95)))?,
        extract_bad_postcode: Metric::new(Arc::new(ExtractBadPostcode), &source)
            .with_params(ids(MetricParams::new().with("postcd_col", "PostCode")))?,
        ml_address: Metric::new(Arc::new(DetectBadAddress::new(classifier.clone())), &source)
            .with_params(ids(
                MetricParams::new().with("address_col", serde_json::json!(["address", "city"])),
            ))?,
        headline_metrics: vec![
            Metric::new(Arc::new(TotalBlankCells), &source),
            Metric::new(Arc::new(TotalRowsCols), &source),
            Metric::new(Arc::new(DuplicateRows), &source),
            Metric::new(Arc::new(ExtractPIIAttributes), &source),
        ],
        ml_client_notes: Metric::new(Arc::new(ClassifyClientNotes::new(classifier)), &source)
            .with_params(ids(MetricParams::new()))?,
    };
    let config = DashboardConfig::default().with_log_config(LogConfig::verbose());
    let mut dashboard = StandardDashboard::with_config(metrics, config)?;

    let report = dashboard.calculate().await?;
    println!(
        "Calculated {} metrics in {} ms\n",
        report.calculated,
        report.duration().num_milliseconds()
    );

    let headline = dashboard.headline_metrics()?;
    for (label, value) in headline.labels.iter().zip(&headline.results) {
        println!("{label:>20}: {value}");
    }

    println!("\nColumns: {}", dashboard.column_names()?.join(", "));
    println!("\nProfile of credit_rate:\n{}", dashboard.columnwise_view("credit_rate")?);
    println!("\nAnomalies:\n{}", dashboard.anomaly_view()?.to_json_records()?);
    println!("\nBad postcodes:\n{}", dashboard.postcode_view()?.to_json_records()?);
    println!("\nAddresses:\n{}", dashboard.ml_address_view()?.to_json_records()?);
    println!("\nClient notes:\n{}", dashboard.client_notes_view()?.to_json_records()?);

    let rules = dashboard.data_rules_view()?;
    println!("\nRules:");
    for rule in rules.rules.iter().chain(&rules.inferred_rules) {
        println!("  - {rule}");
    }

    Ok(())
}
