//! End-to-end tests: files on disk, loaded models and the standard dashboard.

use std::fs;
use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use term_profiler::dashboard::HeadlineMetrics;
use term_profiler::metrics::{
    BasicProfile, ClassifyClientNotes, DetectBadAddress, DuplicateRows, ExtractBadPostcode,
    ExtractDataRules, ExtractPIIAttributes, GroupedZScore, SupervisedAnomalyDetection,
    TotalBlankCells, TotalRowsCols,
};
use term_profiler::model::{BagOfWordsClassifier, LinearRegressor, TextClassifier};
use term_profiler::prelude::*;
use term_profiler::sources::{CsvOptions, CsvSource};

const MORTGAGES: &str = "\
user_id|card_type|credit_rate|PostCode|address|city|client_notes|income|premium
1|Gold|10.0|SW1A 1AA|12 High Street|London|Called about card|20|41
2|Gold|10.5|RG44RF|1 Mill Road|Reading||30|61
3|Gold|9.5|SE210AA|FLAT 9 TOWER|LEEDS|Customer deceased, notified by family|25|51
4|Classic|5.0|453||Leeds|Address change|40|81
5|Classic|5.5|DDDDDD|4 Oak Street|Bath|Asked for statement|35|71
6|Classic|6.0|@2BG|9 Elm Road|York|Complaint about fees|50|160
";

struct Fixture {
    dir: TempDir,
    source: DataSource,
}

impl Fixture {
    async fn load() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mortgages.psv");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, "{MORTGAGES}").unwrap();
        file.flush().unwrap();

        let csv = CsvSource::with_options(
            path.to_str().unwrap(),
            CsvOptions {
                delimiter: b'|',
                ..Default::default()
            },
        )
        .unwrap();
        let source = DataSource::from_source(&csv).await.unwrap();
        Self { dir, source }
    }

    fn write_model(&self, name: &str, body: serde_json::Value) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body.to_string()).unwrap();
        path
    }

    fn classifier(&self) -> Arc<dyn TextClassifier> {
        let path = self.write_model(
            "classifier.json",
            json!({ "weights": { "street": 2.0, "deceased": 4.0, "complaint": 1.5 }, "bias": -0.5 }),
        );
        Arc::new(BagOfWordsClassifier::load(path).unwrap())
    }

    fn standard_metrics(&self) -> StandardMetrics {
        let source = &self.source;
        let classifier = self.classifier();
        StandardMetrics {
            column_views: Metric::new(Arc::new(BasicProfile), source)
                .with_params(MetricParams::new().with("incl_graph", true))
                .unwrap(),
            data_rules: Metric::new(Arc::new(ExtractDataRules), source),
            anomaly_detect: Metric::new(Arc::new(GroupedZScore), source)
                .with_params(
                    MetricParams::new()
                        .with("id_col", "user_id")
                        .with("group_key", "card_type")
                        .with("group_value", "credit_rate"),
                )
                .unwrap(),
            extract_bad_postcode: Metric::new(Arc::new(ExtractBadPostcode), source)
                .with_params(
                    MetricParams::new()
                        .with("id_col", "user_id")
                        .with("postcd_col", "PostCode"),
                )
                .unwrap(),
            ml_address: Metric::new(Arc::new(DetectBadAddress::new(classifier.clone())), source)
                .with_params(
                    MetricParams::new()
                        .with("id_col", "user_id")
                        .with("address_col", json!(["address", "city"])),
                )
                .unwrap(),
            headline_metrics: vec![
                Metric::new(Arc::new(TotalBlankCells), source)
                    .with_params(MetricParams::new().with("pc", true))
                    .unwrap(),
                Metric::new(Arc::new(TotalRowsCols), source),
                Metric::new(Arc::new(DuplicateRows), source),
                Metric::new(Arc::new(ExtractPIIAttributes), source),
            ],
            ml_client_notes: Metric::new(Arc::new(ClassifyClientNotes::new(classifier)), source)
                .with_params(
                    MetricParams::new()
                        .with("id_col", "user_id")
                        .with("notes_col", "client_notes"),
                )
                .unwrap(),
        }
    }
}

fn assert_headline(headline: &HeadlineMetrics) {
    assert_eq!(headline.len(), 5);
    assert_eq!(headline.labels[0], "Total Blank Cells");
    // Two blank cells out of 54.
    assert_eq!(headline.results[0], MetricValue::String("0.04%".into()));
    assert_eq!(headline.results[1], MetricValue::Long(6));
    assert_eq!(headline.results[2], MetricValue::Long(9));
    assert_eq!(headline.results[3], MetricValue::Long(0));
    assert_eq!(headline.results[4], MetricValue::String("10/21".into()));
    assert_eq!(headline.colours[0].as_deref(), Some("text-danger"));
}

#[tokio::test]
async fn test_standard_dashboard_end_to_end() {
    let fixture = Fixture::load().await;
    let mut dashboard = StandardDashboard::new(fixture.standard_metrics()).unwrap();
    let report = dashboard.calculate().await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.calculated, 10);

    assert_headline(dashboard.headline_metrics().unwrap());
    assert_eq!(dashboard.column_names().unwrap()[3], "PostCode");

    let postcodes = dashboard.postcode_view().unwrap();
    assert_eq!(
        postcodes.float_column("user_id").unwrap(),
        vec![Some(4.0), Some(5.0), Some(6.0)]
    );

    let addresses = dashboard.ml_address_view().unwrap();
    assert_eq!(
        addresses.column_names(),
        vec!["user_id", "addr", "Validity Score"]
    );
    let scores = addresses.float_column("Validity Score").unwrap();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));

    let notes = dashboard.client_notes_view().unwrap();
    assert_eq!(
        notes.text_column("client_notes").unwrap()[5].as_deref(),
        Some("Customer deceased, notified by family")
    );

    let column = dashboard.columnwise_view("credit_rate").unwrap();
    let records: serde_json::Value = serde_json::from_str(&column).unwrap();
    assert_eq!(records[0]["01. Column Name"], "credit_rate");
    assert!(records[0]["histogram_json"].is_string());

    let tabular = dashboard.tabular_view().unwrap();
    assert_eq!(tabular.num_rows(), 9);
    assert!(!tabular.has_column("histogram_json"));

    let rules = dashboard.data_rules_view().unwrap();
    assert!(!rules.inferred_rules.is_empty());
}

#[tokio::test]
async fn test_concurrent_dashboard_matches_sequential() {
    let fixture = Fixture::load().await;
    let mut sequential = StandardDashboard::new(fixture.standard_metrics()).unwrap();
    sequential.calculate().await.unwrap();

    let config = DashboardConfig::default().with_execution_mode(ExecutionMode::Concurrent);
    let mut concurrent =
        StandardDashboard::with_config(fixture.standard_metrics(), config).unwrap();
    concurrent.calculate().await.unwrap();

    assert_eq!(
        sequential.headline_metrics().unwrap(),
        concurrent.headline_metrics().unwrap()
    );
    assert_eq!(
        sequential.dashboard().results().unwrap(),
        concurrent.dashboard().results().unwrap()
    );
}

#[tokio::test]
async fn test_supervised_detection_with_loaded_regressor() {
    let fixture = Fixture::load().await;
    let path = fixture.write_model(
        "premium.json",
        json!({ "coefficients": [2.0], "intercept": 1.0 }),
    );
    let regressor = Arc::new(LinearRegressor::load(path).unwrap());

    let mut metric = Metric::new(
        Arc::new(SupervisedAnomalyDetection::new(regressor)),
        &fixture.source,
    )
    .with_params(
        MetricParams::new()
            .with("id_col", "user_id")
            .with("x_cols", json!(["income"]))
            .with("y_col", "premium"),
    )
    .unwrap();

    let table = metric.invoke().await.unwrap().as_table().unwrap().clone();
    // User 6 pays 160 against a predicted 101.
    assert_eq!(table.float_column("user_id").unwrap()[0], Some(6.0));
    assert_eq!(table.float_column("Absolute Error").unwrap()[0], Some(59.0));
}

#[tokio::test]
async fn test_unknown_parameter_rejected() {
    let fixture = Fixture::load().await;
    let result = Metric::new(Arc::new(TotalRowsCols), &fixture.source)
        .with_params(MetricParams::new().with("colour", "red"));
    assert!(matches!(result, Err(ProfilerError::Configuration(_))));
}
