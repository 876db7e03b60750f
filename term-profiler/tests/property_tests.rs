//! Property-based tests for the metric kinds.
//!
//! Each property generates small random tables, computes the expected value
//! independently of the crate and compares it with what the metric returns.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use proptest::prelude::*;
use term_profiler::dashboard::{StandardDashboard, StandardMetrics};
use term_profiler::metrics::{
    BasicProfile, ClassifyClientNotes, DetectBadAddress, DuplicateRows, ExtractBadPostcode,
    ExtractDataRules, ExtractPIIAttributes, GroupedZScore, TotalBlankCells, TotalRowsCols,
};
use term_profiler::model::BagOfWordsClassifier;
use term_profiler::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn run(kind: Arc<dyn MetricKind>, table: TabularTable, params: MetricParams) -> MetricOutput {
    let source = DataSource::in_memory(table);
    let mut metric = Metric::new(kind, &source).with_params(params).unwrap();
    metric.invoke().await.unwrap().clone()
}

/// A table of `rows` x (`int_cols` integer columns + one text column).
fn small_table() -> impl Strategy<Value = TabularTable> {
    (0usize..3, 0usize..12).prop_flat_map(|(int_cols, rows)| {
        (
            prop::collection::vec(prop::collection::vec(0i64..3, rows), int_cols),
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), rows),
        )
            .prop_map(|(ints, text)| {
                let mut columns: Vec<(String, ArrayRef)> = ints
                    .into_iter()
                    .enumerate()
                    .map(|(i, values)| {
                        (format!("n{i}"), Arc::new(Int64Array::from(values)) as ArrayRef)
                    })
                    .collect();
                columns.push(("t".to_string(), Arc::new(StringArray::from(text)) as ArrayRef));
                TabularTable::from_columns(columns).unwrap()
            })
    })
}

fn expected_duplicates(table: &TabularTable) -> u64 {
    let columns: Vec<Vec<Option<String>>> = table
        .column_names()
        .iter()
        .map(|name| table.text_column(name).unwrap())
        .collect();
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = 0;
    for row in 0..table.num_rows() {
        let tuple: Vec<Option<String>> = columns.iter().map(|c| c[row].clone()).collect();
        if !seen.insert(tuple) {
            duplicates += 1;
        }
    }
    duplicates
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn rows_cols_matches_shape(table in small_table()) {
        let (rows, cols) = (table.num_rows() as u64, table.num_columns() as u64);
        let output = runtime().block_on(run(Arc::new(TotalRowsCols), table, MetricParams::new()));
        prop_assert_eq!(output, MetricOutput::Dimensions { rows, columns: cols });
    }

    #[test]
    fn duplicate_rows_counts_repeats(table in small_table()) {
        let expected = expected_duplicates(&table);
        let output = runtime().block_on(run(Arc::new(DuplicateRows), table, MetricParams::new()));
        prop_assert_eq!(output, MetricOutput::Count(expected));
    }

    #[test]
    fn complete_tables_have_no_blanks(table in small_table()) {
        let rt = runtime();
        let count = rt.block_on(run(
            Arc::new(TotalBlankCells),
            table.clone(),
            MetricParams::new().with("pc", false),
        ));
        let ratio = rt.block_on(run(Arc::new(TotalBlankCells), table, MetricParams::new()));
        prop_assert_eq!(count, MetricOutput::Count(0));
        prop_assert_eq!(ratio, MetricOutput::Text("0.00%".to_string()));
    }

    #[test]
    fn repeated_invocation_is_idempotent(table in small_table()) {
        let rt = runtime();
        let source = DataSource::in_memory(table);
        let mut metric = Metric::new(Arc::new(DuplicateRows), &source);
        let first = rt.block_on(metric.invoke()).unwrap().clone();
        let second = rt.block_on(metric.invoke()).unwrap().clone();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn z_score_flags_iff_above_critical(
        groups in prop::collection::vec((0usize..3, 0.0f64..100.0), 1..40),
    ) {
        let keys: Vec<&str> = groups.iter().map(|(g, _)| ["Gold", "Classic", "Platinum"][*g]).collect();
        let values: Vec<f64> = groups.iter().map(|(_, v)| *v).collect();
        let table = TabularTable::from_columns(vec![
            ("id", Arc::new(Int64Array::from_iter_values(0..groups.len() as i64)) as ArrayRef),
            ("card_type", Arc::new(StringArray::from(keys.clone())) as ArrayRef),
            ("credit_rate", Arc::new(Float64Array::from(values.clone())) as ArrayRef),
        ])
        .unwrap();

        let mut by_group: HashMap<&str, Vec<f64>> = HashMap::new();
        for (k, v) in keys.iter().zip(&values) {
            by_group.entry(*k).or_default().push(*v);
        }
        let flagged_at = |critical: f64| -> Vec<i64> {
            keys.iter()
                .zip(&values)
                .enumerate()
                .filter(|(_, (k, v))| {
                    let group = &by_group[*k];
                    let n = group.len() as f64;
                    let mean = group.iter().sum::<f64>() / n;
                    let std = (group.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
                    std > 0.0 && (**v - mean).abs() / std > critical
                })
                .map(|(i, _)| i as i64)
                .collect()
        };

        let rt = runtime();
        let ids = |conf: f64| -> Vec<i64> {
            let output = rt.block_on(run(
                Arc::new(GroupedZScore),
                table.clone(),
                MetricParams::new().with("conf", conf),
            ));
            output
                .as_table()
                .unwrap()
                .float_column("id")
                .unwrap()
                .into_iter()
                .map(|id| id.unwrap() as i64)
                .collect()
        };

        let strict = ids(0.99);
        let loose = ids(0.95);
        prop_assert_eq!(&strict, &flagged_at(2.33));
        prop_assert_eq!(&loose, &flagged_at(1.645));
        prop_assert!(strict.iter().all(|id| loose.contains(id)));
    }

    #[test]
    fn headline_lists_grow_by_display_entries(extra in 0usize..5) {
        let table = TabularTable::from_columns(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("card_type", Arc::new(StringArray::from(vec!["Gold", "Gold"])) as ArrayRef),
            ("credit_rate", Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef),
            ("postcode", Arc::new(StringArray::from(vec!["SW1A 1AA", "453"])) as ArrayRef),
            ("addr", Arc::new(StringArray::from(vec!["1 Road", "2 Street"])) as ArrayRef),
            ("city", Arc::new(StringArray::from(vec!["York", "Bath"])) as ArrayRef),
            ("client_notes", Arc::new(StringArray::from(vec!["ok", "fine"])) as ArrayRef),
        ])
        .unwrap();
        let source = DataSource::in_memory(table);
        let classifier = Arc::new(BagOfWordsClassifier::new(HashMap::new(), 0.0));

        // `extra` single-entry metrics plus the two-entry TotalRowsCols.
        let mut headline_metrics: Vec<Metric> = (0..extra)
            .map(|i| match i % 3 {
                0 => Metric::new(Arc::new(TotalBlankCells), &source),
                1 => Metric::new(Arc::new(DuplicateRows), &source),
                _ => Metric::new(Arc::new(ExtractPIIAttributes), &source),
            })
            .collect();
        headline_metrics.push(Metric::new(Arc::new(TotalRowsCols), &source));

        let mut dashboard = StandardDashboard::new(StandardMetrics {
            column_views: Metric::new(Arc::new(BasicProfile), &source),
            data_rules: Metric::new(Arc::new(ExtractDataRules), &source),
            anomaly_detect: Metric::new(Arc::new(GroupedZScore), &source),
            extract_bad_postcode: Metric::new(Arc::new(ExtractBadPostcode), &source),
            ml_address: Metric::new(Arc::new(DetectBadAddress::new(classifier.clone())), &source),
            headline_metrics,
            ml_client_notes: Metric::new(Arc::new(ClassifyClientNotes::new(classifier)), &source),
        })
        .unwrap();
        runtime().block_on(dashboard.calculate()).unwrap();

        let headline = dashboard.headline_metrics().unwrap();
        prop_assert_eq!(headline.labels.len(), extra + 2);
        prop_assert_eq!(headline.results.len(), extra + 2);
        prop_assert_eq!(headline.icons.len(), extra + 2);
        prop_assert_eq!(headline.colours.len(), extra + 2);
    }
}
