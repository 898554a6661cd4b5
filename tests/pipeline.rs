use std::path::{Path, PathBuf};

use hotel_forecast::app::pipeline::{forecast_from_store, ingest_file, run_pipeline};
use hotel_forecast::domain::{PipelineConfig, ReportFormat};
use hotel_forecast::error::PipelineError;
use hotel_forecast::evaluate::evaluate;
use hotel_forecast::store::{DocumentStore, JsonFileStore, MemoryStore};
use serde_json::{Value, json};

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn two_years_of_history() -> String {
    let mut text = String::from("year,month,revenue,avg_adr,occupancy\n");
    for year in [2022, 2023] {
        for month in 1..=12 {
            let season = if (6..=8).contains(&month) { 1.3 } else { 1.0 };
            let growth = if year == 2023 { 1.1 } else { 1.0 };
            text.push_str(&format!(
                "{year},{month},{:.2},{:.2},{:.2}\n",
                90_000.0 * season * growth,
                140.0 * season,
                62.0 * season
            ));
        }
    }
    text
}

fn config_in(dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.store.root = dir.join("store");
    config.report.output_dir = dir.join("reports");
    config
}

#[test]
fn forecast_then_reconcile_twice_leaves_identical_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = JsonFileStore::new(&config.store.root, &config.store.database);
    let input = write_csv(dir.path(), "hotel.csv", &two_years_of_history());
    ingest_file(&store, &config, &input).unwrap();

    let first = forecast_from_store(&store, &config).unwrap();
    assert_eq!(first.reconcile.inserted, 12);
    let snapshot = store.find_all("predicted_data").unwrap();

    let second = forecast_from_store(&store, &config).unwrap();
    assert_eq!(second.reconcile.replaced, 12);
    assert_eq!(store.find_all("predicted_data").unwrap(), snapshot);
}

#[test]
fn horizon_continues_from_last_observed_month() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.forecast.horizon = 5;
    let store = MemoryStore::new();
    let input = write_csv(dir.path(), "hotel.csv", &two_years_of_history());
    ingest_file(&store, &config, &input).unwrap();

    let out = forecast_from_store(&store, &config).unwrap();
    let keys: Vec<(i32, u32)> = out.run.records.iter().map(|r| (r.year, r.month)).collect();
    assert_eq!(keys, vec![(2024, 1), (2024, 2), (2024, 3), (2024, 4), (2024, 5)]);
}

#[test]
fn bounding_pass_repairs_foreign_documents() {
    let store = MemoryStore::new();
    let foreign = vec![
        json!({"year": "2024", "month": 2024.0, "occupancyPercent": 130.4, "averageRate": 199.999}),
        json!({"year": 2024, "month": 3, "occupancyPercent": "-5"}),
        json!({"note": "no numeric fields"}),
    ];
    store
        .insert_many(
            "predicted_data",
            foreign.into_iter().map(|v| v.as_object().cloned().unwrap()).collect(),
        )
        .unwrap();

    let report = evaluate(&store, "predicted_data", &PipelineConfig::default().bounding).unwrap();
    assert_eq!(report.seen, 3);
    assert_eq!(report.updated, 2);

    let docs = store.find_all("predicted_data").unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0].fields["year"], json!(2024));
    assert_eq!(docs[0].fields["month"], json!(2024));
    assert_eq!(docs[0].fields["occupancyPercent"], json!(100.0));
    assert_eq!(docs[0].fields["averageRate"], json!(200.0));
    for d in &docs {
        if let Some(occ) = d.fields.get("occupancyPercent") {
            let occ = occ.as_f64().unwrap();
            assert!((0.0..=100.0).contains(&occ));
        }
    }
    assert_eq!(docs[2].fields.get("occupancyPercent"), None);
}

#[test]
fn full_run_against_file_store_writes_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.forecast.horizon = 3;
    config.report.format = ReportFormat::Json;
    let store = JsonFileStore::new(&config.store.root, &config.store.database);
    let input = write_csv(dir.path(), "hotel.csv", &two_years_of_history());

    let summary = run_pipeline(&store, &config, Some(&input));
    assert!(summary.is_success(), "{summary:?}");

    let report = summary.report.as_ref().unwrap();
    assert_eq!(report.rows, 3);
    let name = report.file_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("forecast_report_") && name.ends_with(".json"));

    let rows: Value = serde_json::from_str(&std::fs::read_to_string(&report.file_path).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows[0]["year"], json!(2024));
    assert_eq!(rows[0]["month"], json!(1));
    let keys: Vec<&String> = rows[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 5);
}

#[test]
fn report_on_empty_collection_is_a_user_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let store = JsonFileStore::new(&config.store.root, &config.store.database);

    let err = hotel_forecast::report::report(&store, "predicted_data", &config.report.output_dir, ReportFormat::Csv)
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCollection(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(!config.report.output_dir.exists());
}

#[test]
fn schema_errors_surface_from_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let input = write_csv(dir.path(), "bad.csv", "year,month,adr\n2023,1,100\n");

    let err = ingest_file(&MemoryStore::new(), &config, &input).unwrap_err();
    assert!(matches!(err, PipelineError::Schema(_)));
    assert_eq!(err.exit_code(), 2);
}
