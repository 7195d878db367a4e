//! E2E tests for the historical writer on the local Arrow engine
//!
//! Runs complete write cycles (prepare, commit, validate):
//! - partition columns derived from the event timestamp
//! - overwrite-mode guard
//! - row preservation through repartitioning
//! - count validation in production and dry-run mode

use arrow::array::{
    Array, Int32Array, Int64Array, RecordBatch, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, Datelike, Utc};
use hfs_arrow::{ArrowFrame, LocalEngine};
use hfs_core::storage::{LocalConfig, StorageConfig};
use hfs_core::{DataFrame, Error, FeatureSet, PARTITION_OVERWRITE_MODE_KEY};
use hfs_writer::HistoricalWriter;
use std::sync::Arc;
use tempfile::TempDir;

fn feature_set() -> FeatureSet {
    FeatureSet::new("user_features", "user")
}

/// `n` users with one event every 7 hours starting 2024-02-27
fn user_events(n: usize) -> ArrowFrame {
    let start = DateTime::parse_from_rfc3339("2024-02-27T00:00:00Z")
        .unwrap()
        .timestamp_millis();
    let schema = Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new("timestamp", DataType::Timestamp(TimeUnit::Millisecond, None), false),
        Field::new("purchases", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(
                (0..n).map(|i| format!("user_{}", i)).collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMillisecondArray::from(
                (0..n as i64).map(|i| start + i * 7 * 3_600_000).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>())),
        ],
    )
    .unwrap();
    ArrowFrame::from_batch(batch)
}

fn writer(dir: &TempDir, debug_mode: bool) -> HistoricalWriter<LocalEngine> {
    let storage: Arc<dyn StorageConfig> = Arc::new(LocalConfig::new(dir.path()));
    HistoricalWriter::builder(storage, "feature_store")
        .num_partitions(4)
        .debug_mode(debug_mode)
        .build()
        .unwrap()
}

fn int32_column(frame: &ArrowFrame, name: &str) -> Vec<i32> {
    let column = frame.column(name).unwrap();
    column
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap()
        .values()
        .to_vec()
}

// ============================================================================
// Partition derivation
// ============================================================================

#[tokio::test]
async fn test_e2e_partition_columns_match_timestamps() {
    // Given: Events spanning a leap day and a month boundary
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let input = user_events(20);

    // When: Preparing the write
    let plan = writer(&dir, false)
        .prepare_for_write(&feature_set(), input, &engine)
        .await
        .unwrap();

    // Then: Every row's year/month/day equals the date of its timestamp
    assert_eq!(plan.partition_by, vec!["year", "month", "day"]);
    assert_eq!(plan.dataframe.num_partitions(), 4);

    let frame = &plan.dataframe;
    let timestamps = frame.column("timestamp").unwrap();
    let timestamps = timestamps
        .as_any()
        .downcast_ref::<TimestampMillisecondArray>()
        .unwrap();
    let (years, months, days) = (
        int32_column(frame, "year"),
        int32_column(frame, "month"),
        int32_column(frame, "day"),
    );
    for i in 0..timestamps.len() {
        let ts = DateTime::<Utc>::from_timestamp_millis(timestamps.value(i)).unwrap();
        assert_eq!(years[i], ts.year());
        assert_eq!(months[i] as u32, ts.month());
        assert_eq!(days[i] as u32, ts.day());
    }
    assert!(days.contains(&29), "leap day must be present");
    assert!(months.contains(&3), "data must cross into March");
}

#[tokio::test]
async fn test_e2e_repartition_preserves_rows_and_values() {
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "Dynamic");
    let input = user_events(50);

    let plan = writer(&dir, false)
        .prepare_for_write(&feature_set(), input.clone(), &engine)
        .await
        .unwrap();

    assert_eq!(plan.dataframe.count().await.unwrap(), 50);

    let purchases = plan.dataframe.column("purchases").unwrap();
    let mut purchases = purchases
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .values()
        .to_vec();
    purchases.sort();
    assert_eq!(purchases, (0..50).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_e2e_storage_path_ignores_database() {
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let storage: Arc<dyn StorageConfig> = Arc::new(LocalConfig::new(dir.path()));

    for database in ["feature_store", "another_db"] {
        let writer: HistoricalWriter<LocalEngine> =
            HistoricalWriter::builder(Arc::clone(&storage), database)
                .build()
                .unwrap();
        let plan = writer
            .prepare_for_write(&feature_set(), user_events(1), &engine)
            .await
            .unwrap();

        let expected = dir.path().join("historical").join("user").join("user_features");
        assert_eq!(plan.path().unwrap(), expected.to_string_lossy());
    }
}

// ============================================================================
// Overwrite-mode guard
// ============================================================================

#[tokio::test]
async fn test_e2e_guard_rejects_static_and_unset_modes() {
    let dir = TempDir::new().unwrap();

    for engine in [
        LocalEngine::new(),
        LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "static"),
    ] {
        let err = writer(&dir, false)
            .prepare_for_write(&feature_set(), user_events(3), &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PartitionOverwriteMode(ref m) if m == "static"));
        assert!(err
            .to_string()
            .contains("partitionOverwriteMode have to be configured to 'dynamic'"));
    }

    // Nothing was written
    assert!(!dir.path().join("historical").exists());
}

#[tokio::test]
async fn test_e2e_debug_mode_skips_guard() {
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "static");

    let plan = writer(&dir, true)
        .prepare_for_write(&feature_set(), user_events(3), &engine)
        .await;

    assert!(plan.is_ok());
}

// ============================================================================
// Full write cycles
// ============================================================================

#[tokio::test]
async fn test_e2e_production_cycle_validates() {
    // Given: A dynamic-overwrite engine and a production writer
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let writer = writer(&dir, false);
    let input = user_events(30);

    // When: Running prepare, commit and validate
    let plan = writer
        .prepare_for_write(&feature_set(), input.clone(), &engine)
        .await
        .unwrap();
    let summary = engine.commit(plan).await.unwrap();

    // Then: All rows are on disk and validation passes
    assert_eq!(summary.rows, 30);
    assert!(summary.files >= summary.partitions.len());
    writer.validate(&feature_set(), &input, &engine).await.unwrap();
}

#[tokio::test]
async fn test_e2e_production_validate_detects_count_mismatch() {
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let writer = writer(&dir, false);

    let plan = writer
        .prepare_for_write(&feature_set(), user_events(100), &engine)
        .await
        .unwrap();
    engine.commit(plan).await.unwrap();

    // 1% of 100 allows 99..=101
    writer
        .validate(&feature_set(), &user_events(101), &engine)
        .await
        .unwrap();
    let err = writer
        .validate(&feature_set(), &user_events(110), &engine)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::CountMismatch { ref table, written: 100, dataframe: 110 }
            if table == "feature_store.user_features"
    ));
    let message = err.to_string();
    assert!(message.contains("Number of rows in feature_store.user_features: 100."));
    assert!(message.contains("Number of rows in the dataframe: 110."));
}

#[tokio::test]
async fn test_e2e_dry_run_cycle_uses_temporary_view() {
    // Given: A debug-mode writer
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new();
    let writer = writer(&dir, true);
    let input = user_events(12);

    // When: Running the cycle
    let plan = writer
        .prepare_for_write(&feature_set(), input.clone(), &engine)
        .await
        .unwrap();
    engine.commit(plan).await.unwrap();

    // Then: Validation reads the view and nothing touches the disk
    writer.validate(&feature_set(), &input, &engine).await.unwrap();
    assert!(engine
        .has_temp_view("historical_feature_store__user_features")
        .unwrap());
    assert!(!dir.path().join("historical").exists());
}

#[tokio::test]
async fn test_e2e_validate_before_any_write_fails() {
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");

    let err = writer(&dir, false)
        .validate(&feature_set(), &user_events(5), &engine)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TableNotFound(_)));
}

// ============================================================================
// Repeated cycles into one table
// ============================================================================

/// `n` events at noon of `day`, with `nullable` key and timestamp fields
fn events_on(day: &str, n: usize, nullable: bool) -> ArrowFrame {
    let ts = DateTime::parse_from_rfc3339(&format!("{}T12:00:00Z", day))
        .unwrap()
        .timestamp_millis();
    let schema = Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, nullable),
        Field::new("timestamp", DataType::Timestamp(TimeUnit::Millisecond, None), nullable),
        Field::new("purchases", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(
                (0..n).map(|i| format!("user_{}", i)).collect::<Vec<_>>(),
            )),
            Arc::new(TimestampMillisecondArray::from(vec![ts; n])),
            Arc::new(Int64Array::from((0..n as i64).collect::<Vec<_>>())),
        ],
    )
    .unwrap();
    ArrowFrame::from_batch(batch)
}

#[tokio::test]
async fn test_e2e_second_cycle_appends_new_day() {
    // Given: A table holding 2024-02-29
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let writer = writer(&dir, false);
    let plan = writer
        .prepare_for_write(&feature_set(), events_on("2024-02-29", 6, false), &engine)
        .await
        .unwrap();
    engine.commit(plan).await.unwrap();

    // When: Writing 2024-03-01 with the same schema
    let plan = writer
        .prepare_for_write(&feature_set(), events_on("2024-03-01", 4, false), &engine)
        .await
        .unwrap();
    engine.commit(plan).await.unwrap();

    // Then: Both days read back as one table
    writer
        .validate(&feature_set(), &user_events(10), &engine)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_e2e_nullability_change_is_blocked_and_table_stays_readable() {
    // Given: A table written with non-nullable key and timestamp
    let dir = TempDir::new().unwrap();
    let engine = LocalEngine::new().with_conf(PARTITION_OVERWRITE_MODE_KEY, "dynamic");
    let writer = writer(&dir, false);
    let first = events_on("2024-02-29", 5, false);
    let plan = writer
        .prepare_for_write(&feature_set(), first.clone(), &engine)
        .await
        .unwrap();
    engine.commit(plan).await.unwrap();

    // When: The next day arrives with the same types but nullable fields
    let plan = writer
        .prepare_for_write(&feature_set(), events_on("2024-03-01", 3, true), &engine)
        .await
        .unwrap();
    let err = engine.commit(plan).await.unwrap_err();

    // Then: The schema check rejects it before any file is written
    match err {
        Error::SchemaIncompatible { table, columns } => {
            assert_eq!(table, "feature_store.user_features");
            assert!(columns.contains(&"user_id".to_string()));
            assert!(columns.contains(&"timestamp".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir
        .path()
        .join("historical/user/user_features/year=2024/month=3")
        .exists());

    // And: The existing table still validates against its own input
    writer.validate(&feature_set(), &first, &engine).await.unwrap();
}
