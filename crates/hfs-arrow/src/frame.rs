//! In-memory Arrow dataframe
//!
//! An [`ArrowFrame`] is a schema plus one `RecordBatch` per physical partition.
//! Transformations build new batches and never touch the originals, so clones
//! are cheap (array data is reference counted).

use arrow::array::{ArrayRef, RecordBatch};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use async_trait::async_trait;
use hfs_core::{ColumnExpr, DataFrame, Error, Result};
use std::sync::Arc;

use crate::{date_part, partition};

#[derive(Debug, Clone)]
pub struct ArrowFrame {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl ArrowFrame {
    /// Creates a frame from batches sharing `schema`
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a batch's fields differ from the schema.
    pub fn try_new(schema: SchemaRef, partitions: Vec<RecordBatch>) -> Result<Self> {
        for (i, batch) in partitions.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(Error::invalid_input(format!(
                    "partition {} does not match the frame schema",
                    i
                )));
            }
        }
        Ok(Self { schema, partitions })
    }

    /// Single-partition frame
    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            partitions: vec![batch],
        }
    }

    /// Frame with no rows
    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            partitions: vec![],
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(|b| b.num_rows()).sum()
    }

    /// Concatenates all partitions into one batch
    pub fn collect(&self) -> Result<RecordBatch> {
        concat_batches(&self.schema, &self.partitions).map_err(Error::storage)
    }

    /// Column `name` of every partition, concatenated
    pub fn column(&self, name: &str) -> Result<ArrayRef> {
        let batch = self.collect()?;
        batch
            .column_by_name(name)
            .cloned()
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }
}

#[async_trait]
impl DataFrame for ArrowFrame {
    fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn with_column(&self, name: &str, expr: &ColumnExpr) -> Result<Self> {
        let ColumnExpr::DatePart { part, column } = expr;

        let source = self
            .schema
            .index_of(column)
            .map_err(|_| Error::ColumnNotFound(column.clone()))?;
        let source_field = self.schema.field(source);
        if !date_part::supports(source_field.data_type()) {
            return Err(Error::invalid_input(format!(
                "cannot evaluate {} on column '{}' of type {}",
                expr,
                column,
                source_field.data_type()
            )));
        }

        let new_field = Arc::new(Field::new(name, DataType::Int32, source_field.is_nullable()));
        let target = self.schema.index_of(name).ok();

        let mut fields: Vec<_> = self.schema.fields().iter().cloned().collect();
        match target {
            Some(i) => fields[i] = new_field,
            None => fields.push(new_field),
        }
        let schema = Arc::new(Schema::new_with_metadata(
            fields,
            self.schema.metadata().clone(),
        ));

        let partitions = self
            .partitions
            .iter()
            .map(|batch| {
                let values: ArrayRef = Arc::new(date_part::extract(*part, batch.column(source))?);
                let mut columns = batch.columns().to_vec();
                match target {
                    Some(i) => columns[i] = values,
                    None => columns.push(values),
                }
                RecordBatch::try_new(Arc::clone(&schema), columns).map_err(Error::storage)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { schema, partitions })
    }

    fn repartition(&self, columns: &[&str], num_partitions: usize) -> Result<Self> {
        partition::hash_repartition(self, columns, num_partitions)
    }

    fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.num_rows() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array, StringArray, TimestampMicrosecondArray};
    use chrono::{TimeZone, Utc};

    fn events() -> ArrowFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new(
                "timestamp",
                DataType::Timestamp(arrow::datatypes::TimeUnit::Microsecond, Some("UTC".into())),
                false,
            ),
        ]));
        let ts = [
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap(),
        ];
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(
                    TimestampMicrosecondArray::from(
                        ts.iter().map(|t| t.timestamp_micros()).collect::<Vec<_>>(),
                    )
                    .with_timezone("UTC"),
                ),
            ],
        )
        .unwrap();
        ArrowFrame::from_batch(batch)
    }

    #[test]
    fn test_with_column_appends_date_parts() {
        let frame = events()
            .with_column("year", &ColumnExpr::year("timestamp"))
            .unwrap()
            .with_column("day", &ColumnExpr::day_of_month("timestamp"))
            .unwrap();

        assert_eq!(frame.column_names(), vec!["id", "timestamp", "year", "day"]);

        let year = frame.column("year").unwrap();
        let year = year.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(year.values().to_vec(), vec![2024, 2023]);

        let day = frame.column("day").unwrap();
        let day = day.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(day.values().to_vec(), vec![29, 1]);
    }

    #[test]
    fn test_with_column_replaces_existing_column() {
        let frame = events()
            .with_column("id", &ColumnExpr::month("timestamp"))
            .unwrap();

        assert_eq!(frame.column_names(), vec!["id", "timestamp"]);
        assert_eq!(frame.schema().field(0).data_type(), &DataType::Int32);
    }

    #[test]
    fn test_with_column_missing_source_column() {
        let err = events()
            .with_column("year", &ColumnExpr::year("event_time"))
            .unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(ref c) if c == "event_time"));
    }

    #[test]
    fn test_with_column_rejects_non_temporal_source() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "timestamp",
            DataType::Utf8,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["2024-01-01"]))],
        )
        .unwrap();

        let err = ArrowFrame::from_batch(batch)
            .with_column("year", &ColumnExpr::year("timestamp"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_try_new_rejects_mismatched_batches() {
        let frame = events();
        let other = Arc::new(Schema::new(vec![Field::new("x", DataType::Int64, false)]));
        let result = ArrowFrame::try_new(other, frame.partitions().to_vec());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_count_sums_partitions() {
        let frame = events();
        let doubled = ArrowFrame::try_new(
            frame.schema().clone(),
            vec![frame.partitions()[0].clone(), frame.partitions()[0].clone()],
        )
        .unwrap();
        assert_eq!(doubled.count().await.unwrap(), 4);
        assert_eq!(doubled.num_partitions(), 2);
    }
}
