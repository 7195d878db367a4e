//! Row distribution
//!
//! Two operations share the same row-key encoding (`arrow::row`):
//!
//! - [`hash_repartition`] spreads rows over N physical partitions by a hash of
//!   the key columns, so equal keys always land in the same partition
//! - [`split_by_values`] groups rows by their key values and names each group
//!   with its Hive directory (`year=2024/month=3/day=14`)

use arrow::array::{Array, ArrayRef, RecordBatch, UInt32Array};
use arrow::compute::{concat_batches, take_record_batch};
use arrow::datatypes::SchemaRef;
use arrow::row::{OwnedRow, RowConverter, SortField};
use arrow::util::display::array_value_to_string;
use hfs_core::{Error, Result};
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::Arc;

use crate::ArrowFrame;

/// Directory value used for null partition keys
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Redistributes the rows of `frame` into `num_partitions` partitions keyed by `columns`
///
/// The output always has exactly `num_partitions` partitions; some may be empty.
/// Row order within a partition follows the input order.
pub fn hash_repartition(
    frame: &ArrowFrame,
    columns: &[&str],
    num_partitions: usize,
) -> Result<ArrowFrame> {
    if num_partitions == 0 {
        return Err(Error::invalid_input(
            "number of partitions must be greater than zero",
        ));
    }

    let schema = Arc::clone(frame.schema());
    let key_indices = key_indices(&schema, columns)?;
    let converter = row_converter(&schema, &key_indices)?;

    let mut buckets: Vec<Vec<RecordBatch>> = vec![Vec::new(); num_partitions];
    for batch in frame.partitions() {
        if batch.num_rows() == 0 {
            continue;
        }

        let rows = converter
            .convert_columns(&key_columns(batch, &key_indices))
            .map_err(Error::storage)?;

        let mut assignment: Vec<Vec<u32>> = vec![Vec::new(); num_partitions];
        for (i, row) in rows.iter().enumerate() {
            assignment[bucket_of(row.as_ref(), num_partitions)].push(i as u32);
        }

        for (bucket, indices) in assignment.into_iter().enumerate() {
            if indices.is_empty() {
                continue;
            }
            let indices = UInt32Array::from(indices);
            buckets[bucket].push(take_record_batch(batch, &indices).map_err(Error::storage)?);
        }
    }

    let partitions = buckets
        .iter()
        .map(|pieces| concat_batches(&schema, pieces).map_err(Error::storage))
        .collect::<Result<Vec<_>>>()?;

    ArrowFrame::try_new(schema, partitions)
}

/// Splits `batch` into one batch per distinct combination of `columns`
///
/// Groups are returned in order of first appearance together with their Hive
/// directory, relative to the table root.
pub fn split_by_values(
    batch: &RecordBatch,
    columns: &[String],
) -> Result<Vec<(String, RecordBatch)>> {
    if batch.num_rows() == 0 {
        return Ok(vec![]);
    }

    let schema = batch.schema();
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let key_indices = key_indices(&schema, &names)?;
    let converter = row_converter(&schema, &key_indices)?;
    let keys = key_columns(batch, &key_indices);
    let rows = converter.convert_columns(&keys).map_err(Error::storage)?;

    let mut group_of: HashMap<OwnedRow, usize> = HashMap::new();
    let mut groups: Vec<(usize, Vec<u32>)> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let group = *group_of.entry(row.owned()).or_insert_with(|| {
            groups.push((i, Vec::new()));
            groups.len() - 1
        });
        groups[group].1.push(i as u32);
    }

    groups
        .into_iter()
        .map(|(first_row, indices)| {
            let dir = hive_directory(&names, &keys, first_row)?;
            let slice = take_record_batch(batch, &UInt32Array::from(indices))
                .map_err(Error::storage)?;
            Ok((dir, slice))
        })
        .collect()
}

fn hive_directory(names: &[&str], keys: &[ArrayRef], row: usize) -> Result<String> {
    let segments = names
        .iter()
        .zip(keys)
        .map(|(name, column)| {
            let value = if column.is_null(row) {
                HIVE_DEFAULT_PARTITION.to_string()
            } else {
                array_value_to_string(column, row).map_err(Error::storage)?
            };
            Ok(format!("{}={}", name, value))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(segments.join("/"))
}

fn key_indices(schema: &SchemaRef, columns: &[&str]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| Error::ColumnNotFound(name.to_string()))
        })
        .collect()
}

fn row_converter(schema: &SchemaRef, key_indices: &[usize]) -> Result<RowConverter> {
    let fields = key_indices
        .iter()
        .map(|&i| SortField::new(schema.field(i).data_type().clone()))
        .collect();
    RowConverter::new(fields).map_err(Error::storage)
}

fn key_columns(batch: &RecordBatch, key_indices: &[usize]) -> Vec<ArrayRef> {
    key_indices
        .iter()
        .map(|&i| Arc::clone(batch.column(i)))
        .collect()
}

fn bucket_of(key: &[u8], num_partitions: usize) -> usize {
    let mut hasher = SipHasher13::new();
    hasher.write(key);
    (hasher.finish() % num_partitions as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use hfs_core::DataFrame;

    fn batch(years: Vec<Option<i32>>, days: Vec<i32>) -> RecordBatch {
        let ids: Vec<String> = (0..days.len()).map(|i| format!("id-{}", i)).collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("year", DataType::Int32, true),
            Field::new("day", DataType::Int32, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(Int32Array::from(years)),
                Arc::new(Int32Array::from(days)),
            ],
        )
        .unwrap()
    }

    fn key_set(batch: &RecordBatch) -> Vec<(Option<i32>, i32)> {
        let years = batch.column(1).as_any().downcast_ref::<Int32Array>().unwrap();
        let days = batch.column(2).as_any().downcast_ref::<Int32Array>().unwrap();
        let mut keys: Vec<_> = (0..batch.num_rows())
            .map(|i| {
                let year = if years.is_null(i) { None } else { Some(years.value(i)) };
                (year, days.value(i))
            })
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    #[test]
    fn test_hash_repartition_keeps_rows_and_colocates_keys() {
        let input = batch(
            vec![Some(2024), Some(2023), Some(2024), None, Some(2024)],
            vec![1, 1, 1, 2, 3],
        );
        let frame = ArrowFrame::from_batch(input);

        let repartitioned = hash_repartition(&frame, &["year", "day"], 4).unwrap();

        assert_eq!(repartitioned.num_partitions(), 4);
        assert_eq!(repartitioned.num_rows(), 5);

        // every key lives in exactly one partition
        let mut seen = Vec::new();
        for part in repartitioned.partitions() {
            for key in key_set(part) {
                assert!(!seen.contains(&key), "key {:?} split across partitions", key);
                seen.push(key);
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_hash_repartition_is_deterministic() {
        let frame = ArrowFrame::from_batch(batch(vec![Some(2024); 6], vec![1, 2, 3, 4, 5, 6]));
        let first = hash_repartition(&frame, &["day"], 3).unwrap();
        let second = hash_repartition(&frame, &["day"], 3).unwrap();

        let sizes = |f: &ArrowFrame| f.partitions().iter().map(|b| b.num_rows()).collect::<Vec<_>>();
        assert_eq!(sizes(&first), sizes(&second));
    }

    #[test]
    fn test_hash_repartition_rejects_unknown_column_and_zero_partitions() {
        let frame = ArrowFrame::from_batch(batch(vec![Some(2024)], vec![1]));
        assert!(matches!(
            hash_repartition(&frame, &["month"], 2),
            Err(Error::ColumnNotFound(ref c)) if c == "month"
        ));
        assert!(matches!(
            hash_repartition(&frame, &["day"], 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_split_by_values_names_hive_directories() {
        let input = batch(
            vec![Some(2024), Some(2023), Some(2024), None],
            vec![14, 1, 14, 2],
        );

        let groups = split_by_values(&input, &["year".to_string(), "day".to_string()]).unwrap();

        let dirs: Vec<&str> = groups.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(
            dirs,
            vec![
                "year=2024/day=14",
                "year=2023/day=1",
                "year=__HIVE_DEFAULT_PARTITION__/day=2"
            ]
        );
        assert_eq!(groups[0].1.num_rows(), 2);
        assert_eq!(groups[1].1.num_rows(), 1);
    }

    #[test]
    fn test_split_empty_batch() {
        let input = batch(vec![], vec![]);
        assert!(split_by_values(&input, &["day".to_string()]).unwrap().is_empty());
    }
}
