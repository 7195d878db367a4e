//! Calendar field extraction for temporal Arrow arrays
//!
//! Timestamps are read in UTC: a column's timezone annotation is dropped
//! before the arrow `date_part` kernel runs, so the same instant always lands
//! in the same partition.

use arrow::array::{Array, ArrayRef, AsArray, Int32Array};
use arrow::compute::cast;
use arrow::compute::kernels::temporal::{date_part, DatePart as ArrowDatePart};
use arrow::datatypes::{DataType, Int32Type};
use hfs_core::{DatePart, Error, Result};

pub(crate) fn supports(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
    )
}

/// Extracts `part` from every value of `array`, preserving nulls
pub(crate) fn extract(part: DatePart, array: &ArrayRef) -> Result<Int32Array> {
    if !supports(array.data_type()) {
        return Err(Error::invalid_input(format!(
            "{} is not defined for type {}",
            part,
            array.data_type()
        )));
    }

    let source = match array.data_type() {
        // relabelling keeps the stored instants, which are UTC
        DataType::Timestamp(unit, Some(_)) => {
            cast(array, &DataType::Timestamp(*unit, None)).map_err(Error::storage)?
        }
        _ => ArrayRef::clone(array),
    };

    let values = date_part(source.as_ref(), kernel_part(part)).map_err(Error::storage)?;
    Ok(values.as_primitive::<Int32Type>().clone())
}

fn kernel_part(part: DatePart) -> ArrowDatePart {
    match part {
        DatePart::Year => ArrowDatePart::Year,
        DatePart::Month => ArrowDatePart::Month,
        DatePart::Day => ArrowDatePart::Day,
    }
}
