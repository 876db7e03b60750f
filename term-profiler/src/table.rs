//! The tabular data model shared by every backend.
//!
//! [`TabularTable`] wraps a single Arrow [`RecordBatch`]. Arrow already
//! guarantees equal column lengths; the wrapper adds the unique-name
//! invariant and the column helpers the metrics are written against.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, UInt32Array};
use arrow::compute::{cast, concat_batches, filter_record_batch, take, take_record_batch};
use arrow::datatypes::{DataType, Field, Float64Type, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use arrow::row::{Row, RowConverter, Rows, SortField};

use crate::error::{ProfilerError, Result};
use crate::stats::round_to;

/// An immutable, ordered set of uniquely named columns of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularTable {
    batch: RecordBatch,
}

impl TabularTable {
    /// Wraps a record batch, rejecting duplicate column names.
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut seen = HashSet::new();
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(ProfilerError::configuration(format!(
                    "duplicate column name '{}'",
                    field.name()
                )));
            }
        }
        Ok(Self { batch })
    }

    /// Creates a table with no columns and no rows.
    pub fn empty() -> Self {
        Self::with_row_count(Vec::new(), Vec::new(), 0)
            .unwrap_or_else(|_| Self {
                batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
            })
    }

    fn with_row_count(fields: Vec<Field>, arrays: Vec<ArrayRef>, rows: usize) -> Result<Self> {
        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
        Self::try_new(batch)
    }

    /// Builds a table from named arrays. Every field is nullable.
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, ArrayRef)>) -> Result<Self> {
        let rows = columns.first().map(|(_, array)| array.len()).unwrap_or(0);
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
            .into_iter()
            .map(|(name, array)| (Field::new(name, array.data_type().clone(), true), array))
            .unzip();
        Self::with_row_count(fields, arrays, rows)
    }

    /// Concatenates collected query batches into one table.
    ///
    /// `schema` is only used when no batch was produced.
    pub fn from_batches(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches.first().map(|b| b.schema()).unwrap_or(schema);
        let batch = concat_batches(&schema, &batches)?;
        Self::try_new(batch)
    }

    /// Returns the underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the table, returning the record batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| ProfilerError::column_not_found(name))
    }

    /// Returns a column's values rendered as text. Nulls stay `None`.
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<String>>> {
        text_values(self.column(name)?)
    }

    /// Returns a numeric column's values as `f64`. Nulls and NaN become `None`.
    pub fn float_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        float_values(self.column(name)?)
    }

    /// Gathers the given rows of one column.
    pub fn take_column(&self, name: &str, indices: &[u32]) -> Result<ArrayRef> {
        let indices = UInt32Array::from(indices.to_vec());
        Ok(take(self.column(name)?.as_ref(), &indices, None)?)
    }

    /// Gathers the given rows of every column.
    pub fn take_rows(&self, indices: &[u32]) -> Result<Self> {
        let indices = UInt32Array::from(indices.to_vec());
        Self::try_new(take_record_batch(&self.batch, &indices)?)
    }

    /// Keeps the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &BooleanArray) -> Result<Self> {
        Self::try_new(filter_record_batch(&self.batch, mask)?)
    }

    /// Returns a table with the named column removed. Missing names are ignored.
    pub fn without_column(&self, name: &str) -> Result<Self> {
        let schema = self.batch.schema();
        let keep: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.name() != name)
            .map(|(i, _)| i)
            .collect();
        Self::try_new(self.batch.project(&keep)?)
    }

    /// Returns a table whose floating point columns are rounded to `decimals`.
    pub fn round_floats(&self, decimals: u32) -> Result<Self> {
        let schema = self.batch.schema();
        let columns = schema
            .fields()
            .iter()
            .zip(self.batch.columns())
            .map(|(field, array)| {
                let rounded: ArrayRef = match field.data_type() {
                    DataType::Float64 | DataType::Float32 | DataType::Float16 => {
                        let floats = cast(array, &DataType::Float64)?;
                        Arc::new(
                            floats
                                .as_primitive::<Float64Type>()
                                .iter()
                                .map(|v| v.map(|x| round_to(x, decimals)))
                                .collect::<Float64Array>(),
                        )
                    }
                    _ => array.clone(),
                };
                Ok((field.name().clone(), rounded))
            })
            .collect::<Result<Vec<_>>>()?;
        let rows = self.num_rows();
        let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns
            .into_iter()
            .map(|(name, array)| (Field::new(name, array.data_type().clone(), true), array))
            .unzip();
        Self::with_row_count(fields, arrays, rows)
    }

    /// Number of rows whose full value tuple already appeared in an earlier row.
    pub fn duplicate_row_count(&self) -> Result<u64> {
        if self.num_columns() == 0 || self.num_rows() == 0 {
            return Ok(0);
        }
        let rows = encode_rows(self.batch.columns())?;
        let mut seen: HashSet<Row<'_>> = HashSet::with_capacity(rows.num_rows());
        Ok(rows.iter().filter(|row| !seen.insert(*row)).count() as u64)
    }

    /// Serializes the table as a JSON array of row objects. Null cells are omitted.
    pub fn to_json_records(&self) -> Result<String> {
        let mut writer = arrow::json::ArrayWriter::new(Vec::new());
        writer.write(&self.batch)?;
        writer.finish()?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| ProfilerError::Serialization(e.to_string()))
    }
}

impl TryFrom<RecordBatch> for TabularTable {
    type Error = ProfilerError;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        Self::try_new(batch)
    }
}

/// Returns true for the string-like Arrow types.
pub fn is_text_type(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

/// Returns true when the cell at `index` is logically null.
pub(crate) fn is_null_at(array: &dyn Array, index: usize) -> bool {
    array
        .logical_nulls()
        .map(|nulls| nulls.is_null(index))
        .unwrap_or(false)
}

pub(crate) fn text_values(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    let utf8 = cast(array, &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

pub(crate) fn float_values(array: &ArrayRef) -> Result<Vec<Option<f64>>> {
    if !array.data_type().is_numeric() {
        return Err(ProfilerError::TypeMismatch {
            expected: "numeric column".to_string(),
            found: array.data_type().to_string(),
        });
    }
    let floats = cast(array, &DataType::Float64)?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Encodes arrays into comparable, hashable rows.
pub(crate) fn encode_rows(arrays: &[ArrayRef]) -> Result<Rows> {
    let fields = arrays
        .iter()
        .map(|a| SortField::new(a.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    Ok(converter.convert_columns(arrays)?)
}

/// Number of distinct non-null values in a column.
pub(crate) fn distinct_count(array: &ArrayRef) -> Result<u64> {
    if array.is_empty() {
        return Ok(0);
    }
    let rows = encode_rows(std::slice::from_ref(array))?;
    let mut seen: HashSet<Row<'_>> = HashSet::new();
    for (index, row) in rows.iter().enumerate() {
        if !is_null_at(array.as_ref(), index) {
            seen.insert(row);
        }
    }
    Ok(seen.len() as u64)
}
