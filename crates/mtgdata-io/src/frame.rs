//! Dataset → Arrow `RecordBatch` (the dataframe output shape).
//!
//! Every Arrow field is nullable since any cell may be `Scalar::Null`.
//! Lists of scalars and structs of scalars are supported; lists of structs
//! are not (no record type in this workspace declares one).

use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::types::{Float32Type, Int32Type};
use arrow_array::{
    ArrayRef, Float32Array, Int32Array, ListArray, RecordBatch, StringArray, StructArray,
};
use arrow_schema::{DataType as ArrowType, Field as ArrowField, Fields, Schema as ArrowSchema};

use mtgdata_core::dataset::Dataset;
use mtgdata_core::schema::{DataType, Field};
use mtgdata_core::types::Scalar;

use crate::error::{Error, Result};

static NULL: Scalar = Scalar::Null;

pub fn arrow_type(dt: &DataType) -> ArrowType {
    match dt {
        DataType::Int32 => ArrowType::Int32,
        DataType::Float32 => ArrowType::Float32,
        DataType::Utf8 => ArrowType::Utf8,
        DataType::List(inner) => {
            ArrowType::List(Arc::new(ArrowField::new("item", arrow_type(inner), true)))
        }
        DataType::Struct(fields) => ArrowType::Struct(arrow_fields(fields)),
    }
}

fn arrow_fields(fields: &[Field]) -> Fields {
    fields
        .iter()
        .map(|f| ArrowField::new(f.name.clone(), arrow_type(&f.data_type), true))
        .collect()
}

pub fn arrow_schema(dataset: &Dataset) -> ArrowSchema {
    ArrowSchema::new(arrow_fields(&dataset.schema.fields))
}

/// Convert a whole dataset into a single record batch.
pub fn to_record_batch(dataset: &Dataset) -> Result<RecordBatch> {
    dataset.validate()?;
    let columns = dataset
        .schema
        .fields
        .iter()
        .zip(&dataset.batch.columns)
        .map(|(field, column)| {
            let cells: Vec<&Scalar> = column.values.iter().collect();
            build_array(&field.name, &field.data_type, &cells)
        })
        .collect::<Result<Vec<_>>>()?;
    RecordBatch::try_new(Arc::new(arrow_schema(dataset)), columns)
        .map_err(|e| Error::Frame(e.to_string()))
}

fn build_array(name: &str, dt: &DataType, cells: &[&Scalar]) -> Result<ArrayRef> {
    let mismatch = |cell: &Scalar| Error::Frame(format!("column '{name}': {cell:?} is not {dt}"));
    let array: ArrayRef = match dt {
        DataType::Int32 => {
            let values = cells
                .iter()
                .map(|&c| match c {
                    Scalar::Null => Ok(None),
                    Scalar::I32(v) => Ok(Some(*v)),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(Int32Array::from(values))
        }
        DataType::Float32 => {
            let values = cells
                .iter()
                .map(|&c| match c {
                    Scalar::Null => Ok(None),
                    Scalar::F32(v) => Ok(Some(*v)),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(Float32Array::from(values))
        }
        DataType::Utf8 => {
            let values = cells
                .iter()
                .map(|&c| match c {
                    Scalar::Null => Ok(None),
                    Scalar::Str(s) => Ok(Some(s.as_str())),
                    other => Err(mismatch(other)),
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(StringArray::from(values))
        }
        DataType::List(inner) => build_list(name, inner, cells)?,
        DataType::Struct(fields) => {
            let mut children = Vec::with_capacity(fields.len());
            for (i, f) in fields.iter().enumerate() {
                let child_cells = cells
                    .iter()
                    .map(|&c| match c {
                        Scalar::Null => Ok(&NULL),
                        Scalar::Struct(values) => values.get(i).ok_or_else(|| mismatch(c)),
                        other => Err(mismatch(other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                let child = build_array(&f.name, &f.data_type, &child_cells)?;
                let arrow_field = ArrowField::new(f.name.clone(), arrow_type(&f.data_type), true);
                children.push((Arc::new(arrow_field), child));
            }
            Arc::new(StructArray::from(children))
        }
    };
    Ok(array)
}

fn list_items<'a>(cell: &'a Scalar) -> Option<Option<&'a [Scalar]>> {
    match cell {
        Scalar::Null => Some(None),
        Scalar::List(items) => Some(Some(items.as_slice())),
        _ => None,
    }
}

fn build_list(name: &str, inner: &DataType, cells: &[&Scalar]) -> Result<ArrayRef> {
    let bad = |what: &str| Error::Frame(format!("column '{name}': {what}"));
    let rows = cells
        .iter()
        .map(|&c| list_items(c).ok_or_else(|| bad("expected a sequence")))
        .collect::<Result<Vec<_>>>()?;

    let array: ArrayRef = match inner {
        DataType::Utf8 => {
            let mut builder = ListBuilder::new(StringBuilder::new());
            for row in rows {
                match row {
                    None => builder.append(false),
                    Some(items) => {
                        for item in items {
                            match item {
                                Scalar::Str(s) => builder.values().append_value(s),
                                Scalar::Null => builder.values().append_null(),
                                _ => return Err(bad("non-string list item")),
                            }
                        }
                        builder.append(true);
                    }
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Int32 => {
            let data = rows
                .into_iter()
                .map(|row| {
                    row.map(|items| {
                        items
                            .iter()
                            .map(|i| match i {
                                Scalar::I32(v) => Ok(Some(*v)),
                                Scalar::Null => Ok(None),
                                _ => Err(bad("non-int32 list item")),
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                    .transpose()
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(ListArray::from_iter_primitive::<Int32Type, _, _>(data))
        }
        DataType::Float32 => {
            let data = rows
                .into_iter()
                .map(|row| {
                    row.map(|items| {
                        items
                            .iter()
                            .map(|i| match i {
                                Scalar::F32(v) => Ok(Some(*v)),
                                Scalar::Null => Ok(None),
                                _ => Err(bad("non-float32 list item")),
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                    .transpose()
                })
                .collect::<Result<Vec<_>>>()?;
            Arc::new(ListArray::from_iter_primitive::<Float32Type, _, _>(data))
        }
        other => return Err(bad(&format!("sequence<{other}> has no dataframe mapping"))),
    };
    Ok(array)
}
