//! A columnar table paired with the schema it was built from.
//!
//! Rows go in and out through serde: a record is serialized to a JSON
//! object, and each schema field picks its cell from that object. Going the
//! other way, a row is rebuilt as a JSON object (null cells omitted, so the
//! record's serde defaults apply) and deserialized.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::{DataType, Field, Schema};
use crate::types::{Column, RowBatch, Scalar};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub schema: Schema,
    pub batch: RowBatch,
}

impl Dataset {
    pub fn empty(schema: Schema) -> Self {
        let batch = RowBatch::with_columns(schema.fields.iter().map(|f| f.name.as_str()));
        Self { schema, batch }
    }

    /// Build a dataset from a schema and columns, checking that they agree.
    pub fn try_new(schema: Schema, batch: RowBatch) -> Result<Self> {
        let ds = Self { schema, batch };
        ds.validate()?;
        Ok(ds)
    }

    /// Columnar conversion of an ordered stream of records.
    pub fn from_records<'a, T, I>(records: I) -> Result<Self>
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut ds = Self::empty(T::schema()?);
        for record in records {
            ds.push_record(record)?;
        }
        Ok(ds)
    }

    pub fn push_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        let Value::Object(obj) = value else {
            return Err(Error::Conversion(
                "record did not serialize to an object".into(),
            ));
        };
        let row = self
            .schema
            .fields
            .iter()
            .map(|f| json_to_scalar(obj.get(&f.name), f))
            .collect::<Result<Vec<_>>>()?;
        self.batch.push_row(row)
    }

    /// Rebuild every row as a `T`.
    pub fn to_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        (0..self.num_rows()).map(|i| self.record(i)).collect()
    }

    pub fn record<T: DeserializeOwned>(&self, idx: usize) -> Result<T> {
        let row = self.batch.row(idx).ok_or_else(|| {
            Error::Conversion(format!(
                "row {idx} out of bounds for {} rows",
                self.num_rows()
            ))
        })?;
        let mut obj = Map::new();
        for (field, value) in self.schema.fields.iter().zip(row) {
            if !value.is_null() {
                obj.insert(field.name.clone(), scalar_to_json(&value, &field.data_type));
            }
        }
        Ok(serde_json::from_value(Value::Object(obj))?)
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.batch.column(name)
    }

    pub fn row(&self, idx: usize) -> Option<Vec<Scalar>> {
        self.batch.row(idx)
    }

    pub fn take(&self, indices: &[usize]) -> Result<Dataset> {
        Ok(Dataset {
            schema: self.schema.clone(),
            batch: self.batch.take(indices)?,
        })
    }

    /// Check column names/order against the schema and that all columns
    /// have the same length. Cell types are checked only for the first row.
    pub fn validate(&self) -> Result<()> {
        if self.schema.names() != self.column_names() {
            return Err(Error::Schema(format!(
                "columns {:?} do not match schema {:?}",
                self.column_names(),
                self.schema.names()
            )));
        }
        let n = self.num_rows();
        if let Some(bad) = self.batch.columns.iter().find(|c| c.len() != n) {
            return Err(Error::Schema(format!(
                "column '{}' has {} rows, expected {n}",
                bad.name,
                bad.len()
            )));
        }
        if let Some(row) = self.batch.row(0) {
            for (field, value) in self.schema.fields.iter().zip(&row) {
                if !value.conforms_to(&field.data_type) {
                    return Err(Error::Schema(format!(
                        "column '{}' holds {value:?}, expected {}",
                        field.name, field.data_type
                    )));
                }
            }
        }
        Ok(())
    }
}

fn json_to_scalar(value: Option<&Value>, field: &Field) -> Result<Scalar> {
    match value {
        None | Some(Value::Null) => Ok(Scalar::Null),
        Some(v) => value_to_scalar(v, &field.data_type).ok_or_else(|| {
            Error::Conversion(format!(
                "field '{}': cannot store {v} as {}",
                field.name, field.data_type
            ))
        }),
    }
}

fn value_to_scalar(v: &Value, dt: &DataType) -> Option<Scalar> {
    match (v, dt) {
        (Value::Null, _) => Some(Scalar::Null),
        (Value::String(s), DataType::Utf8) => Some(Scalar::Str(s.clone())),
        (Value::Number(n), DataType::Int32) => {
            let i = n.as_i64()?;
            i32::try_from(i).ok().map(Scalar::I32)
        }
        (Value::Number(n), DataType::Float32) => n.as_f64().map(|f| Scalar::F32(f as f32)),
        (Value::Array(items), DataType::List(inner)) => items
            .iter()
            .map(|item| value_to_scalar(item, inner))
            .collect::<Option<Vec<_>>>()
            .map(Scalar::List),
        (Value::Object(obj), DataType::Struct(fields)) => fields
            .iter()
            .map(|f| match obj.get(&f.name) {
                None => Some(Scalar::Null),
                Some(item) => value_to_scalar(item, &f.data_type),
            })
            .collect::<Option<Vec<_>>>()
            .map(Scalar::Struct),
        _ => None,
    }
}

fn scalar_to_json(v: &Scalar, dt: &DataType) -> Value {
    match (v, dt) {
        (Scalar::Null, _) => Value::Null,
        (Scalar::I32(i), _) => Value::from(*i),
        (Scalar::F32(f), _) => Value::from(*f as f64),
        (Scalar::Str(s), _) => Value::String(s.clone()),
        (Scalar::List(items), DataType::List(inner)) => {
            Value::Array(items.iter().map(|i| scalar_to_json(i, inner)).collect())
        }
        (Scalar::List(items), _) => Value::Array(
            items
                .iter()
                .map(|i| scalar_to_json(i, &DataType::Utf8))
                .collect(),
        ),
        (Scalar::Struct(values), DataType::Struct(fields)) => {
            let mut obj = Map::new();
            for (f, value) in fields.iter().zip(values) {
                if !value.is_null() {
                    obj.insert(f.name.clone(), scalar_to_json(value, &f.data_type));
                }
            }
            Value::Object(obj)
        }
        (Scalar::Struct(_), _) => Value::Null,
    }
}
