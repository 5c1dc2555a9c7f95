//! Lightweight columnar values. No Arrow here; `mtgdata-io` converts a
//! dataset into Arrow arrays when a dataframe is requested.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    I32(i32),
    F32(f32),
    Str(String),
    List(Vec<Scalar>),
    /// Values of a nested record, in sub-schema order.
    Struct(Vec<Scalar>),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value can be stored in a column of type `dt`.
    pub fn conforms_to(&self, dt: &DataType) -> bool {
        match (self, dt) {
            (Scalar::Null, _) => true,
            (Scalar::I32(_), DataType::Int32) => true,
            (Scalar::F32(_), DataType::Float32) => true,
            (Scalar::Str(_), DataType::Utf8) => true,
            (Scalar::List(items), DataType::List(inner)) => {
                items.iter().all(|v| v.conforms_to(inner))
            }
            (Scalar::Struct(values), DataType::Struct(fields)) => {
                values.len() == fields.len()
                    && values
                        .iter()
                        .zip(fields)
                        .all(|(v, f)| v.conforms_to(&f.data_type))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row batch stored one contiguous `Vec` per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    pub fn with_columns<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            columns: names.into_iter().map(Column::new).collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append one row; `row` must have one value per column.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "row has {} values but batch has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.values.push(value);
        }
        Ok(())
    }

    /// Values of row `idx` in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<Scalar>> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[idx].clone()).collect())
    }

    /// New batch holding the rows at `indices`, in that order.
    pub fn take(&self, indices: &[usize]) -> Result<RowBatch> {
        let n = self.num_rows();
        if let Some(bad) = indices.iter().find(|&&i| i >= n) {
            return Err(Error::Schema(format!(
                "row index {bad} out of bounds for batch of {n} rows"
            )));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Ok(RowBatch { columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> RowBatch {
        let mut b = RowBatch::with_columns(["name", "mana_value"]);
        b.push_row(vec![Scalar::Str("Opt".into()), Scalar::I32(1)])
            .unwrap();
        b.push_row(vec![Scalar::Str("Shock".into()), Scalar::Null])
            .unwrap();
        b.push_row(vec![Scalar::Str("Divination".into()), Scalar::I32(3)])
            .unwrap();
        b
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut b = batch();
        assert!(b.push_row(vec![Scalar::Null]).is_err());
        assert_eq!(b.num_rows(), 3);
    }

    #[test]
    fn test_take_reorders_and_filters() {
        let b = batch().take(&[2, 0]).unwrap();
        assert_eq!(b.num_rows(), 2);
        assert_eq!(b.columns[0].values[0], Scalar::Str("Divination".into()));
        assert_eq!(b.columns[1].values[1], Scalar::I32(1));
        assert!(batch().take(&[3]).is_err());
    }

    #[test]
    fn test_row_and_column_lookup() {
        let b = batch();
        assert_eq!(
            b.row(1),
            Some(vec![Scalar::Str("Shock".into()), Scalar::Null])
        );
        assert_eq!(b.row(3), None);
        assert_eq!(b.column("mana_value").map(|c| c.len()), Some(3));
    }

    #[test]
    fn test_conforms_to_nested() {
        let list = Scalar::List(vec![Scalar::Str("Creature".into())]);
        assert!(list.conforms_to(&DataType::list(DataType::Utf8)));
        assert!(!list.conforms_to(&DataType::list(DataType::Int32)));
        assert!(Scalar::Null.conforms_to(&DataType::Float32));
        assert!(!Scalar::I32(1).conforms_to(&DataType::Float32));
    }
}
