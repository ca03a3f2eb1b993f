//! Tabular result shared by every retrieval operation.
//!
//! A `Table` is an ordered column list plus rows of cells aligned with it.
//! Columns are stable within one operation (price history always carries the
//! same headers) but differ between operations, so the type is schemaless.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// Upstream gap (`-`, `null`, missing field).
    Null,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

/// Shape violations when building a table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row has {got} cells but the table has {expected} columns")]
    RowWidth { expected: usize, got: usize },
}

/// Ordered rows under a fixed, ordered column set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. The row must have exactly one cell per column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Project onto `names`, in the given order. `None` if any column is missing.
    pub fn select(&self, names: &[&str]) -> Option<Table> {
        let indices = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()?;

        Some(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Keep the rows for which `keep` returns true, preserving order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new(["代码", "名称", "最新价"]);
        t.push_row(vec!["600000".into(), "浦发银行".into(), 7.1.into()])
            .unwrap();
        t.push_row(vec!["600519".into(), "贵州茅台".into(), Value::Null])
            .unwrap();
        t
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut t = Table::new(["a", "b"]);
        let err = t.push_row(vec![Value::Null]).unwrap_err();
        assert_eq!(err, TableError::RowWidth { expected: 2, got: 1 });
        assert!(t.is_empty());
    }

    #[test]
    fn select_reorders_and_requires_all_columns() {
        let t = sample();
        let picked = t.select(&["名称", "代码"]).unwrap();
        assert_eq!(picked.columns(), ["名称", "代码"]);
        assert_eq!(picked.rows()[0][1], Value::from("600000"));
        assert!(t.select(&["名称", "missing"]).is_none());
    }

    #[test]
    fn filter_keeps_order_and_columns() {
        let t = sample();
        let banks = t.filter_rows(|row| row[1].to_string().contains("银行"));
        assert_eq!(banks.len(), 1);
        assert_eq!(banks.columns(), t.columns());
    }

    #[test]
    fn display_formats_cells() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(7.25).to_string(), "7.25");
        assert_eq!(Value::Null.to_string(), "");
        let d = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2023-01-03");
    }

    #[test]
    fn column_lookup() {
        let t = sample();
        let prices = t.column("最新价").unwrap();
        assert_eq!(prices[0].as_number(), Some(7.1));
        assert!(prices[1].is_null());
        assert!(t.column("nope").is_none());
    }
}
