//! Result sentinel returned by every retrieval operation.

use super::table::Table;

/// Outcome of one retrieval.
///
/// `Data` always holds at least one row. A failed call and a call that found
/// nothing both collapse into `Empty`; callers cannot tell them apart, and
/// the log line emitted by the operation is the only diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieved {
    Data(Table),
    Empty,
}

impl Retrieved {
    pub fn is_empty(&self) -> bool {
        matches!(self, Retrieved::Empty)
    }

    /// Row count (zero for the sentinel).
    pub fn len(&self) -> usize {
        match self {
            Retrieved::Data(t) => t.len(),
            Retrieved::Empty => 0,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match self {
            Retrieved::Data(t) => Some(t),
            Retrieved::Empty => None,
        }
    }

    /// The rows, or a column-less empty table for the sentinel.
    pub fn into_table(self) -> Table {
        match self {
            Retrieved::Data(t) => t,
            Retrieved::Empty => Table::default(),
        }
    }

    /// Transform the data, folding a now-empty table back into the sentinel.
    pub fn map(self, f: impl FnOnce(Table) -> Table) -> Retrieved {
        match self {
            Retrieved::Data(t) => Retrieved::from(f(t)),
            Retrieved::Empty => Retrieved::Empty,
        }
    }
}

impl From<Table> for Retrieved {
    fn from(table: Table) -> Self {
        if table.is_empty() {
            Retrieved::Empty
        } else {
            Retrieved::Data(table)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Value;

    #[test]
    fn zero_row_table_is_the_sentinel() {
        let t = Table::new(["日期", "收盘"]);
        assert_eq!(Retrieved::from(t), Retrieved::Empty);
    }

    #[test]
    fn map_refolds_empty_results() {
        let mut t = Table::new(["名称"]);
        t.push_row(vec![Value::from("平安银行")]).unwrap();
        let r = Retrieved::from(t);
        assert_eq!(r.len(), 1);

        let filtered = r.map(|t| t.filter_rows(|_| false));
        assert!(filtered.is_empty());
        assert!(filtered.into_table().columns().is_empty());
    }
}
