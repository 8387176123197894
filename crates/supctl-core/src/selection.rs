//! Column selection
//!
//! Selections are derived per table from its current headers and never cached.

use crate::error::{ScanError, ScanResult};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};

/// Column selection rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    /// Accepted names for the time column; first header in file order that
    /// matches one of these wins
    #[serde(default)]
    pub time: Vec<String>,

    /// Columns excluded from the upper-limit check
    #[serde(default)]
    pub upper_skip: Vec<String>,

    /// Columns included in the lower-limit check
    #[serde(default)]
    pub lower_include: Vec<String>,
}

impl ColumnSelection {
    /// Every column not on the upper-limit exclusion list
    pub fn upper_columns<'t>(&self, table: &'t Table) -> Vec<&'t Column> {
        table
            .columns()
            .iter()
            .filter(|c| !self.upper_skip.contains(&c.name))
            .collect()
    }

    /// Only the columns on the lower-limit inclusion list, in file order
    pub fn lower_columns<'t>(&self, table: &'t Table) -> Vec<&'t Column> {
        table
            .columns()
            .iter()
            .filter(|c| self.lower_include.contains(&c.name))
            .collect()
    }

    /// The time column
    pub fn time_column<'t>(&self, table: &'t Table) -> ScanResult<&'t Column> {
        table
            .columns()
            .iter()
            .find(|c| self.time.contains(&c.name))
            .ok_or_else(|| ScanError::MissingTimeColumn {
                candidates: self.time.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[&Column]) -> Vec<String> {
        columns.iter().map(|c| c.name.clone()).collect()
    }

    fn selection() -> ColumnSelection {
        ColumnSelection {
            time: vec!["Time".to_string(), "time".to_string()],
            upper_skip: vec!["time".to_string(), "Flow".to_string()],
            lower_include: vec!["TC-02".to_string(), "TC-01".to_string()],
        }
    }

    #[test]
    fn selections_follow_headers() {
        let table =
            Table::from_reader("time,TC-01,Flow,TC-02\n0,1,2,3\n".as_bytes()).unwrap();
        let sel = selection();

        assert_eq!(names(&sel.upper_columns(&table)), vec!["TC-01", "TC-02"]);
        // file order, not configuration order
        assert_eq!(names(&sel.lower_columns(&table)), vec!["TC-01", "TC-02"]);
        assert_eq!(sel.time_column(&table).unwrap().name, "time");
    }

    #[test]
    fn missing_time_column_is_an_error() {
        let table = Table::from_reader("stamp,TC-01\n0,1\n".as_bytes()).unwrap();
        let err = selection().time_column(&table).unwrap_err();
        assert!(matches!(err, ScanError::MissingTimeColumn { .. }));
    }

    #[test]
    fn empty_rules_select_nothing_for_lower() {
        let table = Table::from_reader("a,b\n1,2\n".as_bytes()).unwrap();
        let sel = ColumnSelection::default();
        assert_eq!(sel.upper_columns(&table).len(), 2);
        assert!(sel.lower_columns(&table).is_empty());
    }
}
