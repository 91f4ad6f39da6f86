//! In-memory cursor for tests.

use super::{Cursor, Row};
use crate::error::DatabaseError;
use std::collections::VecDeque;

/// Records every executed statement and replays one canned result.
#[derive(Debug, Default)]
pub struct MockCursor {
    pub executed: Vec<String>,
    columns: Option<Vec<String>>,
    canned_rows: Vec<Row>,
    pending: VecDeque<Row>,
    status: String,
    failure: Option<String>,
}

impl MockCursor {
    /// Every statement returns these columns and rows.
    pub fn with_rows(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            columns: Some(columns.iter().map(|c| c.to_string()).collect()),
            status: format!("SELECT {}", rows.len()),
            canned_rows: rows,
            ..Self::default()
        }
    }

    /// Every statement returns no result set, only `status`.
    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..Self::default()
        }
    }

    /// Every statement fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl Cursor for MockCursor {
    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        self.executed.push(sql.to_string());
        if let Some(message) = &self.failure {
            return Err(DatabaseError::new(message.clone()));
        }
        self.pending = self.canned_rows.iter().cloned().collect();
        Ok(())
    }

    fn description(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn status_message(&self) -> &str {
        &self.status
    }

    fn fetch_row(&mut self) -> Option<Row> {
        self.pending.pop_front()
    }
}
