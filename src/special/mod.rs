/*!
 * Special (backslash) commands
 *
 * Recognizes meta-commands introduced by a leading `\`, resolves them through
 * a four-table registry and runs either a handler or a literal SQL template.
 */

pub mod builtins;
pub mod dbcommands;
pub mod iocommands;
#[cfg(test)]
pub(crate) mod mock;
pub mod namedqueries;
pub mod registry;

use crate::error::{self, DatabaseError};
use std::fmt;

pub use builtins::{register_builtins, ShellContext};
pub use iocommands::ShellSettings;
pub use namedqueries::{MemoryNamedQueries, NamedQueryStore};
pub use registry::{
    parse, Handler, Invocation, ParsedInput, Registry, Resolved, SpecialCommand, TableKind,
};

/// One row, every value already rendered as text.
pub type Row = Vec<String>;

/// A database cursor as consumed by the dispatcher.
pub trait Cursor {
    /// Run one statement, replacing any previous result.
    fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Column names of the last result, `None` when it produced no result set.
    fn description(&self) -> Option<&[String]>;

    /// Status message of the last statement.
    fn status_message(&self) -> &str;

    /// Next pending row of the last result.
    fn fetch_row(&mut self) -> Option<Row>;
}

/// Cursor trait object handed to handlers.
pub type DynCursor = dyn Cursor;

/// Row source of a result set.
pub enum Rows<'c> {
    /// Rows still pending on the cursor that produced them.
    Cursor(&'c mut DynCursor),
    /// Rows built in memory.
    Buffered(Vec<Row>),
}

impl<'c> Rows<'c> {
    /// Drains the row source.
    pub fn into_vec(self) -> Vec<Row> {
        match self {
            Rows::Cursor(cursor) => std::iter::from_fn(|| cursor.fetch_row()).collect(),
            Rows::Buffered(rows) => rows,
        }
    }
}

impl fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rows::Cursor(_) => f.write_str("Rows::Cursor(..)"),
            Rows::Buffered(rows) => f.debug_tuple("Rows::Buffered").field(rows).finish(),
        }
    }
}

/// `(title, rows, headers, status)` as returned by every command.
#[derive(Debug)]
pub struct ResultSet<'c> {
    pub title: Option<String>,
    pub rows: Option<Rows<'c>>,
    pub headers: Option<Vec<String>>,
    pub status: Option<String>,
}

impl<'c> ResultSet<'c> {
    /// A result carrying only a status message.
    pub fn message(status: impl Into<String>) -> Self {
        Self {
            title: None,
            rows: None,
            headers: None,
            status: Some(status.into()),
        }
    }

    /// A result with in-memory rows.
    pub fn buffered(rows: Vec<Row>, headers: Vec<String>) -> Self {
        Self {
            title: None,
            rows: Some(Rows::Buffered(rows)),
            headers: Some(headers),
            status: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// What every handler returns.
pub type HandlerResult<'c> = error::Result<Vec<ResultSet<'c>>>;

/// Executes `sql` on the cursor and wraps the outcome in a single result set.
///
/// When the cursor reports column metadata the rows are left pending on the
/// cursor; otherwise only the status message is returned.
pub fn run_sql<'c>(cursor: &'c mut DynCursor, sql: &str) -> HandlerResult<'c> {
    cursor.execute(sql)?;
    let status = cursor.status_message().to_string();
    let headers = cursor.description().map(<[String]>::to_vec);

    let result = match headers {
        Some(headers) => ResultSet {
            title: None,
            rows: Some(Rows::Cursor(cursor)),
            headers: Some(headers),
            status: Some(status),
        },
        None => ResultSet::message(status),
    };

    Ok(vec![result])
}
