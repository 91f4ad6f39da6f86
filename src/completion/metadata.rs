/*!
 * Database metadata cache
 *
 * Holds the names offered by completion:
 * - database (schema) list
 * - table names per database
 * - column names per table
 */

use super::parseutils::TableRef;
use crate::error::DatabaseError;
use crate::special::{DynCursor, Row};
use std::collections::HashMap;
use tracing::debug;

const SYSTEM_SCHEMAS: &str =
    "'information_schema', 'pg_catalog', 'pg_toast', 'mysql', 'performance_schema', 'sys'";

/// Database metadata cache
#[derive(Debug, Default)]
pub struct DatabaseMetadata {
    pub databases: Vec<String>,
    /// database -> tables
    pub tables: HashMap<String, Vec<String>>,
    /// `database.table` -> columns
    pub columns: HashMap<String, Vec<String>>,
}

fn fetch_all(cursor: &mut DynCursor, sql: &str) -> Result<Vec<Row>, DatabaseError> {
    cursor.execute(sql)?;
    Ok(std::iter::from_fn(|| cursor.fetch_row()).collect())
}

fn table_key(database: &str, table: &str) -> String {
    format!("{database}.{table}")
}

impl DatabaseMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reloads everything from `information_schema`. On error the cache is
    /// left as it was.
    pub fn refresh(&mut self, cursor: &mut DynCursor) -> Result<(), DatabaseError> {
        let databases = fetch_all(
            cursor,
            "SELECT schema_name FROM information_schema.schemata ORDER BY 1",
        )?;
        let tables = fetch_all(
            cursor,
            &format!(
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_schema NOT IN ({SYSTEM_SCHEMAS}) ORDER BY 1, 2"
            ),
        )?;
        let columns = fetch_all(
            cursor,
            &format!(
                "SELECT table_schema, table_name, column_name FROM information_schema.columns \
                 WHERE table_schema NOT IN ({SYSTEM_SCHEMAS}) \
                 ORDER BY table_schema, table_name, ordinal_position"
            ),
        )?;

        self.databases = databases.into_iter().filter_map(|row| row.into_iter().next()).collect();

        self.tables.clear();
        for row in tables {
            if let [database, table, ..] = row.as_slice() {
                self.tables
                    .entry(database.clone())
                    .or_default()
                    .push(table.clone());
            }
        }

        self.columns.clear();
        for row in columns {
            if let [database, table, column, ..] = row.as_slice() {
                self.columns
                    .entry(table_key(database, table))
                    .or_default()
                    .push(column.clone());
            }
        }

        debug!(
            "Metadata refreshed: {} databases, {} tables, {} column lists.",
            self.databases.len(),
            self.tables.values().map(Vec::len).sum::<usize>(),
            self.columns.len()
        );
        Ok(())
    }

    pub fn get_databases(&self) -> &[String] {
        &self.databases
    }

    /// Table names, those of `current_database` first.
    pub fn table_names(&self, current_database: Option<&str>) -> Vec<&str> {
        let mut names: Vec<&str> = current_database
            .and_then(|db| self.tables.get(db))
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();

        let mut others: Vec<&str> = self
            .tables
            .iter()
            .filter(|(db, _)| Some(db.as_str()) != current_database)
            .flat_map(|(_, tables)| tables.iter().map(String::as_str))
            .collect();
        others.sort_unstable();
        names.extend(others);
        names
    }

    fn columns_of(&self, table: &TableRef, current_database: Option<&str>) -> Vec<&str> {
        let qualified = table
            .schema
            .as_deref()
            .or(current_database)
            .and_then(|db| self.columns.get(&table_key(db, &table.name)));

        match qualified {
            Some(columns) => columns.iter().map(String::as_str).collect(),
            None => {
                let suffix = format!(".{}", table.name);
                self.columns
                    .iter()
                    .filter(|(key, _)| key.ends_with(&suffix))
                    .flat_map(|(_, columns)| columns.iter().map(String::as_str))
                    .collect()
            }
        }
    }

    /// Columns of the tables in scope, or of every known table when the
    /// scope is empty.
    pub fn columns_for(&self, tables: &[TableRef], current_database: Option<&str>) -> Vec<&str> {
        if tables.is_empty() {
            return self
                .columns
                .values()
                .flatten()
                .map(String::as_str)
                .collect();
        }
        tables
            .iter()
            .flat_map(|table| self.columns_of(table, current_database))
            .collect()
    }
}
