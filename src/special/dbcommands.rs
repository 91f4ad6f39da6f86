/*!
 * Describe/list commands
 *
 * Every command here turns its pattern into an `information_schema` query
 * and runs it through the cursor. Patterns take `*` and `?` globs and an
 * optional `schema.` prefix.
 */

use super::registry::{Invocation, Registry};
use super::{run_sql, DynCursor, HandlerResult};
use crate::error::{self, SpecialError};

/// Schemas hidden when no pattern is given.
const SYSTEM_SCHEMAS: &str =
    "'information_schema', 'pg_catalog', 'pg_toast', 'mysql', 'performance_schema', 'sys'";

/// One `information_schema` view and how to filter it.
struct Catalog {
    view: &'static str,
    columns: &'static str,
    verbose_columns: &'static str,
    schema_column: Option<&'static str>,
    name_column: &'static str,
    filter: Option<&'static str>,
    order_by: &'static str,
}

const RELATIONS: Catalog = Catalog {
    view: "information_schema.tables",
    columns: "table_schema, table_name, table_type",
    verbose_columns: "*",
    schema_column: Some("table_schema"),
    name_column: "table_name",
    filter: None,
    order_by: "1, 2",
};

const COLUMNS: Catalog = Catalog {
    view: "information_schema.columns",
    columns: "table_schema, table_name, column_name, data_type, is_nullable, column_default",
    verbose_columns: "*",
    schema_column: Some("table_schema"),
    name_column: "table_name",
    filter: None,
    order_by: "table_schema, table_name, ordinal_position",
};

const SCHEMAS: Catalog = Catalog {
    view: "information_schema.schemata",
    columns: "schema_name",
    verbose_columns: "*",
    schema_column: Some("schema_name"),
    name_column: "schema_name",
    filter: None,
    order_by: "1",
};

const ROLES: Catalog = Catalog {
    view: "information_schema.enabled_roles",
    columns: "role_name",
    verbose_columns: "*",
    schema_column: None,
    name_column: "role_name",
    filter: None,
    order_by: "1",
};

const TABLES: Catalog = Catalog {
    view: "information_schema.tables",
    columns: "table_schema, table_name",
    verbose_columns: "*",
    schema_column: Some("table_schema"),
    name_column: "table_name",
    filter: Some("table_type = 'BASE TABLE'"),
    order_by: "1, 2",
};

const INDEXES: Catalog = Catalog {
    view: "information_schema.statistics",
    columns: "table_schema, table_name, index_name, column_name",
    verbose_columns: "*",
    schema_column: Some("table_schema"),
    name_column: "index_name",
    filter: None,
    order_by: "1, 2, 3",
};

const VIEWS: Catalog = Catalog {
    view: "information_schema.views",
    columns: "table_schema, table_name",
    verbose_columns: "*",
    schema_column: Some("table_schema"),
    name_column: "table_name",
    filter: None,
    order_by: "1, 2",
};

const SEQUENCES: Catalog = Catalog {
    view: "information_schema.sequences",
    columns: "sequence_schema, sequence_name",
    verbose_columns: "*",
    schema_column: Some("sequence_schema"),
    name_column: "sequence_name",
    filter: None,
    order_by: "1, 2",
};

const FUNCTIONS: Catalog = Catalog {
    view: "information_schema.routines",
    columns: "routine_schema, routine_name, routine_type",
    verbose_columns: "*",
    schema_column: Some("routine_schema"),
    name_column: "routine_name",
    filter: None,
    order_by: "1, 2",
};

const DATATYPES: Catalog = Catalog {
    view: "information_schema.columns",
    columns: "DISTINCT data_type",
    verbose_columns: "DISTINCT table_schema, data_type",
    schema_column: Some("table_schema"),
    name_column: "data_type",
    filter: None,
    order_by: "1",
};

impl Catalog {
    fn sql(&self, pattern: &str, verbose: bool) -> String {
        let columns = if verbose {
            self.verbose_columns
        } else {
            self.columns
        };

        let (schema, name) = match self.schema_column {
            Some(_) => split_pattern(pattern),
            None => (None, Some(pattern).filter(|p| !p.is_empty())),
        };

        let mut conditions: Vec<String> = self.filter.iter().map(|f| f.to_string()).collect();
        match (self.schema_column, schema) {
            (Some(column), Some(schema)) => {
                conditions.push(format!("{column} LIKE {}", like_literal(schema)));
            }
            (Some(column), None) if pattern.is_empty() => {
                conditions.push(format!("{column} NOT IN ({SYSTEM_SCHEMAS})"));
            }
            _ => {}
        }
        if let Some(name) = name {
            conditions.push(format!("{} LIKE {}", self.name_column, like_literal(name)));
        }

        let mut sql = format!("SELECT {columns} FROM {}", self.view);
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(self.order_by);
        sql
    }
}

/// `schema.name` into its optional halves.
fn split_pattern(pattern: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(s: &str) -> Option<&str> {
        Some(s.trim()).filter(|s| !s.is_empty())
    }

    match pattern.split_once('.') {
        Some((schema, name)) => (non_empty(schema), non_empty(name)),
        None => (None, non_empty(pattern)),
    }
}

/// Quotes a glob as a SQL `LIKE` literal.
///
/// A backslash is escaped once for the string literal and once more for
/// `LIKE`, so it matches itself.
fn like_literal(glob: &str) -> String {
    let escaped = glob
        .replace('\\', "\\\\\\\\")
        .replace('\'', "''")
        .replace('*', "%")
        .replace('?', "_");
    format!("'{escaped}'")
}

fn expect_cursor<'c, 'q>(
    command: &str,
    invocation: Invocation<'c, 'q>,
) -> error::Result<(&'c mut DynCursor, &'q str, bool)> {
    match invocation {
        Invocation::Wrapped {
            cursor,
            pattern,
            verbose,
        } => Ok((cursor, pattern, verbose)),
        Invocation::Raw { .. } => Err(SpecialError::InvalidInvocation(command.to_string())),
    }
}

fn list<'c>(command: &str, catalog: &Catalog, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    let (cursor, pattern, verbose) = expect_cursor(command, invocation)?;
    run_sql(cursor, &catalog.sql(pattern, verbose))
}

/// `\d [pattern]`: list relations, or describe the columns of matching tables.
pub fn describe_table_details<'c>(
    _registry: &Registry,
    invocation: Invocation<'c, '_>,
) -> HandlerResult<'c> {
    let (cursor, pattern, verbose) = expect_cursor("\\d", invocation)?;
    if pattern.is_empty() {
        return run_sql(cursor, &RELATIONS.sql(pattern, verbose));
    }

    let title = format!("Table \"{pattern}\"");
    let sets = run_sql(cursor, &COLUMNS.sql(pattern, verbose))?;
    Ok(sets
        .into_iter()
        .map(|set| set.with_title(title.clone()))
        .collect())
}

pub fn list_schemas<'c>(_registry: &Registry, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    list("\\dn", &SCHEMAS, invocation)
}

pub fn list_roles<'c>(_registry: &Registry, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    list("\\du", &ROLES, invocation)
}

pub fn list_tables<'c>(_registry: &Registry, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    list("\\dt", &TABLES, invocation)
}

pub fn list_indexes<'c>(_registry: &Registry, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    list("\\di", &INDEXES, invocation)
}

pub fn list_views<'c>(_registry: &Registry, invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    list("\\dv", &VIEWS, invocation)
}

pub fn list_sequences<'c>(
    _registry: &Registry,
    invocation: Invocation<'c, '_>,
) -> HandlerResult<'c> {
    list("\\ds", &SEQUENCES, invocation)
}

pub fn list_functions<'c>(
    _registry: &Registry,
    invocation: Invocation<'c, '_>,
) -> HandlerResult<'c> {
    list("\\df", &FUNCTIONS, invocation)
}

pub fn list_datatypes<'c>(
    _registry: &Registry,
    invocation: Invocation<'c, '_>,
) -> HandlerResult<'c> {
    list("\\dT", &DATATYPES, invocation)
}
