/*!
 * Special command registry
 *
 * Four command tables split along two axes:
 * - visibility: shown in the help listing or hidden
 * - invocation shape: wrapped (called with the parsed pattern and verbose
 *   flag) or raw (called with the whole input line)
 *
 * Lookup walks the tables in a fixed order and the first match wins.
 */

use super::{run_sql, DynCursor, HandlerResult, ResultSet, Row};
use crate::error::SpecialError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Arguments a callable handler is invoked with.
pub enum Invocation<'c, 'q> {
    /// Entry resolved from a standard (wrapped) table.
    Wrapped {
        cursor: &'c mut DynCursor,
        pattern: &'q str,
        verbose: bool,
    },
    /// Entry resolved from a custom (raw) table; `query` is the full input line.
    Raw { query: &'q str },
}

/// Signature shared by every callable handler.
pub type HandlerFn =
    dyn for<'c, 'q> Fn(&'q Registry, Invocation<'c, 'q>) -> HandlerResult<'c> + Send + Sync;

/// What a command does when dispatched.
#[derive(Clone)]
pub enum Handler {
    Callable(Arc<HandlerFn>),
    LiteralSql(String),
}

impl Handler {
    pub fn callable<F>(f: F) -> Self
    where
        F: for<'c, 'q> Fn(&'q Registry, Invocation<'c, 'q>) -> HandlerResult<'c>
            + Send
            + Sync
            + 'static,
    {
        Handler::Callable(Arc::new(f))
    }

    pub fn literal(sql: impl Into<String>) -> Self {
        Handler::LiteralSql(sql.into())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Callable(_) => f.write_str("Callable(..)"),
            Handler::LiteralSql(sql) => f.debug_tuple("LiteralSql").field(sql).finish(),
        }
    }
}

/// A registered special command.
#[derive(Clone, Debug)]
pub struct SpecialCommand {
    pub name: String,
    pub handler: Handler,
    pub syntax: String,
    pub description: String,
}

/// The four command tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    StandardVisible,
    StandardHidden,
    CustomVisible,
    CustomHidden,
}

impl TableKind {
    /// Lookup order used by [`Registry::resolve`].
    pub const PRECEDENCE: [TableKind; 4] = [
        TableKind::StandardVisible,
        TableKind::StandardHidden,
        TableKind::CustomVisible,
        TableKind::CustomHidden,
    ];

    pub fn from_flags(hidden: bool, raw: bool) -> Self {
        match (hidden, raw) {
            (false, false) => TableKind::StandardVisible,
            (true, false) => TableKind::StandardHidden,
            (false, true) => TableKind::CustomVisible,
            (true, true) => TableKind::CustomHidden,
        }
    }

    /// Wrapped tables call handlers with the parsed pattern and verbose flag.
    pub fn is_wrapped(self) -> bool {
        matches!(self, TableKind::StandardVisible | TableKind::StandardHidden)
    }

    pub fn is_visible(self) -> bool {
        matches!(self, TableKind::StandardVisible | TableKind::CustomVisible)
    }

    /// Only the standard-hidden table is case-insensitive.
    fn lookup_key(self, command: &str) -> Cow<'_, str> {
        match self {
            TableKind::StandardHidden => Cow::Owned(command.to_lowercase()),
            _ => Cow::Borrowed(command),
        }
    }
}

/// One raw input line split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedInput {
    /// Head token with every `+` removed, sigil preserved.
    pub command: String,
    /// A `+` appeared in the head token.
    pub verbose: bool,
    /// Trimmed remainder after the head token.
    pub argument: String,
}

/// Splits an input line on its first whitespace boundary.
pub fn parse(input: &str) -> ParsedInput {
    let (head, rest) = input
        .split_once(char::is_whitespace)
        .unwrap_or((input, ""));

    ParsedInput {
        command: head.replace('+', "").trim().to_string(),
        verbose: head.contains('+'),
        argument: rest.trim().to_string(),
    }
}

/// A successful lookup, with the table the entry came from.
#[derive(Clone, Copy, Debug)]
pub struct Resolved<'r> {
    pub table: TableKind,
    pub command: &'r SpecialCommand,
}

type CommandTable = HashMap<String, SpecialCommand>;

/// Owns the four command tables.
#[derive(Debug, Default)]
pub struct Registry {
    standard: CommandTable,
    standard_hidden: CommandTable,
    custom: CommandTable,
    custom_hidden: CommandTable,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: TableKind) -> &CommandTable {
        match kind {
            TableKind::StandardVisible => &self.standard,
            TableKind::StandardHidden => &self.standard_hidden,
            TableKind::CustomVisible => &self.custom,
            TableKind::CustomHidden => &self.custom_hidden,
        }
    }

    fn table_mut(&mut self, kind: TableKind) -> &mut CommandTable {
        match kind {
            TableKind::StandardVisible => &mut self.standard,
            TableKind::StandardHidden => &mut self.standard_hidden,
            TableKind::CustomVisible => &mut self.custom,
            TableKind::CustomHidden => &mut self.custom_hidden,
        }
    }

    /// Inserts or overwrites `name` in the table selected by `(hidden, raw)`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Handler,
        syntax: &str,
        description: &str,
        hidden: bool,
        raw: bool,
    ) {
        let name = name.into();
        let table = self.table_mut(TableKind::from_flags(hidden, raw));

        if table.contains_key(&name) {
            info!("Overriding existing special command {:?}.", name);
        } else {
            debug!("Registering special command {:?}.", name);
        }

        table.insert(
            name.clone(),
            SpecialCommand {
                name,
                handler,
                syntax: syntax.to_string(),
                description: description.to_string(),
            },
        );
    }

    /// Finds `command` in the first table of [`TableKind::PRECEDENCE`] that has it.
    pub fn resolve(&self, command: &str) -> Option<Resolved<'_>> {
        TableKind::PRECEDENCE.into_iter().find_map(|kind| {
            self.table(kind)
                .get(&*kind.lookup_key(command))
                .map(|entry| Resolved {
                    table: kind,
                    command: entry,
                })
        })
    }

    /// Entries of one table, in no particular order.
    pub fn commands(&self, kind: TableKind) -> impl Iterator<Item = &SpecialCommand> {
        self.table(kind).values()
    }

    /// Parses `line`, resolves its command and runs it.
    pub fn execute<'c>(&self, cursor: &'c mut DynCursor, line: &str) -> HandlerResult<'c> {
        let parsed = parse(line);
        let resolved = self
            .resolve(&parsed.command)
            .ok_or_else(|| SpecialError::NotFound(parsed.command.clone()))?;

        debug!(
            "Dispatching {} from {:?} (verbose: {})",
            parsed.command, resolved.table, parsed.verbose
        );

        match &resolved.command.handler {
            Handler::Callable(handler) => {
                let invocation = if resolved.table.is_wrapped() {
                    Invocation::Wrapped {
                        cursor,
                        pattern: &parsed.argument,
                        verbose: parsed.verbose,
                    }
                } else {
                    Invocation::Raw { query: line }
                };
                handler(self, invocation)
            }
            Handler::LiteralSql(sql) => run_sql(cursor, sql),
        }
    }

    /// Rows of the help listing: visible commands sorted by name.
    pub fn help_rows(&self) -> Vec<Row> {
        let mut visible: Vec<&SpecialCommand> = TableKind::PRECEDENCE
            .into_iter()
            .filter(|kind| kind.is_visible())
            .flat_map(|kind| self.table(kind).values())
            .collect();
        visible.sort_by(|a, b| a.name.cmp(&b.name));

        visible
            .into_iter()
            .filter(|command| !(command.syntax.is_empty() && command.description.is_empty()))
            .map(|command| vec![command.syntax.clone(), command.description.clone()])
            .collect()
    }

    /// The help listing as a result set.
    pub fn help<'c>(&self) -> ResultSet<'c> {
        ResultSet::buffered(
            self.help_rows(),
            vec!["Command".to_string(), "Description".to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockCursor;
    use super::super::Rows;
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(f: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn status_handler(status: &'static str) -> Handler {
        Handler::callable(move |_, _| Ok(vec![ResultSet::message(status)]))
    }

    fn status_of(result: HandlerResult<'_>) -> String {
        let sets = result.unwrap();
        sets[0].status.clone().unwrap_or_default()
    }

    #[test]
    fn test_parse_verbose_command() {
        assert_eq!(
            parse("\\dt+ foo"),
            ParsedInput {
                command: "\\dt".to_string(),
                verbose: true,
                argument: "foo".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_plus_anywhere_in_head() {
        let parsed = parse("\\d+t");
        assert_eq!(parsed.command, "\\dt");
        assert!(parsed.verbose);
        assert_eq!(parsed.argument, "");
    }

    #[test]
    fn test_parse_keeps_remainder_intact() {
        let parsed = parse("\\ns top  SELECT * FROM t  ");
        assert_eq!(parsed.command, "\\ns");
        assert!(!parsed.verbose);
        assert_eq!(parsed.argument, "top  SELECT * FROM t");
    }

    #[test]
    fn test_parse_plus_in_argument_is_not_verbose() {
        let parsed = parse("\\n a+b");
        assert_eq!(parsed.command, "\\n");
        assert!(!parsed.verbose);
        assert_eq!(parsed.argument, "a+b");
    }

    #[test]
    fn test_table_kind_from_flags() {
        assert_eq!(TableKind::from_flags(false, false), TableKind::StandardVisible);
        assert_eq!(TableKind::from_flags(true, false), TableKind::StandardHidden);
        assert_eq!(TableKind::from_flags(false, true), TableKind::CustomVisible);
        assert_eq!(TableKind::from_flags(true, true), TableKind::CustomHidden);
    }

    #[test]
    fn test_resolve_precedence_across_tables() {
        let mut registry = Registry::new();
        registry.register("\\q", status_handler("custom-hidden"), "", "", true, true);
        registry.register("\\q", status_handler("custom"), "", "", false, true);
        registry.register("\\q", status_handler("standard-hidden"), "", "", true, false);

        assert_eq!(
            registry.resolve("\\q").map(|r| r.table),
            Some(TableKind::StandardHidden)
        );

        registry.register("\\q", status_handler("standard"), "", "", false, false);
        assert_eq!(
            registry.resolve("\\q").map(|r| r.table),
            Some(TableKind::StandardVisible)
        );

        let mut cursor = MockCursor::default();
        assert_eq!(status_of(registry.execute(&mut cursor, "\\q")), "standard");
    }

    #[test]
    fn test_resolve_custom_before_custom_hidden() {
        let mut registry = Registry::new();
        registry.register("\\w", status_handler("custom-hidden"), "", "", true, true);
        assert_eq!(
            registry.resolve("\\w").map(|r| r.table),
            Some(TableKind::CustomHidden)
        );

        registry.register("\\w", status_handler("custom"), "", "", false, true);
        assert_eq!(
            registry.resolve("\\w").map(|r| r.table),
            Some(TableKind::CustomVisible)
        );
    }

    #[test]
    fn test_standard_hidden_lookup_is_case_insensitive() {
        let mut registry = Registry::new();
        registry.register("describe", status_handler("described"), "", "", true, false);
        registry.register("\\raw", status_handler("raw"), "", "", false, true);

        assert!(registry.resolve("DESCRIBE").is_some());
        assert!(registry.resolve("Describe").is_some());
        assert!(registry.resolve("\\RAW").is_none());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = Registry::new();
        registry.register("\\dt", status_handler("tables"), "\\dt", "List tables.", false, false);

        let first = registry.resolve("\\dt").unwrap();
        let second = registry.resolve("\\dt").unwrap();
        assert_eq!(first.table, second.table);
        assert!(std::ptr::eq(first.command, second.command));
        assert!(registry.resolve("\\zz").is_none());
        assert!(registry.resolve("\\zz").is_none());
    }

    #[test]
    fn test_register_override_replaces_and_logs_info() {
        let mut registry = Registry::new();

        let first = capture_logs(|| {
            registry.register("\\dt", status_handler("first"), "\\dt", "List tables.", false, false)
        });
        assert!(first.contains("DEBUG"));
        assert!(first.contains("Registering special command"));

        let second = capture_logs(|| {
            registry.register("\\dt", status_handler("second"), "\\dt", "List tables.", false, false)
        });
        assert!(second.contains("INFO"));
        assert!(second.contains("Overriding existing special command"));
        assert!(!second.contains("Registering special command"));

        assert_eq!(registry.commands(TableKind::StandardVisible).count(), 1);
        let mut cursor = MockCursor::default();
        assert_eq!(status_of(registry.execute(&mut cursor, "\\dt")), "second");
    }

    #[test]
    fn test_execute_unknown_command_does_no_io() {
        let registry = Registry::new();
        let mut cursor = MockCursor::with_status("SELECT 1");

        let err = registry.execute(&mut cursor, "\\zz").unwrap_err();
        assert!(matches!(err, SpecialError::NotFound(ref name) if name == "\\zz"));
        assert!(cursor.executed.is_empty());
    }

    #[test]
    fn test_execute_wrapped_receives_parsed_pattern() {
        let mut registry = Registry::new();
        registry.register(
            "\\dt",
            Handler::callable(|_, invocation| match invocation {
                Invocation::Wrapped { pattern, verbose, .. } => {
                    Ok(vec![ResultSet::message(format!("{pattern}|{verbose}"))])
                }
                Invocation::Raw { .. } => Ok(vec![ResultSet::message("raw")]),
            }),
            "\\dt[+] [pattern]",
            "List tables.",
            false,
            false,
        );

        let mut cursor = MockCursor::default();
        assert_eq!(status_of(registry.execute(&mut cursor, "\\dt+ foo*")), "foo*|true");
    }

    #[test]
    fn test_execute_raw_receives_full_line() {
        let mut registry = Registry::new();
        registry.register(
            "\\echo",
            Handler::callable(|_, invocation| match invocation {
                Invocation::Raw { query } => Ok(vec![ResultSet::message(query.to_string())]),
                Invocation::Wrapped { .. } => Ok(vec![ResultSet::message("wrapped")]),
            }),
            "\\echo [text]",
            "Echo the input line.",
            false,
            true,
        );

        let mut cursor = MockCursor::default();
        assert_eq!(
            status_of(registry.execute(&mut cursor, "\\echo+  hello world")),
            "\\echo+  hello world"
        );
    }

    #[test]
    fn test_execute_hidden_wrapped_with_uppercase_name() {
        let mut registry = Registry::new();
        registry.register(
            "describe",
            Handler::callable(|_, invocation| match invocation {
                Invocation::Wrapped { pattern, .. } => {
                    Ok(vec![ResultSet::message(pattern.to_string())])
                }
                Invocation::Raw { .. } => Ok(vec![ResultSet::message("raw")]),
            }),
            "DESCRIBE [pattern]",
            "",
            true,
            false,
        );

        let mut cursor = MockCursor::default();
        assert_eq!(status_of(registry.execute(&mut cursor, "DESCRIBE users")), "users");
    }

    #[test]
    fn test_execute_handler_failure_propagates() {
        let mut registry = Registry::new();
        registry.register(
            "\\z",
            Handler::callable(|_, _| Err(SpecialError::NotImplemented("\\z".to_string()))),
            "\\z [pattern]",
            "Not yet implemented.",
            false,
            false,
        );

        let mut cursor = MockCursor::default();
        let err = registry.execute(&mut cursor, "\\z").unwrap_err();
        assert!(matches!(err, SpecialError::NotImplemented(_)));
    }

    #[test]
    fn test_execute_literal_sql_without_columns() {
        let mut registry = Registry::new();
        registry.register(
            "\\vac",
            Handler::literal("VACUUM;"),
            "\\vac",
            "Vacuum.",
            false,
            false,
        );

        let mut cursor = MockCursor::with_status("VACUUM");
        let sets = registry.execute(&mut cursor, "\\vac").unwrap();
        assert_eq!(sets.len(), 1);
        assert!(sets[0].rows.is_none());
        assert!(sets[0].headers.is_none());
        assert_eq!(sets[0].status.as_deref(), Some("VACUUM"));
        drop(sets);
        assert_eq!(cursor.executed, vec!["VACUUM;".to_string()]);
    }

    #[test]
    fn test_execute_literal_sql_with_columns() {
        let mut registry = Registry::new();
        registry.register(
            "\\l",
            Handler::literal("SELECT datname FROM pg_database;"),
            "\\l",
            "List databases.",
            false,
            false,
        );

        let mut cursor = MockCursor::with_rows(&["datname"], vec![vec!["app".to_string()]]);
        let mut sets = registry.execute(&mut cursor, "\\l").unwrap();
        let set = sets.remove(0);
        assert_eq!(set.headers, Some(vec!["datname".to_string()]));
        assert_eq!(set.status.as_deref(), Some("SELECT 1"));
        let rows = set.rows.map(Rows::into_vec).unwrap_or_default();
        assert_eq!(rows, vec![vec!["app".to_string()]]);
    }

    #[test]
    fn test_help_rows_sorted_visible_only() {
        let mut registry = Registry::new();
        registry.register("\\x", status_handler("x"), "\\x", "Toggle expanded output.", false, true);
        registry.register("\\dt", status_handler("dt"), "\\dt[+] [pattern]", "List tables.", false, false);
        registry.register("describe", status_handler("d"), "DESCRIBE [pattern]", "", true, false);
        registry.register("\\secret", status_handler("s"), "\\secret", "Hidden.", true, true);
        registry.register("\\blank", status_handler("b"), "", "", false, false);

        assert_eq!(
            registry.help_rows(),
            vec![
                vec!["\\dt[+] [pattern]".to_string(), "List tables.".to_string()],
                vec!["\\x".to_string(), "Toggle expanded output.".to_string()],
            ]
        );

        let help = registry.help();
        assert_eq!(
            help.headers,
            Some(vec!["Command".to_string(), "Description".to_string()])
        );
        assert!(help.title.is_none());
        assert!(help.status.is_none());
    }
}
