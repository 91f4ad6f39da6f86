//! Display toggles and named-query commands.

use super::namedqueries::{NamedQueryStore, USAGE};
use super::registry::{Handler, Invocation};
use super::{run_sql, ResultSet};
use crate::error::SpecialError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Output settings flipped by `\x` and `\timing` and read by the front-end.
#[derive(Debug, Default)]
pub struct ShellSettings {
    expanded: AtomicBool,
    timing: AtomicBool,
}

impl ShellSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expanded(&self) -> bool {
        self.expanded.load(Ordering::Relaxed)
    }

    pub fn timing(&self) -> bool {
        self.timing.load(Ordering::Relaxed)
    }

    /// Flips expanded output and returns the new value.
    pub fn toggle_expanded(&self) -> bool {
        !self.expanded.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flips timing and returns the new value.
    pub fn toggle_timing(&self) -> bool {
        !self.timing.fetch_xor(true, Ordering::Relaxed)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on."
    } else {
        "off."
    }
}

pub fn toggle_expanded_output(settings: Arc<ShellSettings>) -> Handler {
    Handler::callable(move |_, _| {
        let enabled = settings.toggle_expanded();
        Ok(vec![ResultSet::message(format!(
            "Expanded display is {}",
            on_off(enabled)
        ))])
    })
}

pub fn toggle_timing(settings: Arc<ShellSettings>) -> Handler {
    Handler::callable(move |_, _| {
        let enabled = settings.toggle_timing();
        Ok(vec![ResultSet::message(format!("Timing is {}", on_off(enabled)))])
    })
}

/// The argument of a command, whichever table it was dispatched from.
fn argument<'q>(invocation: &Invocation<'_, 'q>) -> &'q str {
    match *invocation {
        Invocation::Wrapped { pattern, .. } => pattern,
        Invocation::Raw { query } => query
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim())
            .unwrap_or(""),
    }
}

fn list_named_queries<'c>(store: &dyn NamedQueryStore, verbose: bool) -> ResultSet<'c> {
    let names = store.list();
    let status = if names.is_empty() {
        format!("\nNo named queries found.{USAGE}")
    } else {
        String::new()
    };

    let (headers, rows) = if verbose {
        let rows = names
            .into_iter()
            .map(|name| {
                let query = store.get(&name).unwrap_or_default();
                vec![name, query]
            })
            .collect();
        (vec!["Name".to_string(), "Query".to_string()], rows)
    } else {
        let rows = names.into_iter().map(|name| vec![name]).collect();
        (vec!["Name".to_string()], rows)
    };

    ResultSet::buffered(rows, headers).with_status(status)
}

/// `\n[+] [name]`: list named queries, or run one.
pub fn execute_named_query(store: Arc<dyn NamedQueryStore>) -> Handler {
    Handler::callable(move |_, invocation| {
        let Invocation::Wrapped {
            cursor,
            pattern,
            verbose,
        } = invocation
        else {
            return Err(SpecialError::InvalidInvocation("\\n".to_string()));
        };

        if pattern.is_empty() {
            return Ok(vec![list_named_queries(store.as_ref(), verbose)]);
        }

        let Some(query) = store.get(pattern) else {
            return Ok(vec![ResultSet::message(format!(
                "No named query: {pattern}"
            ))]);
        };

        let title = format!("> {query}");
        let sets = run_sql(cursor, &query)?;
        Ok(sets
            .into_iter()
            .map(|set| set.with_title(title.clone()))
            .collect())
    })
}

/// `\ns name query`: save a named query.
pub fn save_named_query(store: Arc<dyn NamedQueryStore>) -> Handler {
    Handler::callable(move |_, invocation| {
        let Some((name, query)) = argument(&invocation).split_once(' ') else {
            return Ok(vec![ResultSet::message("Invalid argument.")]);
        };
        store.save(name, query.trim());
        Ok(vec![ResultSet::message("Saved.")])
    })
}

/// `\nd name`: delete a named query.
pub fn delete_named_query(store: Arc<dyn NamedQueryStore>) -> Handler {
    Handler::callable(move |_, invocation| {
        let name = argument(&invocation);
        if name.is_empty() {
            return Ok(vec![ResultSet::message("Invalid argument.")]);
        }

        let status = if store.delete(name) {
            format!("{name}: Deleted")
        } else {
            format!("{name}: Not Found")
        };
        Ok(vec![ResultSet::message(status)])
    })
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockCursor;
    use super::super::namedqueries::MemoryNamedQueries;
    use super::super::registry::Registry;
    use super::super::Rows;
    use super::*;

    fn registry_with(store: Arc<dyn NamedQueryStore>, settings: Arc<ShellSettings>) -> Registry {
        let mut registry = Registry::new();
        registry.register("\\n", execute_named_query(store.clone()), "\\n[+] [name]", "", false, false);
        registry.register("\\ns", save_named_query(store.clone()), "\\ns [name [query]]", "", false, false);
        registry.register("\\nd", delete_named_query(store), "\\nd [name]", "", false, false);
        registry.register("\\x", toggle_expanded_output(settings.clone()), "\\x", "", false, true);
        registry.register("\\timing", toggle_timing(settings), "\\timing", "", false, true);
        registry
    }

    fn status(registry: &Registry, cursor: &mut MockCursor, line: &str) -> String {
        let sets = registry.execute(cursor, line).unwrap();
        sets[0].status.clone().unwrap_or_default()
    }

    #[test]
    fn test_toggles_flip_settings() {
        let settings = Arc::new(ShellSettings::new());
        let registry = registry_with(Arc::new(MemoryNamedQueries::new()), settings.clone());
        let mut cursor = MockCursor::default();

        assert_eq!(status(&registry, &mut cursor, "\\x"), "Expanded display is on.");
        assert!(settings.expanded());
        assert_eq!(status(&registry, &mut cursor, "\\x"), "Expanded display is off.");
        assert!(!settings.expanded());

        assert_eq!(status(&registry, &mut cursor, "\\timing"), "Timing is on.");
        assert!(settings.timing());
        assert!(cursor.executed.is_empty());
    }

    #[test]
    fn test_save_list_run_delete() {
        let store: Arc<dyn NamedQueryStore> = Arc::new(MemoryNamedQueries::new());
        let registry = registry_with(store.clone(), Arc::new(ShellSettings::new()));
        let mut cursor = MockCursor::with_rows(&["a"], vec![vec!["1".to_string()]]);

        assert_eq!(status(&registry, &mut cursor, "\\ns one SELECT 1 AS a"), "Saved.");
        assert_eq!(store.get("one").as_deref(), Some("SELECT 1 AS a"));

        {
            let listing = registry.execute(&mut cursor, "\\n+").unwrap().remove(0);
            assert_eq!(
                listing.headers,
                Some(vec!["Name".to_string(), "Query".to_string()])
            );
            assert_eq!(
                listing.rows.map(Rows::into_vec).unwrap_or_default(),
                vec![vec!["one".to_string(), "SELECT 1 AS a".to_string()]]
            );
        }

        {
            let run = registry.execute(&mut cursor, "\\n one").unwrap().remove(0);
            assert_eq!(run.title.as_deref(), Some("> SELECT 1 AS a"));
            assert_eq!(run.rows.map(Rows::into_vec).unwrap_or_default().len(), 1);
        }
        assert_eq!(cursor.executed, vec!["SELECT 1 AS a".to_string()]);

        assert_eq!(status(&registry, &mut cursor, "\\nd one"), "one: Deleted");
        assert_eq!(status(&registry, &mut cursor, "\\nd one"), "one: Not Found");
    }

    #[test]
    fn test_empty_listing_shows_usage() {
        let registry = registry_with(
            Arc::new(MemoryNamedQueries::new()),
            Arc::new(ShellSettings::new()),
        );
        let mut cursor = MockCursor::default();

        let message = status(&registry, &mut cursor, "\\n");
        assert!(message.starts_with("\nNo named queries found."));
        assert!(message.contains("\\ns simple"));
    }

    #[test]
    fn test_unknown_named_query() {
        let registry = registry_with(
            Arc::new(MemoryNamedQueries::new()),
            Arc::new(ShellSettings::new()),
        );
        let mut cursor = MockCursor::default();

        assert_eq!(status(&registry, &mut cursor, "\\n nope"), "No named query: nope");
        assert!(cursor.executed.is_empty());
    }

    #[test]
    fn test_invalid_arguments() {
        let registry = registry_with(
            Arc::new(MemoryNamedQueries::new()),
            Arc::new(ShellSettings::new()),
        );
        let mut cursor = MockCursor::default();

        assert_eq!(status(&registry, &mut cursor, "\\ns lonely"), "Invalid argument.");
        assert_eq!(status(&registry, &mut cursor, "\\nd"), "Invalid argument.");
    }
}
