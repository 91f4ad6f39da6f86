//! Commands registered at start-up.

use super::dbcommands::{
    describe_table_details, list_datatypes, list_functions, list_indexes, list_roles,
    list_schemas, list_sequences, list_tables, list_views,
};
use super::iocommands::{
    delete_named_query, execute_named_query, save_named_query, toggle_expanded_output,
    toggle_timing, ShellSettings,
};
use super::namedqueries::NamedQueryStore;
use super::registry::{Handler, Invocation, Registry};
use super::HandlerResult;
use crate::error::SpecialError;
use std::sync::Arc;

/// State shared between built-in handlers and the front-end.
#[derive(Clone)]
pub struct ShellContext {
    pub settings: Arc<ShellSettings>,
    pub named_queries: Arc<dyn NamedQueryStore>,
}

/// `\?`: the help listing. Arguments are ignored.
pub fn show_help<'c>(registry: &Registry, _invocation: Invocation<'c, '_>) -> HandlerResult<'c> {
    Ok(vec![registry.help()])
}

/// Placeholder for commands the dispatcher does not run: `\e` belongs to the
/// editor front-end, the rest are unbuilt.
fn not_implemented(command: &'static str) -> Handler {
    Handler::callable(move |_, _| Err(SpecialError::NotImplemented(command.to_string())))
}

/// Registers the built-in command set.
pub fn register_builtins(registry: &mut Registry, context: &ShellContext) {
    let store = &context.named_queries;

    registry.register(
        "\\l",
        Handler::literal("SELECT datname FROM pg_database;"),
        "\\l",
        "List databases.",
        false,
        false,
    );
    registry.register(
        "\\d",
        Handler::callable(describe_table_details),
        "\\d [pattern]",
        "List or describe tables, views and sequences.",
        false,
        false,
    );
    registry.register(
        "\\dn",
        Handler::callable(list_schemas),
        "\\dn[+] [pattern]",
        "List schemas.",
        false,
        false,
    );
    registry.register(
        "\\du",
        Handler::callable(list_roles),
        "\\du[+] [pattern]",
        "List roles.",
        false,
        false,
    );
    registry.register(
        "\\dt",
        Handler::callable(list_tables),
        "\\dt[+] [pattern]",
        "List tables.",
        false,
        false,
    );
    registry.register(
        "\\di",
        Handler::callable(list_indexes),
        "\\di[+] [pattern]",
        "List indexes.",
        false,
        false,
    );
    registry.register(
        "\\dv",
        Handler::callable(list_views),
        "\\dv[+] [pattern]",
        "List views.",
        false,
        false,
    );
    registry.register(
        "\\ds",
        Handler::callable(list_sequences),
        "\\ds[+] [pattern]",
        "List sequences.",
        false,
        false,
    );
    registry.register(
        "\\df",
        Handler::callable(list_functions),
        "\\df[+] [pattern]",
        "List functions.",
        false,
        false,
    );
    registry.register(
        "\\dT",
        Handler::callable(list_datatypes),
        "\\dT[S+] [pattern]",
        "List data types",
        false,
        false,
    );
    registry.register(
        "\\e",
        not_implemented("\\e"),
        "\\e [file]",
        "Edit the query buffer (or file) with external editor.",
        false,
        false,
    );
    registry.register(
        "\\ef",
        not_implemented("\\ef"),
        "\\ef [funcname [line]]",
        "Not yet implemented.",
        false,
        false,
    );
    registry.register(
        "\\sf",
        not_implemented("\\sf"),
        "\\sf[+] funcname",
        "Not yet implemented.",
        false,
        false,
    );
    registry.register(
        "\\z",
        not_implemented("\\z"),
        "\\z [pattern]",
        "Not yet implemented.",
        false,
        false,
    );
    registry.register(
        "\\do",
        not_implemented("\\do"),
        "\\do[S] [pattern]",
        "Not yet implemented.",
        false,
        false,
    );
    registry.register(
        "\\n",
        execute_named_query(store.clone()),
        "\\n[+] [name]",
        "List or execute named queries.",
        false,
        false,
    );
    registry.register(
        "\\ns",
        save_named_query(store.clone()),
        "\\ns [name [query]]",
        "Save a named query.",
        false,
        false,
    );
    registry.register(
        "\\nd",
        delete_named_query(store.clone()),
        "\\nd [name]",
        "Delete a named query.",
        false,
        false,
    );

    registry.register(
        "describe",
        Handler::callable(describe_table_details),
        "DESCRIBE [pattern]",
        "",
        true,
        false,
    );

    registry.register(
        "\\?",
        Handler::callable(show_help),
        "\\?",
        "Help on pgcli commands.",
        false,
        true,
    );
    registry.register(
        "\\x",
        toggle_expanded_output(context.settings.clone()),
        "\\x",
        "Toggle expanded output.",
        false,
        true,
    );
    registry.register(
        "\\timing",
        toggle_timing(context.settings.clone()),
        "\\timing",
        "Toggle timing of commands.",
        false,
        true,
    );
}
