use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{history::DefaultHistory, CompletionType, Config, Editor};
use sqlcli::commands::{format_result_set, format_timing};
use sqlcli::completion::{DatabaseMetadata, SqlHelper};
use sqlcli::database::MySqlCursor;
use sqlcli::error::SpecialError;
use sqlcli::special::{
    parse, register_builtins, run_sql, Handler, HandlerResult, MemoryNamedQueries, Registry,
    ShellContext, ShellSettings,
};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

pub struct Cli {
    cursor: MySqlCursor,
    registry: Registry,
    settings: Arc<ShellSettings>,
    editor: Editor<SqlHelper, DefaultHistory>,
    current_database: Option<String>,
    metadata: Arc<Mutex<DatabaseMetadata>>,
    buffer: String,
}

impl Cli {
    pub fn new(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> Result<Self> {
        let cursor = MySqlCursor::connect(host, port, user, password, database)?;
        let current_database = database.map(|d| d.to_string());

        let context = ShellContext {
            settings: Arc::new(ShellSettings::new()),
            named_queries: Arc::new(MemoryNamedQueries::new()),
        };
        let mut registry = Registry::new();
        register_builtins(&mut registry, &context);
        // The built-in \l reads pg_database, which this backend does not have.
        registry.register(
            "\\l",
            Handler::literal("SHOW DATABASES"),
            "\\l",
            "List databases.",
            false,
            false,
        );

        println!("Welcome to sqlcli. Commands end with ; or \\g.");
        println!("Your connection id is {}", cursor.connection_id());
        println!("Server version: {}", cursor.server_version());
        println!();
        println!("Type '\\?' for help. Type '\\q' to quit.");
        println!();

        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(true)
            .edit_mode(rustyline::EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)?;
        let metadata = Arc::new(Mutex::new(DatabaseMetadata::new()));

        let helper = SqlHelper::with_metadata(metadata.clone());
        helper.set_current_database(current_database.clone());
        editor.set_helper(Some(helper));

        let mut cli = Self {
            cursor,
            registry,
            settings: context.settings,
            editor,
            current_database,
            metadata,
            buffer: String::new(),
        };
        cli.refresh_metadata();
        Ok(cli)
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = self.get_prompt();

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if self.buffer.is_empty() {
                        if matches!(line, "\\q" | "quit" | "exit") {
                            println!("Bye");
                            break;
                        }
                        if self.is_special(line) {
                            self.handle_special_command(line);
                            continue;
                        }
                    }

                    if !self.buffer.is_empty() {
                        self.buffer.push('\n');
                    }
                    self.buffer.push_str(line);

                    if line.ends_with(';') || line.ends_with("\\g") {
                        let statement = std::mem::take(&mut self.buffer);
                        let query = statement
                            .trim_end_matches("\\g")
                            .trim_end_matches(';')
                            .trim();
                        self.execute_query(query);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.buffer.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    fn get_prompt(&self) -> String {
        if !self.buffer.is_empty() {
            return "    -> ".to_string();
        }
        match &self.current_database {
            Some(db) => format!("sqlcli [{}]> ", db),
            None => "sqlcli> ".to_string(),
        }
    }

    /// Backslash lines and lines whose first word is a registered command.
    fn is_special(&self, line: &str) -> bool {
        line.starts_with('\\') || self.registry.resolve(&parse(line).command).is_some()
    }

    fn handle_special_command(&mut self, line: &str) {
        let start = Instant::now();
        let result = self.registry.execute(&mut self.cursor, line);
        match print_results(&self.settings, result, start) {
            Err(SpecialError::NotFound(command)) => {
                println!("Unknown command: {}", command);
                println!("Type '\\?' for help.");
            }
            Err(e) => println!("ERROR: {}", e),
            Ok(()) => {}
        }
    }

    fn execute_query(&mut self, query: &str) {
        if query.is_empty() {
            return;
        }

        let start = Instant::now();
        let result = run_sql(&mut self.cursor, query);
        if let Err(e) = print_results(&self.settings, result, start) {
            println!("ERROR: {}", e);
            return;
        }

        let upper = query.to_uppercase();
        if upper.starts_with("USE") {
            if let Some(db_name) = query.split_whitespace().nth(1) {
                self.current_database = Some(db_name.trim_matches('`').to_string());
                if let Some(helper) = self.editor.helper() {
                    helper.set_current_database(self.current_database.clone());
                }
                println!("Database changed");
            }
        }

        if ["CREATE", "DROP", "ALTER", "USE"]
            .iter()
            .any(|prefix| upper.starts_with(prefix))
        {
            self.refresh_metadata();
        }
    }

    fn refresh_metadata(&mut self) {
        let Ok(mut metadata) = self.metadata.lock() else {
            return;
        };
        match metadata.refresh(&mut self.cursor) {
            Ok(()) => info!("Completion metadata refreshed."),
            Err(e) => warn!("Could not refresh completion metadata: {}", e),
        }
    }
}

fn print_results(
    settings: &ShellSettings,
    result: HandlerResult<'_>,
    start: Instant,
) -> sqlcli::error::Result<()> {
    let expanded = settings.expanded();
    for set in result? {
        print!("{}", format_result_set(set, expanded));
    }
    if settings.timing() {
        println!("{}", format_timing(start.elapsed()));
    }
    Ok(())
}
