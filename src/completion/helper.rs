/*!
 * SQL completion helper
 *
 * Main interface integrating all completion functionality, implementing various rustyline traits
 */

use super::classifier::{classify, Category};
use super::metadata::DatabaseMetadata;
use super::parseutils::last_word;
use regex::Regex;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::{self, MatchingBracketValidator, Validator};
use rustyline::Context;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

const KEYWORDS: &[&str] = &[
    // Statements
    "SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "TRUNCATE", "SHOW",
    "DESCRIBE", "EXPLAIN", "USE", "GRANT", "REVOKE", "BEGIN", "COMMIT", "ROLLBACK",
    // Clauses
    "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "ON", "USING",
    "GROUP", "ORDER", "BY", "HAVING", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT", "INTO",
    "VALUES", "SET", "AS", "DISTINCT", "ALL", "RETURNING",
    // Objects
    "TABLE", "DATABASE", "SCHEMA", "INDEX", "VIEW", "SEQUENCE", "FUNCTION", "PROCEDURE",
    "TRIGGER",
    // Constraints
    "PRIMARY", "KEY", "FOREIGN", "REFERENCES", "UNIQUE", "DEFAULT", "NULL",
    // Operators
    "AND", "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "IS", "CASE", "WHEN", "THEN", "ELSE",
    "END", "ASC", "DESC",
];

const FUNCTIONS: &[&str] = &[
    "AVG", "COUNT", "MAX", "MIN", "SUM", "COALESCE", "NULLIF", "CONCAT", "LENGTH", "LOWER",
    "UPPER", "TRIM", "REPLACE", "SUBSTRING", "ABS", "CEIL", "FLOOR", "ROUND", "NOW",
    "CURRENT_DATE", "CURRENT_TIMESTAMP",
];

/// SQL completer
pub struct SqlCompleter {
    metadata: Arc<Mutex<DatabaseMetadata>>,
    current_database: Mutex<Option<String>>,
}

impl SqlCompleter {
    pub fn with_metadata(metadata: Arc<Mutex<DatabaseMetadata>>) -> Self {
        Self {
            metadata,
            current_database: Mutex::new(None),
        }
    }

    pub fn set_current_database(&self, database: Option<String>) {
        if let Ok(mut current) = self.current_database.lock() {
            *current = database;
        }
    }

    /// Candidates for the cursor position, filtered by the word being typed.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = &line[..pos];
        let word = last_word(before);
        // After `alias.` only the part behind the dot is replaced.
        let prefix = word.rsplit('.').next().unwrap_or(word);
        let start = pos - prefix.len();

        let classification = classify(line, before);
        let current = self.current_database.lock().ok().and_then(|db| db.clone());

        let scope = &classification.tables;
        let mut names: Vec<String> = match (classification.category, self.metadata.lock()) {
            (Category::Keyword | Category::Keywords, _) => {
                KEYWORDS.iter().map(|k| k.to_string()).collect()
            }
            (_, Err(_)) => Vec::new(),
            (Category::Tables, Ok(metadata)) => owned(metadata.table_names(current.as_deref())),
            (Category::Databases, Ok(metadata)) => metadata.get_databases().to_vec(),
            (Category::Columns, Ok(metadata)) => {
                owned(metadata.columns_for(scope, current.as_deref()))
            }
            (Category::ColumnsAndFunctions, Ok(metadata)) => {
                let mut names = owned(metadata.columns_for(scope, current.as_deref()));
                names.extend(FUNCTIONS.iter().map(|f| f.to_string()));
                names
            }
        };

        let lowered = prefix.to_lowercase();
        let mut seen = BTreeSet::new();
        names.retain(|name| {
            name.to_lowercase().starts_with(&lowered) && seen.insert(name.clone())
        });
        (start, names)
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

impl Completer for SqlCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, names) = self.candidates(line, pos);
        let pairs = names
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

/// SQL helper (integrating all functionality)
pub struct SqlHelper {
    completer: SqlCompleter,
    highlighter: MatchingBracketHighlighter,
    validator: MatchingBracketValidator,
    hinter: HistoryHinter,
    keyword_pattern: Option<Regex>,
}

impl SqlHelper {
    pub fn with_metadata(metadata: Arc<Mutex<DatabaseMetadata>>) -> Self {
        let alternatives: Vec<String> = KEYWORDS.iter().map(|k| regex::escape(k)).collect();
        let keyword_pattern = Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).ok();

        Self {
            completer: SqlCompleter::with_metadata(metadata),
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter::new(),
            keyword_pattern,
        }
    }

    pub fn set_current_database(&self, database: Option<String>) {
        self.completer.set_current_database(database);
    }
}

impl Completer for SqlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for SqlHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for SqlHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        // Uppercase keywords are shown bold
        match &self.keyword_pattern {
            Some(re) if re.is_match(line) => re.replace_all(line, "\x1b[1m$0\x1b[0m"),
            _ => self.highlighter.highlight(line, pos),
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        Cow::Borrowed(prompt)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{}\x1b[0m", hint))
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.keyword_pattern.is_some() || self.highlighter.highlight_char(line, pos, forced)
    }
}

impl Validator for SqlHelper {
    fn validate(
        &self,
        ctx: &mut validate::ValidationContext,
    ) -> Result<validate::ValidationResult, ReadlineError> {
        self.validator.validate(ctx)
    }

    fn validate_while_typing(&self) -> bool {
        self.validator.validate_while_typing()
    }
}

impl rustyline::Helper for SqlHelper {}
