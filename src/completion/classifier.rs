/*!
 * Completion context classifier
 *
 * Decides what kind of completion fits the cursor position by looking at
 * the last significant token before the word being typed:
 * - keywords at the start of a statement
 * - columns after `(`, SET, BY, DISTINCT
 * - columns and functions after SELECT, WHERE, HAVING
 * - tables after FROM, UPDATE, INTO, DESCRIBE, `\d`
 * - databases after `\c` and USE
 */

use super::parseutils::{extract_tables, first_statement_tokens, strip_partial_word, TableRef};
use tracing::debug;

/// Kind of completion to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Nothing typed yet: a statement-starting keyword.
    Keyword,
    Columns,
    ColumnsAndFunctions,
    Tables,
    Databases,
    /// Any keyword; the fallback.
    Keywords,
}

/// Result of classifying a cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    /// Tables referenced by the whole input, in order of appearance.
    pub tables: Vec<TableRef>,
}

enum Matcher {
    /// No significant token.
    Empty,
    EndsWith(&'static str),
    /// Case-insensitive.
    OneOf(&'static [&'static str]),
    /// Case-sensitive.
    Exactly(&'static str),
    Any,
}

impl Matcher {
    fn matches(&self, token: &str) -> bool {
        match self {
            Matcher::Empty => token.is_empty(),
            Matcher::EndsWith(suffix) => token.ends_with(suffix),
            Matcher::OneOf(words) => words.iter().any(|w| w.eq_ignore_ascii_case(token)),
            Matcher::Exactly(text) => token == *text,
            Matcher::Any => true,
        }
    }
}

enum Outcome {
    Suggest(Category),
    /// Classify again with the trailing comma removed.
    RetryWithoutComma,
}

struct Rule {
    matcher: Matcher,
    outcome: Outcome,
}

const fn rule(matcher: Matcher, outcome: Outcome) -> Rule {
    Rule { matcher, outcome }
}

/// First match wins.
const RULES: &[Rule] = &[
    rule(Matcher::Empty, Outcome::Suggest(Category::Keyword)),
    rule(Matcher::EndsWith("("), Outcome::Suggest(Category::Columns)),
    rule(
        Matcher::OneOf(&["set", "by", "distinct"]),
        Outcome::Suggest(Category::Columns),
    ),
    rule(
        Matcher::OneOf(&["select", "where", "having"]),
        Outcome::Suggest(Category::ColumnsAndFunctions),
    ),
    rule(
        Matcher::OneOf(&["from", "update", "into", "describe"]),
        Outcome::Suggest(Category::Tables),
    ),
    rule(Matcher::Exactly("d"), Outcome::Suggest(Category::Tables)),
    rule(
        Matcher::OneOf(&["c", "use"]),
        Outcome::Suggest(Category::Databases),
    ),
    rule(Matcher::Exactly(","), Outcome::RetryWithoutComma),
    rule(Matcher::Any, Outcome::Suggest(Category::Keywords)),
];

/// Classifies the cursor position.
///
/// `full_text` is the whole input and supplies the table scope;
/// `text_before_cursor` decides the category.
pub fn classify(full_text: &str, text_before_cursor: &str) -> Classification {
    let tables = extract_tables(full_text);
    let category = suggest_category(text_before_cursor);
    debug!(
        "Classified {:?} as {:?} with {} table(s) in scope.",
        text_before_cursor,
        category,
        tables.len()
    );
    Classification { category, tables }
}

fn suggest_category(text_before_cursor: &str) -> Category {
    let stripped = strip_partial_word(text_before_cursor);
    let token = last_token(stripped);

    let Some(rule) = RULES.iter().find(|rule| rule.matcher.matches(&token)) else {
        return Category::Keywords;
    };

    match rule.outcome {
        Outcome::Suggest(category) => category,
        // Each retry removes at least the comma, so this terminates.
        Outcome::RetryWithoutComma => match stripped.trim_end().strip_suffix(',') {
            Some(rest) => suggest_category(rest),
            None => Category::Keywords,
        },
    }
}

/// Text of the last significant token of the first statement. Empty when
/// there is none or the tokenizer gives up.
fn last_token(text: &str) -> String {
    match first_statement_tokens(text) {
        Ok(tokens) => tokens.last().map(|t| t.to_string()).unwrap_or_default(),
        Err(e) => {
            debug!("Tokenizer rejected {:?}: {}", text, e);
            String::new()
        }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
