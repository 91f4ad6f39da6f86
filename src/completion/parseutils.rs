/*!
 * Token-level helpers for completion
 *
 * Everything here must cope with half-typed SQL: no grammar is applied,
 * only the token stream of the first statement is inspected.
 */

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::{Keyword, RESERVED_FOR_TABLE_ALIAS};
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError, Word};
use std::iter::Peekable;
use std::slice;

/// A table referenced in SQL text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Keywords after which a table list starts.
const TABLE_PREFIXES: &[Keyword] = &[
    Keyword::COPY,
    Keyword::FROM,
    Keyword::INTO,
    Keyword::UPDATE,
    Keyword::TABLE,
    Keyword::JOIN,
];

/// Keywords that end a table reference, on top of sqlparser's alias blocklist.
const NOT_AN_ALIAS: &[Keyword] = &[
    Keyword::VALUES,
    Keyword::DEFAULT,
    Keyword::SELECT,
    Keyword::SET,
    Keyword::RETURNING,
];

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | ':' | ',')
}

/// The partially typed word at the end of `text`, including quotes and
/// schema dots. Empty when `text` ends in whitespace.
pub fn last_word(text: &str) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| !is_word_boundary(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[start..]
}

/// `text` without its trailing partial word.
pub fn strip_partial_word(text: &str) -> &str {
    &text[..text.len() - last_word(text).len()]
}

/// Significant tokens of the first statement in `sql`.
///
/// Whitespace and comments are dropped; a terminating semicolon belongs to
/// the statement.
pub fn first_statement_tokens(sql: &str) -> Result<Vec<Token>, TokenizerError> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize()?;

    let mut statement = Vec::new();
    for token in tokens {
        match token {
            Token::Whitespace(_) => continue,
            Token::EOF => break,
            Token::SemiColon => {
                statement.push(token);
                break;
            }
            _ => statement.push(token),
        }
    }
    Ok(statement)
}

fn is_table_prefix(token: &Token) -> bool {
    matches!(token, Token::Word(word)
        if word.quote_style.is_none() && TABLE_PREFIXES.contains(&word.keyword))
}

fn is_name(word: &Word) -> bool {
    word.quote_style.is_some()
        || !(RESERVED_FOR_TABLE_ALIAS.contains(&word.keyword)
            || NOT_AN_ALIAS.contains(&word.keyword))
}

fn identifier(token: &Token) -> Option<String> {
    match token {
        Token::Word(word) if is_name(word) => Some(word.value.clone()),
        _ => None,
    }
}

type Tokens<'a> = Peekable<slice::Iter<'a, Token>>;

fn take_identifier(tokens: &mut Tokens<'_>) -> Option<String> {
    let name = tokens.peek().and_then(|token| identifier(token))?;
    tokens.next();
    Some(name)
}

fn take_alias(tokens: &mut Tokens<'_>) -> Option<String> {
    if matches!(tokens.peek(), Some(Token::Word(word))
        if word.keyword == Keyword::AS && word.quote_style.is_none())
    {
        tokens.next();
    }
    take_identifier(tokens)
}

/// `[schema.]name [[AS] alias]`
fn take_table_ref(tokens: &mut Tokens<'_>) -> Option<TableRef> {
    let mut parts = vec![take_identifier(tokens)?];
    while matches!(tokens.peek(), Some(Token::Period)) {
        tokens.next();
        match take_identifier(tokens) {
            Some(part) => parts.push(part),
            None => break,
        }
    }

    let name = parts.pop()?;
    Some(TableRef {
        schema: (!parts.is_empty()).then(|| parts.join(".")),
        name,
        alias: take_alias(tokens),
    })
}

/// Tables referenced by the first statement of `sql`, in order of appearance.
///
/// Tolerates partial input; text the tokenizer rejects yields no tables.
pub fn extract_tables(sql: &str) -> Vec<TableRef> {
    let Ok(statement) = first_statement_tokens(sql) else {
        return Vec::new();
    };
    let is_insert = matches!(statement.first(), Some(Token::Word(word)) if word.keyword == Keyword::INSERT);

    let mut tables = Vec::new();
    let mut tokens = statement.iter().peekable();
    while let Some(token) = tokens.next() {
        if !is_table_prefix(token) {
            continue;
        }

        while let Some(table) = take_table_ref(&mut tokens) {
            tables.push(table);
            if is_insert || !matches!(tokens.peek(), Some(Token::Comma)) {
                break;
            }
            tokens.next();
        }

        // INSERT stops at the first table list (column lists, VALUES, SELECT follow).
        if is_insert {
            break;
        }
    }
    tables
}
