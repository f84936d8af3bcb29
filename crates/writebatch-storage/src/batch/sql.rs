//! SQL text for generated deletes and inserts.

use crate::value::SqlValue;

const RESERVED_KEYWORDS: &[&str] = &[
    "add", "all", "alter", "and", "as", "by", "case", "check", "column", "constraint",
    "create", "default", "delete", "distinct", "drop", "else", "from", "group", "having",
    "in", "index", "insert", "into", "is", "join", "key", "limit", "not", "null", "on",
    "or", "order", "primary", "references", "select", "set", "table", "to", "union",
    "unique", "update", "values", "when", "where",
];

/// Quote an identifier when it is a keyword or not a plain name.
/// Dotted `schema.table` names are quoted part by part.
pub fn quote_identifier(name: &str) -> String {
    if name.contains('.') {
        return name
            .split('.')
            .map(quote_part)
            .collect::<Vec<_>>()
            .join(".");
    }
    quote_part(name)
}

fn quote_part(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain && !RESERVED_KEYWORDS.contains(&name.to_ascii_lowercase().as_str()) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

pub fn delete_statement(table: &str, id_column: &str, id: i64) -> String {
    format!(
        "DELETE FROM {} WHERE {} = {id}",
        quote_identifier(table),
        quote_identifier(id_column)
    )
}

/// `INSERT INTO t (a, b) VALUES (`, shared by both insert forms.
pub fn insert_prefix(table: &str, columns: &[String]) -> String {
    let columns = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO {} ({columns}) VALUES (", quote_identifier(table))
}

pub fn parameterized_insert(table: &str, columns: &[String]) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{placeholders})", insert_prefix(table, columns))
}

/// Complete a literal insert from a prefix built by [`insert_prefix`].
pub fn literal_insert(prefix: &str, values: &[SqlValue]) -> String {
    let literals = values
        .iter()
        .map(SqlValue::to_literal)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{prefix}{literals})")
}
