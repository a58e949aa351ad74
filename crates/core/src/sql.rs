use std::fmt;

use thiserror::Error;

use crate::pagination::PageWindow;

pub const SHOW_DATABASES_SQL: &str = "SHOW DATABASES";
pub const SHOW_TABLES_SQL: &str = "SHOW TABLES";

pub const SCHEMA_SIZES_SQL: &str = "SELECT TABLE_SCHEMA AS object_name, \
     SUM(COALESCE(DATA_LENGTH, 0) + COALESCE(INDEX_LENGTH, 0)) AS size_bytes \
     FROM information_schema.TABLES \
     GROUP BY TABLE_SCHEMA \
     ORDER BY size_bytes DESC";

pub const TABLE_SIZES_SQL: &str = "SELECT TABLE_NAME AS object_name, \
     COALESCE(DATA_LENGTH, 0) + COALESCE(INDEX_LENGTH, 0) AS size_bytes \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = ? \
     ORDER BY size_bytes DESC";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SqlError {
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    #[error("identifier `{0}` contains a NUL character")]
    NulInIdentifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotedIdentifier(String);

impl QuotedIdentifier {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuotedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn quote_identifier(identifier: &str) -> Result<QuotedIdentifier, SqlError> {
    if identifier.is_empty() {
        return Err(SqlError::EmptyIdentifier);
    }
    if identifier.contains('\0') {
        return Err(SqlError::NulInIdentifier(identifier.replace('\0', "\\0")));
    }
    Ok(QuotedIdentifier(format!(
        "`{}`",
        identifier.replace('`', "``")
    )))
}

#[must_use]
pub fn use_schema_sql(schema: &QuotedIdentifier) -> String {
    format!("USE {schema}")
}

#[must_use]
pub fn describe_table_sql(table: &QuotedIdentifier) -> String {
    format!("DESCRIBE {table}")
}

#[must_use]
pub fn count_rows_sql(table: &QuotedIdentifier) -> String {
    format!("SELECT COUNT(*) AS total FROM {table}")
}

#[must_use]
pub fn page_rows_sql(
    table: &QuotedIdentifier,
    window: PageWindow,
    order_by: &[QuotedIdentifier],
) -> String {
    let mut sql = format!("SELECT * FROM {table}");
    if !order_by.is_empty() {
        let keys = order_by
            .iter()
            .map(QuotedIdentifier::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys);
    }
    sql.push_str(&format!(
        " LIMIT {} OFFSET {}",
        window.limit, window.offset
    ));
    sql
}

#[cfg(test)]
mod tests {
    use super::{
        count_rows_sql, describe_table_sql, page_rows_sql, quote_identifier, use_schema_sql,
        SqlError,
    };
    use crate::pagination::PageWindow;

    #[test]
    fn quotes_identifiers_with_backticks() {
        assert_eq!(
            quote_identifier("users").expect("plain name").as_str(),
            "`users`"
        );
        assert_eq!(
            quote_identifier("odd`name").expect("backtick name").as_str(),
            "`odd``name`"
        );
        assert_eq!(
            quote_identifier("x`; DROP TABLE users; --")
                .expect("hostile name")
                .as_str(),
            "`x``; DROP TABLE users; --`"
        );
    }

    #[test]
    fn rejects_empty_and_nul_identifiers() {
        assert_eq!(quote_identifier(""), Err(SqlError::EmptyIdentifier));
        assert!(matches!(
            quote_identifier("bad\0name"),
            Err(SqlError::NulInIdentifier(_))
        ));
    }

    #[test]
    fn generates_schema_and_structure_statements() {
        let schema = quote_identifier("app").expect("valid schema");
        let table = quote_identifier("users").expect("valid table");

        assert_eq!(use_schema_sql(&schema), "USE `app`");
        assert_eq!(describe_table_sql(&table), "DESCRIBE `users`");
        assert_eq!(
            count_rows_sql(&table),
            "SELECT COUNT(*) AS total FROM `users`"
        );
    }

    #[test]
    fn generates_offset_pagination_sql() {
        let table = quote_identifier("events").expect("valid table");
        let window = PageWindow {
            offset: 100,
            limit: 50,
        };

        assert_eq!(
            page_rows_sql(&table, window, &[]),
            "SELECT * FROM `events` LIMIT 50 OFFSET 100"
        );

        let keys = vec![
            quote_identifier("tenant_id").expect("valid key"),
            quote_identifier("id").expect("valid key"),
        ];
        assert_eq!(
            page_rows_sql(&table, window, &keys),
            "SELECT * FROM `events` ORDER BY `tenant_id`, `id` LIMIT 50 OFFSET 100"
        );
    }
}
