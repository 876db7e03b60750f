//! Query-safety helpers for the SQL the queryable-view metrics generate.
//!
//! Metrics build aggregation queries from column names that come from the
//! user's data, so every identifier is quoted here before it reaches a query
//! string. Ad-hoc view queries are screened so only read-only statements are
//! accepted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ProfilerError, Result};
use crate::view::TableIdentity;

const MAX_IDENTIFIER_LEN: usize = 128;
const MAX_QUERY_LEN: usize = 100_000;

/// SQL identifier validation and quoting utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates an identifier and wraps it in double quotes, doubling any
    /// embedded quote characters.
    ///
    /// # Examples
    /// ```rust
    /// use term_profiler::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::quote_identifier("user_id").unwrap(), "\"user_id\"");
    /// assert_eq!(SqlSecurity::quote_identifier("Post Code").unwrap(), "\"Post Code\"");
    /// assert!(SqlSecurity::quote_identifier("").is_err());
    /// ```
    pub fn quote_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Checks that an identifier can be quoted safely.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(ProfilerError::Security(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }

        if identifier.len() > MAX_IDENTIFIER_LEN {
            return Err(ProfilerError::Security(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LEN} characters)"
            )));
        }

        if identifier.contains('\0') {
            return Err(ProfilerError::Security(
                "SQL identifier cannot contain null bytes".to_string(),
            ));
        }

        Ok(())
    }

    /// Quotes a `database.table` pair.
    pub fn qualified_table(identity: &TableIdentity) -> Result<String> {
        Ok(format!(
            "{}.{}",
            Self::quote_identifier(&identity.database)?,
            Self::quote_identifier(&identity.table)?
        ))
    }

    /// Quotes every column name and joins them with `", "`.
    pub fn column_list(columns: &[String]) -> Result<String> {
        Ok(columns
            .iter()
            .map(|c| Self::quote_identifier(c))
            .collect::<Result<Vec<_>>>()?
            .join(", "))
    }

    /// Accepts a single read-only statement (`SELECT ...` or `WITH ...`).
    /// Quoted string literals are ignored by the keyword and statement checks.
    ///
    /// ```rust
    /// use term_profiler::security::SqlSecurity;
    ///
    /// assert!(SqlSecurity::validate_read_only_query("SELECT * FROM audit WHERE action = 'delete'").is_ok());
    /// assert!(SqlSecurity::validate_read_only_query("DELETE FROM audit").is_err());
    /// ```
    pub fn validate_read_only_query(query: &str) -> Result<()> {
        if query.len() > MAX_QUERY_LEN {
            return Err(ProfilerError::Security(format!(
                "SQL query too long (max {MAX_QUERY_LEN} characters)"
            )));
        }

        if query.contains('\0') {
            return Err(ProfilerError::Security(
                "SQL query cannot contain null bytes".to_string(),
            ));
        }

        static READ_ONLY_START: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"(?is)^\s*(select|with)\b").expect("Hard-coded regex pattern should be valid")
        });
        static WRITE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(
                r"(?i)\b(insert|update|delete|drop|create|alter|truncate|copy|grant|revoke)\b",
            )
            .expect("Hard-coded regex pattern should be valid")
        });
        static STACKED_STATEMENT: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r";\s*\S").expect("Hard-coded regex pattern should be valid")
        });
        static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"'(?:[^']|'')*'").expect("Hard-coded regex pattern should be valid")
        });

        if !READ_ONLY_START.is_match(query) {
            return Err(ProfilerError::Security(
                "View queries must start with SELECT or WITH".to_string(),
            ));
        }

        let statement = STRING_LITERAL.replace_all(query, "''");

        if let Some(found) = WRITE_KEYWORD.find(&statement) {
            return Err(ProfilerError::Security(format!(
                "View query contains write keyword: '{}'",
                found.as_str()
            )));
        }

        if STACKED_STATEMENT.is_match(&statement) {
            return Err(ProfilerError::Security(
                "View queries must be a single statement".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(
            SqlSecurity::quote_identifier("customer_id").unwrap(),
            "\"customer_id\""
        );
        assert_eq!(
            SqlSecurity::quote_identifier("col\"with\"quotes").unwrap(),
            "\"col\"\"with\"\"quotes\""
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(SqlSecurity::quote_identifier("").is_err());
        assert!(SqlSecurity::quote_identifier("   ").is_err());
        assert!(SqlSecurity::quote_identifier(&"a".repeat(200)).is_err());
        assert!(SqlSecurity::quote_identifier("bad\0name").is_err());
    }

    #[test]
    fn test_qualified_table_and_columns() {
        let identity = TableIdentity::new("public", "mortgages");
        assert_eq!(
            SqlSecurity::qualified_table(&identity).unwrap(),
            "\"public\".\"mortgages\""
        );
        let columns = vec!["a".to_string(), "b c".to_string()];
        assert_eq!(SqlSecurity::column_list(&columns).unwrap(), "\"a\", \"b c\"");
    }

    #[test]
    fn test_read_only_queries() {
        assert!(SqlSecurity::validate_read_only_query("SELECT * FROM t WHERE created_at > 1").is_ok());
        assert!(SqlSecurity::validate_read_only_query("with x as (select 1) select * from x;").is_ok());
        assert!(SqlSecurity::validate_read_only_query("DROP TABLE t").is_err());
        assert!(SqlSecurity::validate_read_only_query("SELECT 1; DELETE FROM t").is_err());
        assert!(SqlSecurity::validate_read_only_query("SELECT 1; SELECT 2").is_err());
    }

    #[test]
    fn test_literals_are_not_keywords() {
        assert!(SqlSecurity::validate_read_only_query(
            "SELECT * FROM audit WHERE action = 'delete' OR note = 'drop; it''s fine'"
        )
        .is_ok());
        assert!(SqlSecurity::validate_read_only_query(
            "SELECT * FROM audit WHERE action = 'delete'; DROP TABLE audit"
        )
        .is_err());
        assert!(SqlSecurity::validate_read_only_query("SELECT 'x'; SELECT 2").is_err());
    }
}
