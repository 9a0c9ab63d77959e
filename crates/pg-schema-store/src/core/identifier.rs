//! Identifier mapping and validation.
//!
//! Schema fields are named in camelCase and stored in snake_case columns. The
//! mapping is mechanical and invertible for identifiers that follow the
//! convention (`fooBar` <-> `foo_bar`).
//!
//! SQL identifiers cannot be passed as statement parameters, so every column,
//! key and table name that ends up in generated SQL goes through
//! [`validate_column`] or [`validate_table`] first. Generated SQL emits them
//! unquoted, which keeps statements readable and matches how the log table DDL
//! is written.

use crate::error::{Result, StoreError};

/// Maximum identifier length accepted by PostgreSQL (NAMEDATALEN - 1).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Convert a camelCase field name to its snake_case column name.
///
/// ```
/// use pg_schema_store::core::identifier::camel_to_snake;
/// assert_eq!(camel_to_snake("creationOrder"), "creation_order");
/// assert_eq!(camel_to_snake("id"), "id");
/// ```
pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a snake_case column name back to its camelCase field name.
///
/// ```
/// use pg_schema_store::core::identifier::snake_to_camel;
/// assert_eq!(snake_to_camel("query_executed"), "queryExecuted");
/// ```
pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' && !out.is_empty() {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Validate a bare column identifier.
///
/// Accepts `[a-z_][a-z0-9_]*` up to 63 bytes. Uppercase letters are rejected
/// because unquoted identifiers are folded to lowercase by the server and
/// would no longer match the returned column names.
pub fn validate_column(name: &str) -> Result<()> {
    check_length(name)?;

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if !first_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(StoreError::Config(format!(
            "Invalid column identifier {:?}: expected lowercase letters, digits and underscores",
            name
        )));
    }
    Ok(())
}

/// Validate a table name, optionally schema-qualified (`schema.table`).
pub fn validate_table(name: &str) -> Result<()> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(StoreError::Config(format!(
            "Invalid table name {:?}: at most one schema qualifier is allowed",
            name
        )));
    }
    parts.into_iter().try_for_each(validate_column)
}

fn check_length(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StoreError::Config("Identifier cannot be empty".to_string()));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(StoreError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("fooBar"), "foo_bar");
        assert_eq!(camel_to_snake("queryExecuted"), "query_executed");
        assert_eq!(camel_to_snake("a"), "a");
        assert_eq!(camel_to_snake("lastHTTPCode"), "last_h_t_t_p_code");
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("foo_bar"), "fooBar");
        assert_eq!(snake_to_camel("creation_order"), "creationOrder");
        assert_eq!(snake_to_camel("_private"), "_private");
        assert_eq!(snake_to_camel("id"), "id");
    }

    #[test]
    fn test_mapping_is_invertible_for_conventional_names() {
        for name in ["id", "name", "createdAt", "runTimestamp", "queryExecuted", "a1B2"] {
            assert_eq!(snake_to_camel(&camel_to_snake(name)), name);
        }
    }

    #[test]
    fn test_validate_column() {
        assert!(validate_column("creation_order").is_ok());
        assert!(validate_column("_src").is_ok());
        assert!(validate_column("").is_err());
        assert!(validate_column("Name").is_err());
        assert!(validate_column("1abc").is_err());
        assert!(validate_column("name; DROP TABLE users").is_err());
        assert!(validate_column("bad\0name").is_err());
        assert!(validate_column(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_table() {
        assert!(validate_table("migration_log").is_ok());
        assert!(validate_table("audit.migration_log").is_ok());
        assert!(validate_table("a.b.c").is_err());
        assert!(validate_table("users u").is_err());
        assert!(validate_table(".users").is_err());
    }
}
