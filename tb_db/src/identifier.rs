//! ABOUTME: Validation of SQL identifiers used in dynamically built statements
//! ABOUTME: Admission gate for table and column names spliced into SQL text

use tb_core::{Error, Result};

/// Validates that a name contains only safe SQL identifier characters
///
/// Table and column names cannot be bound as statement parameters, so every
/// identifier interpolated into a statement must pass this check first. A
/// safe identifier:
/// 1. Is not empty
/// 2. Starts with an ASCII letter or underscore
/// 3. Continues with only alphanumeric characters and underscores
pub fn is_safe_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }

    // Remaining characters must be alphanumeric or underscore
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an identifier, naming its role in the error message
pub fn check_identifier(kind: &str, name: &str) -> Result<()> {
    if is_safe_sql_identifier(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} is not a safe SQL identifier: {:?}",
            kind, name
        )))
    }
}
