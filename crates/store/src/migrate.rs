use rusqlite::Connection;
use til_types::Result;

/// Column names of `table`, in declaration order.
pub(crate) fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names: rusqlite::Result<Vec<String>> =
        stmt.query_map([], |row| row.get::<_, String>(1))?.collect();
    Ok(names?)
}

/// Add every column in `wanted` that `table` does not have yet, so the table
/// ends up with the union of its old columns and the new ones. Returns the
/// columns that were added.
pub(crate) fn ensure_columns(conn: &Connection, table: &str, wanted: &[&str]) -> Result<Vec<String>> {
    let existing = existing_columns(conn, table)?;
    let mut added = Vec::new();
    for column in wanted {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            continue;
        }
        conn.execute(&format!("ALTER TABLE {} ADD COLUMN {} TEXT", table, column), [])?;
        tracing::debug!(table, column, "added column");
        added.push(column.to_string());
    }
    Ok(added)
}
