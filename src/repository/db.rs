//! Database Connection and Setup
//!
//! Opens the local SQLite database and runs migrations.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;

use crate::domain::{DomainError, DomainResult};

/// Storage class of a column, from its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Boolean,
}

impl ColumnType {
    fn from_declared(declared: &str) -> Self {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("BOOL") {
            ColumnType::Boolean
        } else if declared.contains("INT") {
            ColumnType::Integer
        } else if declared.contains("REAL") || declared.contains("FLOA") || declared.contains("DOUB") {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }
}

/// Column name -> type for one table
pub type TableSchema = HashMap<String, ColumnType>;

pub(crate) fn db_err(e: rusqlite::Error) -> DomainError {
    match e.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => DomainError::Conflict(e.to_string()),
        _ => DomainError::Internal(e.to_string()),
    }
}

/// Open a database file (or `:memory:`) and migrate it
pub fn open_connection(path: &Path) -> DomainResult<Connection> {
    let opened = if path.as_os_str() == ":memory:" {
        Connection::open_in_memory()
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Internal(format!("Failed to create db dir: {}", e)))?;
        }
        Connection::open(path)
    };
    let conn = opened.map_err(|e| DomainError::Internal(format!("Failed to open db: {}", e)))?;

    conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
    run_migrations(&conn)?;
    log::info!("database ready at {}", path.display());
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    table_columns(conn, table)
        .map(|columns| columns.contains_key(column))
        .unwrap_or(false)
}

/// Columns of a table via `PRAGMA table_info`; empty for unknown tables
pub fn table_columns(conn: &Connection, table: &str) -> DomainResult<TableSchema> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info(\"{}\")", table.replace('"', "")))
        .map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(1)?;
            let declared: String = row.get(2)?;
            Ok((name, ColumnType::from_declared(&declared)))
        })
        .map_err(db_err)?;

    let mut columns = TableSchema::new();
    for row in rows {
        let (name, column_type) = row.map_err(db_err)?;
        columns.insert(name, column_type);
    }
    Ok(columns)
}

/// Run database migrations
pub fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS wedding_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            wedding_date TEXT,
            created_by TEXT,
            invite_code TEXT UNIQUE,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS group_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES wedding_groups(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            created_at TEXT,
            UNIQUE (group_id, user_id)
        );
        CREATE TABLE IF NOT EXISTS shopping_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            budget_allocated REAL,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS shopping_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            user_id TEXT,
            name TEXT NOT NULL,
            price REAL,
            is_purchased BOOLEAN NOT NULL DEFAULT 0,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL,
            description TEXT,
            date TEXT,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS vendors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT,
            contact TEXT,
            email TEXT,
            address TEXT,
            created_at TEXT
        );
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            is_completed BOOLEAN NOT NULL DEFAULT 0,
            due_date TEXT,
            created_by TEXT,
            created_at TEXT
        );",
    )
    .map_err(db_err)?;

    // Image attachments came after the first release of the items table
    if !column_exists(conn, "shopping_items", "image_url") {
        conn.execute("ALTER TABLE shopping_items ADD COLUMN image_url TEXT", [])
            .map_err(|e| DomainError::Internal(format!("Failed to add image_url: {}", e)))?;
    }

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_items_category ON shopping_items(category_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_categories_group ON shopping_categories(group_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_group ON transactions(group_id, date);
        CREATE INDEX IF NOT EXISTS idx_tasks_group ON tasks(group_id);
        CREATE INDEX IF NOT EXISTS idx_members_user ON group_members(user_id);",
    )
    .map_err(db_err)?;

    Ok(())
}
