//! SQLite Record Store
//!
//! Local implementation of `RecordStore` and `ChangeStream`. Rows are
//! read and written as JSON objects; every committed write is published
//! to the in-process `ChangeHub`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use tokio::sync::Mutex;

use super::change::{ChangeKind, RecordChange, Subscription};
use super::db::{db_err, open_connection, table_columns, ColumnType, TableSchema};
use super::hub::ChangeHub;
use super::query::{Query, Record};
use super::traits::{ChangeStream, RecordStore};
use crate::domain::{DomainError, DomainResult};

/// Tables exposed through the store
pub const TABLES: &[&str] = &[
    "wedding_groups",
    "group_members",
    "shopping_categories",
    "shopping_items",
    "transactions",
    "vendors",
    "tasks",
];

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    schemas: HashMap<String, TableSchema>,
    hub: ChangeHub,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> DomainResult<Self> {
        let conn = open_connection(path)?;
        let mut schemas = HashMap::new();
        for table in TABLES {
            schemas.insert(table.to_string(), table_columns(&conn, table)?);
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schemas,
            hub: ChangeHub::new(),
        })
    }

    pub async fn in_memory() -> DomainResult<Self> {
        Self::open(Path::new(":memory:")).await
    }

    pub fn hub(&self) -> &ChangeHub {
        &self.hub
    }

    fn schema(&self, table: &str) -> DomainResult<&TableSchema> {
        self.schemas
            .get(table)
            .ok_or_else(|| DomainError::NotFound(format!("table {}", table)))
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn check_column(schema: &TableSchema, table: &str, column: &str) -> DomainResult<()> {
    if schema.contains_key(column) {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!("unknown column {}.{}", table, column)))
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>, column_type: Option<ColumnType>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => match column_type {
            Some(ColumnType::Boolean) => Value::Bool(i != 0),
            _ => Value::from(i),
        },
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(base64::engine::general_purpose::STANDARD.encode(bytes)),
    }
}

fn query_rows(
    conn: &Connection,
    schema: &TableSchema,
    sql: &str,
    params: &[SqlValue],
) -> DomainResult<Vec<Record>> {
    let mut stmt = conn.prepare(sql).map_err(db_err)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(params.iter())).map_err(db_err)?;

    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(db_err)? {
        let mut record = Record::new();
        for (i, name) in names.iter().enumerate() {
            let value = row.get_ref(i).map_err(db_err)?;
            record.insert(name.clone(), from_sql_value(value, schema.get(name).copied()));
        }
        records.push(record);
    }
    Ok(records)
}

fn fetch_by_id(conn: &Connection, table: &str, schema: &TableSchema, id: i64) -> DomainResult<Option<Record>> {
    let sql = format!("SELECT * FROM {} WHERE \"id\" = ?1", quote(table));
    Ok(query_rows(conn, schema, &sql, &[SqlValue::Integer(id)])?.into_iter().next())
}

fn build_select(table: &str, schema: &TableSchema, query: &Query) -> DomainResult<(String, Vec<SqlValue>)> {
    let mut sql = format!("SELECT * FROM {}", quote(table));
    let mut params = Vec::new();
    let mut clauses = Vec::new();

    for filter in &query.filters {
        check_column(schema, table, &filter.column)?;
        if filter.value.is_null() {
            clauses.push(format!("{} IS NULL", quote(&filter.column)));
        } else {
            params.push(to_sql_value(&filter.value));
            clauses.push(format!("{} = ?{}", quote(&filter.column), params.len()));
        }
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    if let Some(order) = &query.order {
        check_column(schema, table, &order.column)?;
        let direction = if order.ascending { "ASC" } else { "DESC" };
        let nulls = if order.nulls_last { "NULLS LAST" } else { "NULLS FIRST" };
        sql.push_str(&format!(" ORDER BY {} {} {}", quote(&order.column), direction, nulls));
        if order.column != "id" {
            // Stable tie-break in the same direction
            sql.push_str(&format!(", \"id\" {}", direction));
        }
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }
    Ok((sql, params))
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn select(&self, table: &str, query: &Query) -> DomainResult<Vec<Record>> {
        let schema = self.schema(table)?;
        let (sql, params) = build_select(table, schema, query)?;
        let conn = self.conn.lock().await;
        query_rows(&conn, schema, &sql, &params)
    }

    async fn insert(&self, table: &str, mut record: Record) -> DomainResult<Record> {
        let schema = self.schema(table)?;
        for column in record.keys() {
            check_column(schema, table, column)?;
        }
        let has_created_at = record.get("created_at").map(|v| !v.is_null()).unwrap_or(false);
        if schema.contains_key("created_at") && !has_created_at {
            record.insert(
                "created_at".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }

        let columns: Vec<String> = record.keys().map(|c| quote(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let params: Vec<SqlValue> = record.values().map(to_sql_value).collect();
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote(table))
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        let created = {
            let conn = self.conn.lock().await;
            conn.execute(&sql, params_from_iter(params.iter())).map_err(db_err)?;
            let id = conn.last_insert_rowid();
            fetch_by_id(&conn, table, schema, id)?
                .ok_or_else(|| DomainError::Internal(format!("inserted {} row {} vanished", table, id)))?
        };

        self.hub.publish(&RecordChange::new(table, ChangeKind::Insert, created.clone()));
        Ok(created)
    }

    async fn update(&self, table: &str, id: i64, mut patch: Record) -> DomainResult<Record> {
        let schema = self.schema(table)?;
        patch.remove("id");
        for column in patch.keys() {
            check_column(schema, table, column)?;
        }

        let (previous, updated) = {
            let conn = self.conn.lock().await;
            let existing = fetch_by_id(&conn, table, schema, id)?
                .ok_or_else(|| DomainError::NotFound(format!("{} {}", table, id)))?;
            if patch.is_empty() {
                return Ok(existing);
            }

            let assignments: Vec<String> = patch
                .keys()
                .enumerate()
                .map(|(i, column)| format!("{} = ?{}", quote(column), i + 1))
                .collect();
            let mut params: Vec<SqlValue> = patch.values().map(to_sql_value).collect();
            params.push(SqlValue::Integer(id));
            let sql = format!(
                "UPDATE {} SET {} WHERE \"id\" = ?{}",
                quote(table),
                assignments.join(", "),
                params.len()
            );
            conn.execute(&sql, params_from_iter(params.iter())).map_err(db_err)?;
            let updated = fetch_by_id(&conn, table, schema, id)?
                .ok_or_else(|| DomainError::NotFound(format!("{} {}", table, id)))?;
            (existing, updated)
        };

        self.hub.publish(
            &RecordChange::new(table, ChangeKind::Update, updated.clone()).with_old_record(previous),
        );
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: i64) -> DomainResult<Record> {
        let schema = self.schema(table)?;
        let removed = {
            let conn = self.conn.lock().await;
            let existing = fetch_by_id(&conn, table, schema, id)?
                .ok_or_else(|| DomainError::NotFound(format!("{} {}", table, id)))?;
            conn.execute(&format!("DELETE FROM {} WHERE \"id\" = ?1", quote(table)), [id])
                .map_err(db_err)?;
            existing
        };

        self.hub.publish(&RecordChange::new(table, ChangeKind::Delete, removed.clone()));
        Ok(removed)
    }
}

#[async_trait]
impl ChangeStream for SqliteStore {
    async fn subscribe(&self, table: &str, query: &Query) -> DomainResult<Subscription> {
        self.schema(table)?;
        Ok(self.hub.subscribe(table, query))
    }
}
