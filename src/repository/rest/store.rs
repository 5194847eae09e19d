//! PostgREST-style record store

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde_json::Value;

use super::client::RestClient;
use crate::domain::{DomainError, DomainResult};
use crate::repository::query::{Query, Record};
use crate::repository::traits::RecordStore;

const RETURN_REPRESENTATION: &str = "return=representation";

pub struct RestRecordStore {
    client: RestClient,
}

impl RestRecordStore {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn table_url(&self, table: &str) -> String {
        self.client.url(&format!("rest/v1/{}", table))
    }
}

fn filter_operand(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{}", s),
        other => format!("eq.{}", other),
    }
}

/// URL query pairs for a select
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    for filter in &query.filters {
        params.push((filter.column.clone(), filter_operand(&filter.value)));
    }
    if let Some(order) = &query.order {
        params.push((
            "order".to_string(),
            format!(
                "{}.{}.{}",
                order.column,
                if order.ascending { "asc" } else { "desc" },
                if order.nulls_last { "nullslast" } else { "nullsfirst" }
            ),
        ));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

fn id_filter(id: i64) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

fn first_row(rows: Vec<Record>, table: &str, id: Option<i64>) -> DomainResult<Record> {
    rows.into_iter().next().ok_or_else(|| match id {
        Some(id) => DomainError::NotFound(format!("{} {}", table, id)),
        None => DomainError::Remote(format!("{} write returned no row", table)),
    })
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn select(&self, table: &str, query: &Query) -> DomainResult<Vec<Record>> {
        let request = self
            .client
            .http()
            .get(self.table_url(table))
            .query(&query_params(query));
        self.client.send_json(request).await
    }

    async fn insert(&self, table: &str, record: Record) -> DomainResult<Record> {
        let request = self
            .client
            .http()
            .post(self.table_url(table))
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION))
            .json(&vec![record]);
        let rows: Vec<Record> = self.client.send_json(request).await?;
        first_row(rows, table, None)
    }

    async fn update(&self, table: &str, id: i64, mut patch: Record) -> DomainResult<Record> {
        patch.remove("id");
        let request = self
            .client
            .http()
            .patch(self.table_url(table))
            .query(&id_filter(id))
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION))
            .json(&patch);
        let rows: Vec<Record> = self.client.send_json(request).await?;
        first_row(rows, table, Some(id))
    }

    async fn delete(&self, table: &str, id: i64) -> DomainResult<Record> {
        let request = self
            .client
            .http()
            .delete(self.table_url(table))
            .query(&id_filter(id))
            .header("Prefer", HeaderValue::from_static(RETURN_REPRESENTATION));
        let rows: Vec<Record> = self.client.send_json(request).await?;
        first_row(rows, table, Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() {
        let query = Query::new()
            .eq("group_id", 4)
            .eq("is_completed", false)
            .eq("due_date", Value::Null)
            .order_by("due_date", true)
            .nulls_last()
            .limit(10);

        let params = query_params(&query);
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("select", "*"),
                ("group_id", "eq.4"),
                ("is_completed", "eq.false"),
                ("due_date", "is.null"),
                ("order", "due_date.asc.nullslast"),
                ("limit", "10"),
            ]
        );
    }

    #[test]
    fn test_string_filters_are_unquoted() {
        let params = query_params(&Query::new().eq("invite_code", "AB23CD45"));
        assert_eq!(params[1], ("invite_code".to_string(), "eq.AB23CD45".to_string()));
    }
}
