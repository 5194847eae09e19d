//! Transaction Entity
//!
//! An expense recorded against a budget category.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, TableRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub id: i64,
    pub group_id: i64,
    pub category_id: i64,
    /// Amount spent; missing counts as zero
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Date of the expense (not the row creation time)
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(group_id: i64, category_id: i64, amount: f64, description: String, date: NaiveDate) -> Self {
        Self {
            id: 0,
            group_id,
            category_id,
            amount: Some(amount),
            description: Some(description),
            date: Some(date),
            created_at: None,
        }
    }

    pub fn amount(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }
}

impl Entity for Transaction {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for Transaction {
    const TABLE: &'static str = "transactions";
}
