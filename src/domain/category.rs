//! Category Entity
//!
//! A shopping/budget category with an allocated budget, owned by a group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, TableRecord};

/// A budget category (also the container of a shopping list)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (assigned by the store)
    #[serde(default)]
    pub id: i64,
    /// Owning wedding group
    pub group_id: i64,
    pub name: String,
    /// Allocated budget; missing counts as zero
    #[serde(default)]
    pub budget_allocated: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(group_id: i64, name: String, budget_allocated: Option<f64>) -> Self {
        Self {
            id: 0,
            group_id,
            name,
            budget_allocated,
            created_at: None,
        }
    }

    /// Allocated budget with null treated as zero
    pub fn allocated(&self) -> f64 {
        self.budget_allocated.unwrap_or(0.0)
    }
}

impl Entity for Category {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for Category {
    const TABLE: &'static str = "shopping_categories";
}
