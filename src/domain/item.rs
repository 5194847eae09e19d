//! Shopping Item Entity
//!
//! A line on a category's shopping list. Created by user submission,
//! mutated by purchase toggle and image attach, deleted explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{null_as_default, Entity, TableRecord};

/// A shopping list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    /// Unique identifier (assigned by the store)
    #[serde(default)]
    pub id: i64,
    pub category_id: i64,
    pub group_id: i64,
    /// Creator (auth user id)
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    /// Monetary amount; older rows call this `amount`
    #[serde(default, alias = "amount")]
    pub price: Option<f64>,
    /// Purchased flag; older rows call this `purchased`
    #[serde(default, alias = "purchased", deserialize_with = "null_as_default")]
    pub is_purchased: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ShoppingItem {
    pub fn new(category_id: i64, group_id: i64, name: String, price: f64) -> Self {
        Self {
            id: 0,
            category_id,
            group_id,
            user_id: None,
            name,
            price: Some(price),
            is_purchased: false,
            image_url: None,
            created_at: None,
        }
    }

    /// Price with null treated as zero
    pub fn price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Storage path of an item's image for a file extension
    pub fn image_path(item_id: i64, extension: &str) -> String {
        format!("shopping_item_images/{}.{}", item_id, extension)
    }
}

impl Entity for ShoppingItem {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for ShoppingItem {
    const TABLE: &'static str = "shopping_items";
}
