//! View models
//!
//! Pure functions from records and rollups to display-ready structures.
//! Renderers only copy these fields into whatever surface they draw on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::format::{format_currency, format_percent, format_short_date};
use crate::aggregation::{compute_rollup, CategoryProgress, Rollup};
use crate::domain::{Category, ContactLinks, ShoppingItem, Task, Transaction, Vendor};

pub const EMPTY_LIST_PLACEHOLDER: &str = "No items in this list yet.";
pub const NO_TRANSACTIONS_PLACEHOLDER: &str = "No transactions yet";
pub const NO_TASKS_PLACEHOLDER: &str = "No tasks yet!";

/// One shopping list row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRowView {
    pub item_id: i64,
    pub name: String,
    pub price_label: String,
    pub is_purchased: bool,
    pub status_label: String,
    pub image_url: Option<String>,
}

impl ItemRowView {
    pub fn from_item(item: &ShoppingItem) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            price_label: format_currency(item.price()),
            is_purchased: item.is_purchased,
            status_label: if item.is_purchased { "Purchased" } else { "Not Purchased" }.to_string(),
            image_url: item.image_url.clone(),
        }
    }
}

/// Whole shopping list page for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListViewModel {
    pub category_name: String,
    pub rows: Vec<ItemRowView>,
    pub placeholder: Option<String>,
    pub rollup: Rollup,
    pub summary: BudgetSummaryView,
}

pub fn list_view_model(category: &Category, mirror: &[ShoppingItem]) -> ListViewModel {
    let rollup = compute_rollup(std::slice::from_ref(category), mirror);
    ListViewModel {
        category_name: category.name.clone(),
        rows: mirror.iter().map(ItemRowView::from_item).collect(),
        placeholder: mirror.is_empty().then(|| EMPTY_LIST_PLACEHOLDER.to_string()),
        summary: budget_summary_view(&rollup),
        rollup,
    }
}

/// Header figures of the budget page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummaryView {
    pub total_allocated: String,
    pub total_spent: String,
    pub remaining: String,
    pub percentage_label: String,
    /// Width of the overall bar; follows the unclamped percentage
    pub progress_width: i64,
    pub over_budget: bool,
}

pub fn budget_summary_view(rollup: &Rollup) -> BudgetSummaryView {
    BudgetSummaryView {
        total_allocated: format_currency(rollup.total_allocated),
        total_spent: format_currency(rollup.total_spent),
        remaining: format_currency(rollup.remaining),
        percentage_label: format_percent(rollup.percentage_spent),
        progress_width: rollup.percentage_spent,
        over_budget: rollup.is_over_budget(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRowView {
    pub category_id: i64,
    pub name: String,
    /// Budget page: "Spent: ₹750 of ₹1,000"
    pub amounts_label: String,
    /// Shopping overview: "Spent: ₹750 / Allocated: ₹1,000"
    pub budget_label: String,
    /// Shopping overview: "1/2 items bought"
    pub items_label: String,
    pub progress: f64,
}

pub fn category_row_view(progress: &CategoryProgress) -> CategoryRowView {
    let spent = format_currency(progress.spent);
    let allocated = format_currency(progress.allocated);
    CategoryRowView {
        category_id: progress.category_id,
        name: progress.name.clone(),
        amounts_label: format!("Spent: {} of {}", spent, allocated),
        budget_label: format!("Spent: {} / Allocated: {}", spent, allocated),
        items_label: format!("{}/{} items bought", progress.purchased_count, progress.total_count),
        progress: progress.progress,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRowView {
    pub transaction_id: i64,
    pub date_label: String,
    pub description: String,
    pub amount_label: String,
    pub category_name: Option<String>,
}

pub fn transaction_row_view(transaction: &Transaction, category_name: Option<&str>) -> TransactionRowView {
    TransactionRowView {
        transaction_id: transaction.id,
        date_label: transaction.date.map(format_short_date).unwrap_or_default(),
        description: transaction.description.clone().unwrap_or_default(),
        amount_label: format_currency(transaction.amount()),
        category_name: category_name.map(str::to_string),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRowView {
    pub task_id: i64,
    pub description: String,
    pub is_completed: bool,
    pub due_label: Option<String>,
    pub status: String,
}

pub fn task_row_view(task: &Task, today: NaiveDate) -> TaskRowView {
    let status = task.due_status(today);
    TaskRowView {
        task_id: task.id,
        description: task.description.clone(),
        is_completed: task.is_completed,
        due_label: status.label(),
        status: status.as_str().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorCardView {
    pub vendor_id: i64,
    pub name: String,
    pub vendor_type: Option<String>,
    pub links: ContactLinks,
}

pub fn vendor_card_view(vendor: &Vendor) -> VendorCardView {
    VendorCardView {
        vendor_id: vendor.id,
        name: vendor.name.clone(),
        vendor_type: vendor.vendor_type.clone(),
        links: vendor.contact_links(),
    }
}
