//! Budget page commands

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::aggregation::{
    category_breakdown, compute_rollup, spending_by_category, spent_in_category, CategoryProgress,
    Rollup, SpendingSlice,
};
use crate::domain::{Category, DomainError, DomainResult, TableRecord, Transaction};
use crate::repository::{from_record, Query, Record, RecordStore, TableRepository};
use crate::sync::{Mirror, RECENT_LIMIT};
use crate::view::{
    budget_summary_view, category_row_view, transaction_row_view, BudgetSummaryView, CategoryRowView,
    TransactionRowView,
};
use crate::AppState;

use super::optional_text;

/// Everything the budget page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPage {
    pub rollup: Rollup,
    pub summary: BudgetSummaryView,
    pub categories: Vec<CategoryProgress>,
    pub category_rows: Vec<CategoryRowView>,
    pub recent_transactions: Vec<TransactionRowView>,
    pub spending: Vec<SpendingSlice>,
}

pub(crate) async fn group_categories(state: &AppState, group_id: i64) -> DomainResult<Vec<Category>> {
    let categories: TableRepository<Category> = TableRepository::new(state.store.clone());
    categories
        .list_where(&Query::new().eq("group_id", group_id).order_by("id", true))
        .await
}

/// Most recent transactions by date, newest first; undated ones last
fn recent_transactions(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    let mut recent = Mirror::capped(RECENT_LIMIT);
    recent.replace(transactions);
    recent.entries().to_vec()
}

pub async fn get_budget_summary(state: &AppState) -> DomainResult<BudgetPage> {
    let ctx = state.session().await?;
    let categories = group_categories(state, ctx.group_id).await?;
    let transactions: TableRepository<Transaction> = TableRepository::new(state.store.clone());
    let transactions = transactions
        .list_where(&Query::new().eq("group_id", ctx.group_id))
        .await?;

    let rollup = compute_rollup(&categories, &transactions);
    let breakdown = category_breakdown(&categories, &transactions);
    let recent = recent_transactions(transactions.clone())
        .iter()
        .map(|t| {
            let name = categories.iter().find(|c| c.id == t.category_id).map(|c| c.name.as_str());
            transaction_row_view(t, name)
        })
        .collect();

    Ok(BudgetPage {
        summary: budget_summary_view(&rollup),
        category_rows: breakdown.iter().map(category_row_view).collect(),
        spending: spending_by_category(&categories, &transactions),
        categories: breakdown,
        recent_transactions: recent,
        rollup,
    })
}

/// Record an expense against a category of the current group
pub async fn add_expense(
    state: &AppState,
    category_id: i64,
    amount: f64,
    description: Option<String>,
    date: NaiveDate,
) -> DomainResult<Transaction> {
    let ctx = state.session().await?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DomainError::InvalidInput("amount must be a positive number".to_string()));
    }
    if !group_categories(state, ctx.group_id).await?.iter().any(|c| c.id == category_id) {
        return Err(DomainError::NotFound(format!("category {}", category_id)));
    }

    let record: Record = json!({
        "group_id": ctx.group_id,
        "category_id": category_id,
        "amount": amount,
        "description": optional_text(description),
        "date": date,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    let created = state.store.insert(Transaction::TABLE, record).await?;
    log::info!("expense of {} added to category {}", amount, category_id);
    from_record(created)
}

/// Total of every transaction in one category
pub async fn get_category_spending(state: &AppState, category_id: i64) -> DomainResult<f64> {
    let ctx = state.session().await?;
    let transactions: TableRepository<Transaction> = TableRepository::new(state.store.clone());
    let transactions = transactions
        .list_where(&Query::new().eq("group_id", ctx.group_id).eq("category_id", category_id))
        .await?;
    Ok(spent_in_category(&transactions, category_id))
}
