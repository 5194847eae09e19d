//! Shopping overview commands
//!
//! Category cards with purchase progress, and the one-shot list read used
//! before a live list takes over.

use serde::{Deserialize, Serialize};

use crate::aggregation::{category_breakdown, compute_rollup, spent_in_category, Rollup};
use crate::domain::{Category, DomainError, DomainResult, ShoppingItem};
use crate::repository::{Query, Repository, TableRepository};
use crate::view::{category_row_view, list_view_model, CategoryRowView, ListViewModel};
use crate::AppState;

use super::budget_cmd::group_categories;
use super::required_text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingOverview {
    /// Purchased items against allocations
    pub rollup: Rollup,
    pub categories: Vec<CategoryRowView>,
}

async fn group_items(state: &AppState, group_id: i64) -> DomainResult<Vec<ShoppingItem>> {
    let items: TableRepository<ShoppingItem> = TableRepository::new(state.store.clone());
    items.list_where(&Query::new().eq("group_id", group_id)).await
}

pub async fn get_shopping_categories(state: &AppState) -> DomainResult<ShoppingOverview> {
    let ctx = state.session().await?;
    let categories = group_categories(state, ctx.group_id).await?;
    let items = group_items(state, ctx.group_id).await?;
    Ok(ShoppingOverview {
        rollup: compute_rollup(&categories, &items),
        categories: category_breakdown(&categories, &items)
            .iter()
            .map(category_row_view)
            .collect(),
    })
}

pub async fn create_category(state: &AppState, name: &str, budget: Option<f64>) -> DomainResult<Category> {
    let ctx = state.session().await?;
    let name = required_text(name, "category name")?;
    if let Some(budget) = budget {
        if !budget.is_finite() || budget < 0.0 {
            return Err(DomainError::InvalidInput("budget must be a non-negative number".to_string()));
        }
    }
    let categories: TableRepository<Category> = TableRepository::new(state.store.clone());
    let created = categories.create(&Category::new(ctx.group_id, name, budget)).await?;
    log::info!("created category {} in group {}", created.id, ctx.group_id);
    Ok(created)
}

async fn find_category(state: &AppState, group_id: i64, category_id: i64) -> DomainResult<Category> {
    let categories: TableRepository<Category> = TableRepository::new(state.store.clone());
    categories
        .find_one(&Query::new().eq("id", category_id).eq("group_id", group_id))
        .await?
        .ok_or_else(|| DomainError::MissingContext("Category".to_string()))
}

/// Items of one category, newest first
pub async fn get_shopping_items(state: &AppState, category_id: i64) -> DomainResult<ListViewModel> {
    let ctx = state.session().await?;
    let category = find_category(state, ctx.group_id, category_id).await?;
    let items: TableRepository<ShoppingItem> = TableRepository::new(state.store.clone());
    let items = items
        .list_where(
            &Query::new()
                .eq("category_id", category_id)
                .eq("group_id", ctx.group_id)
                .order_by("created_at", false),
        )
        .await?;
    Ok(list_view_model(&category, &items))
}

/// Sum of purchased item prices in one category
pub async fn get_purchased_spending(state: &AppState, category_id: i64) -> DomainResult<f64> {
    let ctx = state.session().await?;
    let items = group_items(state, ctx.group_id).await?;
    Ok(spent_in_category(&items, category_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup_test_state;
    use crate::session::{redirect_for, Redirect};
    use crate::view::EMPTY_LIST_PLACEHOLDER;

    async fn add(state: &AppState, category: &Category, name: &str, price: f64, purchased: bool) {
        let items: TableRepository<ShoppingItem> = TableRepository::new(state.store.clone());
        let mut item = ShoppingItem::new(category.id, category.group_id, name.to_string(), price);
        item.is_purchased = purchased;
        items.create(&item).await.unwrap();
    }

    #[tokio::test]
    async fn test_overview_counts_purchased_only() {
        let state = setup_test_state().await;
        let jewellery = create_category(&state, "Jewellery", Some(1000.0)).await.unwrap();
        add(&state, &jewellery, "Maang tikka", 750.0, true).await;
        add(&state, &jewellery, "Nath", 400.0, false).await;

        let overview = get_shopping_categories(&state).await.unwrap();
        assert_eq!(overview.rollup.total_spent, 750.0);
        assert_eq!(overview.categories[0].items_label, "1/2 items bought");
        assert_eq!(overview.categories[0].budget_label, "Spent: ₹750 / Allocated: ₹1,000");
        assert_eq!(overview.categories[0].progress, 75.0);
        assert_eq!(get_purchased_spending(&state, jewellery.id).await.unwrap(), 750.0);
    }

    #[tokio::test]
    async fn test_items_newest_first() {
        let state = setup_test_state().await;
        let outfits = create_category(&state, "Outfits", None).await.unwrap();

        let empty = get_shopping_items(&state, outfits.id).await.unwrap();
        assert_eq!(empty.placeholder.as_deref(), Some(EMPTY_LIST_PLACEHOLDER));

        add(&state, &outfits, "Sherwani", 9000.0, false).await;
        add(&state, &outfits, "Mojari", 1500.0, false).await;
        let model = get_shopping_items(&state, outfits.id).await.unwrap();
        let names: Vec<&str> = model.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mojari", "Sherwani"]);
        assert_eq!(model.category_name, "Outfits");
    }

    #[tokio::test]
    async fn test_unknown_category_redirects_to_index() {
        let state = setup_test_state().await;
        let err = get_shopping_items(&state, 404).await.unwrap_err();
        assert_eq!(redirect_for(&err), Some(Redirect::ShoppingIndex));
    }

    #[tokio::test]
    async fn test_category_validation() {
        let state = setup_test_state().await;
        assert!(create_category(&state, "  ", None).await.is_err());
        assert!(create_category(&state, "Gifts", Some(-1.0)).await.is_err());
        let gifts = create_category(&state, " Gifts ", Some(0.0)).await.unwrap();
        assert_eq!(gifts.name, "Gifts");
    }
}
