//! Aggregation Engine
//!
//! Pure budget arithmetic over categories and spend records. Budget view
//! counts every transaction as spent; the shopping view counts only
//! purchased items. Both go through the `Spend` trait.
//!
//! Aggregate figures are never clamped (remaining may be negative and the
//! percentage may exceed 100). Per-category progress is clamped to [0, 100].

use serde::{Deserialize, Serialize};

use crate::domain::{Category, ShoppingItem, Transaction};

/// Something with an allocated budget
pub trait Allocation {
    /// Null allocations count as zero
    fn allocated(&self) -> f64;
}

impl Allocation for Category {
    fn allocated(&self) -> f64 {
        Category::allocated(self)
    }
}

/// A record that may count toward a category's spend
pub trait Spend {
    fn category_id(&self) -> i64;

    /// Null amounts count as zero
    fn amount(&self) -> f64;

    fn counts_as_spent(&self) -> bool;

    fn spent(&self) -> f64 {
        if self.counts_as_spent() {
            self.amount()
        } else {
            0.0
        }
    }
}

impl Spend for Transaction {
    fn category_id(&self) -> i64 {
        self.category_id
    }

    fn amount(&self) -> f64 {
        Transaction::amount(self)
    }

    fn counts_as_spent(&self) -> bool {
        true
    }
}

impl Spend for ShoppingItem {
    fn category_id(&self) -> i64 {
        self.category_id
    }

    fn amount(&self) -> f64 {
        self.price()
    }

    fn counts_as_spent(&self) -> bool {
        self.is_purchased
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rollup {
    pub total_allocated: f64,
    pub total_spent: f64,
    /// allocated - spent; negative when over budget
    pub remaining: f64,
    /// Rounded percentage, 0 when nothing is allocated
    pub percentage_spent: i64,
}

impl Rollup {
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Rounded share of `allocated` that `spent` represents (half rounds up)
pub fn percentage_of(spent: f64, allocated: f64) -> i64 {
    if allocated > 0.0 {
        (spent / allocated * 100.0 + 0.5).floor() as i64
    } else {
        0
    }
}

/// Progress bar value, clamped to [0, 100]
pub fn category_progress(spent: f64, allocated: f64) -> f64 {
    if allocated > 0.0 {
        (spent / allocated * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn compute_rollup<C: Allocation, S: Spend>(categories: &[C], items: &[S]) -> Rollup {
    let total_allocated: f64 = categories.iter().map(Allocation::allocated).sum();
    let total_spent: f64 = items.iter().map(Spend::spent).sum();
    Rollup {
        total_allocated,
        total_spent,
        remaining: total_allocated - total_spent,
        percentage_spent: percentage_of(total_spent, total_allocated),
    }
}

pub fn spent_in_category<S: Spend>(items: &[S], category_id: i64) -> f64 {
    items
        .iter()
        .filter(|i| i.category_id() == category_id)
        .map(Spend::spent)
        .sum()
}

/// One category's row on the budget or shopping overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category_id: i64,
    pub name: String,
    pub allocated: f64,
    pub spent: f64,
    /// Clamped to [0, 100]
    pub progress: f64,
    /// Records that count as spent (purchased items)
    pub purchased_count: usize,
    pub total_count: usize,
}

pub fn category_breakdown<S: Spend>(categories: &[Category], items: &[S]) -> Vec<CategoryProgress> {
    categories
        .iter()
        .map(|category| {
            let in_category: Vec<&S> = items.iter().filter(|i| i.category_id() == category.id).collect();
            let spent: f64 = in_category.iter().map(|i| i.spent()).sum();
            let allocated = category.allocated();
            CategoryProgress {
                category_id: category.id,
                name: category.name.clone(),
                allocated,
                spent,
                progress: category_progress(spent, allocated),
                purchased_count: in_category.iter().filter(|i| i.counts_as_spent()).count(),
                total_count: in_category.len(),
            }
        })
        .collect()
}

/// Pie chart slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSlice {
    pub category_id: i64,
    pub name: String,
    pub spent: f64,
    pub color: String,
}

/// Evenly spaced hues, one per slice
pub fn chart_colors(count: usize) -> Vec<String> {
    let step = 360.0 / count.max(1) as f64;
    (0..count)
        .map(|i| format!("hsl({}, 70%, 60%)", i as f64 * step))
        .collect()
}

pub fn spending_by_category<S: Spend>(categories: &[Category], items: &[S]) -> Vec<SpendingSlice> {
    let colors = chart_colors(categories.len());
    categories
        .iter()
        .zip(colors)
        .map(|(category, color)| SpendingSlice {
            category_id: category.id,
            name: category.name.clone(),
            spent: spent_in_category(items, category.id),
            color,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn category(id: i64, budget: Option<f64>) -> Category {
        let mut c = Category::new(1, format!("Category {}", id), budget);
        c.id = id;
        c
    }

    fn expense(category_id: i64, amount: Option<f64>) -> Transaction {
        let mut t = Transaction::new(1, category_id, 0.0, "expense".to_string(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        t.amount = amount;
        t
    }

    fn item(category_id: i64, price: f64, purchased: bool) -> ShoppingItem {
        let mut i = ShoppingItem::new(category_id, 1, "item".to_string(), price);
        i.is_purchased = purchased;
        i
    }

    #[test]
    fn test_empty_rollup_is_zero() {
        let rollup = compute_rollup::<Category, Transaction>(&[], &[]);
        assert_eq!(rollup, Rollup::default());
        assert!(!rollup.is_over_budget());
    }

    #[test]
    fn test_rollup_under_budget() {
        let rollup = compute_rollup(&[category(1, Some(1000.0))], &[expense(1, Some(500.0)), expense(1, Some(250.0))]);
        assert_eq!(rollup.total_allocated, 1000.0);
        assert_eq!(rollup.total_spent, 750.0);
        assert_eq!(rollup.remaining, 250.0);
        assert_eq!(rollup.percentage_spent, 75);
    }

    #[test]
    fn test_rollup_without_allocation() {
        let rollup = compute_rollup(&[category(1, None)], &[expense(1, Some(200.0))]);
        assert_eq!(rollup.remaining, -200.0);
        assert_eq!(rollup.percentage_spent, 0);
        assert!(rollup.is_over_budget());
    }

    #[test]
    fn test_aggregate_not_clamped_but_category_is() {
        let categories = [category(1, Some(1000.0))];
        let items = [expense(1, Some(1200.0))];

        let rollup = compute_rollup(&categories, &items);
        assert_eq!(rollup.percentage_spent, 120);
        assert_eq!(rollup.remaining, -200.0);

        let breakdown = category_breakdown(&categories, &items);
        assert_eq!(breakdown[0].progress, 100.0);
        assert_eq!(breakdown[0].spent, 1200.0);
    }

    #[test]
    fn test_null_amounts_count_as_zero() {
        let rollup = compute_rollup(&[category(1, Some(100.0))], &[expense(1, None), expense(1, Some(10.0))]);
        assert_eq!(rollup.total_spent, 10.0);
    }

    #[test]
    fn test_half_rounds_up() {
        assert_eq!(percentage_of(1.0, 8.0), 13); // 12.5
        assert_eq!(percentage_of(1.0, 3.0), 33);
        assert_eq!(percentage_of(2.0, 3.0), 67);
    }

    #[test]
    fn test_only_purchased_items_count() {
        let categories = [category(1, Some(1000.0)), category(2, Some(0.0))];
        let items = [item(1, 300.0, true), item(1, 400.0, false), item(2, 50.0, true)];

        let rollup = compute_rollup(&categories, &items);
        assert_eq!(rollup.total_spent, 350.0);

        let breakdown = category_breakdown(&categories, &items);
        assert_eq!((breakdown[0].purchased_count, breakdown[0].total_count), (1, 2));
        assert_eq!(breakdown[0].progress, 30.0);
        assert_eq!(breakdown[1].progress, 0.0);
    }

    #[test]
    fn test_spending_slices() {
        let categories = [category(1, None), category(2, None), category(3, None)];
        let slices = spending_by_category(&categories, &[expense(2, Some(75.0))]);
        assert_eq!(slices[1].spent, 75.0);
        assert_eq!(slices[0].spent, 0.0);
        assert_eq!(
            slices.iter().map(|s| s.color.as_str()).collect::<Vec<_>>(),
            vec!["hsl(0, 70%, 60%)", "hsl(120, 70%, 60%)", "hsl(240, 70%, 60%)"]
        );
    }
}
