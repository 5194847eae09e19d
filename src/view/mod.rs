//! View Layer
//!
//! View models, display formatting and the list rendering boundary.

mod format;
mod model;
mod render;

pub use format::{format_currency, format_percent, format_short_date};
pub use model::{
    budget_summary_view, category_row_view, list_view_model, task_row_view, transaction_row_view,
    vendor_card_view, BudgetSummaryView, CategoryRowView, ItemRowView, ListViewModel, TaskRowView,
    TransactionRowView, VendorCardView, EMPTY_LIST_PLACEHOLDER, NO_TASKS_PLACEHOLDER,
    NO_TRANSACTIONS_PLACEHOLDER,
};
pub use render::{Control, ControlId, ListRenderer, ListView, RenderPatch, RowBindings, RowHandle};
