//! Commands Layer
//!
//! Page-level operations over `AppState`. Each one runs the page gates
//! first, so callers can map failures with `session::redirect_for`.

mod budget_cmd;
mod group_cmd;
mod shopping_cmd;
mod task_cmd;
mod vendor_cmd;

pub use budget_cmd::*;
pub use group_cmd::*;
pub use shopping_cmd::*;
pub use task_cmd::*;
pub use vendor_cmd::*;

use crate::domain::DomainError;

/// Trimmed, non-empty text field
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Blank optional fields are stored as null
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
