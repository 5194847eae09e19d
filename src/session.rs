//! Page Gates
//!
//! Every page checks authentication and its required context before it
//! loads data. A failed gate yields a `Redirect` instead of partial data.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, GroupSelection, SessionContext, User};
use crate::repository::AuthService;

/// Where a page sends the user when a gate fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Redirect {
    Login,
    Home,
    /// Category overview of the shopping section
    ShoppingIndex,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login => "/login.html",
            Redirect::Home => "/index.html",
            Redirect::ShoppingIndex => "/shopping/index.html",
        }
    }
}

/// Redirect for gate failures; other errors are shown inline
pub fn redirect_for(error: &DomainError) -> Option<Redirect> {
    match error {
        DomainError::Unauthenticated => Some(Redirect::Login),
        DomainError::MissingContext(what) if what == "Category" => Some(Redirect::ShoppingIndex),
        DomainError::MissingContext(_) => Some(Redirect::Home),
        _ => None,
    }
}

pub async fn require_user(auth: &dyn AuthService) -> DomainResult<User> {
    if !auth.is_authenticated().await {
        return Err(DomainError::Unauthenticated);
    }
    auth.current_user().await?.ok_or(DomainError::Unauthenticated)
}

pub fn require_group(selection: &GroupSelection) -> DomainResult<i64> {
    selection.require()
}

/// Category id from the page's query parameter
pub fn require_category(raw: Option<&str>) -> DomainResult<i64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| DomainError::MissingContext("Category".to_string()))
}

/// Both gates of a group page, in the order pages run them
pub async fn require_session(auth: &dyn AuthService, selection: &GroupSelection) -> DomainResult<SessionContext> {
    let user = require_user(auth).await?;
    let group_id = require_group(selection)?;
    Ok(SessionContext::new(user, group_id))
}
