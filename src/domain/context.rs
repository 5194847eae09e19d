//! Explicit page context
//!
//! The selected group and category are passed around as values instead of
//! being read from ambient page storage.

use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult};
use super::user::User;

/// Currently selected group for this page session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSelection {
    group_id: Option<i64>,
}

impl GroupSelection {
    pub fn new(group_id: Option<i64>) -> Self {
        Self { group_id }
    }

    pub fn select(&mut self, group_id: i64) {
        self.group_id = Some(group_id);
    }

    pub fn clear(&mut self) {
        self.group_id = None;
    }

    pub fn group_id(&self) -> Option<i64> {
        self.group_id
    }

    pub fn require(&self) -> DomainResult<i64> {
        self.group_id
            .ok_or_else(|| DomainError::MissingContext("Group".to_string()))
    }
}

/// Authenticated user acting inside a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user: User,
    pub group_id: i64,
}

impl SessionContext {
    pub fn new(user: User, group_id: i64) -> Self {
        Self { user, group_id }
    }

    /// Scope of one category's list inside this group
    pub fn list_scope(&self, category_id: i64) -> ListScope {
        ListScope {
            category_id,
            group_id: self.group_id,
        }
    }
}

/// Server-side collection a live list mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListScope {
    pub category_id: i64,
    pub group_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_selection() {
        let mut selection = GroupSelection::default();
        assert_eq!(selection.require(), Err(DomainError::MissingContext("Group".to_string())));
        selection.select(4);
        assert_eq!(selection.require(), Ok(4));
        selection.clear();
        assert!(selection.group_id().is_none());
    }
}
