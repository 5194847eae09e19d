//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities must have a unique ID and be thread-safe.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Copy + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Entity stored as a row of a named remote collection
pub trait TableRecord: Entity<Id = i64> + Serialize + DeserializeOwned {
    /// Collection (table) name in the record store
    const TABLE: &'static str;
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    /// No authenticated session; callers redirect to the login view
    Unauthenticated,
    /// Required page context (group, category) is not selected
    MissingContext(String),
    /// Remote operation failed (network or server-side validation)
    Remote(String),
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    Internal(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::Unauthenticated => write!(f, "User not authenticated"),
            DomainError::MissingContext(msg) => write!(f, "{} not selected", msg),
            DomainError::Remote(msg) => write!(f, "{}", msg),
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// Deserialize `null` as the type's default (remote rows may carry nulls)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
