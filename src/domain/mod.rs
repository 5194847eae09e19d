//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer does no I/O; records are plain serde structs.

mod category;
mod context;
mod entity;
mod group;
mod item;
mod task;
mod transaction;
mod user;
mod vendor;

pub use category::Category;
pub use context::{GroupSelection, ListScope, SessionContext};
pub use entity::{DomainError, DomainResult, Entity, TableRecord};
pub use group::{
    generate_invite_code, is_valid_invite_code, normalize_invite_code, GroupMember, MemberRole,
    UserGroup, WeddingGroup, INVITE_CODE_LEN,
};
pub use item::ShoppingItem;
pub use task::{DueStatus, Task, TaskFilter, TaskSort, DUE_SOON_DAYS};
pub use transaction::Transaction;
pub use user::{Session, User};
pub use vendor::{ContactLinks, Vendor};
