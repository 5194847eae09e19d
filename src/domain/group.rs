//! Wedding Group Entities
//!
//! Groups own every other record. Users join a group as members with a
//! role; new members find a group through its invite code.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{Entity, TableRecord};

const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const INVITE_CODE_LEN: usize = 8;

/// A wedding planning group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeddingGroup {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub wedding_date: Option<NaiveDate>,
    /// Auth user id of the creator
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for WeddingGroup {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for WeddingGroup {
    const TABLE: &'static str = "wedding_groups";
}

/// Role of a member inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Created the group
    Owner,
    Admin,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "owner" => MemberRole::Owner,
            "admin" => MemberRole::Admin,
            _ => MemberRole::Member,
        }
    }
}

/// Membership row linking a user to a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    #[serde(default)]
    pub id: i64,
    pub group_id: i64,
    pub user_id: String,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for GroupMember {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl TableRecord for GroupMember {
    const TABLE: &'static str = "group_members";
}

/// A group as seen by one of its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGroup {
    pub id: i64,
    pub name: String,
    pub wedding_date: Option<NaiveDate>,
    pub role: MemberRole,
    pub invite_code: Option<String>,
}

impl UserGroup {
    pub fn from_parts(group: &WeddingGroup, member: &GroupMember) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            wedding_date: group.wedding_date,
            role: member.role,
            invite_code: group.invite_code.clone(),
        }
    }
}

/// Derive an invite code from the group name, creator and a salt
pub fn generate_invite_code(group_name: &str, user_id: &str, salt: i64) -> String {
    let hash = blake3::hash(format!("{}:{}:{}", group_name, user_id, salt).as_bytes());
    hash.as_bytes()
        .iter()
        .take(INVITE_CODE_LEN)
        .map(|b| INVITE_ALPHABET[*b as usize % INVITE_ALPHABET.len()] as char)
        .collect()
}

/// Upper-case and trim user-typed codes
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_valid_invite_code(code: &str) -> bool {
    code.len() == INVITE_CODE_LEN && code.bytes().all(|b| INVITE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_code_format() {
        let code = generate_invite_code("Riya & Arjun", "user-1", 42);
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(is_valid_invite_code(&code));
        assert_eq!(code, generate_invite_code("Riya & Arjun", "user-1", 42));
        assert_ne!(code, generate_invite_code("Riya & Arjun", "user-1", 43));
    }

    #[test]
    fn test_invite_code_normalization() {
        assert_eq!(normalize_invite_code("  abcd2345 "), "ABCD2345");
        assert!(!is_valid_invite_code("ABCD1345")); // '1' is excluded
        assert!(!is_valid_invite_code("ABC"));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::from_str("admin"), MemberRole::Admin);
        assert_eq!(MemberRole::from_str("bride"), MemberRole::Member);
    }
}
