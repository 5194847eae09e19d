//! Group and profile commands
//!
//! Creating and joining wedding groups, membership listing, the profile
//! page and the auth entry points.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    generate_invite_code, is_valid_invite_code, normalize_invite_code, DomainError, DomainResult,
    GroupMember, MemberRole, Session, UserGroup, WeddingGroup,
};
use crate::repository::{AuthService, Query, Repository, TableRepository};
use crate::session::require_user;
use crate::AppState;

use super::required_text;

/// Attempts at finding an unused invite code
const INVITE_CODE_ATTEMPTS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub groups: Vec<UserGroup>,
}

pub async fn sign_in(state: &AppState, email: &str, password: &str) -> DomainResult<Session> {
    state.auth.sign_in(email, password).await
}

pub async fn sign_up(state: &AppState, email: &str, password: &str, name: Option<&str>) -> DomainResult<Session> {
    state.auth.sign_up(email, password, name).await
}

/// Text a one-time sign-in code
pub async fn send_otp(state: &AppState, phone: &str) -> DomainResult<()> {
    let phone = required_text(phone, "phone number")?;
    state.auth.send_otp(&phone).await
}

/// Sign in with a texted code
pub async fn verify_otp(state: &AppState, phone: &str, token: &str) -> DomainResult<Session> {
    let phone = required_text(phone, "phone number")?;
    let token = required_text(token, "verification code")?;
    state.auth.verify_otp(&phone, &token).await
}

/// Sign out and forget the selected group
pub async fn sign_out(state: &AppState) -> DomainResult<()> {
    state.auth.sign_out().await?;
    state.selection.write().await.clear();
    log::info!("signed out");
    Ok(())
}

/// Create a group owned by the current user and select it
pub async fn create_group(state: &AppState, name: &str, wedding_date: Option<NaiveDate>) -> DomainResult<WeddingGroup> {
    let user = require_user(state.auth.as_ref()).await?;
    let name = required_text(name, "group name")?;
    let groups: TableRepository<WeddingGroup> = TableRepository::new(state.store.clone());

    let seed = Utc::now().timestamp_millis();
    let mut attempt = 0;
    let group = loop {
        let group = WeddingGroup {
            id: 0,
            name: name.clone(),
            wedding_date,
            created_by: Some(user.id.clone()),
            invite_code: Some(generate_invite_code(&name, &user.id, seed + attempt)),
            created_at: None,
        };
        match groups.create(&group).await {
            Ok(created) => break created,
            // Invite code already taken
            Err(DomainError::Conflict(_)) if attempt + 1 < INVITE_CODE_ATTEMPTS => attempt += 1,
            Err(e) => return Err(e),
        }
    };

    add_member(state, group.id, &user.id, MemberRole::Owner).await?;
    state.select_group(group.id).await;
    log::info!("created group {} ({})", group.id, group.name);
    Ok(group)
}

pub async fn add_member(state: &AppState, group_id: i64, user_id: &str, role: MemberRole) -> DomainResult<GroupMember> {
    let members: TableRepository<GroupMember> = TableRepository::new(state.store.clone());
    members
        .create(&GroupMember {
            id: 0,
            group_id,
            user_id: user_id.to_string(),
            role,
            created_at: None,
        })
        .await
}

/// Groups of the current user with their role in each
pub async fn list_user_groups(state: &AppState) -> DomainResult<Vec<UserGroup>> {
    let user = require_user(state.auth.as_ref()).await?;
    let members: TableRepository<GroupMember> = TableRepository::new(state.store.clone());
    let groups: TableRepository<WeddingGroup> = TableRepository::new(state.store.clone());

    let memberships = members
        .list_where(&Query::new().eq("user_id", user.id.as_str()).order_by("id", true))
        .await?;
    let mut result = Vec::with_capacity(memberships.len());
    for member in &memberships {
        match groups.find_by_id(member.group_id).await? {
            Some(group) => result.push(UserGroup::from_parts(&group, member)),
            None => log::warn!("membership {} points at missing group {}", member.id, member.group_id),
        }
    }
    Ok(result)
}

/// Join the group behind an invite code and select it
pub async fn join_group(state: &AppState, invite_code: &str) -> DomainResult<UserGroup> {
    let user = require_user(state.auth.as_ref()).await?;
    let code = normalize_invite_code(invite_code);
    if !is_valid_invite_code(&code) {
        return Err(DomainError::InvalidInput("Invalid invite code".to_string()));
    }

    let groups: TableRepository<WeddingGroup> = TableRepository::new(state.store.clone());
    let group = groups
        .find_one(&Query::new().eq("invite_code", code.as_str()))
        .await?
        .ok_or_else(|| DomainError::NotFound("No group found for this invite code".to_string()))?;

    let members: TableRepository<GroupMember> = TableRepository::new(state.store.clone());
    let existing = members
        .find_one(&Query::new().eq("group_id", group.id).eq("user_id", user.id.as_str()))
        .await?;
    let member = match existing {
        Some(member) => member,
        None => add_member(state, group.id, &user.id, MemberRole::Member).await?,
    };

    state.select_group(group.id).await;
    log::info!("user {} joined group {}", user.id, group.id);
    Ok(UserGroup::from_parts(&group, &member))
}

/// Select one of the user's groups as the working group
pub async fn select_group(state: &AppState, group_id: i64) -> DomainResult<UserGroup> {
    let group = list_user_groups(state)
        .await?
        .into_iter()
        .find(|g| g.id == group_id)
        .ok_or_else(|| DomainError::NotFound(format!("group {}", group_id)))?;
    state.select_group(group.id).await;
    Ok(group)
}

pub async fn get_profile(state: &AppState) -> DomainResult<Profile> {
    let user = require_user(state.auth.as_ref()).await?;
    Ok(Profile {
        name: user.name,
        email: user.email,
        groups: list_user_groups(state).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup_test_state;
    use crate::domain::INVITE_CODE_LEN;
    use crate::repository::LocalAuth;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_group_makes_owner() {
        let state = setup_test_state().await;
        let groups = list_user_groups(&state).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].role, MemberRole::Owner);

        let code = groups[0].invite_code.clone().unwrap();
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(is_valid_invite_code(&code));
        assert_eq!(state.selection.read().await.group_id(), Some(groups[0].id));
    }

    #[tokio::test]
    async fn test_join_by_invite_code() {
        let state = setup_test_state().await;
        let code = list_user_groups(&state).await.unwrap()[0].invite_code.clone().unwrap();

        sign_out(&state).await.unwrap();
        assert!(state.selection.read().await.group_id().is_none());
        sign_up(&state, "sister@example.com", "secret123", None).await.unwrap();

        let joined = join_group(&state, &format!("  {} ", code.to_lowercase())).await.unwrap();
        assert_eq!(joined.role, MemberRole::Member);
        assert_eq!(state.session().await.unwrap().group_id, joined.id);

        // Joining twice keeps the one membership
        join_group(&state, &code).await.unwrap();
        assert_eq!(list_user_groups(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_join_rejects_unknown_codes() {
        let state = setup_test_state().await;
        assert!(matches!(join_group(&state, "bad").await, Err(DomainError::InvalidInput(_))));
        assert!(matches!(join_group(&state, "ZZZZZZZZ").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_profile() {
        let state = setup_test_state().await;
        let profile = get_profile(&state).await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Asha"));
        assert_eq!(profile.groups[0].name, "Asha & Rohan");

        sign_out(&state).await.unwrap();
        assert_eq!(get_profile(&state).await, Err(DomainError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_phone_sign_in_then_join() {
        let mut state = setup_test_state().await;
        let code = list_user_groups(&state).await.unwrap()[0].invite_code.clone().unwrap();
        let local = Arc::new(LocalAuth::new());
        state.auth = local.clone();

        assert!(matches!(send_otp(&state, "  ").await, Err(DomainError::InvalidInput(_))));
        send_otp(&state, " +919876543210 ").await.unwrap();
        let otp = local.pending_code("+919876543210").await.unwrap();
        assert!(matches!(verify_otp(&state, "+919876543210", "").await, Err(DomainError::InvalidInput(_))));

        let session = verify_otp(&state, "+919876543210", &otp).await.unwrap();
        assert_eq!(require_user(state.auth.as_ref()).await.unwrap(), session.user);
        let joined = join_group(&state, &code).await.unwrap();
        assert_eq!(joined.role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_select_group_requires_membership() {
        let state = setup_test_state().await;
        assert!(select_group(&state, 999).await.is_err());
        let second = create_group(&state, "Reception", None).await.unwrap();
        assert_eq!(select_group(&state, second.id).await.unwrap().name, "Reception");
    }
}
