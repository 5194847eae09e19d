//! GoTrue-style auth over HTTP

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::RestClient;
use crate::domain::{DomainError, DomainResult, Session, User};
use crate::repository::traits::AuthService;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<AuthUser> for User {
    fn from(user: AuthUser) -> Self {
        let name = user
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
        User {
            id: user.id,
            email: user.email,
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

fn otp_body(phone: &str) -> Value {
    json!({ "phone": phone, "create_user": true })
}

fn verify_body(phone: &str, token: &str) -> Value {
    json!({ "type": "sms", "phone": phone, "token": token })
}

pub struct RestAuth {
    client: RestClient,
}

impl RestAuth {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    async fn establish(&self, response: TokenResponse) -> DomainResult<Session> {
        match (response.access_token, response.user) {
            (Some(access_token), Some(user)) => {
                self.client.set_access_token(Some(access_token.clone())).await;
                Ok(Session {
                    access_token,
                    user: user.into(),
                })
            }
            // Sign-up with email confirmation enabled returns no session
            (None, Some(_)) => Err(DomainError::Remote(
                "Check your email to confirm your account".to_string(),
            )),
            _ => Err(DomainError::Remote("Auth response had no session".to_string())),
        }
    }
}

#[async_trait]
impl AuthService for RestAuth {
    async fn is_authenticated(&self) -> bool {
        matches!(self.current_user().await, Ok(Some(_)))
    }

    async fn current_user(&self) -> DomainResult<Option<User>> {
        if self.client.access_token().await.is_none() {
            return Ok(None);
        }
        let request = self.client.http().get(self.client.url("auth/v1/user"));
        match self.client.send_json::<AuthUser>(request).await {
            Ok(user) => Ok(Some(user.into())),
            Err(DomainError::Unauthenticated) => {
                self.client.set_access_token(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let request = self
            .client
            .http()
            .post(self.client.url("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let response: TokenResponse = self.client.send_json(request).await?;
        let session = self.establish(response).await?;
        log::info!("signed in as {}", session.user.id);
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> DomainResult<Session> {
        let request = self
            .client
            .http()
            .post(self.client.url("auth/v1/signup"))
            .json(&json!({ "email": email, "password": password, "data": { "name": name } }));
        let response: TokenResponse = self.client.send_json(request).await?;
        self.establish(response).await
    }

    async fn send_otp(&self, phone: &str) -> DomainResult<()> {
        let request = self
            .client
            .http()
            .post(self.client.url("auth/v1/otp"))
            .json(&otp_body(phone));
        self.client.send(request).await?;
        log::info!("sign-in code sent to {}", phone);
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, token: &str) -> DomainResult<Session> {
        let request = self
            .client
            .http()
            .post(self.client.url("auth/v1/verify"))
            .json(&verify_body(phone, token.trim()));
        let response: TokenResponse = self.client.send_json(request).await?;
        let session = self.establish(response).await?;
        log::info!("signed in by phone as {}", session.user.id);
        Ok(session)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        if self.client.access_token().await.is_some() {
            let request = self.client.http().post(self.client.url("auth/v1/logout"));
            if let Err(e) = self.client.send(request).await {
                log::warn!("remote sign out failed: {}", e);
            }
        }
        self.client.set_access_token(None).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_metadata_name() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id": "u-1", "email": "a@b.in", "user_metadata": {"name": "Meera"}}"#,
        )
        .unwrap();
        let user: User = user.into();
        assert_eq!(user.name.as_deref(), Some("Meera"));
    }

    #[test]
    fn test_phone_sign_in_bodies() {
        assert_eq!(otp_body("+919876543210")["phone"], "+919876543210");
        assert_eq!(
            verify_body("+919876543210", "123456"),
            json!({"type": "sms", "phone": "+919876543210", "token": "123456"})
        );
    }

    #[tokio::test]
    async fn test_phone_session_has_no_email() {
        let auth = RestAuth::new(RestClient::new("http://127.0.0.1:9", "anon"));
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "jwt", "user": {"id": "u-2", "phone": "919876543210"}}"#,
        )
        .unwrap();
        let session = auth.establish(response).await.unwrap();
        assert_eq!(session.user.email, None);
        assert_eq!(auth.client.access_token().await.as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn test_signed_out_client_has_no_user() {
        let auth = RestAuth::new(RestClient::new("http://127.0.0.1:9", "anon"));
        assert_eq!(auth.current_user().await, Ok(None));
        assert!(!auth.is_authenticated().await);
        assert_eq!(auth.sign_out().await, Ok(()));
    }
}
