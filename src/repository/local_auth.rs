//! In-process auth
//!
//! User registry for the local backend. Passwords are kept as keyed
//! blake3 digests; sessions carry an opaque base64 token. Phone sign-in
//! codes never leave the process: they are logged and readable through
//! `pending_code`.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::traits::AuthService;
use crate::domain::{DomainError, DomainResult, Session, User};

const DIGEST_CONTEXT: &str = "shaadi-cart local auth password v1";
const OTP_CONTEXT: &str = "shaadi-cart local auth phone code v1";
pub const MIN_PASSWORD_LEN: usize = 6;
/// How long a texted code stays valid
pub const OTP_TTL_MINUTES: i64 = 5;
const INVALID_OTP: &str = "Token has expired or is invalid";

struct Account {
    user: User,
    password_digest: blake3::Hash,
}

struct PendingCode {
    code: String,
    issued_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct LocalAuth {
    accounts: RwLock<HashMap<String, Account>>,
    phone_users: RwLock<HashMap<String, User>>,
    pending_codes: RwLock<HashMap<String, PendingCode>>,
    session: RwLock<Option<Session>>,
}

fn password_digest(email: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(DIGEST_CONTEXT);
    hasher.update(email.as_bytes());
    hasher.update(&[0]);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn user_id(email: &str) -> String {
    let hex = blake3::hash(email.as_bytes()).to_hex();
    format!("{}-{}-{}-{}-{}", &hex[0..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..32])
}

/// `+` and 8 to 15 digits once spaces and dashes are dropped
fn normalize_phone(phone: &str) -> DomainResult<String> {
    let compact: String = phone.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let digits = compact.strip_prefix('+').unwrap_or_default();
    if (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(DomainError::InvalidInput(
            "phone number must include the country code, like +919876543210".to_string(),
        ))
    }
}

fn otp_code(phone: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut hasher = blake3::Hasher::new_derive_key(OTP_CONTEXT);
    hasher.update(phone.as_bytes());
    hasher.update(&nanos.to_le_bytes());
    let digest = hasher.finalize();
    let mut head = [0u8; 4];
    head.copy_from_slice(&digest.as_bytes()[..4]);
    format!("{:06}", u32::from_le_bytes(head) % 1_000_000)
}

fn issue_token(user: &User) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let digest = blake3::hash(format!("{}:{}", user.id, nanos).as_bytes());
    URL_SAFE_NO_PAD.encode(digest.as_bytes())
}

impl LocalAuth {
    pub fn new() -> Self {
        Self::default()
    }

    async fn start_session(&self, user: User) -> Session {
        let session = Session {
            access_token: issue_token(&user),
            user,
        };
        *self.session.write().await = Some(session.clone());
        session
    }

    /// The unexpired code last sent to `phone`
    pub async fn pending_code(&self, phone: &str) -> Option<String> {
        let phone = normalize_phone(phone).ok()?;
        let pending = self.pending_codes.read().await;
        pending
            .get(&phone)
            .filter(|p| Utc::now() - p.issued_at <= Duration::minutes(OTP_TTL_MINUTES))
            .map(|p| p.code.clone())
    }
}

#[async_trait]
impl AuthService for LocalAuth {
    async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn current_user(&self) -> DomainResult<Option<User>> {
        Ok(self.session.read().await.as_ref().map(|s| s.user.clone()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Session> {
        let email = email.trim().to_lowercase();
        let user = {
            let accounts = self.accounts.read().await;
            match accounts.get(&email) {
                Some(account) if account.password_digest == password_digest(&email, password) => {
                    account.user.clone()
                }
                _ => return Err(DomainError::Remote("Invalid login credentials".to_string())),
            }
        };
        Ok(self.start_session(user).await)
    }

    async fn sign_up(&self, email: &str, password: &str, name: Option<&str>) -> DomainResult<Session> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(DomainError::InvalidInput("email address is invalid".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user = User {
            id: user_id(&email),
            email: Some(email.clone()),
            name: name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string),
        };
        {
            let mut accounts = self.accounts.write().await;
            if accounts.contains_key(&email) {
                return Err(DomainError::Conflict("User already registered".to_string()));
            }
            accounts.insert(
                email.clone(),
                Account {
                    user: user.clone(),
                    password_digest: password_digest(&email, password),
                },
            );
        }
        log::info!("registered local user {}", user.id);
        Ok(self.start_session(user).await)
    }

    async fn send_otp(&self, phone: &str) -> DomainResult<()> {
        let phone = normalize_phone(phone)?;
        let code = otp_code(&phone);
        log::info!("sign-in code for {}: {}", phone, code);
        self.pending_codes.write().await.insert(
            phone,
            PendingCode {
                code,
                issued_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn verify_otp(&self, phone: &str, token: &str) -> DomainResult<Session> {
        let phone = normalize_phone(phone)?;
        if self.pending_code(&phone).await.as_deref() != Some(token.trim()) {
            return Err(DomainError::Remote(INVALID_OTP.to_string()));
        }
        // Codes are single use
        self.pending_codes.write().await.remove(&phone);

        let user = self
            .phone_users
            .write()
            .await
            .entry(phone.clone())
            .or_insert_with(|| {
                log::info!("registered local user for {}", phone);
                User {
                    id: user_id(&phone),
                    email: None,
                    name: None,
                }
            })
            .clone();
        Ok(self.start_session(user).await)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        *self.session.write().await = None;
        Ok(())
    }
}
