use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session_vault::SessionVault;
use crate::AppResult;

/// Signed-in user as reported by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub user_id: String,
    pub email: Option<String>,
    /// `display_name` from the sign-up metadata, if any.
    pub metadata_name: Option<String>,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn is_expired(&self, now: &DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= *now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Forget the session on this device.
    Local,
    /// Also revoke refresh tokens server-side.
    Global,
}

pub trait AuthApi: Send + Sync {
    fn get_session(&self) -> AppResult<Option<AuthSession>>;
    fn sign_out(&self, scope: SignOutScope) -> AppResult<()>;
}

/// Auth backed by the persisted vault: the session is the JSON stored under
/// the configured storage key. Used offline and by the diagnostic CLI.
pub struct VaultAuth {
    vault: Arc<SessionVault>,
    storage_key: String,
}

impl VaultAuth {
    pub fn new(vault: Arc<SessionVault>, storage_key: &str) -> Self {
        Self {
            vault,
            storage_key: storage_key.to_string(),
        }
    }

    pub fn store_session(&self, session: &AuthSession) -> AppResult<()> {
        self.vault.set(&self.storage_key, &serde_json::to_string(session)?)
    }
}

impl AuthApi for VaultAuth {
    fn get_session(&self) -> AppResult<Option<AuthSession>> {
        let Some(raw) = self.vault.get(&self.storage_key) else {
            return Ok(None);
        };
        match serde_json::from_str::<AuthSession>(&raw) {
            Ok(session) if !session.is_expired(&Utc::now()) => Ok(Some(session)),
            Ok(_) => {
                tracing::info!("Persisted session expired");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unreadable persisted session, ignoring");
                Ok(None)
            }
        }
    }

    fn sign_out(&self, scope: SignOutScope) -> AppResult<()> {
        self.vault.remove(&self.storage_key)?;
        tracing::debug!(scope = ?scope, "Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AUTH_STORAGE_KEY;
    use chrono::Duration;

    fn session(expires_at: Option<DateTime<Utc>>) -> AuthSession {
        AuthSession {
            user_id: "u1".into(),
            email: Some("minsu@example.com".into()),
            metadata_name: None,
            access_token: "tok".into(),
            expires_at,
        }
    }

    #[test]
    fn test_store_then_get() {
        let auth = VaultAuth::new(Arc::new(SessionVault::in_memory()), AUTH_STORAGE_KEY);
        assert!(auth.get_session().unwrap().is_none());
        auth.store_session(&session(None)).unwrap();
        assert_eq!(auth.get_session().unwrap().unwrap().user_id, "u1");
        auth.sign_out(SignOutScope::Local).unwrap();
        assert!(auth.get_session().unwrap().is_none());
    }

    #[test]
    fn test_expired_session_is_none() {
        let auth = VaultAuth::new(Arc::new(SessionVault::in_memory()), AUTH_STORAGE_KEY);
        auth.store_session(&session(Some(Utc::now() - Duration::minutes(1)))).unwrap();
        assert!(auth.get_session().unwrap().is_none());
    }
}
