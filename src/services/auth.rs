//! Session lookup, profile hydration and sign-out against the auth service.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{AuthApi, AuthSession, Backend, SignOutScope};
use crate::cancel::with_timeout;
use crate::config::AuthConfig;
use crate::id_gen::short;
use crate::profile::ProfileWithPhotos;
use crate::session_vault::SessionVault;
use crate::{AppError, AppResult};

pub struct AuthService {
    auth: Arc<dyn AuthApi>,
    backend: Arc<dyn Backend>,
    vault: Arc<SessionVault>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        backend: Arc<dyn Backend>,
        vault: Arc<SessionVault>,
        config: AuthConfig,
    ) -> Self {
        Self {
            auth,
            backend,
            vault,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// The persisted session, bounded by the session timeout.
    pub fn current_session(&self) -> AppResult<Option<AuthSession>> {
        let auth = Arc::clone(&self.auth);
        with_timeout(
            Duration::from_millis(self.config.session_timeout_ms),
            "session lookup",
            move || auth.get_session(),
        )
    }

    /// Profile and photos, bounded by the profile timeout. A missing
    /// profile row is `NotFound`. A photo query failure is not fatal.
    pub fn fetch_profile(&self, user_id: &str) -> AppResult<ProfileWithPhotos> {
        let backend = Arc::clone(&self.backend);
        let uid = user_id.to_string();
        with_timeout(
            Duration::from_millis(self.config.profile_timeout_ms),
            "profile fetch",
            move || {
                let profile = backend
                    .get_profile(&uid)?
                    .ok_or_else(|| AppError::NotFound(format!("profile {}", short(&uid))))?;
                let photos = backend.list_photos(&uid).unwrap_or_else(|e| {
                    tracing::warn!(user = %short(&uid), error = %e, "Photo query failed, continuing without photos");
                    Vec::new()
                });
                Ok(ProfileWithPhotos { profile, photos })
            },
        )
    }

    /// Sign out locally then globally, each under its own timeout, ignoring
    /// failures, then purge every persisted auth key. Returns the purged keys.
    pub fn sign_out_everywhere(&self) -> AppResult<Vec<String>> {
        let steps = [
            (SignOutScope::Local, self.config.local_sign_out_timeout_ms, "local sign-out"),
            (SignOutScope::Global, self.config.global_sign_out_timeout_ms, "global sign-out"),
        ];
        for (scope, timeout_ms, label) in steps {
            let auth = Arc::clone(&self.auth);
            if let Err(e) = with_timeout(Duration::from_millis(timeout_ms), label, move || auth.sign_out(scope)) {
                tracing::warn!(scope = ?scope, error = %e, "Sign-out failed, continuing");
            }
        }

        let purged = self.vault.purge_auth_keys(&self.config.storage_key)?;
        tracing::info!(purged = purged.len(), "Auth keys purged");
        Ok(purged)
    }
}
