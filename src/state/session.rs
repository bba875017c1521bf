//! Signed-in session and the current user's profile.
//!
//! Profile hydration is a small state machine:
//! `Idle → Fetching → (Retrying →) Settled(Loaded | Fallback)`.
//! Each attempt is bounded by the profile timeout. When every attempt
//! fails a minimal local profile is synthesised so the app stays usable.

use std::sync::Arc;

use crate::backend::AuthSession;
use crate::confirm::{Confirmed, Logout};
use crate::id_gen::short;
use crate::profile::{Profile, ProfileWithPhotos};
use crate::services::AuthService;
use crate::AppResult;

use super::chat::ChatStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOutcome {
    Loaded,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileLoad {
    #[default]
    Idle,
    Fetching,
    Retrying,
    Settled(ProfileOutcome),
}

pub struct SessionStore {
    auth: Arc<AuthService>,
    session: Option<AuthSession>,
    profile: Option<ProfileWithPhotos>,
    profile_load: ProfileLoad,
    profile_error: bool,
    loading: bool,
}

impl SessionStore {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self {
            auth,
            session: None,
            profile: None,
            profile_load: ProfileLoad::Idle,
            profile_error: false,
            loading: true,
        }
    }

    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn profile(&self) -> Option<&ProfileWithPhotos> {
        self.profile.as_ref()
    }

    pub fn profile_load(&self) -> ProfileLoad {
        self.profile_load
    }

    /// True when the profile shown is a local fallback.
    pub fn profile_error(&self) -> bool {
        self.profile_error
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn transition(&mut self, next: ProfileLoad) {
        tracing::debug!(from = ?self.profile_load, to = ?next, "Profile load");
        self.profile_load = next;
    }

    /// Resolve the persisted session and hydrate its profile. `loading` is
    /// false on return whatever happened.
    pub fn initialize(&mut self) {
        self.loading = true;
        // A stalled or failed lookup starts signed out.
        let session = self.auth.current_session().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read persisted session, continuing signed out");
            None
        });
        self.set_session(session);
        self.loading = false;
    }

    /// Install a new session (sign-in, refresh) or clear it.
    pub fn set_session(&mut self, session: Option<AuthSession>) {
        let changed_user = self.user_id() != session.as_ref().map(|s| s.user_id.as_str());
        self.session = session;
        if self.session.is_none() {
            self.profile = None;
            self.profile_error = false;
            self.transition(ProfileLoad::Idle);
        } else if changed_user || self.profile.is_none() {
            self.hydrate_profile();
        }
    }

    /// Fetch the profile with one retry, then fall back.
    pub fn hydrate_profile(&mut self) {
        let Some(session) = self.session.clone() else {
            return;
        };
        self.transition(ProfileLoad::Fetching);
        let attempts = 1 + self.auth.config().profile_retries;

        for attempt in 1..=attempts {
            match self.auth.fetch_profile(&session.user_id) {
                Ok(loaded) => {
                    self.profile = Some(loaded);
                    self.profile_error = false;
                    self.transition(ProfileLoad::Settled(ProfileOutcome::Loaded));
                    return;
                }
                Err(e) => {
                    tracing::warn!(user = %short(&session.user_id), attempt, error = %e, "Profile fetch failed");
                    if attempt < attempts {
                        self.transition(ProfileLoad::Retrying);
                    }
                }
            }
        }

        let fallback = Profile::fallback(
            &session.user_id,
            session.metadata_name.as_deref(),
            session.email.as_deref(),
        );
        tracing::info!(user = %short(&session.user_id), name = %fallback.display_name, "Using fallback profile");
        self.profile = Some(ProfileWithPhotos {
            profile: fallback,
            photos: Vec::new(),
        });
        self.profile_error = true;
        self.transition(ProfileLoad::Settled(ProfileOutcome::Fallback));
    }

    /// Replace the cached profile after an edit.
    pub fn set_profile(&mut self, profile: ProfileWithPhotos) {
        self.profile = Some(profile);
        self.profile_error = false;
        self.transition(ProfileLoad::Settled(ProfileOutcome::Loaded));
    }

    /// Drop realtime subscriptions and in-memory state, sign out with
    /// bounded waits, then purge persisted auth keys.
    pub fn logout(&mut self, _confirmed: Confirmed<Logout>, chat: &mut ChatStore) -> AppResult<Vec<String>> {
        chat.reset();
        if let Some(uid) = self.user_id() {
            tracing::info!(user = %short(uid), "Logging out");
        }
        self.session = None;
        self.profile = None;
        self.profile_error = false;
        self.loading = false;
        self.transition(ProfileLoad::Idle);
        self.auth.sign_out_everywhere()
    }
}
