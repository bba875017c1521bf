//! Meal-buddy discovery and blocking.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::confirm::{Confirmed, Unblock};
use crate::constants::{COMMUNITY_MAX_DISTANCE_KM, COMMUNITY_PAGE_LIMIT};
use crate::geo::{distance_km, Coordinates};
use crate::id_gen::short;
use crate::profile::{primary_photo, Block, BudgetRange, Photo, Profile};
use crate::{AppError, AppResult};

/// Filters on the community screen. Empty sets mean "any".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityFilters {
    pub max_distance_km: f64,
    pub budgets: Vec<BudgetRange>,
    pub diet_tags: Vec<String>,
}

impl Default for CommunityFilters {
    fn default() -> Self {
        Self {
            max_distance_km: COMMUNITY_MAX_DISTANCE_KM,
            budgets: Vec::new(),
            diet_tags: Vec::new(),
        }
    }
}

impl CommunityFilters {
    fn accepts(&self, profile: &Profile, distance: f64) -> bool {
        if distance > self.max_distance_km {
            return false;
        }
        if !self.budgets.is_empty() && !self.budgets.contains(&profile.budget_range) {
            return false;
        }
        if !self.diet_tags.is_empty() && !profile.diet_tags.iter().any(|t| self.diet_tags.contains(t)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCard {
    pub profile: Profile,
    pub primary_photo: Option<Photo>,
    pub distance_km: f64,
}

pub struct CommunityService {
    backend: Arc<dyn Backend>,
    page_limit: usize,
}

impl CommunityService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            page_limit: COMMUNITY_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Located users other than `me`, minus those `me` blocked, filtered and
    /// sorted nearest first.
    pub fn load_user_cards(
        &self,
        me: &str,
        origin: &Coordinates,
        filters: &CommunityFilters,
    ) -> AppResult<Vec<UserCard>> {
        let blocked: HashSet<String> = self.backend.blocked_ids(me)?.into_iter().collect();
        let candidates = self.backend.profiles_with_location(me, self.page_limit)?;

        let mut cards = Vec::new();
        for profile in candidates {
            if blocked.contains(&profile.id) {
                continue;
            }
            let Some(location) = profile.location() else {
                continue;
            };
            let distance = distance_km(origin, &location);
            if !filters.accepts(&profile, distance) {
                continue;
            }
            let photos = self.backend.list_photos(&profile.id)?;
            cards.push(UserCard {
                primary_photo: primary_photo(&photos).cloned(),
                profile,
                distance_km: distance,
            });
        }
        cards.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        tracing::debug!(user = %short(me), count = cards.len(), blocked = blocked.len(), "User cards loaded");
        Ok(cards)
    }

    // ── Blocking ──

    /// Blocking an already blocked user is a no-op.
    pub fn block(&self, me: &str, other: &str) -> AppResult<()> {
        if me == other {
            return Err(AppError::Validation("자기 자신은 차단할 수 없어요.".into()));
        }
        self.backend.insert_block(&Block::new(me, other))?;
        tracing::info!(user = %short(me), blocked = %short(other), "User blocked");
        Ok(())
    }

    pub fn unblock(&self, me: &str, confirmed: Confirmed<Unblock>) -> AppResult<()> {
        let other = &confirmed.action().user_id;
        self.backend.delete_block(me, other)?;
        tracing::info!(user = %short(me), unblocked = %short(other), "User unblocked");
        Ok(())
    }

    /// Profiles `me` has blocked, most recent first.
    pub fn blocked_users(&self, me: &str) -> AppResult<Vec<Profile>> {
        let ids = self.backend.blocked_ids(me)?;
        self.backend.get_profiles(&ids)
    }
}
