//! Community screen state: user cards, filters, pagination.

use crate::geo::Coordinates;
use crate::profile::BudgetRange;
use crate::services::{CommunityFilters, CommunityService, UserCard};
use crate::AppResult;

/// Partial filter update. `None` leaves a filter as is.
#[derive(Debug, Clone, Default)]
pub struct FiltersPatch {
    pub max_distance_km: Option<f64>,
    pub budgets: Option<Vec<BudgetRange>>,
    pub diet_tags: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct CommunityStore {
    users: Vec<UserCard>,
    filters: CommunityFilters,
    loading: bool,
    offset: usize,
    has_more: bool,
}

impl Default for CommunityStore {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            filters: CommunityFilters::default(),
            loading: false,
            offset: 0,
            has_more: true,
        }
    }
}

impl CommunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[UserCard] {
        &self.users
    }

    pub fn filters(&self) -> &CommunityFilters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_has_more(&mut self, has_more: bool) {
        self.has_more = has_more;
    }

    /// Replace the list; the next page starts after it.
    pub fn set_users(&mut self, users: Vec<UserCard>) {
        self.offset = users.len();
        self.users = users;
    }

    /// Add a page, skipping users already listed.
    pub fn append_users(&mut self, users: Vec<UserCard>) {
        self.offset += users.len();
        for card in users {
            if !self.users.iter().any(|u| u.profile.id == card.profile.id) {
                self.users.push(card);
            }
        }
    }

    pub fn reset_pagination(&mut self) {
        self.users.clear();
        self.offset = 0;
        self.has_more = true;
    }

    pub fn patch_filters(&mut self, patch: FiltersPatch) {
        if let Some(d) = patch.max_distance_km {
            self.filters.max_distance_km = d;
        }
        if let Some(b) = patch.budgets {
            self.filters.budgets = b;
        }
        if let Some(t) = patch.diet_tags {
            self.filters.diet_tags = t;
        }
    }

    /// Reload from scratch with the current filters.
    pub fn refresh(&mut self, service: &CommunityService, me: &str, origin: &Coordinates) -> AppResult<()> {
        self.reset_pagination();
        self.loading = true;
        let result = service.load_user_cards(me, origin, &self.filters);
        self.loading = false;
        let users = result?;
        self.has_more = false;
        self.set_users(users);
        Ok(())
    }
}
