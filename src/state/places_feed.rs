//! The latest place collection for the map, with request superseding.
//!
//! Every search gets a ticket. Starting a new search cancels the previous
//! ticket's token, and only the newest ticket's completion is applied.

use crate::cancel::CancelToken;
use crate::place::Place;
use crate::places::{SearchOutcome, SearchSource};
use crate::AppResult;

#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub id: u64,
    pub token: CancelToken,
}

#[derive(Debug, Default)]
pub struct PlacesFeed {
    next_id: u64,
    current: Option<SearchTicket>,
    places: Vec<Place>,
    source: Option<SearchSource>,
    error: Option<String>,
    loading: bool,
}

impl PlacesFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a search, superseding any in flight.
    pub fn begin(&mut self) -> SearchTicket {
        if let Some(prev) = self.current.take() {
            prev.token.cancel();
            tracing::debug!(request = prev.id, "Superseded places search");
        }
        self.next_id += 1;
        let ticket = SearchTicket {
            id: self.next_id,
            token: CancelToken::new(),
        };
        self.current = Some(ticket.clone());
        self.loading = true;
        ticket
    }

    /// Apply a completion. Returns false when it was discarded as stale,
    /// cancelled, or failed.
    pub fn accept(&mut self, request_id: u64, result: AppResult<SearchOutcome>) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        if current.id != request_id || current.token.is_cancelled() {
            tracing::debug!(request = request_id, latest = current.id, "Dropping stale places result");
            return false;
        }
        self.current = None;
        self.loading = false;

        match result {
            Ok(outcome) => {
                tracing::info!(
                    request = request_id,
                    count = outcome.places.len(),
                    source = ?outcome.source,
                    "Places updated"
                );
                self.places = outcome.places;
                self.source = Some(outcome.source);
                self.error = outcome.error;
                true
            }
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::warn!(request = request_id, error = %e, "Places search failed");
                    self.error = Some(e.user_message());
                }
                false
            }
        }
    }

    /// Cancel whatever is in flight without starting anything.
    pub fn cancel(&mut self) {
        if let Some(prev) = self.current.take() {
            prev.token.cancel();
        }
        self.loading = false;
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn source(&self) -> Option<SearchSource> {
        self.source
    }

    /// Banner text for the last search, if it fell back or failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
