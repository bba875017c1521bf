//! State containers owned by the shell's UI thread.
//!
//! Containers are plain structs handed to whoever renders them; none is a
//! global. Remote work runs elsewhere and its results are applied here.

pub mod chat;
pub mod community;
pub mod map;
pub mod places_feed;
pub mod session;

pub use chat::ChatStore;
pub use community::{CommunityStore, FiltersPatch};
pub use map::{MapEffect, MapStore, ScrollState, SelectOrigin, SelectionCoordinator};
pub use places_feed::{PlacesFeed, SearchTicket};
pub use session::{ProfileLoad, ProfileOutcome, SessionStore};
