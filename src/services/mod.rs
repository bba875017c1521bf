//! Data-access operations over the backend, one service per screen area.

pub mod auth;
pub mod chat;
pub mod community;
pub mod gathering;
pub mod profile;

pub use auth::AuthService;
pub use chat::{ChatService, ProposalReceipt};
pub use community::{CommunityFilters, CommunityService, UserCard};
pub use gathering::GatheringService;
pub use profile::ProfileService;
