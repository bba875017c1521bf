pub mod google;
pub mod search;
pub mod seed;
pub mod transport;

pub use google::GooglePlacesClient;
pub use search::{fetch_places, finalize, search_or_fallback, spawn_search, SearchOutcome, SearchSource};
pub use transport::{NearbyRequest, PlacesPage, PlacesTransport};
