//! Eating Meeting: client core for a social-dining app.
//!
//! Nearby restaurant search, meal-buddy discovery, chat with meeting
//! proposals and open gatherings. The platform shell renders screens and
//! calls into the services and state containers defined here.

// Foundation
pub mod constants;
pub mod error;
pub mod id_gen;
pub mod time_utils;
pub mod config;
pub mod tracing_init;

// Data model
pub mod geo;
pub mod place;
pub mod profile;
pub mod thread;
pub mod message;
pub mod slot;
pub mod gathering;
pub mod validation;

// Sub-systems
pub mod cancel;
pub mod confirm;
pub mod session_vault;
pub mod backend;
pub mod storage;
pub mod places;
pub mod services;
pub mod state;

// Re-exports for convenience
pub use error::{AppError, AppResult};

#[cfg(test)]
pub(crate) mod test_helpers;
