//! API-side models: session state.

pub mod session;

pub use session::{CurrentUser, GuestSession, keys as session_keys};
