//! Request middleware: caller extraction and session management.

pub mod auth;
pub mod session;

pub use auth::{Caller, SHARE_TOKEN_HEADER, require_export, require_identified, require_record};
pub use session::create_session_layer;
