//! Core types for Wishbox.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod slug;
pub mod token;
pub mod visibility;

pub use id::*;
pub use slug::Slug;
pub use token::{SessionToken, ShareToken};
pub use visibility::{ParseVisibilityError, Visibility, VisibilityEncoding, VisibilityFilter};
