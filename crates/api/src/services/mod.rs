//! External collaborators the API talks to.

pub mod cart;

pub use cart::{CartClient, CartError};
