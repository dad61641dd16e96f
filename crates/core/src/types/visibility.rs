//! Wishlist visibility states and the symbolic filter over them.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who may see a wishlist, beyond its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Anyone with an identity may view.
    Public,
    /// Viewable by the owner or a caller presenting the share token.
    Shared,
    /// Owner only.
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Shared => "shared",
            Self::Private => "private",
        };
        f.write_str(s)
    }
}

/// Error returned when parsing a [`Visibility`] or [`VisibilityFilter`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized visibility: {0}")]
pub struct ParseVisibilityError(String);

impl FromStr for Visibility {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "shared" => Ok(Self::Shared),
            "private" => Ok(Self::Private),
            other => Err(ParseVisibilityError(other.to_owned())),
        }
    }
}

/// Symbolic visibility filter accepted by the search criteria.
///
/// `Visible` is a derived category: the union of `public` and `shared`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    /// No visibility constraint.
    #[default]
    All,
    /// Public or shared.
    Visible,
    Public,
    Shared,
    Private,
}

impl VisibilityFilter {
    /// Expand the symbolic name into the concrete visibility states it
    /// covers. `None` means the filter places no constraint at all.
    #[must_use]
    pub fn expand(self) -> Option<Vec<Visibility>> {
        match self {
            Self::All => None,
            Self::Visible => Some(vec![Visibility::Public, Visibility::Shared]),
            Self::Public => Some(vec![Visibility::Public]),
            Self::Shared => Some(vec![Visibility::Shared]),
            Self::Private => Some(vec![Visibility::Private]),
        }
    }
}

impl FromStr for VisibilityFilter {
    type Err = ParseVisibilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "visible" => Ok(Self::Visible),
            "public" => Ok(Self::Public),
            "shared" => Ok(Self::Shared),
            "private" => Ok(Self::Private),
            other => Err(ParseVisibilityError(other.to_owned())),
        }
    }
}

/// Storage encoding for visibility values.
///
/// The record store owns the on-disk representation; everything above it
/// speaks the symbolic [`Visibility`] variants and maps through this lookup
/// when a concrete encoding is needed.
pub trait VisibilityEncoding {
    /// Encode a visibility state into its stored ordinal.
    fn encode(&self, visibility: Visibility) -> i16;

    /// Decode a stored ordinal, if it maps to a known state.
    fn decode(&self, code: i16) -> Option<Visibility>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_expands_visible_to_public_and_shared() {
        let expanded = VisibilityFilter::Visible.expand().expect("constrained");
        assert_eq!(expanded, vec![Visibility::Public, Visibility::Shared]);
    }

    #[test]
    fn test_filter_all_is_unconstrained() {
        assert!(VisibilityFilter::All.expand().is_none());
    }

    #[test]
    fn test_parse_round_trip() {
        for (input, expected) in [
            ("public", Visibility::Public),
            ("shared", Visibility::Shared),
            ("private", Visibility::Private),
        ] {
            assert_eq!(input.parse::<Visibility>().expect("parse"), expected);
            assert_eq!(expected.to_string(), input);
        }
        assert!("friends-only".parse::<Visibility>().is_err());
        assert_eq!(
            "visible".parse::<VisibilityFilter>().expect("parse"),
            VisibilityFilter::Visible
        );
    }
}
