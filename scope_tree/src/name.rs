//! Validated scope names

use aliri_braid::braid;

use crate::error::InvalidScopeName;

/// Returns true for characters that carry meaning in the scope grammar
#[inline]
pub(crate) fn is_structural(c: char) -> bool {
    c.is_whitespace() || c == '*' || c == '[' || c == ']'
}

/// The name of a single OAuth2 scope
///
/// A scope name is non-empty and contains no whitespace and none of the
/// characters `*`, `[`, or `]`, which the scope grammar reserves for optional
/// markers and dependency groups. Names are otherwise opaque, so URNs and
/// URLs such as `https://auth.example.org/scopes/ID/data_access` are valid.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a [`ScopeName`]"
)]
pub struct ScopeName;

impl aliri_braid::Validator for ScopeName {
    type Error = InvalidScopeName;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            Err(InvalidScopeName::EmptyString)
        } else if let Some((position, value)) = s.char_indices().find(|&(_, c)| is_structural(c)) {
            Err(InvalidScopeName::InvalidCharacter { position, value })
        } else {
            Ok(())
        }
    }
}
