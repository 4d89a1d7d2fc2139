//! Errors produced while building, parsing, or serializing scopes

use std::convert::Infallible;

use thiserror::Error;

/// An invalid scope name
///
/// A scope name must be non-empty and may not contain whitespace or any of
/// the grammar's structural characters: `*`, `[`, and `]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum InvalidScopeName {
    /// The scope name was the empty string
    #[error("scope name cannot be empty")]
    EmptyString,
    /// The scope name contained a disallowed character
    #[error("invalid character {value:?} in scope name at position {position}")]
    InvalidCharacter {
        /// The byte offset in the scope name where the character was found
        position: usize,
        /// The disallowed character
        value: char,
    },
}

impl From<Infallible> for InvalidScopeName {
    #[inline]
    fn from(x: Infallible) -> Self {
        match x {}
    }
}

/// A malformed scope expression
///
/// Positions are byte offsets into the text handed to the parser.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum ScopeParseError {
    /// A scope name failed validation
    #[error(transparent)]
    InvalidName(#[from] InvalidScopeName),
    /// A dependency group was opened and immediately closed
    #[error("empty dependency group `[]` at position {position}")]
    EmptyDependencies {
        /// Position of the `[`
        position: usize,
    },
    /// An optional marker appeared somewhere other than the start of a scope
    #[error("`*` at position {position} may only appear at the start of a scope")]
    MisplacedOptionalMarker {
        /// Position of the `*`
        position: usize,
    },
    /// An optional marker was not followed by a scope name
    #[error("`*` at position {position} must be immediately followed by a scope name")]
    DanglingOptionalMarker {
        /// Position of the `*`
        position: usize,
    },
    /// A `[` was never closed
    #[error("unbalanced brackets: `[` at position {position} is never closed")]
    UnclosedBracket {
        /// Position of the unclosed `[`
        position: usize,
    },
    /// A `]` had no matching `[`
    #[error("unbalanced brackets: unexpected `]` at position {position}")]
    UnexpectedCloseBracket {
        /// Position of the `]`
        position: usize,
    },
    /// Something other than a scope name was found where a scope must begin
    #[error("expected a scope name at position {position}, found {found}")]
    ExpectedScopeName {
        /// Position of the offending token
        position: usize,
        /// Description of what was found instead
        found: String,
    },
    /// Two sibling scopes were not separated by whitespace
    #[error("expected whitespace between scopes at position {position}, found {found}")]
    ExpectedSeparator {
        /// Position of the offending token
        position: usize,
        /// Description of what was found instead
        found: String,
    },
    /// Dependency groups were nested deeper than the parser allows
    #[error("scope nesting exceeds the maximum depth of {max_depth} at position {position}")]
    DepthExceeded {
        /// The configured maximum depth
        max_depth: usize,
        /// Position of the `[` that crossed the limit
        position: usize,
    },
    /// The text did not contain exactly one top-level scope
    #[error("expected exactly one scope, found {found}")]
    WrongScopeCount {
        /// The number of top-level scopes found
        found: usize,
    },
}

impl ScopeParseError {
    /// The byte offset in the input that the error refers to, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidName(InvalidScopeName::InvalidCharacter { position, .. }) => {
                Some(*position)
            }
            Self::InvalidName(InvalidScopeName::EmptyString) | Self::WrongScopeCount { .. } => {
                None
            }
            Self::EmptyDependencies { position }
            | Self::MisplacedOptionalMarker { position }
            | Self::DanglingOptionalMarker { position }
            | Self::UnclosedBracket { position }
            | Self::UnexpectedCloseBracket { position }
            | Self::ExpectedScopeName { position, .. }
            | Self::ExpectedSeparator { position, .. }
            | Self::DepthExceeded { position, .. } => Some(*position),
        }
    }
}

/// Misuse of the serialization API unrelated to the grammar
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum UsageError {
    /// An empty collection of scopes was serialized while empty output was
    /// disallowed
    #[error("cannot serialize an empty collection of scopes")]
    EmptyScopeCollection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_error_accepts_infallible_conversions() {
        fn converts_from_infallible<E: From<Infallible>>() {}
        converts_from_infallible::<InvalidScopeName>();
    }

    #[test]
    fn positional_errors_report_offset() {
        let err = ScopeParseError::UnclosedBracket { position: 7 };
        assert_eq!(err.position(), Some(7));
        assert_eq!(
            err.to_string(),
            "unbalanced brackets: `[` at position 7 is never closed"
        );
    }

    #[test]
    fn count_errors_have_no_offset() {
        let err = ScopeParseError::WrongScopeCount { found: 2 };
        assert_eq!(err.position(), None);
        assert_eq!(err.to_string(), "expected exactly one scope, found 2");
    }

    #[test]
    fn invalid_name_is_transparent() {
        let err = ScopeParseError::from(InvalidScopeName::InvalidCharacter {
            position: 3,
            value: '[',
        });
        assert_eq!(err.position(), Some(3));
        assert_eq!(
            err.to_string(),
            "invalid character '[' in scope name at position 3"
        );
    }
}
