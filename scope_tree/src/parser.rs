//! Recursive-descent parsing and serialization of scope expressions
//!
//! The accepted grammar is
//!
//! ```text
//! scope-list := scope (WS scope)*
//! scope      := ["*"] name ["[" scope-list "]"]
//! name       := one or more characters excluding whitespace, "*", "[", "]"
//! ```

use std::borrow::Borrow;

use crate::{
    error::{ScopeParseError, UsageError},
    merge,
    name::ScopeName,
    scope::Scope,
    token::{tokenize, Token, TokenKind},
};

/// Parser for scope expressions
///
/// The parser itself holds only configuration, so a single value may be
/// shared freely between threads.
///
/// ```
/// use scope_tree::{Scope, ScopeParser};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let parser = ScopeParser::new();
/// let scopes = parser.parse("openid transfer:all[*data_access]")?;
///
/// assert_eq!(scopes.len(), 2);
/// assert_eq!(scopes[1].dependencies()[0], Scope::from_static("*data_access"));
/// assert_eq!(
///     ScopeParser::serialize(&scopes, true)?,
///     "openid transfer:all[*data_access]"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeParser {
    max_depth: usize,
}

impl Default for ScopeParser {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeParser {
    /// The dependency nesting depth permitted by [`ScopeParser::new`]
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    /// Constructs a parser with the default nesting limit
    #[inline]
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum number of nested dependency groups
    ///
    /// Input nested more deeply fails with
    /// [`ScopeParseError::DepthExceeded`].
    #[inline]
    pub const fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// The maximum number of nested dependency groups
    #[inline]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parses zero or more whitespace-separated scopes
    ///
    /// Empty or whitespace-only input produces an empty list.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all, fields(text.len = text.len()))
    )]
    pub fn parse(&self, text: &str) -> Result<Vec<Scope>, ScopeParseError> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut cursor = Cursor {
            tokens: &tokens,
            index: 0,
            end: text.len(),
            max_depth: self.max_depth,
        };

        let scopes = cursor.scope_list(0)?;
        if let Some(token) = cursor.bump() {
            return Err(match token.kind {
                TokenKind::CloseBracket => ScopeParseError::UnexpectedCloseBracket {
                    position: token.position,
                },
                kind => ScopeParseError::ExpectedSeparator {
                    position: token.position,
                    found: kind.to_string(),
                },
            });
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(scopes = scopes.len(), "parsed scope expression");

        Ok(scopes)
    }

    /// Parses text that must contain exactly one top-level scope
    pub fn deserialize(&self, text: &str) -> Result<Scope, ScopeParseError> {
        let mut scopes = self.parse(text)?;
        match scopes.len() {
            1 => Ok(scopes.remove(0)),
            found => Err(ScopeParseError::WrongScopeCount { found }),
        }
    }

    /// Parses, merges, and re-serializes a scope expression
    ///
    /// Empty input produces an empty string.
    pub fn normalize(&self, text: &str) -> Result<String, ScopeParseError> {
        let merged = Self::merge_scopes(self.parse(text)?);
        Ok(join(&merged))
    }

    /// Combines scopes that share a name
    ///
    /// Scopes are grouped by name in order of first appearance. A group of
    /// one is passed through unchanged. A larger group becomes a single scope
    /// that is optional only if every member is optional, and whose
    /// dependencies are the merged union of every member's dependencies.
    ///
    /// ```
    /// use scope_tree::{Scope, ScopeParser};
    ///
    /// let merged = ScopeParser::merge_scopes(vec![
    ///     Scope::from_static("*x[a]"),
    ///     Scope::from_static("y"),
    ///     Scope::from_static("x[b]"),
    /// ]);
    ///
    /// assert_eq!(merged, [Scope::from_static("x[a b]"), Scope::from_static("y")]);
    /// ```
    pub fn merge_scopes<I>(scopes: I) -> Vec<Scope>
    where
        I: IntoIterator<Item = Scope>,
    {
        let merged = merge::merge_scopes(scopes);

        #[cfg(feature = "tracing")]
        tracing::trace!(scopes = merged.len(), "merged scopes");

        merged
    }

    /// Serializes scopes into a single space-separated expression
    ///
    /// When `reject_empty` is set, an empty collection is an error;
    /// otherwise it produces an empty string.
    pub fn serialize<I>(scopes: I, reject_empty: bool) -> Result<String, UsageError>
    where
        I: IntoIterator,
        I::Item: Borrow<Scope>,
    {
        let rendered: Vec<String> = scopes
            .into_iter()
            .map(|s| s.borrow().to_string())
            .collect();

        if reject_empty && rendered.is_empty() {
            Err(UsageError::EmptyScopeCollection)
        } else {
            Ok(rendered.join(" "))
        }
    }
}

pub(crate) fn join(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(Scope::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    index: usize,
    end: usize,
    max_depth: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    #[inline]
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.index).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    #[inline]
    fn peek_kind(&self) -> Option<TokenKind<'a>> {
        self.peek().map(|t| t.kind)
    }

    /// Parses sibling scopes until something other than a separator follows
    /// a scope. The terminating token is left unconsumed.
    fn scope_list(&mut self, depth: usize) -> Result<Vec<Scope>, ScopeParseError> {
        let mut scopes = vec![self.scope(depth)?];

        while self.peek_kind() == Some(TokenKind::Separator) {
            self.bump();
            scopes.push(self.scope(depth)?);
        }

        Ok(scopes)
    }

    fn scope(&mut self, depth: usize) -> Result<Scope, ScopeParseError> {
        let optional = if self.peek_kind() == Some(TokenKind::Star) {
            self.bump();
            true
        } else {
            false
        };

        let name = match self.bump() {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => ScopeName::new(word.to_owned())?,
            Some(Token {
                kind: TokenKind::CloseBracket,
                position,
            }) if depth == 0 => return Err(ScopeParseError::UnexpectedCloseBracket { position }),
            Some(token) => {
                return Err(ScopeParseError::ExpectedScopeName {
                    position: token.position,
                    found: token.kind.to_string(),
                })
            }
            None => {
                return Err(ScopeParseError::ExpectedScopeName {
                    position: self.end,
                    found: String::from("end of input"),
                })
            }
        };

        let dependencies = match self.peek() {
            Some(Token {
                kind: TokenKind::OpenBracket,
                position,
            }) => {
                self.bump();
                self.group(depth + 1, position)?
            }
            _ => Vec::new(),
        };

        Ok(Scope::from_parts(name, optional, dependencies))
    }

    fn group(&mut self, depth: usize, open: usize) -> Result<Vec<Scope>, ScopeParseError> {
        if depth > self.max_depth {
            return Err(ScopeParseError::DepthExceeded {
                max_depth: self.max_depth,
                position: open,
            });
        }

        if self.peek().is_none() {
            return Err(ScopeParseError::UnclosedBracket { position: open });
        }

        let dependencies = self.scope_list(depth)?;

        match self.bump() {
            Some(Token {
                kind: TokenKind::CloseBracket,
                ..
            }) => Ok(dependencies),
            None => Err(ScopeParseError::UnclosedBracket { position: open }),
            Some(token) => Err(ScopeParseError::ExpectedSeparator {
                position: token.position,
                found: token.kind.to_string(),
            }),
        }
    }
}
