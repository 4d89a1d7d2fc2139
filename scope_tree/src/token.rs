//! Lexical analysis of scope expressions

use std::fmt;

use crate::{error::ScopeParseError, name::is_structural};

/// The kind of a lexical token
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind<'a> {
    /// A bare scope name
    Word(&'a str),
    /// The optional marker, `*`
    Star,
    /// The start of a dependency group, `[`
    OpenBracket,
    /// The end of a dependency group, `]`
    CloseBracket,
    /// A run of whitespace separating sibling scopes
    Separator,
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "scope name `{}`", word),
            Self::Star => f.write_str("`*`"),
            Self::OpenBracket => f.write_str("`[`"),
            Self::CloseBracket => f.write_str("`]`"),
            Self::Separator => f.write_str("whitespace"),
        }
    }
}

/// A lexical token and the byte offset at which it starts
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token<'a> {
    /// The kind of token
    pub kind: TokenKind<'a>,
    /// Byte offset of the token in the input
    pub position: usize,
}

impl<'a> Token<'a> {
    #[inline]
    const fn new(kind: TokenKind<'a>, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Splits a scope expression into tokens
///
/// Each run of whitespace between sibling scopes becomes a single
/// [`TokenKind::Separator`]. Whitespace at either end of the input, or
/// directly inside a pair of brackets, is dropped. Words borrow from `text`.
///
/// An optional marker is only accepted at the start of the input or directly
/// after `[` or whitespace, and must be directly followed by a scope name.
///
/// ```
/// use scope_tree::{tokenize, TokenKind};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let kinds: Vec<_> = tokenize("all[*data_access]")?
///     .into_iter()
///     .map(|t| t.kind)
///     .collect();
///
/// assert_eq!(
///     kinds,
///     [
///         TokenKind::Word("all"),
///         TokenKind::OpenBracket,
///         TokenKind::Star,
///         TokenKind::Word("data_access"),
///         TokenKind::CloseBracket,
///     ]
/// );
/// # Ok(())
/// # }
/// ```
pub fn tokenize(text: &str) -> Result<Vec<Token<'_>>, ScopeParseError> {
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '[' => {
                if let Some(&(_, ']')) = chars.peek() {
                    return Err(ScopeParseError::EmptyDependencies { position });
                }
                tokens.push(Token::new(TokenKind::OpenBracket, position));
            }
            ']' => tokens.push(Token::new(TokenKind::CloseBracket, position)),
            '*' => {
                let starts_scope = tokens.last().map_or(true, |t| {
                    matches!(t.kind, TokenKind::OpenBracket | TokenKind::Separator)
                });
                if !starts_scope {
                    return Err(ScopeParseError::MisplacedOptionalMarker { position });
                }

                match chars.peek() {
                    Some(&(_, next)) if !is_structural(next) => {}
                    _ => return Err(ScopeParseError::DanglingOptionalMarker { position }),
                }

                tokens.push(Token::new(TokenKind::Star, position));
            }
            c if c.is_whitespace() => {
                while let Some(&(_, next)) = chars.peek() {
                    if !next.is_whitespace() {
                        break;
                    }
                    chars.next();
                }

                // Whitespace only separates siblings; inside brackets it is dropped.
                let open = match tokens.last() {
                    Some(&Token {
                        kind: TokenKind::OpenBracket,
                        position,
                    }) => Some(position),
                    _ => None,
                };
                match chars.peek() {
                    Some(&(_, ']')) => {
                        if let Some(position) = open {
                            return Err(ScopeParseError::EmptyDependencies { position });
                        }
                    }
                    Some(_) if !tokens.is_empty() && open.is_none() => {
                        tokens.push(Token::new(TokenKind::Separator, position));
                    }
                    _ => {}
                }
            }
            c => {
                let mut end = position + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if is_structural(next) {
                        break;
                    }
                    end = idx + next.len_utf8();
                    chars.next();
                }

                tokens.push(Token::new(TokenKind::Word(&text[position..end]), position));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind<'_>> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(kinds("").is_empty());
        assert!(kinds(" \t\n ").is_empty());
    }

    #[test]
    fn single_word() {
        assert_eq!(kinds("openid"), [TokenKind::Word("openid")]);
    }

    #[test]
    fn whitespace_runs_collapse_and_trim() {
        assert_eq!(
            kinds("  openid \t\n email  "),
            [
                TokenKind::Word("openid"),
                TokenKind::Separator,
                TokenKind::Word("email"),
            ]
        );
    }

    #[test]
    fn whitespace_inside_brackets_is_dropped() {
        assert_eq!(
            kinds("a[ b \t c\n]"),
            [
                TokenKind::Word("a"),
                TokenKind::OpenBracket,
                TokenKind::Word("b"),
                TokenKind::Separator,
                TokenKind::Word("c"),
                TokenKind::CloseBracket,
            ]
        );
        assert_eq!(
            kinds("a[ *b ] c"),
            [
                TokenKind::Word("a"),
                TokenKind::OpenBracket,
                TokenKind::Star,
                TokenKind::Word("b"),
                TokenKind::CloseBracket,
                TokenKind::Separator,
                TokenKind::Word("c"),
            ]
        );
    }

    #[test]
    fn whitespace_before_open_bracket_is_kept() {
        assert_eq!(
            kinds("a [b]"),
            [
                TokenKind::Word("a"),
                TokenKind::Separator,
                TokenKind::OpenBracket,
                TokenKind::Word("b"),
                TokenKind::CloseBracket,
            ]
        );
    }

    #[test]
    fn records_byte_positions() {
        let tokens = tokenize(" a[*bc]").unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, [1, 2, 3, 4, 6]);
    }

    #[test]
    fn words_keep_url_characters() {
        assert_eq!(
            kinds("urn:globus:auth:scope:transfer.api.globus.org:all[*https://auth.globus.org/scopes/abc/data_access]"),
            [
                TokenKind::Word("urn:globus:auth:scope:transfer.api.globus.org:all"),
                TokenKind::OpenBracket,
                TokenKind::Star,
                TokenKind::Word("https://auth.globus.org/scopes/abc/data_access"),
                TokenKind::CloseBracket,
            ]
        );
    }

    #[test]
    fn brackets_terminate_words() {
        assert_eq!(
            kinds("a[b]c"),
            [
                TokenKind::Word("a"),
                TokenKind::OpenBracket,
                TokenKind::Word("b"),
                TokenKind::CloseBracket,
                TokenKind::Word("c"),
            ]
        );
    }

    #[test]
    fn multibyte_words_are_sliced_correctly() {
        assert_eq!(
            kinds("écrire[*lire]"),
            [
                TokenKind::Word("écrire"),
                TokenKind::OpenBracket,
                TokenKind::Star,
                TokenKind::Word("lire"),
                TokenKind::CloseBracket,
            ]
        );
    }

    #[test]
    fn star_after_whitespace_is_allowed() {
        assert_eq!(
            kinds("a *b"),
            [
                TokenKind::Word("a"),
                TokenKind::Separator,
                TokenKind::Star,
                TokenKind::Word("b"),
            ]
        );
    }

    #[test]
    fn rejects_empty_brackets() {
        assert_eq!(
            tokenize("a[]"),
            Err(ScopeParseError::EmptyDependencies { position: 1 })
        );
        assert_eq!(
            tokenize("a[b[ \t ]]"),
            Err(ScopeParseError::EmptyDependencies { position: 3 })
        );
    }

    #[test]
    fn rejects_trailing_star() {
        assert_eq!(
            tokenize("a*"),
            Err(ScopeParseError::MisplacedOptionalMarker { position: 1 })
        );
    }

    #[test]
    fn rejects_star_inside_word() {
        assert_eq!(
            tokenize("a*b"),
            Err(ScopeParseError::MisplacedOptionalMarker { position: 1 })
        );
    }

    #[test]
    fn rejects_lone_star() {
        assert_eq!(
            tokenize("*"),
            Err(ScopeParseError::DanglingOptionalMarker { position: 0 })
        );
        assert_eq!(
            tokenize("a * b"),
            Err(ScopeParseError::DanglingOptionalMarker { position: 2 })
        );
    }

    #[test]
    fn rejects_star_before_bracket() {
        assert_eq!(
            tokenize("*[a]"),
            Err(ScopeParseError::DanglingOptionalMarker { position: 0 })
        );
    }

    #[test]
    fn rejects_double_star() {
        assert_eq!(
            tokenize("**a"),
            Err(ScopeParseError::DanglingOptionalMarker { position: 0 })
        );
    }
}
