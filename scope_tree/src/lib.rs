//! Parsing, merging, and serialization of OAuth2 scope expressions
//!
//! OAuth2 scopes are usually a flat, space-delimited list of tokens, as
//! described in [RFC 6749, Section 3.3][RFC6749 3.3]. Some authorization
//! services extend this with a small expression language in which a scope
//! may be marked as optional with a leading `*` and may carry a bracketed
//! list of dependent scopes, which may in turn be optional or carry their
//! own dependencies:
//!
//! ```text
//! openid transfer:all[*https://auth.example.org/scopes/ID/data_access]
//! ```
//!
//! This crate parses such expressions into immutable [`Scope`] trees,
//! combines trees that refer to the same scope, and renders them back into
//! their textual form.
//!
//! ```
//! use scope_tree::{Scope, ScopeParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ScopeParser::new();
//!
//! let granted = parser.parse("openid transfer:all[*data_access]")?;
//! let extra = parser.deserialize("transfer:all[*data_access[read]]")?;
//!
//! let merged = ScopeParser::merge_scopes(granted.into_iter().chain(Some(extra)));
//! assert_eq!(
//!     ScopeParser::serialize(&merged, true)?,
//!     "openid transfer:all[*data_access[read]]"
//! );
//!
//! let narrowed = Scope::from_static("transfer:all").with_optional(true);
//! assert_eq!(narrowed.serialize(), "*transfer:all");
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! * `tracing`: Emits `trace` level spans and events from the parser and
//!   merge operations. Failures are always returned to the caller rather
//!   than logged.
//!
//!   [RFC6749 3.3]: https://datatracker.ietf.org/doc/html/rfc6749#section-3.3

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod error;
mod list;
mod merge;
mod name;
mod parser;
mod scope;
mod token;

pub use error::{InvalidScopeName, ScopeParseError, UsageError};
pub use list::ScopeList;
pub use name::{ScopeName, ScopeNameRef};
pub use parser::ScopeParser;
pub use scope::{Scope, ScopeLike};
pub use token::{tokenize, Token, TokenKind};
