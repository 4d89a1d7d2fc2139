//! The immutable scope tree

use std::{
    borrow::Cow,
    collections::hash_map::DefaultHasher,
    convert::TryFrom,
    fmt,
    hash::{Hash, Hasher},
    iter,
    mem,
    str::FromStr,
    sync::Arc,
};

use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    error::{InvalidScopeName, ScopeParseError},
    name::{ScopeName, ScopeNameRef},
    parser::ScopeParser,
};

static NO_DEPENDENCIES: Lazy<Arc<[Scope]>> = Lazy::new(|| Arc::from(Vec::new()));

/// An OAuth2 scope with an optional marker and nested dependencies
///
/// A `Scope` is an immutable value. Methods that appear to change a scope,
/// such as [`with_optional`][Scope::with_optional] and
/// [`with_dependency`][Scope::with_dependency], return a new scope and leave
/// the receiver untouched. Dependency lists are reference counted, so clones
/// are cheap and unchanged subtrees are shared between the old and new
/// values.
///
/// Two scopes are equal when their names and optional flags match and their
/// dependencies contain the same scopes, regardless of order.
///
/// Rendering and dropping a scope use heap-allocated work lists, so trees of
/// any depth are safe to print and discard. Equality, hashing, `Debug` and
/// [`covers`][Scope::covers] recurse once per level of nesting; trees built
/// through the evolvers should be kept to a depth the calling thread's stack
/// can accommodate. [`ScopeParser`] enforces such a bound on parsed input.
///
/// ```
/// use scope_tree::Scope;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transfer = Scope::from_static("transfer:all")
///     .with_dependency("*data_access")?;
///
/// assert_eq!(transfer.to_string(), "transfer:all[*data_access]");
/// assert_eq!(transfer, "transfer:all[*data_access]".parse::<Scope>()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
#[must_use]
pub struct Scope {
    name: ScopeName,
    optional: bool,
    dependencies: Arc<[Scope]>,
}

impl Scope {
    /// Constructs a required scope with no dependencies
    #[inline]
    pub fn new(name: ScopeName) -> Self {
        Self {
            name,
            optional: false,
            dependencies: Arc::clone(&NO_DEPENDENCIES),
        }
    }

    /// Validates `name` and constructs a required scope with no dependencies
    #[inline]
    pub fn try_new(name: impl Into<String>) -> Result<Self, InvalidScopeName> {
        ScopeName::new(name.into()).map(Self::new)
    }

    /// Constructs a scope from all of its parts
    pub fn from_parts<I>(name: ScopeName, optional: bool, dependencies: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        let mut dependencies = dependencies.into_iter().peekable();
        let dependencies = if dependencies.peek().is_none() {
            Arc::clone(&NO_DEPENDENCIES)
        } else {
            dependencies.collect()
        };

        Self {
            name,
            optional,
            dependencies,
        }
    }

    /// Parses a single scope expression from a static string
    ///
    /// # Panics
    ///
    /// This function will panic if the provided string is not exactly one
    /// valid scope expression.
    pub fn from_static(raw: &'static str) -> Self {
        match ScopeParser::new().deserialize(raw) {
            Ok(scope) => scope,
            Err(err) => panic!("{}: scope = {}", err, raw),
        }
    }

    /// The scope name
    #[inline]
    pub fn name(&self) -> &ScopeNameRef {
        &self.name
    }

    /// Whether the grantor may decline this scope without failing the request
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The scopes this scope depends on, in insertion order
    #[inline]
    pub fn dependencies(&self) -> &[Scope] {
        &self.dependencies
    }

    /// Deconstructs the scope into its name, optional flag, and dependencies
    pub fn into_parts(self) -> (ScopeName, bool, Vec<Scope>) {
        (self.name.clone(), self.optional, self.dependencies.to_vec())
    }

    /// Returns a copy of this scope with the optional flag set to `optional`
    #[inline]
    pub fn with_optional(&self, optional: bool) -> Self {
        Self {
            name: self.name.clone(),
            optional,
            dependencies: Arc::clone(&self.dependencies),
        }
    }

    /// Returns a copy of this scope with `dependency` appended to its
    /// dependencies
    ///
    /// A string dependency must contain exactly one scope expression. No
    /// deduplication is performed; use
    /// [`ScopeParser::merge_scopes`] to combine repeated dependencies.
    pub fn with_dependency<'a>(
        &self,
        dependency: impl Into<ScopeLike<'a>>,
    ) -> Result<Self, ScopeParseError> {
        let dependency = dependency.into().into_scope()?;
        Ok(self.extended(iter::once(dependency)))
    }

    /// Returns a copy of this scope with each of `dependencies` appended in
    /// order
    ///
    /// If any string dependency fails to parse, no scope is produced.
    pub fn with_dependencies<'a, I>(&self, dependencies: I) -> Result<Self, ScopeParseError>
    where
        I: IntoIterator,
        I::Item: Into<ScopeLike<'a>>,
    {
        let dependencies = dependencies
            .into_iter()
            .map(|d| d.into().into_scope())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.extended(dependencies))
    }

    fn extended<I>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        Self {
            name: self.name.clone(),
            optional: self.optional,
            dependencies: self.dependencies.iter().cloned().chain(extra).collect(),
        }
    }

    /// Renders the scope in the scope expression grammar
    ///
    /// Dependencies are rendered in insertion order.
    #[inline]
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Checks whether this scope grants everything `requested` asks for
    ///
    /// The names and optional flags must match, and every dependency of
    /// `requested` must be covered by at least one of this scope's
    /// dependencies. Extra dependencies on this scope are permitted.
    pub fn covers(&self, requested: &Scope) -> bool {
        self.name == requested.name
            && self.optional == requested.optional
            && requested
                .dependencies
                .iter()
                .all(|r| self.dependencies.iter().any(|d| d.covers(r)))
    }

    fn digest(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn by_digest(scopes: &[Scope]) -> AHashMap<u64, Vec<&Scope>> {
    let mut buckets: AHashMap<u64, Vec<&Scope>> = AHashMap::with_capacity(scopes.len());
    for scope in scopes {
        buckets.entry(scope.digest()).or_default().push(scope);
    }
    buckets
}

/// Set comparison of two dependency lists. Equal scopes share a digest, so
/// only scopes within the same bucket need to be compared.
fn same_members(left: &[Scope], right: &[Scope]) -> bool {
    if left.is_empty() || right.is_empty() {
        return left.is_empty() && right.is_empty();
    }

    let left = by_digest(left);
    let right = by_digest(right);

    left.len() == right.len()
        && left.iter().all(|(digest, ls)| {
            right.get(digest).map_or(false, |rs| {
                ls.iter().all(|l| rs.iter().any(|r| l == r))
                    && rs.iter().all(|r| ls.iter().any(|l| l == r))
            })
        })
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.optional == other.optional
            && (Arc::ptr_eq(&self.dependencies, &other.dependencies)
                || same_members(&self.dependencies, &other.dependencies))
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.optional.hash(state);

        let mut digests: Vec<u64> = self.dependencies.iter().map(Scope::digest).collect();
        digests.sort_unstable();
        digests.dedup();
        digests.hash(state);
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        // Detach uniquely owned subtrees so that dropping them never recurses.
        fn detach(dependencies: &mut Arc<[Scope]>, pending: &mut Vec<Arc<[Scope]>>) {
            if let Some(children) = Arc::get_mut(dependencies) {
                for child in children {
                    if !child.dependencies.is_empty() {
                        pending.push(mem::replace(
                            &mut child.dependencies,
                            Arc::clone(&NO_DEPENDENCIES),
                        ));
                    }
                }
            }
        }

        let mut pending = Vec::new();
        detach(&mut self.dependencies, &mut pending);
        while let Some(mut dependencies) = pending.pop() {
            detach(&mut dependencies, &mut pending);
        }
    }
}

enum Piece<'a> {
    Scope(&'a Scope),
    Text(&'static str),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut pending = vec![Piece::Scope(self)];

        while let Some(piece) = pending.pop() {
            let scope = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Scope(scope) => scope,
            };

            if scope.optional {
                f.write_str("*")?;
            }

            f.write_str(scope.name.as_str())?;

            if let Some((first, rest)) = scope.dependencies.split_first() {
                f.write_str("[")?;
                pending.push(Piece::Text("]"));
                for dependency in rest.iter().rev() {
                    pending.push(Piece::Scope(dependency));
                    pending.push(Piece::Text(" "));
                }
                pending.push(Piece::Scope(first));
            }
        }

        Ok(())
    }
}

impl From<ScopeName> for Scope {
    #[inline]
    fn from(name: ScopeName) -> Self {
        Self::new(name)
    }
}

impl From<Scope> for String {
    #[inline]
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl FromStr for Scope {
    type Err = ScopeParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScopeParser::new().deserialize(s)
    }
}

impl TryFrom<&'_ str> for Scope {
    type Error = ScopeParseError;

    #[inline]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeParseError;

    #[inline]
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Either an already-built [`Scope`] or a scope expression still to be parsed
///
/// APIs that accept `impl Into<ScopeLike>` take both forms. Strings are
/// resolved with [`ScopeParser::deserialize`] as soon as they are accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeLike<'a> {
    /// A constructed scope
    Scope(Scope),
    /// An unparsed scope expression holding exactly one scope
    Expression(Cow<'a, str>),
}

impl ScopeLike<'_> {
    /// Resolves the value into a [`Scope`], parsing it if necessary
    pub fn into_scope(self) -> Result<Scope, ScopeParseError> {
        match self {
            Self::Scope(scope) => Ok(scope),
            Self::Expression(text) => ScopeParser::new().deserialize(&text),
        }
    }
}

impl From<Scope> for ScopeLike<'_> {
    #[inline]
    fn from(scope: Scope) -> Self {
        Self::Scope(scope)
    }
}

impl From<&'_ Scope> for ScopeLike<'_> {
    #[inline]
    fn from(scope: &Scope) -> Self {
        Self::Scope(scope.clone())
    }
}

impl<'a> From<&'a str> for ScopeLike<'a> {
    #[inline]
    fn from(text: &'a str) -> Self {
        Self::Expression(Cow::Borrowed(text))
    }
}

impl From<String> for ScopeLike<'_> {
    #[inline]
    fn from(text: String) -> Self {
        Self::Expression(Cow::Owned(text))
    }
}
