//! An ordered collection of top-level scopes

use std::{convert::TryFrom, fmt, iter::FromIterator, slice, str::FromStr, vec};

use serde::{Deserialize, Serialize};

use crate::{error::ScopeParseError, parser, scope::Scope, ScopeParser};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeListDto {
    String(String),
    Array(Vec<Scope>),
}

impl TryFrom<Option<ScopeListDto>> for ScopeList {
    type Error = ScopeParseError;

    fn try_from(dto: Option<ScopeListDto>) -> Result<Self, Self::Error> {
        if let Some(dto) = dto {
            match dto {
                ScopeListDto::String(s) => Self::try_from(s),
                ScopeListDto::Array(arr) => Ok(Self(arr)),
            }
        } else {
            Ok(Self::new())
        }
    }
}

impl From<ScopeList> for ScopeListDto {
    fn from(list: ScopeList) -> Self {
        ScopeListDto::String(list.to_string())
    }
}

/// A list of top-level scopes, such as the `scope` parameter of an
/// authorization request
///
/// The list serializes as a single space-separated scope expression. It
/// deserializes from such an expression, from an array of single-scope
/// expressions, or from `null`, which produces an empty list.
///
/// ```
/// use scope_tree::ScopeList;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let requested: ScopeList = "openid transfer:all[*data_access]".parse()?;
/// let required: ScopeList = serde_json::from_str(r#"["transfer:all[*data_access]"]"#)?;
///
/// assert!(requested.contains_all(&required));
/// assert_eq!(serde_json::to_string(&required)?, r#""transfer:all[*data_access]""#);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "Option<ScopeListDto>", into = "ScopeListDto")]
pub struct ScopeList(Vec<Scope>);

impl ScopeList {
    /// Produces an empty list
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a scope to the list
    #[inline]
    pub fn push(&mut self, scope: Scope) {
        self.0.push(scope);
    }

    /// The number of top-level scopes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list holds no scopes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Produces an iterator of the scopes in this list
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Scope> {
        self.0.iter()
    }

    /// The scopes as a slice
    #[inline]
    pub fn as_slice(&self) -> &[Scope] {
        &self.0
    }

    /// Unwraps the underlying scopes
    #[inline]
    pub fn into_vec(self) -> Vec<Scope> {
        self.0
    }

    /// Produces a list in which scopes sharing a name have been merged
    ///
    /// See [`ScopeParser::merge_scopes`].
    pub fn merged(&self) -> Self {
        Self(ScopeParser::merge_scopes(self.0.iter().cloned()))
    }

    /// Checks to see whether every scope in `required` is covered by some
    /// scope in this list
    ///
    /// See [`Scope::covers`].
    pub fn contains_all(&self, required: &ScopeList) -> bool {
        required
            .iter()
            .all(|r| self.0.iter().any(|held| held.covers(r)))
    }
}

impl fmt::Display for ScopeList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&parser::join(&self.0))
    }
}

impl FromStr for ScopeList {
    type Err = ScopeParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScopeParser::new().parse(s).map(Self)
    }
}

impl TryFrom<&'_ str> for ScopeList {
    type Error = ScopeParseError;

    #[inline]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for ScopeList {
    type Error = ScopeParseError;

    #[inline]
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Vec<Scope>> for ScopeList {
    #[inline]
    fn from(scopes: Vec<Scope>) -> Self {
        Self(scopes)
    }
}

impl From<Scope> for ScopeList {
    #[inline]
    fn from(scope: Scope) -> Self {
        Self(vec![scope])
    }
}

impl IntoIterator for ScopeList {
    type Item = Scope;
    type IntoIter = vec::IntoIter<Scope>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScopeList {
    type Item = &'a Scope;
    type IntoIter = slice::Iter<'a, Scope>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<Scope> for ScopeList {
    #[inline]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Scope>,
    {
        self.0.extend(iter)
    }
}

impl FromIterator<Scope> for ScopeList {
    #[inline]
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        Self(Vec::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct AuthorizationErrorBody {
        #[serde(default)]
        required_scope: ScopeList,
    }

    #[test]
    fn parses_and_displays() -> Result<()> {
        let list: ScopeList = "  openid   all[*data_access] ".parse()?;
        assert_eq!(list.len(), 2);
        assert_eq!(list.to_string(), "openid all[*data_access]");
        Ok(())
    }

    #[test]
    fn empty_list_displays_as_empty_string() {
        let list = ScopeList::new();
        assert!(list.is_empty());
        assert_eq!(list.to_string(), "");
    }

    #[test]
    fn deserializes_from_string() -> Result<()> {
        let list: ScopeList = serde_json::from_str(r#""openid email[*profile]""#)?;
        assert_eq!(
            list.into_vec(),
            [Scope::from_static("openid"), Scope::from_static("email[*profile]")]
        );
        Ok(())
    }

    #[test]
    fn deserializes_from_array() -> Result<()> {
        let list: ScopeList = serde_json::from_str(r#"["openid", "all[*data_access]"]"#)?;
        assert_eq!(list.to_string(), "openid all[*data_access]");
        Ok(())
    }

    #[test]
    fn deserializes_from_null() -> Result<()> {
        let list: ScopeList = serde_json::from_str("null")?;
        assert!(list.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_malformed_string() {
        assert!(serde_json::from_str::<ScopeList>(r#""all[data_access""#).is_err());
        assert!(serde_json::from_str::<ScopeList>(r#"["a b"]"#).is_err());
    }

    #[test]
    fn serializes_as_string() -> Result<()> {
        let list: ScopeList = "b[*c] a".parse()?;
        assert_eq!(serde_json::to_string(&list)?, r#""b[*c] a""#);
        Ok(())
    }

    #[test]
    fn reads_required_scope_from_error_body() -> Result<()> {
        let body: AuthorizationErrorBody = serde_json::from_str(
            r#"{"required_scope": "transfer:all[*https://auth.example.org/scopes/ID/data_access]"}"#,
        )?;
        assert_eq!(body.required_scope.len(), 1);
        assert_eq!(
            body.required_scope.as_slice()[0].dependencies()[0]
                .name()
                .as_str(),
            "https://auth.example.org/scopes/ID/data_access"
        );

        let missing: AuthorizationErrorBody = serde_json::from_str("{}")?;
        assert!(missing.required_scope.is_empty());
        Ok(())
    }

    #[test]
    fn merged_combines_duplicates() -> Result<()> {
        let list: ScopeList = "x[a] y *x[b]".parse()?;
        let merged = list.merged();
        assert_eq!(merged.to_string(), "x[a b] y");
        assert_eq!(list.len(), 3);
        Ok(())
    }

    #[test]
    fn contains_all_checks_coverage() -> Result<()> {
        let held: ScopeList = "openid transfer[*data_access other]".parse()?;

        assert!(held.contains_all(&"transfer[*data_access]".parse::<ScopeList>()?));
        assert!(held.contains_all(&ScopeList::new()));
        assert!(!held.contains_all(&"transfer[data_access]".parse::<ScopeList>()?));
        assert!(!held.contains_all(&"openid email".parse::<ScopeList>()?));
        Ok(())
    }

    #[test]
    fn collects_and_extends() {
        let mut list: ScopeList = vec![Scope::from_static("a")].into_iter().collect();
        list.extend(vec![Scope::from_static("b")]);
        list.push(Scope::from_static("c[d]"));

        let names: Vec<_> = (&list).into_iter().map(|s| s.name().as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(ScopeList::from(Scope::from_static("z")).len(), 1);
    }
}
