//! Folding of scopes that share a name

use ahash::AHashMap;

use crate::{name::ScopeName, scope::Scope};

/// Groups scopes by name and folds each group into a single scope
///
/// Output order follows the first occurrence of each name. Singleton groups
/// are returned untouched.
pub(crate) fn merge_scopes<I>(scopes: I) -> Vec<Scope>
where
    I: IntoIterator<Item = Scope>,
{
    let mut index: AHashMap<ScopeName, usize> = AHashMap::new();
    let mut groups: Vec<Vec<Scope>> = Vec::new();

    for scope in scopes {
        match index.get(scope.name()).copied() {
            Some(i) => groups[i].push(scope),
            None => {
                index.insert(scope.name().to_owned(), groups.len());
                groups.push(vec![scope]);
            }
        }
    }

    groups.into_iter().filter_map(merge_group).collect()
}

fn merge_group(mut group: Vec<Scope>) -> Option<Scope> {
    if group.len() <= 1 {
        return group.pop();
    }

    // A single required occurrence makes the merged scope required.
    let optional = group.iter().all(Scope::is_optional);
    let dependencies = merge_scopes(
        group
            .iter()
            .flat_map(|s| s.dependencies().iter().cloned()),
    );

    Some(Scope::from_parts(
        group[0].name().to_owned(),
        optional,
        dependencies,
    ))
}
