use super::{parent_dir, Lookup, Resolver};
use crate::types::{ImportSpecifier, SpecifierKind};
use std::path::{Path, PathBuf};

pub(super) fn resolve(resolver: &Resolver, spec: &ImportSpecifier) -> Lookup {
    let header = Path::new(spec.raw.trim());

    if spec.kind == SpecifierKind::RelativePath {
        let local = parent_dir(&spec.origin).join(header);
        if local.is_file() {
            return Lookup::Found(local);
        }
    }

    match resolver.search_roots(header, existing_file) {
        Lookup::NotFound if spec.kind == SpecifierKind::SystemInclude => Lookup::External,
        lookup => lookup,
    }
}

fn existing_file(path: &Path) -> Option<PathBuf> {
    path.is_file().then(|| path.to_path_buf())
}
