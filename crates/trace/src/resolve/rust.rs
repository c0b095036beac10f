use super::{parent_dir, find_implicit, Lookup, Resolver};
use crate::language::Language;
use crate::types::{ImportSpecifier, SpecifierKind};
use std::path::{Path, PathBuf};

const SYSROOT_CRATES: &[&str] = &["std", "core", "alloc", "proc_macro", "test"];

/// File names whose submodules live next to them rather than in a
/// directory named after them.
const DIR_OWNERS: &[&str] = &["mod", "lib", "main"];

/// Directories whose top-level `.rs` files are each the root of their own
/// target (integration tests, examples, benches).
const TARGET_DIRS: &[&str] = &["tests", "examples", "benches"];

pub(super) fn resolve(resolver: &Resolver, spec: &ImportSpecifier) -> Lookup {
    let raw = spec.raw.trim();
    let here = module_dir(&spec.origin);

    if spec.kind == SpecifierKind::ModuleDeclaration {
        return find_module(&here.join(raw)).into();
    }

    let mut segments = raw.split("::").filter(|s| !s.is_empty()).peekable();
    let Some(first) = segments.next() else {
        return Lookup::NotFound;
    };

    let (base, owner) = match first {
        "crate" if is_target_root(&spec.origin) => (here, Some(spec.origin.clone())),
        "crate" => match crate_src(&spec.origin, resolver) {
            Some(src) => {
                let owner = crate_root_file(&src);
                (src, owner)
            }
            None => return Lookup::NotFound,
        },
        "self" => (here, Some(spec.origin.clone())),
        "super" => {
            let mut dir = here;
            let mut levels = 1;
            while segments.peek() == Some(&"super") {
                segments.next();
                levels += 1;
            }
            for _ in 0..levels {
                match dir.parent() {
                    Some(parent) => dir = parent.to_path_buf(),
                    None => return Lookup::NotFound,
                }
            }
            let owner = owner_file(&dir);
            (dir, owner)
        }
        name if SYSROOT_CRATES.contains(&name) => return Lookup::External,
        name => match find_module(&here.join(name)) {
            // 2018-style path to a child module without `self::`
            Some(found) => {
                let rest: Vec<&str> = segments.collect();
                return walk(&here.join(name), &rest).or(Some(found)).into();
            }
            None => return Lookup::External,
        },
    };

    let rest: Vec<&str> = segments.collect();
    walk(&base, &rest).or(owner.filter(|f| f.is_file())).into()
}

/// Follow `segments` as nested modules under `dir`; the deepest segment that
/// names a module file wins.
fn walk(dir: &Path, segments: &[&str]) -> Option<PathBuf> {
    let mut dir = dir.to_path_buf();
    let mut found = None;
    for segment in segments {
        let segment = segment.trim_start_matches("r#");
        match find_module(&dir.join(segment)) {
            Some(file) => {
                found = Some(file);
                dir.push(segment);
            }
            None => break,
        }
    }
    found
}

/// `x.rs` or `x/mod.rs`
fn find_module(base: &Path) -> Option<PathBuf> {
    find_implicit(base, Language::Rust)
}

/// Directory holding the submodules of the module defined by `file`.
fn module_dir(file: &Path) -> PathBuf {
    let dir = parent_dir(file);
    match file.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !DIR_OWNERS.contains(&stem) && !is_target_root(file) => dir.join(stem),
        _ => dir.to_path_buf(),
    }
}

/// Crate root of a target other than `lib.rs`/`main.rs`: `tests/*.rs`,
/// `examples/*.rs`, `benches/*.rs`, `src/bin/*.rs` or `build.rs`.
fn is_target_root(file: &Path) -> bool {
    let Some(dir) = file.parent() else {
        return false;
    };
    let dir_name = dir.file_name().and_then(|name| name.to_str());
    let package_dir = dir.parent();

    match dir_name {
        // `src/tests/` with a `tests.rs` or `tests/mod.rs` is a module tree
        Some(name) if TARGET_DIRS.contains(&name) => {
            package_dir.is_some_and(|pkg| pkg.join("Cargo.toml").is_file())
                || owner_file(dir).is_none()
        }
        Some("bin") => package_dir
            .and_then(|pkg| pkg.file_name())
            .is_some_and(|name| name == "src"),
        _ => {
            file.file_name().is_some_and(|name| name == "build.rs")
                && dir.join("Cargo.toml").is_file()
        }
    }
}

/// The module file whose submodules live in `dir`.
fn owner_file(dir: &Path) -> Option<PathBuf> {
    let inside = ["mod.rs", "lib.rs", "main.rs"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    inside.or_else(|| {
        let name = dir.file_name()?.to_str()?;
        let sibling = dir.with_file_name(format!("{name}.rs"));
        sibling.is_file().then_some(sibling)
    })
}

fn crate_root_file(src: &Path) -> Option<PathBuf> {
    ["lib.rs", "main.rs"]
        .iter()
        .map(|name| src.join(name))
        .find(|path| path.is_file())
}

/// `src/` of the nearest enclosing crate, else the first root that looks
/// like one.
fn crate_src(origin: &Path, resolver: &Resolver) -> Option<PathBuf> {
    let manifest_dir = parent_dir(origin)
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file());
    if let Some(dir) = manifest_dir {
        let src = dir.join("src");
        if src.is_dir() {
            return Some(src);
        }
    }

    resolver.roots().iter().find_map(|root| {
        let src = root.join("src");
        if src.is_dir() {
            Some(src)
        } else if crate_root_file(root).is_some() {
            Some(root.to_path_buf())
        } else {
            None
        }
    })
}
