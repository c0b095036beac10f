use super::{parent_dir, find_implicit, Lookup, Resolver};
use crate::language::Language;
use crate::types::{ImportSpecifier, SpecifierKind};
use std::path::{Path, PathBuf};

/// Top-level standard library modules.
const STDLIB: &[&str] = &[
    "__future__", "abc", "argparse", "array", "ast", "asyncio", "atexit", "base64", "bisect",
    "builtins", "bz2", "cmath", "codecs", "collections", "concurrent", "configparser",
    "contextlib", "copy", "csv", "ctypes", "dataclasses", "datetime", "decimal", "difflib", "dis",
    "email", "encodings", "enum", "errno", "filecmp", "fnmatch", "fractions", "ftplib",
    "functools", "gc", "getpass", "gettext", "glob", "graphlib", "gzip", "hashlib", "heapq",
    "hmac", "html", "http", "imaplib", "importlib", "inspect", "io", "ipaddress", "itertools",
    "json", "keyword", "linecache", "locale", "logging", "lzma", "math", "mimetypes",
    "multiprocessing", "netrc", "numbers", "operator", "os", "pathlib", "pickle", "pkgutil",
    "platform", "plistlib", "poplib", "pprint", "queue", "random", "re", "reprlib", "secrets",
    "select", "shlex", "shutil", "signal", "smtplib", "socket", "socketserver", "sqlite3", "ssl",
    "stat", "statistics", "string", "stringprep", "struct", "subprocess", "sys", "sysconfig",
    "tarfile", "tempfile", "textwrap", "threading", "time", "timeit", "tokenize", "tomllib",
    "traceback", "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "warnings",
    "weakref", "xml", "xmlrpc", "zipfile", "zlib", "zoneinfo",
];

/// Widely used third-party distributions; reported as external when no
/// local module of the same name exists.
const THIRD_PARTY: &[&str] = &[
    "aiohttp", "attr", "bs4", "celery", "click", "django", "fastapi", "flask", "httpx", "jinja2",
    "matplotlib", "numpy", "pandas", "pydantic", "pytest", "redis", "requests", "scipy",
    "setuptools", "sklearn", "sqlalchemy", "torch", "tqdm", "yaml",
];

pub(super) fn resolve(resolver: &Resolver, spec: &ImportSpecifier) -> Lookup {
    let raw = spec.raw.trim();
    let dir = parent_dir(&spec.origin);

    if raw.starts_with('.') {
        let found = resolve_relative(raw, dir).or_else(|| {
            // `from .. import NAME` where NAME is defined by the package
            let package = raw.trim_end_matches(|c: char| c != '.');
            (spec.kind == SpecifierKind::ImportedName)
                .then(|| resolve_relative(package, dir))
                .flatten()
        });
        return found.into();
    }

    let top = raw.split('.').next().unwrap_or(raw);
    if STDLIB.contains(&top) {
        return Lookup::External;
    }

    let relative = module_path(raw);
    match resolver.search_roots(&relative, find_module) {
        Lookup::NotFound => {}
        hit => return hit,
    }

    // Script-style sibling import
    if let Some(found) = find_module(&dir.join(&relative)) {
        return Lookup::Found(found);
    }

    if THIRD_PARTY.contains(&top) {
        Lookup::External
    } else {
        Lookup::NotFound
    }
}

/// `.a.b` relative to `dir`: one dot is `dir` itself, each further dot one
/// package up.
fn resolve_relative(raw: &str, dir: &Path) -> Option<PathBuf> {
    let rest = raw.trim_start_matches('.');
    let dots = raw.len() - rest.len();

    let mut base = dir;
    for _ in 1..dots {
        base = base.parent()?;
    }

    if rest.is_empty() {
        return find_module(base);
    }
    find_module(&base.join(module_path(rest)))
}

fn find_module(base: &Path) -> Option<PathBuf> {
    find_implicit(base, Language::Python)
}

fn module_path(dotted: &str) -> PathBuf {
    dotted.split('.').filter(|part| !part.is_empty()).collect()
}
