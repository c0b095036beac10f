use super::{parent_dir, find_file, Lookup, Resolver};
use crate::extract::is_relative_script_path;
use crate::language::Language;
use crate::types::ImportSpecifier;
use std::path::{Path, PathBuf};

const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "sys", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

pub(super) fn resolve(resolver: &Resolver, spec: &ImportSpecifier) -> Lookup {
    let raw = strip_query(spec.raw.trim());
    let language = spec.language;
    let find = |base: &Path| find_script(base, language);

    if is_relative_script_path(raw) {
        let base = if raw.starts_with('/') {
            PathBuf::from(raw)
        } else {
            parent_dir(&spec.origin).join(raw)
        };
        return find(&base).into();
    }

    if is_builtin(raw) {
        return Lookup::External;
    }

    if let Some(found) = resolver.search_aliases(raw, find) {
        return Lookup::Found(found);
    }

    match resolver.search_roots(Path::new(raw), find) {
        Lookup::NotFound if installed_package(&spec.origin, raw) => Lookup::External,
        lookup => lookup,
    }
}

/// Implicit-extension find_file plus the TypeScript convention of importing
/// `./c.js` for a `c.ts` source.
fn find_script(base: &Path, language: Language) -> Option<PathBuf> {
    find_file(base, language).or_else(|| {
        if language != Language::TypeScript {
            return None;
        }
        let sources: &[&str] = match base.extension()?.to_str()? {
            "js" => &["ts", "tsx"],
            "jsx" => &["tsx"],
            "mjs" => &["mts"],
            "cjs" => &["cts"],
            _ => return None,
        };
        sources
            .iter()
            .map(|ext| base.with_extension(ext))
            .find(|candidate| candidate.is_file())
    })
}

fn strip_query(raw: &str) -> &str {
    raw.split(['?', '#']).next().unwrap_or(raw)
}

fn is_builtin(raw: &str) -> bool {
    if raw.starts_with("node:") {
        return true;
    }
    let name = raw.split('/').next().unwrap_or(raw);
    NODE_BUILTINS.contains(&name)
}

/// `lodash/fp` -> `lodash`, `@scope/pkg/sub` -> `@scope/pkg`
fn package_name(raw: &str) -> &str {
    let mut end = raw.len();
    let skip = if raw.starts_with('@') { 1 } else { 0 };
    if let Some((idx, _)) = raw.match_indices('/').nth(skip) {
        end = idx;
    }
    &raw[..end]
}

/// Whether `node_modules/<package>` exists in an ancestor of `origin`.
fn installed_package(origin: &Path, raw: &str) -> bool {
    let package = package_name(raw);
    parent_dir(origin)
        .ancestors()
        .any(|dir| dir.join("node_modules").join(package).is_dir())
}
