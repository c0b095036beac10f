use super::RawSpecifier;
use crate::types::SpecifierKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// `#include "x.h"`, `#include <x.h>` and the Objective-C style `#import`.
static PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*#[ \t]*(?:include|import)[ \t]*(?:"(?P<quoted>[^"\n]+)"|<(?P<angle>[^>\n]+)>)"#,
    )
    .expect("c include pattern")
});

pub(super) fn collect(masked: &str, out: &mut Vec<RawSpecifier>) {
    for caps in PATTERN.captures_iter(masked) {
        if let Some(m) = caps.name("quoted") {
            out.push(RawSpecifier::new(
                m.as_str().trim(),
                SpecifierKind::RelativePath,
                m.start(),
            ));
        } else if let Some(m) = caps.name("angle") {
            out.push(RawSpecifier::new(
                m.as_str().trim(),
                SpecifierKind::SystemInclude,
                m.start(),
            ));
        }
    }
}
