//! Bind-mount spec parsing for `source:target[:mode]`.
//!
//! Parsing is best-effort: one malformed entry in an operator-supplied list
//! is skipped, never reported, so it cannot block every other bind.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Source, target and optional mode. A single drive-letter prefix such as
/// `C:` is allowed at the start of either path so it is not read as the
/// separator.
static VOLUME_PARTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Constant pattern; cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^((?:[A-Za-z0-9_]:)?[^:]*):((?:[A-Za-z0-9_]:)?[^:]*)(?::([rwom]*))?")
        .expect("valid regex")
});

/// Split one bind spec into its non-empty components.
///
/// Specs the pattern does not match fall back to a plain colon split, which
/// keeps empty components.
#[must_use]
pub fn split_volume_parts(spec: &str) -> Vec<String> {
    match VOLUME_PARTS_RE.captures(spec) {
        Some(caps) => caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect(),
        None => spec.split(':').map(str::to_owned).collect(),
    }
}

/// Target of a bind spec, if it has one.
fn bind_target(spec: &str) -> Option<String> {
    split_volume_parts(spec).into_iter().nth(1)
}

/// Collect the unique mount targets of `paths`.
///
/// Entries with fewer than two components are dropped.
pub fn to_bind_set<'a>(paths: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    paths.into_iter().filter_map(bind_target).collect()
}

/// Drop binds whose target is already claimed by an earlier bind.
///
/// Entries without a target are passed through; the runtime rejects them
/// with its own message.
pub fn dedup_binds<'a>(binds: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    binds
        .into_iter()
        .filter(|spec| bind_target(spec).is_none_or(|target| seen.insert(target)))
        .map(str::to_owned)
        .collect()
}
