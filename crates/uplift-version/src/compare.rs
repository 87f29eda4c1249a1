//! Newer-than decision between a release candidate and the installed version.

use std::cmp::Ordering;

use crate::version::SemVer;

/// How two version strings related to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Both parsed as semantic versions.
    Semantic(Ordering),
    /// At least one failed to parse; only equality is known.
    Textual { equal: bool },
}

impl Comparison {
    /// Whether the candidate counts as newer under this comparison.
    ///
    /// A textual comparison treats any difference as newer, so a malformed
    /// or sibling tag never blocks an update. This can also report a
    /// downgrade as new.
    pub fn is_newer(self) -> bool {
        match self {
            Comparison::Semantic(ordering) => ordering == Ordering::Greater,
            Comparison::Textual { equal } => !equal,
        }
    }
}

/// Strip one leading `v` or `V` and surrounding whitespace from a tag.
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// Relate two tags. Both are normalised first, so `v1.2.0` and `1.2.0`
/// compare equal.
pub fn compare(candidate: &str, current: &str) -> Comparison {
    match (SemVer::parse(candidate), SemVer::parse(current)) {
        (Ok(candidate), Ok(current)) => Comparison::Semantic(candidate.precedence(&current)),
        _ => Comparison::Textual {
            equal: normalize_tag(candidate) == normalize_tag(current),
        },
    }
}

/// `true` when `candidate` should be offered as an update over `current`.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare(candidate, current).is_newer()
}
