//! Cleaning modes and the tag matching predicate.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Selection policy for `clean` and the `get_ids*` family.
///
/// String forms follow the host framework's mode names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CleaningMode {
    /// Every entry.
    All,
    /// Expired entries. Not supported by scan-based stores: selects nothing.
    Old,
    /// Entries carrying every requested tag.
    MatchingTag,
    /// Entries carrying none of the requested tags.
    NotMatchingTag,
    /// Entries carrying at least one requested tag.
    MatchingAnyTag,
}

impl CleaningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningMode::All => "all",
            CleaningMode::Old => "old",
            CleaningMode::MatchingTag => "matchingTag",
            CleaningMode::NotMatchingTag => "notMatchingTag",
            CleaningMode::MatchingAnyTag => "matchingAnyTag",
        }
    }
}

impl fmt::Display for CleaningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleaningMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(CleaningMode::All),
            "old" => Ok(CleaningMode::Old),
            "matchingTag" => Ok(CleaningMode::MatchingTag),
            "notMatchingTag" => Ok(CleaningMode::NotMatchingTag),
            "matchingAnyTag" => Ok(CleaningMode::MatchingAnyTag),
            other => Err(Error::InvalidArgument(format!(
                "unknown cleaning mode: {}",
                other
            ))),
        }
    }
}

/// Whether a record carrying `entry_tags` is selected by `mode` for `requested`.
///
/// `requested` is treated as a set. With no requested tags, `MatchingAnyTag`
/// selects nothing while `MatchingTag` and `NotMatchingTag` select everything.
pub fn record_matches_tags<S: AsRef<str>>(
    entry_tags: &[S],
    requested: &HashSet<&str>,
    mode: CleaningMode,
) -> bool {
    let shared = || {
        requested
            .iter()
            .filter(|tag| entry_tags.iter().any(|t| t.as_ref() == **tag))
            .count()
    };

    match mode {
        CleaningMode::All => true,
        CleaningMode::Old => false,
        CleaningMode::MatchingAnyTag => shared() != 0,
        CleaningMode::NotMatchingTag => shared() == 0,
        CleaningMode::MatchingTag => shared() == requested.len(),
    }
}

/// A cleaning mode bound to its requested tag set.
#[derive(Clone, Debug)]
pub struct TagFilter<'a> {
    mode: CleaningMode,
    tags: HashSet<&'a str>,
}

impl<'a> TagFilter<'a> {
    pub fn new(mode: CleaningMode, tags: &[&'a str]) -> Self {
        TagFilter {
            mode,
            tags: tags.iter().copied().collect(),
        }
    }

    pub fn mode(&self) -> CleaningMode {
        self.mode
    }

    pub fn matches<S: AsRef<str>>(&self, entry_tags: &[S]) -> bool {
        record_matches_tags(entry_tags, &self.tags, self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(tags: &[&'a str]) -> HashSet<&'a str> {
        tags.iter().copied().collect()
    }

    #[test]
    fn test_all_and_old() {
        let entry = ["x", "y"];
        assert!(record_matches_tags(&entry[..], &set(&["q"]), CleaningMode::All));
        assert!(!record_matches_tags(&entry[..], &set(&["x"]), CleaningMode::Old));
        assert!(!record_matches_tags(&entry[..], &set(&[]), CleaningMode::Old));
    }

    #[test]
    fn test_matching_any_tag() {
        let entry = ["x", "y"];
        assert!(record_matches_tags(
            &entry[..],
            &set(&["y", "z"]),
            CleaningMode::MatchingAnyTag
        ));
        assert!(!record_matches_tags(
            &entry[..],
            &set(&["z"]),
            CleaningMode::MatchingAnyTag
        ));
        assert!(!record_matches_tags(
            &entry[..],
            &set(&[]),
            CleaningMode::MatchingAnyTag
        ));
    }

    #[test]
    fn test_matching_tag_requires_every_tag() {
        let entry = ["x", "y"];
        assert!(record_matches_tags(
            &entry[..],
            &set(&["x", "y"]),
            CleaningMode::MatchingTag
        ));
        assert!(!record_matches_tags(
            &entry[..],
            &set(&["x", "z"]),
            CleaningMode::MatchingTag
        ));
        assert!(record_matches_tags(&entry[..], &set(&[]), CleaningMode::MatchingTag));
    }

    #[test]
    fn test_not_matching_tag() {
        let entry = ["x", "y"];
        assert!(record_matches_tags(
            &entry[..],
            &set(&["z"]),
            CleaningMode::NotMatchingTag
        ));
        assert!(!record_matches_tags(
            &entry[..],
            &set(&["y", "z"]),
            CleaningMode::NotMatchingTag
        ));
        let untagged: [&str; 0] = [];
        assert!(record_matches_tags(
            &untagged[..],
            &set(&["z"]),
            CleaningMode::NotMatchingTag
        ));
    }

    #[test]
    fn test_filter_dedupes_requested_tags() {
        let filter = TagFilter::new(CleaningMode::MatchingTag, &["x", "x"]);
        assert!(filter.matches(&["x".to_string()][..]));
    }

    #[test]
    fn test_mode_parse() {
        for mode in [
            CleaningMode::All,
            CleaningMode::Old,
            CleaningMode::MatchingTag,
            CleaningMode::NotMatchingTag,
            CleaningMode::MatchingAnyTag,
        ] {
            assert_eq!(mode.as_str().parse::<CleaningMode>().ok(), Some(mode));
        }

        assert!(matches!(
            "expired".parse::<CleaningMode>(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
