use proptest::prelude::*;
use std::collections::HashSet;
use tagstore::cleaning::{record_matches_tags, CleaningMode, TagFilter};

fn tag_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-e]", 0..5)
}

fn shared(entry: &[String], requested: &HashSet<&str>) -> usize {
    requested
        .iter()
        .filter(|tag| entry.iter().any(|t| t == **tag))
        .count()
}

proptest! {
    #[test]
    fn prop_mode_predicates(entry in tag_set(), requested in tag_set()) {
        let requested: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let overlap = shared(&entry, &requested);

        prop_assert!(record_matches_tags(&entry[..], &requested, CleaningMode::All));
        prop_assert!(!record_matches_tags(&entry[..], &requested, CleaningMode::Old));
        prop_assert_eq!(
            record_matches_tags(&entry[..], &requested, CleaningMode::MatchingAnyTag),
            overlap != 0
        );
        prop_assert_eq!(
            record_matches_tags(&entry[..], &requested, CleaningMode::NotMatchingTag),
            overlap == 0
        );
        prop_assert_eq!(
            record_matches_tags(&entry[..], &requested, CleaningMode::MatchingTag),
            overlap == requested.len()
        );
    }

    #[test]
    fn prop_any_and_not_matching_partition(entry in tag_set(), requested in tag_set()) {
        let requested: Vec<&str> = requested.iter().map(String::as_str).collect();
        let any = TagFilter::new(CleaningMode::MatchingAnyTag, &requested);
        let none = TagFilter::new(CleaningMode::NotMatchingTag, &requested);

        prop_assert_ne!(any.matches(&entry[..]), none.matches(&entry[..]));
    }

    #[test]
    fn prop_matching_tag_implies_any_when_requested(entry in tag_set(), requested in tag_set()) {
        prop_assume!(!requested.is_empty());
        let requested: Vec<&str> = requested.iter().map(String::as_str).collect();
        let all = TagFilter::new(CleaningMode::MatchingTag, &requested);
        let any = TagFilter::new(CleaningMode::MatchingAnyTag, &requested);

        if all.matches(&entry[..]) {
            prop_assert!(any.matches(&entry[..]));
        }
    }
}
