use std::{cmp::Ordering, str::FromStr};

use itertools::Itertools;
use serde::Serialize;
use strum::IntoEnumIterator;

/// The fixed categories that always sort before any other tag, in this order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CoreCategory {
    Commercial,
    Narrative,
    #[strum(to_string = "Music Video")]
    MusicVideo,
    Documentary,
}

impl CoreCategory {
    pub fn from_tag(name: &str) -> Option<CoreCategory> {
        CoreCategory::from_str(name.trim()).ok()
    }

    pub fn all_names() -> Vec<String> {
        CoreCategory::iter().map(|c| c.to_string()).collect()
    }
}

/// Tag order used everywhere tags are listed: core categories first in
/// their fixed order, then everything else alphabetically.
pub fn compare_tags(a: &str, b: &str) -> Ordering {
    match (CoreCategory::from_tag(a), CoreCategory::from_tag(b)) {
        (Some(ca), Some(cb)) => ca.cmp(&cb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

pub fn sort_tags(tags: &mut [String]) {
    tags.sort_by(|a, b| compare_tags(a, b));
}

/// Merges the checked core categories with the comma separated custom tags.
///
/// Names are trimmed, empty ones dropped, and a custom tag that names a core
/// category (in any case) becomes that category. The result is deduplicated
/// and in tag order.
pub fn normalize_tags(categories: &[String], custom_tags: &str) -> Vec<String> {
    let mut tags: Vec<String> = categories
        .iter()
        .map(String::as_str)
        .chain(custom_tags.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| match CoreCategory::from_tag(t) {
            Some(core) => core.to_string(),
            None => t.to_owned(),
        })
        .unique()
        .collect();
    sort_tags(&mut tags);
    tags
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: i64,
}

/// Core rank first, then busiest tags, then by name
pub fn compare_category_counts(a: &CategoryCount, b: &CategoryCount) -> Ordering {
    match (
        CoreCategory::from_tag(&a.name),
        CoreCategory::from_tag(&b.name),
    ) {
        (Some(ca), Some(cb)) => ca.cmp(&cb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b
            .count
            .cmp(&a.count)
            .then_with(|| compare_tags(&a.name, &b.name)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn core_categories_come_first_in_fixed_order() {
        let mut tags: Vec<String> = vec![
            "aerial",
            "Documentary",
            "Music Video",
            "Zine",
            "Commercial",
            "Narrative",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        sort_tags(&mut tags);
        assert_eq!(
            tags,
            vec![
                "Commercial",
                "Narrative",
                "Music Video",
                "Documentary",
                "aerial",
                "Zine"
            ]
        );
    }

    #[test]
    fn custom_tag_matching_core_category_is_merged() {
        let tags = normalize_tags(
            &["Narrative".to_owned()],
            " music video ,, narrative,Drone ,drone",
        );
        assert_eq!(tags, vec!["Narrative", "Music Video", "Drone", "drone"]);
    }

    #[test]
    fn category_counts_order() {
        let mut counts = vec![
            CategoryCount {
                name: "b-roll".into(),
                count: 1,
            },
            CategoryCount {
                name: "Documentary".into(),
                count: 9,
            },
            CategoryCount {
                name: "aerial".into(),
                count: 4,
            },
            CategoryCount {
                name: "Commercial".into(),
                count: 0,
            },
            CategoryCount {
                name: "archive".into(),
                count: 1,
            },
        ];
        counts.sort_by(compare_category_counts);
        let names: Vec<&str> = counts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Commercial", "Documentary", "aerial", "archive", "b-roll"]
        );
    }

    proptest! {
        #[test]
        fn tag_order_is_total_and_core_first(mut tags in proptest::collection::vec(
            prop_oneof![
                Just("Commercial".to_owned()),
                Just("Narrative".to_owned()),
                Just("Music Video".to_owned()),
                Just("Documentary".to_owned()),
                "[a-zA-Z ]{1,12}",
            ],
            0..20,
        )) {
            sort_tags(&mut tags);
            for pair in tags.windows(2) {
                prop_assert_ne!(compare_tags(&pair[0], &pair[1]), Ordering::Greater);
            }
            let first_custom = tags
                .iter()
                .position(|t| CoreCategory::from_tag(t).is_none())
                .unwrap_or(tags.len());
            prop_assert!(tags[first_custom..]
                .iter()
                .all(|t| CoreCategory::from_tag(t).is_none()));
        }
    }
}
