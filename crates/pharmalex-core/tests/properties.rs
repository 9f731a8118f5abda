use proptest::prelude::*;
use regex::Regex;

use pharmalex_core::{
    drop_dose_anywhere, drop_orphan_units, extract_display_name, extract_ingredients,
    is_balanced, is_pure_dose, is_ratio_only, outer_segments, representative_labels, unify,
    GroupMember,
};

/// Characters that exercise brackets, separators, doses and ratios.
const MESSY: &str = "[가-힣a-zA-Z0-9 ()（）［］【】《》·ᆞㆍ,/:.%~>→\u{3000}\u{feff}-]{0,40}";

fn dose_oracle() -> Regex {
    Regex::new(r"(?i)\d+(\.\d+)?\s*(mg|mcg|g|ml|l|밀리그램|그램|리터)").unwrap()
}

fn product_name() -> impl Strategy<Value = String> {
    let word = prop::sample::select(vec![
        "아스피린", "아목시실린", "클라불란산", "정", "캡슐", "주사용", "수출명:", "mg", "mL",
    ]);
    let dose = (1u32..1000, prop::sample::select(vec!["mg", "g", "mL", "%", "정", "IU"]))
        .prop_map(|(n, u)| format!("{n}{u}"));
    let piece = prop_oneof![
        word.prop_map(str::to_string),
        dose,
        Just("(".to_string()),
        Just(")".to_string()),
        Just(", ".to_string()),
        Just(" ".to_string()),
        Just("4:1".to_string()),
    ];
    prop::collection::vec(piece, 0..12).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn unify_is_idempotent(s in MESSY) {
        let once = unify(&s);
        prop_assert_eq!(unify(&once), once);
    }

    #[test]
    fn segments_are_balanced(s in MESSY) {
        for segment in outer_segments(&unify(&s)) {
            prop_assert!(is_balanced(&segment), "unbalanced segment {:?}", segment);
        }
    }

    #[test]
    fn no_dose_survives_stripping(s in MESSY) {
        let cleaned = drop_orphan_units(&drop_dose_anywhere(&s, false), false);
        prop_assert!(!dose_oracle().is_match(&cleaned), "dose left in {:?}", cleaned);
    }

    #[test]
    fn no_dose_survives_stripping_names(s in product_name()) {
        let cleaned = drop_orphan_units(&drop_dose_anywhere(&s, false), false);
        prop_assert!(!dose_oracle().is_match(&cleaned), "dose left in {:?}", cleaned);
    }

    #[test]
    fn lettered_token_is_not_both_dose_and_ratio(s in MESSY) {
        if s.chars().any(char::is_alphabetic) {
            prop_assert!(!(is_pure_dose(&s, false) && is_ratio_only(&s)));
        }
    }

    #[test]
    fn ingredients_are_unique(s in product_name()) {
        let tokens = extract_ingredients(&s, false);
        let mut seen = std::collections::HashSet::new();
        for token in &tokens {
            prop_assert!(seen.insert(token.clone()), "duplicate {:?} in {:?}", token, tokens);
        }
    }

    #[test]
    fn display_name_empty_only_for_blank(s in MESSY) {
        if extract_display_name(&s, false).is_empty() {
            prop_assert!(unify(&s).is_empty());
        }
    }

    #[test]
    fn representative_labels_are_deterministic(
        names in prop::collection::vec(
            prop::sample::select(vec!["아스피린", "아스피린정", "이부프로펜", "Ibuprofen", "", "4:1"]),
            0..10,
        )
    ) {
        let members: Vec<GroupMember<'_>> =
            names.iter().map(|&n| GroupMember::new(n, n)).collect();
        let first = representative_labels(&members, false);
        let second = representative_labels(&members, false);
        prop_assert_eq!(first, second);
    }
}
