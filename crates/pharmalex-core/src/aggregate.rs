//! Representative labels per entity code, chosen by frequency vote.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::extract::{english_name, join_tokens};
use crate::text::{is_ratio_only, unify, Rules, LIST_SEPARATOR};

/// Literal placeholder some sources put in place of an unclassified ingredient.
pub const PLACEHOLDER: &str = "미분화";

/// The per-record values one group member contributes to the vote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupMember<'a> {
    /// Raw generic-name field
    pub generic_name: &'a str,
    /// Joined ingredient-extraction output for the record
    pub ingredients: &'a str,
}

impl<'a> GroupMember<'a> {
    #[must_use]
    pub fn new(generic_name: &'a str, ingredients: &'a str) -> Self {
        Self {
            generic_name,
            ingredients,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalLabel {
    pub ko_label: String,
    pub en_label: String,
    /// Occurrences of `ko_label` among the candidates it was chosen from
    pub ko_votes: usize,
}

impl CanonicalLabel {
    pub fn is_missing(&self) -> bool {
        self.ko_label.is_empty() && self.en_label.is_empty()
    }
}

/// Blank, the `미분화` placeholder, or a bare ratio.
pub fn is_invalid(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == PLACEHOLDER || is_ratio_only(value)
}

/// Most frequent value with its count. Ties go to the value seen first.
pub fn most_frequent<I, T>(values: I) -> Option<(T, usize)>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash,
{
    let mut counts: IndexMap<T, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        let replace = match &best {
            Some((_, top)) => count > *top,
            None => true,
        };
        if replace {
            best = Some((value, count));
        }
    }
    best
}

/// Overwrites an invalid value with the representative, if there is one.
///
/// Returns whether the value was replaced. A valid value is never touched.
pub fn fill_forward(value: &mut String, representative: &str) -> bool {
    if representative.is_empty() || !is_invalid(value) {
        return false;
    }
    representative.clone_into(value);
    true
}

impl Rules {
    /// Flat generic-name counterpart of ingredient extraction.
    ///
    /// No segmenting: the whole value is cleaned, split on `,` `/` `·`,
    /// and form-only, ratio and pure-dose tokens are dropped. Form-tagged
    /// tokens are reduced to their ingredient (`아스피린정` gives `아스피린`).
    pub fn normalize_general(&self, generic: &str) -> String {
        let normalized = unify(generic);
        if normalized.is_empty() {
            return String::new();
        }

        let cleaned = self.ratio_paren.replace_all(&normalized, "");
        let cleaned = self.drop_dose_anywhere(&cleaned);
        let cleaned = self.drop_pack_tokens(&cleaned);
        let cleaned = self.drop_orphan_units(&cleaned);

        let tokens: IndexSet<String> = cleaned
            .split([',', '/', LIST_SEPARATOR])
            .filter_map(|part| self.resolve_generic_token(part))
            .collect();
        join_tokens(tokens)
    }

    /// Korean and English labels for one entity group, scanned in slice order.
    ///
    /// Korean: most frequent valid normalized generic name, else the most
    /// frequent valid ingredient value. English: most frequent English-only generic
    /// name. Either side is empty when it has no candidate.
    pub fn representative_labels(&self, members: &[GroupMember<'_>]) -> CanonicalLabel {
        let from_generic = most_frequent(
            members
                .iter()
                .map(|m| self.normalize_general(m.generic_name))
                .filter(|v| !is_invalid(v)),
        );

        let (ko_label, ko_votes) = from_generic
            .or_else(|| {
                most_frequent(
                    members
                        .iter()
                        .map(|m| m.ingredients.trim())
                        .filter(|v| !is_invalid(v))
                        .map(str::to_string),
                )
            })
            .unwrap_or_default();

        let en_label = most_frequent(
            members
                .iter()
                .map(|m| english_name(m.generic_name))
                .filter(|v| !v.is_empty()),
        )
        .map(|(label, _)| label)
        .unwrap_or_default();

        CanonicalLabel {
            ko_label,
            en_label,
            ko_votes,
        }
    }
}

pub fn normalize_general(generic: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).normalize_general(generic)
}

pub fn representative_labels(members: &[GroupMember<'_>], keep_percent: bool) -> CanonicalLabel {
    Rules::standard(keep_percent).representative_labels(members)
}
