//! Surface-form variants and the synonym rule lines built from them.
//!
//! A rule line reads `surface1, surface2 => canonical`. Surfaces are sorted,
//! unique, balanced in parentheses and never equal to their canonical.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{EntityLabel, ProcessedRecord};
use crate::text::{has_latin, repair_parens, unify, Rules, LIST_SEPARATOR};

const RULE_ARROW: &str = "=>";

impl Rules {
    /// Alternate spellings of a label. The label itself is not included.
    ///
    /// Spelling pairs are swapped both ways, Latin labels also get a
    /// lower-case form with salt suffixes toggled (`hydrochloride`/`hcl`).
    /// Each of those bases then yields hyphen-removed, hyphen-as-space,
    /// space-removed and `·`-as-space shapes.
    pub fn variants(&self, label: &str) -> BTreeSet<String> {
        let label = unify(label);
        let mut out = BTreeSet::new();
        if label.is_empty() {
            return out;
        }

        let mut bases = vec![label.clone()];
        for (a, b) in &self.vocabulary.spelling_pairs {
            if a.is_empty() || b.is_empty() {
                continue;
            }
            if label.contains(a.as_str()) {
                bases.push(label.replace(a.as_str(), b));
            }
            if label.contains(b.as_str()) {
                bases.push(label.replace(b.as_str(), a));
            }
        }
        if has_latin(&label) {
            let lower = label.to_lowercase();
            bases.extend(self.toggle_salt(&lower));
            bases.push(lower);
        }

        for base in &bases {
            out.insert(base.clone());
            out.insert(base.replace('-', ""));
            out.insert(unify(&base.replace('-', " ")));
            out.insert(base.split_whitespace().collect());
            out.insert(unify(&base.replace(LIST_SEPARATOR, " ")));
        }

        out.remove(&label);
        out.remove("");
        out
    }

    /// Same name with each matching salt suffix swapped for its other spelling.
    fn toggle_salt(&self, lower: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (long, short) in &self.vocabulary.salt_suffixes {
            let (long, short) = (long.to_lowercase(), short.to_lowercase());
            if long.is_empty() || short.is_empty() {
                continue;
            }
            if let Some(stem) = lower.strip_suffix(long.as_str()) {
                if !stem.trim().is_empty() {
                    out.push(format!("{stem}{short}"));
                }
            } else if let Some(stem) = lower.strip_suffix(short.as_str()) {
                if stem.ends_with(' ') && !stem.trim().is_empty() {
                    out.push(format!("{stem}{long}"));
                }
            }
        }
        out
    }

    /// Surfaces for one entity group: display names, export aliases, ATC
    /// names, ingredient values and both labels, each with its variants.
    ///
    /// The canonical label is excluded. The result is sorted and holds at
    /// most `max_per_group` entries.
    pub fn group_synonyms<'a, I>(
        &self,
        label: &EntityLabel,
        records: I,
        max_per_group: usize,
    ) -> Vec<String>
    where
        I: IntoIterator<Item = &'a ProcessedRecord>,
    {
        let mut seeds: BTreeSet<String> = BTreeSet::new();
        seeds.insert(label.ko_label.clone());
        seeds.insert(label.en_label.clone());

        for record in records {
            seeds.insert(record.display_name.clone());
            seeds.insert(record.ingredients_joined.clone());
            seeds.insert(record.ingredients_en_joined.clone());
            seeds.insert(record.atc_name.clone());
            seeds.extend(record.export_aliases.iter().cloned());
        }

        let mut surfaces: BTreeSet<String> = BTreeSet::new();
        for seed in &seeds {
            let seed = surface_form(seed);
            if seed.is_empty() {
                continue;
            }
            surfaces.extend(self.variants(&seed).into_iter().map(|v| surface_form(&v)));
            surfaces.insert(seed);
        }

        let canonical = surface_form(label.representative());
        surfaces.remove(&canonical);
        surfaces.remove("");
        surfaces.into_iter().take(max_per_group).collect()
    }
}

/// Cleans a value for use on a rule line.
///
/// Commas are list syntax on the line so they become spaces, and a value
/// containing the rule arrow is unusable. Parentheses are repaired.
pub fn surface_form(value: &str) -> String {
    let value = unify(&value.replace(',', " "));
    if value.contains(RULE_ARROW) {
        return String::new();
    }
    repair_parens(&value)
}

/// One `surfaces => canonical` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRule {
    pub canonical: String,
    /// Sorted, unique, never containing `canonical`
    pub surfaces: Vec<String>,
}

impl SynonymRule {
    /// Builds a rule keeping the first `max_per_line` surfaces in sorted order.
    ///
    /// `None` when the canonical is unusable or no surface remains.
    pub fn new<I, S>(canonical: &str, surfaces: I, max_per_line: usize) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = surface_form(canonical);
        if canonical.is_empty() {
            return None;
        }

        let surfaces: Vec<String> = surfaces
            .into_iter()
            .map(|s| surface_form(s.as_ref()))
            .filter(|s| !s.is_empty() && *s != canonical)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(max_per_line)
            .collect();

        if surfaces.is_empty() {
            None
        } else {
            Some(Self {
                canonical,
                surfaces,
            })
        }
    }
}

impl fmt::Display for SynonymRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {RULE_ARROW} {}", self.surfaces.join(", "), self.canonical)
    }
}

/// Proper-noun dictionary line: the term, then a tab and the tag if one is set.
pub fn dictionary_line(term: &str, pos_tag: Option<&str>) -> String {
    match pos_tag.filter(|t| !t.is_empty()) {
        Some(tag) => format!("{term}\t{tag}"),
        None => term.to_string(),
    }
}

pub fn variants(label: &str) -> BTreeSet<String> {
    Rules::standard(false).variants(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn rules() -> &'static Rules {
        Rules::standard(false)
    }

    fn processed(display: &str, ingredients: &str, aliases: &[&str]) -> ProcessedRecord {
        ProcessedRecord {
            source: RawRecord::new(),
            display_name: display.to_string(),
            ingredients_joined: ingredients.to_string(),
            ingredients_en_joined: String::new(),
            atc_name: String::new(),
            export_aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            filled: false,
        }
    }

    #[test]
    fn test_spelling_pair_both_ways() {
        let forms = variants("오메프라졸캅셀");
        assert!(forms.contains("오메프라졸캡슐"));

        let forms = variants("오메프라졸캡슐");
        assert!(forms.contains("오메프라졸캅셀"));
        assert!(!forms.contains("오메프라졸캡슐"));
    }

    #[test]
    fn test_shape_variants() {
        let forms = variants("L-카르니틴 타르트레이트");
        assert!(forms.contains("L카르니틴 타르트레이트"));
        assert!(forms.contains("L 카르니틴 타르트레이트"));
        assert!(forms.contains("L-카르니틴타르트레이트"));

        let forms = variants("아목시실린·클라불란산");
        assert!(forms.contains("아목시실린 클라불란산"));
    }

    #[test]
    fn test_english_lower_and_salt() {
        let forms = variants("Ranitidine Hydrochloride");
        assert!(forms.contains("ranitidine hydrochloride"));
        assert!(forms.contains("ranitidine hcl"));
        assert!(forms.contains("ranitidinehcl"));

        let forms = variants("ranitidine hcl");
        assert!(forms.contains("ranitidine hydrochloride"));
        assert!(!forms.contains("ranitidine hcl"));
    }

    #[test]
    fn test_salt_needs_word_boundary_for_abbreviation() {
        assert!(!variants("tchcl").iter().any(|v| v.contains("hydrochloride")));
    }

    #[test]
    fn test_variants_of_blank() {
        assert!(variants("  ").is_empty());
        assert!(variants("아스피린").is_empty());
    }

    #[test]
    fn test_rule_line_format() {
        let rule = SynonymRule::new("아스피린", ["아스피린정", "aspirin", "아스피린", "aspirin"], 50)
            .unwrap();
        assert_eq!(rule.to_string(), "aspirin, 아스피린정 => 아스피린");
    }

    #[test]
    fn test_rule_cleans_surfaces() {
        let rule = SynonymRule::new("아목시실린", ["A, B", "x => y", "타이레놀(수출"], 50).unwrap();
        assert_eq!(rule.surfaces, vec!["A B", "타이레놀(수출)"]);
    }

    #[test]
    fn test_rule_cap_and_empty() {
        let rule = SynonymRule::new("z", ["c", "a", "b"], 2).unwrap();
        assert_eq!(rule.surfaces, vec!["a", "b"]);

        assert!(SynonymRule::new("z", ["z", " "], 50).is_none());
        assert!(SynonymRule::new("", ["a"], 50).is_none());
    }

    #[test]
    fn test_dictionary_line() {
        assert_eq!(dictionary_line("타이레놀정", Some("NNP")), "타이레놀정\tNNP");
        assert_eq!(dictionary_line("타이레놀정", None), "타이레놀정");
        assert_eq!(dictionary_line("타이레놀정", Some("")), "타이레놀정");
    }

    #[test]
    fn test_group_synonyms_exclude_canonical() {
        let label = EntityLabel {
            entity_code: "101".into(),
            ko_label: "아스피린".into(),
            en_label: "aspirin".into(),
        };
        let records = vec![
            processed("아스피린장용정", "아스피린", &[]),
            processed("바이엘아스피린", "아스피린", &["ASPIRIN PROTECT"]),
        ];

        let surfaces = rules().group_synonyms(&label, &records, 200);
        assert!(!surfaces.contains(&"아스피린".to_string()));
        assert!(surfaces.contains(&"aspirin".to_string()));
        assert!(surfaces.contains(&"아스피린장용정".to_string()));
        assert!(surfaces.contains(&"ASPIRIN PROTECT".to_string()));
        assert!(surfaces.contains(&"aspirin protect".to_string()));
        assert!(surfaces.contains(&"ASPIRINPROTECT".to_string()));

        let mut sorted = surfaces.clone();
        sorted.sort();
        assert_eq!(surfaces, sorted);
    }

    #[test]
    fn test_group_synonyms_cap() {
        let label = EntityLabel {
            entity_code: "101".into(),
            ko_label: "k".into(),
            en_label: String::new(),
        };
        let records = vec![processed("a-b c", "d", &[])];
        assert_eq!(rules().group_synonyms(&label, &records, 2).len(), 2);
    }
}
