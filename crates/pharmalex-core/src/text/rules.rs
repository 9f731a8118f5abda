use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{NormalizeConfig, Vocabulary};
use crate::Result;

/// Pattern that can never match, used when a vocabulary list is empty.
const NEVER: &str = r"[^\s\S]";

static STANDARD: LazyLock<Rules> = LazyLock::new(|| {
    Rules::new(&NormalizeConfig::default()).expect("default vocabulary compiles")
});

static STANDARD_KEEP_PERCENT: LazyLock<Rules> = LazyLock::new(|| {
    Rules::new(&NormalizeConfig::default().with_keep_percent(true))
        .expect("default vocabulary compiles")
});

/// Compiled stripping and classification rules for one vocabulary.
///
/// Build once per configuration and share; every method is pure.
#[derive(Debug, Clone)]
pub struct Rules {
    pub(crate) keep_percent: bool,
    pub(crate) vocabulary: Vocabulary,
    /// `number unit` anywhere
    pub(crate) dose: Regex,
    /// trailing dose/pack cluster(s)
    pub(crate) tail: Regex,
    /// trailing `number 주`
    pub(crate) week_tail: Regex,
    /// whole-token dose, optionally wrapped in parens
    pub(crate) pure_dose: Regex,
    /// whole-token unit word
    pub(crate) unit_word: Regex,
    /// parenthesized pure ratio such as `(20->1)`
    pub(crate) ratio_paren: Regex,
    pub(crate) pack_words: HashSet<String>,
    /// longest first
    pub(crate) dosage_forms: Vec<String>,
    /// longest first
    pub(crate) form_prefixes: Vec<String>,
    pub(crate) foreign_form_words: HashSet<String>,
}

fn by_length_desc(list: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = list.iter().filter(|w| !w.is_empty()).cloned().collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    sorted.dedup();
    sorted
}

fn alternation(parts: &[String]) -> String {
    if parts.is_empty() {
        NEVER.to_string()
    } else {
        format!("(?:{})", parts.join("|"))
    }
}

fn literal_alternation(words: &[String]) -> String {
    let escaped: Vec<String> = by_length_desc(words)
        .iter()
        .map(|w| regex::escape(w))
        .collect();
    alternation(&escaped)
}

fn unit_alternation(vocabulary: &Vocabulary, keep_percent: bool) -> String {
    let mut parts: Vec<String> = by_length_desc(&vocabulary.units)
        .iter()
        .map(|w| regex::escape(w))
        .collect();
    parts.extend(vocabulary.iu_patterns.iter().filter(|p| !p.is_empty()).cloned());
    if !keep_percent {
        parts.push("%".to_string());
    }
    alternation(&parts)
}

impl Rules {
    pub fn new(config: &NormalizeConfig) -> Result<Self> {
        let keep_percent = config.keep_percent;
        let vocabulary = config.vocabulary.clone();

        let unit = unit_alternation(&vocabulary, keep_percent);
        let pack = literal_alternation(&vocabulary.trailing_pack_words);
        let unit_or_pack = format!("(?:{unit}|{pack})");

        let dose1 = format!(r"\d+(?:\.\d+)?\s*{unit}");
        let dose2 = format!(r"\d+\s*/\s*\d+\s*{unit_or_pack}?");
        let tail = format!(
            r"(?:{dose1}(?:\s*/\s*\d+(?:\.\d+)?\s*{unit_or_pack})?|{dose2}|{dose1}|(?:\d+\s*{pack}))"
        );

        Ok(Self {
            keep_percent,
            dose: Regex::new(&format!("(?i){dose1}"))?,
            tail: Regex::new(&format!(r"(?i)(?:{tail})+\s*$"))?,
            week_tail: Regex::new(r"\d+\s*주$")?,
            pure_dose: Regex::new(&format!(
                r"(?i)^\(?\s*\d+(?:\.\d+)?\s*{unit_or_pack}(?:\s*/\s*\d+(?:\.\d+)?\s*{unit_or_pack})?\s*\)?$"
            ))?,
            unit_word: Regex::new(&format!("(?i)^{unit}$"))?,
            ratio_paren: Regex::new(r"\(\s*[0-9.\s:>\-~→/]+\s*\)")?,
            pack_words: vocabulary
                .pack_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            dosage_forms: by_length_desc(&vocabulary.dosage_forms),
            form_prefixes: by_length_desc(&vocabulary.form_prefixes),
            foreign_form_words: vocabulary
                .foreign_form_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            vocabulary,
        })
    }

    /// Shared rules for the default vocabulary.
    pub fn standard(keep_percent: bool) -> &'static Self {
        if keep_percent {
            &STANDARD_KEEP_PERCENT
        } else {
            &STANDARD
        }
    }

    pub fn keep_percent(&self) -> bool {
        self.keep_percent
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_differ_on_percent() {
        assert!(!Rules::standard(false).keep_percent());
        assert!(Rules::standard(true).keep_percent());
    }

    #[test]
    fn test_longest_form_first() {
        let rules = Rules::standard(false);
        let pos_long = rules.dosage_forms.iter().position(|f| f == "서방정").unwrap();
        let pos_short = rules.dosage_forms.iter().position(|f| f == "정").unwrap();
        assert!(pos_long < pos_short);
    }

    #[test]
    fn test_bad_fragment_is_pattern_error() {
        let mut config = NormalizeConfig::default();
        config.vocabulary.iu_patterns.push("(unclosed".to_string());
        let err = Rules::new(&config).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidPattern(_)));
    }

    #[test]
    fn test_empty_vocabulary_matches_nothing() {
        let mut config = NormalizeConfig::default();
        config.vocabulary.units.clear();
        config.vocabulary.iu_patterns.clear();
        config.keep_percent = true;
        let rules = Rules::new(&config).unwrap();
        assert!(!rules.dose.is_match("500"));
        assert!(!rules.dose.is_match("500mg"));
    }
}
