//! Display-name, ingredient and alias extraction from one product-name field.

use indexmap::IndexSet;

use crate::text::{
    has_hangul, has_latin, is_hangul, is_ratio_only, outer_segments, split_outside_parens,
    unify, Rules, LIST_SEPARATOR,
};

/// Segment prefix marking a foreign trade name rather than an ingredient.
pub const EXPORT_MARKER: &str = "수출명";

const SEGMENT_STRAYS: &[char] = &[' ', '_', ',', '-', '/'];

/// Joins ingredient tokens with the list separator; no tokens gives `""`.
pub fn join_tokens<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for token in tokens {
        let token = token.as_ref();
        if token.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(LIST_SEPARATOR);
        }
        out.push_str(token);
    }
    out
}

/// Splits words where Hangul runs directly into Latin letters, so
/// `오스부톤정OSBUTONE` yields two words.
fn script_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in s.split_whitespace() {
        let mut word = String::new();
        let mut prev: Option<char> = None;
        for ch in chunk.chars() {
            if let Some(p) = prev {
                let switched = (is_hangul(p) && ch.is_ascii_alphabetic())
                    || (p.is_ascii_alphabetic() && is_hangul(ch));
                if switched && !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
            word.push(ch);
            prev = Some(ch);
        }
        if !word.is_empty() {
            words.push(word);
        }
    }
    words
}

impl Rules {
    /// Product name up to the first parenthesis with dose noise removed.
    ///
    /// Trailing clusters are removed before anywhere-doses so a multi-token
    /// tail is consumed whole. When cleaning leaves nothing, the raw value is
    /// returned after bracket and whitespace unification rather than
    /// verbatim, so the result is empty only for blank input.
    pub fn display_name(&self, raw: &str) -> String {
        let normalized = unify(raw);
        if normalized.is_empty() {
            return String::new();
        }

        let base = normalized.split('(').next().unwrap_or_default();
        let cleaned = self.drop_trailing_dose(base);
        let cleaned = self.drop_dose_anywhere(&cleaned);
        let cleaned = self.drop_orphan_units(&cleaned);

        if cleaned.is_empty() {
            normalized
        } else {
            cleaned
        }
    }

    /// Ingredient tokens from the parenthesized parts of a product name,
    /// unique and in first-seen order.
    pub fn ingredients(&self, raw: &str) -> Vec<String> {
        let normalized = unify(raw);
        let mut found: IndexSet<String> = IndexSet::new();

        for segment in outer_segments(&normalized) {
            if segment.starts_with(EXPORT_MARKER) || is_ratio_only(&segment) {
                continue;
            }

            let cleaned = self.clean_segment(&segment);
            if cleaned.is_empty() || self.is_pure_dose(&cleaned) {
                continue;
            }

            for candidate in split_outside_parens(&cleaned) {
                if let Some(token) = self.clean_token(&candidate) {
                    found.insert(token);
                }
            }
        }

        found.into_iter().collect()
    }

    pub fn ingredients_joined(&self, raw: &str) -> String {
        join_tokens(self.ingredients(raw))
    }

    /// Trade names from `수출명` segments with dose and form words removed.
    pub fn export_aliases(&self, raw: &str) -> Vec<String> {
        let normalized = unify(raw);
        let mut aliases: IndexSet<String> = IndexSet::new();

        for segment in outer_segments(&normalized) {
            let Some(rest) = segment.strip_prefix(EXPORT_MARKER) else {
                continue;
            };
            let rest = rest.trim_start().trim_start_matches([':', '：']);
            for part in rest.split([',', ';', '/', LIST_SEPARATOR]) {
                if let Some(alias) = self.clean_alias(part) {
                    aliases.insert(alias);
                }
            }
        }

        aliases.into_iter().collect()
    }

    fn clean_segment(&self, segment: &str) -> String {
        let cleaned = self.drop_dose_anywhere(segment);
        let cleaned = self.drop_pack_tokens(cleaned.trim_matches(SEGMENT_STRAYS));
        self.drop_orphan_units(&cleaned)
    }

    fn clean_token(&self, candidate: &str) -> Option<String> {
        let token = candidate.trim();
        if token.is_empty() || self.is_pure_dose(token) {
            return None;
        }

        let token = if self.has_dosage_form(token) {
            self.strip_form_prefix(token)?
        } else {
            token.to_string()
        };

        let token = self.ratio_paren.replace_all(&token, "");
        let token = self.drop_orphan_units(token.trim());
        (!token.is_empty()).then_some(token)
    }

    fn clean_alias(&self, part: &str) -> Option<String> {
        let cleaned = self.drop_trailing_dose(part.trim());
        let cleaned = self.drop_dose_anywhere(&cleaned);
        let cleaned = self.drop_orphan_units(&cleaned);

        let words: Vec<String> = script_words(&cleaned)
            .into_iter()
            .filter(|w| !self.is_form_word(w))
            .collect();
        let alias = words.join(" ");
        let alias = alias.trim_end_matches('.').trim();

        (!alias.is_empty()).then(|| alias.to_string())
    }

    fn is_form_word(&self, word: &str) -> bool {
        let lower = word.trim_matches('.').to_lowercase();
        self.foreign_form_words.contains(&lower) || self.dosage_forms.iter().any(|f| f == word)
    }
}

/// Lower-cased English generic name, `·`-joined; empty unless the value has
/// Latin letters and no Hangul.
pub fn english_name(generic: &str) -> String {
    let normalized = unify(generic);
    if !has_latin(&normalized) || has_hangul(&normalized) {
        return String::new();
    }
    join_tokens(
        normalized
            .split([',', '/', LIST_SEPARATOR])
            .map(|p| p.trim().to_lowercase()),
    )
}

pub fn extract_display_name(raw: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).display_name(raw)
}

pub fn extract_ingredients(raw: &str, keep_percent: bool) -> Vec<String> {
    Rules::standard(keep_percent).ingredients(raw)
}

pub fn export_aliases(raw: &str) -> Vec<String> {
    Rules::standard(false).export_aliases(raw)
}
