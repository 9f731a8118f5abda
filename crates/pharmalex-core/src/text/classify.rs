use serde::{Deserialize, Serialize};

use super::rules::Rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    /// Only a pharmaceutical form such as 정, 캡슐, 주사액
    DosageForm,
    /// Quantity and unit, optionally per package count
    PureDose,
    /// Digits and ratio punctuation, e.g. `4:1`, `1->8~10`
    RatioOnly,
    Ingredient,
}

impl TokenClass {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DosageForm => "dosage_form",
            Self::PureDose => "pure_dose",
            Self::RatioOnly => "ratio_only",
            Self::Ingredient => "ingredient",
        }
    }

    pub fn is_noise(&self) -> bool {
        !matches!(self, Self::Ingredient)
    }
}

impl std::fmt::Display for TokenClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_ratio_char(ch: char) -> bool {
    ch.is_ascii_digit() || ch.is_whitespace() || matches!(ch, '.' | ':' | '>' | '-' | '~' | '→' | '/')
}

/// Digits and ratio punctuation only, after one optional wrapping paren pair.
pub fn is_ratio_only(token: &str) -> bool {
    let mut t = token.trim();
    if t.len() >= 2 && t.starts_with('(') && t.ends_with(')') {
        t = t[1..t.len() - 1].trim();
    }
    !t.is_empty() && t.chars().all(is_ratio_char)
}

impl Rules {
    /// The whole token is `number unit-or-pack`, optionally `/ number unit-or-pack`,
    /// optionally wrapped in parentheses.
    pub fn is_pure_dose(&self, token: &str) -> bool {
        self.pure_dose.is_match(token.trim())
    }

    /// Some dosage-form word occurs in the token once spaces are removed.
    pub fn has_dosage_form(&self, token: &str) -> bool {
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        self.dosage_forms.iter().any(|f| compact.contains(f.as_str()))
    }

    /// Strips one route/form prefix (`주사용글루코스` becomes `글루코스`).
    ///
    /// Returns `None` when the token, or what is left after the prefix,
    /// still carries a dosage form; such a token is form noise.
    pub fn strip_form_prefix(&self, token: &str) -> Option<String> {
        let token = token.trim();
        let rest = self
            .form_prefixes
            .iter()
            .find(|p| token.starts_with(p.as_str()))
            .map_or(token, |p| token[p.len()..].trim_start());

        if rest.is_empty() || self.has_dosage_form(rest) {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Reduces a form-tagged generic name to the ingredient it qualifies.
    ///
    /// Tries the prefix strip first. If the remainder still carries a form,
    /// trailing form words are peeled off (`아스피린정` becomes `아스피린`).
    /// Returns `None` when nothing form-free is left. Product-name segments
    /// use [`Rules::strip_form_prefix`] instead, since a single-syllable form
    /// at the end of an ingredient (`사람혈액`) is part of the word there.
    pub fn strip_dosage_form(&self, token: &str) -> Option<String> {
        let token = token.trim();
        let mut rest = token;

        if let Some(prefix) = self
            .form_prefixes
            .iter()
            .find(|p| token.starts_with(p.as_str()))
        {
            rest = token[prefix.len()..].trim_start();
            if !rest.is_empty() && !self.has_dosage_form(rest) {
                return Some(rest.to_string());
            }
        }

        let mut current = rest.trim_end();
        while self.has_dosage_form(current) {
            let form = self
                .dosage_forms
                .iter()
                .find(|f| current.ends_with(f.as_str()))?;
            current = current[..current.len() - form.len()].trim_end();
        }

        if current.is_empty() {
            None
        } else {
            Some(current.to_string())
        }
    }

    pub fn classify(&self, token: &str) -> TokenClass {
        if is_ratio_only(token) {
            TokenClass::RatioOnly
        } else if self.is_pure_dose(token) {
            TokenClass::PureDose
        } else if self.has_dosage_form(token) && self.strip_form_prefix(token).is_none() {
            TokenClass::DosageForm
        } else {
            TokenClass::Ingredient
        }
    }

    /// The ingredient text a product-name token contributes, if any.
    pub fn resolve_ingredient(&self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() || is_ratio_only(token) || self.is_pure_dose(token) {
            return None;
        }
        if self.has_dosage_form(token) {
            return self.strip_form_prefix(token);
        }
        Some(token.to_string())
    }

    /// Generic-name counterpart of [`Rules::resolve_ingredient`] that peels
    /// trailing form words instead of discarding the token.
    pub fn resolve_generic_token(&self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() || is_ratio_only(token) || self.is_pure_dose(token) {
            return None;
        }
        if self.has_dosage_form(token) {
            return self.strip_dosage_form(token);
        }
        Some(token.to_string())
    }
}
