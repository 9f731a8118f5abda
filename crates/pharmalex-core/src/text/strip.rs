//! Removal of dose, unit and packaging noise.
//!
//! Noise shows up in four shapes: a dose embedded mid-string, a cluster of
//! doses and counts at the end, a unit left behind after its number was
//! removed, and a bare packaging word. Each has its own boundary rule.

use super::rules::Rules;
use super::unify::LIST_SEPARATOR;

const TRIM_SEPARATORS: &[char] = &[' ', ',', ';', '/', '-', LIST_SEPARATOR, 'ᆞ', 'ㆍ'];
const TRAILING_STRAYS: &[char] = &[' ', '_', ',', '-', '/'];
const DOSE_STRAYS: &[char] = &[' ', ',', '-', '/'];

fn is_word_boundary(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(ch, ',' | ';' | '/' | '(' | ')' | '-' | 'ᆞ' | 'ㆍ')
        || ch == LIST_SEPARATOR
}

/// Replaces every separator-bounded word for which `is_noise` holds with a space.
fn replace_bounded_words(text: &str, is_noise: impl Fn(&str) -> bool) -> String {
    fn push_word(out: &mut String, word: &mut String, is_noise: &impl Fn(&str) -> bool) {
        if word.is_empty() {
            return;
        }
        if is_noise(word) {
            out.push(' ');
        } else {
            out.push_str(word);
        }
        word.clear();
    }

    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    for ch in text.chars() {
        if is_word_boundary(ch) {
            push_word(&mut out, &mut word, &is_noise);
            out.push(ch);
        } else {
            word.push(ch);
        }
    }
    push_word(&mut out, &mut word, &is_noise);
    out
}

fn any_bounded_word(text: &str, pred: impl Fn(&str) -> bool) -> bool {
    text.split(is_word_boundary).any(|w| !w.is_empty() && pred(w))
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}

fn drop_empty_parens(s: &str) -> String {
    let mut out = s.to_string();
    while out.contains("()") || out.contains("( )") {
        out = collapse_spaces(&out.replace("( )", "").replace("()", ""));
    }
    out
}

/// Folds runs of spaces and commas: a run holding two or more commas becomes
/// `", "`, any other run keeps its single comma with spacing collapsed.
fn collapse_commas(s: &str) -> String {
    fn flush(out: &mut String, run: &mut String, commas: &mut usize) {
        if *commas >= 2 {
            out.push_str(", ");
        } else {
            out.push_str(&collapse_spaces(run));
        }
        run.clear();
        *commas = 0;
    }

    let mut out = String::with_capacity(s.len());
    let mut run = String::new();
    let mut commas = 0usize;
    for ch in s.chars() {
        if ch == ',' || ch.is_whitespace() {
            if ch == ',' {
                commas += 1;
            }
            run.push(ch);
        } else {
            flush(&mut out, &mut run, &mut commas);
            out.push(ch);
        }
    }
    flush(&mut out, &mut run, &mut commas);
    out
}

fn tidy(s: &str) -> String {
    drop_empty_parens(&collapse_spaces(s))
        .trim_matches(TRIM_SEPARATORS)
        .to_string()
}

impl Rules {
    /// Removes every `number unit` occurrence, e.g. `500mg`, `2.5 mL`, `10I.U.`.
    ///
    /// Empty parentheses are dropped and doubled commas folded after every
    /// pass, and passes repeat until no dose is left.
    pub fn drop_dose_anywhere(&self, s: &str) -> String {
        let mut out = collapse_commas(&drop_empty_parens(s));
        while self.dose.is_match(&out) {
            let removed = self.dose.replace_all(&out, "");
            out = collapse_commas(&drop_empty_parens(&removed));
        }
        out.trim_matches(DOSE_STRAYS).to_string()
    }

    /// Strips trailing dose and packaging clusters until none remain.
    ///
    /// Handles `300mg/1정`, `100mg 1병`, `1/2` and bare counts like `30정`,
    /// plus a trailing `…주` counter.
    pub fn drop_trailing_dose(&self, s: &str) -> String {
        let mut out = s.to_string();
        while let Some(found) = self.tail.find(&out) {
            out.truncate(found.start());
        }
        if let Some(found) = self.week_tail.find(&out) {
            out.truncate(found.start());
        }
        out.trim_end_matches(TRAILING_STRAYS)
            .trim_start()
            .to_string()
    }

    /// Removes unit words standing without a number between separators.
    ///
    /// Dropping a unit and the parentheses around it can bring a number next
    /// to a later unit. When the input held no dose, such a joined dose is
    /// removed too.
    pub fn drop_orphan_units(&self, s: &str) -> String {
        if s.trim().is_empty() {
            return String::new();
        }
        let strip = |text: &str| tidy(&replace_bounded_words(text, |w| self.unit_word.is_match(w)));

        let mut out = strip(s);
        if !self.dose.is_match(s) {
            while self.dose.is_match(&out) {
                out = strip(&self.drop_dose_anywhere(&out));
            }
        }
        out
    }

    /// Removes packaging and container words under the same boundary rule
    /// as orphan units.
    pub fn drop_pack_tokens(&self, s: &str) -> String {
        if s.trim().is_empty() {
            return String::new();
        }
        tidy(&replace_bounded_words(s, |w| {
            self.pack_words.contains(&w.to_lowercase())
        }))
    }

    /// A `number unit` occurrence is present.
    pub fn contains_dose(&self, s: &str) -> bool {
        self.dose.is_match(s)
    }

    /// A unit word stands alone between separators.
    pub fn contains_orphan_unit(&self, s: &str) -> bool {
        any_bounded_word(s, |w| self.unit_word.is_match(w))
    }
}
