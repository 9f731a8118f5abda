mod classify;
mod rules;
mod segment;
mod strip;
mod unify;

pub use classify::{is_ratio_only, TokenClass};
pub use rules::Rules;
pub use segment::{is_balanced, outer_segments, repair_parens, split_outside_parens};
pub use unify::{has_hangul, has_latin, is_hangul, unify, LIST_SEPARATOR};

pub fn drop_dose_anywhere(s: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).drop_dose_anywhere(s)
}

pub fn drop_trailing_dose(s: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).drop_trailing_dose(s)
}

pub fn drop_orphan_units(s: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).drop_orphan_units(s)
}

pub fn drop_pack_tokens(s: &str, keep_percent: bool) -> String {
    Rules::standard(keep_percent).drop_pack_tokens(s)
}

pub fn is_pure_dose(token: &str, keep_percent: bool) -> bool {
    Rules::standard(keep_percent).is_pure_dose(token)
}

pub fn has_dosage_form(token: &str) -> bool {
    Rules::standard(false).has_dosage_form(token)
}
