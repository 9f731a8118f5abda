pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod record;
pub mod synonym;
pub mod text;

pub use aggregate::{
    fill_forward, is_invalid, most_frequent, normalize_general, representative_labels,
    CanonicalLabel, GroupMember, PLACEHOLDER,
};
pub use config::{FieldNames, NormalizeConfig, SynonymLimits, Vocabulary};
pub use error::{Error, Result};
pub use extract::{
    english_name, export_aliases, extract_display_name, extract_ingredients, join_tokens,
    EXPORT_MARKER,
};
pub use pipeline::{merge_rows_by, Pipeline, PipelineOutput, QualityReport};
pub use record::{EntityLabel, ProcessedRecord, RawRecord};
pub use synonym::{dictionary_line, surface_form, variants, SynonymRule};
pub use text::{
    drop_dose_anywhere, drop_orphan_units, drop_pack_tokens, drop_trailing_dose,
    has_dosage_form, is_balanced, is_pure_dose, is_ratio_only, outer_segments, repair_parens,
    split_outside_parens, unify, Rules, TokenClass, LIST_SEPARATOR,
};
