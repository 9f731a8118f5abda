use serde::{Deserialize, Serialize};

use crate::Result;

/// Word lists driving every stripping and classification rule.
///
/// The lists are data rather than code: sources disagree on which units and
/// forms to recognize, so callers can extend or shrink them per dataset.
/// Entries are literal words unless noted otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Mass and volume units matched after a number, compared case-insensitively.
    /// No word boundary is required after the unit, so `Omega 3 Lipids` loses
    /// `3 L` to the single-letter litre.
    pub units: Vec<String>,
    /// International-unit spellings as regex fragments (`I\.?U\.?`, `KIU`, ...).
    pub iu_patterns: Vec<String>,
    /// Packaging words removed when they stand alone between separators.
    pub pack_words: Vec<String>,
    /// Packaging words recognized after a count in trailing dose clusters.
    pub trailing_pack_words: Vec<String>,
    /// Dosage-form words; a token containing one is treated as form noise.
    pub dosage_forms: Vec<String>,
    /// Route/form qualifiers stripped from the front of a form-tagged token.
    pub form_prefixes: Vec<String>,
    /// Latin-script form words dropped from export-name aliases.
    pub foreign_form_words: Vec<String>,
    /// Interchangeable spellings, each pair expanded in both directions.
    pub spelling_pairs: Vec<(String, String)>,
    /// Salt suffixes as (long, abbreviated) pairs, toggled on English labels.
    pub salt_suffixes: Vec<(String, String)>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            units: words(&[
                "mg", "g", "mcg", "μg", "µg", "㎍", "㎎", "L", "ℓ", "mL", "ml", "밀리그램",
                "밀리그람", "그램", "그람", "마이크로그램", "리터", "밀리리터",
            ]),
            iu_patterns: words(&[
                r"IU",
                r"I\.?U\.?",
                r"I\s?U",
                r"KIU",
                r"K\.?I\.?U\.?",
                r"K\s?I\s?U",
                r"kIU",
                r"k\.?I\.?U\.?",
                r"k\s?I\s?U",
                r"U",
            ]),
            pack_words: words(&[
                "정", "캡슐", "캅셀", "병", "회", "스틱", "패치", "패취", "vial", "앰플", "포", "mL",
                "ml", "회분", "펌프", "스프레이", "프리필드", "백", "bag",
            ]),
            trailing_pack_words: words(&[
                "정", "캡슐", "캅셀", "병", "회", "스틱", "패치", "패취", "vial", "앰플", "포", "mL",
                "ml", "회분", "펌프", "스프레이", "백", "bag",
            ]),
            dosage_forms: words(&[
                "정", "서방정", "발포정", "츄어블정", "캡슐", "캅셀", "연질캡슐", "경질캡슐",
                "현탁", "현탁용분말", "시럽", "시럽용", "시럽제", "점안", "점안액", "주", "주사",
                "주사용", "크림", "겔", "겔제", "액", "액제", "스프레이", "패치", "패취", "좌제",
                "분무", "흡입", "흡입용분말", "분말", "용액", "현탁액", "농축액",
                "시럽용현탁용분말", "프리필드",
            ]),
            form_prefixes: words(&[
                "시럽용", "주사용", "점안", "흡입용", "경구용", "좌제용", "현탁용", "외용", "주사",
            ]),
            foreign_form_words: words(&[
                "tablet", "tablets", "tab", "tabs", "capsule", "capsules", "cap", "caps",
                "injection", "inj", "syrup", "cream", "ointment", "gel", "solution", "suspension",
                "powder", "patch", "spray", "drops", "granule", "granules", "suppository",
            ]),
            spelling_pairs: vec![("캅셀".to_string(), "캡슐".to_string())],
            salt_suffixes: vec![
                ("hydrochloride".to_string(), "hcl".to_string()),
                ("hydrobromide".to_string(), "hbr".to_string()),
            ],
        }
    }
}

/// Column names looked up on each raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub product_name: String,
    pub generic_name: String,
    pub entity_code: String,
    /// Optional company column, added to the proper-noun dictionary when present.
    pub company: Option<String>,
    /// Optional ATC name column. Its values become synonym surfaces and
    /// dictionary terms, and supply the English label when no generic name
    /// is in English.
    pub atc_name: Option<String>,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            product_name: "제품명".to_string(),
            generic_name: "일반명".to_string(),
            entity_code: "주성분코드".to_string(),
            company: Some("업체명".to_string()),
            atc_name: Some("ATC코드 명칭".to_string()),
        }
    }
}

/// Caps applied when synonym sets are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymLimits {
    /// Maximum surfaces on one synonym rule line
    pub max_per_line: usize,
    /// Maximum surfaces kept for one entity group before line truncation
    pub max_per_group: usize,
    /// Part-of-speech tag appended to proper-noun dictionary lines
    pub pos_tag: Option<String>,
}

impl Default for SynonymLimits {
    fn default() -> Self {
        Self {
            max_per_line: 50,
            max_per_group: 200,
            pos_tag: Some("NNP".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Keep `%` as content instead of treating it as a strippable unit
    pub keep_percent: bool,
    pub vocabulary: Vocabulary,
    pub fields: FieldNames,
    pub synonyms: SynonymLimits,
    /// Collapse processed rows sharing this column into one row
    pub merge_by: Option<String>,
    /// Row count the run is expected to produce; a mismatch is reported, not fatal
    pub expect_rows: Option<usize>,
}

impl NormalizeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_keep_percent(mut self, keep_percent: bool) -> Self {
        self.keep_percent = keep_percent;
        self
    }
}
