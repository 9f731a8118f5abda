use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One row from an external tabular source, column name to raw value.
///
/// Column order is preserved so rows can be written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: IndexMap<String, String>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// `None` when the column is absent; a present blank column is `Some("")`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Column value, empty when absent.
    pub fn field(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Per-record extraction output carried alongside the untouched source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub source: RawRecord,
    pub display_name: String,
    /// `·`-joined ingredient tokens
    pub ingredients_joined: String,
    /// `·`-joined lower-case English generic name parts
    pub ingredients_en_joined: String,
    /// Unified ATC classification name, when the column is configured
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub atc_name: String,
    /// Aliases taken from `수출명` annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub export_aliases: Vec<String>,
    /// Ingredients were replaced by the group's representative label
    #[serde(default)]
    pub filled: bool,
}

impl ProcessedRecord {
    pub fn ingredient_tokens(&self) -> impl Iterator<Item = &str> {
        self.ingredients_joined
            .split(crate::text::LIST_SEPARATOR)
            .filter(|t| !t.is_empty())
    }
}

/// Canonical labels chosen for one entity code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLabel {
    pub entity_code: String,
    pub ko_label: String,
    pub en_label: String,
}

impl EntityLabel {
    /// Korean label, falling back to English; empty when neither exists.
    pub fn representative(&self) -> &str {
        if self.ko_label.is_empty() {
            &self.en_label
        } else {
            &self.ko_label
        }
    }

    pub fn is_missing(&self) -> bool {
        self.ko_label.is_empty() && self.en_label.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let record = RawRecord::new()
            .with_field("제품명", "타이레놀정500mg")
            .with_field("일반명", "");

        assert_eq!(record.get("제품명"), Some("타이레놀정500mg"));
        assert_eq!(record.get("일반명"), Some(""));
        assert_eq!(record.get("주성분코드"), None);
        assert_eq!(record.field("주성분코드"), "");
        assert!(record.has_field("일반명"));
    }

    #[test]
    fn test_column_order_preserved() {
        let record: RawRecord = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_serde_transparent() {
        let record = RawRecord::new().with_field("x", "1");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"x":"1"}"#);
        let back: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_representative_label() {
        let label = EntityLabel {
            entity_code: "101".into(),
            ko_label: String::new(),
            en_label: "aspirin".into(),
        };
        assert_eq!(label.representative(), "aspirin");
        assert!(!label.is_missing());
    }
}
