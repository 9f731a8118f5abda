//! In-memory batch run: per-record extraction, grouping by entity code,
//! label voting, fill-forward, synonym building and a quality report.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::aggregate::{fill_forward, is_invalid, most_frequent, GroupMember};
use crate::config::NormalizeConfig;
use crate::extract::{english_name, join_tokens};
use crate::record::{EntityLabel, ProcessedRecord, RawRecord};
use crate::synonym::{dictionary_line, SynonymRule};
use crate::text::{unify, Rules, LIST_SEPARATOR};
use crate::{Error, Result};

/// Row counts and residue checks for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub expected_rows: Option<usize>,
    pub groups: usize,
    pub filled_rows: usize,
    /// Ingredient values still blank, placeholder or ratio-only after fill
    pub invalid_after_fill: usize,
    pub display_dose_residue: usize,
    pub display_orphan_residue: usize,
    pub ingredient_dose_residue: usize,
    pub ingredient_orphan_residue: usize,
    /// Entity codes whose group produced no label at all
    pub missing_labels: Vec<String>,
}

impl QualityReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// False only when an expected count was given and differs.
    pub fn row_count_matches(&self) -> bool {
        self.expected_rows.map_or(true, |n| n == self.output_rows)
    }

    fn measure(&mut self, rules: &Rules, records: &[ProcessedRecord]) {
        self.output_rows = records.len();
        for record in records {
            if is_invalid(&record.ingredients_joined) {
                self.invalid_after_fill += 1;
            }
            if rules.contains_dose(&record.display_name) {
                self.display_dose_residue += 1;
            }
            if rules.contains_orphan_unit(&record.display_name) {
                self.display_orphan_residue += 1;
            }
            if rules.contains_dose(&record.ingredients_joined) {
                self.ingredient_dose_residue += 1;
            }
            if rules.contains_orphan_unit(&record.ingredients_joined) {
                self.ingredient_orphan_residue += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub records: Vec<ProcessedRecord>,
    /// One per non-blank entity code, in first-seen order
    pub labels: Vec<EntityLabel>,
    pub synonym_rules: Vec<SynonymRule>,
    /// Proper-noun dictionary terms
    pub dictionary: BTreeSet<String>,
    pub report: QualityReport,
}

impl PipelineOutput {
    pub fn synonym_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.synonym_rules.iter().map(ToString::to_string)
    }

    pub fn dictionary_lines<'a>(
        &'a self,
        pos_tag: Option<&'a str>,
    ) -> impl Iterator<Item = String> + 'a {
        self.dictionary.iter().map(move |t| dictionary_line(t, pos_tag))
    }

    pub fn label_for(&self, entity_code: &str) -> Option<&EntityLabel> {
        self.labels.iter().find(|l| l.entity_code == entity_code)
    }
}

pub struct Pipeline {
    config: NormalizeConfig,
    rules: Rules,
}

impl Pipeline {
    pub fn new(config: NormalizeConfig) -> Result<Self> {
        let rules = Rules::new(&config)?;
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Extraction for a single row; no group information is involved.
    pub fn process_record(&self, source: RawRecord) -> ProcessedRecord {
        let fields = &self.config.fields;
        let product_name = source.field(&fields.product_name);
        let atc_name = fields
            .atc_name
            .as_deref()
            .map(|f| unify(source.field(f)))
            .unwrap_or_default();

        ProcessedRecord {
            display_name: self.rules.display_name(product_name),
            ingredients_joined: self.rules.ingredients_joined(product_name),
            ingredients_en_joined: english_name(source.field(&fields.generic_name)),
            atc_name,
            export_aliases: self.rules.export_aliases(product_name),
            filled: false,
            source,
        }
    }

    /// Runs the whole batch in input order.
    ///
    /// Fails only when no record carries the entity-code column. Rows with a
    /// blank code are extracted but take no part in grouping.
    pub fn run(&self, records: Vec<RawRecord>) -> Result<PipelineOutput> {
        let code_field = self.config.fields.entity_code.as_str();
        if !records.is_empty() && !records.iter().any(|r| r.has_field(code_field)) {
            return Err(Error::MissingGroupKey {
                field: code_field.to_string(),
            });
        }

        let mut report = QualityReport::new();
        report.input_rows = records.len();
        report.expected_rows = self.config.expect_rows;

        let mut processed: Vec<ProcessedRecord> = records
            .into_iter()
            .map(|r| self.process_record(r))
            .collect();
        tracing::debug!("Extracted {} records", processed.len());

        let groups = group_by_code(&processed, code_field);
        report.groups = groups.len();
        tracing::debug!("Built {} entity groups", groups.len());

        let labels = self.label_groups(&processed, &groups);
        for label in labels.iter().filter(|l| l.is_missing()) {
            tracing::warn!("No valid canonical label for entity code {}", label.entity_code);
            report.missing_labels.push(label.entity_code.clone());
        }

        for (members, label) in groups.values().zip(&labels) {
            for &idx in members {
                let record = &mut processed[idx];
                if fill_forward(&mut record.ingredients_joined, &label.ko_label) {
                    record.filled = true;
                    report.filled_rows += 1;
                }
            }
        }
        tracing::debug!("Filled {} rows from group labels", report.filled_rows);

        let synonym_rules = self.build_synonym_rules(&processed, &groups, &labels);
        let dictionary = self.build_dictionary(&processed, &labels);
        tracing::debug!(
            "Built {} synonym rules and {} dictionary terms",
            synonym_rules.len(),
            dictionary.len()
        );

        if let Some(key) = self.config.merge_by.as_deref() {
            processed = merge_rows_by(processed, key);
            tracing::debug!("Merged rows by {}: {} remain", key, processed.len());
        }

        report.measure(&self.rules, &processed);
        if !report.row_count_matches() {
            tracing::warn!(
                "Output row count {} differs from expected {}",
                report.output_rows,
                report.expected_rows.unwrap_or_default()
            );
        }

        Ok(PipelineOutput {
            records: processed,
            labels,
            synonym_rules,
            dictionary,
            report,
        })
    }

    /// English labels fall back to the most frequent English ATC name.
    fn label_groups(
        &self,
        processed: &[ProcessedRecord],
        groups: &IndexMap<String, Vec<usize>>,
    ) -> Vec<EntityLabel> {
        let generic_field = self.config.fields.generic_name.as_str();

        groups
            .iter()
            .map(|(code, indices)| {
                let members: Vec<GroupMember<'_>> = indices
                    .iter()
                    .map(|&idx| {
                        let record = &processed[idx];
                        GroupMember::new(
                            record.source.field(generic_field),
                            &record.ingredients_joined,
                        )
                    })
                    .collect();
                let canonical = self.rules.representative_labels(&members);
                let en_label = if canonical.en_label.is_empty() {
                    most_frequent(
                        indices
                            .iter()
                            .map(|&idx| english_name(&processed[idx].atc_name))
                            .filter(|v| !v.is_empty()),
                    )
                    .map(|(name, _)| name)
                    .unwrap_or_default()
                } else {
                    canonical.en_label
                };

                EntityLabel {
                    entity_code: code.clone(),
                    ko_label: canonical.ko_label,
                    en_label,
                }
            })
            .collect()
    }

    fn build_synonym_rules(
        &self,
        processed: &[ProcessedRecord],
        groups: &IndexMap<String, Vec<usize>>,
        labels: &[EntityLabel],
    ) -> Vec<SynonymRule> {
        let limits = &self.config.synonyms;

        groups
            .values()
            .zip(labels)
            .filter(|(_, label)| !label.is_missing())
            .filter_map(|(members, label)| {
                let surfaces = self.rules.group_synonyms(
                    label,
                    members.iter().map(|&idx| &processed[idx]),
                    limits.max_per_group,
                );
                SynonymRule::new(label.representative(), surfaces, limits.max_per_line)
            })
            .collect()
    }

    fn build_dictionary(
        &self,
        processed: &[ProcessedRecord],
        labels: &[EntityLabel],
    ) -> BTreeSet<String> {
        let company_field = self.config.fields.company.as_deref();
        let mut terms = BTreeSet::new();

        for record in processed {
            terms.insert(record.display_name.clone());
            terms.extend(record.ingredient_tokens().map(str::to_string));
            terms.extend(record.export_aliases.iter().cloned());
            terms.insert(record.atc_name.clone());
            if let Some(field) = company_field {
                terms.insert(unify(record.source.field(field)));
            }
        }
        for label in labels {
            terms.insert(label.ko_label.clone());
        }

        terms.remove("");
        terms
    }
}

/// Row indices per non-blank entity code, in first-seen order.
fn group_by_code(records: &[ProcessedRecord], code_field: &str) -> IndexMap<String, Vec<usize>> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, record) in records.iter().enumerate() {
        let code = record.source.field(code_field).trim();
        if code.is_empty() {
            continue;
        }
        groups.entry(code.to_string()).or_default().push(idx);
    }
    groups
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum MergeSlot {
    Key(String),
    Alone(usize),
}

fn merge_token_lists<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let tokens: IndexSet<&str> = values
        .into_iter()
        .flat_map(|v| v.split([LIST_SEPARATOR, ',']))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    join_tokens(tokens)
}

/// Collapses records sharing a value in column `key` into one row.
///
/// The first row of each set supplies the source columns. The display name is
/// the first non-empty one; ingredient lists are merged token-wise without
/// repeats. Rows with a blank key are passed through unmerged.
pub fn merge_rows_by(records: Vec<ProcessedRecord>, key: &str) -> Vec<ProcessedRecord> {
    let mut sets: IndexMap<MergeSlot, Vec<ProcessedRecord>> = IndexMap::new();

    for (idx, record) in records.into_iter().enumerate() {
        let value = record.source.field(key).trim();
        let slot = if value.is_empty() {
            MergeSlot::Alone(idx)
        } else {
            MergeSlot::Key(value.to_string())
        };
        sets.entry(slot).or_default().push(record);
    }

    sets.into_values().filter_map(merge_set).collect()
}

fn merge_set(set: Vec<ProcessedRecord>) -> Option<ProcessedRecord> {
    let display_name = set
        .iter()
        .map(|r| r.display_name.as_str())
        .find(|n| !n.trim().is_empty())
        .unwrap_or_default()
        .to_string();
    let ingredients_joined = merge_token_lists(set.iter().map(|r| r.ingredients_joined.as_str()));
    let ingredients_en_joined =
        merge_token_lists(set.iter().map(|r| r.ingredients_en_joined.as_str()));
    let atc_name = set
        .iter()
        .map(|r| r.atc_name.as_str())
        .find(|n| !n.is_empty())
        .unwrap_or_default()
        .to_string();
    let export_aliases: Vec<String> = set
        .iter()
        .flat_map(|r| r.export_aliases.iter().cloned())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();
    let filled = set.iter().any(|r| r.filled);

    let first = set.into_iter().next()?;
    Some(ProcessedRecord {
        source: first.source,
        display_name,
        ingredients_joined,
        ingredients_en_joined,
        atc_name,
        export_aliases,
        filled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product: &str, generic: &str, code: &str) -> RawRecord {
        RawRecord::new()
            .with_field("제품명", product)
            .with_field("일반명", generic)
            .with_field("주성분코드", code)
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(NormalizeConfig::default()).unwrap()
    }

    #[test]
    fn test_process_record() {
        let record = pipeline().process_record(row(
            "타이레놀정500mg(아세트아미노펜)",
            "acetaminophen",
            "101",
        ));

        assert_eq!(record.display_name, "타이레놀정");
        assert_eq!(record.ingredients_joined, "아세트아미노펜");
        assert_eq!(record.ingredients_en_joined, "acetaminophen");
        assert!(!record.filled);
        assert_eq!(record.source.field("주성분코드"), "101");
    }

    #[test]
    fn test_run_fills_invalid_rows() {
        let output = pipeline()
            .run(vec![
                row("아스피린정100mg", "아스피린", "A1"),
                row("아스피린프로텍트정(4:1)", "아스피린", "A1"),
                row("바이엘아스피린(아스피린)", "아스피린정", "A1"),
            ])
            .unwrap();

        assert_eq!(output.labels.len(), 1);
        assert_eq!(output.labels[0].ko_label, "아스피린");
        assert_eq!(output.report.filled_rows, 2);
        assert!(output.records.iter().all(|r| r.ingredients_joined == "아스피린"));
        assert!(output.records[0].filled);
        assert!(!output.records[2].filled);
        assert_eq!(output.report.invalid_after_fill, 0);
    }

    #[test]
    fn test_run_reports_missing_label() {
        let output = pipeline()
            .run(vec![row("500mg", "", "X9"), row("가나정", "아스피린", "A1")])
            .unwrap();

        assert_eq!(output.report.missing_labels, vec!["X9".to_string()]);
        assert!(output.label_for("X9").unwrap().is_missing());
        assert_eq!(output.report.invalid_after_fill, 1);
    }

    #[test]
    fn test_placeholder_group_stays_unlabeled() {
        let output = pipeline()
            .run(vec![row("가나정", "미분화", "M1"), row("다라정", "미분화", "M1")])
            .unwrap();

        assert!(output.label_for("M1").unwrap().is_missing());
        assert_eq!(output.report.missing_labels, vec!["M1".to_string()]);
        assert_eq!(output.report.filled_rows, 0);
        assert_eq!(output.report.invalid_after_fill, 2);
        assert!(output.records.iter().all(|r| !r.filled));
        assert!(output.synonym_rules.is_empty());
        assert!(!output.dictionary.contains("미분화"));
    }

    #[test]
    fn test_missing_code_column_fails() {
        let records = vec![RawRecord::new().with_field("제품명", "아스피린정")];
        let err = pipeline().run(records).unwrap_err();
        assert!(matches!(err, Error::MissingGroupKey { ref field } if field == "주성분코드"));
    }

    #[test]
    fn test_empty_batch() {
        let output = pipeline().run(Vec::new()).unwrap();
        assert!(output.records.is_empty());
        assert!(output.labels.is_empty());
        assert_eq!(output.report, QualityReport::new());
    }

    #[test]
    fn test_blank_codes_not_grouped() {
        let output = pipeline()
            .run(vec![row("가나정(아스피린)", "아스피린", " "), row("다라정", "", "B2")])
            .unwrap();

        assert_eq!(output.report.groups, 1);
        assert_eq!(output.labels[0].entity_code, "B2");
        assert_eq!(output.records.len(), 2);
    }

    #[test]
    fn test_synonym_rules_and_dictionary() {
        let output = pipeline()
            .run(vec![
                row("오스부톤정(수출명:OSBUTONE TABLET)", "플로프로피온", "F1")
                    .with_field("업체명", "가나제약"),
                row("플로핀정40mg(플로프로피온)", "플로프로피온", "F1"),
            ])
            .unwrap();

        let lines: Vec<String> = output.synonym_lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" => 플로프로피온"));
        assert!(lines[0].contains("OSBUTONE"));
        assert!(lines[0].contains("오스부톤정"));

        assert!(output.dictionary.contains("가나제약"));
        assert!(output.dictionary.contains("플로핀정"));
        let tagged: Vec<String> = output.dictionary_lines(Some("NNP")).collect();
        assert!(tagged.contains(&"가나제약\tNNP".to_string()));
    }

    #[test]
    fn test_atc_name_feeds_synonyms_dictionary_and_english_label() {
        let output = pipeline()
            .run(vec![
                row("오스부톤정(플로프로피온)", "플로프로피온", "F1")
                    .with_field("ATC코드 명칭", "flopropione"),
                row("플로핀정40mg", "플로프로피온", "F1").with_field("ATC코드 명칭", ""),
            ])
            .unwrap();

        assert_eq!(output.records[0].atc_name, "flopropione");
        let label = output.label_for("F1").unwrap();
        assert_eq!(label.ko_label, "플로프로피온");
        assert_eq!(label.en_label, "flopropione");

        let lines: Vec<String> = output.synonym_lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].split(" => ").next().unwrap().split(", ").any(|s| s == "flopropione"));
        assert!(output.dictionary.contains("flopropione"));
    }

    #[test]
    fn test_atc_column_can_be_disabled() {
        let mut config = NormalizeConfig::default();
        config.fields.atc_name = None;
        let output = Pipeline::new(config)
            .unwrap()
            .run(vec![row("가나정", "아스피린", "A1").with_field("ATC코드 명칭", "aspirin")])
            .unwrap();

        assert_eq!(output.records[0].atc_name, "");
        assert_eq!(output.labels[0].en_label, "");
        assert!(!output.dictionary.contains("aspirin"));
    }

    #[test]
    fn test_expect_rows_mismatch_is_reported() {
        let mut config = NormalizeConfig::default();
        config.expect_rows = Some(5);
        let output = Pipeline::new(config)
            .unwrap()
            .run(vec![row("가나정", "아스피린", "A1")])
            .unwrap();

        assert_eq!(output.report.output_rows, 1);
        assert!(!output.report.row_count_matches());
    }

    #[test]
    fn test_merge_by_product_code() {
        let mut config = NormalizeConfig::default();
        config.merge_by = Some("제품코드".to_string());
        let output = Pipeline::new(config)
            .unwrap()
            .run(vec![
                row("복합정(아목시실린)", "", "C1").with_field("제품코드", "640001"),
                row("복합정(클라불란산, 아목시실린)", "", "C1").with_field("제품코드", "640001"),
                row("단일정(세티리진)", "", "C2").with_field("제품코드", ""),
                row("단일정(세티리진)", "", "C2").with_field("제품코드", ""),
            ])
            .unwrap();

        assert_eq!(output.report.input_rows, 4);
        assert_eq!(output.report.output_rows, 3);
        assert_eq!(output.records[0].ingredients_joined, "아목시실린·클라불란산");
        assert_eq!(output.records[0].display_name, "복합정");
    }

    #[test]
    fn test_merge_display_first_non_empty() {
        let p = pipeline();
        let first = p.process_record(row("", "", "A").with_field("k", "1"));
        let second = p.process_record(row("둘째정", "", "A").with_field("k", "1"));

        let merged = merge_rows_by(vec![first, second], "k");
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].display_name, "둘째정");
    }

    #[test]
    fn test_bad_vocabulary_fails_construction() {
        let mut config = NormalizeConfig::default();
        config.vocabulary.iu_patterns = vec!["[".to_string()];
        assert!(matches!(Pipeline::new(config), Err(Error::InvalidPattern(_))));
    }
}
