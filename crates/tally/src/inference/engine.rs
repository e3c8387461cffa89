//! Rule-based engine proposing replacements for defective foreign keys.
//!
//! Rules are an ordered list; the first rule yielding a candidate for a
//! row wins. Each rule is independent and side-effect free, so the
//! policy stays explicit and each rule is testable on its own.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::input::DataTable;

use super::suggestion::KeySuggestion;

/// Everything a rule may consult when evaluating one foreign-key column
/// of one table.
pub struct RuleContext<'a> {
    /// The table holding the foreign key.
    pub table: &'a DataTable,
    /// Index of the foreign-key column in `table`.
    pub fk_idx: usize,
    /// Declared name of the foreign-key column (for reporting).
    pub fk_name: &'a str,
    /// Primary-key values of the referenced table.
    pub valid_keys: &'a HashSet<String>,
    /// The referenced table itself.
    pub ref_table: &'a DataTable,
    /// Index of the primary-key column in `ref_table`.
    pub ref_pk_idx: usize,
    /// Secondary attribute column used for sibling evidence (e.g.
    /// `vendor_id`), when the table has one.
    pub sibling_idx: Option<usize>,
    /// Name of the sibling column (for evidence strings).
    pub sibling_name: Option<&'a str>,
}

impl<'a> RuleContext<'a> {
    /// Whether the foreign-key value of a row is missing or fails to
    /// match any primary key in the referenced table.
    pub fn is_defective(&self, row_idx: usize) -> bool {
        match self.table.get(row_idx, self.fk_idx) {
            Some(value) => {
                DataTable::is_missing_value(value) || !self.valid_keys.contains(value.trim())
            }
            None => true,
        }
    }

    /// The sibling value of a row, when present and non-missing.
    fn sibling_value(&self, row_idx: usize) -> Option<&str> {
        let idx = self.sibling_idx?;
        let value = self.table.get(row_idx, idx)?;
        if DataTable::is_missing_value(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Foreign-key votes among valid rows sharing a sibling value, in
    /// first-seen order: `fund -> count`.
    fn sibling_votes(&self, sibling: &str) -> IndexMap<String, usize> {
        let mut votes: IndexMap<String, usize> = IndexMap::new();
        for row_idx in 0..self.table.row_count() {
            if self.is_defective(row_idx) {
                continue;
            }
            if self.sibling_value(row_idx) != Some(sibling) {
                continue;
            }
            if let Some(value) = self.table.get(row_idx, self.fk_idx) {
                *votes.entry(value.trim().to_string()).or_insert(0) += 1;
            }
        }
        votes
    }

    /// Row index of a key in the referenced table, for tie-breaking.
    fn referenced_row_index(&self, key: &str) -> usize {
        self.ref_table
            .column_values(self.ref_pk_idx)
            .position(|v| v.trim() == key)
            .unwrap_or(usize::MAX)
    }
}

/// A candidate replacement value with its confidence and justification.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: String,
    pub confidence: f64,
    pub evidence: String,
}

/// A single inference heuristic.
pub trait InferenceRule {
    /// Short rule name used in logs.
    fn name(&self) -> &'static str;

    /// Propose a replacement for the given defective row, or `None`
    /// when this rule has no supporting evidence.
    fn propose(&self, ctx: &RuleContext, row_idx: usize) -> Option<Candidate>;
}

/// Rule 1: the row's sibling key maps to exactly one fund across the
/// table's valid rows.
pub struct DirectSiblingRule;

impl InferenceRule for DirectSiblingRule {
    fn name(&self) -> &'static str {
        "direct_sibling"
    }

    fn propose(&self, ctx: &RuleContext, row_idx: usize) -> Option<Candidate> {
        let sibling = ctx.sibling_value(row_idx)?;
        let votes = ctx.sibling_votes(sibling);
        if votes.len() != 1 {
            return None;
        }
        let (value, count) = votes.into_iter().next()?;
        let sibling_name = ctx.sibling_name.unwrap_or("sibling");
        Some(Candidate {
            evidence: format!(
                "direct sibling match: {} '{}' maps only to '{}' across {} valid row(s)",
                sibling_name, sibling, value, count
            ),
            value,
            confidence: 0.95,
        })
    }
}

/// Rule 2: most frequent fund among valid rows sharing the sibling
/// value, provided it holds a strict majority. Confidence is the vote
/// fraction, capped at 0.9.
pub struct MajorityVoteRule;

impl InferenceRule for MajorityVoteRule {
    fn name(&self) -> &'static str {
        "majority_vote"
    }

    fn propose(&self, ctx: &RuleContext, row_idx: usize) -> Option<Candidate> {
        let sibling = ctx.sibling_value(row_idx)?;
        let votes = ctx.sibling_votes(sibling);
        let total: usize = votes.values().sum();
        if total == 0 {
            return None;
        }

        // Winner: highest count, then lowest row index in the
        // referenced table.
        let (value, count) = votes
            .into_iter()
            .min_by(|(a_value, a_count), (b_value, b_count)| {
                b_count.cmp(a_count).then_with(|| {
                    ctx.referenced_row_index(a_value)
                        .cmp(&ctx.referenced_row_index(b_value))
                })
            })?;

        let fraction = count as f64 / total as f64;
        if fraction <= 0.5 {
            return None;
        }
        let sibling_name = ctx.sibling_name.unwrap_or("sibling");
        Some(Candidate {
            evidence: format!(
                "majority vote: {} of {} valid row(s) sharing {} '{}' use '{}'",
                count, total, sibling_name, sibling, value
            ),
            value,
            confidence: fraction.min(0.9),
        })
    }
}

/// Rule 3: the referenced table has exactly one row, so its key is the
/// only possible value.
pub struct SingleKeyFallbackRule;

impl InferenceRule for SingleKeyFallbackRule {
    fn name(&self) -> &'static str {
        "single_key_fallback"
    }

    fn propose(&self, ctx: &RuleContext, _row_idx: usize) -> Option<Candidate> {
        if ctx.ref_table.row_count() != 1 {
            return None;
        }
        let value = ctx.ref_table.get(0, ctx.ref_pk_idx)?.trim().to_string();
        if value.is_empty() {
            return None;
        }
        Some(Candidate {
            evidence: format!(
                "single key fallback: referenced table '{}' has exactly one row",
                ctx.ref_table.name
            ),
            value,
            confidence: 0.5,
        })
    }
}

/// Result of inference over one foreign-key column.
#[derive(Debug, Clone, Default)]
pub struct InferenceOutcome {
    /// One suggestion per repairable defective row, in row order.
    pub suggestions: Vec<KeySuggestion>,
    /// Row indices where no rule produced a candidate.
    pub unresolved: Vec<usize>,
}

/// Evaluates the rule list over every defective row of a context.
pub struct KeyInferenceEngine {
    rules: Vec<Box<dyn InferenceRule>>,
}

impl KeyInferenceEngine {
    /// Engine with the standard rule order.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DirectSiblingRule),
                Box::new(MajorityVoteRule),
                Box::new(SingleKeyFallbackRule),
            ],
        }
    }

    /// Engine with a custom rule list, in evaluation order.
    pub fn with_rules(rules: Vec<Box<dyn InferenceRule>>) -> Self {
        Self { rules }
    }

    /// Evaluate all rules over every defective row; first rule with a
    /// candidate wins for each row.
    pub fn infer(&self, ctx: &RuleContext) -> InferenceOutcome {
        let mut outcome = InferenceOutcome::default();

        for row_idx in 0..ctx.table.row_count() {
            if !ctx.is_defective(row_idx) {
                continue;
            }
            let current = ctx.table.get(row_idx, ctx.fk_idx).unwrap_or("").to_string();

            let candidate = self
                .rules
                .iter()
                .find_map(|rule| rule.propose(ctx, row_idx).map(|c| (rule.name(), c)));

            match candidate {
                Some((rule_name, c)) => {
                    tracing::debug!(
                        table = %ctx.table.name,
                        row = row_idx,
                        rule = rule_name,
                        proposed = %c.value,
                        confidence = c.confidence,
                        "proposed foreign-key repair"
                    );
                    outcome.suggestions.push(
                        KeySuggestion::new(
                            ctx.table.name.clone(),
                            row_idx,
                            ctx.fk_name,
                            current,
                            c.value,
                        )
                        .with_confidence(c.confidence)
                        .with_evidence(c.evidence),
                    );
                }
                None => {
                    tracing::debug!(
                        table = %ctx.table.name,
                        row = row_idx,
                        "no rule produced a candidate"
                    );
                    outcome.unresolved.push(row_idx);
                }
            }
        }

        outcome
    }
}

impl Default for KeyInferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]], name: &str) -> DataTable {
        DataTable::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn funds(rows: &[&[&str]]) -> DataTable {
        table(&["fund_id", "name"], rows, "funds")
    }

    struct Fixture {
        invoices: DataTable,
        funds: DataTable,
        valid_keys: HashSet<String>,
    }

    impl Fixture {
        fn new(invoice_rows: &[&[&str]], fund_rows: &[&[&str]]) -> Self {
            let funds = funds(fund_rows);
            let valid_keys = funds
                .column_values(0)
                .map(|v| v.trim().to_string())
                .collect();
            Self {
                invoices: table(&["invoice_id", "vendor_id", "fund_id"], invoice_rows, "invoices"),
                funds,
                valid_keys,
            }
        }

        fn ctx(&self) -> RuleContext<'_> {
            RuleContext {
                table: &self.invoices,
                fk_idx: 2,
                fk_name: "fund_id",
                valid_keys: &self.valid_keys,
                ref_table: &self.funds,
                ref_pk_idx: 0,
                sibling_idx: Some(1),
                sibling_name: Some("vendor_id"),
            }
        }
    }

    #[test]
    fn test_fully_populated_table_yields_nothing() {
        let fx = Fixture::new(
            &[&["I1", "V1", "F1"], &["I2", "V2", "F2"]],
            &[&["F1", "A"], &["F2", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert!(outcome.suggestions.is_empty());
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_direct_sibling_match() {
        // Five valid rows share V7, all carrying F3
        let fx = Fixture::new(
            &[
                &["I1", "V7", "F3"],
                &["I2", "V7", "F3"],
                &["I3", "V7", "F3"],
                &["I4", "V7", "F3"],
                &["I5", "V7", "F3"],
                &["I6", "V7", ""],
            ],
            &[&["F3", "A"], &["F4", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert_eq!(outcome.suggestions.len(), 1);
        let s = &outcome.suggestions[0];
        assert_eq!(s.row_index, 5);
        assert_eq!(s.proposed_value, "F3");
        assert_eq!(s.confidence, 0.95);
        assert!(s.evidence.contains("direct sibling"));
        assert!(s.evidence.contains('5'));
    }

    #[test]
    fn test_direct_sibling_never_fires_on_ambiguous_mapping() {
        // V7 maps to two distinct funds, so rule 1 must not fire;
        // rule 2 takes over with the 2/3 majority.
        let fx = Fixture::new(
            &[
                &["I1", "V7", "F3"],
                &["I2", "V7", "F3"],
                &["I3", "V7", "F4"],
                &["I4", "V7", ""],
            ],
            &[&["F3", "A"], &["F4", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert_eq!(outcome.suggestions.len(), 1);
        let s = &outcome.suggestions[0];
        assert_eq!(s.proposed_value, "F3");
        assert!(s.evidence.contains("majority vote"));
        assert!((s.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_majority_vote_confidence_capped() {
        // 19 of 20 votes would give 0.95; the cap keeps rule 2 below
        // rule 1's confidence.
        let mut rows: Vec<Vec<String>> = Vec::new();
        for i in 0..19 {
            rows.push(vec![format!("I{i}"), "V1".into(), "F1".into()]);
        }
        rows.push(vec!["I19".into(), "V1".into(), "F2".into()]);
        rows.push(vec!["I20".into(), "V1".into(), "".into()]);
        let row_refs: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(|s| s.as_str()).collect())
            .collect();
        let row_slices: Vec<&[&str]> = row_refs.iter().map(|r| r.as_slice()).collect();

        let fx = Fixture::new(&row_slices, &[&["F1", "A"], &["F2", "B"]]);
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert_eq!(outcome.suggestions.len(), 1);
        assert_eq!(outcome.suggestions[0].confidence, 0.9);
    }

    #[test]
    fn test_majority_vote_requires_strict_majority() {
        // 1-1 split: no majority, and only one fund row is not the
        // case either, so the row stays unresolved.
        let fx = Fixture::new(
            &[
                &["I1", "V7", "F3"],
                &["I2", "V7", "F4"],
                &["I3", "V7", ""],
            ],
            &[&["F3", "A"], &["F4", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert!(outcome.suggestions.is_empty());
        assert_eq!(outcome.unresolved, vec![2]);
    }

    #[test]
    fn test_single_key_fallback() {
        // No sibling evidence at all, but only one fund exists
        let fx = Fixture::new(&[&["I1", "V1", ""]], &[&["F1", "General"]]);
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert_eq!(outcome.suggestions.len(), 1);
        let s = &outcome.suggestions[0];
        assert_eq!(s.proposed_value, "F1");
        assert_eq!(s.confidence, 0.5);
        assert!(s.evidence.contains("single key fallback"));
    }

    #[test]
    fn test_invalid_reference_counts_as_defective() {
        // F9 is not a declared fund; the sibling evidence repairs it
        let fx = Fixture::new(
            &[&["I1", "V1", "F1"], &["I2", "V1", "F9"]],
            &[&["F1", "A"], &["F2", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert_eq!(outcome.suggestions.len(), 1);
        let s = &outcome.suggestions[0];
        assert_eq!(s.row_index, 1);
        assert_eq!(s.current_value, "F9");
        assert_eq!(s.proposed_value, "F1");
    }

    #[test]
    fn test_no_candidate_is_surfaced_not_dropped() {
        let fx = Fixture::new(
            &[&["I1", "", ""]],
            &[&["F1", "A"], &["F2", "B"]],
        );
        let outcome = KeyInferenceEngine::new().infer(&fx.ctx());
        assert!(outcome.suggestions.is_empty());
        assert_eq!(outcome.unresolved, vec![0]);
    }
}
