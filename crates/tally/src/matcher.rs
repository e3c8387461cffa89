//! Fuzzy matching of declared column names against actual CSV headers.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Synonym pairs in normalized form. Matching is bidirectional.
static DEFAULT_SYNONYMS: Lazy<Vec<(String, String)>> = Lazy::new(|| {
    [
        ("vendor", "vendorname"),
        ("fund", "fundid"),
        ("invoice", "invoiceid"),
        ("amount", "invoiceamount"),
        ("category", "allocationcategory"),
        ("date", "invoicedate"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
});

/// Which rule tier produced a match. Lower tiers are tried first and
/// always win over later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Case-insensitive equality.
    Exact,
    /// Equality after stripping non-alphanumeric characters.
    Normalized,
    /// Hit in the configured synonym table.
    Synonym,
    /// Levenshtein ratio above the configured threshold.
    EditDistance,
}

impl MatchTier {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Normalized => "normalized",
            MatchTier::Synonym => "synonym",
            MatchTier::EditDistance => "edit distance",
        }
    }
}

/// A resolved column match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMatch {
    /// The actual header that matched.
    pub name: String,
    /// Match confidence (0.0-1.0).
    pub confidence: f64,
    /// The rule tier that produced the match.
    pub tier: MatchTier,
}

/// Matcher configuration. The synonym table and edit-distance threshold
/// are deployment-specific; the defaults here fit the finance table set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Synonym pairs, compared in normalized form, both directions.
    pub synonyms: Vec<(String, String)>,
    /// Minimum normalized Levenshtein ratio for an edit-distance match.
    pub edit_ratio_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            synonyms: DEFAULT_SYNONYMS.clone(),
            edit_ratio_threshold: 0.8,
        }
    }
}

/// Matches an expected column name against a table's actual headers.
///
/// Deterministic: ties break by rule tier, then edit distance, then
/// lexicographic order of the actual header.
#[derive(Debug, Clone, Default)]
pub struct ColumnMatcher {
    config: MatcherConfig,
}

impl ColumnMatcher {
    /// Create a matcher with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matcher with custom configuration.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Find the best matching header for an expected column name, or
    /// `None` when no tier produces a match.
    pub fn best_match(&self, expected: &str, headers: &[String]) -> Option<ColumnMatch> {
        if let Some(name) = self.exact(expected, headers) {
            return Some(ColumnMatch {
                name,
                confidence: 1.0,
                tier: MatchTier::Exact,
            });
        }
        if let Some(name) = self.normalized(expected, headers) {
            return Some(ColumnMatch {
                name,
                confidence: 0.9,
                tier: MatchTier::Normalized,
            });
        }
        if let Some(name) = self.synonym(expected, headers) {
            return Some(ColumnMatch {
                name,
                confidence: 0.75,
                tier: MatchTier::Synonym,
            });
        }
        self.edit_distance(expected, headers)
    }

    fn exact(&self, expected: &str, headers: &[String]) -> Option<String> {
        let mut hits: Vec<&String> = headers
            .iter()
            .filter(|h| h.eq_ignore_ascii_case(expected))
            .collect();
        hits.sort();
        hits.first().map(|h| h.to_string())
    }

    fn normalized(&self, expected: &str, headers: &[String]) -> Option<String> {
        let wanted = normalize(expected);
        if wanted.is_empty() {
            return None;
        }
        let mut hits: Vec<&String> = headers
            .iter()
            .filter(|h| normalize(h) == wanted)
            .collect();
        hits.sort();
        hits.first().map(|h| h.to_string())
    }

    fn synonym(&self, expected: &str, headers: &[String]) -> Option<String> {
        let wanted = normalize(expected);
        let mut hits: Vec<&String> = headers
            .iter()
            .filter(|h| {
                let actual = normalize(h);
                self.config.synonyms.iter().any(|(a, b)| {
                    (*a == wanted && *b == actual) || (*b == wanted && *a == actual)
                })
            })
            .collect();
        hits.sort();
        hits.first().map(|h| h.to_string())
    }

    fn edit_distance(&self, expected: &str, headers: &[String]) -> Option<ColumnMatch> {
        let wanted = normalize(expected);
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<(usize, &String, f64)> = None;
        for header in headers {
            let actual = normalize(header);
            if actual.is_empty() {
                continue;
            }
            let distance = levenshtein(&wanted, &actual);
            let max_len = wanted.chars().count().max(actual.chars().count());
            let ratio = 1.0 - distance as f64 / max_len as f64;
            if ratio < self.config.edit_ratio_threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_distance, best_header, _)) => {
                    distance < best_distance
                        || (distance == best_distance && header < best_header)
                }
            };
            if better {
                best = Some((distance, header, ratio));
            }
        }

        best.map(|(_, header, ratio)| ColumnMatch {
            name: header.clone(),
            // Scaled so a fuzzy hit never outranks the synonym tier
            confidence: ratio * 0.75,
            tier: MatchTier::EditDistance,
        })
    }
}

/// Lowercase and strip everything but ASCII alphanumerics.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Classic two-row Levenshtein distance.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
