//! Field extraction: raw candidate sets to fully populated records.
//!
//! Each field is resolved by an ordered list of strategies. The first
//! strategy that yields a value wins; when none does the field's sentinel
//! is used. Normalization never fails.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::types::{Field, NormalizedRecord, Platform, RawCandidateSet};

static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-G](?:#|b|♯|♭)?\s*(?:maj|min|major|minor)?$").unwrap()
});
static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").unwrap());
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+h\s*\d*m?|\d+m").unwrap());
static TRACK_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+/\d+|all/\d+").unwrap());
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£]?\d+(?:[.,]\d{1,2})?").unwrap());
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").unwrap());

/// Lowest and highest BPM accepted as a real tempo.
pub const BPM_RANGE: std::ops::RangeInclusive<u32> = 60..=200;

const PLACEHOLDERS: &[&str] = &["n/a", "na", "-", "--", "–", "—", "?", "null", "none", "tbc"];

/// A single way of producing a field value from a candidate set.
pub type Strategy = Arc<dyn Fn(&RawCandidateSet) -> Option<String> + Send + Sync>;

/// Ordered strategies for every field.
#[derive(Clone)]
pub struct FieldRules {
    platform: Platform,
    strategies: Vec<(Field, Vec<Strategy>)>,
}

impl std::fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRules")
            .field("platform", &self.platform)
            .field(
                "strategies",
                &self
                    .strategies
                    .iter()
                    .map(|(field, s)| (field.key(), s.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FieldRules {
    /// Structured candidates first, then the free-text block.
    pub fn standard(platform: Platform) -> Self {
        let strategies = Field::ALL
            .iter()
            .map(|&field| {
                let structured: Strategy =
                    Arc::new(move |candidates| from_structured(candidates, field));
                let text: Strategy = Arc::new(move |candidates| from_text_block(candidates, field));
                (field, vec![structured, text])
            })
            .collect();
        Self {
            platform,
            strategies,
        }
    }

    /// Rule set tuned for a platform's listings.
    pub fn for_platform(platform: Platform) -> Self {
        Self::standard(platform)
    }

    /// Rule set for a chart page of `category`.
    ///
    /// Beatport rows do not carry their genre, so the chart's genre stands
    /// in for it.
    pub fn for_chart(platform: Platform, category_name: &str) -> Self {
        let rules = Self::for_platform(platform);
        match platform {
            Platform::Beatport if !category_name.trim().is_empty() => {
                rules.with_default(Field::Genre, category_name)
            }
            _ => rules,
        }
    }

    /// Append a strategy for `field`, evaluated after the existing ones.
    pub fn with_strategy(mut self, field: Field, strategy: Strategy) -> Self {
        if let Some((_, list)) = self.strategies.iter_mut().find(|(f, _)| *f == field) {
            list.push(strategy);
        } else {
            self.strategies.push((field, vec![strategy]));
        }
        self
    }

    /// Use `value` for `field` when nothing else matches.
    pub fn with_default(self, field: Field, value: &str) -> Self {
        let value = validate(field, value);
        self.with_strategy(field, Arc::new(move |_| value.clone()))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn strategies(&self, field: Field) -> &[Strategy] {
        self.strategies
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&[])
    }
}

/// Normalize one raw candidate set into a record.
pub fn normalize(candidates: &RawCandidateSet, rules: &FieldRules) -> NormalizedRecord {
    let mut record = NormalizedRecord::unavailable(rules.platform());
    for field in Field::ALL {
        if let Some(value) = rules
            .strategies(field)
            .iter()
            .find_map(|strategy| strategy(candidates))
        {
            *record.slot(field) = value;
        }
    }
    record
}

/// Collapse whitespace runs into a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_placeholder(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

/// Validate a single candidate for `field`.
///
/// Returns the canonical value, or `None` when the text does not satisfy
/// the field's rule.
pub fn validate(field: Field, raw: &str) -> Option<String> {
    let text = normalize_whitespace(raw);
    if text.is_empty() || is_placeholder(&text) {
        return None;
    }

    match field {
        Field::Bpm => {
            let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
            let bpm = digits.parse::<u32>().ok()?;
            BPM_RANGE.contains(&bpm).then(|| bpm.to_string())
        }
        Field::Key => KEY_RE.is_match(&text).then_some(text),
        Field::Length => LENGTH_RE.is_match(&text).then_some(text),
        Field::ReleaseDate => ISO_DATE_RE
            .find(&text)
            .or_else(|| YEAR_RE.find(&text))
            .map(|m| m.as_str().to_string()),
        Field::Duration => DURATION_RE.find(&text).map(|m| m.as_str().to_string()),
        Field::TrackCount => TRACK_COUNT_RE.find(&text).map(|m| m.as_str().to_string()),
        Field::Price => PRICE_RE.find(&text).map(|m| m.as_str().to_string()),
        Field::Url => {
            let absolute = text.starts_with("http://") || text.starts_with("https://");
            (absolute && !text.contains(' ')).then_some(text)
        }
        Field::Title
        | Field::Artist
        | Field::Remixer
        | Field::Label
        | Field::Genre
        | Field::Event => Some(text),
    }
}

fn from_structured(candidates: &RawCandidateSet, field: Field) -> Option<String> {
    candidates
        .structured(field)
        .iter()
        .find_map(|raw| validate(field, raw))
}

fn from_text_block(candidates: &RawCandidateSet, field: Field) -> Option<String> {
    let block = normalize_whitespace(candidates.text_block()?);
    if block.is_empty() {
        return None;
    }

    match field {
        Field::Title | Field::Artist => {
            let head = block.split('[').next().unwrap_or_default().trim();
            match (head.split_once(" - "), field) {
                (Some((artist, _)), Field::Artist) => validate(field, artist),
                (Some((_, title)), Field::Title) => validate(field, title),
                (None, Field::Title) => validate(field, head),
                _ => None,
            }
        }
        Field::Label => LABEL_RE
            .captures(&block)
            .and_then(|caps| validate(field, &caps[1])),
        Field::ReleaseDate => ISO_DATE_RE.find(&block).map(|m| m.as_str().to_string()),
        Field::Duration => DURATION_RE.find(&block).map(|m| m.as_str().to_string()),
        Field::TrackCount => TRACK_COUNT_RE.find(&block).map(|m| m.as_str().to_string()),
        _ => None,
    }
}
