//! Data types for chart listings and their CSV exports.
//!
//! This module contains the core data structures used throughout the crate:
//! platforms and their schemas, the semantic fields with their sentinel
//! defaults, raw candidate sets harvested from pages, normalized and ranked
//! records, result sets and export artifacts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ScrapeError;

// ================================================================================================
// PLATFORMS
// ================================================================================================

/// Source site a listing was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    /// Beatport top-100 genre charts
    #[serde(rename = "beatport")]
    Beatport,
    /// Traxsource top-100 genre charts
    #[serde(rename = "traxsource")]
    Traxsource,
    /// 1001Tracklists DJ set listings
    #[serde(rename = "1001tracklists")]
    Tracklists,
}

impl Platform {
    /// All supported platforms.
    pub const ALL: [Platform; 3] = [Platform::Beatport, Platform::Traxsource, Platform::Tracklists];

    /// Lowercase identifier used in URLs, file names and directories.
    pub fn slug(&self) -> &'static str {
        match self {
            Platform::Beatport => "beatport",
            Platform::Traxsource => "traxsource",
            Platform::Tracklists => "1001tracklists",
        }
    }

    /// Human readable name, as written into the `Platform` CSV column.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Beatport => "Beatport",
            Platform::Traxsource => "Traxsource",
            Platform::Tracklists => "1001Tracklists",
        }
    }

    /// Maximum number of records a single listing yields.
    pub fn max_records(&self) -> usize {
        match self {
            Platform::Beatport | Platform::Traxsource => 100,
            Platform::Tracklists => 50,
        }
    }

    /// Schema used when exporting this platform's main listing.
    pub fn default_schema(&self) -> Schema {
        match self {
            Platform::Beatport => Schema::BeatportChart,
            Platform::Traxsource => Schema::TraxsourceChart,
            Platform::Tracklists => Schema::TracklistSearch,
        }
    }

    /// Whether repeated (artist, title, url) entries should be dropped.
    ///
    /// Beatport renders both the artwork and the title of a track as
    /// `/track/` links, so every row is seen twice.
    pub fn dedupes(&self) -> bool {
        matches!(self, Platform::Beatport)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Platform {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beatport" => Ok(Platform::Beatport),
            "traxsource" => Ok(Platform::Traxsource),
            "1001tracklists" | "tracklists" => Ok(Platform::Tracklists),
            other => Err(ScrapeError::UnknownPlatform(other.to_string())),
        }
    }
}

// ================================================================================================
// FIELDS AND SENTINELS
// ================================================================================================

/// A semantic field of a listing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Artist,
    Remixer,
    Label,
    ReleaseDate,
    Genre,
    Bpm,
    Key,
    /// Track length, `M:SS`
    Length,
    /// Set duration, `1h 30m`
    Duration,
    Price,
    TrackCount,
    Url,
    Event,
}

impl Field {
    /// Every field, in record order.
    pub const ALL: [Field; 14] = [
        Field::Title,
        Field::Artist,
        Field::Remixer,
        Field::Label,
        Field::ReleaseDate,
        Field::Genre,
        Field::Bpm,
        Field::Key,
        Field::Length,
        Field::Duration,
        Field::Price,
        Field::TrackCount,
        Field::Url,
        Field::Event,
    ];

    /// camelCase key, matching the JSON field names.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Artist => "artist",
            Field::Remixer => "remixer",
            Field::Label => "label",
            Field::ReleaseDate => "releaseDate",
            Field::Genre => "genre",
            Field::Bpm => "bpm",
            Field::Key => "key",
            Field::Length => "length",
            Field::Duration => "duration",
            Field::Price => "price",
            Field::TrackCount => "trackCount",
            Field::Url => "url",
            Field::Event => "event",
        }
    }

    /// Placeholder substituted when no candidate satisfies the field's rule.
    ///
    /// Sentinels are unique per field and never numeric, so they cannot be
    /// mistaken for a real value.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Field::Title => "Title unavailable",
            Field::Artist => "Artist unavailable",
            Field::Remixer => "Remixer unavailable",
            Field::Label => "Label unavailable",
            Field::ReleaseDate => "Release date unavailable",
            Field::Genre => "Genre unavailable",
            Field::Bpm => "BPM unavailable",
            Field::Key => "Key unavailable",
            Field::Length => "Length unavailable",
            Field::Duration => "Duration unavailable",
            Field::Price => "Price unavailable",
            Field::TrackCount => "Track count unavailable",
            Field::Url => "URL unavailable",
            Field::Event => "Event unavailable",
        }
    }
}

// ================================================================================================
// RAW CANDIDATES
// ================================================================================================

/// Raw field candidates harvested from one listing item on a page.
///
/// Structured candidates come from dedicated elements or markup attributes
/// and are kept in the order the page parser found them, most specific
/// first. The text block is the item's whole visible text, used when no
/// structured candidate is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidateSet {
    structured: BTreeMap<Field, Vec<String>>,
    text_block: Option<String>,
}

impl RawCandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a structured candidate for `field`.
    pub fn push(&mut self, field: Field, value: impl Into<String>) -> &mut Self {
        self.structured.entry(field).or_default().push(value.into());
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    pub fn set_text_block(&mut self, text: impl Into<String>) -> &mut Self {
        self.text_block = Some(text.into());
        self
    }

    pub fn with_text_block(mut self, text: impl Into<String>) -> Self {
        self.set_text_block(text);
        self
    }

    /// Structured candidates for `field`, in priority order.
    pub fn structured(&self, field: Field) -> &[String] {
        self.structured.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn text_block(&self) -> Option<&str> {
        self.text_block.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.structured.values().all(Vec::is_empty) && self.text_block.is_none()
    }
}

// ================================================================================================
// RECORDS
// ================================================================================================

/// A fully populated listing record.
///
/// Every field is either a value that passed its field's validation rule or
/// that field's [`sentinel`](Field::sentinel). There are no empty fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub title: String,
    pub artist: String,
    pub remixer: String,
    pub label: String,
    pub release_date: String,
    pub genre: String,
    pub bpm: String,
    pub key: String,
    pub length: String,
    pub duration: String,
    pub price: String,
    pub track_count: String,
    pub url: String,
    pub event: String,
    pub platform: Platform,
}

impl NormalizedRecord {
    /// A record with every field set to its sentinel.
    pub fn unavailable(platform: Platform) -> Self {
        Self {
            title: Field::Title.sentinel().to_string(),
            artist: Field::Artist.sentinel().to_string(),
            remixer: Field::Remixer.sentinel().to_string(),
            label: Field::Label.sentinel().to_string(),
            release_date: Field::ReleaseDate.sentinel().to_string(),
            genre: Field::Genre.sentinel().to_string(),
            bpm: Field::Bpm.sentinel().to_string(),
            key: Field::Key.sentinel().to_string(),
            length: Field::Length.sentinel().to_string(),
            duration: Field::Duration.sentinel().to_string(),
            price: Field::Price.sentinel().to_string(),
            track_count: Field::TrackCount.sentinel().to_string(),
            url: Field::Url.sentinel().to_string(),
            event: Field::Event.sentinel().to_string(),
            platform,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Artist => &self.artist,
            Field::Remixer => &self.remixer,
            Field::Label => &self.label,
            Field::ReleaseDate => &self.release_date,
            Field::Genre => &self.genre,
            Field::Bpm => &self.bpm,
            Field::Key => &self.key,
            Field::Length => &self.length,
            Field::Duration => &self.duration,
            Field::Price => &self.price,
            Field::TrackCount => &self.track_count,
            Field::Url => &self.url,
            Field::Event => &self.event,
        }
    }

    pub(crate) fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Artist => &mut self.artist,
            Field::Remixer => &mut self.remixer,
            Field::Label => &mut self.label,
            Field::ReleaseDate => &mut self.release_date,
            Field::Genre => &mut self.genre,
            Field::Bpm => &mut self.bpm,
            Field::Key => &mut self.key,
            Field::Length => &mut self.length,
            Field::Duration => &mut self.duration,
            Field::Price => &mut self.price,
            Field::TrackCount => &mut self.track_count,
            Field::Url => &mut self.url,
            Field::Event => &mut self.event,
        }
    }

    /// Whether `field` holds its sentinel rather than an extracted value.
    pub fn is_unavailable(&self, field: Field) -> bool {
        self.get(field) == field.sentinel()
    }
}

/// A normalized record with its 1-based position in a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub position: u32,
    #[serde(flatten)]
    pub record: NormalizedRecord,
}

impl RankedRecord {
    /// String value of a CSV column for this record.
    pub fn value(&self, column: Column) -> String {
        match column {
            Column::Position => self.position.to_string(),
            Column::Platform => self.record.platform.display_name().to_string(),
            Column::Field(field) => self.record.get(field).to_string(),
        }
    }
}

/// Where a result set's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Extracted from a fetched page
    Extracted,
    /// Generated placeholder data; never real listings
    Synthetic,
}

impl Provenance {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Provenance::Synthetic)
    }
}

/// The ordered, bounded records for one query.
///
/// Positions are strictly increasing and contiguous from 1. Only the
/// assembler and the synthetic generator build result sets, and a result
/// set never mixes their records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    platform: Platform,
    records: Vec<RankedRecord>,
    provenance: Provenance,
}

impl ResultSet {
    /// Rank `records` in the given order, positions 1..=n.
    pub fn ranked(
        platform: Platform,
        records: Vec<NormalizedRecord>,
        provenance: Provenance,
    ) -> Self {
        let records = records
            .into_iter()
            .zip(1u32..)
            .map(|(record, position)| RankedRecord { position, record })
            .collect();
        Self {
            platform,
            records,
            provenance,
        }
    }

    pub fn empty(platform: Platform) -> Self {
        Self::ranked(platform, Vec::new(), Provenance::Extracted)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn records(&self) -> &[RankedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RankedRecord> {
        self.records
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `n` records, for response previews.
    pub fn preview(&self, n: usize) -> &[RankedRecord] {
        &self.records[..n.min(self.records.len())]
    }
}

// ================================================================================================
// SCHEMAS
// ================================================================================================

/// A CSV column source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Position,
    Platform,
    Field(Field),
}

/// A column with its header title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub column: Column,
    pub title: &'static str,
}

const fn col(column: Column, title: &'static str) -> ColumnSpec {
    ColumnSpec { column, title }
}

/// Fixed, ordered column layout of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Schema {
    BeatportChart,
    TraxsourceChart,
    TracklistSearch,
    TracklistTracks,
}

const BEATPORT_CHART: &[ColumnSpec] = &[
    col(Column::Position, "Position"),
    col(Column::Field(Field::Title), "Title"),
    col(Column::Field(Field::Artist), "Artist"),
    col(Column::Field(Field::Remixer), "Remixer"),
    col(Column::Field(Field::Label), "Label"),
    col(Column::Field(Field::ReleaseDate), "Release Date"),
    col(Column::Field(Field::Genre), "Genre"),
    col(Column::Field(Field::Bpm), "BPM"),
    col(Column::Field(Field::Key), "Key"),
    col(Column::Field(Field::Length), "Length"),
    col(Column::Field(Field::Price), "Price"),
];

const TRAXSOURCE_CHART: &[ColumnSpec] = &[
    col(Column::Position, "Position"),
    col(Column::Field(Field::Title), "Title"),
    col(Column::Field(Field::Artist), "Artist"),
    col(Column::Field(Field::Label), "Label"),
    col(Column::Field(Field::Length), "Duration"),
    col(Column::Field(Field::Genre), "Genre"),
    col(Column::Field(Field::Bpm), "BPM"),
    col(Column::Field(Field::Key), "Key"),
    col(Column::Field(Field::ReleaseDate), "Release Date"),
    col(Column::Field(Field::Price), "Price"),
    col(Column::Platform, "Platform"),
];

const TRACKLIST_SEARCH: &[ColumnSpec] = &[
    col(Column::Position, "Position"),
    col(Column::Field(Field::Title), "Title"),
    col(Column::Field(Field::Artist), "DJ / Artist"),
    col(Column::Field(Field::Event), "Event"),
    col(Column::Field(Field::ReleaseDate), "Date"),
    col(Column::Field(Field::Duration), "Duration"),
    col(Column::Field(Field::TrackCount), "Track Count"),
    col(Column::Field(Field::Url), "URL"),
    col(Column::Platform, "Platform"),
];

const TRACKLIST_TRACKS: &[ColumnSpec] = &[
    col(Column::Position, "Position"),
    col(Column::Field(Field::Artist), "Artist"),
    col(Column::Field(Field::Title), "Title"),
    col(Column::Field(Field::Label), "Label"),
];

impl Schema {
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Schema::BeatportChart => BEATPORT_CHART,
            Schema::TraxsourceChart => TRAXSOURCE_CHART,
            Schema::TracklistSearch => TRACKLIST_SEARCH,
            Schema::TracklistTracks => TRACKLIST_TRACKS,
        }
    }

    /// Header row, in column order.
    pub fn headers(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.title).collect()
    }
}

// ================================================================================================
// EXPORTS
// ================================================================================================

/// Inputs to the export naming policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingParams {
    pub platform: Platform,
    /// Genre or search term; may be empty, in which case the platform slug
    /// names the directory.
    pub category: String,
    pub date: NaiveDate,
    pub schema: Schema,
}

impl NamingParams {
    pub fn new(platform: Platform, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            platform,
            category: category.into(),
            date,
            schema: platform.default_schema(),
        }
    }

    /// Naming for today's date (UTC).
    pub fn today(platform: Platform, category: impl Into<String>) -> Self {
        Self::new(platform, category, Utc::now().date_naive())
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
}

/// A completed CSV write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    /// Full path of the written file
    pub path: PathBuf,
    pub file_name: String,
    /// Sanitized directory name under the downloads root
    pub category_dir: String,
    pub record_count: usize,
    pub created_at: DateTime<Utc>,
}

impl ExportArtifact {
    /// Relative download reference served by the HTTP API.
    pub fn download_url(&self) -> String {
        format!("/api/download/{}/{}", self.category_dir, self.file_name)
    }
}

/// An exported CSV found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    pub file_name: String,
    pub category: String,
    pub download_url: String,
    pub modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sentinels_are_distinct_and_not_numeric() {
        let sentinels: HashSet<_> = Field::ALL.iter().map(|f| f.sentinel()).collect();
        assert_eq!(sentinels.len(), Field::ALL.len());
        for sentinel in sentinels {
            assert!(!sentinel.is_empty());
            assert!(sentinel.parse::<f64>().is_err(), "{sentinel} looks numeric");
            assert!(!sentinel.chars().any(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn platform_parses_from_slug() {
        assert_eq!("beatport".parse::<Platform>().unwrap(), Platform::Beatport);
        assert_eq!(" Traxsource ".parse::<Platform>().unwrap(), Platform::Traxsource);
        assert_eq!(
            "1001tracklists".parse::<Platform>().unwrap(),
            Platform::Tracklists
        );
        assert!(matches!(
            "spotify".parse::<Platform>(),
            Err(ScrapeError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn ranked_result_set_positions_start_at_one() {
        let records = vec![
            NormalizedRecord::unavailable(Platform::Beatport),
            NormalizedRecord::unavailable(Platform::Beatport),
        ];
        let set = ResultSet::ranked(Platform::Beatport, records, Provenance::Extracted);
        let positions: Vec<u32> = set.records().iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(set.preview(10).len(), 2);
    }

    #[test]
    fn ranked_record_serializes_flat() {
        let record = RankedRecord {
            position: 3,
            record: NormalizedRecord::unavailable(Platform::Tracklists),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["position"], 3);
        assert_eq!(json["trackCount"], "Track count unavailable");
        assert_eq!(json["platform"], "1001tracklists");
    }

    #[test]
    fn every_schema_starts_with_position() {
        for schema in [
            Schema::BeatportChart,
            Schema::TraxsourceChart,
            Schema::TracklistSearch,
            Schema::TracklistTracks,
        ] {
            assert_eq!(schema.columns()[0].column, Column::Position);
        }
    }
}
