use std::collections::HashSet;

use crate::types::{Field, NormalizedRecord, Platform, Provenance, ResultSet};

/// Turns normalized records into a ranked, bounded [`ResultSet`].
#[derive(Debug, Clone, Copy)]
pub struct Assembler {
    platform: Platform,
    max_count: usize,
    dedupe: bool,
}

impl Assembler {
    pub fn new(platform: Platform, max_count: usize) -> Self {
        Self {
            platform,
            max_count,
            dedupe: false,
        }
    }

    /// Assembler with the platform's own bound and de-duplication setting.
    pub fn for_platform(platform: Platform) -> Self {
        Self::new(platform, platform.max_records()).dedupe(platform.dedupes())
    }

    /// Drop records whose (artist, title, url) was already accepted,
    /// compared case-insensitively.
    pub fn dedupe(mut self, enabled: bool) -> Self {
        self.dedupe = enabled;
        self
    }

    /// Rank records in document order.
    ///
    /// Records without an extractable title are dropped and do not consume
    /// a position. Stops once `max_count` records are accepted.
    pub fn assemble<I>(&self, records: I) -> ResultSet
    where
        I: IntoIterator<Item = NormalizedRecord>,
    {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut dropped = 0usize;

        for record in records {
            if accepted.len() >= self.max_count {
                break;
            }
            if record.is_unavailable(Field::Title) {
                dropped += 1;
                continue;
            }
            if self.dedupe {
                let key = (
                    record.artist.to_lowercase(),
                    record.title.to_lowercase(),
                    record.url.to_lowercase(),
                );
                if !seen.insert(key) {
                    dropped += 1;
                    continue;
                }
            }
            accepted.push(record);
        }

        log::debug!(
            "Assembled {} {} records ({} dropped, max {})",
            accepted.len(),
            self.platform,
            dropped,
            self.max_count
        );
        ResultSet::ranked(self.platform, accepted, Provenance::Extracted)
    }
}

/// Rank `records` for `platform` without de-duplication.
pub fn assemble<I>(platform: Platform, records: I, max_count: usize) -> ResultSet
where
    I: IntoIterator<Item = NormalizedRecord>,
{
    Assembler::new(platform, max_count).assemble(records)
}
