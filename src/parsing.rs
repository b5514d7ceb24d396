//! HTML parsing for chart and tracklist pages.
//!
//! Parsers only harvest candidates. They do not validate values or decide
//! positions: every listing item becomes a [`RawCandidateSet`] in document
//! order, and the field extractor and assembler take it from there.

use http_types::Url;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::catalog::display_name;
use crate::normalize::normalize_whitespace;
use crate::types::{Field, RawCandidateSet};

static TRACK_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s+(.+?\[.*)$").unwrap());

/// How far up from a Beatport track link to look for its row.
const BEATPORT_CONTAINER_DEPTH: usize = 5;

/// Parser for the listing pages of every supported platform.
#[derive(Debug, Clone, Default)]
pub struct ChartParser;

impl ChartParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a Beatport top-100 chart page.
    ///
    /// Each `/track/` link is a candidate row. Its container is the first of
    /// up to five enclosing elements that also links to an artist; links
    /// without such a container are skipped.
    pub fn parse_beatport_chart(&self, document: &Html, page_url: &str) -> Vec<RawCandidateSet> {
        let track_selector = Selector::parse(r#"a[href*="/track/"]"#).unwrap();
        let artist_selector = Selector::parse(r#"a[href*="/artist/"]"#).unwrap();
        let label_selector = Selector::parse(r#"a[href*="/label/"]"#).unwrap();
        let genre_selector = Selector::parse(r#"a[href*="/genre/"]"#).unwrap();

        let cascades = [
            (
                Field::Remixer,
                ".buk-track-remixers, .track-remixers, [class*=\"remixer\"]",
            ),
            (
                Field::ReleaseDate,
                ".buk-track-released, .track-released, [class*=\"release-date\"]",
            ),
            (Field::Bpm, ".buk-track-bpm, .track-bpm, [class*=\"bpm\"]"),
            (Field::Key, ".buk-track-key, .track-key, [class*=\"key\"]"),
            (
                Field::Length,
                ".buk-track-length, .track-length, [class*=\"length\"]",
            ),
            (
                Field::Price,
                ".buk-track-price, .track-price, [class*=\"price\"]",
            ),
        ]
        .map(|(field, css)| (field, Selector::parse(css).unwrap()));

        let base = Url::parse(page_url).ok();
        let chart_genre = base.as_ref().and_then(genre_from_chart_url);

        let links: Vec<_> = document.select(&track_selector).collect();
        log::debug!("Found {} track links on {}", links.len(), page_url);

        let mut items = Vec::new();
        for link in links {
            let title = element_text(&link);
            if title.chars().count() < 2 {
                continue;
            }

            let Some(container) = link
                .ancestors()
                .filter_map(ElementRef::wrap)
                .skip_while(|e| e.value().name() != "div")
                .take(BEATPORT_CONTAINER_DEPTH)
                .find(|e| e.select(&artist_selector).next().is_some())
            else {
                continue;
            };

            let mut candidates = RawCandidateSet::new();
            candidates.push(Field::Title, title);

            let artists: Vec<String> = container
                .select(&artist_selector)
                .map(|a| element_text(&a))
                .filter(|a| !a.is_empty())
                .collect();
            candidates.push(Field::Artist, artists.join(", "));

            if let Some(label) = container.select(&label_selector).next() {
                candidates.push(Field::Label, element_text(&label));
            }
            for (field, selector) in &cascades {
                if let Some(element) = container.select(selector).next() {
                    candidates.push(*field, element_text(&element));
                }
            }
            if let Some(genre) = container.select(&genre_selector).next() {
                candidates.push(Field::Genre, element_text(&genre));
            }
            if let Some(genre) = &chart_genre {
                candidates.push(Field::Genre, genre.clone());
            }
            if let Some(url) = absolute_href(base.as_ref(), &link) {
                candidates.push(Field::Url, url);
            }

            items.push(candidates);
        }

        log::debug!("Parsed {} Beatport rows", items.len());
        items
    }

    /// Parse a Traxsource top-100 chart page.
    ///
    /// Items need a title and an artist of at least three characters; the
    /// site's layout rows share the `.row` class with real tracks.
    pub fn parse_traxsource_chart(&self, document: &Html, page_url: &str) -> Vec<RawCandidateSet> {
        let item_selector = Selector::parse(".track, .track-item, .chart-item, .row").unwrap();
        let title_selector =
            Selector::parse(r#".track-title, .title, .track-name, h3, h4, a[href*="/track/"]"#)
                .unwrap();
        let artist_selector =
            Selector::parse(".track-artist, .artist, .track-performer, .by, .track-artists")
                .unwrap();
        let link_selector = Selector::parse(r#"a[href*="/track/"]"#).unwrap();

        let cascades = [
            (Field::Label, ".track-label, .label, .track-record-label"),
            (Field::Length, ".track-duration, .duration, .time"),
            (Field::Genre, ".track-genre, .genre, .track-style"),
            (Field::Bpm, ".track-bpm, .bpm, .tempo"),
            (Field::Key, ".track-key, .key, .track-musical-key"),
            (
                Field::ReleaseDate,
                ".track-release-date, .release-date, .date",
            ),
            (Field::Price, ".track-price, .price, .cost"),
        ]
        .map(|(field, css)| (field, Selector::parse(css).unwrap()));

        let base = Url::parse(page_url).ok();
        let elements: Vec<_> = document.select(&item_selector).collect();
        log::debug!("Found {} Traxsource item elements", elements.len());

        let mut items = Vec::new();
        for element in elements {
            let Some(title_element) = element.select(&title_selector).next() else {
                continue;
            };
            let mut title = element_text(&title_element);
            if title.is_empty() {
                title = title_element
                    .value()
                    .attr("title")
                    .map(normalize_whitespace)
                    .unwrap_or_default();
            }
            let artist = element
                .select(&artist_selector)
                .next()
                .map(|a| element_text(&a))
                .unwrap_or_default();
            if title.chars().count() <= 2 || artist.chars().count() <= 2 {
                continue;
            }

            let mut candidates = RawCandidateSet::new();
            candidates.push(Field::Title, title);
            candidates.push(Field::Artist, artist);
            for (field, selector) in &cascades {
                if let Some(value) = element.select(selector).next() {
                    candidates.push(*field, element_text(&value));
                }
            }
            if let Some(url) = element
                .select(&link_selector)
                .next()
                .and_then(|link| absolute_href(base.as_ref(), &link))
            {
                candidates.push(Field::Url, url);
            }
            items.push(candidates);
        }

        log::debug!("Parsed {} Traxsource rows", items.len());
        items
    }

    /// Parse a 1001Tracklists search result (or front) page.
    ///
    /// Rows are table rows and tracklist containers. When none of them link
    /// to a tracklist, every bare tracklist link is used with its closest
    /// row-like ancestor.
    pub fn parse_tracklist_search(&self, document: &Html, page_url: &str) -> Vec<RawCandidateSet> {
        let row_selector =
            Selector::parse(r#"table tr:not(:first-child), .tlContainer, [class*="tracklist"]"#)
                .unwrap();
        let link_selector = Selector::parse(r#"a[href*="/tracklist/"]"#).unwrap();
        let context = SearchRowContext {
            base: Url::parse(page_url).ok(),
            dj: Selector::parse(r#"a[href*="/dj/"]"#).unwrap(),
            venue: Selector::parse(r#"a[href*="/venue/"]"#).unwrap(),
        };

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for row in document.select(&row_selector) {
            if let Some(link) = row.select(&link_selector).next() {
                if let Some(candidates) = self.tracklist_row(&context, &row, &link, &mut seen)
                {
                    items.push(candidates);
                }
            }
        }

        if items.is_empty() {
            log::debug!("No tracklist rows found, falling back to bare tracklist links");
            for link in document.select(&link_selector) {
                let row = link
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|e| matches!(e.value().name(), "tr" | "div" | "li"))
                    .unwrap_or(link);
                if let Some(candidates) = self.tracklist_row(&context, &row, &link, &mut seen)
                {
                    items.push(candidates);
                }
            }
        }

        log::debug!("Parsed {} tracklist search rows", items.len());
        items
    }

    fn tracklist_row(
        &self,
        context: &SearchRowContext,
        row: &ElementRef,
        link: &ElementRef,
        seen: &mut HashSet<String>,
    ) -> Option<RawCandidateSet> {
        let title = element_text(link);
        if title.chars().count() <= 3 {
            return None;
        }
        let url = absolute_href(context.base.as_ref(), link);
        let key = url.clone().unwrap_or_else(|| title.clone());
        if !seen.insert(key) {
            return None;
        }

        let mut candidates = RawCandidateSet::new();
        candidates.push(Field::Title, title);
        if let Some(url) = url {
            candidates.push(Field::Url, url);
        }
        if let Some(dj) = row.select(&context.dj).next() {
            candidates.push(Field::Artist, element_text(&dj));
        }
        if let Some(venue) = row.select(&context.venue).next() {
            candidates.push(Field::Event, element_text(&venue));
        }
        candidates.set_text_block(element_text(row));
        Some(candidates)
    }

    /// Parse the track rows of a single tracklist page.
    ///
    /// Only rows shaped like `<number> <artist - title> [<label>]` are
    /// kept; the leading track number is removed from the text block.
    pub fn parse_tracklist_tracks(&self, document: &Html) -> Vec<RawCandidateSet> {
        let row_selector = Selector::parse(r#"[class*="tlp"], tr[id*="tlpItem"]"#).unwrap();

        let mut items = Vec::new();
        for row in document.select(&row_selector) {
            let text = element_text(&row);
            if let Some(caps) = TRACK_ROW_RE.captures(&text) {
                items.push(RawCandidateSet::new().with_text_block(&caps[1]));
            }
        }

        log::debug!("Parsed {} tracklist track rows", items.len());
        items
    }
}

/// Page base and per-row selectors shared by every search result row.
struct SearchRowContext {
    base: Option<Url>,
    dj: Selector,
    venue: Selector,
}

/// Whitespace-normalized text of an element, text nodes joined by spaces.
fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn absolute_href(base: Option<&Url>, link: &ElementRef) -> Option<String> {
    let href = link.value().attr("href")?.trim();
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

/// `https://www.beatport.com/genre/deep-house/12/top-100` -> `Deep House`.
fn genre_from_chart_url(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    if segments.next()? != "genre" {
        return None;
    }
    segments
        .next()
        .filter(|slug| !slug.is_empty())
        .map(display_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_genre_from_url_path() {
        let url = Url::parse("https://www.beatport.com/genre/deep-house/12/top-100").unwrap();
        assert_eq!(genre_from_chart_url(&url), Some("Deep House".to_string()));

        let url = Url::parse("https://www.beatport.com/top-100").unwrap();
        assert_eq!(genre_from_chart_url(&url), None);
    }

    #[test]
    fn element_text_joins_nodes() {
        let html = Html::parse_fragment("<div><span>Carl Cox</span><span>@ Space</span></div>");
        let selector = Selector::parse("div").unwrap();
        let div = html.select(&selector).next().unwrap();
        assert_eq!(element_text(&div), "Carl Cox @ Space");
    }

    #[test]
    fn search_rows_keep_their_own_dj_and_venue() {
        let html = Html::parse_document(
            r#"<table>
                <tr><th>Set</th></tr>
                <tr><td><a href="/tracklist/1a/carl-cox-space.html">Carl Cox @ Space Ibiza</a>
                    <a href="/dj/carlcox/">Carl Cox</a> <a href="/venue/space/">Space Ibiza</a></td></tr>
                <tr><td><a href="/tracklist/2b/solomun-pacha.html">Solomun @ Pacha Ibiza</a>
                    <a href="/dj/solomun/">Solomun</a></td></tr>
            </table>"#,
        );
        let rows = ChartParser::new()
            .parse_tracklist_search(&html, "https://www.1001tracklists.com/search/result.php");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].structured(Field::Artist), ["Carl Cox".to_string()]);
        assert_eq!(rows[0].structured(Field::Event), ["Space Ibiza".to_string()]);
        assert_eq!(rows[1].structured(Field::Artist), ["Solomun".to_string()]);
        assert!(rows[1].structured(Field::Event).is_empty());
        assert_eq!(
            rows[1].structured(Field::Url),
            ["https://www.1001tracklists.com/tracklist/2b/solomun-pacha.html".to_string()]
        );
    }

    #[test]
    fn track_rows_need_number_and_label() {
        let html = Html::parse_document(
            r#"<table>
                <tr id="tlpItem1"><td>01</td><td>Kerri Chandler - Rain [Defected]</td></tr>
                <tr id="tlpItem2"><td>ID - ID</td></tr>
                <tr id="tlpItem3"><td>3</td><td>Solomun - Customer Is King [Diynamic]</td></tr>
            </table>"#,
        );
        let rows = ChartParser::new().parse_tracklist_tracks(&html);
        let blocks: Vec<_> = rows.iter().filter_map(|r| r.text_block()).collect();
        assert_eq!(
            blocks,
            vec![
                "Kerri Chandler - Rain [Defected]",
                "Solomun - Customer Is King [Diynamic]"
            ]
        );
    }
}
