//! Genre tables and source URLs for every platform.
//!
//! The catalog is immutable once built and is shared between requests
//! behind an `Arc`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::types::Platform;
use crate::{Result, ScrapeError};

const TRACKLISTS_SEARCH_URL: &str =
    "https://www.1001tracklists.com/search/result.php?format=list&limit=50&search=";
const TRACKLISTS_FRONT_PAGE: &str = "https://www.1001tracklists.com/";

const BEATPORT_GENRES: &[(&str, &str)] = &[
    ("house", "https://www.beatport.com/genre/house/5/top-100"),
    ("deep-house", "https://www.beatport.com/genre/deep-house/12/top-100"),
    ("tech-house", "https://www.beatport.com/genre/tech-house/11/top-100"),
    ("progressive-house", "https://www.beatport.com/genre/progressive-house/15/top-100"),
    ("afro-house", "https://www.beatport.com/genre/afro-house/89/top-100"),
    ("bass-house", "https://www.beatport.com/genre/bass-house/91/top-100"),
    ("funky-house", "https://www.beatport.com/genre/funky-house/81/top-100"),
    ("jackin-house", "https://www.beatport.com/genre/jackin-house/83/top-100"),
    ("melodic-house-techno", "https://www.beatport.com/genre/melodic-house-techno/90/top-100"),
    ("organic-house", "https://www.beatport.com/genre/organic-house/93/top-100"),
    ("techno", "https://www.beatport.com/genre/techno/6/top-100"),
    ("peak-time-driving-techno", "https://www.beatport.com/genre/peak-time-driving-techno/2/top-100"),
    ("raw-deep-hypnotic-techno", "https://www.beatport.com/genre/raw-deep-hypnotic-techno/3/top-100"),
    ("hard-techno", "https://www.beatport.com/genre/hard-techno/31/top-100"),
    ("minimal-deep-tech", "https://www.beatport.com/genre/minimal-deep-tech/14/top-100"),
    ("trance", "https://www.beatport.com/genre/trance/7/top-100"),
    ("psy-trance", "https://www.beatport.com/genre/psy-trance/13/top-100"),
    ("trance-raw-deep-hypnotic", "https://www.beatport.com/genre/trance-raw-deep-hypnotic/132/top-100"),
    ("drum-bass", "https://www.beatport.com/genre/drum-bass/1/top-100"),
    ("dubstep", "https://www.beatport.com/genre/dubstep/18/top-100"),
    ("trap-future-bass", "https://www.beatport.com/genre/trap-future-bass/87/top-100"),
    ("bass-club", "https://www.beatport.com/genre/bass-club/147/top-100"),
    ("deep-dubstep-grime", "https://www.beatport.com/genre/deep-dubstep-grime/140/top-100"),
    ("uk-garage-bassline", "https://www.beatport.com/genre/uk-garage-bassline/86/top-100"),
    ("breaks-breakbeat-uk-bass", "https://www.beatport.com/genre/breaks-breakbeat-uk-bass/9/top-100"),
    ("hard-dance-hardcore", "https://www.beatport.com/genre/hard-dance-hardcore/8/top-100"),
    ("ambient-experimental", "https://www.beatport.com/genre/ambient-experimental/19/top-100"),
    ("downtempo", "https://www.beatport.com/genre/downtempo/10/top-100"),
    ("electronica", "https://www.beatport.com/genre/electronica/20/top-100"),
    ("indie-dance", "https://www.beatport.com/genre/indie-dance/37/top-100"),
    ("nu-disco-disco", "https://www.beatport.com/genre/nu-disco-disco/50/top-100"),
    ("electro", "https://www.beatport.com/genre/electro/52/top-100"),
    ("mainstage", "https://www.beatport.com/genre/mainstage/79/top-100"),
    ("dance-pop", "https://www.beatport.com/genre/dance-pop/39/top-100"),
    ("dj-tools", "https://www.beatport.com/genre/dj-tools/16/top-100"),
    ("amapiano", "https://www.beatport.com/genre/amapiano/152/top-100"),
    ("brazilian-funk", "https://www.beatport.com/genre/brazilian-funk/127/top-100"),
    ("african", "https://www.beatport.com/genre/african/65/top-100"),
    ("caribbean", "https://www.beatport.com/genre/caribbean/66/top-100"),
    ("hip-hop", "https://www.beatport.com/genre/hip-hop/38/top-100"),
    ("latin", "https://www.beatport.com/genre/latin/61/top-100"),
    ("pop", "https://www.beatport.com/genre/pop/35/top-100"),
    ("rnb", "https://www.beatport.com/genre/rnb/36/top-100"),
];

const TRAXSOURCE_GENRES: &[(&str, &str)] = &[
    ("house", "https://www.traxsource.com/genre/1/house/top-100-tracks"),
    ("deep-house", "https://www.traxsource.com/genre/71/deep-house/top-100-tracks"),
    ("tech-house", "https://www.traxsource.com/genre/79/tech-house/top-100-tracks"),
    ("afro-house", "https://www.traxsource.com/genre/85/afro-house/top-100-tracks"),
    ("soulful-house", "https://www.traxsource.com/genre/83/soulful-house/top-100-tracks"),
    ("jackin-house", "https://www.traxsource.com/genre/84/jackin-house/top-100-tracks"),
    ("vocal-house", "https://www.traxsource.com/genre/80/vocal-house/top-100-tracks"),
    ("funky-house", "https://www.traxsource.com/genre/5/funky-house/top-100-tracks"),
    ("progressive-house", "https://www.traxsource.com/genre/81/progressive-house/top-100-tracks"),
    ("garage-house", "https://www.traxsource.com/genre/17/garage-house/top-100-tracks"),
    ("tribal-house", "https://www.traxsource.com/genre/32/tribal-house/top-100-tracks"),
    ("acid-house", "https://www.traxsource.com/genre/33/acid-house/top-100-tracks"),
    ("latin-house", "https://www.traxsource.com/genre/34/latin-house/top-100-tracks"),
    ("hard-house", "https://www.traxsource.com/genre/35/hard-house/top-100-tracks"),
    ("disco-house", "https://www.traxsource.com/genre/36/disco-house/top-100-tracks"),
    ("techno", "https://www.traxsource.com/genre/3/techno/top-100-tracks"),
    ("minimal-techno", "https://www.traxsource.com/genre/37/minimal-techno/top-100-tracks"),
    ("hard-techno", "https://www.traxsource.com/genre/38/hard-techno/top-100-tracks"),
    ("disco", "https://www.traxsource.com/genre/14/disco/top-100-tracks"),
    ("nu-disco", "https://www.traxsource.com/genre/82/nu-disco/top-100-tracks"),
    ("funk", "https://www.traxsource.com/genre/15/funk/top-100-tracks"),
    ("indie-dance", "https://www.traxsource.com/genre/86/indie-dance/top-100-tracks"),
    ("leftfield-house", "https://www.traxsource.com/genre/87/leftfield-house/top-100-tracks"),
    ("trance", "https://www.traxsource.com/genre/7/trance/top-100-tracks"),
    ("progressive-trance", "https://www.traxsource.com/genre/39/progressive-trance/top-100-tracks"),
    ("uplifting-trance", "https://www.traxsource.com/genre/40/uplifting-trance/top-100-tracks"),
    ("electronica", "https://www.traxsource.com/genre/41/electronica/top-100-tracks"),
    ("ambient", "https://www.traxsource.com/genre/42/ambient/top-100-tracks"),
    ("downtempo", "https://www.traxsource.com/genre/43/downtempo/top-100-tracks"),
    ("uk-garage", "https://www.traxsource.com/genre/18/uk-garage/top-100-tracks"),
    ("breaks", "https://www.traxsource.com/genre/44/breaks/top-100-tracks"),
    ("drum-bass", "https://www.traxsource.com/genre/45/drum-bass/top-100-tracks"),
    ("dubstep", "https://www.traxsource.com/genre/46/dubstep/top-100-tracks"),
    ("rnb-soul", "https://www.traxsource.com/genre/47/rnb-soul/top-100-tracks"),
    ("gospel", "https://www.traxsource.com/genre/48/gospel/top-100-tracks"),
    ("hip-hop", "https://www.traxsource.com/genre/49/hip-hop/top-100-tracks"),
    ("rap", "https://www.traxsource.com/genre/50/rap/top-100-tracks"),
    ("latin", "https://www.traxsource.com/genre/51/latin/top-100-tracks"),
    ("afrobeat", "https://www.traxsource.com/genre/88/afrobeat/top-100-tracks"),
    ("amapiano", "https://www.traxsource.com/genre/89/amapiano/top-100-tracks"),
    ("pop", "https://www.traxsource.com/genre/52/pop/top-100-tracks"),
    ("dance-pop", "https://www.traxsource.com/genre/53/dance-pop/top-100-tracks"),
    ("electro", "https://www.traxsource.com/genre/54/electro/top-100-tracks"),
    ("electro-house", "https://www.traxsource.com/genre/55/electro-house/top-100-tracks"),
];

/// Beatport genre groups, in display order. Genres not listed fall into
/// "Other"; the house, techno and trance groups match on the slug.
const BEATPORT_GROUPS: &[(&str, &[&str])] = &[
    ("House", &[]),
    ("Techno", &[]),
    ("Trance", &[]),
    (
        "Electronic",
        &[
            "drum-bass",
            "dubstep",
            "trap-future-bass",
            "bass-club",
            "deep-dubstep-grime",
            "uk-garage-bassline",
            "breaks-breakbeat-uk-bass",
            "hard-dance-hardcore",
            "ambient-experimental",
            "downtempo",
            "electronica",
            "indie-dance",
            "nu-disco-disco",
            "electro",
            "mainstage",
        ],
    ),
    ("Dance/Pop", &["dance-pop", "pop"]),
    ("Hip-Hop/R&B", &["hip-hop", "rnb"]),
    ("Reggae/Dancehall", &["caribbean", "african"]),
    ("Latin", &["latin", "brazilian-funk", "amapiano"]),
];

/// A chart the catalog knows how to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreEntry {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl GenreEntry {
    fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: display_name(id),
            url: url.to_string(),
        }
    }
}

/// A named group of Beatport genres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreGroup {
    pub name: String,
    pub genres: Vec<GenreEntry>,
}

/// Kinds of 1001Tracklists listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Search,
    Dj,
    Artist,
    Event,
    Popular,
    Latest,
}

impl SearchType {
    pub const ALL: [SearchType; 6] = [
        SearchType::Search,
        SearchType::Dj,
        SearchType::Artist,
        SearchType::Event,
        SearchType::Popular,
        SearchType::Latest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Search => "search",
            SearchType::Dj => "dj",
            SearchType::Artist => "artist",
            SearchType::Event => "event",
            SearchType::Popular => "popular",
            SearchType::Latest => "latest",
        }
    }

    /// Whether the listing is built from a user query.
    pub fn needs_query(&self) -> bool {
        !matches!(self, SearchType::Popular | SearchType::Latest)
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        SearchType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScrapeError::UnknownCategory {
                platform: Platform::Tracklists.slug().to_string(),
                category: s.to_string(),
            })
    }
}

/// Platform to category to source URL.
#[derive(Debug, Clone)]
pub struct Catalog {
    beatport: Vec<GenreEntry>,
    traxsource: Vec<GenreEntry>,
}

impl Catalog {
    /// The genre tables shipped with the crate.
    pub fn builtin() -> Self {
        let entries = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(id, url)| GenreEntry::new(id, url))
                .collect::<Vec<_>>()
        };
        Self {
            beatport: entries(BEATPORT_GENRES),
            traxsource: entries(TRAXSOURCE_GENRES),
        }
    }

    /// Categories offered for a platform.
    ///
    /// For 1001Tracklists these are the search types, each pointing at the
    /// page its listing starts from.
    pub fn genres(&self, platform: Platform) -> Vec<GenreEntry> {
        match platform {
            Platform::Beatport => self.beatport.clone(),
            Platform::Traxsource => self.traxsource.clone(),
            Platform::Tracklists => SearchType::ALL
                .iter()
                .map(|t| {
                    let url = if t.needs_query() {
                        TRACKLISTS_SEARCH_URL
                    } else {
                        TRACKLISTS_FRONT_PAGE
                    };
                    GenreEntry::new(t.as_str(), url)
                })
                .collect(),
        }
    }

    /// Look up a chart genre, case-insensitively.
    pub fn chart(&self, platform: Platform, genre: &str) -> Result<&GenreEntry> {
        let table = match platform {
            Platform::Beatport => &self.beatport,
            Platform::Traxsource => &self.traxsource,
            Platform::Tracklists => {
                return Err(ScrapeError::InvalidRequest(
                    "1001tracklists has no genre charts, use a tracklist search".to_string(),
                ))
            }
        };
        let wanted = genre.trim().to_lowercase();
        table
            .iter()
            .find(|entry| entry.id == wanted)
            .ok_or_else(|| ScrapeError::UnknownCategory {
                platform: platform.slug().to_string(),
                category: genre.to_string(),
            })
    }

    /// URL of a 1001Tracklists listing.
    pub fn tracklist_search_url(&self, search_type: SearchType, query: Option<&str>) -> Result<String> {
        if !search_type.needs_query() {
            return Ok(TRACKLISTS_FRONT_PAGE.to_string());
        }
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => Ok(format!(
                "{}{}",
                TRACKLISTS_SEARCH_URL,
                urlencoding::encode(query)
            )),
            None => Err(ScrapeError::InvalidRequest(format!(
                "search type '{search_type}' requires a query"
            ))),
        }
    }

    /// Beatport genres grouped by style, empty groups omitted.
    pub fn genre_groups(&self) -> Vec<GenreGroup> {
        let mut groups: Vec<GenreGroup> = BEATPORT_GROUPS
            .iter()
            .map(|(name, _)| GenreGroup {
                name: name.to_string(),
                genres: Vec::new(),
            })
            .collect();
        let mut other = GenreGroup {
            name: "Other".to_string(),
            genres: Vec::new(),
        };

        for entry in &self.beatport {
            match group_index(&entry.id) {
                Some(index) => groups[index].genres.push(entry.clone()),
                None => other.genres.push(entry.clone()),
            }
        }

        groups.push(other);
        groups.retain(|g| !g.genres.is_empty());
        groups
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn group_index(slug: &str) -> Option<usize> {
    if slug.contains("house") {
        return Some(0);
    }
    if slug.contains("techno") {
        return Some(1);
    }
    if slug.contains("trance") {
        return Some(2);
    }
    BEATPORT_GROUPS
        .iter()
        .position(|(_, members)| members.contains(&slug))
}

/// Human readable name for a slug: `deep-house` -> `Deep House`.
pub fn display_name(slug: &str) -> String {
    slug.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(display_name("deep-house"), "Deep House");
        assert_eq!(display_name("techno"), "Techno");
        assert_eq!(display_name("rnb-soul"), "Rnb Soul");
        assert_eq!(display_name("carl cox"), "Carl Cox");
    }

    #[test]
    fn chart_lookup_is_case_insensitive() {
        let catalog = Catalog::builtin();
        let entry = catalog.chart(Platform::Traxsource, "Deep-House").unwrap();
        assert_eq!(
            entry.url,
            "https://www.traxsource.com/genre/71/deep-house/top-100-tracks"
        );
        assert!(matches!(
            catalog.chart(Platform::Beatport, "polka"),
            Err(ScrapeError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn search_urls() {
        let catalog = Catalog::builtin();
        assert_eq!(
            catalog
                .tracklist_search_url(SearchType::Dj, Some("Carl Cox"))
                .unwrap(),
            "https://www.1001tracklists.com/search/result.php?format=list&limit=50&search=Carl%20Cox"
        );
        assert_eq!(
            catalog.tracklist_search_url(SearchType::Popular, None).unwrap(),
            "https://www.1001tracklists.com/"
        );
        assert!(catalog
            .tracklist_search_url(SearchType::Search, Some("  "))
            .is_err());
        assert!("festival".parse::<SearchType>().is_err());
    }

    #[test]
    fn every_beatport_genre_is_grouped_once() {
        let catalog = Catalog::builtin();
        let groups = catalog.genre_groups();
        let total: usize = groups.iter().map(|g| g.genres.len()).sum();
        assert_eq!(total, BEATPORT_GENRES.len());

        let house = groups.iter().find(|g| g.name == "House").unwrap();
        assert!(house.genres.iter().any(|g| g.id == "melodic-house-techno"));
        let latin = groups.iter().find(|g| g.name == "Latin").unwrap();
        assert!(latin.genres.iter().any(|g| g.id == "amapiano"));
    }
}
