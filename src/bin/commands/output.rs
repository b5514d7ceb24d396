use chart_export::{ExportEntry, GenreEntry, RankedRecord};
use serde::Serialize;

/// Events emitted by the scraping commands
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ScrapeEvent {
    /// Starting to scrape a chart or search listing
    Started { platform: String, category: String },
    /// A listing was scraped and written to disk
    Exported {
        platform: String,
        category: String,
        file_name: String,
        path: String,
        records_count: usize,
        synthetic: bool,
    },
    /// A listing could not be scraped
    Failed { category: String, error: String },
    /// A genre or search type offered by a platform
    GenreListed { genre: GenreEntry },
    /// One track of a tracklist
    TrackFound { track: RankedRecord },
    /// An export on disk
    FileListed { file: ExportEntry },
    /// Command finished with summary
    Finished { total: usize, successful: usize },
}

/// Trait for handling command output
pub trait ScrapeOutputHandler {
    fn handle_event(&mut self, event: ScrapeEvent);
}

/// Default output handler.
/// Status messages go to stderr, results go to stdout as JSON (one per line)
pub struct HumanReadableHandler;

impl HumanReadableHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ScrapeOutputHandler for HumanReadableHandler {
    fn handle_event(&mut self, event: ScrapeEvent) {
        match event {
            ScrapeEvent::Started { platform, category } => {
                eprintln!("🔍 Scraping {platform} '{category}'...");
            }
            ScrapeEvent::Exported {
                file_name,
                path,
                records_count,
                synthetic,
                ..
            } => {
                if synthetic {
                    eprintln!("⚠️  Source unavailable, wrote {records_count} SAMPLE records");
                }
                eprintln!("✅ {records_count} records -> {path}");
                println!("{file_name}");
            }
            ScrapeEvent::Failed { category, error } => {
                eprintln!("❌ {category}: {error}");
            }
            ScrapeEvent::GenreListed { genre } => print_json(&genre),
            ScrapeEvent::TrackFound { track } => print_json(&track),
            ScrapeEvent::FileListed { file } => print_json(&file),
            ScrapeEvent::Finished { total, successful } => {
                if total > 1 {
                    eprintln!("Finished: {successful}/{total} succeeded");
                }
            }
        }
    }
}

/// JSON output handler (full event stream)
/// Outputs status events as JSON to stderr, results to stdout
pub struct JsonHandler;

impl JsonHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ScrapeOutputHandler for JsonHandler {
    fn handle_event(&mut self, event: ScrapeEvent) {
        match &event {
            ScrapeEvent::Started { .. }
            | ScrapeEvent::Failed { .. }
            | ScrapeEvent::Finished { .. } => {
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
            ScrapeEvent::Exported { .. } => print_json(&event),
            ScrapeEvent::GenreListed { genre } => print_json(genre),
            ScrapeEvent::TrackFound { track } => print_json(track),
            ScrapeEvent::FileListed { file } => print_json(file),
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{json}");
    }
}
