use super::output::{ScrapeEvent, ScrapeOutputHandler};
use chart_export::{list_exports, Platform, ScrapeOptions, ScrapeOutcome, Scraper, SearchType};
use std::path::Path;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn exported(outcome: &ScrapeOutcome) -> ScrapeEvent {
    ScrapeEvent::Exported {
        platform: outcome.platform.slug().to_string(),
        category: outcome.category.clone(),
        file_name: outcome.artifact.file_name.clone(),
        path: outcome.artifact.path.display().to_string(),
        records_count: outcome.artifact.record_count,
        synthetic: outcome.is_synthetic(),
    }
}

pub fn handle_genres(
    scraper: &Scraper,
    platform: Platform,
    handler: &mut dyn ScrapeOutputHandler,
) -> CommandResult {
    for genre in scraper.catalog().genres(platform) {
        handler.handle_event(ScrapeEvent::GenreListed { genre });
    }
    Ok(())
}

/// Scrape each genre in turn. Fails only if every genre failed.
pub async fn handle_scrape(
    scraper: &Scraper,
    platform: Platform,
    genres: &[String],
    options: ScrapeOptions,
    handler: &mut dyn ScrapeOutputHandler,
) -> CommandResult {
    let mut successful = 0;
    for genre in genres {
        handler.handle_event(ScrapeEvent::Started {
            platform: platform.slug().to_string(),
            category: genre.clone(),
        });
        match scraper.scrape_chart_with(platform, genre, options).await {
            Ok(outcome) => {
                successful += 1;
                handler.handle_event(exported(&outcome));
            }
            Err(e) => handler.handle_event(ScrapeEvent::Failed {
                category: genre.clone(),
                error: e.to_string(),
            }),
        }
    }

    handler.handle_event(ScrapeEvent::Finished {
        total: genres.len(),
        successful,
    });
    if successful == 0 {
        return Err(format!("no {platform} chart could be exported").into());
    }
    Ok(())
}

pub async fn handle_tracklists(
    scraper: &Scraper,
    search_type: SearchType,
    query: Option<&str>,
    options: ScrapeOptions,
    handler: &mut dyn ScrapeOutputHandler,
) -> CommandResult {
    handler.handle_event(ScrapeEvent::Started {
        platform: Platform::Tracklists.slug().to_string(),
        category: query.unwrap_or(search_type.as_str()).to_string(),
    });
    let outcome = scraper
        .search_tracklists(search_type, query, options)
        .await?;
    handler.handle_event(exported(&outcome));
    Ok(())
}

pub async fn handle_tracks(
    scraper: &Scraper,
    url: &str,
    handler: &mut dyn ScrapeOutputHandler,
) -> CommandResult {
    let tracks = scraper.tracklist_tracks(url).await?;
    let total = tracks.len();
    for track in tracks.into_records() {
        handler.handle_event(ScrapeEvent::TrackFound { track });
    }
    handler.handle_event(ScrapeEvent::Finished {
        total,
        successful: total,
    });
    Ok(())
}

pub fn handle_files(
    root: &Path,
    category: Option<&str>,
    handler: &mut dyn ScrapeOutputHandler,
) -> CommandResult {
    let files = list_exports(root, category)?;
    if files.is_empty() {
        eprintln!("No exports under {}", root.display());
    }
    for file in files {
        handler.handle_event(ScrapeEvent::FileListed { file });
    }
    Ok(())
}
