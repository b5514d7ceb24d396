pub mod output;
pub mod scrape;

use chart_export::{AppConfig, AppState, ScrapeOptions};
use clap::Subcommand;
use std::path::PathBuf;

use output::{HumanReadableHandler, JsonHandler, ScrapeOutputHandler};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    ///
    /// Usage examples:
    /// # Serve on the configured address
    /// chart-export serve
    ///
    /// # Serve on another port with sample data for unreachable sources
    /// chart-export serve --bind 127.0.0.1:8080 --synthetic-fallback
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,

        /// Directory the CSV exports are written to
        #[arg(long)]
        downloads: Option<PathBuf>,

        /// Substitute flagged sample records when a source cannot be scraped
        #[arg(long)]
        synthetic_fallback: bool,
    },

    /// List the genres (or search types) a platform offers
    ///
    /// Usage examples:
    /// chart-export genres beatport
    /// chart-export genres 1001tracklists
    Genres {
        /// beatport, traxsource or 1001tracklists
        platform: String,
    },

    /// Scrape one or more genre charts and export them as CSV
    ///
    /// Usage examples:
    /// # Export the Traxsource deep house top 100
    /// chart-export scrape traxsource deep-house
    ///
    /// # Export several Beatport charts in one run
    /// chart-export scrape beatport techno melodic-house-techno afro-house
    Scrape {
        /// beatport or traxsource
        platform: String,

        /// Genre ids as listed by `chart-export genres`
        #[arg(required = true)]
        genres: Vec<String>,

        #[arg(long)]
        synthetic_fallback: bool,
    },

    /// Search 1001Tracklists and export the matching sets
    ///
    /// Usage examples:
    /// chart-export tracklists dj "carl cox"
    /// chart-export tracklists latest
    Tracklists {
        /// search, dj, artist, event, popular or latest
        search_type: String,

        /// Search term (required for search, dj, artist and event)
        query: Option<String>,

        #[arg(long)]
        synthetic_fallback: bool,
    },

    /// Print the tracks of a single tracklist page
    Tracks {
        /// Absolute URL of the tracklist
        url: String,
    },

    /// List exported files, newest first
    Files {
        /// Only list this category directory
        category: Option<String>,
    },
}

pub async fn execute_command(
    command: Commands,
    mut config: AppConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut handler: Box<dyn ScrapeOutputHandler> = if json {
        Box::new(JsonHandler::new())
    } else {
        Box::new(HumanReadableHandler::new())
    };

    match command {
        Commands::Serve {
            bind,
            downloads,
            synthetic_fallback,
        } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Some(downloads) = downloads {
                config.downloads_root = downloads;
            }
            config.fallback.synthetic |= synthetic_fallback;

            let state = app_state(&config);
            chart_export::api::serve(&config, state).await?;
            Ok(())
        }

        Commands::Genres { platform } => {
            let state = app_state(&config);
            scrape::handle_genres(&state.scraper, platform.parse()?, handler.as_mut())
        }

        Commands::Scrape {
            platform,
            genres,
            synthetic_fallback,
        } => {
            let state = app_state(&config);
            scrape::handle_scrape(
                &state.scraper,
                platform.parse()?,
                &genres,
                options(synthetic_fallback),
                handler.as_mut(),
            )
            .await
        }

        Commands::Tracklists {
            search_type,
            query,
            synthetic_fallback,
        } => {
            let state = app_state(&config);
            scrape::handle_tracklists(
                &state.scraper,
                search_type.parse()?,
                query.as_deref(),
                options(synthetic_fallback),
                handler.as_mut(),
            )
            .await
        }

        Commands::Tracks { url } => {
            let state = app_state(&config);
            scrape::handle_tracks(&state.scraper, &url, handler.as_mut()).await
        }

        Commands::Files { category } => {
            scrape::handle_files(&config.downloads_root, category.as_deref(), handler.as_mut())
        }
    }
}

fn app_state(config: &AppConfig) -> AppState {
    let client = http_client::native::NativeClient::new();
    AppState::from_config(config, Box::new(client))
}

/// A command-line flag can only turn the fallback on; otherwise the
/// configured default applies.
fn options(synthetic_fallback: bool) -> ScrapeOptions {
    ScrapeOptions {
        synthetic_fallback: synthetic_fallback.then_some(true),
    }
}
