mod common;

use chart_export::{list_exports, Platform, ScrapeError, ScrapeOptions, SearchType};
use common::{scraper, StaticFetcher, TimeoutFetcher, TRACKLIST_PAGE, TRAXSOURCE_DEEP_HOUSE};
use std::sync::Arc;

const WITH_FALLBACK: ScrapeOptions = ScrapeOptions {
    synthetic_fallback: Some(true),
};

#[test_log::test(tokio::test)]
async fn chart_scrape_writes_csv() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(StaticFetcher::with_fixtures(), downloads.path());

    let outcome = scraper
        .scrape_chart(Platform::Traxsource, "Deep-House")
        .await
        .unwrap();

    assert_eq!(outcome.category, "deep-house");
    assert!(!outcome.is_synthetic());
    assert_eq!(outcome.artifact.record_count, 3);
    assert_eq!(outcome.artifact.category_dir, "deep-house");
    assert!(outcome.artifact.file_name.starts_with("traxsource_deep-house_"));
    assert!(outcome.artifact.path.starts_with(downloads.path().join("deep-house")));

    let mut reader = csv::Reader::from_path(&outcome.artifact.path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        vec![
            "Position",
            "Title",
            "Artist",
            "Label",
            "Duration",
            "Genre",
            "BPM",
            "Key",
            "Release Date",
            "Price",
            "Platform"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][1], "Deep Feelings");
    assert_eq!(&rows[1][6], "BPM unavailable");
    assert_eq!(&rows[2][10], "Traxsource");

    let listed = list_exports(downloads.path(), None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file_name, outcome.artifact.file_name);
    assert_eq!(listed[0].download_url, outcome.artifact.download_url());
}

#[test_log::test(tokio::test)]
async fn unknown_genre_is_rejected_before_fetching() {
    let downloads = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(StaticFetcher::with_fixtures());
    let scraper = chart_export::Scraper::new(
        fetcher.clone(),
        Arc::new(chart_export::Catalog::builtin()),
        downloads.path(),
    );

    let err = scraper
        .scrape_chart(Platform::Beatport, "polka")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::UnknownCategory { .. }));
    assert!(fetcher.requests().is_empty());
}

#[test_log::test(tokio::test)]
async fn upstream_failure_without_fallback_writes_nothing() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(TimeoutFetcher, downloads.path());

    let err = scraper
        .scrape_chart(Platform::Beatport, "techno")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Timeout { .. }));
    assert!(list_exports(downloads.path(), None).unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn upstream_failure_with_fallback_is_flagged_synthetic() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(TimeoutFetcher, downloads.path());

    let outcome = scraper
        .scrape_chart_with(Platform::Beatport, "techno", WITH_FALLBACK)
        .await
        .unwrap();
    assert!(outcome.is_synthetic());
    assert_eq!(outcome.result_set.len(), 100);
    assert!(outcome.artifact.path.is_file());
}

#[test_log::test(tokio::test)]
async fn configured_fallback_applies_to_empty_pages() {
    let downloads = tempfile::tempdir().unwrap();
    let fetcher = StaticFetcher::new().with_page(
        TRAXSOURCE_DEEP_HOUSE,
        "<html><body><p>Please enable JavaScript</p></body></html>",
    );
    let scraper = scraper(fetcher, downloads.path());

    let err = scraper
        .scrape_chart(Platform::Traxsource, "deep-house")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NoRecords { .. }));

    let scraper = scraper.with_synthetic_fallback(true);
    let outcome = scraper
        .scrape_chart(Platform::Traxsource, "deep-house")
        .await
        .unwrap();
    assert!(outcome.is_synthetic());

    // A request can still opt out of the configured default.
    let err = scraper
        .scrape_chart_with(
            Platform::Traxsource,
            "deep-house",
            ScrapeOptions {
                synthetic_fallback: Some(false),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NoRecords { .. }));
}

#[test_log::test(tokio::test)]
async fn multiple_genres_report_individually() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(StaticFetcher::with_fixtures(), downloads.path());

    let genres = vec![
        "deep-house".to_string(),
        "polka".to_string(),
        "house".to_string(),
    ];
    let outcomes = scraper
        .scrape_multiple(Platform::Traxsource, &genres, ScrapeOptions::default())
        .await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(ScrapeError::UnknownCategory { .. })
    ));
    // No fixture for the house chart: the fetch fails with a 404.
    assert!(matches!(outcomes[2].result, Err(ScrapeError::Http(_))));
}

#[test_log::test(tokio::test)]
async fn tracklist_search_exports_under_query() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(StaticFetcher::with_fixtures(), downloads.path());

    let outcome = scraper
        .search_tracklists(SearchType::Dj, Some("carl cox"), ScrapeOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.platform, Platform::Tracklists);
    assert_eq!(outcome.category, "carl cox");
    assert_eq!(outcome.artifact.category_dir, "carl_cox");
    assert!(outcome.artifact.file_name.starts_with("1001tracklists_carl_cox_"));
    assert_eq!(outcome.result_set.len(), 2);
}

#[test_log::test(tokio::test)]
async fn tracklist_search_needs_query() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(StaticFetcher::with_fixtures(), downloads.path());

    let err = scraper
        .search_tracklists(SearchType::Search, Some("  "), ScrapeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidRequest(_)));
}

#[test_log::test(tokio::test)]
async fn popular_sets_fallback_uses_sample_djs() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(TimeoutFetcher, downloads.path());

    let outcome = scraper
        .search_tracklists(SearchType::Popular, None, WITH_FALLBACK)
        .await
        .unwrap();

    assert!(outcome.is_synthetic());
    assert_eq!(outcome.category, "popular");
    assert!(outcome.artifact.file_name.starts_with("1001tracklists_popular_"));
    assert_eq!(outcome.result_set.len(), 50);
    for ranked in outcome.result_set.records() {
        assert_ne!(ranked.record.artist, "Popular");
        assert!(!ranked.record.title.starts_with("Popular @"));
    }
}

#[test_log::test(tokio::test)]
async fn tracklist_tracks_are_not_exported() {
    let downloads = tempfile::tempdir().unwrap();
    let scraper = scraper(StaticFetcher::with_fixtures(), downloads.path());

    let tracks = scraper.tracklist_tracks(TRACKLIST_PAGE).await.unwrap();
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks.records()[1].record.artist, "Solomun");
    assert!(list_exports(downloads.path(), None).unwrap().is_empty());

    let err = scraper
        .tracklist_tracks("/tracklist/2abc/relative.html")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidRequest(_)));
}

#[cfg(feature = "mock")]
mod mock_tests {
    use chart_export::{Catalog, MockPageFetcher, Platform, ScrapeError, Scraper};
    use mockall::predicate::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn fetches_the_catalog_url_once() {
        let downloads = tempfile::tempdir().unwrap();
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .with(eq("https://www.beatport.com/genre/techno/6/top-100"))
            .times(1)
            .returning(|_| Err(ScrapeError::RateLimit { retry_after: 30 }));

        let scraper = Scraper::new(
            Arc::new(fetcher),
            Arc::new(Catalog::builtin()),
            downloads.path(),
        );
        let err = scraper
            .scrape_chart(Platform::Beatport, "techno")
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::RateLimit { retry_after: 30 }));
    }
}
