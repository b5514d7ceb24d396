//! CSV export of result sets.
//!
//! Files land in `<root>/<category>/<platform>_<category>_<YYYY-MM-DD>.csv`.
//! A same-day export with the same parameters replaces the earlier file.
//! Concurrent writers to one path race and the last rename wins.

use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::types::{ExportArtifact, ExportEntry, NamingParams, ResultSet};
use crate::{Result, ScrapeError};

/// Make a string safe for use as one path component.
///
/// ASCII letters are lowercased, and every character outside
/// `[a-zA-Z0-9_-]` becomes `_`. Applying it twice changes nothing.
pub fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Directory name for an export: the category, or the platform slug when
/// there is no category.
pub fn category_dir(naming: &NamingParams) -> String {
    if naming.category.trim().is_empty() {
        sanitize(naming.platform.slug())
    } else {
        sanitize(naming.category.trim())
    }
}

pub fn file_name(naming: &NamingParams) -> String {
    let date = naming.date.format("%Y-%m-%d");
    if naming.category.trim().is_empty() {
        format!("{}_{}.csv", naming.platform.slug(), date)
    } else {
        format!(
            "{}_{}_{}.csv",
            naming.platform.slug(),
            sanitize(naming.category.trim()),
            date
        )
    }
}

/// Write `result_set` as CSV under `root` and describe the written file.
///
/// The file is written to a hidden temporary sibling first and persisted
/// into place, so readers never see a partial export. A temporary file
/// that is never persisted is removed when it drops.
pub fn export(result_set: &ResultSet, naming: &NamingParams, root: &Path) -> Result<ExportArtifact> {
    let dir_name = category_dir(naming);
    let dir = root.join(&dir_name);
    fs::create_dir_all(&dir)?;

    let file_name = file_name(naming);
    let path = dir.join(&file_name);
    let mut temp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(&dir)?;
    write_csv(result_set, naming, temp.as_file_mut())?;
    temp.persist(&path).map_err(|e| e.error)?;

    log::info!(
        "Exported {} records to {}",
        result_set.len(),
        path.display()
    );

    Ok(ExportArtifact {
        path,
        file_name,
        category_dir: dir_name,
        record_count: result_set.len(),
        created_at: Utc::now(),
    })
}

fn write_csv<W: Write>(result_set: &ResultSet, naming: &NamingParams, out: W) -> Result<()> {
    let columns = naming.schema.columns();
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns.iter().map(|c| c.title))?;
    for record in result_set.records() {
        writer.write_record(columns.iter().map(|c| record.value(c.column)))?;
    }
    writer.flush()?;
    Ok(())
}

/// Exported CSV files under `root`, newest first.
///
/// With a category only that directory is listed. A missing root or
/// category directory lists as empty.
pub fn list_exports(root: &Path, category: Option<&str>) -> Result<Vec<ExportEntry>> {
    let dirs: Vec<String> = match category {
        Some(category) => vec![valid_category(category)?.to_string()],
        None => match fs::read_dir(root) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        },
    };

    let mut found = Vec::new();
    for dir in dirs {
        let entries = match fs::read_dir(root.join(&dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(".csv") {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified: DateTime<Utc> = metadata.modified()?.into();
            found.push(ExportEntry {
                download_url: format!("/api/download/{dir}/{name}"),
                file_name: name,
                category: dir.clone(),
                modified,
            });
        }
    }

    found.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    Ok(found)
}

/// Path of an exported file, after checking both components are plain
/// names that stay inside `root`.
pub fn resolve_download(root: &Path, category: &str, file_name: &str) -> Result<PathBuf> {
    let category = valid_category(category)?;
    let plain = !file_name.is_empty()
        && !file_name.starts_with('.')
        && !file_name.contains(['/', '\\'])
        && !file_name.contains("..")
        && file_name.ends_with(".csv");
    if !plain {
        return Err(ScrapeError::InvalidRequest(format!(
            "invalid file name '{file_name}'"
        )));
    }

    let path = root.join(category).join(file_name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ScrapeError::NotFound(format!("{category}/{file_name}")))
    }
}

fn valid_category(category: &str) -> Result<&str> {
    if category.is_empty() || sanitize(category) != category {
        return Err(ScrapeError::InvalidRequest(format!(
            "invalid category '{category}'"
        )));
    }
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::types::{NormalizedRecord, Platform, Schema};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn tricky_record() -> NormalizedRecord {
        let mut record = NormalizedRecord::unavailable(Platform::Traxsource);
        record.title = "Deep Feelings, Pt. 2".to_string();
        record.artist = "Kerri \"KC\" Chandler".to_string();
        record.label = "Defected\nRecords".to_string();
        record
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in ["Deep House", "drum-&-bass", "Tech_House", "../../etc", "Café"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
            assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
        assert_eq!(sanitize("Deep House"), "deep_house");
    }

    #[test]
    fn naming_policy() {
        let naming = NamingParams::new(Platform::Traxsource, "Deep House", date());
        assert_eq!(category_dir(&naming), "deep_house");
        assert_eq!(file_name(&naming), "traxsource_deep_house_2024-05-17.csv");

        let naming = NamingParams::new(Platform::Tracklists, "", date());
        assert_eq!(category_dir(&naming), "1001tracklists");
        assert_eq!(file_name(&naming), "1001tracklists_2024-05-17.csv");
    }

    #[test]
    fn csv_round_trip_preserves_values() {
        let root = TempDir::new().unwrap();
        let mut second = tricky_record();
        second.title = "Line One\nLine Two".to_string();
        second.artist = "Solomun, Adriatique".to_string();
        second.genre = "Deep House, \"Soulful\"".to_string();
        second.key = "A min".to_string();
        second.release_date = "2024-05-17".to_string();
        second.price = "$1,49".to_string();
        let set = assemble(Platform::Traxsource, vec![tricky_record(), second], 100);
        let naming = NamingParams::new(Platform::Traxsource, "deep-house", date());

        let artifact = export(&set, &naming, root.path()).unwrap();
        assert_eq!(artifact.record_count, 2);
        assert_eq!(
            artifact.download_url(),
            "/api/download/deep-house/traxsource_deep-house_2024-05-17.csv"
        );

        let mut reader = csv::Reader::from_path(&artifact.path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            Schema::TraxsourceChart.headers()
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), set.len());
        for (row, ranked) in rows.iter().zip(set.records()) {
            assert_eq!(row.len(), Schema::TraxsourceChart.columns().len());
            for (i, spec) in Schema::TraxsourceChart.columns().iter().enumerate() {
                assert_eq!(&row[i], ranked.value(spec.column).as_str(), "{}", spec.title);
            }
        }
        assert_eq!(&rows[1][1], "Line One\nLine Two");
    }

    #[test]
    fn empty_set_writes_header_only() {
        let root = TempDir::new().unwrap();
        let naming = NamingParams::new(Platform::Beatport, "techno", date());
        let artifact = export(&ResultSet::empty(Platform::Beatport), &naming, root.path()).unwrap();

        let content = fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("Position,Title,Artist,Remixer"));
    }

    #[test]
    fn same_day_export_overwrites() {
        let root = TempDir::new().unwrap();
        let naming = NamingParams::new(Platform::Traxsource, "house", date());
        let first = assemble(Platform::Traxsource, vec![tricky_record(), tricky_record()], 100);
        export(&first, &naming, root.path()).unwrap();
        let second = assemble(Platform::Traxsource, vec![tricky_record()], 100);
        let artifact = export(&second, &naming, root.path()).unwrap();

        let rows = csv::Reader::from_path(&artifact.path)
            .unwrap()
            .records()
            .count();
        assert_eq!(rows, 1);

        let leftovers: Vec<_> = fs::read_dir(root.path().join("house"))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, vec!["traxsource_house_2024-05-17.csv".to_string()]);
    }

    #[test]
    fn lists_and_resolves_exports() {
        let root = TempDir::new().unwrap();
        let set = assemble(Platform::Traxsource, vec![tricky_record()], 100);
        export(&set, &NamingParams::new(Platform::Traxsource, "house", date()), root.path()).unwrap();
        export(&set, &NamingParams::new(Platform::Traxsource, "techno", date()), root.path()).unwrap();

        assert_eq!(list_exports(root.path(), None).unwrap().len(), 2);
        let house = list_exports(root.path(), Some("house")).unwrap();
        assert_eq!(house.len(), 1);
        assert_eq!(house[0].file_name, "traxsource_house_2024-05-17.csv");

        let path =
            resolve_download(root.path(), "house", "traxsource_house_2024-05-17.csv").unwrap();
        assert!(path.is_file());
        assert!(list_exports(&root.path().join("missing"), None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn download_rejects_traversal() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            resolve_download(root.path(), "..", "passwd.csv"),
            Err(ScrapeError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolve_download(root.path(), "house", "../secret.csv"),
            Err(ScrapeError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolve_download(root.path(), "house", "notes.txt"),
            Err(ScrapeError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolve_download(root.path(), "house", "missing.csv"),
            Err(ScrapeError::NotFound(_))
        ));
    }
}
