//! Fixture dataset validation.
//!
//! Decodes every boundary record in every fixture file and reports how many
//! survive, so malformed geometry is caught before an interactive session.

use std::fs;
use std::path::Path;

use geodrill::{decode, Level, RawRegionRecord};
use serde_json::Value;

use crate::error::CliError;

/// Run the inspect command.
pub fn run(fixtures: &Path) -> Result<(), CliError> {
    if !fixtures.is_dir() {
        return Err(CliError::Fixture(format!(
            "{} is not a directory",
            fixtures.display()
        )));
    }

    let mut files = 0usize;
    let mut total_ok = 0usize;
    let mut total_bad = 0usize;

    let mut entries: Vec<_> = fs::read_dir(fixtures)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let Some(level) = level_from_stem(stem) else {
            println!("skip  {} (unrecognized level prefix)", path.display());
            continue;
        };

        let text = fs::read_to_string(&path)?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| CliError::Fixture(format!("{}: {}", path.display(), e)))?;
        let boundaries = body.get("boundaries").cloned().unwrap_or(Value::Null);
        let records: Vec<RawRegionRecord> = serde_json::from_value(boundaries)
            .map_err(|e| CliError::Fixture(format!("{}: boundaries: {}", path.display(), e)))?;

        let mut ok = 0usize;
        let mut bad = 0usize;
        for record in &records {
            match decode(level, record) {
                Ok(_) => ok += 1,
                Err(e) => {
                    bad += 1;
                    println!("  bad record '{}' in {}: {}", record.code, path.display(), e);
                }
            }
        }

        println!(
            "ok    {} [{}] {} regions{}",
            path.display(),
            level,
            ok,
            if bad > 0 {
                format!(", {} rejected", bad)
            } else {
                String::new()
            }
        );
        files += 1;
        total_ok += ok;
        total_bad += bad;
    }

    if files == 0 {
        return Err(CliError::Fixture(format!(
            "no fixture files found in {}",
            fixtures.display()
        )));
    }

    println!(
        "{} files, {} regions decoded, {} rejected",
        files, total_ok, total_bad
    );
    Ok(())
}

/// Fixture files are named `<level>.json` or `<level>_<ancestors>.json`.
fn level_from_stem(stem: &str) -> Option<Level> {
    let prefix = stem.split('_').next().unwrap_or(stem);
    match prefix {
        "district" => Some(Level::District),
        "subdistrict" => Some(Level::Subdistrict),
        "block" => Some(Level::Block),
        "parcel" => Some(Level::Parcel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_stem_handles_scoped_names() {
        assert_eq!(level_from_stem("district"), Some(Level::District));
        assert_eq!(level_from_stem("subdistrict_10"), Some(Level::Subdistrict));
        assert_eq!(level_from_stem("parcel_10_S1_B1"), Some(Level::Parcel));
        assert_eq!(level_from_stem("notes"), None);
    }

    #[test]
    fn test_inspect_rejects_missing_directory() {
        let result = run(Path::new("/nonexistent/fixtures"));
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_counts_good_and_bad_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("district.json"),
            r#"{
                "boundaries": [
                    { "code": "10", "name": "Ten",
                      "geometry": { "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] } },
                    { "code": "20", "name": "NoGeometry" }
                ],
                "counts": []
            }"#,
        )
        .unwrap();

        assert!(run(dir.path()).is_ok());
    }
}
