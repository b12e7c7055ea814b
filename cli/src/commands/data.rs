use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use calorie_core::store::Store;

use super::helpers::prompt_confirm;

pub(crate) fn cmd_export(store: &Store, output: Option<&Path>, json: bool) -> Result<()> {
    let Some(path) = output else {
        store.export_csv(io::stdout().lock())?;
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let count = store.export_csv(BufWriter::new(file))?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": count, "path": path.display().to_string() })
        );
    } else {
        println!("Exported {count} entries to {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_import(store: &Store, file: &Path, json: bool) -> Result<()> {
    let reader = File::open(file)
        .with_context(|| format!("Failed to open import file: {}", file.display()))?;
    let summary = store.import_csv(BufReader::new(reader))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let added = summary.added;
        let updated = summary.updated;
        println!("Imported {added} new and {updated} updated entries");
    }
    Ok(())
}

pub(crate) fn cmd_clear(store: &Store, yes: bool, json: bool) -> Result<()> {
    if !yes {
        if json {
            bail!("Refusing to clear data without --yes");
        }
        if !prompt_confirm("Delete ALL entries and placeholders? This cannot be undone.")? {
            println!("Aborted");
            return Ok(());
        }
    }

    let summary = store.clear_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let entries = summary.entries_deleted;
        let placeholders = summary.placeholders_deleted;
        println!("Deleted {entries} entries and {placeholders} placeholders");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calorie_core::models::NewFoodEntry;
    use chrono::NaiveDate;

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.csv");
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        let source = Store::open_in_memory().unwrap();
        let entry = source
            .log_entry(NewFoodEntry::new(date, 420, "Pasta, pesto"))
            .unwrap();
        cmd_export(&source, Some(&path), false).unwrap();

        let target = Store::open(&dir.path().join("target.db")).unwrap();
        cmd_import(&target, &path, true).unwrap();

        let imported = target.entries().get_by_id(&entry.id).unwrap().unwrap();
        assert_eq!(imported.description, "Pasta, pesto");
        assert_eq!(imported.calories, 420);
    }

    #[test]
    fn test_import_missing_file() {
        let store = Store::open_in_memory().unwrap();
        let err = cmd_import(&store, Path::new("/nonexistent/entries.csv"), false).unwrap_err();
        assert!(err.to_string().contains("Failed to open import file"));
    }

    #[test]
    fn test_clear_json_requires_yes() {
        let store = Store::open_in_memory().unwrap();
        assert!(cmd_clear(&store, false, true).is_err());
        cmd_clear(&store, true, true).unwrap();
    }
}
