use std::io::{Read, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::models::FoodEntry;

pub const HEADER: [&str; 7] = [
    "id",
    "date",
    "calories",
    "description",
    "createdAt",
    "sortOrder",
    "isFromPlaceholder",
];

/// Rows with fewer fields than this are ignored on import.
const MIN_FIELDS: usize = 5;

/// Write entries as CSV with a header row. Descriptions containing commas or
/// quotes are quoted, with inner quotes doubled.
pub fn write_entries<W: Write>(writer: W, entries: &[FoodEntry]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for entry in entries {
        wtr.write_record([
            entry.id.clone(),
            entry.date.format("%Y-%m-%d").to_string(),
            entry.calories.to_string(),
            entry.description.clone(),
            entry.created_at.to_string(),
            entry.sort_order.map(|s| s.to_string()).unwrap_or_default(),
            entry.is_from_placeholder.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse an entries CSV export. The first row is taken as the header.
///
/// Imported entries carry no calorie goal. An empty `sortOrder` is unset and
/// `isFromPlaceholder` is only true for the literal `true`.
pub fn parse_entries<R: Read>(reader: R) -> Result<Vec<FoodEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line_num, result) in rdr.records().enumerate() {
        let row = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {row}"))?;
        if record.len() < MIN_FIELDS {
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        let date = NaiveDate::parse_from_str(field(1), "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' on CSV row {row}", field(1)))?;
        let calories = field(2)
            .parse::<i64>()
            .with_context(|| format!("Invalid calories '{}' on CSV row {row}", field(2)))?;
        let created_at = field(4)
            .parse::<i64>()
            .with_context(|| format!("Invalid createdAt '{}' on CSV row {row}", field(4)))?;
        let sort_order = match field(5) {
            "" => None,
            s => Some(
                s.parse::<i64>()
                    .with_context(|| format!("Invalid sortOrder '{s}' on CSV row {row}"))?,
            ),
        };

        entries.push(FoodEntry {
            id: field(0).to_string(),
            date,
            calories,
            description: field(3).to_string(),
            created_at,
            sort_order,
            is_from_placeholder: field(6) == "true",
            calorie_goal: None,
        });
    }

    Ok(entries)
}
