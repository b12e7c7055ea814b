use anyhow::{Result, bail};

use calorie_core::models::{NewFoodEntry, validate_entry_calories};
use calorie_core::store::Store;

use super::helpers::{entry_calories, exit_not_found, parse_date, print_entry_table};

pub(crate) fn cmd_add(
    store: &Store,
    calories: i64,
    description: Option<String>,
    date: Option<String>,
    exercise: bool,
    servings: Option<f64>,
    json: bool,
) -> Result<()> {
    let calories = entry_calories(calories, servings, exercise)?;
    let date = parse_date(date)?;
    let description = description.unwrap_or_default().trim().to_string();

    let entry = store.log_entry(NewFoodEntry::new(date, calories, description))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = &entry.id;
        let label = if entry.description.is_empty() {
            "entry"
        } else {
            entry.description.as_str()
        };
        println!("Logged {label}: {calories} kcal on {date} [{id}]");
    }
    Ok(())
}

pub(crate) fn cmd_edit(
    store: &Store,
    id: &str,
    calories: Option<i64>,
    description: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if calories.is_none() && description.is_none() && date.is_none() {
        bail!("Nothing to update. Provide at least one of --calories, --description, or --date");
    }
    if let Some(c) = calories {
        validate_entry_calories(c)?;
    }
    let parsed_date = date.map(Some).map(parse_date).transpose()?;

    let entries = store.entries();
    let Some(mut entry) = entries.get_by_id(id)? else {
        exit_not_found(&format!("Entry {id} not found"), json);
    };

    if let Some(c) = calories {
        entry.calories = c;
    }
    if let Some(d) = description {
        entry.description = d.trim().to_string();
    }
    if let Some(d) = parsed_date {
        entry.date = d;
    }
    // A hand-edited entry no longer counts as placeholder-generated.
    entry.is_from_placeholder = false;

    let entry = entries.update(entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let cal = entry.calories;
        let day = entry.date;
        let description = &entry.description;
        println!("Updated entry {id}: {description} {cal} kcal on {day}");
    }
    Ok(())
}

pub(crate) fn cmd_delete(store: &Store, id: &str, json: bool) -> Result<()> {
    let entries = store.entries();
    if entries.get_by_id(id)?.is_none() {
        exit_not_found(&format!("Entry {id} not found"), json);
    }
    entries.delete(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted entry {id}");
    }
    Ok(())
}

pub(crate) fn cmd_reorder(store: &Store, date: &str, ids: &[String], json: bool) -> Result<()> {
    let date = parse_date(Some(date.to_string()))?;
    let entries = store.entries();

    // Unknown IDs are skipped by the table; IDs from another day are a mistake.
    for id in ids {
        if let Some(entry) = entries.get_by_id(id)? {
            if entry.date != date {
                bail!("Entry {id} is logged on {}, not {date}", entry.date);
            }
        }
    }

    entries.reorder(ids)?;
    let reordered = entries.get_by_date(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reordered)?);
    } else {
        print_entry_table(&reordered);
    }
    Ok(())
}
