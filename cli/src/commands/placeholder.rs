use anyhow::{Result, bail};

use calorie_core::models::{NewPlaceholder, validate_placeholder};
use calorie_core::store::Store;

use super::helpers::{exit_not_found, print_placeholder_table};

pub(crate) fn cmd_placeholder_add(
    store: &Store,
    description: &str,
    calories: i64,
    time: &str,
    json: bool,
) -> Result<()> {
    let description = description.trim();
    let time = time.trim();
    validate_placeholder(description, calories, time)?;

    let placeholder = store.placeholders().add(NewPlaceholder {
        description: description.to_string(),
        calories,
        time_of_day: time.to_string(),
        sort_order: None,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&placeholder)?);
    } else {
        let id = &placeholder.id;
        println!("Added placeholder {description} ({calories} kcal at {time}) [{id}]");
    }
    Ok(())
}

pub(crate) fn cmd_placeholder_list(store: &Store, json: bool) -> Result<()> {
    let placeholders = store.placeholders().get_all(None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&placeholders)?);
        return Ok(());
    }

    if placeholders.is_empty() {
        println!("No placeholders. Add one with:");
        println!("  calorie placeholder add <DESCRIPTION> <CALORIES> --time HH:MM");
        return Ok(());
    }

    print_placeholder_table(&placeholders);
    Ok(())
}

pub(crate) fn cmd_placeholder_edit(
    store: &Store,
    id: &str,
    description: Option<String>,
    calories: Option<i64>,
    time: Option<String>,
    json: bool,
) -> Result<()> {
    if description.is_none() && calories.is_none() && time.is_none() {
        bail!("Nothing to update. Provide at least one of --description, --calories, or --time");
    }

    let placeholders = store.placeholders();
    let Some(mut placeholder) = placeholders.get_by_id(id)? else {
        exit_not_found(&format!("Placeholder {id} not found"), json);
    };

    if let Some(d) = description {
        placeholder.description = d.trim().to_string();
    }
    if let Some(c) = calories {
        placeholder.calories = c;
    }
    if let Some(t) = time {
        placeholder.time_of_day = t.trim().to_string();
    }
    validate_placeholder(
        &placeholder.description,
        placeholder.calories,
        &placeholder.time_of_day,
    )?;

    let placeholder = placeholders.update(placeholder)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&placeholder)?);
    } else {
        let description = &placeholder.description;
        let cal = placeholder.calories;
        let time = &placeholder.time_of_day;
        println!("Updated placeholder {id}: {description} ({cal} kcal at {time})");
    }
    Ok(())
}

pub(crate) fn cmd_placeholder_delete(store: &Store, id: &str, json: bool) -> Result<()> {
    let placeholders = store.placeholders();
    if placeholders.get_by_id(id)?.is_none() {
        exit_not_found(&format!("Placeholder {id} not found"), json);
    }
    placeholders.delete(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted placeholder {id}");
    }
    Ok(())
}

pub(crate) fn cmd_placeholder_reorder(store: &Store, ids: &[String], json: bool) -> Result<()> {
    let placeholders = store.placeholders();
    placeholders.reorder(ids)?;
    let ordered = placeholders.get_all(None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ordered)?);
    } else {
        print_placeholder_table(&ordered);
    }
    Ok(())
}
