use anyhow::Result;
use chrono::Local;
use tabled::{Table, Tabled, settings::Style};

use calorie_core::models::DaySummary;
use calorie_core::store::Store;

use super::helpers::{parse_date, print_entry_table, truncate};

pub(crate) fn cmd_day(store: &Store, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;

    // Only today is pre-filled; past and future days are shown as stored.
    if date == Local::now().date_naive() {
        let created = store.populate_day(date)?;
        if !created.is_empty() && !json {
            let count = created.len();
            eprintln!("Added {count} entries from placeholders");
        }
    }

    let summary = store.day_summary(date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_day(&summary);
    Ok(())
}

fn print_day(summary: &DaySummary) {
    let date = summary.date.format("%A %Y-%m-%d");
    println!("=== {date} ===\n");

    if summary.entries.is_empty() {
        println!("  No entries\n");
    } else {
        print_entry_table(&summary.entries);
        println!();
    }

    let total = summary.total_calories;
    let goal = summary.calorie_goal;
    let remaining = summary.remaining;
    println!("  TOTAL: {total} kcal");
    println!("  GOAL: {goal} kcal");
    if remaining >= 0 {
        println!("  REMAINING: {remaining} kcal");
    } else {
        let over = -remaining;
        println!("  OVER BY: {over} kcal");
    }
}

pub(crate) fn cmd_recent(store: &Store, json: bool) -> Result<()> {
    let recent = store.entries().get_recent()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(());
    }

    if recent.is_empty() {
        println!("No recent foods");
        return Ok(());
    }

    #[derive(Tabled)]
    struct RecentRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "kcal")]
        calories: i64,
        #[tabled(rename = "Last logged")]
        date: String,
    }

    let rows: Vec<RecentRow> = recent
        .iter()
        .enumerate()
        .map(|(i, e)| RecentRow {
            idx: i + 1,
            description: truncate(&e.description, 40),
            calories: e.calories,
            date: e.date.to_string(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}
