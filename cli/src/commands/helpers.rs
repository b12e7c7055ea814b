use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use calorie_core::models::{FoodEntry, Placeholder, validate_entry_calories};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Calories to store for an entry: per-serving calories times `servings`
/// (rounded), negated when the entry is exercise.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn entry_calories(calories: i64, servings: Option<f64>, exercise: bool) -> Result<i64> {
    let total = match servings {
        Some(s) if s <= 0.0 || !s.is_finite() => bail!("Servings must be greater than 0"),
        Some(s) => (calories as f64 * s).round() as i64,
        None => calories,
    };
    let total = if exercise { -total.abs() } else { total };
    validate_entry_calories(total)?;
    Ok(total)
}

pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let Some(line) = stdin.lock().lines().next() else {
        return Ok(false);
    };
    let answer = line?.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Report a missing record and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

fn format_time(created_at: i64) -> String {
    DateTime::from_timestamp_millis(created_at).map_or_else(
        || "-".to_string(),
        |dt| dt.with_timezone(&Local).format("%H:%M").to_string(),
    )
}

pub(crate) fn print_entry_table(entries: &[FoodEntry]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "kcal")]
        calories: i64,
        #[tabled(rename = "")]
        origin: &'static str,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| EntryRow {
            idx: i + 1,
            id: e.id.clone(),
            time: format_time(e.created_at),
            description: truncate(&e.description, 35),
            calories: e.calories,
            origin: if e.is_from_placeholder {
                "placeholder"
            } else {
                ""
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_placeholder_table(placeholders: &[Placeholder]) {
    #[derive(Tabled)]
    struct PlaceholderRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Time")]
        time: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "kcal")]
        calories: i64,
    }

    let rows: Vec<PlaceholderRow> = placeholders
        .iter()
        .enumerate()
        .map(|(i, p)| PlaceholderRow {
            idx: i + 1,
            id: p.id.clone(),
            time: p.time_of_day.clone(),
            description: truncate(&p.description, 35),
            calories: p.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_entry_calories_plain() {
        assert_eq!(entry_calories(250, None, false).unwrap(), 250);
    }

    #[test]
    fn test_entry_calories_servings_rounded() {
        assert_eq!(entry_calories(150, Some(1.5), false).unwrap(), 225);
        assert_eq!(entry_calories(105, Some(0.5), false).unwrap(), 53);
    }

    #[test]
    fn test_entry_calories_exercise_negates() {
        assert_eq!(entry_calories(300, None, true).unwrap(), -300);
        assert_eq!(entry_calories(-300, None, true).unwrap(), -300);
        assert_eq!(entry_calories(100, Some(2.0), true).unwrap(), -200);
    }

    #[test]
    fn test_entry_calories_invalid() {
        assert!(entry_calories(0, None, false).is_err());
        assert!(entry_calories(100, Some(0.0), false).is_err());
        assert!(entry_calories(100, Some(-1.0), false).is_err());
        assert!(entry_calories(1, Some(0.1), false).is_err());
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("Entry x not found"), r#"{"error":"Entry x not found"}"#);
        assert_eq!(json_error(r#"bad "id""#), r#"{"error":"bad \"id\""}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }
}
