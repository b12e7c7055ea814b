use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Result, bail};
use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CALORIE_TARGET: i64 = 2000;

/// A single logged food or exercise record for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    pub id: String,
    pub date: NaiveDate,
    /// Negative for exercise (calories burned).
    pub calories: i64,
    pub description: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default)]
    pub is_from_placeholder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_goal: Option<i64>,
}

impl FoodEntry {
    /// Position within its date group: `sort_order`, or `created_at` when unset.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.sort_order.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct NewFoodEntry {
    pub date: NaiveDate,
    pub calories: i64,
    pub description: String,
    pub created_at: i64,
    pub sort_order: Option<i64>,
    pub is_from_placeholder: bool,
    pub calorie_goal: Option<i64>,
}

impl NewFoodEntry {
    /// A manual entry stamped with the current time.
    pub fn new(date: NaiveDate, calories: i64, description: impl Into<String>) -> Self {
        Self {
            date,
            calories,
            description: description.into(),
            created_at: now_millis(),
            sort_order: None,
            is_from_placeholder: false,
            calorie_goal: None,
        }
    }
}

/// A reusable meal template used to pre-fill an empty day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    pub id: String,
    pub description: String,
    pub calories: i64,
    /// `HH:MM`
    pub time_of_day: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewPlaceholder {
    pub description: String,
    pub calories: i64,
    pub time_of_day: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => bail!("Invalid theme '{s}'. Must be one of: light, dark, system"),
        }
    }
}

/// The singleton settings record. Missing fields take their defaults so
/// records written by older versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub daily_calorie_target: i64,
    pub theme: ThemeMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_calorie_target: DEFAULT_CALORIE_TARGET,
            theme: ThemeMode::System,
        }
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub daily_calorie_target: Option<i64>,
    pub theme: Option<ThemeMode>,
}

impl Settings {
    #[must_use]
    pub fn merged(&self, update: &SettingsUpdate) -> Settings {
        Settings {
            daily_calorie_target: update
                .daily_calorie_target
                .unwrap_or(self.daily_calorie_target),
            theme: update.theme.unwrap_or(self.theme),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<FoodEntry>,
    pub total_calories: i64,
    pub calorie_goal: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearSummary {
    pub entries_deleted: usize,
    pub placeholders_deleted: usize,
}

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Current time in epoch milliseconds, strictly increasing across calls
/// within this process.
pub fn now_millis() -> i64 {
    let now = Local::now().timestamp_millis();
    let prev = LAST_TIMESTAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1)
}

pub fn parse_time_of_day(time_of_day: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time_of_day.trim(), "%H:%M").map_err(|_| {
        anyhow::anyhow!("Invalid time of day '{time_of_day}'. Must be HH:MM (24-hour)")
    })
}

/// Epoch milliseconds for `time_of_day` on `date` in the local timezone.
pub fn timestamp_at(date: NaiveDate, time_of_day: &str) -> Result<i64> {
    let naive = date.and_time(parse_time_of_day(time_of_day)?);
    // Falls back to UTC when the local time does not exist (DST gap).
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc().timestamp_millis(), |dt| dt.timestamp_millis()))
}

// --- Validation (caller-side; the storage layer accepts any values) ---

pub fn validate_time_of_day(time_of_day: &str) -> Result<()> {
    parse_time_of_day(time_of_day).map(|_| ())
}

pub fn validate_entry_calories(calories: i64) -> Result<()> {
    if calories == 0 {
        bail!("Calories must be non-zero");
    }
    Ok(())
}

pub fn validate_calorie_target(target: i64) -> Result<()> {
    if target <= 0 {
        bail!("Daily calorie target must be a positive number");
    }
    Ok(())
}

pub fn validate_placeholder(description: &str, calories: i64, time_of_day: &str) -> Result<()> {
    if description.trim().is_empty() {
        bail!("Description is required");
    }
    if calories <= 0 {
        bail!("Calories must be a positive number");
    }
    validate_time_of_day(time_of_day)
}
