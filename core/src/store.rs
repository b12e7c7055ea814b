use std::cmp::Ordering;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::params;
use tracing::{debug, info};

use crate::db::Database;
use crate::entries::{FoodEntryTable, entry_order};
use crate::entry_csv;
use crate::models::{
    ClearSummary, DaySummary, FoodEntry, ImportSummary, NewFoodEntry, Settings, SettingsUpdate,
    timestamp_at,
};
use crate::placeholders::{PlaceholderTable, by_time_of_day, placeholder_table};

fn by_date_then_position(a: &FoodEntry, b: &FoodEntry) -> Ordering {
    a.date.cmp(&b.date).then_with(|| entry_order(a, b))
}

/// The single entry point for callers: owns the database handle and hands
/// out table views bound to it.
pub struct Store {
    db: Database,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path)?;
        info!(path = %path.display(), "Opened store");
        Ok(Self { db })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn entries(&self) -> FoodEntryTable<'_> {
        FoodEntryTable::new(self.db.conn())
    }

    pub fn placeholders(&self) -> PlaceholderTable<'_> {
        placeholder_table(self.db.conn())
    }

    // --- Settings ---

    pub fn get_settings(&self) -> Result<Settings> {
        self.db.get_settings()
    }

    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        self.update_settings_as_of(update, Local::now().date_naive())
    }

    /// Merges `update` into the stored settings. A supplied daily target is
    /// copied into the calorie goal of every entry dated `today` or later;
    /// earlier entries keep their goal.
    pub fn update_settings_as_of(
        &self,
        update: &SettingsUpdate,
        today: NaiveDate,
    ) -> Result<Settings> {
        let settings = self.db.get_settings()?.merged(update);
        let tx = self.db.conn().unchecked_transaction()?;
        self.db.put_settings(&settings)?;
        if let Some(target) = update.daily_calorie_target {
            let touched = tx.execute(
                "UPDATE entries SET calorie_goal = ?1 WHERE date >= ?2",
                params![target, today],
            )?;
            debug!(calorie_target = target, from = %today, touched, "Propagated calorie target");
        }
        tx.commit()?;
        Ok(settings)
    }

    // --- Entries ---

    /// Adds an entry, snapshotting the current daily target as its goal
    /// unless the draft already carries one.
    pub fn log_entry(&self, mut draft: NewFoodEntry) -> Result<FoodEntry> {
        if draft.calorie_goal.is_none() {
            draft.calorie_goal = Some(self.db.get_settings()?.daily_calorie_target);
        }
        self.entries().add(draft)
    }

    /// Fills an empty day with one entry per placeholder, earliest time of
    /// day first. Does nothing when the day already has entries or no
    /// placeholders exist. Either every entry is written or none is.
    pub fn populate_day(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        let entries = self.entries();
        if !entries.get_by_date(date)?.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = self.placeholders().get_all(Some(by_time_of_day))?;
        if placeholders.is_empty() {
            return Ok(Vec::new());
        }

        // Timestamps are resolved before any write so a bad time of day
        // leaves the day untouched. Equal times are spaced 1 ms apart.
        let mut stamped = Vec::with_capacity(placeholders.len());
        let mut last_created_at = i64::MIN;
        for placeholder in placeholders {
            let created_at =
                timestamp_at(date, &placeholder.time_of_day)?.max(last_created_at + 1);
            last_created_at = created_at;
            stamped.push((placeholder, created_at));
        }

        let target = self.db.get_settings()?.daily_calorie_target;
        let mut created = Vec::with_capacity(stamped.len());
        let tx = self.db.conn().unchecked_transaction()?;
        for (placeholder, created_at) in stamped {
            created.push(entries.add(NewFoodEntry {
                date,
                calories: placeholder.calories,
                description: placeholder.description,
                created_at,
                sort_order: None,
                is_from_placeholder: true,
                calorie_goal: Some(target),
            })?);
        }
        tx.commit()?;
        info!(date = %date, count = created.len(), "Populated day from placeholders");
        Ok(created)
    }

    /// The goal for `date`: the day's own snapshot, else the nearest later
    /// snapshot, else the current target.
    pub fn effective_goal(&self, date: NaiveDate) -> Result<i64> {
        let entries = self.entries();
        if let Some(goal) = entries
            .get_by_date(date)?
            .iter()
            .find_map(|e| e.calorie_goal)
        {
            return Ok(goal);
        }
        if let Some(goal) = entries
            .get_first_on_or_after_date(date)?
            .and_then(|e| e.calorie_goal)
        {
            return Ok(goal);
        }
        Ok(self.db.get_settings()?.daily_calorie_target)
    }

    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        let entries = self.entries().get_by_date(date)?;
        let total_calories = entries.iter().map(|e| e.calories).sum();
        let calorie_goal = self.effective_goal(date)?;
        Ok(DaySummary {
            date,
            entries,
            total_calories,
            calorie_goal,
            remaining: calorie_goal - total_calories,
        })
    }

    /// Deletes every entry and placeholder. Settings are kept.
    pub fn clear_all(&self) -> Result<ClearSummary> {
        let tx = self.db.conn().unchecked_transaction()?;
        let summary = ClearSummary {
            entries_deleted: self.entries().delete_all()?,
            placeholders_deleted: self.placeholders().delete_all()?,
        };
        tx.commit()?;
        info!(
            entries = summary.entries_deleted,
            placeholders = summary.placeholders_deleted,
            "Cleared all data"
        );
        Ok(summary)
    }

    // --- CSV ---

    /// Writes every entry, oldest day first. Returns the number written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.entries().get_all(Some(by_date_then_position))?;
        entry_csv::write_entries(writer, &entries)?;
        debug!(count = entries.len(), "Exported entries");
        Ok(entries.len())
    }

    /// Upserts every row by id: an existing entry is replaced in full, an
    /// unknown id is inserted as given. Nothing is written if any row fails
    /// to parse.
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<ImportSummary> {
        let parsed = entry_csv::parse_entries(reader)?;
        let entries = self.entries();
        let mut summary = ImportSummary::default();

        let tx = self.db.conn().unchecked_transaction()?;
        for entry in parsed {
            if entries.get_by_id(&entry.id)?.is_some() {
                summary.updated += 1;
            } else {
                summary.added += 1;
            }
            entries.update(entry)?;
        }
        tx.commit()?;

        debug!(
            added = summary.added,
            updated = summary.updated,
            "Imported entries"
        );
        Ok(summary)
    }
}
