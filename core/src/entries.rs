use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, params};

use crate::models::{FoodEntry, NewFoodEntry};
use crate::table::{Comparator, Record, Table};

/// Maximum number of candidates returned by [`FoodEntryTable::get_recent`].
pub const RECENT_LIMIT: usize = 100;

impl Record for FoodEntry {
    type Draft = NewFoodEntry;

    const TABLE: &'static str = "entries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "date",
        "calories",
        "description",
        "created_at",
        "sort_order",
        "is_from_placeholder",
        "calorie_goal",
    ];
    const INDEXES: &'static [&'static str] = &["date"];

    fn from_draft(id: String, draft: NewFoodEntry) -> Self {
        FoodEntry {
            id,
            date: draft.date,
            calories: draft.calories,
            description: draft.description,
            created_at: draft.created_at,
            sort_order: draft.sort_order,
            is_from_placeholder: draft.is_from_placeholder,
            calorie_goal: draft.calorie_goal,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> Option<i64> {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: i64) {
        self.sort_order = Some(sort_order);
    }

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(FoodEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            calories: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            sort_order: row.get(5)?,
            is_from_placeholder: row.get(6)?,
            calorie_goal: row.get(7)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.clone()),
            Value::Text(self.date.format("%Y-%m-%d").to_string()),
            Value::Integer(self.calories),
            Value::Text(self.description.clone()),
            Value::Integer(self.created_at),
            self.sort_order.map_or(Value::Null, Value::Integer),
            Value::Integer(i64::from(self.is_from_placeholder)),
            self.calorie_goal.map_or(Value::Null, Value::Integer),
        ]
    }
}

/// Within-day order: sort order (falling back to creation time), then
/// creation time.
pub fn entry_order(a: &FoodEntry, b: &FoodEntry) -> Ordering {
    a.position()
        .cmp(&b.position())
        .then(a.created_at.cmp(&b.created_at))
}

pub struct FoodEntryTable<'db> {
    table: Table<'db, FoodEntry>,
    conn: &'db Connection,
}

impl<'db> FoodEntryTable<'db> {
    pub fn new(conn: &'db Connection) -> Self {
        Self {
            table: Table::new(conn, Some(entry_order)),
            conn,
        }
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<FoodEntry>> {
        self.table.get_by_id(id)
    }

    pub fn get_all(&self, order: Option<Comparator<FoodEntry>>) -> Result<Vec<FoodEntry>> {
        self.table.get_all(order)
    }

    /// Entries default to creation-time order: an unset sort order becomes
    /// the entry's `created_at`.
    pub fn add(&self, mut draft: NewFoodEntry) -> Result<FoodEntry> {
        draft.sort_order = draft.sort_order.or(Some(draft.created_at));
        self.table.add(draft)
    }

    pub fn update(&self, entry: FoodEntry) -> Result<FoodEntry> {
        self.table.update(entry)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.table.delete(id)
    }

    pub fn delete_all(&self) -> Result<usize> {
        self.table.delete_all()
    }

    pub fn reorder<S: AsRef<str>>(&self, ordered_ids: &[S]) -> Result<()> {
        self.table.reorder(ordered_ids)
    }

    pub fn get_by_date(&self, date: NaiveDate) -> Result<Vec<FoodEntry>> {
        self.table.get_all_by_index("date", &date, None)
    }

    /// Recently logged distinct foods, newest first. Entries without a
    /// description and placeholder-generated entries are left out; entries
    /// sharing a lower-cased description and exact calories collapse to the
    /// newest one.
    pub fn get_recent(&self) -> Result<Vec<FoodEntry>> {
        let mut latest: HashMap<(String, i64), FoodEntry> = HashMap::new();
        for entry in self.table.get_all(None)? {
            if entry.is_from_placeholder || entry.description.trim().is_empty() {
                continue;
            }
            let key = (entry.description.to_lowercase(), entry.calories);
            match latest.get(&key) {
                Some(existing) if existing.created_at >= entry.created_at => {}
                _ => {
                    latest.insert(key, entry);
                }
            }
        }

        let mut recent: Vec<FoodEntry> = latest.into_values().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_LIMIT);
        Ok(recent)
    }

    /// The earliest-dated entry on or after `date` that carries a calorie
    /// goal; ties go to the earliest created.
    pub fn get_first_on_or_after_date(&self, date: NaiveDate) -> Result<Option<FoodEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entries
             WHERE calorie_goal IS NOT NULL AND date >= ?1
             ORDER BY date, created_at
             LIMIT 1",
            FoodEntry::COLUMNS.join(", ")
        ))?;
        let mut rows = stmt.query(params![date])?;
        if let Some(row) = rows.next()? {
            Ok(Some(FoodEntry::from_row(row)?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn entry(date: NaiveDate, calories: i64, description: &str, created_at: i64) -> NewFoodEntry {
        NewFoodEntry {
            date,
            calories,
            description: description.to_string(),
            created_at,
            sort_order: None,
            is_from_placeholder: false,
            calorie_goal: None,
        }
    }

    fn descriptions(entries: &[FoodEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.description.as_str()).collect()
    }

    #[test]
    fn test_add_and_get_by_date() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let added = entries
            .add(NewFoodEntry::new(day(15), 500, "Lunch"))
            .unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, added.id);
        assert_eq!(found[0].calories, 500);

        entries.delete(&added.id).unwrap();
        assert!(entries.get_by_date(day(15)).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_date_empty() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        assert!(entries.get_by_date(day(15)).unwrap().is_empty());
    }

    #[test]
    fn test_get_by_date_only_that_date() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(15), 500, "Day 1", 1000)).unwrap();
        entries.add(entry(day(16), 300, "Day 2", 2000)).unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["Day 1"]);
    }

    #[test]
    fn test_add_defaults_sort_order_to_created_at() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let added = entries.add(entry(day(15), 500, "Lunch", 123_456)).unwrap();
        assert_eq!(added.sort_order, Some(123_456));

        let mut explicit = entry(day(15), 500, "Dinner", 999);
        explicit.sort_order = Some(7);
        assert_eq!(entries.add(explicit).unwrap().sort_order, Some(7));
    }

    #[test]
    fn test_get_by_date_sorted_by_created_at() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(15), 200, "Snack", 3000)).unwrap();
        entries.add(entry(day(15), 500, "Breakfast", 1000)).unwrap();
        entries.add(entry(day(15), 800, "Lunch", 2000)).unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["Breakfast", "Lunch", "Snack"]);
    }

    #[test]
    fn test_get_by_date_explicit_sort_order_with_ties() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        for (description, sort_order, created_at) in
            [("C", 2, 100), ("B", 1, 300), ("A", 1, 200), ("D", 5, 50)]
        {
            let mut draft = entry(day(15), 100, description, created_at);
            draft.sort_order = Some(sort_order);
            entries.add(draft).unwrap();
        }

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_unset_sort_order_falls_back_to_created_at() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let mut first = entries.add(entry(day(15), 100, "First", 10)).unwrap();
        entries.add(entry(day(15), 100, "Second", 20)).unwrap();
        first.sort_order = None;
        first.created_at = 30;
        entries.update(first).unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["Second", "First"]);
    }

    #[test]
    fn test_reorder_entries() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let a = entries.add(entry(day(15), 100, "a", 1000)).unwrap();
        let b = entries.add(entry(day(15), 100, "b", 2000)).unwrap();
        let c = entries.add(entry(day(15), 100, "c", 3000)).unwrap();

        entries.reorder(&[&c.id, &a.id, &b.id]).unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["c", "a", "b"]);
        let orders: Vec<Option<i64>> = found.iter().map(|e| e.sort_order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_reorder_with_unknown_id_does_not_fail() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let a = entries.add(entry(day(15), 100, "a", 1000)).unwrap();
        let b = entries.add(entry(day(15), 100, "b", 2000)).unwrap();

        entries
            .reorder(&[b.id.as_str(), a.id.as_str(), "missing"])
            .unwrap();

        let found = entries.get_by_date(day(15)).unwrap();
        assert_eq!(descriptions(&found), vec!["b", "a"]);
        assert_eq!(found[0].sort_order, Some(0));
        assert_eq!(found[1].sort_order, Some(1));
    }

    #[test]
    fn test_update_replaces_fields() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let added = entries.add(entry(day(15), 500, "Lunch", 1000)).unwrap();
        entries
            .update(FoodEntry {
                calories: 600,
                description: "Big lunch".to_string(),
                ..added.clone()
            })
            .unwrap();

        let found = entries.get_by_id(&added.id).unwrap().unwrap();
        assert_eq!(found.calories, 600);
        assert_eq!(found.description, "Big lunch");
    }

    #[test]
    fn test_negative_calories_stored() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let run = entries.add(entry(day(15), -300, "Morning run", 1000)).unwrap();
        assert_eq!(entries.get_by_id(&run.id).unwrap().unwrap().calories, -300);
    }

    #[test]
    fn test_recent_empty() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        assert!(entries.get_recent().unwrap().is_empty());
    }

    #[test]
    fn test_recent_dedup_ignores_case() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(14), 300, "Oatmeal", 1000)).unwrap();
        let newer = entries.add(entry(day(15), 300, "oatmeal", 2000)).unwrap();

        let recent = entries.get_recent().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, newer.id);
    }

    #[test]
    fn test_recent_keeps_newest_regardless_of_insert_order() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let newer = entries.add(entry(day(15), 300, "Oatmeal", 5000)).unwrap();
        entries.add(entry(day(14), 300, "OATMEAL", 1000)).unwrap();

        let recent = entries.get_recent().unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, newer.id);
    }

    #[test]
    fn test_recent_different_calories_are_distinct() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(15), 300, "Oatmeal", 1000)).unwrap();
        entries.add(entry(day(15), 450, "Oatmeal", 2000)).unwrap();

        let recent = entries.get_recent().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].calories, 450);
        assert_eq!(recent[1].calories, 300);
    }

    #[test]
    fn test_recent_excludes_placeholder_and_blank_entries() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(15), 300, "", 1000)).unwrap();
        entries.add(entry(day(15), 300, "   ", 2000)).unwrap();
        let mut from_placeholder = entry(day(15), 400, "Breakfast", 3000);
        from_placeholder.is_from_placeholder = true;
        entries.add(from_placeholder).unwrap();
        entries.add(entry(day(15), 250, "Apple", 4000)).unwrap();

        let recent = entries.get_recent().unwrap();
        assert_eq!(descriptions(&recent), vec!["Apple"]);
    }

    #[test]
    fn test_recent_sorted_newest_first_and_limited() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        for i in 0..120 {
            entries
                .add(entry(day(15), 100, &format!("Food {i}"), 1000 + i))
                .unwrap();
        }

        let recent = entries.get_recent().unwrap();
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].description, "Food 119");
        assert_eq!(recent[99].description, "Food 20");
    }

    #[test]
    fn test_first_on_or_after_date_none_without_goals() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        entries.add(entry(day(20), 100, "No goal", 1000)).unwrap();
        let mut past = entry(day(5), 100, "Past", 2000);
        past.calorie_goal = Some(1800);
        entries.add(past).unwrap();

        assert!(entries.get_first_on_or_after_date(day(10)).unwrap().is_none());
    }

    #[test]
    fn test_first_on_or_after_date_picks_earliest() {
        let db = Database::open_in_memory().unwrap();
        let entries = FoodEntryTable::new(db.conn());
        let seeded = [
            (25, 10, 2200),
            (18, 300, 1900),
            (18, 200, 1700),
            (12, 5, 1600),
        ];
        for (d, created_at, goal) in seeded {
            let mut draft = entry(day(d), 100, "Meal", created_at);
            draft.calorie_goal = Some(goal);
            entries.add(draft).unwrap();
        }
        entries.add(entry(day(16), 100, "No goal", 1)).unwrap();

        let found = entries.get_first_on_or_after_date(day(15)).unwrap().unwrap();
        assert_eq!(found.date, day(18));
        assert_eq!(found.created_at, 200);
        assert_eq!(found.calorie_goal, Some(1700));

        let same_day = entries.get_first_on_or_after_date(day(12)).unwrap().unwrap();
        assert_eq!(same_day.calorie_goal, Some(1600));
    }
}
