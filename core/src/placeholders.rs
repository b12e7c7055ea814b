use std::cmp::Ordering;

use rusqlite::Connection;
use rusqlite::types::Value;

use crate::models::{NewPlaceholder, Placeholder};
use crate::table::{Record, Table};

pub type PlaceholderTable<'db> = Table<'db, Placeholder>;

impl Record for Placeholder {
    type Draft = NewPlaceholder;

    const TABLE: &'static str = "placeholders";
    const COLUMNS: &'static [&'static str] =
        &["id", "description", "calories", "time_of_day", "sort_order"];
    const INDEXES: &'static [&'static str] = &[];

    fn from_draft(id: String, draft: NewPlaceholder) -> Self {
        Placeholder {
            id,
            description: draft.description,
            calories: draft.calories,
            time_of_day: draft.time_of_day,
            sort_order: draft.sort_order,
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
        Ok(Placeholder {
            id: row.get(0)?,
            description: row.get(1)?,
            calories: row.get(2)?,
            time_of_day: row.get(3)?,
            sort_order: row.get(4)?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.id.clone()),
            Value::Text(self.description.clone()),
            Value::Integer(self.calories),
            Value::Text(self.time_of_day.clone()),
            self.sort_order.map_or(Value::Null, Value::Integer),
        ]
    }
}

fn by_sort_order(a: &Placeholder, b: &Placeholder) -> Ordering {
    a.sort_order.unwrap_or(0).cmp(&b.sort_order.unwrap_or(0))
}

/// Placeholder table ordered by ascending sort order (unset counts as 0).
pub fn placeholder_table(conn: &Connection) -> PlaceholderTable<'_> {
    Table::new(conn, Some(by_sort_order))
}

/// Display and scheduling order: earliest time of day first.
pub fn by_time_of_day(a: &Placeholder, b: &Placeholder) -> Ordering {
    a.time_of_day.cmp(&b.time_of_day)
}
