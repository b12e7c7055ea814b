use std::cmp::Ordering;

use anyhow::{Result, bail};
use rusqlite::types::Value;
use rusqlite::{Connection, ToSql, params, params_from_iter};
use tracing::debug;
use uuid::Uuid;

/// Ordering applied to records read from a table.
pub type Comparator<R> = fn(&R, &R) -> Ordering;

/// A record type stored in its own table, keyed by a string identifier in
/// the first column.
pub trait Record: Sized {
    /// The record as supplied by callers before an identifier is assigned.
    type Draft;

    const TABLE: &'static str;
    /// Column names in storage order; `id` comes first.
    const COLUMNS: &'static [&'static str];
    /// Columns that may be queried with [`Table::get_all_by_index`].
    const INDEXES: &'static [&'static str];

    fn from_draft(id: String, draft: Self::Draft) -> Self;
    fn id(&self) -> &str;
    fn sort_order(&self) -> Option<i64>;
    fn set_sort_order(&mut self, sort_order: i64);
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>;
    /// Column values in [`Record::COLUMNS`] order.
    fn to_values(&self) -> Vec<Value>;
}

pub struct Table<'db, R: Record> {
    conn: &'db Connection,
    default_order: Option<Comparator<R>>,
}

impl<'db, R: Record> Table<'db, R> {
    pub fn new(conn: &'db Connection, default_order: Option<Comparator<R>>) -> Self {
        Self {
            conn,
            default_order,
        }
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT {} FROM {} {filter}",
            R::COLUMNS.join(", "),
            R::TABLE
        )
    }

    fn sorted(&self, mut records: Vec<R>, order: Option<Comparator<R>>) -> Vec<R> {
        if let Some(cmp) = order.or(self.default_order) {
            records.sort_by(cmp);
        }
        records
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<R>> {
        let mut stmt = conn.prepare(&Self::select_sql("WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(R::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    fn write(conn: &Connection, record: &R) -> Result<()> {
        let placeholders = (1..=R::COLUMNS.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
                R::TABLE,
                R::COLUMNS.join(", ")
            ),
            params_from_iter(record.to_values()),
        )?;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<R>> {
        Self::fetch(self.conn, id)
    }

    /// All records, sorted by `order` or else the table default. Unordered
    /// when neither is set.
    pub fn get_all(&self, order: Option<Comparator<R>>) -> Result<Vec<R>> {
        let mut stmt = self.conn.prepare(&Self::select_sql(""))?;
        let records = stmt
            .query_map([], R::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.sorted(records, order))
    }

    /// Records whose indexed `field` equals `value` exactly.
    pub fn get_all_by_index(
        &self,
        field: &str,
        value: &dyn ToSql,
        order: Option<Comparator<R>>,
    ) -> Result<Vec<R>> {
        if !R::INDEXES.contains(&field) {
            bail!("'{field}' is not an indexed field of {}", R::TABLE);
        }
        let mut stmt = self
            .conn
            .prepare(&Self::select_sql(&format!("WHERE {field} = ?1")))?;
        let records = stmt
            .query_map([value], R::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.sorted(records, order))
    }

    pub fn count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", R::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Inserts a new record under a fresh identifier. A record without a sort
    /// order is appended after the current records.
    pub fn add(&self, draft: R::Draft) -> Result<R> {
        let id = Uuid::new_v4().to_string();
        let mut record = R::from_draft(id, draft);
        if record.sort_order().is_none() {
            record.set_sort_order(self.count()?);
        }
        debug!(table = R::TABLE, id = %record.id(), "Inserting record");
        Self::write(self.conn, &record)?;
        Ok(record)
    }

    /// Stores `record` in full under its identifier, replacing any existing
    /// record with that identifier.
    pub fn update(&self, record: R) -> Result<R> {
        debug!(table = R::TABLE, id = %record.id(), "Replacing record");
        Self::write(self.conn, &record)?;
        Ok(record)
    }

    /// Deleting an unknown identifier is a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        let rows = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", R::TABLE),
            params![id],
        )?;
        debug!(table = R::TABLE, id = %id, deleted = rows > 0, "Deleting record");
        Ok(())
    }

    pub fn delete_all(&self) -> Result<usize> {
        let rows = self
            .conn
            .execute(&format!("DELETE FROM {}", R::TABLE), [])?;
        debug!(table = R::TABLE, count = rows, "Deleting all records");
        Ok(rows)
    }

    /// Assigns sort order `i` to the record at position `i` of `ordered_ids`.
    /// Unknown identifiers are skipped. All writes commit together.
    #[allow(clippy::cast_possible_wrap)]
    pub fn reorder<S: AsRef<str>>(&self, ordered_ids: &[S]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let mut moved = 0usize;
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(mut record) = Self::fetch(&tx, id.as_ref())? {
                record.set_sort_order(position as i64);
                Self::write(&tx, &record)?;
                moved += 1;
            }
        }
        tx.commit()?;
        debug!(
            table = R::TABLE,
            requested = ordered_ids.len(),
            moved,
            "Reordered records"
        );
        Ok(())
    }
}
