use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use tracing::{debug, info, warn};

use crate::models::Settings;

/// Schema version this build reads and writes.
pub const SCHEMA_VERSION: i64 = 3;

const SETTINGS_KEY: &str = "user-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Uninitialized,
    Opening,
    Upgrading { from: i64, to: i64 },
    Ready,
}

struct Migration {
    version: i64,
    description: &'static str,
    apply: fn(&Transaction) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create entries and settings",
        apply: create_entries_and_settings,
    },
    Migration {
        version: 2,
        description: "create placeholders",
        apply: create_placeholders,
    },
    Migration {
        version: 3,
        description: "add calorie goal to entries",
        apply: add_entry_calorie_goal,
    },
];

fn create_entries_and_settings(tx: &Transaction) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            calories INTEGER NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            sort_order INTEGER,
            is_from_placeholder INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date);

        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn create_placeholders(tx: &Transaction) -> Result<()> {
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS placeholders (
            id TEXT PRIMARY KEY,
            description TEXT NOT NULL,
            calories INTEGER NOT NULL,
            time_of_day TEXT NOT NULL,
            sort_order INTEGER
        );",
    )?;
    Ok(())
}

/// Existing entries take the stored daily target (or the default) as their
/// goal.
fn add_entry_calorie_goal(tx: &Transaction) -> Result<()> {
    tx.execute_batch("ALTER TABLE entries ADD COLUMN calorie_goal INTEGER;")?;
    let target = read_settings(tx)?.daily_calorie_target;
    let backfilled = tx.execute(
        "UPDATE entries SET calorie_goal = ?1 WHERE calorie_goal IS NULL",
        params![target],
    )?;
    debug!(backfilled, calorie_target = target, "Backfilled entry calorie goals");
    Ok(())
}

fn read_settings(conn: &Connection) -> Result<Settings> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![SETTINGS_KEY],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        Some(json) => serde_json::from_str(&json).context("Failed to parse stored settings"),
        None => Ok(Settings::default()),
    }
}

fn user_version(conn: &Connection) -> Result<i64> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

pub struct Database {
    conn: Connection,
    state: SchemaState,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let mut db = Database {
            conn,
            state: SchemaState::Opening,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut db = Database {
            conn,
            state: SchemaState::Opening,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn migrate(&mut self) -> Result<()> {
        self.migrate_to(SCHEMA_VERSION)
    }

    /// Applies every pending migration up to `target` inside one immediate
    /// transaction. Either all steps land or none do; after a failure the
    /// handle is `Uninitialized` and the stored version is unchanged.
    pub fn migrate_to(&mut self, target: i64) -> Result<()> {
        let current = user_version(&self.conn)?;
        if current > SCHEMA_VERSION {
            warn!(
                stored = current,
                supported = SCHEMA_VERSION,
                "Database schema is newer than this build"
            );
            bail!(
                "Database schema version {current} is newer than this build supports \
                 ({SCHEMA_VERSION}). Close this copy and use the newer version."
            );
        }
        if target > SCHEMA_VERSION {
            bail!("Unknown schema version {target}");
        }
        if current >= target {
            self.state = SchemaState::Ready;
            return Ok(());
        }

        info!(from = current, to = target, "Upgrading database schema");
        if let Err(e) = self.apply_migrations(current, target) {
            self.state = SchemaState::Uninitialized;
            return Err(e);
        }
        self.state = SchemaState::Ready;
        Ok(())
    }

    /// One version step at a time; the state tracks the step in progress.
    fn apply_migrations(&mut self, current: i64, target: i64) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for migration in MIGRATIONS
            .iter()
            .filter(|m| m.version > current && m.version <= target)
        {
            self.state = SchemaState::Upgrading {
                from: migration.version - 1,
                to: migration.version,
            };
            debug!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );
            (migration.apply)(&tx).with_context(|| {
                format!(
                    "Migration to version {} ({}) failed",
                    migration.version, migration.description
                )
            })?;
            tx.pragma_update(None, "user_version", migration.version)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn state(&self) -> SchemaState {
        self.state
    }

    pub fn schema_version(&self) -> Result<i64> {
        user_version(&self.conn)
    }

    /// True once another process has moved the file to a newer schema than
    /// this handle understands. Nothing checks this automatically: a
    /// long-lived caller polls it and drops a stale handle, then reopens
    /// (which fails until this build is upgraded).
    pub fn is_stale(&self) -> Result<bool> {
        Ok(self.schema_version()? > SCHEMA_VERSION)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Settings ---

    pub fn get_settings(&self) -> Result<Settings> {
        read_settings(&self.conn)
    }

    pub fn put_settings(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![SETTINGS_KEY, json],
        )?;
        Ok(())
    }
}
