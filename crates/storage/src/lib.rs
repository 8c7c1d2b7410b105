//! Key/value persistence: the local-storage area shared by the reader's
//! state containers, backed by sqlite on disk or a map in memory.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;
use duoread_core::Settings;
use rusqlite::{Connection, OptionalExtension as _};

pub const THEME_KEY: &str = "theme";
pub const WORD_BOOK_KEY: &str = "my-word-book";
pub const SCROLL_POSITION_KEY: &str = "article-scroll-position";

/// String key/value store with the semantics of browser local storage.
pub trait LocalStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data_root TEXT NOT NULL,
                default_article TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, data_root, default_article)
            VALUES (1, '', 'intel-analysis');

            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT data_root, default_article FROM settings WHERE id = 1",
                [],
                |row| {
                    let data_root: String = row.get(0)?;
                    let default_article: String = row.get(1)?;
                    Ok((data_root, default_article))
                },
            )
            .optional()?;

        let mut settings = match row {
            Some((data_root, default_article)) => Settings {
                data_root,
                default_article,
            },
            None => Settings::default(),
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        self.conn.execute(
            "UPDATE settings SET data_root = ?, default_article = ? WHERE id = 1",
            (&settings.data_root, &settings.default_article),
        )?;
        Ok(())
    }
}

impl LocalStore for Storage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read local storage key {key}"))?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, unixepoch())
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                (key, value),
            )
            .with_context(|| format!("write local storage key {key}"))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?", [key])
            .with_context(|| format!("remove local storage key {key}"))?;
        Ok(())
    }
}

/// Non-persistent store, used when no database is available and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<BTreeMap<String, String>>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Makes every subsequent write fail, like a full quota.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

}

impl LocalStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.read_only.get() {
            anyhow::bail!("local storage quota exceeded while writing {key}");
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        if self.read_only.get() {
            anyhow::bail!("local storage is read-only, cannot remove {key}");
        }
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
