// src/storage/sqlite.rs
// =============================================================================
// SQLite-backed page storage.
//
// Schema: one table, the URL is the primary key. Inserts use
// INSERT OR IGNORE, so a second write for the same URL is a no-op and the
// first writer's row is kept as-is.
//
// The list filter compares through `unicode_lower`, a SQL function backed
// by Rust's `str::to_lowercase`. SQLite's own LIKE/lower() only fold ASCII,
// so "über" would not find "Über Uns" with them.
//
// rusqlite is a blocking API. Every call runs on tokio's blocking thread
// pool so a slow disk never stalls the async workers.
// =============================================================================

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{PageRecord, PageStore, PageSummary, StoreError};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS pages (
        url        TEXT PRIMARY KEY,
        title      TEXT,
        html       TEXT NOT NULL,
        fetched_at TEXT NOT NULL
    );
"#;

/// Page store backed by a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    // Opens (or creates) the database file and makes sure the table exists
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened page database");
        Self::with_connection(conn)
    }

    // Private in-memory database, gone when the store is dropped
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        register_unicode_lower(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Runs a closure against the connection on the blocking pool
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&conn).map_err(StoreError::from)
        })
        .await?
    }
}

#[async_trait]
impl PageStore for SqliteStore {
    async fn insert_if_absent(&self, record: &PageRecord) -> Result<bool, StoreError> {
        let record = record.clone();

        let inserted = self
            .run(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO pages (url, title, html, fetched_at) VALUES (?1, ?2, ?3, ?4)",
                    params![record.url, record.title, record.html, record.fetched_at],
                )
            })
            .await?;

        Ok(inserted > 0)
    }

    async fn list(&self, filter: Option<&str>) -> Result<Vec<PageSummary>, StoreError> {
        let needle = filter.filter(|q| !q.is_empty()).map(str::to_lowercase);

        self.run(move |conn| {
            let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<PageSummary> {
                Ok(PageSummary {
                    url: row.get(0)?,
                    title: row.get(1)?,
                })
            };

            // instr() is a plain substring search, so '%' and '_' need no escaping
            match needle {
                Some(needle) => {
                    let mut stmt = conn.prepare(
                        "SELECT url, title FROM pages
                         WHERE instr(unicode_lower(url), ?1) > 0
                            OR instr(unicode_lower(title), ?1) > 0
                         ORDER BY url",
                    )?;
                    let rows = stmt.query_map(params![needle], map_row)?;
                    rows.collect()
                }
                None => {
                    let mut stmt = conn.prepare("SELECT url, title FROM pages ORDER BY url")?;
                    let rows = stmt.query_map([], map_row)?;
                    rows.collect()
                }
            }
        })
        .await
    }

    async fn get(&self, url: &str) -> Result<Option<PageRecord>, StoreError> {
        let url = url.to_string();

        self.run(move |conn| {
            conn.query_row(
                "SELECT url, title, html, fetched_at FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok(PageRecord {
                        url: row.get(0)?,
                        title: row.get(1)?,
                        html: row.get(2)?,
                        fetched_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .run(|conn| conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0)))
            .await?;

        Ok(count as usize)
    }
}

// unicode_lower(text) -> text, NULL stays NULL
fn register_unicode_lower(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|text| text.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, title: Option<&str>, html: &str) -> PageRecord {
        PageRecord::new(url.to_string(), title.map(str::to_string), html.to_string())
    }

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        for page in [
            record("http://a.test/", Some("Home Page"), "<p>home</p>"),
            record("http://a.test/blog", Some("Rust Notes"), "<p>blog</p>"),
            record("http://a.test/100%25", None, "<p>percent</p>"),
        ] {
            assert!(store.insert_if_absent(&page).await.unwrap());
        }
        store
    }

    #[tokio::test]
    async fn test_first_writer_wins() {
        let store = SqliteStore::in_memory().unwrap();

        let first = record("http://a.test/", Some("First"), "<p>first</p>");
        let second = record("http://a.test/", Some("Second"), "<p>second</p>");

        assert!(store.insert_if_absent(&first).await.unwrap());
        assert!(!store.insert_if_absent(&second).await.unwrap());

        let stored = store.get("http://a.test/").await.unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("First"));
        assert_eq!(stored.html, "<p>first</p>");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers_store_one_record() {
        let store = SqliteStore::in_memory().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let page = record("http://a.test/race", None, &format!("<p>{i}</p>"));
                    store.insert_if_absent(&page).await.unwrap()
                })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_all_is_ordered_by_url() {
        let store = seeded_store().await;
        let urls: Vec<_> = store
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|page| page.url)
            .collect();

        assert_eq!(
            urls,
            vec!["http://a.test/", "http://a.test/100%25", "http://a.test/blog"]
        );
    }

    #[tokio::test]
    async fn test_list_filter_matches_title_case_insensitively() {
        let store = seeded_store().await;
        let pages = store.list(Some("rust")).await.unwrap();

        assert_eq!(
            pages,
            vec![PageSummary {
                url: "http://a.test/blog".to_string(),
                title: Some("Rust Notes".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_list_filter_matches_url() {
        let store = seeded_store().await;
        let pages = store.list(Some("BLOG")).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "http://a.test/blog");
    }

    #[tokio::test]
    async fn test_list_filter_treats_wildcards_literally() {
        let store = seeded_store().await;

        let pages = store.list(Some("%")).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].url, "http://a.test/100%25");

        assert!(store.list(Some("_")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_filter_lists_everything() {
        let store = seeded_store().await;
        assert_eq!(store.list(Some("")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_missing_page() {
        let store = seeded_store().await;
        assert!(store.get("http://a.test/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filter_folds_non_ascii_case() {
        let store = seeded_store().await;
        store
            .insert_if_absent(&record("http://a.test/about", Some("Über Uns"), "<p>about</p>"))
            .await
            .unwrap();

        for query in ["über", "ÜBER", "uns"] {
            let pages = store.list(Some(query)).await.unwrap();
            assert_eq!(pages.len(), 1, "query {query:?}");
            assert_eq!(pages[0].url, "http://a.test/about");
        }
    }

    #[tokio::test]
    async fn test_list_filter_ignores_markup() {
        let store = seeded_store().await;
        // "percent" only appears in the HTML body
        let pages = store.list(Some("percent")).await.unwrap();
        assert!(pages.is_empty());
        assert_eq!(store.list(Some("100")).await.unwrap().len(), 1);
    }
}
