/// Asset store: read-only access to the SQLite image database.
///
/// ## Schema
///   ```sql
///   CREATE TABLE images (
///       id       INTEGER PRIMARY KEY,
///       name     TEXT NOT NULL,
///       category TEXT,
///       data     BLOB NOT NULL
///   )
///   ```
///
/// The database is opened read-only and never created: a missing or foreign
/// file is `StoreError::Unavailable`. Rows with a NULL name or category, or
/// a NULL or empty blob, are skipped; a partial catalog is still a valid catalog.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};

use crate::domain::catalog::ImageAsset;
use crate::error::StoreError;

const SELECT_ALL: &str = "SELECT name, category, data FROM images";
#[allow(dead_code)]
const SELECT_ONE: &str = "SELECT data FROM images WHERE name = ?1";

pub struct AssetStore {
    conn: Connection,
    path: PathBuf,
}

impl AssetStore {
    /// Open the database and check that it actually holds an `images` table.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let unavailable = |source| StoreError::Unavailable { path: path.to_path_buf(), source };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(unavailable)?;

        // SQLite opens lazily: a non-database file or a missing table only
        // shows up once a statement is prepared.
        conn.prepare(SELECT_ALL).map_err(unavailable)?;

        log::debug!("Opened image database {}", path.display());
        Ok(AssetStore { conn, path: path.to_path_buf() })
    }

    /// Every usable row, in table order.
    pub fn load_all(&self) -> Result<Vec<ImageAsset>, StoreError> {
        let mut stmt = self.conn.prepare(SELECT_ALL)?;
        let mut rows = stmt.query([])?;
        let mut images = Vec::new();
        let mut skipped = 0usize;

        while let Some(row) = rows.next()? {
            match asset_from_row(row)? {
                Some(asset) => images.push(asset),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            log::debug!("Skipped {skipped} incomplete row(s) in {}", self.path.display());
        }
        Ok(images)
    }

    /// Encoded bytes of a single image by name.
    #[allow(dead_code)]
    pub fn lookup(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let found = self.conn
            .query_row(SELECT_ONE, [name], |row| blob_column(row, 0))
            .optional()?;
        Ok(found.flatten())
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, e)| StoreError::Query(e))
    }
}

/// Open, bulk-load and close. The store is not needed after startup.
pub fn load_images(path: &Path) -> Result<Vec<ImageAsset>, StoreError> {
    let store = AssetStore::open(path)?;
    let images = store.load_all()?;
    store.close()?;
    log::info!("Loaded {} image(s) from {}", images.len(), path.display());
    Ok(images)
}

// ── Row decoding ──

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Option<ImageAsset>> {
    let name = text_column(row, 0)?;
    let category = text_column(row, 1)?;
    let data = blob_column(row, 2)?;

    Ok(match (name, category, data) {
        (Some(name), Some(category), Some(data)) => Some(ImageAsset { name, category, data }),
        _ => None,
    })
}

/// Text value, coercing blobs and numbers the way SQLite's own text
/// accessor does. Only NULL reads as `None`; an empty string is kept.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    let text = match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
    };
    Ok(text)
}

/// Raw bytes. NULL, empty and numeric values read as `None`.
fn blob_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<u8>>> {
    let bytes = match row.get_ref(idx)? {
        ValueRef::Blob(bytes) | ValueRef::Text(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
        _ => None,
    };
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::TempDir;

    /// Build a throwaway database. The table has no NOT NULL constraints so
    /// that incomplete rows can be inserted.
    fn make_db(rows: &[(Option<&str>, Option<&str>, Option<&[u8]>)]) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE images (id INTEGER PRIMARY KEY, name TEXT, category TEXT, data BLOB)",
            [],
        )
        .unwrap();
        for (name, category, data) in rows {
            conn.execute(
                "INSERT INTO images (name, category, data) VALUES (?1, ?2, ?3)",
                params![name, category, data],
            )
            .unwrap();
        }
        conn.close().unwrap();
        (dir, path)
    }

    #[test]
    fn loads_rows_in_order() {
        let (_dir, path) = make_db(&[
            (Some("cat"), Some("a"), Some(&[1, 2][..])),
            (Some("boat"), Some("b"), Some(&[3][..])),
            (Some("tree"), Some("c"), Some(&[4, 5, 6][..])),
        ]);
        let store = AssetStore::open(&path).unwrap();
        let images = store.load_all().unwrap();
        let names: Vec<_> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["cat", "boat", "tree"]);
        assert_eq!(images[1].category, "b");
        assert_eq!(images[2].data, vec![4u8, 5, 6]);
        store.close().unwrap();
    }

    #[test]
    fn skips_incomplete_rows() {
        let (_dir, path) = make_db(&[
            (Some("ok"), Some("a"), Some(&[1][..])),
            (None, Some("a"), Some(&[1][..])),
            (Some("no-category"), None, Some(&[1][..])),
            (Some("no-data"), Some("a"), None),
            (Some("empty-data"), Some("a"), Some(&[][..])),
            (Some("also-ok"), Some("c"), Some(&[9][..])),
        ]);
        let images = load_images(&path).unwrap();
        let names: Vec<_> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["ok", "also-ok"]);
    }

    #[test]
    fn empty_text_is_not_null() {
        let (_dir, path) = make_db(&[
            (Some(""), Some("a"), Some(&[1][..])),
            (Some("plain"), Some(""), Some(&[2][..])),
        ]);
        let images = load_images(&path).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "");
        assert_eq!(images[1].category, "");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.db");
        let err = AssetStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(!path.exists(), "read-only open must not create the file");
    }

    #[test]
    fn foreign_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.db");
        std::fs::write(&path, b"definitely not sqlite, just some text padding it out").unwrap();
        assert!(matches!(AssetStore::open(&path), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE scores (v INTEGER)", []).unwrap();
        conn.close().unwrap();
        assert!(matches!(AssetStore::open(&path), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn lookup_by_name() {
        let (_dir, path) = make_db(&[
            (Some("cat"), Some("a"), Some(&[1, 2][..])),
            (Some("ghost"), Some("a"), None),
        ]);
        let store = AssetStore::open(&path).unwrap();
        assert_eq!(store.lookup("cat").unwrap(), Some(vec![1, 2]));
        assert_eq!(store.lookup("dog").unwrap(), None);
        assert_eq!(store.lookup("ghost").unwrap(), None);
    }

    #[test]
    fn empty_table_gives_empty_catalog() {
        let (_dir, path) = make_db(&[]);
        assert!(load_images(&path).unwrap().is_empty());
    }
}
