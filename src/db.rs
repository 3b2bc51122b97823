//! Functlog reference store backed by the `master_functlog` SQLite table.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::lookup::LookupPattern;

const LOOKUP_SQL: &str = "SELECT functlog FROM master_functlog \
     WHERE induk LIKE ?1 AND functlog LIKE ?2 AND nama LIKE 'SPAN SUTET%' LIMIT 1";

/// Read-only source of functlog identifiers.
pub trait ReferenceStore {
    /// First functlog matching both patterns, `None` when nothing matches.
    fn lookup(&self, pattern: &LookupPattern) -> Result<Option<String>>;

    /// Release the store. Dropping it releases it too.
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

pub struct FunctlogDb {
    conn: Connection,
}

impl FunctlogDb {
    /// Open an existing database file read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let open_err = |reason: String| ConvertError::StoreOpen {
            path: path.display().to_string(),
            reason,
        };
        if !path.exists() {
            return Err(open_err("file not found".to_string()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| open_err(e.to_string()))?;
        debug!(path = %path.display(), "opened reference database");
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ReferenceStore for FunctlogDb {
    fn lookup(&self, pattern: &LookupPattern) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare_cached(LOOKUP_SQL)?;
        let value = stmt
            .query_row(params![pattern.induk, pattern.functlog], |r| r.get::<_, Value>(0))
            .optional()?;
        Ok(value.map(value_to_text))
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ConvertError::Store(e))
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

/// Identifier for `pattern`; a failing query degrades to an empty identifier
/// and the failure text is handed back for reporting.
pub fn resolve<S: ReferenceStore + ?Sized>(
    store: &S,
    pattern: &LookupPattern,
) -> (String, Option<String>) {
    match store.lookup(pattern) {
        Ok(found) => (found.unwrap_or_default(), None),
        Err(e) => {
            warn!(
                induk = %pattern.induk,
                functlog = %pattern.functlog,
                error = %e,
                "reference query failed"
            );
            (String::new(), Some(e.to_string()))
        }
    }
}
