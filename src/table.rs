use std::collections::HashSet;

use crate::docx::{Document, Table};
use crate::types::DataRow;

/// Full trimmed content of a table, header row included.
pub type TableSnapshot = Vec<Vec<String>>;

pub fn snapshot(table: &Table) -> TableSnapshot {
    table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.trim().to_string()).collect())
        .collect()
}

/// Result of claiming a document's first table for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableClaim {
    NoTable,
    Duplicate,
    /// Data rows below the header, in document order.
    Fresh(Vec<DataRow>),
}

/// Tables already consumed in this run. Only grows.
#[derive(Debug, Default)]
pub struct ProcessedTableSet {
    seen: HashSet<TableSnapshot>,
}

impl ProcessedTableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, snapshot: &TableSnapshot) -> bool {
        self.seen.contains(snapshot)
    }

    /// Take the first table of `doc`, registering it so identical tables are
    /// refused for the rest of the run.
    pub fn claim(&mut self, doc: &Document) -> TableClaim {
        let Some(table) = doc.first_table() else {
            return TableClaim::NoTable;
        };
        let snap = snapshot(table);
        if self.seen.contains(&snap) {
            return TableClaim::Duplicate;
        }
        let rows = snap.iter().skip(1).cloned().collect();
        self.seen.insert(snap);
        TableClaim::Fresh(rows)
    }
}
