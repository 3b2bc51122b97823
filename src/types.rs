use serde::{Deserialize, Serialize};

/// Voltage token and normalized location recovered from a document title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleInfo {
    pub voltage: Option<String>,
    pub location: Option<String>,
}

impl TitleInfo {
    /// Both parts, or `None` when either is missing.
    pub fn complete(&self) -> Option<(&str, &str)> {
        match (self.voltage.as_deref(), self.location.as_deref()) {
            (Some(voltage), Some(location)) => Some((voltage, location)),
            _ => None,
        }
    }
}

/// Trimmed cell text of one table row below the header.
pub type DataRow = Vec<String>;

/// Raw bytes of one input document plus the name used in reports.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Unparsable { reason: String },
    SkippedNoTitle,
    SkippedNoTable,
    SkippedDuplicate,
    RowsAppended { rows: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub outcome: DocumentOutcome,
}

/// A reference lookup that failed; the row was still appended with an empty identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWarning {
    pub document: String,
    pub first_cell: String,
    pub induk: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub first_row: u32,
    pub next_row: u32,
    pub rows_appended: u32,
    pub documents: Vec<DocumentReport>,
    pub warnings: Vec<QueryWarning>,
}

impl RunReport {
    pub fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }
}
