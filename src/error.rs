use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot be opened as a Word document: {0}")]
    UnparsableDocument(String),

    #[error("could not open reference database {path}: {reason}")]
    StoreOpen { path: String, reason: String },

    #[error("reference query failed: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::UnparsableDocument(err.to_string())
    }
}

impl From<quick_xml::Error> for ConvertError {
    fn from(err: quick_xml::Error) -> Self {
        ConvertError::UnparsableDocument(format!("malformed document.xml: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for ConvertError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ConvertError::Workbook(err.to_string())
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
