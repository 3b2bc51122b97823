//! Analisis Lendutan converter.
//!
//! Reads span tables out of Word reports, looks up each span's functlog in
//! the `master_functlog` reference table and appends the enriched rows to a
//! worksheet.

pub mod config;
pub mod db;
pub mod docx;
pub mod error;
pub mod excel;
pub mod inputs;
pub mod location;
pub mod lookup;
pub mod pipeline;
pub mod table;
pub mod title;
pub mod types;

pub use config::RunConfig;
pub use db::{FunctlogDb, ReferenceStore};
pub use docx::Document;
pub use error::{ConvertError, Result};
pub use excel::{MemoryGrid, OutputGrid, OutputWorkbook};
pub use pipeline::{run, Converter};
pub use types::{DocumentOutcome, DocumentReport, QueryWarning, RunReport, SourceDocument, TitleInfo};
