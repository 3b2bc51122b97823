//! Run orchestration: every document goes title → first table → per-row
//! lookup → append, sharing one cursor and one set of seen tables.

use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::db::{resolve, ReferenceStore};
use crate::docx::Document;
use crate::error::Result;
use crate::excel::{append_row, AppendCursor, OutputGrid};
use crate::lookup::{induk_label, pattern_for_row};
use crate::table::{ProcessedTableSet, TableClaim};
use crate::title::{parse_title, title_text};
use crate::types::{DocumentOutcome, DocumentReport, QueryWarning, RunReport, SourceDocument};

/// State of one run. Owns the reference store until [`Converter::finish`].
pub struct Converter<'g, S: ReferenceStore, G: OutputGrid + ?Sized> {
    store: S,
    grid: &'g mut G,
    cursor: AppendCursor,
    processed: ProcessedTableSet,
    report: RunReport,
}

impl<'g, S: ReferenceStore, G: OutputGrid + ?Sized> Converter<'g, S, G> {
    pub fn new(store: S, grid: &'g mut G, start_row: u32) -> Self {
        let cursor = AppendCursor::new(start_row);
        Self {
            store,
            grid,
            cursor,
            processed: ProcessedTableSet::new(),
            report: RunReport {
                first_row: cursor.row(),
                next_row: cursor.row(),
                ..RunReport::default()
            },
        }
    }

    /// Row the next appended record lands on.
    pub fn cursor(&self) -> u32 {
        self.cursor.row()
    }

    /// Parse and process one raw document. Only grid write failures are errors.
    pub fn process(&mut self, source: &SourceDocument) -> Result<&DocumentReport> {
        info!(document = %source.name, "processing document");
        match Document::from_bytes(&source.bytes) {
            Ok(doc) => self.process_parsed(&source.name, &doc),
            Err(e) => {
                warn!(
                    document = %source.name,
                    error = %e,
                    "cannot be opened as a Word document; skipped"
                );
                Ok(self.record(DocumentReport {
                    name: source.name.clone(),
                    title: None,
                    voltage: None,
                    location: None,
                    outcome: DocumentOutcome::Unparsable {
                        reason: e.to_string(),
                    },
                }))
            }
        }
    }

    pub fn process_parsed(&mut self, name: &str, doc: &Document) -> Result<&DocumentReport> {
        let title = title_text(doc);
        let info = parse_title(&title);
        let outcome = match info.complete() {
            None => {
                info!(
                    document = %name,
                    title = %title,
                    "skipped: voltage or location not detected"
                );
                DocumentOutcome::SkippedNoTitle
            }
            Some((voltage, location)) => match self.processed.claim(doc) {
                TableClaim::NoTable => {
                    info!(document = %name, "skipped: no table");
                    DocumentOutcome::SkippedNoTable
                }
                TableClaim::Duplicate => {
                    info!(document = %name, "skipped: duplicate table");
                    DocumentOutcome::SkippedDuplicate
                }
                TableClaim::Fresh(rows) => {
                    let appended = self.append_rows(name, voltage, location, &rows)?;
                    info!(
                        document = %name,
                        rows = appended,
                        induk = %induk_label(voltage, location),
                        "rows appended"
                    );
                    DocumentOutcome::RowsAppended { rows: appended }
                }
            },
        };
        Ok(self.record(DocumentReport {
            name: name.to_string(),
            title: (!title.is_empty()).then_some(title),
            voltage: info.voltage.clone(),
            location: info.location.clone(),
            outcome,
        }))
    }

    fn append_rows(
        &mut self,
        name: &str,
        voltage: &str,
        location: &str,
        rows: &[Vec<String>],
    ) -> Result<u32> {
        let mut appended = 0;
        for row in rows {
            let pattern = pattern_for_row(voltage, location, row);
            let (functlog, failure) = resolve(&self.store, &pattern);
            if let Some(message) = failure {
                self.report.warnings.push(QueryWarning {
                    document: name.to_string(),
                    first_cell: row.first().cloned().unwrap_or_default(),
                    induk: induk_label(voltage, location),
                    message,
                });
            }
            let written = append_row(&mut *self.grid, &mut self.cursor, &functlog, row)?;
            debug!(row = written, functlog = %functlog, "appended");
            appended += 1;
        }
        self.report.rows_appended += appended;
        Ok(appended)
    }

    fn record(&mut self, report: DocumentReport) -> &DocumentReport {
        self.report.next_row = self.cursor.row();
        let idx = self.report.documents.len();
        self.report.documents.push(report);
        &self.report.documents[idx]
    }

    /// Release the store and hand back the run report.
    pub fn finish(mut self) -> RunReport {
        self.report.next_row = self.cursor.row();
        if let Err(e) = self.store.close() {
            warn!(error = %e, "closing reference store failed");
        }
        self.report
    }
}

/// Run every document in order against `store`, appending into `grid`.
pub fn run<S, G, I>(documents: I, store: S, grid: &mut G, config: &RunConfig) -> Result<RunReport>
where
    S: ReferenceStore,
    G: OutputGrid + ?Sized,
    I: IntoIterator<Item = SourceDocument>,
{
    config.validate()?;
    let mut converter = Converter::new(store, grid, config.start_row);
    for source in documents {
        converter.process(&source)?;
    }
    let report = converter.finish();
    info!(
        documents = report.documents.len(),
        rows = report.rows_appended,
        warnings = report.warnings.len(),
        next_row = report.next_row,
        "conversion finished"
    );
    Ok(report)
}
