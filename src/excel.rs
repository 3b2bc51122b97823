use calamine::{open_workbook_auto, DataType, Reader};
use edit_xlsx::Write;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use zip::read::ZipArchive;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::RunConfig;
use crate::error::{ConvertError, Result};

/// Sheet name of a workbook created from scratch.
pub const DEFAULT_SHEET: &str = "Sheet";

/// Column receiving the resolved functlog; row cells follow from column 2.
pub const IDENTIFIER_COLUMN: u32 = 1;

/// Letters of a 1-based column in bijective base 26 (1 is A, 27 is AA).
fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

/// A1-style reference for a 1-based row and column.
fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_letters(col), row)
}

/// Drop characters that cannot appear in sheet XML (control chars except tab, newline, CR).
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || c == '\r' || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

/// Cell sink addressed by 1-based row and column.
pub trait OutputGrid {
    fn set_cell(&mut self, row: u32, col: u32, value: &str) -> Result<()>;
}

/// Next row to write. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendCursor(u32);

impl AppendCursor {
    pub fn new(start_row: u32) -> Self {
        Self(start_row.max(1))
    }

    pub fn row(self) -> u32 {
        self.0
    }
}

/// Write `identifier` then the row's cells at the cursor row, and advance.
/// Returns the row that was written.
pub fn append_row<G: OutputGrid + ?Sized>(
    grid: &mut G,
    cursor: &mut AppendCursor,
    identifier: &str,
    cells: &[String],
) -> Result<u32> {
    let row = cursor.0;
    grid.set_cell(row, IDENTIFIER_COLUMN, identifier)?;
    for (col, value) in (IDENTIFIER_COLUMN + 1..).zip(cells) {
        grid.set_cell(row, col, value)?;
    }
    cursor.0 += 1;
    Ok(row)
}

/// In-memory grid, for callers that persist cells themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryGrid {
    cells: BTreeMap<(u32, u32), String>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    /// Row values from column 1 up to the row's last written column; gaps are empty.
    pub fn row_values(&self, row: u32) -> Vec<String> {
        let last = self
            .cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(&(_, col), _)| col)
            .last()
            .unwrap_or(0);
        (1..=last)
            .map(|col| self.get(row, col).unwrap_or_default().to_string())
            .collect()
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|&(row, _)| row).max().unwrap_or(0)
    }
}

impl OutputGrid for MemoryGrid {
    fn set_cell(&mut self, row: u32, col: u32, value: &str) -> Result<()> {
        self.cells.insert((row, col), value.to_string());
        Ok(())
    }
}

/// The workbook a run appends into: a template opened with edit_xlsx so its
/// styling survives, or a new workbook built with rust_xlsxwriter.
pub enum OutputWorkbook {
    Template {
        workbook: edit_xlsx::Workbook,
        source: PathBuf,
        sheet: String,
    },
    Fresh {
        worksheet: rust_xlsxwriter::Worksheet,
        sheet: String,
    },
}

impl OutputWorkbook {
    /// Open `path` as the output template. The target sheet is `sheet`, or the
    /// tab the workbook opens on.
    pub fn from_template(path: &Path, sheet: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(ConvertError::Workbook(format!(
                "Template not found: {}",
                path.display()
            )));
        }
        let names = get_sheet_names(path)?;
        let sheet = match sheet {
            Some(wanted) => names
                .into_iter()
                .find(|n| n == wanted)
                .ok_or_else(|| ConvertError::Workbook(format!("Sheet '{}' not found.", wanted)))?,
            None => {
                let active = active_sheet_name(path)
                    .unwrap_or_else(|e| {
                        debug!(error = %e, "active tab unreadable; using the first sheet");
                        None
                    })
                    .filter(|name| names.contains(name));
                active
                    .or_else(|| names.into_iter().next())
                    .ok_or_else(|| ConvertError::Workbook("Template has no worksheets.".to_string()))?
            }
        };
        let workbook = edit_xlsx::Workbook::from_path(path)
            .map_err(|e| ConvertError::Workbook(format!("Could not open Excel file: {}", e)))?;
        debug!(path = %path.display(), sheet = %sheet, "opened template workbook");
        Ok(OutputWorkbook::Template {
            workbook,
            source: path.to_path_buf(),
            sheet,
        })
    }

    pub fn fresh(sheet: Option<&str>) -> Result<Self> {
        let sheet = sheet
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SHEET)
            .to_string();
        let mut worksheet = rust_xlsxwriter::Worksheet::new();
        worksheet.set_name(&sheet)?;
        Ok(OutputWorkbook::Fresh { worksheet, sheet })
    }

    /// Template when one is given and opens; otherwise a new workbook.
    pub fn open(template: Option<&Path>, sheet: Option<&str>) -> Result<Self> {
        match template {
            Some(path) => Self::from_template(path, sheet).or_else(|e| {
                warn!(template = %path.display(), error = %e, "template cannot be opened; using a new workbook");
                Self::fresh(sheet)
            }),
            None => Self::fresh(sheet),
        }
    }

    pub fn sheet_name(&self) -> &str {
        match self {
            OutputWorkbook::Template { sheet, .. } | OutputWorkbook::Fresh { sheet, .. } => sheet,
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self, OutputWorkbook::Template { .. })
    }

    /// Row the run starts on. With `append_after_last_row` a template is scanned
    /// and the run starts below its last used row when that is further down.
    pub fn start_row(&self, config: &RunConfig) -> Result<u32> {
        if !config.append_after_last_row {
            return Ok(config.start_row);
        }
        match self {
            OutputWorkbook::Template { source, sheet, .. } => {
                let last = last_used_row(source, sheet)?;
                debug!(sheet = %sheet, last_used_row = last, "scanned template");
                Ok(config.first_row(last))
            }
            OutputWorkbook::Fresh { .. } => {
                warn!("append_after_last_row has no effect on a new workbook");
                Ok(config.start_row)
            }
        }
    }

    pub fn save(self, path: &Path) -> Result<()> {
        match self {
            OutputWorkbook::Template { workbook, .. } => {
                workbook.save_as(path).map_err(|e| {
                    let msg = e.to_string();
                    if msg.contains("Permission denied") || msg.contains("being used") {
                        ConvertError::Workbook("Please close the file in Excel first.".to_string())
                    } else {
                        ConvertError::Workbook(format!("Cannot write to file: {}", msg))
                    }
                })?;
                remove_drawing_parts(path)
            }
            OutputWorkbook::Fresh { worksheet, .. } => {
                let mut workbook = rust_xlsxwriter::Workbook::new();
                workbook.push_worksheet(worksheet);
                workbook.save(path)?;
                Ok(())
            }
        }
    }
}

impl OutputGrid for OutputWorkbook {
    fn set_cell(&mut self, row: u32, col: u32, value: &str) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(ConvertError::Workbook(format!(
                "cell ({row}, {col}) is outside the 1-based grid"
            )));
        }
        let value = sanitize_cell(value);
        match self {
            OutputWorkbook::Template { workbook, sheet, .. } => {
                let worksheet = workbook
                    .get_worksheet_mut_by_name(sheet)
                    .map_err(|e| ConvertError::Workbook(format!("Sheet not found: {}", e)))?;
                let cell_ref = cell_ref(row, col);
                worksheet
                    .write_string(&cell_ref, value)
                    .map_err(|e| ConvertError::Workbook(e.to_string()))?;
            }
            OutputWorkbook::Fresh { worksheet, .. } => {
                let col = u16::try_from(col - 1)
                    .map_err(|_| ConvertError::Workbook(format!("column {col} is out of range")))?;
                worksheet.write_string(row - 1, col, value)?;
            }
        }
        Ok(())
    }
}

/// Get list of sheet names from workbook.
pub fn get_sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path)
        .map_err(|e| ConvertError::Workbook(format!("Could not open Excel file: {}", e)))?;
    Ok(workbook.sheet_names().to_vec())
}

/// 1-based index of the last row holding any data in `sheet_name`; 0 when the sheet is empty.
pub fn last_used_row(path: &Path, sheet_name: &str) -> Result<u32> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ConvertError::Workbook(format!("Could not open Excel file: {}", e)))?;
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| ConvertError::Workbook(format!("Sheet not found: {}", e)))?;
    let first_row = range.start().map_or(0, |(r, _)| r);
    let last = range
        .rows()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|c| !c.is_empty()))
        .map(|(i, _)| first_row + i as u32 + 1)
        .last()
        .unwrap_or(0);
    Ok(last)
}

/// Tab a workbook opens on: the sheet at `workbookView/@activeTab` in
/// `xl/workbook.xml`, counting from 0.
pub fn active_sheet_name(path: &Path) -> Result<Option<String>> {
    let workbook_err = |e: String| ConvertError::Workbook(format!("Invalid workbook.xml: {e}"));
    let mut archive = ZipArchive::new(File::open(path)?)
        .map_err(|e| ConvertError::Workbook(format!("Invalid zip: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("xl/workbook.xml")
        .map_err(|e| workbook_err(e.to_string()))?
        .read_to_string(&mut xml)?;

    let mut reader = XmlReader::from_str(&xml);
    let mut sheets = Vec::new();
    let mut active_tab = None;
    loop {
        match reader.read_event().map_err(|e| workbook_err(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookView" if active_tab.is_none() => {
                    active_tab = Some(
                        xml_attr(&e, b"activeTab")
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(0),
                    );
                }
                b"sheet" => sheets.extend(xml_attr(&e, b"name")),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    let tab = active_tab.unwrap_or(0);
    Ok(sheets.get(tab).or_else(|| sheets.first()).cloned())
}

fn xml_attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// References to drawing and media parts in `[Content_Types].xml` and worksheet rels.
fn drawing_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<Override\s+PartName="/xl/(?:drawings|media)/[^"]*"[^>]*/>|<Relationship[^>]*drawing[^>]*/>"#,
        )
        .expect("drawing reference regex")
    })
}

fn is_drawing_part(name: &str) -> bool {
    name.starts_with("xl/drawings/") || name.starts_with("xl/media/")
}

fn references_parts(name: &str) -> bool {
    name == "[Content_Types].xml" || (name.contains("worksheets/_rels/") && name.ends_with(".rels"))
}

/// Rewrite a saved template without drawing and media parts. Excel asks to
/// repair drawings as written back by edit_xlsx; sheet XML is copied as is.
fn remove_drawing_parts(path: &Path) -> Result<()> {
    let zip_err = |e: zip::result::ZipError| ConvertError::Workbook(e.to_string());
    let mut archive = ZipArchive::new(File::open(path)?).map_err(zip_err)?;

    let rewritten = path.with_extension("tmp.xlsx");
    let mut out = ZipWriter::new(File::create(&rewritten)?);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut dropped = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;
        let name = entry.name().replace('\\', "/");
        if is_drawing_part(&name) {
            dropped += 1;
            continue;
        }
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        if references_parts(&name) {
            let text = String::from_utf8_lossy(&data);
            data = drawing_reference_re().replace_all(&text, "").into_owned().into_bytes();
        }
        out.start_file(name.as_str(), opts).map_err(zip_err)?;
        out.write_all(&data)?;
    }
    out.finish().map_err(zip_err)?;
    fs::rename(&rewritten, path)?;
    debug!(path = %path.display(), dropped, "removed drawing parts");
    Ok(())
}
