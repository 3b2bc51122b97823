//! Word (.docx) reader: body paragraphs and body tables from `word/document.xml`.
//!
//! Only what the converter needs is recovered. Row cells are laid out on the
//! table grid, so a horizontally merged cell repeats once per spanned column
//! and a vertical-merge continuation repeats the text of the cell above.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{ConvertError, Result};

const DOCUMENT_XML: &str = "word/document.xml";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub paragraphs: Vec<String>,
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Document {
    /// Parse the raw bytes of a .docx file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_name(DOCUMENT_XML).map_err(|e| {
            ConvertError::UnparsableDocument(format!("missing {DOCUMENT_XML}: {e}"))
        })?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml).map_err(|e| {
            ConvertError::UnparsableDocument(format!("failed to read {DOCUMENT_XML}: {e}"))
        })?;
        parse_document_xml(&xml)
    }

    pub fn first_table(&self) -> Option<&Table> {
        self.tables.first()
    }
}

struct GridCell {
    text: String,
    span: usize,
    continues: bool,
}

struct CellBuilder {
    paragraphs: Vec<String>,
    span: usize,
    continues: bool,
}

#[derive(Default)]
struct BodyWalker {
    doc: Document,
    table_depth: usize,
    textbox_depth: usize,
    /// Content controls (`w:sdt`) opened outside any table; cover pages live here.
    sdt_depth: usize,
    paragraph: Option<String>,
    in_run: bool,
    in_text: bool,
    rows: Vec<Vec<GridCell>>,
    row: Option<Vec<GridCell>>,
    cell: Option<CellBuilder>,
}

impl BodyWalker {
    fn start(&mut self, e: &BytesStart<'_>) {
        let name = e.local_name();
        let name = name.as_ref();
        if name == b"txbxContent" {
            self.textbox_depth += 1;
            return;
        }
        if self.textbox_depth > 0 {
            return;
        }
        if name == b"sdt" && self.table_depth == 0 {
            self.sdt_depth += 1;
            return;
        }
        if self.sdt_depth > 0 {
            return;
        }
        if name == b"tbl" {
            self.table_depth += 1;
            if self.table_depth == 1 {
                self.rows.clear();
            }
            return;
        }
        if self.table_depth > 1 {
            return;
        }
        let in_table = self.table_depth == 1;
        match name {
            b"tr" if in_table => self.row = Some(Vec::new()),
            b"tc" if in_table => {
                self.cell = Some(CellBuilder {
                    paragraphs: Vec::new(),
                    span: 1,
                    continues: false,
                })
            }
            b"gridSpan" if in_table => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.span = val_attr(e)
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(1)
                        .max(1);
                }
            }
            b"vMerge" if in_table => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.continues = val_attr(e).map_or(true, |v| v != "restart");
                }
            }
            b"p" if !in_table || self.cell.is_some() => self.paragraph = Some(String::new()),
            b"r" => self.in_run = true,
            b"t" => self.in_text = true,
            b"tab" if self.in_run => self.push_text("\t"),
            b"br" | b"cr" if self.in_run => self.push_text("\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        if name == b"txbxContent" {
            self.textbox_depth = self.textbox_depth.saturating_sub(1);
            return;
        }
        if self.textbox_depth > 0 {
            return;
        }
        if name == b"sdt" && self.table_depth == 0 {
            self.sdt_depth = self.sdt_depth.saturating_sub(1);
            return;
        }
        if self.sdt_depth > 0 {
            return;
        }
        if name == b"tbl" {
            if self.table_depth == 1 {
                let rows = expand_to_grid(std::mem::take(&mut self.rows));
                self.doc.tables.push(Table { rows });
            }
            self.table_depth = self.table_depth.saturating_sub(1);
            return;
        }
        if self.table_depth > 1 {
            return;
        }
        match name {
            b"tr" => {
                if let Some(row) = self.row.take() {
                    self.rows.push(row);
                }
            }
            b"tc" => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push(GridCell {
                        text: cell.paragraphs.join("\n"),
                        span: cell.span,
                        continues: cell.continues,
                    });
                }
            }
            b"p" => {
                if let Some(text) = self.paragraph.take() {
                    match self.cell.as_mut() {
                        Some(cell) if self.table_depth == 1 => cell.paragraphs.push(text),
                        _ => self.doc.paragraphs.push(text),
                    }
                }
            }
            b"r" => self.in_run = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text && self.textbox_depth == 0 && self.sdt_depth == 0 && self.table_depth <= 1 {
            self.push_text(text);
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }
}

fn val_attr(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn expand_to_grid(rows: Vec<Vec<GridCell>>) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells: Vec<String> = Vec::new();
        for cell in row {
            let col = cells.len();
            let text = if cell.continues {
                out.last()
                    .and_then(|above| above.get(col))
                    .cloned()
                    .unwrap_or_default()
            } else {
                cell.text
            };
            for _ in 0..cell.span {
                cells.push(text.clone());
            }
        }
        out.push(cells);
    }
    out
}

fn parse_document_xml(xml: &str) -> Result<Document> {
    let mut reader = Reader::from_str(xml);
    let mut walker = BodyWalker::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => walker.start(&e),
            Event::Empty(e) => {
                walker.start(&e);
                walker.end(e.local_name().as_ref());
            }
            Event::End(e) => walker.end(e.local_name().as_ref()),
            Event::Text(t) => walker.text(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(walker.doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}</w:body></w:document>"#
        )
    }

    #[test]
    fn reads_body_paragraphs_in_order() {
        let xml = body(
            "<w:p><w:r><w:t>500kV </w:t></w:r><w:r><w:t>SURALAYA</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t></w:r></w:p>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.paragraphs, vec!["500kV SURALAYA", "", "A\tB & C"]);
        assert!(doc.tables.is_empty());
    }

    #[test]
    fn table_paragraphs_are_not_body_paragraphs() {
        let xml = body(
            "<w:p><w:r><w:t>before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>No</w:t></w:r></w:p></w:tc>\
             <w:tc><w:p><w:r><w:t>line 1</w:t></w:r></w:p><w:p><w:r><w:t>line 2</w:t></w:r></w:p></w:tc></w:tr>\
             <w:tr><w:tc><w:p><w:r><w:t>T.1-2</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>after</w:t></w:r></w:p>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.paragraphs, vec!["before", "after"]);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(
            doc.tables[0].rows,
            vec![
                vec!["No".to_string(), "line 1\nline 2".to_string()],
                vec!["T.1-2".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn merged_cells_are_expanded_on_the_grid() {
        let xml = body(
            "<w:tbl>\
             <w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>\
             <w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc></w:tr>\
             <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>\
             <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr>\
             </w:tbl>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.tables[0].rows[0], vec!["wide", "wide", "tall"]);
        assert_eq!(doc.tables[0].rows[1], vec!["a", "b", "tall"]);
    }

    #[test]
    fn nested_tables_do_not_leak_into_cells_or_table_list() {
        let xml = body(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p/></w:tc></w:tr></w:tbl>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>second</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.tables.len(), 2);
        assert_eq!(doc.tables[0].rows, vec![vec!["outer\n".to_string()]]);
        assert_eq!(doc.first_table().unwrap().rows.len(), 1);
        assert_eq!(doc.tables[1].rows, vec![vec!["second".to_string()]]);
    }

    #[test]
    fn text_box_content_is_ignored() {
        let xml = body(
            "<w:p><w:r><w:t>title</w:t></w:r><w:r><w:drawing><wps:txbx xmlns:wps=\"x\"><w:txbxContent>\
             <w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></wps:txbx></w:drawing></w:r></w:p>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.paragraphs, vec!["title"]);
    }

    #[test]
    fn content_controls_are_not_body_items() {
        let xml = body(
            "<w:sdt><w:sdtPr><w:docPartObj/></w:sdtPr><w:sdtContent>\
             <w:p><w:r><w:t>COVER 500kV X - Y</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cover table</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             </w:sdtContent></w:sdt>\
             <w:p><w:r><w:t>500kV A</w:t></w:r><w:r><w:br/><w:t>B</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>span</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        let doc = parse_document_xml(&xml).unwrap();
        assert_eq!(doc.paragraphs, vec!["500kV A\nB"]);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.first_table().unwrap().rows, vec![vec!["span".to_string()]]);
    }

    #[test]
    fn non_zip_bytes_are_unparsable() {
        let err = Document::from_bytes(b"definitely not a docx").unwrap_err();
        assert!(matches!(err, ConvertError::UnparsableDocument(_)));
    }
}
