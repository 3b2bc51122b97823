#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn paragraph(text: &str) -> String {
    format!(
        r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml_escape(text)
    )
}

/// Minimal .docx: the given paragraphs followed by one table per entry of `tables`.
pub fn docx(paragraphs: &[&str], tables: &[&[&[&str]]]) -> Vec<u8> {
    let mut body = String::new();
    for p in paragraphs {
        body.push_str(&paragraph(p));
    }
    for table in tables {
        body.push_str("<w:tbl><w:tblPr/>");
        for row in *table {
            body.push_str("<w:tr>");
            for cell in *row {
                body.push_str("<w:tc>");
                body.push_str(&paragraph(cell));
                body.push_str("</w:tc>");
            }
            body.push_str("</w:tr>");
        }
        body.push_str("</w:tbl>");
    }
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", opts).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
        .unwrap();
    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Reference database file with the given `(induk, functlog, nama)` rows.
pub fn reference_db(dir: &Path, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join("reference.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE master_functlog (induk TEXT, functlog TEXT, nama TEXT);")
        .unwrap();
    for (induk, functlog, nama) in rows {
        conn.execute(
            "INSERT INTO master_functlog (induk, functlog, nama) VALUES (?1, ?2, ?3)",
            (induk, functlog, nama),
        )
        .unwrap();
    }
    path
}

/// Single-sheet .xlsx whose first rows hold `rows`.
pub fn template_xlsx(dir: &Path, sheet: &str, rows: &[Vec<&str>]) -> PathBuf {
    let path = dir.join("template.xlsx");
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            worksheet.write_string(r as u32, c as u16, *value).unwrap();
        }
    }
    workbook.save(&path).unwrap();
    path
}
