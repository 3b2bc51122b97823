//! Print a worksheet as tab-separated rows, prefixed with their 1-based row number.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Reader};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dump_excel", about = "Print a worksheet as tab-separated rows")]
struct Args {
    /// Workbook to read (.xlsx, .xlsm, .xls or .ods).
    path: PathBuf,

    /// Sheet to print; the first sheet when omitted.
    sheet: Option<String>,
}

fn main() -> Result<()> {
    let Args { path, sheet } = Args::parse();
    let mut workbook = open_workbook_auto(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    let sheet = match sheet {
        Some(sheet) => sheet,
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("{} has no worksheets", path.display()))?,
    };
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet {sheet}"))?;
    let first_row = range.start().map_or(0, |(r, _)| r);
    let first_col = range.start().map_or(0, |(_, c)| c) as usize;
    for (i, row) in range.rows().enumerate() {
        let mut cells: Vec<String> = vec![String::new(); first_col];
        cells.extend(row.iter().map(|c| c.to_string()));
        println!("{}\t{}", first_row as usize + i + 1, cells.join("\t"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_argument_is_optional() {
        let args = Args::try_parse_from(["dump_excel", "out.xlsx"]).unwrap();
        assert_eq!(args.path, PathBuf::from("out.xlsx"));
        assert_eq!(args.sheet, None);

        let args = Args::try_parse_from(["dump_excel", "out.xlsx", "Lendutan"]).unwrap();
        assert_eq!(args.sheet.as_deref(), Some("Lendutan"));
        assert!(Args::try_parse_from(["dump_excel"]).is_err());
    }
}
