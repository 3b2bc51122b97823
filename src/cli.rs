use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "lendutan-converter",
    version,
    about = "Convert Analisis Lendutan Word reports into functlog-enriched Excel rows"
)]
pub struct Cli {
    /// Word reports (.docx) or directories containing them, processed in order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// SQLite reference database holding the master_functlog table.
    #[arg(long, env = "LENDUTAN_DB")]
    pub db: PathBuf,

    /// Excel template to append into; a new workbook is created when omitted.
    #[arg(long, env = "LENDUTAN_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Output workbook path. Defaults to a timestamped file in Downloads.
    #[arg(long, env = "LENDUTAN_OUTPUT")]
    pub output: Option<PathBuf>,

    /// First row to write (1-based).
    #[arg(
        long,
        env = "LENDUTAN_START_ROW",
        default_value_t = 2,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub start_row: u32,

    /// Worksheet to append into.
    #[arg(long, env = "LENDUTAN_SHEET")]
    pub sheet: Option<String>,

    /// Start below the template's last used row when that is further down than --start-row.
    #[arg(long, default_value_t = false)]
    pub append_after_last_row: bool,

    /// Write the run report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Open the produced workbook when done.
    #[arg(long, default_value_t = false)]
    pub open: bool,
}
