use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

pub const DEFAULT_START_ROW: u32 = 2;

const OUTPUT_PREFIX: &str = "analisis_lendutan_converted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// First row the append cursor writes to (1-based).
    pub start_row: u32,
    /// Target sheet; `None` means the template's first sheet or `Sheet` for a new workbook.
    pub sheet_name: Option<String>,
    /// Start below the template's last used row when that is further down than `start_row`.
    pub append_after_last_row: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_row: DEFAULT_START_ROW,
            sheet_name: None,
            append_after_last_row: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start_row == 0 {
            return Err(ConvertError::InvalidConfig(
                "start row must be 1 or greater".to_string(),
            ));
        }
        if self.sheet_name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConvertError::InvalidConfig("sheet name is empty".to_string()));
        }
        Ok(())
    }

    /// Cursor start given the last used row of the target sheet (0 for none).
    pub fn first_row(&self, last_used_row: u32) -> u32 {
        if self.append_after_last_row {
            self.start_row.max(last_used_row + 1)
        } else {
            self.start_row
        }
    }
}

/// Load `.env` from the working directory, if present.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Timestamped output path in Downloads (or Desktop, or the working
/// directory), never colliding with an existing file.
pub fn default_output_path() -> PathBuf {
    let dir = dirs::download_dir()
        .or_else(dirs::desktop_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    unique_output_path(&dir, &stamp)
}

fn unique_output_path(dir: &Path, stamp: &str) -> PathBuf {
    let mut p = dir.join(format!("{OUTPUT_PREFIX}_{stamp}.xlsx"));
    let mut counter = 2u32;
    while p.exists() {
        p = dir.join(format!("{OUTPUT_PREFIX}_{stamp}_{counter}.xlsx"));
        counter += 1;
    }
    p
}

/// Force an `.xlsx` extension on a user-supplied output path.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    let mut pb = path.to_path_buf();
    if pb.extension().and_then(|e| e.to_str()) != Some("xlsx") {
        pb.set_extension("xlsx");
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_start_at_row_two() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.start_row, 2);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.first_row(40), 2);
    }

    #[test]
    fn zero_start_row_is_rejected() {
        let cfg = RunConfig {
            start_row: 0,
            ..RunConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn blank_sheet_name_is_rejected() {
        let cfg = RunConfig {
            sheet_name: Some("  ".to_string()),
            ..RunConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn append_after_last_row_moves_below_existing_data() {
        let cfg = RunConfig {
            start_row: 2,
            append_after_last_row: true,
            ..RunConfig::default()
        };
        assert_eq!(cfg.first_row(0), 2);
        assert_eq!(cfg.first_row(1), 2);
        assert_eq!(cfg.first_row(17), 18);
    }

    #[test]
    fn output_path_gets_xlsx_extension() {
        assert_eq!(normalize_output_path(Path::new("out")), PathBuf::from("out.xlsx"));
        assert_eq!(normalize_output_path(Path::new("a/b.xls")), PathBuf::from("a/b.xlsx"));
        assert_eq!(normalize_output_path(Path::new("c.xlsx")), PathBuf::from("c.xlsx"));
    }

    #[test]
    fn output_path_avoids_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_output_path(dir.path(), "20260101_000000");
        assert!(first.ends_with("analisis_lendutan_converted_20260101_000000.xlsx"));
        std::fs::write(&first, b"x").unwrap();
        let second = unique_output_path(dir.path(), "20260101_000000");
        assert!(second.ends_with("analisis_lendutan_converted_20260101_000000_2.xlsx"));
    }
}
