//! Wildcard patterns for the functlog reference lookup.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Locations whose functlog codes use the `-6<nnnn>` numbering.
const SIX_SERIES_LOCATION: &str = "KEMBANGAN-DURIKOSAMBI";

const SUFFIX_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupPattern {
    pub induk: String,
    pub functlog: String,
}

fn span_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+-(\d+)").expect("span number regex"))
}

/// Second number of the first `<digits>-<digits>` in `first_cell`, left-padded
/// with zeros to four digits. Longer numbers are kept whole. Empty when absent.
pub fn span_suffix(first_cell: &str) -> String {
    span_number_re()
        .captures(first_cell)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{:0>width$}", m.as_str(), width = SUFFIX_WIDTH))
        .unwrap_or_default()
}

/// `"<voltage> <location>"`, the prefix stored in the induk column.
pub fn induk_label(voltage: &str, location: &str) -> String {
    format!("{voltage} {location}")
}

fn uses_six_series(location: &str) -> bool {
    location.to_uppercase().replace(' ', "") == SIX_SERIES_LOCATION
}

pub fn build_pattern(voltage: &str, location: &str, first_cell: &str) -> LookupPattern {
    let suffix = span_suffix(first_cell);
    let functlog = if uses_six_series(location) {
        format!("%-6{suffix}%")
    } else {
        format!("%-S%{suffix}%")
    };
    LookupPattern {
        induk: format!("%{}%", induk_label(voltage, location)),
        functlog,
    }
}

/// Pattern for a data row; its first cell (or an empty one) carries the span number.
pub fn pattern_for_row(voltage: &str, location: &str, row: &[String]) -> LookupPattern {
    let first_cell = row.first().map(String::as_str).unwrap_or("");
    build_pattern(voltage, location, first_cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_zero_padded_second_number() {
        assert_eq!(span_suffix("AB12-7"), "0007");
        assert_eq!(span_suffix("T.13-22"), "0022");
        assert_eq!(span_suffix("1-2345"), "2345");
        assert_eq!(span_suffix("3-4 and 5-6"), "0004");
    }

    #[test]
    fn long_numbers_are_padded_never_truncated() {
        assert_eq!(span_suffix("1-123456"), "123456");
    }

    #[test]
    fn missing_span_number_gives_empty_suffix() {
        assert_eq!(span_suffix("TOTAL"), "");
        assert_eq!(span_suffix("12"), "");
        assert_eq!(span_suffix(""), "");
    }

    #[test]
    fn six_series_location_uses_dash_six_pattern() {
        let p = build_pattern("500kV", "KEMBANGAN - DURIKOSAMBI", "T12-7");
        assert_eq!(
            p,
            LookupPattern {
                induk: "%500kV KEMBANGAN - DURIKOSAMBI%".to_string(),
                functlog: "%-60007%".to_string(),
            }
        );
        let p = build_pattern("500kV", "kembangan-durikosambi", "T12-7");
        assert_eq!(p.functlog, "%-60007%");
    }

    #[test]
    fn other_locations_use_s_pattern() {
        let p = build_pattern("150kV", "PLANTA-PLANTB", "5-9");
        assert_eq!(p.induk, "%150kV PLANTA-PLANTB%");
        assert_eq!(p.functlog, "%-S%0009%");
    }

    #[test]
    fn empty_suffix_still_builds_patterns() {
        let p = build_pattern("150kV", "PLANTA-PLANTB", "header-ish");
        assert_eq!(p.functlog, "%-S%%");
        let p = build_pattern("500kV", "KEMBANGAN - DURIKOSAMBI", "");
        assert_eq!(p.functlog, "%-6%");
    }

    #[test]
    fn empty_row_uses_empty_first_cell() {
        let p = pattern_for_row("150kV", "A-B", &[]);
        assert_eq!(p.functlog, "%-S%%");
    }
}
