//! Title recognition: which paragraph names the span, and its voltage token.

use std::sync::OnceLock;

use regex::Regex;

use crate::docx::Document;
use crate::location::normalize_location;
use crate::types::TitleInfo;

/// Paragraphs joined when no paragraph carries a voltage token.
const FALLBACK_PARAGRAPHS: usize = 3;

/// 3-4 digits immediately followed by "kV", as a whole token.
pub(crate) fn voltage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b\d{3,4}kV\b").expect("voltage regex"))
}

/// Trimmed text of the first paragraph holding a voltage token, else the
/// first three paragraphs joined with spaces.
pub fn title_text(doc: &Document) -> String {
    if let Some(para) = doc.paragraphs.iter().find(|p| voltage_re().is_match(p)) {
        return para.trim().to_string();
    }
    doc.paragraphs
        .iter()
        .take(FALLBACK_PARAGRAPHS)
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// First voltage token in `text`, verbatim.
pub fn extract_voltage(text: &str) -> Option<String> {
    voltage_re().find(text).map(|m| m.as_str().to_string())
}

pub fn parse_title(text: &str) -> TitleInfo {
    TitleInfo {
        voltage: extract_voltage(text),
        location: normalize_location(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(paragraphs: &[&str]) -> Document {
        Document {
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn voltage_token_is_returned_verbatim() {
        assert_eq!(extract_voltage("1500kV A - B").as_deref(), Some("1500kV"));
        assert_eq!(extract_voltage("Span 500KV x").as_deref(), Some("500KV"));
        assert_eq!(extract_voltage("150kv PLANT").as_deref(), Some("150kv"));
        assert_eq!(extract_voltage("line (500kV) SPAN").as_deref(), Some("500kV"));
    }

    #[test]
    fn voltage_requires_token_boundaries_and_digit_count() {
        assert_eq!(extract_voltage("15000kV"), None);
        assert_eq!(extract_voltage("20kV"), None);
        assert_eq!(extract_voltage("500kVA"), None);
        assert_eq!(extract_voltage("X500kV"), None);
        assert_eq!(extract_voltage("500 kV"), None);
    }

    #[test]
    fn title_is_first_paragraph_with_voltage() {
        let d = doc(&["LAPORAN", "  500kV SURALAYA - JAWA 9&10 SPAN 13-22  ", "150kV other"]);
        assert_eq!(title_text(&d), "500kV SURALAYA - JAWA 9&10 SPAN 13-22");
    }

    #[test]
    fn title_falls_back_to_first_three_paragraphs() {
        let d = doc(&[" ANALISIS ", "LENDUTAN", "", "ignored"]);
        assert_eq!(title_text(&d), "ANALISIS LENDUTAN");
        assert_eq!(title_text(&doc(&["one"])), "one");
        assert_eq!(title_text(&doc(&[])), "");
    }

    #[test]
    fn parse_title_yields_both_parts() {
        let info = parse_title("150kV PLANT A - PLANT B SPAN 5-9");
        assert_eq!(info.voltage.as_deref(), Some("150kV"));
        assert_eq!(info.location.as_deref(), Some("PLANTA-PLANTB"));
        assert_eq!(info.complete(), Some(("150kV", "PLANTA-PLANTB")));
    }

    #[test]
    fn title_without_voltage_is_incomplete() {
        let info = parse_title("PLANT A - PLANT B");
        assert_eq!(info.voltage, None);
        assert_eq!(info.location.as_deref(), Some("PLANTA-PLANTB"));
        assert_eq!(info.complete(), None);
    }
}
