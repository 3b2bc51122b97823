//! Location key normalization.
//!
//! A title such as `500kV MUARA KARANG - DURI KOSAMBI SPAN 3-4` yields the key
//! `MUARAKARANG-DURIKOSAMBI`: the text after the voltage token and before
//! `SPAN`, without the trailing span numbers, each dash-separated part
//! uppercased with its spaces removed.

use std::sync::OnceLock;

use regex::Regex;

use crate::title::voltage_re;

/// Literal outputs for locations whose whitespace-collapsed, uppercased form
/// matches the key. Values are returned as-is, never re-normalized.
pub const SPECIAL_LOCATIONS: &[(&str, &str)] = &[
    ("JAWA 9&10 - CILEGON BARU", "JAWA9&10-CILEGONBARU"),
    ("SURALAYA - JAWA 9&10", "SURALAYA-JAWA9&10"),
    ("MUARA KARANG - DURIKOSAMBI", "MUARAKARANG-DURIKOSAMBI"),
    ("MUARA KARANG - DURI KOSAMBI", "MUARAKARANG-DURIKOSAMBI"),
    ("SURALAYA BARU - SURALAYA", "SURALAYA BARU - SURALAYA"),
    ("KEMBANGAN - DURIKOSAMBI", "KEMBANGAN - DURIKOSAMBI"),
];

fn span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bSPAN\b").expect("span regex"))
}

fn trailing_numbers_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\d+(?:[-&]\d+)?\s*$").expect("trailing numbers regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn dash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*-\s*").expect("dash regex"))
}

fn collapse_upper(s: &str) -> String {
    whitespace_re().replace_all(s, " ").trim().to_uppercase()
}

pub fn special_location(key: &str) -> Option<&'static str> {
    SPECIAL_LOCATIONS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Raw location phrase of a title: after the voltage token, before `SPAN`, trimmed.
fn raw_location(title: &str) -> Option<&str> {
    let rest = match voltage_re().find(title) {
        Some(m) => &title[m.end()..],
        None => title,
    };
    let before_span = match span_re().find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    };
    let raw = before_span.trim();
    (!raw.is_empty()).then_some(raw)
}

/// Canonical location key of a title, or `None` when nothing usable remains.
pub fn normalize_location(title: &str) -> Option<String> {
    let raw = raw_location(title)?;
    let stripped = trailing_numbers_re().replace(raw, "");
    let stripped = stripped.trim();

    // The special-case key is taken before the trailing numbers are removed.
    if let Some(literal) = special_location(&collapse_upper(raw)) {
        return Some(literal.to_string());
    }

    let parts: Vec<String> = dash_re()
        .split(stripped)
        .map(|part| collapse_upper(part).replace(' ', ""))
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("-"))
}
