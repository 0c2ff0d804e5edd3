//! Event-name matching for free-text keywords.
//!
//! A keyword matches when it appears verbatim (case-folded) in the event name, or when
//! every segment of it does. Segments are the known race-type terms found in the keyword
//! plus whatever whitespace-separated text is left once those terms are removed, so
//! "高雄馬拉松" matches "2026高雄富邦馬拉松".

use crate::imports::*;
use crate::types::*;

/// Race-type terms split out of keywords, scanned in this order.
pub const RACE_TERMS: [&str; 6] = ["馬拉松", "路跑", "越野", "半馬", "全馬", "超馬"];

/// Interchangeable spellings of "Tai".
const TAI_VARIANTS: [(char, char); 2] = [('台', '臺'), ('臺', '台')];

pub fn segments(keyword: &str) -> Vec<String> {
    let keyword = keyword.to_lowercase();
    let mut segments = Vec::new();
    let mut remaining = keyword.clone();
    for term in RACE_TERMS {
        if remaining.contains(term) {
            segments.push(term.to_string());
            remaining = remaining.replace(term, " ");
        }
    }
    segments.extend(remaining.split_whitespace().map(str::to_string));
    if segments.is_empty() {
        segments.push(keyword);
    }
    segments
}

/// An empty keyword matches everything.
pub fn matches(name: &str, keyword: &str) -> bool {
    if keyword.trim().is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    if name.contains(&keyword.to_lowercase()) {
        return true;
    }
    segments(keyword).iter().all(|segment| name.contains(segment.as_str()))
}

/// The keyword itself followed by its 台/臺 spellings.
pub fn keyword_variants(keyword: &str) -> Vec<String> {
    let mut variants = vec![keyword.to_string()];
    for (from, to) in TAI_VARIANTS {
        if keyword.contains(from) {
            variants.push(keyword.replace(from, &to.to_string()));
        }
    }
    variants.into_iter().unique().collect()
}

pub fn matches_any(name: &str, keyword: &str) -> bool {
    keyword_variants(keyword).iter().any(|variant| matches(name, variant))
}

/// Local keyword filter for vendors whose listing can't be searched server-side.
#[derive(Clone, Debug, Default)]
pub struct KeywordFilter {
    keyword: Option<String>,
}

impl KeywordFilter {
    pub fn new(keyword: Option<&str>) -> KeywordFilter {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string);
        KeywordFilter { keyword }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.keyword.as_deref().map(|keyword| matches_any(name, keyword)).unwrap_or(true)
    }

    pub fn retain(&self, mut events: Vec<Event>) -> Vec<Event> {
        let before = events.len();
        events.retain(|event| self.is_match(&event.name));
        if let Some(keyword) = &self.keyword {
            debug!("Keyword {:?} kept {} of {} events", keyword, events.len(), before);
        }
        events
    }
}
