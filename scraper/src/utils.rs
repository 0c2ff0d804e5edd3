use scraper::Node;

use crate::imports::*;
use crate::macros::*;

pub fn element_text(elem: &ElementRef) -> String {
    element_texts(elem).join(" ")
}

pub fn element_texts(elem: &ElementRef) -> Vec<String> {
    elem.text().map(|s| regex!(r"\s+").replace_all(s, " ").trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Text of all descendant text nodes concatenated as-is.
pub fn raw_text(elem: &ElementRef) -> String {
    elem.text().collect()
}

pub fn first_text(elem: &ElementRef, selector: &Selector) -> Option<String> {
    elem.select(selector).next().map(|e| element_text(&e)).filter(|s| !s.is_empty())
}

pub fn parent_element<'a>(elem: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    elem.parent().and_then(ElementRef::wrap)
}

pub fn ancestor_elements<'a>(elem: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    elem.ancestors().filter_map(ElementRef::wrap)
}

pub fn has_class(elem: &ElementRef, class: &str) -> bool {
    elem.value().classes().any(|c| c == class)
}

/// First non-blank text node following `elem` among its siblings.
pub fn next_sibling_text(elem: &ElementRef) -> Option<String> {
    elem.next_siblings().find_map(|node| match node.value() {
        Node::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    })
}

pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

/// Vendor APIs send ids and counts as either JSON strings or numbers.
pub fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn json_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn json_event_id(value: &Value) -> Option<EventId> {
    match value {
        Value::Number(n) => n.as_u64().map(EventId::Numeric),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Keeps the first event for each id.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events.into_iter().filter(|event| seen.insert(event.id.clone())).collect()
}
