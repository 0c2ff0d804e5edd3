use std::io::{self, Write};

use crate::imports::*;

const MAX_LISTED_EVENTS: usize = 20;
const MAX_LISTED_ZSPORT_EVENTS: usize = 30;
const MAX_LISTED_PHOTOS: usize = 10;

fn event_display_limit(vendor: Vendor) -> usize {
    match vendor {
        Vendor::Zsport => MAX_LISTED_ZSPORT_EVENTS,
        _ => MAX_LISTED_EVENTS,
    }
}

/// `48213` becomes `48,213`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }
    formatted
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to write JSON")?;
    writeln!(out)?;
    Ok(())
}

fn write_event_text(out: &mut impl Write, event: &Event) -> io::Result<()> {
    let date = if event.date.is_empty() { "----------" } else { event.date.as_str() };
    writeln!(out, "  [{}] {} {}", event.id, date, event.name)?;
    let mut facts = Vec::new();
    if let Some(location) = &event.location {
        facts.push(location.clone());
    }
    if let Some(photo_count) = event.photo_count {
        facts.push(format!("{} photos", format_count(photo_count)));
    }
    if let Some(photographers) = event.photographers {
        facts.push(format!("{} photographers", photographers));
    }
    if let Some(photographer) = &event.photographer {
        facts.push(format!("by {}", photographer));
    }
    if !event.categories.is_empty() {
        facts.push(event.categories.join("/"));
    }
    if let Some(days_left) = event.days_left {
        facts.push(format!("{} days left", days_left));
    }
    if !facts.is_empty() {
        writeln!(out, "      {}", facts.join(" | "))?;
    }
    if let Some(url) = &event.url {
        writeln!(out, "      {}", url)?;
    }
    Ok(())
}

pub fn write_events(out: &mut impl Write, vendor: Vendor, events: &[Event], json: bool) -> Result<()> {
    if json {
        return write_json(out, events);
    }
    if events.is_empty() {
        writeln!(out, "No {} events found", vendor.display_name())?;
        return Ok(());
    }
    writeln!(out, "{}: {} event(s)", vendor.display_name(), events.len())?;
    let limit = event_display_limit(vendor);
    for event in events.iter().take(limit) {
        write_event_text(out, event)?;
    }
    if events.len() > limit {
        writeln!(out, "  ... {} more", events.len() - limit)?;
    }
    Ok(())
}

fn write_photo_text(out: &mut impl Write, index: usize, photo: &Photo) -> io::Result<()> {
    let mut line = format!("  {:>2}. {}", index + 1, photo.id);
    if !photo.time.is_empty() {
        line.push_str(&format!(" @ {}", photo.time));
    }
    if let Some(photographer) = &photo.photographer {
        line.push_str(&format!(" by {}", photographer));
    }
    if let Some(category) = &photo.category {
        line.push_str(&format!(" [{}]", category));
    }
    if !photo.bib_numbers.is_empty() {
        line.push_str(&format!(" bibs: {}", photo.bib_numbers.join(", ")));
    }
    writeln!(out, "{}", line)?;
    if let Some(url) = photo.url.as_ref().or(photo.thumbnail.as_ref()) {
        writeln!(out, "      {}", url)?;
    }
    Ok(())
}

pub fn write_search_result(out: &mut impl Write, result: &SearchResult, json: bool) -> Result<()> {
    if json {
        return write_json(out, result);
    }
    writeln!(out, "{} bib {}", result.vendor.display_name(), result.bib_number)?;
    let event_name = result.event_name.as_deref().unwrap_or("(unknown event)");
    match &result.event_date {
        Some(date) => writeln!(out, "Event: {} [{}] {}", event_name, result.event_id, date)?,
        None => writeln!(out, "Event: {} [{}]", event_name, result.event_id)?,
    }
    let mut found = format!("Found: {} photo(s)", format_count(result.total_count));
    if let Some(fetched) = result.fetched_count {
        found.push_str(&format!(", {} fetched", fetched));
    }
    if let Some(total) = result.total_event_photos {
        found.push_str(&format!(" out of {} in the event", format_count(total)));
    }
    if result.fuzzy == Some(true) {
        found.push_str(" (fuzzy)");
    }
    writeln!(out, "{}", found)?;
    if let Some(price) = result.price {
        writeln!(out, "Price: NT${}", format_count(price.into()))?;
    }
    if let Some(possible) = result.possible_matches {
        writeln!(out, "Possible matches: {}", format_count(possible))?;
    }
    if let Some(more_url) = &result.more_url {
        writeln!(out, "More: {}", more_url)?;
    }
    for (index, photo) in result.photos.iter().take(MAX_LISTED_PHOTOS).enumerate() {
        write_photo_text(out, index, photo)?;
    }
    if result.photos.len() > MAX_LISTED_PHOTOS {
        writeln!(out, "  ... {} more", result.photos.len() - MAX_LISTED_PHOTOS)?;
    }
    if !result.image_urls.is_empty() {
        writeln!(out, "Images:")?;
        for url in result.image_urls.iter().take(MAX_LISTED_PHOTOS) {
            writeln!(out, "  {}", url)?;
        }
        if result.image_urls.len() > MAX_LISTED_PHOTOS {
            writeln!(out, "  ... {} more", result.image_urls.len() - MAX_LISTED_PHOTOS)?;
        }
    }
    for note in &result.notes {
        writeln!(out, "Note: {}", note)?;
    }
    writeln!(out, "Search: {}", result.search_url)?;
    Ok(())
}

pub fn write_detail(out: &mut impl Write, detail: &EventDetail, json: bool) -> Result<()> {
    if json {
        return write_json(out, detail);
    }
    writeln!(out, "[{}] {}", detail.id, detail.name)?;
    if let Some(date) = &detail.date {
        writeln!(out, "Date: {}", date)?;
    }
    if let Some(photographer) = &detail.photographer {
        writeln!(out, "Photographer: {}", photographer)?;
    }
    if let Some(photo_count) = detail.photo_count {
        writeln!(out, "Photos: {}", format_count(photo_count))?;
    }
    if let Some(identified) = detail.identified {
        writeln!(out, "Identified: {}", format_count(identified))?;
    }
    if let Some(coverage) = &detail.bib_coverage {
        writeln!(out, "Bib coverage: {}", coverage)?;
    }
    if !detail.locations.is_empty() {
        writeln!(out, "Locations: {}", detail.locations.join(", "))?;
    }
    for category in &detail.categories {
        writeln!(out, "  {}: {}", category.name, format_count(category.photo_count))?;
    }
    if let Some(url) = &detail.url {
        writeln!(out, "{}", url)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> Result<String> {
        let mut out = Vec::new();
        f(&mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(48213), "48,213");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_events_text_is_truncated() -> Result<()> {
        let events: Vec<Event> = (1..=25).map(|i| Event::new(EventId::Numeric(i), format!("路跑 {}", i))).collect();
        let text = render(|out| write_events(out, Vendor::Ctrun, &events, false))?;
        assert!(text.starts_with("全統運動 CTRun: 25 event(s)\n"));
        assert!(text.contains("  [20] ---------- 路跑 20\n"));
        assert!(!text.contains("路跑 21"));
        assert!(text.ends_with("  ... 5 more\n"));

        let text = render(|out| write_events(out, Vendor::Zsport, &events, false))?;
        assert!(text.contains("路跑 25"));
        assert!(!text.contains("more"));
        Ok(())
    }

    #[test]
    fn test_events_json() -> Result<()> {
        let mut event = Event::new(EventId::code("TZ2025"), "田中馬拉松");
        event.photo_count = Some(12);
        let text = render(|out| write_events(out, Vendor::Phomi, &[event], true))?;
        let value: Value = serde_json::from_str(&text)?;
        assert_eq!(value[0]["id"], "TZ2025");
        assert_eq!(value[0]["photo_count"], 12);
        assert!(text.contains("田中馬拉松"));
        Ok(())
    }

    #[test]
    fn test_search_result_text() -> Result<()> {
        let mut result = SearchResult::new(Vendor::Goodshot, EventId::Numeric(51), "1234", "https://x/51");
        result.event_name = Some("田中馬拉松".to_string());
        result.total_count = 12;
        result.photos = (0..12).map(|i| Photo { id: format!("p{}", i), ..Default::default() }).collect();
        result.notes.push("note".to_string());
        let text = render(|out| write_search_result(out, &result, false))?;
        assert!(text.contains("Event: 田中馬拉松 [51]\n"));
        assert!(text.contains("Found: 12 photo(s)\n"));
        assert!(text.contains("  10. p9\n"));
        assert!(!text.contains("p10"));
        assert!(text.contains("  ... 2 more\n"));
        assert!(text.ends_with("Note: note\nSearch: https://x/51\n"));
        Ok(())
    }

    #[test]
    fn test_detail_text() -> Result<()> {
        let mut detail = EventDetail::new(EventId::Numeric(812), "田中馬拉松");
        detail.categories.push(Category { name: "終點".to_string(), photo_count: 1200 });
        let text = render(|out| write_detail(out, &detail, false))?;
        assert_eq!(text, "[812] 田中馬拉松\n  終點: 1,200\n");
        Ok(())
    }
}
