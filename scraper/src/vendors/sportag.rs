use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::macros::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(30);
const PHOTO_HOST: &str = "photos.sportag.net";

pub struct Sportag;

fn sportag_event_id(href: &str) -> Option<EventId> {
    regex!(r"event_id=(\d+)").captures(href).and_then(|captures| captures[1].parse().ok()).map(EventId::Numeric)
}

fn is_count(text: &str) -> bool {
    regex!(r"^\d[\d,]*$").is_match(text)
}

/// Drops the `(購買原圖…)` purchase hint Sportag appends to event names.
fn strip_purchase_hint(name: &str) -> String {
    clean_text(&regex!(r"[(（]\s*購買原圖.*?[)）]").replace_all(name, ""))
}

fn parse_event_card(link: &ElementRef, id: EventId) -> Event {
    let text = element_text(link);
    let date = regex!(r"\d{4}-\d{2}-\d{2}").find(&text).map(|m| m.as_str().to_string()).unwrap_or_default();
    let name = regex!(r"\d{4}-\d{2}-\d{2}").replace_all(&text, "");
    let photo_count = parent_element(link).and_then(|card| {
        card.select(selector!("div, span, p"))
            .map(|elem| element_text(&elem))
            .find(|text| is_count(text))
            .and_then(|text| parse_count(&text))
    });
    Event {
        date,
        photo_count,
        url: link.value().attr("href").and_then(|href| absolute_url(concatcp!(SPORTAG_BASE_URL, "/"), href)),
        ..Event::new(id, strip_purchase_hint(&name))
    }
}

fn parse_event_page(html: &str) -> Vec<Event> {
    let document = Html::parse_document(html);
    let events = document
        .select(selector!(r#"a[href*="event-photo.php?event_id="]"#))
        .filter_map(|link| {
            let id = sportag_event_id(link.value().attr("href")?)?;
            Some(parse_event_card(&link, id))
        })
        .filter(|event| !event.name.is_empty())
        .collect();
    dedup_events(events)
}

fn background_image_url(style: &str) -> Option<&str> {
    regex!(r#"background-image\s*:\s*url\(\s*['"]?([^'")]+)['"]?\s*\)"#)
        .captures(style)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn parse_search_page(html: &str, result: &mut SearchResult) {
    let document = Html::parse_document(html);
    let root = document.root_element();
    result.event_name = first_text(&root, selector!("title")).and_then(|title| {
        regex!(r"賽事:\s*(.+?)\s*-\s*運動標籤").captures(&title).map(|captures| strip_purchase_hint(&captures[1]))
    });
    let count = document.select(selector!("h6")).map(|h6| element_text(&h6)).find(|text| is_count(text));

    for link in document.select(selector!("a")) {
        let text = element_text(&link);
        if let Some(captures) = regex!(r"ID:\s*(\d+)\s+(\d{1,2}:\d{2}:\d{2})").captures(&text) {
            result.photos.push(Photo {
                id: captures[1].to_string(),
                time: captures[2].to_string(),
                url: link.value().attr("href").and_then(|href| absolute_url(concatcp!(SPORTAG_BASE_URL, "/"), href)),
                ..Default::default()
            });
        }
    }

    let mut seen = HashSet::new();
    for elem in root.descendants().filter_map(ElementRef::wrap) {
        let url = match elem.value().name() {
            "img" => elem.value().attr("src"),
            _ => elem.value().attr("style").and_then(background_image_url),
        };
        if let Some(url) = url.filter(|url| url.contains(PHOTO_HOST)) {
            if seen.insert(url) {
                result.image_urls.push(url.to_string());
            }
        }
    }

    result.total_count = count.and_then(|text| parse_count(&text)).unwrap_or(result.photos.len() as u64);
}

#[async_trait(?Send)]
impl EventSource for Sportag {
    fn vendor(&self) -> Vendor {
        Vendor::Sportag
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostRecentDate
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let url = concatcp!(SPORTAG_BASE_URL, "/event.php");
        let mut events = Vec::new();
        let mut seen = HashSet::new();
        let mut pages = Pages::starting_at(1).max_pages(SPORTAG_MAX_LIST_PAGES);
        while let Some(page_number) = pages.next_page() {
            let params = if page_number > 1 { vec![("page", page_number.to_string())] } else { Vec::new() };
            let html = match fetcher.get_text(url, &params, TIMEOUT).await {
                Ok(html) => html,
                // Later pages are optional; only the first one has to load
                Err(err) if page_number > 1 => {
                    warn!("Could not fetch Sportag event page {}: {:?}", page_number, err);
                    break;
                }
                Err(err) => return Err(err.context("Failed to fetch Sportag events")),
            };
            let unseen: Vec<Event> =
                parse_event_page(&html).into_iter().filter(|event| seen.insert(event.id.clone())).collect();
            events.extend(pages.record(Page::new(unseen, None)));
        }
        let mut events = query.filter().retain(events);
        self.tie_break().sort(&mut events);
        Ok(events)
    }

    async fn search_by_bib(
        &self,
        fetcher: &Fetcher,
        event_id: &EventId,
        bib: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        let url = concatcp!(SPORTAG_BASE_URL, "/event-photo.php");
        let search_url = format!("{}?event_id={}&code={}", url, event_id, bib);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, &search_url);
        let query = [("event_id", event_id.to_string()), ("code", bib.to_string())];
        let html = fetcher.get_text(url, &query, TIMEOUT).await.context("Failed to search Sportag photos")?;
        parse_search_page(&html, &mut result);
        result.photos.truncate(options.max);
        result.image_urls.truncate(options.max);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_event_page() {
        let html = r#"
            <div class="card">
              <a href="event-photo.php?event_id=1201"><img src="cover.jpg"></a>
              <a href="event-photo.php?event_id=1201">2025-11-09 田中馬拉松 (購買原圖請至官網)</a>
              <div>38,200</div>
            </div>
            <div class="card">
              <a href="https://www.sportag.net/web/event-photo.php?event_id=1188">2025-10-19 臺中花博馬拉松</a>
              <div>photos</div>
            </div>"#;
        let events = parse_event_page(html);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, EventId::Numeric(1201));
        assert_eq!(events[0].name, "田中馬拉松");
        assert_eq!(events[0].date, "2025-11-09");
        assert_eq!(events[0].photo_count, Some(38200));
        assert_eq!(events[0].url.as_deref(), Some("https://www.sportag.net/web/event-photo.php?event_id=1201"));
        assert_eq!(events[1].name, "臺中花博馬拉松");
        assert_eq!(events[1].photo_count, None);
    }

    #[test]
    fn test_parse_search_page() {
        let html = r#"<html><head><title>賽事: 2025 田中馬拉松(購買原圖請洽主辦) - 運動標籤</title></head><body>
            <h6>總張數</h6><h6>3</h6>
            <a href="photo.php?id=77001"><img src="https://photos.sportag.net/s/77001.jpg"> ID: 77001 08:12:45</a>
            <a href="photo.php?id=77002"><div style="background-image: url('https://photos.sportag.net/s/77002.jpg')"></div>
               ID: 77002 08:13:02</a>
            <img src="https://photos.sportag.net/s/77001.jpg"><img src="/logo.png">
            </body></html>"#;
        let mut result = SearchResult::new(Vendor::Sportag, EventId::Numeric(1201), "1234", "u");
        parse_search_page(html, &mut result);
        assert_eq!(result.event_name.as_deref(), Some("2025 田中馬拉松"));
        assert_eq!(result.total_count, 3);
        assert_eq!(result.photos.len(), 2);
        assert_eq!(result.photos[0].id, "77001");
        assert_eq!(result.photos[0].time, "08:12:45");
        assert_eq!(result.photos[1].time, "08:13:02");
        assert_eq!(
            result.image_urls,
            vec!["https://photos.sportag.net/s/77001.jpg", "https://photos.sportag.net/s/77002.jpg"]
        );
    }

    #[test]
    fn test_unseen_pages_stop_listing() {
        let page = parse_event_page(r#"<a href="event-photo.php?event_id=1">2025-01-01 A 路跑</a>"#);
        let mut seen = HashSet::new();
        let mut pages = Pages::starting_at(1).max_pages(SPORTAG_MAX_LIST_PAGES);
        for _ in 0..2 {
            assert!(pages.next_page().is_some());
            let unseen: Vec<Event> = page.iter().filter(|e| seen.insert(e.id.clone())).cloned().collect();
            pages.record(Page::new(unseen, None));
        }
        assert_eq!(pages.next_page(), None);
    }
}
