use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::macros::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(20);

pub struct Phomi;

fn act_code(href: &str) -> Option<EventId> {
    regex!(r"ActCode=([^&#]+)").captures(href).map(|captures| EventId::code(captures[1].trim()))
}

/// The listing endpoint returns bare `<tr>` rows that only parse inside a table.
fn parse_activity_rows(fragment: &str) -> Vec<Event> {
    let document = Html::parse_fragment(&format!("<table>{}</table>", fragment));
    let events = document
        .select(selector!("tr"))
        .filter_map(|row| {
            let link = row.select(selector!(r#"a[href*="ActCode="]"#)).next()?;
            let href = link.value().attr("href")?;
            let id = act_code(href)?;
            let cells: Vec<String> = row.select(selector!("td")).map(|td| element_text(&td)).collect();
            let cell = |i: usize| cells.get(i).filter(|s| !s.is_empty());
            Some(Event {
                date: cell(0).map(|s| normalize_event_date(s)).unwrap_or_default(),
                location: cell(2).cloned(),
                photographers: cell(3).and_then(|s| parse_count(s)),
                photo_count: cell(4).and_then(|s| parse_count(s)),
                url: absolute_url(PHOMI_BASE_URL, href),
                ..Event::new(id, element_text(&link))
            })
        })
        .filter(|event| !event.name.is_empty())
        .collect();
    dedup_events(events)
}

fn parse_search_page(html: &str, result: &mut SearchResult) {
    let document = Html::parse_document(html);
    let root = document.root_element();
    if let Some(title) = first_text(&root, selector!("h3")) {
        match regex!(r"^(\d{4}[-/.]\d{1,2}[-/.]\d{1,2})\s*-\s*(.+)$").captures(&title) {
            Some(captures) => {
                result.event_date = Some(normalize_event_date(&captures[1]));
                result.event_name = Some(captures[2].trim().to_string());
            }
            None => result.event_name = Some(title),
        }
    }
    let text = raw_text(&root);
    result.total_count = regex!(r"找到.*?照片\s*(\d+)\s*張")
        .captures(&text)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0);
    if let Some(more) = document.select(selector!(r#"a[href*="bib-found-photo-more.php"]"#)).next() {
        result.possible_matches = regex!(r"(\d+)\s*張").captures(&raw_text(&more)).and_then(|c| c[1].parse().ok());
        result.more_url = more.value().attr("href").and_then(|href| absolute_url(PHOMI_BASE_URL, href));
    }
    for link in document.select(selector!(r#"a[href*="PhotoID="]"#)) {
        let href = link.value().attr("href").unwrap_or_default();
        let id = regex!(r"PhotoID=([^&#]+)").captures(href).map(|c| c[1].to_string()).unwrap_or_default();
        let thumbnail = link
            .select(selector!("img"))
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| absolute_url(PHOMI_BASE_URL, src));
        result.photos.push(Photo { id, url: absolute_url(PHOMI_BASE_URL, href), thumbnail, ..Default::default() });
    }
}

#[async_trait(?Send)]
impl EventSource for Phomi {
    fn vendor(&self) -> Vendor {
        Vendor::Phomi
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostPhotos
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let url = concatcp!(PHOMI_BASE_URL, "/activity-list-load.php");
        let fragment = fetcher.get_text(url, &[], TIMEOUT).await.context("Failed to fetch Phomi activities")?;
        let mut events = query.filter().retain(parse_activity_rows(&fragment));
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
        let url = concatcp!(PHOMI_BASE_URL, "/bib-found-photo.php");
        let search_url = format!("{}?bibtxt={}&ActCode={}", url, bib, event_id);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, &search_url);
        let query = [("bibtxt", bib.to_string()), ("ActCode", event_id.to_string())];
        let html = fetcher.get_text(url, &query, TIMEOUT).await.context("Failed to search Phomi photos")?;
        parse_search_page(&html, &mut result);
        result.photos.truncate(options.max);
        Ok(result)
    }
}
