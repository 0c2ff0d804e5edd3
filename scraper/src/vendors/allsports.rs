use async_trait::async_trait;
use serde_json::Map;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::macros::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(60);

pub struct AllSports;

#[derive(Debug, Deserialize)]
struct MasterEvent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: String,
}

#[derive(Debug, Deserialize)]
struct PhotoCount {
    #[serde(default)]
    count: Value,
}

#[derive(Debug, Deserialize)]
struct ListedPhoto {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    time: Value,
    image: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
struct SearchPage {
    event_name: Option<String>,
    price: Option<u32>,
}

/// Event pages are addressed by the id zero-padded to eight digits.
fn event_code(event_id: &EventId) -> String {
    match event_id.numeric() {
        Some(n) => format!("{:08}", n),
        None => event_id.to_string(),
    }
}

fn parse_event_list(html: &str) -> Result<Vec<Event>> {
    let captures = match regex!(r"(?s)events\['master'\]\s*=\s*//\{\s*\n\s*(\{.+?\})\s*\n").captures(html) {
        Some(captures) => captures,
        None => {
            warn!("AllSports home page has no event data");
            return Ok(Vec::new());
        }
    };
    let master: Map<String, Value> = parse_json(&captures[1]).context("Failed to parse AllSports event data")?;
    let mut events = Vec::new();
    for (id_text, value) in master {
        let inner = || {
            let id = EventId::Numeric(id_text.parse()?);
            let info: MasterEvent = serde_json::from_value(value)?;
            Ok(Event {
                date: normalize_event_date(&info.date),
                url: Some(format!("{}/event/{}.html", ALLSPORTS_BASE_URL, event_code(&id))),
                ..Event::new(id, info.name.trim())
            }) as Result<_>
        };
        match inner() {
            Ok(event) => events.push(event),
            Err(err) => warn!("Skipping AllSports event {:?}: {}", id_text, err),
        }
    }
    Ok(events)
}

fn photo_from_listing(photo: ListedPhoto) -> Photo {
    Photo {
        id: json_text(&photo.id).unwrap_or_default(),
        time: json_text(&photo.time).unwrap_or_default(),
        thumbnail: photo.image.filter(|s| !s.is_empty()),
        url: photo.detail.filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

fn parse_search_page(html: &str, event_id: &EventId) -> Result<SearchPage> {
    let document = Html::parse_document(html);
    let breadcrumb_regex = Regex::new(&format!(r"/event/\d*{}\.html", regex::escape(&event_id.to_string())))?;
    let event_name = document
        .select(selector!("a[href]"))
        .find(|a| a.value().attr("href").map_or(false, |href| breadcrumb_regex.is_match(href)))
        .map(|a| element_text(&a))
        .filter(|s| !s.is_empty());
    let price = document
        .root_element()
        .text()
        .find(|text| regex!(r"優惠価格.*元").is_match(text))
        .and_then(|text| regex!(r"(\d+)\s*元").captures(text))
        .and_then(|captures| captures[1].parse().ok());
    Ok(SearchPage { event_name, price })
}

fn parse_event_detail(html: &str, event_id: &EventId, url: &str) -> EventDetail {
    let document = Html::parse_document(html);
    let mut detail = EventDetail { url: Some(url.to_string()), ..EventDetail::new(event_id.clone(), "") };
    if let Some(title) = first_text(&document.root_element(), selector!("h1")) {
        match regex!(r"^(.+?)\s*\((\d{4})年(\d{1,2})月(\d{1,2})日\)").captures(&title) {
            Some(captures) => {
                detail.name = captures[1].trim().to_string();
                detail.date = Some(format!("{}-{:0>2}-{:0>2}", &captures[2], &captures[3], &captures[4]));
            }
            None => detail.name = title,
        }
    }
    for location in document.select(selector!("em")).map(|em| element_text(&em)) {
        if !location.is_empty() && !detail.locations.contains(&location) {
            detail.locations.push(location);
        }
    }
    detail
}

#[async_trait(?Send)]
impl EventSource for AllSports {
    fn vendor(&self) -> Vendor {
        Vendor::Allsports
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostRecentDate
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let url = concatcp!(ALLSPORTS_BASE_URL, "/");
        let html = fetcher.get_text(url, &[], TIMEOUT).await.context("Failed to connect to AllSports")?;
        let mut events = query.filter().retain(dedup_events(parse_event_list(&html)?));
        self.tie_break().sort(&mut events);
        Ok(events)
    }

    async fn search_by_bib(
        &self,
        fetcher: &Fetcher,
        event_id: &EventId,
        bib: &str,
        _options: &SearchOptions,
    ) -> Result<SearchResult> {
        let path = format!("{id}/{id}/zekken/{bib}", id = event_id, bib = bib);
        let search_url = format!("{}/view/{}/", ALLSPORTS_BASE_URL, path);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, &search_url);

        // The count, photo list and search page are independent; each one may fail alone.
        let count_url = format!("{}/ajax/photo/count/{}/", ALLSPORTS_BASE_URL, path);
        match fetcher.get_json::<PhotoCount>(&count_url, &[], TIMEOUT).await {
            Ok(count) => result.total_count = json_u64(&count.count).unwrap_or(0),
            Err(err) => warn!("Could not fetch AllSports photo count: {:?}", err),
        }

        let list_url = format!("{}/ajax/photo/list/{}/0/", ALLSPORTS_BASE_URL, path);
        match fetcher.get_json::<Vec<ListedPhoto>>(&list_url, &[], TIMEOUT).await {
            Ok(photos) => result.photos = photos.into_iter().map(photo_from_listing).collect(),
            Err(err) => warn!("Could not fetch AllSports photo list: {:?}", err),
        }

        let page = match fetcher.get_text(&search_url, &[], TIMEOUT).await {
            Ok(html) => parse_search_page(&html, event_id)?,
            Err(err) => {
                warn!("Could not fetch AllSports search page: {:?}", err);
                SearchPage::default()
            }
        };
        result.event_name = page.event_name;
        result.price = page.price;
        Ok(result)
    }

    async fn event_detail(&self, fetcher: &Fetcher, event_id: &EventId) -> Result<EventDetail> {
        let url = format!("{}/event/{}.html", ALLSPORTS_BASE_URL, event_code(event_id));
        let html = fetcher.get_text(&url, &[], TIMEOUT).await.context("Failed to fetch AllSports event details")?;
        Ok(parse_event_detail(&html, event_id, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME_HTML: &str = concat!(
        "<html><script>\nvar events = {};\n",
        "events['master'] = //{\n",
        "    {\"778854\": {\"name\": \"2026 高雄富邦馬拉松\", \"date\": \"2026/01/11\"}, ",
        "\"700001\": {\"name\": \"2025 臺北馬拉松\", \"date\": \"2025-12-21\"}, ",
        "\"x\": {\"name\": \"broken\"}}\n",
        "//}\n</script></html>"
    );

    #[test]
    fn test_parse_event_list() -> Result<()> {
        let events = parse_event_list(HOME_HTML)?;
        assert_eq!(events.len(), 2);
        let kaohsiung = events.iter().find(|e| e.id == EventId::Numeric(778854)).unwrap();
        assert_eq!(kaohsiung.name, "2026 高雄富邦馬拉松");
        assert_eq!(kaohsiung.date, "2026-01-11");
        assert_eq!(kaohsiung.url.as_deref(), Some("https://allsports.tw/event/00778854.html"));
        Ok(())
    }

    #[test]
    fn test_parse_event_list_without_data() -> Result<()> {
        assert!(parse_event_list("<html></html>")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_listing_filters_and_sorts() -> Result<()> {
        let mut events = ListQuery::keyword("台北").filter().retain(parse_event_list(HOME_HTML)?);
        AllSports.tie_break().sort(&mut events);
        assert_eq!(events.iter().map(|e| e.id.clone()).collect::<Vec<_>>(), vec![EventId::Numeric(700001)]);
        Ok(())
    }

    #[test]
    fn test_photo_from_listing() -> Result<()> {
        let photos: Vec<ListedPhoto> = parse_json(
            r#"[{"id": 991, "time": "08:15:02", "image": "https://img.allsports.tw/t/991.jpg", "detail": ""}]"#,
        )?;
        let photo = photo_from_listing(photos.into_iter().next().unwrap());
        assert_eq!(photo.id, "991");
        assert_eq!(photo.time, "08:15:02");
        assert_eq!(photo.thumbnail.as_deref(), Some("https://img.allsports.tw/t/991.jpg"));
        assert_eq!(photo.url, None);
        Ok(())
    }

    #[test]
    fn test_parse_search_page() -> Result<()> {
        let html = r#"<ul class="breadcrumb"><li><a href="/">Top</a></li>
            <li><a href="/event/00778854.html"> 2026 高雄富邦馬拉松 </a></li></ul>
            <div class="package"><p>全照片套餐 優惠価格 990 元 (税込)</p></div>"#;
        let page = parse_search_page(html, &EventId::Numeric(778854))?;
        assert_eq!(page.event_name.as_deref(), Some("2026 高雄富邦馬拉松"));
        assert_eq!(page.price, Some(990));
        assert_eq!(parse_search_page("<p>none</p>", &EventId::Numeric(1))?, SearchPage::default());
        Ok(())
    }

    #[test]
    fn test_parse_event_detail() {
        let html = "<h1>2026 高雄富邦馬拉松 (2026年1月11日)</h1><em>起點</em><em>10K</em><em>起點</em><em> </em>";
        let detail = parse_event_detail(html, &EventId::Numeric(778854), "https://allsports.tw/event/00778854.html");
        assert_eq!(detail.name, "2026 高雄富邦馬拉松");
        assert_eq!(detail.date.as_deref(), Some("2026-01-11"));
        assert_eq!(detail.locations, vec!["起點", "10K"]);
    }

    #[test]
    fn test_event_code() {
        assert_eq!(event_code(&EventId::Numeric(778854)), "00778854");
        assert_eq!(event_code(&EventId::code("00778854")), "00778854");
    }
}
