use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::macros::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(30);

pub struct CtRun;

fn album_event_id(href: &str) -> Option<EventId> {
    regex!(r"EventMain_ID=(\d+)").captures(href).and_then(|captures| captures[1].parse().ok()).map(EventId::Numeric)
}

fn parse_card_date(text: &str) -> String {
    regex!(r"\d{4}\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日")
        .find(text)
        .map(|m| normalize_event_date(m.as_str()))
        .unwrap_or_default()
}

fn parse_album_card(link: &ElementRef, id: EventId) -> Event {
    let card = ancestor_elements(link).find(|elem| has_class(elem, "pri_table_list"));
    let card_name = card.and_then(|card| {
        let title = first_text(&card, selector!("h4"))?;
        Some(match first_text(&card, selector!("h6")) {
            Some(year) => format!("{} {}", year, title),
            None => title,
        })
    });
    let name = card_name
        .or_else(|| Some(element_text(link)).filter(|s| !s.is_empty()))
        .or_else(|| {
            let img = link.select(selector!("img")).next()?;
            img.value().attr("alt").or_else(|| img.value().attr("title")).map(clean_text)
        })
        .unwrap_or_default();
    let scope = card.unwrap_or(*link);
    let location = scope
        .select(selector!(r#"i[class*="fa-map"]"#))
        .next()
        .and_then(|icon| next_sibling_text(&icon));
    Event {
        date: parse_card_date(&raw_text(&scope)),
        location,
        url: link.value().attr("href").and_then(|href| absolute_url(CTRUN_BASE_URL, href)),
        ..Event::new(id, name)
    }
}

fn parse_album_list(html: &str) -> Vec<Event> {
    let document = Html::parse_document(html);
    let events = document
        .select(selector!(r#"a[href*="EventMain_ID="]"#))
        .filter_map(|link| {
            let id = album_event_id(link.value().attr("href")?)?;
            Some(parse_album_card(&link, id))
        })
        .filter(|event| !event.name.is_empty())
        .collect();
    dedup_events(events)
}

fn photo_filename(href: &str) -> String {
    let path = href.split(&['?', '#'][..]).next().unwrap_or(href);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn parse_search_page(html: &str, result: &mut SearchResult) {
    let document = Html::parse_document(html);
    result.event_name = first_text(&document.root_element(), selector!("h2"));
    let mut seen = HashSet::new();
    for link in document.select(selector!(r#"a[href*="ctrunstorage.blob.core.windows.net"]"#)) {
        let href = match link.value().attr("href") {
            Some(href) if seen.insert(href.to_string()) => href,
            _ => continue,
        };
        let img = link.select(selector!("img")).next();
        result.photos.push(Photo {
            id: photo_filename(href),
            url: Some(href.to_string()),
            thumbnail: img.and_then(|img| img.value().attr("src")).map(str::to_string),
            category: img.and_then(|img| img.value().attr("alt")).map(clean_text).filter(|s| !s.is_empty()),
            ..Default::default()
        });
    }
    result.total_count = result.photos.len() as u64;
}

/// Decoded `Category` parameter of an `/Album/Photos?…` link.
fn category_name(href: &str) -> Option<String> {
    if !regex!(r"/Album/Photos\?.*Category=").is_match(href) {
        return None;
    }
    let url = reqwest::Url::parse(&absolute_url(CTRUN_BASE_URL, href)?).ok()?;
    let (_, name) = url.query_pairs().find(|(key, _)| key == "Category")?;
    Some(name.trim().to_string()).filter(|name| !name.is_empty())
}

fn parse_event_detail(html: &str, event_id: &EventId, url: &str) -> EventDetail {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut detail = EventDetail {
        url: Some(url.to_string()),
        ..EventDetail::new(event_id.clone(), first_text(&root, selector!("h2")).unwrap_or_default())
    };
    detail.date = Some(parse_card_date(&raw_text(&root))).filter(|s| !s.is_empty());
    detail.bib_coverage = root
        .text()
        .filter(|text| regex!(r"已經有.*的照片有標記號碼布").is_match(text))
        .find_map(|text| regex!(r"(\d+(?:\.\d+)?)%").captures(text).map(|captures| format!("{}%", &captures[1])));

    // Each category link is followed in document order by an `h6` reading `共 N 張`
    let elements: Vec<ElementRef> = root.descendants().filter_map(ElementRef::wrap).collect();
    for (index, elem) in elements.iter().enumerate() {
        let name = match elem.value().attr("href").filter(|_| elem.value().name() == "a").and_then(category_name) {
            Some(name) => name,
            None => continue,
        };
        if detail.categories.iter().any(|category| category.name == name) {
            continue;
        }
        let photo_count = elements[index + 1..]
            .iter()
            .filter(|next| next.value().name() == "h6")
            .map(element_text)
            .find(|text| regex!(r"共.*張").is_match(text))
            .and_then(|text| parse_count(&text))
            .unwrap_or(0);
        detail.categories.push(Category { name, photo_count });
    }
    detail.photo_count = Some(detail.categories.iter().map(|c| c.photo_count).sum()).filter(|n| *n > 0);
    detail
}

#[async_trait(?Send)]
impl EventSource for CtRun {
    fn vendor(&self) -> Vendor {
        Vendor::Ctrun
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::HighestId
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let html = fetcher.get_text(CTRUN_ALBUM_URL, &[], TIMEOUT).await.context("Failed to fetch CTRun albums")?;
        let mut events = query.filter().retain(parse_album_list(&html));
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
        let url = concatcp!(CTRUN_ALBUM_URL, "/NumPhotos");
        let query = [("EventMain_ID", event_id.to_string()), ("Num", bib.to_string())];
        let search_url = format!("{}?EventMain_ID={}&Num={}", url, event_id, bib);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, search_url);
        let html = fetcher.get_text(url, &query, TIMEOUT).await.context("Failed to search CTRun photos")?;
        parse_search_page(&html, &mut result);
        result.photos.truncate(options.max);
        Ok(result)
    }

    async fn event_detail(&self, fetcher: &Fetcher, event_id: &EventId) -> Result<EventDetail> {
        let url = format!("{}/Detail?EventMain_ID={}", CTRUN_ALBUM_URL, event_id);
        let html = fetcher.get_text(&url, &[], TIMEOUT).await.context("Failed to fetch CTRun event details")?;
        Ok(parse_event_detail(&html, event_id, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUM_HTML: &str = r#"
        <div class="pri_table_list">
          <a href="/Album/Detail?EventMain_ID=812"><img src="/img/812.jpg" alt="cover"></a>
          <h6>2025</h6><h4>田中馬拉松</h4>
          <p>2025年11月9日</p>
          <p><i class="fa fa-map-marker"></i> 彰化縣田中鎮 </p>
          <a href="/Album/Detail?EventMain_ID=812">看相簿</a>
        </div>
        <div class="pri_table_list">
          <a href="/Album/Detail?EventMain_ID=830"><img src="/img/830.jpg" alt="cover"></a>
          <h6>2026</h6><h4>臺北渣打公益路跑</h4>
          <p>2026年1月4日</p>
        </div>
        <p><a href="https://www.ctrun.com.tw/Album/Detail?EventMain_ID=700"><img src="/x.jpg" alt=" 舊活動 "></a></p>
        <a href="/Album/Index">all</a>"#;

    #[test]
    fn test_parse_album_list() {
        let events = parse_album_list(ALBUM_HTML);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, EventId::Numeric(812));
        assert_eq!(events[0].name, "2025 田中馬拉松");
        assert_eq!(events[0].date, "2025-11-09");
        assert_eq!(events[0].location.as_deref(), Some("彰化縣田中鎮"));
        assert_eq!(events[0].url.as_deref(), Some("https://www.ctrun.com.tw/Album/Detail?EventMain_ID=812"));
        assert_eq!(events[1].name, "2026 臺北渣打公益路跑");
        assert_eq!(events[1].location, None);
        assert_eq!(events[2].name, "舊活動");
        assert_eq!(events[2].date, "");
    }

    #[test]
    fn test_listing_keyword_and_order() {
        let events = ListQuery::keyword("台北路跑").filter().retain(parse_album_list(ALBUM_HTML));
        assert_eq!(events.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["2026 臺北渣打公益路跑"]);
        let mut all = parse_album_list(ALBUM_HTML);
        CtRun.tie_break().sort(&mut all);
        assert_eq!(all.iter().map(|e| e.id.numeric().unwrap()).collect::<Vec<_>>(), vec![830, 812, 700]);
    }

    #[test]
    fn test_parse_search_page() {
        let html = r#"<h2> 2025 田中馬拉松 </h2>
            <a href="https://ctrunstorage.blob.core.windows.net/photo/812/A01_0001.jpg?sv=1">
              <img src="https://ctrunstorage.blob.core.windows.net/thumb/812/A01_0001.jpg" alt="終點"></a>
            <a href="https://ctrunstorage.blob.core.windows.net/photo/812/A01_0001.jpg?sv=1">dup</a>
            <a href="https://ctrunstorage.blob.core.windows.net/photo/812/B02_0107.jpg"><img src="t.jpg"></a>
            <a href="/Album">back</a>"#;
        let mut result = SearchResult::new(Vendor::Ctrun, EventId::Numeric(812), "1234", "u");
        parse_search_page(html, &mut result);
        assert_eq!(result.event_name.as_deref(), Some("2025 田中馬拉松"));
        assert_eq!(result.total_count, 2);
        assert_eq!(result.photos[0].id, "A01_0001.jpg");
        assert_eq!(result.photos[0].category.as_deref(), Some("終點"));
        assert_eq!(result.photos[1].id, "B02_0107.jpg");
        assert_eq!(result.photos[1].category, None);
    }

    #[test]
    fn test_parse_event_detail() {
        let html = r#"<h2>2025 田中馬拉松</h2><p>2025年11月9日</p><p>限時 20% 優惠</p>
            <p>已經有 87.5% 的照片有標記號碼布</p>
            <div class="col"><a href="/Album/Photos?EventMain_ID=812&Category=%E8%B5%B7%E8%B7%91">
              <img src="a.jpg"></a><h6>起跑</h6><h6>共 1,200 張</h6></div>
            <div class="col"><a href="/Album/Photos?EventMain_ID=812&Category=終點">終點</a><h6>共 300 張</h6></div>
            <a href="/Album/Photos?EventMain_ID=812&Category=終點">重複</a>
            <a href="/Album/Photos?EventMain_ID=812&Category=空白">空白</a>"#;
        let detail = parse_event_detail(html, &EventId::Numeric(812), "https://example.test");
        assert_eq!(detail.name, "2025 田中馬拉松");
        assert_eq!(detail.date.as_deref(), Some("2025-11-09"));
        assert_eq!(detail.bib_coverage.as_deref(), Some("87.5%"));
        assert_eq!(
            detail.categories,
            vec![
                Category { name: "起跑".to_string(), photo_count: 1200 },
                Category { name: "終點".to_string(), photo_count: 300 },
                Category { name: "空白".to_string(), photo_count: 0 }
            ]
        );
        assert_eq!(detail.photo_count, Some(1500));
    }

    #[test]
    fn test_photo_filename() {
        assert_eq!(photo_filename("https://a/b/c.jpg?x=1"), "c.jpg");
        assert_eq!(photo_filename("c.jpg"), "c.jpg");
    }
}
