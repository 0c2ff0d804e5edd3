use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::macros::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_PER_PAGE: u64 = 49;
/// How far up from an activity link the photo count is looked for.
const MAX_CARD_DEPTH: usize = 5;

pub struct ZSport;

#[derive(Debug, Deserialize)]
struct ActivityResponse {
    rtncode: i64,
    #[serde(default)]
    errcause: Option<String>,
    data: Option<ActivityData>,
}

#[derive(Debug, Deserialize)]
struct ActivityData {
    name: Option<String>,
    action_time: Option<String>,
    photo: Option<PhotoList>,
}

#[derive(Debug, Deserialize)]
struct PhotoList {
    #[serde(default)]
    data: Vec<ActivityPhoto>,
    #[serde(default)]
    total: Value,
    #[serde(default)]
    current_page: Value,
    #[serde(default)]
    per_page: Value,
}

#[derive(Debug, Deserialize)]
struct ActivityPhoto {
    #[serde(default)]
    id: Value,
    sha1: Option<String>,
    #[serde(default)]
    price: Value,
    shoot_time: Option<String>,
    author_name: Option<String>,
}

impl PhotoList {
    /// Whether this is the final page, with the page count derived from `total` and `per_page`.
    fn is_last_page(&self) -> bool {
        let total = json_u64(&self.total).unwrap_or(0);
        let per_page = json_u64(&self.per_page).filter(|n| *n > 0).unwrap_or(DEFAULT_PER_PAGE);
        let current_page = json_u64(&self.current_page).unwrap_or(1);
        current_page >= (total + per_page - 1) / per_page
    }
}

fn activity_id(href: &str) -> Option<EventId> {
    regex!(r"^/activity/(\d+)").captures(href).and_then(|captures| captures[1].parse().ok()).map(EventId::Numeric)
}

/// The element holding an activity's stats: the first of the nearest few ancestors that
/// mentions a photo count or is a table or grid row.
fn activity_card<'a>(link: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    ancestor_elements(link)
        .take(MAX_CARD_DEPTH)
        .find(|elem| raw_text(elem).contains('張') || elem.value().name() == "tr" || has_class(elem, "row"))
}

fn parse_home_page(html: &str) -> Vec<Event> {
    let document = Html::parse_document(html);
    let events = document
        .select(selector!(r#"a[href^="/activity/"]"#))
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let id = activity_id(href)?;
            let name = Some(element_text(&link)).filter(|s| !s.is_empty()).or_else(|| {
                let img = link.select(selector!("img")).next()?;
                img.value().attr("alt").map(clean_text).filter(|s| !s.is_empty())
            })?;
            let text = activity_card(&link).map(|card| element_text(&card)).unwrap_or_default();
            Some(Event {
                date: regex!(r"\d{4}[-/.]\d{1,2}[-/.]\d{1,2}")
                    .find(&text)
                    .map(|m| normalize_event_date(m.as_str()))
                    .unwrap_or_default(),
                photo_count: regex!(r"([\d,]+)\s*張").captures(&text).and_then(|c| parse_count(&c[1])),
                days_left: regex!(r"剩\s*(\d+)\s*天").captures(&text).and_then(|c| c[1].parse().ok()),
                url: absolute_url(ZSPORT_BASE_URL, href),
                ..Event::new(id, name)
            })
        })
        .collect();
    dedup_events(events)
}

fn photo_from_activity(event_id: &EventId, photo: &ActivityPhoto) -> Photo {
    Photo {
        id: json_text(&photo.id).unwrap_or_default(),
        time: photo.shoot_time.clone().unwrap_or_default(),
        photographer: photo.author_name.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        thumbnail: photo
            .sha1
            .as_ref()
            .map(|sha1| format!("{}/img/photo/{}/{}_s.webp", ZSPORT_BASE_URL, event_id, sha1)),
        price: json_u64(&photo.price).filter(|p| *p > 0).map(|p| p as u32),
        ..Default::default()
    }
}

fn parse_activity(contents: &str) -> Result<ActivityData> {
    let response: ActivityResponse = parse_json(contents)?;
    let message = response.errcause.unwrap_or_else(|| "Unknown error".to_string());
    ensure!(response.rtncode == 0, "ZSport API returned code {}: {}", response.rtncode, message);
    response.data.ok_or_else(|| anyhow!("ZSport API returned no data"))
}

#[async_trait(?Send)]
impl EventSource for ZSport {
    fn vendor(&self) -> Vendor {
        Vendor::Zsport
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::HighestId
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let html =
            fetcher.get_text(ZSPORT_BASE_URL, &[], TIMEOUT).await.context("Failed to fetch ZSport activities")?;
        let mut events = query.filter().retain(parse_home_page(&html));
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
        let search_url = format!("{}/activity/{}?q={}", ZSPORT_BASE_URL, event_id, bib);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, search_url);
        let url = format!("{}/api/activity/{}", ZSPORT_BASE_URL, event_id);
        let mut pages = Pages::starting_at(1).max_items(options.max);
        while let Some(page_number) = pages.next_page() {
            let query = [("page", page_number.to_string()), ("q", bib.to_string())];
            let contents = fetcher.get_text(&url, &query, TIMEOUT).await.context("Failed to search ZSport photos")?;
            let data =
                parse_activity(&contents).with_context(|| format!("Failed to parse ZSport page {}", page_number))?;
            if result.event_name.is_none() {
                result.event_name = data.name.map(|s| s.trim().to_string());
                result.event_date = data.action_time.as_deref().map(normalize_event_date).filter(|d| !d.is_empty());
            }
            let photo_list = match data.photo {
                Some(photo_list) => photo_list,
                None => break,
            };
            let total = json_u64(&photo_list.total);
            result.total_count = total.unwrap_or(result.total_count);
            let last_page = photo_list.is_last_page();
            let photos = pages.record(Page::new(photo_list.data, total.map(|n| n as usize)));
            result.photos.extend(photos.iter().map(|photo| photo_from_activity(event_id, photo)));
            if last_page {
                break;
            }
        }
        result.price = result.photos.iter().find_map(|photo| photo.price);
        result.fetched_count = Some(pages.fetched());
        result.total_count = result.total_count.max(result.photos.len() as u64);
        Ok(result)
    }
}
