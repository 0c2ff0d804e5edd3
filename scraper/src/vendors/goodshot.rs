use std::collections::HashMap;

use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: usize = 50;
const BIB_FIELDS: [&str; 9] =
    ["bibNum", "bibNum1", "bibNum2", "bibNum3", "bibNum4", "bibNum5", "bibNum6", "bibNum7", "bibNum8"];

pub struct GoodShot;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Competition {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    photos_num: Value,
    #[serde(default)]
    photographers_num: Value,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoPage {
    /// Photos matching the bib across all pages.
    #[serde(default)]
    count: Value,
    #[serde(default)]
    list: Vec<ShotPhoto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShotPhoto {
    #[serde(default)]
    id: Value,
    cover_img: Option<String>,
    take_time: Option<String>,
    owner_name: Option<String>,
    competition_title: Option<String>,
    competition_date: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, Value>,
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T> {
        ensure!(self.code == 200, "GoodShot API returned code {}: {}", self.code, self.message.unwrap_or_default());
        self.data.ok_or_else(|| anyhow!("GoodShot API returned no data"))
    }
}

fn event_from_competition(competition: Competition) -> Option<Event> {
    let id = json_event_id(&competition.id)?;
    Some(Event {
        date: competition.date.as_deref().map(normalize_event_date).unwrap_or_default(),
        location: competition.county.filter(|s| !s.is_empty()),
        photo_count: json_u64(&competition.photos_num),
        photographers: json_u64(&competition.photographers_num),
        url: Some(format!("{}/competitions/{}", GOODSHOT_BASE_URL, id)),
        ..Event::new(id, competition.title.trim())
    })
}

/// `2025-11-09T08:15:02.000+08:00` becomes `2025-11-09 08:15:02`.
fn format_take_time(take_time: &str) -> String {
    take_time.chars().take(19).collect::<String>().replace('T', " ")
}

fn photo_from_shot(shot: &ShotPhoto) -> Photo {
    Photo {
        id: json_text(&shot.id).unwrap_or_default(),
        time: shot.take_time.as_deref().map(format_take_time).unwrap_or_default(),
        url: shot.cover_img.as_deref().and_then(|img| absolute_url(GOODSHOT_BASE_URL, img)),
        photographer: shot.owner_name.clone().filter(|s| !s.is_empty()),
        bib_numbers: BIB_FIELDS
            .iter()
            .filter_map(|field| shot.other.get(*field).and_then(json_text))
            .collect(),
        ..Default::default()
    }
}

fn parse_photo_page(contents: &str) -> Result<Page<ShotPhoto>> {
    let envelope: Envelope<PhotoPage> = parse_json(contents)?;
    let page = envelope.into_data()?;
    let total = json_u64(&page.count).map(|n| n as usize);
    Ok(Page::new(page.list, total))
}

#[async_trait(?Send)]
impl EventSource for GoodShot {
    fn vendor(&self) -> Vendor {
        Vendor::Goodshot
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostPhotos
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let url = concatcp!(GOODSHOT_API_URL, "/competition");
        let envelope: Envelope<Vec<Competition>> =
            fetcher.get_json(url, &[], TIMEOUT).await.context("Failed to fetch GoodShot competitions")?;
        let events = envelope.into_data()?.into_iter().filter_map(event_from_competition).collect();
        let mut events = query.filter().retain(dedup_events(events));
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
        let search_url = format!("{}/competitions/{}/competitionPG", GOODSHOT_BASE_URL, event_id);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, search_url);
        result.fuzzy = Some(options.fuzzy);

        let url = format!("{}/competition/{}/photo/search", GOODSHOT_API_URL, event_id);
        let mut pages = Pages::starting_at(0).max_items(options.max);
        while let Some(page_number) = pages.next_page() {
            let query = [
                ("bibNum", bib.to_string()),
                ("fuzzy", options.fuzzy.to_string()),
                ("page", page_number.to_string()),
                ("row", PAGE_SIZE.to_string()),
            ];
            let contents = fetcher.get_text(&url, &query, TIMEOUT).await.context("Failed to search GoodShot photos")?;
            let page = parse_photo_page(&contents)
                .with_context(|| format!("Failed to parse GoodShot page {}", page_number))?;
            if let Some(total) = page.total {
                result.total_count = total as u64;
            }
            let shots = pages.record(page);
            if result.event_name.is_none() {
                if let Some(first) = shots.first() {
                    result.event_name = first.competition_title.clone();
                    result.event_date = first.competition_date.as_deref().map(normalize_event_date);
                }
            }
            result.photos.extend(shots.iter().map(photo_from_shot));
        }
        result.fetched_count = Some(pages.fetched());
        result.total_count = result.total_count.max(result.photos.len() as u64);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competitions() -> Result<()> {
        let envelope: Envelope<Vec<Competition>> = parse_json(
            r#"{"code": 200, "data": [
                {"id": 51, "title": " 2025 田中馬拉松 ", "date": "2025-11-09T00:00:00", "county": "彰化縣",
                 "photosNum": 48213, "photographersNum": "35"},
                {"id": 57, "title": "2026 台北渣打", "date": null, "photosNum": null},
                {"title": "no id"}]}"#,
        )?;
        let events: Vec<Event> = envelope.into_data()?.into_iter().filter_map(event_from_competition).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "2025 田中馬拉松");
        assert_eq!(events[0].date, "2025-11-09");
        assert_eq!(events[0].location.as_deref(), Some("彰化縣"));
        assert_eq!(events[0].photo_count, Some(48213));
        assert_eq!(events[0].photographers, Some(35));
        assert_eq!(events[1].date, "");
        assert_eq!(events[1].photo_count, None);
        Ok(())
    }

    #[test]
    fn test_error_code() -> Result<()> {
        let envelope: Envelope<Vec<Competition>> = parse_json(r#"{"code": 500, "message": "busy", "data": null}"#)?;
        let err = envelope.into_data().unwrap_err();
        assert!(err.to_string().contains("busy"));
        Ok(())
    }

    #[test]
    fn test_photo_page() -> Result<()> {
        let page = parse_photo_page(
            r#"{"code": 200, "data": {"count": "2", "list": [
                {"id": 9001, "coverImg": "/upload/9001.jpg", "takeTime": "2025-11-09T08:15:02.000+08:00",
                 "ownerName": "阿明", "bibNum": "1234", "bibNum1": "", "bibNum2": 5678, "bibNum3": null,
                 "competitionTitle": "2025 田中馬拉松", "competitionDate": "2025/11/09"},
                {"id": "9002", "coverImg": "https://cdn.goodshot.com.tw/9002.jpg", "takeTime": null}]}}"#,
        )?;
        assert_eq!(page.total, Some(2));
        let photos: Vec<Photo> = page.items.iter().map(photo_from_shot).collect();
        assert_eq!(photos[0].id, "9001");
        assert_eq!(photos[0].time, "2025-11-09 08:15:02");
        assert_eq!(photos[0].url.as_deref(), Some("https://goodshot.com.tw/upload/9001.jpg"));
        assert_eq!(photos[0].photographer.as_deref(), Some("阿明"));
        assert_eq!(photos[0].bib_numbers, vec!["1234", "5678"]);
        assert_eq!(photos[1].url.as_deref(), Some("https://cdn.goodshot.com.tw/9002.jpg"));
        assert!(photos[1].bib_numbers.is_empty());
        Ok(())
    }

    #[test]
    fn test_paging_stops_at_max() -> Result<()> {
        let mut pages = Pages::starting_at(0).max_items(3);
        let contents = r#"{"code": 200, "data": {"count": 120, "list": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]}}"#;
        assert_eq!(pages.next_page(), Some(0));
        let kept = pages.record(parse_photo_page(contents)?);
        assert_eq!(kept.len(), 3);
        assert_eq!(pages.next_page(), None);
        Ok(())
    }

    #[test]
    fn test_reported_count_ends_paging() -> Result<()> {
        let mut pages = Pages::starting_at(0).max_items(100);
        let contents = r#"{"code": 200, "data": {"count": 480, "list": [{"id": 1}, {"id": 2}]}}"#;
        assert_eq!(pages.next_page(), Some(0));
        let page = parse_photo_page(contents)?;
        assert_eq!(page.total, Some(480));
        pages.record(page);
        assert_eq!(pages.next_page(), Some(1));

        let last = parse_photo_page(r#"{"code": 200, "data": {"count": 3, "list": [{"id": 3}]}}"#)?;
        pages.record(last);
        assert_eq!(pages.next_page(), None);
        Ok(())
    }

    #[test]
    fn test_format_take_time() {
        assert_eq!(format_take_time("2025-11-09T08:15:02.000+08:00"), "2025-11-09 08:15:02");
        assert_eq!(format_take_time("08:15"), "08:15");
    }
}
