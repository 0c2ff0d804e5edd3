use async_trait::async_trait;
use racephoto_shared::keyword_variants;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(30);
const PHOTOS_TIMEOUT: Duration = Duration::from_secs(120);
const PAGE_SIZE: usize = 50;
const DEFAULT_LIST_LIMIT: usize = 30;
const CANDIDATE_LIMIT: usize = 10;
/// Size of the listing fetched to look up a single event's name and date.
const EVENT_INFO_LIMIT: usize = 200;

pub struct RaceShot;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<RaceEvent>,
    #[serde(default)]
    total: Value,
}

#[derive(Debug, Deserialize)]
struct RaceEvent {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    date: Option<String>,
    location: Option<String>,
    #[serde(default)]
    published_photo_count: Value,
    #[serde(default)]
    categories: Value,
}

#[derive(Debug, Deserialize)]
struct PhotosResponse {
    #[serde(default)]
    photos: Vec<RacePhoto>,
}

#[derive(Debug, Deserialize)]
struct RacePhoto {
    #[serde(default)]
    photo_id: Value,
    #[serde(default)]
    bib_number: Value,
    create_date: Option<String>,
    /// Sort key only; either epoch seconds or an ISO timestamp.
    #[serde(default)]
    capture_timestamp: Value,
    photographer_name: Option<String>,
    location: Option<String>,
}

/// Categories arrive either as an array or as a string holding a JSON array.
fn parse_categories(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(json_text).collect(),
        Value::String(s) => match serde_json::from_str::<Vec<Value>>(s) {
            Ok(items) => items.iter().filter_map(json_text).collect(),
            Err(_) => s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
        },
        _ => Vec::new(),
    }
}

fn event_from_race(race: RaceEvent) -> Option<Event> {
    let id = json_event_id(&race.id)?;
    Some(Event {
        date: race.date.as_deref().map(normalize_event_date).unwrap_or_default(),
        location: race.location.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        photo_count: json_u64(&race.published_photo_count),
        categories: parse_categories(&race.categories),
        url: Some(format!("{}/events/{}", RACESHOT_WEB_URL, id)),
        ..Event::new(id, race.name.trim())
    })
}

fn parse_events_page(contents: &str) -> Result<Page<Event>> {
    let response: EventsResponse = parse_json(contents)?;
    let total = json_u64(&response.total).map(|n| n as usize);
    Ok(Page::new(response.events.into_iter().filter_map(event_from_race).collect(), total))
}

/// Whether a photo is tagged with `bib`. Tags are a JSON-string array; anything else is
/// matched as plain text.
fn has_bib(photo: &RacePhoto, bib: &str) -> bool {
    match &photo.bib_number {
        Value::Array(items) => items.iter().filter_map(json_text).any(|b| b == bib),
        Value::String(s) => match serde_json::from_str::<Vec<Value>>(s) {
            Ok(items) => items.iter().filter_map(json_text).any(|b| b == bib),
            Err(_) => s.contains(bib),
        },
        other => json_text(other).map_or(false, |b| b == bib),
    }
}

fn photo_from_race(photo: &RacePhoto) -> Photo {
    let bib_numbers = match &photo.bib_number {
        Value::Array(items) => items.iter().filter_map(json_text).collect(),
        Value::String(s) => serde_json::from_str::<Vec<Value>>(s)
            .map(|items| items.iter().filter_map(json_text).collect())
            .unwrap_or_else(|_| vec![s.clone()]),
        _ => Vec::new(),
    };
    Photo {
        id: json_text(&photo.photo_id).unwrap_or_default(),
        time: photo
            .create_date
            .as_deref()
            .map(|ts| ts.chars().take(19).collect::<String>().replace('T', " "))
            .unwrap_or_default(),
        photographer: photo.photographer_name.clone().filter(|s| !s.is_empty()),
        location: photo.location.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        price: Some(RACESHOT_PHOTO_PRICE),
        bib_numbers,
        ..Default::default()
    }
}

/// Photos tagged with `bib`, in capture order; untimed photos count as time zero.
fn matching_photos(mut photos: Vec<RacePhoto>, bib: &str) -> Vec<Photo> {
    photos.retain(|photo| has_bib(photo, bib));
    photos.sort_by_key(|photo| {
        let ts = &photo.capture_timestamp;
        (json_u64(ts).unwrap_or(0), json_text(ts))
    });
    photos.iter().map(photo_from_race).collect()
}

impl RaceShot {
    async fn fetch_events(&self, fetcher: &Fetcher, search: Option<&str>, limit: usize) -> Result<Vec<Event>> {
        let url = concatcp!(RACESHOT_API_URL, "/events");
        let mut events = Vec::new();
        let mut pages = Pages::starting_at(1).max_items(limit);
        while let Some(page_number) = pages.next_page() {
            let mut query = vec![
                ("page", page_number.to_string()),
                ("limit", PAGE_SIZE.min(limit).to_string()),
                ("sortOrder", "DESC".to_string()),
                ("minPublishedPhotos", "1".to_string()),
            ];
            if let Some(search) = search {
                query.push(("search", search.to_string()));
            }
            let contents = fetcher.get_text(url, &query, TIMEOUT).await.context("Failed to fetch RaceShot events")?;
            events.extend(pages.record(parse_events_page(&contents)?));
        }
        Ok(events)
    }
}

#[async_trait(?Send)]
impl EventSource for RaceShot {
    fn vendor(&self) -> Vendor {
        Vendor::Raceshot
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostPhotos
    }

    /// The server-side search doesn't equate 台 and 臺, so each spelling is searched and the
    /// results merged.
    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let limit = query.limit_or(DEFAULT_LIST_LIMIT);
        let mut events = match query.filter().keyword() {
            Some(keyword) => {
                let mut events = Vec::new();
                for variant in keyword_variants(keyword) {
                    events.extend(self.fetch_events(fetcher, Some(&variant), limit).await?);
                }
                dedup_events(events)
            }
            None => self.fetch_events(fetcher, None, limit).await?,
        };
        self.tie_break().sort(&mut events);
        events.truncate(limit);
        Ok(events)
    }

    async fn search_by_bib(
        &self,
        fetcher: &Fetcher,
        event_id: &EventId,
        bib: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        let search_url = format!("{}/events/{}?bib={}", RACESHOT_WEB_URL, event_id, bib);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, search_url);
        result.price = Some(RACESHOT_PHOTO_PRICE);

        let url = concatcp!(RACESHOT_API_URL, "/photos");
        let response: PhotosResponse = fetcher
            .get_json(url, &[("eventId", event_id.to_string())], PHOTOS_TIMEOUT)
            .await
            .context("Failed to fetch RaceShot photos")?;
        result.total_event_photos = Some(response.photos.len() as u64);
        let photos = matching_photos(response.photos, bib);
        result.total_count = photos.len() as u64;
        result.photos = photos.into_iter().take(options.max).collect();

        match self.fetch_events(fetcher, None, EVENT_INFO_LIMIT).await {
            Ok(events) => {
                if let Some(event) = events.into_iter().find(|event| &event.id == event_id) {
                    result.event_name = Some(event.name);
                    result.event_date = Some(event.date).filter(|d| !d.is_empty());
                }
            }
            Err(err) => warn!("Could not fetch RaceShot event info: {:?}", err),
        }
        Ok(result)
    }

    async fn candidates(&self, fetcher: &Fetcher, keyword: &str) -> Result<Vec<Event>> {
        let query = ListQuery { keyword: Some(keyword.to_string()), limit: Some(CANDIDATE_LIMIT) };
        self.list_events(fetcher, &query).await
    }
}
