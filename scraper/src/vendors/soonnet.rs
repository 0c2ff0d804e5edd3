use async_trait::async_trait;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(10);

pub struct Soonnet;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityConfig {
    #[serde(default)]
    title: String,
    /// Photo albums of the activity, one per shooting spot.
    #[serde(default)]
    list: Vec<AlbumGroup>,
    #[serde(default)]
    sheyin_count: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumGroup {
    #[serde(default)]
    photo_count: Value,
}

impl ActivityConfig {
    fn photo_count(&self) -> u64 {
        self.list.iter().filter_map(|group| json_u64(&group.photo_count)).sum()
    }
}

fn parse_config(contents: &str) -> Result<Option<ActivityConfig>> {
    let response: ApiResponse<ActivityConfig> = parse_json(contents)?;
    Ok(response.result.filter(|config| response.success && !config.title.trim().is_empty()))
}

fn event_from_config(id: u64, config: &ActivityConfig) -> Event {
    Event {
        photo_count: Some(config.photo_count()),
        photographers: json_u64(&config.sheyin_count),
        url: Some(format!("{}/album/{}", SOONNET_MALL_URL, id)),
        ..Event::new(EventId::Numeric(id), config.title.trim())
    }
}

fn detail_from_config(event_id: &EventId, config: ActivityConfig) -> EventDetail {
    EventDetail {
        url: Some(format!("{}/album/{}", SOONNET_MALL_URL, event_id)),
        photo_count: Some(config.photo_count()),
        ..EventDetail::new(event_id.clone(), config.title.trim())
    }
}

impl Soonnet {
    async fn fetch_config(&self, fetcher: &Fetcher, activity_id: &str) -> Result<Option<ActivityConfig>> {
        let url = concatcp!(SOONNET_MALL_API_URL, "/Activity/GetConfigByActivityId");
        let contents = fetcher.get_text(url, &[("activityId", activity_id.to_string())], TIMEOUT).await?;
        parse_config(&contents).with_context(|| format!("Failed to parse Soonnet activity {}", activity_id))
    }
}

fn scan_ids(start: u64, end: u64) -> std::ops::Range<u64> {
    start..end
}

#[async_trait(?Send)]
impl EventSource for Soonnet {
    fn vendor(&self) -> Vendor {
        Vendor::Soonnet
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostPhotos
    }

    /// There is no listing endpoint, so the known activity id ranges are tried one by one.
    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let filter = query.filter();
        let mut events = Vec::new();
        for &(start, end) in SOONNET_SCAN_RANGES {
            info!("Scanning Soonnet activities {} to {}", start, end - 1);
            for id in scan_ids(start, end) {
                match self.fetch_config(fetcher, &id.to_string()).await {
                    Ok(Some(config)) => {
                        let event = event_from_config(id, &config);
                        if event.photo_count.unwrap_or(0) > 0 && filter.is_match(&event.name) {
                            debug!("Found Soonnet activity {}: {}", id, event.name);
                            events.push(event);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => debug!("Skipping Soonnet activity {}: {:?}", id, err),
                }
            }
        }
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
        let search_url = format!("{}/albumsearch/{}?code={}", SOONNET_MALL_URL, event_id, bib);
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, search_url);
        match self.fetch_config(fetcher, &event_id.to_string()).await {
            Ok(Some(config)) => {
                result.event_name = Some(config.title.trim().to_string());
                result.total_event_photos = Some(config.photo_count());
            }
            Ok(None) => warn!("Soonnet has no activity {}", event_id),
            Err(err) => warn!("Could not fetch Soonnet activity info: {:?}", err),
        }
        let note = "Photos are only listed on the album search page, which takes about 10 seconds to load";
        result.notes.push(note.into());
        Ok(result)
    }

    async fn event_detail(&self, fetcher: &Fetcher, event_id: &EventId) -> Result<EventDetail> {
        let config = self
            .fetch_config(fetcher, &event_id.to_string())
            .await
            .context("Failed to fetch Soonnet event details")?
            .ok_or_else(|| anyhow!("Soonnet has no activity {}", event_id))?;
        Ok(detail_from_config(event_id, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_JSON: &str = r#"{"success": true, "result": {
        "title": " 2025 新竹城市馬拉松 ",
        "list": [{"photoCount": 1200}, {"photoCount": "800"}, {"photoCount": null}],
        "sheyinCount": 14}}"#;

    #[test]
    fn test_scan_ranges_exclude_end() {
        let ids: Vec<u64> = SOONNET_SCAN_RANGES.iter().flat_map(|&(start, end)| scan_ids(start, end)).collect();
        assert_eq!(ids.len(), 280);
        assert_eq!(ids.first(), Some(&1320));
        assert!(!ids.contains(&1420));
        assert_eq!(ids.last(), Some(&2779));
    }

    #[test]
    fn test_parse_config() -> Result<()> {
        let config = parse_config(CONFIG_JSON)?.unwrap();
        let event = event_from_config(2650, &config);
        assert_eq!(event.id, EventId::Numeric(2650));
        assert_eq!(event.name, "2025 新竹城市馬拉松");
        assert_eq!(event.date, "");
        assert_eq!(event.photo_count, Some(2000));
        assert_eq!(event.photographers, Some(14));
        assert_eq!(event.url.as_deref(), Some("https://www.soonnetmall.com/album/2650"));
        Ok(())
    }

    #[test]
    fn test_missing_activity() -> Result<()> {
        assert!(parse_config(r#"{"success": false, "result": null}"#)?.is_none());
        assert!(parse_config(r#"{"success": true, "result": {"title": ""}}"#)?.is_none());
        assert!(parse_config("<html>").is_err());
        Ok(())
    }

    #[test]
    fn test_detail_from_config() -> Result<()> {
        let config = parse_config(CONFIG_JSON)?.unwrap();
        let detail = detail_from_config(&EventId::Numeric(2650), config);
        assert_eq!(detail.name, "2025 新竹城市馬拉松");
        assert_eq!(detail.photo_count, Some(2000));
        assert_eq!(detail.url.as_deref(), Some("https://www.soonnetmall.com/album/2650"));
        Ok(())
    }
}
