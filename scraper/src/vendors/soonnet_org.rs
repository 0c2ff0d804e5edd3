use async_trait::async_trait;
use serde_json::json;

use crate::constants::*;
use crate::fetcher::*;
use crate::imports::*;
use crate::source::*;
use crate::types::*;
use crate::utils::*;

const TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_LIST_LIMIT: usize = 20;
const CANDIDATE_LIMIT: usize = 100;

pub struct SoonnetOrg;

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default = "default_success")]
    success: bool,
    result: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumList {
    #[serde(default)]
    items: Vec<Album>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    id: Value,
    #[serde(rename = "sgL_PG_CName", default)]
    title: String,
    #[serde(rename = "sgL_Mem_DisplayName")]
    photographer: Option<String>,
    #[serde(rename = "sgL_PG_CPhotoQuantity", default)]
    photo_count: Value,
    /// Upload date, set on album listings.
    #[serde(rename = "sgL_PG_CAddTimerF")]
    added: Option<String>,
    /// Shooting date, set on gallery lookups.
    #[serde(rename = "sgL_PG_CShootTimerF")]
    shot: Option<String>,
    #[serde(rename = "isAuth", default)]
    identified: Value,
}

impl Album {
    fn date(&self) -> Option<String> {
        self.shot.as_deref().or(self.added.as_deref()).map(normalize_event_date).filter(|d| !d.is_empty())
    }

    fn photographer(&self) -> Option<String> {
        self.photographer.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.success {
            let message = self.error.and_then(|e| e.message).unwrap_or_default();
            bail!("Soonnet.org API request failed: {}", message);
        }
        self.result.ok_or_else(|| anyhow!("Soonnet.org API returned no result"))
    }
}

fn album_url(id: &EventId) -> String {
    format!("{}/albumviewPhotostream?id={}", SOONNET_ORG_URL, id)
}

fn event_from_album(album: Album) -> Option<Event> {
    let id = json_event_id(&album.id)?;
    Some(Event {
        date: album.date().unwrap_or_default(),
        photo_count: json_u64(&album.photo_count),
        photographer: album.photographer(),
        url: Some(album_url(&id)),
        ..Event::new(id, album.title.trim())
    })
}

fn events_from_albums(response: ApiResponse<AlbumList>) -> Result<Vec<Event>> {
    Ok(dedup_events(response.into_result()?.items.into_iter().filter_map(event_from_album).collect()))
}

impl SoonnetOrg {
    async fn fetch_gallery(&self, fetcher: &Fetcher, event_id: &EventId) -> Result<Album> {
        let url = concatcp!(SOONNET_ORG_API_URL, "/PhotoGalleryConfigAppSerivce/GetPhotoGalleryList");
        let body = json!({ "id": event_id, "MaxResultCount": 1, "SkipCount": 0 });
        let response: ApiResponse<Album> = fetcher.post_json(url, &body, TIMEOUT).await?;
        response.into_result()
    }
}

#[async_trait(?Send)]
impl EventSource for SoonnetOrg {
    fn vendor(&self) -> Vendor {
        Vendor::SoonnetOrg
    }

    fn tie_break(&self) -> TieBreak {
        TieBreak::MostPhotos
    }

    async fn list_events(&self, fetcher: &Fetcher, query: &ListQuery) -> Result<Vec<Event>> {
        let url = concatcp!(SOONNET_ORG_API_URL, "/PhotoGalleryConfigAppSerivce/GetAll");
        let body = json!({
            "SGL_PG_CMasterSort": SOONNET_ORG_RUNNING_CATEGORY,
            "MaxResultCount": query.limit_or(DEFAULT_LIST_LIMIT),
            "SkipCount": 0,
        });
        let response: ApiResponse<AlbumList> =
            fetcher.post_json(url, &body, TIMEOUT).await.context("Failed to fetch Soonnet.org albums")?;
        let mut events = query.filter().retain(events_from_albums(response)?);
        self.tie_break().sort(&mut events);
        Ok(events)
    }

    /// Soonnet.org albums aren't tagged with bibs, so the result only points at the album.
    async fn search_by_bib(
        &self,
        fetcher: &Fetcher,
        event_id: &EventId,
        bib: &str,
        _options: &SearchOptions,
    ) -> Result<SearchResult> {
        let mut result = SearchResult::new(self.vendor(), event_id.clone(), bib, album_url(event_id));
        let album = self.fetch_gallery(fetcher, event_id).await.context("Failed to fetch Soonnet.org album")?;
        result.event_name = Some(album.title.trim().to_string());
        result.event_date = album.date();
        result.total_event_photos = json_u64(&album.photo_count);
        result.price = Some(0);
        result.notes.push(format!("Soonnet.org has no bib search; browse the album for bib {}", bib));
        result.notes.push("Photos on Soonnet.org are free to download".to_string());
        Ok(result)
    }

    async fn event_detail(&self, fetcher: &Fetcher, event_id: &EventId) -> Result<EventDetail> {
        let album = self.fetch_gallery(fetcher, event_id).await.context("Failed to fetch Soonnet.org album")?;
        Ok(EventDetail {
            date: album.date(),
            url: Some(album_url(event_id)),
            photographer: album.photographer(),
            photo_count: json_u64(&album.photo_count),
            identified: json_u64(&album.identified),
            ..EventDetail::new(event_id.clone(), album.title.trim())
        })
    }

    async fn candidates(&self, fetcher: &Fetcher, keyword: &str) -> Result<Vec<Event>> {
        let query = ListQuery { keyword: Some(keyword.to_string()), limit: Some(CANDIDATE_LIMIT) };
        self.list_events(fetcher, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_from_albums() -> Result<()> {
        let events = events_from_albums(parse_json(
            r#"{"success": true, "result": {"totalCount": 3, "items": [
                {"id": 183648, "sgL_PG_CName": "2025 麗晨台中馬拉松 - 市府路", "sgL_Mem_DisplayName": " 老王 ",
                 "sgL_PG_CPhotoQuantity": 640, "sgL_PG_CAddTimerF": "2025/12/21"},
                {"id": "183650", "sgL_PG_CName": "2025 田中馬拉松", "sgL_Mem_DisplayName": "",
                 "sgL_PG_CPhotoQuantity": "310"},
                {"id": 183648, "sgL_PG_CName": "duplicate"}]}}"#,
        )?)?;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "2025 麗晨台中馬拉松 - 市府路");
        assert_eq!(events[0].photographer.as_deref(), Some("老王"));
        assert_eq!(events[0].photo_count, Some(640));
        assert_eq!(events[0].date, "2025-12-21");
        assert_eq!(events[0].url.as_deref(), Some("https://www.soonnet.org/albumviewPhotostream?id=183648"));
        assert_eq!(events[1].photographer, None);
        assert_eq!(events[1].photo_count, Some(310));

        let matched = ListQuery::keyword("臺中").filter().retain(events);
        assert_eq!(matched.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_success_flag_counts_as_success() -> Result<()> {
        let events = events_from_albums(parse_json(r#"{"result": {"items": [{"id": 1, "sgL_PG_CName": "A"}]}}"#)?)?;
        assert_eq!(events.len(), 1);
        Ok(())
    }

    #[test]
    fn test_api_failure() -> Result<()> {
        let response: ApiResponse<AlbumList> =
            parse_json(r#"{"success": false, "error": {"message": "Unauthorized"}}"#)?;
        let err = events_from_albums(response).unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
        Ok(())
    }

    #[test]
    fn test_parse_gallery() -> Result<()> {
        let response: ApiResponse<Album> = parse_json(
            r#"{"success": true, "result": {"sgL_PG_CName": "A", "sgL_Mem_DisplayName": "阿明",
                "sgL_PG_CPhotoQuantity": 1200, "isAuth": 950, "isNotAuth": 250,
                "sgL_PG_CShootTimerF": "2025-12-21", "sgL_PG_CAddTimerF": "2025-12-23"}}"#,
        )?;
        let album = response.into_result()?;
        assert_eq!(album.title, "A");
        assert_eq!(album.photographer().as_deref(), Some("阿明"));
        assert_eq!(json_u64(&album.photo_count), Some(1200));
        assert_eq!(json_u64(&album.identified), Some(950));
        assert_eq!(album.date().as_deref(), Some("2025-12-21"));
        Ok(())
    }
}
